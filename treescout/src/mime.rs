use std::path::Path;

use crate::fs::{EntryKind, EntryMetadata};

pub const DIRECTORY_MIME: &str = "inode/directory";
pub const SYMLINK_MIME: &str = "inode/symlink";
pub const UNKNOWN_MIME: &str = "application/octet-stream";

/// Resolves the MIME type of an entry from its kind and file name
pub fn mime_type_of(path: &Path, entry: &EntryMetadata) -> String {
    match entry.kind {
        EntryKind::Directory => DIRECTORY_MIME.to_string(),
        EntryKind::Symlink => SYMLINK_MIME.to_string(),
        EntryKind::File | EntryKind::Other => mime_guess::from_path(path)
            .first_raw()
            .unwrap_or(UNKNOWN_MIME)
            .to_string(),
    }
}

/// MIME types compare case-insensitively
pub fn same_mime_type(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_type_of_files_and_directories() {
        let file = EntryMetadata::new("notes.txt", EntryKind::File, 12);
        assert_eq!(mime_type_of(Path::new("/tmp/notes.txt"), &file), "text/plain");

        let dir = EntryMetadata::new("src", EntryKind::Directory, 4096);
        assert_eq!(mime_type_of(Path::new("/tmp/src"), &dir), DIRECTORY_MIME);

        let blob = EntryMetadata::new("blob", EntryKind::File, 1);
        assert_eq!(mime_type_of(Path::new("/tmp/blob"), &blob), UNKNOWN_MIME);
    }

    #[test]
    fn test_same_mime_type() {
        assert!(same_mime_type("text/plain", "TEXT/Plain"));
        assert!(!same_mime_type("text/plain", "text/html"));
    }
}
