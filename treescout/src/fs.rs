//! Directory enumeration and file access.
//!
//! The walk never touches `std::fs` directly; it goes through a [`FileSystem`]
//! so that a job can be pointed at something other than the local disk, and
//! so tests can inject failures at exact points of the walk.
//!
//! A file system also decides whether a path is *native*: native files are
//! content-scanned through a memory map, everything else through a plain
//! read stream.
use serde::Serialize;
use std::ffi::OsString;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use tracing::trace;

/// What kind of object a directory entry is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
    Other,
}

impl From<fs::FileType> for EntryKind {
    fn from(ft: fs::FileType) -> Self {
        if ft.is_symlink() {
            EntryKind::Symlink
        } else if ft.is_dir() {
            EntryKind::Directory
        } else if ft.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        }
    }
}

/// Metadata snapshot for one directory entry
#[derive(Debug, Clone)]
pub struct EntryMetadata {
    /// Raw file name, used to build the child path
    pub name: OsString,
    /// Name as shown to users and matched by the name rule
    pub display_name: String,
    pub kind: EntryKind,
    pub size: u64,
    pub hidden: bool,
}

impl EntryMetadata {
    /// Builds a snapshot, deriving the display name and hidden flag from the name.
    pub fn new(name: impl Into<OsString>, kind: EntryKind, size: u64) -> Self {
        let name = name.into();
        let display_name = name.to_string_lossy().into_owned();
        let hidden = display_name.starts_with('.');
        Self {
            name,
            display_name,
            kind,
            size,
            hidden,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

/// A lazily pulled listing of one directory
pub trait DirEnumerator {
    /// Fetches the next entry; `None` at end of stream.
    fn next_entry(&mut self) -> Option<io::Result<EntryMetadata>>;

    /// Releases the listing.
    fn close(self: Box<Self>) -> io::Result<()>;
}

/// Access to a tree of directories and files
pub trait FileSystem {
    /// Opens a listing of `dir`'s children.
    fn read_dir<'a>(&'a self, dir: &Path) -> io::Result<Box<dyn DirEnumerator + 'a>>;

    /// Whether `path` can be opened with ordinary file descriptors (and so
    /// memory-mapped).
    fn is_native(&self, path: &Path) -> bool;

    /// Opens `path` for sequential reading.
    fn open_read<'a>(&'a self, path: &Path) -> io::Result<Box<dyn Read + 'a>>;
}

/// The local disk.
#[derive(Debug, Clone, Copy)]
pub struct LocalFs {
    native: bool,
}

impl LocalFs {
    pub fn new() -> Self {
        Self { native: true }
    }

    /// A local file system that reports every path as non-native, forcing
    /// content scans down the streamed-read path.
    pub fn streamed() -> Self {
        Self { native: false }
    }
}

impl Default for LocalFs {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for LocalFs {
    fn read_dir<'a>(&'a self, dir: &Path) -> io::Result<Box<dyn DirEnumerator + 'a>> {
        Ok(Box::new(LocalDirEnumerator {
            inner: fs::read_dir(dir)?,
        }))
    }

    fn is_native(&self, _path: &Path) -> bool {
        self.native
    }

    fn open_read<'a>(&'a self, path: &Path) -> io::Result<Box<dyn Read + 'a>> {
        Ok(Box::new(fs::File::open(path)?))
    }
}

struct LocalDirEnumerator {
    inner: fs::ReadDir,
}

impl DirEnumerator for LocalDirEnumerator {
    fn next_entry(&mut self) -> Option<io::Result<EntryMetadata>> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(e) => return Some(Err(e)),
            };
            match describe(&entry) {
                // Removed between the listing and the stat
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    trace!("Skipping vanished entry: {}", entry.path().display());
                }
                other => return Some(other),
            }
        }
    }

    fn close(self: Box<Self>) -> io::Result<()> {
        Ok(())
    }
}

fn describe(entry: &fs::DirEntry) -> io::Result<EntryMetadata> {
    // file_type() does not follow symlinks, so a link to a directory is never
    // walked into
    let kind = EntryKind::from(entry.file_type()?);
    let size = entry.metadata()?.len();
    Ok(EntryMetadata::new(entry.file_name(), kind, size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn collect(source: &dyn FileSystem, dir: &Path) -> Vec<EntryMetadata> {
        let mut listing = source.read_dir(dir).unwrap();
        let mut entries = Vec::new();
        while let Some(entry) = listing.next_entry() {
            entries.push(entry.unwrap());
        }
        listing.close().unwrap();
        entries.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        entries
    }

    #[test]
    fn test_local_listing_reports_kind_size_and_hidden() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "0123456789").unwrap();
        fs::write(dir.path().join(".secret"), "x").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();

        let entries = collect(&LocalFs::new(), dir.path());
        assert_eq!(entries.len(), 3);

        assert_eq!(entries[0].display_name, ".secret");
        assert!(entries[0].hidden);

        assert_eq!(entries[1].display_name, "a.txt");
        assert!(entries[1].is_file());
        assert_eq!(entries[1].size, 10);
        assert!(!entries[1].hidden);

        assert_eq!(entries[2].display_name, "sub");
        assert!(entries[2].is_dir());
    }

    #[test]
    fn test_entries_removed_mid_listing_are_skipped() {
        let dir = tempdir().unwrap();
        for i in 0..20 {
            fs::write(dir.path().join(format!("file_{}.txt", i)), "x").unwrap();
        }

        let source = LocalFs::new();
        let mut listing = source.read_dir(dir.path()).unwrap();
        let first = listing.next_entry().unwrap().unwrap();
        for i in 0..20 {
            let name = format!("file_{}.txt", i);
            if name != first.display_name {
                fs::remove_file(dir.path().join(name)).unwrap();
            }
        }

        while let Some(entry) = listing.next_entry() {
            let entry = entry.unwrap();
            assert!(dir.path().join(&entry.name).exists());
        }
        listing.close().unwrap();
    }

    #[test]
    fn test_read_dir_on_missing_directory_fails() {
        let dir = tempdir().unwrap();
        assert!(LocalFs::new().read_dir(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_streamed_local_fs_is_not_native() {
        let path = Path::new("whatever");
        assert!(LocalFs::new().is_native(path));
        assert!(!LocalFs::streamed().is_native(path));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_to_directory_is_not_a_directory() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("real")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("link")).unwrap();

        let entries = collect(&LocalFs::new(), dir.path());
        let link = entries.iter().find(|e| e.display_name == "link").unwrap();
        assert_eq!(link.kind, EntryKind::Symlink);
        assert!(!link.is_dir());
    }
}
