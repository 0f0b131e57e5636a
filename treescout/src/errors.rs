//! Error types for treescout.
//!
//! Failures fall into two groups. Construction-time failures (a pattern that
//! does not compile, a configuration file that does not parse) are returned
//! as `Err(SearchError)` to the caller. Failures that happen *during* a walk
//! are never returned: they are handed to the job's observer together with a
//! [`Severity`](crate::search::control::Severity) and the walk carries on or
//! stops depending on the answer.
//!
//! ```rust,ignore
//! match SearchJob::new(rules, &["src"], &settings) {
//!     Ok(job) => { job.run(); }
//!     Err(SearchError::InvalidPattern(msg)) => eprintln!("bad pattern: {}", msg),
//!     Err(e) => eprintln!("{}", e),
//! }
//! ```
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for search operations
pub type SearchResult<T> = Result<T, SearchError>;

/// Errors that can occur while building or running a search
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Could not list directory {path}: {source}")]
    ReadDir { path: PathBuf, source: io::Error },
    #[error("Could not read next entry of {path}: {source}")]
    ReadEntry { path: PathBuf, source: io::Error },
    #[error("Could not close directory {path}: {source}")]
    CloseDir { path: PathBuf, source: io::Error },
    #[error("Could not open {path}: {source}")]
    OpenFile { path: PathBuf, source: io::Error },
    #[error("Could not map {path}: {source}")]
    MapFile { path: PathBuf, source: io::Error },
    #[error("Could not read {path}: {source}")]
    ReadFile { path: PathBuf, source: io::Error },
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

/// Canonicalize the path and strip UNC prefixes so that
/// comparisons on Windows are consistent.
pub fn unify_path(original: &Path) -> PathBuf {
    let canonical = original
        .canonicalize()
        .unwrap_or_else(|_| original.to_path_buf());
    strip_unc_prefix(&canonical)
}

/// Strips the Windows UNC prefix (\\?\) from a path if present
fn strip_unc_prefix(p: &Path) -> PathBuf {
    let s = p.display().to_string();
    if let Some(stripped) = s.strip_prefix(r"\\?\") {
        PathBuf::from(stripped)
    } else {
        p.to_path_buf()
    }
}

impl SearchError {
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound(path.into())
    }

    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        Self::PermissionDenied(path.into())
    }

    pub fn invalid_pattern(pattern: impl Into<String>) -> Self {
        Self::InvalidPattern(pattern.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn read_dir(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::ReadDir {
            path: path.into(),
            source,
        }
    }

    pub fn read_entry(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::ReadEntry {
            path: path.into(),
            source,
        }
    }

    pub fn close_dir(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::CloseDir {
            path: path.into(),
            source,
        }
    }

    /// Opening a file for a content scan failed. Missing files and permission
    /// problems get their own variants so observers can tell them apart.
    pub fn open_file(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            io::ErrorKind::NotFound => Self::FileNotFound(path),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            _ => Self::OpenFile { path, source },
        }
    }

    pub fn map_file(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::MapFile {
            path: path.into(),
            source,
        }
    }

    pub fn read_file(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// The path the failure is about, when there is one
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::FileNotFound(path) | Self::PermissionDenied(path) => Some(path),
            Self::ReadDir { path, .. }
            | Self::ReadEntry { path, .. }
            | Self::CloseDir { path, .. }
            | Self::OpenFile { path, .. }
            | Self::MapFile { path, .. }
            | Self::ReadFile { path, .. } => Some(path),
            Self::InvalidPattern(_) | Self::ConfigError(_) | Self::IoError(_) => None,
        }
    }
}
