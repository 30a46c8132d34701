//! File metadata samples and the source they are read from.

use std::fs::Metadata;
use std::io;
use std::path::Path;
use std::time::SystemTime;

/// On-disk identity of a file, captured once per monitoring session.
///
/// On Unix this is the device and inode pair. Other platforms have no stable
/// identity in std, so every identity compares equal there and rotation is
/// only detected through the path disappearing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileIdentity {
    dev: u64,
    ino: u64,
}

impl FileIdentity {
    pub fn new(dev: u64, ino: u64) -> Self {
        Self { dev, ino }
    }

    #[cfg(unix)]
    fn from_metadata(meta: &Metadata) -> Self {
        use std::os::unix::fs::MetadataExt;
        Self::new(meta.dev(), meta.ino())
    }

    #[cfg(not(unix))]
    fn from_metadata(_meta: &Metadata) -> Self {
        Self::new(0, 0)
    }
}

/// One metadata sample of the watched path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileSnapshot {
    pub size: u64,
    /// `None` where the platform does not report modification times.
    pub modified: Option<SystemTime>,
    pub identity: FileIdentity,
}

impl From<&Metadata> for FileSnapshot {
    fn from(meta: &Metadata) -> Self {
        Self {
            size: meta.len(),
            modified: meta.modified().ok(),
            identity: FileIdentity::from_metadata(meta),
        }
    }
}

impl From<Metadata> for FileSnapshot {
    fn from(meta: Metadata) -> Self {
        Self::from(&meta)
    }
}

/// Where the watcher reads file metadata from.
///
/// Errors must keep their `io::ErrorKind`: `NotFound` and `PermissionDenied`
/// drive the watcher's classification.
pub trait MetadataSource: Send + Sync {
    fn stat(&self, path: &Path) -> io::Result<FileSnapshot>;
}

/// Reads metadata from the local filesystem, following symlinks.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsMetadata;

impl MetadataSource for FsMetadata {
    fn stat(&self, path: &Path) -> io::Result<FileSnapshot> {
        std::fs::metadata(path).map(FileSnapshot::from)
    }
}
