//! Open-mode, seek-origin and listing vocabulary shared by all backends.

use serde::{Deserialize, Serialize};
use std::io::SeekFrom;
use strum::{AsRefStr, Display};

/// How a handle was opened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum OpenMode {
    /// Open an existing file for reading.
    #[default]
    ReadOnly,
    /// Create or truncate a file for writing.
    WriteOnly,
    /// Open an existing file for reading and writing.
    ReadWrite,
}

impl OpenMode {
    /// Returns true if reads are permitted.
    pub fn can_read(&self) -> bool {
        !matches!(self, OpenMode::WriteOnly)
    }

    /// Returns true if writes are permitted.
    pub fn can_write(&self) -> bool {
        !matches!(self, OpenMode::ReadOnly)
    }
}

/// Whether [`FileManager::open`](crate::FileManager::open) should keep the
/// handle in its cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CacheMode {
    #[default]
    Cache,
    NoCache,
}

/// Reference point for [`FileHandle::seek`](crate::FileHandle::seek).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekOrigin {
    /// From the start of the file.
    Start,
    /// From the current cursor.
    Current,
    /// From the end of the file.
    End,
}

impl SeekOrigin {
    /// Build a `SeekFrom`, or `None` for a negative offset from the start.
    pub fn to_seek_from(self, offset: i64) -> Option<SeekFrom> {
        match self {
            SeekOrigin::Start => u64::try_from(offset).ok().map(SeekFrom::Start),
            SeekOrigin::Current => Some(SeekFrom::Current(offset)),
            SeekOrigin::End => Some(SeekFrom::End(offset)),
        }
    }
}

/// Result of listing one directory through one backend.
///
/// Both collections are unordered; they are never merged across backends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirListing {
    /// Names of direct subdirectories.
    pub subdirs: Vec<String>,
    /// Names of regular files (and symlinks to regular files).
    pub files: Vec<String>,
}

impl DirListing {
    /// Create an empty listing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if neither subdirectories nor files were found.
    pub fn is_empty(&self) -> bool {
        self.subdirs.is_empty() && self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_mode_permissions() {
        assert!(OpenMode::ReadOnly.can_read());
        assert!(!OpenMode::ReadOnly.can_write());
        assert!(!OpenMode::WriteOnly.can_read());
        assert!(OpenMode::WriteOnly.can_write());
        assert!(OpenMode::ReadWrite.can_read());
        assert!(OpenMode::ReadWrite.can_write());
        assert_eq!(OpenMode::default(), OpenMode::ReadOnly);
        assert_eq!(OpenMode::WriteOnly.to_string(), "write-only");
    }

    #[test]
    fn test_seek_origin() {
        assert_eq!(SeekOrigin::Start.to_seek_from(4), Some(SeekFrom::Start(4)));
        assert_eq!(SeekOrigin::Start.to_seek_from(-1), None);
        assert_eq!(SeekOrigin::Current.to_seek_from(-2), Some(SeekFrom::Current(-2)));
        assert_eq!(SeekOrigin::End.to_seek_from(0), Some(SeekFrom::End(0)));
    }

    #[test]
    fn test_dir_listing() {
        let mut listing = DirListing::new();
        assert!(listing.is_empty());
        listing.files.push("f".into());
        assert!(!listing.is_empty());
    }
}
