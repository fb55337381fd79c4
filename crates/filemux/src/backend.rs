//! Backend trait.
//!
//! A backend turns a logical name into a [`FileHandle`] against one storage
//! source, or reports that it has no such file. Misses are `Ok(None)`, never
//! errors: the [`FileManager`](crate::FileManager) keeps probing.

use crate::error::FileIoResult;
use crate::handle::FileHandle;
use crate::types::{DirListing, OpenMode};

/// A pluggable storage source.
pub trait Backend: Send + Sync {
    /// Short label used in log output.
    fn label(&self) -> &str;

    /// Open `name` in `mode`.
    ///
    /// Returns `Ok(None)` if this backend can't satisfy the request.
    /// `Err` is reserved for a resource that was found and opened but is
    /// unusable; it aborts probing.
    fn open(&self, name: &str, mode: OpenMode) -> FileIoResult<Option<Box<dyn FileHandle>>>;

    /// List the direct children of `path`, or `None` if this backend can't.
    fn list_dir(&self, path: &str) -> Option<DirListing>;

    /// Check whether `name` can be opened read-only.
    ///
    /// The default opens and immediately drops the handle.
    fn exists(&self, name: &str) -> bool {
        matches!(self.open(name, OpenMode::ReadOnly), Ok(Some(_)))
    }
}

impl std::fmt::Debug for dyn Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend").field("label", &self.label()).finish()
    }
}
