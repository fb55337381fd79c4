//! The handle contract every backend's open files satisfy.

use std::sync::Arc;

use crate::error::FileIoResult;
use crate::types::{OpenMode, SeekOrigin};

/// One open logical file.
///
/// Operations take `&self`: a cached handle is shared between the
/// [`FileManager`](crate::FileManager) and every caller that opened the same
/// name, and they all observe the same cursor. No operation is atomic with
/// respect to another; callers sharing a handle across threads serialize
/// access themselves.
pub trait FileHandle: Send + Sync {
    /// Logical name the handle was opened with.
    fn name(&self) -> &str;

    /// Mode the handle was opened with.
    fn mode(&self) -> OpenMode;

    /// Size in bytes, as known when the handle was opened.
    ///
    /// Handles created write-only start at 0 and are not updated by writes.
    fn size(&self) -> u64;

    /// Read up to `buf.len()` bytes at the cursor.
    ///
    /// Returns the number of bytes transferred, which may be short near the
    /// end of the file. Transferring nothing for a non-empty request is a
    /// read error; an empty `buf` returns `Ok(0)`.
    fn read(&self, buf: &mut [u8]) -> FileIoResult<usize>;

    /// Write `buf` at the cursor, returning the number of bytes written.
    ///
    /// Writing nothing for a non-empty request is a write error.
    fn write(&self, buf: &[u8]) -> FileIoResult<usize>;

    /// Move the cursor, returning the new absolute position.
    fn seek(&self, offset: i64, origin: SeekOrigin) -> FileIoResult<u64>;

    /// Rewind the cursor to the start.
    fn reset(&self) -> FileIoResult<()> {
        self.seek(0, SeekOrigin::Start).map(|_| ())
    }

    /// Map the whole file read-only.
    ///
    /// The region lives as long as the handle. Repeated calls return the
    /// mapping established by the first successful call.
    fn mmap(&self) -> FileIoResult<&[u8]>;
}

impl std::fmt::Debug for dyn FileHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileHandle")
            .field("name", &self.name())
            .field("mode", &self.mode())
            .field("size", &self.size())
            .finish()
    }
}

/// A handle shared between the cache and callers.
pub type SharedHandle = Arc<dyn FileHandle>;
