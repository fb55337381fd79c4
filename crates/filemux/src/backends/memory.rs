//! In-memory backend.
//!
//! Used for scratch data and testing. All data is ephemeral. Directories
//! are implied by `/`-separated file names.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::{Mutex, RwLock};
use tracing::trace;

use crate::backend::Backend;
use crate::error::{FileIoError, FileIoResult};
use crate::handle::FileHandle;
use crate::types::{DirListing, OpenMode, SeekOrigin};

type FileData = Arc<RwLock<Vec<u8>>>;

/// In-memory backend.
///
/// Handles keep a weak reference to their file: once the file is removed
/// from the backend, every handle on it fails with `InvalidHandle`.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    files: RwLock<HashMap<String, FileData>>,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize a name: drop leading `/`, empty and `.` components, and
    /// resolve `..` against the preceding component. `..` never climbs above
    /// the root.
    fn normalize(name: &str) -> String {
        let mut parts = Vec::new();
        for part in name.split('/') {
            match part {
                "" | "." => {}
                ".." => {
                    parts.pop();
                }
                part => parts.push(part),
            }
        }
        parts.join("/")
    }

    /// Store `data` under `name`, replacing any previous file.
    ///
    /// Handles on a replaced file become invalid.
    pub fn insert(&self, name: impl Into<String>, data: impl Into<Vec<u8>>) {
        let name = Self::normalize(&name.into());
        self.files
            .write()
            .insert(name, Arc::new(RwLock::new(data.into())));
    }

    /// Remove `name`. Returns `true` if it existed.
    pub fn remove(&self, name: &str) -> bool {
        self.files.write().remove(&Self::normalize(name)).is_some()
    }

    /// Current contents of `name`.
    pub fn contents(&self, name: &str) -> Option<Vec<u8>> {
        self.files
            .read()
            .get(&Self::normalize(name))
            .map(|data| data.read().clone())
    }

    /// Number of stored files.
    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    /// Returns true if no files are stored.
    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }
}

impl Backend for MemoryBackend {
    fn label(&self) -> &str {
        "memory"
    }

    fn open(&self, name: &str, mode: OpenMode) -> FileIoResult<Option<Box<dyn FileHandle>>> {
        let key = Self::normalize(name);
        if key.is_empty() {
            return Ok(None);
        }

        let data = match mode {
            OpenMode::ReadOnly | OpenMode::ReadWrite => match self.files.read().get(&key) {
                Some(data) => Arc::clone(data),
                None => return Ok(None),
            },
            OpenMode::WriteOnly => {
                let mut files = self.files.write();
                let data = files.entry(key).or_default();
                data.write().clear();
                Arc::clone(data)
            }
        };

        let size = match mode {
            OpenMode::WriteOnly => 0,
            _ => data.read().len() as u64,
        };
        trace!(name, %mode, size, "opened in-memory file");

        Ok(Some(Box::new(MemoryHandle {
            name: name.to_string(),
            mode,
            size,
            data: Arc::downgrade(&data),
            cursor: Mutex::new(0),
            snapshot: OnceLock::new(),
        })))
    }

    fn list_dir(&self, path: &str) -> Option<DirListing> {
        let dir = Self::normalize(path);
        let prefix = if dir.is_empty() {
            String::new()
        } else {
            format!("{dir}/")
        };

        let mut subdirs = BTreeSet::new();
        let mut files = BTreeSet::new();
        for key in self.files.read().keys() {
            let Some(rest) = key.strip_prefix(&prefix) else {
                continue;
            };
            match rest.split_once('/') {
                Some((subdir, _)) => subdirs.insert(subdir.to_string()),
                None => files.insert(rest.to_string()),
            };
        }

        if !dir.is_empty() && subdirs.is_empty() && files.is_empty() {
            return None;
        }
        Some(DirListing {
            subdirs: subdirs.into_iter().collect(),
            files: files.into_iter().collect(),
        })
    }

    fn exists(&self, name: &str) -> bool {
        self.files.read().contains_key(&Self::normalize(name))
    }
}

/// Handle on an in-memory file.
struct MemoryHandle {
    name: String,
    mode: OpenMode,
    size: u64,
    data: Weak<RwLock<Vec<u8>>>,
    cursor: Mutex<u64>,
    /// Copy of the contents taken by the first `mmap`.
    snapshot: OnceLock<Vec<u8>>,
}

impl MemoryHandle {
    fn data(&self) -> FileIoResult<FileData> {
        self.data
            .upgrade()
            .ok_or_else(|| FileIoError::invalid_handle(&self.name, "file removed from backend"))
    }
}

impl FileHandle for MemoryHandle {
    fn name(&self) -> &str {
        &self.name
    }

    fn mode(&self) -> OpenMode {
        self.mode
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn read(&self, buf: &mut [u8]) -> FileIoResult<usize> {
        let data = self.data()?;
        if !self.mode.can_read() {
            return Err(FileIoError::ReadOnWriteOnly(self.name.clone()));
        }
        if buf.is_empty() {
            return Ok(0);
        }

        let data = data.read();
        let mut cursor = self.cursor.lock();
        let start = usize::try_from(*cursor).unwrap_or(usize::MAX).min(data.len());
        let n = buf.len().min(data.len() - start);
        if n == 0 {
            return Err(FileIoError::read(&self.name, "end of file"));
        }
        buf[..n].copy_from_slice(&data[start..start + n]);
        *cursor += n as u64;
        Ok(n)
    }

    fn write(&self, buf: &[u8]) -> FileIoResult<usize> {
        let data = self.data()?;
        if !self.mode.can_write() {
            return Err(FileIoError::WriteOnReadOnly(self.name.clone()));
        }
        if buf.is_empty() {
            return Ok(0);
        }

        let mut data = data.write();
        let mut cursor = self.cursor.lock();
        let start = usize::try_from(*cursor)
            .map_err(|_| FileIoError::write(&self.name, "offset out of range"))?;
        let end = start
            .checked_add(buf.len())
            .ok_or_else(|| FileIoError::write(&self.name, "offset out of range"))?;
        let len = data.len();
        if len < end {
            data.try_reserve(end - len)
                .map_err(|e| FileIoError::write(&self.name, e))?;
            data.resize(end, 0);
        }
        data[start..end].copy_from_slice(buf);
        *cursor = end as u64;
        Ok(buf.len())
    }

    fn seek(&self, offset: i64, origin: SeekOrigin) -> FileIoResult<u64> {
        let data = self.data()?;
        // Lock order everywhere: data, then cursor.
        let data = data.read();
        let mut cursor = self.cursor.lock();
        let base = match origin {
            SeekOrigin::Start => 0,
            SeekOrigin::Current => *cursor,
            SeekOrigin::End => data.len() as u64,
        };
        let target = i64::try_from(base)
            .ok()
            .and_then(|base| base.checked_add(offset))
            .and_then(|pos| u64::try_from(pos).ok())
            .ok_or_else(|| FileIoError::seek(&self.name, "invalid argument"))?;
        *cursor = target;
        Ok(target)
    }

    fn mmap(&self) -> FileIoResult<&[u8]> {
        if self.mode != OpenMode::ReadOnly {
            return Err(FileIoError::MapForWrite(self.name.clone()));
        }
        if let Some(snapshot) = self.snapshot.get() {
            return Ok(snapshot.as_slice());
        }
        let data = self.data()?;
        Ok(self.snapshot.get_or_init(|| data.read().clone()).as_slice())
    }
}
