//! Native filesystem backend.
//!
//! Resolves names against an ordered list of root directories and wraps the
//! opened file descriptor in a [`NativeHandle`]. Read-only handles can be
//! memory-mapped.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

use memmap2::{Mmap, MmapOptions};
use tracing::{debug, trace};

use crate::backend::Backend;
use crate::error::{FileIoError, FileIoResult};
use crate::handle::FileHandle;
use crate::types::{DirListing, OpenMode, SeekOrigin};

/// Native filesystem backend.
///
/// A name is looked up under each root in order and the first root holding
/// a regular file by that name wins. For example, with roots
/// `["/opt/game/data", "/home/amy/.config/game"]`, `open("save.dat")` opens
/// `/opt/game/data/save.dat` if present, else the one under `.config`.
///
/// Names containing `..` never resolve.
#[derive(Debug, Clone)]
pub struct NativeBackend {
    roots: Vec<PathBuf>,
}

impl NativeBackend {
    /// Create a backend with a single root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            roots: vec![root.into()],
        }
    }

    /// Create a backend searching `roots` in the given order.
    pub fn with_roots<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
        }
    }

    /// The search roots, in probing order.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Turn a logical name into a path relative to a root.
    ///
    /// Returns `None` for names that would escape the root.
    fn relative(name: &str) -> Option<&Path> {
        let path = Path::new(name.trim_start_matches('/'));
        if path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
        {
            trace!(name, "rejecting name outside roots");
            return None;
        }
        Some(path)
    }

    /// First root holding a regular file (or a symlink to one) named `name`.
    fn locate(&self, name: &str) -> Option<PathBuf> {
        let rel = Self::relative(name)?;
        if rel.as_os_str().is_empty() {
            return None;
        }
        self.roots
            .iter()
            .map(|root| root.join(rel))
            .find(|path| path.is_file())
    }
}

impl Backend for NativeBackend {
    fn label(&self) -> &str {
        "native"
    }

    fn open(&self, name: &str, mode: OpenMode) -> FileIoResult<Option<Box<dyn FileHandle>>> {
        let path = match mode {
            OpenMode::WriteOnly => self.locate(name).or_else(|| {
                let rel = Self::relative(name)?;
                if rel.as_os_str().is_empty() {
                    return None;
                }
                self.roots.first().map(|root| root.join(rel))
            }),
            OpenMode::ReadOnly | OpenMode::ReadWrite => self.locate(name),
        };
        let Some(path) = path else {
            return Ok(None);
        };

        let opened = match mode {
            OpenMode::ReadOnly => File::open(&path),
            // std creates with 0o666 before umask
            OpenMode::WriteOnly => OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&path),
            OpenMode::ReadWrite => OpenOptions::new().read(true).write(true).open(&path),
        };
        let file = match opened {
            Ok(file) => file,
            Err(e) => {
                trace!(name, path = %path.display(), error = %e, "native open failed");
                return Ok(None);
            }
        };

        debug!(name, path = %path.display(), %mode, "opened native file");
        let handle = NativeHandle::new(name, mode, file)?;
        Ok(Some(Box::new(handle)))
    }

    fn list_dir(&self, path: &str) -> Option<DirListing> {
        let rel = Self::relative(path)?;
        let (dir, entries) = self.roots.iter().find_map(|root| {
            let dir = root.join(rel);
            fs::read_dir(&dir).ok().map(|entries| (dir, entries))
        })?;

        let mut listing = DirListing::new();
        for entry in entries.flatten() {
            // file_type() does not follow symlinks
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            let name = entry.file_name().to_string_lossy().into_owned();
            if file_type.is_dir() {
                listing.subdirs.push(name);
            } else if file_type.is_file() {
                listing.files.push(name);
            } else if file_type.is_symlink()
                && fs::metadata(entry.path()).is_ok_and(|meta| meta.is_file())
            {
                listing.files.push(name);
            }
        }

        trace!(
            path = %dir.display(),
            subdirs = listing.subdirs.len(),
            files = listing.files.len(),
            "listed native directory"
        );
        Some(listing)
    }

    fn exists(&self, name: &str) -> bool {
        self.locate(name).is_some()
    }
}

/// The mapped view of a read-only handle.
enum Mapping {
    /// Zero-length files have nothing to map.
    Empty,
    Mapped(Mmap),
}

impl Mapping {
    fn as_slice(&self) -> &[u8] {
        match self {
            Mapping::Empty => &[],
            Mapping::Mapped(map) => &map[..],
        }
    }
}

/// Handle on a native file descriptor.
///
/// The cursor is the descriptor's own file offset, so every holder of a
/// shared handle moves the same cursor. Dropping the handle unmaps any
/// mapping, then closes the descriptor.
pub struct NativeHandle {
    name: String,
    mode: OpenMode,
    size: u64,
    // Declared before `file` so the mapping is released first.
    map: OnceLock<Mapping>,
    file: File,
}

impl NativeHandle {
    /// Wrap an opened file.
    ///
    /// Unless `mode` is write-only the size is read from the descriptor; a
    /// failed stat makes the handle unusable.
    pub fn new(name: impl Into<String>, mode: OpenMode, file: File) -> FileIoResult<Self> {
        let name = name.into();
        let size = match mode {
            OpenMode::WriteOnly => 0,
            OpenMode::ReadOnly | OpenMode::ReadWrite => file
                .metadata()
                .map_err(|e| FileIoError::invalid_handle(&name, e))?
                .len(),
        };
        Ok(Self {
            name,
            mode,
            size,
            map: OnceLock::new(),
            file,
        })
    }
}

impl std::fmt::Debug for NativeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeHandle")
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("size", &self.size)
            .field("mapped", &self.map.get().is_some())
            .finish()
    }
}

impl FileHandle for NativeHandle {
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
        if !self.mode.can_read() {
            return Err(FileIoError::ReadOnWriteOnly(self.name.clone()));
        }
        if buf.is_empty() {
            return Ok(0);
        }
        match (&self.file).read(buf) {
            Ok(0) => Err(FileIoError::read(&self.name, "no data transferred")),
            Ok(n) => Ok(n),
            Err(e) => Err(FileIoError::read(&self.name, e)),
        }
    }

    fn write(&self, buf: &[u8]) -> FileIoResult<usize> {
        if !self.mode.can_write() {
            return Err(FileIoError::WriteOnReadOnly(self.name.clone()));
        }
        if buf.is_empty() {
            return Ok(0);
        }
        match (&self.file).write(buf) {
            Ok(0) => Err(FileIoError::write(&self.name, "no data transferred")),
            Ok(n) => Ok(n),
            Err(e) => Err(FileIoError::write(&self.name, e)),
        }
    }

    fn seek(&self, offset: i64, origin: SeekOrigin) -> FileIoResult<u64> {
        let target = origin
            .to_seek_from(offset)
            .ok_or_else(|| FileIoError::seek(&self.name, "negative offset from start"))?;
        (&self.file)
            .seek(target)
            .map_err(|e| FileIoError::seek(&self.name, e))
    }

    fn mmap(&self) -> FileIoResult<&[u8]> {
        if self.mode != OpenMode::ReadOnly {
            return Err(FileIoError::MapForWrite(self.name.clone()));
        }
        if let Some(mapping) = self.map.get() {
            return Ok(mapping.as_slice());
        }

        let len = usize::try_from(self.size)
            .map_err(|_| FileIoError::map(&self.name, "file too large to map"))?;
        let mapping = if len == 0 {
            Mapping::Empty
        } else {
            // SAFETY: the map is read-only and lives no longer than `self.file`.
            // Truncation of the file by another process is outside our control,
            // as with any shared file mapping.
            let map = unsafe { MmapOptions::new().len(len).map(&self.file) }
                .map_err(|e| FileIoError::map(&self.name, e))?;
            trace!(name = self.name.as_str(), len, "mapped native file");
            Mapping::Mapped(map)
        };
        Ok(self.map.get_or_init(|| mapping).as_slice())
    }
}

impl Drop for NativeHandle {
    fn drop(&mut self) {
        if let Some(Mapping::Mapped(map)) = self.map.take() {
            trace!(name = self.name.as_str(), len = map.len(), "unmapping native file");
            drop(map);
        }
        trace!(name = self.name.as_str(), "closing native file");
    }
}
