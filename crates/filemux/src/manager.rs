//! File manager: backend probing plus a bounded handle cache.
//!
//! Backends are probed in registration order; the first one that produces a
//! handle wins. Handles opened with [`CacheMode::Cache`] are kept by name so
//! later opens skip probing and get the same handle back, rewound.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::backend::Backend;
use crate::error::{FileIoError, FileIoResult};
use crate::handle::SharedHandle;
use crate::types::{CacheMode, DirListing, OpenMode};

/// Default number of cached handles.
pub const DEFAULT_CACHE_CAPACITY: usize = 16;

/// Resolves logical names to handles through an ordered backend chain.
///
/// The manager is a plain value: build as many as needed, each with its own
/// backends and cache. Mutating operations take `&mut self`; share one across
/// threads only behind your own lock.
pub struct FileManager {
    backends: Vec<Box<dyn Backend>>,
    cache: HashMap<String, SharedHandle>,
    capacity: usize,
}

impl std::fmt::Debug for FileManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileManager")
            .field("backends", &self.backends)
            .field("cached", &self.cache.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl Default for FileManager {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl FileManager {
    /// Create a manager holding at most `capacity` cached handles.
    pub fn new(capacity: usize) -> Self {
        Self {
            backends: Vec::new(),
            cache: HashMap::new(),
            capacity,
        }
    }

    /// Append a backend to the probing order.
    pub fn register(&mut self, backend: impl Backend + 'static) {
        self.register_boxed(Box::new(backend));
    }

    /// Append an already boxed backend to the probing order.
    pub fn register_boxed(&mut self, backend: Box<dyn Backend>) {
        debug!(backend = backend.label(), position = self.backends.len(), "registering backend");
        self.backends.push(backend);
    }

    /// Open `name` read-only, caching the handle.
    pub fn open_read(&mut self, name: &str) -> FileIoResult<SharedHandle> {
        self.open(name, OpenMode::ReadOnly, CacheMode::Cache)
    }

    /// Open `name`.
    ///
    /// A cached handle is rewound and returned as-is, whatever `mode` it was
    /// first opened with; a mode mismatch surfaces on the first read or
    /// write. On a miss the backends are probed in order.
    ///
    /// Caching is best effort: when the cache is full one entry is purged
    /// first, and if that fails the handle is returned uncached.
    pub fn open(
        &mut self,
        name: &str,
        mode: OpenMode,
        cache: CacheMode,
    ) -> FileIoResult<SharedHandle> {
        if let Some(handle) = self.cache.get(name) {
            debug!(name, "opening from cache");
            handle.reset()?;
            return Ok(Arc::clone(handle));
        }

        debug!(name, %mode, "opening file");
        if self.backends.is_empty() {
            return Err(FileIoError::NoBackendsRegistered(name.to_string()));
        }

        let mut opened = None;
        for backend in &self.backends {
            trace!(name, backend = backend.label(), "probing");
            if let Some(handle) = backend.open(name, mode)? {
                opened = Some(SharedHandle::from(handle));
                break;
            }
        }
        let handle = opened.ok_or_else(|| FileIoError::no_such_file(name))?;

        if cache == CacheMode::Cache {
            if self.cache.len() < self.capacity || self.clean(Some(1)) {
                trace!(name, "caching handle");
                self.cache.insert(name.to_string(), Arc::clone(&handle));
            } else {
                trace!(name, capacity = self.capacity, "cache full, not caching");
            }
        }

        Ok(handle)
    }

    /// Drop `count` entries from the cache, or all of them for `None`.
    ///
    /// Returns whether the full count was removed. Which entries go first is
    /// unspecified. Handles still held by callers stay open.
    pub fn clean(&mut self, count: Option<usize>) -> bool {
        let requested = count.unwrap_or(self.cache.len());
        let victims: Vec<String> = self.cache.keys().take(requested).cloned().collect();
        for name in &victims {
            trace!(name = name.as_str(), "purging cached handle");
            self.cache.remove(name);
        }
        victims.len() == requested
    }

    /// List `path` through the first backend able to.
    pub fn list_directory(&self, path: &str) -> FileIoResult<DirListing> {
        self.backends
            .iter()
            .find_map(|backend| {
                trace!(path, backend = backend.label(), "probing listing");
                backend.list_dir(path)
            })
            .ok_or_else(|| FileIoError::path_not_found(path))
    }

    /// Check whether any backend can open `name` read-only.
    ///
    /// Neither consults nor fills the cache.
    pub fn exists(&self, name: &str) -> bool {
        self.backends.iter().any(|backend| backend.exists(name))
    }

    /// Returns true if `name` has a cached handle.
    pub fn is_cached(&self, name: &str) -> bool {
        self.cache.contains_key(name)
    }

    /// Number of cached handles.
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Maximum number of cached handles.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of registered backends.
    pub fn backend_count(&self) -> usize {
        self.backends.len()
    }
}
