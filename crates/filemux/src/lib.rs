//! # filemux
//!
//! Pluggable virtual filesystem. Callers ask a [`FileManager`] for a logical
//! name and get back a [`FileHandle`] supporting read, write, seek, reset and
//! read-only memory mapping, without knowing which [`Backend`] produced it.
//!
//! - [`FileManager`] - Probes backends in registration order, caches handles
//! - [`FileHandle`] - Contract every open file satisfies
//! - [`Backend`] - Turns a name into a handle, lists directories
//! - [`NativeBackend`] - Host filesystem over ordered root directories
//! - [`MemoryBackend`] - Ephemeral in-memory files
//!
//! ```no_run
//! use filemux::{CacheMode, FileManager, NativeBackend, OpenMode};
//!
//! let mut manager = FileManager::new(8);
//! manager.register(NativeBackend::with_roots(["./data", "./mods"]));
//!
//! let handle = manager.open("textures/wall.png", OpenMode::ReadOnly, CacheMode::Cache)?;
//! let _bytes = handle.mmap()?;
//! # Ok::<(), filemux::FileIoError>(())
//! ```
//!
//! Everything is synchronous. A manager is a plain value with no global
//! state; cached handles are shared, so their cursor is too.

pub mod backends;
pub mod config;
pub mod location;

mod backend;
mod error;
mod handle;
mod manager;
mod types;

pub use backend::Backend;
pub use backends::{MemoryBackend, NativeBackend, NativeHandle};
pub use config::{ConfigError, FileManagerConfig};
pub use error::{ErrorKind, FileIoError, FileIoResult};
pub use handle::{FileHandle, SharedHandle};
pub use manager::{DEFAULT_CACHE_CAPACITY, FileManager};
pub use types::{CacheMode, DirListing, OpenMode, SeekOrigin};
