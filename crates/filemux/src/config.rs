//! TOML configuration for building a [`FileManager`].
//!
//! ```toml
//! cache_capacity = 32
//! search_paths = ["~/game/mods", "$GAME_DATA/assets"]
//! include_executable_dir = true
//! save_dir = "mygame"
//! ```
//!
//! Roots are searched in this order: `search_paths` (with `~` and
//! environment variables expanded), the executable's directory, then
//! `save_dir` under the per-user config directory.

use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::backends::NativeBackend;
use crate::location;
use crate::manager::{DEFAULT_CACHE_CAPACITY, FileManager};

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("cannot expand search path {path}: {reason}")]
    Expand { path: String, reason: String },
}

/// Settings for a [`FileManager`] backed by one [`NativeBackend`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileManagerConfig {
    /// Maximum number of cached handles.
    pub cache_capacity: usize,
    /// Extra roots, searched first, in order.
    pub search_paths: Vec<String>,
    /// Search the running executable's directory.
    pub include_executable_dir: bool,
    /// Application folder under the per-user config directory, searched last.
    pub save_dir: Option<String>,
}

impl Default for FileManagerConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            search_paths: Vec::new(),
            include_executable_dir: true,
            save_dir: None,
        }
    }
}

impl FileManagerConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Backend roots in search order.
    pub fn resolve_roots(&self) -> Result<Vec<PathBuf>, ConfigError> {
        let mut roots = Vec::with_capacity(self.search_paths.len() + 2);
        for raw in &self.search_paths {
            let expanded = shellexpand::full(raw).map_err(|e| ConfigError::Expand {
                path: raw.clone(),
                reason: e.to_string(),
            })?;
            roots.push(PathBuf::from(expanded.as_ref()));
        }
        if self.include_executable_dir {
            roots.push(location::executable_dir());
        }
        if let Some(app) = &self.save_dir {
            roots.push(location::save_dir().join(app));
        }
        Ok(roots)
    }

    /// Build a manager with one native backend over [`resolve_roots`](Self::resolve_roots).
    ///
    /// With no roots at all the manager has no backends, and every open
    /// fails with `NoBackendsRegistered`.
    pub fn build(&self) -> Result<FileManager, ConfigError> {
        let roots = self.resolve_roots()?;
        debug!(capacity = self.cache_capacity, roots = ?roots, "building file manager");

        let mut manager = FileManager::new(self.cache_capacity);
        if !roots.is_empty() {
            manager.register(NativeBackend::with_roots(roots));
        }
        Ok(manager)
    }
}
