//! File I/O error types.

use std::io;
use strum::{AsRefStr, Display};
use thiserror::Error;

/// Discrete error kind, for callers that branch on the failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    NoBackendsRegistered,
    NoSuchFile,
    PathNotFound,
    InvalidHandle,
    ReadOnWriteOnly,
    WriteOnReadOnly,
    ReadError,
    WriteError,
    SeekError,
    MapForWriteNotSupported,
    MapError,
}

impl ErrorKind {
    /// Returns true for lookup misses the caller may recover from (e.g. by
    /// trying another name). I/O faults are not recoverable.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ErrorKind::NoSuchFile | ErrorKind::PathNotFound)
    }
}

/// File I/O error type.
///
/// Every variant carries the reason shown by `Display`; [`FileIoError::kind`]
/// gives the discrete class.
#[derive(Debug, Error)]
pub enum FileIoError {
    /// `open` reached the probing stage with no backend to ask.
    #[error("no backends registered (opening {0})")]
    NoBackendsRegistered(String),

    /// No backend could open the name.
    #[error("unable to open file: {0}")]
    NoSuchFile(String),

    /// No backend could list the directory.
    #[error("unable to list directory: {0}")]
    PathNotFound(String),

    /// The handle's underlying resource is gone or broken.
    #[error("invalid handle for {name}: {reason}")]
    InvalidHandle { name: String, reason: String },

    #[error("read attempted on write-only file: {0}")]
    ReadOnWriteOnly(String),

    #[error("write attempted on read-only file: {0}")]
    WriteOnReadOnly(String),

    #[error("read from {name} failed: {reason}")]
    Read { name: String, reason: String },

    #[error("write to {name} failed: {reason}")]
    Write { name: String, reason: String },

    #[error("seek failed for {name}: {reason}")]
    Seek { name: String, reason: String },

    #[error("file mapping supported only for read-only files: {0}")]
    MapForWrite(String),

    #[error("mapping {name} failed: {reason}")]
    Map { name: String, reason: String },
}

impl FileIoError {
    /// The discrete kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FileIoError::NoBackendsRegistered(_) => ErrorKind::NoBackendsRegistered,
            FileIoError::NoSuchFile(_) => ErrorKind::NoSuchFile,
            FileIoError::PathNotFound(_) => ErrorKind::PathNotFound,
            FileIoError::InvalidHandle { .. } => ErrorKind::InvalidHandle,
            FileIoError::ReadOnWriteOnly(_) => ErrorKind::ReadOnWriteOnly,
            FileIoError::WriteOnReadOnly(_) => ErrorKind::WriteOnReadOnly,
            FileIoError::Read { .. } => ErrorKind::ReadError,
            FileIoError::Write { .. } => ErrorKind::WriteError,
            FileIoError::Seek { .. } => ErrorKind::SeekError,
            FileIoError::MapForWrite(_) => ErrorKind::MapForWriteNotSupported,
            FileIoError::Map { .. } => ErrorKind::MapError,
        }
    }

    /// Create a NoSuchFile error.
    pub fn no_such_file(name: impl Into<String>) -> Self {
        Self::NoSuchFile(name.into())
    }

    /// Create a PathNotFound error.
    pub fn path_not_found(path: impl Into<String>) -> Self {
        Self::PathNotFound(path.into())
    }

    /// Create an InvalidHandle error.
    pub fn invalid_handle(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidHandle {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a read fault.
    pub fn read(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::Read {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a write fault.
    pub fn write(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::Write {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a seek fault.
    pub fn seek(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::Seek {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a mapping fault.
    pub fn map(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::Map {
            name: name.into(),
            reason: reason.to_string(),
        }
    }
}

/// Convert FileIoError to std::io::Error for compatibility.
impl From<FileIoError> for io::Error {
    fn from(e: FileIoError) -> Self {
        let kind = match e.kind() {
            ErrorKind::NoSuchFile | ErrorKind::PathNotFound => io::ErrorKind::NotFound,
            ErrorKind::ReadOnWriteOnly
            | ErrorKind::WriteOnReadOnly
            | ErrorKind::MapForWriteNotSupported => io::ErrorKind::PermissionDenied,
            ErrorKind::SeekError => io::ErrorKind::InvalidInput,
            _ => io::ErrorKind::Other,
        };
        io::Error::new(kind, e.to_string())
    }
}

/// File I/O result type.
pub type FileIoResult<T> = Result<T, FileIoError>;
