//! Backends.
//!
//! Backends implement [`Backend`](crate::Backend) for different storage types.

mod memory;
mod native;

pub use memory::MemoryBackend;
pub use native::{NativeBackend, NativeHandle};
