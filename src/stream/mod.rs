//! Markable stream module
//!
//! Wraps any positioned stream with named markers and the `LAST` undo slot.
//!
//! # Overview
//!
//! - `Seekable` - What a stream must provide: an opaque position token and a way back to it
//! - `FileStream` - Buffered file implementation of `Seekable`
//! - `MarkedStream` - The facade applications hold; routes marker operations
//!   through the [`MarkerService`](crate::registry::MarkerService)

mod marked;
mod source;

pub use marked::MarkedStream;
pub use source::{FileStream, Seekable, DEFAULT_BUFFER_CAPACITY};
