// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::needless_pass_by_value)]

//! # seekmark
//!
//! Named position markers for seekable streams.
//!
//! An application records a stream's current resumable position under a
//! name, jumps back to it later, and can save the set of markers to a side
//! file. The reserved marker `LAST` always holds the position from just
//! before the most recent jump, so `goto_marker("LAST")` works as a one-step
//! undo.
//!
//! ## Features
//!
//! - **Opaque positions**: Streams hand out tokens for their exact resume point,
//!   buffered read-ahead included
//! - **Side-table markers**: Marker state is kept outside the stream object,
//!   keyed by stream identity
//! - **Fork safety**: After the process is duplicated, each copy relocates its
//!   tables and the two never see each other's markers
//! - **Persistence**: Markers save to and load from a plain `name` / `hex` line format
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use seekmark::{MarkedStream, MarkerService, OpenMode, Result};
//! use std::io::BufRead;
//!
//! fn main() -> Result<()> {
//!     let service = MarkerService::new();
//!     let mut stream = MarkedStream::open(&service, "data.txt", OpenMode::Read)?;
//!
//!     let mut line = String::new();
//!     stream.read_line(&mut line)?;
//!     stream.set_marker("line2")?;
//!
//!     stream.read_line(&mut line)?;
//!     stream.goto_marker("line2")?; // back to the start of line 2
//!     stream.goto_marker("LAST")?;  // and forward again
//!
//!     stream.save_markers("data.txt.marks")?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    MarkedStream<S>                       │
//! │  set_marker  goto_marker  markers  save/load_markers     │
//! └───────────────┬──────────────────────────┬───────────────┘
//!                 │                          │
//! ┌───────────────┴───────────┐  ┌───────────┴───────────────┐
//! │      MarkerService        │  │        Seekable S         │
//! ├───────────────────────────┤  ├───────────────────────────┤
//! │ StreamId → marker table   │  │ position() → token        │
//! │ StreamId → Weak<handle>   │  │ restore(token)            │
//! │ after_duplication / fork  │  │ FileStream, Cursor<T>     │
//! └───────────────────────────┘  └───────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(missing_docs)] // TODO: Document error variant fields and CLI args before 1.0

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types: position tokens, stream identities
pub mod types;

/// Stream and persistence configuration
pub mod config;

/// Marker tables and the duplication registry
pub mod registry;

/// Seekable sources and the marked stream facade
pub mod stream;

/// Marker file codec
pub mod persist;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

pub use config::StreamConfig;
pub use registry::{MarkerService, StreamHandle};
pub use stream::{FileStream, MarkedStream, Seekable};

#[cfg(unix)]
pub use registry::ForkOutcome;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
