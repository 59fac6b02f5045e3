//! Marker table and duplication registry
//!
//! Marker state lives outside the stream objects, in a side table keyed by
//! [`StreamId`](crate::types::StreamId). The same service keeps weak
//! references to every live stream so that, after the process is duplicated,
//! each copy can move its tables to the identities it now sees.
//!
//! # Overview
//!
//! - `MarkerService` - Marker tables plus the weak registry of live streams
//! - `StreamHandle` - Shared identity cell owned by each open stream
//! - `ForkOutcome` - Which side of a `fork()` the caller is on (unix only)

mod service;

pub use service::{MarkerService, StreamHandle};

#[cfg(unix)]
pub use service::ForkOutcome;
