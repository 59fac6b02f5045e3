//! Marker persistence
//!
//! Saves a stream's markers to a plain text file and reads them back.
//!
//! # Format
//!
//! ```text
//! <marker-name>
//! <hex-encoded-position-token>
//! ```
//!
//! One pair of lines per marker, repeated until end of file. `LAST` is never
//! written, and a file that contains it is rejected.

mod codec;

pub use codec::{decode, encode, load, merge, read, save};

#[cfg(test)]
mod tests;
