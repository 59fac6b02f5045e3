//! CLI module
//!
//! Command-line interface for marking and revisiting positions in files.
//!
//! # Commands
//!
//! - `mark` - Record a marker after skipping some lines
//! - `read` - Jump to a saved marker and print what follows
//! - `list` - Show the markers saved for a file

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
