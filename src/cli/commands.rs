//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Named position markers for text files
#[derive(Parser, Debug)]
#[command(name = "seekmark")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Markers file (defaults to `<file>.<markers_extension>`)
    #[arg(short, long, global = true)]
    pub markers: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record a marker after skipping some lines
    Mark {
        /// Data file
        file: PathBuf,

        /// Marker name
        #[arg(short, long)]
        name: String,

        /// Lines to read before recording the position
        #[arg(long, default_value = "0")]
        skip_lines: usize,
    },

    /// Jump to a saved marker and print the lines that follow
    Read {
        /// Data file
        file: PathBuf,

        /// Marker name
        #[arg(long)]
        marker: String,

        /// Number of lines to print
        #[arg(short, long, default_value = "1")]
        lines: usize,
    },

    /// Show the markers saved for a file
    List {
        /// Data file
        file: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        format: OutputFormat,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON object of name to hex token
    Json,
    /// One `name<TAB>token` line per marker
    Pretty,
}
