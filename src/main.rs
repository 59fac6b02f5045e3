// Allow common clippy pedantic lints
#![allow(clippy::must_use_candidate)]
#![allow(clippy::needless_pass_by_value)]

//! seekmark CLI
//!
//! Command-line interface for named file position markers

use clap::Parser;
use seekmark::cli::{Cli, Runner};

fn main() {
    let cli = Cli::parse();
    let runner = match Runner::new(cli) {
        Ok(runner) => runner,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(runner.log_level().into()),
        )
        .init();

    if let Err(e) = runner.run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
