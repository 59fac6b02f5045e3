//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::StreamConfig;
use crate::error::{Result, ResultExt};
use crate::persist;
use crate::registry::MarkerService;
use crate::stream::{FileStream, MarkedStream};
use crate::types::{OpenMode, PositionToken};
use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

/// CLI runner
pub struct Runner {
    cli: Cli,
    config: StreamConfig,
    service: MarkerService,
}

impl Runner {
    /// Create a new runner, loading the configuration file if one was given
    pub fn new(cli: Cli) -> Result<Self> {
        let config = match &cli.config {
            Some(path) => StreamConfig::from_file(path)?,
            None => StreamConfig::default(),
        };

        Ok(Self {
            cli,
            config,
            service: MarkerService::global().clone(),
        })
    }

    /// Effective log level
    pub fn log_level(&self) -> tracing::Level {
        if self.cli.verbose {
            return tracing::Level::DEBUG;
        }
        self.config
            .log_level
            .map_or(tracing::Level::INFO, tracing::Level::from)
    }

    /// Run the CLI command, printing to stdout
    pub fn run(&self) -> Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.run_to(&mut out)
    }

    /// Run the CLI command, printing to `out`
    pub fn run_to<W: Write>(&self, out: &mut W) -> Result<()> {
        match &self.cli.command {
            Commands::Mark {
                file,
                name,
                skip_lines,
            } => self.mark(file, name, *skip_lines, out),
            Commands::Read {
                file,
                marker,
                lines,
            } => self.read(file, marker, *lines, out),
            Commands::List { file, format } => self.list(file, *format, out),
        }
    }

    fn markers_path(&self, file: &Path) -> PathBuf {
        self.cli
            .markers
            .clone()
            .unwrap_or_else(|| self.config.markers_path_for(file))
    }

    fn open(&self, file: &Path) -> Result<MarkedStream<FileStream>> {
        MarkedStream::open_with_config(&self.service, file, OpenMode::Read, &self.config)
            .with_context(|| format!("Failed to open {}", file.display()))
    }

    /// Record a marker, merging it into the existing markers file
    fn mark<W: Write>(&self, file: &Path, name: &str, skip_lines: usize, out: &mut W) -> Result<()> {
        let markers_path = self.markers_path(file);
        let mut stream = self.open(file)?;
        if markers_path.exists() {
            stream.load_markers(&markers_path)?;
        }

        let mut line = String::new();
        for _ in 0..skip_lines {
            line.clear();
            if stream.read_line(&mut line)? == 0 {
                break;
            }
        }

        stream.set_marker(name)?;
        stream.save_markers(&markers_path)?;

        let token = stream.marker(name)?.unwrap_or_default();
        writeln!(
            out,
            "Marked '{name}' at {token} in {}",
            markers_path.display()
        )?;
        Ok(())
    }

    /// Jump to a saved marker and print `lines` lines
    fn read<W: Write>(&self, file: &Path, marker: &str, lines: usize, out: &mut W) -> Result<()> {
        let markers_path = self.markers_path(file);
        let mut stream = self.open(file)?;
        stream
            .load_markers(&markers_path)
            .with_context(|| format!("Failed to load {}", markers_path.display()))?;
        stream.goto_marker(marker)?;

        let mut line = String::new();
        for _ in 0..lines {
            line.clear();
            if stream.read_line(&mut line)? == 0 {
                break;
            }
            out.write_all(line.as_bytes())?;
        }
        Ok(())
    }

    /// Print the markers saved for a file
    fn list<W: Write>(&self, file: &Path, format: OutputFormat, out: &mut W) -> Result<()> {
        let markers_path = self.markers_path(file);
        let markers: BTreeMap<String, PositionToken> = persist::read(&markers_path)
            .with_context(|| format!("Failed to load {}", markers_path.display()))?
            .into_iter()
            .collect();

        match format {
            OutputFormat::Json => {
                writeln!(out, "{}", serde_json::to_string_pretty(&markers)?)?;
            }
            OutputFormat::Pretty => {
                for (name, token) in &markers {
                    writeln!(out, "{name}\t{token}")?;
                }
            }
        }
        Ok(())
    }
}
