//! Common types used throughout seekmark
//!
//! This module contains the position token, stream identity,
//! and the per-stream marker map shared by every other module.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ============================================================================
// Constants
// ============================================================================

/// Reserved marker holding the position before the most recent jump
pub const LAST_MARKER: &str = "LAST";

// ============================================================================
// Type Aliases
// ============================================================================

/// Marker name to position token, for a single stream
pub type MarkerMap = HashMap<String, PositionToken>;

// ============================================================================
// Position Token
// ============================================================================

/// Opaque resumable position produced by a [`Seekable`](crate::stream::Seekable) stream.
///
/// The bytes only mean something to the stream implementation that produced
/// them. Equality is provided so tokens can be compared in tests; nothing
/// else should be inferred from it.
#[derive(Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct PositionToken(Vec<u8>);

impl PositionToken {
    /// Wrap raw token bytes
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Raw token bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume the token, returning its bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Lowercase hex encoding of the token bytes
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Decode a token from hex (either case)
    pub fn from_hex(s: &str) -> std::result::Result<Self, hex::FromHexError> {
        hex::decode(s).map(Self)
    }

    /// Number of token bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the token carries no bytes
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for PositionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PositionToken({})", self.to_hex())
    }
}

impl fmt::Display for PositionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<PositionToken> for String {
    fn from(token: PositionToken) -> Self {
        token.to_hex()
    }
}

impl TryFrom<String> for PositionToken {
    type Error = hex::FromHexError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

// ============================================================================
// Stream Identity
// ============================================================================

/// Identity of one live stream within one process.
///
/// The serial is unique within a [`MarkerService`](crate::registry::MarkerService);
/// the pid component changes when the process is duplicated, which is what
/// forces the registry to relocate marker tables in the copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamId {
    pid: u32,
    serial: u64,
}

impl StreamId {
    /// Build an identity from its parts
    pub fn new(pid: u32, serial: u64) -> Self {
        Self { pid, serial }
    }

    /// Process id this identity was computed in
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Per-service serial number
    pub fn serial(&self) -> u64 {
        self.serial
    }

    /// The same stream as seen from process `pid`
    pub fn in_process(self, pid: u32) -> Self {
        Self::new(pid, self.serial)
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.pid, self.serial)
    }
}

// ============================================================================
// Open Mode
// ============================================================================

/// How the underlying file is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenMode {
    /// Read only
    #[default]
    Read,
    /// Read and write, without truncating
    ReadWrite,
}

impl OpenMode {
    /// Translate into `std::fs::OpenOptions`
    pub fn options(self) -> std::fs::OpenOptions {
        let mut options = std::fs::OpenOptions::new();
        options.read(true);
        if self == OpenMode::ReadWrite {
            options.write(true);
        }
        options
    }
}

// ============================================================================
// Log Level
// ============================================================================

/// Log level for the command-line tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}
