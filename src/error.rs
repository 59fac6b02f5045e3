//! Error types for seekmark
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for seekmark
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Marker Errors
    // ============================================================================
    #[error("Marker operation on a closed stream")]
    ClosedHandle,

    #[error("Marker name '{name}' is reserved")]
    ReservedName { name: String },

    #[error("Unknown marker: {name}")]
    UnknownMarker { name: String },

    #[error("Invalid marker name {name:?}: names must be non-empty and single-line")]
    InvalidName { name: String },

    // ============================================================================
    // Positioning Errors
    // ============================================================================
    #[error("Stream position unavailable: {message}")]
    PositionUnavailable { message: String },

    #[error("Seek failed: {message}")]
    SeekFailure { message: String },

    // ============================================================================
    // Persistence Errors
    // ============================================================================
    #[error("Malformed markers file at line {line}: {message}")]
    Format { line: usize, message: String },

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a reserved name error
    pub fn reserved(name: impl Into<String>) -> Self {
        Self::ReservedName { name: name.into() }
    }

    /// Create an unknown marker error
    pub fn unknown_marker(name: impl Into<String>) -> Self {
        Self::UnknownMarker { name: name.into() }
    }

    /// Create an invalid name error
    pub fn invalid_name(name: impl Into<String>) -> Self {
        Self::InvalidName { name: name.into() }
    }

    /// Create a position unavailable error
    pub fn position_unavailable(message: impl Into<String>) -> Self {
        Self::PositionUnavailable {
            message: message.into(),
        }
    }

    /// Create a seek failure error
    pub fn seek_failure(message: impl Into<String>) -> Self {
        Self::SeekFailure {
            message: message.into(),
        }
    }

    /// Create a persistence format error
    pub fn format(line: usize, message: impl Into<String>) -> Self {
        Self::Format {
            line,
            message: message.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Check if this error left the stream and its markers untouched
    ///
    /// Every marker-level failure is reported before any state is mutated;
    /// only I/O and persistence errors may have touched the filesystem.
    pub fn is_marker_error(&self) -> bool {
        matches!(
            self,
            Error::ClosedHandle
                | Error::ReservedName { .. }
                | Error::UnknownMarker { .. }
                | Error::InvalidName { .. }
                | Error::PositionUnavailable { .. }
                | Error::SeekFailure { .. }
        )
    }
}

/// Result type alias for seekmark
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::reserved("LAST");
        assert_eq!(err.to_string(), "Marker name 'LAST' is reserved");

        let err = Error::unknown_marker("nope");
        assert_eq!(err.to_string(), "Unknown marker: nope");

        let err = Error::format(3, "odd number of records");
        assert_eq!(
            err.to_string(),
            "Malformed markers file at line 3: odd number of records"
        );
    }

    #[test]
    fn test_is_marker_error() {
        assert!(Error::ClosedHandle.is_marker_error());
        assert!(Error::reserved("LAST").is_marker_error());
        assert!(Error::seek_failure("bad token").is_marker_error());

        assert!(!Error::format(1, "bad hex").is_marker_error());
        assert!(!Error::config("test").is_marker_error());
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::unknown_marker("inner"));
        let with_context = result.context("outer");
        assert!(with_context
            .unwrap_err()
            .to_string()
            .contains("outer: Unknown marker: inner"));
    }
}
