//! Marked stream facade
//!
//! Marker state is never stored on the stream itself. Every operation goes
//! through the service's table for this stream's identity, which lets the
//! registry relocate it after a duplication.

use super::source::{FileStream, Seekable};
use crate::config::StreamConfig;
use crate::error::{Error, Result};
use crate::persist;
use crate::registry::{MarkerService, StreamHandle};
use crate::types::{OpenMode, PositionToken, StreamId, LAST_MARKER};
use std::io::{self, BufRead, Read};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// A stream with named markers and a `LAST` undo slot
#[derive(Debug)]
pub struct MarkedStream<S> {
    service: MarkerService,
    handle: Arc<StreamHandle>,
    stream: Option<S>,
}

impl MarkedStream<FileStream> {
    /// Open a file and start tracking markers for it
    pub fn open(service: &MarkerService, path: impl AsRef<Path>, mode: OpenMode) -> Result<Self> {
        Self::attach(service, FileStream::open(path, mode)?)
    }

    /// Open a file using the buffer settings from `config`
    pub fn open_with_config(
        service: &MarkerService,
        path: impl AsRef<Path>,
        mode: OpenMode,
        config: &StreamConfig,
    ) -> Result<Self> {
        let stream = FileStream::with_capacity(path, mode, config.buffer_capacity)?;
        Self::attach(service, stream)
    }
}

impl<S: Seekable> MarkedStream<S> {
    /// Start tracking markers for an already open stream.
    ///
    /// The current position becomes the initial `LAST`. Nothing is registered
    /// if that position cannot be read.
    pub fn attach(service: &MarkerService, mut stream: S) -> Result<Self> {
        let initial = stream.position()?;
        let handle = service.register(initial);

        Ok(Self {
            service: service.clone(),
            handle,
            stream: Some(stream),
        })
    }

    /// Token for the point the next read resumes from
    pub fn current_position(&mut self) -> Result<PositionToken> {
        self.stream_mut()?.position()
    }

    /// Move the stream to `token`
    pub fn restore(&mut self, token: &PositionToken) -> Result<()> {
        self.stream_mut()?.restore(token).map_err(|e| match e {
            Error::SeekFailure { .. } | Error::ClosedHandle => e,
            other => Error::seek_failure(other.to_string()),
        })
    }

    /// Record the current position under `name`, replacing any previous value
    pub fn set_marker(&mut self, name: &str) -> Result<()> {
        if name == LAST_MARKER {
            return Err(Error::reserved(name));
        }
        validate_name(name)?;

        let token = self.current_position()?;
        self.service.with_table(&self.handle, |table| {
            table.insert(name.to_string(), token);
        })?;

        debug!(stream = %self.id(), marker = name, "Set marker");
        Ok(())
    }

    /// Jump to the marker `name`, saving the pre-jump position as `LAST`.
    ///
    /// On failure neither the stream position nor `LAST` changes.
    pub fn goto_marker(&mut self, name: &str) -> Result<()> {
        self.ensure_open()?;
        let target = self
            .service
            .with_table(&self.handle, |table| table.get(name).cloned())?
            .ok_or_else(|| Error::unknown_marker(name))?;

        let old = self.current_position()?;
        if let Err(e) = self.restore(&target) {
            return Err(self.roll_back(&old, e));
        }

        self.service.with_table(&self.handle, |table| {
            table.insert(LAST_MARKER.to_string(), old);
        })?;

        debug!(stream = %self.id(), marker = name, "Jumped to marker");
        Ok(())
    }

    /// Jump back to the position before the most recent jump
    pub fn goto_last(&mut self) -> Result<()> {
        self.goto_marker(LAST_MARKER)
    }

    /// Names of all markers, `LAST` included, sorted
    pub fn markers(&self) -> Result<Vec<String>> {
        self.ensure_open()?;
        let mut names = self
            .service
            .with_table(&self.handle, |table| table.keys().cloned().collect::<Vec<_>>())?;
        names.sort();
        Ok(names)
    }

    /// Token stored under `name`, if any
    pub fn marker(&self, name: &str) -> Result<Option<PositionToken>> {
        self.ensure_open()?;
        self.service
            .with_table(&self.handle, |table| table.get(name).cloned())
    }

    /// Delete the marker `name`, returning its token
    pub fn remove_marker(&mut self, name: &str) -> Result<PositionToken> {
        if name == LAST_MARKER {
            return Err(Error::reserved(name));
        }
        self.ensure_open()?;
        self.service
            .with_table(&self.handle, |table| table.remove(name))?
            .ok_or_else(|| Error::unknown_marker(name))
    }

    /// Write every marker except `LAST` to `path`
    pub fn save_markers(&self, path: impl AsRef<Path>) -> Result<usize> {
        self.ensure_open()?;
        let snapshot = self.service.with_table(&self.handle, |table| table.clone())?;
        persist::save(&snapshot, path)
    }

    /// Merge the markers stored in `path` into this stream's table.
    ///
    /// The file is fully decoded before anything is applied, so a malformed
    /// file leaves the table untouched.
    pub fn load_markers(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        self.ensure_open()?;
        let loaded = persist::read(path)?;
        let count = self
            .service
            .with_table(&self.handle, |table| persist::merge(table, loaded))?;

        debug!(stream = %self.id(), count, "Loaded markers");
        Ok(count)
    }

    /// Return to `old` after a failed jump, folding a second failure into the error
    fn roll_back(&mut self, old: &PositionToken, cause: Error) -> Error {
        let Some(stream) = self.stream.as_mut() else {
            return cause;
        };
        match stream.restore(old) {
            Ok(()) => cause,
            Err(e) => {
                warn!(
                    stream = %self.handle.id(),
                    error = %e,
                    "Failed to restore pre-jump position"
                );
                let message = match cause {
                    Error::SeekFailure { message } => message,
                    other => other.to_string(),
                };
                Error::seek_failure(format!(
                    "{message}; pre-jump position could not be restored: {e}"
                ))
            }
        }
    }

        fn stream_mut(&mut self) -> Result<&mut S> {
        self.stream.as_mut().ok_or(Error::ClosedHandle)
    }
}

impl<S> MarkedStream<S> {
    /// Current identity of this stream
    pub fn id(&self) -> StreamId {
        self.handle.id()
    }

    /// Whether the stream is still open
    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// Underlying stream, while open
    pub fn get_ref(&self) -> Option<&S> {
        self.stream.as_ref()
    }

    /// Underlying stream, while open.
    ///
    /// Reading through this moves the position like any other read.
    pub fn get_mut(&mut self) -> Option<&mut S> {
        self.stream.as_mut()
    }

    /// Close the stream and drop its markers. Later calls do nothing.
    pub fn close(&mut self) {
        drop(self.take_stream());
    }

    /// Close the marker side and hand back the underlying stream
    pub fn into_inner(mut self) -> Option<S> {
        self.take_stream()
    }

    fn take_stream(&mut self) -> Option<S> {
        let stream = self.stream.take()?;
        self.service.release(&self.handle);
        debug!(stream = %self.handle.id(), "Closed stream");
        Some(stream)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.stream.is_none() {
            return Err(Error::ClosedHandle);
        }
        Ok(())
    }
}

impl<S> Drop for MarkedStream<S> {
    fn drop(&mut self) {
        self.close();
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains(['\n', '\r']) {
        return Err(Error::invalid_name(name));
    }
    Ok(())
}

fn closed_io_error() -> io::Error {
    io::Error::other(Error::ClosedHandle)
}

impl<S: Read> Read for MarkedStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.stream.as_mut() {
            Some(stream) => stream.read(buf),
            None => Err(closed_io_error()),
        }
    }
}

impl<S: BufRead> BufRead for MarkedStream<S> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        match self.stream.as_mut() {
            Some(stream) => stream.fill_buf(),
            None => Err(closed_io_error()),
        }
    }

    fn consume(&mut self, amt: usize) {
        if let Some(stream) = self.stream.as_mut() {
            stream.consume(amt);
        }
    }
}
