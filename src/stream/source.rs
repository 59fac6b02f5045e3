//! Positioned stream sources
//!
//! Anything that can hand out a resumable position token and later return to
//! it can carry markers. Tokens produced here are the big-endian `u64` offset
//! of the next unread byte.

use crate::error::{Error, Result};
use crate::types::{OpenMode, PositionToken};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Default read buffer capacity for [`FileStream`]
pub const DEFAULT_BUFFER_CAPACITY: usize = 8 * 1024;

const OFFSET_TOKEN_LEN: usize = 8;

/// A stream that can report and restore its exact resume point
pub trait Seekable {
    /// Token for the point the next read would resume from.
    ///
    /// Fails with [`Error::PositionUnavailable`] when the stream cannot tell.
    fn position(&mut self) -> Result<PositionToken>;

    /// Return to a token previously produced by [`Seekable::position`].
    ///
    /// Fails with [`Error::SeekFailure`] when the token cannot be honored.
    fn restore(&mut self, token: &PositionToken) -> Result<()>;
}

fn offset_token(offset: u64) -> PositionToken {
    PositionToken::new(offset.to_be_bytes().to_vec())
}

fn token_offset(token: &PositionToken) -> Result<u64> {
    let bytes: [u8; OFFSET_TOKEN_LEN] = token.as_bytes().try_into().map_err(|_| {
        Error::seek_failure(format!(
            "expected a {OFFSET_TOKEN_LEN}-byte token, got {} bytes",
            token.len()
        ))
    })?;
    Ok(u64::from_be_bytes(bytes))
}

fn check_in_range(offset: u64, len: u64) -> Result<()> {
    if offset > len {
        return Err(Error::seek_failure(format!(
            "offset {offset} is past the end of the stream ({len} bytes)"
        )));
    }
    Ok(())
}

// ============================================================================
// File Stream
// ============================================================================

/// Buffered, seekable file
///
/// Positions account for read-ahead, so a token always names the next byte a
/// read would return rather than the OS file offset.
#[derive(Debug)]
pub struct FileStream {
    path: PathBuf,
    reader: BufReader<File>,
}

impl FileStream {
    /// Open `path` with the default buffer capacity
    pub fn open(path: impl AsRef<Path>, mode: OpenMode) -> Result<Self> {
        Self::with_capacity(path, mode, DEFAULT_BUFFER_CAPACITY)
    }

    /// Open `path` with a read buffer of `capacity` bytes
    pub fn with_capacity(path: impl AsRef<Path>, mode: OpenMode, capacity: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = mode.options().open(&path)?;
        Ok(Self {
            path,
            reader: BufReader::with_capacity(capacity, file),
        })
    }

    /// Path the stream was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Underlying file
    pub fn get_ref(&self) -> &File {
        self.reader.get_ref()
    }
}

impl Seekable for FileStream {
    fn position(&mut self) -> Result<PositionToken> {
        let offset = self
            .reader
            .stream_position()
            .map_err(|e| Error::position_unavailable(e.to_string()))?;
        Ok(offset_token(offset))
    }

    fn restore(&mut self, token: &PositionToken) -> Result<()> {
        let offset = token_offset(token)?;
        let len = self
            .reader
            .get_ref()
            .metadata()
            .map_err(|e| Error::seek_failure(e.to_string()))?
            .len();
        check_in_range(offset, len)?;

        self.reader
            .seek(SeekFrom::Start(offset))
            .map_err(|e| Error::seek_failure(e.to_string()))?;
        Ok(())
    }
}

impl Read for FileStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl BufRead for FileStream {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.reader.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.reader.consume(amt);
    }
}

// ============================================================================
// In-memory streams
// ============================================================================

impl<T: AsRef<[u8]>> Seekable for Cursor<T> {
    fn position(&mut self) -> Result<PositionToken> {
        Ok(offset_token(Cursor::position(self)))
    }

    fn restore(&mut self, token: &PositionToken) -> Result<()> {
        let offset = token_offset(token)?;
        check_in_range(offset, self.get_ref().as_ref().len() as u64)?;
        self.set_position(offset);
        Ok(())
    }
}
