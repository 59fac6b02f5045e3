//! Line-oriented marker codec

use crate::error::{Error, Result};
use crate::types::{MarkerMap, PositionToken, LAST_MARKER};
use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Write every marker except `LAST` as name/hex line pairs.
///
/// Markers are written in name order. Returns the number written.
pub fn encode<W: Write>(table: &MarkerMap, mut writer: W) -> Result<usize> {
    let mut entries: Vec<(&String, &PositionToken)> = table
        .iter()
        .filter(|(name, _)| name.as_str() != LAST_MARKER)
        .collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    for (name, token) in &entries {
        writeln!(writer, "{name}")?;
        writeln!(writer, "{}", token.to_hex())?;
    }
    writer.flush()?;

    Ok(entries.len())
}

/// Decode name/hex line pairs into a fresh map.
///
/// Any malformed record fails the whole decode; nothing is returned partially.
pub fn decode<R: BufRead>(reader: R) -> Result<MarkerMap> {
    let mut table = MarkerMap::new();
    let mut pending: Option<(usize, String)> = None;

    for (index, bytes) in reader.split(b'\n').enumerate() {
        let line_no = index + 1;
        let mut line = String::from_utf8(bytes?)
            .map_err(|_| Error::format(line_no, "line is not valid UTF-8"))?;
        if line.ends_with('\r') {
            line.pop();
        }

        match pending.take() {
            None => {
                if line.is_empty() {
                    return Err(Error::format(line_no, "empty marker name"));
                }
                if line == LAST_MARKER {
                    return Err(Error::format(
                        line_no,
                        format!("'{LAST_MARKER}' cannot be loaded from a file"),
                    ));
                }
                pending = Some((line_no, line));
            }
            Some((_, name)) => {
                let token = PositionToken::from_hex(&line).map_err(|e| {
                    Error::format(line_no, format!("invalid token for '{name}': {e}"))
                })?;
                table.insert(name, token);
            }
        }
    }

    if let Some((line_no, name)) = pending {
        return Err(Error::format(
            line_no,
            format!("marker '{name}' has no position token"),
        ));
    }

    Ok(table)
}

/// Save `table` to `path`, replacing the file atomically.
///
/// A read-only `path` is refused with `Io` before anything is written, even
/// though the rename itself would only need a writable directory.
pub fn save(table: &MarkerMap, path: impl AsRef<Path>) -> Result<usize> {
    let path = path.as_ref();
    ensure_writable(path)?;
    let temp_path = temp_path_for(path);

    // Write to temp file first, then rename for atomicity
    let written = write_file(table, &temp_path).and_then(|count| {
        std::fs::rename(&temp_path, path)?;
        Ok(count)
    });
    if written.is_err() {
        let _ = std::fs::remove_file(&temp_path);
    }

    let count = written?;
    debug!(path = %path.display(), count, "Saved markers");
    Ok(count)
}

/// Read and decode the markers file at `path`
pub fn read(path: impl AsRef<Path>) -> Result<MarkerMap> {
    let file = File::open(path.as_ref())?;
    decode(BufReader::new(file))
}

/// Merge the markers stored at `path` into `table`.
///
/// The file is decoded completely first; on any error `table` is unchanged.
pub fn load(table: &mut MarkerMap, path: impl AsRef<Path>) -> Result<usize> {
    let count = merge(table, read(path.as_ref())?);
    debug!(path = %path.as_ref().display(), count, "Loaded markers");
    Ok(count)
}

/// Apply decoded markers to `table`, overwriting same-named entries.
/// Returns how many were applied.
pub fn merge(table: &mut MarkerMap, loaded: MarkerMap) -> usize {
    let count = loaded.len();
    table.extend(loaded);
    count
}

fn ensure_writable(path: &Path) -> Result<()> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.permissions().readonly() => Err(io::Error::new(
            io::ErrorKind::PermissionDenied,
            format!("{} is read-only", path.display()),
        )
        .into()),
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn write_file(table: &MarkerMap, path: &Path) -> Result<usize> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    let count = encode(table, &mut writer)?;
    writer.get_ref().sync_all()?;
    Ok(count)
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}
