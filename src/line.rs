//! Line reading and writing shared by all sorting stages.

use std::io;
use std::io::prelude::*;
use std::path::Path;

/// Host platform line terminator.
#[cfg(windows)]
pub const LINE_ENDING: &str = "\r\n";
/// Host platform line terminator.
#[cfg(not(windows))]
pub const LINE_ENDING: &str = "\n";

/// Reads the next line into `buf` without its terminator (`\n` or `\r\n`).
/// Returns the number of bytes consumed from the reader, `0` meaning end of input.
pub fn read_line<R: BufRead>(reader: &mut R, buf: &mut String) -> io::Result<usize> {
    buf.clear();
    let consumed = reader.read_line(buf)?;

    if buf.ends_with('\n') {
        buf.pop();
        if buf.ends_with('\r') {
            buf.pop();
        }
    }

    return Ok(consumed);
}

/// Attaches the path of the file being read to a [`read_line`] error.
///
/// Input must be UTF-8 text, anything else fails with [`io::ErrorKind::InvalidData`].
pub fn read_error(path: &Path, err: io::Error) -> io::Error {
    let message = match err.kind() {
        io::ErrorKind::InvalidData => format!("{} is not valid UTF-8 text: {}", path.display(), err),
        _ => format!("failed to read {}: {}", path.display(), err),
    };

    return io::Error::new(err.kind(), message);
}

/// Writes a line followed by the host terminator. Returns the number of bytes written.
pub fn write_line<W: Write>(writer: &mut W, line: &str) -> io::Result<u64> {
    writer.write_all(line.as_bytes())?;
    writer.write_all(LINE_ENDING.as_bytes())?;

    return Ok((line.len() + LINE_ENDING.len()) as u64);
}

/// Checks whether the reader has more data to return.
pub fn has_more<R: BufRead>(reader: &mut R) -> io::Result<bool> {
    Ok(!reader.fill_buf()?.is_empty())
}
