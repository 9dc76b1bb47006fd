//! Read-ahead buffers backing sorted chunks during the merge.

use std::collections::VecDeque;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log;

use crate::chunk::open_reader;
use crate::line;

/// Computes the number of lines each of `chunks_number` read buffers may hold so that all of them
/// together stay within `memory_limit` bytes.
///
/// `record_overhead` accounts for per-line allocation overhead on top of the estimated record size.
/// The result is never less than 1.
pub fn buffer_len(memory_limit: u64, chunks_number: usize, record_size: u64, record_overhead: f64) -> usize {
    let record_overhead = if record_overhead > 0.0 { record_overhead } else { 1.0 };
    let buffer_size = memory_limit / chunks_number.max(1) as u64;
    let len = (buffer_size / record_size.max(1)) as f64 / record_overhead;

    return (len as usize).max(1);
}

/// Bounded prefetch queue over a single sorted chunk file.
///
/// The buffer is refilled from the file each time it drains. Once a refill yields nothing the chunk is
/// exhausted: the file is closed and removed, and the buffer stays empty for good.
pub struct ChunkReader {
    path: PathBuf,
    reader: Option<io::BufReader<fs::File>>,
    queue: VecDeque<String>,
    capacity: usize,
}

impl ChunkReader {
    /// Opens a sorted chunk and pre-fills its buffer with up to `capacity` lines.
    pub fn open(path: &Path, capacity: usize, buf_size: Option<usize>) -> io::Result<Self> {
        let capacity = capacity.max(1);
        let mut chunk = ChunkReader {
            path: path.to_path_buf(),
            reader: Some(open_reader(path, buf_size)?),
            queue: VecDeque::with_capacity(capacity),
            capacity,
        };
        chunk.refill()?;

        return Ok(chunk);
    }

    /// Returns the smallest buffered line.
    pub fn peek(&self) -> Option<&str> {
        self.queue.front().map(String::as_str)
    }

    /// Returns the number of buffered lines.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Checks if the chunk has been fully consumed.
    pub fn is_exhausted(&self) -> bool {
        self.reader.is_none() && self.queue.is_empty()
    }

    /// Removes the front line, refilling the buffer from the file if it drains.
    pub fn pop(&mut self) -> io::Result<Option<String>> {
        let item = self.queue.pop_front();
        if self.queue.is_empty() {
            self.refill()?;
        }

        return Ok(item);
    }

    fn refill(&mut self) -> io::Result<()> {
        let reader = match self.reader.as_mut() {
            Some(reader) => reader,
            None => return Ok(()),
        };

        let mut line = String::new();
        while self.queue.len() < self.capacity
            && line::read_line(reader, &mut line).map_err(|err| line::read_error(&self.path, err))? > 0
        {
            self.queue.push_back(std::mem::take(&mut line));
        }

        if self.queue.is_empty() {
            self.reader = None;
            fs::remove_file(&self.path)?;
            log::debug!("chunk {} exhausted", self.path.display());
        }

        return Ok(());
    }
}

#[cfg(test)]
mod test {
    use std::fs;
    use std::io;

    use rstest::*;

    use super::{buffer_len, ChunkReader};

    #[rstest]
    #[case(500_000_000, 10, 100, 7.5, 66_666)]
    #[case(500_000_000, 1, 100, 7.5, 666_666)]
    #[case(1000, 3, 100, 1.0, 3)]
    #[case(10, 100, 100, 7.5, 1)]
    #[case(1000, 0, 0, 0.0, 1000)]
    fn test_buffer_len(
        #[case] memory_limit: u64,
        #[case] chunks_number: usize,
        #[case] record_size: u64,
        #[case] record_overhead: f64,
        #[case] expected: usize,
    ) {
        assert_eq!(buffer_len(memory_limit, chunks_number, record_size, record_overhead), expected);
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(10)]
    fn test_chunk_reader(#[case] capacity: usize) {
        let tmp_dir = tempfile::tempdir_in("./").unwrap();
        let path = tmp_dir.path().join("chunk1sorted");
        fs::write(&path, "a\nb\nc\n").unwrap();

        let mut chunk = ChunkReader::open(&path, capacity, None).unwrap();
        assert_eq!(chunk.len(), capacity.min(3));

        let mut consumed = Vec::new();
        while let Some(line) = chunk.pop().unwrap() {
            assert!(chunk.len() <= capacity);
            consumed.push(line);
        }

        assert_eq!(consumed, vec!["a", "b", "c"]);
        assert!(chunk.is_exhausted());
        assert_eq!(chunk.peek(), None);
        assert!(!path.exists());
    }

    #[test]
    fn test_chunk_reader_empty_chunk() {
        let tmp_dir = tempfile::tempdir_in("./").unwrap();
        let path = tmp_dir.path().join("chunk1sorted");
        fs::write(&path, "").unwrap();

        let chunk = ChunkReader::open(&path, 4, None).unwrap();

        assert!(chunk.is_exhausted());
        assert!(!path.exists());
    }

    #[test]
    fn test_chunk_reader_missing_file() {
        let tmp_dir = tempfile::tempdir_in("./").unwrap();
        assert!(ChunkReader::open(&tmp_dir.path().join("missing"), 4, None).is_err());
    }

    #[test]
    fn test_chunk_reader_invalid_utf8() {
        let tmp_dir = tempfile::tempdir_in("./").unwrap();
        let path = tmp_dir.path().join("chunk3sorted");
        fs::write(&path, b"a\nb\n\xc3\x28\n").unwrap();

        let mut chunk = ChunkReader::open(&path, 2, None).unwrap();
        assert_eq!(chunk.pop().unwrap(), Some("a".to_string()));

        let err = chunk.pop().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(err.to_string().contains("chunk3sorted"));
        assert!(path.exists());
    }
}
