//! Chunk files: splitting the source file into bounded chunks and sorting a single chunk.

use std::cmp::Ordering;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::io::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use log;
use rayon::slice::ParallelSliceMut;

use crate::line;
use crate::observer::ProgressObserver;
use crate::order::LineOrder;
use crate::sort::SortError;

/// Suffix appended to a chunk file name once the chunk is sorted.
pub const SORTED_SUFFIX: &str = "sorted";

/// Opens a file for buffered reading.
pub(crate) fn open_reader(path: &Path, buf_size: Option<usize>) -> io::Result<io::BufReader<fs::File>> {
    let file = fs::File::open(path)?;

    return Ok(match buf_size {
        Some(buf_size) => io::BufReader::with_capacity(buf_size, file),
        None => io::BufReader::new(file),
    });
}

/// Creates (or truncates) a file for buffered writing.
pub(crate) fn create_writer(path: &Path, buf_size: Option<usize>) -> io::Result<io::BufWriter<fs::File>> {
    let file = fs::File::create(path)?;

    return Ok(match buf_size {
        Some(buf_size) => io::BufWriter::with_capacity(buf_size, file),
        None => io::BufWriter::new(file),
    });
}

/// Returns the path of a sorted chunk produced from the chunk at `path`.
pub fn sorted_chunk_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(SORTED_SUFFIX);

    return PathBuf::from(name);
}

/// Resolves the parent directory of `path` to its canonical form and joins the file name back.
/// Returns `None` if the parent directory does not exist or `path` has no file name.
fn resolve_path(path: &Path) -> io::Result<Option<PathBuf>> {
    let file_name = match path.file_name() {
        Some(file_name) => file_name,
        None => return Ok(None),
    };
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    return match fs::canonicalize(parent) {
        Ok(parent) => Ok(Some(parent.join(file_name))),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    };
}

/// Checks if both paths exist and lead to the same file once symlinks are followed.
fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Splits a source file into chunk files of bounded size.
///
/// Chunks are named `{source}{index}` (indices start at 1) and are created next to the source file
/// unless a chunk directory is configured, in which case they are named `{dir}/{source file name}{index}`.
#[derive(Debug, Clone)]
pub struct Chunker {
    /// Chunk size (bytes) after which a new chunk is started.
    max_chunk_size: u64,
    /// Number of lines between two progress reports.
    progress_interval: u64,
    /// Chunk file read/write buffer size.
    rw_buf_size: Option<usize>,
    /// Directory to place chunk files to.
    chunk_dir: Option<Box<Path>>,
}

impl Chunker {
    /// Creates a chunker producing chunks of about `max_chunk_size` bytes.
    pub fn new(max_chunk_size: u64) -> Self {
        Chunker {
            max_chunk_size,
            progress_interval: 5000,
            rw_buf_size: None,
            chunk_dir: None,
        }
    }

    /// Sets number of lines between two progress reports.
    pub fn with_progress_interval(mut self, progress_interval: u64) -> Self {
        self.progress_interval = progress_interval.max(1);
        return self;
    }

    /// Sets chunk read/write buffer size.
    pub fn with_rw_buf_size(mut self, buf_size: Option<usize>) -> Self {
        self.rw_buf_size = buf_size;
        return self;
    }

    /// Sets directory to place chunk files to.
    pub fn with_chunk_dir(mut self, chunk_dir: Option<&Path>) -> Self {
        self.chunk_dir = chunk_dir.map(Into::into);
        return self;
    }

    fn chunk_prefix(&self, source: &Path) -> OsString {
        match (&self.chunk_dir, source.file_name()) {
            (Some(dir), Some(file_name)) => dir.join(file_name).into_os_string(),
            _ => OsString::from(source.as_os_str()),
        }
    }

    /// Returns the path of the chunk with the given index produced from `source`.
    pub fn chunk_path(&self, source: &Path, index: usize) -> PathBuf {
        let mut name = self.chunk_prefix(source);
        name.push(index.to_string());

        return PathBuf::from(name);
    }

    /// Checks if `path` may name a chunk (sorted or not) produced from `source`.
    pub fn is_chunk_path(&self, source: &Path, path: &Path) -> bool {
        let prefix = self.chunk_prefix(source);
        let (Some(prefix), Some(path)) = (prefix.to_str(), path.to_str()) else {
            return false;
        };

        match path.strip_prefix(prefix) {
            Some(rest) => {
                let index = rest.strip_suffix(SORTED_SUFFIX).unwrap_or(rest);
                !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit())
            }
            None => false,
        }
    }

    /// Checks if writing to `target` would overwrite `source` or one of its chunks.
    ///
    /// Paths are resolved first, so `./`, `..` and symlinked directories name the same file
    /// as their plain spelling.
    pub fn collides(&self, source: &Path, target: &Path) -> io::Result<bool> {
        if source == target || self.is_chunk_path(source, target) {
            return Ok(true);
        }

        let (Some(source), Some(target)) = (resolve_path(source)?, resolve_path(target)?) else {
            return Ok(false);
        };
        if source == target || same_file(&source, &target) {
            return Ok(true);
        }

        let chunk_dir = match &self.chunk_dir {
            Some(dir) => Some(fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf())),
            None => None,
        };
        let resolved = self.clone().with_chunk_dir(chunk_dir.as_deref());

        return Ok(resolved.is_chunk_path(&source, &target));
    }

    /// Splits the source file into chunks. Returns chunk paths in the source order.
    ///
    /// Lines are never split across chunks. A new chunk is started only after a complete line pushes
    /// the current chunk over the size limit and more input remains, so at least one (possibly empty)
    /// chunk is always produced. On failure chunk files already written are left on disk.
    pub fn split(&self, source: &Path, observer: &dyn ProgressObserver) -> Result<Vec<PathBuf>, SortError> {
        observer.log("Splitting");

        let mut reader = open_reader(source, self.rw_buf_size)?;
        let total_size = reader.get_ref().metadata()?.len();

        let mut chunks = vec![self.chunk_path(source, 1)];
        let mut writer = create_writer(&chunks[0], self.rw_buf_size)?;
        let mut chunk_size: u64 = 0;
        let mut consumed: u64 = 0;
        let mut lines_read: u64 = 0;

        let mut line = String::new();
        loop {
            let read = line::read_line(&mut reader, &mut line).map_err(|err| line::read_error(source, err))?;
            if read == 0 {
                break;
            }

            consumed += read as u64;
            lines_read += 1;
            if lines_read % self.progress_interval == 0 {
                observer.report_progress(consumed, total_size);
            }

            chunk_size += line::write_line(&mut writer, &line)?;

            if chunk_size > self.max_chunk_size && line::has_more(&mut reader)? {
                writer.flush()?;

                let chunk_path = self.chunk_path(source, chunks.len() + 1);
                log::debug!("starting chunk {}", chunk_path.display());
                writer = create_writer(&chunk_path, self.rw_buf_size)?;
                chunks.push(chunk_path);
                chunk_size = 0;
            }
        }
        writer.flush()?;

        log::info!("{} split into {} chunk(s) ({} lines)", source.display(), chunks.len(), lines_read);
        observer.log("Splitting complete");

        return Ok(chunks);
    }
}

/// Sorts a single chunk in memory and writes it to `{path}sorted`, removing the unsorted chunk.
/// Returns the sorted chunk path.
///
/// If the ordering rejects a line the error is returned and neither file is modified.
pub fn sort_chunk<O>(
    path: &Path,
    order: &O,
    buf_size: Option<usize>,
    observer: &dyn ProgressObserver,
) -> Result<PathBuf, SortError>
where
    O: LineOrder + ?Sized,
{
    observer.report_status(&format!("sorting {}", path.display()));

    let mut lines = Vec::new();
    {
        let mut reader = open_reader(path, buf_size)?;
        let mut line = String::new();
        while line::read_line(&mut reader, &mut line).map_err(|err| line::read_error(path, err))? > 0 {
            lines.push(std::mem::take(&mut line));
        }
    }

    let failure = OnceLock::new();
    lines.par_sort_by(|a, b| match order.compare(a, b) {
        Ok(ordering) => ordering,
        Err(err) => {
            let _ = failure.set(err);
            Ordering::Equal
        }
    });
    if let Some(err) = failure.into_inner() {
        return Err(SortError::Format(err));
    }

    let sorted_path = sorted_chunk_path(path);
    let mut writer = create_writer(&sorted_path, buf_size)?;
    for line in &lines {
        line::write_line(&mut writer, line)?;
    }
    writer.flush()?;
    drop(writer);

    fs::remove_file(path)?;
    log::debug!("chunk {} sorted ({} lines)", sorted_path.display(), lines.len());

    return Ok(sorted_path);
}
