//! External file sorter.

use log;
use rayon::prelude::*;
use std::error::Error;
use std::fmt;
use std::fmt::Display;
use std::io;
use std::io::prelude::*;
use std::path::{Path, PathBuf};

use crate::buffer::{self, ChunkReader};
use crate::chunk::{self, Chunker};
use crate::line;
use crate::merger::MergeStrategy;
use crate::observer::{self, NoopObserver, ProgressObserver};
use crate::order::{FormatError, LineOrder, OrdinalOrder};

/// Sorting error.
///
/// A failed run does not clean up after itself: intermediate chunk files produced before the failure
/// are left on disk and the target file, if created, is incomplete.
#[derive(Debug)]
pub enum SortError {
    /// Workers thread pool initialization error.
    ThreadPoolBuildError(rayon::ThreadPoolBuildError),
    /// Common I/O error.
    IO(io::Error),
    /// A line does not conform to the record format of the ordering.
    Format(FormatError),
    /// Target path collides with the source or an intermediate chunk file.
    PathCollision(PathBuf),
}

impl Error for SortError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self {
            SortError::ThreadPoolBuildError(err) => Some(err),
            SortError::IO(err) => Some(err),
            SortError::Format(err) => Some(err),
            SortError::PathCollision(_) => None,
        }
    }
}

impl Display for SortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self {
            SortError::ThreadPoolBuildError(err) => write!(f, "thread pool initialization failed: {}", err),
            SortError::IO(err) => write!(f, "I/O operation failed: {}", err),
            SortError::Format(err) => write!(f, "record format error: {}", err),
            SortError::PathCollision(path) => {
                write!(f, "target {} collides with the source or its chunk files", path.display())
            }
        }
    }
}

impl From<io::Error> for SortError {
    fn from(err: io::Error) -> Self {
        SortError::IO(err)
    }
}

impl From<FormatError> for SortError {
    fn from(err: FormatError) -> Self {
        SortError::Format(err)
    }
}

/// Default chunk size limit (50 MiB).
pub const DEFAULT_MAX_CHUNK_SIZE: u64 = 50 * 1024 * 1024;
/// Default total memory limit of merge read buffers.
pub const DEFAULT_MEMORY_LIMIT: u64 = 500_000_000;
/// Default estimated record size.
pub const DEFAULT_RECORD_SIZE: u64 = 100;
/// Default estimated per-record memory overhead multiplier.
pub const DEFAULT_RECORD_OVERHEAD: f64 = 7.5;
/// Default estimated total number of records (progress display only).
pub const DEFAULT_ESTIMATED_RECORDS: u64 = 10_000_000;
/// Default number of records between two progress reports.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 5000;

/// File sorter builder. Provides methods for [`FileSorter`] initialization.
pub struct FileSorterBuilder<O = OrdinalOrder>
where
    O: LineOrder,
{
    /// Number of threads to be used to sort chunks in parallel.
    threads_number: Option<usize>,
    /// Directory to be used to store chunk files.
    chunk_dir: Option<Box<Path>>,
    /// Chunk file read/write buffer size.
    rw_buf_size: Option<usize>,
    /// Chunk size after which a new chunk is started.
    max_chunk_size: u64,
    /// Total memory limit of merge read buffers.
    memory_limit: u64,
    /// Estimated record size.
    record_size: u64,
    /// Estimated per-record memory overhead multiplier.
    record_overhead: f64,
    /// Estimated total number of records.
    estimated_records: u64,
    /// Number of records between two progress reports.
    progress_interval: u64,
    /// Merge algorithm.
    merge_strategy: MergeStrategy,
    /// Line ordering.
    order: O,
    /// Progress observer.
    observer: Box<dyn ProgressObserver>,
}

impl FileSorterBuilder<OrdinalOrder> {
    /// Creates an instance of a builder with default parameters.
    pub fn new() -> Self {
        FileSorterBuilder::default()
    }
}

impl<O> FileSorterBuilder<O>
where
    O: LineOrder,
{
    /// Builds a [`FileSorter`] instance using provided configuration.
    pub fn build(self) -> Result<FileSorter<O>, SortError> {
        let chunker = Chunker::new(self.max_chunk_size)
            .with_progress_interval(self.progress_interval)
            .with_rw_buf_size(self.rw_buf_size)
            .with_chunk_dir(self.chunk_dir.as_deref());

        return Ok(FileSorter {
            thread_pool: FileSorter::<O>::init_thread_pool(self.threads_number)?,
            chunker,
            rw_buf_size: self.rw_buf_size,
            memory_limit: self.memory_limit,
            record_size: self.record_size,
            record_overhead: self.record_overhead,
            estimated_records: self.estimated_records,
            progress_interval: self.progress_interval.max(1),
            merge_strategy: self.merge_strategy,
            order: self.order,
            observer: self.observer,
        });
    }

    /// Sets line ordering.
    pub fn with_order<P: LineOrder>(self, order: P) -> FileSorterBuilder<P> {
        return FileSorterBuilder {
            threads_number: self.threads_number,
            chunk_dir: self.chunk_dir,
            rw_buf_size: self.rw_buf_size,
            max_chunk_size: self.max_chunk_size,
            memory_limit: self.memory_limit,
            record_size: self.record_size,
            record_overhead: self.record_overhead,
            estimated_records: self.estimated_records,
            progress_interval: self.progress_interval,
            merge_strategy: self.merge_strategy,
            order,
            observer: self.observer,
        };
    }

    /// Sets progress observer.
    pub fn with_observer(mut self, observer: impl ProgressObserver + 'static) -> FileSorterBuilder<O> {
        self.observer = Box::new(observer);
        return self;
    }

    /// Sets number of threads to be used to sort chunks in parallel.
    pub fn with_threads_number(mut self, threads_number: usize) -> FileSorterBuilder<O> {
        self.threads_number = Some(threads_number);
        return self;
    }

    /// Sets directory to be used to store chunk files. By default chunks are stored next to the source file.
    pub fn with_chunk_dir(mut self, path: &Path) -> FileSorterBuilder<O> {
        self.chunk_dir = Some(path.into());
        return self;
    }

    /// Sets chunk read/write buffer size.
    pub fn with_rw_buf_size(mut self, buf_size: usize) -> FileSorterBuilder<O> {
        self.rw_buf_size = Some(buf_size);
        return self;
    }

    /// Sets chunk size (bytes) after which a new chunk is started.
    pub fn with_max_chunk_size(mut self, max_chunk_size: u64) -> FileSorterBuilder<O> {
        self.max_chunk_size = max_chunk_size;
        return self;
    }

    /// Sets total memory (bytes) the merge read buffers may take.
    pub fn with_memory_limit(mut self, memory_limit: u64) -> FileSorterBuilder<O> {
        self.memory_limit = memory_limit;
        return self;
    }

    /// Sets estimated record size (bytes) used to size merge read buffers.
    pub fn with_record_size(mut self, record_size: u64) -> FileSorterBuilder<O> {
        self.record_size = record_size;
        return self;
    }

    /// Sets estimated per-record memory overhead multiplier used to size merge read buffers.
    pub fn with_record_overhead(mut self, record_overhead: f64) -> FileSorterBuilder<O> {
        self.record_overhead = record_overhead;
        return self;
    }

    /// Sets estimated total number of records. Only used for merge progress reporting.
    pub fn with_estimated_records(mut self, estimated_records: u64) -> FileSorterBuilder<O> {
        self.estimated_records = estimated_records;
        return self;
    }

    /// Sets number of lines between two progress reports.
    pub fn with_progress_interval(mut self, progress_interval: u64) -> FileSorterBuilder<O> {
        self.progress_interval = progress_interval;
        return self;
    }

    /// Sets merge algorithm.
    pub fn with_merge_strategy(mut self, merge_strategy: MergeStrategy) -> FileSorterBuilder<O> {
        self.merge_strategy = merge_strategy;
        return self;
    }
}

impl<O> Default for FileSorterBuilder<O>
where
    O: LineOrder + Default,
{
    fn default() -> Self {
        FileSorterBuilder {
            threads_number: None,
            chunk_dir: None,
            rw_buf_size: None,
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            memory_limit: DEFAULT_MEMORY_LIMIT,
            record_size: DEFAULT_RECORD_SIZE,
            record_overhead: DEFAULT_RECORD_OVERHEAD,
            estimated_records: DEFAULT_ESTIMATED_RECORDS,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            merge_strategy: MergeStrategy::default(),
            order: O::default(),
            observer: Box::new(NoopObserver),
        }
    }
}

/// External file sorter.
///
/// Sorting runs in three strictly sequential phases: the source is split into chunk files,
/// the chunks are sorted in parallel and the sorted chunks are merged into the target.
pub struct FileSorter<O = OrdinalOrder>
where
    O: LineOrder,
{
    /// Chunk sorting thread pool.
    thread_pool: rayon::ThreadPool,
    /// Source file splitter.
    chunker: Chunker,
    /// Chunk file read/write buffer size.
    rw_buf_size: Option<usize>,
    memory_limit: u64,
    record_size: u64,
    record_overhead: f64,
    estimated_records: u64,
    progress_interval: u64,
    merge_strategy: MergeStrategy,
    order: O,
    observer: Box<dyn ProgressObserver>,
}

impl<O> FileSorter<O>
where
    O: LineOrder,
{
    fn init_thread_pool(threads_number: Option<usize>) -> Result<rayon::ThreadPool, SortError> {
        let mut thread_pool_builder = rayon::ThreadPoolBuilder::new();

        if let Some(threads_number) = threads_number {
            log::info!("initializing thread-pool (threads: {})", threads_number);
            thread_pool_builder = thread_pool_builder.num_threads(threads_number);
        } else {
            log::info!("initializing thread-pool (threads: default)");
        }
        let thread_pool = thread_pool_builder
            .build()
            .map_err(|err| SortError::ThreadPoolBuildError(err))?;

        return Ok(thread_pool);
    }

    /// Sorts the source file into the target file. Returns the number of lines written.
    ///
    /// The source must be UTF-8 text. A line that is not valid UTF-8 fails the run with
    /// [`SortError::IO`] of kind [`io::ErrorKind::InvalidData`] naming the file it was read from.
    ///
    /// # Arguments
    /// * `source` - File to be sorted, it is left untouched
    /// * `target` - File the sorted lines are written to, it must not be the source or an intermediate chunk
    ///   under any spelling of the path
    pub fn sort(&self, source: &Path, target: &Path) -> Result<u64, SortError> {
        if self.chunker.collides(source, target)? {
            return Err(SortError::PathCollision(target.to_path_buf()));
        }

        let chunks = self.split(source)?;
        observer::report_memory_usage(self.observer.as_ref());

        let sorted_chunks = self.sort_chunks(&chunks)?;
        observer::report_memory_usage(self.observer.as_ref());

        let written = self.merge(&sorted_chunks, target)?;
        observer::report_memory_usage(self.observer.as_ref());

        log::info!("{} sorted into {} ({} lines)", source.display(), target.display(), written);

        return Ok(written);
    }

    /// Splits the source file into chunk files. Returns chunk paths in the source order.
    pub fn split(&self, source: &Path) -> Result<Vec<PathBuf>, SortError> {
        self.chunker.split(source, self.observer.as_ref())
    }

    /// Sorts chunks in parallel. Returns sorted chunk paths, positionally matching `chunks`.
    ///
    /// Fails as a whole if any chunk fails; results of other chunks are discarded.
    pub fn sort_chunks(&self, chunks: &[PathBuf]) -> Result<Vec<PathBuf>, SortError> {
        self.observer.log("Sorting chunks");

        let order = &self.order;
        let observer = self.observer.as_ref();
        let rw_buf_size = self.rw_buf_size;

        let sorted_chunks = self.thread_pool.install(|| {
            chunks
                .par_iter()
                .map(|path| chunk::sort_chunk(path, order, rw_buf_size, observer))
                .collect::<Result<Vec<_>, _>>()
        })?;

        self.observer.log("Sorting chunks completed");

        return Ok(sorted_chunks);
    }

    /// Merges sorted chunks into the target file. Returns the number of lines written.
    ///
    /// Every chunk file is removed once fully consumed.
    pub fn merge(&self, sorted_chunks: &[PathBuf], target: &Path) -> Result<u64, SortError> {
        self.observer.log("Merging");

        let buffer_len = buffer::buffer_len(
            self.memory_limit,
            sorted_chunks.len(),
            self.record_size,
            self.record_overhead,
        );
        log::debug!(
            "merging {} chunk(s), read buffer length: {} lines",
            sorted_chunks.len(),
            buffer_len
        );

        self.observer.log("Loading queues");
        let chunks = sorted_chunks
            .iter()
            .map(|path| ChunkReader::open(path, buffer_len, self.rw_buf_size))
            .collect::<io::Result<Vec<_>>>()?;
        self.observer.log("Loading queues complete");

        let mut writer = chunk::create_writer(target, self.rw_buf_size)?;
        let mut written: u64 = 0;

        for item in self.merge_strategy.merger(chunks, &self.order) {
            line::write_line(&mut writer, &item?)?;

            written += 1;
            if written % self.progress_interval == 0 {
                self.observer.report_progress(written, self.estimated_records);
            }
        }
        writer.flush()?;

        self.observer.log("Merging complete");

        return Ok(written);
    }
}

#[cfg(test)]
mod test {
    use std::fs;
    use std::io;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    use rand::seq::SliceRandom;
    use rand::Rng;
    use rstest::*;

    use super::{FileSorter, FileSorterBuilder, SortError};
    use crate::line::LINE_ENDING;
    use crate::merger::MergeStrategy;
    use crate::observer::{ProgressObserver, RecordingObserver};
    use crate::order::{Descending, LineOrder, NumberTextOrder};

    #[fixture]
    fn tmp_dir() -> tempfile::TempDir {
        tempfile::tempdir_in("./").unwrap()
    }

    fn write_lines(path: &Path, lines: &[String]) {
        let content: String = lines.iter().map(|line| format!("{}{}", line, LINE_ENDING)).collect();
        fs::write(path, content).unwrap();
    }

    fn read_lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path).unwrap().lines().map(String::from).collect()
    }

    fn random_records(count: usize) -> Vec<String> {
        let mut rng = rand::thread_rng();
        let words = ["apple", "banana", "cherry", "Something", "Yellow", "pear"];

        (0..count)
            .map(|_| format!("{}. {}", rng.gen_range(0..100), words.choose(&mut rng).unwrap()))
            .collect()
    }

    fn dir_entries(dir: &Path) -> Vec<PathBuf> {
        let mut entries: Vec<PathBuf> = fs::read_dir(dir).unwrap().map(|entry| entry.unwrap().path()).collect();
        entries.sort();
        return entries;
    }

    struct SharedObserver(Arc<RecordingObserver>);

    impl ProgressObserver for SharedObserver {
        fn log(&self, message: &str) {
            self.0.log(message)
        }

        fn report_progress(&self, current: u64, total: u64) {
            self.0.report_progress(current, total)
        }

        fn report_status(&self, message: &str) {
            self.0.report_status(message)
        }
    }

    #[rstest]
    fn test_sort_scenario(tmp_dir: tempfile::TempDir) {
        let source = tmp_dir.path().join("input.txt");
        let target = tmp_dir.path().join("output.txt");
        write_lines(&source, &["3. banana".into(), "1. apple".into(), "2. banana".into()]);

        let sorter = FileSorterBuilder::new().with_order(NumberTextOrder).build().unwrap();
        let written = sorter.sort(&source, &target).unwrap();

        assert_eq!(written, 3);
        assert_eq!(read_lines(&target), vec!["1. apple", "2. banana", "3. banana"]);
        assert_eq!(dir_entries(tmp_dir.path()), vec![source, target]);
    }

    #[rstest]
    #[case(MergeStrategy::LinearScan, 64, 1)]
    #[case(MergeStrategy::BinaryHeap, 64, 1)]
    #[case(MergeStrategy::BinaryHeap, 256, 2)]
    #[case(MergeStrategy::BinaryHeap, 1 << 20, 4)]
    #[case(MergeStrategy::LinearScan, 16, 3)]
    fn test_sort_conservation(
        tmp_dir: tempfile::TempDir,
        #[case] strategy: MergeStrategy,
        #[case] max_chunk_size: u64,
        #[case] threads_number: usize,
    ) {
        let source = tmp_dir.path().join("input.txt");
        let target = tmp_dir.path().join("output.txt");
        let input = random_records(500);
        write_lines(&source, &input);

        let sorter: FileSorter<NumberTextOrder> = FileSorterBuilder::new()
            .with_order(NumberTextOrder)
            .with_max_chunk_size(max_chunk_size)
            .with_threads_number(threads_number)
            .with_memory_limit(4096)
            .with_merge_strategy(strategy)
            .build()
            .unwrap();
        sorter.sort(&source, &target).unwrap();

        let mut expected = input.clone();
        expected.sort_by(|a, b| NumberTextOrder.compare(a, b).unwrap());

        assert_eq!(read_lines(&target), expected);
        assert_eq!(dir_entries(tmp_dir.path()), vec![source, target]);
    }

    #[rstest]
    fn test_sort_ordinal_by_default(tmp_dir: tempfile::TempDir) {
        let source = tmp_dir.path().join("input.txt");
        let target = tmp_dir.path().join("output.txt");
        let mut input = random_records(200);
        input.push("not a record".into());
        write_lines(&source, &input);

        let sorter = FileSorterBuilder::new().with_max_chunk_size(128).build().unwrap();
        sorter.sort(&source, &target).unwrap();

        input.sort();
        assert_eq!(read_lines(&target), input);
    }

    #[rstest]
    fn test_sort_descending(tmp_dir: tempfile::TempDir) {
        let source = tmp_dir.path().join("input.txt");
        let target = tmp_dir.path().join("output.txt");
        let input = random_records(200);
        write_lines(&source, &input);

        let sorter = FileSorterBuilder::new()
            .with_order(Descending(NumberTextOrder))
            .with_max_chunk_size(256)
            .build()
            .unwrap();
        sorter.sort(&source, &target).unwrap();

        let mut expected = input.clone();
        expected.sort_by(|a, b| NumberTextOrder.compare(b, a).unwrap());
        assert_eq!(read_lines(&target), expected);
    }

    #[rstest]
    fn test_sort_idempotent(tmp_dir: tempfile::TempDir) {
        let source = tmp_dir.path().join("input.txt");
        let sorted = tmp_dir.path().join("sorted.txt");
        let resorted = tmp_dir.path().join("resorted.txt");
        write_lines(&source, &random_records(300));

        let sorter = FileSorterBuilder::new()
            .with_order(NumberTextOrder)
            .with_max_chunk_size(512)
            .build()
            .unwrap();
        sorter.sort(&source, &sorted).unwrap();
        sorter.sort(&sorted, &resorted).unwrap();

        assert_eq!(fs::read(&sorted).unwrap(), fs::read(&resorted).unwrap());
    }

    #[rstest]
    fn test_sort_empty_source(tmp_dir: tempfile::TempDir) {
        let source = tmp_dir.path().join("input.txt");
        let target = tmp_dir.path().join("output.txt");
        fs::write(&source, "").unwrap();

        let sorter = FileSorterBuilder::new().with_order(NumberTextOrder).build().unwrap();
        let written = sorter.sort(&source, &target).unwrap();

        assert_eq!(written, 0);
        assert_eq!(fs::metadata(&target).unwrap().len(), 0);
        assert_eq!(dir_entries(tmp_dir.path()), vec![source, target]);
    }

    #[rstest]
    fn test_sort_format_error(tmp_dir: tempfile::TempDir) {
        let source = tmp_dir.path().join("input.txt");
        let target = tmp_dir.path().join("output.txt");
        let mut input = random_records(50);
        input.insert(25, "5.text".into());
        write_lines(&source, &input);

        let sorter = FileSorterBuilder::new().with_order(NumberTextOrder).build().unwrap();
        let result = sorter.sort(&source, &target);

        assert!(matches!(result, Err(SortError::Format(_))));
        assert!(!target.exists());
    }

    #[rstest]
    #[case("input.txt")]
    #[case("input.txt1")]
    #[case("input.txt12sorted")]
    #[case("./input.txt")]
    #[case("./input.txt1sorted")]
    #[case("sub/../input.txt")]
    #[case("sub/../input.txt1")]
    #[case("sub/../input.txt1sorted")]
    fn test_sort_path_collision(tmp_dir: tempfile::TempDir, #[case] target: &str) {
        let source = tmp_dir.path().join("input.txt");
        let sub_dir = tmp_dir.path().join("sub");
        let target = tmp_dir.path().join(target);
        fs::create_dir(&sub_dir).unwrap();
        fs::write(&source, "1. a\n").unwrap();

        let sorter = FileSorterBuilder::new().build().unwrap();
        let result = sorter.sort(&source, &target);

        assert!(matches!(result, Err(SortError::PathCollision(path)) if path == target));
        assert_eq!(dir_entries(tmp_dir.path()), vec![source.clone(), sub_dir]);
        assert_eq!(fs::read_to_string(&source).unwrap(), "1. a\n");
    }

    #[rstest]
    fn test_sort_path_collision_absolute_target(tmp_dir: tempfile::TempDir) {
        let source = tmp_dir.path().join("input.txt");
        let target = fs::canonicalize(tmp_dir.path()).unwrap().join("input.txt2sorted");
        write_lines(&source, &random_records(100));

        let sorter = FileSorterBuilder::new().with_max_chunk_size(64).build().unwrap();
        let result = sorter.sort(&source, &target);

        assert!(matches!(result, Err(SortError::PathCollision(_))));
        assert_eq!(dir_entries(tmp_dir.path()), vec![source]);
    }

    #[rstest]
    fn test_sort_invalid_utf8(tmp_dir: tempfile::TempDir) {
        let source = tmp_dir.path().join("input.txt");
        let target = tmp_dir.path().join("output.txt");
        fs::write(&source, b"2. b\n1. \xff\xfe\n").unwrap();

        let sorter = FileSorterBuilder::new().with_order(NumberTextOrder).build().unwrap();
        let result = sorter.sort(&source, &target);

        match result {
            Err(SortError::IO(err)) => {
                assert_eq!(err.kind(), io::ErrorKind::InvalidData);
                assert!(err.to_string().contains("input.txt"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(!target.exists());
    }

    #[rstest]
    fn test_sort_chunks_all_or_nothing(tmp_dir: tempfile::TempDir) {
        let good = tmp_dir.path().join("good");
        let bad = tmp_dir.path().join("bad");
        write_lines(&good, &["2. b".into(), "1. a".into()]);
        write_lines(&bad, &["2. b".into(), "oops".into()]);

        let sorter = FileSorterBuilder::new()
            .with_order(NumberTextOrder)
            .with_threads_number(2)
            .build()
            .unwrap();

        let result = sorter.sort_chunks(&[good, bad.clone()]);

        assert!(matches!(result, Err(SortError::Format(_))));
        assert!(bad.exists());
    }

    #[rstest]
    fn test_sort_phases(tmp_dir: tempfile::TempDir) {
        let source = tmp_dir.path().join("input.txt");
        let target = tmp_dir.path().join("output.txt");
        let chunk_dir = tmp_dir.path().join("chunks");
        fs::create_dir(&chunk_dir).unwrap();
        write_lines(&source, &random_records(100));

        let observer = Arc::new(RecordingObserver::default());
        let sorter = FileSorterBuilder::new()
            .with_order(NumberTextOrder)
            .with_max_chunk_size(200)
            .with_chunk_dir(&chunk_dir)
            .with_progress_interval(10)
            .with_estimated_records(100)
            .with_observer(SharedObserver(observer.clone()))
            .build()
            .unwrap();

        let chunks = sorter.split(&source).unwrap();
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|chunk| chunk.starts_with(&chunk_dir)));

        let sorted_chunks = sorter.sort_chunks(&chunks).unwrap();
        assert_eq!(sorted_chunks.len(), chunks.len());
        for (chunk, sorted_chunk) in chunks.iter().zip(&sorted_chunks) {
            assert!(!chunk.exists());
            assert_eq!(sorted_chunk, &PathBuf::from(format!("{}sorted", chunk.display())));

            let lines = read_lines(sorted_chunk);
            assert!(lines.windows(2).all(|pair| NumberTextOrder.compare(&pair[0], &pair[1]).unwrap().is_le()));
        }

        let written = sorter.merge(&sorted_chunks, &target).unwrap();
        assert_eq!(written, 100);
        assert!(dir_entries(&chunk_dir).is_empty());

        let messages = observer.messages.lock().unwrap().clone();
        assert_eq!(
            messages,
            vec![
                "Splitting",
                "Splitting complete",
                "Sorting chunks",
                "Sorting chunks completed",
                "Merging",
                "Loading queues",
                "Loading queues complete",
                "Merging complete",
            ]
        );
        assert_eq!(observer.statuses.lock().unwrap().len(), chunks.len());

        let progress = observer.progress.lock().unwrap().clone();
        assert_eq!(progress.last(), Some(&(100, 100)));
    }
}
