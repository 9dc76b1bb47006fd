//! `file-sort` is an external merge sort implementation for line-oriented text files.
//!
//! External sorting is a class of sorting algorithms that can handle massive amounts of data. External sorting
//! is required when the data being sorted do not fit into the main memory (RAM) of a computer and instead must be
//! resided in slower external memory, usually a hard disk drive. Sorting is achieved in three phases: the source
//! file is split into chunk files of bounded size, every chunk is sorted in memory (chunks are sorted in
//! parallel), then the sorted chunks are merged into the target file in a single streaming k-way merge.
//! For more information see [External Sorting](https://en.wikipedia.org/wiki/External_sorting).
//!
//! # Overview
//!
//! `file-sort` supports the following features:
//!
//! * **Pluggable ordering:**
//!   lines are compared through the [`LineOrder`] trait. Plain ordinal order is used by default,
//!   [`NumberTextOrder`] sorts `"<number>. <text>"` records by text then by number.
//! * **Multithreading support:**
//!   chunks are sorted in a thread pool utilizing all CPU cores.
//! * **Memory limit support:**
//!   chunk size and the total size of merge read buffers are both bounded, independently of the input size.
//! * **Progress reporting:**
//!   phases and progress are reported through a [`ProgressObserver`].
//!
//! Intermediate chunk files are created next to the source file (`{source}{index}` and
//! `{source}{index}sorted`) and removed as the merge consumes them. A failed run leaves them on disk.
//! Input is read as UTF-8 text; a line that is not valid UTF-8 fails the run with an I/O error naming the file.
//!
//! # Features
//!
//! * `generator` (default): random test data generator, see `generate`.
//! * `memory-stats`: process memory usage snapshots after every phase.
//! * `cli`: the `file-sort` binary.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use file_sort::{FileSorterBuilder, LogObserver, NumberTextOrder};
//!
//! fn main() {
//!     let sorter = FileSorterBuilder::new()
//!         .with_order(NumberTextOrder)
//!         .with_max_chunk_size(50 * 1024 * 1024)
//!         .with_observer(LogObserver)
//!         .build()
//!         .unwrap();
//!
//!     sorter.sort(Path::new("input.txt"), Path::new("output.txt")).unwrap();
//! }
//! ```

pub mod buffer;
pub mod chunk;
#[cfg(feature = "generator")]
pub mod generate;
pub mod line;
pub mod merger;
pub mod observer;
pub mod order;
pub mod sort;

pub use buffer::ChunkReader;
pub use chunk::Chunker;
pub use merger::{BinaryHeapMerger, LinearScanMerger, MergeStrategy};
pub use observer::{LogObserver, NoopObserver, ProgressObserver};
pub use order::{Descending, FormatError, LineOrder, NumberTextOrder, OrdinalOrder};
pub use sort::{FileSorter, FileSorterBuilder, SortError};
