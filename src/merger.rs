//! K-way mergers of sorted chunks.
//!
//! Both mergers pick the chunk whose buffered front line is the smallest under the ordering, ties
//! being resolved in favour of the lowest chunk index, so for the same input they produce the same output.
//! Exhausted chunks are dropped from consideration (their files are removed by [`ChunkReader`]).
//! After the first error a merger yields nothing more and closes every chunk it still holds.

use std::cmp::Ordering;

use crate::buffer::ChunkReader;
use crate::order::{FormatError, LineOrder};
use crate::sort::SortError;

/// Merge algorithm selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Linear scan over all chunk fronts, *O(k)* per line.
    LinearScan,
    /// Binary heap of chunk indices, *O(log k)* per line.
    BinaryHeap,
}

impl Default for MergeStrategy {
    fn default() -> Self {
        MergeStrategy::BinaryHeap
    }
}

impl MergeStrategy {
    /// Creates a merger over the given chunks.
    pub fn merger<'a, O>(
        self,
        chunks: Vec<ChunkReader>,
        order: &'a O,
    ) -> Box<dyn Iterator<Item = Result<String, SortError>> + 'a>
    where
        O: LineOrder + ?Sized,
    {
        match self {
            MergeStrategy::LinearScan => Box::new(LinearScanMerger::new(chunks, order)),
            MergeStrategy::BinaryHeap => Box::new(BinaryHeapMerger::new(chunks, order)),
        }
    }
}

/// Linear scan merger implementation.
/// Every line is selected by comparing the fronts of all live chunks.
/// Time complexity is *m* \* *n* where *m* is the number of items, *n* is the number of chunks.
pub struct LinearScanMerger<'a, O: LineOrder + ?Sized> {
    chunks: Vec<ChunkReader>,
    order: &'a O,
}

impl<'a, O: LineOrder + ?Sized> LinearScanMerger<'a, O> {
    /// Creates a linear scan merger. Chunk lines should be sorted under `order`
    /// otherwise the result is undefined.
    pub fn new(chunks: Vec<ChunkReader>, order: &'a O) -> Self {
        let chunks = chunks.into_iter().filter(|chunk| !chunk.is_exhausted()).collect();

        LinearScanMerger { chunks, order }
    }

    fn lowest(&self) -> Result<Option<usize>, FormatError> {
        let mut lowest: Option<(usize, &str)> = None;

        for (idx, chunk) in self.chunks.iter().enumerate() {
            if let Some(candidate) = chunk.peek() {
                let is_lower = match lowest {
                    None => true,
                    Some((_, value)) => self.order.compare(candidate, value)? == Ordering::Less,
                };
                if is_lower {
                    lowest = Some((idx, candidate));
                }
            }
        }

        return Ok(lowest.map(|(idx, _)| idx));
    }

    fn fail(&mut self, err: SortError) -> SortError {
        self.chunks.clear();
        err
    }
}

impl<'a, O: LineOrder + ?Sized> Iterator for LinearScanMerger<'a, O> {
    type Item = Result<String, SortError>;

    /// Returns the next line from the chunks in ascending order.
    fn next(&mut self) -> Option<Self::Item> {
        let idx = match self.lowest() {
            Ok(idx) => idx?,
            Err(err) => return Some(Err(self.fail(err.into()))),
        };

        let line = match self.chunks[idx].pop() {
            Ok(line) => line,
            Err(err) => return Some(Err(self.fail(err.into()))),
        };

        if self.chunks[idx].is_exhausted() {
            // keep relative order so that ties still go to the lowest chunk index
            self.chunks.remove(idx);
        }

        return line.map(Ok);
    }
}

/// Binary heap merger implementation.
/// Merges multiple sorted inputs into a single sorted output.
/// Time complexity is *m* \* log(*n*) in worst case where *m* is the number of items,
/// *n* is the number of chunks (inputs).
pub struct BinaryHeapMerger<'a, O: LineOrder + ?Sized> {
    // min-heap of indices of live chunks keyed by (front line, chunk index)
    heap: Vec<usize>,
    chunks: Vec<ChunkReader>,
    order: &'a O,
    initiated: bool,
}

impl<'a, O: LineOrder + ?Sized> BinaryHeapMerger<'a, O> {
    /// Creates an instance of a binary heap merger using chunks as inputs.
    /// Chunk lines should be sorted under `order` otherwise the result is undefined.
    pub fn new(chunks: Vec<ChunkReader>, order: &'a O) -> Self {
        let heap = Vec::with_capacity(chunks.len());

        return BinaryHeapMerger {
            heap,
            chunks,
            order,
            initiated: false,
        };
    }

    fn front(&self, idx: usize) -> &str {
        self.chunks[idx].peek().unwrap_or_default()
    }

    fn less(&self, a: usize, b: usize) -> Result<bool, FormatError> {
        let (a, b) = (self.heap[a], self.heap[b]);

        return Ok(match self.order.compare(self.front(a), self.front(b))? {
            Ordering::Less => true,
            Ordering::Greater => false,
            Ordering::Equal => a < b,
        });
    }

    fn sift_up(&mut self, mut pos: usize) -> Result<(), FormatError> {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if !self.less(pos, parent)? {
                break;
            }
            self.heap.swap(pos, parent);
            pos = parent;
        }

        return Ok(());
    }

    fn sift_down(&mut self, mut pos: usize) -> Result<(), FormatError> {
        loop {
            let (left, right) = (2 * pos + 1, 2 * pos + 2);
            let mut smallest = pos;

            if left < self.heap.len() && self.less(left, smallest)? {
                smallest = left;
            }
            if right < self.heap.len() && self.less(right, smallest)? {
                smallest = right;
            }
            if smallest == pos {
                return Ok(());
            }

            self.heap.swap(pos, smallest);
            pos = smallest;
        }
    }

    fn init(&mut self) -> Result<(), FormatError> {
        for idx in 0..self.chunks.len() {
            if !self.chunks[idx].is_exhausted() {
                self.heap.push(idx);
                self.sift_up(self.heap.len() - 1)?;
            }
        }

        return Ok(());
    }

    fn fail(&mut self, err: SortError) -> SortError {
        self.heap.clear();
        self.chunks.clear();
        err
    }
}

impl<'a, O: LineOrder + ?Sized> Iterator for BinaryHeapMerger<'a, O> {
    type Item = Result<String, SortError>;

    /// Returns the next line from the chunks in ascending order.
    fn next(&mut self) -> Option<Self::Item> {
        if !self.initiated {
            self.initiated = true;
            if let Err(err) = self.init() {
                return Some(Err(self.fail(err.into())));
            }
        }

        let idx = *self.heap.first()?;
        let line = match self.chunks[idx].pop() {
            Ok(line) => line?,
            Err(err) => return Some(Err(self.fail(err.into()))),
        };

        if self.chunks[idx].is_exhausted() {
            let last = self.heap.pop()?;
            if !self.heap.is_empty() {
                self.heap[0] = last;
            }
        }
        if !self.heap.is_empty() {
            if let Err(err) = self.sift_down(0) {
                return Some(Err(self.fail(err.into())));
            }
        }

        return Some(Ok(line));
    }
}
