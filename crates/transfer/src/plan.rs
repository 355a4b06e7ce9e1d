use std::ops::Range;

use crate::types::ChunkTask;

/// Fixed-size partition of a file into chunks.
///
/// Chunk `i` (0-based) covers `[i * chunk_size, min(file_size, (i + 1) * chunk_size))`.
/// The ranges partition `[0, file_size)` exactly; only the last chunk may be short.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPlan {
    file_size: u64,
    chunk_size: u64,
    total_chunks: u64,
}

impl ChunkPlan {
    /// Plans `file_size` bytes in chunks of `chunk_size`.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_size` is zero.
    pub fn new(file_size: u64, chunk_size: u64) -> Self {
        assert!(chunk_size > 0, "chunk size must be positive");
        Self {
            file_size,
            chunk_size,
            total_chunks: file_size.div_ceil(chunk_size),
        }
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    /// `ceil(file_size / chunk_size)`; zero for an empty file.
    pub fn total_chunks(&self) -> u64 {
        self.total_chunks
    }

    /// Byte range of the 0-based chunk `index`, or `None` past the end.
    pub fn chunk_range(&self, index: u64) -> Option<Range<u64>> {
        if index >= self.total_chunks {
            return None;
        }
        let start = index * self.chunk_size;
        let end = self.file_size.min(start + self.chunk_size);
        Some(start..end)
    }

    /// Iterates every chunk range in order.
    pub fn ranges(&self) -> impl Iterator<Item = Range<u64>> + '_ {
        (0..self.total_chunks).filter_map(|i| self.chunk_range(i))
    }

    /// Builds one pending task per chunk, numbered from 1 for the wire.
    pub fn tasks(&self) -> Vec<ChunkTask> {
        self.ranges()
            .zip(1u32..)
            .map(|(range, number)| ChunkTask::new(number, range))
            .collect()
    }
}
