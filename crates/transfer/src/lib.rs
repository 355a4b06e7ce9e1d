//! Chunk planning, streaming fingerprints and progress aggregation.
//!
//! Everything in this crate is transport-agnostic: the uploader crate
//! drives these pieces against a remote file service.

mod hasher;
mod plan;
mod progress;
mod source;
mod types;

pub use hasher::{Fingerprinter, fingerprint_bytes};
pub use plan::ChunkPlan;
pub use progress::{
    HASHING_END, PROGRESS_DONE, ProgressAggregator, RAMP_STEP, RampPlan, TRANSFER_END,
};
pub use source::{ByteSource, FileSource, MemorySource};
pub use types::{ChunkState, ChunkTask, SessionState, UploadSession};

/// Default chunk size: 2 MiB.
pub const DEFAULT_CHUNK_SIZE: u64 = 2 * 1024 * 1024;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("range {start}..{end} outside source of {len} bytes")]
    OutOfRange { start: u64, end: u64, len: u64 },

    #[error("invalid session transition: {from:?} -> {to:?}")]
    InvalidTransition { from: SessionState, to: SessionState },
}
