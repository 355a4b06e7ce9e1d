use std::ops::Range;
use std::time::{Duration, Instant};

use crate::TransferError;

/// Completion state of a single chunk upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkState {
    Pending,
    InFlight,
    Done,
    Failed,
}

/// One planned chunk of an upload session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkTask {
    /// 1-based chunk number as sent on the wire.
    pub number: u32,
    /// Byte range within the source.
    pub range: Range<u64>,
    pub state: ChunkState,
}

impl ChunkTask {
    pub fn new(number: u32, range: Range<u64>) -> Self {
        Self {
            number,
            range,
            state: ChunkState::Pending,
        }
    }

    /// Size of this chunk in bytes.
    pub fn len(&self) -> u64 {
        self.range.end - self.range.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Lifecycle of an upload session.
///
/// `Created → Uploading → Completing → Done`. `Aborted` is reachable until
/// the complete call is issued; `Failed` from `Uploading` or `Completing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Uploading,
    Completing,
    Done,
    Aborted,
    Failed,
}

impl SessionState {
    /// Whether the session accepts no further calls.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Aborted | Self::Failed)
    }

    fn can_move_to(self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Created, Uploading)
                | (Uploading, Completing)
                | (Completing, Done)
                | (Created | Uploading, Aborted)
                | (Uploading | Completing, Failed)
        )
    }
}

/// A server-assigned upload session, owned by one orchestrator run.
#[derive(Debug)]
pub struct UploadSession {
    upload_id: String,
    total_chunks: u32,
    created_at: Instant,
    state: SessionState,
}

impl UploadSession {
    pub fn new(upload_id: impl Into<String>, total_chunks: u32) -> Self {
        Self {
            upload_id: upload_id.into(),
            total_chunks,
            created_at: Instant::now(),
            state: SessionState::Created,
        }
    }

    pub fn upload_id(&self) -> &str {
        &self.upload_id
    }

    pub fn total_chunks(&self) -> u32 {
        self.total_chunks
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Time since the session was created.
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Moves to `next`, rejecting transitions the lifecycle does not allow.
    pub fn transition(&mut self, next: SessionState) -> Result<(), TransferError> {
        if !self.state.can_move_to(next) {
            return Err(TransferError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }
}
