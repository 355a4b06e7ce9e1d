//! Data types for the upload flow.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chunkwise_protocol::{FileRecord, HashAlgorithm};
use chunkwise_transfer::{ByteSource, ChunkPlan, DEFAULT_CHUNK_SIZE, FileSource};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::trace;

use crate::error::UploadError;

/// Default upper bound on concurrently transferring chunks.
pub const DEFAULT_MAX_CONCURRENT_CHUNKS: usize = 4;
/// Default length of the closing progress ramp.
pub const DEFAULT_FINISH_RAMP: Duration = Duration::from_millis(300);

/// One file to upload and how to describe it to the service.
#[derive(Clone)]
pub struct UploadIntent {
    pub source: Arc<dyn ByteSource>,
    pub file_name: String,
    /// Declared size. Must match the source length.
    pub file_size: u64,
    /// Category label forwarded to the service.
    pub file_type: String,
    /// Owner identity forwarded to the service.
    pub uploader_id: String,
    pub chunk_size: u64,
    /// Compute a whole-file fingerprint to enable fast uploads.
    pub fingerprint: bool,
}

impl std::fmt::Debug for UploadIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadIntent")
            .field("file_name", &self.file_name)
            .field("file_size", &self.file_size)
            .field("file_type", &self.file_type)
            .field("uploader_id", &self.uploader_id)
            .field("chunk_size", &self.chunk_size)
            .field("fingerprint", &self.fingerprint)
            .finish_non_exhaustive()
    }
}

impl UploadIntent {
    /// Intent for `source` with default chunk size and fingerprinting on.
    pub fn new(source: Arc<dyn ByteSource>, file_name: impl Into<String>) -> Self {
        let file_size = source.len();
        Self {
            source,
            file_name: file_name.into(),
            file_size,
            file_type: "file".into(),
            uploader_id: String::new(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            fingerprint: true,
        }
    }

    /// Intent for a local file, named after its last path component.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, UploadError> {
        let source = FileSource::open(path).await?;
        let name = source.file_name().unwrap_or_default();
        Ok(Self::new(Arc::new(source), name))
    }

    pub fn with_file_type(mut self, file_type: impl Into<String>) -> Self {
        self.file_type = file_type.into();
        self
    }

    pub fn with_uploader_id(mut self, uploader_id: impl Into<String>) -> Self {
        self.uploader_id = uploader_id.into();
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_fingerprint(mut self, enabled: bool) -> Self {
        self.fingerprint = enabled;
        self
    }

    /// Checks the intent and plans its chunks.
    pub fn plan(&self) -> Result<(ChunkPlan, u32), UploadError> {
        if self.chunk_size == 0 {
            return Err(UploadError::InvalidIntent(
                "chunk size must be positive".into(),
            ));
        }
        if self.file_name.trim().is_empty() {
            return Err(UploadError::InvalidIntent("file name is empty".into()));
        }
        let actual = self.source.len();
        if self.file_size != actual {
            return Err(UploadError::InvalidIntent(format!(
                "declared size {} does not match source length {actual}",
                self.file_size
            )));
        }

        let plan = ChunkPlan::new(self.file_size, self.chunk_size);
        let total_chunks = u32::try_from(plan.total_chunks()).map_err(|_| {
            UploadError::InvalidIntent(format!(
                "{} chunks exceed the protocol limit",
                plan.total_chunks()
            ))
        })?;
        Ok((plan, total_chunks))
    }
}

/// Tuning knobs shared by every upload of an [`Uploader`](crate::Uploader).
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Upper bound on chunks in flight at once. 0 is treated as 1.
    pub max_concurrent_chunks: usize,
    pub hash_algorithm: HashAlgorithm,
    /// Read size while fingerprinting. 0 uses the intent's chunk size.
    pub hash_block_size: u64,
    /// Time taken by the closing 95→100 ramp. Zero jumps straight to 100.
    pub finish_ramp: Duration,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_concurrent_chunks: DEFAULT_MAX_CONCURRENT_CHUNKS,
            hash_algorithm: HashAlgorithm::default(),
            hash_block_size: 0,
            finish_ramp: DEFAULT_FINISH_RAMP,
        }
    }
}

/// Coarse stage of an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum UploadPhase {
    Hashing,
    Negotiating,
    Transferring,
    Finalizing,
    Done,
}

/// Event emitted while an upload runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum UploadEvent {
    /// Unified progress, strictly increasing within one upload.
    Progress { percent: u8, phase: UploadPhase },
    /// The upload entered a new stage.
    Phase { phase: UploadPhase },
    FingerprintComputed { fingerprint: String },
    /// Hashing failed; the upload continues without a fingerprint.
    FingerprintSkipped { reason: String },
    SessionStarted { upload_id: String, total_chunks: u32 },
    ChunkUploaded {
        chunk_number: u32,
        uploaded_chunks: u32,
        total_chunks: u32,
    },
    /// `fast` is set when the service already held the content.
    Completed { record: FileRecord, fast: bool },
    Failed { error: String },
    Cancelled,
}

/// Channel slots the intermediate events leave free for the terminal one.
const TERMINAL_RESERVE: usize = 1;

/// Sending half of the event channel, or nothing when no one listens.
///
/// Intermediate events never wait: when the listener falls behind they
/// are dropped. Only the terminal event waits for room.
#[derive(Debug, Clone, Default)]
pub(crate) struct EventSink {
    tx: Option<mpsc::Sender<UploadEvent>>,
}

impl EventSink {
    pub(crate) fn new(tx: Option<mpsc::Sender<UploadEvent>>) -> Self {
        Self { tx }
    }

    pub(crate) fn emit(&self, event: UploadEvent) {
        let Some(tx) = &self.tx else {
            return;
        };
        if tx.capacity() <= TERMINAL_RESERVE {
            trace!(?event, "event listener lagging, dropping event");
            return;
        }
        let _ = tx.try_send(event);
    }

    /// Sends the `Completed`, `Failed` or `Cancelled` event.
    pub(crate) async fn finish(&self, event: UploadEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event).await;
        }
    }

    pub(crate) fn progress(&self, percent: Option<u8>, phase: UploadPhase) {
        if let Some(percent) = percent {
            self.emit(UploadEvent::Progress { percent, phase });
        }
    }

    pub(crate) fn phase(&self, phase: UploadPhase) {
        self.emit(UploadEvent::Phase { phase });
    }
}
