//! Chunk transfer and finalization for one negotiated session.

use std::ops::Range;

use chunkwise_protocol::FileRecord;
use chunkwise_transfer::{
    ByteSource, ChunkState, ChunkTask, ProgressAggregator, SessionState, UploadSession,
};
use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::cancel::abort_session;
use crate::error::UploadError;
use crate::service::FileService;
use crate::types::{EventSink, UploadEvent, UploadPhase};

/// Drives one session from `Created` to a terminal state.
pub(crate) struct TransferOrchestrator<'a> {
    pub service: &'a dyn FileService,
    pub source: &'a dyn ByteSource,
    pub file_name: &'a str,
    pub max_concurrent: usize,
    pub cancel: &'a CancellationToken,
    pub events: &'a EventSink,
}

impl TransferOrchestrator<'_> {
    /// Uploads every task, then asks the service to assemble the file.
    ///
    /// The first chunk failure stops dispatching, sends one abort and is
    /// returned as-is. Cancellation also sends exactly one abort. A failed
    /// complete leaves the session to the caller.
    pub async fn run(
        &self,
        session: &mut UploadSession,
        mut tasks: Vec<ChunkTask>,
        progress: &mut ProgressAggregator,
    ) -> Result<FileRecord, UploadError> {
        if self.cancel.is_cancelled() {
            return self.abort(session).await;
        }
        self.transition(session, SessionState::Uploading)?;
        self.events.emit(UploadEvent::SessionStarted {
            upload_id: session.upload_id().to_string(),
            total_chunks: session.total_chunks(),
        });
        self.events.phase(UploadPhase::Transferring);
        self.events.progress(
            progress.begin_transfer(u64::from(session.total_chunks())),
            UploadPhase::Transferring,
        );

        match self.upload_chunks(session, &mut tasks, progress).await {
            Ok(()) => {}
            Err(UploadError::Cancelled) => return self.abort(session).await,
            Err(e) => return self.fail(session, e).await,
        }

        if self.cancel.is_cancelled() {
            return self.abort(session).await;
        }
        self.transition(session, SessionState::Completing)?;
        self.events.phase(UploadPhase::Finalizing);

        match self.service.complete(session.upload_id()).await {
            Ok(record) => {
                self.transition(session, SessionState::Done)?;
                debug!(
                    upload_id = %session.upload_id(),
                    id = %record.id,
                    elapsed_ms = session.age().as_millis() as u64,
                    "session completed"
                );
                Ok(record)
            }
            Err(source) => {
                self.transition(session, SessionState::Failed)?;
                Err(UploadError::Finalization {
                    upload_id: session.upload_id().to_string(),
                    source,
                })
            }
        }
    }

    /// Bounded fan-out over `tasks`. Returns `Cancelled` as soon as the
    /// token fires; in-flight chunk futures are dropped.
    async fn upload_chunks(
        &self,
        session: &UploadSession,
        tasks: &mut [ChunkTask],
        progress: &mut ProgressAggregator,
    ) -> Result<(), UploadError> {
        let upload_id = session.upload_id();
        let total_chunks = session.total_chunks();
        let limit = self.max_concurrent.max(1);
        let mut in_flight = FuturesUnordered::new();
        let mut next = 0;
        let mut uploaded = 0u32;

        loop {
            while in_flight.len() < limit && next < tasks.len() {
                if self.cancel.is_cancelled() {
                    return Err(UploadError::Cancelled);
                }
                let task = &mut tasks[next];
                task.state = ChunkState::InFlight;
                trace!(upload_id, chunk = task.number, bytes = task.len(), "dispatching chunk");
                in_flight.push(self.send_chunk(upload_id, next, task.number, task.range.clone()));
                next += 1;
            }

            let finished = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(UploadError::Cancelled),
                finished = in_flight.next() => finished,
            };
            let Some((index, result)) = finished else {
                break;
            };

            let task = &mut tasks[index];
            if let Err(e) = result {
                task.state = ChunkState::Failed;
                warn!(upload_id, chunk = task.number, error = %e, "chunk upload failed");
                return Err(e);
            }
            task.state = ChunkState::Done;
            uploaded += 1;
            self.events.emit(UploadEvent::ChunkUploaded {
                chunk_number: task.number,
                uploaded_chunks: uploaded,
                total_chunks,
            });
            self.events
                .progress(progress.chunk_completed(), UploadPhase::Transferring);
        }

        debug!(upload_id, chunks = uploaded, "all chunks uploaded");
        Ok(())
    }

    /// Reads one chunk from the source and sends it. The chunk is read
    /// only when its slot opens, so memory stays bounded by the limit.
    async fn send_chunk(
        &self,
        upload_id: &str,
        index: usize,
        chunk_number: u32,
        range: Range<u64>,
    ) -> (usize, Result<(), UploadError>) {
        let result = async {
            let data = self
                .source
                .read_range(range)
                .await
                .map_err(|source| UploadError::ChunkRead {
                    upload_id: upload_id.to_string(),
                    chunk_number,
                    source,
                })?;
            self.service
                .upload_chunk(upload_id, chunk_number, self.file_name, data)
                .await
                .map_err(|source| UploadError::ChunkTransfer {
                    upload_id: upload_id.to_string(),
                    chunk_number,
                    source,
                })
        }
        .await;
        (index, result)
    }

    async fn abort(&self, session: &mut UploadSession) -> Result<FileRecord, UploadError> {
        self.transition(session, SessionState::Aborted)?;
        abort_session(self.service, session.upload_id()).await;
        Err(UploadError::Cancelled)
    }

    /// Marks the session failed after a chunk error and asks the service to
    /// discard it. The abort is best-effort; `err` is returned either way.
    async fn fail(
        &self,
        session: &mut UploadSession,
        err: UploadError,
    ) -> Result<FileRecord, UploadError> {
        self.transition(session, SessionState::Failed)?;
        abort_session(self.service, session.upload_id()).await;
        Err(err)
    }

    fn transition(
        &self,
        session: &mut UploadSession,
        next: SessionState,
    ) -> Result<(), UploadError> {
        let from = session.state();
        session.transition(next)?;
        debug!(upload_id = %session.upload_id(), ?from, to = ?next, "session state changed");
        Ok(())
    }
}
