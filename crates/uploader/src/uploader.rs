//! Upload orchestrator.
//!
//! Runs one file through fingerprinting, negotiation, chunk transfer and
//! finalization, publishing progress events and honouring cancellation.

use std::sync::{Arc, Mutex, PoisonError};

use chunkwise_protocol::{FileRecord, InitOutcome, UploadStatusResponse};
use chunkwise_transfer::{Fingerprinter, PROGRESS_DONE, ProgressAggregator, UploadSession};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::cancel::abort_session;
use crate::error::UploadError;
use crate::negotiate::{build_init_request, negotiate};
use crate::service::FileService;
use crate::session::TransferOrchestrator;
use crate::types::{EventSink, UploadConfig, UploadEvent, UploadIntent, UploadPhase};

/// Uploads files to a [`FileService`].
pub struct Uploader {
    service: Arc<dyn FileService>,
    config: UploadConfig,
    events_tx: mpsc::Sender<UploadEvent>,
    events_rx: Option<mpsc::Receiver<UploadEvent>>,
    cancel: Mutex<CancellationToken>,
}

impl Uploader {
    pub fn new(service: Arc<dyn FileService>, config: UploadConfig) -> Self {
        let (events_tx, events_rx) = mpsc::channel(256);
        Self {
            service,
            config,
            events_tx,
            events_rx: Some(events_rx),
            cancel: Mutex::new(CancellationToken::new()),
        }
    }

    /// Takes the event receiver. Can only be called once.
    ///
    /// Events are only produced once the receiver has been taken.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<UploadEvent>> {
        self.events_rx.take()
    }

    /// Returns the token that cancels the uploads started through
    /// [`upload`](Self::upload) until it fires.
    ///
    /// Once an upload has ended cancelled, later uploads get a fresh token.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// Uploads one file and returns the stored record.
    ///
    /// Ends with exactly one of `Completed`, `Failed` or `Cancelled` on the
    /// event channel.
    pub async fn upload(&self, intent: &UploadIntent) -> Result<FileRecord, UploadError> {
        let cancel = self.cancel_token();
        let result = self.upload_with_cancel(intent, &cancel).await;
        if cancel.is_cancelled() {
            self.renew_cancel_token();
        }
        result
    }

    /// Like [`upload`](Self::upload), but only `cancel` can stop it.
    pub async fn upload_with_cancel(
        &self,
        intent: &UploadIntent,
        cancel: &CancellationToken,
    ) -> Result<FileRecord, UploadError> {
        let events = self.event_sink();
        match self.run(intent, cancel, &events).await {
            Ok((record, fast)) => {
                info!(file = %intent.file_name, id = %record.id, fast, "upload completed");
                events
                    .finish(UploadEvent::Completed {
                        record: record.clone(),
                        fast,
                    })
                    .await;
                Ok(record)
            }
            Err(UploadError::Cancelled) => {
                info!(file = %intent.file_name, "upload cancelled");
                events.finish(UploadEvent::Cancelled).await;
                Err(UploadError::Cancelled)
            }
            Err(e) => {
                error!(file = %intent.file_name, upload_id = ?e.upload_id(), error = %e, "upload failed");
                events
                    .finish(UploadEvent::Failed {
                        error: e.to_string(),
                    })
                    .await;
                Err(e)
            }
        }
    }

    /// Best-effort abort of a session by id. Never fails.
    pub async fn cancel_session(&self, upload_id: &str) -> bool {
        abort_session(self.service.as_ref(), upload_id).await
    }

    /// Asks the service how far a session got.
    pub async fn status(&self, upload_id: &str) -> Result<UploadStatusResponse, UploadError> {
        self.service
            .status(upload_id)
            .await
            .map_err(UploadError::Status)
    }

    async fn run(
        &self,
        intent: &UploadIntent,
        cancel: &CancellationToken,
        events: &EventSink,
    ) -> Result<(FileRecord, bool), UploadError> {
        let (plan, total_chunks) = intent.plan()?;
        let mut progress = ProgressAggregator::new();
        check_cancelled(cancel)?;

        // 1. Fingerprint
        let fingerprint = if intent.fingerprint {
            events.phase(UploadPhase::Hashing);
            self.fingerprint(intent, cancel, &mut progress, events).await?
        } else {
            None
        };

        // 2. Negotiate
        events.phase(UploadPhase::Negotiating);
        check_cancelled(cancel)?;
        let request = build_init_request(
            intent,
            total_chunks,
            fingerprint.as_deref(),
            self.config.hash_algorithm,
        );
        let outcome = negotiate(self.service.as_ref(), &request).await?;

        // 3. Transfer + finalize
        let (record, fast) = match outcome {
            InitOutcome::FastUpload(record) => (record, true),
            InitOutcome::Session { upload_id } => {
                let mut session = UploadSession::new(upload_id, total_chunks);
                let orchestrator = TransferOrchestrator {
                    service: self.service.as_ref(),
                    source: intent.source.as_ref(),
                    file_name: &intent.file_name,
                    max_concurrent: self.config.max_concurrent_chunks,
                    cancel,
                    events,
                };
                let record = orchestrator
                    .run(&mut session, plan.tasks(), &mut progress)
                    .await?;
                (record, false)
            }
        };

        // 4. Closing ramp
        self.finish_progress(&mut progress, events).await;
        Ok((record, fast))
    }

    /// Computes the fingerprint, or `None` if the source could not be read.
    async fn fingerprint(
        &self,
        intent: &UploadIntent,
        cancel: &CancellationToken,
        progress: &mut ProgressAggregator,
        events: &EventSink,
    ) -> Result<Option<String>, UploadError> {
        let block_size = match self.config.hash_block_size {
            0 => intent.chunk_size,
            n => n,
        };
        let fingerprinter = Fingerprinter::new(self.config.hash_algorithm, block_size);
        let hashing = fingerprinter.fingerprint(intent.source.as_ref(), |fraction| {
            if let Some(percent) = progress.hashing(fraction) {
                events.progress(Some(percent), UploadPhase::Hashing);
            }
        });

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(UploadError::Cancelled),
            result = hashing => result,
        };

        match result {
            Ok(fingerprint) => {
                events.emit(UploadEvent::FingerprintComputed {
                    fingerprint: fingerprint.clone(),
                });
                Ok(Some(fingerprint))
            }
            Err(e) => {
                warn!(file = %intent.file_name, error = %e, "fingerprint failed, fast upload disabled");
                events.emit(UploadEvent::FingerprintSkipped {
                    reason: e.to_string(),
                });
                Ok(None)
            }
        }
    }

    /// Walks the unified progress to 100 over the configured ramp.
    async fn finish_progress(&self, progress: &mut ProgressAggregator, events: &EventSink) {
        let plan = progress.ramp(self.config.finish_ramp);
        for step in plan.steps {
            if !plan.tick.is_zero() {
                tokio::time::sleep(plan.tick).await;
            }
            let phase = if step >= PROGRESS_DONE {
                UploadPhase::Done
            } else {
                UploadPhase::Finalizing
            };
            events.progress(progress.finish_step(step), phase);
        }
    }

    fn event_sink(&self) -> EventSink {
        // Nobody can drain the channel while the receiver is still ours.
        if self.events_rx.is_some() {
            EventSink::default()
        } else {
            EventSink::new(Some(self.events_tx.clone()))
        }
    }

    fn renew_cancel_token(&self) {
        let mut current = self.cancel.lock().unwrap_or_else(PoisonError::into_inner);
        if current.is_cancelled() {
            *current = CancellationToken::new();
        }
    }
}

fn check_cancelled(cancel: &CancellationToken) -> Result<(), UploadError> {
    if cancel.is_cancelled() {
        Err(UploadError::Cancelled)
    } else {
        Ok(())
    }
}
