//! Terminal rendering of upload events.

use chunkwise_uploader::{UploadEvent, UploadPhase};

fn phase_label(phase: UploadPhase) -> &'static str {
    match phase {
        UploadPhase::Hashing => "hashing",
        UploadPhase::Negotiating => "negotiating",
        UploadPhase::Transferring => "uploading",
        UploadPhase::Finalizing => "finalizing",
        UploadPhase::Done => "done",
    }
}

/// One human-readable status line per event, or `None` for events that
/// only matter to machine consumers.
pub fn describe(event: &UploadEvent) -> Option<String> {
    match event {
        UploadEvent::Progress { percent, phase } => {
            Some(format!("[{percent:>3}%] {}", phase_label(*phase)))
        }
        UploadEvent::Phase { .. } => None,
        UploadEvent::FingerprintComputed { fingerprint } => {
            Some(format!("fingerprint {fingerprint}"))
        }
        UploadEvent::FingerprintSkipped { reason } => {
            Some(format!("fingerprint skipped ({reason}), uploading without dedup"))
        }
        UploadEvent::SessionStarted {
            upload_id,
            total_chunks,
        } => Some(format!("session {upload_id}: {total_chunks} chunk(s)")),
        UploadEvent::ChunkUploaded {
            chunk_number,
            uploaded_chunks,
            total_chunks,
        } => Some(format!(
            "chunk {chunk_number} stored ({uploaded_chunks}/{total_chunks})"
        )),
        UploadEvent::Completed { record, fast: true } => {
            Some(format!("already stored as {}", record.id))
        }
        UploadEvent::Completed { record, fast: false } => {
            Some(format!("uploaded as {}", record.id))
        }
        UploadEvent::Failed { error } => Some(format!("upload failed: {error}")),
        UploadEvent::Cancelled => Some("upload cancelled".into()),
    }
}

/// Prints events to stderr until the channel closes.
pub async fn render_events(
    mut rx: tokio::sync::mpsc::Receiver<UploadEvent>,
    json: bool,
) {
    while let Some(event) = rx.recv().await {
        if json {
            match serde_json::to_string(&event) {
                Ok(line) => eprintln!("{line}"),
                Err(e) => tracing::warn!(error = %e, "failed to encode event"),
            }
        } else if let Some(line) = describe(&event) {
            eprintln!("{line}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_line_is_padded() {
        let line = describe(&UploadEvent::Progress {
            percent: 5,
            phase: UploadPhase::Hashing,
        });
        assert_eq!(line.as_deref(), Some("[  5%] hashing"));
    }

    #[test]
    fn chunk_line_shows_counts() {
        let line = describe(&UploadEvent::ChunkUploaded {
            chunk_number: 3,
            uploaded_chunks: 2,
            total_chunks: 3,
        });
        assert_eq!(line.as_deref(), Some("chunk 3 stored (2/3)"));
    }

    #[test]
    fn phase_changes_are_quiet() {
        assert_eq!(
            describe(&UploadEvent::Phase {
                phase: UploadPhase::Negotiating
            }),
            None
        );
    }
}
