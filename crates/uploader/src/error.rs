//! Upload error types.

use chunkwise_transfer::TransferError;

/// Boxed error carried by [`ServiceError::Transport`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure reported by a [`FileService`](crate::FileService) implementation.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The request never produced a usable response.
    #[error("transport error: {0}")]
    Transport(#[source] BoxError),

    /// The service answered and said no.
    #[error("rejected by service{}: {message}", status_suffix(.status))]
    Rejected {
        status: Option<u16>,
        message: String,
    },

    #[error("request timed out")]
    Timeout,
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

impl ServiceError {
    pub fn transport(err: impl Into<BoxError>) -> Self {
        Self::Transport(err.into())
    }

    pub fn rejected(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }
}

/// Errors produced by an upload.
///
/// Hashing failures never appear here. They downgrade the upload to the
/// chunked path and surface as [`UploadEvent::FingerprintSkipped`](crate::UploadEvent).
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("invalid upload: {0}")]
    InvalidIntent(String),

    #[error("upload init failed: {0}")]
    Negotiation(#[source] ServiceError),

    #[error("reading chunk {chunk_number} failed: {source}")]
    ChunkRead {
        upload_id: String,
        chunk_number: u32,
        #[source]
        source: TransferError,
    },

    #[error("chunk {chunk_number} upload failed: {source}")]
    ChunkTransfer {
        upload_id: String,
        chunk_number: u32,
        #[source]
        source: ServiceError,
    },

    #[error("finalizing upload {upload_id} failed: {source}")]
    Finalization {
        upload_id: String,
        #[source]
        source: ServiceError,
    },

    #[error("status query failed: {0}")]
    Status(#[source] ServiceError),

    #[error("cancelled")]
    Cancelled,

    #[error("transfer error: {0}")]
    Transfer(#[from] TransferError),
}

impl UploadError {
    /// Session id the failure belongs to, when one had been assigned.
    pub fn upload_id(&self) -> Option<&str> {
        match self {
            Self::ChunkRead { upload_id, .. }
            | Self::ChunkTransfer { upload_id, .. }
            | Self::Finalization { upload_id, .. } => Some(upload_id),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
