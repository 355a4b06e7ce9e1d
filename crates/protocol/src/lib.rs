//! Wire protocol types for the chunked-upload file service.
//!
//! Every JSON body the service returns is wrapped in an [`ApiResponse`]
//! envelope. Field names are camelCase on the wire.

pub mod envelope;
pub mod messages;
pub mod types;

pub use envelope::ApiResponse;
pub use messages::{
    AbortUploadRequest, CompleteUploadRequest, InitUploadRequest, InitUploadResponse,
    UploadStatusResponse,
};
pub use types::{FileRecord, HashAlgorithm, InitOutcome};

/// Multipart field carrying the session identifier.
pub const FIELD_UPLOAD_ID: &str = "uploadId";
/// Multipart field carrying the 1-based chunk number.
pub const FIELD_CHUNK_NUMBER: &str = "chunkNumber";
/// Multipart field carrying the chunk bytes.
pub const FIELD_FILE: &str = "file";

/// Errors produced while interpreting protocol payloads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("service rejected request: {0}")]
    Rejected(String),

    #[error("response envelope carried no data")]
    MissingData,

    #[error("fast upload response without a file record")]
    MissingFileRecord,

    #[error("upload response without an upload id")]
    MissingUploadId,
}
