use serde::{Deserialize, Serialize};

use crate::ProtocolError;
use crate::types::{FileRecord, HashAlgorithm, InitOutcome};

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

/// Opens an upload session (or asks for a fast upload).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitUploadRequest {
    pub file_name: String,
    pub file_size: u64,
    pub total_chunks: u32,
    pub file_type: String,
    pub uploader_id: String,
    /// Whole-file fingerprint. Absent when hashing was skipped or failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_md5: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash_algorithm: Option<HashAlgorithm>,
}

/// Requests server-side merge of all received chunks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteUploadRequest {
    pub upload_id: String,
}

/// Discards an upload session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbortUploadRequest {
    pub upload_id: String,
}

// ---------------------------------------------------------------------------
// Response payloads
// ---------------------------------------------------------------------------

/// Raw initialize response.
///
/// Either `fastUpload` is set with a `fileRecord`, or an `uploadId` is returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitUploadResponse {
    #[serde(default)]
    pub fast_upload: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_record: Option<FileRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_id: Option<String>,
}

impl InitUploadResponse {
    /// Interprets the response as fast-path or slow-path.
    pub fn into_outcome(self) -> Result<InitOutcome, ProtocolError> {
        if self.fast_upload {
            return self
                .file_record
                .map(InitOutcome::FastUpload)
                .ok_or(ProtocolError::MissingFileRecord);
        }
        match self.upload_id {
            Some(id) if !id.is_empty() => Ok(InitOutcome::Session { upload_id: id }),
            _ => Err(ProtocolError::MissingUploadId),
        }
    }
}

/// Server-side view of a session, used for externally driven resume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadStatusResponse {
    pub upload_id: String,
    pub uploaded_chunks: u32,
    pub total_chunks: u32,
}
