//! Session negotiation: one initialize call per upload.

use chunkwise_protocol::{HashAlgorithm, InitOutcome, InitUploadRequest};
use tracing::{debug, info};

use crate::error::UploadError;
use crate::service::FileService;
use crate::types::UploadIntent;

/// Builds the initialize request for `intent`.
///
/// The algorithm is only declared when a fingerprint is attached.
pub fn build_init_request(
    intent: &UploadIntent,
    total_chunks: u32,
    fingerprint: Option<&str>,
    algorithm: HashAlgorithm,
) -> InitUploadRequest {
    InitUploadRequest {
        file_name: intent.file_name.clone(),
        file_size: intent.file_size,
        total_chunks,
        file_type: intent.file_type.clone(),
        uploader_id: intent.uploader_id.clone(),
        file_md5: fingerprint.map(str::to_string),
        hash_algorithm: fingerprint.map(|_| algorithm),
    }
}

/// Opens the upload and reports whether it finished on the fast path.
pub async fn negotiate(
    service: &dyn FileService,
    request: &InitUploadRequest,
) -> Result<InitOutcome, UploadError> {
    debug!(
        file = %request.file_name,
        size = request.file_size,
        chunks = request.total_chunks,
        fingerprinted = request.file_md5.is_some(),
        "initializing upload"
    );

    let outcome = service
        .initialize(request)
        .await
        .map_err(UploadError::Negotiation)?;

    match &outcome {
        InitOutcome::FastUpload(record) => {
            info!(file = %request.file_name, id = %record.id, "fast upload, content already stored");
        }
        InitOutcome::Session { upload_id } => {
            debug!(file = %request.file_name, upload_id = %upload_id, "upload session opened");
        }
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::testing::{Call, MockService, record};
    use chunkwise_transfer::MemorySource;
    use std::sync::Arc;

    fn intent() -> UploadIntent {
        UploadIntent::new(Arc::new(MemorySource::new(vec![1u8; 10])), "notes.txt")
            .with_file_type("document")
            .with_uploader_id("alice")
    }

    #[test]
    fn request_carries_intent_fields() {
        let req = build_init_request(&intent(), 3, Some("abc"), HashAlgorithm::Sha256);
        assert_eq!(req.file_name, "notes.txt");
        assert_eq!(req.file_size, 10);
        assert_eq!(req.total_chunks, 3);
        assert_eq!(req.file_type, "document");
        assert_eq!(req.uploader_id, "alice");
        assert_eq!(req.file_md5.as_deref(), Some("abc"));
        assert_eq!(req.hash_algorithm, Some(HashAlgorithm::Sha256));
    }

    #[test]
    fn request_without_fingerprint_omits_algorithm() {
        let req = build_init_request(&intent(), 1, None, HashAlgorithm::Md5);
        assert_eq!(req.file_md5, None);
        assert_eq!(req.hash_algorithm, None);
    }

    #[tokio::test]
    async fn fast_path_returns_record() {
        let mock = MockService::new().with_fast_record(record("f-1"));
        let req = build_init_request(&intent(), 1, Some("abc"), HashAlgorithm::Md5);

        let outcome = negotiate(&mock, &req).await.unwrap();
        assert_eq!(outcome, InitOutcome::FastUpload(record("f-1")));
        assert_eq!(mock.calls(), vec![Call::Init(req)]);
    }

    #[tokio::test]
    async fn slow_path_returns_session() {
        let mock = MockService::new();
        let req = build_init_request(&intent(), 1, None, HashAlgorithm::Md5);

        let outcome = negotiate(&mock, &req).await.unwrap();
        assert!(matches!(outcome, InitOutcome::Session { upload_id } if upload_id == "u-1"));
    }

    #[tokio::test]
    async fn init_failure_is_negotiation_error() {
        let mock = MockService::new().failing_init();
        let req = build_init_request(&intent(), 1, None, HashAlgorithm::Md5);

        let err = negotiate(&mock, &req).await.unwrap_err();
        assert!(matches!(
            err,
            UploadError::Negotiation(ServiceError::Rejected { .. })
        ));
    }
}
