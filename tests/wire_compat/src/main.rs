fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use chunkwise_protocol::{
        ApiResponse, CompleteUploadRequest, FileRecord, HashAlgorithm, InitOutcome,
        InitUploadRequest, InitUploadResponse, ProtocolError, UploadStatusResponse,
    };

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        let path = fixtures_dir().join(name);
        let data = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
        serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", path.display()))
    }

    fn parse_fixture<T: serde::de::DeserializeOwned>(name: &str) -> T {
        serde_json::from_value(load_fixture(name))
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"))
    }

    /// Deserializes a fixture into a Rust type, re-serializes it, and compares
    /// the JSON values (order-independent).
    fn roundtrip_test<T>(name: &str)
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = parse_fixture(name);
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));
        assert_eq!(
            fixture, reserialized,
            "roundtrip mismatch for {name}:\n  server: {fixture}\n  client: {reserialized}"
        );
    }

    // --- Requests ---

    #[test]
    fn fixture_init_upload_request() {
        roundtrip_test::<InitUploadRequest>("init_upload_request.json");

        let req: InitUploadRequest = parse_fixture("init_upload_request.json");
        assert_eq!(req.total_chunks, 3);
        assert_eq!(req.hash_algorithm, Some(HashAlgorithm::Md5));
    }

    #[test]
    fn fixture_init_upload_request_unhashed() {
        roundtrip_test::<InitUploadRequest>("init_upload_request_unhashed.json");

        let req: InitUploadRequest = parse_fixture("init_upload_request_unhashed.json");
        assert_eq!(req.file_md5, None);
        assert_eq!(req.total_chunks, 0);
    }

    #[test]
    fn fixture_complete_upload_request() {
        roundtrip_test::<CompleteUploadRequest>("complete_upload_request.json");
    }

    // --- Responses ---

    #[test]
    fn fixture_init_upload_response_session() {
        roundtrip_test::<ApiResponse<InitUploadResponse>>("init_upload_response_session.json");

        let envelope: ApiResponse<InitUploadResponse> =
            parse_fixture("init_upload_response_session.json");
        let outcome = envelope.into_data().unwrap().into_outcome().unwrap();
        assert_eq!(
            outcome,
            InitOutcome::Session {
                upload_id: "9f3c2a1e-upload".into()
            }
        );
    }

    #[test]
    fn fixture_init_upload_response_fast() {
        roundtrip_test::<ApiResponse<InitUploadResponse>>("init_upload_response_fast.json");

        let envelope: ApiResponse<InitUploadResponse> =
            parse_fixture("init_upload_response_fast.json");
        let InitOutcome::FastUpload(record) = envelope.into_data().unwrap().into_outcome().unwrap()
        else {
            panic!("expected fast upload");
        };
        assert_eq!(record.id, "1187");
        assert_eq!(record.content_type.as_deref(), Some("video/mp4"));
        assert_eq!(record.extra["createdAt"], "2024-06-01T10:00:00Z");
        assert_eq!(record.extra["tags"][0], "family");
    }

    #[test]
    fn fixture_complete_upload_response() {
        roundtrip_test::<ApiResponse<FileRecord>>("complete_upload_response.json");

        let envelope: ApiResponse<FileRecord> = parse_fixture("complete_upload_response.json");
        let record = envelope.into_data().unwrap();
        assert_eq!(record.file_size, 5_242_880);
        assert_eq!(record.extra["uploaderId"], "42");
    }

    #[test]
    fn fixture_upload_status_response() {
        roundtrip_test::<ApiResponse<UploadStatusResponse>>("upload_status_response.json");

        let envelope: ApiResponse<UploadStatusResponse> =
            parse_fixture("upload_status_response.json");
        let status = envelope.into_data().unwrap();
        assert_eq!((status.uploaded_chunks, status.total_chunks), (2, 3));
    }

    #[test]
    fn fixture_error_response() {
        roundtrip_test::<ApiResponse<serde_json::Value>>("error_response.json");

        let envelope: ApiResponse<serde_json::Value> = parse_fixture("error_response.json");
        assert_eq!(
            envelope.into_ack(),
            Err(ProtocolError::Rejected("upload session not found".into()))
        );
    }
}
