//! Bridges the HTTP [`Client`] to the uploader's [`FileService`] trait.

use chunkwise_file_service::{Client, Error};
use chunkwise_protocol::{
    FileRecord, InitOutcome, InitUploadRequest, ProtocolError, UploadStatusResponse,
};
use chunkwise_uploader::{FileService, ServiceError, ServiceFuture};

/// Implements [`FileService`] by delegating to the file service HTTP client.
pub struct HttpFileService {
    client: Client,
}

impl HttpFileService {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn to_service_error(err: Error) -> ServiceError {
    if err.is_timeout() {
        return ServiceError::Timeout;
    }
    match err {
        Error::Api { status, body } => ServiceError::rejected(Some(status), body),
        Error::Protocol(ProtocolError::Rejected(message)) => ServiceError::rejected(None, message),
        other => ServiceError::transport(other),
    }
}

impl FileService for HttpFileService {
    fn initialize<'a>(&'a self, request: &'a InitUploadRequest) -> ServiceFuture<'a, InitOutcome> {
        Box::pin(async move {
            self.client
                .init_upload(request)
                .await
                .map_err(to_service_error)
        })
    }

    fn upload_chunk<'a>(
        &'a self,
        upload_id: &'a str,
        chunk_number: u32,
        file_name: &'a str,
        data: Vec<u8>,
    ) -> ServiceFuture<'a, ()> {
        Box::pin(async move {
            self.client
                .upload_chunk(upload_id, chunk_number, file_name, data)
                .await
                .map_err(to_service_error)
        })
    }

    fn complete<'a>(&'a self, upload_id: &'a str) -> ServiceFuture<'a, FileRecord> {
        Box::pin(async move {
            self.client
                .complete_upload(upload_id)
                .await
                .map_err(to_service_error)
        })
    }

    fn abort<'a>(&'a self, upload_id: &'a str) -> ServiceFuture<'a, ()> {
        Box::pin(async move {
            self.client
                .abort_upload(upload_id)
                .await
                .map_err(to_service_error)
        })
    }

    fn status<'a>(&'a self, upload_id: &'a str) -> ServiceFuture<'a, UploadStatusResponse> {
        Box::pin(async move {
            self.client
                .upload_status(upload_id)
                .await
                .map_err(to_service_error)
        })
    }
}
