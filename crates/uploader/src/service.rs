//! Remote file service trait.
//!
//! The application implements [`FileService`] on top of its HTTP client;
//! the upload flow only ever talks to this trait.

use std::future::Future;
use std::pin::Pin;

use chunkwise_protocol::{FileRecord, InitOutcome, InitUploadRequest, UploadStatusResponse};

use crate::error::ServiceError;

/// Boxed future returned by [`FileService`] methods.
pub type ServiceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ServiceError>> + Send + 'a>>;

/// Abstract remote file service speaking the chunked upload protocol.
pub trait FileService: Send + Sync {
    /// Opens an upload. The service either recognises the fingerprint and
    /// returns the stored record, or assigns a session id.
    fn initialize<'a>(&'a self, request: &'a InitUploadRequest) -> ServiceFuture<'a, InitOutcome>;

    /// Sends one chunk. `chunk_number` is 1-based.
    fn upload_chunk<'a>(
        &'a self,
        upload_id: &'a str,
        chunk_number: u32,
        file_name: &'a str,
        data: Vec<u8>,
    ) -> ServiceFuture<'a, ()>;

    /// Asks the service to assemble all chunks into the final file.
    fn complete<'a>(&'a self, upload_id: &'a str) -> ServiceFuture<'a, FileRecord>;

    /// Discards a session and its uploaded chunks.
    fn abort<'a>(&'a self, upload_id: &'a str) -> ServiceFuture<'a, ()>;

    /// Reports how many chunks of a session the service holds.
    fn status<'a>(&'a self, upload_id: &'a str) -> ServiceFuture<'a, UploadStatusResponse>;
}
