//! Client-side chunked upload flow.
//!
//! This crate implements the **business logic** of uploading one file to
//! a remote file service. It has no transport dependency: the application
//! provides a [`FileService`] implementation on top of its HTTP client.
//!
//! # Pipeline
//!
//! 1. **Fingerprint**: stream the source through MD5 or SHA-256
//! 2. **Negotiate**: open a session, or finish at once on a fingerprint hit
//! 3. **Transfer**: send chunks with bounded concurrency
//! 4. **Finalize**: ask the service to assemble the file
//!
//! Cancellation at any point before finalizing aborts the session.

pub mod cancel;
pub mod error;
pub mod negotiate;
pub mod service;
mod session;
pub mod types;
pub mod uploader;

#[cfg(test)]
mod testing;

pub use cancel::abort_session;
pub use error::{BoxError, ServiceError, UploadError};
pub use negotiate::{build_init_request, negotiate};
pub use service::{FileService, ServiceFuture};
pub use types::{
    DEFAULT_FINISH_RAMP, DEFAULT_MAX_CONCURRENT_CHUNKS, UploadConfig, UploadEvent, UploadIntent,
    UploadPhase,
};
pub use uploader::Uploader;
