//! File service API client.
//!
//! Async HTTP client using `reqwest`. JSON bodies are wrapped in the
//! protocol's [`ApiResponse`] envelope; chunks travel as multipart forms.

use std::time::Duration;

use chunkwise_protocol::{
    AbortUploadRequest, ApiResponse, CompleteUploadRequest, FIELD_CHUNK_NUMBER, FIELD_FILE,
    FIELD_UPLOAD_ID, FileRecord, InitOutcome, InitUploadRequest, InitUploadResponse,
    ProtocolError, UploadStatusResponse,
};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

/// Errors from the file service client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
}

impl Error {
    /// Whether the request gave up because its timeout elapsed.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_timeout())
    }

    /// HTTP status of a rejected request, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Per-operation request timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Initialize, abort and status.
    pub request: Duration,
    /// Complete; the server merges chunks before answering.
    pub complete: Duration,
    /// Chunk uploads. `None` leaves them unbounded.
    pub chunk: Option<Duration>,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            request: Duration::from_secs(30),
            complete: Duration::from_secs(300),
            chunk: None,
        }
    }
}

/// File service API client.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    timeouts: Timeouts,
}

impl Client {
    /// Creates a client for the service rooted at `base_url`.
    pub fn new(base_url: &str) -> Result<Self, Error> {
        let parsed = reqwest::Url::parse(base_url)
            .map_err(|e| Error::InvalidBaseUrl(format!("{base_url}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::InvalidBaseUrl(format!(
                "{base_url}: unsupported scheme"
            )));
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("chunkwise/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeouts: Timeouts::default(),
        })
    }

    /// Replaces the per-operation timeouts.
    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Opens a session, or learns that the content is already stored.
    pub async fn init_upload(&self, req: &InitUploadRequest) -> Result<InitOutcome, Error> {
        let resp = self
            .http
            .post(self.url("/upload/init"))
            .timeout(self.timeouts.request)
            .json(req)
            .send()
            .await?;
        let body: InitUploadResponse = read_envelope(resp).await?.into_data()?;
        let outcome = body.into_outcome()?;
        debug!(file = %req.file_name, fast = matches!(outcome, InitOutcome::FastUpload(_)), "upload initialized");
        Ok(outcome)
    }

    /// Sends one chunk as a multipart form.
    pub async fn upload_chunk(
        &self,
        upload_id: &str,
        chunk_number: u32,
        file_name: &str,
        data: Vec<u8>,
    ) -> Result<(), Error> {
        let size = data.len();
        let part = Part::bytes(data)
            .file_name(format!("{file_name}.part{chunk_number}"))
            .mime_str("application/octet-stream")?;
        let form = Form::new()
            .text(FIELD_UPLOAD_ID, upload_id.to_string())
            .text(FIELD_CHUNK_NUMBER, chunk_number.to_string())
            .part(FIELD_FILE, part);

        let mut builder = self.http.post(self.url("/upload/chunk")).multipart(form);
        if let Some(timeout) = self.timeouts.chunk {
            builder = builder.timeout(timeout);
        }
        let resp = builder.send().await?;
        read_ack(resp).await?;
        trace!(upload_id, chunk = chunk_number, bytes = size, "chunk accepted");
        Ok(())
    }

    /// Asks the service to merge all chunks into the final file.
    pub async fn complete_upload(&self, upload_id: &str) -> Result<FileRecord, Error> {
        let req = CompleteUploadRequest {
            upload_id: upload_id.to_string(),
        };
        let resp = self
            .http
            .post(self.url("/upload/complete"))
            .timeout(self.timeouts.complete)
            .json(&req)
            .send()
            .await?;
        Ok(read_envelope(resp).await?.into_data()?)
    }

    /// Discards a session on the service side.
    pub async fn abort_upload(&self, upload_id: &str) -> Result<(), Error> {
        let req = AbortUploadRequest {
            upload_id: upload_id.to_string(),
        };
        let resp = self
            .http
            .post(self.url("/upload/abort"))
            .timeout(self.timeouts.request)
            .json(&req)
            .send()
            .await?;
        read_ack(resp).await
    }

    /// Returns how many chunks the service has received for a session.
    pub async fn upload_status(&self, upload_id: &str) -> Result<UploadStatusResponse, Error> {
        let encoded = utf8_percent_encode(upload_id, NON_ALPHANUMERIC).to_string();
        let resp = self
            .http
            .get(self.url(&format!("/upload/status/{encoded}")))
            .timeout(self.timeouts.request)
            .send()
            .await?;
        Ok(read_envelope(resp).await?.into_data()?)
    }
}

/// Checks the HTTP status and decodes the JSON envelope.
async fn read_envelope<T: DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<ApiResponse<T>, Error> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::Api {
            status: status.as_u16(),
            body,
        });
    }
    let bytes = resp.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Like [`read_envelope`], but an empty 2xx body also counts as success.
async fn read_ack(resp: reqwest::Response) -> Result<(), Error> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::Api {
            status: status.as_u16(),
            body,
        });
    }
    let bytes = resp.bytes().await?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(());
    }
    let envelope: ApiResponse<serde_json::Value> = serde_json::from_slice(&bytes)?;
    Ok(envelope.into_ack()?)
}
