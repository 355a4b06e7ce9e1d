//! In-memory [`FileService`] used by the unit tests.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chunkwise_protocol::{FileRecord, InitOutcome, InitUploadRequest, UploadStatusResponse};
use tokio_util::sync::CancellationToken;

use crate::error::ServiceError;
use crate::service::{FileService, ServiceFuture};

pub(crate) const UPLOAD_ID: &str = "u-1";

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Init(InitUploadRequest),
    Chunk {
        upload_id: String,
        number: u32,
        file_name: String,
        len: usize,
    },
    Complete(String),
    Abort(String),
    Status(String),
}

pub(crate) fn record(id: &str) -> FileRecord {
    FileRecord {
        id: id.to_string(),
        file_name: "notes.txt".into(),
        file_size: 10,
        content_type: Some("text/plain".into()),
        url: Some(format!("https://files.example/{id}")),
        storage_path: None,
        file_md5: None,
        extra: Default::default(),
    }
}

/// Records every call; failures and delays are opt-in.
#[derive(Default)]
pub(crate) struct MockService {
    calls: Mutex<Vec<Call>>,
    chunks: Mutex<BTreeMap<u32, Vec<u8>>>,
    fast_record: Option<FileRecord>,
    fail_init: bool,
    fail_chunk: Option<u32>,
    fail_complete: bool,
    fail_abort: bool,
    cancel_on_chunk: Option<(u32, CancellationToken)>,
    chunk_delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockService {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_fast_record(mut self, record: FileRecord) -> Self {
        self.fast_record = Some(record);
        self
    }

    pub(crate) fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    pub(crate) fn failing_chunk(mut self, number: u32) -> Self {
        self.fail_chunk = Some(number);
        self
    }

    pub(crate) fn failing_complete(mut self) -> Self {
        self.fail_complete = true;
        self
    }

    pub(crate) fn failing_abort(mut self) -> Self {
        self.fail_abort = true;
        self
    }

    /// Cancels `token` once chunk `number` has been stored.
    pub(crate) fn cancel_on_chunk(mut self, number: u32, token: CancellationToken) -> Self {
        self.cancel_on_chunk = Some((number, token));
        self
    }

    pub(crate) fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = Some(delay);
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    pub(crate) fn chunk_numbers(&self) -> Vec<u32> {
        let mut numbers: Vec<u32> = self
            .calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| match c {
                Call::Chunk { number, .. } => Some(*number),
                _ => None,
            })
            .collect();
        numbers.sort_unstable();
        numbers
    }

    /// Stored chunks concatenated in chunk-number order.
    pub(crate) fn assembled(&self) -> Vec<u8> {
        self.chunks
            .lock()
            .unwrap()
            .values()
            .flat_map(|c| c.iter().copied())
            .collect()
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn record_call(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl FileService for MockService {
    fn initialize<'a>(&'a self, request: &'a InitUploadRequest) -> ServiceFuture<'a, InitOutcome> {
        Box::pin(async move {
            self.record_call(Call::Init(request.clone()));
            if self.fail_init {
                return Err(ServiceError::rejected(Some(500), "init exploded"));
            }
            match &self.fast_record {
                Some(record) => Ok(InitOutcome::FastUpload(record.clone())),
                None => Ok(InitOutcome::Session {
                    upload_id: UPLOAD_ID.into(),
                }),
            }
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
            self.record_call(Call::Chunk {
                upload_id: upload_id.to_string(),
                number: chunk_number,
                file_name: file_name.to_string(),
                len: data.len(),
            });

            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            if let Some(delay) = self.chunk_delay {
                tokio::time::sleep(delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.fail_chunk == Some(chunk_number) {
                return Err(ServiceError::transport("connection reset"));
            }
            self.chunks.lock().unwrap().insert(chunk_number, data);

            if let Some((number, token)) = &self.cancel_on_chunk {
                if *number == chunk_number {
                    token.cancel();
                }
            }
            Ok(())
        })
    }

    fn complete<'a>(&'a self, upload_id: &'a str) -> ServiceFuture<'a, FileRecord> {
        Box::pin(async move {
            self.record_call(Call::Complete(upload_id.to_string()));
            if self.fail_complete {
                return Err(ServiceError::Timeout);
            }
            Ok(record("f-merged"))
        })
    }

    fn abort<'a>(&'a self, upload_id: &'a str) -> ServiceFuture<'a, ()> {
        Box::pin(async move {
            self.record_call(Call::Abort(upload_id.to_string()));
            if self.fail_abort {
                return Err(ServiceError::rejected(Some(404), "no such session"));
            }
            Ok(())
        })
    }

    fn status<'a>(&'a self, upload_id: &'a str) -> ServiceFuture<'a, UploadStatusResponse> {
        Box::pin(async move {
            self.record_call(Call::Status(upload_id.to_string()));
            let uploaded = self.chunks.lock().unwrap().len() as u32;
            Ok(UploadStatusResponse {
                upload_id: upload_id.to_string(),
                uploaded_chunks: uploaded,
                total_chunks: uploaded,
            })
        })
    }
}
