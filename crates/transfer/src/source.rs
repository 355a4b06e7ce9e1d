use std::future::Future;
use std::io::SeekFrom;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::TransferError;

/// Random-access byte source for an upload.
///
/// Implementations must tolerate concurrent `read_range` calls; the
/// uploader reads several chunks at once.
pub trait ByteSource: Send + Sync {
    /// Total length in bytes.
    fn len(&self) -> u64;

    /// Reads exactly `range` from the source.
    fn read_range(
        &self,
        range: Range<u64>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>, TransferError>> + Send + '_>>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn check_range(range: &Range<u64>, len: u64) -> Result<(), TransferError> {
    if range.start > range.end || range.end > len {
        return Err(TransferError::OutOfRange {
            start: range.start,
            end: range.end,
            len,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// FileSource
// ---------------------------------------------------------------------------

/// A file on local disk.
///
/// Each read opens its own handle, so concurrent chunk reads never
/// contend on a shared cursor.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    len: u64,
}

impl FileSource {
    /// Opens `path` and records its current size.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, TransferError> {
        let path = path.as_ref().to_path_buf();
        let len = tokio::fs::metadata(&path).await?.len();
        Ok(Self { path, len })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name component, if the path has one.
    pub fn file_name(&self) -> Option<String> {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
    }
}

impl ByteSource for FileSource {
    fn len(&self) -> u64 {
        self.len
    }

    fn read_range(
        &self,
        range: Range<u64>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>, TransferError>> + Send + '_>> {
        Box::pin(async move {
            check_range(&range, self.len)?;
            let mut file = tokio::fs::File::open(&self.path).await?;
            file.seek(SeekFrom::Start(range.start)).await?;
            let mut buf = vec![0u8; (range.end - range.start) as usize];
            // A short read means the file shrank after it was planned.
            file.read_exact(&mut buf).await?;
            Ok(buf)
        })
    }
}

// ---------------------------------------------------------------------------
// MemorySource
// ---------------------------------------------------------------------------

/// An in-memory buffer.
#[derive(Debug, Clone)]
pub struct MemorySource {
    data: Arc<[u8]>,
}

impl MemorySource {
    pub fn new(data: impl Into<Arc<[u8]>>) -> Self {
        Self { data: data.into() }
    }
}

impl ByteSource for MemorySource {
    fn len(&self) -> u64 {
        self.data.len() as u64
    }

    fn read_range(
        &self,
        range: Range<u64>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>, TransferError>> + Send + '_>> {
        Box::pin(async move {
            check_range(&range, self.len())?;
            Ok(self.data[range.start as usize..range.end as usize].to_vec())
        })
    }
}
