use chunkwise_protocol::HashAlgorithm;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::source::ByteSource;
use crate::{DEFAULT_CHUNK_SIZE, TransferError};

/// Incremental digest state for one of the supported algorithms.
enum Accumulator {
    Md5(md5::Context),
    Sha256(Sha256),
}

impl Accumulator {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Md5 => Self::Md5(md5::Context::new()),
            HashAlgorithm::Sha256 => Self::Sha256(Sha256::new()),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Md5(ctx) => ctx.consume(data),
            Self::Sha256(hasher) => hasher.update(data),
        }
    }

    fn finish(self) -> String {
        match self {
            Self::Md5(ctx) => format!("{:x}", ctx.compute()),
            Self::Sha256(hasher) => hex::encode(hasher.finalize()),
        }
    }
}

/// Hex digest of an in-memory buffer.
pub fn fingerprint_bytes(algorithm: HashAlgorithm, data: &[u8]) -> String {
    let mut acc = Accumulator::new(algorithm);
    acc.update(data);
    acc.finish()
}

/// Streams a [`ByteSource`] through a digest one block at a time.
///
/// Memory use is bounded by the block size regardless of source length,
/// and the result does not depend on the block size.
#[derive(Debug, Clone, Copy)]
pub struct Fingerprinter {
    algorithm: HashAlgorithm,
    block_size: u64,
}

impl Default for Fingerprinter {
    fn default() -> Self {
        Self::new(HashAlgorithm::default(), DEFAULT_CHUNK_SIZE)
    }
}

impl Fingerprinter {
    /// If `block_size` is 0, [`DEFAULT_CHUNK_SIZE`] is used.
    pub fn new(algorithm: HashAlgorithm, block_size: u64) -> Self {
        let block_size = if block_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            block_size
        };
        Self {
            algorithm,
            block_size,
        }
    }

    /// Computes the hex fingerprint of `source`.
    ///
    /// `on_progress` receives the fraction of bytes consumed (0.0–1.0)
    /// after every block; an empty source reports 1.0 once.
    pub async fn fingerprint<F>(
        &self,
        source: &dyn ByteSource,
        mut on_progress: F,
    ) -> Result<String, TransferError>
    where
        F: FnMut(f64) + Send,
    {
        let len = source.len();
        let mut acc = Accumulator::new(self.algorithm);
        let mut offset = 0u64;

        while offset < len {
            let end = len.min(offset + self.block_size);
            let block = source.read_range(offset..end).await?;
            acc.update(&block);
            offset = end;
            on_progress(offset as f64 / len as f64);
        }
        if len == 0 {
            on_progress(1.0);
        }

        let digest = acc.finish();
        debug!(algorithm = %self.algorithm, bytes = len, fingerprint = %digest, "fingerprint computed");
        Ok(digest)
    }
}
