//! CLI configuration.
//!
//! Read from `~/.config/chunkwise/config.json`. Every field is optional;
//! command-line flags override whatever the file sets.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chunkwise_file_service::Timeouts;
use chunkwise_protocol::HashAlgorithm;
use chunkwise_transfer::DEFAULT_CHUNK_SIZE;
use chunkwise_uploader::{DEFAULT_MAX_CONCURRENT_CHUNKS, UploadConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkwiseConfig {
    /// Base URL of the file service, e.g. `https://files.example.com/api`.
    pub server_url: String,
    /// Owner identity sent with every upload. Defaults to the hostname.
    pub owner: String,
    /// Category label sent with every upload.
    pub category: String,
    pub chunk_size: u64,
    pub max_concurrent_chunks: usize,
    pub fingerprint: bool,
    pub hash_algorithm: HashAlgorithm,
    pub request_timeout_secs: u64,
    pub complete_timeout_secs: u64,
    /// Unset leaves chunk uploads without a deadline.
    pub chunk_timeout_secs: Option<u64>,
    pub finish_ramp_ms: u64,
}

fn default_owner() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "chunkwise".into())
}

impl Default for ChunkwiseConfig {
    fn default() -> Self {
        let timeouts = Timeouts::default();
        Self {
            server_url: "http://localhost:8080/api".into(),
            owner: default_owner(),
            category: "file".into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_concurrent_chunks: DEFAULT_MAX_CONCURRENT_CHUNKS,
            fingerprint: true,
            hash_algorithm: HashAlgorithm::default(),
            request_timeout_secs: timeouts.request.as_secs(),
            complete_timeout_secs: timeouts.complete.as_secs(),
            chunk_timeout_secs: None,
            finish_ramp_ms: 300,
        }
    }
}

impl ChunkwiseConfig {
    /// Loads the default config file, falling back to defaults.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&config_path()?)
    }

    /// Loads `path`. A missing file yields defaults; an unparsable one
    /// is reported and ignored.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        match serde_json::from_str::<Self>(&content) {
            Ok(config) => {
                tracing::debug!(path = %path.display(), "configuration loaded");
                Ok(config)
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config, using defaults"
                );
                Ok(Self::default())
            }
        }
    }

    pub fn upload_config(&self) -> UploadConfig {
        UploadConfig {
            max_concurrent_chunks: self.max_concurrent_chunks,
            hash_algorithm: self.hash_algorithm,
            hash_block_size: 0,
            finish_ramp: Duration::from_millis(self.finish_ramp_ms),
        }
    }

    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            request: Duration::from_secs(self.request_timeout_secs),
            complete: Duration::from_secs(self.complete_timeout_secs),
            chunk: self.chunk_timeout_secs.map(Duration::from_secs),
        }
    }
}

/// `~/.config/chunkwise/config.json`.
pub fn config_path() -> anyhow::Result<PathBuf> {
    Ok(config_base_dir()?.join("chunkwise").join("config.json"))
}

fn config_base_dir() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata))
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME")
            .map_err(|_| anyhow::anyhow!("HOME is not set; pass --config explicitly"))?;
        Ok(PathBuf::from(home).join(".config"))
    }
}
