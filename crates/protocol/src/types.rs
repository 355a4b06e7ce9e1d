use serde::{Deserialize, Serialize};

/// Digest used for the whole-file fingerprint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Md5,
    Sha256,
}

impl HashAlgorithm {
    /// Wire name of the algorithm.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha256 => "sha256",
        }
    }

    /// Length of the hex-encoded digest.
    pub const fn hex_len(self) -> usize {
        match self {
            Self::Md5 => 32,
            Self::Sha256 => 64,
        }
    }
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HashAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "md5" => Ok(Self::Md5),
            "sha256" | "sha-256" => Ok(Self::Sha256),
            other => Err(format!("unknown hash algorithm: {other}")),
        }
    }
}

/// Stored file record returned by the service.
///
/// Fields the client does not model are kept in `extra` so the record
/// can be handed back to callers unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: String,
    pub file_name: String,
    pub file_size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_md5: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Interpreted result of the initialize operation.
#[derive(Debug, Clone, PartialEq)]
pub enum InitOutcome {
    /// The service already stores identical content.
    FastUpload(FileRecord),
    /// A fresh session was opened; chunks must be sent.
    Session { upload_id: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn algorithm_parse_and_display() {
        assert_eq!("MD5".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Md5);
        assert_eq!(
            "sha-256".parse::<HashAlgorithm>().unwrap(),
            HashAlgorithm::Sha256
        );
        assert!("crc32".parse::<HashAlgorithm>().is_err());
        assert_eq!(HashAlgorithm::Sha256.to_string(), "sha256");
    }

    #[test]
    fn algorithm_serializes_lowercase() {
        let json = serde_json::to_string(&HashAlgorithm::Md5).unwrap();
        assert_eq!(json, r#""md5""#);
    }

    #[test]
    fn file_record_keeps_unknown_fields() {
        let json = r#"{
            "id":"f-1","fileName":"movie.mkv","fileSize":5242880,
            "contentType":"video/x-matroska","bucket":"media","createdBy":7
        }"#;
        let record: FileRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, "f-1");
        assert_eq!(record.file_size, 5_242_880);
        assert!(record.url.is_none());
        assert_eq!(record.extra["bucket"], "media");
        assert_eq!(record.extra["createdBy"], 7);

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["bucket"], "media");
        assert!(back.get("url").is_none());
    }
}
