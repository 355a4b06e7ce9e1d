use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Envelope wrapping every JSON response from the file service.
///
/// `data` is absent on acknowledgement-only responses (abort, chunk upload).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Wraps a successful payload.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    /// Builds a failed envelope with a message.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }

    /// Checks the `success` flag, discarding any payload.
    pub fn into_ack(self) -> Result<(), ProtocolError> {
        if self.success {
            Ok(())
        } else {
            Err(ProtocolError::Rejected(self.rejection_message()))
        }
    }

    /// Checks the `success` flag and extracts the payload.
    pub fn into_data(self) -> Result<T, ProtocolError> {
        if !self.success {
            return Err(ProtocolError::Rejected(self.rejection_message()));
        }
        self.data.ok_or(ProtocolError::MissingData)
    }

    fn rejection_message(&self) -> String {
        self.message
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "no message".into())
    }
}
