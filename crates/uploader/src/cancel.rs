//! Best-effort session abort.

use tracing::{info, warn};

use crate::service::FileService;

/// Tells the service to discard `upload_id`.
///
/// Never fails: the return value only says whether the service
/// acknowledged, for diagnostics.
pub async fn abort_session(service: &dyn FileService, upload_id: &str) -> bool {
    match service.abort(upload_id).await {
        Ok(()) => {
            info!(upload_id, "upload session aborted");
            true
        }
        Err(e) => {
            warn!(upload_id, error = %e, "abort not acknowledged");
            false
        }
    }
}
