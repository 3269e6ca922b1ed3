//! Todo client error type and its retry classification.

use crate::control::Cancelled;
use crate::retry::{classify_http_status, Classify, FailureKind};
use thiserror::Error;

/// Error returned by one todo request (curl failure, HTTP error, bad body).
#[derive(Debug, Error)]
pub enum ClientError {
    /// Request could not be built (bad URL, etc.).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// Curl reported an error (timeout, connection, etc.).
    #[error(transparent)]
    Curl(#[from] curl::Error),
    /// Response had a non-2xx status.
    #[error("HTTP {status} from {url}")]
    Http { status: u32, url: String },
    /// Body was not valid JSON.
    #[error("decoding response body: {0}")]
    Decode(#[from] serde_json::Error),
    /// Caller aborted the call.
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
    /// Blocking worker for the request panicked or was shut down.
    #[error("request worker failed: {0}")]
    Worker(String),
}

/// Classify a curl error for retry decisions.
pub fn classify_curl_error(e: &curl::Error) -> FailureKind {
    if e.is_operation_timedout() {
        return FailureKind::Timeout;
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
        || e.is_partial_file()
    {
        return FailureKind::Connection;
    }
    FailureKind::Other
}

impl Classify for ClientError {
    fn failure_kind(&self) -> FailureKind {
        match self {
            ClientError::InvalidRequest(_) | ClientError::Worker(_) => FailureKind::Other,
            ClientError::Curl(e) => classify_curl_error(e),
            ClientError::Http { status, .. } => {
                classify_http_status(*status).unwrap_or(FailureKind::Other)
            }
            ClientError::Decode(_) => FailureKind::Decode,
            ClientError::Cancelled(_) => FailureKind::Cancelled,
        }
    }
}
