//! Failure kinds and the `Classify` trait used by the retry policy.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;

/// High-level classification of a failed remote call.
///
/// Retry configs allow-list kinds by their kebab-case name
/// (e.g. `"server-error"`); anything not listed is fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    /// Operation timed out (connect/read).
    Timeout,
    /// Network-level failure (connection refused/reset, DNS, etc.).
    Connection,
    /// Server asked us to slow down (429, 503).
    Throttled,
    /// 5xx other than throttling.
    ServerError,
    /// 4xx other than throttling.
    ClientError,
    /// Local I/O failure not tied to the connection.
    Io,
    /// Response arrived but could not be decoded.
    Decode,
    /// Call was aborted by the caller. Never retried.
    Cancelled,
    /// Anything else.
    Other,
}

impl FailureKind {
    pub const ALL: [FailureKind; 9] = [
        FailureKind::Timeout,
        FailureKind::Connection,
        FailureKind::Throttled,
        FailureKind::ServerError,
        FailureKind::ClientError,
        FailureKind::Io,
        FailureKind::Decode,
        FailureKind::Cancelled,
        FailureKind::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Timeout => "timeout",
            FailureKind::Connection => "connection",
            FailureKind::Throttled => "throttled",
            FailureKind::ServerError => "server-error",
            FailureKind::ClientError => "client-error",
            FailureKind::Io => "io",
            FailureKind::Decode => "decode",
            FailureKind::Cancelled => "cancelled",
            FailureKind::Other => "other",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure that can report its kind to the retry policy.
pub trait Classify {
    fn failure_kind(&self) -> FailureKind;
}

impl<C: Classify + ?Sized> Classify for &C {
    fn failure_kind(&self) -> FailureKind {
        (**self).failure_kind()
    }
}

impl<C: Classify + ?Sized> Classify for Box<C> {
    fn failure_kind(&self) -> FailureKind {
        (**self).failure_kind()
    }
}

/// Classify an I/O error for retry decisions.
pub fn classify_io_error(e: &io::Error) -> FailureKind {
    match e.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => FailureKind::Timeout,
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::NotConnected
        | io::ErrorKind::BrokenPipe
        | io::ErrorKind::UnexpectedEof => FailureKind::Connection,
        _ => FailureKind::Io,
    }
}

impl Classify for io::Error {
    fn failure_kind(&self) -> FailureKind {
        classify_io_error(self)
    }
}

/// Classify an HTTP status code for retry decisions.
///
/// Returns `None` for success and informational codes.
pub fn classify_http_status(code: u32) -> Option<FailureKind> {
    match code {
        429 | 503 => Some(FailureKind::Throttled),
        500..=599 => Some(FailureKind::ServerError),
        400..=499 => Some(FailureKind::ClientError),
        200..=399 => None,
        _ => Some(FailureKind::Other),
    }
}
