//! Error classification shared by every Courier crate
//!
//! Each layer owns a `thiserror` enum that says what went wrong in its own
//! terms ([`CryptoError`](crate::crypto::CryptoError) here, `CourierError` in
//! the domain crate, `CallbackError` and `ApiError` further up). They all
//! implement [`ErrorClassification`] so renewal loops and request handlers can
//! decide whether to retry and at which level to log without matching on
//! concrete variants.
//!
//! [`CommonError`] covers the failures that are not specific to any layer:
//! a bad configuration field, an undecodable document, an operation that ran
//! out of time. Layer enums convert from it with `?`.
//!
//! | Severity | Typical source |
//! |----------|----------------|
//! | `Info` | platform re-delivering a callback |
//! | `Warning` | timeouts, `-1` system busy, dropped connections |
//! | `Error` | rejected signatures, malformed bodies |
//! | `Critical` | bad keys or configuration, broken invariants |

use std::fmt;
use std::time::Duration;

use thiserror::Error;

pub type CommonResult<T> = Result<T, CommonError>;

/// Failures shared across layers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommonError {
    #[error("invalid configuration for `{field}`: {reason}")]
    Config { field: &'static str, reason: String },

    #[error("could not decode {format} document: {reason}")]
    Decode { format: &'static str, reason: String },

    #[error("{operation} did not finish within {}s", .limit.as_secs())]
    Timeout { operation: &'static str, limit: Duration },

    #[error("internal error: {0}")]
    Internal(String),
}

impl CommonError {
    pub fn config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Config { field, reason: reason.into() }
    }

    pub fn decode(format: &'static str, reason: impl fmt::Display) -> Self {
        Self::Decode { format, reason: reason.to_string() }
    }

    pub const fn timeout(operation: &'static str, limit: Duration) -> Self {
        Self::Timeout { operation, limit }
    }

    /// Name of the offending configuration field, if any.
    pub const fn field(&self) -> Option<&'static str> {
        match self {
            Self::Config { field, .. } => Some(*field),
            _ => None,
        }
    }
}

impl ErrorClassification for CommonError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Timeout { .. } => ErrorSeverity::Warning,
            Self::Decode { .. } => ErrorSeverity::Error,
            Self::Config { .. } | Self::Internal(_) => ErrorSeverity::Critical,
        }
    }

    fn is_critical(&self) -> bool {
        matches!(self, Self::Config { .. } | Self::Internal(_))
    }
}

impl From<serde_json::Error> for CommonError {
    fn from(err: serde_json::Error) -> Self {
        Self::decode("JSON", err)
    }
}

/// Uniform view over every error type in the workspace.
pub trait ErrorClassification {
    /// Transient failures worth another attempt. Inbound callback protocol
    /// violations never are.
    fn is_retryable(&self) -> bool;

    fn severity(&self) -> ErrorSeverity;

    fn is_critical(&self) -> bool;

    /// Suggested wait before the next attempt, when the error carries one.
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

/// Log severity, ordered from least to most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "INFO",
            Self::Warning => "WARN",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        })
    }
}
