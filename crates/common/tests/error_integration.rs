//! Integration tests for `courier_common::error`.

use std::time::Duration;

use courier_common::error::{CommonError, CommonResult, ErrorClassification, ErrorSeverity};
use courier_common::CryptoError;
use thiserror::Error;

#[test]
fn shared_errors_classify_by_variant() {
    let cases = [
        (CommonError::config("app_id", "empty"), false, ErrorSeverity::Critical),
        (CommonError::decode("XML", "unexpected end"), false, ErrorSeverity::Error),
        (CommonError::timeout("credential fetch", Duration::from_secs(10)), true, ErrorSeverity::Warning),
        (CommonError::Internal("poisoned state".into()), false, ErrorSeverity::Critical),
    ];

    for (err, retryable, severity) in cases {
        assert_eq!(err.is_retryable(), retryable, "{err}");
        assert_eq!(err.severity(), severity, "{err}");
        assert_eq!(err.is_critical(), severity == ErrorSeverity::Critical, "{err}");
    }
}

/// Validates that no envelope or signature failure is ever retried.
///
/// Assertions:
/// - Key problems are critical because they come from configuration.
/// - Per-message failures are plain errors.
#[test]
fn crypto_errors_are_never_retryable() {
    let cases = [
        (CryptoError::InvalidKeyLength { expected: 32, actual: 3 }, true),
        (CryptoError::InvalidKeyEncoding("bad".into()), true),
        (CryptoError::InvalidPadding, false),
        (CryptoError::IdentityMismatch, false),
        (CryptoError::SignatureMismatch, false),
        (CryptoError::SignatureLength { actual: 12 }, false),
    ];

    for (err, critical) in cases {
        assert!(!err.is_retryable(), "{err}");
        assert_eq!(err.is_critical(), critical, "{err}");
    }
}

#[derive(Debug, Error)]
enum TokenError {
    #[error(transparent)]
    Shared(#[from] CommonError),
    #[error("platform rejected app secret")]
    Rejected,
}

impl ErrorClassification for TokenError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Shared(inner) if inner.is_retryable())
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Shared(inner) => inner.severity(),
            Self::Rejected => ErrorSeverity::Error,
        }
    }

    fn is_critical(&self) -> bool {
        matches!(self, Self::Shared(inner) if inner.is_critical())
    }

    fn retry_after(&self) -> Option<Duration> {
        self.is_retryable().then_some(Duration::from_secs(60))
    }
}

#[test]
fn layer_errors_wrap_shared_ones_with_question_mark() {
    fn fetch() -> CommonResult<()> {
        Err(CommonError::timeout("token", Duration::from_secs(5)))
    }

    fn refresh() -> Result<(), TokenError> {
        fetch()?;
        Ok(())
    }

    let err = refresh().unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(err.retry_after(), Some(Duration::from_secs(60)));
    assert_eq!(err.to_string(), "token did not finish within 5s");

    assert!(!TokenError::Rejected.is_retryable());
    assert_eq!(TokenError::Rejected.retry_after(), None);
}

#[test]
fn severity_renders_as_log_level() {
    let rendered: Vec<String> =
        [ErrorSeverity::Info, ErrorSeverity::Warning, ErrorSeverity::Error, ErrorSeverity::Critical]
            .iter()
            .map(ToString::to_string)
            .collect();
    assert_eq!(rendered, ["INFO", "WARN", "ERROR", "CRITICAL"]);
}
