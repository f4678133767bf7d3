//! Typed JSON API envelope
//!
//! Every platform JSON response may carry `errcode` / `errmsg`; a zero or
//! absent code means the rest of the object is the payload.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::constants::EXPIRED_CREDENTIAL_CODES;
use crate::errors::{CourierError, Result};

#[derive(Debug, Deserialize)]
struct ApiStatus {
    #[serde(rename = "errcode", default)]
    code: i64,
    #[serde(rename = "errmsg", default)]
    message: String,
}

/// Status and payload of a platform JSON response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEnvelope<T> {
    pub code: i64,
    pub message: String,
    /// Present only when `code` is zero
    pub payload: Option<T>,
}

impl<T: DeserializeOwned> ApiEnvelope<T> {
    /// Decode a response body.
    ///
    /// # Errors
    ///
    /// Returns [`CourierError::Decode`] when the body is not JSON, or when a
    /// success body does not match `T`.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        let status: ApiStatus = serde_json::from_slice(body)?;
        if status.code != 0 {
            return Ok(Self { code: status.code, message: status.message, payload: None });
        }

        let payload = serde_json::from_slice(body)?;
        Ok(Self { code: 0, message: status.message, payload: Some(payload) })
    }
}

impl<T> ApiEnvelope<T> {
    pub fn is_success(&self) -> bool {
        self.code == 0
    }

    pub fn is_expired_credential(&self) -> bool {
        EXPIRED_CREDENTIAL_CODES.contains(&self.code)
    }

    /// Payload on success, [`CourierError::Upstream`] otherwise.
    pub fn into_result(self) -> Result<T> {
        if self.code != 0 {
            return Err(CourierError::Upstream { code: self.code, message: self.message });
        }
        self.payload.ok_or_else(|| CourierError::Decode("success response without payload".into()))
    }
}
