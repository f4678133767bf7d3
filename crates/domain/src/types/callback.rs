//! Callback wire types

use serde::{Deserialize, Serialize};

use crate::errors::{CourierError, Result};
use crate::impl_wire_enum_conversions;

/// Value of the `encrypt_type` query parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptType {
    Aes,
    Raw,
}

impl_wire_enum_conversions!(EncryptType {
    Aes => "aes",
    Raw => "raw",
});

/// Outer body of an encrypted delivery
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EncryptedRequestBody {
    #[serde(rename = "ToUserName", default)]
    pub to_user_name: String,
    #[serde(rename = "Encrypt")]
    pub encrypt: String,
}

impl EncryptedRequestBody {
    /// Parse the outer XML body.
    ///
    /// # Errors
    ///
    /// Returns [`CourierError::Decode`] for malformed XML, a missing or empty
    /// `Encrypt` element, or a non UTF-8 body.
    pub fn from_bytes(body: &[u8]) -> Result<Self> {
        let xml = std::str::from_utf8(body)
            .map_err(|e| CourierError::Decode(format!("body is not UTF-8: {e}")))?;
        let parsed: Self = quick_xml::de::from_str(xml)?;
        if parsed.encrypt.trim().is_empty() {
            return Err(CourierError::Decode("Encrypt element is empty".into()));
        }
        Ok(parsed)
    }
}

/// Encrypted passive reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "xml")]
pub struct SecureReply {
    #[serde(rename = "Encrypt")]
    pub encrypt: String,
    #[serde(rename = "MsgSignature")]
    pub msg_signature: String,
    #[serde(rename = "TimeStamp")]
    pub timestamp: String,
    #[serde(rename = "Nonce")]
    pub nonce: String,
}

impl SecureReply {
    pub fn to_xml(&self) -> Result<String> {
        quick_xml::se::to_string(self)
            .map_err(|err| CourierError::Internal(format!("XML serialization failed: {err}")))
    }

    /// Parse a reply, e.g. when relaying or auditing responses.
    pub fn from_xml(xml: &str) -> Result<Self> {
        Ok(quick_xml::de::from_str(xml)?)
    }
}
