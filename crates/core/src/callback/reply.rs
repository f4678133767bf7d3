//! Reply sink handed to message handlers
//!
//! A handler answers at most once; the last call wins. Handlers that never
//! answer produce the plain `success` acknowledgement.

use courier_common::crypto::envelope::{self, RANDOM_LEN};

use super::error::CallbackError;
use super::protocol::EnvelopeProtocol;

/// Body a handler chose for its response
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ReplyBody {
    Acknowledge,
    Raw(String),
    Encrypted(String),
}

/// Request values an encrypted reply is sealed with
#[derive(Debug, Clone)]
pub(crate) struct SealParams {
    pub(crate) timestamp: String,
    pub(crate) nonce: String,
    pub(crate) random: Option<[u8; RANDOM_LEN]>,
}

/// Where a [`MessageHandler`](super::MessageHandler) writes its reply
#[derive(Debug)]
pub struct ReplySink<'a> {
    protocol: &'a EnvelopeProtocol,
    seal: SealParams,
    body: ReplyBody,
}

impl<'a> ReplySink<'a> {
    pub(crate) fn new(protocol: &'a EnvelopeProtocol, seal: SealParams) -> Self {
        Self { protocol, seal, body: ReplyBody::Acknowledge }
    }

    /// Acknowledge without a passive reply (body `success`).
    pub fn reply_none(&mut self) {
        self.body = ReplyBody::Acknowledge;
    }

    /// Reply with an unencrypted XML message.
    pub fn reply_raw(&mut self, xml: impl Into<String>) {
        self.body = ReplyBody::Raw(xml.into());
    }

    /// Reply with an XML message sealed under the current key.
    ///
    /// Uses the request's timestamp, nonce and envelope random; a plain-mode
    /// request has no random, so a fresh one is drawn.
    ///
    /// # Errors
    ///
    /// Fails when no encoding AES key is configured; the previous reply
    /// choice is kept.
    pub fn reply_encrypted(&mut self, xml: &str) -> Result<(), CallbackError> {
        let random = self.seal.random.unwrap_or_else(envelope::generate_random);
        let sealed =
            self.protocol.seal_reply(xml, &self.seal.timestamp, &self.seal.nonce, &random)?;
        self.body = ReplyBody::Encrypted(sealed.to_xml().map_err(CallbackError::from)?);
        Ok(())
    }

    /// Whether the handler chose anything other than a bare acknowledgement.
    pub fn has_reply(&self) -> bool {
        self.body != ReplyBody::Acknowledge
    }

    pub(crate) fn into_body(self) -> ReplyBody {
        self.body
    }
}
