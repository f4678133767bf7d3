//! Callback dispatch state machine
//!
//! ```text
//! AwaitingRequest --echostr--> Handshake --------\
//!        \                                        +--> Done
//!         `--otherwise--> MessageDelivery -------/
//! ```
//!
//! A rejected handshake answers 400 with an empty body. A rejected delivery
//! answers 200 with an empty body so the platform does not redeliver, and the
//! rejection is attached to the response for the host to log. The handler
//! only ever sees authenticated messages.

use std::sync::Arc;

use async_trait::async_trait;
use courier_common::crypto::constant_time_eq;
use courier_common::crypto::envelope::RANDOM_LEN;
use courier_common::IdentityCheck;
use courier_domain::constants::{ACK_BODY, TEXT_CONTENT_TYPE, XML_CONTENT_TYPE};
use courier_domain::{
    CourierError, EncryptType, EncryptedRequestBody, PlatformMessage, SdkConfig,
};
use tracing::{debug, instrument, warn};

use super::error::CallbackError;
use super::protocol::EnvelopeProtocol;
use super::reply::{ReplyBody, ReplySink, SealParams};
use super::request::InboundRequest;

/// Host-supplied handler for authenticated messages
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Handle one message; write a reply into `reply` or leave it untouched
    /// to acknowledge
    async fn handle(&self, ctx: &CallbackContext, reply: &mut ReplySink<'_>);
}

/// Where a request is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    /// Nothing inspected yet
    AwaitingRequest,
    /// URL verification: the request carries `echostr`
    Handshake,
    /// A message or event pushed by the platform
    MessageDelivery,
    /// Response produced; terminal
    Done,
}

impl DispatchState {
    /// Advance one step for `request`.
    pub fn next<R: InboundRequest + ?Sized>(self, request: &R) -> Self {
        match self {
            Self::AwaitingRequest if request.query("echostr").is_some() => Self::Handshake,
            Self::AwaitingRequest => Self::MessageDelivery,
            Self::Handshake | Self::MessageDelivery | Self::Done => Self::Done,
        }
    }
}

/// Everything known about an authenticated delivery
#[derive(Debug, Clone)]
pub struct CallbackContext {
    /// 3-input `signature` query parameter, if sent
    pub signature: Option<String>,
    /// 4-input `msg_signature` query parameter, if sent
    pub msg_signature: Option<String>,
    /// `timestamp` query parameter, already checked to be decimal
    pub timestamp: String,
    /// `nonce` query parameter; reused when sealing an encrypted reply
    pub nonce: String,
    /// Parsed `encrypt_type`; `None` when the parameter was absent or empty
    pub encrypt_type: Option<EncryptType>,
    /// Base64 ciphertext as delivered (secure mode only)
    pub ciphertext: Option<String>,
    /// Decrypted (or plain-mode) message XML
    pub plaintext: Vec<u8>,
    /// Envelope random prefix (secure mode only)
    pub random: Option<[u8; RANDOM_LEN]>,
    /// Envelope identity trailer (secure mode only)
    pub identity: Option<String>,
    /// Parsed message or event
    pub message: PlatformMessage,
}

/// Response for the host to write back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
    /// Why the request was rejected, if it was
    pub rejection: Option<CallbackError>,
}

impl CallbackResponse {
    fn text(body: impl Into<String>) -> Self {
        Self { status: 200, content_type: TEXT_CONTENT_TYPE, body: body.into(), rejection: None }
    }

    fn xml(body: String) -> Self {
        Self { status: 200, content_type: XML_CONTENT_TYPE, body, rejection: None }
    }

    fn rejected(status: u16, err: CallbackError) -> Self {
        Self { status, content_type: TEXT_CONTENT_TYPE, body: String::new(), rejection: Some(err) }
    }

    pub fn is_rejected(&self) -> bool {
        self.rejection.is_some()
    }
}

impl From<ReplyBody> for CallbackResponse {
    fn from(body: ReplyBody) -> Self {
        match body {
            ReplyBody::Acknowledge => Self::text(ACK_BODY),
            ReplyBody::Raw(xml) | ReplyBody::Encrypted(xml) => Self::xml(xml),
        }
    }
}

/// Routes inbound callbacks for one account
pub struct CallbackDispatcher {
    protocol: Arc<EnvelopeProtocol>,
    handler: Arc<dyn MessageHandler>,
    account_id: Option<String>,
}

impl CallbackDispatcher {
    pub fn new(protocol: Arc<EnvelopeProtocol>, handler: Arc<dyn MessageHandler>) -> Self {
        Self { protocol, handler, account_id: None }
    }

    /// Require deliveries to be addressed to `account_id`.
    pub fn with_account_id(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    /// Dispatcher for the account described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`CourierError::Config`] for an invalid token or AES key.
    pub fn from_config(
        config: &SdkConfig,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<Self, CourierError> {
        let protocol = Arc::new(EnvelopeProtocol::from_config(config)?);
        let dispatcher = Self::new(protocol, handler);
        Ok(match &config.account_id {
            Some(account_id) => dispatcher.with_account_id(account_id.clone()),
            None => dispatcher,
        })
    }

    /// Shared protocol, e.g. for key rotation.
    pub fn protocol(&self) -> &Arc<EnvelopeProtocol> {
        &self.protocol
    }

    /// Run one request through the state machine.
    #[instrument(name = "callback.dispatch", skip_all)]
    pub async fn dispatch<R: InboundRequest + ?Sized>(&self, request: &R) -> CallbackResponse {
        let state = DispatchState::AwaitingRequest.next(request);
        let response = match state {
            DispatchState::Handshake => match self.handshake(request) {
                Ok(echo) => CallbackResponse::text(echo),
                Err(err) => {
                    warn!(?state, error = %err, "callback handshake rejected");
                    CallbackResponse::rejected(400, err)
                }
            },
            _ => match self.deliver(request).await {
                Ok(response) => response,
                Err(err) => {
                    warn!(?state, error = %err, "callback delivery rejected");
                    CallbackResponse::rejected(200, err)
                }
            },
        };
        debug!(from = ?state, to = ?state.next(request), status = response.status, "callback done");
        response
    }

    fn handshake<R: InboundRequest + ?Sized>(&self, request: &R) -> Result<String, CallbackError> {
        let echostr = required(request, "echostr")?;
        let timestamp = timestamp(request)?;
        let nonce = required(request, "nonce")?;

        let signature = optional(request, "signature");
        let msg_signature = optional(request, "msg_signature");
        if signature.is_none() && msg_signature.is_none() {
            return Err(CallbackError::MissingParameter("signature"));
        }
        if let Some(signature) = signature {
            self.protocol.verify_signature(signature, timestamp, nonce)?;
        }
        if let Some(msg_signature) = msg_signature {
            self.protocol.verify_message_signature(msg_signature, timestamp, nonce, echostr)?;
        }

        let secure =
            msg_signature.is_some() || encrypt_type(request)? == Some(EncryptType::Aes);
        if !secure {
            return Ok(echostr.to_string());
        }

        let opened = self.protocol.decrypt(echostr, IdentityCheck::Exact(self.protocol.identity()))?;
        String::from_utf8(opened.payload)
            .map_err(|_| CallbackError::MalformedBody("echo payload is not UTF-8".into()))
    }

    async fn deliver<R: InboundRequest + ?Sized>(
        &self,
        request: &R,
    ) -> Result<CallbackResponse, CallbackError> {
        let ctx = match encrypt_type(request)? {
            Some(EncryptType::Aes) => self.open_secure(request)?,
            Some(EncryptType::Raw) | None => self.open_plain(request)?,
        };

        debug!(
            msg_type = %ctx.message.msg_type,
            secure = ctx.ciphertext.is_some(),
            "callback authenticated"
        );

        let seal = SealParams {
            timestamp: ctx.timestamp.clone(),
            nonce: ctx.nonce.clone(),
            random: ctx.random,
        };
        let mut reply = ReplySink::new(&self.protocol, seal);
        self.handler.handle(&ctx, &mut reply).await;
        Ok(reply.into_body().into())
    }

    fn open_secure<R: InboundRequest + ?Sized>(
        &self,
        request: &R,
    ) -> Result<CallbackContext, CallbackError> {
        if !self.protocol.is_secure() {
            return Err(CallbackError::UnsupportedEncryption(
                "encrypted delivery without a configured key".into(),
            ));
        }

        let msg_signature = required(request, "msg_signature")?;
        let timestamp = timestamp(request)?;
        let nonce = required(request, "nonce")?;

        let outer = EncryptedRequestBody::from_bytes(request.body())?;
        self.check_account(&outer.to_user_name)?;
        self.protocol.verify_message_signature(msg_signature, timestamp, nonce, &outer.encrypt)?;

        let opened = self
            .protocol
            .decrypt(&outer.encrypt, IdentityCheck::AllowPlaceholder(self.protocol.identity()))?;
        let message = PlatformMessage::from_bytes(&opened.payload)?;

        if message.to_user_name != outer.to_user_name {
            return Err(CallbackError::IdentityMismatch);
        }
        if opened.has_placeholder_identity() && !message.is_lifecycle_event() {
            return Err(CallbackError::IdentityMismatch);
        }

        Ok(CallbackContext {
            signature: request.query("signature").map(str::to_string),
            msg_signature: Some(msg_signature.to_string()),
            timestamp: timestamp.to_string(),
            nonce: nonce.to_string(),
            encrypt_type: Some(EncryptType::Aes),
            ciphertext: Some(outer.encrypt),
            plaintext: opened.payload,
            random: Some(opened.random),
            identity: Some(opened.identity),
            message,
        })
    }

    fn open_plain<R: InboundRequest + ?Sized>(
        &self,
        request: &R,
    ) -> Result<CallbackContext, CallbackError> {
        let signature = required(request, "signature")?;
        let timestamp = timestamp(request)?;
        let nonce = required(request, "nonce")?;
        self.protocol.verify_signature(signature, timestamp, nonce)?;

        let message = PlatformMessage::from_bytes(request.body())?;
        self.check_account(&message.to_user_name)?;

        Ok(CallbackContext {
            signature: Some(signature.to_string()),
            msg_signature: None,
            timestamp: timestamp.to_string(),
            nonce: nonce.to_string(),
            encrypt_type: request.query("encrypt_type").and_then(|value| value.parse().ok()),
            ciphertext: None,
            plaintext: request.body().to_vec(),
            random: None,
            identity: None,
            message,
        })
    }

    fn check_account(&self, to_user_name: &str) -> Result<(), CallbackError> {
        match &self.account_id {
            Some(expected) if !constant_time_eq(to_user_name.as_bytes(), expected.as_bytes()) => {
                Err(CallbackError::IdentityMismatch)
            }
            _ => Ok(()),
        }
    }
}

fn optional<'r, R: InboundRequest + ?Sized>(request: &'r R, name: &str) -> Option<&'r str> {
    request.query(name).filter(|value| !value.is_empty())
}

fn required<'r, R: InboundRequest + ?Sized>(
    request: &'r R,
    name: &'static str,
) -> Result<&'r str, CallbackError> {
    optional(request, name).ok_or(CallbackError::MissingParameter(name))
}

fn timestamp<R: InboundRequest + ?Sized>(request: &R) -> Result<&str, CallbackError> {
    let value = required(request, "timestamp")?;
    if value.bytes().all(|b| b.is_ascii_digit()) && value.parse::<u64>().is_ok() {
        Ok(value)
    } else {
        Err(CallbackError::InvalidTimestamp)
    }
}

fn encrypt_type<R: InboundRequest + ?Sized>(
    request: &R,
) -> Result<Option<EncryptType>, CallbackError> {
    match request.query("encrypt_type") {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(CallbackError::UnsupportedEncryption),
    }
}

#[cfg(test)]
mod tests {
    use courier_common::crypto::{envelope, sign_handshake, sign_message};
    use courier_common::testing::fixtures::{
        encrypted_body_xml, event_xml, seeded_key, seeded_random, text_message_xml,
    };
    use parking_lot::Mutex;

    use super::*;
    use crate::callback::CallbackRequest;

    const TOKEN: &str = "callback-token";
    const APP_ID: &str = "wx-courier-app";
    const ACCOUNT: &str = "gh_courier";
    const TS: &str = "1700000000";
    const NONCE: &str = "n0nce";

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<PlatformMessage>>,
        reply: Option<&'static str>,
        encrypt_reply: bool,
    }

    #[async_trait]
    impl MessageHandler for Recorder {
        async fn handle(&self, ctx: &CallbackContext, reply: &mut ReplySink<'_>) {
            self.seen.lock().push(ctx.message.clone());
            if let Some(xml) = self.reply {
                if self.encrypt_reply {
                    reply.reply_encrypted(xml).unwrap();
                } else {
                    reply.reply_raw(xml);
                }
            }
        }
    }

    fn dispatcher(handler: Arc<Recorder>, secure: bool) -> CallbackDispatcher {
        let mut protocol = EnvelopeProtocol::new(TOKEN, APP_ID);
        if secure {
            protocol = protocol.with_key(seeded_key(11));
        }
        CallbackDispatcher::new(Arc::new(protocol), handler).with_account_id(ACCOUNT)
    }

    fn secure_delivery(inner: &str, identity: &str) -> CallbackRequest {
        let ciphertext =
            envelope::encrypt_to_base64(inner.as_bytes(), &seeded_random(2), identity, &seeded_key(11))
                .unwrap();
        CallbackRequest::new()
            .with_query("encrypt_type", "aes")
            .with_query("msg_signature", sign_message(TOKEN, TS, NONCE, &ciphertext))
            .with_query("signature", sign_handshake(TOKEN, TS, NONCE))
            .with_query("timestamp", TS)
            .with_query("nonce", NONCE)
            .with_body(encrypted_body_xml(ACCOUNT, &ciphertext))
    }

    #[test]
    fn routing_follows_echostr() {
        let handshake = CallbackRequest::new().with_query("echostr", "x");
        let delivery = CallbackRequest::new();
        assert_eq!(DispatchState::AwaitingRequest.next(&handshake), DispatchState::Handshake);
        assert_eq!(DispatchState::AwaitingRequest.next(&delivery), DispatchState::MessageDelivery);
        assert_eq!(DispatchState::Handshake.next(&handshake), DispatchState::Done);
        assert_eq!(DispatchState::Done.next(&delivery), DispatchState::Done);
    }

    #[tokio::test]
    async fn plain_handshake_echoes_verbatim() {
        let handler = Arc::new(Recorder::default());
        let request = CallbackRequest::new()
            .with_query("signature", sign_handshake(TOKEN, TS, NONCE))
            .with_query("timestamp", TS)
            .with_query("nonce", NONCE)
            .with_query("echostr", "echo-4821");

        let response = dispatcher(handler.clone(), false).dispatch(&request).await;
        assert_eq!(response.status, 200);
        assert_eq!(response.body, "echo-4821");
        assert!(handler.seen.lock().is_empty());
    }

    /// Validates the handshake rejection scenario.
    ///
    /// Assertions:
    /// - Bad signatures, short signatures and malformed timestamps all answer
    ///   400 with an empty body.
    #[tokio::test]
    async fn bad_handshakes_answer_400() {
        let handler = Arc::new(Recorder::default());
        let dispatcher = dispatcher(handler, false);
        let base = || {
            CallbackRequest::new().with_query("nonce", NONCE).with_query("echostr", "echo")
        };

        let cases = [
            (
                base().with_query("signature", sign_handshake(TOKEN, TS, "x")).with_query("timestamp", TS),
                CallbackError::SignatureMismatch,
            ),
            (
                base().with_query("signature", "abc").with_query("timestamp", TS),
                CallbackError::SignatureMismatch,
            ),
            (
                base()
                    .with_query("signature", sign_handshake(TOKEN, "17e8", NONCE))
                    .with_query("timestamp", "17e8"),
                CallbackError::InvalidTimestamp,
            ),
            (base().with_query("timestamp", TS), CallbackError::MissingParameter("signature")),
        ];

        for (request, expected) in cases {
            let response = dispatcher.dispatch(&request).await;
            assert_eq!(response.status, 400);
            assert!(response.body.is_empty());
            assert_eq!(response.rejection, Some(expected));
        }
    }

    #[tokio::test]
    async fn secure_handshake_decrypts_echo() {
        let handler = Arc::new(Recorder::default());
        let echo = envelope::encrypt_to_base64(b"1234567890", &seeded_random(3), APP_ID, &seeded_key(11))
            .unwrap();
        let request = CallbackRequest::new()
            .with_query("msg_signature", sign_message(TOKEN, TS, NONCE, &echo))
            .with_query("timestamp", TS)
            .with_query("nonce", NONCE)
            .with_query("echostr", echo);

        let response = dispatcher(handler, true).dispatch(&request).await;
        assert_eq!(response.status, 200);
        assert_eq!(response.body, "1234567890");
    }

    #[tokio::test]
    async fn secure_delivery_reaches_handler_and_acknowledges() {
        let handler = Arc::new(Recorder::default());
        let request = secure_delivery(&text_message_xml(ACCOUNT, "user-1", "hello"), APP_ID);

        let response = dispatcher(handler.clone(), true).dispatch(&request).await;
        assert_eq!(response.status, 200);
        assert_eq!(response.body, "success");
        assert!(!response.is_rejected());

        let seen = handler.seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].content.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn secure_delivery_can_reply_encrypted() {
        let handler = Arc::new(Recorder {
            reply: Some("<xml><Content>pong</Content></xml>"),
            encrypt_reply: true,
            ..Recorder::default()
        });
        let request = secure_delivery(&text_message_xml(ACCOUNT, "user-1", "ping"), APP_ID);

        let response = dispatcher(handler, true).dispatch(&request).await;
        assert_eq!(response.content_type, XML_CONTENT_TYPE);
        assert!(response.body.contains("<MsgSignature>"));
        assert!(response.body.contains(&format!("<TimeStamp>{TS}</TimeStamp>")));
    }

    /// Validates delivery rejection for the identity scenarios.
    ///
    /// Assertions:
    /// - A foreign envelope identity, a mismatched inner recipient and a
    ///   wrong outer account are each rejected with 200 and an empty body.
    /// - The handler is never invoked.
    #[tokio::test]
    async fn identity_failures_never_reach_handler() {
        let handler = Arc::new(Recorder::default());
        let dispatcher = dispatcher(handler.clone(), true);

        let foreign = secure_delivery(&text_message_xml(ACCOUNT, "u", "x"), "wx-other");
        let inner_mismatch = secure_delivery(&text_message_xml("gh_other", "u", "x"), APP_ID);

        for request in [foreign, inner_mismatch] {
            let response = dispatcher.dispatch(&request).await;
            assert_eq!(response.status, 200);
            assert!(response.body.is_empty());
            assert_eq!(response.rejection, Some(CallbackError::IdentityMismatch));
        }

        let wrong_account = secure_delivery(&text_message_xml(ACCOUNT, "u", "x"), APP_ID)
            .with_body(encrypted_body_xml("gh_other", "AAAA"));
        let response = dispatcher.dispatch(&wrong_account).await;
        assert_eq!(response.rejection, Some(CallbackError::IdentityMismatch));

        assert!(handler.seen.lock().is_empty());
    }

    #[tokio::test]
    async fn placeholder_identity_only_for_lifecycle_events() {
        let handler = Arc::new(Recorder::default());
        let dispatcher = dispatcher(handler.clone(), true);

        let subscribe = secure_delivery(&event_xml(ACCOUNT, "u", "subscribe"), "0000");
        assert!(!dispatcher.dispatch(&subscribe).await.is_rejected());

        let text = secure_delivery(&text_message_xml(ACCOUNT, "u", "x"), "");
        assert_eq!(
            dispatcher.dispatch(&text).await.rejection,
            Some(CallbackError::IdentityMismatch)
        );

        assert_eq!(handler.seen.lock().len(), 1);
    }

    #[tokio::test]
    async fn tampered_ciphertext_fails_signature() {
        let handler = Arc::new(Recorder::default());
        let request = secure_delivery(&text_message_xml(ACCOUNT, "u", "x"), APP_ID)
            .with_query("msg_signature", "0".repeat(40));

        let response = dispatcher(handler, true).dispatch(&request).await;
        assert_eq!(response.status, 200);
        assert_eq!(response.rejection, Some(CallbackError::SignatureMismatch));
    }

    #[tokio::test]
    async fn plain_delivery_verifies_signature() {
        let handler = Arc::new(Recorder { reply: Some("<xml>r</xml>"), ..Recorder::default() });
        let dispatcher = dispatcher(handler.clone(), false);
        let body = text_message_xml(ACCOUNT, "user-1", "plain");

        let ok = CallbackRequest::new()
            .with_query("signature", sign_handshake(TOKEN, TS, NONCE))
            .with_query("timestamp", TS)
            .with_query("nonce", NONCE)
            .with_body(body.clone());
        let response = dispatcher.dispatch(&ok).await;
        assert_eq!(response.body, "<xml>r</xml>");
        assert_eq!(response.content_type, XML_CONTENT_TYPE);

        let forged = ok.clone().with_query("signature", sign_handshake("guess", TS, NONCE));
        let response = dispatcher.dispatch(&forged).await;
        assert_eq!(response.rejection, Some(CallbackError::SignatureMismatch));
        assert_eq!(handler.seen.lock().len(), 1);
    }

    #[tokio::test]
    async fn encrypted_delivery_without_key_is_unsupported() {
        let handler = Arc::new(Recorder::default());
        let request = secure_delivery(&text_message_xml(ACCOUNT, "u", "x"), APP_ID);
        let response = dispatcher(handler, false).dispatch(&request).await;
        assert!(matches!(response.rejection, Some(CallbackError::UnsupportedEncryption(_))));

        let unknown = CallbackRequest::new().with_query("encrypt_type", "des");
        let response = dispatcher(Arc::new(Recorder::default()), true).dispatch(&unknown).await;
        assert!(matches!(response.rejection, Some(CallbackError::UnsupportedEncryption(_))));
    }
}
