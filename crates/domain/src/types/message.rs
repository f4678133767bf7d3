//! Platform message model
//!
//! Inbound messages and events share one flat XML shape; fields that do not
//! apply to a given `MsgType` are simply absent.

use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::impl_wire_enum_conversions;

/// Message categories carried in `MsgType`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Text,
    Image,
    Voice,
    Video,
    ShortVideo,
    Location,
    Link,
    Event,
}

impl_wire_enum_conversions!(MessageKind {
    Text => "text",
    Image => "image",
    Voice => "voice",
    Video => "video",
    ShortVideo => "shortvideo",
    Location => "location",
    Link => "link",
    Event => "event",
});

/// Account-wide lifecycle events carried in `Event`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Subscribe,
    Unsubscribe,
}

impl_wire_enum_conversions!(LifecycleEvent {
    Subscribe => "subscribe",
    Unsubscribe => "unsubscribe",
});

/// Message or event delivered to a callback endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "xml")]
pub struct PlatformMessage {
    #[serde(rename = "ToUserName", default)]
    pub to_user_name: String,
    #[serde(rename = "FromUserName", default)]
    pub from_user_name: String,
    #[serde(rename = "CreateTime", default)]
    pub create_time: i64,
    #[serde(rename = "MsgType", default)]
    pub msg_type: String,
    #[serde(rename = "MsgId", default, skip_serializing_if = "Option::is_none")]
    pub msg_id: Option<i64>,
    #[serde(rename = "Content", default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(rename = "Event", default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(rename = "EventKey", default, skip_serializing_if = "Option::is_none")]
    pub event_key: Option<String>,
    #[serde(rename = "PicUrl", default, skip_serializing_if = "Option::is_none")]
    pub pic_url: Option<String>,
    #[serde(rename = "MediaId", default, skip_serializing_if = "Option::is_none")]
    pub media_id: Option<String>,
}

impl PlatformMessage {
    /// Parse a message from its XML body.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CourierError::Decode`] for malformed XML.
    pub fn from_xml(xml: &str) -> Result<Self> {
        Ok(quick_xml::de::from_str(xml)?)
    }

    /// Parse a message from raw bytes, rejecting invalid UTF-8.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let xml = std::str::from_utf8(bytes)
            .map_err(|e| crate::CourierError::Decode(format!("message is not UTF-8: {e}")))?;
        Self::from_xml(xml)
    }

    /// Known message category, if recognised.
    pub fn kind(&self) -> Option<MessageKind> {
        self.msg_type.parse().ok()
    }

    /// Lifecycle event carried by this message, if any.
    pub fn lifecycle_event(&self) -> Option<LifecycleEvent> {
        if self.kind() != Some(MessageKind::Event) {
            return None;
        }
        self.event.as_deref().and_then(|event| event.parse().ok())
    }

    /// Whether this is an account-wide `subscribe` / `unsubscribe` event.
    pub fn is_lifecycle_event(&self) -> bool {
        self.lifecycle_event().is_some()
    }
}

/// Passive text reply, swapping sender and recipient of the inbound message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename = "xml")]
pub struct TextReply {
    #[serde(rename = "ToUserName")]
    pub to_user_name: String,
    #[serde(rename = "FromUserName")]
    pub from_user_name: String,
    #[serde(rename = "CreateTime")]
    pub create_time: i64,
    #[serde(rename = "MsgType")]
    pub msg_type: String,
    #[serde(rename = "Content")]
    pub content: String,
}

impl TextReply {
    /// Reply to `inbound` with `content`, stamped `create_time`.
    pub fn to(inbound: &PlatformMessage, content: impl Into<String>, create_time: i64) -> Self {
        Self {
            to_user_name: inbound.from_user_name.clone(),
            from_user_name: inbound.to_user_name.clone(),
            create_time,
            msg_type: MessageKind::Text.to_string(),
            content: content.into(),
        }
    }

    pub fn to_xml(&self) -> Result<String> {
        quick_xml::se::to_string(self)
            .map_err(|err| crate::CourierError::Internal(format!("XML serialization failed: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "<xml><ToUserName><![CDATA[gh_account]]></ToUserName>\
        <FromUserName><![CDATA[user-1]]></FromUserName>\
        <CreateTime>1700000000</CreateTime>\
        <MsgType><![CDATA[text]]></MsgType>\
        <Content><![CDATA[hello <world>]]></Content>\
        <MsgId>1234567890123456</MsgId></xml>";

    #[test]
    fn parses_text_message_with_cdata() {
        let message = PlatformMessage::from_xml(TEXT).unwrap();
        assert_eq!(message.to_user_name, "gh_account");
        assert_eq!(message.from_user_name, "user-1");
        assert_eq!(message.create_time, 1_700_000_000);
        assert_eq!(message.kind(), Some(MessageKind::Text));
        assert_eq!(message.content.as_deref(), Some("hello <world>"));
        assert_eq!(message.msg_id, Some(1_234_567_890_123_456));
        assert!(!message.is_lifecycle_event());
    }

    /// Validates lifecycle detection for the account-wide event scenario.
    ///
    /// Assertions:
    /// - Ensures `subscribe` and `unsubscribe` events are lifecycle events.
    /// - Ensures other events and non-event messages are not.
    #[test]
    fn lifecycle_events_are_detected() {
        let event = |kind: &str, event: &str| PlatformMessage {
            msg_type: kind.into(),
            event: Some(event.into()),
            ..PlatformMessage::default()
        };

        assert_eq!(event("event", "subscribe").lifecycle_event(), Some(LifecycleEvent::Subscribe));
        assert!(event("event", "UNSUBSCRIBE").is_lifecycle_event());
        assert!(!event("event", "CLICK").is_lifecycle_event());
        assert!(!event("text", "subscribe").is_lifecycle_event());
    }

    #[test]
    fn unknown_fields_and_types_are_tolerated() {
        let xml = "<xml><ToUserName>a</ToUserName><MsgType>miniprogrampage</MsgType>\
                   <Title>t</Title></xml>";
        let message = PlatformMessage::from_xml(xml).unwrap();
        assert_eq!(message.kind(), None);
    }

    #[test]
    fn malformed_xml_is_a_decode_error() {
        let err = PlatformMessage::from_xml("<xml><ToUserName>").unwrap_err();
        assert!(matches!(err, crate::CourierError::Decode(_)));
        assert!(PlatformMessage::from_bytes(&[0xff, 0xfe]).is_err());
    }

    #[test]
    fn text_reply_swaps_parties() {
        let inbound = PlatformMessage::from_xml(TEXT).unwrap();
        let reply = TextReply::to(&inbound, "pong", 1_700_000_100);
        assert_eq!(reply.to_user_name, "user-1");
        assert_eq!(reply.from_user_name, "gh_account");

        let xml = reply.to_xml().unwrap();
        assert!(xml.starts_with("<xml>"));
        assert!(xml.contains("<Content>pong</Content>"));
        assert!(xml.contains("<MsgType>text</MsgType>"));
    }
}
