//! Test fixture generators
//!
//! Every generator is seeded so a failing test reproduces byte for byte.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::crypto::envelope::RANDOM_LEN;
use crate::crypto::AesKey;

/// Callback token used by the published handshake vector
pub const HANDSHAKE_TOKEN: &str = "token1234567890";
/// Timestamp used by the published handshake vector
pub const HANDSHAKE_TIMESTAMP: &str = "1458864389";
/// Nonce used by the published handshake vector
pub const HANDSHAKE_NONCE: &str = "2066297436";
/// Expected signature of `(HANDSHAKE_TOKEN, HANDSHAKE_TIMESTAMP, HANDSHAKE_NONCE)`
pub const HANDSHAKE_SIGNATURE: &str = "f9c725922f6844701ba71e98031978e40023c09f";

/// A well-formed 43 character encoded AES key
pub const ENCODED_KEY: &str = "abcdefghijklmnopqrstuvwxyz0123456789ABCDEFG";

/// Deterministic AES key derived from `seed`
///
/// # Examples
///
/// ```
/// use courier_common::testing::fixtures::seeded_key;
///
/// assert_ne!(seeded_key(1).as_bytes(), seeded_key(2).as_bytes());
/// ```
pub fn seeded_key(seed: u64) -> AesKey {
    let mut bytes = [0u8; AesKey::LEN];
    StdRng::seed_from_u64(seed).fill_bytes(&mut bytes);
    bytes[0] |= 1;
    AesKey::from(bytes)
}

/// Deterministic 16-byte envelope prefix derived from `seed`
pub fn seeded_random(seed: u64) -> [u8; RANDOM_LEN] {
    let mut random = [0u8; RANDOM_LEN];
    StdRng::seed_from_u64(seed).fill_bytes(&mut random);
    random
}

/// Plain text message addressed to `to` from `from`
pub fn text_message_xml(to: &str, from: &str, content: &str) -> String {
    format!(
        "<xml><ToUserName><![CDATA[{to}]]></ToUserName>\
         <FromUserName><![CDATA[{from}]]></FromUserName>\
         <CreateTime>1700000000</CreateTime>\
         <MsgType><![CDATA[text]]></MsgType>\
         <Content><![CDATA[{content}]]></Content>\
         <MsgId>1234567890123456</MsgId></xml>"
    )
}

/// Lifecycle event (`subscribe` / `unsubscribe`) addressed to `to`
pub fn event_xml(to: &str, from: &str, event: &str) -> String {
    format!(
        "<xml><ToUserName><![CDATA[{to}]]></ToUserName>\
         <FromUserName><![CDATA[{from}]]></FromUserName>\
         <CreateTime>1700000000</CreateTime>\
         <MsgType><![CDATA[event]]></MsgType>\
         <Event><![CDATA[{event}]]></Event></xml>"
    )
}

/// Outer body of an encrypted delivery
pub fn encrypted_body_xml(to: &str, encrypt: &str) -> String {
    format!(
        "<xml><ToUserName><![CDATA[{to}]]></ToUserName>\
         <Encrypt><![CDATA[{encrypt}]]></Encrypt></xml>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_generators_are_deterministic() {
        assert_eq!(seeded_key(42).as_bytes(), seeded_key(42).as_bytes());
        assert_eq!(seeded_random(42), seeded_random(42));
        assert_ne!(seeded_random(1), seeded_random(2));
        assert!(!seeded_key(0).is_zero());
    }

    #[test]
    fn message_fixture_carries_fields() {
        let xml = text_message_xml("gh_account", "user-1", "hello");
        assert!(xml.contains("<![CDATA[gh_account]]>"));
        assert!(xml.contains("<MsgType><![CDATA[text]]></MsgType>"));
    }
}
