//! Abstract inbound request
//!
//! The dispatcher needs only query parameters and the raw body, so any web
//! framework's request type can implement [`InboundRequest`].

use std::collections::HashMap;

/// What the dispatcher reads from an inbound request
pub trait InboundRequest: Send + Sync {
    /// First value of query parameter `name`
    fn query(&self, name: &str) -> Option<&str>;

    /// Raw request body
    fn body(&self) -> &[u8];
}

/// Owned request, e.g. for hosts that buffer the body themselves
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackRequest {
    query: HashMap<String, String>,
    body: Vec<u8>,
}

impl CallbackRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a raw query string (without the leading `?`) and body.
    ///
    /// Percent-encoding and `+` are decoded; the first occurrence of a
    /// repeated parameter wins.
    pub fn from_query_string(query: &str, body: impl Into<Vec<u8>>) -> Self {
        let mut params = HashMap::new();
        for (key, value) in url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            params.entry(key.into_owned()).or_insert_with(|| value.into_owned());
        }
        Self { query: params, body: body.into() }
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }
}

impl InboundRequest for CallbackRequest {
    fn query(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    fn body(&self) -> &[u8] {
        &self.body
    }
}
