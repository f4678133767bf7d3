//! Domain types and models

pub mod api;
pub mod callback;
pub mod credential;
pub mod message;

pub use api::ApiEnvelope;
pub use callback::{EncryptType, EncryptedRequestBody, SecureReply};
pub use credential::{effective_lifetime, Credential, FetchedCredential};
pub use message::{LifecycleEvent, MessageKind, PlatformMessage, TextReply};
