//! Inbound callback handling
//!
//! - [`protocol`]: signature checks, envelope decryption with key fallback
//!   and reply sealing
//! - [`dispatcher`]: routes a request through handshake or message delivery
//!   and invokes the host's [`MessageHandler`]
//! - [`reply`]: what a handler writes its response into
//! - [`request`]: the abstract inbound request

pub mod dispatcher;
pub mod error;
pub mod protocol;
pub mod reply;
pub mod request;

pub use dispatcher::{
    CallbackContext, CallbackDispatcher, CallbackResponse, DispatchState, MessageHandler,
};
pub use error::CallbackError;
pub use protocol::EnvelopeProtocol;
pub use reply::ReplySink;
pub use request::{CallbackRequest, InboundRequest};
