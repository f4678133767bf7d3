//! # Courier Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The credential cache, refresh coordinator and background renewal loop
//! - The secure callback envelope protocol and dispatch state machine
//! - Port interfaces (traits) implemented by `courier-infra` or the host
//!
//! ## Architecture Principles
//! - Depends only on `courier-common` and `courier-domain`
//! - No HTTP client or server code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod callback;
pub mod credential;

// Re-export specific items to avoid ambiguity
pub use callback::{
    CallbackContext, CallbackDispatcher, CallbackError, CallbackRequest, CallbackResponse,
    DispatchState, EnvelopeProtocol, InboundRequest, MessageHandler, ReplySink,
};
pub use credential::{
    CoordinatorSettings, CredentialCoordinator, CredentialFetcher, CredentialSource,
    CredentialStore, RenewalHandle,
};
