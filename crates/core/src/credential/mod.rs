//! Credential cache and refresh coordination
//!
//! - [`ports`]: the upstream fetch port and the source port API clients use
//! - [`store`]: the shared cache slot
//! - [`coordinator`]: coalesced refreshes and the expiry policy
//! - [`renewal`]: the background task that refreshes ahead of expiry

pub mod coordinator;
pub mod ports;
pub mod renewal;
pub mod store;

pub use coordinator::{CoordinatorSettings, CredentialCoordinator};
pub use ports::{CredentialFetcher, CredentialSource};
pub use renewal::RenewalHandle;
pub use store::CredentialStore;
