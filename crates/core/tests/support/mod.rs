//! Shared test helpers for `courier-core` integration tests.
//!
//! Lightweight mocks for the credential fetcher port and the message handler
//! seam, so tests can focus on coordination and dispatch behaviour.

#![allow(dead_code)]

pub mod fetchers;
pub mod handlers;
