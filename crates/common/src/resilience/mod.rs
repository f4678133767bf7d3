//! Time abstraction for deterministic testing of time-based coordination
//!
//! Components that make decisions based on elapsed time (the credential
//! convergence window, renewal bookkeeping) take a [`Clock`] so production
//! code uses [`SystemClock`] and tests drive a [`MockClock`] without sleeping.

pub mod clock;

pub use clock::{Clock, MockClock, SystemClock};
