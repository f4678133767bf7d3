//! Bearer credential model and expiry buffering policy

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use courier_common::SecretString;
use serde::Deserialize;

use crate::constants::MAX_CREDENTIAL_LIFETIME_SECS;
use crate::errors::{CourierError, Result};

/// Raw output of an upstream credential fetch, before buffering
#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct FetchedCredential {
    #[serde(rename = "access_token")]
    pub value: SecretString,
    /// Lifetime reported by the platform, in seconds
    pub expires_in: u64,
}

impl FetchedCredential {
    pub fn new(value: impl Into<SecretString>, expires_in: u64) -> Self {
        Self { value: value.into(), expires_in }
    }
}

impl fmt::Debug for FetchedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchedCredential")
            .field("value_len", &self.value.len())
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Cached bearer credential with its buffered lifetime
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    value: SecretString,
    /// Effective lifetime in seconds, already reduced by the safety buffer
    pub expires_in: u64,
    /// Wall-clock time of the fetch that produced this credential
    pub fetched_at: DateTime<Utc>,
}

impl Credential {
    /// Apply the expiry policy to a freshly fetched credential.
    ///
    /// # Errors
    ///
    /// Fails with [`CourierError::Credential`] when the value is empty or the
    /// reported lifetime is outside the accepted range.
    pub fn from_fetched(fetched: FetchedCredential, fetched_at: DateTime<Utc>) -> Result<Self> {
        if fetched.value.is_empty() {
            return Err(CourierError::Credential("upstream returned an empty credential".into()));
        }
        let expires_in = effective_lifetime(fetched.expires_in)?;
        Ok(Self { value: fetched.value, expires_in, fetched_at })
    }

    pub fn value(&self) -> &str {
        self.value.expose()
    }

    /// Copy of this credential with `elapsed_secs` taken off its lifetime.
    pub fn aged(&self, elapsed_secs: u64) -> Self {
        Self {
            value: self.value.clone(),
            expires_in: self.expires_in.saturating_sub(elapsed_secs),
            fetched_at: self.fetched_at,
        }
    }

    /// When the buffered lifetime runs out.
    pub fn expires_at(&self) -> DateTime<Utc> {
        let secs = i64::try_from(self.expires_in.min(MAX_CREDENTIAL_LIFETIME_SECS)).unwrap_or(0);
        self.fetched_at + ChronoDuration::seconds(secs)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }

    /// Lifetime left at `now`; zero once expired.
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at() - now).to_std().unwrap_or(Duration::ZERO)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("value_len", &self.value.len())
            .field("expires_in", &self.expires_in)
            .field("fetched_at", &self.fetched_at)
            .finish()
    }
}

/// Reduce an upstream lifetime by a safety buffer scaled to its size.
///
/// | Upstream `E` (s)     | Effective      |
/// |----------------------|----------------|
/// | `> 31_556_952`       | rejected       |
/// | `> 3600`             | `E - 600`      |
/// | `> 1800`             | `E - 300`      |
/// | `> 300`              | `E - 60`       |
/// | `> 60`               | `E - 10`       |
/// | `<= 60`              | rejected       |
///
/// # Errors
///
/// Returns [`CourierError::Credential`] for lifetimes outside `(60, 31_556_952]`.
pub fn effective_lifetime(upstream_secs: u64) -> Result<u64> {
    let buffer = match upstream_secs {
        e if e > MAX_CREDENTIAL_LIFETIME_SECS => {
            return Err(CourierError::Credential(format!(
                "credential lifetime too large: {e}s"
            )));
        }
        e if e > 3600 => 600,
        e if e > 1800 => 300,
        e if e > 300 => 60,
        e if e > 60 => 10,
        e => {
            return Err(CourierError::Credential(format!("credential lifetime too small: {e}s")));
        }
    };
    Ok(upstream_secs - buffer)
}
