//! Domain constants
//!
//! Centralized location for protocol values and configuration defaults.

// Credential lifetimes
pub const MAX_CREDENTIAL_LIFETIME_SECS: u64 = 31_556_952;
pub const DEFAULT_CONVERGENCE_WINDOW_SECS: u64 = 5;
pub const MIN_CONVERGENCE_WINDOW_SECS: u64 = 2;
pub const MAX_CONVERGENCE_WINDOW_SECS: u64 = 5;
pub const DEFAULT_RETRY_INTERVAL_SECS: u64 = 60;

// Upstream API
pub const DEFAULT_API_BASE_URL: &str = "https://api.weixin.qq.com";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const TOKEN_ENDPOINT_PATH: &str = "/cgi-bin/token";
pub const TOKEN_GRANT_TYPE: &str = "client_credential";
pub const ACCESS_TOKEN_PARAM: &str = "access_token";

/// Platform codes meaning "the credential you sent is no longer valid"
pub const EXPIRED_CREDENTIAL_CODES: [i64; 3] = [40001, 40014, 42001];

/// Platform code for a transient "system busy" response
pub const SYSTEM_BUSY_CODE: i64 = -1;

// Callback protocol
pub const ACK_BODY: &str = "success";
pub const XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";
pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";
