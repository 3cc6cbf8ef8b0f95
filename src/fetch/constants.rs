//! Constants for the fetch module (timeouts, body limits).

/// Default HTTP connect timeout (10 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default HTTP read timeout (30 seconds).
pub const READ_TIMEOUT_SECS: u64 = 30;

/// Default cap on a fetched body (64 MiB).
pub const MAX_BODY_BYTES: u64 = 64 * 1024 * 1024;
