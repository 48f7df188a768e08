//! Server limits.

use std::time::Duration;

/// Requests served at once.
pub const MAX_CONCURRENCY: usize = 256;

/// Request body size limit.
pub const MAX_BODY_SIZE: usize = 64 * 1024; // 64KB

/// CORS preflight cache lifetime.
pub const CORS_MAX_AGE: Duration = Duration::from_secs(3600);
