//! HTTP transport module
//!
//! Provides the pooled transport with retry, pacing, and backoff.
//!
//! # Features
//!
//! - **Connection Pooling**: One shared `reqwest` pool with a concurrency ceiling
//! - **Automatic Retries**: Retryable statuses and methods, capped exponential backoff
//! - **Pacing**: Optional minimum interval per target, using governor
//! - **Outcomes**: Success / Failure / TransportError, never a raised remote error

mod rate_limit;
mod transport;
mod types;

pub use rate_limit::Pacer;
pub use transport::Transport;
pub use types::{
    Payload, ResponseOutcome, RetryPolicy, TransportConfig, TransportConfigBuilder,
    TransportRequest, TransportStats, DEFAULT_RETRYABLE_STATUSES, SUCCESS_STATUSES,
};
