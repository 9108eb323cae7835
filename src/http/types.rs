//! Transport types
//!
//! Retry policy, transport configuration, the resolved request shape handed
//! to the transport, and the three-way response outcome.

use crate::error::{Error, Result};
use crate::types::{Attachment, JsonValue, Method, QueryParams};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;
use url::Url;

/// Statuses classified as success. Anything else is a failure.
pub const SUCCESS_STATUSES: [u16; 3] = [200, 201, 204];

/// Statuses retried by default
pub const DEFAULT_RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

// ============================================================================
// Retry Policy
// ============================================================================

/// When and how often a request is re-attempted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Base delay; retry `n` waits `backoff_factor * 2^n`
    pub backoff_factor: Duration,
    /// Upper bound for any single delay
    pub max_backoff: Duration,
    /// Statuses that trigger a retry
    pub retryable_statuses: BTreeSet<u16>,
    /// Methods allowed to be retried
    pub retryable_methods: BTreeSet<Method>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff_factor: Duration::from_secs(1),
            max_backoff: Duration::from_secs(60),
            retryable_statuses: DEFAULT_RETRYABLE_STATUSES.into_iter().collect(),
            retryable_methods: Method::ALL.into_iter().collect(),
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Set total attempts
    #[must_use]
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set backoff factor and cap
    #[must_use]
    pub fn backoff(mut self, factor: Duration, max: Duration) -> Self {
        self.backoff_factor = factor;
        self.max_backoff = max;
        self
    }

    /// Replace the retryable status set
    #[must_use]
    pub fn retry_statuses(mut self, statuses: impl IntoIterator<Item = u16>) -> Self {
        self.retryable_statuses = statuses.into_iter().collect();
        self
    }

    /// Replace the retryable method set
    #[must_use]
    pub fn retry_methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.retryable_methods = methods.into_iter().collect();
        self
    }

    /// Delay before retry number `attempt` (0-based), capped at `max_backoff`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        std::cmp::min(self.backoff_factor.saturating_mul(factor), self.max_backoff)
    }

    /// Whether an attempt with this outcome may be repeated
    pub fn should_retry(&self, method: Method, outcome: &ResponseOutcome) -> bool {
        if !self.retryable_methods.contains(&method) {
            return false;
        }
        match outcome {
            ResponseOutcome::Success { .. } => false,
            ResponseOutcome::Failure { status, .. } => self.retryable_statuses.contains(status),
            ResponseOutcome::TransportError { .. } => true,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(Error::invalid_value("max_attempts", "must be at least 1"));
        }
        Ok(())
    }
}

// ============================================================================
// Transport Config
// ============================================================================

/// Configuration for the transport
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Retry policy, fixed for the transport's lifetime
    pub retry: RetryPolicy,
    /// Maximum concurrent requests (and pooled connections per host)
    pub pool_size: usize,
    /// Per-attempt timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// How long idle pooled connections are kept
    pub pool_idle_timeout: Duration,
    /// Minimum spacing between requests to the same target (`None` = off)
    pub min_interval: Option<Duration>,
    /// User agent string
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            pool_size: 10,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool_idle_timeout: Duration::from_secs(90),
            min_interval: None,
            user_agent: format!("jira-walk/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl TransportConfig {
    /// Create a new config builder
    pub fn builder() -> TransportConfigBuilder {
        TransportConfigBuilder::default()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.pool_size == 0 {
            return Err(Error::invalid_value("pool_size", "must be at least 1"));
        }
        if self.timeout.is_zero() {
            return Err(Error::invalid_value("timeout", "must be non-zero"));
        }
        self.retry.validate()
    }
}

/// Builder for transport config
#[derive(Default)]
pub struct TransportConfigBuilder {
    config: TransportConfig,
}

impl TransportConfigBuilder {
    /// Set the retry policy
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.config.retry = policy;
        self
    }

    /// Set the pool ceiling
    pub fn pool_size(mut self, size: usize) -> Self {
        self.config.pool_size = size;
        self
    }

    /// Set the per-attempt timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the connect timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Space consecutive requests to one target by at least `interval`
    pub fn min_interval(mut self, interval: Duration) -> Self {
        self.config.min_interval = Some(interval);
        self
    }

    /// Disable request pacing
    pub fn no_pacing(mut self) -> Self {
        self.config.min_interval = None;
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> TransportConfig {
        self.config
    }
}

// ============================================================================
// Transport Request
// ============================================================================

/// Request payload after shaping
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Payload {
    /// No body
    #[default]
    Empty,
    /// JSON body
    Json(JsonValue),
    /// Multipart form, one part per attachment
    Multipart(Vec<Attachment>),
}

/// A fully resolved request, ready to put on the wire
#[derive(Clone)]
pub struct TransportRequest {
    /// Target name, used for pacing and logging
    pub target: String,
    /// HTTP method
    pub method: Method,
    /// Absolute URL
    pub url: Url,
    /// `Authorization` header value
    pub auth_header: Option<String>,
    /// Ordered query parameters
    pub query: QueryParams,
    /// Body
    pub payload: Payload,
}

impl TransportRequest {
    /// Create a request with no auth, query or body
    pub fn new(target: impl Into<String>, method: Method, url: Url) -> Self {
        Self {
            target: target.into(),
            method,
            url,
            auth_header: None,
            query: Vec::new(),
            payload: Payload::Empty,
        }
    }

    /// Attach an `Authorization` header
    #[must_use]
    pub fn with_auth(mut self, header: impl Into<String>) -> Self {
        self.auth_header = Some(header.into());
        self
    }

    /// Set query parameters
    #[must_use]
    pub fn with_query(mut self, query: QueryParams) -> Self {
        self.query = query;
        self
    }

    /// Set the payload
    #[must_use]
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }
}

impl fmt::Debug for TransportRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportRequest")
            .field("target", &self.target)
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("has_auth", &self.auth_header.is_some())
            .field("query", &self.query)
            .field("payload", &self.payload)
            .finish()
    }
}

// ============================================================================
// Response Outcome
// ============================================================================

/// Result of one (possibly retried) exchange
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseOutcome {
    /// Status 200, 201 or 204. Empty or non-JSON bodies become `{}`.
    Success { status: u16, body: JsonValue },
    /// Any other HTTP status
    Failure {
        status: u16,
        body: Option<JsonValue>,
    },
    /// No status line was received (DNS, connect, timeout, cancellation)
    TransportError { message: String },
}

impl ResponseOutcome {
    /// Classify a received status and body
    pub fn classify(status: u16, text: &str) -> Self {
        if SUCCESS_STATUSES.contains(&status) {
            let body = serde_json::from_str::<Value>(text)
                .ok()
                .filter(|_| !text.trim().is_empty())
                .unwrap_or_else(|| Value::Object(Map::new()));
            Self::Success { status, body }
        } else {
            let body = if text.trim().is_empty() {
                None
            } else {
                Some(
                    serde_json::from_str::<Value>(text)
                        .unwrap_or_else(|_| Value::String(text.to_string())),
                )
            };
            Self::Failure { status, body }
        }
    }

    /// Create a transport error outcome
    pub fn transport_error(message: impl Into<String>) -> Self {
        Self::TransportError {
            message: message.into(),
        }
    }

    /// Check if this is a success
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Check if this is an HTTP failure
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }

    /// Check if this is a transport error
    pub fn is_transport_error(&self) -> bool {
        matches!(self, Self::TransportError { .. })
    }

    /// HTTP status, if one was received
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Success { status, .. } | Self::Failure { status, .. } => Some(*status),
            Self::TransportError { .. } => None,
        }
    }

    /// Response body, if any
    pub fn body(&self) -> Option<&JsonValue> {
        match self {
            Self::Success { body, .. } => Some(body),
            Self::Failure { body, .. } => body.as_ref(),
            Self::TransportError { .. } => None,
        }
    }
}

impl fmt::Display for ResponseOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success { status, .. } => write!(f, "HTTP {status}"),
            Self::Failure { status, body } => match body {
                Some(body) => write!(f, "HTTP {status}: {body}"),
                None => write!(f, "HTTP {status}"),
            },
            Self::TransportError { message } => write!(f, "transport error: {message}"),
        }
    }
}

// ============================================================================
// Stats
// ============================================================================

/// Snapshot of transport counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransportStats {
    /// Attempts currently on the wire
    pub in_flight: usize,
    /// Highest `in_flight` value observed
    pub peak_in_flight: usize,
    /// `execute` calls
    pub requests: u64,
    /// Attempts issued (requests plus retries)
    pub attempts: u64,
    /// Retries issued
    pub retries: u64,
}
