//! Pooled HTTP transport with retry and pacing
//!
//! One `Transport` owns one `reqwest::Client` (and therefore one connection
//! pool) for the whole process. It handles:
//! - a concurrency ceiling: callers beyond `pool_size` wait for a permit
//! - automatic retries with capped exponential backoff
//! - optional per-target pacing
//! - classification of every exchange into a [`ResponseOutcome`]
//!
//! Remote failures never escape as errors; they come back as outcomes.

use super::rate_limit::Pacer;
use super::types::{
    Payload, ResponseOutcome, RetryPolicy, TransportConfig, TransportRequest, TransportStats,
};
use crate::error::{Error, Result};
use crate::types::Attachment;
use parking_lot::{Mutex, RwLock};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const CLOSED_MESSAGE: &str = "transport is closed";

/// Long-lived HTTP transport shared by every dispatcher and paginator
pub struct Transport {
    client: RwLock<Option<Client>>,
    permits: Semaphore,
    pacer: Pacer,
    config: TransportConfig,
    stats: Mutex<TransportStats>,
    closed: AtomicBool,
}

impl Transport {
    /// Build the transport and its connection pool
    pub fn new(config: TransportConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(config.pool_size)
            .pool_idle_timeout(config.pool_idle_timeout)
            .user_agent(&config.user_agent)
            .build()?;

        info!(
            pool_size = config.pool_size,
            max_attempts = config.retry.max_attempts,
            pacing_ms = config.min_interval.map(|d| d.as_millis() as u64),
            "transport initialized"
        );

        Ok(Self {
            client: RwLock::new(Some(client)),
            permits: Semaphore::new(config.pool_size),
            pacer: Pacer::new(config.min_interval),
            config,
            stats: Mutex::new(TransportStats::default()),
            closed: AtomicBool::new(false),
        })
    }

    /// Build a transport with default configuration
    pub fn with_defaults() -> Result<Self> {
        Self::new(TransportConfig::default())
    }

    /// The retry policy this transport was built with
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.config.retry
    }

    /// The configuration this transport was built with
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Snapshot of the request counters
    pub fn stats(&self) -> TransportStats {
        *self.stats.lock()
    }

    /// Check if `close` has been called
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Fail with [`Error::TransportClosed`] once the transport is closed
    pub fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            Err(Error::TransportClosed)
        } else {
            Ok(())
        }
    }

    /// Release pooled connections. Later calls fail fast.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.client.write().take();
        self.permits.close();
        info!("transport closed");
    }

    /// Perform one exchange, retrying per policy
    pub async fn execute(&self, request: &TransportRequest) -> ResponseOutcome {
        self.run(request).await
    }

    /// Like [`execute`](Self::execute), but gives up as soon as `cancel` fires
    pub async fn execute_with_cancel(
        &self,
        request: &TransportRequest,
        cancel: &CancellationToken,
    ) -> ResponseOutcome {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!(method = %request.method, path = request.url.path(), "request cancelled");
                ResponseOutcome::transport_error("request cancelled")
            }
            outcome = self.run(request) => outcome,
        }
    }

    async fn run(&self, request: &TransportRequest) -> ResponseOutcome {
        // Clone the handle; the lock is never held across I/O
        let Some(client) = self.client.read().clone() else {
            return ResponseOutcome::transport_error(CLOSED_MESSAGE);
        };
        self.stats.lock().requests += 1;

        let policy = &self.config.retry;
        let mut previous_delay = Duration::ZERO;
        let mut attempt: u32 = 0;

        loop {
            self.pacer.wait(&request.target).await;

            let (outcome, retry_after) = {
                let Ok(_permit) = self.permits.acquire().await else {
                    return ResponseOutcome::transport_error(CLOSED_MESSAGE);
                };
                let _in_flight = InFlight::enter(&self.stats);
                self.attempt(&client, request).await
            };

            debug!(
                target_name = %request.target,
                method = %request.method,
                path = request.url.path(),
                attempt = attempt + 1,
                status = outcome.status(),
                "attempt finished"
            );

            let exhausted = attempt + 1 >= policy.max_attempts;
            if exhausted || self.is_closed() || !policy.should_retry(request.method, &outcome) {
                return outcome;
            }

            // Non-decreasing: a short Retry-After never shrinks the schedule
            let delay = std::cmp::max(policy.delay_for(attempt), retry_after.unwrap_or_default())
                .min(policy.max_backoff)
                .max(previous_delay);

            warn!(
                method = %request.method,
                path = request.url.path(),
                attempt = attempt + 1,
                max_attempts = policy.max_attempts,
                delay_ms = delay.as_millis() as u64,
                "retrying after {outcome}"
            );

            self.stats.lock().retries += 1;
            tokio::time::sleep(delay).await;
            previous_delay = delay;
            attempt += 1;
        }
    }

    async fn attempt(
        &self,
        client: &Client,
        request: &TransportRequest,
    ) -> (ResponseOutcome, Option<Duration>) {
        let mut req = client
            .request(request.method.into(), request.url.clone())
            .header(ACCEPT, "application/json");

        if let Some(ref auth) = request.auth_header {
            req = req.header(AUTHORIZATION, auth.as_str());
        }

        if !request.query.is_empty() {
            let pairs: Vec<(&str, String)> = request
                .query
                .iter()
                .map(|(k, v)| (k.as_str(), v.to_string()))
                .collect();
            req = req.query(&pairs);
        }

        match &request.payload {
            Payload::Empty => {}
            Payload::Json(body) => req = req.json(body),
            Payload::Multipart(attachments) => req = req.multipart(build_form(attachments)),
        }

        match req.send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                let retry_after = extract_retry_after(&response);
                let text = match response.text().await {
                    Ok(text) => text,
                    Err(e) => {
                        debug!(status, "failed to read response body: {e}");
                        String::new()
                    }
                };
                (ResponseOutcome::classify(status, &text), retry_after)
            }
            Err(e) => (
                ResponseOutcome::transport_error(self.describe_error(&e)),
                None,
            ),
        }
    }

    fn describe_error(&self, e: &reqwest::Error) -> String {
        if e.is_timeout() {
            format!("request timed out after {:?}: {e}", self.config.timeout)
        } else if e.is_connect() {
            format!("connection failed: {e}")
        } else {
            e.to_string()
        }
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("config", &self.config)
            .field("pacer", &self.pacer)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

/// Tracks one attempt in the in-flight counter; decrements on drop so a
/// cancelled future leaves the counters consistent.
struct InFlight<'a> {
    stats: &'a Mutex<TransportStats>,
}

impl<'a> InFlight<'a> {
    fn enter(stats: &'a Mutex<TransportStats>) -> Self {
        let mut s = stats.lock();
        s.in_flight += 1;
        s.attempts += 1;
        s.peak_in_flight = s.peak_in_flight.max(s.in_flight);
        drop(s);
        Self { stats }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.stats.lock().in_flight -= 1;
    }
}

/// Build a multipart form; forms are not reusable so this runs per attempt
fn build_form(attachments: &[Attachment]) -> Form {
    attachments.iter().fold(Form::new(), |form, attachment| {
        let part = || Part::bytes(attachment.data.to_vec()).file_name(attachment.file_name.clone());
        let part = match attachment.content_type {
            Some(ref mime) => part().mime_str(mime).unwrap_or_else(|_| part()),
            None => part(),
        };
        form.part(attachment.field.clone(), part)
    })
}

/// Extract a `Retry-After` header given in seconds
fn extract_retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
