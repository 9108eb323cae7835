//! Runtime settings
//!
//! Settings come from three layers, later layers winning:
//! 1. built-in defaults
//! 2. an optional YAML file
//! 3. `JIRA_WALK_*` environment variables
//!
//! Credentials are not part of the settings; they are read from the
//! environment by [`EnvCredentialProvider`](crate::auth::EnvCredentialProvider).

use crate::error::{Error, Result};
use crate::http::{RetryPolicy, TransportConfig, DEFAULT_RETRYABLE_STATUSES};
use crate::pagination::DEFAULT_FAN_OUT_CONCURRENCY;
use crate::types::Method;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Prefix of every settings environment variable
pub const ENV_PREFIX: &str = "JIRA_WALK_";

/// Tunables for the transport and the walkers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Maximum concurrent requests
    pub pool_size: usize,

    /// Request timeout in seconds
    pub timeout_seconds: u64,

    /// Connection timeout in seconds
    pub connect_timeout_seconds: u64,

    /// Total attempts per request, including the first
    pub max_attempts: u32,

    /// Base retry delay in milliseconds
    pub backoff_factor_ms: u64,

    /// Longest single retry delay in seconds
    pub max_backoff_seconds: u64,

    /// HTTP status codes to retry on
    pub retry_statuses: Vec<u16>,

    /// Methods allowed to be retried
    pub retry_methods: Vec<Method>,

    /// Minimum spacing between requests to one target; 0 disables pacing
    pub min_interval_ms: u64,

    /// Issues requested per search page
    pub issue_page_size: u32,

    /// Projects requested per page
    pub project_page_size: u32,

    /// Child walks in flight during a fan-out
    pub fan_out_concurrency: usize,

    /// User-Agent header
    pub user_agent: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pool_size: 10,
            timeout_seconds: 30,
            connect_timeout_seconds: 10,
            max_attempts: 5,
            backoff_factor_ms: 1000,
            max_backoff_seconds: 60,
            retry_statuses: DEFAULT_RETRYABLE_STATUSES.to_vec(),
            retry_methods: Method::ALL.to_vec(),
            min_interval_ms: 1000,
            issue_page_size: 500,
            project_page_size: 50,
            fan_out_concurrency: DEFAULT_FAN_OUT_CONCURRENCY,
            user_agent: None,
        }
    }
}

impl Settings {
    /// Parse settings from YAML; absent keys keep their defaults
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read settings from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Defaults, then `path` if given, then the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.apply_overrides(|key| std::env::var(key).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    /// Apply `JIRA_WALK_*` overrides read through `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(&format!("{ENV_PREFIX}{name}"))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        override_parsed(&mut self.pool_size, "POOL_SIZE", var("POOL_SIZE"))?;
        override_parsed(&mut self.timeout_seconds, "TIMEOUT_SECONDS", var("TIMEOUT_SECONDS"))?;
        override_parsed(
            &mut self.connect_timeout_seconds,
            "CONNECT_TIMEOUT_SECONDS",
            var("CONNECT_TIMEOUT_SECONDS"),
        )?;
        override_parsed(&mut self.max_attempts, "MAX_ATTEMPTS", var("MAX_ATTEMPTS"))?;
        override_parsed(
            &mut self.backoff_factor_ms,
            "BACKOFF_FACTOR_MS",
            var("BACKOFF_FACTOR_MS"),
        )?;
        override_parsed(
            &mut self.max_backoff_seconds,
            "MAX_BACKOFF_SECONDS",
            var("MAX_BACKOFF_SECONDS"),
        )?;
        override_parsed(&mut self.min_interval_ms, "MIN_INTERVAL_MS", var("MIN_INTERVAL_MS"))?;
        override_parsed(
            &mut self.issue_page_size,
            "ISSUE_PAGE_SIZE",
            var("ISSUE_PAGE_SIZE"),
        )?;
        override_parsed(
            &mut self.project_page_size,
            "PROJECT_PAGE_SIZE",
            var("PROJECT_PAGE_SIZE"),
        )?;
        override_parsed(
            &mut self.fan_out_concurrency,
            "FAN_OUT_CONCURRENCY",
            var("FAN_OUT_CONCURRENCY"),
        )?;

        if let Some(statuses) = var("RETRY_STATUSES") {
            self.retry_statuses = statuses
                .split(',')
                .map(|s| parse_value::<u16>("RETRY_STATUSES", s.trim()))
                .collect::<Result<_>>()?;
        }
        if let Some(agent) = var("USER_AGENT") {
            self.user_agent = Some(agent);
        }

        Ok(())
    }

    /// Reject settings the transport or walkers cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.pool_size == 0 {
            return Err(Error::invalid_value("pool_size", "must be at least 1"));
        }
        if self.timeout_seconds == 0 {
            return Err(Error::invalid_value("timeout_seconds", "must be at least 1"));
        }
        if self.max_attempts == 0 {
            return Err(Error::invalid_value("max_attempts", "must be at least 1"));
        }
        if self.issue_page_size == 0 {
            return Err(Error::invalid_value("issue_page_size", "must be at least 1"));
        }
        if self.project_page_size == 0 {
            return Err(Error::invalid_value("project_page_size", "must be at least 1"));
        }
        if self.fan_out_concurrency == 0 {
            return Err(Error::invalid_value("fan_out_concurrency", "must be at least 1"));
        }
        Ok(())
    }

    /// Retry policy described by these settings
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default()
            .max_attempts(self.max_attempts)
            .backoff(
                Duration::from_millis(self.backoff_factor_ms),
                Duration::from_secs(self.max_backoff_seconds),
            )
            .retry_statuses(self.retry_statuses.iter().copied())
            .retry_methods(self.retry_methods.iter().copied())
    }

    /// Transport configuration described by these settings
    pub fn transport_config(&self) -> TransportConfig {
        let mut builder = TransportConfig::builder()
            .retry(self.retry_policy())
            .pool_size(self.pool_size)
            .timeout(Duration::from_secs(self.timeout_seconds))
            .connect_timeout(Duration::from_secs(self.connect_timeout_seconds));

        builder = match self.min_interval_ms {
            0 => builder.no_pacing(),
            ms => builder.min_interval(Duration::from_millis(ms)),
        };
        if let Some(agent) = &self.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        builder.build()
    }
}

fn override_parsed<T: FromStr>(slot: &mut T, name: &str, value: Option<String>) -> Result<()> {
    if let Some(value) = value {
        *slot = parse_value(name, &value)?;
    }
    Ok(())
}

fn parse_value<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| {
        Error::invalid_value(
            format!("{ENV_PREFIX}{name}"),
            format!("cannot parse '{value}'"),
        )
    })
}
