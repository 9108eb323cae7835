//! Credential providers
//!
//! Resolve a target name to [`Credentials`]. Resolution is
//! case-insensitive; an unknown name is a validation error.

use super::types::Credentials;
use crate::error::{Error, Result};
use crate::types::OptionStringExt;
use std::collections::HashMap;
use url::Url;

/// Name of the Jira target
pub const JIRA_TARGET: &str = "jira";

/// Environment variable holding the Jira base URL
pub const ENV_BASE_URL: &str = "JIRA_BASE_URL";
/// Environment variable holding the Jira account email
pub const ENV_EMAIL: &str = "JIRA_EMAIL";
/// Environment variable holding the Jira API token
pub const ENV_API_TOKEN: &str = "JIRA_API_TOKEN";

/// Source of base URL and auth header per target
pub trait CredentialProvider: Send + Sync {
    /// Resolve a target name to its credentials
    fn resolve(&self, target: &str) -> Result<Credentials>;
}

/// Fixed in-memory target table
#[derive(Debug, Clone, Default)]
pub struct StaticCredentialProvider {
    targets: HashMap<String, Credentials>,
}

impl StaticCredentialProvider {
    /// Create an empty provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a target
    #[must_use]
    pub fn with_target(mut self, target: &str, credentials: Credentials) -> Self {
        self.targets.insert(target.to_ascii_lowercase(), credentials);
        self
    }
}

impl CredentialProvider for StaticCredentialProvider {
    fn resolve(&self, target: &str) -> Result<Credentials> {
        self.targets
            .get(&target.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| Error::unknown_target(target))
    }
}

/// Jira credentials read from the environment
///
/// All three variables are read eagerly; a missing or empty one fails
/// construction so the process never starts half-configured.
#[derive(Debug, Clone)]
pub struct EnvCredentialProvider {
    jira: Credentials,
}

impl EnvCredentialProvider {
    /// Read `JIRA_BASE_URL`, `JIRA_EMAIL` and `JIRA_API_TOKEN`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the variables through an arbitrary lookup function
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .none_if_empty()
                .ok_or_else(|| Error::missing_field(key))
        };

        let base_url = require(ENV_BASE_URL)?;
        let email = require(ENV_EMAIL)?;
        let token = require(ENV_API_TOKEN)?;

        let base_url = Url::parse(&base_url)?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(Error::invalid_value(
                ENV_BASE_URL,
                format!("unsupported scheme '{}'", base_url.scheme()),
            ));
        }

        tracing::debug!(base_url = %base_url, "loaded Jira credentials from environment");

        Ok(Self {
            jira: Credentials::basic(base_url, &email, &token),
        })
    }
}

impl CredentialProvider for EnvCredentialProvider {
    fn resolve(&self, target: &str) -> Result<Credentials> {
        if target.eq_ignore_ascii_case(JIRA_TARGET) {
            Ok(self.jira.clone())
        } else {
            Err(Error::unknown_target(target))
        }
    }
}
