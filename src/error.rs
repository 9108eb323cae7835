//! Error types for jira-walk
//!
//! Ordinary remote failures (non-success statuses, network errors) are not
//! errors at the transport layer: they travel as
//! [`ResponseOutcome`](crate::http::ResponseOutcome) values. This enum covers
//! everything else: bad configuration, malformed request descriptors,
//! lifecycle misuse, and aborted pagination walks.

use thiserror::Error;

/// The main error type for jira-walk
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Validation Errors
    // ============================================================================
    #[error("Invalid request: {message}")]
    Validation { message: String },

    #[error("Unknown target '{target}'")]
    UnknownTarget { target: String },

    // ============================================================================
    // Transport Errors
    // ============================================================================
    #[error("Transport is closed")]
    TransportClosed,

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    // ============================================================================
    // Pagination Errors
    // ============================================================================
    #[error("Pagination aborted on page {page} ({cursor}): {reason}")]
    Pagination {
        page: usize,
        cursor: String,
        reason: String,
    },

    #[error("Fan-out aborted for parent '{parent}': {source}")]
    FanOut {
        parent: String,
        #[source]
        source: Box<Error>,
    },

    // ============================================================================
    // Data / I/O Errors
    // ============================================================================
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create an unknown target error
    pub fn unknown_target(target: impl Into<String>) -> Self {
        Self::UnknownTarget {
            target: target.into(),
        }
    }

    /// Create a pagination error
    pub fn pagination(page: usize, cursor: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Pagination {
            page,
            cursor: cursor.into(),
            reason: reason.into(),
        }
    }

    /// Wrap an inner walk failure with the parent it was fanned out from
    pub fn fan_out(parent: impl Into<String>, source: Error) -> Self {
        Self::FanOut {
            parent: parent.into(),
            source: Box::new(source),
        }
    }

    /// Returns true for errors caused by the caller's input rather than the
    /// remote service. These are never worth retrying.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation { .. } | Error::UnknownTarget { .. })
    }

    /// Returns true for errors that should stop the process at startup
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::Config { .. }
                | Error::MissingConfigField { .. }
                | Error::InvalidConfigValue { .. }
                | Error::YamlParse(_)
                | Error::InvalidUrl(_)
        )
    }

    /// Page number (1-based) at which a walk failed, following fan-out wrapping
    pub fn failed_page(&self) -> Option<usize> {
        match self {
            Error::Pagination { page, .. } => Some(*page),
            Error::FanOut { source, .. } => source.failed_page(),
            _ => None,
        }
    }
}

/// Result type alias for jira-walk
pub type Result<T> = std::result::Result<T, Error>;
