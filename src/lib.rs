// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]

//! # jira-walk
//!
//! A resilient HTTP client for walking Jira Cloud collections.
//!
//! ## Features
//!
//! - **Pooled Transport**: One shared connection pool with a concurrency ceiling
//! - **Retries**: Capped exponential backoff, `Retry-After` aware
//! - **Pacing**: Optional minimum spacing between requests to one target
//! - **Pagination**: Offset (`startAt`) and token (`nextPageToken`) walks
//! - **Fan-out**: Walk a child collection per parent record, concurrently
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use jira_walk::auth::EnvCredentialProvider;
//! use jira_walk::config::Settings;
//! use jira_walk::jira::{IssueSearch, JiraClient};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> jira_walk::Result<()> {
//!     let settings = Settings::load(None)?;
//!     let credentials = Arc::new(EnvCredentialProvider::from_env()?);
//!     let client = JiraClient::from_settings(&settings, credentials)?;
//!
//!     let issues = client
//!         .search_issues(&IssueSearch::new("project = OPS ORDER BY created DESC"))
//!         .await?;
//!     println!("{} issues", issues.len());
//!
//!     client.close();
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                JiraClient / CLI runner                   │
//! └──────────────────────────────────────────────────────────┘
//!                            │
//! ┌──────────────────────────┴───────────────────────────────┐
//! │  Paginator     walk(CollectionQuery)   fan_out(FanOut)   │
//! ├──────────────────────────────────────────────────────────┤
//! │  Dispatcher    validate → resolve target → shape → log   │
//! ├──────────────────────────────────────────────────────────┤
//! │  Transport     pool ceiling │ pacing │ retry │ classify  │
//! └──────────────────────────────────────────────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Target credentials
pub mod auth;

/// Pooled HTTP transport with retry and pacing
pub mod http;

/// Request descriptors and the dispatcher
pub mod dispatch;

/// Offset and token pagination, fan-out
pub mod pagination;

/// Runtime settings
pub mod config;

/// Jira endpoints
pub mod jira;

/// Command-line interface
pub mod cli;

#[cfg(test)]
mod test_support;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

pub use dispatch::{Dispatcher, RequestDescriptor};
pub use http::{ResponseOutcome, Transport};
pub use jira::{IssueSearch, JiraClient};
pub use pagination::{CollectionQuery, FanOut, Paginator};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
