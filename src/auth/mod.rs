//! Credential module
//!
//! Maps a target name (e.g. `"jira"`) to a base URL and an HTTP Basic
//! `Authorization` header. Only one scheme is supported.

mod provider;
mod types;

pub use provider::{
    CredentialProvider, EnvCredentialProvider, StaticCredentialProvider, ENV_API_TOKEN,
    ENV_BASE_URL, ENV_EMAIL, JIRA_TARGET,
};
pub use types::{basic_auth_header, Credentials};
