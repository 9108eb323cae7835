//! Credential types
//!
//! A resolved target: where to send requests and which `Authorization`
//! header to attach. The header value is secret material and never shows up
//! in `Debug` output.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fmt;
use url::Url;

/// Base URL plus encoded auth header for one target
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Base URL every request path is joined to
    pub base_url: Url,
    auth_header: String,
}

impl Credentials {
    /// Build credentials from a base URL and a ready-made header value
    pub fn new(base_url: Url, auth_header: impl Into<String>) -> Self {
        Self {
            base_url,
            auth_header: auth_header.into(),
        }
    }

    /// Build HTTP Basic credentials: `Basic base64(username:secret)`
    pub fn basic(base_url: Url, username: &str, secret: &str) -> Self {
        Self::new(base_url, basic_auth_header(username, secret))
    }

    /// The `Authorization` header value
    pub fn auth_header(&self) -> &str {
        &self.auth_header
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("base_url", &self.base_url.as_str())
            .field("auth_header", &"<redacted>")
            .finish()
    }
}

/// Encode an HTTP Basic `Authorization` header value
pub fn basic_auth_header(username: &str, secret: &str) -> String {
    let encoded = STANDARD.encode(format!("{username}:{secret}"));
    format!("Basic {encoded}")
}

#[cfg(test)]
mod type_tests {
    use super::*;

    #[test]
    fn test_basic_auth_header() {
        // base64("user@example.com:tok") as produced by any RFC 4648 encoder
        assert_eq!(
            basic_auth_header("user@example.com", "tok"),
            "Basic dXNlckBleGFtcGxlLmNvbTp0b2s="
        );
    }

    #[test]
    fn test_debug_redacts_header() {
        let creds = Credentials::basic(
            Url::parse("https://example.atlassian.net").unwrap(),
            "user@example.com",
            "super-secret-token",
        );
        let debug = format!("{creds:?}");
        assert!(debug.contains("example.atlassian.net"));
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("super-secret-token"));
        assert!(!debug.contains(creds.auth_header()));
    }
}
