//! Request descriptors
//!
//! What a caller wants sent: target, path, method, and at most one of a JSON
//! body or a set of attachments.

use crate::error::{Error, Result};
use crate::types::{Attachment, JsonValue, Method, QueryParams, QueryValue};

/// A request before target resolution
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    /// Target name, resolved by the credential provider
    pub target: String,
    /// Path relative to the target's base URL (or an absolute URL)
    pub path: String,
    /// HTTP method
    pub method: Method,
    /// Ordered query parameters (GET only)
    pub query: QueryParams,
    /// JSON body (POST/PUT only)
    pub body: Option<JsonValue>,
    /// Multipart attachments (POST/PUT only)
    pub attachments: Vec<Attachment>,
}

impl RequestDescriptor {
    /// Create a descriptor with no query, body or attachments
    pub fn new(target: impl Into<String>, method: Method, path: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            path: path.into(),
            method,
            query: Vec::new(),
            body: None,
            attachments: Vec::new(),
        }
    }

    /// GET descriptor
    pub fn get(target: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(target, Method::GET, path)
    }

    /// POST descriptor with a JSON body
    pub fn post_json(target: impl Into<String>, path: impl Into<String>, body: JsonValue) -> Self {
        Self::new(target, Method::POST, path).json(body)
    }

    /// PUT descriptor with a JSON body
    pub fn put_json(target: impl Into<String>, path: impl Into<String>, body: JsonValue) -> Self {
        Self::new(target, Method::PUT, path).json(body)
    }

    /// DELETE descriptor
    pub fn delete(target: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(target, Method::DELETE, path)
    }

    /// Append a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Set or replace a query parameter, keeping its original position
    #[must_use]
    pub fn set_query(mut self, key: &str, value: impl Into<QueryValue>) -> Self {
        let value = value.into();
        match self.query.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value,
            None => self.query.push((key.to_string(), value)),
        }
        self
    }

    /// Set the JSON body
    #[must_use]
    pub fn json(mut self, body: JsonValue) -> Self {
        self.body = Some(body);
        self
    }

    /// Add an attachment
    #[must_use]
    pub fn attach(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Check the descriptor's shape. Runs before any network traffic.
    pub fn validate(&self) -> Result<()> {
        if self.path.trim().is_empty() {
            return Err(Error::validation("path must not be empty"));
        }

        let has_body = self.body.is_some();
        let has_attachments = !self.attachments.is_empty();

        if has_body && has_attachments {
            return Err(Error::validation(
                "body and attachments are mutually exclusive",
            ));
        }

        match self.method {
            Method::GET | Method::DELETE if has_body || has_attachments => {
                return Err(Error::validation(format!(
                    "{} requests cannot carry a body or attachments",
                    self.method
                )));
            }
            Method::POST | Method::PUT | Method::DELETE if !self.query.is_empty() => {
                return Err(Error::validation(format!(
                    "query parameters are only sent with GET, not {}",
                    self.method
                )));
            }
            _ => {}
        }

        for attachment in &self.attachments {
            if attachment.field.trim().is_empty() {
                return Err(Error::validation(format!(
                    "attachment '{}' has an empty field name",
                    attachment.file_name
                )));
            }
            if let Some(ref mime) = attachment.content_type {
                if !mime.contains('/') {
                    return Err(Error::validation(format!(
                        "attachment '{}' has invalid content type '{mime}'",
                        attachment.file_name
                    )));
                }
            }
        }

        Ok(())
    }
}
