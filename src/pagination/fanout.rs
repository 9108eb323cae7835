//! Parent/child fan-out description

use super::types::{extract_scalar, CollectionQuery};
use crate::dispatch::RequestDescriptor;
use crate::error::{Error, Result};
use serde_json::Value;

/// Default number of child walks in flight at once
pub const DEFAULT_FAN_OUT_CONCURRENCY: usize = 4;

/// Where parent records come from
#[derive(Debug, Clone, PartialEq)]
pub enum ParentSource {
    /// One request whose response holds every parent
    Single {
        request: RequestDescriptor,
        records_field: String,
    },
    /// A paged collection of parents
    Paged(CollectionQuery),
}

/// Walk a child collection once per parent record
#[derive(Debug, Clone, PartialEq)]
pub struct FanOut {
    /// Parent records
    pub parents: ParentSource,
    /// Dotted path of the key inside each parent record
    pub parent_key: String,
    /// Child query; `{parent}` in its path or string filters becomes the key
    pub children: CollectionQuery,
    /// Child walks in flight at once
    pub concurrency: usize,
}

impl FanOut {
    /// Create a fan-out with the default concurrency
    pub fn new(
        parents: ParentSource,
        parent_key: impl Into<String>,
        children: CollectionQuery,
    ) -> Self {
        Self {
            parents,
            parent_key: parent_key.into(),
            children,
            concurrency: DEFAULT_FAN_OUT_CONCURRENCY,
        }
    }

    /// Set the number of concurrent child walks
    #[must_use]
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(Error::validation("fan-out concurrency must be at least 1"));
        }
        if self.parent_key.trim().is_empty() {
            return Err(Error::validation("fan-out parent_key must not be empty"));
        }
        if let ParentSource::Paged(query) = &self.parents {
            query.validate()?;
        }
        self.children.validate()
    }
}

/// Key of a parent record; strings and numbers only
pub(crate) fn extract_parent_key(record: &Value, parent_key: &str) -> Option<String> {
    extract_scalar(record, parent_key).filter(|key| !key.is_empty())
}
