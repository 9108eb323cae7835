//! Pagination types
//!
//! One cursor type covers both strategies. The strategy decides how the
//! cursor advances and when the walk ends:
//! - offset: a page shorter than `page_size` ends the walk
//! - token: a missing or empty continuation token ends the walk

use crate::dispatch::RequestDescriptor;
use crate::error::{Error, Result};
use crate::types::{JsonValue, QueryParams, QueryValue};
use serde_json::Value;
use std::fmt;

/// Placeholder replaced by the parent key in fan-out child queries
pub const PARENT_PLACEHOLDER: &str = "parent";

/// Result of advancing a cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextPage {
    /// Fetch another page with the updated cursor
    Continue,
    /// The walk is complete
    Done,
}

impl NextPage {
    /// Check if this is a done result
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Check if this is a continue result
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue)
    }
}

/// How a collection is paged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStrategy {
    /// `startAt` / `maxResults`
    Offset { page_size: u32 },
    /// `nextPageToken` / `maxResults`
    Token { page_size: u32 },
}

impl PageStrategy {
    /// Requested records per page
    pub fn page_size(&self) -> u32 {
        match self {
            Self::Offset { page_size } | Self::Token { page_size } => *page_size,
        }
    }
}

/// Wire names of the pagination parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageParams {
    /// Query parameter carrying the offset
    pub offset_param: String,
    /// Query parameter carrying the page size
    pub limit_param: String,
    /// Query parameter carrying the continuation token
    pub token_param: String,
    /// Dotted path of the continuation token in the response body
    pub token_field: String,
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            offset_param: "startAt".to_string(),
            limit_param: "maxResults".to_string(),
            token_param: "nextPageToken".to_string(),
            token_field: "nextPageToken".to_string(),
        }
    }
}

/// Position of one walk within a collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCursor {
    /// Offset-based position
    Offset { start_at: u64, page_size: u32 },
    /// Token-based position; `None` before the first page
    Token {
        token: Option<String>,
        page_size: u32,
    },
}

impl PageCursor {
    /// Cursor for the first page
    pub fn initial(strategy: PageStrategy) -> Self {
        match strategy {
            PageStrategy::Offset { page_size } => Self::Offset {
                start_at: 0,
                page_size,
            },
            PageStrategy::Token { page_size } => Self::Token {
                token: None,
                page_size,
            },
        }
    }

    /// Requested records per page
    pub fn page_size(&self) -> u32 {
        match self {
            Self::Offset { page_size, .. } | Self::Token { page_size, .. } => *page_size,
        }
    }

    /// Query parameters selecting the current page
    pub fn query_params(&self, params: &PageParams) -> QueryParams {
        match self {
            Self::Offset {
                start_at,
                page_size,
            } => vec![
                (
                    params.offset_param.clone(),
                    QueryValue::Int(*start_at as i64),
                ),
                (params.limit_param.clone(), QueryValue::from(*page_size)),
            ],
            Self::Token { token, page_size } => {
                let mut query = vec![(params.limit_param.clone(), QueryValue::from(*page_size))];
                if let Some(token) = token {
                    query.push((params.token_param.clone(), QueryValue::Str(token.clone())));
                }
                query
            }
        }
    }

    /// Move past a page that held `records_on_page` records
    pub fn advance(
        &mut self,
        records_on_page: usize,
        body: &JsonValue,
        params: &PageParams,
    ) -> NextPage {
        match self {
            Self::Offset {
                start_at,
                page_size,
            } => {
                if records_on_page < *page_size as usize {
                    return NextPage::Done;
                }
                *start_at += u64::from(*page_size);
                NextPage::Continue
            }
            // Page length is irrelevant here, only the token counts
            Self::Token { token, .. } => match extract_token(body, &params.token_field) {
                Some(next) => {
                    *token = Some(next);
                    NextPage::Continue
                }
                None => NextPage::Done,
            },
        }
    }
}

impl fmt::Display for PageCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Offset {
                start_at,
                page_size,
            } => write!(f, "offset start_at={start_at} page_size={page_size}"),
            Self::Token {
                token: Some(token),
                page_size,
            } => write!(f, "token={token} page_size={page_size}"),
            Self::Token {
                token: None,
                page_size,
            } => write!(f, "token=<first page> page_size={page_size}"),
        }
    }
}

/// A paged collection endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionQuery {
    /// Target name
    pub target: String,
    /// Collection path
    pub path: String,
    /// Fixed filters sent with every page
    pub query: QueryParams,
    /// Dotted path of the records array; empty when the body is the array
    pub records_field: String,
    /// Pagination strategy
    pub strategy: PageStrategy,
    /// Pagination parameter names
    pub params: PageParams,
}

impl CollectionQuery {
    /// Create a collection query
    pub fn new(
        target: impl Into<String>,
        path: impl Into<String>,
        records_field: impl Into<String>,
        strategy: PageStrategy,
    ) -> Self {
        Self {
            target: target.into(),
            path: path.into(),
            query: Vec::new(),
            records_field: records_field.into(),
            strategy,
            params: PageParams::default(),
        }
    }

    /// Offset-paged collection
    pub fn offset(
        target: impl Into<String>,
        path: impl Into<String>,
        records_field: impl Into<String>,
        page_size: u32,
    ) -> Self {
        Self::new(target, path, records_field, PageStrategy::Offset { page_size })
    }

    /// Token-paged collection
    pub fn token(
        target: impl Into<String>,
        path: impl Into<String>,
        records_field: impl Into<String>,
        page_size: u32,
    ) -> Self {
        Self::new(target, path, records_field, PageStrategy::Token { page_size })
    }

    /// Add a fixed filter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Use different pagination parameter names
    #[must_use]
    pub fn params(mut self, params: PageParams) -> Self {
        self.params = params;
        self
    }

    /// Reject queries that could never terminate
    pub fn validate(&self) -> Result<()> {
        if self.strategy.page_size() == 0 {
            return Err(Error::validation("page_size must be at least 1"));
        }
        Ok(())
    }

    /// Request for the page the cursor points at
    pub fn descriptor(&self, cursor: &PageCursor) -> RequestDescriptor {
        let mut descriptor = RequestDescriptor::get(&self.target, &self.path);
        descriptor.query.clone_from(&self.query);
        cursor
            .query_params(&self.params)
            .into_iter()
            .fold(descriptor, |d, (key, value)| d.set_query(&key, value))
    }

    /// Copy of this query with `{parent}` replaced in the path and filters
    pub fn for_parent(&self, parent: &str) -> Self {
        let placeholder = format!("{{{PARENT_PLACEHOLDER}}}");
        let mut child = self.clone();
        child.path = self.path.replace(&placeholder, parent);
        child.query = self
            .query
            .iter()
            .map(|(k, v)| (k.clone(), v.substitute(PARENT_PLACEHOLDER, parent)))
            .collect();
        child
    }
}

/// Follow a dotted path (`"a.b.c"`) into a JSON value
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let path = path.strip_prefix("$.").unwrap_or(path);
    if path.is_empty() {
        return Some(value);
    }
    path.split('.').try_fold(value, |current, part| current.get(part))
}

/// Remove and return the records array at `field`; anything else is no records
pub fn take_records(body: &mut Value, field: &str) -> Vec<Value> {
    let path = field.strip_prefix("$.").unwrap_or(field);
    let target = if path.is_empty() {
        Some(body)
    } else {
        path.split('.')
            .try_fold(body, |current, part| current.get_mut(part))
    };

    match target {
        Some(Value::Array(items)) => std::mem::take(items),
        _ => Vec::new(),
    }
}

/// Read a scalar at `path` as a string: strings as-is, numbers formatted
pub fn extract_scalar(value: &Value, path: &str) -> Option<String> {
    match lookup(value, path)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn extract_token(body: &Value, field: &str) -> Option<String> {
    extract_scalar(body, field).filter(|t| !t.is_empty())
}
