//! Jira collection walks
//!
//! Thin layer over [`Paginator`] that knows the Jira Cloud endpoints:
//! - issue search: `GET /rest/api/3/search/jql`, token paged
//! - project search: `GET /rest/api/3/project/search`, offset paged
//! - issues per project: project search fanned out into issue searches

use crate::auth::{CredentialProvider, JIRA_TARGET};
use crate::config::Settings;
use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::http::Transport;
use crate::pagination::{
    CollectionQuery, FanOut, PageStrategy, Paginator, ParentSource, DEFAULT_FAN_OUT_CONCURRENCY,
    PARENT_PLACEHOLDER,
};
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Token-paged issue search endpoint
pub const SEARCH_PATH: &str = "/rest/api/3/search/jql";

/// Offset-paged project search endpoint
pub const PROJECT_SEARCH_PATH: &str = "/rest/api/3/project/search";

/// Project expansions requested by default
pub const PROJECT_EXPAND: &str = "description,lead,url";

/// Parameters of an issue search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueSearch {
    /// JQL filter; for per-project walks this is appended to the project clause
    pub jql: String,
    /// Issue fields to return; empty means the server default
    pub fields: Vec<String>,
    /// Issues per page
    pub page_size: u32,
}

impl Default for IssueSearch {
    fn default() -> Self {
        Self {
            jql: "ORDER BY created DESC".to_string(),
            fields: vec![
                "summary".to_string(),
                "description".to_string(),
                "status".to_string(),
            ],
            page_size: 500,
        }
    }
}

impl IssueSearch {
    /// Search with a JQL filter and default fields
    pub fn new(jql: impl Into<String>) -> Self {
        Self {
            jql: jql.into(),
            ..Self::default()
        }
    }

    /// Set the returned fields
    #[must_use]
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Set the page size
    #[must_use]
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Collection query for this search
    pub fn query(&self) -> CollectionQuery {
        self.query_with_jql(self.jql.trim().to_string())
    }

    /// Collection query scoped to one project per fan-out parent
    pub fn per_project_query(&self) -> CollectionQuery {
        let scope = format!("project = {{{PARENT_PLACEHOLDER}}}");
        let jql = match self.jql.trim() {
            "" => scope,
            suffix if suffix.to_ascii_uppercase().starts_with("ORDER BY") => {
                format!("{scope} {suffix}")
            }
            suffix => format!("{scope} AND {suffix}"),
        };
        self.query_with_jql(jql)
    }

    fn query_with_jql(&self, jql: String) -> CollectionQuery {
        let mut query = CollectionQuery::new(
            JIRA_TARGET,
            SEARCH_PATH,
            "issues",
            PageStrategy::Token {
                page_size: self.page_size,
            },
        )
        .query("jql", jql);

        if !self.fields.is_empty() {
            query = query.query("fields", self.fields.join(","));
        }
        query
    }
}

/// Offset-paged project listing
pub fn projects_query(page_size: u32) -> CollectionQuery {
    CollectionQuery::offset(JIRA_TARGET, PROJECT_SEARCH_PATH, "values", page_size)
        .query("expand", PROJECT_EXPAND)
}

/// Jira client built on the shared transport
#[derive(Debug, Clone)]
pub struct JiraClient {
    paginator: Paginator,
    project_page_size: u32,
    concurrency: usize,
}

impl JiraClient {
    /// Create a client over an existing paginator
    pub fn new(paginator: Paginator) -> Self {
        Self {
            paginator,
            project_page_size: 50,
            concurrency: DEFAULT_FAN_OUT_CONCURRENCY,
        }
    }

    /// Build the transport, dispatcher and paginator from settings
    pub fn from_settings(
        settings: &Settings,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self> {
        settings.validate()?;
        let transport = Arc::new(Transport::new(settings.transport_config())?);
        let dispatcher = Dispatcher::new(transport, credentials);

        Ok(Self::new(Paginator::new(dispatcher))
            .with_project_page_size(settings.project_page_size)
            .with_concurrency(settings.fan_out_concurrency))
    }

    /// Set the project page size
    #[must_use]
    pub fn with_project_page_size(mut self, page_size: u32) -> Self {
        self.project_page_size = page_size;
        self
    }

    /// Set the number of concurrent per-project walks
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Abandon in-flight walks once `cancel` fires
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.paginator = self.paginator.with_cancel(cancel);
        self
    }

    /// The underlying paginator
    pub fn paginator(&self) -> &Paginator {
        &self.paginator
    }

    /// The shared transport
    pub fn transport(&self) -> &Arc<Transport> {
        self.paginator.dispatcher().transport()
    }

    /// Every issue matching a search
    pub async fn search_issues(&self, search: &IssueSearch) -> Result<Vec<Value>> {
        let issues = self.paginator.walk(&search.query()).await?;
        info!(jql = %search.jql, issues = issues.len(), "issue search complete");
        Ok(issues)
    }

    /// Every visible project
    pub async fn list_projects(&self) -> Result<Vec<Value>> {
        let projects = self
            .paginator
            .walk(&projects_query(self.project_page_size))
            .await?;
        info!(projects = projects.len(), "project listing complete");
        Ok(projects)
    }

    /// Issues of every project, grouped by project in listing order
    pub async fn project_issues(&self, search: &IssueSearch) -> Result<Vec<Value>> {
        let fan_out = FanOut::new(
            ParentSource::Paged(projects_query(self.project_page_size)),
            "key",
            search.per_project_query(),
        )
        .concurrency(self.concurrency);

        let issues = self.paginator.fan_out(&fan_out).await?;
        info!(issues = issues.len(), "per-project issue walk complete");
        Ok(issues)
    }

    /// Close the shared transport; later calls fail with `TransportClosed`
    pub fn close(&self) {
        self.transport().close();
    }
}
