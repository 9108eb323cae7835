//! Collection walker
//!
//! A walk is all-or-nothing: records from earlier pages are only returned
//! when every page succeeded.

use super::fanout::{extract_parent_key, FanOut, ParentSource};
use super::types::{take_records, CollectionQuery, NextPage, PageCursor};
use crate::dispatch::{Dispatcher, RequestDescriptor};
use crate::error::{Error, Result};
use crate::http::ResponseOutcome;
use futures::{stream, StreamExt, TryStreamExt};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Walks paged collections through a [`Dispatcher`]
#[derive(Debug, Clone)]
pub struct Paginator {
    dispatcher: Dispatcher,
    cancel: Option<CancellationToken>,
}

impl Paginator {
    /// Create a paginator over a dispatcher
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            cancel: None,
        }
    }

    /// Abandon in-flight calls once `cancel` fires
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// The underlying dispatcher
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Fetch every page of a collection and return the concatenated records
    pub async fn walk(&self, query: &CollectionQuery) -> Result<Vec<Value>> {
        query.validate()?;

        let mut cursor = PageCursor::initial(query.strategy);
        let mut records = Vec::new();
        let mut page = 0usize;

        loop {
            page += 1;
            let descriptor = query.descriptor(&cursor);
            let outcome = self.send(&descriptor).await?;

            let mut body = match outcome {
                ResponseOutcome::Success { body, .. } => body,
                failed => {
                    warn!(
                        path = %query.path,
                        page,
                        cursor = %cursor,
                        outcome = %failed,
                        "page fetch failed, discarding walk"
                    );
                    return Err(Error::pagination(page, cursor.to_string(), failed.to_string()));
                }
            };

            let page_records = take_records(&mut body, &query.records_field);
            let count = page_records.len();
            records.extend(page_records);
            debug!(path = %query.path, page, records = count, cursor = %cursor, "page fetched");

            if let NextPage::Done = cursor.advance(count, &body, &query.params) {
                break;
            }
        }

        info!(
            path = %query.path,
            pages = page,
            records = records.len(),
            "collection walk complete"
        );
        Ok(records)
    }

    /// Fetch parents, then walk the child collection of every parent
    ///
    /// Child walks run with bounded concurrency. Results are concatenated in
    /// parent order. The first failing child aborts the whole operation.
    pub async fn fan_out(&self, fan_out: &FanOut) -> Result<Vec<Value>> {
        fan_out.validate()?;

        let parents = match &fan_out.parents {
            ParentSource::Single {
                request,
                records_field,
            } => self.fetch_single(request, records_field).await?,
            ParentSource::Paged(query) => self.walk(query).await?,
        };

        let keys: Vec<String> = parents
            .iter()
            .filter_map(|parent| {
                let key = extract_parent_key(parent, &fan_out.parent_key);
                if key.is_none() {
                    warn!(parent_key = %fan_out.parent_key, "parent record has no key, skipping");
                }
                key
            })
            .collect();

        debug!(parents = keys.len(), concurrency = fan_out.concurrency, "fanning out");

        let children: Vec<Vec<Value>> = stream::iter(keys)
            .map(|key| async move {
                let query = fan_out.children.for_parent(&key);
                self.walk(&query)
                    .await
                    .map_err(|err| Error::fan_out(key, err))
            })
            .buffered(fan_out.concurrency)
            .try_collect()
            .await?;

        Ok(children.into_iter().flatten().collect())
    }

    async fn fetch_single(
        &self,
        request: &RequestDescriptor,
        records_field: &str,
    ) -> Result<Vec<Value>> {
        match self.send(request).await? {
            ResponseOutcome::Success { mut body, .. } => Ok(take_records(&mut body, records_field)),
            failed => Err(Error::pagination(1, "single request", failed.to_string())),
        }
    }

    async fn send(&self, descriptor: &RequestDescriptor) -> Result<ResponseOutcome> {
        match &self.cancel {
            Some(cancel) => self.dispatcher.send_with_cancel(descriptor, cancel).await,
            None => self.dispatcher.send(descriptor).await,
        }
    }
}
