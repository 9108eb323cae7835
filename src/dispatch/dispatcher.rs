//! Request dispatcher
//!
//! Validates a [`RequestDescriptor`], resolves its target, shapes the call
//! for the transport and logs one line per call. Retries live in the
//! transport; the dispatcher returns whatever outcome the transport produced.

use super::types::RequestDescriptor;
use crate::auth::{CredentialProvider, Credentials};
use crate::error::{Error, Result};
use crate::http::{Payload, ResponseOutcome, Transport, TransportRequest};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use url::Url;

/// Stateless front door to the transport
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<Transport>,
    credentials: Arc<dyn CredentialProvider>,
}

impl Dispatcher {
    /// Create a dispatcher over a shared transport
    pub fn new(transport: Arc<Transport>, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            transport,
            credentials,
        }
    }

    /// The shared transport
    pub fn transport(&self) -> &Arc<Transport> {
        &self.transport
    }

    /// Validate, resolve and shape a descriptor without sending it
    pub fn prepare(&self, descriptor: &RequestDescriptor) -> Result<TransportRequest> {
        descriptor.validate()?;
        let credentials = self.credentials.resolve(&descriptor.target)?;
        shape(descriptor, &credentials)
    }

    /// Send a descriptor and return the transport's outcome
    ///
    /// `Err` is reserved for validation failures, unknown targets and a
    /// closed transport. HTTP failures and network errors are outcomes.
    pub async fn send(&self, descriptor: &RequestDescriptor) -> Result<ResponseOutcome> {
        self.send_inner(descriptor, None).await
    }

    /// Like [`send`](Self::send), abandoning the call when `cancel` fires
    pub async fn send_with_cancel(
        &self,
        descriptor: &RequestDescriptor,
        cancel: &CancellationToken,
    ) -> Result<ResponseOutcome> {
        self.send_inner(descriptor, Some(cancel)).await
    }

    async fn send_inner(
        &self,
        descriptor: &RequestDescriptor,
        cancel: Option<&CancellationToken>,
    ) -> Result<ResponseOutcome> {
        self.transport.ensure_open()?;
        let request = self.prepare(descriptor)?;

        let outcome = match cancel {
            Some(token) => self.transport.execute_with_cancel(&request, token).await,
            None => self.transport.execute(&request).await,
        };

        if outcome.is_transport_error() && self.transport.is_closed() {
            return Err(Error::TransportClosed);
        }

        log_outcome(descriptor, &outcome);
        Ok(outcome)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}

/// Map a descriptor onto the transport's request shape
fn shape(descriptor: &RequestDescriptor, credentials: &Credentials) -> Result<TransportRequest> {
    let url = join_url(&credentials.base_url, &descriptor.path)?;

    let payload = match (&descriptor.body, descriptor.attachments.is_empty()) {
        (Some(body), _) => Payload::Json(body.clone()),
        (None, false) => Payload::Multipart(descriptor.attachments.clone()),
        (None, true) => Payload::Empty,
    };

    Ok(
        TransportRequest::new(descriptor.target.to_ascii_lowercase(), descriptor.method, url)
            .with_auth(credentials.auth_header())
            .with_query(descriptor.query.clone())
            .with_payload(payload),
    )
}

/// Join a base URL and a path, tolerating slashes on either side
pub(crate) fn join_url(base: &Url, path: &str) -> Result<Url> {
    if path.starts_with("http://") || path.starts_with("https://") {
        return Ok(Url::parse(path)?);
    }
    let base = base.as_str().trim_end_matches('/');
    let path = path.trim_start_matches('/');
    Ok(Url::parse(&format!("{base}/{path}"))?)
}

fn log_outcome(descriptor: &RequestDescriptor, outcome: &ResponseOutcome) {
    match outcome {
        ResponseOutcome::Success { status, .. } | ResponseOutcome::Failure { status, .. } => {
            info!(
                target_name = %descriptor.target,
                path = %descriptor.path,
                method = %descriptor.method,
                status = *status,
                success = outcome.is_success(),
                "request completed"
            );
        }
        ResponseOutcome::TransportError { message } => {
            warn!(
                target_name = %descriptor.target,
                path = %descriptor.path,
                method = %descriptor.method,
                error = %message,
                "request failed before a response was received"
            );
        }
    }
}
