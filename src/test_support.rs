//! Shared fixtures for unit tests

use crate::auth::{Credentials, StaticCredentialProvider};
use crate::dispatch::Dispatcher;
use crate::http::{RetryPolicy, Transport, TransportConfig};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use wiremock::MockServer;

pub const TEST_EMAIL: &str = "me@corp.io";
pub const TEST_TOKEN: &str = "s3cr3t-token";

/// Retry quickly so failing scenarios stay fast
pub fn fast_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::default()
        .max_attempts(max_attempts)
        .backoff(Duration::from_millis(5), Duration::from_millis(50))
}

/// Dispatcher whose `jira` target points at the mock server
pub fn dispatcher_for(server: &MockServer, policy: RetryPolicy) -> Dispatcher {
    let transport = Transport::new(TransportConfig::builder().retry(policy).build()).unwrap();
    let credentials = StaticCredentialProvider::new().with_target(
        "jira",
        Credentials::basic(Url::parse(&server.uri()).unwrap(), TEST_EMAIL, TEST_TOKEN),
    );
    Dispatcher::new(Arc::new(transport), Arc::new(credentials))
}

/// In-memory log sink for asserting on formatted tracing output
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Install a subscriber for the current thread that writes here
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    /// Everything written so far
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedLogs {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
