//! Integration tests using mock HTTP server
//!
//! Tests the full end-to-end flow: settings → transport → dispatcher →
//! paginator → Jira client, against a wiremock Jira.

use jira_walk::auth::{Credentials, EnvCredentialProvider, StaticCredentialProvider};
use jira_walk::config::Settings;
use jira_walk::error::Error;
use jira_walk::jira::{IssueSearch, JiraClient};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const EMAIL: &str = "walker@corp.io";
const TOKEN: &str = "ATATT-very-secret";

fn settings() -> Settings {
    Settings {
        pool_size: 4,
        max_attempts: 3,
        backoff_factor_ms: 10,
        max_backoff_seconds: 1,
        min_interval_ms: 0,
        ..Settings::default()
    }
}

fn client_for(server: &MockServer, settings: &Settings) -> JiraClient {
    let credentials = StaticCredentialProvider::new().with_target(
        "jira",
        Credentials::basic(Url::parse(&server.uri()).unwrap(), EMAIL, TOKEN),
    );
    JiraClient::from_settings(settings, Arc::new(credentials)).unwrap()
}

async fn mount_projects(server: &MockServer, keys: &[&str]) {
    let values: Vec<Value> = keys.iter().map(|k| json!({"key": k})).collect();
    Mock::given(method("GET"))
        .and(path("/rest/api/3/project/search"))
        .and(query_param("startAt", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"values": values})))
        .mount(server)
        .await;
}

// ============================================================================
// Log capture
// ============================================================================

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for Captured {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

// ============================================================================
// End-to-end walks
// ============================================================================

#[tokio::test]
async fn test_issue_search_survives_rate_limit_without_leaking_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/api/3/search/jql"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/api/3/search/jql"))
        .and(query_param("jql", "ORDER BY created DESC"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "issues": [{"key": "OPS-1"}, {"key": "OPS-2"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let logs = Captured::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let client = client_for(&server, &settings());
    let issues = client.search_issues(&IssueSearch::default()).await.unwrap();

    assert_eq!(issues.len(), 2);
    assert_eq!(client.transport().stats().retries, 1);

    let output = String::from_utf8_lossy(&logs.0.lock()).into_owned();
    assert!(output.contains("/rest/api/3/search/jql"));
    assert!(!output.contains(TOKEN));
    assert!(!output.contains(&jira_walk::auth::basic_auth_header(EMAIL, TOKEN)));
}

#[tokio::test]
async fn test_project_issue_fan_out_stays_under_pool_ceiling() {
    let server = MockServer::start().await;
    mount_projects(&server, &["A", "B", "C", "D"]).await;

    for key in ["A", "B", "C", "D"] {
        Mock::given(method("GET"))
            .and(path("/rest/api/3/search/jql"))
            .and(query_param("jql", format!("project = {key} ORDER BY created DESC")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"issues": [{"key": format!("{key}-1")}]}))
                    .set_delay(Duration::from_millis(200)),
            )
            .expect(1)
            .mount(&server)
            .await;
    }

    let settings = Settings {
        pool_size: 2,
        fan_out_concurrency: 4,
        ..settings()
    };
    let client = client_for(&server, &settings);

    let started = Instant::now();
    let issues = client
        .project_issues(&IssueSearch::default())
        .await
        .unwrap();
    let elapsed = started.elapsed();

    let keys: Vec<&str> = issues.iter().filter_map(|i| i["key"].as_str()).collect();
    assert_eq!(keys, vec!["A-1", "B-1", "C-1", "D-1"]);

    let stats = client.transport().stats();
    assert!(stats.peak_in_flight <= 2, "peak was {}", stats.peak_in_flight);
    assert!(elapsed >= Duration::from_millis(390), "took {elapsed:?}");
}

#[tokio::test]
async fn test_failed_child_walk_names_the_project() {
    let server = MockServer::start().await;
    mount_projects(&server, &["A", "B"]).await;

    Mock::given(method("GET"))
        .and(path("/rest/api/3/search/jql"))
        .and(query_param("jql", "project = A ORDER BY created DESC"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"issues": [{"key": "A-1"}]})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/api/3/search/jql"))
        .and(query_param("jql", "project = B ORDER BY created DESC"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"errorMessages": ["No project B"]})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server, &settings());
    let err = client
        .project_issues(&IssueSearch::default())
        .await
        .unwrap_err();

    assert!(matches!(&err, Error::FanOut { parent, .. } if parent == "B"));
    assert_eq!(err.failed_page(), Some(1));
    assert!(err.to_string().contains("No project B"), "{err}");
}

#[tokio::test]
async fn test_pacing_spaces_consecutive_pages() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/api/3/project/search"))
        .and(query_param("startAt", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [{"key": "A"}, {"key": "B"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/api/3/project/search"))
        .and(query_param("startAt", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"values": []})))
        .mount(&server)
        .await;

    let settings = Settings {
        min_interval_ms: 200,
        project_page_size: 2,
        ..settings()
    };
    let client = client_for(&server, &settings);

    let started = Instant::now();
    let projects = client.list_projects().await.unwrap();

    assert_eq!(projects.len(), 2);
    assert!(started.elapsed() >= Duration::from_millis(190));
}

// ============================================================================
// Startup failures
// ============================================================================

#[test]
fn test_missing_credentials_fail_at_startup() {
    let err = EnvCredentialProvider::from_lookup(|key| match key {
        "JIRA_BASE_URL" => Some("https://corp.atlassian.net".to_string()),
        "JIRA_EMAIL" => Some(EMAIL.to_string()),
        _ => None,
    })
    .unwrap_err();

    assert!(matches!(err, Error::MissingConfigField { ref field } if field == "JIRA_API_TOKEN"));
}

#[test]
fn test_settings_file_drives_transport() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "pool_size: 3\nmin_interval_ms: 250\nmax_attempts: 2").unwrap();

    let settings = Settings::from_file(file.path()).unwrap();
    let config = settings.transport_config();

    assert_eq!(config.pool_size, 3);
    assert_eq!(config.min_interval, Some(Duration::from_millis(250)));
    assert_eq!(config.retry.max_attempts, 2);
}
