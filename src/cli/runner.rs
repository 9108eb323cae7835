//! CLI runner - executes commands

use crate::auth::EnvCredentialProvider;
use crate::cli::commands::{Cli, Commands, IssueArgs};
use crate::config::Settings;
use crate::error::Result;
use crate::jira::{IssueSearch, JiraClient};
use serde_json::Value;
use std::io::{BufWriter, Write};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command and print its records to stdout
    pub async fn run(&self) -> Result<()> {
        let settings = self.settings()?;
        let credentials = Arc::new(EnvCredentialProvider::from_env()?);

        let cancel = CancellationToken::new();
        let client = JiraClient::from_settings(&settings, credentials)?.with_cancel(cancel.clone());

        let interrupt = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupted, cancelling in-flight requests");
                cancel.cancel();
            }
        });

        let result = self.execute(&client, &settings).await;
        interrupt.abort();
        client.close();

        let records = result?;
        let written = write_records(&records, std::io::stdout().lock())?;
        debug!(records = written, "output written");
        Ok(())
    }

    /// Settings from the file and environment, with command-line overrides applied
    pub fn settings(&self) -> Result<Settings> {
        let mut settings = Settings::load(self.cli.settings.as_deref())?;

        match &self.cli.command {
            Commands::Issues { issues, .. } => {
                if let Some(size) = issues.page_size {
                    settings.issue_page_size = size;
                }
            }
            Commands::Projects { page_size } => {
                if let Some(size) = page_size {
                    settings.project_page_size = *size;
                }
            }
            Commands::ProjectIssues {
                concurrency,
                issues,
                ..
            } => {
                if let Some(size) = issues.page_size {
                    settings.issue_page_size = size;
                }
                if let Some(concurrency) = concurrency {
                    settings.fan_out_concurrency = *concurrency;
                }
            }
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Run the command against a client and collect its records
    pub async fn execute(&self, client: &JiraClient, settings: &Settings) -> Result<Vec<Value>> {
        match &self.cli.command {
            Commands::Issues { jql, issues } => {
                client
                    .search_issues(&issue_search(jql, issues, settings))
                    .await
            }
            Commands::Projects { .. } => client.list_projects().await,
            Commands::ProjectIssues {
                jql_suffix, issues, ..
            } => {
                client
                    .project_issues(&issue_search(jql_suffix, issues, settings))
                    .await
            }
        }
    }
}

fn issue_search(jql: &str, args: &IssueArgs, settings: &Settings) -> IssueSearch {
    IssueSearch::new(jql)
        .fields(args.fields.iter().map(|f| f.trim()).filter(|f| !f.is_empty()))
        .page_size(settings.issue_page_size)
}

/// Write records as JSON lines; returns the number written
pub fn write_records<W: Write>(records: &[Value], writer: W) -> Result<usize> {
    let mut writer = BufWriter::new(writer);
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::Paginator;
    use crate::test_support::{dispatcher_for, fast_retry};
    use clap::Parser;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::io::Write as _;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn runner(args: &[&str]) -> Runner {
        let mut argv = vec!["jira-walk"];
        argv.extend_from_slice(args);
        Runner::new(Cli::try_parse_from(argv).unwrap())
    }

    #[test]
    fn test_parse_issue_defaults() {
        let cli = Cli::try_parse_from(["jira-walk", "issues"]).unwrap();
        match cli.command {
            Commands::Issues { jql, issues } => {
                assert_eq!(jql, "ORDER BY created DESC");
                assert_eq!(issues.fields, vec!["summary", "description", "status"]);
                assert_eq!(issues.page_size, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(!cli.verbose);
    }

    #[test]
    fn test_parse_project_issues() {
        let cli = Cli::try_parse_from([
            "jira-walk",
            "project-issues",
            "--jql-suffix",
            "status = Done",
            "--fields",
            "summary,labels",
            "--concurrency",
            "2",
            "-v",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::ProjectIssues {
                jql_suffix,
                concurrency,
                issues,
            } => {
                assert_eq!(jql_suffix, "status = Done");
                assert_eq!(concurrency, Some(2));
                assert_eq!(issues.fields, vec!["summary", "labels"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_subcommand_rejected() {
        assert!(Cli::try_parse_from(["jira-walk", "boards"]).is_err());
    }

    #[test]
    fn test_settings_file_then_flags() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "project_page_size: 20\npool_size: 3").unwrap();
        let settings_path = file.path().to_string_lossy().to_string();

        let settings = runner(&["--settings", &settings_path, "projects", "--page-size", "5"])
            .settings()
            .unwrap();

        assert_eq!(settings.pool_size, 3);
        assert_eq!(settings.project_page_size, 5);
    }

    #[test]
    fn test_zero_page_size_flag_rejected() {
        let err = runner(&["issues", "--page-size", "0"]).settings().unwrap_err();
        assert!(err.is_configuration());
    }

    #[tokio::test]
    async fn test_execute_issues() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/3/search/jql"))
            .and(query_param("jql", "project = OPS"))
            .and(query_param("fields", "summary"))
            .and(query_param("maxResults", "10"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"issues": [{"key": "OPS-1"}]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let runner = runner(&[
            "issues",
            "--jql",
            "project = OPS",
            "--fields",
            "summary",
            "--page-size",
            "10",
        ]);
        let settings = runner.settings().unwrap();
        let client = JiraClient::new(Paginator::new(dispatcher_for(&server, fast_retry(1))));

        let records = runner.execute(&client, &settings).await.unwrap();
        assert_eq!(records, vec![json!({"key": "OPS-1"})]);
    }

    #[test]
    fn test_write_records_as_json_lines() {
        let mut out = Vec::new();
        let written = write_records(&[json!({"key": "A-1"}), json!({"key": "A-2"})], &mut out).unwrap();

        assert_eq!(written, 2);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "{\"key\":\"A-1\"}\n{\"key\":\"A-2\"}\n"
        );
    }
}
