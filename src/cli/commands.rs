//! CLI commands and argument parsing

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Walk Jira collections and print one JSON record per line
#[derive(Parser, Debug)]
#[command(name = "jira-walk")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Settings file (YAML)
    #[arg(short, long, global = true)]
    pub settings: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search issues with JQL
    Issues {
        /// JQL filter
        #[arg(long, default_value = "ORDER BY created DESC")]
        jql: String,

        #[command(flatten)]
        issues: IssueArgs,
    },

    /// List every project
    Projects {
        /// Projects per page
        #[arg(long)]
        page_size: Option<u32>,
    },

    /// Walk the issues of every project
    ProjectIssues {
        /// JQL appended to the per-project clause
        #[arg(long, default_value = "ORDER BY created DESC")]
        jql_suffix: String,

        /// Projects walked at once
        #[arg(long)]
        concurrency: Option<usize>,

        #[command(flatten)]
        issues: IssueArgs,
    },
}

/// Issue search options shared by the issue commands
#[derive(Args, Debug, Clone)]
pub struct IssueArgs {
    /// Issue fields (comma-separated, empty = server default)
    #[arg(
        long,
        value_delimiter = ',',
        default_value = "summary,description,status"
    )]
    pub fields: Vec<String>,

    /// Issues per page
    #[arg(long)]
    pub page_size: Option<u32>,
}
