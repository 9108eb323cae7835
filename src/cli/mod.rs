//! CLI module
//!
//! Command-line interface for walking Jira collections.
//!
//! # Commands
//!
//! - `issues` - Search issues with JQL
//! - `projects` - List every project
//! - `project-issues` - Walk the issues of every project

mod commands;
mod runner;

pub use commands::{Cli, Commands, IssueArgs};
pub use runner::Runner;
