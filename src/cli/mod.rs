//! Command-line interface wiring for textlens.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::{config::Settings, data::OutputFormat, llm::Session};

pub mod analyze;
pub mod cluster;
pub mod serve;
pub mod translate;

/// Rows processed between checkpoint writes in table commands.
pub(crate) const CHECKPOINT_EVERY: usize = 10;

/// Top-level CLI definition.
#[derive(Debug, Parser)]
#[command(author, version, about = "LLM-backed text analytics toolkit", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Parse CLI arguments from the environment.
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Dispatch the selected sub-command.
    pub async fn dispatch(self, settings: Settings) -> Result<()> {
        match self.command {
            Commands::Analyze(args) => analyze::run(args, settings).await,
            Commands::Cluster(args) => cluster::run(args, settings).await,
            Commands::Translate(args) => translate::run(args, settings).await,
            Commands::Serve(args) => serve::run(args, settings).await,
        }
    }
}

/// Supported sub-commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Judge validity, sentiment and sensitive information of replies.
    Analyze(analyze::Args),
    /// Discover topic categories and label every row with them.
    Cluster(cluster::Args),
    /// Translate texts into Chinese, skipping texts already in Chinese.
    Translate(translate::Args),
    /// Serve the JSON API.
    Serve(serve::Args),
}

/// Explicit `--output` or `<outputs>/<command>_<session>.<ext>`.
pub(crate) fn output_path(
    settings: &Settings,
    explicit: Option<PathBuf>,
    command: &str,
    session: &Session,
    format: OutputFormat,
) -> PathBuf {
    explicit.unwrap_or_else(|| {
        settings.join_output(format!("{command}_{session}.{}", format.extension()))
    })
}
