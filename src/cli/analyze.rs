//! CLI entry-point for content analysis.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use tracing::{info, instrument, warn};

use crate::{
    cli::output_path,
    config::Settings,
    data::{OutputFormat, Table},
    llm::Session,
    nlp::{assemble, content::ContentAnalyzer},
};

/// Args for the `analyze` command.
#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    /// Single text to analyse; prints the judgement as JSON.
    #[arg(long, conflicts_with_all = ["input", "column"])]
    pub text: Option<String>,
    /// CSV file with one reply per row.
    #[arg(long, requires = "column")]
    pub input: Option<PathBuf>,
    /// Column holding the reply text.
    #[arg(long)]
    pub column: Option<String>,
    /// Context the replies were given in, e.g. the survey question.
    #[arg(long)]
    pub context: String,
    /// Output path; defaults to the outputs directory.
    #[arg(long)]
    pub output: Option<PathBuf>,
    /// Output format: csv or parquet.
    #[arg(long, default_value = "csv")]
    pub format: OutputFormat,
    /// Override the maximum number of concurrent model calls.
    #[arg(long)]
    pub max_concurrency: Option<usize>,
}

#[instrument(skip(settings))]
pub async fn run(args: Args, settings: Settings) -> Result<()> {
    let session = Session::new();

    if let Some(text) = args.text.as_deref() {
        let analyzer = ContentAnalyzer::new(settings.chat_model()?)?;
        let analysis = analyzer.analyze(text, &args.context, &session).await?;
        println!("{}", serde_json::to_string_pretty(&analysis)?);
        return Ok(());
    }

    let input = args.input.context("either --text or --input is required")?;
    let column = args.column.context("--column is required with --input")?;
    let table = Table::read_csv(&input).with_context(|| format!("read {}", input.display()))?;
    let texts: Vec<String> = table
        .column_values(&column)?
        .into_iter()
        .map(|t| t.unwrap_or_default().to_string())
        .collect();
    assemble::ensure_columns_free(&table, &assemble::CONTENT_COLUMNS)?;

    let analyzer = ContentAnalyzer::new(settings.chat_model()?)?;
    let max_concurrency = args.max_concurrency.unwrap_or(settings.max_concurrency);
    info!(rows = texts.len(), %session, max_concurrency, "analysing replies");

    let analyses: Vec<_> = analyzer
        .analyze_batch(&texts, &args.context, &session, max_concurrency)
        .await
        .into_iter()
        .enumerate()
        .map(|(row, result)| {
            result
                .map_err(|err| warn!(row, error = %err, "content analysis failed"))
                .ok()
        })
        .collect();
    let failed = analyses.iter().filter(|a| a.is_none()).count();

    let result = assemble::append_content_analysis(&table, &analyses)?;
    let path = output_path(&settings, args.output, "analyze", &session, args.format);
    result.save(&path, args.format)?;
    info!(path = %path.display(), rows = result.len(), failed, "content analysis written");
    Ok(())
}
