//! CLI entry-point for translation into Chinese.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use tracing::{info, instrument, warn};

use crate::{
    cli::{output_path, CHECKPOINT_EVERY},
    config::Settings,
    data::{Checkpoint, OutputFormat, Table},
    llm::Session,
    nlp::{assemble, translate::Translator},
};

const CHECKPOINT_STAGE: &str = "translation_results";

/// Args for the `translate` command.
#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    /// Single text to translate; the translation is printed to stdout.
    #[arg(long, conflicts_with_all = ["input", "column"])]
    pub text: Option<String>,
    /// CSV file with one text per row.
    #[arg(long, requires = "column")]
    pub input: Option<PathBuf>,
    /// Column holding the text to translate.
    #[arg(long)]
    pub column: Option<String>,
    /// What the texts are about; steers terminology.
    #[arg(long)]
    pub topic: String,
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
        let translator = Translator::new(settings.chat_model()?)?;
        let record = translator.translate(text, &args.topic, &session).await?;
        if record.language_detected_as_target {
            info!("text is already Chinese, returned unchanged");
        }
        println!("{}", record.target_text);
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
    assemble::ensure_columns_free(&table, &[assemble::TRANSLATION_COLUMN])?;

    let translator = Translator::new(settings.chat_model()?)?;
    let max_concurrency = args.max_concurrency.unwrap_or(settings.max_concurrency);
    let checkpoint = Checkpoint::new(settings.temp_dir(), CHECKPOINT_STAGE, "", session.id());
    info!(rows = texts.len(), %session, max_concurrency, "translating texts");

    let mut translations: Vec<Option<String>> = Vec::with_capacity(texts.len());
    for chunk in texts.chunks(CHECKPOINT_EVERY) {
        let translated = translator
            .translate_best_effort(chunk, &args.topic, &session, max_concurrency)
            .await;
        translations.extend(translated.into_iter().map(Some));

        let mut padded = translations.clone();
        padded.resize(texts.len(), None);
        let snapshot = assemble::append_translations(&table, padded)?;
        if let Err(err) = checkpoint.write(&snapshot) {
            warn!(path = %checkpoint.path().display(), error = %err, "checkpoint write failed");
        }
        info!(done = translations.len(), total = texts.len(), "translation progress");
    }

    let result = assemble::append_translations(&table, translations)?;
    let path = output_path(&settings, args.output, "translate", &session, args.format);
    result.save(&path, args.format)?;
    info!(path = %path.display(), rows = result.len(), "translations written");
    Ok(())
}
