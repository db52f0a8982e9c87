//! CLI entry-point for category discovery and classification.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use tracing::{info, instrument, warn};

use crate::{
    cli::output_path,
    config::Settings,
    data::{preprocess, OutputFormat, Table},
    llm::Session,
    nlp::{
        categories::CategorySet,
        classify::LabelMode,
        clustering::{self, ClusteringParams, DEFAULT_BATCH_SIZE, DEFAULT_CLASSIFY_BATCH_SIZE},
    },
};

/// Args for the `cluster` command.
#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    /// CSV file with one text per row.
    #[arg(long)]
    pub input: PathBuf,
    /// Column holding the text to cluster.
    #[arg(long)]
    pub column: String,
    /// What the texts are about, e.g. "employee survey comments".
    #[arg(long)]
    pub topic: String,
    /// Categories requested per generation batch.
    #[arg(long, default_value_t = 10)]
    pub initial_categories: usize,
    /// Lower bound for the merged category set.
    #[arg(long, default_value_t = 5)]
    pub min_categories: usize,
    /// Upper bound for the merged category set.
    #[arg(long, default_value_t = 15)]
    pub max_categories: usize,
    /// Texts per category-generation call.
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,
    /// Rows per classification call.
    #[arg(long, default_value_t = DEFAULT_CLASSIFY_BATCH_SIZE)]
    pub classify_batch_size: usize,
    /// Allow several categories per text.
    #[arg(long)]
    pub multi_label: bool,
    /// Extra instructions for category generation.
    #[arg(long)]
    pub requirements: Option<String>,
    /// Skip discovery and classify with categories from this JSON file.
    #[arg(long)]
    pub categories: Option<PathBuf>,
    /// Output path; defaults to the outputs directory.
    #[arg(long)]
    pub output: Option<PathBuf>,
    /// Output format: csv or parquet.
    #[arg(long, default_value = "csv")]
    pub format: OutputFormat,
}

impl Args {
    fn params(&self) -> ClusteringParams {
        let mut params = ClusteringParams::new(self.topic.clone());
        params.categories.initial_count = self.initial_categories;
        params.categories.min_categories = self.min_categories;
        params.categories.max_categories = self.max_categories;
        params.categories.requirements = self.requirements.clone();
        params.batch_size = self.batch_size;
        params.classify_batch_size = self.classify_batch_size;
        params.mode = if self.multi_label {
            LabelMode::Multi
        } else {
            LabelMode::Single
        };
        params
    }
}

#[instrument(skip(settings))]
pub async fn run(args: Args, settings: Settings) -> Result<()> {
    let params = args.params();
    params.validate()?;
    let table = Table::read_csv(&args.input)
        .with_context(|| format!("read {}", args.input.display()))?;
    table.column_index(&args.column)?;

    let supplied = args
        .categories
        .as_ref()
        .map(|path| {
            CategorySet::load(path).with_context(|| format!("load categories {}", path.display()))
        })
        .transpose()?;

    let model = settings.chat_model()?;
    let session = Session::new();
    info!(%session, rows = table.len(), mode = ?params.mode, "clustering texts");

    let (categories, preprocessed) = match supplied {
        Some(categories) => {
            let preprocessed = preprocess(&table, &args.column)?;
            (categories, preprocessed)
        }
        None => {
            let discovery = clustering::discover_categories(
                model.clone(),
                &table,
                &args.column,
                &params,
                &session,
            )
            .await?;
            (discovery.categories, discovery.preprocessed)
        }
    };

    let categories_path = settings.join_output(format!("categories_{session}.json"));
    categories.save(&categories_path)?;
    info!(path = %categories_path.display(), categories = categories.len(), "category set written");

    let temp_dir = settings.temp_dir();
    let classified = clustering::classify_table(
        model,
        &preprocessed,
        &args.column,
        &categories,
        &params,
        &session,
        Some(temp_dir.as_path()),
    )
    .await?;

    for failure in &classified.outcome.failures {
        warn!(batch = failure.batch_index, error = %failure.error, "batch left unlabelled");
    }

    let path = output_path(&settings, args.output, "cluster", &session, args.format);
    classified.table.save(&path, args.format)?;
    info!(
        path = %path.display(),
        rows = classified.table.len(),
        failed_batches = classified.outcome.failures.len(),
        "classification written"
    );
    Ok(())
}
