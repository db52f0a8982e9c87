//! End-to-end topic clustering: preprocess, discover categories, classify.

use std::{path::Path, sync::Arc};

use tracing::{info, instrument};

use crate::{
    data::{batch, preprocess, Checkpoint, Preprocessed, Table},
    error::{AnalyticsError, Result},
    llm::{ChatModel, Session},
    nlp::{
        assemble,
        categories::{CategoryGenerator, CategoryParams, CategorySet},
        classify::{self, BatchClassifier, BatchOutcome, LabelMode},
    },
};

pub const DEFAULT_BATCH_SIZE: usize = 100;
pub const DEFAULT_CLASSIFY_BATCH_SIZE: usize = 20;

#[derive(Debug, Clone)]
pub struct ClusteringParams {
    pub categories: CategoryParams,
    /// Texts per category-generation call.
    pub batch_size: usize,
    /// Rows per classification table.
    pub classify_batch_size: usize,
    pub mode: LabelMode,
}

impl ClusteringParams {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            categories: CategoryParams {
                topic: topic.into(),
                initial_count: 10,
                min_categories: 5,
                max_categories: 15,
                requirements: None,
            },
            batch_size: DEFAULT_BATCH_SIZE,
            classify_batch_size: DEFAULT_CLASSIFY_BATCH_SIZE,
            mode: LabelMode::Single,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 || self.classify_batch_size == 0 {
            return Err(AnalyticsError::validation("batch sizes must be positive"));
        }
        self.categories.validate()
    }
}

/// Categories discovered for a table, with the preprocessed rows they came from.
#[derive(Debug, Clone)]
pub struct Discovery {
    pub categories: CategorySet,
    pub preprocessed: Preprocessed,
}

/// Labeled table plus the raw batch outcome for failure inspection.
#[derive(Debug, Clone)]
pub struct Classified {
    pub table: Table,
    pub outcome: BatchOutcome,
}

/// Preprocess `table`, propose categories per text batch and merge them.
#[instrument(skip_all, fields(session = %session, rows = table.len()))]
pub async fn discover_categories(
    model: Arc<dyn ChatModel>,
    table: &Table,
    text_column: &str,
    params: &ClusteringParams,
    session: &Session,
) -> Result<Discovery> {
    params.validate()?;
    // Category names are unknown until the merge, so only the single-label
    // column can be checked this early.
    assemble::ensure_columns_free(
        table,
        &assemble::classification_columns(&CategorySet::default(), params.mode),
    )?;
    let preprocessed = preprocess(table, text_column)?;
    if preprocessed.records.is_empty() {
        return Err(AnalyticsError::validation(
            "no valid texts remain after preprocessing",
        ));
    }

    let texts: Vec<&str> = preprocessed
        .records
        .iter()
        .map(|r| r.cleaned_text.as_str())
        .collect();
    let batches = batch::text_batches(&texts, params.batch_size)?;
    info!(texts = texts.len(), batches = batches.len(), "generating categories");

    let generator = CategoryGenerator::new(model)?;
    let proposals = generator
        .propose(&batches, &params.categories, session)
        .await?;
    let categories = generator
        .merge(&proposals, &params.categories, session)
        .await?;

    Ok(Discovery {
        categories,
        preprocessed,
    })
}

/// Classify preprocessed rows against `categories` and join the labels back.
///
/// When `checkpoint_dir` is set, cumulative records are written there after
/// every batch.
#[instrument(skip_all, fields(session = %session, rows = preprocessed.records.len()))]
pub async fn classify_table(
    model: Arc<dyn ChatModel>,
    preprocessed: &Preprocessed,
    text_column: &str,
    categories: &CategorySet,
    params: &ClusteringParams,
    session: &Session,
    checkpoint_dir: Option<&Path>,
) -> Result<Classified> {
    params.validate()?;
    categories.validate()?;
    assemble::ensure_columns_free(
        &preprocessed.table,
        &assemble::classification_columns(categories, params.mode),
    )?;

    let tables = batch::record_tables(
        &preprocessed.records,
        text_column,
        params.classify_batch_size,
    )?;
    let mut classifier = BatchClassifier::new(model, params.mode)?;
    if let Some(dir) = checkpoint_dir {
        classifier = classifier.with_checkpoint(Checkpoint::new(
            dir,
            classify::CHECKPOINT_STAGE,
            classify::CHECKPOINT_ENTITY,
            session.id(),
        ));
    }

    let outcome = classifier
        .classify(&tables, categories, &params.categories.topic, session)
        .await?;
    let table = assemble::join_classifications(
        &preprocessed.table,
        preprocess::ID_COLUMN,
        &outcome.records,
        params.mode,
    )?;
    Ok(Classified { table, outcome })
}
