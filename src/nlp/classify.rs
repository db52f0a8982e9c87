//! Batch classification of Markdown-table batches against a fixed category set.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::{
    data::{Checkpoint, Table},
    error::Result,
    llm::{prompts, ChatModel, PromptInputs, Session, StructuredChain, TraceContext},
    nlp::categories::CategorySet,
};

const FEATURE: &str = "text_clustering";

/// Checkpoint stage name for classification snapshots.
pub const CHECKPOINT_STAGE: &str = "classify_texts";
/// Checkpoint entity name for classification snapshots.
pub const CHECKPOINT_ENTITY: &str = "text_classification";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelMode {
    /// Exactly one category per text.
    #[default]
    Single,
    /// Zero or more categories per text.
    Multi,
}

/// Category assignment of one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Labels {
    Single(String),
    Multi(Vec<String>),
}

impl Labels {
    pub fn names(&self) -> Vec<&str> {
        match self {
            Self::Single(name) => vec![name.as_str()],
            Self::Multi(names) => names.iter().map(String::as_str).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationRecord {
    /// Row identifier assigned during preprocessing.
    pub id: String,
    pub labels: Labels,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct SingleLabelResponse {
    classifications: Vec<SingleLabelItem>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct SingleLabelItem {
    /// Row identifier copied from the table.
    id: String,
    /// Name of the single best-fitting category.
    category: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct MultiLabelResponse {
    classifications: Vec<MultiLabelItem>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct MultiLabelItem {
    /// Row identifier copied from the table.
    id: String,
    /// Names of every category that applies.
    categories: Vec<String>,
}

/// A batch whose model call or parse failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    /// Zero-based position of the batch in the input.
    pub batch_index: usize,
    pub error: String,
}

/// Accumulated records of the successful batches plus the failed ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub records: Vec<ClassificationRecord>,
    pub failures: Vec<BatchFailure>,
}

impl BatchOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

enum ModeChain {
    Single(StructuredChain<SingleLabelResponse>),
    Multi(StructuredChain<MultiLabelResponse>),
}

pub struct BatchClassifier {
    chain: ModeChain,
    mode: LabelMode,
    checkpoint: Option<Checkpoint>,
}

impl BatchClassifier {
    pub fn new(model: Arc<dyn ChatModel>, mode: LabelMode) -> Result<Self> {
        let chain = match mode {
            LabelMode::Single => ModeChain::Single(StructuredChain::build(
                prompts::SINGLE_LABEL_CLASSIFICATION_SYSTEM,
                prompts::CLASSIFICATION_USER,
                model,
            )?),
            LabelMode::Multi => ModeChain::Multi(StructuredChain::build(
                prompts::MULTI_LABEL_CLASSIFICATION_SYSTEM,
                prompts::CLASSIFICATION_USER,
                model,
            )?),
        };
        Ok(Self {
            chain,
            mode,
            checkpoint: None,
        })
    }

    /// Snapshot cumulative records to `checkpoint` after every batch.
    pub fn with_checkpoint(mut self, checkpoint: Checkpoint) -> Self {
        self.checkpoint = Some(checkpoint);
        self
    }

    pub fn mode(&self) -> LabelMode {
        self.mode
    }

    /// Classify each table in order. A failed batch is recorded in
    /// [`BatchOutcome::failures`] and contributes no records; the run goes on.
    #[instrument(skip_all, fields(session = %session, batches = tables.len(), mode = ?self.mode))]
    pub async fn classify(
        &self,
        tables: &[String],
        categories: &CategorySet,
        topic: &str,
        session: &Session,
    ) -> Result<BatchOutcome> {
        let trace = session.trace(FEATURE, "classify_texts");
        let categories_json = serde_json::to_string_pretty(&categories.categories)?;
        let mut outcome = BatchOutcome::default();

        for (batch_index, table) in tables.iter().enumerate() {
            let inputs = PromptInputs::new()
                .with("text_topic", topic)
                .with("categories", &categories_json)
                .with("text_table", table);
            match self.classify_table(&inputs, &trace).await {
                Ok(records) => {
                    info!(batch = batch_index + 1, records = records.len(), "batch classified");
                    outcome.records.extend(records);
                }
                Err(err) => {
                    warn!(
                        batch = batch_index + 1,
                        session = %session,
                        error = %err,
                        "batch classification failed"
                    );
                    outcome.failures.push(BatchFailure {
                        batch_index,
                        error: err.to_string(),
                    });
                }
            }

            if let Some(checkpoint) = &self.checkpoint {
                let snapshot = records_table(&outcome.records, self.mode);
                if let Err(err) = snapshot.and_then(|table| checkpoint.write(&table)) {
                    warn!(
                        error = %err,
                        path = %checkpoint.path().display(),
                        "checkpoint write failed"
                    );
                }
            }
        }

        info!(
            records = outcome.records.len(),
            failed_batches = outcome.failures.len(),
            "classification finished"
        );
        Ok(outcome)
    }

    async fn classify_table(
        &self,
        inputs: &PromptInputs,
        trace: &TraceContext,
    ) -> Result<Vec<ClassificationRecord>> {
        let records = match &self.chain {
            ModeChain::Single(chain) => chain
                .invoke(inputs, trace)
                .await?
                .classifications
                .into_iter()
                .map(|item| ClassificationRecord {
                    id: item.id,
                    labels: Labels::Single(item.category),
                })
                .collect(),
            ModeChain::Multi(chain) => chain
                .invoke(inputs, trace)
                .await?
                .classifications
                .into_iter()
                .map(|item| ClassificationRecord {
                    id: item.id,
                    labels: Labels::Multi(item.categories),
                })
                .collect(),
        };
        Ok(records)
    }
}

/// Flatten records into `id, category` or `id, categories` rows; multiple
/// labels are joined with `"; "`.
pub fn records_table(records: &[ClassificationRecord], mode: LabelMode) -> Result<Table> {
    let label_column = match mode {
        LabelMode::Single => "category",
        LabelMode::Multi => "categories",
    };
    let rows = records
        .iter()
        .map(|r| vec![Some(r.id.clone()), Some(r.labels.names().join("; "))])
        .collect();
    Table::from_rows(vec!["id".into(), label_column.into()], rows)
}
