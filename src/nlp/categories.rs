//! Category proposal per text batch and consolidation into one set.

use std::{path::Path, sync::Arc};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::{
    error::{AnalyticsError, Result},
    llm::{prompts, ChatModel, PromptInputs, Session, StructuredChain},
};

const FEATURE: &str = "text_clustering";

/// A named topical bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Category {
    /// Short category name.
    pub name: String,
    /// One-sentence description of what belongs in the category.
    pub description: String,
}

/// Ordered list of categories, as proposed or merged by the model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CategorySet {
    pub categories: Vec<Category>,
}

impl CategorySet {
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.name.as_str())
    }

    /// Load a caller-edited set from `{"categories": [{"name", "description"}]}`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let set: Self = serde_json::from_str(&raw)?;
        set.validate()?;
        Ok(set)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!(path = %path.display(), categories = self.len(), "saved categories");
        Ok(())
    }

    /// A usable set has at least one category and no blank names.
    pub fn validate(&self) -> Result<()> {
        if self.categories.is_empty() {
            return Err(AnalyticsError::validation("category set is empty"));
        }
        if self.categories.iter().any(|c| c.name.trim().is_empty()) {
            return Err(AnalyticsError::validation("category names must not be blank"));
        }
        Ok(())
    }
}

/// Knobs shared by the generation and merge steps.
#[derive(Debug, Clone)]
pub struct CategoryParams {
    pub topic: String,
    pub initial_count: usize,
    pub min_categories: usize,
    pub max_categories: usize,
    pub requirements: Option<String>,
}

impl CategoryParams {
    pub fn validate(&self) -> Result<()> {
        if self.initial_count == 0 {
            return Err(AnalyticsError::validation("initial category count must be positive"));
        }
        if self.min_categories == 0 || self.min_categories > self.max_categories {
            return Err(AnalyticsError::validation(format!(
                "category bounds [{}, {}] are not a valid range",
                self.min_categories, self.max_categories
            )));
        }
        Ok(())
    }

    fn requirements(&self) -> &str {
        self.requirements.as_deref().unwrap_or("")
    }
}

/// Generation and merge chains over one model.
pub struct CategoryGenerator {
    propose: StructuredChain<CategorySet>,
    merge: StructuredChain<CategorySet>,
}

impl CategoryGenerator {
    pub fn new(model: Arc<dyn ChatModel>) -> Result<Self> {
        Ok(Self {
            propose: StructuredChain::build(
                prompts::INITIAL_CATEGORIES_SYSTEM,
                prompts::INITIAL_CATEGORIES_USER,
                model.clone(),
            )?,
            merge: StructuredChain::build(
                prompts::MERGE_CATEGORIES_SYSTEM,
                prompts::MERGE_CATEGORIES_USER,
                model,
            )?,
        })
    }

    /// One proposal per text batch, sequentially. Proposals are not
    /// deduplicated here.
    #[instrument(skip_all, fields(session = %session, batches = batches.len()))]
    pub async fn propose(
        &self,
        batches: &[String],
        params: &CategoryParams,
        session: &Session,
    ) -> Result<Vec<CategorySet>> {
        let trace = session.trace(FEATURE, "initial_categories");
        let mut proposals = Vec::with_capacity(batches.len());
        for (idx, batch) in batches.iter().enumerate() {
            let inputs = PromptInputs::new()
                .with("text_topic", &params.topic)
                .with("text_content", batch)
                .with("category_count", params.initial_count)
                .with("additional_requirements", params.requirements());
            let proposal = self.propose.invoke(&inputs, &trace).await?;
            info!(batch = idx + 1, categories = proposal.len(), "categories proposed");
            proposals.push(proposal);
        }
        Ok(proposals)
    }

    /// Consolidate all proposals with a single model call.
    ///
    /// The bounds are passed to the model but not enforced afterwards; a set
    /// outside them is logged and returned as is.
    #[instrument(skip_all, fields(session = %session, proposals = proposals.len()))]
    pub async fn merge(
        &self,
        proposals: &[CategorySet],
        params: &CategoryParams,
        session: &Session,
    ) -> Result<CategorySet> {
        let inputs = PromptInputs::new()
            .with("text_topic", &params.topic)
            .with("classification_results", serde_json::to_string_pretty(proposals)?)
            .with("min_categories", params.min_categories)
            .with("max_categories", params.max_categories)
            .with("additional_requirements", params.requirements());
        let merged = self
            .merge
            .invoke(&inputs, &session.trace(FEATURE, "merge_categories"))
            .await?;

        if merged.len() < params.min_categories || merged.len() > params.max_categories {
            warn!(
                count = merged.len(),
                min = params.min_categories,
                max = params.max_categories,
                "merged category count outside requested bounds"
            );
        }
        info!(categories = merged.len(), "categories merged");
        Ok(merged)
    }
}
