//! Validity, sentiment and sensitive-information judgement of single replies.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    error::Result,
    llm::{prompts, ChatModel, PromptInputs, Session, StructuredChain},
    nlp::bounded_map,
};

const FEATURE: &str = "content_analysis";

/// Whether a reply says anything substantive. Unrelated to the row filter
/// applied during preprocessing: invalid replies are flagged, not removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Validity {
    Valid,
    Invalid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Sensitivity {
    Yes,
    No,
}

/// Model judgement for one reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ContentAnalysis {
    /// "valid" or "invalid".
    pub validity: Validity,
    /// "positive", "neutral" or "negative".
    pub sentiment_class: Sentiment,
    /// "yes" if the reply names people or departments or reports management problems.
    pub sensitive_info: Sensitivity,
}

impl Validity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Invalid => "invalid",
        }
    }
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
        }
    }
}

impl Sensitivity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
        }
    }
}

pub struct ContentAnalyzer {
    chain: StructuredChain<ContentAnalysis>,
}

impl ContentAnalyzer {
    pub fn new(model: Arc<dyn ChatModel>) -> Result<Self> {
        Ok(Self {
            chain: StructuredChain::build(
                prompts::CONTENT_ANALYSIS_SYSTEM,
                prompts::CONTENT_ANALYSIS_USER,
                model,
            )?,
        })
    }

    pub async fn analyze(
        &self,
        text: &str,
        context: &str,
        session: &Session,
    ) -> Result<ContentAnalysis> {
        let inputs = PromptInputs::new()
            .with("text", text)
            .with("context", context);
        self.chain
            .invoke(&inputs, &session.trace(FEATURE, "content_analysis"))
            .await
    }

    /// Analyse independently with bounded concurrency; one `Result` per
    /// input, in input order.
    #[instrument(skip_all, fields(session = %session, texts = texts.len()))]
    pub async fn analyze_batch(
        &self,
        texts: &[String],
        context: &str,
        session: &Session,
        max_concurrency: usize,
    ) -> Vec<Result<ContentAnalysis>> {
        bounded_map(texts.iter().collect::<Vec<_>>(), max_concurrency, |text| {
            self.analyze(text, context, session)
        })
        .await
    }
}
