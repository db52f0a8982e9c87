//! Context-aware translation into Chinese, skipping texts already in Chinese.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::{
    error::Result,
    llm::{prompts, ChatModel, PromptInputs, Session, StructuredChain},
    nlp::bounded_map,
};

const FEATURE: &str = "translation";

/// Share of CJK ideographs at or above which a text counts as already translated.
pub const CJK_SKIP_RATIO: f64 = 0.5;

/// Prefix of the inline marker left in place of a failed best-effort translation.
pub const ERROR_MARKER: &str = "Translation error: ";

#[derive(Debug, Clone, Deserialize, JsonSchema)]
struct TranslatedText {
    /// Text content translated to Chinese.
    translated_text: String,
}

/// Result of translating one text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRecord {
    pub source_text: String,
    pub target_text: String,
    /// True when the source was already predominantly Chinese and returned as is.
    pub language_detected_as_target: bool,
}

/// Whether at least half of the characters are CJK Unified Ideographs.
pub fn is_predominantly_cjk(text: &str) -> bool {
    let total = text.chars().count();
    if total == 0 {
        return false;
    }
    let cjk = text
        .chars()
        .filter(|c| ('\u{4e00}'..='\u{9fff}').contains(c))
        .count();
    cjk as f64 / total as f64 >= CJK_SKIP_RATIO
}

pub struct Translator {
    chain: StructuredChain<TranslatedText>,
}

impl Translator {
    pub fn new(model: Arc<dyn ChatModel>) -> Result<Self> {
        Ok(Self {
            chain: StructuredChain::build(
                prompts::TRANSLATION_SYSTEM,
                prompts::TRANSLATION_USER,
                model,
            )?,
        })
    }

    /// Translate one text. Errors propagate to the caller.
    pub async fn translate(
        &self,
        text: &str,
        topic: &str,
        session: &Session,
    ) -> Result<TranslationRecord> {
        if is_predominantly_cjk(text) {
            debug!(chars = text.chars().count(), "text already in target language");
            return Ok(TranslationRecord {
                source_text: text.to_string(),
                target_text: text.to_string(),
                language_detected_as_target: true,
            });
        }
        let inputs = PromptInputs::new()
            .with("text_topic", topic)
            .with("text_to_translate", text);
        let translated = self
            .chain
            .invoke(&inputs, &session.trace(FEATURE, "translate"))
            .await?;
        Ok(TranslationRecord {
            source_text: text.to_string(),
            target_text: translated.translated_text,
            language_detected_as_target: false,
        })
    }

    /// Translate independently with at most `max_concurrency` calls in
    /// flight. One `Result` per input, in input order.
    #[instrument(skip_all, fields(session = %session, texts = texts.len()))]
    pub async fn translate_batch(
        &self,
        texts: &[String],
        topic: &str,
        session: &Session,
        max_concurrency: usize,
    ) -> Vec<Result<TranslationRecord>> {
        bounded_map(texts.iter().collect::<Vec<_>>(), max_concurrency, |text| {
            self.translate(text, topic, session)
        })
        .await
    }

    /// Batch translation for table uploads: a failed item becomes an inline
    /// error marker instead of failing the batch.
    pub async fn translate_best_effort(
        &self,
        texts: &[String],
        topic: &str,
        session: &Session,
        max_concurrency: usize,
    ) -> Vec<String> {
        self.translate_batch(texts, topic, session, max_concurrency)
            .await
            .into_iter()
            .enumerate()
            .map(|(idx, result)| match result {
                Ok(record) => record.target_text,
                Err(err) => {
                    warn!(row = idx, error = %err, "translation failed");
                    format!("{ERROR_MARKER}{err}")
                }
            })
            .collect()
    }
}
