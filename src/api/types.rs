//! Request and response bodies for the JSON API.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct HealthDto {
    pub status: &'static str,
    pub model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeRequest {
    pub text: String,
    /// Question or situation the reply was given in.
    pub context: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranslateRequest {
    pub text: String,
    pub topic: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TranslationDto {
    pub translated_text: String,
    /// True when the text was already Chinese and no model call was made.
    pub skipped: bool,
}
