//! Error taxonomy shared by the analysis pipeline.

use thiserror::Error;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, AnalyticsError>;

/// Failures raised by preprocessing, model invocation and output handling.
#[derive(Error, Debug)]
pub enum AnalyticsError {
    /// Model response was not JSON or did not satisfy the expected schema.
    #[error("schema violation: {0}")]
    SchemaViolation(String),

    /// Caller input rejected before any model call was made.
    #[error("invalid input: {0}")]
    Validation(String),

    /// Prompt template could not be rendered.
    #[error("template error: {0}")]
    Template(String),

    /// Model endpoint answered with an error or an empty completion.
    #[error("model error: {0}")]
    Model(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("dataframe error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}

impl AnalyticsError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn schema(msg: impl Into<String>) -> Self {
        Self::SchemaViolation(msg.into())
    }

    /// True when the failure came from bad caller input rather than the model.
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Template(_))
    }
}
