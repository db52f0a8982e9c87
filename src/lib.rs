//! LLM-backed text analytics: category discovery, classification,
//! translation and content analysis over tabular text data.

pub mod api;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod llm;
pub mod logging;
pub mod nlp;

pub use error::{AnalyticsError, Result};
