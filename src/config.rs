//! Runtime configuration utilities for textlens.

use std::{
    env,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::Context;
use serde::Deserialize;

use crate::{
    llm::{openai::OpenAiConfig, ChatModel, OpenAiChat},
    nlp::DEFAULT_MAX_CONCURRENCY,
};

/// Application configuration resolved from `.env` and defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// API key for the chat-completions endpoint; only needed once a model is called.
    pub api_key: Option<String>,
    /// Base URL of an OpenAI-compatible API.
    pub base_url: String,
    /// Model identifier sent with every request.
    pub model_name: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Maximum model calls in flight within one batch call.
    pub max_concurrency: usize,
    /// Root folder for checkpoints and other working files.
    pub data_dir: PathBuf,
    /// Root folder for result tables.
    pub outputs_dir: PathBuf,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Settings {
    /// Load configuration from environment with reasonable defaults.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let api_key = env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty());
        let base_url = env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        let model_name =
            env::var("OPENAI_MODEL_NAME").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        let data_dir = env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"));
        let outputs_dir = env::var("OUTPUTS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./outputs"));

        std::fs::create_dir_all(&data_dir).context("creating data dir")?;
        std::fs::create_dir_all(&outputs_dir).context("creating outputs dir")?;

        Ok(Self {
            api_key,
            base_url,
            model_name,
            temperature: env_or("LLM_TEMPERATURE", 0.0),
            timeout_secs: env_or("LLM_TIMEOUT_SECS", 120),
            max_concurrency: env_or("MAX_CONCURRENCY", DEFAULT_MAX_CONCURRENCY).max(1),
            data_dir,
            outputs_dir,
        })
    }

    /// Folder holding per-session checkpoint files.
    pub fn temp_dir(&self) -> PathBuf {
        self.data_dir.join("temp")
    }

    /// Convenience helper for derived output path segments.
    pub fn join_output<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        self.outputs_dir.join(path)
    }

    /// Build the configured chat model.
    pub fn chat_model(&self) -> anyhow::Result<Arc<dyn ChatModel>> {
        let api_key = self
            .api_key
            .clone()
            .context("OPENAI_API_KEY must be set to call the language model")?;
        let model = OpenAiChat::new(OpenAiConfig {
            api_key,
            base_url: self.base_url.clone(),
            model: self.model_name.clone(),
            temperature: self.temperature,
            timeout: Duration::from_secs(self.timeout_secs),
        })?;
        Ok(Arc::new(model))
    }
}
