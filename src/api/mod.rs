//! HTTP layer exposing content analysis and translation.

pub mod routes;
pub mod types;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{
    config::Settings,
    llm::ChatModel,
    nlp::{content::ContentAnalyzer, translate::Translator},
};

#[derive(Clone)]
pub struct AppState {
    pub model_name: String,
    pub analyzer: Arc<ContentAnalyzer>,
    pub translator: Arc<Translator>,
}

impl AppState {
    pub fn new(model: Arc<dyn ChatModel>) -> crate::error::Result<Self> {
        Ok(Self {
            model_name: model.name().to_string(),
            analyzer: Arc::new(ContentAnalyzer::new(model.clone())?),
            translator: Arc::new(Translator::new(model)?),
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/analyze", post(routes::analyze))
        .route("/translate", post(routes::translate))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(settings: Settings, host: String, port: u16) -> Result<()> {
    let state = AppState::new(settings.chat_model()?)?;
    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    info!(%addr, model = %state.model_name, "serving textlens API");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router(state).into_make_service()).await?;
    Ok(())
}
