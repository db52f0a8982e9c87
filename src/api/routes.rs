//! HTTP route handlers for Axum.

use axum::{extract::State, http::StatusCode, Json};
use tracing::warn;

use crate::{
    api::types::{AnalyzeRequest, HealthDto, TranslateRequest, TranslationDto},
    error::AnalyticsError,
    llm::Session,
    nlp::content::ContentAnalysis,
};

use super::AppState;

type ApiResult<T> = Result<Json<T>, (StatusCode, String)>;

pub async fn health(State(state): State<AppState>) -> Json<HealthDto> {
    Json(HealthDto {
        status: "ok",
        model: state.model_name,
    })
}

pub async fn analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> ApiResult<ContentAnalysis> {
    let session = Session::new();
    state
        .analyzer
        .analyze(&request.text, &request.context, &session)
        .await
        .map(Json)
        .map_err(into_response)
}

pub async fn translate(
    State(state): State<AppState>,
    Json(request): Json<TranslateRequest>,
) -> ApiResult<TranslationDto> {
    let session = Session::new();
    let record = state
        .translator
        .translate(&request.text, &request.topic, &session)
        .await
        .map_err(into_response)?;
    Ok(Json(TranslationDto {
        translated_text: record.target_text,
        skipped: record.language_detected_as_target,
    }))
}

pub(crate) fn status_for(err: &AnalyticsError) -> StatusCode {
    match err {
        AnalyticsError::Validation(_) | AnalyticsError::Template(_) => StatusCode::BAD_REQUEST,
        AnalyticsError::SchemaViolation(_) | AnalyticsError::Model(_) | AnalyticsError::Http(_) => {
            StatusCode::BAD_GATEWAY
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn into_response(err: AnalyticsError) -> (StatusCode, String) {
    let status = status_for(&err);
    warn!(%status, error = %err, "request failed");
    (status, err.to_string())
}
