mod common;

use axum::{extract::State, http::StatusCode, Json};
use common::ScriptedModel;
use textlens::api::{
    routes,
    types::{AnalyzeRequest, TranslateRequest},
    AppState,
};

#[tokio::test]
async fn health_reports_the_model() {
    let state = AppState::new(ScriptedModel::new(Vec::<String>::new())).unwrap();
    let Json(body) = routes::health(State(state)).await;
    assert_eq!(body.status, "ok");
    assert_eq!(body.model, "scripted");
}

#[tokio::test]
async fn translate_skips_chinese_input() {
    let model = ScriptedModel::new(Vec::<String>::new());
    let state = AppState::new(model.clone()).unwrap();
    let Json(body) = routes::translate(
        State(state),
        Json(TranslateRequest {
            text: "一切都很好".into(),
            topic: "survey".into(),
        }),
    )
    .await
    .unwrap();
    assert!(body.skipped);
    assert_eq!(body.translated_text, "一切都很好");
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn unparsable_model_reply_is_bad_gateway() {
    let state = AppState::new(ScriptedModel::new(["sorry, I cannot help"])).unwrap();
    let (status, message) = routes::analyze(
        State(state),
        Json(AnalyzeRequest {
            text: "the lifts are broken again".into(),
            context: "facilities survey".into(),
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(message.contains("schema violation"));
}
