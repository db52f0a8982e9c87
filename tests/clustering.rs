mod common;

use common::ScriptedModel;
use textlens::{
    data::Table,
    error::AnalyticsError,
    llm::Session,
    nlp::{
        categories::CategorySet,
        classify::LabelMode,
        clustering::{classify_table, discover_categories, ClusteringParams},
    },
};

fn survey() -> Table {
    Table::from_rows(
        vec!["respondent".into(), "comment".into()],
        vec![
            vec![Some("r1".into()), Some("the parking lot is always full".into())],
            vec![Some("r2".into()), Some("???".into())],
            vec![Some("r3".into()), Some("my manager gives useful feedback".into())],
        ],
    )
    .unwrap()
}

const PROPOSAL: &str = r#"{"categories": [
    {"name": "Facilities", "description": "Buildings and parking"},
    {"name": "Management", "description": "Line manager behaviour"}
]}"#;

#[tokio::test]
async fn discovery_then_classification_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let session = Session::from_id("run1");
    let model = ScriptedModel::new([
        PROPOSAL,
        PROPOSAL,
        r#"{"classifications": [
            {"id": "ID000001", "categories": ["Facilities"]},
            {"id": "ID000002", "categories": ["Management"]}
        ]}"#,
    ]);
    let mut params = ClusteringParams::new("employee survey");
    params.mode = LabelMode::Multi;

    let discovery = discover_categories(model.clone(), &survey(), "comment", &params, &session)
        .await
        .unwrap();
    // Two categories is below the default minimum of five; the set is kept.
    assert_eq!(discovery.categories.len(), 2);
    assert_eq!(discovery.preprocessed.records.len(), 2);

    let classified = classify_table(
        model.clone(),
        &discovery.preprocessed,
        "comment",
        &discovery.categories,
        &params,
        &session,
        Some(dir.path()),
    )
    .await
    .unwrap();

    assert_eq!(model.calls(), 3);
    assert!(classified.outcome.is_complete());
    assert_eq!(
        classified.table.columns(),
        ["respondent", "comment", "category_Facilities", "category_Management"]
    );
    assert_eq!(
        classified.table.column_values("respondent").unwrap(),
        vec![Some("r1"), Some("r3")]
    );
    assert_eq!(
        classified.table.column_values("category_Management").unwrap(),
        vec![Some("false"), Some("true")]
    );
    assert!(dir
        .path()
        .join("classify_texts_text_classification_run1.csv")
        .exists());
}

#[tokio::test]
async fn generation_failure_propagates() {
    let model = ScriptedModel::new(["not a category list"]);
    let err = discover_categories(
        model,
        &survey(),
        "comment",
        &ClusteringParams::new("employee survey"),
        &Session::new(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AnalyticsError::SchemaViolation(_)));
}

#[tokio::test]
async fn bad_parameters_fail_before_any_model_call() {
    let model = ScriptedModel::new(Vec::<String>::new());
    let mut params = ClusteringParams::new("employee survey");
    params.categories.min_categories = 20;

    let err = discover_categories(model.clone(), &survey(), "comment", &params, &Session::new())
        .await
        .unwrap_err();
    assert!(err.is_caller_error());

    let err = discover_categories(
        model.clone(),
        &survey(),
        "missing",
        &ClusteringParams::new("employee survey"),
        &Session::new(),
    )
    .await
    .unwrap_err();
    assert!(err.is_caller_error());
    assert_eq!(model.calls(), 0);
}

#[test]
fn edited_category_file_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("categories.json");
    let set: CategorySet = serde_json::from_str(PROPOSAL).unwrap();
    set.save(&path).unwrap();
    assert_eq!(CategorySet::load(&path).unwrap(), set);

    std::fs::write(&path, r#"{"categories": [{"name": " ", "description": "blank"}]}"#).unwrap();
    assert!(CategorySet::load(&path).is_err());
}

fn survey_with(extra: &str) -> Table {
    Table::from_rows(
        vec![extra.into(), "comment".into()],
        vec![
            vec![Some("old".into()), Some("the parking lot is always full".into())],
            vec![Some("old".into()), Some("my manager gives useful feedback".into())],
        ],
    )
    .unwrap()
}

#[tokio::test]
async fn existing_output_column_fails_before_classification() {
    let model = ScriptedModel::new([r#"{"classifications": [
        {"id": "ID000001", "category": "Facilities"},
        {"id": "ID000002", "category": "Management"}
    ]}"#]);
    let params = ClusteringParams::new("employee survey");
    let prepared = textlens::data::preprocess(&survey_with("category"), "comment").unwrap();
    let categories: CategorySet = serde_json::from_str(PROPOSAL).unwrap();

    let err = classify_table(
        model.clone(),
        &prepared,
        "comment",
        &categories,
        &params,
        &Session::new(),
        None,
    )
    .await
    .unwrap_err();

    assert!(err.is_caller_error());
    assert!(err.to_string().contains("category"));
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn existing_indicator_column_fails_before_multi_label_classification() {
    let model = ScriptedModel::new(Vec::<String>::new());
    let mut params = ClusteringParams::new("employee survey");
    params.mode = LabelMode::Multi;
    let prepared =
        textlens::data::preprocess(&survey_with("category_Management"), "comment").unwrap();
    let categories: CategorySet = serde_json::from_str(PROPOSAL).unwrap();

    let err = classify_table(
        model.clone(),
        &prepared,
        "comment",
        &categories,
        &params,
        &Session::new(),
        None,
    )
    .await
    .unwrap_err();

    assert!(err.to_string().contains("category_Management"));
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn existing_category_column_fails_before_discovery() {
    let model = ScriptedModel::new([PROPOSAL, PROPOSAL]);
    let err = discover_categories(
        model.clone(),
        &survey_with("category"),
        "comment",
        &ClusteringParams::new("employee survey"),
        &Session::new(),
    )
    .await
    .unwrap_err();

    assert!(err.is_caller_error());
    assert_eq!(model.calls(), 0);
}
