//! Joining per-row model outputs back onto the originating table.

use std::collections::HashMap;

use indexmap::IndexSet;
use tracing::{info, warn};

use crate::{
    data::Table,
    error::{AnalyticsError, Result},
    nlp::{
        categories::CategorySet,
        classify::{ClassificationRecord, LabelMode, Labels},
        content::ContentAnalysis,
    },
};

/// Output column for single-label classification.
pub const CATEGORY_COLUMN: &str = "category";
/// Prefix of the per-category indicator columns of multi-label output.
pub const CATEGORY_PREFIX: &str = "category_";
pub const TRANSLATION_COLUMN: &str = "translated_text";
pub const VALIDITY_COLUMN: &str = "validity";
pub const SENTIMENT_COLUMN: &str = "sentiment_class";
pub const SENSITIVE_COLUMN: &str = "sensitive_info";
pub const CONTENT_COLUMNS: [&str; 3] = [VALIDITY_COLUMN, SENTIMENT_COLUMN, SENSITIVE_COLUMN];

/// Columns [`join_classifications`] adds for `categories`.
pub fn classification_columns(categories: &CategorySet, mode: LabelMode) -> Vec<String> {
    match mode {
        LabelMode::Single => vec![CATEGORY_COLUMN.to_string()],
        LabelMode::Multi => categories
            .names()
            .map(|name| format!("{CATEGORY_PREFIX}{name}"))
            .collect(),
    }
}

/// Reject a table that already has one of the columns a stage will append.
///
/// Entry points call this before the first model call so a clash never
/// discards paid-for results at join time.
pub fn ensure_columns_free<S: AsRef<str>>(table: &Table, columns: &[S]) -> Result<()> {
    let taken: Vec<&str> = columns
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| table.columns().iter().any(|c| c == name))
        .collect();
    if taken.is_empty() {
        return Ok(());
    }
    Err(AnalyticsError::validation(format!(
        "input already has output column(s) {}; rename or drop them first",
        taken.join(", ")
    )))
}

/// Left-join classification records onto `table` by `id_column`.
///
/// Row order is kept. Rows without a record get empty classification cells.
/// The identifier column is dropped from the result. In multi-label mode one
/// `category_<name>` column is added per distinct name, in order of first
/// appearance across `records`.
pub fn join_classifications(
    table: &Table,
    id_column: &str,
    records: &[ClassificationRecord],
    mode: LabelMode,
) -> Result<Table> {
    let mut by_id: HashMap<&str, &Labels> = HashMap::with_capacity(records.len());
    for record in records {
        if by_id.insert(record.id.as_str(), &record.labels).is_some() {
            warn!(id = %record.id, "duplicate classification for row; keeping the last one");
        }
    }
    let matched: Vec<Option<&Labels>> = table
        .column_values(id_column)?
        .into_iter()
        .map(|id| id.and_then(|id| by_id.get(id).copied()))
        .collect();

    let mut result = table.clone();
    match mode {
        LabelMode::Single => {
            let values = matched
                .iter()
                .map(|labels| labels.map(|l| l.names().join("; ")))
                .collect();
            result.push_column(CATEGORY_COLUMN, values)?;
        }
        LabelMode::Multi => {
            let names: IndexSet<&str> = records
                .iter()
                .flat_map(|r| r.labels.names())
                .collect();
            for name in &names {
                let column = format!("{CATEGORY_PREFIX}{name}");
                // Only labels outside the category set can get here.
                if result.columns().contains(&column) {
                    warn!(%column, "label column clashes with an input column; skipped");
                    continue;
                }
                let values = matched
                    .iter()
                    .map(|labels| labels.map(|l| l.names().contains(name).to_string()))
                    .collect();
                result.push_column(column, values)?;
            }
        }
    }
    result.drop_column(id_column)?;

    info!(
        rows = table.len(),
        classified = matched.iter().filter(|m| m.is_some()).count(),
        "joined classifications"
    );
    Ok(result)
}

/// Append `translated_text`; `translations` lines up with the table rows.
pub fn append_translations(table: &Table, translations: Vec<Option<String>>) -> Result<Table> {
    let mut result = table.clone();
    result.push_column(TRANSLATION_COLUMN, translations)?;
    Ok(result)
}

/// Append the three content-analysis columns; a `None` entry leaves the row's
/// cells empty.
pub fn append_content_analysis(
    table: &Table,
    analyses: &[Option<ContentAnalysis>],
) -> Result<Table> {
    let mut result = table.clone();
    let column = |f: fn(&ContentAnalysis) -> &'static str| {
        analyses
            .iter()
            .map(|a| a.as_ref().map(|a| f(a).to_string()))
            .collect::<Vec<_>>()
    };
    result.push_column(VALIDITY_COLUMN, column(|a| a.validity.as_str()))?;
    result.push_column(SENTIMENT_COLUMN, column(|a| a.sentiment_class.as_str()))?;
    result.push_column(SENSITIVE_COLUMN, column(|a| a.sensitive_info.as_str()))?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        Table::from_rows(
            vec!["text".into(), "unique_id".into()],
            vec![
                vec![Some("first".into()), Some("ID000001".into())],
                vec![Some("second".into()), Some("ID000002".into())],
            ],
        )
        .unwrap()
    }

    #[test]
    fn duplicate_ids_do_not_duplicate_rows() {
        let records = vec![
            ClassificationRecord {
                id: "ID000001".into(),
                labels: Labels::Single("A".into()),
            },
            ClassificationRecord {
                id: "ID000001".into(),
                labels: Labels::Single("B".into()),
            },
        ];
        let out = join_classifications(&table(), "unique_id", &records, LabelMode::Single).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out.column_values(CATEGORY_COLUMN).unwrap(), vec![Some("B"), None]);
    }

    #[test]
    fn taken_output_columns_are_reported() {
        let categories: CategorySet =
            serde_json::from_str(r#"{"categories": [{"name": "text", "description": "d"}]}"#)
                .unwrap();
        assert!(ensure_columns_free(&table(), &CONTENT_COLUMNS).is_ok());
        assert!(ensure_columns_free(&table(), &["unique_id"]).is_err());
        assert_eq!(
            classification_columns(&categories, LabelMode::Multi),
            vec!["category_text".to_string()]
        );
        assert_eq!(
            classification_columns(&categories, LabelMode::Single),
            vec![CATEGORY_COLUMN.to_string()]
        );
    }

    #[test]
    fn invented_label_clashing_with_input_is_skipped() {
        let table = Table::from_rows(
            vec!["category_X".into(), "unique_id".into()],
            vec![vec![Some("kept".into()), Some("ID000001".into())]],
        )
        .unwrap();
        let records = vec![ClassificationRecord {
            id: "ID000001".into(),
            labels: Labels::Multi(vec!["X".into(), "Y".into()]),
        }];
        let out = join_classifications(&table, "unique_id", &records, LabelMode::Multi).unwrap();
        assert_eq!(out.columns(), &["category_X".to_string(), "category_Y".to_string()]);
        assert_eq!(out.column_values("category_X").unwrap(), vec![Some("kept")]);
        assert_eq!(out.column_values("category_Y").unwrap(), vec![Some("true")]);
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let records = vec![ClassificationRecord {
            id: "ID999999".into(),
            labels: Labels::Multi(vec!["A".into()]),
        }];
        let out = join_classifications(&table(), "unique_id", &records, LabelMode::Multi).unwrap();
        assert_eq!(out.columns(), &["text".to_string(), "category_A".to_string()]);
        assert_eq!(out.column_values("category_A").unwrap(), vec![None, None]);
    }
}
