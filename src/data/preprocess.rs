//! Text cleaning, validity filtering and row identifier assignment.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{data::table::Table, error::Result};

/// Column appended to preprocessed tables holding the row identifier.
pub const ID_COLUMN: &str = "unique_id";

/// Prefix of generated row identifiers (`ID000001`, `ID000002`, ...).
pub const ID_PREFIX: &str = "ID";

static QUOTE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"['‘’"“”{}]"#).expect("valid regex"));
static REPEATED_UNDERSCORES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_{2,}").expect("valid regex"));
static REPEATED_WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s{2,}").expect("valid regex"));
static ONLY_PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\s\p{P}]+$").expect("valid regex"));
static HAS_WORD_CHAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\p{L}\p{N}]").expect("valid regex"));

/// One surviving input row, addressed by its identifier for the rest of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRecord {
    pub unique_id: String,
    pub raw_text: String,
    pub cleaned_text: String,
}

/// Output of [`preprocess`]: the cleaned, filtered table (with [`ID_COLUMN`]
/// appended) and the matching records in the same order.
#[derive(Debug, Clone)]
pub struct Preprocessed {
    pub table: Table,
    pub records: Vec<TextRecord>,
}

/// Normalise quoting and collapse repeated underscores and whitespace.
pub fn clean_text(text: Option<&str>) -> String {
    let Some(text) = text else {
        return String::new();
    };
    let text = QUOTE_CHARS.replace_all(text, "`");
    let text = REPEATED_UNDERSCORES.replace_all(&text, "_");
    REPEATED_WHITESPACE.replace_all(&text, " ").into_owned()
}

/// Whether a text carries enough content to be worth categorising.
pub fn is_valid_text(text: &str) -> bool {
    let text = text.trim();
    if text.is_empty()
        || ONLY_PUNCTUATION.is_match(text)
        || text.chars().all(char::is_numeric)
        || !HAS_WORD_CHAR.is_match(text)
    {
        return false;
    }
    char_runs(text) > 2
}

/// Number of maximal runs of identical characters ("aabbb" has two).
fn char_runs(text: &str) -> usize {
    let mut runs = 0;
    let mut previous = None;
    for c in text.chars() {
        if previous != Some(c) {
            runs += 1;
            previous = Some(c);
        }
    }
    runs
}

/// Sequential identifier for the `n`th surviving row, counting from 1.
pub fn row_id(n: usize) -> String {
    format!("{ID_PREFIX}{n:06}")
}

/// Clean every cell, drop rows whose `text_column` is invalid and number the
/// survivors in their current order.
pub fn preprocess(table: &Table, text_column: &str) -> Result<Preprocessed> {
    let text_idx = table.column_index(text_column)?;
    let raw_texts: Vec<String> = table
        .rows()
        .iter()
        .map(|row| row[text_idx].clone().unwrap_or_default())
        .collect();

    let mut cleaned = table.clone();
    cleaned.map_cells(|cell| Some(clean_text(cell)));

    let keep: Vec<bool> = cleaned
        .rows()
        .iter()
        .map(|row| is_valid_text(row[text_idx].as_deref().unwrap_or("")))
        .collect();
    let mut flags = keep.iter();
    cleaned.retain_rows(|_| flags.next().copied().unwrap_or(false));

    let records: Vec<TextRecord> = raw_texts
        .into_iter()
        .zip(&keep)
        .filter_map(|(raw, keep)| keep.then_some(raw))
        .zip(cleaned.rows())
        .enumerate()
        .map(|(idx, (raw_text, row))| TextRecord {
            unique_id: row_id(idx + 1),
            raw_text,
            cleaned_text: row[text_idx].clone().unwrap_or_default(),
        })
        .collect();

    let ids = records
        .iter()
        .map(|record| Some(record.unique_id.clone()))
        .collect();
    cleaned.push_column(ID_COLUMN, ids)?;

    info!(
        input = table.len(),
        kept = records.len(),
        dropped = table.len() - records.len(),
        "preprocessed texts"
    );
    Ok(Preprocessed {
        table: cleaned,
        records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleaning_replaces_quotes_and_collapses_runs() {
        assert_eq!(
            clean_text(Some("say \u{201c}hi\u{201d} {now}__ok   done")),
            "say `hi` `now`_ok done"
        );
        assert_eq!(clean_text(None), "");
    }

    #[test]
    fn validity_rules() {
        for invalid in ["", "   ", "???", "!!! ...", "12345", "aaaa", "ok", "aaab", "--"] {
            assert!(!is_valid_text(invalid), "{invalid:?} should be invalid");
        }
        for valid in ["abc", "hello world", "服务很好", "good 123"] {
            assert!(is_valid_text(valid), "{valid:?} should be valid");
        }
    }

    #[test]
    fn ids_are_zero_padded() {
        assert_eq!(row_id(1), "ID000001");
        assert_eq!(row_id(123456), "ID123456");
    }
}
