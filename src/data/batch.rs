//! Fixed-size batching of texts into prompt-ready blobs and Markdown tables.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    data::preprocess::{TextRecord, ID_COLUMN},
    error::{AnalyticsError, Result},
};

static LINE_BREAKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r\n|\n").expect("valid regex"));

fn check_size(batch_size: usize) -> Result<()> {
    if batch_size == 0 {
        return Err(AnalyticsError::validation("batch size must be a positive integer"));
    }
    Ok(())
}

/// Join contiguous groups of `batch_size` texts with a single space.
pub fn text_batches<S: AsRef<str>>(texts: &[S], batch_size: usize) -> Result<Vec<String>> {
    check_size(batch_size)?;
    Ok(texts
        .chunks(batch_size)
        .map(|chunk| {
            chunk
                .iter()
                .map(AsRef::as_ref)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect())
}

/// Render contiguous groups of rows as Markdown tables under a shared header.
pub fn markdown_tables<S: AsRef<str>>(
    columns: &[S],
    rows: &[Vec<String>],
    rows_per_table: usize,
) -> Result<Vec<String>> {
    check_size(rows_per_table)?;
    if columns.is_empty() {
        return Err(AnalyticsError::validation("markdown tables need at least one column"));
    }
    if let Some(bad) = rows.iter().find(|row| row.len() != columns.len()) {
        return Err(AnalyticsError::validation(format!(
            "row has {} cells but {} columns were requested",
            bad.len(),
            columns.len()
        )));
    }

    let header = format!(
        "| {} |\n",
        columns.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(" | ")
    );
    let separator = format!("| {} |\n", vec!["---"; columns.len()].join(" | "));

    Ok(rows
        .chunks(rows_per_table)
        .map(|chunk| {
            let mut table = String::with_capacity(header.len() * (chunk.len() + 2));
            table.push_str(&header);
            table.push_str(&separator);
            for row in chunk {
                let cells = row
                    .iter()
                    .map(|cell| LINE_BREAKS.replace_all(cell, " "))
                    .collect::<Vec<_>>()
                    .join(" | ");
                table.push_str("| ");
                table.push_str(&cells);
                table.push_str(" |\n");
            }
            table
        })
        .collect())
}

/// Markdown tables of `unique_id | <text_column>` for classification prompts.
pub fn record_tables(
    records: &[TextRecord],
    text_column: &str,
    rows_per_table: usize,
) -> Result<Vec<String>> {
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|r| vec![r.unique_id.clone(), r.cleaned_text.clone()])
        .collect();
    markdown_tables(&[ID_COLUMN, text_column], &rows, rows_per_table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_batch_size_is_rejected() {
        assert!(text_batches(&["a"], 0).is_err());
        assert!(markdown_tables(&["a"], &[], 0).is_err());
    }

    #[test]
    fn last_batch_may_be_short() {
        let batches = text_batches(&["a", "b", "c", "d", "e"], 2).unwrap();
        assert_eq!(batches, vec!["a b", "c d", "e"]);
    }

    #[test]
    fn empty_input_yields_no_tables() {
        let tables = markdown_tables(&["id"], &[], 3).unwrap();
        assert!(tables.is_empty());
    }
}
