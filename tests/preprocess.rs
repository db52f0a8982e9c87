use proptest::prelude::*;
use textlens::data::{preprocess, preprocess::ID_COLUMN, Table};

fn text_table(texts: &[Option<&str>]) -> Table {
    Table::from_rows(
        vec!["text".into()],
        texts.iter().map(|t| vec![t.map(str::to_string)]).collect(),
    )
    .unwrap()
}

#[test]
fn invalid_rows_are_dropped_and_survivors_numbered() {
    let table = text_table(&[Some(""), Some("hello world this is valid"), Some("???")]);
    let out = preprocess(&table, "text").unwrap();

    assert_eq!(out.records.len(), 1);
    assert_eq!(out.records[0].unique_id, "ID000001");
    assert_eq!(out.records[0].cleaned_text, "hello world this is valid");
    assert_eq!(out.table.columns(), ["text", ID_COLUMN]);
    assert_eq!(out.table.len(), 1);
}

#[test]
fn missing_cells_become_empty_and_are_dropped() {
    let table = text_table(&[None, Some("the canteen food is great")]);
    let out = preprocess(&table, "text").unwrap();
    assert_eq!(out.records.len(), 1);
    assert_eq!(out.records[0].raw_text, "the canteen food is great");
}

#[test]
fn unknown_text_column_is_a_validation_error() {
    let table = text_table(&[Some("hello there")]);
    let err = preprocess(&table, "comment").unwrap_err();
    assert!(err.is_caller_error());
}

#[test]
fn raw_text_is_kept_alongside_cleaned_text() {
    let table = text_table(&[Some("it's   \"fine\"")]);
    let out = preprocess(&table, "text").unwrap();
    assert_eq!(out.records[0].raw_text, "it's   \"fine\"");
    assert_eq!(out.records[0].cleaned_text, "it`s `fine`");
}

proptest! {
    #[test]
    fn ids_are_sequential_and_order_is_preserved(
        words in prop::collection::vec("[a-z]{3,8} [a-z]{3,8}", 0..40),
    ) {
        let table = text_table(&words.iter().map(|w| Some(w.as_str())).collect::<Vec<_>>());
        let out = preprocess(&table, "text").unwrap();

        prop_assert_eq!(out.records.len(), words.len());
        for (idx, (record, word)) in out.records.iter().zip(&words).enumerate() {
            prop_assert_eq!(&record.unique_id, &format!("ID{:06}", idx + 1));
            prop_assert_eq!(&record.cleaned_text, word);
        }
    }

    #[test]
    fn numeric_only_texts_never_survive(numbers in prop::collection::vec("[0-9]{1,10}", 1..20)) {
        let table = text_table(&numbers.iter().map(|n| Some(n.as_str())).collect::<Vec<_>>());
        let out = preprocess(&table, "text").unwrap();
        prop_assert!(out.records.is_empty());
    }
}
