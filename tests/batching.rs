use proptest::prelude::*;
use textlens::data::batch::{markdown_tables, text_batches};

#[test]
fn markdown_table_layout() {
    let rows = vec![
        vec!["ID000001".to_string(), "slow\nelevators".to_string()],
        vec!["ID000002".to_string(), "friendly staff".to_string()],
    ];
    let tables = markdown_tables(&["unique_id", "comment"], &rows, 5).unwrap();
    assert_eq!(tables.len(), 1);
    insta::assert_snapshot!(tables[0], @r###"
    | unique_id | comment |
    | --- | --- |
    | ID000001 | slow elevators |
    | ID000002 | friendly staff |
    "###);
}

proptest! {
    #[test]
    fn batches_partition_the_input(
        texts in prop::collection::vec("[a-z]{1,6}", 0..60),
        size in 1usize..12,
    ) {
        let batches = text_batches(&texts, size).unwrap();
        prop_assert_eq!(batches.len(), texts.len().div_ceil(size));

        let rejoined: Vec<String> = batches
            .iter()
            .flat_map(|b| b.split(' ').map(str::to_string))
            .collect();
        prop_assert_eq!(rejoined, texts);
    }

    #[test]
    fn tables_hold_at_most_the_requested_rows(n in 0usize..50, size in 1usize..10) {
        let rows: Vec<Vec<String>> = (0..n)
            .map(|i| vec![format!("ID{i:06}"), "text".into()])
            .collect();
        let tables = markdown_tables(&["id", "text"], &rows, size).unwrap();
        prop_assert_eq!(tables.len(), n.div_ceil(size));
        for table in &tables {
            prop_assert!(table.lines().count() - 2 <= size);
        }
    }
}
