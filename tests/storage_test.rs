use std::fs::OpenOptions;
use std::path::Path;

use rust_cdb::{
    PAGE_SIZE, ROW_SIZE, ROWS_PER_PAGE, Row, TABLE_MAX_ROWS, Table, TableError, close_database,
    open_database,
};
use tempfile::TempDir;

fn row(i: usize) -> Row {
    Row::new(i as i32, format!("user{i}"), format!("person{i}@example.com")).unwrap()
}

fn fill(path: &Path, count: usize) {
    let mut table = open_database(path).unwrap();
    for i in 0..count {
        table.insert(&row(i)).unwrap();
    }
    close_database(table).unwrap();
}

fn scan(table: &mut Table) -> Vec<Row> {
    table.rows().collect::<Result<_, _>>().unwrap()
}

#[test]
fn single_row_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bob.db");
    let bob = Row::new(1, "bob", "bob@x.com").unwrap();

    let mut table = open_database(&path).unwrap();
    table.insert(&bob).unwrap();
    assert_eq!(scan(&mut table), vec![bob.clone()]);
    close_database(table).unwrap();

    let mut table = open_database(&path).unwrap();
    assert_eq!(table.num_rows(), 1);
    assert_eq!(scan(&mut table), vec![bob]);
}

#[test]
fn partial_page_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("partial.db");
    fill(&path, ROWS_PER_PAGE + 5);

    let mut table = open_database(&path).unwrap();
    assert_eq!(table.num_rows(), ROWS_PER_PAGE + 5);
    let trailing: Vec<Row> = (ROWS_PER_PAGE..ROWS_PER_PAGE + 5).map(row).collect();
    assert_eq!(scan(&mut table)[ROWS_PER_PAGE..], trailing[..]);
}

#[test]
fn appending_after_reopen_extends_the_last_page() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("append.db");
    fill(&path, 3);

    let mut table = open_database(&path).unwrap();
    for i in 3..ROWS_PER_PAGE + 2 {
        table.insert(&row(i)).unwrap();
    }
    close_database(table).unwrap();

    let mut table = open_database(&path).unwrap();
    assert_eq!(scan(&mut table), (0..ROWS_PER_PAGE + 2).map(row).collect::<Vec<_>>());
}

#[test]
fn reopening_without_writes_keeps_row_count() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("idle.db");

    for count in [7, 3 * ROWS_PER_PAGE, 3 * ROWS_PER_PAGE + 1] {
        std::fs::remove_file(&path).ok();
        fill(&path, count);
        let len = std::fs::metadata(&path).unwrap().len();

        for _ in 0..2 {
            let mut table = open_database(&path).unwrap();
            assert_eq!(table.num_rows(), count);
            assert_eq!(scan(&mut table).len(), count);
            close_database(table).unwrap();
        }
        assert_eq!(std::fs::metadata(&path).unwrap().len(), len);
    }
}

#[test]
fn full_table_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("full.db");
    fill(&path, TABLE_MAX_ROWS);

    let mut table = open_database(&path).unwrap();
    assert_eq!(table.num_rows(), TABLE_MAX_ROWS);
    assert!(matches!(table.insert(&row(0)), Err(TableError::TableFull)));
    assert_eq!(table.num_rows(), TABLE_MAX_ROWS);
    assert_eq!(scan(&mut table), (0..TABLE_MAX_ROWS).map(row).collect::<Vec<_>>());
}

#[test]
fn trailing_partial_record_is_ignored() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("torn.db");
    fill(&path, 4);

    let file = OpenOptions::new().write(true).open(&path).unwrap();
    file.set_len((3 * ROW_SIZE + ROW_SIZE / 2) as u64).unwrap();
    drop(file);

    let mut table = open_database(&path).unwrap();
    assert_eq!(table.num_rows(), 3);
    assert_eq!(scan(&mut table), (0..3).map(row).collect::<Vec<_>>());

    // The next insert takes over the torn slot.
    table.insert(&row(10)).unwrap();
    close_database(table).unwrap();
    assert_eq!(std::fs::metadata(&path).unwrap().len(), (4 * ROW_SIZE) as u64);
}

#[test]
fn full_pages_are_written_whole() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pages.db");
    fill(&path, 2 * ROWS_PER_PAGE);

    assert_eq!(std::fs::metadata(&path).unwrap().len(), (2 * PAGE_SIZE) as u64);
}
