//! Integration tests for catalog queries against a real SQLite file.
//!
//! Run with:
//!   cargo test --test test_catalog

mod common;

use rusqlite::Connection;

use fihris_bot::catalog::{Catalog, SearchField};
use common::catalog_fixture;

fn direct_count(catalog: &Catalog, sql: &str) -> u64 {
    let conn = Connection::open(catalog.path()).expect("open");
    let n: i64 = conn.query_row(sql, [], |row| row.get(0)).expect("query");
    n as u64
}

// ── open ─────────────────────────────────────────────────────────────────────

#[test]
fn open_existing_catalog() {
    let fx = catalog_fixture();
    let catalog = Catalog::open(&fx.db_path).expect("open should succeed");
    assert_eq!(catalog.count().unwrap(), common::ROWS.len() as u64);
}

#[test]
fn open_file_without_books_table_fails() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("empty.db");
    Connection::open(&path).unwrap().execute_batch("CREATE TABLE other (x TEXT);").unwrap();
    assert!(Catalog::open(&path).is_err());
}

// ── field search ─────────────────────────────────────────────────────────────

#[test]
fn title_substring_finds_record() {
    let fx = catalog_fixture();
    let catalog = Catalog::open(&fx.db_path).unwrap();
    let hits = catalog.search("البخاري", SearchField::Title, 10);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].record_id, "1001");
    assert_eq!(hits[0].extra.as_deref(), Some("297.1"));
}

#[test]
fn author_search_is_substring() {
    let fx = catalog_fixture();
    let catalog = Catalog::open(&fx.db_path).unwrap();
    let hits = catalog.search("محمد بن", SearchField::Author, 10);
    let ids: Vec<&str> = hits.iter().map(|b| b.record_id.as_str()).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&"1001"));
    assert!(ids.contains(&"20046"));
}

#[test]
fn subject_search_carries_subject_in_extra() {
    let fx = catalog_fixture();
    let catalog = Catalog::open(&fx.db_path).unwrap();
    let hits = catalog.search("التاريخ", SearchField::Subject, 10);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].extra.as_deref(), Some("التاريخ"));
}

#[test]
fn year_search_is_exact() {
    let fx = catalog_fixture();
    let catalog = Catalog::open(&fx.db_path).unwrap();
    assert_eq!(catalog.search("1400", SearchField::Year, 10).len(), 2);
    assert!(catalog.search("140", SearchField::Year, 10).is_empty());
}

#[test]
fn search_respects_limit() {
    let fx = catalog_fixture();
    let catalog = Catalog::open(&fx.db_path).unwrap();
    assert_eq!(catalog.search("كتاب", SearchField::All, 3).len(), 3);
}

#[test]
fn nan_columns_are_absent() {
    let fx = catalog_fixture();
    let catalog = Catalog::open(&fx.db_path).unwrap();
    let hits = catalog.search("Rust", SearchField::Title, 10);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].publisher, None);
    assert_eq!(hits[0].extra, None);
}

// ── record lookup ────────────────────────────────────────────────────────────

#[test]
fn record_id_returns_that_record() {
    let fx = catalog_fixture();
    let catalog = Catalog::open(&fx.db_path).unwrap();
    let hits = catalog.find_by_record_id("1002");
    assert_eq!(hits.len(), 1);
    let book = &hits[0];
    assert_eq!(book.title.as_deref(), Some("تفسير الطبري"));
    assert_eq!(book.pages.as_deref(), Some("820"));
    assert_eq!(book.isbn.as_deref(), Some("9789953"));
}

#[test]
fn record_id_prefix_matches_by_substring() {
    let fx = catalog_fixture();
    let catalog = Catalog::open(&fx.db_path).unwrap();
    assert_eq!(catalog.find_by_record_id("2004").len(), 2);
    assert!(catalog.find_by_record_id("99999").is_empty());
}

// ── flexible search ──────────────────────────────────────────────────────────

#[test]
fn flexible_single_word_checks_every_column() {
    let fx = catalog_fixture();
    let catalog = Catalog::open(&fx.db_path).unwrap();
    // publisher only
    assert_eq!(catalog.flexible_search("المعارف", 10).len(), 1);
    // classification only
    assert_eq!(catalog.flexible_search("907", 10)[0].record_id, "20045");
}

#[test]
fn flexible_multi_word_matches_in_order() {
    let fx = catalog_fixture();
    let catalog = Catalog::open(&fx.db_path).unwrap();
    let hits = catalog.flexible_search("تفسير الطبري", 10);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].record_id, "1002");
}

#[test]
fn flexible_words_across_title_and_author() {
    let fx = catalog_fixture();
    let catalog = Catalog::open(&fx.db_path).unwrap();
    // "Rust" is in the title, "Klabnik" in the author.
    let hits = catalog.flexible_search("Rust Klabnik", 10);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].record_id, "1003");
}

#[test]
fn flexible_blank_query_is_empty() {
    let fx = catalog_fixture();
    let catalog = Catalog::open(&fx.db_path).unwrap();
    assert!(catalog.flexible_search("   ", 10).is_empty());
}

#[test]
fn relevant_books_match_fulltext() {
    let fx = catalog_fixture();
    let catalog = Catalog::open(&fx.db_path).unwrap();
    let books = catalog.relevant_books("الحديث", 15);
    assert_eq!(books.len(), 2);
    assert!(books.iter().all(|b| b.subject.as_deref() == Some("الحديث")));
}

// ── stats ────────────────────────────────────────────────────────────────────

#[test]
fn detailed_stats_match_direct_counts() {
    let fx = catalog_fixture();
    let catalog = Catalog::open(&fx.db_path).unwrap();
    let stats = catalog.detailed_stats().unwrap();

    assert_eq!(stats.total_books, direct_count(&catalog, "SELECT COUNT(*) FROM books"));
    for (column, got) in [
        ("author", stats.total_authors),
        ("publisher", stats.total_publishers),
        ("classification", stats.total_classifications),
        ("subject", stats.total_subjects),
    ] {
        let sql = format!(
            "SELECT COUNT(DISTINCT {column}) FROM books \
             WHERE {column} IS NOT NULL AND {column} != 'nan' AND {column} != ''"
        );
        assert_eq!(got, direct_count(&catalog, &sql), "distinct {column}");
    }

    assert_eq!(stats.total_books, 5);
    assert_eq!(stats.total_publishers, 2);
    assert_eq!(stats.total_classifications, 4);
    assert_eq!(stats.top_subjects[0], ("الحديث".to_string(), 2));
}

#[test]
fn summary_reports_year_extremes() {
    let fx = catalog_fixture();
    let catalog = Catalog::open(&fx.db_path).unwrap();
    let summary = catalog.summary().unwrap();
    assert_eq!(summary.total_books, 5);
    assert_eq!(summary.oldest, Some(("الرسالة".to_string(), "1399".to_string())));
    assert_eq!(summary.newest, Some(("Rust Programming".to_string(), "2018".to_string())));
    assert!(summary.top_subjects.len() <= 5);
}
