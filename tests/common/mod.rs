//! Shared fixture: a small `books` catalog in a temp directory.

#![allow(dead_code)]

use std::path::PathBuf;

use rusqlite::{Connection, params};
use tempfile::TempDir;

/// `(record_id, title, author, publisher, year, pages, classification, subject, isbn)`
type Row = (
    &'static str,
    &'static str,
    &'static str,
    Option<&'static str>,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
);

pub const ROWS: &[Row] = &[
    ("1001", "صحيح البخاري", "محمد بن إسماعيل البخاري", Some("دار السلام"), "1400", "500", "297.1", "الحديث", "nan"),
    ("1002", "تفسير الطبري", "ابن جرير الطبري", Some("دار المعارف"), "1401", "820", "297.2", "التفسير", "9789953"),
    ("1003", "Rust Programming", "Steve Klabnik", Some("nan"), "2018", "nan", "nan", "Programming", ""),
    ("20045", "مقدمة ابن خلدون", "ابن خلدون", None, "1400", "300", "907", "التاريخ", "nan"),
    ("20046", "الرسالة", "محمد بن إدريس الشافعي", Some("دار السلام"), "1399", "250", "297.4", "الحديث", "nan"),
];

pub struct Fixture {
    _dir: TempDir,
    pub db_path: PathBuf,
}

/// Create `library.db` with the `books` table filled from [`ROWS`].
pub fn catalog_fixture() -> Fixture {
    let dir = TempDir::new().expect("tempdir");
    let db_path = dir.path().join("library.db");
    let conn = Connection::open(&db_path).expect("create db");
    conn.execute_batch(
        "CREATE TABLE books (
            record_id TEXT,
            title TEXT,
            author TEXT,
            publisher TEXT,
            year TEXT,
            pages TEXT,
            classification TEXT,
            subject TEXT,
            isbn TEXT,
            FULLTEXT_SEARCH TEXT
        );",
    )
    .expect("create table");

    for (record_id, title, author, publisher, year, pages, classification, subject, isbn) in ROWS {
        let fulltext = format!(
            "{title} {author} {} {subject} {classification} كتاب",
            publisher.unwrap_or_default()
        );
        conn.execute(
            "INSERT INTO books VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![record_id, title, author, publisher, year, pages, classification, subject, isbn, fulltext],
        )
        .expect("insert row");
    }

    Fixture { _dir: dir, db_path }
}
