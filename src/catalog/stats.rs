//! Aggregate queries over the catalog.
//!
//! Distinct counts and top-N lists skip `NULL` and `'nan'` values.

use rusqlite::{Connection, OptionalExtension};

use super::book::column_text;
use super::{Catalog, TABLE};
use crate::error::AppError;

const TOP_N: i64 = 5;

/// Overview shown by the `/stats` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSummary {
    pub total_books: u64,
    pub total_authors: u64,
    /// `(title, year)` of the record with the smallest `year`.
    pub oldest: Option<(String, String)>,
    /// `(title, year)` of the record with the largest `year`.
    pub newest: Option<(String, String)>,
    pub top_subjects: Vec<(String, u64)>,
}

/// Detailed figures returned for statistics questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogStats {
    pub total_books: u64,
    pub total_authors: u64,
    pub total_publishers: u64,
    pub total_classifications: u64,
    pub total_subjects: u64,
    pub top_authors: Vec<(String, u64)>,
    pub top_subjects: Vec<(String, u64)>,
}

impl Catalog {
    pub fn summary(&self) -> Result<CatalogSummary, AppError> {
        let conn = self.connect()?;
        Ok(CatalogSummary {
            total_books: count_all(&conn)?,
            total_authors: count_distinct(&conn, "author")?,
            oldest: year_extreme(&conn, "ASC")?,
            newest: year_extreme(&conn, "DESC")?,
            top_subjects: top_values(&conn, "subject")?,
        })
    }

    pub fn detailed_stats(&self) -> Result<CatalogStats, AppError> {
        let conn = self.connect()?;
        Ok(CatalogStats {
            total_books: count_all(&conn)?,
            total_authors: count_distinct(&conn, "author")?,
            total_publishers: count_distinct(&conn, "publisher")?,
            total_classifications: count_distinct(&conn, "classification")?,
            total_subjects: count_distinct(&conn, "subject")?,
            top_authors: top_values(&conn, "author")?,
            top_subjects: top_values(&conn, "subject")?,
        })
    }
}

fn count_all(conn: &Connection) -> Result<u64, AppError> {
    let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {TABLE}"), [], |row| row.get(0))?;
    Ok(n.max(0) as u64)
}

// `column` is always one of the fixed names above, never user input.
fn count_distinct(conn: &Connection, column: &str) -> Result<u64, AppError> {
    let n: i64 = conn.query_row(
        &format!(
            "SELECT COUNT(DISTINCT {column}) FROM {TABLE} \
             WHERE {column} IS NOT NULL AND {column} != 'nan' AND {column} != ''"
        ),
        [],
        |row| row.get(0),
    )?;
    Ok(n.max(0) as u64)
}

fn year_extreme(conn: &Connection, order: &str) -> Result<Option<(String, String)>, AppError> {
    let row = conn
        .query_row(
            &format!(
                "SELECT title, year FROM {TABLE} \
                 WHERE year IS NOT NULL AND year != 'nan' AND year != '' \
                 ORDER BY year {order} LIMIT 1"
            ),
            [],
            |row| Ok((column_text(row, 0)?, column_text(row, 1)?)),
        )
        .optional()?;
    Ok(row.and_then(|(title, year)| Some((title.unwrap_or_default(), year?))))
}

fn top_values(conn: &Connection, column: &str) -> Result<Vec<(String, u64)>, AppError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {column}, COUNT(*) AS n FROM {TABLE} \
         WHERE {column} IS NOT NULL AND {column} != 'nan' AND {column} != '' \
         GROUP BY {column} ORDER BY n DESC, {column} ASC LIMIT ?1"
    ))?;
    let rows = stmt.query_map([TOP_N], |row| {
        let n: i64 = row.get(1)?;
        Ok((column_text(row, 0)?, n.max(0) as u64))
    })?;

    let mut values = Vec::new();
    for row in rows {
        if let (Some(value), n) = row? {
            values.push((value, n));
        }
    }
    Ok(values)
}
