//! `catalog` — read-only access to the `books` table.
//!
//! The catalog is a pre-built SQLite file; this crate never writes to it.
//! Every operation opens its own connection, runs one or more parameterized
//! `SELECT`s and drops the connection again, so a [`Catalog`] is just a path
//! and clones freely across tasks.
//!
//! Search operations swallow database errors: the failure is logged and the
//! caller sees an empty result set. Aggregate operations in [`stats`]
//! propagate [`AppError::Catalog`] instead.

pub mod book;
pub mod stats;

use std::fmt;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags, params};
use tracing::{debug, error};

use crate::error::AppError;

pub use book::{BookContext, BookDetail, BookSummary, present};
pub use stats::{CatalogStats, CatalogSummary};

/// Name of the table every query targets.
pub const TABLE: &str = "books";

const BUSY_TIMEOUT_MS: i64 = 5000;

/// Which column a field-specific search matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    /// The denormalized `FULLTEXT_SEARCH` column.
    All,
    Title,
    Author,
    Subject,
    /// Exact match on `year`, not a substring match.
    Year,
}

impl SearchField {
    fn column(self) -> &'static str {
        match self {
            SearchField::All => "FULLTEXT_SEARCH",
            SearchField::Title => "title",
            SearchField::Author => "author",
            SearchField::Subject => "subject",
            SearchField::Year => "year",
        }
    }

    /// Column shown in the sixth slot of a [`BookSummary`].
    fn extra_column(self) -> &'static str {
        match self {
            SearchField::Subject => "subject",
            _ => "classification",
        }
    }
}

impl fmt::Display for SearchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SearchField::All => "all",
            SearchField::Title => "title",
            SearchField::Author => "author",
            SearchField::Subject => "subject",
            SearchField::Year => "year",
        };
        f.write_str(name)
    }
}

/// Handle to the catalog database file.
#[derive(Debug, Clone)]
pub struct Catalog {
    db_path: PathBuf,
}

impl Catalog {
    /// Open the catalog at `db_path`, verifying that the file exists and the
    /// `books` table is readable.
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let catalog = Self::unchecked(db_path);
        if !catalog.db_path.is_file() {
            return Err(AppError::Catalog(format!(
                "catalog database not found: {}",
                catalog.db_path.display()
            )));
        }
        let count = catalog.count()?;
        debug!(path = %catalog.db_path.display(), count, "catalog opened");
        Ok(catalog)
    }

    /// Build a handle without touching the file. Queries against a missing
    /// or broken database fail per call.
    pub fn unchecked(db_path: impl Into<PathBuf>) -> Self {
        Self { db_path: db_path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Open a read-only connection with a busy timeout.
    pub(crate) fn connect(&self) -> Result<Connection, AppError> {
        let conn = Connection::open_with_flags(
            &self.db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| AppError::Catalog(format!("open {}: {e}", self.db_path.display())))?;
        conn.pragma_update(None, "busy_timeout", BUSY_TIMEOUT_MS)
            .map_err(|e| AppError::Catalog(format!("set busy_timeout: {e}")))?;
        Ok(conn)
    }

    /// Substring search on one field (`year` is an exact match).
    pub fn search(&self, query: &str, field: SearchField, limit: usize) -> Vec<BookSummary> {
        let result = self.try_search(query, field, limit);
        swallow("search", result)
    }

    fn try_search(
        &self,
        query: &str,
        field: SearchField,
        limit: usize,
    ) -> Result<Vec<BookSummary>, AppError> {
        let conn = self.connect()?;
        let (predicate, term) = match field {
            SearchField::Year => ("year = ?1".to_string(), query.trim().to_string()),
            _ => (format!("{} LIKE ?1", field.column()), like_pattern(query)),
        };
        let sql = format!(
            "SELECT record_id, title, author, publisher, year, {extra} FROM {TABLE} WHERE {predicate} LIMIT ?2",
            extra = field.extra_column(),
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![term, limit as i64], BookSummary::from_row)?;
        let books = rows.collect::<Result<Vec<_>, _>>()?;
        debug!(%field, query, hits = books.len(), "field search");
        Ok(books)
    }

    /// Look up records whose id equals `record_id` or contains it.
    pub fn find_by_record_id(&self, record_id: &str) -> Vec<BookDetail> {
        let result = self.try_find_by_record_id(record_id);
        swallow("record lookup", result)
    }

    fn try_find_by_record_id(&self, record_id: &str) -> Result<Vec<BookDetail>, AppError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT record_id, title, author, publisher, year, pages, classification, subject, isbn \
             FROM {TABLE} WHERE record_id = ?1 OR record_id LIKE ?2"
        ))?;
        let rows = stmt.query_map(
            params![record_id, like_pattern(record_id)],
            BookDetail::from_row,
        )?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Match `query` against every textual column.
    ///
    /// A single word is tried against each column separately. Several words
    /// are joined into one `%w1%w2%` pattern, with an extra
    /// "first word in title and last word in author" arm.
    pub fn flexible_search(&self, query: &str, limit: usize) -> Vec<BookSummary> {
        let result = self.try_flexible_search(query, limit);
        swallow("flexible search", result)
    }

    fn try_flexible_search(&self, query: &str, limit: usize) -> Result<Vec<BookSummary>, AppError> {
        let words: Vec<&str> = query.split_whitespace().collect();
        let (Some(first), Some(last)) = (words.first(), words.last()) else {
            return Ok(Vec::new());
        };

        let conn = self.connect()?;
        let books = if words.len() == 1 {
            let mut stmt = conn.prepare(&format!(
                "SELECT DISTINCT record_id, title, author, publisher, year, classification \
                 FROM {TABLE} \
                 WHERE title LIKE ?1 OR author LIKE ?1 OR subject LIKE ?1 OR publisher LIKE ?1 \
                    OR classification LIKE ?1 OR record_id LIKE ?1 OR FULLTEXT_SEARCH LIKE ?1 \
                 LIMIT ?2"
            ))?;
            let rows = stmt.query_map(params![like_pattern(first), limit as i64], BookSummary::from_row)?;
            rows.collect::<Result<Vec<_>, _>>()?
        } else {
            let joined = format!("%{}%", words.join("%"));
            let mut stmt = conn.prepare(&format!(
                "SELECT DISTINCT record_id, title, author, publisher, year, classification \
                 FROM {TABLE} \
                 WHERE title LIKE ?1 OR author LIKE ?1 OR FULLTEXT_SEARCH LIKE ?1 \
                    OR (title LIKE ?2 AND author LIKE ?3) \
                 LIMIT ?4"
            ))?;
            let rows = stmt.query_map(
                params![joined, like_pattern(first), like_pattern(last), limit as i64],
                BookSummary::from_row,
            )?;
            rows.collect::<Result<Vec<_>, _>>()?
        };
        debug!(query, words = words.len(), hits = books.len(), "flexible search");
        Ok(books)
    }

    /// Rows used as language-model context for `query`.
    pub fn relevant_books(&self, query: &str, limit: usize) -> Vec<BookContext> {
        let result = self.try_relevant_books(query, limit);
        swallow("context search", result)
    }

    fn try_relevant_books(&self, query: &str, limit: usize) -> Result<Vec<BookContext>, AppError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT record_id, title, author, publisher, year, classification, subject, pages \
             FROM {TABLE} WHERE FULLTEXT_SEARCH LIKE ?1 LIMIT ?2"
        ))?;
        let rows = stmt.query_map(params![like_pattern(query), limit as i64], BookContext::from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Total number of records.
    pub fn count(&self) -> Result<u64, AppError> {
        let conn = self.connect()?;
        let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {TABLE}"), [], |row| row.get(0))?;
        Ok(n.max(0) as u64)
    }
}

/// `%term%`, with surrounding whitespace removed.
fn like_pattern(term: &str) -> String {
    format!("%{}%", term.trim())
}

/// Log a query failure and degrade it to "no results".
fn swallow<T>(operation: &str, result: Result<Vec<T>, AppError>) -> Vec<T> {
    result.unwrap_or_else(|e| {
        error!(operation, error = %e, "catalog query failed");
        Vec::new()
    })
}
