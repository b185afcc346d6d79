//! Record shapes read from the `books` table.
//!
//! Every column is optional in practice: upstream imports left `NULL`,
//! empty strings and the literal `"nan"` in place of missing values. Rows are
//! normalised on read so callers only ever see `Option<String>`.

use rusqlite::Row;
use rusqlite::types::ValueRef;
use serde::Serialize;

/// Placeholder the catalog import wrote for missing values.
pub const ABSENT_PLACEHOLDER: &str = "nan";

/// Six-column projection used by search listings.
///
/// `extra` is the classification, except for subject searches where it
/// carries the subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookSummary {
    pub record_id: String,
    pub title: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub year: Option<String>,
    pub extra: Option<String>,
}

/// Full record returned by a record-id lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookDetail {
    pub record_id: String,
    pub title: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub year: Option<String>,
    pub pages: Option<String>,
    pub classification: Option<String>,
    pub subject: Option<String>,
    pub isbn: Option<String>,
}

/// Row excerpt handed to the language model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookContext {
    pub record_id: String,
    pub title: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub year: Option<String>,
    pub classification: Option<String>,
    pub subject: Option<String>,
    pub pages: Option<String>,
}

/// Normalise a raw column value: `None`, blank and `"nan"` are absent.
pub fn present(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != ABSENT_PLACEHOLDER)
}

/// Read column `idx` as display text regardless of its storage class.
///
/// Whole-valued reals (`1400.0`, as left by spreadsheet imports) render
/// without the fractional part.
pub(crate) fn column_text(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<String>> {
    let text = match row.get_ref(idx)? {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) if f.fract() == 0.0 && f.is_finite() => Some(format!("{f:.0}")),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Some(String::from_utf8_lossy(bytes).into_owned())
        }
    };
    Ok(present(text.as_deref()).map(str::to_string))
}

/// Record ids are always shown, even when the stored value is blank.
pub(crate) fn record_id_text(row: &Row<'_>, idx: usize) -> rusqlite::Result<String> {
    Ok(column_text(row, idx)?.unwrap_or_default())
}

impl BookSummary {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            record_id: record_id_text(row, 0)?,
            title: column_text(row, 1)?,
            author: column_text(row, 2)?,
            publisher: column_text(row, 3)?,
            year: column_text(row, 4)?,
            extra: column_text(row, 5)?,
        })
    }
}

impl BookDetail {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            record_id: record_id_text(row, 0)?,
            title: column_text(row, 1)?,
            author: column_text(row, 2)?,
            publisher: column_text(row, 3)?,
            year: column_text(row, 4)?,
            pages: column_text(row, 5)?,
            classification: column_text(row, 6)?,
            subject: column_text(row, 7)?,
            isbn: column_text(row, 8)?,
        })
    }
}

impl BookContext {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            record_id: record_id_text(row, 0)?,
            title: column_text(row, 1)?,
            author: column_text(row, 2)?,
            publisher: column_text(row, 3)?,
            year: column_text(row, 4)?,
            classification: column_text(row, 5)?,
            subject: column_text(row, 6)?,
            pages: column_text(row, 7)?,
        })
    }
}
