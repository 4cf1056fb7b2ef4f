//! Error types for skatesheet.

use std::fmt;
use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for skatesheet operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The three stacked sub-tables of one score sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubTable {
    /// Rank, name, nation and segment totals.
    Header,
    /// Executed elements with per-judge GOE marks.
    Elements,
    /// Program components with per-judge marks.
    Components,
}

impl fmt::Display for SubTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SubTable::Header => "header",
            SubTable::Elements => "elements",
            SubTable::Components => "components",
        };
        f.write_str(name)
    }
}

/// Serializable tag describing why a table produced no record.
///
/// Pages skipped for lack of a score sheet are not failures; they are
/// reported through [`crate::SkipReason`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Page text could not be extracted.
    Unreadable,
    /// A detected table does not split into header/elements/components.
    MalformedTable,
    /// A sub-table has the wrong number of rows or columns.
    Shape,
    /// A header label used as geometric anchor is missing.
    MissingAnchor,
    /// A cell failed every coercion rule of its column.
    Coercion,
    /// An arithmetic invariant was violated beyond tolerance.
    Invariant,
    /// The document itself could not be processed.
    Document,
}

/// Error types that can occur while reading protocols.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file format is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF document is encrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// Error extracting text content.
    #[error("Text extraction error: {0}")]
    TextExtract(String),

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The parse context is unusable.
    #[error("Invalid parse context: {0}")]
    InvalidContext(String),

    /// A detected table does not decompose into exactly three row groups.
    #[error("Malformed table: expected {expected} row groups, found {found}")]
    MalformedTable { expected: usize, found: usize },

    /// A sub-table has an unexpected number of rows or columns.
    #[error("Malformed {table} table: {detail}")]
    TableShape { table: SubTable, detail: String },

    /// A header label could not be located on the page.
    #[error("Missing anchor '{label}' in {table} table")]
    MissingAnchor { table: SubTable, label: String },

    /// A cell could not be coerced to its column type.
    #[error("Invalid value '{value}' in column '{column}' of {table} table")]
    InvalidCell {
        table: SubTable,
        column: &'static str,
        value: String,
    },

    /// An arithmetic invariant of a sub-table does not hold.
    #[error("Invariant violated in {table} table: {detail}")]
    Invariant { table: SubTable, detail: String },
}

impl Error {
    /// Classify the error into a serializable failure tag.
    pub fn kind(&self) -> FailureKind {
        match self {
            Error::TextExtract(_) => FailureKind::Unreadable,
            Error::MalformedTable { .. } => FailureKind::MalformedTable,
            Error::TableShape { .. } => FailureKind::Shape,
            Error::MissingAnchor { .. } => FailureKind::MissingAnchor,
            Error::InvalidCell { .. } => FailureKind::Coercion,
            Error::Invariant { .. } => FailureKind::Invariant,
            _ => FailureKind::Document,
        }
    }

    /// The sub-table the error belongs to, if it is table-scoped.
    pub fn sub_table(&self) -> Option<SubTable> {
        match self {
            Error::TableShape { table, .. }
            | Error::MissingAnchor { table, .. }
            | Error::InvalidCell { table, .. }
            | Error::Invariant { table, .. } => Some(*table),
            _ => None,
        }
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}
