//! # skatesheet
//!
//! Structured, cross-validated performance records from figure-skating
//! judging protocols.
//!
//! Judging protocols are fixed-layout PDF pages with no reliable
//! delimiters. This library rebuilds each score sheet's header, elements and
//! program components tables from word positions, coerces every cell to a
//! typed value, checks the arithmetic invariants of each table and returns
//! one [`PerformanceRecord`] per skater.
//!
//! ## Quick Start
//!
//! ```no_run
//! use skatesheet::{parse_file, render, ParseOptions};
//!
//! fn main() -> skatesheet::Result<()> {
//!     let report = parse_file("protocol.pdf", None, &ParseOptions::default())?;
//!     for record in &report.records {
//!         println!("{} {}", record.header.rank, record.header.name);
//!     }
//!     println!("{}", render::to_json(&report, render::JsonFormat::Pretty)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Delimiter-free tables**: column boundaries come from header word anchors
//! - **Typed rows**: fixed column schemas for header, elements and components
//! - **Cross-validation**: base value and weighted component totals are checked
//! - **Itemized failures**: broken tables are reported per page, never dropped silently
//! - **Parallel processing**: pages are parsed on the rayon pool

pub mod context;
pub mod detect;
pub mod error;
pub mod geometry;
pub mod model;
pub mod parser;
pub mod render;
pub mod source;
pub mod table;

pub use context::{EntriesTable, EntryRow, ParseContext};
pub use error::{Error, FailureKind, Result, SubTable};
pub use model::{
    ComponentRow, ElementRow, HeaderMetadata, PerformanceRecord, RankCode, RecordMetadata,
};
pub use parser::{
    parse_document, parse_file, parse_files, parse_outcome, parse_page, DocumentOutcome,
    DocumentReport, ErrorMode, PageClass, PageFailure, PageReport, PageSelection, ParseOptions,
    SkipReason, SkippedPage,
};
pub use render::JsonFormat;
pub use source::{Page, PdfDocument, Source, TextDocument, TextPage};

use std::path::Path;

/// Parse a PDF held in memory.
///
/// # Example
///
/// ```no_run
/// use skatesheet::{parse_bytes, ParseOptions};
///
/// let data = std::fs::read("protocol.pdf").unwrap();
/// let report = parse_bytes("protocol.pdf", &data, None, &ParseOptions::default()).unwrap();
/// println!("{} records", report.records.len());
/// ```
pub fn parse_bytes(
    name: &str,
    data: &[u8],
    context: Option<&ParseContext>,
    options: &ParseOptions,
) -> Result<DocumentReport> {
    let document = PdfDocument::from_bytes(name, data)?;
    parse_document(&document, context, options)
}

/// Builder bundling parse options and an optional context.
///
/// # Example
///
/// ```no_run
/// use skatesheet::Skatesheet;
///
/// let outcomes = Skatesheet::new()
///     .strict()
///     .with_context_file("context.json")?
///     .parse_all(&["men.pdf", "ladies.pdf"]);
/// # Ok::<(), skatesheet::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Skatesheet {
    options: ParseOptions,
    context: Option<ParseContext>,
}

impl Skatesheet {
    /// Create a builder with default options and no context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail documents on the first table failure.
    pub fn strict(mut self) -> Self {
        self.options = self.options.strict();
        self
    }

    /// Disable parallel page parsing.
    pub fn sequential(mut self) -> Self {
        self.options = self.options.sequential();
        self
    }

    /// Restrict parsing to some pages.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.options = self.options.with_pages(pages);
        self
    }

    /// Replace the parse options.
    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    /// Enrich records with a context.
    pub fn with_context(mut self, context: ParseContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Load the context from a JSON file.
    pub fn with_context_file<P: AsRef<Path>>(self, path: P) -> Result<Self> {
        Ok(self.with_context(ParseContext::load(path)?))
    }

    /// Current options.
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Parse one file.
    pub fn parse<P: AsRef<Path>>(&self, path: P) -> Result<DocumentReport> {
        parse_file(path, self.context.as_ref(), &self.options)
    }

    /// Parse any page source.
    pub fn parse_source<S: Source + ?Sized>(&self, source: &S) -> Result<DocumentReport> {
        parse_document(source, self.context.as_ref(), &self.options)
    }

    /// Parse many files, one outcome per path.
    pub fn parse_all<P: AsRef<Path>>(&self, paths: &[P]) -> Vec<DocumentOutcome> {
        parse_files(paths, self.context.as_ref(), &self.options)
    }
}
