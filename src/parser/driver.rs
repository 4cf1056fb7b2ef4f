//! Document driver.
//!
//! Runs every selected page through classification, region location, grid
//! extraction, validation and assembly, then corrects entry counts across the
//! whole document. Pages are independent until that last pass, so they are
//! parsed on the rayon pool when [`ParseOptions::parallel`] is set.

use std::collections::HashMap;
use std::path::Path;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::context::ParseContext;
use crate::error::{Error, FailureKind, Result, SubTable};
use crate::geometry::Layout;
use crate::model::PerformanceRecord;
use crate::source::{Page, PdfDocument, Source};
use crate::table::DetectedTable;

use super::assemble::{assemble, program_name, read_sheet, SheetTables};
use super::classify::{classify, Classification, PageClass};
use super::options::{ErrorMode, ParseOptions};
use super::region::locate;

/// A table that produced no record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageFailure {
    /// Page number (1-based)
    pub page: u32,
    /// Table position on the page, when the failure is table-scoped
    pub table: Option<usize>,
    /// Failing sub-table, when known
    pub sub_table: Option<SubTable>,
    /// Failure tag
    pub kind: FailureKind,
    /// Human-readable description
    pub message: String,
}

impl PageFailure {
    fn new(page: u32, table: Option<usize>, err: &Error) -> Self {
        Self {
            page,
            table,
            sub_table: err.sub_table(),
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Why a page produced neither records nor failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No text or no marker
    NoScoreSheet,
    /// Text extraction failed
    Unreadable,
    /// Marker present but no ruled table found
    NoTables,
}

/// A page left out of the results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedPage {
    /// Page number (1-based)
    pub page: u32,
    /// Skip reason
    pub reason: SkipReason,
    /// Extraction error, for unreadable pages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Result of parsing one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageReport {
    /// Page number (1-based)
    pub page: u32,
    /// Classification of the page
    pub class: PageClass,
    /// Records in table order
    pub records: Vec<PerformanceRecord>,
    /// Tables that failed
    pub failures: Vec<PageFailure>,
    /// Set when the page was skipped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skipped: Option<SkippedPage>,
}

impl PageReport {
    fn skipped(page: u32, class: PageClass, reason: SkipReason, detail: Option<String>) -> Self {
        Self {
            page,
            class,
            records: Vec::new(),
            failures: Vec::new(),
            skipped: Some(SkippedPage {
                page,
                reason,
                detail,
            }),
        }
    }
}

/// Result of parsing one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentReport {
    /// Document name
    pub document: String,
    /// Number of pages examined
    pub pages: usize,
    /// Records in page order, then table order
    pub records: Vec<PerformanceRecord>,
    /// Tables that failed
    pub failures: Vec<PageFailure>,
    /// Pages without score sheets
    pub skipped: Vec<SkippedPage>,
}

impl DocumentReport {
    /// Merge page reports (in page order) and run the second pass.
    pub fn from_pages(document: impl Into<String>, reports: Vec<PageReport>) -> Self {
        let mut report = Self {
            document: document.into(),
            pages: reports.len(),
            records: Vec::new(),
            failures: Vec::new(),
            skipped: Vec::new(),
        };
        for page in reports {
            report.records.extend(page.records);
            report.failures.extend(page.failures);
            report.skipped.extend(page.skipped);
        }
        second_pass(&mut report.records);
        report
    }

    /// True when no table failed.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Records whose rank is a placement (not WD, DSQ or other codes).
    pub fn placed_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.header.rank_code().is_placed())
            .count()
    }
}

/// Outcome of parsing one document in a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DocumentOutcome {
    /// The document was read; individual tables may still have failed.
    Parsed(DocumentReport),
    /// The document could not be processed at all.
    Failed {
        /// Document name
        document: String,
        /// What went wrong
        reason: String,
    },
}

impl DocumentOutcome {
    /// Document name.
    pub fn document(&self) -> &str {
        match self {
            DocumentOutcome::Parsed(report) => &report.document,
            DocumentOutcome::Failed { document, .. } => document,
        }
    }

    /// The report, if the document was parsed.
    pub fn report(&self) -> Option<&DocumentReport> {
        match self {
            DocumentOutcome::Parsed(report) => Some(report),
            DocumentOutcome::Failed { .. } => None,
        }
    }

    fn from_result(document: String, result: Result<DocumentReport>) -> Self {
        match result {
            Ok(report) => DocumentOutcome::Parsed(report),
            Err(e) => {
                log::warn!("Failed to parse {}: {}", document, e);
                DocumentOutcome::Failed {
                    document,
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// Parse one detected table into validated sub-tables.
pub fn parse_table(layout: &Layout, table: &DetectedTable, index: usize) -> Result<SheetTables> {
    let region = locate(layout, table, index)?;
    read_sheet(layout, &region)
}

/// Parse every score sheet on a page.
///
/// In lenient mode table failures are itemized in the report. In strict mode
/// the first one is returned as the error. Pages without a score sheet are
/// never an error.
pub fn parse_page(
    page: &dyn Page,
    context: Option<&ParseContext>,
    options: &ParseOptions,
) -> Result<PageReport> {
    let number = page.number();
    let text = match classify(page, &options.marker) {
        Classification::ScoreSheet(text) => text,
        Classification::NotScoreSheet => {
            return Ok(PageReport::skipped(
                number,
                PageClass::NotScoreSheet,
                SkipReason::NoScoreSheet,
                None,
            ));
        }
        Classification::Unreadable(reason) => {
            return Ok(PageReport::skipped(
                number,
                PageClass::Unreadable,
                SkipReason::Unreadable,
                Some(reason),
            ));
        }
    };

    let layout = page.layout()?;
    let tables = page.find_tables()?;
    if tables.is_empty() {
        log::debug!("No tables on page {}", number);
        return Ok(PageReport::skipped(
            number,
            PageClass::ScoreSheet,
            SkipReason::NoTables,
            None,
        ));
    }

    let program = program_name(&text, &options.marker);
    let mut report = PageReport {
        page: number,
        class: PageClass::ScoreSheet,
        records: Vec::with_capacity(tables.len()),
        failures: Vec::new(),
        skipped: None,
    };

    for (index, table) in tables.iter().enumerate() {
        match parse_table(layout, table, index) {
            Ok(sheet) => {
                report
                    .records
                    .push(assemble(number, sheet, program.clone(), context));
            }
            Err(e) => {
                if options.error_mode == ErrorMode::Strict {
                    return Err(e);
                }
                log::warn!("Page {}, table {}: {}", number, index, e);
                report.failures.push(PageFailure::new(number, Some(index), &e));
            }
        }
    }

    log::debug!(
        "Page {}: {} records, {} failures",
        number,
        report.records.len(),
        report.failures.len()
    );
    Ok(report)
}

fn parse_page_number<S: Source + ?Sized>(
    source: &S,
    number: u32,
    context: Option<&ParseContext>,
    options: &ParseOptions,
) -> Result<PageReport> {
    match source.page(number) {
        Ok(page) => parse_page(page.as_ref(), context, options),
        Err(e) => {
            log::warn!("Cannot open page {}: {}", number, e);
            Ok(PageReport::skipped(
                number,
                PageClass::Unreadable,
                SkipReason::Unreadable,
                Some(e.to_string()),
            ))
        }
    }
}

/// Parse the selected pages of a document.
pub fn parse_document<S: Source + ?Sized>(
    source: &S,
    context: Option<&ParseContext>,
    options: &ParseOptions,
) -> Result<DocumentReport> {
    let numbers = options.pages.resolve(source.page_count());

    let reports = if options.parallel {
        numbers
            .par_iter()
            .map(|&n| parse_page_number(source, n, context, options))
            .collect::<Result<Vec<_>>>()?
    } else {
        numbers
            .iter()
            .map(|&n| parse_page_number(source, n, context, options))
            .collect::<Result<Vec<_>>>()?
    };

    let report = DocumentReport::from_pages(source.name(), reports);
    log::info!(
        "{}: {} records from {} pages ({} failures, {} skipped)",
        report.document,
        report.records.len(),
        report.pages,
        report.failures.len(),
        report.skipped.len()
    );
    Ok(report)
}

/// Open and parse a PDF file.
pub fn parse_file<P: AsRef<Path>>(
    path: P,
    context: Option<&ParseContext>,
    options: &ParseOptions,
) -> Result<DocumentReport> {
    let document = PdfDocument::open(path)?;
    parse_document(&document, context, options)
}

/// Parse a PDF file, turning any document-level error into
/// [`DocumentOutcome::Failed`].
pub fn parse_outcome<P: AsRef<Path>>(
    path: P,
    context: Option<&ParseContext>,
    options: &ParseOptions,
) -> DocumentOutcome {
    let path = path.as_ref();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    DocumentOutcome::from_result(name, parse_file(path, context, options))
}

/// Parse many files; one outcome per path, in input order.
pub fn parse_files<P: AsRef<Path>>(
    paths: &[P],
    context: Option<&ParseContext>,
    options: &ParseOptions,
) -> Vec<DocumentOutcome> {
    paths
        .iter()
        .map(|path| parse_outcome(path, context, options))
        .collect()
}

/// Overwrite each record's entry count with the number of records in the
/// same slice sharing its exact program name.
pub fn second_pass(records: &mut [PerformanceRecord]) {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for program in records.iter().filter_map(|r| r.program()) {
        *counts.entry(program.to_string()).or_default() += 1;
    }
    for record in records.iter_mut() {
        if let Some(count) = record.program().and_then(|p| counts.get(p)) {
            record.metadata.entry_count = Some(*count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BBox;
    use crate::model::{HeaderMetadata, RecordMetadata};
    use crate::source::{TextDocument, TextPage};
    use indexmap::IndexMap;

    fn record(program: Option<&str>, entry_count: Option<usize>) -> PerformanceRecord {
        PerformanceRecord {
            page: 1,
            header: HeaderMetadata {
                rank: "1".to_string(),
                name: "Jane DOE".to_string(),
                nation: "FRA".to_string(),
                starting_number: 1,
                total_segment_score: None,
                total_element_score: 0.0,
                total_component_score: None,
                total_deductions: None,
                bonification: 0.0,
                bonification_flag: false,
            },
            elements: IndexMap::new(),
            components: IndexMap::new(),
            discrepancy: 0.0,
            metadata: RecordMetadata {
                program: program.map(str::to_string),
                entry_count,
                ..RecordMetadata::default()
            },
        }
    }

    fn bbox() -> BBox {
        BBox::new(0.0, 0.0, 600.0, 400.0)
    }

    #[test]
    fn test_placed_count() {
        let mut withdrawn = record(None, None);
        withdrawn.header.rank = "WD".to_string();
        let report = DocumentReport {
            document: "protocol.pdf".to_string(),
            pages: 1,
            records: vec![record(None, None), withdrawn, record(None, None)],
            failures: Vec::new(),
            skipped: Vec::new(),
        };
        assert_eq!(report.placed_count(), 2);
    }

    #[test]
    fn test_second_pass_counts_equal_programs() {
        let mut records = vec![
            record(Some("Senior Men Free Skating"), Some(7)),
            record(Some("Senior Men Free Skating"), None),
            record(Some("Senior Men Short Program"), Some(7)),
        ];
        second_pass(&mut records);
        assert_eq!(records[0].metadata.entry_count, Some(2));
        assert_eq!(records[1].metadata.entry_count, Some(2));
        assert_eq!(records[2].metadata.entry_count, Some(1));
    }

    #[test]
    fn test_second_pass_leaves_unnamed_records() {
        let mut records = vec![record(None, Some(3))];
        second_pass(&mut records);
        assert_eq!(records[0].metadata.entry_count, Some(3));
    }

    #[test]
    fn test_skipped_pages() {
        let doc = TextDocument::new(
            "doc",
            vec![
                TextPage::new(1, bbox()),
                TextPage::unreadable(2, bbox(), "bad stream"),
                TextPage::new(3, bbox()).with_text_run("JUDGES DETAILS PER SKATER", 10.0, 5.0, 8.0),
            ],
        );
        let report = parse_document(&doc, None, &ParseOptions::default()).unwrap();
        assert_eq!(report.pages, 3);
        assert!(report.records.is_empty());
        assert!(report.is_complete());
        let reasons: Vec<_> = report.skipped.iter().map(|s| s.reason).collect();
        assert_eq!(
            reasons,
            vec![
                SkipReason::NoScoreSheet,
                SkipReason::Unreadable,
                SkipReason::NoTables
            ]
        );
        assert_eq!(report.skipped[1].detail.as_deref(), Some("Text extraction error: bad stream"));
    }

    #[test]
    fn test_page_selection() {
        let doc = TextDocument::new(
            "doc",
            (1..=5).map(|n| TextPage::new(n, bbox())).collect(),
        );
        let options = ParseOptions::default()
            .sequential()
            .with_pages(crate::parser::PageSelection::Pages(vec![2, 4]));
        let report = parse_document(&doc, None, &options).unwrap();
        assert_eq!(report.pages, 2);
        let pages: Vec<_> = report.skipped.iter().map(|s| s.page).collect();
        assert_eq!(pages, vec![2, 4]);
    }

    #[test]
    fn test_missing_file_is_failed_outcome() {
        let outcome = parse_outcome("/nonexistent/protocol.pdf", None, &ParseOptions::default());
        match outcome {
            DocumentOutcome::Failed { document, .. } => assert_eq!(document, "protocol.pdf"),
            other => panic!("Expected Failed, got {:?}", other),
        }
    }
}
