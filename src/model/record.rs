//! Performance records.

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{ComponentRow, ElementRow, HeaderMetadata};

/// Key of the TOTAL row in [`PerformanceRecord::elements`].
pub const TOTAL_KEY: &str = "total";

/// One skater's performance in one segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    /// Page the score sheet was read from (1-based)
    pub page: u32,
    /// Header block
    pub header: HeaderMetadata,
    /// Elements keyed by sequence number, TOTAL row last under `"total"`
    pub elements: IndexMap<String, ElementRow>,
    /// Components keyed by normalized name, TOTAL row excluded
    pub components: IndexMap<String, ComponentRow>,
    /// `2 × TOTAL panel score − Σ panel scores` of the elements table
    pub discrepancy: f64,
    /// Page and context enrichment
    pub metadata: RecordMetadata,
}

impl PerformanceRecord {
    /// The elements TOTAL row.
    pub fn elements_total(&self) -> Option<&ElementRow> {
        self.elements.get(TOTAL_KEY)
    }

    /// Executed elements, TOTAL row excluded.
    pub fn executed_elements(&self) -> impl Iterator<Item = (&String, &ElementRow)> {
        self.elements.iter().filter(|(key, _)| key.as_str() != TOTAL_KEY)
    }

    /// Program (segment) name, if known.
    pub fn program(&self) -> Option<&str> {
        self.metadata.program.as_deref()
    }
}

/// Fields derived from the page text and the caller's context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    /// Program / segment name taken from the page heading
    pub program: Option<String>,
    /// Competition name
    pub competition: Option<String>,
    /// Host city
    pub city: Option<String>,
    /// Competition type
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Season label, e.g. "2022 - 2023"
    pub season: Option<String>,
    /// First day of the competition
    pub start: Option<NaiveDate>,
    /// Last day of the competition
    pub end: Option<NaiveDate>,
    /// Number of entries in the program
    pub entry_count: Option<usize>,
    /// Club of the skater; empty when the name is not in the entries
    pub club: Option<String>,
}
