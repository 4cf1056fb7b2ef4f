//! Caller-supplied parse context.
//!
//! Protocol PDFs do not carry the competition's identity, only the segment
//! heading. The context fills in the rest (competition, dates, entries
//! published on the event website) so records can be enriched.

use std::fs;
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::error::{Error, Result};

/// Competition identity and entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseContext {
    /// Competition name
    pub competition: String,
    /// Host city
    #[serde(default)]
    pub city: String,
    /// Competition type
    #[serde(rename = "type", default)]
    pub kind: String,
    /// First day of the competition
    pub start: NaiveDate,
    /// Last day of the competition
    pub end: NaiveDate,
    /// Entries per category
    #[serde(default)]
    pub entries: EntriesTable,
}

impl ParseContext {
    /// Create a context without entries.
    pub fn new(competition: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            competition: competition.into(),
            city: String::new(),
            kind: String::new(),
            start,
            end,
            entries: EntriesTable::default(),
        }
    }

    /// Set the host city.
    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = city.into();
        self
    }

    /// Set the competition type.
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    /// Set the entries table.
    pub fn with_entries(mut self, entries: EntriesTable) -> Self {
        self.entries = entries;
        self
    }

    /// Parse a context from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let context: ParseContext = serde_json::from_str(json)?;
        context.validate()?;
        Ok(context)
    }

    /// Load a context from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    fn validate(&self) -> Result<()> {
        if self.end < self.start {
            return Err(Error::InvalidContext(format!(
                "competition ends ({}) before it starts ({})",
                self.end, self.start
            )));
        }
        Ok(())
    }

    /// Season label of the competition.
    pub fn season(&self) -> String {
        season_label(self.start)
    }
}

/// Season label for a competition starting on `start`.
///
/// Seasons turn over on July 1st: a competition starting after that day
/// belongs to "Y - Y+1", anything up to and including it to "Y-1 - Y".
pub fn season_label(start: NaiveDate) -> String {
    let year = start.year();
    if (start.month(), start.day()) > (7, 1) {
        format!("{} - {}", year, year + 1)
    } else {
        format!("{} - {}", year - 1, year)
    }
}

/// One athlete entered in a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRow {
    /// Category label ("Senior Men", "Novice Advanced Girls", ...)
    pub category: String,
    /// Full name as published
    pub full_name: String,
    /// Upper-case words of the full name
    #[serde(default)]
    pub surname: String,
    /// Remaining words of the full name
    #[serde(default)]
    pub first_name: String,
    /// Club; may be empty
    #[serde(default)]
    pub club: String,
    /// Nationality code
    #[serde(default)]
    pub nationality: String,
}

impl EntryRow {
    /// Build a row from a raw entries-list cell, collapsing repeated spaces
    /// and splitting the name into surname and first name.
    pub fn from_raw(category: &str, name: &str, club: &str, nationality: &str) -> Option<Self> {
        let words: Vec<&str> = name.split_whitespace().collect();
        if words.is_empty() {
            return None;
        }
        let (surname, first_name): (Vec<&str>, Vec<&str>) =
            words.iter().copied().partition(|w| is_upper_word(w));
        Some(Self {
            category: category.trim().to_string(),
            full_name: words.join(" "),
            surname: surname.join(" "),
            first_name: first_name.join(" "),
            club: club.trim().to_string(),
            nationality: nationality.trim().to_string(),
        })
    }
}

/// A word counts as upper-case when it has cased letters and none of them
/// is lower-case ("DUPONT", "O'NEIL").
fn is_upper_word(word: &str) -> bool {
    word.chars().any(char::is_uppercase) && !word.chars().any(char::is_lowercase)
}

/// Entries of a competition, all categories together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntriesTable {
    rows: Vec<EntryRow>,
}

impl EntriesTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row.
    pub fn push(&mut self, row: EntryRow) {
        self.rows.push(row);
    }

    /// Append a raw entries-list row; rows without a name are ignored.
    pub fn push_raw(&mut self, category: &str, name: &str, club: &str, nationality: &str) {
        if let Some(row) = EntryRow::from_raw(category, name, club, nationality) {
            self.rows.push(row);
        }
    }

    /// All rows.
    pub fn rows(&self) -> &[EntryRow] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Count entries whose category label prefixes `program`
    /// (case-insensitive). The label is matched literally.
    pub fn count_matching(&self, program: &str) -> usize {
        self.rows
            .iter()
            .filter(|row| category_matches(&row.category, program))
            .count()
    }

    /// Club of the first entry whose full name equals `name`.
    pub fn club_of(&self, name: &str) -> Option<&str> {
        let wanted: String = name.trim().nfc().collect();
        self.rows
            .iter()
            .find(|row| row.full_name.nfc().eq(wanted.chars()))
            .map(|row| row.club.as_str())
    }
}

impl FromIterator<EntryRow> for EntriesTable {
    fn from_iter<I: IntoIterator<Item = EntryRow>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

fn category_matches(category: &str, program: &str) -> bool {
    let pattern = format!("^{}", regex::escape(category.trim()));
    match RegexBuilder::new(&pattern).case_insensitive(true).build() {
        Ok(re) => re.is_match(program),
        Err(e) => {
            log::warn!("Unusable category label {:?}: {}", category, e);
            false
        }
    }
}
