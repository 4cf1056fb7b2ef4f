//! Page classification.

use serde::{Deserialize, Serialize};

use crate::source::Page;

/// What a page turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageClass {
    /// No text, or no score sheet marker
    NotScoreSheet,
    /// Text extraction failed
    Unreadable,
    /// Carries the score sheet marker
    ScoreSheet,
}

/// Outcome of classifying one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// The page has no text or lacks the marker.
    NotScoreSheet,
    /// Text extraction failed with the given reason.
    Unreadable(String),
    /// The page carries the marker; its text is kept for the assembler.
    ScoreSheet(String),
}

impl Classification {
    /// The serializable class tag.
    pub fn class(&self) -> PageClass {
        match self {
            Classification::NotScoreSheet => PageClass::NotScoreSheet,
            Classification::Unreadable(_) => PageClass::Unreadable,
            Classification::ScoreSheet(_) => PageClass::ScoreSheet,
        }
    }
}

/// Classify a page by looking for `marker` in its text.
pub fn classify(page: &dyn Page, marker: &str) -> Classification {
    let text = match page.extract_text() {
        Ok(text) => text,
        Err(e) => {
            log::warn!("Cannot read page {}: {}", page.number(), e);
            return Classification::Unreadable(e.to_string());
        }
    };

    if text.trim().is_empty() {
        log::debug!("Cannot find text on page {}", page.number());
        return Classification::NotScoreSheet;
    }

    if !text.contains(marker) {
        log::debug!("Cannot find score sheets on page {}", page.number());
        return Classification::NotScoreSheet;
    }

    Classification::ScoreSheet(text)
}
