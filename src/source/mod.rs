//! Page sources.
//!
//! The parser never touches a concrete PDF library. It sees pages through the
//! [`Page`] trait (text, crop, words, table structure) and documents through
//! [`Source`]. Two implementations ship with the crate: [`TextPage`] /
//! [`TextDocument`] for in-memory pages and [`PdfDocument`] for real files.

pub mod interp;
mod pdf;
mod text_page;

pub use pdf::{PdfDocument, PdfPage};
pub use text_page::{TextDocument, TextPage};

use crate::error::Result;
use crate::geometry::{BBox, Layout, Word};
use crate::table::{find_tables, DetectedTable};

/// A read-only page exposing positioned text and ruled geometry.
pub trait Page {
    /// 1-based page number within its document.
    fn number(&self) -> u32;

    /// Page bounds in top-left coordinates.
    fn bbox(&self) -> BBox;

    /// Positioned glyphs and rules of the whole page.
    ///
    /// Fails with [`crate::Error::TextExtract`] when the page content cannot
    /// be interpreted.
    fn layout(&self) -> Result<&Layout>;

    /// Plain page text, one line per visual text line.
    fn extract_text(&self) -> Result<String> {
        Ok(self.layout()?.text())
    }

    /// Word tokens of the whole page in reading order.
    fn words(&self) -> Result<Vec<Word>> {
        Ok(self.layout()?.words())
    }

    /// Content inside `bbox`.
    fn crop(&self, bbox: BBox) -> Result<Layout> {
        Ok(self.layout()?.crop(bbox))
    }

    /// Ruled tables found on the page, top to bottom.
    fn find_tables(&self) -> Result<Vec<DetectedTable>> {
        Ok(find_tables(self.layout()?))
    }
}

/// A document: a name and an ordered sequence of pages.
///
/// Sources are shared across the rayon pool during parallel parsing, hence
/// the `Sync` bound.
pub trait Source: Sync {
    /// Display name used in reports (usually the file name).
    fn name(&self) -> &str;

    /// Number of pages.
    fn page_count(&self) -> u32;

    /// Open page `number` (1-based).
    fn page(&self, number: u32) -> Result<Box<dyn Page + '_>>;
}
