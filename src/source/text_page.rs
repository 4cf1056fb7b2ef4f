//! In-memory pages built from positioned text runs.

use crate::error::{Error, Result};
use crate::geometry::{BBox, Glyph, Layout};

use super::{Page, Source};

/// Width of one character as a fraction of the font size.
const ADVANCE_RATIO: f32 = 0.5;

/// A page whose layout is already known.
///
/// Used for pages produced elsewhere (another extractor, a cache) and for
/// tests, where score sheets are laid out glyph by glyph.
#[derive(Debug, Clone)]
pub struct TextPage {
    number: u32,
    bbox: BBox,
    layout: std::result::Result<Layout, String>,
}

impl TextPage {
    /// Create an empty page.
    pub fn new(number: u32, bbox: BBox) -> Self {
        Self {
            number,
            bbox,
            layout: Ok(Layout::default()),
        }
    }

    /// Create a page from an existing layout.
    pub fn from_layout(number: u32, bbox: BBox, layout: Layout) -> Self {
        Self {
            number,
            bbox,
            layout: Ok(layout),
        }
    }

    /// Create a page whose text cannot be extracted.
    pub fn unreadable(number: u32, bbox: BBox, reason: impl Into<String>) -> Self {
        Self {
            number,
            bbox,
            layout: Err(reason.into()),
        }
    }

    /// Add a run of text starting at `(x0, top)`.
    ///
    /// Every character, spaces included, advances by half the font size.
    pub fn with_text_run(mut self, text: &str, x0: f32, top: f32, font_size: f32) -> Self {
        if let Ok(layout) = &mut self.layout {
            let advance = font_size * ADVANCE_RATIO;
            for (i, c) in text.chars().enumerate() {
                let x = x0 + i as f32 * advance;
                layout.glyphs.push(Glyph {
                    text: c.to_string(),
                    x0: x,
                    x1: x + advance,
                    top,
                    bottom: top + font_size,
                    size: font_size,
                });
            }
        }
        self
    }

    /// Add a ruled rectangle.
    pub fn with_rect(mut self, rect: BBox) -> Self {
        if let Ok(layout) = &mut self.layout {
            layout.rules.push(rect);
        }
        self
    }
}

impl Page for TextPage {
    fn number(&self) -> u32 {
        self.number
    }

    fn bbox(&self) -> BBox {
        self.bbox
    }

    fn layout(&self) -> Result<&Layout> {
        self.layout
            .as_ref()
            .map_err(|reason| Error::TextExtract(reason.clone()))
    }
}

/// A named, ordered collection of [`TextPage`]s.
#[derive(Debug, Clone, Default)]
pub struct TextDocument {
    name: String,
    pages: Vec<TextPage>,
}

impl TextDocument {
    /// Create a document from pages; they are served in the given order.
    pub fn new(name: impl Into<String>, pages: Vec<TextPage>) -> Self {
        Self {
            name: name.into(),
            pages,
        }
    }

    /// Append a page.
    pub fn push(&mut self, page: TextPage) {
        self.pages.push(page);
    }
}

impl Source for TextDocument {
    fn name(&self) -> &str {
        &self.name
    }

    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page(&self, number: u32) -> Result<Box<dyn Page + '_>> {
        let index = number
            .checked_sub(1)
            .ok_or(Error::PageOutOfRange(number, self.page_count()))?;
        let page = self
            .pages
            .get(index as usize)
            .ok_or(Error::PageOutOfRange(number, self.page_count()))?;
        Ok(Box::new(page.clone()))
    }
}
