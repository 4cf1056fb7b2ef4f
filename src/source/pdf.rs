//! lopdf-backed page source.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

use lopdf::{Document as LopdfDocument, Object, ObjectId};

use crate::detect;
use crate::error::{Error, Result};
use crate::geometry::{BBox, Layout};

use super::interp::{self, PageFrame};
use super::{Page, Source};

/// US Letter, used when a page declares no MediaBox anywhere in its tree.
const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// Bound on Parent links followed while resolving inherited attributes.
const MAX_INHERIT_DEPTH: usize = 32;

/// A PDF file loaded into memory.
///
/// The file handle is only held while loading; once constructed, the
/// document is plain data and can be shared across threads.
pub struct PdfDocument {
    name: String,
    doc: LopdfDocument,
    pages: BTreeMap<u32, ObjectId>,
}

impl PdfDocument {
    /// Open a PDF file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        detect::sniff_pdf_version(path)?;
        let doc = LopdfDocument::load(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Self::from_lopdf(name, doc)
    }

    /// Load a PDF from an in-memory byte slice.
    pub fn from_bytes(name: impl Into<String>, data: &[u8]) -> Result<Self> {
        detect::pdf_version(data)?;
        let doc = LopdfDocument::load_mem(data)?;
        Self::from_lopdf(name.into(), doc)
    }

    fn from_lopdf(name: String, doc: LopdfDocument) -> Result<Self> {
        if doc.is_encrypted() {
            return Err(Error::Encrypted);
        }
        let pages = doc.get_pages();
        log::debug!("{}: {} pages", name, pages.len());
        Ok(Self { name, doc, pages })
    }

    /// PDF version declared by the file.
    pub fn version(&self) -> String {
        self.doc.version.to_string()
    }

    fn media_box(&self, page_id: ObjectId) -> [f32; 4] {
        let mut current = self.doc.get_dictionary(page_id).ok();
        for _ in 0..MAX_INHERIT_DEPTH {
            let Some(dict) = current else { break };
            if let Some(media_box) = dict
                .get(b"MediaBox")
                .ok()
                .and_then(|obj| self.resolve(obj))
                .and_then(read_rect)
            {
                return media_box;
            }
            current = dict
                .get(b"Parent")
                .ok()
                .and_then(|parent| parent.as_reference().ok())
                .and_then(|id| self.doc.get_dictionary(id).ok());
        }
        DEFAULT_MEDIA_BOX
    }

    fn resolve<'a>(&'a self, obj: &'a Object) -> Option<&'a Object> {
        match obj {
            Object::Reference(id) => self.doc.get_object(*id).ok(),
            other => Some(other),
        }
    }
}

impl Source for PdfDocument {
    fn name(&self) -> &str {
        &self.name
    }

    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page(&self, number: u32) -> Result<Box<dyn Page + '_>> {
        let id = *self
            .pages
            .get(&number)
            .ok_or(Error::PageOutOfRange(number, self.page_count()))?;
        let [llx, lly, urx, ury] = self.media_box(id);
        Ok(Box::new(PdfPage {
            doc: self,
            number,
            id,
            frame: PageFrame {
                origin_x: llx.min(urx),
                top_y: lly.max(ury),
            },
            bbox: BBox::new(0.0, 0.0, (urx - llx).abs(), (ury - lly).abs()),
            layout: OnceLock::new(),
        }))
    }
}

/// One page of a [`PdfDocument`].
///
/// The content stream is interpreted on first use and cached for the
/// lifetime of the page.
pub struct PdfPage<'a> {
    doc: &'a PdfDocument,
    number: u32,
    id: ObjectId,
    frame: PageFrame,
    bbox: BBox,
    layout: OnceLock<std::result::Result<Layout, String>>,
}

impl Page for PdfPage<'_> {
    fn number(&self) -> u32 {
        self.number
    }

    fn bbox(&self) -> BBox {
        self.bbox
    }

    fn layout(&self) -> Result<&Layout> {
        self.layout
            .get_or_init(|| {
                interp::interpret_page(&self.doc.doc, self.id, self.frame)
                    .map_err(|e| e.to_string())
            })
            .as_ref()
            .map_err(|reason| Error::TextExtract(reason.clone()))
    }
}

fn read_rect(obj: &Object) -> Option<[f32; 4]> {
    let arr = obj.as_array().ok()?;
    if arr.len() != 4 {
        return None;
    }
    let mut rect = [0.0f32; 4];
    for (slot, value) in rect.iter_mut().zip(arr) {
        *slot = interp::number(value)?;
    }
    Some(rect)
}
