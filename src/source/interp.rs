//! Content-stream interpreter.
//!
//! Walks a page's content stream and records every shown glyph with its
//! bounding box, plus the rectangles and straight segments that are stroked
//! or filled. Only the operators that affect text placement or ruling are
//! interpreted; colour, clipping and images are ignored. Form XObjects
//! (`Do`) are not entered.

use std::collections::BTreeMap;

use lopdf::{Document as LopdfDocument, Object, ObjectId};

use crate::error::{Error, Result};
use crate::geometry::{BBox, Glyph, Layout};

/// Ascender and descender as a fraction of the font size.
const ASCENT: f32 = 0.8;
const DESCENT: f32 = 0.2;

/// Glyph width (in 1/1000 em) used when a font carries no width table.
const DEFAULT_GLYPH_WIDTH: f32 = 500.0;

/// Segments thinner than this (points) are treated as axis-aligned rules.
const AXIS_TOLERANCE: f32 = 0.5;

/// Maps PDF user space (bottom-left origin) to page space (top-left origin).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageFrame {
    /// Left edge of the MediaBox
    pub origin_x: f32,
    /// Top edge of the MediaBox
    pub top_y: f32,
}

impl PageFrame {
    fn x(&self, x: f32) -> f32 {
        x - self.origin_x
    }

    fn y(&self, y: f32) -> f32 {
        self.top_y - y
    }

    fn rect(&self, (x0, y0): (f32, f32), (x1, y1): (f32, f32)) -> BBox {
        BBox::new(
            self.x(x0.min(x1)),
            self.y(y0.max(y1)),
            self.x(x0.max(x1)),
            self.y(y0.min(y1)),
        )
    }
}

/// Affine transform `[a b c d e f]` in PDF row-vector convention.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32, // X translation
    f: f32, // Y translation
}

impl Default for Matrix {
    fn default() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }
}

impl Matrix {
    fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    fn translation(tx: f32, ty: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    fn from_operands(operands: &[Object]) -> Option<Self> {
        if operands.len() < 6 {
            return None;
        }
        Some(Self::new(
            number(&operands[0])?,
            number(&operands[1])?,
            number(&operands[2])?,
            number(&operands[3])?,
            number(&operands[4])?,
            number(&operands[5])?,
        ))
    }

    /// `self` applied first, then `other`.
    fn then(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            x * self.a + y * self.c + self.e,
            x * self.b + y * self.d + self.f,
        )
    }

    fn vertical_scale(&self) -> f32 {
        (self.c * self.c + self.d * self.d).sqrt()
    }
}

/// Width table of a simple font.
#[derive(Debug, Clone, Default)]
struct FontMetrics {
    first_char: i64,
    widths: Vec<f32>,
    two_byte: bool,
}

impl FontMetrics {
    fn load(doc: &LopdfDocument, font: &lopdf::Dictionary) -> Self {
        let two_byte = font
            .get(b"Subtype")
            .ok()
            .and_then(|o| o.as_name().ok())
            .is_some_and(|name| name == b"Type0");
        let first_char = font
            .get(b"FirstChar")
            .ok()
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(0);
        let widths = font
            .get(b"Widths")
            .ok()
            .and_then(|o| resolve(doc, o))
            .and_then(|o| o.as_array().ok())
            .map(|arr| arr.iter().map(|w| number(w).unwrap_or(0.0)).collect())
            .unwrap_or_default();
        Self {
            first_char,
            widths,
            two_byte,
        }
    }

    fn width(&self, code: Option<u32>) -> f32 {
        code.and_then(|code| {
            let index = i64::from(code) - self.first_char;
            usize::try_from(index).ok()
        })
        .and_then(|index| self.widths.get(index).copied())
        .filter(|w| *w > 0.0)
        .unwrap_or(DEFAULT_GLYPH_WIDTH)
    }
}

/// Text state parameters (PDF 32000-1, 9.3).
#[derive(Debug, Clone)]
struct TextState {
    font: Vec<u8>,
    size: f32,
    char_spacing: f32,
    word_spacing: f32,
    horizontal_scale: f32,
    leading: f32,
    rise: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font: Vec::new(),
            size: 12.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scale: 1.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct GraphicsState {
    ctm: Matrix,
    text: TextState,
}

/// Interpret the content stream of one page.
pub fn interpret_page(doc: &LopdfDocument, page_id: ObjectId, frame: PageFrame) -> Result<Layout> {
    let content = page_content(doc, page_id)?;
    if content.is_empty() {
        return Ok(Layout::default());
    }
    let fonts = doc
        .get_page_fonts(page_id)
        .map_err(|e| Error::TextExtract(e.to_string()))?;
    let encodings: BTreeMap<Vec<u8>, _> = fonts
        .iter()
        .filter_map(|(name, dict)| {
            dict.get_font_encoding(doc)
                .ok()
                .map(|enc| (name.clone(), enc))
        })
        .collect();
    let metrics: BTreeMap<Vec<u8>, FontMetrics> = fonts
        .iter()
        .map(|(name, dict)| (name.clone(), FontMetrics::load(doc, dict)))
        .collect();

    let operations = lopdf::content::Content::decode(&content)
        .map_err(|e| Error::TextExtract(e.to_string()))?
        .operations;

    let mut interp = Interpreter::new(frame);
    for op in &operations {
        let operands = op.operands.as_slice();
        match op.operator.as_str() {
            "q" => interp.save(),
            "Q" => interp.restore(),
            "cm" => {
                if let Some(m) = Matrix::from_operands(operands) {
                    interp.state.ctm = m.then(&interp.state.ctm);
                }
            }
            "BT" => {
                interp.text_matrix = Matrix::default();
                interp.line_matrix = Matrix::default();
            }
            "ET" => {}
            "Tf" => {
                if let [Object::Name(font), size, ..] = operands {
                    interp.state.text.font = font.clone();
                    interp.state.text.size = number(size).unwrap_or(12.0);
                }
            }
            "Tc" => set_number(operands, &mut interp.state.text.char_spacing),
            "Tw" => set_number(operands, &mut interp.state.text.word_spacing),
            "TL" => set_number(operands, &mut interp.state.text.leading),
            "Ts" => set_number(operands, &mut interp.state.text.rise),
            "Tz" => {
                if let Some(scale) = operands.first().and_then(number) {
                    interp.state.text.horizontal_scale = scale / 100.0;
                }
            }
            "Td" | "TD" => {
                if let [tx, ty, ..] = operands {
                    let tx = number(tx).unwrap_or(0.0);
                    let ty = number(ty).unwrap_or(0.0);
                    if op.operator == "TD" {
                        interp.state.text.leading = -ty;
                    }
                    interp.move_line(tx, ty);
                }
            }
            "Tm" => {
                if let Some(m) = Matrix::from_operands(operands) {
                    interp.text_matrix = m;
                    interp.line_matrix = m;
                }
            }
            "T*" => interp.next_line(),
            "Tj" | "'" | "\"" | "TJ" => {
                let font = interp.state.text.font.clone();
                let encoding = encodings.get(&font);
                let font_metrics = metrics.get(&font).cloned().unwrap_or_default();
                let decode = |bytes: &[u8]| match encoding {
                    Some(enc) => LopdfDocument::decode_text(enc, bytes)
                        .unwrap_or_else(|_| decode_text_simple(bytes)),
                    None => decode_text_simple(bytes),
                };

                match op.operator.as_str() {
                    "Tj" => {
                        if let Some(Object::String(bytes, _)) = operands.first() {
                            interp.show(bytes, &decode(bytes), &font_metrics);
                        }
                    }
                    "'" => {
                        interp.next_line();
                        if let Some(Object::String(bytes, _)) = operands.first() {
                            interp.show(bytes, &decode(bytes), &font_metrics);
                        }
                    }
                    "\"" => {
                        if let [aw, ac, Object::String(bytes, _), ..] = operands {
                            interp.state.text.word_spacing = number(aw).unwrap_or(0.0);
                            interp.state.text.char_spacing = number(ac).unwrap_or(0.0);
                            interp.next_line();
                            interp.show(bytes, &decode(bytes), &font_metrics);
                        }
                    }
                    _ => {
                        if let Some(Object::Array(items)) = operands.first() {
                            for item in items {
                                match item {
                                    Object::String(bytes, _) => {
                                        interp.show(bytes, &decode(bytes), &font_metrics);
                                    }
                                    other => {
                                        if let Some(adjust) = number(other) {
                                            interp.kern(adjust);
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
            "m" => {
                if let Some((x, y)) = point(operands) {
                    interp.move_to(x, y);
                }
            }
            "l" => {
                if let Some((x, y)) = point(operands) {
                    interp.line_to(x, y);
                }
            }
            "h" => interp.close_path(),
            "re" => {
                if let [x, y, w, h, ..] = operands {
                    if let (Some(x), Some(y), Some(w), Some(h)) =
                        (number(x), number(y), number(w), number(h))
                    {
                        interp.rect(x, y, w, h);
                    }
                }
            }
            "S" | "s" | "f" | "F" | "f*" | "B" | "B*" | "b" | "b*" => interp.paint(),
            "n" => interp.discard_path(),
            // Form XObjects are not followed; text or rules drawn inside one
            // are missing from the layout.
            "Do" => log::debug!("Skipping XObject {:?}", operands.first()),
            _ => {}
        }
    }

    Ok(Layout::new(interp.glyphs, interp.rules))
}

struct Interpreter {
    frame: PageFrame,
    state: GraphicsState,
    stack: Vec<GraphicsState>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    current_point: Option<(f32, f32)>,
    subpath_start: Option<(f32, f32)>,
    pending: Vec<BBox>,
    glyphs: Vec<Glyph>,
    rules: Vec<BBox>,
}

impl Interpreter {
    fn new(frame: PageFrame) -> Self {
        Self {
            frame,
            state: GraphicsState::default(),
            stack: Vec::new(),
            text_matrix: Matrix::default(),
            line_matrix: Matrix::default(),
            current_point: None,
            subpath_start: None,
            pending: Vec::new(),
            glyphs: Vec::new(),
            rules: Vec::new(),
        }
    }

    fn save(&mut self) {
        self.stack.push(self.state.clone());
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = Matrix::translation(tx, ty).then(&self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        let leading = self.state.text.leading;
        self.move_line(0.0, -leading);
    }

    fn kern(&mut self, adjust: f32) {
        let text = &self.state.text;
        let tx = -adjust / 1000.0 * text.size * text.horizontal_scale;
        self.text_matrix = Matrix::translation(tx, 0.0).then(&self.text_matrix);
    }

    fn show(&mut self, bytes: &[u8], text: &str, metrics: &FontMetrics) {
        let chars: Vec<char> = text.chars().collect();
        let codes = char_codes(bytes, chars.len(), metrics.two_byte);
        let text_state = self.state.text.clone();

        for (i, c) in chars.iter().enumerate() {
            let code = codes.as_ref().and_then(|codes| codes.get(i).copied());
            let w0 = metrics.width(code) / 1000.0;
            let advance = w0 * text_state.size * text_state.horizontal_scale;

            let render = self.text_matrix.then(&self.state.ctm);
            let (x_start, baseline) = render.apply(0.0, text_state.rise);
            let (x_end, _) = render.apply(advance, text_state.rise);
            let size = text_state.size * render.vertical_scale();

            self.glyphs.push(Glyph {
                text: c.to_string(),
                x0: self.frame.x(x_start.min(x_end)),
                x1: self.frame.x(x_start.max(x_end)),
                top: self.frame.y(baseline + size * ASCENT),
                bottom: self.frame.y(baseline - size * DESCENT),
                size,
            });

            let mut spacing = text_state.char_spacing;
            if *c == ' ' {
                spacing += text_state.word_spacing;
            }
            let tx = advance + spacing * text_state.horizontal_scale;
            self.text_matrix = Matrix::translation(tx, 0.0).then(&self.text_matrix);
        }
    }

    fn move_to(&mut self, x: f32, y: f32) {
        let p = self.state.ctm.apply(x, y);
        self.current_point = Some(p);
        self.subpath_start = Some(p);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let p = self.state.ctm.apply(x, y);
        if let Some(from) = self.current_point {
            self.segment(from, p);
        }
        self.current_point = Some(p);
    }

    fn close_path(&mut self) {
        if let (Some(from), Some(start)) = (self.current_point, self.subpath_start) {
            self.segment(from, start);
            self.current_point = Some(start);
        }
    }

    fn segment(&mut self, from: (f32, f32), to: (f32, f32)) {
        let axis_aligned =
            (from.0 - to.0).abs() <= AXIS_TOLERANCE || (from.1 - to.1).abs() <= AXIS_TOLERANCE;
        if axis_aligned {
            self.pending.push(self.frame.rect(from, to));
        }
    }

    fn rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        let ctm = self.state.ctm;
        let corners = [
            ctm.apply(x, y),
            ctm.apply(x + w, y),
            ctm.apply(x + w, y + h),
            ctm.apply(x, y + h),
        ];
        let (mut min, mut max) = (corners[0], corners[0]);
        for (cx, cy) in corners {
            min = (min.0.min(cx), min.1.min(cy));
            max = (max.0.max(cx), max.1.max(cy));
        }
        self.pending.push(self.frame.rect(min, max));
        self.current_point = Some(corners[0]);
        self.subpath_start = Some(corners[0]);
    }

    fn paint(&mut self) {
        self.rules.append(&mut self.pending);
        self.current_point = None;
        self.subpath_start = None;
    }

    fn discard_path(&mut self) {
        self.pending.clear();
        self.current_point = None;
        self.subpath_start = None;
    }
}

/// Character codes of a shown string, when they map one-to-one onto the
/// decoded characters.
fn char_codes(bytes: &[u8], chars: usize, two_byte: bool) -> Option<Vec<u32>> {
    let codes: Vec<u32> = if two_byte {
        bytes
            .chunks(2)
            .map(|pair| match pair {
                [hi, lo] => u32::from(u16::from_be_bytes([*hi, *lo])),
                [single] => u32::from(*single),
                _ => 0,
            })
            .collect()
    } else {
        bytes.iter().map(|b| u32::from(*b)).collect()
    };
    (codes.len() == chars).then_some(codes)
}

/// Read the contents of a page, concatenating multiple streams.
fn page_content(doc: &LopdfDocument, page_id: ObjectId) -> Result<Vec<u8>> {
    let page_dict = doc
        .get_dictionary(page_id)
        .map_err(|e| Error::TextExtract(e.to_string()))?;

    let Ok(contents) = page_dict.get(b"Contents") else {
        return Ok(Vec::new());
    };

    let stream_data = |obj: &Object| -> Result<Vec<u8>> {
        match resolve(doc, obj) {
            Some(Object::Stream(s)) => s
                .decompressed_content()
                .or_else(|_| Ok(s.content.clone())),
            _ => Err(Error::TextExtract("Invalid content stream".to_string())),
        }
    };

    match resolve(doc, contents) {
        Some(Object::Array(arr)) => {
            let mut content = Vec::new();
            for obj in arr {
                content.extend_from_slice(&stream_data(obj)?);
                content.push(b' ');
            }
            Ok(content)
        }
        Some(_) => stream_data(contents),
        None => Err(Error::TextExtract("Invalid content stream".to_string())),
    }
}

fn resolve<'a>(doc: &'a LopdfDocument, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

fn set_number(operands: &[Object], target: &mut f32) {
    if let Some(value) = operands.first().and_then(number) {
        *target = value;
    }
}

fn point(operands: &[Object]) -> Option<(f32, f32)> {
    match operands {
        [x, y, ..] => Some((number(x)?, number(y)?)),
        _ => None,
    }
}

/// Extract a number from a PDF object.
pub(crate) fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Decode a string without a font encoding: UTF-16BE with BOM, then UTF-8,
/// then Latin-1.
fn decode_text_simple(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let utf16: Vec<u16> = rest
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}
