//! Page geometry: glyph boxes, word grouping and line clustering.
//!
//! All coordinates use a top-left origin in PDF points: `x0`/`x1` grow to the
//! right, `top`/`bottom` grow downwards. The content-stream interpreter flips
//! PDF user space into this convention so that table rows read top to bottom.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Horizontal gap (points) above which two glyphs belong to different words.
pub const WORD_X_TOLERANCE: f32 = 3.0;

/// Vertical distance (points) within which glyphs share a text line.
pub const LINE_Y_TOLERANCE: f32 = 3.0;

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    /// Left edge
    pub x0: f32,
    /// Top edge
    pub top: f32,
    /// Right edge
    pub x1: f32,
    /// Bottom edge
    pub bottom: f32,
}

impl BBox {
    /// Create a box from its four edges.
    pub fn new(x0: f32, top: f32, x1: f32, bottom: f32) -> Self {
        Self {
            x0,
            top,
            x1,
            bottom,
        }
    }

    /// Box width.
    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    /// Box height.
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// Check whether a point lies inside the box (edges included).
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.top && y <= self.bottom
    }

    /// Smallest box covering both boxes.
    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            x0: self.x0.min(other.x0),
            top: self.top.min(other.top),
            x1: self.x1.max(other.x1),
            bottom: self.bottom.max(other.bottom),
        }
    }

    /// Intersection of two boxes, if they overlap.
    pub fn intersection(&self, other: &BBox) -> Option<BBox> {
        let clipped = BBox {
            x0: self.x0.max(other.x0),
            top: self.top.max(other.top),
            x1: self.x1.min(other.x1),
            bottom: self.bottom.min(other.bottom),
        };
        (clipped.x0 <= clipped.x1 && clipped.top <= clipped.bottom).then_some(clipped)
    }
}

/// A single rendered character with its bounding box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Glyph {
    /// Decoded text (usually one character, ligatures may carry more)
    pub text: String,
    /// Left edge
    pub x0: f32,
    /// Right edge
    pub x1: f32,
    /// Top edge
    pub top: f32,
    /// Bottom edge
    pub bottom: f32,
    /// Effective font size in points
    pub size: f32,
}

impl Glyph {
    /// Horizontal centre.
    pub fn center_x(&self) -> f32 {
        (self.x0 + self.x1) / 2.0
    }

    /// Vertical centre.
    pub fn center_y(&self) -> f32 {
        (self.top + self.bottom) / 2.0
    }

    /// Whether the glyph only renders whitespace.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Bounding box of the glyph.
    pub fn bbox(&self) -> BBox {
        BBox::new(self.x0, self.top, self.x1, self.bottom)
    }
}

/// A word token: consecutive glyphs on one line without a gap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    /// Word text
    pub text: String,
    /// Bounding box of all glyphs in the word
    pub bbox: BBox,
}

impl Word {
    /// Left edge.
    pub fn x0(&self) -> f32 {
        self.bbox.x0
    }

    /// Top edge.
    pub fn top(&self) -> f32 {
        self.bbox.top
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f32 {
        self.bbox.bottom
    }
}

/// The positioned content of a page or of a cropped part of it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    /// Glyphs in content-stream order
    pub glyphs: Vec<Glyph>,
    /// Ruled rectangles and line segments (lines are degenerate boxes)
    pub rules: Vec<BBox>,
}

impl Layout {
    /// Create a layout from glyphs and rules.
    pub fn new(glyphs: Vec<Glyph>, rules: Vec<BBox>) -> Self {
        Self { glyphs, rules }
    }

    /// Keep the glyphs whose centre lies in `bbox` and clip the rules to it.
    pub fn crop(&self, bbox: BBox) -> Layout {
        let glyphs = self
            .glyphs
            .iter()
            .filter(|g| bbox.contains(g.center_x(), g.center_y()))
            .cloned()
            .collect();
        let rules = self
            .rules
            .iter()
            .filter_map(|r| r.intersection(&bbox))
            .collect();
        Layout { glyphs, rules }
    }

    /// Group glyphs into text lines, top to bottom, each sorted left to right.
    pub fn lines(&self) -> Vec<Vec<&Glyph>> {
        let mut sorted: Vec<&Glyph> = self.glyphs.iter().collect();
        sorted.sort_by(|a, b| cmp_f32(a.top, b.top).then(cmp_f32(a.x0, b.x0)));

        let mut lines: Vec<Vec<&Glyph>> = Vec::new();
        let mut line_top: Option<f32> = None;
        for glyph in sorted {
            match line_top {
                Some(top) if glyph.top - top <= LINE_Y_TOLERANCE => {
                    if let Some(line) = lines.last_mut() {
                        line.push(glyph);
                    }
                }
                _ => lines.push(vec![glyph]),
            }
            line_top = Some(glyph.top);
        }

        for line in &mut lines {
            line.sort_by(|a, b| cmp_f32(a.x0, b.x0));
        }
        lines
    }

    /// Extract word tokens in reading order.
    pub fn words(&self) -> Vec<Word> {
        let mut words = Vec::new();
        for line in self.lines() {
            let mut current: Vec<&Glyph> = Vec::new();
            for glyph in line {
                if glyph.is_blank() {
                    flush_word(&mut current, &mut words);
                    continue;
                }
                if let Some(prev) = current.last() {
                    if glyph.x0 - prev.x1 > WORD_X_TOLERANCE {
                        flush_word(&mut current, &mut words);
                    }
                }
                current.push(glyph);
            }
            flush_word(&mut current, &mut words);
        }
        words
    }

    /// Distinct glyph `top` values, ascending.
    ///
    /// Clusters with zero tolerance: every visually distinct text line yields
    /// one value, even when two lines are only a fraction of a point apart.
    pub fn line_tops(&self) -> Vec<f32> {
        let tops: Vec<f32> = self.glyphs.iter().map(|g| g.top).collect();
        cluster_values(&tops, 0.0)
            .into_iter()
            .filter_map(|cluster| cluster.first().copied())
            .collect()
    }

    /// Plain text: words joined by spaces, lines joined by newlines.
    pub fn text(&self) -> String {
        let words = self.words();
        let mut out = String::new();
        let mut last_top: Option<f32> = None;
        for word in &words {
            match last_top {
                None => {}
                Some(top) if word.top() - top <= LINE_Y_TOLERANCE => out.push(' '),
                Some(_) => out.push('\n'),
            }
            out.push_str(&word.text);
            last_top = Some(word.top());
        }
        out
    }

    /// Whether the layout contains no visible text.
    pub fn is_empty(&self) -> bool {
        self.glyphs.iter().all(Glyph::is_blank)
    }
}

fn flush_word(current: &mut Vec<&Glyph>, words: &mut Vec<Word>) {
    let Some(first) = current.first() else {
        return;
    };
    let mut bbox = first.bbox();
    let mut text = String::new();
    for glyph in current.iter() {
        bbox = bbox.union(&glyph.bbox());
        text.push_str(&glyph.text);
    }
    words.push(Word { text, bbox });
    current.clear();
}

/// Group sorted values into clusters whose consecutive members differ by at
/// most `tolerance`.
pub fn cluster_values(values: &[f32], tolerance: f32) -> Vec<Vec<f32>> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| cmp_f32(*a, *b));

    let mut clusters: Vec<Vec<f32>> = Vec::new();
    for value in sorted {
        match clusters.last_mut() {
            Some(cluster) if cluster.last().is_some_and(|last| value - last <= tolerance) => {
                cluster.push(value);
            }
            _ => clusters.push(vec![value]),
        }
    }
    clusters
}

/// Total order for coordinates; NaN compares equal.
pub(crate) fn cmp_f32(a: f32, b: f32) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}
