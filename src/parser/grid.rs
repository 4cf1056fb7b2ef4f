//! Anchor-based grid building.
//!
//! Score sheets have no interior ruling between columns, so column
//! boundaries are placed just left of the header label of each column.
//! Body rows are one per distinct text line.

use std::collections::HashMap;

use crate::error::{Error, Result, SubTable};
use crate::geometry::{cluster_values, BBox, Layout, Word, LINE_Y_TOLERANCE};
use crate::table::extract_grid;

/// Gap left of a header label for header-block columns.
pub const HEADER_MARGIN: f32 = 5.0;

/// Gap left of a header label for elements and components columns.
pub const BODY_MARGIN: f32 = 8.0;

/// Width of the unlabelled highlight column in front of GOE.
pub const HIGHLIGHT_WIDTH: f32 = 20.0;

/// Space below the "Elements" label before the first element row.
const ELEMENTS_GAP: f32 = 4.0;

/// A column anchor: a header label, with alternative spellings.
#[derive(Debug, Clone, Copy)]
pub struct Anchor {
    /// Column name used in errors
    pub name: &'static str,
    /// Accepted label texts
    pub labels: &'static [&'static str],
}

const fn anchor(name: &'static str, labels: &'static [&'static str]) -> Anchor {
    Anchor { name, labels }
}

/// Header-block anchors; the rank column starts at the region's left edge.
pub const HEADER_ANCHORS: &[Anchor] = &[
    anchor("Name", &["Name"]),
    anchor("Nation", &["Nation"]),
    anchor("Starting", &["Starting"]),
    anchor("Segment", &["Segment"]),
    anchor("Element", &["Element"]),
    anchor("Program", &["Program"]),
    anchor("Deductions", &["Deductions"]),
];

/// Elements anchors; the number column starts at the region's left edge.
/// The Info label is printed rotated and often extracts reversed.
pub const ELEMENTS_ANCHORS: &[Anchor] = &[
    anchor("Executed", &["Executed"]),
    anchor("Info", &["Info", "ofnI"]),
    anchor("Base", &["Base"]),
    anchor("GOE", &["GOE"]),
    anchor("J1", &["J1"]),
    anchor("J2", &["J2"]),
    anchor("J3", &["J3"]),
    anchor("J4", &["J4"]),
    anchor("J5", &["J5"]),
    anchor("J6", &["J6"]),
    anchor("J7", &["J7"]),
    anchor("J8", &["J8"]),
    anchor("J9", &["J9"]),
    anchor("Ref.", &["Ref."]),
    anchor("Scores", &["Scores"]),
];

/// Components anchors; the description column starts at the region's left
/// edge.
pub const COMPONENTS_ANCHORS: &[Anchor] = &[
    anchor("Factor", &["Factor"]),
    anchor("J1", &["J1"]),
    anchor("J2", &["J2"]),
    anchor("J3", &["J3"]),
    anchor("J4", &["J4"]),
    anchor("J5", &["J5"]),
    anchor("J6", &["J6"]),
    anchor("J7", &["J7"]),
    anchor("J8", &["J8"]),
    anchor("J9", &["J9"]),
    anchor("Ref.", &["Ref."]),
    anchor("Scores", &["Scores"]),
];

/// Label → first word with that text, in reading order.
#[derive(Debug)]
pub struct AnchorIndex<'a> {
    table: SubTable,
    words: HashMap<&'a str, &'a Word>,
}

impl<'a> AnchorIndex<'a> {
    /// Index `words` in a single pass; the first occurrence of a text wins.
    pub fn new(table: SubTable, words: &'a [Word]) -> Self {
        let mut index = HashMap::with_capacity(words.len());
        for word in words {
            index.entry(word.text.as_str()).or_insert(word);
        }
        Self {
            table,
            words: index,
        }
    }

    /// Look up a label.
    pub fn get(&self, label: &str) -> Option<&'a Word> {
        self.words.get(label).copied()
    }

    /// Look up an anchor, trying each accepted spelling.
    pub fn find(&self, anchor: &Anchor) -> Result<&'a Word> {
        anchor
            .labels
            .iter()
            .find_map(|label| self.get(label))
            .ok_or_else(|| Error::MissingAnchor {
                table: self.table,
                label: anchor.name.to_string(),
            })
    }

    /// Look up a single label.
    pub fn require(&self, label: &str) -> Result<&'a Word> {
        self.get(label).ok_or_else(|| Error::MissingAnchor {
            table: self.table,
            label: label.to_string(),
        })
    }
}

/// Explicit column and row lines for one sub-table.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    /// Which sub-table the grid belongs to
    pub table: SubTable,
    /// Column boundaries, ascending
    pub v_lines: Vec<f32>,
    /// Row boundaries, ascending
    pub h_lines: Vec<f32>,
}

impl Grid {
    fn new(table: SubTable, v_lines: Vec<f32>, h_lines: Vec<f32>) -> Result<Self> {
        check_ascending(table, "column", &v_lines)?;
        check_ascending(table, "row", &h_lines)?;
        Ok(Self {
            table,
            v_lines,
            h_lines,
        })
    }

    /// Number of columns.
    pub fn columns(&self) -> usize {
        self.v_lines.len().saturating_sub(1)
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.h_lines.len().saturating_sub(1)
    }

    /// Read the cell texts of `layout` along this grid.
    pub fn extract(&self, layout: &Layout) -> Vec<Vec<String>> {
        extract_grid(layout, &self.v_lines, &self.h_lines)
    }
}

fn check_ascending(table: SubTable, what: &str, lines: &[f32]) -> Result<()> {
    if lines.len() < 2 {
        return Err(Error::TableShape {
            table,
            detail: format!("need at least two {} lines, found {}", what, lines.len()),
        });
    }
    if let Some(w) = lines.windows(2).find(|w| w[1] <= w[0]) {
        return Err(Error::TableShape {
            table,
            detail: format!("{} lines out of order ({} then {})", what, w[0], w[1]),
        });
    }
    Ok(())
}

/// Column boundaries: the region's left edge, one line per anchor at the
/// label's left edge minus `margin`, and the region's right edge.
pub fn column_lines(
    index: &AnchorIndex<'_>,
    bbox: BBox,
    anchors: &[Anchor],
    margin: f32,
) -> Result<Vec<f32>> {
    let mut lines = Vec::with_capacity(anchors.len() + 2);
    lines.push(bbox.x0);
    for anchor in anchors {
        lines.push(index.find(anchor)?.x0() - margin);
    }
    lines.push(bbox.x1);
    Ok(lines)
}

/// Row boundaries of a body spanning `top..bottom`: the top of every
/// distinct text line, then `bottom`.
pub fn body_row_lines(layout: &Layout, bbox: BBox, top: f32, bottom: f32) -> Vec<f32> {
    let body = layout.crop(BBox::new(bbox.x0, top, bbox.x1, bottom));
    let mut lines = body.line_tops();
    lines.push(bottom);
    lines
}

/// Grid of the header block: one label row and one data row, split just
/// below the "Score" label.
///
/// Text below the split must form exactly one line.
pub fn header_grid(layout: &Layout, bbox: BBox) -> Result<Grid> {
    let words = layout.words();
    let index = AnchorIndex::new(SubTable::Header, &words);
    let v_lines = column_lines(&index, bbox, HEADER_ANCHORS, HEADER_MARGIN)?;
    let split = index.require("Score")?.bottom() + 1.0;

    let data = layout.crop(BBox::new(bbox.x0, split, bbox.x1, bbox.bottom));
    let tops: Vec<f32> = data.glyphs.iter().map(|g| g.top).collect();
    let data_rows = cluster_values(&tops, LINE_Y_TOLERANCE).len();
    if data_rows != 1 {
        return Err(Error::TableShape {
            table: SubTable::Header,
            detail: format!("expected 1 data row, found {}", data_rows),
        });
    }

    Grid::new(SubTable::Header, v_lines, vec![bbox.top, split, bbox.bottom])
}

/// Grid of the elements table.
///
/// Rows start below the "Elements" label and end above the "Components"
/// label when the program components share the region, at the region's
/// bottom otherwise. An unlabelled highlight column is inserted in front of
/// the GOE column.
pub fn elements_grid(layout: &Layout, bbox: BBox) -> Result<Grid> {
    let words = layout.words();
    let index = AnchorIndex::new(SubTable::Elements, &words);
    let mut v_lines = column_lines(&index, bbox, ELEMENTS_ANCHORS, BODY_MARGIN)?;
    // left edge + Executed + Info + Base precede GOE
    let goe_line = v_lines[4];
    v_lines.insert(4, goe_line - HIGHLIGHT_WIDTH);

    let top = index.require("Elements")?.bottom() + ELEMENTS_GAP;
    let bottom = index
        .get("Components")
        .map(|w| w.top() - 1.0)
        .filter(|b| *b > top)
        .unwrap_or(bbox.bottom);
    let h_lines = body_row_lines(layout, bbox, top, bottom);
    log::debug!(
        "elements grid: {} columns, {} rows",
        v_lines.len() - 1,
        h_lines.len() - 1
    );
    Grid::new(SubTable::Elements, v_lines, h_lines)
}

/// Grid of the program components table; rows start below the "Program"
/// label and run to the region's bottom.
pub fn components_grid(layout: &Layout, bbox: BBox) -> Result<Grid> {
    let words = layout.words();
    let index = AnchorIndex::new(SubTable::Components, &words);
    let v_lines = column_lines(&index, bbox, COMPONENTS_ANCHORS, BODY_MARGIN)?;
    let top = index.require("Program")?.bottom() + 1.0;
    let h_lines = body_row_lines(layout, bbox, top, bbox.bottom);
    Grid::new(SubTable::Components, v_lines, h_lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{Page, TextPage};

    const REGION: BBox = BBox {
        x0: 20.0,
        top: 0.0,
        x1: 580.0,
        bottom: 60.0,
    };

    fn layout(page: TextPage) -> Layout {
        page.layout().unwrap().clone()
    }

    fn page() -> TextPage {
        TextPage::new(1, BBox::new(0.0, 0.0, 600.0, 400.0))
    }

    #[test]
    fn test_anchor_index_first_occurrence_wins() {
        let layout = layout(
            page()
                .with_text_run("J1", 100.0, 10.0, 6.0)
                .with_text_run("J1", 300.0, 40.0, 6.0),
        );
        let words = layout.words();
        let index = AnchorIndex::new(SubTable::Components, &words);
        assert_eq!(index.get("J1").map(|w| w.x0()), Some(100.0));
        assert!(index.get("J2").is_none());
    }

    #[test]
    fn test_missing_anchor() {
        let words = Vec::new();
        let index = AnchorIndex::new(SubTable::Elements, &words);
        let err = index.find(&ELEMENTS_ANCHORS[1]).unwrap_err();
        match err {
            Error::MissingAnchor { table, label } => {
                assert_eq!(table, SubTable::Elements);
                assert_eq!(label, "Info");
            }
            other => panic!("Expected MissingAnchor, got {:?}", other),
        }
    }

    #[test]
    fn test_reversed_info_label() {
        let layout = layout(page().with_text_run("ofnI", 140.0, 4.0, 6.0));
        let words = layout.words();
        let index = AnchorIndex::new(SubTable::Elements, &words);
        assert_eq!(index.find(&ELEMENTS_ANCHORS[1]).unwrap().x0(), 140.0);
    }

    #[test]
    fn test_column_lines() {
        let layout = layout(
            page()
                .with_text_run("Factor", 200.0, 4.0, 6.0)
                .with_text_run("Scores", 520.0, 4.0, 6.0),
        );
        let words = layout.words();
        let index = AnchorIndex::new(SubTable::Components, &words);
        let anchors = [anchor("Factor", &["Factor"]), anchor("Scores", &["Scores"])];
        let lines = column_lines(&index, REGION, &anchors, BODY_MARGIN).unwrap();
        assert_eq!(lines, vec![20.0, 192.0, 512.0, 580.0]);
    }

    #[test]
    fn test_body_row_lines() {
        let layout = layout(
            page()
                .with_text_run("Program Components", 40.0, 4.0, 6.0)
                .with_text_run("Skating Skills", 22.0, 13.0, 8.0)
                .with_text_run("1.67", 200.0, 13.0, 8.0)
                .with_text_run("Composition", 22.0, 25.0, 8.0),
        );
        let lines = body_row_lines(&layout, REGION, 11.0, 60.0);
        assert_eq!(lines, vec![13.0, 25.0, 60.0]);
    }

    fn header_labels() -> TextPage {
        page()
            .with_text_run("Rank", 22.0, 4.0, 6.0)
            .with_text_run("Name", 50.0, 4.0, 6.0)
            .with_text_run("Nation", 200.0, 4.0, 6.0)
            .with_text_run("Starting", 240.0, 4.0, 6.0)
            .with_text_run("Total Segment Score", 280.0, 4.0, 6.0)
            .with_text_run("Element", 370.0, 4.0, 6.0)
            .with_text_run("Program", 430.0, 4.0, 6.0)
            .with_text_run("Deductions", 500.0, 4.0, 6.0)
    }

    #[test]
    fn test_header_grid() {
        let layout = layout(
            header_labels()
                .with_text_run("1", 22.0, 16.0, 8.0)
                .with_text_run("Jean DUPONT", 50.0, 16.0, 8.0),
        );
        let bbox = BBox::new(20.0, 0.0, 580.0, 30.0);
        let grid = header_grid(&layout, bbox).unwrap();
        assert_eq!(grid.columns(), 8);
        assert_eq!(grid.rows(), 2);
        assert_eq!(grid.v_lines[1], 45.0);
        // "Score" spans 4..10, split one point below
        assert_eq!(grid.h_lines, vec![0.0, 11.0, 30.0]);
    }

    #[test]
    fn test_header_grid_data_row_count() {
        let bbox = BBox::new(20.0, 0.0, 580.0, 40.0);

        let empty = layout(header_labels());
        let extra = layout(
            header_labels()
                .with_text_run("Jean DUPONT", 50.0, 16.0, 8.0)
                .with_text_run("EXTRA", 50.0, 28.0, 8.0),
        );
        for (layout, found) in [(empty, 0), (extra, 2)] {
            match header_grid(&layout, bbox).unwrap_err() {
                Error::TableShape { table, detail } => {
                    assert_eq!(table, SubTable::Header);
                    assert_eq!(detail, format!("expected 1 data row, found {}", found));
                }
                other => panic!("Expected TableShape, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_out_of_order_anchors() {
        let layout = layout(
            page()
                .with_text_run("Factor", 400.0, 4.0, 6.0)
                .with_text_run("Scores", 100.0, 4.0, 6.0),
        );
        let words = layout.words();
        let index = AnchorIndex::new(SubTable::Components, &words);
        let anchors = [anchor("Factor", &["Factor"]), anchor("Scores", &["Scores"])];
        let lines = column_lines(&index, REGION, &anchors, BODY_MARGIN).unwrap();
        let result = Grid::new(SubTable::Components, lines, vec![0.0, 10.0]);
        assert!(matches!(result, Err(Error::TableShape { .. })));
    }
}
