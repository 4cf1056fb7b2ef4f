//! Table structure: ruled-table finding and explicit-grid extraction.
//!
//! [`find_tables`] rebuilds tables from the rectangles and segments drawn on
//! a page: edges are snapped and joined, their intersections become cell
//! corners, and cells that share corners form one table. [`extract_grid`]
//! slices a region along caller-supplied lines, which is how score sheets
//! without interior rules are read.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::geometry::{cluster_values, cmp_f32, BBox, Glyph, Layout};

/// Table finder configuration.
#[derive(Debug, Clone)]
pub struct TableFinderConfig {
    /// Edges closer than this are snapped onto a common coordinate
    pub snap_tolerance: f32,
    /// Collinear edges separated by less than this are joined
    pub join_tolerance: f32,
    /// Slack allowed when intersecting horizontal and vertical edges
    pub intersection_tolerance: f32,
    /// Edges shorter than this (after joining) are discarded
    pub edge_min_length: f32,
}

impl Default for TableFinderConfig {
    fn default() -> Self {
        Self {
            snap_tolerance: 3.0,
            join_tolerance: 3.0,
            intersection_tolerance: 3.0,
            edge_min_length: 3.0,
        }
    }
}

/// A table reconstructed from ruling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedTable {
    /// Bounds of all cells
    pub bbox: BBox,
    /// Cells sorted top to bottom, then left to right
    pub cells: Vec<BBox>,
    /// One box per group of cells sharing a top edge
    pub rows: Vec<BBox>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Orientation {
    Horizontal,
    Vertical,
}

/// A ruled edge: `pos` is y for horizontal edges and x for vertical ones,
/// `start..end` spans the other axis.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Edge {
    orientation: Orientation,
    pos: f32,
    start: f32,
    end: f32,
}

#[derive(Debug, Clone)]
struct Intersection {
    x: f32,
    y: f32,
    horizontal: Vec<usize>,
    vertical: Vec<usize>,
}

/// Find ruled tables in a layout with the default configuration.
pub fn find_tables(layout: &Layout) -> Vec<DetectedTable> {
    find_tables_with_config(layout, &TableFinderConfig::default())
}

/// Find ruled tables in a layout.
pub fn find_tables_with_config(layout: &Layout, config: &TableFinderConfig) -> Vec<DetectedTable> {
    let edges = rule_edges(&layout.rules);
    let horizontal = merge_edges(
        edges
            .iter()
            .filter(|e| e.orientation == Orientation::Horizontal)
            .copied()
            .collect(),
        config,
    );
    let vertical = merge_edges(
        edges
            .iter()
            .filter(|e| e.orientation == Orientation::Vertical)
            .copied()
            .collect(),
        config,
    );

    let intersections = intersect(&horizontal, &vertical, config.intersection_tolerance);
    let cells = cells_from_intersections(&intersections);
    let tables = group_cells(cells);
    log::debug!(
        "find_tables: {} h-edges, {} v-edges, {} intersections, {} tables",
        horizontal.len(),
        vertical.len(),
        intersections.len(),
        tables.len()
    );
    tables
}

fn rule_edges(rules: &[BBox]) -> Vec<Edge> {
    let mut edges = Vec::new();
    for r in rules {
        let h = |y: f32| Edge {
            orientation: Orientation::Horizontal,
            pos: y,
            start: r.x0,
            end: r.x1,
        };
        let v = |x: f32| Edge {
            orientation: Orientation::Vertical,
            pos: x,
            start: r.top,
            end: r.bottom,
        };
        match (r.width() > 0.0, r.height() > 0.0) {
            (true, true) => edges.extend([h(r.top), h(r.bottom), v(r.x0), v(r.x1)]),
            (true, false) => edges.push(h(r.top)),
            (false, true) => edges.push(v(r.x0)),
            (false, false) => {}
        }
    }
    edges
}

/// Snap edges onto shared coordinates, join collinear pieces and drop short
/// leftovers.
fn merge_edges(mut edges: Vec<Edge>, config: &TableFinderConfig) -> Vec<Edge> {
    let positions: Vec<f32> = edges.iter().map(|e| e.pos).collect();
    for cluster in cluster_values(&positions, config.snap_tolerance) {
        let mean = cluster.iter().sum::<f32>() / cluster.len() as f32;
        let (Some(lo), Some(hi)) = (cluster.first(), cluster.last()) else {
            continue;
        };
        for edge in edges.iter_mut() {
            if edge.pos >= *lo && edge.pos <= *hi {
                edge.pos = mean;
            }
        }
    }

    edges.sort_by(|a, b| cmp_f32(a.pos, b.pos).then(cmp_f32(a.start, b.start)));
    let mut joined: Vec<Edge> = Vec::new();
    for edge in edges {
        match joined.last_mut() {
            Some(last) if last.pos == edge.pos && edge.start <= last.end + config.join_tolerance => {
                last.end = last.end.max(edge.end);
            }
            _ => joined.push(edge),
        }
    }

    joined.retain(|e| e.end - e.start >= config.edge_min_length);
    joined
}

fn intersect(horizontal: &[Edge], vertical: &[Edge], tolerance: f32) -> Vec<Intersection> {
    let mut points: Vec<Intersection> = Vec::new();
    let mut index: HashMap<(u32, u32), usize> = HashMap::new();

    for (vi, v) in vertical.iter().enumerate() {
        for (hi, h) in horizontal.iter().enumerate() {
            let crosses = h.pos >= v.start - tolerance
                && h.pos <= v.end + tolerance
                && v.pos >= h.start - tolerance
                && v.pos <= h.end + tolerance;
            if !crosses {
                continue;
            }
            let key = (v.pos.to_bits(), h.pos.to_bits());
            let slot = *index.entry(key).or_insert_with(|| {
                points.push(Intersection {
                    x: v.pos,
                    y: h.pos,
                    horizontal: Vec::new(),
                    vertical: Vec::new(),
                });
                points.len() - 1
            });
            points[slot].horizontal.push(hi);
            points[slot].vertical.push(vi);
        }
    }

    points.sort_by(|a, b| cmp_f32(a.x, b.x).then(cmp_f32(a.y, b.y)));
    points
}

fn shares(a: &[usize], b: &[usize]) -> bool {
    a.iter().any(|edge| b.contains(edge))
}

/// For each intersection, the smallest cell having it as top-left corner.
fn cells_from_intersections(points: &[Intersection]) -> Vec<BBox> {
    let lookup: HashMap<(u32, u32), &Intersection> = points
        .iter()
        .map(|p| ((p.x.to_bits(), p.y.to_bits()), p))
        .collect();

    let mut cells = Vec::new();
    for (i, pt) in points.iter().enumerate() {
        let rest = &points[i + 1..];
        let below: Vec<&Intersection> = rest
            .iter()
            .filter(|p| p.x == pt.x && p.y > pt.y)
            .collect();
        let right: Vec<&Intersection> = rest
            .iter()
            .filter(|p| p.y == pt.y && p.x > pt.x)
            .collect();

        let found = below.iter().find_map(|b| {
            if !shares(&pt.vertical, &b.vertical) {
                return None;
            }
            right.iter().find_map(|r| {
                if !shares(&pt.horizontal, &r.horizontal) {
                    return None;
                }
                let corner = lookup.get(&(r.x.to_bits(), b.y.to_bits()))?;
                (shares(&corner.vertical, &r.vertical) && shares(&corner.horizontal, &b.horizontal))
                    .then(|| BBox::new(pt.x, pt.y, r.x, b.y))
            })
        });
        cells.extend(found);
    }
    cells
}

/// Group cells that share at least one corner; single-cell groups are not
/// tables.
fn group_cells(cells: Vec<BBox>) -> Vec<DetectedTable> {
    let mut parent: Vec<usize> = (0..cells.len()).collect();
    fn root(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }

    let mut corner_owner: HashMap<(u32, u32), usize> = HashMap::new();
    for (i, cell) in cells.iter().enumerate() {
        let corners = [
            (cell.x0, cell.top),
            (cell.x1, cell.top),
            (cell.x0, cell.bottom),
            (cell.x1, cell.bottom),
        ];
        for (x, y) in corners {
            let key = (x.to_bits(), y.to_bits());
            match corner_owner.get(&key) {
                Some(&other) => {
                    let (a, b) = (root(&mut parent, i), root(&mut parent, other));
                    parent[a] = b;
                }
                None => {
                    corner_owner.insert(key, i);
                }
            }
        }
    }

    let mut groups: HashMap<usize, Vec<BBox>> = HashMap::new();
    for (i, cell) in cells.iter().enumerate() {
        let r = root(&mut parent, i);
        groups.entry(r).or_default().push(*cell);
    }

    let mut tables: Vec<DetectedTable> = groups
        .into_values()
        .filter(|group| group.len() > 1)
        .map(table_from_cells)
        .collect();
    tables.sort_by(|a, b| cmp_f32(a.bbox.top, b.bbox.top).then(cmp_f32(a.bbox.x0, b.bbox.x0)));
    tables
}

fn table_from_cells(mut cells: Vec<BBox>) -> DetectedTable {
    cells.sort_by(|a, b| cmp_f32(a.top, b.top).then(cmp_f32(a.x0, b.x0)));

    let mut rows: Vec<BBox> = Vec::new();
    let mut bbox = cells[0];
    let mut row_top: Option<f32> = None;
    for cell in &cells {
        bbox = bbox.union(cell);
        match (row_top, rows.last_mut()) {
            (Some(top), Some(row)) if top == cell.top => *row = row.union(cell),
            _ => rows.push(*cell),
        }
        row_top = Some(cell.top);
    }

    DetectedTable { bbox, cells, rows }
}

/// Slice `layout` along explicit lines into a dense `rows × columns` matrix.
///
/// `v_lines` and `h_lines` must be ascending. Each glyph lands in the cell
/// containing its centre (left and top edges inclusive); glyphs outside the
/// grid are dropped. Cell text joins words with spaces and lines with `\n`.
pub fn extract_grid(layout: &Layout, v_lines: &[f32], h_lines: &[f32]) -> Vec<Vec<String>> {
    let n_cols = v_lines.len().saturating_sub(1);
    let n_rows = h_lines.len().saturating_sub(1);
    let mut buckets: Vec<Vec<Vec<Glyph>>> = vec![vec![Vec::new(); n_cols]; n_rows];

    for glyph in &layout.glyphs {
        let (cx, cy) = (glyph.center_x(), glyph.center_y());
        let row = h_lines.windows(2).position(|w| cy >= w[0] && cy < w[1]);
        let col = v_lines.windows(2).position(|w| cx >= w[0] && cx < w[1]);
        if let (Some(row), Some(col)) = (row, col) {
            buckets[row][col].push(glyph.clone());
        }
    }

    buckets
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|glyphs| Layout::new(glyphs, Vec::new()).text())
                .collect()
        })
        .collect()
}
