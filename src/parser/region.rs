//! Table region location.
//!
//! Each ruled table found on a score sheet page is one skater's sheet: three
//! stacked row groups holding the header block, the elements and the program
//! components.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result, SubTable};
use crate::geometry::{BBox, Layout};
use crate::table::DetectedTable;

use super::grid::header_grid;

/// Row groups making up one score sheet.
pub const ROW_GROUPS: usize = 3;

/// Rows of the header block: labels and one data row.
pub const HEADER_ROWS: usize = 2;

/// Label that only appears in the components table header.
const COMPONENTS_PROBE: &str = "Factor";

/// The sub-table regions of one score sheet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TableRegion {
    /// Position of the table on its page (0-based, top to bottom)
    pub index: usize,
    /// Whole table
    pub bbox: BBox,
    /// Header block
    pub header: BBox,
    /// Elements table
    pub elements: BBox,
    /// Program components table
    pub components: BBox,
}

/// Split a detected table into its three sub-table regions.
///
/// Some layouts print the components inside the elements row group; when
/// the third group has no components header but the second one does, the
/// components region is the elements region.
pub fn locate(layout: &Layout, table: &DetectedTable, index: usize) -> Result<TableRegion> {
    let [header, elements, components] = table.rows.as_slice() else {
        return Err(Error::MalformedTable {
            expected: ROW_GROUPS,
            found: table.rows.len(),
        });
    };

    let components = if has_label(layout, *components, COMPONENTS_PROBE)
        || !has_label(layout, *elements, COMPONENTS_PROBE)
    {
        *components
    } else {
        log::debug!("table {}: components share the elements row group", index);
        *elements
    };

    Ok(TableRegion {
        index,
        bbox: table.bbox,
        header: *header,
        elements: *elements,
        components,
    })
}

fn has_label(layout: &Layout, bbox: BBox, label: &str) -> bool {
    layout.crop(bbox).words().iter().any(|w| w.text == label)
}

/// Read the header block's data row.
///
/// The block must hold exactly a label row and a data row; empty grid rows
/// are ignored.
pub fn header_cells(layout: &Layout, bbox: BBox) -> Result<Vec<String>> {
    let cropped = layout.crop(bbox);
    let grid = header_grid(&cropped, bbox)?;
    let mut rows: Vec<Vec<String>> = grid
        .extract(&cropped)
        .into_iter()
        .filter(|row| row.iter().any(|cell| !cell.is_empty()))
        .collect();

    if rows.len() != HEADER_ROWS {
        return Err(Error::TableShape {
            table: SubTable::Header,
            detail: format!("expected {} rows, found {}", HEADER_ROWS, rows.len()),
        });
    }
    Ok(rows.remove(1))
}
