//! Record assembly.
//!
//! Reads the three sub-tables of a located region, validates them and merges
//! them with the page heading and the caller's context into one
//! [`PerformanceRecord`].

use indexmap::IndexMap;

use crate::context::ParseContext;
use crate::error::{Error, Result, SubTable};
use crate::geometry::Layout;
use crate::model::{
    ComponentRow, ElementRow, HeaderMetadata, PerformanceRecord, RecordMetadata, TOTAL_KEY,
};

use super::cell::{component_from_row, element_from_row, header_from_row};
use super::grid::{components_grid, elements_grid};
use super::region::{header_cells, TableRegion};
use super::validate::{validate_components, validate_elements};

/// The validated contents of one score sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetTables {
    /// Header block
    pub header: HeaderMetadata,
    /// Elements, TOTAL row last
    pub elements: IndexMap<String, ElementRow>,
    /// Components, TOTAL row dropped
    pub components: IndexMap<String, ComponentRow>,
    /// Elements panel discrepancy
    pub discrepancy: f64,
}

/// Read and validate all three sub-tables of a region.
pub fn read_sheet(layout: &Layout, region: &TableRegion) -> Result<SheetTables> {
    let header = header_from_row(&header_cells(layout, region.header)?)?;
    let (elements, discrepancy) = read_elements(layout, region)?;
    let components = read_components(layout, region)?;
    Ok(SheetTables {
        header,
        elements,
        components,
        discrepancy,
    })
}

/// Read the elements table; returns the rows keyed by element number and
/// the panel discrepancy.
pub fn read_elements(
    layout: &Layout,
    region: &TableRegion,
) -> Result<(IndexMap<String, ElementRow>, f64)> {
    let cropped = layout.crop(region.elements);
    let grid = elements_grid(&cropped, region.elements)?;
    let raw = grid.extract(&cropped);
    let last = raw.len().saturating_sub(1);

    let rows = raw
        .iter()
        .enumerate()
        .map(|(i, row)| element_from_row(row, i == last))
        .collect::<Result<Vec<_>>>()?;
    let discrepancy = validate_elements(&rows)?;

    let mut keyed = IndexMap::with_capacity(rows.len());
    for (i, row) in rows.into_iter().enumerate() {
        let key = if i == last {
            TOTAL_KEY.to_string()
        } else {
            row.number.clone().unwrap_or_else(|| format!("row-{}", i + 1))
        };
        insert_unique(&mut keyed, SubTable::Elements, key, row)?;
    }
    Ok((keyed, discrepancy))
}

/// Read the components table, keyed by normalized component name.
pub fn read_components(
    layout: &Layout,
    region: &TableRegion,
) -> Result<IndexMap<String, ComponentRow>> {
    let cropped = layout.crop(region.components);
    let grid = components_grid(&cropped, region.components)?;
    let mut rows = grid
        .extract(&cropped)
        .iter()
        .map(|row| component_from_row(row))
        .collect::<Result<Vec<_>>>()?;
    validate_components(&rows)?;
    rows.pop();

    let mut keyed = IndexMap::with_capacity(rows.len());
    for row in rows {
        let key = component_key(&row.description);
        insert_unique(&mut keyed, SubTable::Components, key, row)?;
    }
    Ok(keyed)
}

fn insert_unique<V>(
    map: &mut IndexMap<String, V>,
    table: SubTable,
    key: String,
    value: V,
) -> Result<()> {
    if map.contains_key(&key) {
        return Err(Error::TableShape {
            table,
            detail: format!("duplicate row key '{}'", key),
        });
    }
    map.insert(key, value);
    Ok(())
}

/// Normalize a component description into a key.
///
/// Hyphens become spaces, words are split before every run of capitals and
/// before every capitalised word, then joined with `_` and lower-cased:
/// "Skating Skills" → `skating_skills`, "PCSkills" → `pc_skills`.
pub fn component_key(description: &str) -> String {
    let chars: Vec<char> = description.replace('-', " ").chars().collect();
    let mut spaced = String::with_capacity(chars.len() * 2);
    for (i, c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev_upper = i > 0 && chars[i - 1].is_uppercase();
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if !prev_upper || next_lower {
                spaced.push(' ');
            }
        }
        spaced.push(*c);
    }
    spaced
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}

/// Program name from the page heading: the line after the marker when the
/// page opens with it, the first line otherwise.
pub fn program_name(text: &str, marker: &str) -> Option<String> {
    let mut lines = text.lines().map(str::trim);
    let first = lines.next()?;
    let program = if first == marker { lines.next()? } else { first };
    (!program.is_empty()).then(|| program.to_string())
}

/// Build page and context metadata for a record.
pub fn record_metadata(
    header: &HeaderMetadata,
    program: Option<String>,
    context: Option<&ParseContext>,
) -> RecordMetadata {
    let Some(context) = context else {
        return RecordMetadata {
            program,
            ..RecordMetadata::default()
        };
    };

    let club = match context.entries.club_of(&header.name) {
        Some(club) => club.to_string(),
        None => {
            log::warn!("Skater not found in entries: {}", header.name);
            String::new()
        }
    };
    let entry_count = program
        .as_deref()
        .map(|program| context.entries.count_matching(program));

    RecordMetadata {
        program,
        competition: Some(context.competition.clone()),
        city: Some(context.city.clone()),
        kind: Some(context.kind.clone()),
        season: Some(context.season()),
        start: Some(context.start),
        end: Some(context.end),
        entry_count,
        club: Some(club),
    }
}

/// Merge validated sub-tables and page context into a record.
pub fn assemble(
    page: u32,
    sheet: SheetTables,
    program: Option<String>,
    context: Option<&ParseContext>,
) -> PerformanceRecord {
    let SheetTables {
        mut header,
        elements,
        components,
        discrepancy,
    } = sheet;
    header.bonification = discrepancy;
    let metadata = record_metadata(&header, program, context);

    PerformanceRecord {
        page,
        header,
        elements,
        components,
        discrepancy,
        metadata,
    }
}
