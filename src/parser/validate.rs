//! Arithmetic cross-checks of the extracted tables.

use crate::error::{Error, Result, SubTable};
use crate::model::{ComponentRow, ElementRow};

/// Allowed gap between the weighted component sum and the TOTAL row.
pub const COMPONENT_TOLERANCE: f64 = 0.1;

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn invariant(table: SubTable, detail: String) -> Error {
    Error::Invariant { table, detail }
}

/// Check the elements table and return its discrepancy.
///
/// `rows` ends with the TOTAL row. The TOTAL base value must be the sum of
/// the element base values to 3 decimals, which is checked as
/// `2 × TOTAL == Σ all rows`. The same difference on panel scores is the
/// discrepancy: bonifications make it legitimately non-zero, so it is
/// returned, rounded to whole points, rather than checked.
pub fn validate_elements(rows: &[ElementRow]) -> Result<f64> {
    let table = SubTable::Elements;
    let Some(total) = rows.last() else {
        return Err(Error::TableShape {
            table,
            detail: "no rows".to_string(),
        });
    };

    let total_base = total
        .base_value
        .ok_or_else(|| invariant(table, "TOTAL row has no base value".to_string()))?;
    let base_sum: f64 = rows.iter().filter_map(|r| r.base_value).sum();
    let base_gap = round_to(2.0 * total_base - base_sum, 3);
    if base_gap != 0.0 {
        return Err(invariant(
            table,
            format!(
                "base values sum to {:.2}, TOTAL row says {:.2}",
                base_sum - total_base,
                total_base
            ),
        ));
    }

    let total_panel = total
        .panel_score
        .ok_or_else(|| invariant(table, "TOTAL row has no panel score".to_string()))?;
    let panel_sum: f64 = rows.iter().filter_map(|r| r.panel_score).sum();
    Ok((2.0 * total_panel - panel_sum).round_ties_even())
}

/// Check the components table (TOTAL row last): the factor-weighted panel
/// scores, each rounded to 3 decimals, must add up to the TOTAL row within
/// [`COMPONENT_TOLERANCE`].
pub fn validate_components(rows: &[ComponentRow]) -> Result<()> {
    let table = SubTable::Components;
    let Some((total, components)) = rows.split_last() else {
        return Err(Error::TableShape {
            table,
            detail: "no rows".to_string(),
        });
    };

    let declared = total
        .panel_score
        .ok_or_else(|| invariant(table, "TOTAL row has no panel score".to_string()))?;
    let weighted: f64 = components
        .iter()
        .filter_map(|c| Some(round_to(c.panel_score? * c.factor?, 3)))
        .sum();

    if (weighted - declared).abs() >= COMPONENT_TOLERANCE {
        return Err(invariant(
            table,
            format!(
                "weighted components sum to {:.3}, TOTAL row says {:.2}",
                weighted, declared
            ),
        ));
    }
    Ok(())
}
