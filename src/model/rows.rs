//! Element and component rows.

use serde::{Deserialize, Serialize};

/// Number of judge columns on a score sheet.
pub const JUDGE_COUNT: usize = 9;

/// Marks of judges J1..J9; absent judges are `None`.
pub type JudgeMarks = [Option<f64>; JUDGE_COUNT];

/// One executed element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementRow {
    /// Sequence number; `None` on blank rows and on the TOTAL row
    pub number: Option<String>,
    /// Element code ("3Lz+3T"); `"total"` on the TOTAL row
    pub description: String,
    /// Info flag ("<", "e", "*", ...)
    pub info: String,
    /// Base value
    pub base_value: Option<f64>,
    /// Credit / highlight flag ("x" for second-half bonus)
    pub credit: String,
    /// Grade of execution
    pub goe: Option<f64>,
    /// Per-judge GOE marks
    pub judges: JudgeMarks,
    /// Reference flag
    pub reference: String,
    /// Panel score
    pub panel_score: Option<f64>,
}

/// One program component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentRow {
    /// Component name as printed ("Skating Skills")
    pub description: String,
    /// Weighting factor
    pub factor: Option<f64>,
    /// Per-judge marks
    pub judges: JudgeMarks,
    /// Reference flag
    pub reference: String,
    /// Panel score
    pub panel_score: Option<f64>,
}
