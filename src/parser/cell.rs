//! Cell coercion.
//!
//! Every sub-table has a declared, ordered schema of `(column, rule)` pairs.
//! A row of raw cell strings is checked against the schema width once, then
//! each field is read by column name; asking for a column under the wrong
//! rule is an error rather than a silent misread.

use crate::error::{Error, Result, SubTable};
use crate::model::{ComponentRow, ElementRow, HeaderMetadata, JudgeMarks, JUDGE_COUNT, TOTAL_KEY};

/// How a column's raw text is converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Kept as text.
    Text,
    /// Integer; a parse failure is fatal.
    Integer,
    /// Float; `""` and `"-"` read as missing.
    Number,
    /// Float with an optional trailing `B` bonification marker; `""` reads
    /// as 0.
    BonusNumber,
}

/// A declared column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    /// Column name
    pub name: &'static str,
    /// Coercion rule
    pub rule: Rule,
}

const fn col(name: &'static str, rule: Rule) -> Column {
    Column { name, rule }
}

const JUDGE_COLUMNS: [&str; JUDGE_COUNT] = ["J1", "J2", "J3", "J4", "J5", "J6", "J7", "J8", "J9"];

/// Header block data row.
pub const HEADER_SCHEMA: &[Column] = &[
    col("rank", Rule::Text),
    col("name", Rule::Text),
    col("nation", Rule::Text),
    col("starting_number", Rule::Integer),
    col("total_segment_score", Rule::Number),
    col("total_element_score", Rule::BonusNumber),
    col("total_component_score", Rule::Number),
    col("total_deductions", Rule::Number),
];

/// Elements table row.
pub const ELEMENTS_SCHEMA: &[Column] = &[
    col("element_num", Rule::Text),
    col("element_desc", Rule::Text),
    col("info_flag", Rule::Text),
    col("base_value", Rule::Number),
    col("credit_flag", Rule::Text),
    col("goe", Rule::Number),
    col("J1", Rule::Number),
    col("J2", Rule::Number),
    col("J3", Rule::Number),
    col("J4", Rule::Number),
    col("J5", Rule::Number),
    col("J6", Rule::Number),
    col("J7", Rule::Number),
    col("J8", Rule::Number),
    col("J9", Rule::Number),
    col("ref", Rule::Text),
    col("scores_of_panel", Rule::Number),
];

/// Program components table row.
pub const COMPONENTS_SCHEMA: &[Column] = &[
    col("component_desc", Rule::Text),
    col("factor", Rule::Number),
    col("J1", Rule::Number),
    col("J2", Rule::Number),
    col("J3", Rule::Number),
    col("J4", Rule::Number),
    col("J5", Rule::Number),
    col("J6", Rule::Number),
    col("J7", Rule::Number),
    col("J8", Rule::Number),
    col("J9", Rule::Number),
    col("ref", Rule::Text),
    col("scores_of_panel", Rule::Number),
];

/// Finite decimal; `NaN` and infinities are not scores.
fn parse_finite(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a numeric cell: `""` and `"-"` are missing.
pub fn coerce_number(table: SubTable, column: &'static str, raw: &str) -> Result<Option<f64>> {
    let value = raw.trim();
    if value.is_empty() || value == "-" {
        return Ok(None);
    }
    parse_finite(value).map(Some).ok_or_else(|| Error::InvalidCell {
        table,
        column,
        value: raw.to_string(),
    })
}

/// Parse an integer cell.
pub fn coerce_integer(table: SubTable, column: &'static str, raw: &str) -> Result<i64> {
    raw.trim().parse().map_err(|_| Error::InvalidCell {
        table,
        column,
        value: raw.to_string(),
    })
}

/// Parse a bonification cell into `(value, flag)`.
///
/// `"12.34B"` → `(12.34, true)`, `"12.34"` → `(12.34, false)`,
/// `""` → `(0.0, false)`.
pub fn coerce_bonus(table: SubTable, column: &'static str, raw: &str) -> Result<(f64, bool)> {
    let value = raw.trim();
    if value.is_empty() {
        return Ok((0.0, false));
    }
    if let Some(number) = parse_finite(value) {
        return Ok((number, false));
    }
    value
        .strip_suffix('B')
        .and_then(|stripped| parse_finite(stripped.trim_end()))
        .map(|number| (number, true))
        .ok_or_else(|| Error::InvalidCell {
            table,
            column,
            value: raw.to_string(),
        })
}

/// One raw row checked against its schema.
#[derive(Debug)]
pub struct Cells<'a> {
    table: SubTable,
    schema: &'static [Column],
    raw: &'a [String],
}

impl<'a> Cells<'a> {
    /// Check the row width against the schema.
    pub fn new(table: SubTable, schema: &'static [Column], raw: &'a [String]) -> Result<Self> {
        if raw.len() != schema.len() {
            return Err(Error::TableShape {
                table,
                detail: format!("expected {} columns, found {}", schema.len(), raw.len()),
            });
        }
        Ok(Self { table, schema, raw })
    }

    fn cell(&self, name: &str, rule: Rule) -> Result<(&'static str, &'a str)> {
        let raw: &'a [String] = self.raw;
        let position = self.schema.iter().position(|c| c.name == name);
        match position {
            Some(i) if self.schema[i].rule == rule => Ok((self.schema[i].name, raw[i].as_str())),
            Some(i) => Err(Error::TableShape {
                table: self.table,
                detail: format!(
                    "column '{}' is declared {:?}, read as {:?}",
                    name, self.schema[i].rule, rule
                ),
            }),
            None => Err(Error::TableShape {
                table: self.table,
                detail: format!("no column '{}'", name),
            }),
        }
    }

    /// Read a text column.
    pub fn text(&self, name: &str) -> Result<String> {
        let (_, raw) = self.cell(name, Rule::Text)?;
        Ok(raw.to_string())
    }

    /// Read a text column where `""` and `"-"` mean missing.
    pub fn optional_text(&self, name: &str) -> Result<Option<String>> {
        let text = self.text(name)?;
        let trimmed = text.trim();
        Ok((!trimmed.is_empty() && trimmed != "-").then(|| trimmed.to_string()))
    }

    /// Read an integer column.
    pub fn integer(&self, name: &str) -> Result<i64> {
        let (column, raw) = self.cell(name, Rule::Integer)?;
        coerce_integer(self.table, column, raw)
    }

    /// Read a numeric column.
    pub fn number(&self, name: &str) -> Result<Option<f64>> {
        let (column, raw) = self.cell(name, Rule::Number)?;
        coerce_number(self.table, column, raw)
    }

    /// Read a bonification column.
    pub fn bonus(&self, name: &str) -> Result<(f64, bool)> {
        let (column, raw) = self.cell(name, Rule::BonusNumber)?;
        coerce_bonus(self.table, column, raw)
    }

    /// Read the nine judge columns.
    pub fn judges(&self) -> Result<JudgeMarks> {
        let mut marks: JudgeMarks = [None; JUDGE_COUNT];
        for (mark, name) in marks.iter_mut().zip(JUDGE_COLUMNS) {
            *mark = self.number(name)?;
        }
        Ok(marks)
    }
}

/// Build the header block from its data row.
pub fn header_from_row(raw: &[String]) -> Result<HeaderMetadata> {
    let cells = Cells::new(SubTable::Header, HEADER_SCHEMA, raw)?;
    let (total_element_score, bonification_flag) = cells.bonus("total_element_score")?;
    Ok(HeaderMetadata {
        rank: cells.text("rank")?,
        name: cells.text("name")?,
        nation: cells.text("nation")?,
        starting_number: cells.integer("starting_number")?,
        total_segment_score: cells.number("total_segment_score")?,
        total_element_score,
        total_component_score: cells.number("total_component_score")?,
        total_deductions: cells.number("total_deductions")?,
        bonification: 0.0,
        bonification_flag,
    })
}

/// Build an element row; the TOTAL row gets the `"total"` description.
pub fn element_from_row(raw: &[String], is_total: bool) -> Result<ElementRow> {
    let cells = Cells::new(SubTable::Elements, ELEMENTS_SCHEMA, raw)?;
    let description = if is_total {
        TOTAL_KEY.to_string()
    } else {
        cells.text("element_desc")?
    };
    Ok(ElementRow {
        number: cells.optional_text("element_num")?,
        description,
        info: cells.text("info_flag")?,
        base_value: cells.number("base_value")?,
        credit: cells.text("credit_flag")?,
        goe: cells.number("goe")?,
        judges: cells.judges()?,
        reference: cells.text("ref")?,
        panel_score: cells.number("scores_of_panel")?,
    })
}

/// Build a component row.
pub fn component_from_row(raw: &[String]) -> Result<ComponentRow> {
    let cells = Cells::new(SubTable::Components, COMPONENTS_SCHEMA, raw)?;
    Ok(ComponentRow {
        description: cells.text("component_desc")?,
        factor: cells.number("factor")?,
        judges: cells.judges()?,
        reference: cells.text("ref")?,
        panel_score: cells.number("scores_of_panel")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_bonification_cells() {
        let t = SubTable::Header;
        assert_eq!(coerce_bonus(t, "x", "12.34B").unwrap(), (12.34, true));
        assert_eq!(coerce_bonus(t, "x", "12.34").unwrap(), (12.34, false));
        assert_eq!(coerce_bonus(t, "x", "").unwrap(), (0.0, false));
        assert!(matches!(
            coerce_bonus(t, "x", "12.34C"),
            Err(Error::InvalidCell { .. })
        ));
        assert!(coerce_bonus(t, "x", "B").is_err());
    }

    #[test]
    fn test_numeric_cells() {
        let t = SubTable::Elements;
        assert_eq!(coerce_number(t, "goe", "").unwrap(), None);
        assert_eq!(coerce_number(t, "goe", "-").unwrap(), None);
        assert_eq!(coerce_number(t, "goe", "-0.53").unwrap(), Some(-0.53));
        assert_eq!(coerce_number(t, "goe", " 3 ").unwrap(), Some(3.0));
        let err = coerce_number(t, "goe", "12.34B").unwrap_err();
        assert_eq!(err.kind(), crate::error::FailureKind::Coercion);
    }

    #[test]
    fn test_non_finite_cells() {
        for raw in ["NaN", "nan", "inf", "-inf", "infinity"] {
            assert!(matches!(
                coerce_number(SubTable::Elements, "goe", raw),
                Err(Error::InvalidCell { .. })
            ));
            assert!(coerce_bonus(SubTable::Header, "x", raw).is_err());
        }
        assert!(coerce_bonus(SubTable::Header, "x", "infB").is_err());
        assert!(coerce_bonus(SubTable::Header, "x", "NaNB").is_err());
    }

    #[test]
    fn test_integer_cells() {
        let t = SubTable::Header;
        assert_eq!(coerce_integer(t, "starting_number", "12").unwrap(), 12);
        assert!(coerce_integer(t, "starting_number", "").is_err());
        assert!(coerce_integer(t, "starting_number", "1.5").is_err());
    }

    #[test]
    fn test_header_from_row() {
        let header = header_from_row(&row(&[
            "1", "Jane DOE", "FRA", "12", "150.20", "80.10B", "70.10", "0.00",
        ]))
        .unwrap();
        assert_eq!(header.name, "Jane DOE");
        assert_eq!(header.starting_number, 12);
        assert_eq!(header.total_element_score, 80.10);
        assert!(header.bonification_flag);
        assert_eq!(header.total_deductions, Some(0.0));
    }

    #[test]
    fn test_header_bad_starting_number() {
        let result = header_from_row(&row(&["1", "Jane DOE", "FRA", "x", "", "", "", ""]));
        match result {
            Err(Error::InvalidCell { column, .. }) => assert_eq!(column, "starting_number"),
            other => panic!("Expected InvalidCell, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_width_is_shape_error() {
        let result = header_from_row(&row(&["1", "Jane DOE"]));
        assert!(matches!(
            result,
            Err(Error::TableShape {
                table: SubTable::Header,
                ..
            })
        ));
    }

    #[test]
    fn test_element_rows() {
        let raw = row(&[
            "2", "3F", "<", "5.30", "x", "-0.53", "-1", "-1", "-", "-1", "-1", "", "", "", "",
            "", "4.77",
        ]);
        let element = element_from_row(&raw, false).unwrap();
        assert_eq!(element.number.as_deref(), Some("2"));
        assert_eq!(element.description, "3F");
        assert_eq!(element.info, "<");
        assert_eq!(element.credit, "x");
        assert_eq!(element.judges[0], Some(-1.0));
        assert_eq!(element.judges[2], None);
        assert_eq!(element.judges[8], None);
        assert_eq!(element.panel_score, Some(4.77));

        let mut total = raw.clone();
        total[0] = String::new();
        let total = element_from_row(&total, true).unwrap();
        assert_eq!(total.number, None);
        assert_eq!(total.description, "total");
    }

    #[test]
    fn test_rule_mismatch_is_reported() {
        let raw = row(&["1", "Jane DOE", "FRA", "12", "1", "2", "3", "4"]);
        let cells = Cells::new(SubTable::Header, HEADER_SCHEMA, &raw).unwrap();
        assert!(matches!(cells.number("name"), Err(Error::TableShape { .. })));
        assert!(matches!(cells.text("club"), Err(Error::TableShape { .. })));
    }
}
