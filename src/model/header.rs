//! Score sheet header.

use serde::{Deserialize, Serialize};

/// Identity and segment totals of one skater.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderMetadata {
    /// Rank as printed; may be a withdrawal or disqualification code
    pub rank: String,
    /// Skater name as printed ("Firstname LASTNAME")
    pub name: String,
    /// Nation or club code
    pub nation: String,
    /// Starting number
    pub starting_number: i64,
    /// Total segment score
    pub total_segment_score: Option<f64>,
    /// Total element score; an empty cell reads as 0
    pub total_element_score: f64,
    /// Total program component score
    pub total_component_score: Option<f64>,
    /// Total deductions
    pub total_deductions: Option<f64>,
    /// Bonification amount (the elements table discrepancy)
    pub bonification: f64,
    /// Whether the total element score carried a `B` suffix
    pub bonification_flag: bool,
}

impl HeaderMetadata {
    /// Interpret the rank column.
    pub fn rank_code(&self) -> RankCode {
        RankCode::parse(&self.rank)
    }
}

/// Meaning of the rank column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankCode {
    /// Ranked at this position
    Placed(u32),
    /// Withdrew (`WD`)
    Withdrawn,
    /// Disqualified (`DSQ`)
    Disqualified,
    /// Anything else, verbatim
    Other(String),
}

impl RankCode {
    /// Parse a rank cell.
    pub fn parse(rank: &str) -> Self {
        let rank = rank.trim();
        match rank {
            "WD" => RankCode::Withdrawn,
            "DSQ" => RankCode::Disqualified,
            _ => rank
                .parse()
                .map(RankCode::Placed)
                .unwrap_or_else(|_| RankCode::Other(rank.to_string())),
        }
    }

    /// Whether the skater completed the segment with a placement.
    pub fn is_placed(&self) -> bool {
        matches!(self, RankCode::Placed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_codes() {
        assert_eq!(RankCode::parse("1"), RankCode::Placed(1));
        assert_eq!(RankCode::parse(" 12 "), RankCode::Placed(12));
        assert_eq!(RankCode::parse("WD"), RankCode::Withdrawn);
        assert_eq!(RankCode::parse("DSQ"), RankCode::Disqualified);
        assert_eq!(RankCode::parse("n/a"), RankCode::Other("n/a".to_string()));
        assert!(!RankCode::parse("WD").is_placed());
    }
}
