//! Record types produced by the parser.
//!
//! One [`PerformanceRecord`] is produced per score sheet: the header block,
//! the executed elements and the program components, plus the metadata
//! derived from the page and the caller's context.

mod header;
mod record;
mod rows;

pub use header::{HeaderMetadata, RankCode};
pub use record::{PerformanceRecord, RecordMetadata, TOTAL_KEY};
pub use rows::{ComponentRow, ElementRow, JudgeMarks, JUDGE_COUNT};
