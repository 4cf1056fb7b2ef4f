//! Score sheet parsing.
//!
//! Pages flow through [`classify`], [`region`], [`grid`], [`cell`],
//! [`validate`] and [`assemble`]; [`driver`] runs that pipeline over whole
//! documents.

pub mod assemble;
pub mod cell;
pub mod classify;
pub mod driver;
pub mod grid;
mod options;
pub mod region;
pub mod validate;

pub use assemble::{component_key, program_name, SheetTables};
pub use classify::{classify, Classification, PageClass};
pub use driver::{
    parse_document, parse_file, parse_files, parse_outcome, parse_page, second_pass,
    DocumentOutcome, DocumentReport, PageFailure, PageReport, SkipReason, SkippedPage,
};
pub use options::{ErrorMode, PageSelection, ParseOptions, DEFAULT_MARKER};
pub use region::{locate, TableRegion};
