//! Coverage module
//!
//! Provides:
//! - Text coverage table parsing
//! - Noise/terminator rule tables
//! - Threshold validation

mod parser;
mod rules;
mod table;
mod threshold;

pub use parser::*;
pub use rules::*;
pub use table::*;
pub use threshold::*;

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Name of the aggregate row at the top of every table
pub const TOTAL_ROW_NAME: &str = "All files";

/// One row of a coverage table, for a file or a folder
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageRecord {
    pub path: String,
    #[serde(rename = "statementsPct")]
    pub statements: f64,
    #[serde(rename = "branchesPct")]
    pub branches: f64,
    #[serde(rename = "functionsPct")]
    pub functions: f64,
    #[serde(rename = "linesPct")]
    pub lines: f64,
    pub uncovered_lines: Option<Vec<String>>,
}

impl CoverageRecord {
    pub fn is_file(&self) -> bool {
        self.path.contains('.')
    }

    pub fn is_folder(&self) -> bool {
        !self.is_file()
    }

    pub fn is_total(&self) -> bool {
        self.path == TOTAL_ROW_NAME
    }
}

/// Find the `All files` row
pub fn get_total_line(records: &[CoverageRecord]) -> Option<&CoverageRecord> {
    records.iter().find(|record| record.is_total())
}

pub fn is_file(record: &CoverageRecord) -> bool {
    record.is_file()
}

pub fn is_folder(record: &CoverageRecord) -> bool {
    record.is_folder()
}

/// Parse a captured test log from disk
pub fn parse_coverage_file(path: &Path, parser: &ReportParser) -> Result<Vec<CoverageRecord>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read coverage log: {}", path.display()))?;
    Ok(parser.parse(&content))
}
