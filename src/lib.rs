//! covtable - coverage tables out of CI logs
//!
//! Turns the text coverage table printed by `jest --coverage` (and anything
//! else using the Istanbul text reporter) into typed records:
//! - Start at the table border, stop at runner summary lines
//! - Drop package-manager and runner chatter through a rule table
//! - Attribute file rows to the folder printed above them
//! - Check the `All files` row against minimum thresholds

pub mod config;
pub mod coverage;
pub mod report;

pub use config::Config;
pub use coverage::{
    get_total_line, is_file, is_folder, parse_coverage, parse_coverage_file, CoverageRecord,
    FolderContext, LineRule, ReportParser, RuleAction, RuleSet, Thresholds,
};
