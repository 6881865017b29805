use anyhow::{Context, Result};
use colored::{ColoredString, Colorize};

use crate::coverage::{get_total_line, CoverageRecord};

/// Counts over a parsed table
#[derive(Debug, Clone, Default)]
pub struct ReportSummary {
    pub files: usize,
    pub folders: usize,
    pub total: Option<CoverageRecord>,
}

pub fn summarize(records: &[CoverageRecord]) -> ReportSummary {
    let files = records.iter().filter(|r| r.is_file()).count();
    // The totals row is a folder-like record, but not a folder of its own
    let folders = records
        .iter()
        .filter(|r| r.is_folder() && !r.is_total())
        .count();

    ReportSummary {
        files,
        folders,
        total: get_total_line(records).cloned(),
    }
}

/// Pretty JSON array of records
pub fn to_json(records: &[CoverageRecord]) -> Result<String> {
    serde_json::to_string_pretty(records).context("Failed to serialize coverage records")
}

/// Print records as an aligned terminal table
pub fn print_table(records: &[CoverageRecord]) {
    if records.is_empty() {
        println!("  {}", "No coverage rows found".dimmed());
        return;
    }

    let width = records
        .iter()
        .map(|r| r.path.chars().count())
        .max()
        .unwrap_or(0)
        .max("File".len());

    println!(
        "{}",
        format!(
            "{:<width$}  {:>7}  {:>7}  {:>7}  {:>7}  {}",
            "File",
            "Stmts",
            "Branch",
            "Funcs",
            "Lines",
            "Uncovered",
            width = width
        )
        .bold()
    );
    println!("{}", "─".repeat(width + 46).dimmed());

    for record in records {
        let name = format!("{:<width$}", record.path, width = width);
        let name = if record.is_folder() {
            name.bold()
        } else {
            name.normal()
        };
        let uncovered = record
            .uncovered_lines
            .as_ref()
            .map(|lines| lines.join(","))
            .unwrap_or_default();

        println!(
            "{}  {}  {}  {}  {}  {}",
            name,
            percentage(record.statements),
            percentage(record.branches),
            percentage(record.functions),
            percentage(record.lines),
            uncovered.dimmed()
        );
    }

    let summary = summarize(records);
    println!();
    println!(
        "  {} files in {} folders",
        summary.files.to_string().cyan(),
        summary.folders.to_string().cyan()
    );
}

fn percentage(value: f64) -> ColoredString {
    if value.is_nan() {
        return format!("{:>7}", "-").dimmed();
    }

    let text = format!("{:>7.2}", value);
    if value >= 80.0 {
        text.green()
    } else if value >= 50.0 {
        text.yellow()
    } else {
        text.red()
    }
}
