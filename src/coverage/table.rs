//! Tokenizing and classifying rows of the coverage table

use super::{CoverageRecord, TOTAL_ROW_NAME};

/// Column labels that identify the table header
const HEADER_LABELS: [&str; 3] = ["File", "Stmts", "Lines"];

/// Kind of a tokenized table row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Header,
    /// The `All files` aggregate
    Total,
    Folder,
    File,
}

/// Split a row on `|` and clean each cell.
///
/// The first `%` and the first `#s` of every cell are removed, so both
/// `"85.71%"` and `"% Stmts"` come out bare.
pub fn tokenize_row(line: &str) -> Vec<String> {
    line.split('|')
        .map(|cell| cell.replacen('%', "", 1).replacen("#s", "", 1).trim().to_string())
        .collect()
}

pub fn is_header_row(fields: &[String]) -> bool {
    HEADER_LABELS
        .iter()
        .all(|label| fields.iter().any(|field| field == label))
}

pub fn is_total_row(fields: &[String]) -> bool {
    row_name(fields) == TOTAL_ROW_NAME
}

pub fn is_file_row(fields: &[String]) -> bool {
    row_name(fields).contains('.')
}

pub fn is_folder_row(fields: &[String]) -> bool {
    !is_file_row(fields) && !is_header_row(fields)
}

/// A name with a dot is always a file, even inside a header-looking row.
pub fn classify_row(fields: &[String]) -> RowKind {
    if is_file_row(fields) {
        RowKind::File
    } else if !is_folder_row(fields) {
        RowKind::Header
    } else if is_total_row(fields) {
        RowKind::Total
    } else {
        RowKind::Folder
    }
}

/// Build a record from tokenized cells. Never fails: bad numbers become NaN.
pub fn build_record(fields: &[String]) -> CoverageRecord {
    let cell = |index: usize| fields.get(index).map(String::as_str);

    CoverageRecord {
        path: row_name(fields).to_string(),
        statements: parse_percentage(cell(1)),
        branches: parse_percentage(cell(2)),
        functions: parse_percentage(cell(3)),
        lines: parse_percentage(cell(4)),
        uncovered_lines: cell(5)
            .filter(|spec| !spec.is_empty())
            .map(|spec| spec.split(',').map(str::to_string).collect()),
    }
}

/// Missing cell is NaN, a blank one counts as zero. `inf`, `nan` and
/// overflowing values are not percentages and come out as NaN.
fn parse_percentage(cell: Option<&str>) -> f64 {
    match cell.map(str::trim) {
        None => f64::NAN,
        Some("") => 0.0,
        Some(value) => match value.parse::<f64>() {
            Ok(number) if number.is_finite() => number,
            _ => f64::NAN,
        },
    }
}

fn row_name(fields: &[String]) -> &str {
    fields.first().map(String::as_str).unwrap_or_default()
}
