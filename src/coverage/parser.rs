//! Scanner that turns a captured test log into coverage records

use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, trace};

use super::rules::{RuleAction, RuleSet, BUNCH_OF_DASHES};
use super::table::{build_record, classify_row, tokenize_row, RowKind};
use super::CoverageRecord;

/// The folder most recently seen in the table.
///
/// Reports only nest one level deep (a top-level folder, then its files), so
/// entering a folder replaces the previous one instead of stacking it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderContext {
    active: Option<String>,
}

impl FolderContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn enter(&mut self, folder: &str) {
        self.active = Some(folder.to_string());
    }

    /// Prefix `name` with the active folder, if any.
    ///
    /// Only the first `//` is collapsed; other path oddities are left alone.
    pub fn qualify(&self, name: &str) -> String {
        match &self.active {
            Some(folder) => format!("{}/{}", folder, name).replacen("//", "/", 1),
            None => name.to_string(),
        }
    }
}

/// Line scanner for text coverage tables
#[derive(Debug, Clone)]
pub struct ReportParser {
    rules: RuleSet,
    start_marker: String,
}

impl Default for ReportParser {
    fn default() -> Self {
        Self::new(RuleSet::jest())
    }
}

impl ReportParser {
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules,
            start_marker: BUNCH_OF_DASHES.to_string(),
        }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Parse every coverage row in `content`, in the order printed.
    pub fn parse(&self, content: &str) -> Vec<CoverageRecord> {
        let plain = strip_ansi(content);
        let lines: Vec<&str> = plain.lines().collect();

        let Some(start) = lines
            .iter()
            .position(|line| line.contains(self.start_marker.as_str()))
        else {
            debug!("no table border found, nothing to parse");
            return Vec::new();
        };
        debug!(line = start + 1, "coverage table starts");

        let mut folders = FolderContext::new();
        let mut records = Vec::new();

        for (offset, line) in lines[start..].iter().enumerate() {
            match self.rules.classify(line) {
                Some(RuleAction::Stop) => {
                    debug!(line = start + offset + 1, text = %line, "end of coverage table");
                    break;
                }
                Some(RuleAction::Skip) => {
                    trace!(line = start + offset + 1, "skipping noise");
                    continue;
                }
                None => {}
            }

            if let Some(record) = scan_row(line, &mut folders) {
                records.push(record);
            }
        }

        debug!(records = records.len(), "parsed coverage table");
        records
    }
}

/// Parse `content` with the default Jest rule table.
pub fn parse_coverage(content: &str) -> Vec<CoverageRecord> {
    ReportParser::default().parse(content)
}

/// Apply one data row to the folder context and build its record, if the
/// row is one that gets reported.
pub fn scan_row(line: &str, folders: &mut FolderContext) -> Option<CoverageRecord> {
    let mut fields = tokenize_row(line);

    match classify_row(&fields) {
        RowKind::Header => None,
        RowKind::Total => Some(build_record(&fields)),
        RowKind::Folder => {
            folders.enter(&fields[0]);
            Some(build_record(&fields))
        }
        RowKind::File => {
            fields[0] = folders.qualify(&fields[0]);
            Some(build_record(&fields))
        }
    }
}

/// CSI/OSC escape sequences only; tabs and other control bytes stay.
static ANSI_ESCAPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"[\x1B\x{9B}][\[\]()#;?]*(?:(?:(?:(?:;[-a-zA-Z\d/#&.:=?%@~_]+)*|[a-zA-Z\d]+(?:;[-a-zA-Z\d/#&.:=?%@~_]*)*)?\x07)|(?:(?:\d{1,4}(?:;\d{0,4})*)?[\dA-PR-TZcf-nq-uy=><~]))",
    )
    .expect("static regex must compile")
});

fn strip_ansi(content: &str) -> String {
    ANSI_ESCAPE_RE.replace_all(content, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::rules::LineRule;
    use crate::coverage::{get_total_line, is_file, is_folder};

    const SIMPLE_REPORT: &str = "\
----------|---------|----------|---------|---------|-------------------
File      | % Stmts | % Branch | % Funcs | % Lines | Uncovered Line #s
----------|---------|----------|---------|---------|-------------------
All files |   90.00 |    80.00 |   85.00 |   90.00 |
src       |   90.00 |    80.00 |   85.00 |   90.00 |
foo.ts    |   90.00 |    80.00 |   85.00 |   90.00 | 12,34
----------|---------|----------|---------|---------|-------------------
Test Suites: 1 passed, 1 total
";

    fn paths(records: &[CoverageRecord]) -> Vec<&str> {
        records.iter().map(|r| r.path.as_str()).collect()
    }

    #[test]
    fn test_simple_report() {
        let records = parse_coverage(SIMPLE_REPORT);

        assert_eq!(paths(&records), vec!["All files", "src", "src/foo.ts"]);
        assert_eq!(records[0].statements, 90.0);
        assert_eq!(records[0].uncovered_lines, None);
        assert!(is_folder(&records[1]));
        assert!(is_file(&records[2]));
        assert_eq!(
            records[2].uncovered_lines,
            Some(vec!["12".to_string(), "34".to_string()])
        );
    }

    #[test]
    fn test_no_table_border() {
        assert!(parse_coverage("").is_empty());
        assert!(parse_coverage("foo.ts | 90 | 80 | 85 | 90 |\nAll files | 1 | 2 | 3 | 4").is_empty());
    }

    #[test]
    fn test_banner_before_table_ignored() {
        let input = format!(
            "$ jest --coverage\nbanner.js | 1 | 2 | 3 | 4 |\n{}",
            SIMPLE_REPORT
        );
        let records = parse_coverage(&input);

        assert_eq!(paths(&records), vec!["All files", "src", "src/foo.ts"]);
    }

    #[test]
    fn test_nothing_after_terminator() {
        let input = format!(
            "{}late.ts | 1 | 2 | 3 | 4 |\n-----------\nother | 1 | 2 | 3 | 4 |\n",
            SIMPLE_REPORT
        );
        let records = parse_coverage(&input);

        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| !r.path.contains("late") && r.path != "other"));
    }

    #[test]
    fn test_folder_switch() {
        let input = "\
--------------|---------|----------|---------|---------|
All files     |      75 |       50 |      75 |      75 |
 src          |     100 |      100 |     100 |     100 |
  a.ts        |     100 |      100 |     100 |     100 |
  b.ts        |     100 |      100 |     100 |     100 |
 src/utils    |      50 |        0 |      50 |      50 |
  c.ts        |      50 |        0 |      50 |      50 | 3-9
--------------|---------|----------|---------|---------|
";
        let records = parse_coverage(input);

        assert_eq!(
            paths(&records),
            vec!["All files", "src", "src/a.ts", "src/b.ts", "src/utils", "src/utils/c.ts"]
        );
    }

    #[test]
    fn test_total_row_never_prefixed() {
        let input = "\
----------|---------|
src       |      90 |
a.ts      |      90 |
All files |      90 |
b.ts      |      90 |
";
        let records = parse_coverage(input);

        assert_eq!(paths(&records), vec!["src", "src/a.ts", "All files", "src/b.ts"]);
        assert_eq!(get_total_line(&records).map(|r| r.path.as_str()), Some("All files"));
    }

    #[test]
    fn test_files_before_any_folder_unprefixed() {
        let input = "\
----------|---------|
All files |      90 |
index.ts  |      90 |
";
        let records = parse_coverage(input);

        assert_eq!(paths(&records), vec!["All files", "index.ts"]);
    }

    #[test]
    fn test_noise_inside_table() {
        let input = "\
-------------|---------|
All files    |      90 |
\u{20}
cache hit, replaying output
lib          |      90 |
PASS Client src/lib.test.ts
lib.ts       |      90 |
Done in 4.2s.
";
        let records = parse_coverage(input);

        assert_eq!(paths(&records), vec!["All files", "lib", "lib/lib.ts"]);
    }

    #[test]
    fn test_ansi_colours_stripped() {
        let coloured = "\
\x1b[2m----------|---------|\x1b[22m
\x1b[32;1mAll files\x1b[0m |   \x1b[32;1m90.00\x1b[0m |
\x1b[32;1m src\x1b[0m      |   90.00 |
\x1b[31;1m  foo.ts\x1b[0m  |   \x1b[31;1m40.00\x1b[0m |
";
        let records = parse_coverage(coloured);

        assert_eq!(paths(&records), vec!["All files", "src", "src/foo.ts"]);
        assert_eq!(records[2].statements, 40.0);
    }

    #[test]
    fn test_control_bytes_survive_ansi_stripping() {
        let input = "----------|\n a.ts | 1 | 1 | 1 | 1 | 1\t,2\n";
        let records = parse_coverage(input);

        assert_eq!(
            records[0].uncovered_lines,
            Some(vec!["1\t".to_string(), "2".to_string()])
        );
        assert_eq!(
            strip_ansi("\x1b]8;;https://example.com\x07link\x1b]8;;\x07 \x1b[1;31mred\x1b[0m"),
            "link red"
        );
    }

    #[test]
    fn test_stop_line_mid_table() {
        let input = "\
----------|---------|
All files |      90 |
src       |      90 |
a.ts      |      90 |
Snapshots:   0 total
b.ts      |      90 |
lib       |      90 |
";
        let records = parse_coverage(input);

        assert_eq!(paths(&records), vec!["All files", "src", "src/a.ts"]);
    }

    #[test]
    fn test_windows_line_endings() {
        let input = SIMPLE_REPORT.replace('\n', "\r\n");
        let records = parse_coverage(&input);

        assert_eq!(paths(&records), vec!["All files", "src", "src/foo.ts"]);
        assert_eq!(records[2].uncovered_lines.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn test_custom_terminator() {
        let parser = ReportParser::new(
            RuleSet::jest().with_rules([LineRule::stop_if_contains("Ran all test suites")]),
        );
        let input = "\
----------|---------|
src       |      90 |
Ran all test suites.
a.ts      |      90 |
";
        let records = parser.parse(input);

        assert_eq!(paths(&records), vec!["src"]);
    }

    #[test]
    fn test_parser_is_reentrant() {
        let parser = ReportParser::default();

        let first = parser.parse(SIMPLE_REPORT);
        let second = parser.parse(SIMPLE_REPORT);

        assert_eq!(paths(&first), paths(&second));
    }

    #[test]
    fn test_folder_context_qualify() {
        let mut folders = FolderContext::new();
        assert_eq!(folders.qualify("a.ts"), "a.ts");

        folders.enter("src");
        assert_eq!(folders.active(), Some("src"));
        assert_eq!(folders.qualify("a.ts"), "src/a.ts");

        folders.enter("lib");
        assert_eq!(folders.active(), Some("lib"));
        assert_eq!(folders.qualify("b.ts"), "lib/b.ts");
    }

    #[test]
    fn test_folder_context_collapses_first_double_slash() {
        let mut folders = FolderContext::new();

        folders.enter("src/");
        assert_eq!(folders.qualify("a.ts"), "src/a.ts");
        assert_eq!(folders.qualify("/b//c.ts"), "src//b//c.ts");

        folders.enter("");
        assert_eq!(folders.qualify("a.ts"), "/a.ts");
    }

    #[test]
    fn test_scan_row_skips_header() {
        let mut folders = FolderContext::new();
        folders.enter("src");

        let header = "File | % Stmts | % Branch | % Funcs | % Lines | Uncovered Line #s";
        assert_eq!(scan_row(header, &mut folders), None);
        assert_eq!(folders.active(), Some("src"));
    }

    #[test]
    fn test_scan_row_total_keeps_folder() {
        let mut folders = FolderContext::new();
        folders.enter("src");

        let record = scan_row("All files | 1 | 2 | 3 | 4 |", &mut folders);
        assert_eq!(record.map(|r| r.path), Some("All files".to_string()));
        assert_eq!(folders.active(), Some("src"));
    }
}
