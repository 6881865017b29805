//! Noise and terminator rules for coverage logs
//!
//! A coverage table rarely arrives alone: the captured stream also carries
//! package-manager chatter, runner banners and summary blocks. Each rule pairs
//! a line matcher with what the scanner should do when it fires.

/// Marker for the table's horizontal rules. The first line containing it
/// starts the scan.
pub const BUNCH_OF_DASHES: &str = "--------";

/// Marker for the `=== Coverage summary ===` block rules.
pub const BUNCH_OF_EQUALS: &str = "========";

/// What the scanner does with a matching line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleAction {
    /// Stop scanning, everything after belongs to something else
    Stop,
    /// Drop the line and keep going
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    Contains(String),
    StartsWith(String),
    /// Empty or whitespace-only line
    Blank,
}

impl Matcher {
    pub fn matches(&self, line: &str) -> bool {
        match self {
            Matcher::Contains(needle) => line.contains(needle.as_str()),
            Matcher::StartsWith(prefix) => line.starts_with(prefix.as_str()),
            Matcher::Blank => line.trim().is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRule {
    pub matcher: Matcher,
    pub action: RuleAction,
}

impl LineRule {
    pub fn stop_if_contains(needle: impl Into<String>) -> Self {
        Self {
            matcher: Matcher::Contains(needle.into()),
            action: RuleAction::Stop,
        }
    }

    pub fn stop_if_starts_with(prefix: impl Into<String>) -> Self {
        Self {
            matcher: Matcher::StartsWith(prefix.into()),
            action: RuleAction::Stop,
        }
    }

    pub fn skip_if_contains(needle: impl Into<String>) -> Self {
        Self {
            matcher: Matcher::Contains(needle.into()),
            action: RuleAction::Skip,
        }
    }

    pub fn skip_if_starts_with(prefix: impl Into<String>) -> Self {
        Self {
            matcher: Matcher::StartsWith(prefix.into()),
            action: RuleAction::Skip,
        }
    }

    pub fn skip_blank() -> Self {
        Self {
            matcher: Matcher::Blank,
            action: RuleAction::Skip,
        }
    }
}

/// Ordered rule table consulted for every scanned line
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<LineRule>,
}

impl RuleSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Rules for `jest --coverage` output, including the yarn and turbo
    /// wrappers it is usually launched through.
    pub fn jest() -> Self {
        let terminators = [
            LineRule::stop_if_contains("Jest: "),
            LineRule::stop_if_contains("coverage threshold for "),
            LineRule::stop_if_contains("Test Suites: "),
            LineRule::stop_if_contains("Snapshots: "),
            LineRule::stop_if_contains("Time: "),
            LineRule::stop_if_starts_with(
                "info Visit https://yarnpkg.com/en/docs/cli/run for documentation about this command.",
            ),
            LineRule::stop_if_starts_with("error Command failed with exit code 1."),
        ];

        let noise = [
            LineRule::skip_if_contains(BUNCH_OF_EQUALS),
            LineRule::skip_if_contains(BUNCH_OF_DASHES),
            LineRule::skip_blank(),
            LineRule::skip_if_contains("turbo run test"),
            LineRule::skip_if_contains("Packages in scope"),
            LineRule::skip_if_contains("Running test"),
            LineRule::skip_if_contains("Remote caching "),
            LineRule::skip_if_contains("iron:test"),
            LineRule::skip_if_contains("cache miss"),
            LineRule::skip_if_contains("cache hit"),
            LineRule::skip_if_contains("yarn run"),
            LineRule::skip_if_contains("$ ci=true jest"),
            LineRule::skip_if_contains("Browserslist: caniuse-lite is outdated. Please run:"),
            LineRule::skip_if_contains("npx update-browserslist-db@latest"),
            LineRule::skip_if_contains("Why you should do it"),
            LineRule::skip_if_starts_with("PASS Client"),
            LineRule::skip_if_starts_with("PASS Server"),
            LineRule::skip_if_starts_with("FAIL Client"),
            LineRule::skip_if_starts_with("FAIL Server"),
            LineRule::skip_if_contains("Coverage summary"),
            LineRule::skip_if_contains("Statements"),
            LineRule::skip_if_contains("Branches"),
            LineRule::skip_if_contains("Functions"),
            LineRule::skip_if_contains("Lines"),
            LineRule::skip_if_starts_with("Done in "),
        ];

        Self {
            rules: terminators.into_iter().chain(noise).collect(),
        }
    }

    pub fn with_rules(mut self, rules: impl IntoIterator<Item = LineRule>) -> Self {
        self.rules.extend(rules);
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Decide what to do with a line. Stop rules win over skip rules no
    /// matter where they sit in the table; `None` means the line is a
    /// candidate data row.
    pub fn classify(&self, line: &str) -> Option<RuleAction> {
        if self.first_match(line, RuleAction::Stop) {
            return Some(RuleAction::Stop);
        }
        if self.first_match(line, RuleAction::Skip) {
            return Some(RuleAction::Skip);
        }
        None
    }

    fn first_match(&self, line: &str, action: RuleAction) -> bool {
        self.rules
            .iter()
            .filter(|rule| rule.action == action)
            .any(|rule| rule.matcher.matches(line))
    }
}
