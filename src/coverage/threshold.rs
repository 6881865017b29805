//! Coverage threshold validation

use colored::Colorize;
use serde::Deserialize;

use super::CoverageRecord;

/// Minimum percentages for the totals row. Unset metrics are not checked.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Thresholds {
    #[serde(default)]
    pub statements: Option<f64>,
    #[serde(default)]
    pub branches: Option<f64>,
    #[serde(default)]
    pub functions: Option<f64>,
    #[serde(default)]
    pub lines: Option<f64>,
}

impl Thresholds {
    pub fn is_empty(&self) -> bool {
        self.statements.is_none()
            && self.branches.is_none()
            && self.functions.is_none()
            && self.lines.is_none()
    }

    /// Values set in `other` replace ours
    pub fn overridden_by(&self, other: &Thresholds) -> Thresholds {
        Thresholds {
            statements: other.statements.or(self.statements),
            branches: other.branches.or(self.branches),
            functions: other.functions.or(self.functions),
            lines: other.lines.or(self.lines),
        }
    }

    fn metrics(&self) -> [(&'static str, Option<f64>); 4] {
        [
            ("Statements", self.statements),
            ("Branches", self.branches),
            ("Functions", self.functions),
            ("Lines", self.lines),
        ]
    }
}

/// Outcome for one checked metric
#[derive(Debug, Clone)]
pub struct MetricCheck {
    pub metric: &'static str,
    pub coverage: f64,
    pub threshold: f64,
    pub passed: bool,
}

impl MetricCheck {
    pub fn delta(&self) -> f64 {
        self.coverage - self.threshold
    }
}

/// Result of threshold validation
#[derive(Debug, Clone)]
pub struct ThresholdResult {
    pub passed: bool,
    pub checks: Vec<MetricCheck>,
}

impl ThresholdResult {
    pub fn failed_metrics(&self) -> Vec<&'static str> {
        self.checks
            .iter()
            .filter(|c| !c.passed)
            .map(|c| c.metric)
            .collect()
    }

    pub fn print_summary(&self) {
        for check in &self.checks {
            let status = if check.passed { "✓".green() } else { "✗".red() };
            let delta = check.delta();
            let delta_str = if delta.is_nan() {
                "n/a".red()
            } else if delta >= 0.0 {
                format!("+{:.1}%", delta).green()
            } else {
                format!("{:.1}%", delta).red()
            };

            println!(
                "  {} {} coverage: {:.1}% (threshold: {:.1}%, {})",
                status, check.metric, check.coverage, check.threshold, delta_str
            );
        }
    }
}

/// Validate the totals row against thresholds. A NaN percentage never passes.
pub fn validate_threshold(total: &CoverageRecord, thresholds: &Thresholds) -> ThresholdResult {
    let actual = [total.statements, total.branches, total.functions, total.lines];

    let checks: Vec<MetricCheck> = thresholds
        .metrics()
        .into_iter()
        .zip(actual)
        .filter_map(|((metric, threshold), coverage)| {
            threshold.map(|threshold| MetricCheck {
                metric,
                coverage,
                threshold,
                passed: coverage >= threshold,
            })
        })
        .collect();

    ThresholdResult {
        passed: checks.iter().all(|c| c.passed),
        checks,
    }
}
