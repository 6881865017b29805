use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::coverage::{LineRule, ReportParser, RuleSet, Thresholds};

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub thresholds: Thresholds,
}

/// Extra rules appended to the built-in Jest table
#[derive(Debug, Default, Deserialize)]
pub struct RulesConfig {
    /// Stop scanning at lines containing any of these
    #[serde(default)]
    pub terminators: Vec<String>,
    /// Stop scanning at lines starting with any of these
    #[serde(default)]
    pub terminator_prefixes: Vec<String>,
    /// Skip lines containing any of these
    #[serde(default)]
    pub noise: Vec<String>,
    /// Skip lines starting with any of these
    #[serde(default)]
    pub noise_prefixes: Vec<String>,
}

impl RulesConfig {
    pub fn to_rules(&self) -> Vec<LineRule> {
        let terminators = self
            .terminators
            .iter()
            .map(|p| LineRule::stop_if_contains(p.as_str()));
        let terminator_prefixes = self
            .terminator_prefixes
            .iter()
            .map(|p| LineRule::stop_if_starts_with(p.as_str()));
        let noise = self.noise.iter().map(|p| LineRule::skip_if_contains(p.as_str()));
        let noise_prefixes = self
            .noise_prefixes
            .iter()
            .map(|p| LineRule::skip_if_starts_with(p.as_str()));

        terminators
            .chain(terminator_prefixes)
            .chain(noise)
            .chain(noise_prefixes)
            .collect()
    }

    fn patterns(&self) -> impl Iterator<Item = &String> {
        self.terminators
            .iter()
            .chain(&self.terminator_prefixes)
            .chain(&self.noise)
            .chain(&self.noise_prefixes)
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        // An empty pattern would match every line
        if self.rules.patterns().any(|p| p.is_empty()) {
            anyhow::bail!("Rule patterns must not be empty");
        }

        let thresholds = [
            ("statements", self.thresholds.statements),
            ("branches", self.thresholds.branches),
            ("functions", self.thresholds.functions),
            ("lines", self.thresholds.lines),
        ];
        for (name, value) in thresholds {
            if let Some(value) = value {
                if !(0.0..=100.0).contains(&value) {
                    anyhow::bail!(
                        "Threshold '{}' must be between 0 and 100, got {}",
                        name,
                        value
                    );
                }
            }
        }

        Ok(())
    }

    /// Parser using the Jest rules plus any configured extras
    pub fn parser(&self) -> ReportParser {
        ReportParser::new(RuleSet::jest().with_rules(self.rules.to_rules()))
    }
}
