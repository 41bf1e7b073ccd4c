use anyhow::{Context, Result};
use regex::Regex;

use crate::config::SummaryConfig;

/// Words that mark a group key as liability-bearing.
pub const DEFAULT_LIABILITY_KEYWORDS: [&str; 9] = [
    "credit",
    "loan",
    "loans",
    "mortgage",
    "mortgages",
    "liability",
    "liabilities",
    "debt",
    "debts",
];

/// Decides which group keys denote liabilities (credit lines, loans, ...).
///
/// A key matches when one of its words equals a configured keyword
/// (case-insensitive), or when any configured regex matches the key. Words are
/// split on anything that is not alphanumeric, so `credit_card` matches
/// `credit`.
#[derive(Debug, Clone)]
pub struct LiabilityMatcher {
    keywords: Vec<String>,
    patterns: Vec<Regex>,
}

impl Default for LiabilityMatcher {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_LIABILITY_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
            patterns: Vec::new(),
        }
    }
}

impl LiabilityMatcher {
    pub fn from_config(config: &SummaryConfig) -> Result<Self> {
        let keywords = config
            .liability_keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        let mut patterns = Vec::with_capacity(config.liability_patterns.len());
        for (idx, pattern) in config.liability_patterns.iter().enumerate() {
            let trimmed = pattern.trim();
            if trimmed.is_empty() {
                continue;
            }
            let compiled = Regex::new(trimmed).with_context(|| {
                format!("Invalid summary.liability_patterns[{idx}] regex: {trimmed}")
            })?;
            patterns.push(compiled);
        }

        Ok(Self { keywords, patterns })
    }

    pub fn is_liability(&self, key: &str) -> bool {
        let lowered = key.to_lowercase();
        let keyword_hit = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|word| !word.is_empty())
            .any(|word| self.keywords.iter().any(|k| k == word));

        keyword_hit || self.patterns.iter().any(|re| re.is_match(key))
    }
}
