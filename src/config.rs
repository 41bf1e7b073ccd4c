use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::portfolio::{Grouping, DEFAULT_LIABILITY_KEYWORDS};

/// Default reporting currency.
fn default_reporting_currency() -> String {
    "USD".to_string()
}

/// Display/output formatting configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Money amounts are rounded (half away from zero) to this many decimal
    /// places before rendering. Purely presentational.
    pub currency_decimals: Option<u32>,

    /// Render money amounts with thousands separators.
    pub currency_grouping: bool,

    /// Optional currency symbol prefix (e.g. "$", "€").
    pub currency_symbol: Option<String>,

    /// When true and `currency_decimals` is set, pad to exactly that many
    /// decimal places.
    pub currency_fixed_decimals: bool,

    /// Decimal places for percentages.
    pub percent_decimals: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            currency_decimals: Some(2),
            currency_grouping: true,
            currency_symbol: Some("$".to_string()),
            currency_fixed_decimals: true,
            percent_decimals: 2,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupingConfig {
    /// Dimension used when a command does not name one.
    pub default: Grouping,
}

/// Liability detection for the summary reducer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    /// Group keys containing a word that starts with one of these are liabilities.
    pub liability_keywords: Vec<String>,

    /// Regexes matched against the whole group key.
    pub liability_patterns: Vec<String>,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            liability_keywords: DEFAULT_LIABILITY_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
            liability_patterns: Vec::new(),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Currency all values are reported in (e.g., "USD").
    #[serde(default = "default_reporting_currency")]
    pub reporting_currency: String,

    /// Display/output formatting settings.
    pub display: DisplayConfig,

    /// Grouping defaults.
    pub grouping: GroupingConfig,

    /// Summary reducer settings.
    pub summary: SummaryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reporting_currency: default_reporting_currency(),
            display: DisplayConfig::default(),
            grouping: GroupingConfig::default(),
            summary: SummaryConfig::default(),
        }
    }
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load config from a file, or return default config if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

/// Returns the default config file path.
///
/// Resolution order:
/// 1. `./folioscope.toml` if it exists in current directory
/// 2. `<config dir>/folioscope/folioscope.toml` (e.g. `~/.config` on Linux)
pub fn default_config_path() -> PathBuf {
    let local_config = PathBuf::from("folioscope.toml");
    if local_config.exists() {
        return local_config;
    }

    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("folioscope").join("folioscope.toml");
    }

    local_config
}
