use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::coerce_number;
use crate::models::Position;

/// Group key used when a position has no value for the grouping dimension.
pub const OTHER_GROUP: &str = "Other";

/// Built-in grouping dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Grouping {
    #[default]
    AssetType,
    Account,
    Institution,
    Sector,
    AccountCategory,
}

/// Positions sharing one grouping key, with their summed figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
    pub key: String,
    /// Member positions in input order.
    pub positions: Vec<Position>,
    pub total_value: f64,
    pub total_cost_basis: f64,
    /// `total_value - total_cost_basis`.
    pub total_gain_loss: f64,
    /// Percent of cost basis; `0` when there is no cost basis.
    pub gain_loss_percent: f64,
    /// This group's value as a percent of the value across all groups.
    pub share_of_total: f64,
}

impl Group {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn is_other(&self) -> bool {
        self.key == OTHER_GROUP
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PeriodChange {
    /// Absolute net-worth change over the period.
    pub net_worth: f64,
    /// Percent change over the period (`3.4` means 3.4%).
    pub net_worth_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PortfolioSummary {
    pub net_worth: f64,
    pub total_assets: f64,
    /// Magnitude of liability-bearing groups.
    pub total_liabilities: f64,
    pub total_cost_basis: f64,
    pub total_gain_loss: f64,
    pub gain_loss_percent: f64,
    /// Keyed by lower-case period label (`1d`, `1w`, `ytd`, ...).
    pub period_changes: BTreeMap<String, PeriodChange>,
}

/// Period change as reported by the summary endpoint. The percent may be a
/// fraction (`0.034`) or already a percentage (`3.4`).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct RawPeriodChange {
    pub net_worth: f64,
    pub net_worth_percent: f64,
}

impl RawPeriodChange {
    /// Read one period entry; unusable numbers read as `0`.
    pub fn from_map(map: &Map<String, Value>) -> Self {
        Self {
            net_worth: first_number(map, &["net_worth", "netWorth", "change", "amount"])
                .unwrap_or(0.0),
            net_worth_percent: first_number(
                map,
                &[
                    "net_worth_percent",
                    "netWorthPercent",
                    "percent",
                    "percent_change",
                    "pct",
                ],
            )
            .unwrap_or(0.0),
        }
    }
}

/// Portfolio-level figures supplied by the backend summary endpoint, used as
/// the prior state when reducing a fresh summary.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SummarySnapshot {
    pub net_worth: Option<f64>,
    pub total_assets: Option<f64>,
    pub total_liabilities: Option<f64>,
    pub period_changes: BTreeMap<String, RawPeriodChange>,
}

impl SummarySnapshot {
    pub fn from_map(map: &Map<String, Value>) -> Self {
        let period_changes = ["period_changes", "periodChanges"]
            .iter()
            .filter_map(|key| map.get(*key))
            .find_map(Value::as_object)
            .map(|changes| {
                changes
                    .iter()
                    .filter_map(|(label, entry)| {
                        entry
                            .as_object()
                            .map(|entry| (label.clone(), RawPeriodChange::from_map(entry)))
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            net_worth: first_number(map, &["net_worth", "netWorth"]),
            total_assets: first_number(map, &["total_assets", "totalAssets"]),
            total_liabilities: first_number(map, &["total_liabilities", "totalLiabilities"]),
            period_changes,
        }
    }
}

impl<'de> Deserialize<'de> for RawPeriodChange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        Ok(Self::from_map(&map))
    }
}

impl<'de> Deserialize<'de> for SummarySnapshot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        Ok(Self::from_map(&map))
    }
}

/// First spelling that holds a usable number.
fn first_number(map: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .filter_map(|key| map.get(*key))
        .find_map(|value| coerce_number(value).number())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
    Flat,
}

/// A period-change chip: `1D +$120.00 (+0.45%)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodChip {
    pub period: String,
    pub label: String,
    pub amount: f64,
    pub percent: f64,
    pub trend: Trend,
}

/// One slice of an allocation chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationSlice {
    pub key: String,
    pub label: String,
    pub value: f64,
    pub percent: f64,
    pub color: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_snapshot_accepts_repeated_spellings() {
        let snapshot: SummarySnapshot = serde_json::from_value(json!({
            "net_worth": null,
            "netWorth": "1,200",
            "totalAssets": 1500,
            "period_changes": null,
            "periodChanges": {
                "1w": {"net_worth": 5, "netWorth": 6, "percent": "junk", "pct": 0.01},
                "bogus": 3
            }
        }))
        .unwrap();

        assert_eq!(snapshot.net_worth, Some(1200.0));
        assert_eq!(snapshot.total_assets, Some(1500.0));
        assert_eq!(snapshot.total_liabilities, None);
        assert_eq!(snapshot.period_changes.len(), 1);
        let week = snapshot.period_changes["1w"];
        assert_eq!(week.net_worth, 5.0);
        assert_eq!(week.net_worth_percent, 0.01);
    }

    #[test]
    fn test_snapshot_rejects_non_object() {
        assert!(serde_json::from_value::<SummarySnapshot>(json!([1, 2])).is_err());
    }
}
