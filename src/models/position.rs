use serde::{Deserialize, Serialize};

use super::{AccountCategory, AssetType};

/// A normalized holding: one lot of one asset inside one account.
///
/// Built fresh from raw listing records on every fetch and never patched in
/// place. Monetary fields are finite and `quantity`, `current_value` and
/// `cost_basis_total` are never negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: String,
    pub account_id: String,
    pub asset_type: AssetType,
    /// Ticker, coin symbol, metal type or property name.
    #[serde(default)]
    pub label: String,
    pub quantity: f64,
    pub unit_cost: f64,
    pub unit_value: f64,
    pub current_value: f64,
    pub cost_basis_total: f64,
    /// Absolute gain/loss; taken from the source when it supplied one.
    pub gain_loss: f64,
    /// True when the source had no cost basis and the current price was used.
    #[serde(default)]
    pub cost_basis_estimated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_category: Option<AccountCategory>,
}

impl Position {
    /// Build a position from quantity and per-unit prices, deriving totals.
    pub fn new(
        id: impl Into<String>,
        account_id: impl Into<String>,
        asset_type: AssetType,
        quantity: f64,
        unit_cost: f64,
        unit_value: f64,
    ) -> Self {
        let current_value = quantity * unit_value;
        let cost_basis_total = quantity * unit_cost;
        Self {
            id: id.into(),
            account_id: account_id.into(),
            asset_type,
            label: String::new(),
            quantity,
            unit_cost,
            unit_value,
            current_value,
            cost_basis_total,
            gain_loss: current_value - cost_basis_total,
            cost_basis_estimated: false,
            sector: None,
            account_name: None,
            institution: None,
            account_category: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_sector(mut self, sector: impl Into<String>) -> Self {
        self.sector = Some(sector.into());
        self
    }

    pub fn with_institution(mut self, institution: impl Into<String>) -> Self {
        self.institution = Some(institution.into());
        self
    }

    /// Gain/loss as a percentage of cost basis; `0` when there is no cost basis.
    pub fn gain_loss_percent(&self) -> f64 {
        percent_of(self.gain_loss, self.cost_basis_total)
    }
}

/// `part / whole * 100`, defined as `0` whenever the result would not be finite
/// or `whole` is not positive.
pub(crate) fn percent_of(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        let pct = part / whole * 100.0;
        if pct.is_finite() {
            return pct;
        }
    }
    0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_derives_totals() {
        let p = Position::new("p1", "a1", AssetType::Security, 10.0, 5.0, 8.0);
        assert_eq!(p.current_value, 80.0);
        assert_eq!(p.cost_basis_total, 50.0);
        assert_eq!(p.gain_loss, 30.0);
        assert_eq!(p.gain_loss_percent(), 60.0);
    }

    #[test]
    fn test_zero_cost_basis_percent_is_zero() {
        let p = Position::new("p1", "a1", AssetType::Crypto, 3.0, 0.0, 100.0);
        assert_eq!(p.gain_loss_percent(), 0.0);
    }

    #[test]
    fn test_percent_of_guards_non_finite() {
        assert_eq!(percent_of(1.0, 0.0), 0.0);
        assert_eq!(percent_of(f64::MAX, f64::MIN_POSITIVE), 0.0);
        assert_eq!(percent_of(-10.0, 60.0), -10.0 / 60.0 * 100.0);
    }
}
