use std::collections::HashMap;
use std::convert::Infallible;

use tracing::debug;

use super::{Group, Grouping, OTHER_GROUP};
use crate::models::{percent_of, Position};

impl Grouping {
    /// Group key of `position` along this dimension, `None` when it has no value.
    ///
    /// Accounts are keyed by display name, falling back to the account id when
    /// the account could not be resolved.
    pub fn key(&self, position: &Position) -> Option<String> {
        match self {
            Grouping::AssetType => Some(position.asset_type.as_str().to_string()),
            Grouping::Account => position
                .account_name
                .clone()
                .or_else(|| Some(position.account_id.clone())),
            Grouping::Institution => position.institution.clone(),
            Grouping::Sector => position.sector.clone(),
            Grouping::AccountCategory => position
                .account_category
                .map(|category| category.as_str().to_string()),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Grouping::AssetType => "asset_type",
            Grouping::Account => "account",
            Grouping::Institution => "institution",
            Grouping::Sector => "sector",
            Grouping::AccountCategory => "account_category",
        }
    }
}

/// Partition `positions` into groups by `key_fn`.
///
/// Every position lands in exactly one group; `None` and blank keys go to
/// [`OTHER_GROUP`]. Groups come back by descending total value, ties broken by
/// key.
pub fn aggregate<F>(positions: &[Position], key_fn: F) -> Vec<Group>
where
    F: Fn(&Position) -> Option<String>,
{
    match try_aggregate(positions, |p| Ok::<_, Infallible>(key_fn(p))) {
        Ok(groups) => groups,
        Err(never) => match never {},
    }
}

/// Like [`aggregate`], for key selectors that can fail. The first error is
/// returned as-is and no groups are produced.
pub fn try_aggregate<F, E>(positions: &[Position], mut key_fn: F) -> Result<Vec<Group>, E>
where
    F: FnMut(&Position) -> Result<Option<String>, E>,
{
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut builders: Vec<GroupBuilder> = Vec::new();

    for position in positions {
        let key = group_key(key_fn(position)?);
        let slot = match slots.get(&key) {
            Some(&slot) => slot,
            None => {
                let slot = builders.len();
                slots.insert(key.clone(), slot);
                builders.push(GroupBuilder::new(key));
                slot
            }
        };
        builders[slot].add(position);
    }

    let grand_total: f64 = builders.iter().map(|b| b.total_value).sum();
    let mut groups: Vec<Group> = builders
        .into_iter()
        .map(|builder| builder.finish(grand_total))
        .collect();
    groups.sort_by(|a, b| {
        b.total_value
            .total_cmp(&a.total_value)
            .then_with(|| a.key.cmp(&b.key))
    });

    debug!(
        positions = positions.len(),
        groups = groups.len(),
        "aggregated positions"
    );
    Ok(groups)
}

/// Aggregate along one of the built-in dimensions.
pub fn aggregate_by(positions: &[Position], grouping: Grouping) -> Vec<Group> {
    aggregate(positions, |p| grouping.key(p))
}

fn group_key(key: Option<String>) -> String {
    match key {
        Some(key) if !key.trim().is_empty() => key.trim().to_string(),
        _ => OTHER_GROUP.to_string(),
    }
}

struct GroupBuilder {
    key: String,
    positions: Vec<Position>,
    total_value: f64,
    total_cost_basis: f64,
}

impl GroupBuilder {
    fn new(key: String) -> Self {
        Self {
            key,
            positions: Vec::new(),
            total_value: 0.0,
            total_cost_basis: 0.0,
        }
    }

    fn add(&mut self, position: &Position) {
        self.total_value += position.current_value;
        self.total_cost_basis += position.cost_basis_total;
        self.positions.push(position.clone());
    }

    fn finish(self, grand_total: f64) -> Group {
        let total_gain_loss = self.total_value - self.total_cost_basis;
        Group {
            gain_loss_percent: percent_of(total_gain_loss, self.total_cost_basis),
            share_of_total: percent_of(self.total_value, grand_total),
            key: self.key,
            positions: self.positions,
            total_value: self.total_value,
            total_cost_basis: self.total_cost_basis,
            total_gain_loss,
        }
    }
}
