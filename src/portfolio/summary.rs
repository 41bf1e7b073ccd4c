use std::collections::BTreeMap;

use anyhow::Result;
use tracing::debug;

use super::{
    aggregate_by, AllocationSlice, Group, Grouping, LiabilityMatcher, PeriodChange, PeriodChip,
    PortfolioSummary, SummarySnapshot, Trend,
};
use crate::config::SummaryConfig;
use crate::models::{percent_of, Position};
use crate::palette;

/// Display order for period chips; unknown periods follow alphabetically.
pub const PERIOD_ORDER: [&str; 10] = ["1d", "1w", "1m", "3m", "6m", "ytd", "1y", "3y", "5y", "all"];

const DAY_PERIOD: &str = "1d";

/// Interpret a period-change percent that may be a fraction or a percentage.
///
/// Values with magnitude up to and including `1.0` are fractions and get
/// scaled by 100; anything larger is already a percentage. Non-finite input
/// yields `0`.
pub fn normalize_pct(raw: f64) -> f64 {
    if !raw.is_finite() {
        0.0
    } else if raw.abs() <= 1.0 {
        raw * 100.0
    } else {
        raw
    }
}

/// Folds aggregated groups into portfolio-level figures.
#[derive(Debug, Clone, Default)]
pub struct SummaryReducer {
    liabilities: LiabilityMatcher,
}

impl SummaryReducer {
    pub fn new(liabilities: LiabilityMatcher) -> Self {
        Self { liabilities }
    }

    pub fn from_config(config: &SummaryConfig) -> Result<Self> {
        Ok(Self::new(LiabilityMatcher::from_config(config)?))
    }

    /// Reduce `groups` into a summary. The groups are expected to be keyed by a
    /// top-level dimension; see [`SummaryReducer::reduce_positions`].
    ///
    /// Liability groups count against net worth by magnitude. Period changes
    /// come from `prior` when given; a missing `1d` entry is derived from the
    /// prior net worth.
    pub fn reduce(&self, groups: &[Group], prior: Option<&SummarySnapshot>) -> PortfolioSummary {
        let mut summary = PortfolioSummary::default();

        for group in groups {
            if self.liabilities.is_liability(&group.key) {
                summary.total_liabilities += group.total_value.abs();
            } else {
                summary.total_assets += group.total_value;
                summary.total_cost_basis += group.total_cost_basis;
            }
        }

        summary.net_worth = summary.total_assets - summary.total_liabilities;
        summary.total_gain_loss = summary.total_assets - summary.total_cost_basis;
        summary.gain_loss_percent = percent_of(summary.total_gain_loss, summary.total_cost_basis);

        if let Some(prior) = prior {
            summary.period_changes = period_changes(summary.net_worth, prior);
        }

        summary
    }
}

impl SummaryReducer {
    /// Summarize `positions` for a view grouped by `grouping`.
    ///
    /// Liability keywords only make sense on top-level keys (asset types,
    /// account categories). Institution, account and sector names are free
    /// text ("Navy Federal Credit Union"), so those views are summarized over
    /// asset types instead.
    pub fn reduce_positions(
        &self,
        positions: &[Position],
        grouping: Grouping,
        prior: Option<&SummarySnapshot>,
    ) -> PortfolioSummary {
        let basis = grouping.summary_basis();
        self.reduce(&aggregate_by(positions, basis), prior)
    }
}

impl Grouping {
    /// Top-level dimension the portfolio summary is computed over when viewing
    /// this grouping.
    pub fn summary_basis(&self) -> Grouping {
        match self {
            Grouping::AssetType | Grouping::AccountCategory => *self,
            Grouping::Account | Grouping::Institution | Grouping::Sector => Grouping::AssetType,
        }
    }
}

/// Reduce with the default liability keywords.
pub fn reduce_summary(groups: &[Group], prior: Option<&SummarySnapshot>) -> PortfolioSummary {
    SummaryReducer::default().reduce(groups, prior)
}

fn period_changes(net_worth: f64, prior: &SummarySnapshot) -> BTreeMap<String, PeriodChange> {
    let mut changes: BTreeMap<String, PeriodChange> = prior
        .period_changes
        .iter()
        .filter_map(|(label, raw)| {
            let label = label.trim().to_lowercase();
            if label.is_empty() {
                return None;
            }
            let change = PeriodChange {
                net_worth: if raw.net_worth.is_finite() {
                    raw.net_worth
                } else {
                    0.0
                },
                net_worth_percent: normalize_pct(raw.net_worth_percent),
            };
            Some((label, change))
        })
        .collect();

    if !changes.contains_key(DAY_PERIOD) {
        if let Some(previous) = prior.net_worth.filter(|v| v.is_finite()) {
            let delta = net_worth - previous;
            let change = PeriodChange {
                net_worth: delta,
                net_worth_percent: percent_of(delta, previous.abs()),
            };
            debug!(
                previous,
                current = net_worth,
                delta,
                "derived 1d change from prior snapshot"
            );
            changes.insert(DAY_PERIOD.to_string(), change);
        }
    }

    changes
}

fn period_rank(period: &str) -> usize {
    PERIOD_ORDER
        .iter()
        .position(|p| *p == period)
        .unwrap_or(PERIOD_ORDER.len())
}

fn trend_of(change: &PeriodChange) -> Trend {
    let signal = if change.net_worth != 0.0 {
        change.net_worth
    } else {
        change.net_worth_percent
    };
    if signal > 0.0 {
        Trend::Up
    } else if signal < 0.0 {
        Trend::Down
    } else {
        Trend::Flat
    }
}

/// Period-change chips in display order.
pub fn period_chips(summary: &PortfolioSummary) -> Vec<PeriodChip> {
    let mut chips: Vec<PeriodChip> = summary
        .period_changes
        .iter()
        .map(|(period, change)| PeriodChip {
            period: period.clone(),
            label: period.to_uppercase(),
            amount: change.net_worth,
            percent: change.net_worth_percent,
            trend: trend_of(change),
        })
        .collect();
    chips.sort_by(|a, b| {
        period_rank(&a.period)
            .cmp(&period_rank(&b.period))
            .then_with(|| a.period.cmp(&b.period))
    });
    chips
}

/// Allocation-chart slices for groups with a positive value, in group order.
pub fn allocation_slices(groups: &[Group], grouping: Grouping) -> Vec<AllocationSlice> {
    groups
        .iter()
        .filter(|group| group.total_value > 0.0)
        .map(|group| AllocationSlice {
            key: group.key.clone(),
            label: palette::label_for(grouping, &group.key),
            value: group.total_value,
            percent: group.share_of_total,
            color: palette::color_for(grouping, &group.key).to_string(),
        })
        .collect()
}
