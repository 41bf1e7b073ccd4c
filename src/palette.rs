//! Colors, icons and display labels for grouping keys.
//!
//! Known asset types, institutions and sectors have fixed colors. Anything
//! else gets a color picked from [`FALLBACK_COLORS`] by hashing the key, so a
//! given key keeps its color across renders and sessions.

use crate::models::AssetType;
use crate::portfolio::{Grouping, OTHER_GROUP};

/// Color for the `"Other"` bucket.
pub const OTHER_COLOR: &str = "#878580";

pub const FALLBACK_COLORS: [&str; 12] = [
    "#4f46e5", "#0ea5e9", "#14b8a6", "#22c55e", "#eab308", "#f97316", "#ef4444", "#ec4899",
    "#a855f7", "#64748b", "#84cc16", "#06b6d4",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetStyle {
    pub label: &'static str,
    pub color: &'static str,
    pub icon: &'static str,
}

pub fn asset_style(asset_type: AssetType) -> AssetStyle {
    match asset_type {
        AssetType::Security => AssetStyle {
            label: "Securities",
            color: "#4f46e5",
            icon: "chart-line",
        },
        AssetType::Crypto => AssetStyle {
            label: "Crypto",
            color: "#8b5cf6",
            icon: "bitcoin",
        },
        AssetType::Metal => AssetStyle {
            label: "Metals",
            color: "#f59e0b",
            icon: "gem",
        },
        AssetType::RealEstate => AssetStyle {
            label: "Real Estate",
            color: "#10b981",
            icon: "home",
        },
        AssetType::Cash => AssetStyle {
            label: "Cash",
            color: "#3b82f6",
            icon: "banknote",
        },
    }
}

const INSTITUTION_COLORS: [(&str, &str); 12] = [
    ("vanguard", "#96151d"),
    ("fidelity", "#368727"),
    ("schwab", "#00a0df"),
    ("charles schwab", "#00a0df"),
    ("chase", "#117aca"),
    ("jpmorgan chase", "#117aca"),
    ("bank of america", "#e31837"),
    ("wells fargo", "#d71e28"),
    ("coinbase", "#0052ff"),
    ("robinhood", "#00c805"),
    ("e*trade", "#6633cc"),
    ("interactive brokers", "#d81222"),
];

const SECTOR_COLORS: [(&str, &str); 11] = [
    ("technology", "#6366f1"),
    ("healthcare", "#10b981"),
    ("financials", "#0ea5e9"),
    ("consumer discretionary", "#f97316"),
    ("consumer staples", "#84cc16"),
    ("energy", "#eab308"),
    ("industrials", "#64748b"),
    ("materials", "#a16207"),
    ("utilities", "#14b8a6"),
    ("real estate", "#22c55e"),
    ("communication services", "#ec4899"),
];

fn lookup(table: &[(&str, &'static str)], key: &str) -> Option<&'static str> {
    let wanted = key.trim().to_lowercase();
    table
        .iter()
        .find(|(name, _)| *name == wanted)
        .map(|(_, color)| *color)
}

pub fn institution_color(institution: &str) -> &'static str {
    lookup(&INSTITUTION_COLORS, institution).unwrap_or_else(|| fallback_color(institution))
}

pub fn sector_color(sector: &str) -> &'static str {
    lookup(&SECTOR_COLORS, sector).unwrap_or_else(|| fallback_color(sector))
}

/// Stable color for an arbitrary key.
pub fn fallback_color(key: &str) -> &'static str {
    if key == OTHER_GROUP {
        return OTHER_COLOR;
    }
    let idx = (stable_hash(key) % FALLBACK_COLORS.len() as u32) as usize;
    FALLBACK_COLORS[idx]
}

// djb2; std's hasher is not guaranteed stable across releases.
fn stable_hash(key: &str) -> u32 {
    key.bytes()
        .fold(5381u32, |hash, b| hash.wrapping_mul(33).wrapping_add(u32::from(b)))
}

/// Color for a group key under the given grouping.
pub fn color_for(grouping: Grouping, key: &str) -> &'static str {
    if key == OTHER_GROUP {
        return OTHER_COLOR;
    }
    match grouping {
        Grouping::AssetType => match key.parse::<AssetType>() {
            Ok(asset_type) => asset_style(asset_type).color,
            Err(_) => fallback_color(key),
        },
        Grouping::Institution => institution_color(key),
        Grouping::Sector => sector_color(key),
        Grouping::Account | Grouping::AccountCategory => fallback_color(key),
    }
}

/// Display label for a group key under the given grouping.
pub fn label_for(grouping: Grouping, key: &str) -> String {
    match grouping {
        Grouping::AssetType => match key.parse::<AssetType>() {
            Ok(asset_type) => asset_style(asset_type).label.to_string(),
            Err(_) => key.to_string(),
        },
        Grouping::AccountCategory => title_case(key),
        _ => key.to_string(),
    }
}

fn title_case(key: &str) -> String {
    key.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
