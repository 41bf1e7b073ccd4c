use chrono::{DateTime, NaiveDate};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::config::DisplayConfig;

fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or(Decimal::ZERO)
}

fn round_half_away(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Insert `,` every three digits of an unsigned integer string.
fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Render an unsigned decimal with exactly `dp` fraction digits.
fn fixed_fraction(abs: Decimal, dp: u32) -> String {
    let text = abs.normalize().to_string();
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), ""));
    if dp == 0 {
        return int_part.to_string();
    }
    let mut frac: String = frac_part.chars().take(dp as usize).collect();
    while frac.len() < dp as usize {
        frac.push('0');
    }
    format!("{int_part}.{frac}")
}

/// Format a money amount for display.
///
/// Rounds half away from zero to `currency_decimals` when set. With
/// `currency_fixed_decimals` the fraction is padded to that width, otherwise
/// trailing zeros are dropped. The sign precedes the symbol (`-$1,234.50`).
pub fn format_currency(value: f64, display: &DisplayConfig) -> String {
    let mut amount = to_decimal(value);
    if let Some(dp) = display.currency_decimals {
        amount = round_half_away(amount, dp);
    }

    let negative = amount.is_sign_negative() && !amount.is_zero();
    let abs = amount.abs();

    let mut body = match display.currency_decimals {
        Some(dp) if display.currency_fixed_decimals => fixed_fraction(abs, dp),
        _ => abs.normalize().to_string(),
    };
    if display.currency_grouping {
        body = match body.split_once('.') {
            Some((int_part, frac)) => format!("{}.{frac}", group_thousands(int_part)),
            None => group_thousands(&body),
        };
    }

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    if let Some(symbol) = display.currency_symbol.as_deref() {
        out.push_str(symbol);
    }
    out.push_str(&body);
    out
}

/// Short money amount for chart axes and chips: `$950`, `$1.2K`, `-$3.4M`, `$1.1B`.
pub fn format_compact_currency(value: f64, symbol: &str) -> String {
    const STEPS: [(f64, &str); 4] = [(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];

    let value = if value.is_finite() { value } else { 0.0 };
    let sign = if value < 0.0 { "-" } else { "" };
    let abs = value.abs();

    for (scale, suffix) in STEPS {
        if abs >= scale {
            let scaled = round_half_away(to_decimal(abs / scale), 1).normalize();
            return format!("{sign}{symbol}{scaled}{suffix}");
        }
    }
    let whole = round_half_away(to_decimal(abs), 0).normalize();
    format!("{sign}{symbol}{whole}")
}

/// Format a percentage value (`3.4` means 3.4%).
///
/// With `signed`, non-negative values get a leading `+`.
pub fn format_percent(value: f64, decimals: u32, signed: bool) -> String {
    let rounded = round_half_away(to_decimal(value), decimals);
    let rounded = if rounded.is_zero() { Decimal::ZERO } else { rounded };
    let negative = rounded.is_sign_negative();
    let body = fixed_fraction(rounded.abs(), decimals);
    let sign = match (negative, signed) {
        (true, _) => "-",
        (false, true) => "+",
        (false, false) => "",
    };
    format!("{sign}{body}%")
}

/// `Oct 16, 2026`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// Format an ISO date (`2026-10-16`) or RFC 3339 timestamp for display.
///
/// Returns `None` when the text is neither.
pub fn format_date_str(value: &str) -> Option<String> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(format_date(date));
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|ts| format_date(ts.date_naive()))
}
