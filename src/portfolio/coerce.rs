use serde_json::Value;

/// Outcome of leniently reading a numeric field from a raw record.
#[derive(Debug, Clone, PartialEq)]
pub enum Coerced {
    /// Field absent or `null`.
    Missing,
    /// A finite number.
    Number(f64),
    /// Present but unusable (non-numeric text, NaN/infinite, bool, array, object).
    Invalid(String),
}

impl Coerced {
    pub fn number(&self) -> Option<f64> {
        match self {
            Coerced::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// Safe-parse a JSON value as a number. Never panics and never yields NaN.
///
/// Numeric strings may carry a leading `$`, thousands separators and
/// surrounding whitespace (`" $1,234.50 "` reads as `1234.5`).
pub fn coerce_number(value: &Value) -> Coerced {
    match value {
        Value::Null => Coerced::Missing,
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.is_finite() => Coerced::Number(f),
            _ => Coerced::Invalid(n.to_string()),
        },
        Value::String(s) => parse_numeric_text(s),
        other => Coerced::Invalid(other.to_string()),
    }
}

fn parse_numeric_text(raw: &str) -> Coerced {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != ',' && *c != '$' && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return Coerced::Missing;
    }

    // `f64::from_str` accepts "inf" and "NaN"; only plain decimal text counts.
    if !cleaned
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
    {
        return Coerced::Invalid(raw.to_string());
    }

    match cleaned.parse::<f64>() {
        Ok(n) if n.is_finite() => Coerced::Number(n),
        _ => Coerced::Invalid(raw.to_string()),
    }
}

/// Replace a non-finite result with `0`. Returns whether a replacement happened.
pub fn finite_or_zero(value: f64) -> (f64, bool) {
    if value.is_finite() {
        (value, false)
    } else {
        (0.0, true)
    }
}
