//! Conversion of heterogeneous listing records into [`Position`]s.
//!
//! Every listing endpoint shapes its records a little differently: securities
//! report `shares` and `current_price`, metals a `current_price_per_unit`,
//! real estate an `estimated_market_value`, and some endpoints ship
//! pre-computed `current_value` / `gain_loss` figures. The normalizer reads
//! all of them leniently. Data-quality problems become [`Diagnostic`]s and
//! warning logs; only records whose shape makes them unusable are excluded.

use std::collections::HashMap;
use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::{error, warn};

use super::coerce::{coerce_number, finite_or_zero, Coerced};
use crate::models::{id_from_value, Account, AssetType, ParseAssetTypeError, Position};

/// A position record as delivered by a listing endpoint.
///
/// Numeric fields stay as raw JSON so that `null`, numeric strings and junk can
/// be told apart during normalization. Endpoints spell fields differently and
/// some send several spellings at once; [`RawPosition::from_value`] takes the
/// first non-null one in a fixed order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPosition {
    pub id: Value,
    pub account_id: Value,
    pub asset_type: Option<String>,

    pub ticker: Option<String>,
    pub coin_symbol: Option<String>,
    pub coin_type: Option<String>,
    pub metal_type: Option<String>,
    pub cash_type: Option<String>,
    pub name: Option<String>,
    pub address: Option<String>,
    pub sector: Option<String>,

    pub shares: Value,
    pub quantity: Value,
    pub amount: Value,
    pub balance: Value,

    pub current_price: Value,
    pub price: Value,
    pub current_price_per_unit: Value,
    pub spot_price: Value,
    pub estimated_market_value: Value,
    pub estimated_value: Value,

    pub cost_basis: Value,
    pub cost_per_unit: Value,
    pub purchase_price: Value,
    pub total_cost_basis: Value,

    pub current_value: Value,
    pub market_value: Value,
    pub value: Value,
    pub gain_loss: Value,
}

impl RawPosition {
    /// Read a raw record. Fails only when the record is not an object or a
    /// text field holds something other than a string.
    pub fn from_value(record: &Value) -> Result<Self, ShapeError> {
        let Value::Object(map) = record else {
            return Err(ShapeError::NotAnObject);
        };
        let fields = Fields(map);

        Ok(Self {
            id: fields.value(&["id"]),
            account_id: fields.value(&["account_id", "accountId"]),
            asset_type: fields.text(&["asset_type", "assetType", "type"])?,

            ticker: fields.text(&["ticker", "symbol"])?,
            coin_symbol: fields.text(&["coin_symbol", "coinSymbol"])?,
            coin_type: fields.text(&["coin_type", "coinType"])?,
            metal_type: fields.text(&["metal_type", "metalType"])?,
            cash_type: fields.text(&["cash_type", "cashType"])?,
            name: fields.text(&["name"])?,
            address: fields.text(&["address"])?,
            sector: fields.text(&["sector"])?,

            shares: fields.value(&["shares"]),
            quantity: fields.value(&["quantity"]),
            amount: fields.value(&["amount"]),
            balance: fields.value(&["balance"]),

            current_price: fields.value(&["current_price", "currentPrice"]),
            price: fields.value(&["price"]),
            current_price_per_unit: fields
                .value(&["current_price_per_unit", "currentPricePerUnit"]),
            spot_price: fields.value(&["spot_price", "spotPrice"]),
            estimated_market_value: fields
                .value(&["estimated_market_value", "estimatedMarketValue"]),
            estimated_value: fields.value(&["estimated_value", "estimatedValue"]),

            cost_basis: fields.value(&["cost_basis", "costBasis"]),
            cost_per_unit: fields.value(&["cost_per_unit", "costPerUnit"]),
            purchase_price: fields.value(&["purchase_price", "purchasePrice"]),
            total_cost_basis: fields.value(&[
                "total_cost_basis",
                "totalCostBasis",
                "cost_basis_total",
            ]),

            current_value: fields.value(&["current_value", "currentValue"]),
            market_value: fields.value(&["market_value", "marketValue"]),
            value: fields.value(&["value"]),
            gain_loss: fields.value(&["gain_loss", "gainLoss"]),
        })
    }
}

impl<'de> Deserialize<'de> for RawPosition {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        RawPosition::from_value(&value).map_err(de::Error::custom)
    }
}

struct Fields<'a>(&'a Map<String, Value>);

impl Fields<'_> {
    fn first(&self, keys: &[&'static str]) -> Option<(&'static str, &Value)> {
        keys.iter()
            .filter_map(|key| self.0.get(*key).map(|value| (*key, value)))
            .find(|(_, value)| !value.is_null())
    }

    fn value(&self, keys: &[&'static str]) -> Value {
        self.first(keys)
            .map(|(_, value)| value.clone())
            .unwrap_or(Value::Null)
    }

    fn text(&self, keys: &[&'static str]) -> Result<Option<String>, ShapeError> {
        match self.first(keys) {
            None => Ok(None),
            Some((_, Value::String(text))) => Ok(Some(text.clone())),
            Some((key, other)) => Err(ShapeError::Malformed(format!(
                "field `{key}` must be a string, got {other}"
            ))),
        }
    }
}

/// Why a record could not be turned into a position at all.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ShapeError {
    #[error("record is not a JSON object")]
    NotAnObject,
    #[error("malformed record: {0}")]
    Malformed(String),
    #[error("record has no id")]
    MissingId,
    #[error("record has no asset type")]
    MissingAssetType,
    #[error(transparent)]
    UnknownAssetType(#[from] ParseAssetTypeError),
}

impl Serialize for ShapeError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

/// A single data-quality finding for one raw record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Issue {
    MissingValue { field: &'static str },
    NonNumeric { field: &'static str, raw: String },
    NotFinite { field: &'static str },
    NegativeClamped { field: &'static str, value: f64 },
    CostBasisDefaulted,
    MissingAccountId,
    UnknownAccount { account_id: String },
    Excluded { reason: ShapeError },
}

impl Issue {
    pub fn severity(&self) -> Severity {
        match self {
            Issue::Excluded { .. } => Severity::Error,
            _ => Severity::Warning,
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Issue::MissingValue { field } => write!(f, "{field} missing, defaulted to 0"),
            Issue::NonNumeric { field, raw } => {
                write!(f, "{field} is not numeric ({raw:?}), defaulted to 0")
            }
            Issue::NotFinite { field } => write!(f, "{field} is not finite, replaced with 0"),
            Issue::NegativeClamped { field, value } => {
                write!(f, "{field} was negative ({value}), clamped to 0")
            }
            Issue::CostBasisDefaulted => {
                write!(f, "cost basis missing, defaulted to current price")
            }
            Issue::MissingAccountId => write!(f, "account id missing"),
            Issue::UnknownAccount { account_id } => {
                write!(f, "account {account_id:?} not found in account listing")
            }
            Issue::Excluded { reason } => write!(f, "record excluded: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    /// Position of the record in the raw input.
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    pub severity: Severity,
    #[serde(flatten)]
    pub issue: Issue,
}

/// Normalizer output: the usable positions plus everything that was patched or dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Normalized {
    pub positions: Vec<Position>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Normalized {
    /// True when no default had to be substituted and no record was dropped.
    pub fn is_complete(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn excluded(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }
}

/// Normalize raw listing records, resolving institution and category from `accounts`.
pub fn normalize(raw: &[Value], accounts: &[Account]) -> Normalized {
    Normalizer::new(accounts).normalize(raw)
}

#[derive(Debug, Clone, Default)]
pub struct Normalizer<'a> {
    accounts: HashMap<&'a str, &'a Account>,
    default_asset_type: Option<AssetType>,
}

impl<'a> Normalizer<'a> {
    pub fn new(accounts: &'a [Account]) -> Self {
        let mut by_id = HashMap::with_capacity(accounts.len());
        for account in accounts {
            by_id.entry(account.id.as_str()).or_insert(account);
        }
        Self {
            accounts: by_id,
            default_asset_type: None,
        }
    }

    /// Asset type to assume for records that carry none, for per-type listings.
    pub fn with_default_asset_type(mut self, asset_type: AssetType) -> Self {
        self.default_asset_type = Some(asset_type);
        self
    }

    pub fn normalize(&self, raw: &[Value]) -> Normalized {
        let mut out = Normalized::default();
        for (index, record) in raw.iter().enumerate() {
            let record_id = record.get("id").and_then(id_from_value);
            match RawPosition::from_value(record) {
                Ok(parsed) => {
                    if let Some(position) = self.normalize_one(index, &parsed, &mut out.diagnostics)
                    {
                        out.positions.push(position);
                    }
                }
                Err(reason) => {
                    RecordScope::new(index, record_id, &mut out.diagnostics).exclude(reason);
                }
            }
        }
        out
    }

    pub fn normalize_records(&self, raw: &[RawPosition]) -> Normalized {
        let mut out = Normalized::default();
        for (index, record) in raw.iter().enumerate() {
            if let Some(position) = self.normalize_one(index, record, &mut out.diagnostics) {
                out.positions.push(position);
            }
        }
        out
    }

    fn resolve_asset_type(&self, raw: &RawPosition) -> Result<AssetType, ShapeError> {
        match raw.asset_type.as_deref().map(str::trim) {
            Some(label) if !label.is_empty() => Ok(label.parse::<AssetType>()?),
            _ => self.default_asset_type.ok_or(ShapeError::MissingAssetType),
        }
    }

    fn normalize_one(
        &self,
        index: usize,
        raw: &RawPosition,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<Position> {
        let record_id = id_from_value(&raw.id);
        let mut scope = RecordScope::new(index, record_id.clone(), diagnostics);

        let Some(id) = record_id else {
            scope.exclude(ShapeError::MissingId);
            return None;
        };
        let asset_type = match self.resolve_asset_type(raw) {
            Ok(asset_type) => asset_type,
            Err(reason) => {
                scope.exclude(reason);
                return None;
            }
        };

        let quantity = match asset_type {
            AssetType::RealEstate => 1.0,
            AssetType::Security => {
                scope.required("shares", &[("shares", &raw.shares), ("quantity", &raw.quantity)])
            }
            AssetType::Crypto | AssetType::Metal => scope.required(
                "quantity",
                &[("quantity", &raw.quantity), ("amount", &raw.amount)],
            ),
            AssetType::Cash => scope.required(
                "amount",
                &[
                    ("amount", &raw.amount),
                    ("balance", &raw.balance),
                    ("current_value", &raw.current_value),
                    ("value", &raw.value),
                ],
            ),
        };
        let quantity = scope.non_negative("quantity", quantity);

        let precomputed_value = scope.optional(&[
            ("current_value", &raw.current_value),
            ("market_value", &raw.market_value),
            ("value", &raw.value),
        ]);

        let unit_value = match asset_type {
            AssetType::Cash => 1.0,
            _ => {
                let candidates = price_candidates(asset_type, raw);
                match scope.read(&candidates) {
                    Read::Found(price) => price,
                    read => match precomputed_value {
                        Some(total) if quantity > 0.0 => total / quantity,
                        Some(_) => 0.0,
                        None => {
                            if read == Read::Absent {
                                scope.warn(Issue::MissingValue {
                                    field: candidates[0].0,
                                });
                            }
                            0.0
                        }
                    },
                }
            }
        };
        let unit_value = scope.finite("unit_value", unit_value);

        let total_cost = scope.optional(&[("total_cost_basis", &raw.total_cost_basis)]);
        let unit_cost_read = scope.read(&[
            ("cost_basis", &raw.cost_basis),
            ("cost_per_unit", &raw.cost_per_unit),
            ("purchase_price", &raw.purchase_price),
        ]);
        let mut cost_basis_estimated = false;
        let (unit_cost, cost_basis_total) = match (total_cost, unit_cost_read) {
            (Some(total), Read::Found(unit)) => (unit, total),
            (Some(total), _) if quantity > 0.0 => (total / quantity, total),
            (Some(total), _) => (0.0, total),
            (None, Read::Found(unit)) => (unit, quantity * unit),
            (None, _) => {
                if asset_type.tracks_cost_basis() {
                    cost_basis_estimated = true;
                    scope.warn(Issue::CostBasisDefaulted);
                }
                (unit_value, quantity * unit_value)
            }
        };
        let unit_cost = scope.finite("unit_cost", unit_cost);

        let current_value = precomputed_value.unwrap_or(quantity * unit_value);
        let current_value = scope.finite("current_value", current_value);
        let current_value = scope.non_negative("current_value", current_value);

        let cost_basis_total = scope.finite("cost_basis_total", cost_basis_total);
        let cost_basis_total = scope.non_negative("cost_basis_total", cost_basis_total);

        let gain_loss = scope
            .optional(&[("gain_loss", &raw.gain_loss)])
            .unwrap_or(current_value - cost_basis_total);

        let account_id = id_from_value(&raw.account_id);
        let account = account_id
            .as_deref()
            .and_then(|account_id| self.accounts.get(account_id))
            .copied();
        match (&account_id, account) {
            (None, _) => scope.warn(Issue::MissingAccountId),
            (Some(account_id), None) if !self.accounts.is_empty() => {
                scope.warn(Issue::UnknownAccount {
                    account_id: account_id.clone(),
                })
            }
            _ => {}
        }

        Some(Position {
            id,
            account_id: account_id.unwrap_or_default(),
            asset_type,
            label: label_for(asset_type, raw),
            quantity,
            unit_cost,
            unit_value,
            current_value,
            cost_basis_total,
            gain_loss,
            cost_basis_estimated,
            sector: non_empty(raw.sector.as_deref()),
            account_name: account.and_then(|a| non_empty(Some(a.name.as_str()))),
            institution: account.and_then(|a| non_empty(a.institution.as_deref())),
            account_category: account.map(|a| a.category),
        })
    }
}

fn price_candidates(asset_type: AssetType, raw: &RawPosition) -> Vec<(&'static str, &Value)> {
    match asset_type {
        AssetType::Security | AssetType::Crypto => {
            vec![("current_price", &raw.current_price), ("price", &raw.price)]
        }
        AssetType::Metal => vec![
            ("current_price_per_unit", &raw.current_price_per_unit),
            ("current_price", &raw.current_price),
            ("spot_price", &raw.spot_price),
            ("price", &raw.price),
        ],
        AssetType::RealEstate => vec![
            ("estimated_market_value", &raw.estimated_market_value),
            ("estimated_value", &raw.estimated_value),
            ("current_price", &raw.current_price),
        ],
        AssetType::Cash => Vec::new(),
    }
}

fn label_for(asset_type: AssetType, raw: &RawPosition) -> String {
    let candidates: [&Option<String>; 3] = match asset_type {
        AssetType::Security => [&raw.ticker, &raw.name, &None],
        AssetType::Crypto => [&raw.coin_symbol, &raw.coin_type, &raw.name],
        AssetType::Metal => [&raw.metal_type, &raw.name, &None],
        AssetType::RealEstate => [&raw.name, &raw.address, &None],
        AssetType::Cash => [&raw.name, &raw.cash_type, &None],
    };
    candidates
        .into_iter()
        .find_map(|c| non_empty(c.as_deref()))
        .unwrap_or_default()
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Read {
    Absent,
    Found(f64),
    Invalid,
}

/// Collects diagnostics for one record and mirrors each into the log.
struct RecordScope<'d> {
    index: usize,
    record_id: Option<String>,
    diagnostics: &'d mut Vec<Diagnostic>,
}

impl<'d> RecordScope<'d> {
    fn new(index: usize, record_id: Option<String>, diagnostics: &'d mut Vec<Diagnostic>) -> Self {
        Self {
            index,
            record_id,
            diagnostics,
        }
    }

    fn push(&mut self, issue: Issue) {
        self.diagnostics.push(Diagnostic {
            index: self.index,
            record_id: self.record_id.clone(),
            severity: issue.severity(),
            issue,
        });
    }

    fn warn(&mut self, issue: Issue) {
        warn!(
            index = self.index,
            record_id = self.record_id.as_deref().unwrap_or(""),
            issue = %issue,
            "position data substituted"
        );
        self.push(issue);
    }

    fn exclude(&mut self, reason: ShapeError) {
        error!(
            index = self.index,
            record_id = self.record_id.as_deref().unwrap_or(""),
            reason = %reason,
            "position record excluded"
        );
        self.push(Issue::Excluded { reason });
    }

    /// First non-null candidate wins; a non-numeric one is reported and treated as unusable.
    fn read(&mut self, candidates: &[(&'static str, &Value)]) -> Read {
        for &(field, value) in candidates {
            match coerce_number(value) {
                Coerced::Missing => continue,
                Coerced::Number(n) => return Read::Found(n),
                Coerced::Invalid(raw) => {
                    self.warn(Issue::NonNumeric { field, raw });
                    return Read::Invalid;
                }
            }
        }
        Read::Absent
    }

    fn required(&mut self, field: &'static str, candidates: &[(&'static str, &Value)]) -> f64 {
        match self.read(candidates) {
            Read::Found(n) => n,
            Read::Invalid => 0.0,
            Read::Absent => {
                self.warn(Issue::MissingValue { field });
                0.0
            }
        }
    }

    fn optional(&mut self, candidates: &[(&'static str, &Value)]) -> Option<f64> {
        match self.read(candidates) {
            Read::Found(n) => Some(n),
            _ => None,
        }
    }

    fn finite(&mut self, field: &'static str, value: f64) -> f64 {
        let (value, replaced) = finite_or_zero(value);
        if replaced {
            self.warn(Issue::NotFinite { field });
        }
        value
    }

    fn non_negative(&mut self, field: &'static str, value: f64) -> f64 {
        if value < 0.0 {
            self.warn(Issue::NegativeClamped { field, value });
            0.0
        } else {
            value
        }
    }
}
