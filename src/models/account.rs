use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Broad account kind, as reported by the accounts listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountCategory {
    Brokerage,
    Retirement,
    Cash,
    Crypto,
    Metals,
    RealEstate,
    #[default]
    Other,
}

impl AccountCategory {
    /// Map a free-form category label; anything unrecognized is `Other`.
    pub fn from_label(label: &str) -> Self {
        let key = label.trim().to_lowercase().replace([' ', '-'], "_");
        match key.as_str() {
            "brokerage" | "taxable" | "investment" => AccountCategory::Brokerage,
            "retirement" | "ira" | "roth_ira" | "401k" | "401(k)" => AccountCategory::Retirement,
            "cash" | "checking" | "savings" | "bank" => AccountCategory::Cash,
            "crypto" | "cryptocurrency" | "wallet" => AccountCategory::Crypto,
            "metals" | "metal" | "precious_metals" => AccountCategory::Metals,
            "real_estate" | "realestate" | "property" => AccountCategory::RealEstate,
            _ => AccountCategory::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountCategory::Brokerage => "brokerage",
            AccountCategory::Retirement => "retirement",
            AccountCategory::Cash => "cash",
            AccountCategory::Crypto => "crypto",
            AccountCategory::Metals => "metals",
            AccountCategory::RealEstate => "real_estate",
            AccountCategory::Other => "other",
        }
    }
}

impl fmt::Display for AccountCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AccountCategory {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let label = Option::<String>::deserialize(deserializer)?;
        Ok(label
            .as_deref()
            .map(AccountCategory::from_label)
            .unwrap_or_default())
    }
}

/// A named container (brokerage, bank, wallet, ...) owning positions.
///
/// Deserialization is lenient: listing rows may spell a field more than one
/// way (`name`/`account_name`, `category`/`account_category`/`type`) and may
/// carry several spellings at once; the first non-null one wins.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub institution: Option<String>,
    pub category: AccountCategory,
}

const NAME_KEYS: [&str; 2] = ["name", "account_name"];
const INSTITUTION_KEYS: [&str; 2] = ["institution", "institution_name"];
const CATEGORY_KEYS: [&str; 3] = ["category", "account_category", "type"];

/// Why an account listing row could not be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccountError {
    #[error("account record is not a JSON object")]
    NotAnObject,
    #[error("account record has no id")]
    MissingId,
}

impl Account {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            institution: None,
            category: AccountCategory::Other,
        }
    }

    pub fn with_institution(mut self, institution: impl Into<String>) -> Self {
        self.institution = Some(institution.into());
        self
    }

    pub fn with_category(mut self, category: AccountCategory) -> Self {
        self.category = category;
        self
    }

    /// Read one account listing row. Only a missing id or a non-object row is
    /// an error; unusable text fields are treated as absent.
    pub fn from_value(value: &Value) -> Result<Self, AccountError> {
        let Value::Object(row) = value else {
            return Err(AccountError::NotAnObject);
        };
        let id = row
            .get("id")
            .and_then(id_from_value)
            .ok_or(AccountError::MissingId)?;

        Ok(Self {
            id,
            name: first_text(row, &NAME_KEYS).unwrap_or_default(),
            institution: first_text(row, &INSTITUTION_KEYS),
            category: first_text(row, &CATEGORY_KEYS)
                .map(|label| AccountCategory::from_label(&label))
                .unwrap_or_default(),
        })
    }
}

impl<'de> Deserialize<'de> for Account {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Account::from_value(&value).map_err(de::Error::custom)
    }
}

/// Parse an account listing, skipping rows that cannot be used.
pub fn accounts_from_values(rows: &[Value]) -> Vec<Account> {
    rows.iter()
        .enumerate()
        .filter_map(|(index, row)| match Account::from_value(row) {
            Ok(account) => Some(account),
            Err(err) => {
                warn!(index, error = %err, "skipping invalid account record");
                None
            }
        })
        .collect()
}

fn first_text(row: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| row.get(*key))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|text| !text.is_empty())
        .map(str::to_string)
}

/// Render a JSON id (the backend uses both integer and string ids) as a string.
///
/// Returns `None` for null, empty strings and non-scalar values.
pub fn id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
