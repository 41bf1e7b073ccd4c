use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The closed set of holding kinds a position can describe.
/// The asset type decides which raw fields carry quantity, price and cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    Security,
    Crypto,
    Metal,
    RealEstate,
    Cash,
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("Unknown asset type {value:?}: expected security, crypto, metal, real_estate or cash")]
pub struct ParseAssetTypeError {
    value: String,
}

impl AssetType {
    pub const ALL: [AssetType; 5] = [
        AssetType::Security,
        AssetType::Crypto,
        AssetType::Metal,
        AssetType::RealEstate,
        AssetType::Cash,
    ];

    /// Canonical key, as used for grouping and serialization.
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetType::Security => "security",
            AssetType::Crypto => "crypto",
            AssetType::Metal => "metal",
            AssetType::RealEstate => "real_estate",
            AssetType::Cash => "cash",
        }
    }

    /// Whether cost basis is meaningful for this kind of holding.
    pub fn tracks_cost_basis(&self) -> bool {
        !matches!(self, AssetType::Cash)
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetType {
    type Err = ParseAssetTypeError;

    /// Accepts the spellings the different listing endpoints use
    /// ("securities", "Real Estate", "precious-metal", ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == '-' || c == ' ' { '_' } else { c })
            .collect();

        match key.as_str() {
            "security" | "securities" | "stock" | "stocks" | "equity" | "etf" => {
                Ok(AssetType::Security)
            }
            "crypto" | "cryptocurrency" | "cryptocurrencies" => Ok(AssetType::Crypto),
            "metal" | "metals" | "precious_metal" | "precious_metals" => Ok(AssetType::Metal),
            "real_estate" | "realestate" | "property" => Ok(AssetType::RealEstate),
            "cash" | "bank" | "savings" => Ok(AssetType::Cash),
            _ => Err(ParseAssetTypeError {
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_type_serialization() {
        let json = serde_json::to_string(&AssetType::RealEstate).unwrap();
        assert_eq!(json, r#""real_estate""#);

        let parsed: AssetType = serde_json::from_str(r#""crypto""#).unwrap();
        assert_eq!(parsed, AssetType::Crypto);
    }

    #[test]
    fn test_parse_accepts_endpoint_spellings() {
        assert_eq!("Securities".parse::<AssetType>(), Ok(AssetType::Security));
        assert_eq!("Real Estate".parse::<AssetType>(), Ok(AssetType::RealEstate));
        assert_eq!("precious-metal".parse::<AssetType>(), Ok(AssetType::Metal));
        assert_eq!(" CASH ".parse::<AssetType>(), Ok(AssetType::Cash));
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = "bond".parse::<AssetType>().unwrap_err();
        assert!(err.to_string().contains("bond"));
    }

    #[test]
    fn test_display_matches_serde_key() {
        for asset_type in AssetType::ALL {
            let json = serde_json::to_string(&asset_type).unwrap();
            assert_eq!(json, format!("\"{asset_type}\""));
        }
    }
}
