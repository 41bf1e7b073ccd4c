#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use anyhow::Result;
use serde_json::{json, Value};

/// Accounts listing shared by the fixtures below.
///
/// Rows mix the spellings different endpoints use, sometimes several in the
/// same row, and include one row without an id that must be skipped.
pub fn accounts_json() -> Value {
    json!([
        {
            "id": 1, "name": "Joint Brokerage", "account_name": "JOINT-BRK",
            "institution": "Vanguard", "category": "brokerage", "type": "taxable"
        },
        {
            "id": "w-7", "name": null, "account_name": "Cold Wallet",
            "institution": null, "institution_name": "Ledger",
            "type": "wallet", "account_category": "crypto"
        },
        {"name": "Orphan row without id", "type": "checking"}
    ])
}

/// A security worth 100 (cost 80) and a crypto lot worth 50 (cost 60).
pub fn positions_json() -> Value {
    json!([
        {
            "id": 101, "account_id": 1, "asset_type": "security", "type": "stock",
            "ticker": "VTI", "shares": 10, "current_price": 10, "currentPrice": 10.5,
            "cost_basis": 8, "sector": "Technology"
        },
        {
            "id": "btc-1", "accountId": "w-7", "asset_type": null, "assetType": "crypto",
            "coin_symbol": null, "coinSymbol": "BTC", "name": null, "sector": null,
            "quantity": "1", "currentPrice": "$50.00", "purchasePrice": 60
        }
    ])
}

/// One cash balance held at a credit union.
pub fn credit_union_json() -> (Value, Value) {
    let accounts = json!([
        {"id": "cu-1", "name": "Share Savings", "institution": "Navy Federal Credit Union", "type": "savings"}
    ]);
    let positions = json!([
        {"id": 1, "account_id": "cu-1", "asset_type": "cash", "cash_type": "savings", "balance": 1000}
    ]);
    (accounts, positions)
}

pub fn write_json(dir: &Path, name: &str, value: &Value) -> Result<PathBuf> {
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_string_pretty(value)?)?;
    Ok(path)
}

pub fn write_config(dir: &Path, body: &str) -> Result<PathBuf> {
    let path = dir.join("folioscope.toml");
    std::fs::write(&path, body)?;
    Ok(path)
}

pub fn run_folioscope(config: &Path, args: &[&str]) -> Result<Output> {
    let output = Command::new(env!("CARGO_BIN_EXE_folioscope"))
        .arg("--config")
        .arg(config)
        .args(args)
        .env_remove("RUST_LOG")
        .output()?;
    Ok(output)
}

pub fn stdout_json(output: &Output) -> Result<Value> {
    assert!(output.status.success(), "Command failed: {output:?}");
    let stdout = String::from_utf8(output.stdout.clone())?;
    Ok(serde_json::from_str(&stdout)?)
}

pub fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}
