// tests/cli_integration.rs
mod support;

use anyhow::Result;
use serde_json::json;
use support::{
    accounts_json, approx, credit_union_json, positions_json, run_folioscope, stdout_json,
    write_config, write_json,
};
use tempfile::TempDir;

fn as_f64(value: &serde_json::Value) -> f64 {
    value.as_f64().unwrap_or(f64::NAN)
}

#[test]
fn summary_reports_net_worth_and_allocation() -> Result<()> {
    let temp = TempDir::new()?;
    let config = write_config(temp.path(), "reporting_currency = \"USD\"\n")?;
    let positions = write_json(temp.path(), "positions.json", &positions_json())?;
    let accounts = write_json(temp.path(), "accounts.json", &accounts_json())?;

    let output = run_folioscope(
        &config,
        &[
            "summary",
            "--positions",
            positions.to_str().unwrap(),
            "--accounts",
            accounts.to_str().unwrap(),
        ],
    )?;
    let json = stdout_json(&output)?;

    assert_eq!(json["currency"], "USD");
    assert_eq!(json["grouping"], "asset_type");
    assert_eq!(json["complete"], true);
    assert!(approx(as_f64(&json["summary"]["net_worth"]), 150.0));
    assert!(approx(as_f64(&json["summary"]["total_gain_loss"]), 10.0));
    assert_eq!(json["net_worth_display"], "$150.00");
    assert_eq!(json["gain_loss_percent_display"], "+7.14%");

    let allocation = json["allocation"].as_array().unwrap();
    assert_eq!(allocation.len(), 2);
    assert_eq!(allocation[0]["label"], "Securities");
    assert!(approx(as_f64(&allocation[0]["percent"]), 100.0 * 100.0 / 150.0));
    assert_eq!(allocation[1]["key"], "crypto");

    assert!(json["chips"].as_array().unwrap().is_empty());
    Ok(())
}

#[test]
fn summary_with_prior_snapshot_emits_ordered_chips() -> Result<()> {
    let temp = TempDir::new()?;
    let config = write_config(temp.path(), "")?;
    let positions = write_json(temp.path(), "positions.json", &positions_json())?;
    let prior = write_json(
        temp.path(),
        "summary.json",
        &json!({
            "netWorth": 100,
            "periodChanges": {
                "1W": {"netWorth": 5, "netWorthPercent": 0.034},
                "ytd": {"netWorth": -1500, "netWorthPercent": -12}
            }
        }),
    )?;

    let output = run_folioscope(
        &config,
        &[
            "summary",
            "--positions",
            positions.to_str().unwrap(),
            "--prior",
            prior.to_str().unwrap(),
        ],
    )?;
    let json = stdout_json(&output)?;

    let chips = json["chips"].as_array().unwrap();
    let periods: Vec<&str> = chips.iter().filter_map(|c| c["period"].as_str()).collect();
    assert_eq!(periods, vec!["1d", "1w", "ytd"]);

    assert_eq!(chips[0]["label"], "1D");
    assert_eq!(chips[0]["trend"], "up");
    assert_eq!(chips[0]["amount_display"], "$50");
    assert_eq!(chips[0]["percent_display"], "+50.00%");
    assert_eq!(chips[1]["percent_display"], "+3.40%");
    assert_eq!(chips[2]["trend"], "down");
    assert_eq!(chips[2]["amount_display"], "-$1.5K");
    Ok(())
}

#[test]
fn summary_by_institution_keeps_credit_union_as_asset() -> Result<()> {
    let temp = TempDir::new()?;
    let config = write_config(temp.path(), "")?;
    let (accounts, positions) = credit_union_json();
    let positions = write_json(temp.path(), "positions.json", &positions)?;
    let accounts = write_json(temp.path(), "accounts.json", &accounts)?;

    let output = run_folioscope(
        &config,
        &[
            "summary",
            "--positions",
            positions.to_str().unwrap(),
            "--accounts",
            accounts.to_str().unwrap(),
            "--group-by",
            "institution",
        ],
    )?;
    let json = stdout_json(&output)?;

    assert_eq!(json["grouping"], "institution");
    assert!(approx(as_f64(&json["summary"]["net_worth"]), 1000.0));
    assert!(approx(as_f64(&json["summary"]["total_assets"]), 1000.0));
    assert_eq!(as_f64(&json["summary"]["total_liabilities"]), 0.0);
    assert_eq!(json["net_worth_display"], "$1,000.00");

    let allocation = json["allocation"].as_array().unwrap();
    assert_eq!(allocation.len(), 1);
    assert_eq!(allocation[0]["key"], "Navy Federal Credit Union");
    Ok(())
}

#[test]
fn account_rows_with_repeated_or_null_fields_are_accepted() -> Result<()> {
    let temp = TempDir::new()?;
    let config = write_config(temp.path(), "")?;
    let positions = write_json(temp.path(), "positions.json", &positions_json())?;
    let accounts = write_json(temp.path(), "accounts.json", &accounts_json())?;

    let output = run_folioscope(
        &config,
        &[
            "groups",
            "--positions",
            positions.to_str().unwrap(),
            "--accounts",
            accounts.to_str().unwrap(),
            "--group-by",
            "account",
        ],
    )?;
    let json = stdout_json(&output)?;

    assert_eq!(json["complete"], true);
    let keys: Vec<&str> = json["groups"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|g| g["key"].as_str())
        .collect();
    assert_eq!(keys, vec!["Joint Brokerage", "Cold Wallet"]);

    let stderr = String::from_utf8(output.stderr)?;
    assert!(stderr.contains("skipping invalid account record"), "{stderr}");
    Ok(())
}

#[test]
fn groups_by_institution() -> Result<()> {
    let temp = TempDir::new()?;
    let config = write_config(temp.path(), "")?;
    let positions = write_json(temp.path(), "positions.json", &positions_json())?;
    let accounts = write_json(temp.path(), "accounts.json", &accounts_json())?;

    let output = run_folioscope(
        &config,
        &[
            "groups",
            "--positions",
            positions.to_str().unwrap(),
            "--accounts",
            accounts.to_str().unwrap(),
            "--group-by",
            "institution",
        ],
    )?;
    let json = stdout_json(&output)?;

    assert_eq!(json["grouping"], "institution");
    let groups = json["groups"].as_array().unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0]["key"], "Vanguard");
    assert_eq!(groups[0]["color"], "#96151d");
    assert_eq!(groups[0]["position_count"], 1);
    assert_eq!(groups[0]["total_value_display"], "$100.00");
    assert_eq!(groups[0]["gain_loss_percent_display"], "+25.00%");
    assert_eq!(groups[1]["key"], "Ledger");
    assert_eq!(groups[1]["gain_loss_percent_display"], "-16.67%");
    Ok(())
}

#[test]
fn groups_default_dimension_comes_from_config() -> Result<()> {
    let temp = TempDir::new()?;
    let config = write_config(temp.path(), "[grouping]\ndefault = \"sector\"\n")?;
    let positions = write_json(temp.path(), "positions.json", &positions_json())?;

    let output = run_folioscope(
        &config,
        &["groups", "--positions", positions.to_str().unwrap()],
    )?;
    let json = stdout_json(&output)?;

    assert_eq!(json["grouping"], "sector");
    let keys: Vec<&str> = json["groups"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|g| g["key"].as_str())
        .collect();
    assert_eq!(keys, vec!["Technology", "Other"]);
    Ok(())
}

#[test]
fn positions_reports_diagnostics_for_bad_records() -> Result<()> {
    let temp = TempDir::new()?;
    let config = write_config(temp.path(), "")?;
    let positions = write_json(
        temp.path(),
        "positions.json",
        &json!([
            {"id": 1, "account_id": "a", "coin_type": "ETH", "quantity": 2, "price": 10},
            {"id": 2, "account_id": "a", "asset_type": "cash", "amount": 5}
        ]),
    )?;

    let output = run_folioscope(&config, &["positions", "--positions", positions.to_str().unwrap()])?;
    let json = stdout_json(&output)?;
    assert_eq!(json["positions"].as_array().unwrap().len(), 1);
    assert_eq!(json["diagnostics"][0]["kind"], "excluded");
    assert_eq!(json["diagnostics"][0]["severity"], "error");
    assert_eq!(json["diagnostics"][0]["index"], 0);

    // The same record is usable once the listing's asset type is known.
    let output = run_folioscope(
        &config,
        &[
            "positions",
            "--positions",
            positions.to_str().unwrap(),
            "--asset-type",
            "crypto",
        ],
    )?;
    let json = stdout_json(&output)?;
    let positions = json["positions"].as_array().unwrap();
    assert_eq!(positions.len(), 2);
    assert_eq!(positions[0]["label"], "ETH");
    assert_eq!(positions[0]["cost_basis_estimated"], true);
    Ok(())
}

#[test]
fn invalid_liability_pattern_fails_summary() -> Result<()> {
    let temp = TempDir::new()?;
    let config = write_config(temp.path(), "[summary]\nliability_patterns = [\"(\"]\n")?;
    let positions = write_json(temp.path(), "positions.json", &positions_json())?;

    let output = run_folioscope(&config, &["summary", "--positions", positions.to_str().unwrap()])?;
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr)?;
    assert!(stderr.contains("liability_patterns[0]"), "{stderr}");
    Ok(())
}

#[test]
fn missing_positions_file_is_an_error() -> Result<()> {
    let temp = TempDir::new()?;
    let config = write_config(temp.path(), "")?;
    let missing = temp.path().join("nope.json");

    let output = run_folioscope(&config, &["groups", "--positions", missing.to_str().unwrap()])?;
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr)?;
    assert!(stderr.contains("Failed to read"), "{stderr}");
    Ok(())
}

#[test]
fn config_command_prints_resolved_config() -> Result<()> {
    let temp = TempDir::new()?;
    let config = write_config(
        temp.path(),
        "reporting_currency = \"EUR\"\n[display]\npercent_decimals = 1\n",
    )?;

    let output = run_folioscope(&config, &["config"])?;
    assert!(output.status.success(), "Command failed: {output:?}");
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("reporting_currency = \"EUR\""), "{stdout}");
    assert!(stdout.contains("percent_decimals = 1"), "{stdout}");
    assert!(stdout.contains("default = \"asset_type\""), "{stdout}");
    Ok(())
}
