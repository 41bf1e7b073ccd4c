use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use folioscope::config::{default_config_path, Config};
use folioscope::format::{format_compact_currency, format_currency, format_percent};
use folioscope::models::{accounts_from_values, Account, AssetType, ParseAssetTypeError};
use folioscope::palette;
use folioscope::portfolio::{
    aggregate_by, allocation_slices, period_chips, AllocationSlice, Diagnostic, Group, Grouping,
    Normalized, Normalizer, PeriodChip, PortfolioSummary, SummaryReducer, SummarySnapshot,
};

#[derive(Parser)]
#[command(name = "folioscope")]
#[command(about = "Aggregate and summarize portfolio positions exported from the tracker backend")]
struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct InputArgs {
    /// JSON array of raw position records
    #[arg(long)]
    positions: PathBuf,

    /// JSON array of account records, used to resolve institutions and categories
    #[arg(long)]
    accounts: Option<PathBuf>,

    /// Asset type assumed for records that carry none (per-type listings)
    #[arg(long, value_parser = parse_asset_type)]
    asset_type: Option<AssetType>,

    /// Grouping dimension; defaults to `grouping.default` from the config
    #[arg(long, value_enum)]
    group_by: Option<Grouping>,
}

#[derive(Subcommand)]
enum Command {
    /// Show current configuration
    Config,
    /// Normalize positions and print them with any data-quality diagnostics
    Positions {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Print positions aggregated by one dimension
    Groups {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Print the portfolio summary, period chips and allocation slices
    Summary {
        #[command(flatten)]
        input: InputArgs,

        /// JSON object from the portfolio-summary endpoint (prior net worth, period changes)
        #[arg(long)]
        prior: Option<PathBuf>,
    },
}

fn parse_asset_type(value: &str) -> Result<AssetType, ParseAssetTypeError> {
    value.parse()
}

#[derive(Serialize)]
struct GroupOutput {
    key: String,
    label: String,
    color: String,
    position_count: usize,
    total_value: f64,
    total_cost_basis: f64,
    total_gain_loss: f64,
    gain_loss_percent: f64,
    share_of_total: f64,
    total_value_display: String,
    gain_loss_percent_display: String,
}

#[derive(Serialize)]
struct GroupsOutput {
    grouping: Grouping,
    groups: Vec<GroupOutput>,
    complete: bool,
    diagnostics: Vec<Diagnostic>,
}

#[derive(Serialize)]
struct ChipOutput {
    #[serde(flatten)]
    chip: PeriodChip,
    amount_display: String,
    percent_display: String,
}

#[derive(Serialize)]
struct SummaryOutput {
    currency: String,
    grouping: Grouping,
    summary: PortfolioSummary,
    net_worth_display: String,
    gain_loss_percent_display: String,
    chips: Vec<ChipOutput>,
    allocation: Vec<AllocationSlice>,
    complete: bool,
    diagnostics: Vec<Diagnostic>,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .json(),
            )
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .init();
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

fn load_positions(input: &InputArgs) -> Result<Normalized> {
    let raw: Vec<serde_json::Value> = read_json(&input.positions)?;
    let accounts: Vec<Account> = match &input.accounts {
        Some(path) => {
            let rows: Vec<serde_json::Value> = read_json(path)?;
            accounts_from_values(&rows)
        }
        None => Vec::new(),
    };

    let mut normalizer = Normalizer::new(&accounts);
    if let Some(asset_type) = input.asset_type {
        normalizer = normalizer.with_default_asset_type(asset_type);
    }
    Ok(normalizer.normalize(&raw))
}

fn group_output(group: &Group, grouping: Grouping, config: &Config) -> GroupOutput {
    GroupOutput {
        key: group.key.clone(),
        label: palette::label_for(grouping, &group.key),
        color: palette::color_for(grouping, &group.key).to_string(),
        position_count: group.len(),
        total_value: group.total_value,
        total_cost_basis: group.total_cost_basis,
        total_gain_loss: group.total_gain_loss,
        gain_loss_percent: group.gain_loss_percent,
        share_of_total: group.share_of_total,
        total_value_display: format_currency(group.total_value, &config.display),
        gain_loss_percent_display: format_percent(
            group.gain_loss_percent,
            config.display.percent_decimals,
            true,
        ),
    }
}

fn chip_output(chip: PeriodChip, config: &Config) -> ChipOutput {
    let symbol = config.display.currency_symbol.as_deref().unwrap_or("");
    ChipOutput {
        amount_display: format_compact_currency(chip.amount, symbol),
        percent_display: format_percent(chip.percent, config.display.percent_decimals, true),
        chip,
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let config = Config::load_or_default(&config_path)
        .with_context(|| format!("Failed to load config: {}", config_path.display()))?;

    match cli.command {
        Command::Config => {
            println!("# Config file: {}", config_path.display());
            println!("{}", toml::to_string_pretty(&config)?);
        }
        Command::Positions { input } => {
            let normalized = load_positions(&input)?;
            print_json(&normalized)?;
        }
        Command::Groups { input } => {
            let grouping = input.group_by.unwrap_or(config.grouping.default);
            let normalized = load_positions(&input)?;
            let groups = aggregate_by(&normalized.positions, grouping);
            let complete = normalized.is_complete();

            print_json(&GroupsOutput {
                grouping,
                groups: groups
                    .iter()
                    .map(|g| group_output(g, grouping, &config))
                    .collect(),
                complete,
                diagnostics: normalized.diagnostics,
            })?;
        }
        Command::Summary { input, prior } => {
            let grouping = input.group_by.unwrap_or(config.grouping.default);
            let normalized = load_positions(&input)?;
            let prior: Option<SummarySnapshot> = match &prior {
                Some(path) => Some(read_json(path)?),
                None => None,
            };

            let reducer = SummaryReducer::from_config(&config.summary)?;
            let summary =
                reducer.reduce_positions(&normalized.positions, grouping, prior.as_ref());
            let groups = aggregate_by(&normalized.positions, grouping);
            let chips = period_chips(&summary)
                .into_iter()
                .map(|chip| chip_output(chip, &config))
                .collect();
            let complete = normalized.is_complete();

            print_json(&SummaryOutput {
                currency: config.reporting_currency.clone(),
                grouping,
                net_worth_display: format_currency(summary.net_worth, &config.display),
                gain_loss_percent_display: format_percent(
                    summary.gain_loss_percent,
                    config.display.percent_decimals,
                    true,
                ),
                summary,
                chips,
                allocation: allocation_slices(&groups, grouping),
                complete,
                diagnostics: normalized.diagnostics,
            })?;
        }
    }

    Ok(())
}
