use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use pmdash_analytics::{AnalyticsTelemetry, MetricsEngine, PortfolioProject};
use serde_json::{json, Value};
use shared_logging::LogLevel;

#[derive(Parser, Debug)]
#[command(name = "pmdash", version, about = "Earned-value KPIs for projects and portfolios")]
struct Cli {
    /// Scoring thresholds (TOML). Stock thresholds when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Append structured JSON logs to this file.
    #[arg(long, global = true)]
    log: Option<PathBuf>,
    /// Lowest level written to the log file.
    #[arg(long, global = true, default_value = "info")]
    log_level: LogLevel,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Computes metrics for one project from a JSON object of fields.
    Project {
        /// Project identifier.
        #[arg(long)]
        id: String,
        /// JSON file holding the field bag.
        #[arg(long)]
        input: PathBuf,
    },
    /// Computes the portfolio rollup from a JSON array of `{ id, data }` entries.
    Portfolio {
        #[arg(long)]
        input: PathBuf,
    },
    /// Classifies health directly from SPI, CPI and risk.
    Health {
        #[arg(long, allow_negative_numbers = true)]
        spi: f64,
        #[arg(long, allow_negative_numbers = true)]
        cpi: f64,
        #[arg(long, allow_negative_numbers = true)]
        risk: f64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = run(&cli)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn run(cli: &Cli) -> Result<Value> {
    let engine = build_engine(cli)?;
    match &cli.command {
        Commands::Project { id, input } => {
            let Value::Object(fields) = read_json(input)? else {
                bail!("{} must hold a JSON object of fields", input.display());
            };
            let metrics = engine
                .calculate_metrics_from_fields(id, &fields)
                .with_context(|| format!("reading project fields from {}", input.display()))?;
            Ok(serde_json::to_value(metrics)?)
        }
        Commands::Portfolio { input } => {
            let document = read_json(input)?;
            let Value::Array(entries) = document else {
                bail!("{} must hold a JSON array of projects", input.display());
            };
            let projects = entries
                .iter()
                .enumerate()
                .map(|(idx, entry)| {
                    PortfolioProject::from_value(entry)
                        .with_context(|| format!("portfolio entry #{idx}"))
                })
                .collect::<Result<Vec<_>>>()?;
            let summary = engine.calculate_portfolio_metrics(&projects)?;
            Ok(serde_json::to_value(summary)?)
        }
        Commands::Health { spi, cpi, risk } => {
            let health = engine.calculate_project_health(*spi, *cpi, *risk);
            Ok(json!({ "status": health.status, "percentage": health.percentage }))
        }
    }
}

fn build_engine(cli: &Cli) -> Result<MetricsEngine> {
    let mut builder = MetricsEngine::builder();
    if let Some(path) = &cli.config {
        builder = builder.config_path(path)?;
    }
    if let Some(path) = &cli.log {
        let telemetry = AnalyticsTelemetry::builder("pmdash")
            .log_path(path)
            .min_level(cli.log_level)
            .build()
            .with_context(|| format!("opening log {}", path.display()))?;
        builder = builder.telemetry(telemetry);
    }
    builder.build()
}

fn read_json(path: &Path) -> Result<Value> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}
