//! Driftline CLI — replay and config commands.
//!
//! Commands:
//! - `replay` — run a full bar-by-bar replay from CSV histories
//! - `init-config` — emit the default TOML configuration

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use driftline_runner::{load_bars_csv, run_replay, BaselinePredictor, MemoryStore, ReplayConfig};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "driftline", about = "Driftline CLI — directional strategy replay engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a replay over CSV bar histories.
    Replay {
        /// Path to a TOML config file. Defaults to built-in settings.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory holding one CSV per instrument ("EUR/USD" -> EUR_USD.csv).
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// Output directory for the trade ledger and report.
        #[arg(long, default_value = "results")]
        out_dir: PathBuf,
    },
    /// Emit the default TOML configuration.
    InitConfig {
        /// Write to this file instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Replay { config, data_dir, out_dir } => run_replay_cmd(config, &data_dir, &out_dir),
        Commands::InitConfig { out } => run_init_config(out),
    }
}

/// Instrument name to history filename: "EUR/USD" -> "EUR_USD.csv".
fn instrument_file(data_dir: &Path, instrument: &str) -> PathBuf {
    data_dir.join(format!("{}.csv", instrument.replace('/', "_")))
}

fn run_replay_cmd(config: Option<PathBuf>, data_dir: &Path, out_dir: &Path) -> Result<()> {
    let cfg = match config {
        Some(path) => ReplayConfig::load(&path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => ReplayConfig::default(),
    };

    let mut data = HashMap::new();
    for instrument in &cfg.trading.instruments {
        let path = instrument_file(data_dir, instrument);
        let bars = load_bars_csv(&path)
            .with_context(|| format!("loading bars for {instrument}"))?;
        info!(instrument = instrument.as_str(), bars = bars.len(), "history loaded");
        data.insert(instrument.clone(), bars);
    }

    let predictor = BaselinePredictor { min_bars: cfg.trading.warmup_bars, ..Default::default() };
    let mut store = MemoryStore::new();
    let report = run_replay(&cfg, &data, &predictor, &mut store)?;

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let trades_path = out_dir.join("trades.csv");
    store.export_trades_to_path(&trades_path)?;

    let closed = store.closed_trades().count();
    let summary = serde_json::json!({
        "ticks": report.ticks,
        "instruments": cfg.trading.instruments,
        "starting_equity": cfg.risk.starting_equity,
        "final_equity": report.final_equity,
        "trades_opened": report.opened(),
        "trades_closed": closed,
        "equity_curve": report.equity_curve
            .iter()
            .map(|(ts, eq)| serde_json::json!({ "timestamp": ts, "equity": eq }))
            .collect::<Vec<_>>(),
    });
    let report_path = out_dir.join("report.json");
    std::fs::write(&report_path, serde_json::to_string_pretty(&summary)?)
        .with_context(|| format!("writing {}", report_path.display()))?;

    println!("Replay complete: {} ticks, {} trades opened", report.ticks, report.opened());
    println!(
        "Equity: {:.2} -> {:.2}",
        cfg.risk.starting_equity, report.final_equity
    );
    println!("Ledger: {}", trades_path.display());
    println!("Report: {}", report_path.display());
    Ok(())
}

fn run_init_config(out: Option<PathBuf>) -> Result<()> {
    let rendered = ReplayConfig::default_toml();
    match out {
        Some(path) => {
            std::fs::write(&path, rendered)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("Wrote default config to {}", path.display());
        }
        None => print!("{rendered}"),
    }
    Ok(())
}
