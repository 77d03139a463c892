//! Driftline Runner — the thin orchestration boundary around the core.
//!
//! This crate owns everything the core treats as an external collaborator:
//! - CSV bar loading with monotonic-timestamp validation
//! - Indicator series and the baseline predictor that assembles the
//!   per-bar signal context
//! - The replay loop: day rollover, two-phase ticks (advance everything,
//!   then evaluate entries), per-instrument fault isolation
//! - Trade persistence behind the `TradeStore` seam, with an in-memory
//!   store and CSV export
//! - TOML configuration loading and validation

pub mod config;
pub mod data;
pub mod indicators;
pub mod predictor;
pub mod replay;
pub mod store;

pub use config::{ConfigError, ReplayConfig, TradingConfig};
pub use data::{load_bars_csv, LoadError};
pub use predictor::{BaselinePredictor, PredictError, Predictor};
pub use replay::{run_replay, ReplayError, ReplayReport, TickOutcome, TickRecord};
pub use store::{MemoryStore, TradeRow, TradeStatus, TradeStore};
