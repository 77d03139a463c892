//! Driftline Core — the risk & execution engine of the paper-trading simulator.
//!
//! This crate contains everything with real invariants:
//! - Domain types (bars, positions, signal context, trade records)
//! - Execution engine: opens positions with ATR-derived stop/target/size and
//!   advances them bar by bar until a stop, target, or time-stop exit
//! - Risk controller: equity tracking, intraday drawdown halt, per-trade
//!   risk budget
//! - Entry-admission pipeline: regime, volatility, trend, and clustered-entry
//!   guards combined with the base probability signal
//!
//! The core performs no I/O and holds no hidden global state. Bar fetch,
//! prediction, persistence, and the orchestration loop live in
//! `driftline-runner`.

pub mod config;
pub mod domain;
pub mod execution;
pub mod guards;
pub mod risk;
