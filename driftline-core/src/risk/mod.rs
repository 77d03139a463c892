//! Capital preservation: equity/drawdown tracking and clustered-entry
//! throttling.

pub mod cluster;
pub mod controller;

pub use cluster::{ClusterDecision, ClusterGuard};
pub use controller::RiskController;
