//! Domain types shared across the engine, risk controller, and guards.

pub mod bar;
pub mod ids;
pub mod position;
pub mod signal;
pub mod trade;

pub use bar::Bar;
pub use ids::TradeId;
pub use position::{Position, Side};
pub use signal::SignalContext;
pub use trade::{ClosedTrade, ExitReason, OpenedTrade};
