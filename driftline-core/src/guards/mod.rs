//! Entry-admission guards and their composition.
//!
//! Each guard produces an allow/deny verdict plus a diagnostic reason;
//! the pipeline combines them by logical AND with the base probability
//! signal. Guard rejections are ordinary verdicts, never errors.

pub mod pipeline;
pub mod regime;
pub mod trend;
pub mod volatility;

pub use pipeline::{EntryDecision, EntryPipeline, GuardStage};
pub use regime::{Regime, RegimeDecision, RegimeFilter};
pub use trend::{TrendGuard, TrendVerdict};
pub use volatility::{VolVerdict, VolatilityFilter};
