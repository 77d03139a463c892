use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque trade identifier.
///
/// Assigned by the persistence layer (which reserves the trade record)
/// before the execution engine accepts the open. The engine never mints
/// ids itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TradeId(pub i64);

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
