//! Execution engine: position lifecycle from open to terminal exit.

pub mod engine;

pub use engine::{AdvanceResult, ExecutionEngine, OpenError};
