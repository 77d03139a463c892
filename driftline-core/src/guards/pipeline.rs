//! Entry-admission pipeline: base probability signal plus the four guards,
//! combined by logical AND.
//!
//! Evaluation order is fixed: base signal (long before short, never both),
//! regime, volatility, trend, then — only when the risk controller still
//! permits trading — the clustered-entry guard. The first denial
//! short-circuits and its reason is surfaced.

use crate::config::GuardConfig;
use crate::domain::{Side, SignalContext};
use crate::risk::{ClusterGuard, RiskController};

use super::regime::RegimeFilter;
use super::trend::TrendGuard;
use super::volatility::VolatilityFilter;

/// Which layer rejected the candidate entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardStage {
    BaseSignal,
    Regime,
    Volatility,
    Trend,
    RiskHalt,
    Cluster,
}

/// Outcome of one admission evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryDecision {
    Open(Side),
    Rejected { stage: GuardStage, reason: String },
}

impl EntryDecision {
    fn rejected(stage: GuardStage, reason: impl Into<String>) -> Self {
        EntryDecision::Rejected { stage, reason: reason.into() }
    }

    pub fn side(&self) -> Option<Side> {
        match self {
            EntryDecision::Open(side) => Some(*side),
            EntryDecision::Rejected { .. } => None,
        }
    }
}

/// The layered admission pipeline. Stateless itself; the stateful cluster
/// guard and risk controller are passed explicitly to every evaluation.
#[derive(Debug, Clone)]
pub struct EntryPipeline {
    prob_threshold: f64,
    regime: RegimeFilter,
    volatility: VolatilityFilter,
    trend: TrendGuard,
}

impl EntryPipeline {
    pub fn new(cfg: &GuardConfig) -> Self {
        Self {
            prob_threshold: cfg.prob_threshold,
            regime: RegimeFilter::new(cfg.regime.clone()),
            volatility: VolatilityFilter::new(cfg.volatility.clone()),
            trend: TrendGuard::new(cfg.trend.clone()),
        }
    }

    /// Base directional signal: probability against the threshold and the
    /// EMA-difference sign must agree. Long is evaluated first; short is
    /// considered only when long was not selected, so the engine can never
    /// open both sides from one context.
    fn base_side(&self, ctx: &SignalContext) -> Option<Side> {
        if !ctx.prob_up.is_finite() || !ctx.ema_diff.is_finite() {
            return None;
        }
        if ctx.prob_up >= self.prob_threshold && ctx.ema_diff > 0.0 {
            return Some(Side::Long);
        }
        if (1.0 - ctx.prob_up) >= self.prob_threshold && ctx.ema_diff < 0.0 {
            return Some(Side::Short);
        }
        None
    }

    /// Run the full admission stack for one instrument at one bar.
    pub fn evaluate(
        &self,
        instrument: &str,
        bar_index: u64,
        ctx: &SignalContext,
        risk: &mut RiskController,
        cluster: &mut ClusterGuard,
    ) -> EntryDecision {
        let Some(side) = self.base_side(ctx) else {
            return EntryDecision::rejected(GuardStage::BaseSignal, "no_base_signal");
        };

        let regime = self.regime.decide(ctx);
        let regime_ok = match side {
            Side::Long => regime.allow_long,
            Side::Short => regime.allow_short,
        };
        if !regime_ok {
            return EntryDecision::rejected(GuardStage::Regime, regime.reason);
        }

        let vol = self.volatility.decide(ctx.atr, ctx.vol_z);
        if !vol.allow {
            return EntryDecision::rejected(GuardStage::Volatility, vol.reason);
        }

        let trend = self.trend.decide(ctx.close, ctx.trend_baseline);
        let trend_ok = match side {
            Side::Long => trend.allow_long,
            Side::Short => trend.allow_short,
        };
        if !trend_ok {
            return EntryDecision::rejected(GuardStage::Trend, trend.reason);
        }

        // The cluster guard is consulted only while trading is permitted,
        // so a halted day never advances its streak state.
        if !risk.can_trade() {
            return EntryDecision::rejected(GuardStage::RiskHalt, "daily_loss_halt");
        }

        let cluster_decision = cluster.can_enter(instrument, side, bar_index);
        if !cluster_decision.allow {
            return EntryDecision::rejected(GuardStage::Cluster, cluster_decision.reason);
        }

        EntryDecision::Open(side)
    }
}
