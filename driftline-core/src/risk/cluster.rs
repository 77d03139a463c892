//! Clustered-entry guard: cooldowns, same-side streak limits, and
//! loss-streak pauses, tracked per instrument.
//!
//! All state is driven by bar index, never wall-clock time, so replay and
//! live operation share identical semantics. One guard instance owns the
//! state for every instrument; callers pass it explicitly.

use crate::config::ClusterConfig;
use crate::domain::Side;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Allow/deny verdict with a diagnostic reason. The reason never affects
/// control flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterDecision {
    pub allow: bool,
    pub reason: String,
}

impl ClusterDecision {
    fn allow(reason: impl Into<String>) -> Self {
        Self { allow: true, reason: reason.into() }
    }

    fn deny(reason: impl Into<String>) -> Self {
        Self { allow: false, reason: reason.into() }
    }
}

/// Per-instrument throttling state. Persists across evaluation cycles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ClusterState {
    last_trade_bar: Option<u64>,
    last_side: Option<Side>,
    same_side_count: u32,
    same_side_window_start: Option<u64>,
    loss_streak: u32,
    pause_until_bar: Option<u64>,
}

/// Stateful guard against clustered entries on one instrument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterGuard {
    cfg: ClusterConfig,
    state: HashMap<String, ClusterState>,
}

impl ClusterGuard {
    pub fn new(cfg: ClusterConfig) -> Self {
        Self { cfg, state: HashMap::new() }
    }

    /// May an entry of `side` be admitted at `bar_index`?
    ///
    /// Denies while a loss-streak pause is active, while the post-trade
    /// cooldown is running, or once the same-side streak inside the window
    /// exceeds the configured maximum. A probe that matches the previous
    /// side advances the streak even when it ends up denied.
    pub fn can_enter(&mut self, instrument: &str, side: Side, bar_index: u64) -> ClusterDecision {
        if !self.cfg.enabled {
            return ClusterDecision::allow("cluster_guard_disabled");
        }

        let cfg = self.cfg.clone();
        let st = self.state.entry(instrument.to_string()).or_default();

        if let Some(pause_until) = st.pause_until_bar {
            if bar_index < pause_until {
                return ClusterDecision::deny(format!("paused_until_bar={pause_until}"));
            }
        }

        if let Some(last_bar) = st.last_trade_bar {
            let since = bar_index.saturating_sub(last_bar);
            if since <= u64::from(cfg.cooldown_bars) {
                return ClusterDecision::deny(format!(
                    "cooldown_active({since}<={})",
                    cfg.cooldown_bars
                ));
            }
        }

        if st.last_side == Some(side) {
            let start = st.same_side_window_start.unwrap_or(bar_index);
            if bar_index.saturating_sub(start) > u64::from(cfg.window_bars) {
                // Window expired: this probe starts a fresh streak.
                st.same_side_window_start = Some(bar_index);
                st.same_side_count = 1;
            } else {
                // The closed trade that set last_side counts as the first
                // entry of the streak.
                st.same_side_count = st.same_side_count.max(1) + 1;
                if st.same_side_window_start.is_none() {
                    st.same_side_window_start = Some(bar_index);
                }
            }
            if st.same_side_count > cfg.max_same_side_entries {
                return ClusterDecision::deny(format!(
                    "same_side_cluster>{}",
                    cfg.max_same_side_entries
                ));
            }
        } else {
            st.same_side_window_start = Some(bar_index);
            st.same_side_count = 1;
        }

        ClusterDecision::allow("cluster_ok")
    }

    /// Record a closed trade. A loss extends the loss streak and, once the
    /// streak reaches the configured count, pauses the instrument; any
    /// non-loss resets the streak to zero.
    pub fn on_trade_closed(&mut self, instrument: &str, side: Side, bar_index: u64, pnl: f64) {
        if !self.cfg.enabled {
            return;
        }

        let cfg = self.cfg.clone();
        let st = self.state.entry(instrument.to_string()).or_default();

        st.last_trade_bar = Some(bar_index);
        st.last_side = Some(side);

        if pnl < 0.0 {
            st.loss_streak += 1;
            if st.loss_streak >= cfg.block_after_losses {
                st.pause_until_bar =
                    Some(bar_index + u64::from(cfg.pause_bars_after_loss_streak));
            }
        } else {
            st.loss_streak = 0;
        }
    }
}
