//! Tier gates
//!
//! Each tier is a conjunction of named checks. All four sets are always built,
//! in a fixed order, from the feature snapshot alone: the live scanner and the
//! tuning replayer share this function and therefore produce identical gate
//! vectors for identical snapshots.

use crate::config::EngineConfig;
use crate::features::FeatureSnapshot;
use crate::sweep;
use crate::types::{Category, MarketContext, Thresholds};
use serde::{Deserialize, Serialize};

/// Stable gate keys, also used as snapshot field names
pub mod keys {
    pub const TREND_EMA200: &str = "trend_ema200";
    pub const NEAR_VWAP: &str = "near_vwap";
    pub const RSI_BAND: &str = "rsi_band";
    pub const ATR_GUARD: &str = "atr_guard";
    pub const SESSION: &str = "session";
    pub const CONFIRM_15M: &str = "confirm_15m";
    pub const SWEEP_RECLAIM: &str = "sweep_reclaim";
    pub const SETUP: &str = "sweep_or_vwap_hug";
    pub const VOLUME_SPIKE: &str = "volume_spike";
    pub const BODY_QUALITY: &str = "body_quality";
    pub const RISK_REWARD: &str = "risk_reward";
    pub const HAS_MARKET: &str = "has_market";
}

/// One named check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateResult {
    pub key: String,
    pub ok: bool,
    pub reason: String,
}

impl GateResult {
    pub fn new(key: &str, ok: bool, reason: String) -> Self {
        Self {
            key: key.to_string(),
            ok,
            reason,
        }
    }
}

/// Ordered gates for one tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateSet {
    pub tier: Category,
    pub gates: Vec<GateResult>,
}

impl GateSet {
    fn new(tier: Category) -> Self {
        Self {
            tier,
            gates: Vec::new(),
        }
    }

    fn push(&mut self, key: &str, ok: bool, reason: String) {
        self.gates.push(GateResult::new(key, ok, reason));
    }

    pub fn passed(&self) -> bool {
        self.gates.iter().all(|g| g.ok)
    }

    pub fn get(&self, key: &str) -> Option<&GateResult> {
        self.gates.iter().find(|g| g.key == key)
    }

    pub fn pass_vector(&self) -> Vec<bool> {
        self.gates.iter().map(|g| g.ok).collect()
    }
}

/// Gate sets for all four tiers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierGates {
    pub best: GateSet,
    pub ready: GateSet,
    pub early: GateSet,
    pub watch: GateSet,
}

impl TierGates {
    pub fn for_tier(&self, tier: Category) -> &GateSet {
        match tier {
            Category::BestEntry => &self.best,
            Category::ReadyToBuy => &self.ready,
            Category::EarlyReady => &self.early,
            Category::Watch => &self.watch,
        }
    }

    /// Strictest-first order used for tier selection
    pub fn in_priority(&self) -> [&GateSet; 4] {
        [&self.best, &self.ready, &self.early, &self.watch]
    }
}

// Shared checks. Each takes the tier's own limits so that the reason text
// always shows the bound that was applied.

fn trend(set: &mut GateSet, f: &FeatureSnapshot) {
    set.push(
        keys::TREND_EMA200,
        f.price > f.ema200,
        format!("price {:.6} vs EMA200 {:.6} (needs above)", f.price, f.ema200),
    );
}

fn near_vwap(set: &mut GateSet, f: &FeatureSnapshot, max_pct: f64) {
    set.push(
        keys::NEAR_VWAP,
        f.delta_vwap_pct.abs() <= max_pct,
        format!("VWAP distance {:+.3}% (limit {:.3}%)", f.delta_vwap_pct, max_pct),
    );
}

fn atr_guard(set: &mut GateSet, f: &FeatureSnapshot, max_pct: f64) {
    set.push(
        keys::ATR_GUARD,
        f.atr_pct <= max_pct,
        format!("ATR {:.3}% (limit {:.3}%)", f.atr_pct, max_pct),
    );
}

fn volume(set: &mut GateSet, f: &FeatureSnapshot, min_x: f64) {
    set.push(
        keys::VOLUME_SPIKE,
        f.vol_spike >= min_x,
        format!("volume spike {:.2}x (needs {:.2}x)", f.vol_spike, min_x),
    );
}

fn session(set: &mut GateSet, f: &FeatureSnapshot) {
    set.push(
        keys::SESSION,
        f.session_active,
        format!("session {}", if f.session_active { "active" } else { "closed" }),
    );
}

fn body(set: &mut GateSet, f: &FeatureSnapshot, min_ratio: f64) {
    set.push(
        keys::BODY_QUALITY,
        f.body_ratio >= min_ratio,
        format!("candle body {:.2} of range (needs {:.2})", f.body_ratio, min_ratio),
    );
}

fn has_market(set: &mut GateSet, market: Option<&MarketContext>) {
    let reason = match market {
        Some(m) => format!("regime data for {}", m.reference_symbol),
        None => "no regime data".to_string(),
    };
    set.push(keys::HAS_MARKET, market.is_some(), reason);
}

fn best_gates(f: &FeatureSnapshot, t: &Thresholds, c: &EngineConfig, market: Option<&MarketContext>) -> GateSet {
    let mut set = GateSet::new(Category::BestEntry);
    trend(&mut set, f);
    near_vwap(&mut set, f, t.vwap_distance_pct);
    set.push(
        keys::RSI_BAND,
        f.rsi9 >= c.best_rsi_min && f.rsi9 <= c.best_rsi_max && f.rsi_rising(),
        format!(
            "RSI {:.1} (prev {:.1}) needs [{:.0}, {:.0}] and rising",
            f.rsi9, f.rsi9_prev, c.best_rsi_min, c.best_rsi_max
        ),
    );
    atr_guard(&mut set, f, t.atr_guard_pct);
    session(&mut set, f);
    set.push(
        keys::CONFIRM_15M,
        f.confirm15.strict,
        format!("15m strict confirm {}", f.confirm15.strict),
    );
    set.push(
        keys::SWEEP_RECLAIM,
        f.sweep.passes_under(f.atr_pct, c),
        format!(
            "sweep {} depth {:.3}% (needs {:.3}%) reclaimed {}",
            f.sweep.swept,
            f.sweep.depth_pct,
            sweep::min_depth_pct(f.atr_pct, c),
            f.sweep.reclaimed
        ),
    );
    volume(&mut set, f, t.vol_spike_x);
    body(&mut set, f, c.best_min_body_ratio);
    let rr = f.plan.as_ref().and_then(|p| p.rr);
    set.push(
        keys::RISK_REWARD,
        rr.map(|r| r >= c.best_min_rr).unwrap_or(false),
        match rr {
            Some(r) => format!("R:R {:.2} (needs {:.2})", r, c.best_min_rr),
            None => "no R:R without a trade plan".to_string(),
        },
    );
    has_market(&mut set, market);
    set
}

/// Whether a READY setup may stand in for a missing sweep: strict 15m
/// confirmation, uptrend and price hugging VWAP
pub fn no_sweep_fallback(f: &FeatureSnapshot, c: &EngineConfig) -> bool {
    c.ready_no_sweep_fallback
        && f.confirm15.strict
        && f.price > f.ema200
        && f.delta_vwap_pct.abs() <= c.ready_no_sweep_vwap_pct
}

fn ready_gates(f: &FeatureSnapshot, t: &Thresholds, c: &EngineConfig, market: Option<&MarketContext>) -> GateSet {
    let mut set = GateSet::new(Category::ReadyToBuy);
    trend(&mut set, f);
    near_vwap(&mut set, f, t.vwap_distance_pct * c.ready_vwap_mult);
    set.push(
        keys::RSI_BAND,
        f.rsi9 >= c.ready_rsi_min && f.rsi9 <= c.ready_rsi_max && f.rsi9 >= f.rsi9_prev,
        format!(
            "RSI {:.1} (prev {:.1}) needs [{:.0}, {:.0}] and not falling",
            f.rsi9, f.rsi9_prev, c.ready_rsi_min, c.ready_rsi_max
        ),
    );
    atr_guard(&mut set, f, t.atr_guard_pct * c.ready_atr_mult);
    session(&mut set, f);
    set.push(
        keys::CONFIRM_15M,
        f.confirm15.confirmed(),
        format!("15m confirm {:?}", f.confirm15.mode()),
    );
    let swept = f.sweep.passes_under(f.atr_pct, c);
    let fallback = no_sweep_fallback(f, c);
    set.push(
        keys::SETUP,
        swept || fallback,
        if swept {
            format!(
                "sweep and reclaim, depth {:.3}% (needs {:.3}%)",
                f.sweep.depth_pct,
                sweep::min_depth_pct(f.atr_pct, c)
            )
        } else {
            format!(
                "no sweep; VWAP-hug fallback {} (within {:.2}% on strict 15m)",
                fallback, c.ready_no_sweep_vwap_pct
            )
        },
    );
    volume(&mut set, f, t.vol_spike_x * c.ready_vol_mult);
    body(&mut set, f, c.ready_min_body_ratio);
    has_market(&mut set, market);
    set
}

fn early_gates(f: &FeatureSnapshot, t: &Thresholds, c: &EngineConfig) -> GateSet {
    let mut set = GateSet::new(Category::EarlyReady);
    trend(&mut set, f);
    near_vwap(&mut set, f, t.vwap_distance_pct * c.early_vwap_mult);
    set.push(
        keys::RSI_BAND,
        f.rsi9 >= c.early_rsi_min && f.rsi9 <= c.early_rsi_max,
        format!("RSI {:.1} needs [{:.0}, {:.0}]", f.rsi9, c.early_rsi_min, c.early_rsi_max),
    );
    atr_guard(&mut set, f, t.atr_guard_pct * c.early_atr_mult);
    set.push(
        keys::CONFIRM_15M,
        f.confirm15.confirmed(),
        format!("15m confirm {:?}", f.confirm15.mode()),
    );
    volume(&mut set, f, t.vol_spike_x * c.early_vol_mult);
    set
}

fn watch_gates(f: &FeatureSnapshot, t: &Thresholds, c: &EngineConfig) -> GateSet {
    let mut set = GateSet::new(Category::Watch);
    trend(&mut set, f);
    near_vwap(&mut set, f, t.vwap_distance_pct * c.watch_vwap_mult);
    set.push(
        keys::RSI_BAND,
        f.rsi9 >= c.watch_rsi_min && f.rsi9 <= c.watch_rsi_max,
        format!("RSI {:.1} needs [{:.0}, {:.0}]", f.rsi9, c.watch_rsi_min, c.watch_rsi_max),
    );
    atr_guard(&mut set, f, t.atr_guard_pct * c.watch_atr_mult);
    set
}

/// Build all four gate sets
pub fn evaluate_tiers(
    f: &FeatureSnapshot,
    t: &Thresholds,
    c: &EngineConfig,
    market: Option<&MarketContext>,
) -> TierGates {
    TierGates {
        best: best_gates(f, t, c, market),
        ready: ready_gates(f, t, c, market),
        early: early_gates(f, t, c),
        watch: watch_gates(f, t, c),
    }
}

/// Strictest tier whose gates all pass
pub fn highest_passing(tiers: &TierGates) -> Option<Category> {
    tiers
        .in_priority()
        .into_iter()
        .find(|set| set.passed())
        .map(|set| set.tier)
}
