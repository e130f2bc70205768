//! Emitted signal record
//!
//! Flat and JSON-serializable so the persistence layer can store it as is,
//! next to the `FeatureSnapshot` it came from.

use crate::classify::Classification;
use crate::confirm::ConfirmMode;
use crate::debug::{GateSnapshot, TierDebug};
use crate::features::FeatureSnapshot;
use crate::plan::StopReason;
use crate::regime::BtcGate;
use crate::types::Category;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Introspection attached to every signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalDebug {
    pub tiers: TierDebug,
    pub confirm15_mode: ConfirmMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downgraded_from: Option<Category>,
    pub plan_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regime_note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub symbol: String,
    pub category: Category,
    pub as_of: Option<DateTime<Utc>>,
    pub price: f64,
    pub vwap: f64,
    pub ema200: f64,
    pub rsi9: f64,
    pub vol_spike: f64,
    pub atr_pct: f64,
    /// Strict or soft 15m confirmation; `debug.confirm15_mode` says which
    pub confirm15m: bool,
    pub delta_vwap_pct: f64,

    // Trade plan
    pub stop: Option<f64>,
    pub stop_reason: Option<StopReason>,
    pub tp1: Option<f64>,
    pub tp2: Option<f64>,
    pub target: Option<f64>,
    pub risk_pct: Option<f64>,
    pub rr: Option<f64>,

    pub reasons: Vec<String>,
    pub gate_snapshot: GateSnapshot,
    pub blocked_by_btc: bool,
    pub would_be_category: Option<Category>,
    pub btc_gate: Option<BtcGate>,
    /// Threshold preset the signal was evaluated under
    pub preset: String,
    pub debug: SignalDebug,
}

impl Signal {
    pub fn build(f: &FeatureSnapshot, c: &Classification, preset: &str) -> Self {
        let plan = f.plan.as_ref();
        let regime_note = c.regime.btc_gate.map(|gate| match c.regime.would_be {
            Some(would_be) => format!("bear regime: {} -> WATCH ({})", would_be, gate.as_str()),
            None => format!("bear regime: escaped via {}", gate.as_str()),
        });

        Self {
            symbol: f.symbol.clone(),
            category: c.category,
            as_of: f.as_of,
            price: f.price,
            vwap: f.vwap,
            ema200: f.ema200,
            rsi9: f.rsi9,
            vol_spike: f.vol_spike,
            atr_pct: f.atr_pct,
            confirm15m: f.confirm15.confirmed(),
            delta_vwap_pct: f.delta_vwap_pct,
            stop: plan.map(|p| p.stop),
            stop_reason: plan.map(|p| p.stop_reason),
            tp1: plan.map(|p| p.tp1),
            tp2: plan.map(|p| p.tp2),
            target: plan.map(|p| p.target),
            risk_pct: plan.map(|p| p.risk_pct),
            rr: plan.and_then(|p| p.rr),
            reasons: c.reasons.clone(),
            gate_snapshot: GateSnapshot::from(&c.tiers),
            blocked_by_btc: c.blocked_by_regime(),
            would_be_category: c.regime.would_be,
            btc_gate: c.regime.btc_gate,
            preset: preset.to_string(),
            debug: SignalDebug {
                tiers: TierDebug::from(&c.tiers),
                confirm15_mode: f.confirm15.mode(),
                downgraded_from: c.downgraded_from,
                plan_valid: c.plan_valid,
                regime_note,
            },
        }
    }

    pub fn is_actionable(&self) -> bool {
        self.category.requires_plan() && self.stop.is_some()
    }
}
