//! Trade plan: stop, targets, risk and reward
//!
//! Stops come from an ordered list of candidate builders. The first candidate
//! that is finite, positive and strictly below price wins.

use crate::config::EngineConfig;
use crate::sweep::SweepResult;
use serde::{Deserialize, Serialize};

/// Which rule produced the stop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    SweepLow,
    SweepLowAtrFloor,
    SwingLow,
    AtrFloor,
    Atr,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopReason::SweepLow => "sweep_low",
            StopReason::SweepLowAtrFloor => "sweep_low_atr_floor",
            StopReason::SwingLow => "swing_low",
            StopReason::AtrFloor => "atr_floor",
            StopReason::Atr => "atr",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopCandidate {
    pub price: f64,
    pub reason: StopReason,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradePlan {
    pub stop: f64,
    pub stop_reason: StopReason,
    pub tp1: f64,
    pub tp2: f64,
    pub target: f64,
    /// True when `target` is resting liquidity rather than the 2R level
    pub target_is_liquidity: bool,
    pub risk_pct: f64,
    pub rr: Option<f64>,
}

impl TradePlan {
    /// A plan can back an executable category only if it clears the risk floor
    pub fn is_valid(&self, price: f64, min_risk_pct: f64, require_rr: bool) -> bool {
        self.stop < price && self.risk_pct >= min_risk_pct && (!require_rr || self.rr.is_some())
    }
}

/// Everything the stop chain looks at
#[derive(Debug, Clone)]
pub struct PlanInputs<'a> {
    pub price: f64,
    pub atr_pct: f64,
    pub sweep: &'a SweepResult,
    pub swing_low: Option<f64>,
    pub upside_liquidity: Option<f64>,
}

impl PlanInputs<'_> {
    fn atr_price(&self) -> f64 {
        self.price * self.atr_pct / 100.0
    }
}

type CandidateFn = fn(&PlanInputs<'_>, &EngineConfig) -> Option<StopCandidate>;

/// Stop rules in priority order
const STOP_CHAIN: [CandidateFn; 3] = [sweep_stop, swing_stop, atr_stop];

/// Raise `level` to the ATR floor when the floor is closer to price
fn floored(
    level: f64,
    inputs: &PlanInputs<'_>,
    cfg: &EngineConfig,
    base: StopReason,
    floored_reason: StopReason,
) -> StopCandidate {
    let floor = inputs.price - inputs.atr_price() * cfg.stop_floor_atr_mult;
    if floor.is_finite() && floor > level && floor < inputs.price {
        StopCandidate { price: floor, reason: floored_reason }
    } else {
        StopCandidate { price: level, reason: base }
    }
}

pub fn sweep_stop(inputs: &PlanInputs<'_>, cfg: &EngineConfig) -> Option<StopCandidate> {
    if !inputs.sweep.swept {
        return None;
    }
    let low = inputs.sweep.swept_low?;
    Some(floored(low, inputs, cfg, StopReason::SweepLow, StopReason::SweepLowAtrFloor))
}

pub fn swing_stop(inputs: &PlanInputs<'_>, cfg: &EngineConfig) -> Option<StopCandidate> {
    let low = inputs.swing_low?;
    Some(floored(low, inputs, cfg, StopReason::SwingLow, StopReason::AtrFloor))
}

pub fn atr_stop(inputs: &PlanInputs<'_>, cfg: &EngineConfig) -> Option<StopCandidate> {
    Some(StopCandidate {
        price: inputs.price - inputs.atr_price() * cfg.stop_atr_mult,
        reason: StopReason::Atr,
    })
}

fn is_valid_stop(stop: f64, price: f64) -> bool {
    stop.is_finite() && stop > 0.0 && stop < price
}

/// First valid stop in the chain
pub fn select_stop(inputs: &PlanInputs<'_>, cfg: &EngineConfig) -> Option<StopCandidate> {
    STOP_CHAIN
        .iter()
        .filter_map(|candidate| candidate(inputs, cfg))
        .find(|c| is_valid_stop(c.price, inputs.price))
}

/// Build the plan, or `None` when no stop can be placed
pub fn build_plan(inputs: &PlanInputs<'_>, cfg: &EngineConfig) -> Option<TradePlan> {
    let price = inputs.price;
    if !(price.is_finite() && price > 0.0) {
        return None;
    }
    let stop = select_stop(inputs, cfg)?;

    let risk = price - stop.price;
    let tp1 = price + risk;
    let tp2 = price + 2.0 * risk;
    let (target, target_is_liquidity) = match inputs.upside_liquidity {
        Some(liq) if liq.is_finite() && liq > price => (liq, true),
        _ => (tp2, false),
    };
    let rr = if risk > 0.0 && target.is_finite() {
        Some((target - price) / risk)
    } else {
        None
    };

    Some(TradePlan {
        stop: stop.price,
        stop_reason: stop.reason,
        tp1,
        tp2,
        target,
        target_is_liquidity,
        risk_pct: risk / price * 100.0,
        rr,
    })
}
