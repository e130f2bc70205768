//! Shared unit-test builders

use crate::confirm::Confirmation;
use crate::features::FeatureSnapshot;
use crate::indicators::IndicatorFeed;
use crate::plan::{StopReason, TradePlan};
use crate::sweep::SweepResult;
use chrono::{TimeZone, Utc};

/// Constant EMA and RSI; ATR 1% and a 1.6x volume spike everywhere
pub struct FixedFeed {
    pub ema: f64,
    pub rsi: f64,
}

impl IndicatorFeed for FixedFeed {
    fn ema(&self, values: &[f64], _period: usize) -> Vec<f64> {
        vec![self.ema; values.len()]
    }

    fn rsi(&self, values: &[f64], _period: usize) -> Vec<f64> {
        vec![self.rsi; values.len()]
    }

    fn atr_pct(&self, _highs: &[f64], _lows: &[f64], closes: &[f64], _period: usize) -> Vec<f64> {
        vec![1.0; closes.len()]
    }

    fn volume_spike(&self, notional: &[f64], _period: usize) -> Vec<f64> {
        vec![1.6; notional.len()]
    }
}

/// A textbook BEST_ENTRY setup: 2-bar sweep of 99.9 down to 99.5, reclaim
/// close at 100.25 over a 100.0 VWAP, stop on the swept low, 2R target
pub fn clean_features() -> FeatureSnapshot {
    FeatureSnapshot {
        symbol: "SOLUSDT".to_string(),
        as_of: Some(Utc.with_ymd_and_hms(2026, 3, 2, 14, 59, 59).unwrap()),
        price: 100.25,
        vwap: 100.0,
        ema200: 99.0,
        rsi9: 58.0,
        rsi9_prev: 57.0,
        atr_pct: 1.0,
        vol_spike: 1.6,
        delta_vwap_pct: 0.25,
        body_ratio: 0.7,
        session_active: true,
        confirm15: Confirmation { strict: true, soft: false },
        vwap_hold_bars: 1,
        sweep: SweepResult {
            prior_low: Some(99.9),
            swept: true,
            swept_low: Some(99.5),
            depth_pct: 0.4004,
            min_depth_pct: 0.25,
            reclaimed: true,
            passed: true,
        },
        upside_liquidity: Some(100.1),
        plan: Some(TradePlan {
            stop: 99.5,
            stop_reason: StopReason::SweepLow,
            tp1: 101.0,
            tp2: 101.75,
            target: 101.75,
            target_is_liquidity: false,
            risk_pct: 0.75 / 100.25 * 100.0,
            rr: Some(2.0),
        }),
    }
}
