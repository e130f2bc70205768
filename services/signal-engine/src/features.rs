//! Feature snapshot
//!
//! Every number the gates look at, captured once from raw candles. The tier
//! logic reads only this struct, so a stored snapshot can be re-gated under
//! different thresholds without touching candles or indicators again.

use crate::config::EngineConfig;
use crate::confirm::{self, ConfirmInputs, Confirmation};
use crate::indicators::IndicatorFeed;
use crate::observability::Diagnostics;
use crate::plan::{self, PlanInputs, TradePlan};
use crate::series::SeriesView;
use crate::sweep::{self, SweepResult};
use crate::types::{Candle, SkipReason};
use crate::vwap::{anchored_vwap, day_anchor_index, VwapPrefix};
use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Trailing bars inspected for the close-above-VWAP streak
const MAX_HOLD_SCAN: usize = 48;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSnapshot {
    pub symbol: String,
    pub as_of: Option<DateTime<Utc>>,
    pub price: f64,
    pub vwap: f64,
    pub ema200: f64,
    pub rsi9: f64,
    pub rsi9_prev: f64,
    pub atr_pct: f64,
    pub vol_spike: f64,
    pub delta_vwap_pct: f64,
    pub body_ratio: f64,
    pub session_active: bool,
    pub confirm15: Confirmation,
    /// Consecutive trailing 5m closes above their own anchored VWAP
    pub vwap_hold_bars: usize,
    pub sweep: SweepResult,
    pub upside_liquidity: Option<f64>,
    pub plan: Option<TradePlan>,
}

impl FeatureSnapshot {
    pub fn above_vwap(&self) -> bool {
        self.price > self.vwap
    }

    pub fn rsi_rising(&self) -> bool {
        self.rsi9 > self.rsi9_prev
    }
}

/// Is `time` inside the configured UTC session window?
pub fn session_active(time: Option<DateTime<Utc>>, cfg: &EngineConfig) -> bool {
    if !cfg.session_filter {
        return true;
    }
    let Some(time) = time else {
        return false;
    };
    let hour = time.hour();
    let (start, end) = (cfg.session_start_hour_utc, cfg.session_end_hour_utc);
    if start == end {
        true
    } else if start < end {
        hour >= start && hour < end
    } else {
        hour >= start || hour < end
    }
}

fn last(values: &[f64]) -> f64 {
    values.last().copied().unwrap_or(f64::NAN)
}

fn at(values: &[f64], i: usize) -> f64 {
    values.get(i).copied().unwrap_or(f64::NAN)
}

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Count trailing bars (ending at `j`) whose close sits above that bar's
/// same-day VWAP
fn vwap_hold_bars(series: &SeriesView, prefix: &VwapPrefix, j: usize, fallback: usize) -> usize {
    let mut held = 0;
    for k in (0..=j).rev().take(MAX_HOLD_SCAN) {
        let vwap = anchored_vwap(series, prefix, k, fallback);
        if series.close[k] > vwap {
            held += 1;
        } else {
            break;
        }
    }
    held
}

/// Compute the snapshot from guarded candle slices
pub(crate) fn compute(
    symbol: &str,
    candles_5m: &[Candle],
    candles_15m: &[Candle],
    feed: &dyn IndicatorFeed,
    cfg: &EngineConfig,
    diag: &Diagnostics<'_>,
) -> Result<FeatureSnapshot, SkipReason> {
    if candles_5m.len() < cfg.min_bars || candles_15m.len() < cfg.min_bars {
        return Err(SkipReason::InsufficientData);
    }

    let s5 = SeriesView::from_candles(candles_5m);
    let s15 = SeriesView::from_candles(candles_15m);
    let j = s5.len() - 1;

    let ema = feed.ema(&s5.close, cfg.ema_period);
    let rsi = feed.rsi(&s5.close, cfg.rsi_period);
    let atr = feed.atr_pct(&s5.high, &s5.low, &s5.close, cfg.atr_period);
    let spike = feed.volume_spike(&s5.notional(), cfg.vol_spike_period);

    let prefix = VwapPrefix::new(&s5);
    let anchor = day_anchor_index(&s5.times, j, cfg.vwap_fallback_bars_5m);
    if anchor > 0 {
        diag.day_boundary(symbol, "5m", anchor, j);
    }
    let vwap = prefix.anchored(anchor, j);

    let price = s5.close[j];
    let ema200 = last(&ema);
    let rsi9 = last(&rsi);
    let rsi9_prev = at(&rsi, j.saturating_sub(1));
    let atr_pct = last(&atr);

    if !positive(price) || !positive(vwap) || !positive(ema200) {
        return Err(SkipReason::DegenerateMarket);
    }
    if !rsi9.is_finite() || !rsi9_prev.is_finite() {
        return Err(SkipReason::DegenerateMarket);
    }
    if !atr_pct.is_finite() || atr_pct < cfg.min_atr_pct {
        return Err(SkipReason::DegenerateMarket);
    }
    let vol_spike = {
        let v = last(&spike);
        if v.is_finite() {
            v
        } else {
            0.0
        }
    };

    let ema15 = feed.ema(&s15.close, cfg.ema_period);
    let rsi15 = feed.rsi(&s15.close, cfg.rsi_period);
    let prefix15 = VwapPrefix::new(&s15);
    let confirm15 = confirm::evaluate(
        &ConfirmInputs {
            series: &s15,
            prefix: &prefix15,
            ema: &ema15,
            rsi: &rsi15,
        },
        cfg,
    );

    let sweep = sweep::detect(&s5, j, vwap, atr_pct, cfg);
    let upside_liquidity = sweep::nearest_upside_liquidity(&s5, j, cfg.sweep_lookback);
    let swing_low = sweep::swing_low(&s5, j, cfg.sweep_lookback);
    let plan = plan::build_plan(
        &PlanInputs {
            price,
            atr_pct,
            sweep: &sweep,
            swing_low,
            upside_liquidity,
        },
        cfg,
    );

    let last_candle = &candles_5m[j];
    Ok(FeatureSnapshot {
        symbol: symbol.to_string(),
        as_of: last_candle
            .effective_close_time(crate::types::TimeFrame::Minute5),
        price,
        vwap,
        ema200,
        rsi9,
        rsi9_prev,
        atr_pct,
        vol_spike,
        delta_vwap_pct: (price - vwap) / vwap * 100.0,
        body_ratio: s5.body_ratio(j),
        session_active: session_active(last_candle.anchor_time(), cfg),
        confirm15,
        vwap_hold_bars: vwap_hold_bars(&s5, &prefix, j, cfg.vwap_fallback_bars_5m),
        sweep,
        upside_liquidity,
        plan,
    })
}
