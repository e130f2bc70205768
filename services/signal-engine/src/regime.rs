//! Reference-asset regime
//!
//! A bearish reference asset (BTC on 15m, usually) forces any actionable tier
//! down to WATCH unless the symbol shows its own strength. Escape hatches are
//! checked on the symbol's own features, in a fixed order.

use crate::config::EngineConfig;
use crate::features::FeatureSnapshot;
use crate::indicators::IndicatorFeed;
use crate::series::SeriesView;
use crate::types::{Candle, Category, MarketContext, Thresholds};
use crate::vwap::{anchored_vwap, VwapPrefix};
use serde::{Deserialize, Serialize};

/// Outcome of the bear-regime gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BtcGate {
    /// Held above VWAP for enough trailing bars
    PassReclaim,
    /// RSI above the bear-gate floor
    PassRsi,
    /// Volume surge while above VWAP
    PassVol,
    /// No escape condition held; category forced to WATCH
    FailBear,
}

impl BtcGate {
    pub fn as_str(&self) -> &'static str {
        match self {
            BtcGate::PassReclaim => "PASS_RECLAIM",
            BtcGate::PassRsi => "PASS_RSI",
            BtcGate::PassVol => "PASS_VOL",
            BtcGate::FailBear => "FAIL_BEAR",
        }
    }

    pub fn passed(&self) -> bool {
        !matches!(self, BtcGate::FailBear)
    }
}

/// Category after the regime gate
#[derive(Debug, Clone, PartialEq)]
pub struct RegimeDecision {
    pub category: Category,
    pub btc_gate: Option<BtcGate>,
    /// Set when the gate forced a downgrade
    pub would_be: Option<Category>,
}

/// First escape condition that holds, in order: reclaim hold, RSI floor,
/// volume surge above VWAP
pub fn bear_escape(f: &FeatureSnapshot, t: &Thresholds, cfg: &EngineConfig) -> Option<BtcGate> {
    let above = f.above_vwap();
    if above && f.vwap_hold_bars >= cfg.bear_gate_reclaim_bars.max(1) {
        return Some(BtcGate::PassReclaim);
    }
    if f.rsi9 > cfg.bear_gate_rsi_floor {
        return Some(BtcGate::PassRsi);
    }
    if above && f.vol_spike > t.vol_spike_x * cfg.bear_gate_vol_mult {
        return Some(BtcGate::PassVol);
    }
    None
}

/// Apply the bear override to an already selected category
pub fn apply_bear_override(
    category: Category,
    f: &FeatureSnapshot,
    t: &Thresholds,
    cfg: &EngineConfig,
    market: Option<&MarketContext>,
) -> RegimeDecision {
    let bearish = market.map(|m| m.reference_bearish).unwrap_or(false);
    if !bearish || category == Category::Watch {
        return RegimeDecision {
            category,
            btc_gate: None,
            would_be: None,
        };
    }

    match bear_escape(f, t, cfg) {
        Some(gate) => RegimeDecision {
            category,
            btc_gate: Some(gate),
            would_be: None,
        },
        None => RegimeDecision {
            category: Category::Watch,
            btc_gate: Some(BtcGate::FailBear),
            would_be: Some(category),
        },
    }
}

/// Derive a `MarketContext` from the reference asset's 15m candles.
///
/// Bullish needs close above EMA-200 and anchored VWAP with RSI at least 50;
/// bearish needs close below both. Neither holds in a chop.
pub fn assess_reference(
    symbol: &str,
    candles_15m: &[Candle],
    feed: &dyn IndicatorFeed,
    cfg: &EngineConfig,
) -> Option<MarketContext> {
    if candles_15m.len() < cfg.min_bars {
        return None;
    }
    let series = SeriesView::from_candles(candles_15m);
    let j = series.len() - 1;
    let ema = *feed.ema(&series.close, cfg.ema_period).last()?;
    let rsi = *feed.rsi(&series.close, cfg.rsi_period).last()?;
    let prefix = VwapPrefix::new(&series);
    let vwap = anchored_vwap(&series, &prefix, j, cfg.vwap_fallback_bars_15m);
    let close = series.close[j];

    if !(close.is_finite() && ema.is_finite() && vwap.is_finite() && vwap > 0.0) {
        return None;
    }

    let bullish = close > ema && close > vwap && rsi >= 50.0;
    let bearish = close < ema && close < vwap;
    let mut ctx = MarketContext::new(symbol, bullish, bearish);
    ctx.reference_price = Some(close);
    ctx.reference_rsi = rsi.is_finite().then_some(rsi);
    ctx.reference_delta_vwap_pct = Some((close - vwap) / vwap * 100.0);
    Some(ctx)
}
