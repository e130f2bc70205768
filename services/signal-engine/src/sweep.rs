//! Liquidity sweep & reclaim detection
//!
//! A sweep is a brief undercut of the prior swing low (stops getting run)
//! followed by a close back above that low and above VWAP.

use crate::config::EngineConfig;
use crate::series::SeriesView;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepResult {
    /// Lowest low of the lookback window before the sweep window
    pub prior_low: Option<f64>,
    pub swept: bool,
    /// Deepest low inside the sweep window, when it undercut `prior_low`
    pub swept_low: Option<f64>,
    pub depth_pct: f64,
    pub min_depth_pct: f64,
    pub reclaimed: bool,
    pub passed: bool,
}

impl SweepResult {
    /// Re-judge the stored raw sweep against `cfg`'s depth settings. Gates use
    /// this rather than `passed` so replay honours changed depth knobs.
    pub fn passes_under(&self, atr_pct: f64, cfg: &EngineConfig) -> bool {
        self.swept && self.reclaimed && self.depth_pct >= min_depth_pct(atr_pct, cfg)
    }
}

/// Depth a sweep must reach: scales with ATR, bounded by floor and cap
pub fn min_depth_pct(atr_pct: f64, cfg: &EngineConfig) -> f64 {
    if !atr_pct.is_finite() {
        return cfg.sweep_min_depth_pct;
    }
    (atr_pct * cfg.sweep_depth_atr_mult)
        .min(cfg.sweep_depth_cap_pct)
        .max(cfg.sweep_min_depth_pct)
}

/// Detect a sweep ending at bar `j` against the current anchored `vwap`
pub fn detect(series: &SeriesView, j: usize, vwap: f64, atr_pct: f64, cfg: &EngineConfig) -> SweepResult {
    let window = cfg.sweep_window.clamp(1, 3).min(j + 1);
    let sweep_start = j + 1 - window;
    let lookback_start = sweep_start.saturating_sub(cfg.sweep_lookback);

    let prior_low = series.lowest_low(lookback_start, sweep_start);
    let window_low = series.lowest_low(sweep_start, j + 1);
    let min_depth = min_depth_pct(atr_pct, cfg);

    let (swept, swept_low, depth_pct) = match (prior_low, window_low) {
        (Some(prior), Some(low)) if low < prior && prior > 0.0 => {
            (true, Some(low), (prior - low) / prior * 100.0)
        }
        _ => (false, None, 0.0),
    };

    let close = series.close[j];
    let reclaimed = prior_low.map(|p| close > p).unwrap_or(false) && close > vwap;

    let mut result = SweepResult {
        prior_low,
        swept,
        swept_low,
        depth_pct,
        min_depth_pct: min_depth,
        reclaimed,
        passed: false,
    };
    result.passed = result.passes_under(atr_pct, cfg);
    result
}

/// Highest high over the `lookback` bars before `j`: the nearest resting
/// buy-side liquidity, used as a take-profit candidate
pub fn nearest_upside_liquidity(series: &SeriesView, j: usize, lookback: usize) -> Option<f64> {
    series.highest_high(j.saturating_sub(lookback), j)
}

/// Lowest low over the `lookback` bars before `j`
pub fn swing_low(series: &SeriesView, j: usize, lookback: usize) -> Option<f64> {
    series.lowest_low(j.saturating_sub(lookback), j)
}
