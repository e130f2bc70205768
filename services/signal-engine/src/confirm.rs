//! Higher-timeframe (15m) trend confirmation
//!
//! Strict: close above same-day VWAP and EMA-200, RSI inside the confirm band
//! and rising. Soft: strict one bar ago, or close hugging a rolling VWAP with
//! EMA and RSI roughly in place. Short history is "not confirmed".

use crate::config::EngineConfig;
use crate::series::SeriesView;
use crate::vwap::{anchored_vwap, VwapPrefix};
use serde::{Deserialize, Serialize};

/// Which branch confirmed the 15m trend, for the debug label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmMode {
    Strict,
    Soft,
    None,
}

/// 15m series plus its indicator arrays
pub struct ConfirmInputs<'a> {
    pub series: &'a SeriesView,
    pub prefix: &'a VwapPrefix,
    pub ema: &'a [f64],
    pub rsi: &'a [f64],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confirmation {
    pub strict: bool,
    /// Only evaluated when `strict` is false
    pub soft: bool,
}

impl Confirmation {
    pub fn confirmed(&self) -> bool {
        self.strict || self.soft
    }

    pub fn mode(&self) -> ConfirmMode {
        if self.strict {
            ConfirmMode::Strict
        } else if self.soft {
            ConfirmMode::Soft
        } else {
            ConfirmMode::None
        }
    }
}

fn has_history(inputs: &ConfirmInputs<'_>, j: usize, cfg: &EngineConfig) -> bool {
    let n = inputs.series.len();
    n >= cfg.min_bars && j < n && j > 0 && inputs.ema.len() == n && inputs.rsi.len() == n
}

/// Strict confirmation at bar `j`
pub fn confirm_strict(inputs: &ConfirmInputs<'_>, j: usize, cfg: &EngineConfig) -> bool {
    if !has_history(inputs, j, cfg) {
        return false;
    }
    let close = inputs.series.close[j];
    let vwap = anchored_vwap(inputs.series, inputs.prefix, j, cfg.vwap_fallback_bars_15m);
    let rsi = inputs.rsi[j];
    let rsi_prev = inputs.rsi[j - 1];

    // NaN compares false everywhere below
    close > vwap
        && close > inputs.ema[j]
        && rsi > cfg.confirm_rsi_min
        && rsi < cfg.confirm_rsi_max
        && rsi > rsi_prev
}

/// Soft confirmation at bar `j`
pub fn confirm_soft(inputs: &ConfirmInputs<'_>, j: usize, cfg: &EngineConfig) -> bool {
    if !has_history(inputs, j, cfg) {
        return false;
    }
    if confirm_strict(inputs, j - 1, cfg) {
        return true;
    }

    let close = inputs.series.close[j];
    let rolling_vwap = inputs.prefix.rolling(j, cfg.soft_vwap_window);
    let near_vwap = close >= rolling_vwap * (1.0 - cfg.soft_vwap_eps_pct / 100.0);

    let ema = inputs.ema[j];
    let ema_ok = close > ema || close >= ema * (1.0 - cfg.soft_ema_tolerance_pct / 100.0);

    let rsi = inputs.rsi[j];
    let rsi_prev = inputs.rsi[j - 1];
    let rsi_ok = rsi > cfg.soft_rsi_floor
        && rsi < cfg.confirm_rsi_max
        && rsi >= rsi_prev - cfg.soft_rsi_fall_eps;

    near_vwap && ema_ok && rsi_ok
}

/// Evaluate both checks on the latest bar
pub fn evaluate(inputs: &ConfirmInputs<'_>, cfg: &EngineConfig) -> Confirmation {
    let n = inputs.series.len();
    if n == 0 {
        return Confirmation { strict: false, soft: false };
    }
    let j = n - 1;
    let strict = confirm_strict(inputs, j, cfg);
    let soft = !strict && confirm_soft(inputs, j, cfg);
    Confirmation { strict, soft }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn flat_series(n: usize, close: f64) -> SeriesView {
        let start: DateTime<Utc> = Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap()
            - Duration::minutes(15 * (n as i64 - 40));
        let mut view = SeriesView::default();
        for i in 0..n {
            view.times.push(Some(start + Duration::minutes(15 * i as i64)));
            view.open.push(close);
            view.high.push(close + 0.1);
            view.low.push(close - 0.1);
            view.close.push(close);
            view.volume.push(1000.0);
        }
        view
    }

    fn lift_last(view: &mut SeriesView, bars: usize, close: f64) {
        let n = view.len();
        for i in n - bars..n {
            view.close[i] = close;
            view.high[i] = close + 0.1;
            view.low[i] = close - 0.3;
        }
    }

    fn rsi_tail(n: usize, base: f64, tail: &[f64]) -> Vec<f64> {
        let mut rsi = vec![base; n];
        let start = n - tail.len();
        rsi[start..].copy_from_slice(tail);
        rsi
    }

    #[test]
    fn test_strict_confirmation() {
        let cfg = EngineConfig::default();
        let mut view = flat_series(260, 100.0);
        lift_last(&mut view, 2, 100.5);
        let prefix = VwapPrefix::new(&view);
        let ema = vec![99.0; 260];
        let rsi = rsi_tail(260, 50.0, &[60.0, 62.0]);
        let inputs = ConfirmInputs { series: &view, prefix: &prefix, ema: &ema, rsi: &rsi };

        let c = evaluate(&inputs, &cfg);
        assert!(c.strict);
        assert!(!c.soft, "soft is not evaluated once strict passes");
        assert_eq!(c.mode(), ConfirmMode::Strict);
    }

    #[test]
    fn test_strict_requires_rising_rsi_inside_band() {
        let cfg = EngineConfig::default();
        let mut view = flat_series(260, 100.0);
        lift_last(&mut view, 2, 100.5);
        let prefix = VwapPrefix::new(&view);
        let ema = vec![99.0; 260];

        let falling = rsi_tail(260, 50.0, &[63.0, 62.0]);
        let inputs = ConfirmInputs { series: &view, prefix: &prefix, ema: &ema, rsi: &falling };
        assert!(!confirm_strict(&inputs, 259, &cfg));

        let hot = rsi_tail(260, 50.0, &[79.0, 81.0]);
        let inputs = ConfirmInputs { series: &view, prefix: &prefix, ema: &ema, rsi: &hot };
        assert!(!confirm_strict(&inputs, 259, &cfg));
    }

    #[test]
    fn test_soft_carries_previous_strict() {
        let cfg = EngineConfig::default();
        let mut view = flat_series(260, 100.0);
        lift_last(&mut view, 3, 100.5);
        let prefix = VwapPrefix::new(&view);
        let ema = vec![99.0; 260];
        // Strict one bar ago, RSI dipped on the latest bar
        let rsi = rsi_tail(260, 50.0, &[58.0, 61.0, 60.0]);
        let inputs = ConfirmInputs { series: &view, prefix: &prefix, ema: &ema, rsi: &rsi };

        let c = evaluate(&inputs, &cfg);
        assert!(!c.strict);
        assert!(c.soft);
        assert_eq!(c.mode(), ConfirmMode::Soft);
    }

    #[test]
    fn test_soft_tolerates_small_dip_below_vwap_and_ema() {
        let cfg = EngineConfig::default();
        let mut view = flat_series(260, 100.0);
        // Close 0.1% under a ~100 rolling VWAP, 0.1% under EMA
        lift_last(&mut view, 1, 99.9);
        let prefix = VwapPrefix::new(&view);
        let ema = vec![100.0; 260];
        let rsi = rsi_tail(260, 50.0, &[52.0, 51.8]);
        let inputs = ConfirmInputs { series: &view, prefix: &prefix, ema: &ema, rsi: &rsi };

        let c = evaluate(&inputs, &cfg);
        assert!(!c.strict);
        assert!(c.soft);

        let weak_rsi = rsi_tail(260, 50.0, &[47.0, 46.0]);
        let inputs = ConfirmInputs { series: &view, prefix: &prefix, ema: &ema, rsi: &weak_rsi };
        assert!(!evaluate(&inputs, &cfg).confirmed());
    }

    #[test]
    fn test_short_history_is_not_confirmed() {
        let cfg = EngineConfig::default();
        let mut view = flat_series(150, 100.0);
        lift_last(&mut view, 2, 100.5);
        let prefix = VwapPrefix::new(&view);
        let ema = vec![99.0; 150];
        let rsi = rsi_tail(150, 50.0, &[60.0, 62.0]);
        let inputs = ConfirmInputs { series: &view, prefix: &prefix, ema: &ema, rsi: &rsi };
        assert!(!evaluate(&inputs, &cfg).confirmed());
    }
}
