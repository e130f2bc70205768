//! Anchored VWAP
//!
//! Typical price `(H+L+C)/3` weighted by volume, summed into prefix arrays once
//! per series. Any window `[start, j]` is then two subtractions away.

use crate::series::SeriesView;
use chrono::{DateTime, Utc};

/// Prefix sums of `tp * volume` and `volume`
#[derive(Debug, Clone)]
pub struct VwapPrefix {
    cum_pv: Vec<f64>,
    cum_v: Vec<f64>,
}

impl VwapPrefix {
    pub fn new(series: &SeriesView) -> Self {
        let n = series.len();
        let mut cum_pv = Vec::with_capacity(n);
        let mut cum_v = Vec::with_capacity(n);
        let (mut pv, mut v) = (0.0, 0.0);
        for i in 0..n {
            let tp = (series.high[i] + series.low[i] + series.close[i]) / 3.0;
            let vol = series.volume[i];
            if tp.is_finite() && vol.is_finite() && vol > 0.0 {
                pv += tp * vol;
                v += vol;
            }
            cum_pv.push(pv);
            cum_v.push(v);
        }
        Self { cum_pv, cum_v }
    }

    pub fn len(&self) -> usize {
        self.cum_v.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cum_v.is_empty()
    }

    /// VWAP over bars `[start, j]`; `NaN` if the range is empty or has no volume
    pub fn anchored(&self, start: usize, j: usize) -> f64 {
        if start > j || j >= self.len() {
            return f64::NAN;
        }
        let (pv0, v0) = if start == 0 {
            (0.0, 0.0)
        } else {
            (self.cum_pv[start - 1], self.cum_v[start - 1])
        };
        let volume = self.cum_v[j] - v0;
        if !(volume > 0.0) {
            return f64::NAN;
        }
        (self.cum_pv[j] - pv0) / volume
    }

    /// VWAP over the trailing `window` bars ending at `j`, ignoring day boundaries
    pub fn rolling(&self, j: usize, window: usize) -> f64 {
        if window == 0 {
            return f64::NAN;
        }
        let start = (j + 1).saturating_sub(window);
        self.anchored(start, j)
    }
}

/// First index `a <= j` such that bars `[a, j]` share `j`'s UTC calendar day.
///
/// Without a timestamp on bar `j` the anchor is a plain bar count:
/// `max(0, j - fallback_bars + 1)`. An untimed earlier bar ends the scan.
pub fn day_anchor_index(times: &[Option<DateTime<Utc>>], j: usize, fallback_bars: usize) -> usize {
    let Some(t_j) = times.get(j).copied().flatten() else {
        return (j + 1).saturating_sub(fallback_bars.max(1));
    };
    let day = t_j.date_naive();
    let mut anchor = j;
    while anchor > 0 {
        match times[anchor - 1] {
            Some(t) if t.date_naive() == day => anchor -= 1,
            _ => break,
        }
    }
    anchor
}

/// Same-day VWAP at bar `j`
pub fn anchored_vwap(series: &SeriesView, prefix: &VwapPrefix, j: usize, fallback_bars: usize) -> f64 {
    let start = day_anchor_index(&series.times, j, fallback_bars);
    prefix.anchored(start, j)
}
