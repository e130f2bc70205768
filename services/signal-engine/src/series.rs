//! Column view over a candle slice
//!
//! Candles arrive with `Decimal` prices. The statistics below run on `f64`
//! columns, converted once per evaluation.

use crate::types::Candle;
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

#[derive(Debug, Clone, Default)]
pub struct SeriesView {
    pub times: Vec<Option<DateTime<Utc>>>,
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
    pub volume: Vec<f64>,
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}

impl SeriesView {
    pub fn from_candles(candles: &[Candle]) -> Self {
        let mut view = SeriesView {
            times: Vec::with_capacity(candles.len()),
            open: Vec::with_capacity(candles.len()),
            high: Vec::with_capacity(candles.len()),
            low: Vec::with_capacity(candles.len()),
            close: Vec::with_capacity(candles.len()),
            volume: Vec::with_capacity(candles.len()),
        };
        for c in candles {
            view.times.push(c.anchor_time());
            view.open.push(to_f64(c.open));
            view.high.push(to_f64(c.high));
            view.low.push(to_f64(c.low));
            view.close.push(to_f64(c.close));
            view.volume.push(to_f64(c.volume));
        }
        view
    }

    pub fn len(&self) -> usize {
        self.close.len()
    }

    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }

    /// Quote-currency volume per bar, the input to the volume-spike ratio
    pub fn notional(&self) -> Vec<f64> {
        self.close
            .iter()
            .zip(&self.volume)
            .map(|(c, v)| c * v)
            .collect()
    }

    /// Lowest low over `[start, end)`, `None` if the range is empty
    pub fn lowest_low(&self, start: usize, end: usize) -> Option<f64> {
        let end = end.min(self.len());
        if start >= end {
            return None;
        }
        self.low[start..end]
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .reduce(f64::min)
    }

    /// Highest high over `[start, end)`, `None` if the range is empty
    pub fn highest_high(&self, start: usize, end: usize) -> Option<f64> {
        let end = end.min(self.len());
        if start >= end {
            return None;
        }
        self.high[start..end]
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .reduce(f64::max)
    }

    /// Body of bar `j` as a fraction of its range, signed (negative = red bar)
    pub fn body_ratio(&self, j: usize) -> f64 {
        let range = self.high[j] - self.low[j];
        if !(range > 0.0) {
            return 0.0;
        }
        (self.close[j] - self.open[j]) / range
    }
}
