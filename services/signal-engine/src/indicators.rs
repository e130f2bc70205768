//! Indicator feed
//!
//! The engine consumes indicators as aligned arrays: `out[i]` belongs to bar
//! `i`, and warmup positions hold `NaN`. Hosts may plug in their own feed;
//! `StandardIndicators` is the default.

/// Array-in / array-out indicator source
pub trait IndicatorFeed: Send + Sync {
    /// Exponential moving average of `values`
    fn ema(&self, values: &[f64], period: usize) -> Vec<f64>;

    /// Relative strength index (0-100)
    fn rsi(&self, values: &[f64], period: usize) -> Vec<f64>;

    /// Average true range as a percentage of close
    fn atr_pct(&self, highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> Vec<f64>;

    /// Bar notional divided by the mean notional of the previous `period` bars
    fn volume_spike(&self, notional: &[f64], period: usize) -> Vec<f64>;
}

/// SMA-seeded EMA, Wilder RSI and Wilder ATR
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardIndicators;

impl IndicatorFeed for StandardIndicators {
    fn ema(&self, values: &[f64], period: usize) -> Vec<f64> {
        let mut out = vec![f64::NAN; values.len()];
        if period == 0 || values.len() < period {
            return out;
        }
        let k = 2.0 / (period as f64 + 1.0);
        let mut ema = values[..period].iter().sum::<f64>() / period as f64;
        out[period - 1] = ema;
        for i in period..values.len() {
            ema = (values[i] - ema) * k + ema;
            out[i] = ema;
        }
        out
    }

    fn rsi(&self, values: &[f64], period: usize) -> Vec<f64> {
        let mut out = vec![f64::NAN; values.len()];
        if period == 0 || values.len() <= period {
            return out;
        }

        let mut avg_gain = 0.0;
        let mut avg_loss = 0.0;
        for i in 1..=period {
            let change = values[i] - values[i - 1];
            if change > 0.0 {
                avg_gain += change;
            } else {
                avg_loss -= change;
            }
        }
        avg_gain /= period as f64;
        avg_loss /= period as f64;
        out[period] = rsi_value(avg_gain, avg_loss);

        let p = period as f64;
        for i in (period + 1)..values.len() {
            let change = values[i] - values[i - 1];
            let (gain, loss) = if change > 0.0 { (change, 0.0) } else { (0.0, -change) };
            avg_gain = (avg_gain * (p - 1.0) + gain) / p;
            avg_loss = (avg_loss * (p - 1.0) + loss) / p;
            out[i] = rsi_value(avg_gain, avg_loss);
        }
        out
    }

    fn atr_pct(&self, highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> Vec<f64> {
        let n = closes.len();
        let mut out = vec![f64::NAN; n];
        if period == 0 || highs.len() != n || lows.len() != n || n < period {
            return out;
        }

        let true_range = |i: usize| -> f64 {
            let range = highs[i] - lows[i];
            if i == 0 {
                return range;
            }
            let prev = closes[i - 1];
            range.max((highs[i] - prev).abs()).max((lows[i] - prev).abs())
        };

        let mut atr = (0..period).map(true_range).sum::<f64>() / period as f64;
        out[period - 1] = pct_of(atr, closes[period - 1]);
        let p = period as f64;
        for i in period..n {
            atr = (atr * (p - 1.0) + true_range(i)) / p;
            out[i] = pct_of(atr, closes[i]);
        }
        out
    }

    fn volume_spike(&self, notional: &[f64], period: usize) -> Vec<f64> {
        let mut out = vec![f64::NAN; notional.len()];
        if period == 0 {
            return out;
        }
        for i in period..notional.len() {
            let mean = notional[i - period..i].iter().sum::<f64>() / period as f64;
            if mean > 0.0 {
                out[i] = notional[i] / mean;
            }
        }
        out
    }
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 {
            return 50.0;
        }
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

fn pct_of(value: f64, base: f64) -> f64 {
    if base > 0.0 {
        value / base * 100.0
    } else {
        f64::NAN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ema_warmup_and_seed() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        let ema = StandardIndicators.ema(&values, 3);
        assert!(ema[0].is_nan() && ema[1].is_nan());
        assert!((ema[2] - 2.0).abs() < 1e-12);
        // k = 0.5
        assert!((ema[3] - 3.0).abs() < 1e-12);
        assert!((ema[4] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_ema_insufficient_data() {
        let ema = StandardIndicators.ema(&[1.0, 2.0], 5);
        assert_eq!(ema.len(), 2);
        assert!(ema.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_rsi_extremes() {
        let rising: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let rsi = StandardIndicators.rsi(&rising, 9);
        assert!(rsi[8].is_nan());
        assert_eq!(rsi[19], 100.0);

        let flat = vec![5.0; 20];
        assert_eq!(StandardIndicators.rsi(&flat, 9)[19], 50.0);

        let falling: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        assert!(StandardIndicators.rsi(&falling, 9)[19] < 1e-9);
    }

    #[test]
    fn test_atr_pct_constant_range() {
        let closes = vec![100.0; 30];
        let highs = vec![101.0; 30];
        let lows = vec![99.0; 30];
        let atr = StandardIndicators.atr_pct(&highs, &lows, &closes, 14);
        assert!(atr[12].is_nan());
        assert!((atr[13] - 2.0).abs() < 1e-9);
        assert!((atr[29] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_atr_pct_mismatched_lengths() {
        let atr = StandardIndicators.atr_pct(&[1.0; 3], &[1.0; 2], &[1.0; 3], 2);
        assert!(atr.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_volume_spike_ratio() {
        let mut notional = vec![100.0; 25];
        notional[24] = 250.0;
        let spike = StandardIndicators.volume_spike(&notional, 20);
        assert!(spike[19].is_nan());
        assert!((spike[20] - 1.0).abs() < 1e-12);
        assert!((spike[24] - 2.5).abs() < 1e-12);
    }
}
