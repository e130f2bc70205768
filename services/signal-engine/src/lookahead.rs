//! Look-ahead guard
//!
//! A candle may only feed a decision if it closed strictly before the order
//! would be placed.

use crate::config::LookAheadMode;
use crate::types::{Candle, EngineError, Result, TimeFrame};
use chrono::{DateTime, Utc};

/// Trim (or reject) trailing candles that close at or after `entry_time`.
///
/// Untimed candles cannot be proven to leak and are kept.
pub fn guard_lookahead<'a>(
    symbol: &str,
    candles: &'a [Candle],
    interval: TimeFrame,
    entry_time: DateTime<Utc>,
    mode: LookAheadMode,
) -> Result<&'a [Candle]> {
    let mut end = candles.len();
    while end > 0 {
        let Some(close_time) = candles[end - 1].effective_close_time(interval) else {
            break;
        };
        if close_time < entry_time {
            break;
        }
        match mode {
            LookAheadMode::Strict => {
                return Err(EngineError::LookAhead {
                    symbol: symbol.to_string(),
                    interval: interval.as_str(),
                    close_time,
                    entry_time,
                })
            }
            LookAheadMode::Trim => end -= 1,
        }
    }
    Ok(&candles[..end])
}
