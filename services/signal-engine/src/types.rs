use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// OHLCV candle as delivered by the market-data layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    #[serde(default, alias = "time")]
    pub open_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub close_time: Option<DateTime<Utc>>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

impl Candle {
    pub fn new(
        open_time: DateTime<Utc>,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: Decimal,
    ) -> Self {
        Self {
            open_time: Some(open_time),
            close_time: None,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Close time used by the look-ahead guard.
    ///
    /// Explicit `close_time` wins, otherwise the bar is assumed to close one
    /// millisecond before the next interval opens.
    pub fn effective_close_time(&self, interval: TimeFrame) -> Option<DateTime<Utc>> {
        if let Some(close_time) = self.close_time {
            return Some(close_time);
        }
        self.open_time
            .map(|t| t + interval.duration() - Duration::milliseconds(1))
    }

    /// Timestamp used for calendar-day and session lookups
    pub fn anchor_time(&self) -> Option<DateTime<Utc>> {
        self.open_time.or(self.close_time)
    }
}

/// Candle intervals the engine consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeFrame {
    Minute5,
    Minute15,
}

impl TimeFrame {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeFrame::Minute5 => "5m",
            TimeFrame::Minute15 => "15m",
        }
    }

    pub fn to_seconds(&self) -> i64 {
        match self {
            TimeFrame::Minute5 => 300,
            TimeFrame::Minute15 => 900,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::seconds(self.to_seconds())
    }
}

/// Signal tiers, ordered from loosest to strictest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Watch,
    EarlyReady,
    ReadyToBuy,
    BestEntry,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Watch => "WATCH",
            Category::EarlyReady => "EARLY_READY",
            Category::ReadyToBuy => "READY_TO_BUY",
            Category::BestEntry => "BEST_ENTRY",
        }
    }

    /// Tiers whose category promises an executable trade plan
    pub fn requires_plan(&self) -> bool {
        matches!(self, Category::BestEntry | Category::ReadyToBuy)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Regime of the correlated reference asset (usually BTC on 15m)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketContext {
    pub reference_symbol: String,
    pub reference_bullish: bool,
    pub reference_bearish: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_rsi: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_delta_vwap_pct: Option<f64>,
}

impl MarketContext {
    pub fn new(reference_symbol: &str, bullish: bool, bearish: bool) -> Self {
        Self {
            reference_symbol: reference_symbol.to_string(),
            reference_bullish: bullish,
            reference_bearish: bearish,
            reference_price: None,
            reference_rsi: None,
            reference_delta_vwap_pct: None,
        }
    }

    pub fn bullish(reference_symbol: &str) -> Self {
        Self::new(reference_symbol, true, false)
    }

    pub fn bearish(reference_symbol: &str) -> Self {
        Self::new(reference_symbol, false, true)
    }
}

/// Core sensitivity knobs, bundled as a named preset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub name: String,
    /// Max distance of price from anchored VWAP, in percent
    pub vwap_distance_pct: f64,
    /// Minimum volume-spike ratio for the top tier
    pub vol_spike_x: f64,
    /// Max ATR% for the top tier
    pub atr_guard_pct: f64,
}

impl Thresholds {
    pub fn conservative() -> Self {
        Self {
            name: "conservative".to_string(),
            vwap_distance_pct: 0.20,
            vol_spike_x: 1.8,
            atr_guard_pct: 1.0,
        }
    }

    pub fn balanced() -> Self {
        Self {
            name: "balanced".to_string(),
            vwap_distance_pct: 0.35,
            vol_spike_x: 1.5,
            atr_guard_pct: 1.2,
        }
    }

    pub fn aggressive() -> Self {
        Self {
            name: "aggressive".to_string(),
            vwap_distance_pct: 0.60,
            vol_spike_x: 1.2,
            atr_guard_pct: 1.6,
        }
    }

    /// Look up a preset by name (case-insensitive)
    pub fn preset(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "conservative" => Ok(Self::conservative()),
            "balanced" => Ok(Self::balanced()),
            "aggressive" => Ok(Self::aggressive()),
            other => Err(EngineError::UnknownPreset(other.to_string())),
        }
    }

    /// Apply tuning overrides; the result keeps the preset name with a marker
    pub fn with_overrides(&self, overrides: &ThresholdOverrides) -> Self {
        if overrides.is_empty() {
            return self.clone();
        }
        Self {
            name: format!("{}+overrides", self.name),
            vwap_distance_pct: overrides.vwap_distance_pct.unwrap_or(self.vwap_distance_pct),
            vol_spike_x: overrides.vol_spike_x.unwrap_or(self.vol_spike_x),
            atr_guard_pct: overrides.atr_guard_pct.unwrap_or(self.atr_guard_pct),
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::balanced()
    }
}

/// Optional replacements for preset knobs, used by the tuning replayer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThresholdOverrides {
    #[serde(default)]
    pub vwap_distance_pct: Option<f64>,
    #[serde(default)]
    pub vol_spike_x: Option<f64>,
    #[serde(default)]
    pub atr_guard_pct: Option<f64>,
}

impl ThresholdOverrides {
    pub fn is_empty(&self) -> bool {
        self.vwap_distance_pct.is_none() && self.vol_spike_x.is_none() && self.atr_guard_pct.is_none()
    }
}

/// Why an evaluation produced no signal. These are not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Fewer bars than required, before or after look-ahead trimming
    InsufficientData,
    /// ATR below the liveliness floor, or non-finite VWAP/EMA/RSI
    DegenerateMarket,
    /// Not even the WATCH tier passed
    NoTierPassed,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::InsufficientData => "insufficient_data",
            SkipReason::DegenerateMarket => "degenerate_market",
            SkipReason::NoTierPassed => "no_tier_passed",
        }
    }
}

/// Error types for the signal engine
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("look-ahead violation for {symbol} ({interval}): candle closes at {close_time}, entry at {entry_time}")]
    LookAhead {
        symbol: String,
        interval: &'static str,
        close_time: DateTime<Utc>,
        entry_time: DateTime<Utc>,
    },

    #[error("invalid engine config: {0}")]
    InvalidConfig(String),

    #[error("config load failed: {0}")]
    Config(#[from] config::ConfigError),

    #[error("unknown threshold preset: {0}")]
    UnknownPreset(String),
}

/// Result type for signal engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_effective_close_time_fallbacks() {
        let open = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();
        let mut candle = Candle::new(
            open,
            Decimal::ONE,
            Decimal::ONE,
            Decimal::ONE,
            Decimal::ONE,
            Decimal::ONE,
        );

        let derived = candle.effective_close_time(TimeFrame::Minute5).unwrap();
        assert_eq!(derived, open + Duration::seconds(300) - Duration::milliseconds(1));

        let explicit = Utc.with_ymd_and_hms(2026, 3, 2, 10, 4, 0).unwrap();
        candle.close_time = Some(explicit);
        assert_eq!(candle.effective_close_time(TimeFrame::Minute5), Some(explicit));

        candle.open_time = None;
        candle.close_time = None;
        assert!(candle.effective_close_time(TimeFrame::Minute15).is_none());
    }

    #[test]
    fn test_candle_accepts_time_alias() {
        let json = r#"{"time":"2026-03-02T10:00:00Z","open":"1","high":"2","low":"0.5","close":"1.5","volume":"10"}"#;
        let candle: Candle = serde_json::from_str(json).unwrap();
        assert!(candle.open_time.is_some());
        assert!(candle.close_time.is_none());
    }

    #[test]
    fn test_category_ordering_and_serde() {
        assert!(Category::BestEntry > Category::ReadyToBuy);
        assert!(Category::ReadyToBuy > Category::EarlyReady);
        assert!(Category::EarlyReady > Category::Watch);
        assert_eq!(serde_json::to_string(&Category::ReadyToBuy).unwrap(), "\"READY_TO_BUY\"");
        assert!(Category::BestEntry.requires_plan());
        assert!(!Category::EarlyReady.requires_plan());
    }

    #[test]
    fn test_presets_and_overrides() {
        let balanced = Thresholds::preset("Balanced").unwrap();
        assert_eq!(balanced, Thresholds::default());
        assert!(Thresholds::preset("yolo").is_err());

        let tuned = balanced.with_overrides(&ThresholdOverrides {
            vol_spike_x: Some(2.0),
            ..Default::default()
        });
        assert_eq!(tuned.vol_spike_x, 2.0);
        assert_eq!(tuned.vwap_distance_pct, balanced.vwap_distance_pct);
        assert_eq!(tuned.name, "balanced+overrides");

        let untouched = balanced.with_overrides(&ThresholdOverrides::default());
        assert_eq!(untouched, balanced);
    }
}
