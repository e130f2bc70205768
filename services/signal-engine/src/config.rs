//! Engine configuration
//!
//! Every tunable knob lives in one flat, immutable struct. It is read from the
//! environment (prefix `SIGNAL_ENGINE_`) and validated once, then handed to the
//! engine by value. Nothing here is consulted as global state.

use crate::observability::LogBudget;
use crate::types::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment prefix for config overrides
pub const ENV_PREFIX: &str = "SIGNAL_ENGINE";

/// How the look-ahead guard treats candles closing at or after entry time
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LookAheadMode {
    /// Drop leaking trailing candles
    #[default]
    Trim,
    /// Fail the evaluation with `EngineError::LookAhead`
    Strict,
}

/// Complete engine configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    // Data requirements
    pub min_bars: usize,
    pub lookahead_mode: LookAheadMode,
    pub vwap_fallback_bars_5m: usize,
    pub vwap_fallback_bars_15m: usize,
    /// ATR% below this means the market is too dead to trade
    pub min_atr_pct: f64,

    // Indicator periods
    pub ema_period: usize,
    pub rsi_period: usize,
    pub atr_period: usize,
    pub vol_spike_period: usize,

    // Session window (UTC hours, end exclusive, wraps past midnight)
    pub session_filter: bool,
    pub session_start_hour_utc: u32,
    pub session_end_hour_utc: u32,

    // BEST_ENTRY
    pub best_rsi_min: f64,
    pub best_rsi_max: f64,
    pub best_min_body_ratio: f64,
    pub best_min_rr: f64,

    // READY_TO_BUY (multipliers are relative to the preset)
    pub ready_rsi_min: f64,
    pub ready_rsi_max: f64,
    pub ready_vwap_mult: f64,
    pub ready_atr_mult: f64,
    pub ready_vol_mult: f64,
    pub ready_min_body_ratio: f64,
    pub ready_no_sweep_fallback: bool,
    pub ready_no_sweep_vwap_pct: f64,

    // EARLY_READY
    pub early_rsi_min: f64,
    pub early_rsi_max: f64,
    pub early_vwap_mult: f64,
    pub early_atr_mult: f64,
    pub early_vol_mult: f64,

    // WATCH
    pub watch_rsi_min: f64,
    pub watch_rsi_max: f64,
    pub watch_vwap_mult: f64,
    pub watch_atr_mult: f64,

    // Liquidity sweep
    pub sweep_lookback: usize,
    pub sweep_window: usize,
    pub sweep_min_depth_pct: f64,
    pub sweep_depth_cap_pct: f64,
    pub sweep_depth_atr_mult: f64,

    // Trade plan
    pub stop_floor_atr_mult: f64,
    pub stop_atr_mult: f64,
    pub min_risk_pct: f64,

    // 15m confirmation
    pub confirm_rsi_min: f64,
    pub confirm_rsi_max: f64,
    pub soft_vwap_window: usize,
    pub soft_vwap_eps_pct: f64,
    pub soft_ema_tolerance_pct: f64,
    pub soft_rsi_floor: f64,
    pub soft_rsi_fall_eps: f64,

    // Bear gate
    pub bear_gate_reclaim_bars: usize,
    pub bear_gate_rsi_floor: f64,
    pub bear_gate_vol_mult: f64,

    // Diagnostics budget
    pub diag_max_events: u32,
    pub diag_window_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_bars: 210,
            lookahead_mode: LookAheadMode::Trim,
            vwap_fallback_bars_5m: 288,
            vwap_fallback_bars_15m: 96,
            min_atr_pct: 0.08,

            ema_period: 200,
            rsi_period: 9,
            atr_period: 14,
            vol_spike_period: 20,

            session_filter: true,
            session_start_hour_utc: 6,
            session_end_hour_utc: 22,

            best_rsi_min: 55.0,
            best_rsi_max: 72.0,
            best_min_body_ratio: 0.25,
            best_min_rr: 2.0,

            ready_rsi_min: 50.0,
            ready_rsi_max: 75.0,
            ready_vwap_mult: 1.5,
            ready_atr_mult: 1.2,
            ready_vol_mult: 0.8,
            ready_min_body_ratio: 0.0,
            ready_no_sweep_fallback: true,
            ready_no_sweep_vwap_pct: 0.15,

            early_rsi_min: 45.0,
            early_rsi_max: 78.0,
            early_vwap_mult: 2.5,
            early_atr_mult: 1.5,
            early_vol_mult: 0.6,

            watch_rsi_min: 40.0,
            watch_rsi_max: 80.0,
            watch_vwap_mult: 4.0,
            watch_atr_mult: 2.0,

            sweep_lookback: 20,
            sweep_window: 3,
            sweep_min_depth_pct: 0.10,
            sweep_depth_cap_pct: 0.60,
            sweep_depth_atr_mult: 0.25,

            stop_floor_atr_mult: 1.5,
            stop_atr_mult: 1.0,
            min_risk_pct: 0.20,

            confirm_rsi_min: 55.0,
            confirm_rsi_max: 80.0,
            soft_vwap_window: 32,
            soft_vwap_eps_pct: 0.15,
            soft_ema_tolerance_pct: 0.25,
            soft_rsi_floor: 48.0,
            soft_rsi_fall_eps: 0.5,

            bear_gate_reclaim_bars: 3,
            bear_gate_rsi_floor: 62.0,
            bear_gate_vol_mult: 1.5,

            diag_max_events: 20,
            diag_window_secs: 60,
        }
    }
}

impl EngineConfig {
    /// Load from `.env` + process environment, falling back to defaults
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let settings = config::Config::builder()
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;
        let cfg: EngineConfig = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Convenience wrapper for binaries that report errors through anyhow
    pub fn from_env() -> anyhow::Result<Self> {
        use anyhow::Context;
        Self::load().context("loading signal engine config from environment")
    }

    /// Check ranges and the tier nesting that keeps categories monotonic
    pub fn validate(&self) -> Result<()> {
        let mut problems: Vec<String> = Vec::new();
        let mut check = |ok: bool, msg: &str| {
            if !ok {
                problems.push(msg.to_string());
            }
        };

        check(self.ema_period > 0 && self.rsi_period > 0, "indicator periods must be positive");
        check(self.atr_period > 0 && self.vol_spike_period > 0, "indicator periods must be positive");
        check(self.min_bars > self.ema_period, "min_bars must exceed ema_period");
        check(
            self.min_bars > self.sweep_lookback + self.sweep_window,
            "min_bars must cover the sweep lookback",
        );
        check((1..=3).contains(&self.sweep_window), "sweep_window must be 1..=3");
        check(self.sweep_lookback > 0, "sweep_lookback must be positive");
        check(self.vwap_fallback_bars_5m > 0 && self.vwap_fallback_bars_15m > 0, "vwap fallback windows must be positive");
        check(self.soft_vwap_window > 0, "soft_vwap_window must be positive");
        check(
            self.session_start_hour_utc < 24 && self.session_end_hour_utc < 24,
            "session hours must be 0..24",
        );
        check(self.min_atr_pct >= 0.0, "min_atr_pct must be non-negative");
        check(self.min_risk_pct > 0.0, "min_risk_pct must be positive");
        check(self.stop_atr_mult > 0.0 && self.stop_floor_atr_mult > 0.0, "stop multipliers must be positive");
        check(
            self.sweep_min_depth_pct >= 0.0 && self.sweep_depth_cap_pct >= self.sweep_min_depth_pct,
            "sweep depth cap must be at least the static floor",
        );

        // Each looser tier must contain the stricter one
        check(self.best_rsi_min < self.best_rsi_max, "best RSI band is empty");
        check(
            self.ready_rsi_min <= self.best_rsi_min && self.ready_rsi_max >= self.best_rsi_max,
            "ready RSI band must contain best band",
        );
        check(
            self.early_rsi_min <= self.ready_rsi_min && self.early_rsi_max >= self.ready_rsi_max,
            "early RSI band must contain ready band",
        );
        check(
            self.watch_rsi_min <= self.early_rsi_min && self.watch_rsi_max >= self.early_rsi_max,
            "watch RSI band must contain early band",
        );
        check(
            1.0 <= self.ready_vwap_mult
                && self.ready_vwap_mult <= self.early_vwap_mult
                && self.early_vwap_mult <= self.watch_vwap_mult,
            "vwap multipliers must widen from ready to watch",
        );
        check(
            1.0 <= self.ready_atr_mult
                && self.ready_atr_mult <= self.early_atr_mult
                && self.early_atr_mult <= self.watch_atr_mult,
            "atr multipliers must widen from ready to watch",
        );
        check(
            self.early_vol_mult <= self.ready_vol_mult && self.ready_vol_mult <= 1.0,
            "volume multipliers must loosen from best to early",
        );
        check(self.ready_min_body_ratio <= self.best_min_body_ratio, "ready body ratio must not exceed best");
        check(self.confirm_rsi_min < self.confirm_rsi_max, "confirm RSI band is empty");
        check(self.soft_rsi_floor < self.confirm_rsi_max, "soft RSI floor must sit below the strict cap");

        if problems.is_empty() {
            Ok(())
        } else {
            Err(EngineError::InvalidConfig(problems.join("; ")))
        }
    }

    /// Build the diagnostics budget described by this config
    pub fn log_budget(&self) -> LogBudget {
        LogBudget::new(self.diag_max_events, Duration::from_secs(self.diag_window_secs))
    }
}
