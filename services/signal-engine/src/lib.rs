//! Signal Engine Library
//!
//! Classifies a symbol's latest 5m bar into WATCH / EARLY_READY /
//! READY_TO_BUY / BEST_ENTRY from 5m and 15m candles, with a trade plan,
//! a reference-regime override and full gate introspection.

pub mod classify;
pub mod config;
pub mod confirm;
pub mod debug;
pub mod engine;
pub mod features;
pub mod gates;
pub mod indicators;
pub mod lookahead;
pub mod observability;
pub mod plan;
pub mod regime;
pub mod replay;
pub mod series;
pub mod signal;
pub mod sweep;
pub mod types;
pub mod vwap;

#[cfg(test)]
mod test_support;

// Re-export main types for convenience
pub use classify::{classify_features, Classification};
pub use crate::config::{EngineConfig, LookAheadMode};
pub use confirm::{ConfirmMode, Confirmation};
pub use debug::{build_gate_debug, GateDebug, GateSnapshot, TierDebug};
pub use engine::{ClassifyRequest, DetailedSignal, Outcome, SignalEngine};
pub use features::FeatureSnapshot;
pub use gates::{evaluate_tiers, GateResult, GateSet, TierGates};
pub use indicators::{IndicatorFeed, StandardIndicators};
pub use lookahead::guard_lookahead;
pub use observability::LogBudget;
pub use plan::{StopReason, TradePlan};
pub use regime::{assess_reference, BtcGate};
pub use replay::{evaluate_snapshot, replay_batch, ReplayRecord, ReplaySummary};
pub use signal::{Signal, SignalDebug};
pub use sweep::SweepResult;
pub use types::{
    Candle, Category, EngineError, MarketContext, Result, SkipReason, ThresholdOverrides,
    Thresholds, TimeFrame,
};
