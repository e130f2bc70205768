//! Threshold tuning replay
//!
//! Re-gates stored feature snapshots under alternate thresholds without
//! touching candles or indicators. Uses the same `classify_features` as the
//! live engine, so an unchanged config reproduces stored categories exactly.

use crate::classify::{classify_features, Classification};
use crate::config::EngineConfig;
use crate::features::FeatureSnapshot;
use crate::types::{Category, MarketContext, ThresholdOverrides, Thresholds};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// Re-run gates, downgrade and regime override over one snapshot
pub fn evaluate_snapshot(
    features: &FeatureSnapshot,
    thresholds: &Thresholds,
    config: &EngineConfig,
    market: Option<&MarketContext>,
) -> Option<Classification> {
    classify_features(features, thresholds, config, market)
}

/// One persisted evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayRecord {
    pub features: FeatureSnapshot,
    #[serde(default)]
    pub market: Option<MarketContext>,
    /// Category stored at scan time; `None` when nothing was emitted
    #[serde(default)]
    pub recorded_category: Option<Category>,
}

/// A snapshot whose category moved under the replayed thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayChange {
    pub symbol: String,
    pub recorded: Option<Category>,
    pub replayed: Option<Category>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplaySummary {
    pub preset: String,
    pub evaluated: usize,
    pub by_category: BTreeMap<Category, usize>,
    /// Snapshots that produced no signal
    pub rejected: usize,
    pub changed: Vec<ReplayChange>,
}

impl ReplaySummary {
    pub fn count(&self, category: Category) -> usize {
        self.by_category.get(&category).copied().unwrap_or(0)
    }
}

/// Replay `records` under `base` with `overrides` applied
pub fn replay_batch(
    records: &[ReplayRecord],
    base: &Thresholds,
    overrides: &ThresholdOverrides,
    config: &EngineConfig,
) -> ReplaySummary {
    let thresholds = base.with_overrides(overrides);
    let mut summary = ReplaySummary {
        preset: thresholds.name.clone(),
        ..ReplaySummary::default()
    };

    for record in records {
        summary.evaluated += 1;
        let replayed = evaluate_snapshot(&record.features, &thresholds, config, record.market.as_ref())
            .map(|c| c.category);
        match replayed {
            Some(category) => *summary.by_category.entry(category).or_insert(0) += 1,
            None => summary.rejected += 1,
        }
        if replayed != record.recorded_category {
            summary.changed.push(ReplayChange {
                symbol: record.features.symbol.clone(),
                recorded: record.recorded_category,
                replayed,
            });
        }
    }

    info!(
        preset = %summary.preset,
        evaluated = summary.evaluated,
        rejected = summary.rejected,
        changed = summary.changed.len(),
        "replay finished"
    );
    summary
}
