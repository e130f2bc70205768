//! Gate introspection for UIs and tuning

use crate::gates::{GateSet, TierGates};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Why a single tier did or did not pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateDebug {
    /// Reasons of every failing gate, in gate order
    pub blocked_reasons: Vec<String>,
    /// Key of the first failing gate
    pub first_failed_gate: Option<String>,
    /// Percent of gates passing, rounded to an integer
    pub gate_score: u8,
}

pub fn build_gate_debug(set: &GateSet) -> GateDebug {
    let total = set.gates.len();
    let passing = set.gates.iter().filter(|g| g.ok).count();
    let gate_score = if total == 0 {
        100
    } else {
        ((passing as f64 / total as f64) * 100.0).round() as u8
    };
    GateDebug {
        blocked_reasons: set
            .gates
            .iter()
            .filter(|g| !g.ok)
            .map(|g| g.reason.clone())
            .collect(),
        first_failed_gate: set.gates.iter().find(|g| !g.ok).map(|g| g.key.clone()),
        gate_score,
    }
}

/// Pass/fail map for each tier, keyed by gate key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateSnapshot {
    pub best: BTreeMap<String, bool>,
    pub ready: BTreeMap<String, bool>,
    pub early: BTreeMap<String, bool>,
    pub watch: BTreeMap<String, bool>,
}

fn pass_map(set: &GateSet) -> BTreeMap<String, bool> {
    set.gates.iter().map(|g| (g.key.clone(), g.ok)).collect()
}

impl From<&TierGates> for GateSnapshot {
    fn from(tiers: &TierGates) -> Self {
        Self {
            best: pass_map(&tiers.best),
            ready: pass_map(&tiers.ready),
            early: pass_map(&tiers.early),
            watch: pass_map(&tiers.watch),
        }
    }
}

/// Per-tier debug entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierDebug {
    pub best: GateDebug,
    pub ready: GateDebug,
    pub early: GateDebug,
    pub watch: GateDebug,
}

impl From<&TierGates> for TierDebug {
    fn from(tiers: &TierGates) -> Self {
        Self {
            best: build_gate_debug(&tiers.best),
            ready: build_gate_debug(&tiers.ready),
            early: build_gate_debug(&tiers.early),
            watch: build_gate_debug(&tiers.watch),
        }
    }
}
