//! Tier selection
//!
//! `BEST_ENTRY -> READY_TO_BUY -> EARLY_READY -> WATCH -> none`. The first tier
//! whose gates all pass is selected. A plan-bearing tier without a valid plan
//! drops to EARLY_READY or WATCH, and the bear regime may then force WATCH.
//! Operates on a `FeatureSnapshot` only; the live engine and the replayer
//! both call `classify_features`.

use crate::config::EngineConfig;
use crate::features::FeatureSnapshot;
use crate::gates::{evaluate_tiers, highest_passing, TierGates};
use crate::regime::{apply_bear_override, RegimeDecision};
use crate::types::{Category, MarketContext, Thresholds};

/// Result of running the tier machine over one snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Final category after downgrade and regime override
    pub category: Category,
    /// Strictest tier whose gates passed
    pub selected: Category,
    /// Set when an invalid plan pushed `selected` down
    pub downgraded_from: Option<Category>,
    pub plan_valid: bool,
    pub regime: RegimeDecision,
    pub tiers: TierGates,
    pub reasons: Vec<String>,
}

impl Classification {
    pub fn blocked_by_regime(&self) -> bool {
        self.regime.would_be.is_some()
    }
}

fn plan_valid_for(f: &FeatureSnapshot, tier: Category, cfg: &EngineConfig) -> bool {
    f.plan
        .as_ref()
        .map(|p| p.is_valid(f.price, cfg.min_risk_pct, tier == Category::BestEntry))
        .unwrap_or(false)
}

/// Run gates, plan check and regime override. `None` means no tier applies.
pub fn classify_features(
    f: &FeatureSnapshot,
    t: &Thresholds,
    cfg: &EngineConfig,
    market: Option<&MarketContext>,
) -> Option<Classification> {
    let tiers = evaluate_tiers(f, t, cfg, market);
    let selected = highest_passing(&tiers)?;
    let plan_valid = plan_valid_for(f, selected, cfg);

    let (category, downgraded_from) = if selected.requires_plan() && !plan_valid {
        let fallback = [&tiers.early, &tiers.watch]
            .into_iter()
            .find(|set| set.passed())
            .map(|set| set.tier)?;
        (fallback, Some(selected))
    } else {
        (selected, None)
    };

    let mut reasons: Vec<String> = tiers
        .for_tier(category)
        .gates
        .iter()
        .map(|g| g.reason.clone())
        .collect();
    if let Some(from) = downgraded_from {
        let risk = f.plan.as_ref().map(|p| p.risk_pct);
        reasons.push(match risk {
            Some(r) => format!(
                "downgraded from {}: plan risk {:.3}% (floor {:.3}%)",
                from, r, cfg.min_risk_pct
            ),
            None => format!("downgraded from {}: no valid stop", from),
        });
    }

    let regime = apply_bear_override(category, f, t, cfg, market);
    if let Some(gate) = regime.btc_gate {
        let reference = market.map(|m| m.reference_symbol.as_str()).unwrap_or("reference");
        reasons.push(match regime.would_be {
            Some(would_be) => format!("{} bearish: {} forced to WATCH ({})", reference, would_be, gate.as_str()),
            None => format!("{} bearish: kept by {}", reference, gate.as_str()),
        });
    }

    Some(Classification {
        category: regime.category,
        selected,
        downgraded_from,
        plan_valid,
        regime,
        tiers,
        reasons,
    })
}
