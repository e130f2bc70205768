//! Signal engine: candles in, categorized signal out

use crate::classify::{classify_features, Classification};
use crate::config::EngineConfig;
use crate::features::{self, FeatureSnapshot};
use crate::gates::TierGates;
use crate::indicators::{IndicatorFeed, StandardIndicators};
use crate::lookahead::guard_lookahead;
use crate::observability::{Diagnostics, LogBudget};
use crate::signal::Signal;
use crate::types::{Candle, MarketContext, Result, SkipReason, Thresholds, TimeFrame};
use chrono::{DateTime, Utc};
use tracing::debug;

/// One classification call
#[derive(Debug, Clone)]
pub struct ClassifyRequest<'a> {
    pub symbol: &'a str,
    pub candles_5m: &'a [Candle],
    pub candles_15m: &'a [Candle],
    pub thresholds: &'a Thresholds,
    pub market: Option<&'a MarketContext>,
    /// Assumed order time; enables the look-ahead guard
    pub entry_time: Option<DateTime<Utc>>,
}

impl<'a> ClassifyRequest<'a> {
    pub fn new(
        symbol: &'a str,
        candles_5m: &'a [Candle],
        candles_15m: &'a [Candle],
        thresholds: &'a Thresholds,
    ) -> Self {
        Self {
            symbol,
            candles_5m,
            candles_15m,
            thresholds,
            market: None,
            entry_time: None,
        }
    }

    pub fn with_market(mut self, market: &'a MarketContext) -> Self {
        self.market = Some(market);
        self
    }

    pub fn with_entry_time(mut self, entry_time: DateTime<Utc>) -> Self {
        self.entry_time = Some(entry_time);
        self
    }
}

/// Signal plus everything needed to store and replay it
#[derive(Debug, Clone)]
pub struct DetailedSignal {
    pub signal: Signal,
    pub features: FeatureSnapshot,
    pub gates: TierGates,
}

#[derive(Debug, Clone)]
pub enum Outcome {
    Skipped(SkipReason),
    Emitted(Box<DetailedSignal>),
}

impl Outcome {
    pub fn signal(&self) -> Option<&Signal> {
        match self {
            Outcome::Emitted(detail) => Some(&detail.signal),
            Outcome::Skipped(_) => None,
        }
    }

    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            Outcome::Skipped(reason) => Some(*reason),
            Outcome::Emitted(_) => None,
        }
    }

    pub fn into_signal(self) -> Option<Signal> {
        match self {
            Outcome::Emitted(detail) => Some(detail.signal),
            Outcome::Skipped(_) => None,
        }
    }
}

/// Stateless classifier. Safe to share across threads; each call is independent.
pub struct SignalEngine {
    config: EngineConfig,
    indicators: Box<dyn IndicatorFeed>,
    log_budget: Option<LogBudget>,
}

impl SignalEngine {
    /// Validates `config` and uses the standard indicator feed
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            indicators: Box::new(StandardIndicators),
            log_budget: None,
        })
    }

    pub fn with_indicators(mut self, indicators: Box<dyn IndicatorFeed>) -> Self {
        self.indicators = indicators;
        self
    }

    /// Enable rate-limited diagnostics
    pub fn with_log_budget(mut self, budget: LogBudget) -> Self {
        self.log_budget = Some(budget);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn indicators(&self) -> &dyn IndicatorFeed {
        self.indicators.as_ref()
    }

    /// Classify the latest bar; `Ok(None)` when the symbol is skipped
    pub fn classify(&self, req: &ClassifyRequest<'_>) -> Result<Option<Signal>> {
        Ok(self.classify_detailed(req)?.into_signal())
    }

    /// Classify and keep the feature snapshot and gate sets.
    ///
    /// Only a strict-mode look-ahead violation is an error; every other
    /// reason to stay silent comes back as `Outcome::Skipped`.
    pub fn classify_detailed(&self, req: &ClassifyRequest<'_>) -> Result<Outcome> {
        let diag = Diagnostics::new(self.log_budget.as_ref());

        let (candles_5m, candles_15m) = match req.entry_time {
            Some(entry) => {
                let c5 = guard_lookahead(req.symbol, req.candles_5m, TimeFrame::Minute5, entry, self.config.lookahead_mode)?;
                let c15 = guard_lookahead(req.symbol, req.candles_15m, TimeFrame::Minute15, entry, self.config.lookahead_mode)?;
                if c5.len() < req.candles_5m.len() {
                    diag.trimmed(req.symbol, TimeFrame::Minute5.as_str(), req.candles_5m.len() - c5.len());
                }
                if c15.len() < req.candles_15m.len() {
                    diag.trimmed(req.symbol, TimeFrame::Minute15.as_str(), req.candles_15m.len() - c15.len());
                }
                (c5, c15)
            }
            None => (req.candles_5m, req.candles_15m),
        };

        let features = match features::compute(
            req.symbol,
            candles_5m,
            candles_15m,
            self.indicators.as_ref(),
            &self.config,
            &diag,
        ) {
            Ok(features) => features,
            Err(reason) => {
                diag.skipped(req.symbol, reason.as_str());
                return Ok(Outcome::Skipped(reason));
            }
        };

        let Some(classification) = classify_features(&features, req.thresholds, &self.config, req.market) else {
            diag.skipped(req.symbol, SkipReason::NoTierPassed.as_str());
            return Ok(Outcome::Skipped(SkipReason::NoTierPassed));
        };

        if let Some(would_be) = classification.regime.would_be {
            diag.regime_override(req.symbol, would_be.as_str());
        }
        debug!(
            symbol = %req.symbol,
            category = ?classification.category,
            price = features.price,
            "signal classified"
        );

        Ok(Outcome::Emitted(Box::new(self.detail(features, classification, req.thresholds))))
    }

    fn detail(&self, features: FeatureSnapshot, c: Classification, thresholds: &Thresholds) -> DetailedSignal {
        let signal = Signal::build(&features, &c, &thresholds.name);
        DetailedSignal {
            signal,
            features,
            gates: c.tiers,
        }
    }
}
