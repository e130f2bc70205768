//! End-to-end classification scenarios
//!
//! Real candles, VWAP, sweep and plan logic; indicator values come from a
//! scripted feed so each scenario pins RSI, ATR and volume exactly.


use chrono::Duration;
use fixtures::{confirming_15m, last_open, sweep_5m, ScriptedFeed};
use signal_engine::{
    evaluate_snapshot, BtcGate, Category, ClassifyRequest, ConfirmMode, EngineConfig, EngineError,
    LogBudget, LookAheadMode, MarketContext, Outcome, SignalEngine, SkipReason, StopReason,
    Thresholds,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn engine(config: EngineConfig) -> SignalEngine {
    SignalEngine::new(config)
        .unwrap()
        .with_indicators(Box::new(ScriptedFeed::clean_setup()))
}

#[test]
fn test_clean_best_entry() {
    init_tracing();
    let engine = engine(EngineConfig::default());
    let (c5, c15) = (sweep_5m(300), confirming_15m());
    let t = Thresholds::balanced();
    let market = MarketContext::bullish("BTCUSDT");
    let req = ClassifyRequest::new("SOLUSDT", &c5, &c15, &t).with_market(&market);

    let signal = engine.classify(&req).unwrap().expect("signal");
    assert_eq!(signal.category, Category::BestEntry);
    assert_eq!(signal.stop_reason, Some(StopReason::SweepLow));
    assert!((signal.stop.unwrap() - 99.5).abs() < 1e-9);
    assert!(signal.rr.unwrap() >= 2.0 - 1e-9);
    assert!(signal.confirm15m);
    assert!(!signal.blocked_by_btc);
    assert_eq!(signal.btc_gate, None);
    assert_eq!(signal.debug.confirm15_mode, ConfirmMode::Strict);
    assert_eq!(signal.debug.tiers.best.gate_score, 100);
    assert!((signal.vwap - 17_999.65 / 180.0).abs() < 1e-6);
    assert!(signal.gate_snapshot.best.values().all(|ok| *ok));
}

#[test]
fn test_bear_override_downgrade() {
    let engine = engine(EngineConfig::default());
    let (c5, c15) = (sweep_5m(300), confirming_15m());
    let t = Thresholds::balanced();
    let market = MarketContext::bearish("BTCUSDT");
    let req = ClassifyRequest::new("SOLUSDT", &c5, &c15, &t).with_market(&market);

    let signal = engine.classify(&req).unwrap().expect("signal");
    assert_eq!(signal.category, Category::Watch);
    assert_eq!(signal.would_be_category, Some(Category::BestEntry));
    assert_eq!(signal.btc_gate, Some(BtcGate::FailBear));
    assert!(signal.blocked_by_btc);

    let json = serde_json::to_value(&signal).unwrap();
    assert_eq!(json["would_be_category"], "BEST_ENTRY");
    assert_eq!(json["btc_gate"], "FAIL_BEAR");
}

#[test]
fn test_missing_market_caps_at_early() {
    let engine = engine(EngineConfig::default());
    let (c5, c15) = (sweep_5m(300), confirming_15m());
    let t = Thresholds::balanced();
    let req = ClassifyRequest::new("SOLUSDT", &c5, &c15, &t);

    let signal = engine.classify(&req).unwrap().expect("signal");
    assert_eq!(signal.category, Category::EarlyReady);
    assert_eq!(signal.debug.tiers.best.first_failed_gate.as_deref(), Some("has_market"));
    assert_eq!(signal.gate_snapshot.ready.get("has_market"), Some(&false));
}

#[test]
fn test_insufficient_data() {
    let engine = engine(EngineConfig::default());
    let (c5, c15) = (sweep_5m(150), confirming_15m());
    let t = Thresholds::balanced();
    let market = MarketContext::bullish("BTCUSDT");
    let req = ClassifyRequest::new("SOLUSDT", &c5, &c15, &t).with_market(&market);

    assert!(engine.classify(&req).unwrap().is_none());
    let outcome = engine.classify_detailed(&req).unwrap();
    assert_eq!(outcome.skip_reason(), Some(SkipReason::InsufficientData));
}

#[test]
fn test_risk_floor_downgrades_best() {
    // 0.75 / 100.25 = 0.748% risk, under a 1% floor
    let config = EngineConfig {
        min_risk_pct: 1.0,
        ..EngineConfig::default()
    };
    let engine = engine(config);
    let (c5, c15) = (sweep_5m(300), confirming_15m());
    let t = Thresholds::balanced();
    let market = MarketContext::bullish("BTCUSDT");
    let req = ClassifyRequest::new("SOLUSDT", &c5, &c15, &t).with_market(&market);

    let signal = engine.classify(&req).unwrap().expect("signal");
    assert_eq!(signal.category, Category::EarlyReady);
    assert_eq!(signal.debug.downgraded_from, Some(Category::BestEntry));
    assert!(!signal.debug.plan_valid);
    assert!(!signal.is_actionable());
}

#[test]
fn test_invalid_plan_snapshot_downgrades_ready() {
    let engine = engine(EngineConfig::default());
    let (c5, c15) = (sweep_5m(300), confirming_15m());
    let t = Thresholds::balanced();
    let market = MarketContext::bullish("BTCUSDT");
    let req = ClassifyRequest::new("SOLUSDT", &c5, &c15, &t).with_market(&market);

    let Outcome::Emitted(detail) = engine.classify_detailed(&req).unwrap() else {
        panic!("expected a signal");
    };
    let mut features = detail.features.clone();
    // Out of BEST's ATR guard, still READY; then a 0.1% risk plan
    features.atr_pct = 1.3;
    if let Some(plan) = features.plan.as_mut() {
        plan.risk_pct = 0.1;
    }

    let c = evaluate_snapshot(&features, &t, engine.config(), Some(&market)).unwrap();
    assert_eq!(c.selected, Category::ReadyToBuy);
    assert_eq!(c.category, Category::EarlyReady);
    assert_eq!(c.downgraded_from, Some(Category::ReadyToBuy));
}

#[test]
fn test_strict_lookahead_rejects_open_candle() {
    let config = EngineConfig {
        lookahead_mode: LookAheadMode::Strict,
        ..EngineConfig::default()
    };
    let engine = engine(config);
    let (c5, c15) = (sweep_5m(300), confirming_15m());
    let t = Thresholds::balanced();
    let entry = last_open(&c5) + Duration::minutes(2);
    let req = ClassifyRequest::new("SOLUSDT", &c5, &c15, &t).with_entry_time(entry);

    match engine.classify(&req) {
        Err(EngineError::LookAhead { symbol, interval, .. }) => {
            assert_eq!(symbol, "SOLUSDT");
            assert_eq!(interval, "5m");
        }
        other => panic!("expected look-ahead error, got {:?}", other),
    }
}

#[test]
fn test_trim_lookahead_drops_open_candles() {
    let engine = engine(EngineConfig::default());
    let (c5, c15) = (sweep_5m(300), confirming_15m());
    let t = Thresholds::balanced();
    let market = MarketContext::bullish("BTCUSDT");
    let entry = last_open(&c5) + Duration::minutes(2);
    let req = ClassifyRequest::new("SOLUSDT", &c5, &c15, &t)
        .with_market(&market)
        .with_entry_time(entry);

    let signal = engine.classify(&req).unwrap().expect("signal");
    assert!(signal.as_of.unwrap() < entry);
    // The reclaim bar was still open, so the price is the prior close
    assert!((signal.price - 99.7).abs() < 1e-9);
    assert_ne!(signal.category, Category::BestEntry);

    // A closed last bar is left alone
    let after_close = last_open(&c5) + Duration::minutes(5);
    let req = ClassifyRequest::new("SOLUSDT", &c5, &c15, &t)
        .with_market(&market)
        .with_entry_time(after_close);
    let signal = engine.classify(&req).unwrap().expect("signal");
    assert_eq!(signal.category, Category::BestEntry);
}

#[test]
fn test_detailed_outcome_replays_identically() {
    let engine = engine(EngineConfig::default());
    let (c5, c15) = (sweep_5m(300), confirming_15m());
    let t = Thresholds::balanced();
    let market = MarketContext::bearish("BTCUSDT");
    let req = ClassifyRequest::new("SOLUSDT", &c5, &c15, &t).with_market(&market);

    let Outcome::Emitted(detail) = engine.classify_detailed(&req).unwrap() else {
        panic!("expected a signal");
    };
    let stored = serde_json::to_string(&detail.features).unwrap();
    let restored = serde_json::from_str(&stored).unwrap();

    let c = evaluate_snapshot(&restored, &t, engine.config(), Some(&market)).unwrap();
    assert_eq!(c.tiers, detail.gates);
    assert_eq!(c.category, detail.signal.category);
    assert_eq!(c.regime.would_be, detail.signal.would_be_category);
}

#[test]
fn test_replay_matches_live_under_deeper_sweep_floor() {
    let (c5, c15) = (sweep_5m(300), confirming_15m());
    let t = Thresholds::balanced();
    let market = MarketContext::bullish("BTCUSDT");
    let req = ClassifyRequest::new("SOLUSDT", &c5, &c15, &t).with_market(&market);

    let Outcome::Emitted(detail) = engine(EngineConfig::default()).classify_detailed(&req).unwrap() else {
        panic!("expected a signal");
    };
    assert_eq!(detail.signal.category, Category::BestEntry);

    let deeper = EngineConfig {
        sweep_min_depth_pct: 0.5,
        sweep_depth_cap_pct: 0.6,
        ..EngineConfig::default()
    };
    let live = engine(deeper.clone()).classify(&req).unwrap().map(|s| s.category);
    let replayed = evaluate_snapshot(&detail.features, &t, &deeper, Some(&market)).map(|c| c.category);
    assert_eq!(live, replayed);
    assert_eq!(replayed, Some(Category::EarlyReady));
}

#[test]
fn test_log_budget_is_consumed() {
    init_tracing();
    let budget = LogBudget::new(1, std::time::Duration::from_secs(3600));
    let engine = engine(EngineConfig::default()).with_log_budget(budget.clone());
    let (c5, c15) = (sweep_5m(300), confirming_15m());
    let t = Thresholds::balanced();
    let market = MarketContext::bearish("BTCUSDT");
    let req = ClassifyRequest::new("SOLUSDT", &c5, &c15, &t).with_market(&market);

    assert_eq!(budget.remaining(), 1);
    let signal = engine.classify(&req).unwrap().expect("signal");
    assert_eq!(signal.category, Category::Watch);
    assert_eq!(budget.remaining(), 0);
}
