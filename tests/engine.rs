//! Engine-level integration tests: registry stability, filtering, scoring
//! integration, the external candlestick adapter, and parallel scanning.

use swingscan::prelude::*;

#[derive(Debug, Clone, Copy)]
struct TestBar {
    o: f64,
    h: f64,
    l: f64,
    c: f64,
    v: f64,
}

impl TestBar {
    fn new(o: f64, h: f64, l: f64, c: f64) -> Self {
        Self {
            o,
            h,
            l,
            c,
            v: 1_000_000.0,
        }
    }

    fn with_volume(mut self, v: f64) -> Self {
        self.v = v;
        self
    }
}

impl OHLCV for TestBar {
    fn open(&self) -> f64 {
        self.o
    }

    fn high(&self) -> f64 {
        self.h
    }

    fn low(&self) -> f64 {
        self.l
    }

    fn close(&self) -> f64 {
        self.c
    }

    fn volume(&self) -> f64 {
        self.v
    }
}

fn flat(n: usize, close: f64) -> Vec<TestBar> {
    (0..n)
        .map(|_| TestBar::new(close - 0.2, close + 0.5, close - 0.5, close))
        .collect()
}

/// 251 quiet bars, then a +6% close on 4x volume.
fn burst_series() -> Vec<TestBar> {
    let mut bars = flat(251, 100.0);
    bars.push(TestBar::new(100.0, 106.5, 99.5, 106.0).with_volume(4_000_000.0));
    bars
}

// ============================================================
// REGISTRY
// ============================================================

#[test]
fn registry_ids_are_stable() {
    let engine = EngineBuilder::new().with_all_defaults().build().unwrap();
    let ids: Vec<&str> = engine.pattern_ids().iter().map(|id| id.as_str()).collect();

    // Persisted downstream as pattern keys: additions are fine, renames are not
    let expected = [
        "SUPERTREND_BULLISH",
        "SUPERTREND_RECENT",
        "SUPERTREND_FRESH",
        "CUP_AND_HANDLE",
        "ASCENDING_TRIANGLE",
        "DOUBLE_BOTTOM",
        "BULL_FLAG",
        "BEAR_FLAG",
        "MOMENTUM_BURST_1D",
        "MOMENTUM_BURST_3D",
        "MOMENTUM_BURST_5D",
        "EXPLOSIVE_VOLUME_3X",
        "EXPLOSIVE_VOLUME_5X",
        "EXPLOSIVE_VOLUME_10X",
        "VOLUME_SURGE_WITH_PRICE",
        "QULLAMAGGIE_BREAKOUT",
        "CDL_DOJI",
        "CDL_HAMMER",
        "CDL_SHOOTINGSTAR",
        "CDL_ENGULFING",
        "CDL_MORNINGSTAR",
        "CDL_EVENINGSTAR",
        "CDL_3WHITESOLDIERS",
        "CDL_3BLACKCROWS",
    ];
    assert_eq!(ids, expected);
    assert_eq!(swingscan::all_pattern_ids(), engine.pattern_ids());
}

// ============================================================
// SCANNING + SCORING
// ============================================================

#[test]
fn scan_scores_every_signal_in_range() {
    let engine = EngineBuilder::new().with_all_defaults().build().unwrap();
    let bars = burst_series();

    let results = engine.scan_symbol("BURST", &bars);
    assert!(!results.is_empty());

    let fired: Vec<&str> = results.iter().map(|r| r.pattern.as_str()).collect();
    assert!(fired.contains(&"MOMENTUM_BURST_1D"));
    assert!(fired.contains(&"EXPLOSIVE_VOLUME_3X"));
    assert!(!fired.contains(&"EXPLOSIVE_VOLUME_5X"));

    for result in &results {
        assert_eq!(result.symbol, "BURST");
        assert!(result.strength <= 100);
        assert_eq!(result.quality, engine.scorer().quality(result.strength));
        assert_eq!(result.direction, Direction::Bullish);
    }
}

#[test]
fn pattern_filter_limits_output() {
    let engine = EngineBuilder::new()
        .with_all_defaults()
        .only_patterns([PatternId("EXPLOSIVE_VOLUME_3X")])
        .build()
        .unwrap();

    let results = engine.scan_symbol("BURST", &burst_series());
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].pattern, PatternId("EXPLOSIVE_VOLUME_3X"));
}

#[test]
fn min_strength_filter_drops_weak_signals() {
    let open = EngineBuilder::new().with_all_defaults().build().unwrap();
    let strict = EngineBuilder::new()
        .with_all_defaults()
        .min_strength(101)
        .build()
        .unwrap();

    let bars = burst_series();
    assert!(!open.scan_symbol("BURST", &bars).is_empty());
    // Nothing can score above 100
    assert!(strict.scan_symbol("BURST", &bars).is_empty());
}

#[test]
fn custom_quality_bands_flow_through_results() {
    let bands = QualityBands {
        strong: 95,
        good: 90,
        moderate: 85,
        weak: 80,
    };
    let engine = EngineBuilder::new()
        .with_volume_defaults()
        .scorer(StrengthScorer::new(ScoreConfig::default(), bands))
        .build()
        .unwrap();

    for result in engine.scan_symbol("BURST", &burst_series()) {
        assert_eq!(result.quality, bands.classify(result.strength));
    }
}

// ============================================================
// EXTERNAL CANDLESTICK ADAPTER
// ============================================================

#[test]
fn external_candle_adapter_maps_sign() {
    let engine = EngineBuilder::new()
        .add_custom(ExternalCandleDetector::new(
            PatternId("EXT_ALWAYS_BULL"),
            1,
            |_bars| 100,
        ))
        .add_custom(ExternalCandleDetector::new(
            PatternId("EXT_ALWAYS_BEAR"),
            1,
            |_bars| -100,
        ))
        .add_custom(ExternalCandleDetector::new(
            PatternId("EXT_NEVER"),
            1,
            |_bars| 0,
        ))
        .build()
        .unwrap();

    let results = engine.scan_symbol("EXT", &flat(30, 100.0));
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].pattern, PatternId("EXT_ALWAYS_BULL"));
    assert_eq!(results[0].direction, Direction::Bullish);
    assert_eq!(results[1].pattern, PatternId("EXT_ALWAYS_BEAR"));
    assert_eq!(results[1].direction, Direction::Bearish);
}

#[test]
fn external_candle_adapter_reads_latest_bar() {
    // Scorer keyed off the latest bar's close vs open
    let engine = EngineBuilder::new()
        .add_custom(ExternalCandleDetector::new(
            PatternId("EXT_LAST_BAR"),
            2,
            |bars| {
                let last = bars.last().expect("min_bars enforced");
                if last.close() > last.open() {
                    100
                } else if last.close() < last.open() {
                    -100
                } else {
                    0
                }
            },
        ))
        .build()
        .unwrap();

    let mut bars = flat(10, 100.0);
    bars.push(TestBar::new(100.0, 103.0, 99.5, 102.0));
    let results = engine.scan_symbol("EXT", &bars);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].direction, Direction::Bullish);
}

// ============================================================
// PARAMETERIZED CONSTRUCTION
// ============================================================

#[test]
fn breakout_with_params_overrides_defaults() {
    let mut params = std::collections::HashMap::new();
    params.insert("lookback", 30.0);
    params.insert("volume_multiplier", 2.0);

    let detector = QullamaggieBreakoutDetector::with_params(&params).unwrap();
    assert_eq!(detector.lookback.get(), 30);
    assert_eq!(detector.volume_multiplier, 2.0);
    assert_eq!(PatternDetector::min_bars(&detector), 50);

    assert_eq!(
        QullamaggieBreakoutDetector::pattern_id_str(),
        "QULLAMAGGIE_BREAKOUT"
    );
}

#[test]
fn with_params_rejects_invalid_values() {
    let mut params = std::collections::HashMap::new();
    params.insert("volume_multiplier", -1.0);
    assert!(QullamaggieBreakoutDetector::with_params(&params).is_err());

    let mut params = std::collections::HashMap::new();
    params.insert("cup_depth_min", 1.5);
    assert!(CupAndHandleDetector::with_params(&params).is_err());
}

#[test]
fn add_checked_rejects_bad_config() {
    let detector = QullamaggieBreakoutDetector {
        volume_multiplier: f64::NAN,
        ..QullamaggieBreakoutDetector::default()
    };
    assert!(EngineBuilder::new()
        .add_checked(BuiltinDetector::Breakout(detector))
        .is_err());
}

// ============================================================
// PARALLEL SCAN
// ============================================================

#[test]
fn parallel_scan_covers_the_universe() {
    let engine = EngineBuilder::new().with_all_defaults().build().unwrap();

    let burst = burst_series();
    let quiet = flat(100, 50.0);
    let short = flat(5, 10.0);

    let instruments: Vec<(&str, &[TestBar])> =
        vec![("BURST", &burst), ("QUIET", &quiet), ("SHORT", &short)];

    let (scans, errors) = scan_parallel(&engine, instruments);
    assert!(errors.is_empty());
    assert_eq!(scans.len(), 3);

    let burst_scan = scans.iter().find(|s| s.symbol == "BURST").unwrap();
    assert!(!burst_scan.results.is_empty());

    let short_scan = scans.iter().find(|s| s.symbol == "SHORT").unwrap();
    assert!(short_scan.results.is_empty());
}
