//! # swingscan - stock pattern screening engine
//!
//! Pattern detection and strength scoring over daily OHLCV bar series.
//!
//! A family of independent detectors (SuperTrend flips, chart shapes,
//! momentum bursts, volume spikes, multi-condition breakouts, candlestick
//! patterns) each evaluates the *latest* bar of a series and yields a
//! directional signal. The [`score::StrengthScorer`] then fuses volume,
//! trend, oscillator, volatility and consolidation context into a single
//! 0-100 strength score with a quality label, so heterogeneous signals can
//! be ranked and filtered downstream.
//!
//! ## Quick Start
//!
//! ```rust
//! use swingscan::prelude::*;
//!
//! // Define your OHLCV data (or use the provided `Bar`)
//! struct Candle { o: f64, h: f64, l: f64, c: f64, v: f64 }
//!
//! impl OHLCV for Candle {
//!     fn open(&self) -> f64 { self.o }
//!     fn high(&self) -> f64 { self.h }
//!     fn low(&self) -> f64 { self.l }
//!     fn close(&self) -> f64 { self.c }
//!     fn volume(&self) -> f64 { self.v }
//! }
//!
//! // Create engine with every builtin detector
//! let engine = EngineBuilder::new()
//!     .with_all_defaults()
//!     .build()
//!     .unwrap();
//!
//! // Scan one symbol's daily history
//! let bars: Vec<Candle> = vec![];
//! let results = engine.scan_symbol("AAPL", &bars);
//! ```
//!
//! Detection is batch, end-of-bar only. The engine holds no per-symbol
//! state and performs no I/O; loading bars and persisting [`ScoredResult`]s
//! belong to the caller.

pub mod detectors;
pub mod indicators;
pub mod params;
pub mod score;
pub mod supertrend;

pub mod prelude {
    pub use crate::{
        // Registry
        all_pattern_ids,
        // Detectors
        detectors::*,
        // Parameters
        params::{get_period, get_ratio, get_value, ParamMeta, ParamType, ParameterizedDetector},
        // Scoring
        score::{Quality, QualityBands, ScoreConfig, StrengthScorer},
        // Parallel
        scan_parallel,
        // Trend state
        supertrend::{supertrend, TrendPoint},
        // Engine
        BuiltinDetector,
        // Types
        Bar,
        Direction,
        // Core traits
        DynPatternDetector,
        EngineBuilder,
        OHLCVExt,
        PatternDetector,
        PatternId,
        Period,
        Ratio,
        Result,
        ScanEngine,
        // Errors
        ScanError,
        ScoredResult,
        SymbolError,
        SymbolScan,
        OHLCV,
    };
}

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, ScanError>;

/// Errors from configuration and input validation.
///
/// Detection itself never returns these: detectors degrade to "no signal"
/// and the scorer falls back to a neutral score (see [`score`]).
#[derive(Debug, Clone, thiserror::Error)]
pub enum ScanError {
    #[error("Invalid value: {0}")]
    InvalidValue(&'static str),

    #[error("{field} = {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Insufficient data: need {need} bars, got {got}")]
    InsufficientData { need: usize, got: usize },

    #[error("Invalid OHLCV at index {index}: {reason}")]
    InvalidOHLCV { index: usize, reason: &'static str },
}

// ============================================================
// VALIDATED TYPES
// ============================================================

/// Normalized value in range 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Ratio(f64);

impl Ratio {
    /// Create a new Ratio, validating the value is in [0.0, 1.0]
    pub fn new(value: f64) -> Result<Self> {
        if value.is_nan() || value.is_infinite() {
            return Err(ScanError::InvalidValue("Ratio cannot be NaN or infinite"));
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(ScanError::OutOfRange {
                field: "Ratio",
                value,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(Self(value))
    }

    /// Create a Ratio from a compile-time constant (library internal use)
    #[doc(hidden)]
    pub const fn new_const(value: f64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl serde::Serialize for Ratio {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Ratio {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = f64::deserialize(d)?;
        Ratio::new(value).map_err(serde::de::Error::custom)
    }
}

/// Period (must be > 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Period(usize);

impl Period {
    /// Create a new Period, validating value is > 0
    pub fn new(value: usize) -> Result<Self> {
        if value == 0 {
            return Err(ScanError::InvalidValue("Period must be > 0"));
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: usize) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

impl serde::Serialize for Period {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Period {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = usize::deserialize(d)?;
        Period::new(value).map_err(serde::de::Error::custom)
    }
}

// ============================================================
// OHLCV TRAITS
// ============================================================

/// Core OHLCV data trait
pub trait OHLCV {
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;
    fn volume(&self) -> f64;

    fn timestamp(&self) -> Option<i64> {
        None
    }
}

/// Blanket impl for references to dyn OHLCV
impl OHLCV for &dyn OHLCV {
    fn open(&self) -> f64 {
        (*self).open()
    }

    fn high(&self) -> f64 {
        (*self).high()
    }

    fn low(&self) -> f64 {
        (*self).low()
    }

    fn close(&self) -> f64 {
        (*self).close()
    }

    fn volume(&self) -> f64 {
        (*self).volume()
    }

    fn timestamp(&self) -> Option<i64> {
        (*self).timestamp()
    }
}

/// Extension trait with computed properties for OHLCV data
pub trait OHLCVExt: OHLCV {
    #[inline]
    fn body(&self) -> f64 {
        (self.close() - self.open()).abs()
    }

    #[inline]
    fn range(&self) -> f64 {
        self.high() - self.low()
    }

    #[inline]
    fn upper_shadow(&self) -> f64 {
        self.high() - self.open().max(self.close())
    }

    #[inline]
    fn lower_shadow(&self) -> f64 {
        self.open().min(self.close()) - self.low()
    }

    #[inline]
    fn is_bullish(&self) -> bool {
        self.close() > self.open()
    }

    #[inline]
    fn is_bearish(&self) -> bool {
        self.close() < self.open()
    }

    /// Body as ratio of range. Returns None if range ≈ 0
    #[inline]
    fn body_ratio(&self) -> Option<f64> {
        let range = self.range();
        (range > f64::EPSILON).then(|| self.body() / range)
    }

    #[inline]
    fn upper_shadow_ratio(&self) -> Option<f64> {
        let range = self.range();
        (range > f64::EPSILON).then(|| self.upper_shadow() / range)
    }

    #[inline]
    fn lower_shadow_ratio(&self) -> Option<f64> {
        let range = self.range();
        (range > f64::EPSILON).then(|| self.lower_shadow() / range)
    }

    /// Validate OHLCV data consistency
    fn validate(&self) -> Result<()> {
        if self.high() < self.low() {
            return Err(ScanError::InvalidOHLCV {
                index: 0,
                reason: "high < low",
            });
        }
        if self.open().is_nan()
            || self.high().is_nan()
            || self.low().is_nan()
            || self.close().is_nan()
        {
            return Err(ScanError::InvalidOHLCV {
                index: 0,
                reason: "NaN in OHLCV",
            });
        }
        if self.open().is_infinite()
            || self.high().is_infinite()
            || self.low().is_infinite()
            || self.close().is_infinite()
        {
            return Err(ScanError::InvalidOHLCV {
                index: 0,
                reason: "Infinite value in OHLCV",
            });
        }
        Ok(())
    }
}

impl<T: OHLCV> OHLCVExt for T {}

// ============================================================
// BAR - concrete daily session
// ============================================================

/// One daily session for a symbol. Series are ordered ascending by date.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Bar {
    pub date: chrono::NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl OHLCV for Bar {
    fn open(&self) -> f64 {
        self.open
    }

    fn high(&self) -> f64 {
        self.high
    }

    fn low(&self) -> f64 {
        self.low
    }

    fn close(&self) -> f64 {
        self.close
    }

    fn volume(&self) -> f64 {
        self.volume
    }

    fn timestamp(&self) -> Option<i64> {
        self.date
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
    }
}

// ============================================================
// SIGNAL TYPES
// ============================================================

/// Direction of a detected signal. "No signal" is expressed as
/// `Option::<Direction>::None`, never as a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Bullish,
    Bearish,
}

impl Direction {
    #[inline]
    pub fn is_bullish(self) -> bool {
        matches!(self, Direction::Bullish)
    }

    #[inline]
    pub fn is_bearish(self) -> bool {
        matches!(self, Direction::Bearish)
    }
}

/// Stable identifier for a pattern. Persisted downstream as the pattern
/// key; must not change across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PatternId(pub &'static str);

impl PatternId {
    /// Returns the string identifier
    #[inline]
    pub fn as_str(&self) -> &'static str {
        self.0
    }

    /// Human-readable name for dashboards and exports.
    pub fn display_name(&self) -> &'static str {
        match self.0 {
            "SUPERTREND_BULLISH" => "SuperTrend Bullish (1-3 Days)",
            "SUPERTREND_FRESH" => "SuperTrend Fresh (1 Day)",
            "SUPERTREND_RECENT" => "SuperTrend Recent (2 Days)",
            "CUP_AND_HANDLE" => "Cup and Handle",
            "ASCENDING_TRIANGLE" => "Ascending Triangle",
            "DOUBLE_BOTTOM" => "Double Bottom",
            "BULL_FLAG" => "Bull Flag",
            "BEAR_FLAG" => "Bear Flag",
            "MOMENTUM_BURST_1D" => "Momentum Burst (1-Day)",
            "MOMENTUM_BURST_3D" => "Momentum Burst (3-Day)",
            "MOMENTUM_BURST_5D" => "Momentum Burst (5-Day)",
            "EXPLOSIVE_VOLUME_3X" => "Explosive Volume (3x Average)",
            "EXPLOSIVE_VOLUME_5X" => "Explosive Volume (5x Average)",
            "EXPLOSIVE_VOLUME_10X" => "Explosive Volume (10x Average)",
            "VOLUME_SURGE_WITH_PRICE" => "Volume Surge + Price Move (3x + 2%)",
            "QULLAMAGGIE_BREAKOUT" => "Qullamaggie Breakout",
            "CDL_DOJI" => "Doji",
            "CDL_HAMMER" => "Hammer",
            "CDL_SHOOTINGSTAR" => "Shooting Star",
            "CDL_ENGULFING" => "Engulfing",
            "CDL_MORNINGSTAR" => "Morning Star",
            "CDL_EVENINGSTAR" => "Evening Star",
            "CDL_3WHITESOLDIERS" => "Three Advancing White Soldiers",
            "CDL_3BLACKCROWS" => "Three Black Crows",
            other => other,
        }
    }
}

impl std::fmt::Display for PatternId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

impl serde::Serialize for PatternId {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(self.0)
    }
}

/// One scored detection - the only payload crossing the engine boundary.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ScoredResult {
    pub symbol: String,
    pub pattern: PatternId,
    pub direction: Direction,
    /// Strength score 0..=100
    pub strength: u8,
    pub quality: score::Quality,
}

// ============================================================
// PATTERN DETECTOR TRAITS
// ============================================================

/// Generic pattern detector trait - for concrete types.
///
/// Detectors evaluate the *latest* bar of the series (batch, end-of-bar).
/// A series shorter than [`min_bars`](Self::min_bars), or one with
/// degenerate values where the detector needs real ones, yields `None` -
/// never an error.
pub trait PatternDetector: Send + Sync {
    fn id(&self) -> PatternId;
    fn min_bars(&self) -> usize;
    fn detect<T: OHLCV>(&self, bars: &[T]) -> Option<Direction>;

    fn validate_config(&self) -> Result<()> {
        Ok(())
    }
}

/// Object-safe pattern detector trait - for custom detectors
pub trait DynPatternDetector: Send + Sync {
    fn id(&self) -> PatternId;
    fn min_bars(&self) -> usize;
    fn detect(&self, bars: &[&dyn OHLCV]) -> Option<Direction>;
    fn validate_config(&self) -> Result<()>;
}

impl<D: PatternDetector> DynPatternDetector for D {
    fn id(&self) -> PatternId {
        PatternDetector::id(self)
    }

    fn min_bars(&self) -> usize {
        PatternDetector::min_bars(self)
    }

    fn detect(&self, bars: &[&dyn OHLCV]) -> Option<Direction> {
        PatternDetector::detect(self, bars)
    }

    fn validate_config(&self) -> Result<()> {
        PatternDetector::validate_config(self)
    }
}

// ============================================================
// BUILTIN DETECTORS - generated via macro
// ============================================================

use detectors::*;

/// Macro to generate BuiltinDetector enum without boilerplate
macro_rules! define_builtin_detectors {
    (
        $(
            $variant:ident($detector:ty)
        ),* $(,)?
    ) => {
        /// All builtin detectors - fast path via enum dispatch
        #[derive(Debug, Clone)]
        pub enum BuiltinDetector {
            $($variant($detector)),*
        }

        impl BuiltinDetector {
            #[inline]
            pub fn detect<T: OHLCV>(&self, bars: &[T]) -> Option<Direction> {
                match self {
                    $(Self::$variant(d) => PatternDetector::detect(d, bars)),*
                }
            }

            #[inline]
            pub fn id(&self) -> PatternId {
                match self {
                    $(Self::$variant(d) => PatternDetector::id(d)),*
                }
            }

            #[inline]
            pub fn min_bars(&self) -> usize {
                match self {
                    $(Self::$variant(d) => PatternDetector::min_bars(d)),*
                }
            }

            pub fn validate_config(&self) -> Result<()> {
                match self {
                    $(Self::$variant(d) => PatternDetector::validate_config(d)),*
                }
            }
        }
    };
}

define_builtin_detectors! {
    // Trend state
    SupertrendFlip(SupertrendFlipDetector),

    // Chart shapes
    CupAndHandle(CupAndHandleDetector),
    AscendingTriangle(AscendingTriangleDetector),
    DoubleBottom(DoubleBottomDetector),
    BullFlag(BullFlagDetector),
    BearFlag(BearFlagDetector),

    // Momentum / volume
    MomentumBurst(MomentumBurstDetector),
    ExplosiveVolume(ExplosiveVolumeDetector),
    VolumeSurge(VolumeSurgeDetector),

    // Breakout
    Breakout(QullamaggieBreakoutDetector),

    // Candlesticks
    Candlestick(CandlestickDetector),
}

// ============================================================
// SCAN ENGINE
// ============================================================

/// Engine configuration
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Drop results scoring below this strength
    pub min_strength: Option<u8>,
    pub validate_data: bool,
    pub pattern_filter: Option<Vec<PatternId>>,
}

/// Main screening engine: runs every registered detector against one
/// symbol's series and scores the signals.
pub struct ScanEngine {
    builtin: Vec<BuiltinDetector>,
    custom: Vec<Box<dyn DynPatternDetector>>,
    scorer: score::StrengthScorer,
    config: EngineConfig,
}

impl ScanEngine {
    /// Scan one symbol. Total: detector panics are caught at the detector
    /// boundary, logged, and treated as no-signal; with `validate_data`
    /// enabled, malformed bars are logged and yield an empty result set.
    pub fn scan_symbol<T: OHLCV>(&self, symbol: &str, bars: &[T]) -> Vec<ScoredResult> {
        match self.try_scan_symbol(symbol, bars) {
            Ok(results) => results,
            Err(error) => {
                tracing::warn!(symbol, %error, "skipping symbol: invalid bar data");
                Vec::new()
            }
        }
    }

    /// Like [`scan_symbol`](Self::scan_symbol) but surfaces validation
    /// failures instead of logging them. Detection itself still cannot fail.
    pub fn try_scan_symbol<T: OHLCV>(
        &self,
        symbol: &str,
        bars: &[T],
    ) -> Result<Vec<ScoredResult>> {
        if self.config.validate_data {
            self.validate_bars(bars)?;
        }

        let mut results = Vec::new();

        for detector in &self.builtin {
            if bars.len() < detector.min_bars() {
                continue;
            }
            let signal = guarded_detect(detector.id(), symbol, || detector.detect(bars));
            if let Some(direction) = signal {
                self.push_scored(&mut results, symbol, detector.id(), direction, bars);
            }
        }

        if !self.custom.is_empty() {
            let bar_refs: Vec<&dyn OHLCV> = bars.iter().map(|b| b as &dyn OHLCV).collect();
            for detector in &self.custom {
                if bar_refs.len() < detector.min_bars() {
                    continue;
                }
                let signal = guarded_detect(detector.id(), symbol, || detector.detect(&bar_refs));
                if let Some(direction) = signal {
                    self.push_scored(&mut results, symbol, detector.id(), direction, bars);
                }
            }
        }

        Ok(results)
    }

    /// Stable ids of every registered detector, in registration order.
    pub fn pattern_ids(&self) -> Vec<PatternId> {
        self.builtin
            .iter()
            .map(BuiltinDetector::id)
            .chain(self.custom.iter().map(|d| d.id()))
            .collect()
    }

    pub fn scorer(&self) -> &score::StrengthScorer {
        &self.scorer
    }

    fn push_scored<T: OHLCV>(
        &self,
        results: &mut Vec<ScoredResult>,
        symbol: &str,
        pattern: PatternId,
        direction: Direction,
        bars: &[T],
    ) {
        if let Some(ref filter) = self.config.pattern_filter {
            if !filter.contains(&pattern) {
                return;
            }
        }

        let strength = self.scorer.score_or_default(bars, direction);
        if let Some(min) = self.config.min_strength {
            if strength < min {
                return;
            }
        }

        results.push(ScoredResult {
            symbol: symbol.to_string(),
            pattern,
            direction,
            strength,
            quality: self.scorer.quality(strength),
        });
    }

    fn validate_bars<T: OHLCV>(&self, bars: &[T]) -> Result<()> {
        for (i, bar) in bars.iter().enumerate() {
            bar.validate().map_err(|e| match e {
                ScanError::InvalidOHLCV { reason, .. } => {
                    ScanError::InvalidOHLCV { index: i, reason }
                }
                other => other,
            })?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        for d in &self.builtin {
            d.validate_config()?;
        }
        for d in &self.custom {
            d.validate_config()?;
        }
        Ok(())
    }
}

/// Run one detector with a panic guard. A panicking detector must never
/// abort the batch: the panic is logged and treated as no-signal.
fn guarded_detect<F>(pattern: PatternId, symbol: &str, detect: F) -> Option<Direction>
where
    F: FnOnce() -> Option<Direction>,
{
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(detect)) {
        Ok(signal) => signal,
        Err(_) => {
            tracing::warn!(
                pattern = pattern.as_str(),
                symbol,
                "detector panicked; treating as no signal"
            );
            None
        }
    }
}

// ============================================================
// BUILDER
// ============================================================

/// Builder for creating [`ScanEngine`] instances
pub struct EngineBuilder {
    builtin: Vec<BuiltinDetector>,
    custom: Vec<Box<dyn DynPatternDetector>>,
    scorer: score::StrengthScorer,
    config: EngineConfig,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate an array of `BuiltinDetector` variants using `Default::default()` for each inner type.
macro_rules! builtin_defaults {
  ($($variant:ident),* $(,)?) => {
    [$(BuiltinDetector::$variant(Default::default())),*]
  };
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            builtin: Vec::new(),
            custom: Vec::new(),
            scorer: score::StrengthScorer::default(),
            config: EngineConfig::default(),
        }
    }

    /// Add every builtin detector with default configurations
    pub fn with_all_defaults(self) -> Self {
        self.with_trend_defaults()
            .with_shape_defaults()
            .with_momentum_defaults()
            .with_volume_defaults()
            .with_breakout_defaults()
            .with_candle_defaults()
    }

    /// SuperTrend flip detectors: bullish (3 days), recent (2), fresh (1)
    pub fn with_trend_defaults(mut self) -> Self {
        self.builtin.extend([
            BuiltinDetector::SupertrendFlip(SupertrendFlipDetector::bullish()),
            BuiltinDetector::SupertrendFlip(SupertrendFlipDetector::recent()),
            BuiltinDetector::SupertrendFlip(SupertrendFlipDetector::fresh()),
        ]);
        self
    }

    /// Chart shape detectors (5)
    pub fn with_shape_defaults(mut self) -> Self {
        self.builtin.extend(builtin_defaults![
            CupAndHandle,
            AscendingTriangle,
            DoubleBottom,
            BullFlag,
            BearFlag,
        ]);
        self
    }

    /// Momentum burst detectors at 1/3/5-day spans
    pub fn with_momentum_defaults(mut self) -> Self {
        self.builtin.extend([
            BuiltinDetector::MomentumBurst(MomentumBurstDetector::one_day()),
            BuiltinDetector::MomentumBurst(MomentumBurstDetector::three_day()),
            BuiltinDetector::MomentumBurst(MomentumBurstDetector::five_day()),
        ]);
        self
    }

    /// Explosive volume tiers plus volume-surge-with-price
    pub fn with_volume_defaults(mut self) -> Self {
        self.builtin.extend([
            BuiltinDetector::ExplosiveVolume(ExplosiveVolumeDetector::x3()),
            BuiltinDetector::ExplosiveVolume(ExplosiveVolumeDetector::x5()),
            BuiltinDetector::ExplosiveVolume(ExplosiveVolumeDetector::x10()),
            BuiltinDetector::VolumeSurge(VolumeSurgeDetector::default()),
        ]);
        self
    }

    /// Qullamaggie-style breakout detector
    pub fn with_breakout_defaults(mut self) -> Self {
        self.builtin.extend(builtin_defaults![Breakout]);
        self
    }

    /// Builtin candlestick patterns (8)
    pub fn with_candle_defaults(mut self) -> Self {
        self.builtin.extend(
            CandleKind::ALL
                .iter()
                .map(|&kind| BuiltinDetector::Candlestick(CandlestickDetector::new(kind))),
        );
        self
    }

    /// Add a builtin detector
    #[allow(clippy::should_implement_trait)]
    pub fn add(mut self, detector: BuiltinDetector) -> Self {
        self.builtin.push(detector);
        self
    }

    /// Add with config validation
    pub fn add_checked(mut self, detector: BuiltinDetector) -> Result<Self> {
        detector.validate_config()?;
        self.builtin.push(detector);
        Ok(self)
    }

    /// Add a custom detector (slow path)
    pub fn add_custom<D: DynPatternDetector + 'static>(mut self, detector: D) -> Self {
        self.custom.push(Box::new(detector));
        self
    }

    /// Replace the default scorer (custom thresholds or quality bands)
    pub fn scorer(mut self, scorer: score::StrengthScorer) -> Self {
        self.scorer = scorer;
        self
    }

    /// Set minimum strength filter
    pub fn min_strength(mut self, strength: u8) -> Self {
        self.config.min_strength = Some(strength);
        self
    }

    /// Enable/disable data validation
    pub fn validate_data(mut self, enable: bool) -> Self {
        self.config.validate_data = enable;
        self
    }

    /// Filter to specific patterns only
    pub fn only_patterns(mut self, ids: impl IntoIterator<Item = PatternId>) -> Self {
        self.config.pattern_filter = Some(ids.into_iter().collect());
        self
    }

    /// Build the engine
    pub fn build(self) -> Result<ScanEngine> {
        let engine = ScanEngine {
            builtin: self.builtin,
            custom: self.custom,
            scorer: self.scorer,
            config: self.config,
        };
        engine.validate()?;
        Ok(engine)
    }
}

/// Stable ids of every builtin detector, in default registration order.
///
/// These strings are persisted downstream as pattern keys; additions are
/// fine, renames are not.
pub fn all_pattern_ids() -> Vec<PatternId> {
    EngineBuilder::new()
        .with_all_defaults()
        .builtin
        .iter()
        .map(BuiltinDetector::id)
        .collect()
}

// ============================================================
// PARALLEL SCANNING
// ============================================================

use rayon::prelude::*;

/// Result of scanning a single symbol
#[derive(Debug)]
pub struct SymbolScan {
    pub symbol: String,
    pub results: Vec<ScoredResult>,
}

/// Error from scanning a single symbol (only with `validate_data` enabled)
#[derive(Debug)]
pub struct SymbolError {
    pub symbol: String,
    pub error: ScanError,
}

/// Parallel scanning of a symbol universe. Each (symbol, detector) pair is
/// independent; one symbol's failure never aborts the batch.
pub fn scan_parallel<'a, T, I>(
    engine: &ScanEngine,
    instruments: I,
) -> (Vec<SymbolScan>, Vec<SymbolError>)
where
    T: OHLCV + Sync + 'a,
    I: IntoParallelIterator<Item = (&'a str, &'a [T])>,
{
    let scans: Vec<_> = instruments
        .into_par_iter()
        .map(|(symbol, bars)| {
            engine
                .try_scan_symbol(symbol, bars)
                .map(|results| SymbolScan {
                    symbol: symbol.to_string(),
                    results,
                })
                .map_err(|error| SymbolError {
                    symbol: symbol.to_string(),
                    error,
                })
        })
        .collect();

    let mut successes = Vec::new();
    let mut errors = Vec::new();

    for scan in scans {
        match scan {
            Ok(s) => successes.push(s),
            Err(e) => errors.push(e),
        }
    }

    (successes, errors)
}

// ============================================================
// TESTS
// ============================================================
