//! Candlestick pattern adapter.
//!
//! Candlestick libraries conventionally score each bar as an integer:
//! positive for a bullish occurrence, negative for bearish, zero for no
//! pattern. The adapter consumes only the *sign* of the latest bar's score:
//! `>0` maps to bullish, `<0` to bearish, `0` to no signal.
//!
//! [`CandleKind`] provides built-in scorers for the classic patterns;
//! [`ExternalCandleDetector`] plugs an arbitrary external scoring function
//! into the same contract via the object-safe slow path.

use crate::{
    Direction, DynPatternDetector, PatternDetector, PatternId, Result, OHLCVExt, OHLCV,
};

// Body-size thresholds, relative to the bar's high-low range
const DOJI_MAX_BODY_RATIO: f64 = 0.1;
const SMALL_BODY_RATIO: f64 = 0.3;
const LONG_BODY_RATIO: f64 = 0.7;
// A "long" shadow must be at least this multiple of the body
const SHADOW_LONG_FACTOR: f64 = 2.0;
// A "very short" shadow stays under this fraction of the range
const SHADOW_SHORT_RATIO: f64 = 0.1;

#[inline]
fn is_doji<T: OHLCV>(bar: &T) -> bool {
    if bar.body() <= f64::EPSILON {
        return true;
    }
    bar.body_ratio().is_some_and(|r| r <= DOJI_MAX_BODY_RATIO)
}

#[inline]
fn has_small_body<T: OHLCV>(bar: &T) -> bool {
    bar.body_ratio().is_some_and(|r| r <= SMALL_BODY_RATIO)
}

#[inline]
fn has_long_body<T: OHLCV>(bar: &T) -> bool {
    bar.body_ratio().is_some_and(|r| r >= LONG_BODY_RATIO)
}

#[inline]
fn body_high<T: OHLCV>(bar: &T) -> f64 {
    bar.open().max(bar.close())
}

#[inline]
fn body_low<T: OHLCV>(bar: &T) -> f64 {
    bar.open().min(bar.close())
}

// ============================================================
// BUILTIN CANDLE KINDS
// ============================================================

/// Built-in candlestick patterns with stable `CDL_*` ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandleKind {
    Doji,
    Hammer,
    ShootingStar,
    Engulfing,
    MorningStar,
    EveningStar,
    ThreeWhiteSoldiers,
    ThreeBlackCrows,
}

impl CandleKind {
    pub const ALL: [CandleKind; 8] = [
        CandleKind::Doji,
        CandleKind::Hammer,
        CandleKind::ShootingStar,
        CandleKind::Engulfing,
        CandleKind::MorningStar,
        CandleKind::EveningStar,
        CandleKind::ThreeWhiteSoldiers,
        CandleKind::ThreeBlackCrows,
    ];

    pub fn id(self) -> PatternId {
        match self {
            CandleKind::Doji => PatternId("CDL_DOJI"),
            CandleKind::Hammer => PatternId("CDL_HAMMER"),
            CandleKind::ShootingStar => PatternId("CDL_SHOOTINGSTAR"),
            CandleKind::Engulfing => PatternId("CDL_ENGULFING"),
            CandleKind::MorningStar => PatternId("CDL_MORNINGSTAR"),
            CandleKind::EveningStar => PatternId("CDL_EVENINGSTAR"),
            CandleKind::ThreeWhiteSoldiers => PatternId("CDL_3WHITESOLDIERS"),
            CandleKind::ThreeBlackCrows => PatternId("CDL_3BLACKCROWS"),
        }
    }

    pub fn min_bars(self) -> usize {
        match self {
            CandleKind::Doji | CandleKind::Hammer => 1,
            CandleKind::ShootingStar | CandleKind::Engulfing => 2,
            CandleKind::MorningStar
            | CandleKind::EveningStar
            | CandleKind::ThreeWhiteSoldiers
            | CandleKind::ThreeBlackCrows => 3,
        }
    }

    /// Integer score for the latest bar: +100 bullish, -100 bearish, 0 none.
    pub fn score_latest<T: OHLCV>(self, bars: &[T]) -> i32 {
        if bars.len() < self.min_bars() {
            return 0;
        }
        let last = bars.len() - 1;
        match self {
            CandleKind::Doji => {
                if is_doji(&bars[last]) {
                    100
                } else {
                    0
                }
            }
            CandleKind::Hammer => {
                let bar = &bars[last];
                let hammer = has_small_body(bar)
                    && bar.lower_shadow() >= bar.body() * SHADOW_LONG_FACTOR
                    && bar
                        .upper_shadow_ratio()
                        .is_some_and(|r| r <= SHADOW_SHORT_RATIO);
                if hammer {
                    100
                } else {
                    0
                }
            }
            CandleKind::ShootingStar => {
                let prev = &bars[last - 1];
                let bar = &bars[last];
                let star = has_small_body(bar)
                    && bar.upper_shadow() >= bar.body() * SHADOW_LONG_FACTOR
                    && bar
                        .lower_shadow_ratio()
                        .is_some_and(|r| r <= SHADOW_SHORT_RATIO)
                    && body_low(bar) > prev.close();
                if star {
                    -100
                } else {
                    0
                }
            }
            CandleKind::Engulfing => {
                let prev = &bars[last - 1];
                let bar = &bars[last];
                let engulfs =
                    body_high(bar) > body_high(prev) && body_low(bar) < body_low(prev);
                if !engulfs {
                    return 0;
                }
                if prev.is_bearish() && bar.is_bullish() {
                    100
                } else if prev.is_bullish() && bar.is_bearish() {
                    -100
                } else {
                    0
                }
            }
            CandleKind::MorningStar => {
                let first = &bars[last - 2];
                let star = &bars[last - 1];
                let third = &bars[last];
                let midpoint = (first.open() + first.close()) / 2.0;
                let matched = first.is_bearish()
                    && has_long_body(first)
                    && has_small_body(star)
                    && body_high(star) < first.close()
                    && third.is_bullish()
                    && third.close() > midpoint;
                if matched {
                    100
                } else {
                    0
                }
            }
            CandleKind::EveningStar => {
                let first = &bars[last - 2];
                let star = &bars[last - 1];
                let third = &bars[last];
                let midpoint = (first.open() + first.close()) / 2.0;
                let matched = first.is_bullish()
                    && has_long_body(first)
                    && has_small_body(star)
                    && body_low(star) > first.close()
                    && third.is_bearish()
                    && third.close() < midpoint;
                if matched {
                    -100
                } else {
                    0
                }
            }
            CandleKind::ThreeWhiteSoldiers => {
                let (a, b, c) = (&bars[last - 2], &bars[last - 1], &bars[last]);
                let advancing = a.is_bullish()
                    && b.is_bullish()
                    && c.is_bullish()
                    && b.close() > a.close()
                    && c.close() > b.close()
                    && b.open() > a.open()
                    && b.open() < a.close()
                    && c.open() > b.open()
                    && c.open() < b.close();
                if advancing {
                    100
                } else {
                    0
                }
            }
            CandleKind::ThreeBlackCrows => {
                let (a, b, c) = (&bars[last - 2], &bars[last - 1], &bars[last]);
                let declining = a.is_bearish()
                    && b.is_bearish()
                    && c.is_bearish()
                    && b.close() < a.close()
                    && c.close() < b.close()
                    && b.open() < a.open()
                    && b.open() > a.close()
                    && c.open() < b.open()
                    && c.open() > b.close();
                if declining {
                    -100
                } else {
                    0
                }
            }
        }
    }
}

// ============================================================
// ADAPTERS
// ============================================================

/// Map a candlestick library score to a signal via its sign.
#[inline]
pub fn direction_from_score(score: i32) -> Option<Direction> {
    match score.cmp(&0) {
        std::cmp::Ordering::Greater => Some(Direction::Bullish),
        std::cmp::Ordering::Less => Some(Direction::Bearish),
        std::cmp::Ordering::Equal => None,
    }
}

/// Detector over a builtin [`CandleKind`].
#[derive(Debug, Clone)]
pub struct CandlestickDetector {
    pub kind: CandleKind,
}

impl CandlestickDetector {
    pub fn new(kind: CandleKind) -> Self {
        Self { kind }
    }
}

impl Default for CandlestickDetector {
    fn default() -> Self {
        Self::new(CandleKind::Doji)
    }
}

impl PatternDetector for CandlestickDetector {
    fn id(&self) -> PatternId {
        self.kind.id()
    }

    fn min_bars(&self) -> usize {
        self.kind.min_bars()
    }

    fn detect<T: OHLCV>(&self, bars: &[T]) -> Option<Direction> {
        direction_from_score(self.kind.score_latest(bars))
    }
}

/// Scoring function over the full series; only the latest bar's value is
/// consumed by the adapter.
pub type CandleScoreFn = dyn Fn(&[&dyn OHLCV]) -> i32 + Send + Sync;

/// Adapter over an external candlestick-pattern scorer, registered by a
/// stable id. Runs on the engine's object-safe slow path.
pub struct ExternalCandleDetector {
    id: PatternId,
    min_bars: usize,
    score: Box<CandleScoreFn>,
}

impl ExternalCandleDetector {
    pub fn new(
        id: PatternId,
        min_bars: usize,
        score: impl Fn(&[&dyn OHLCV]) -> i32 + Send + Sync + 'static,
    ) -> Self {
        Self {
            id,
            min_bars,
            score: Box::new(score),
        }
    }
}

impl DynPatternDetector for ExternalCandleDetector {
    fn id(&self) -> PatternId {
        self.id
    }

    fn min_bars(&self) -> usize {
        self.min_bars
    }

    fn detect(&self, bars: &[&dyn OHLCV]) -> Option<Direction> {
        if bars.len() < self.min_bars {
            return None;
        }
        direction_from_score((self.score)(bars))
    }

    fn validate_config(&self) -> Result<()> {
        Ok(())
    }
}
