//! Multi-factor strength scoring.
//!
//! Converts a raw directional signal into a comparable 0-100 score by
//! fusing volume confirmation, trend alignment, oscillator context,
//! volatility and consolidation. Every factor degrades independently: a
//! missing indicator simply contributes nothing. The swallow-to-neutral
//! fallback is a named operation ([`StrengthScorer::score_or_default`]),
//! not an incidental catch-all.

use crate::{indicators, Direction, Period, Ratio, OHLCV};

/// Discretized quality bucket of a strength score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    Strong,
    Good,
    Moderate,
    Weak,
    VeryWeak,
}

/// Score cutoffs for the quality buckets. A score at or above a band's
/// cutoff earns that label; below every cutoff is [`Quality::VeryWeak`].
///
/// Passed per call rather than hardcoded so relaxed "testing" regimes and
/// strict "production" regimes stay reproducible side by side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct QualityBands {
    pub strong: u8,
    pub good: u8,
    pub moderate: u8,
    pub weak: u8,
}

impl Default for QualityBands {
    fn default() -> Self {
        Self {
            strong: 80,
            good: 60,
            moderate: 40,
            weak: 20,
        }
    }
}

impl QualityBands {
    pub fn classify(&self, score: u8) -> Quality {
        if score >= self.strong {
            Quality::Strong
        } else if score >= self.good {
            Quality::Good
        } else if score >= self.moderate {
            Quality::Moderate
        } else if score >= self.weak {
            Quality::Weak
        } else {
            Quality::VeryWeak
        }
    }
}

/// Factor thresholds for the strength heuristic.
#[derive(Debug, Clone, Copy)]
pub struct ScoreConfig {
    /// Trailing window for volume, trend and consolidation factors
    pub context_window: Period,
    /// Volume ratios vs the trailing average (excluding the latest bar)
    pub strong_volume_factor: f64,
    pub good_volume_factor: f64,
    pub weak_volume_factor: f64,
    /// Distance from the SMA that counts as in-trend / reversal territory
    pub trend_margin: Ratio,
    pub rsi_period: Period,
    pub atr_period: Period,
    /// Bars in the consolidation range check
    pub consolidation_window: Period,
    /// Close range (as fraction of price) under this is tight consolidation
    pub tight_range: Ratio,
    /// Close range above this is too noisy
    pub noisy_range: Ratio,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            context_window: Period::new_const(20),
            strong_volume_factor: 1.5,
            good_volume_factor: 1.2,
            weak_volume_factor: 0.5,
            trend_margin: Ratio::new_const(0.02),
            rsi_period: Period::new_const(14),
            atr_period: Period::new_const(14),
            consolidation_window: Period::new_const(5),
            tight_range: Ratio::new_const(0.03),
            noisy_range: Ratio::new_const(0.10),
        }
    }
}

const BASE_SCORE: i32 = 50;

/// Scores a (series, direction) pair onto the 0-100 scale.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrengthScorer {
    pub config: ScoreConfig,
    pub bands: QualityBands,
}

impl StrengthScorer {
    pub fn new(config: ScoreConfig, bands: QualityBands) -> Self {
        Self { config, bands }
    }

    /// Multi-factor strength score, clamped to [0, 100].
    pub fn score<T: OHLCV>(&self, bars: &[T], direction: Direction) -> u8 {
        if bars.is_empty() {
            return BASE_SCORE as u8;
        }

        let window = tail(bars, self.config.context_window.get());
        let closes: Vec<f64> = window.iter().map(|b| b.close()).collect();
        let volumes: Vec<f64> = window.iter().map(|b| b.volume()).collect();
        let current = *closes.last().expect("window is non-empty");

        let mut score = BASE_SCORE;
        score += self.volume_points(&volumes);
        score += self.trend_points(&closes, current, direction);
        score += self.oscillator_points(bars, direction);
        score += self.volatility_points(window, current);
        score += self.consolidation_points(&closes, current);

        score.clamp(0, 100) as u8
    }

    /// The swallow boundary: any failure inside the heuristic (including a
    /// panic) yields the neutral score 50, logged, never propagated.
    pub fn score_or_default<T: OHLCV>(&self, bars: &[T], direction: Direction) -> u8 {
        let attempt = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            self.score(bars, direction)
        }));
        match attempt {
            Ok(score) => score,
            Err(_) => {
                tracing::warn!("strength scoring failed; falling back to neutral 50");
                BASE_SCORE as u8
            }
        }
    }

    /// A missing signal scores 0 without invoking the heuristic.
    pub fn score_signal<T: OHLCV>(&self, bars: &[T], signal: Option<Direction>) -> u8 {
        match signal {
            Some(direction) => self.score_or_default(bars, direction),
            None => 0,
        }
    }

    pub fn quality(&self, score: u8) -> Quality {
        self.bands.classify(score)
    }

    /// Volume confirmation vs the trailing average (latest bar excluded).
    /// Comparisons are multiplicative so a zero average never divides.
    fn volume_points(&self, volumes: &[f64]) -> i32 {
        let n = volumes.len();
        if n < 2 {
            return 0;
        }
        let Some(avg) = indicators::mean(&volumes[..n - 1]) else {
            return 0;
        };
        let latest = volumes[n - 1];

        if latest > avg * self.config.strong_volume_factor {
            20
        } else if latest > avg * self.config.good_volume_factor {
            10
        } else if latest < avg * self.config.weak_volume_factor {
            -20
        } else {
            0
        }
    }

    /// Trend alignment vs the window SMA, direction-aware. Trading with the
    /// trend earns more than reversal potential against it.
    fn trend_points(&self, closes: &[f64], current: f64, direction: Direction) -> i32 {
        let Some(sma) = indicators::mean(closes) else {
            return 0;
        };
        let above = sma * (1.0 + self.config.trend_margin.get());
        let below = sma * (1.0 - self.config.trend_margin.get());

        match direction {
            Direction::Bullish => {
                if current > above {
                    15
                } else if current < below {
                    5
                } else {
                    0
                }
            }
            Direction::Bearish => {
                if current < below {
                    15
                } else if current > above {
                    5
                } else {
                    0
                }
            }
        }
    }

    /// RSI context over the full series, mirrored per direction.
    fn oscillator_points<T: OHLCV>(&self, bars: &[T], direction: Direction) -> i32 {
        let closes: Vec<f64> = bars.iter().map(|b| b.close()).collect();
        let series = indicators::rsi(&closes, self.config.rsi_period.get());
        let Some(rsi) = series.last().copied().flatten() else {
            return 0;
        };

        match direction {
            Direction::Bullish => {
                if rsi > 30.0 && rsi < 50.0 {
                    10
                } else if rsi > 70.0 {
                    -10
                } else {
                    0
                }
            }
            Direction::Bearish => {
                if rsi > 50.0 && rsi < 70.0 {
                    10
                } else if rsi < 30.0 {
                    -10
                } else {
                    0
                }
            }
        }
    }

    /// ATR as a percentage of price: rewards a tradeable volatility band,
    /// penalizes churn.
    fn volatility_points<T: OHLCV>(&self, window: &[T], current: f64) -> i32 {
        if current <= 0.0 {
            return 0;
        }
        let series = indicators::atr(window, self.config.atr_period.get());
        let Some(atr) = series.last().copied().flatten() else {
            return 0;
        };
        let atr_percent = atr / current * 100.0;

        if atr_percent > 1.0 && atr_percent < 3.0 {
            5
        } else if atr_percent > 5.0 {
            -5
        } else {
            0
        }
    }

    /// Tight close range going into the signal is a quality setup; a wide
    /// one is noise.
    fn consolidation_points(&self, closes: &[f64], current: f64) -> i32 {
        if current <= 0.0 {
            return 0;
        }
        let recent = tail(closes, self.config.consolidation_window.get());
        let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
        for &c in recent {
            lo = lo.min(c);
            hi = hi.max(c);
        }
        if !lo.is_finite() || !hi.is_finite() {
            return 0;
        }
        let range = (hi - lo) / current;

        if range < self.config.tight_range.get() {
            10
        } else if range > self.config.noisy_range.get() {
            -5
        } else {
            0
        }
    }
}

#[inline]
fn tail<T>(slice: &[T], n: usize) -> &[T] {
    &slice[slice.len().saturating_sub(n)..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy)]
    struct B {
        o: f64,
        h: f64,
        l: f64,
        c: f64,
        v: f64,
    }

    impl B {
        fn flat(c: f64, v: f64) -> Self {
            Self {
                o: c,
                h: c + 0.5,
                l: c - 0.5,
                c,
                v,
            }
        }
    }

    impl OHLCV for B {
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

    fn scorer() -> StrengthScorer {
        StrengthScorer::default()
    }

    #[test]
    fn test_empty_series_scores_neutral() {
        let bars: Vec<B> = vec![];
        assert_eq!(scorer().score(&bars, Direction::Bullish), 50);
    }

    #[test]
    fn test_score_is_bounded() {
        // Heavy volume, strong uptrend: all bonuses at once stay <= 100
        let mut bars: Vec<B> = (0..40)
            .map(|i| B::flat(100.0 + i as f64, 1000.0))
            .collect();
        bars.push(B::flat(145.0, 10_000.0));

        let s = scorer().score(&bars, Direction::Bullish);
        assert!(s <= 100);
    }

    #[test]
    fn test_volume_spike_raises_score() {
        let mut quiet: Vec<B> = (0..30).map(|_| B::flat(100.0, 1000.0)).collect();
        let base = scorer().score(&quiet, Direction::Bullish);

        quiet.pop();
        quiet.push(B::flat(100.0, 5000.0));
        let spiked = scorer().score(&quiet, Direction::Bullish);

        assert!(spiked >= base + 20, "spiked {spiked} vs base {base}");
    }

    #[test]
    fn test_dried_up_volume_lowers_score() {
        let mut bars: Vec<B> = (0..30).map(|_| B::flat(100.0, 1000.0)).collect();
        bars.pop();
        bars.push(B::flat(100.0, 100.0));

        let flat: Vec<B> = (0..30).map(|_| B::flat(100.0, 1000.0)).collect();
        let base = scorer().score(&flat, Direction::Bullish);
        let dried = scorer().score(&bars, Direction::Bullish);
        assert!(dried <= base - 20, "dried {dried} vs base {base}");
    }

    #[test]
    fn test_trend_alignment_is_direction_aware() {
        // Price well above its SMA: full credit for bulls, reversal-only
        // credit for bears. Series kept inside the RSI/ATR warmup so the
        // trend factor is the only discriminator.
        let mut bars: Vec<B> = (0..12).map(|_| B::flat(100.0, 1000.0)).collect();
        bars.push(B::flat(110.0, 1000.0));

        let bull = scorer().score(&bars, Direction::Bullish);
        let bear = scorer().score(&bars, Direction::Bearish);
        assert_eq!(bull, 65); // base 50 + in-trend 15
        assert_eq!(bear, 55); // base 50 + reversal potential 5
    }

    #[test]
    fn test_quality_boundaries_are_exact() {
        let s = scorer();
        assert_eq!(s.quality(80), Quality::Strong);
        assert_eq!(s.quality(79), Quality::Good);
        assert_eq!(s.quality(60), Quality::Good);
        assert_eq!(s.quality(59), Quality::Moderate);
        assert_eq!(s.quality(40), Quality::Moderate);
        assert_eq!(s.quality(39), Quality::Weak);
        assert_eq!(s.quality(20), Quality::Weak);
        assert_eq!(s.quality(19), Quality::VeryWeak);
        assert_eq!(s.quality(0), Quality::VeryWeak);
    }

    #[test]
    fn test_custom_quality_bands() {
        let bands = QualityBands {
            strong: 90,
            good: 70,
            moderate: 50,
            weak: 30,
        };
        let s = StrengthScorer::new(ScoreConfig::default(), bands);
        assert_eq!(s.quality(85), Quality::Good);
        assert_eq!(s.quality(90), Quality::Strong);
    }

    #[test]
    fn test_none_signal_scores_zero() {
        let bars: Vec<B> = (0..30).map(|_| B::flat(100.0, 1000.0)).collect();
        assert_eq!(scorer().score_signal(&bars, None), 0);
        assert!(scorer().score_signal(&bars, Some(Direction::Bullish)) > 0);
    }

    #[test]
    fn test_zero_volume_history_does_not_divide() {
        // All-zero trailing volume with a positive latest bar: the strong
        // branch fires (latest > 0 * 1.5), nothing panics
        let mut bars: Vec<B> = (0..30).map(|_| B::flat(100.0, 0.0)).collect();
        bars.pop();
        bars.push(B::flat(100.0, 500.0));
        let s = scorer().score(&bars, Direction::Bullish);
        assert!(s >= 50);
    }

    #[test]
    fn test_quality_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&Quality::VeryWeak).unwrap(),
            "\"very_weak\""
        );
        assert_eq!(serde_json::to_string(&Quality::Strong).unwrap(), "\"strong\"");
    }
}
