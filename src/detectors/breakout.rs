//! Qullamaggie-style breakout detector.
//!
//! Fires only when every condition holds at once: close above the prior
//! `lookback`-bar high, a volume spike over the same window, close above
//! both the 10- and 20-bar SMAs, and the 10-bar SMA above the 20-bar SMA.
//! A missing SMA (insufficient warmup) forces its condition false rather
//! than erroring.

use std::collections::HashMap;

use super::helpers::tail;
use crate::{
    indicators,
    params::{get_period, get_value, ParamMeta, ParameterizedDetector},
    Direction, PatternDetector, PatternId, Period, Result, ScanError, OHLCV,
};

#[derive(Debug, Clone)]
pub struct QullamaggieBreakoutDetector {
    /// Bars (excluding today) defining the prior high and average volume
    pub lookback: Period,
    /// Minimum volume vs the lookback average
    pub volume_multiplier: f64,
    /// Trailing bars the breakout is evaluated over
    pub window: Period,
    pub fast_sma: Period,
    pub slow_sma: Period,
}

impl Default for QullamaggieBreakoutDetector {
    fn default() -> Self {
        Self {
            lookback: Period::new_const(20),
            volume_multiplier: 1.5,
            window: Period::new_const(50),
            fast_sma: Period::new_const(10),
            slow_sma: Period::new_const(20),
        }
    }
}

impl_with_defaults!(QullamaggieBreakoutDetector);

/// Breakout metrics for display alongside a signal.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct BreakoutDetails {
    pub close: f64,
    pub prev_high: f64,
    pub breakout_pct: f64,
    pub volume: f64,
    pub avg_volume: f64,
    pub volume_ratio: f64,
    pub fast_sma: Option<f64>,
    pub slow_sma: Option<f64>,
}

struct Snapshot {
    close: f64,
    volume: f64,
    prev_high: f64,
    avg_volume: f64,
    fast_sma: Option<f64>,
    slow_sma: Option<f64>,
}

impl QullamaggieBreakoutDetector {
    fn snapshot<T: OHLCV>(&self, bars: &[T]) -> Option<Snapshot> {
        if bars.len() < self.min_bars() {
            return None;
        }
        let window = tail(bars, self.window.get());
        let n = window.len();
        let lookback = self.lookback.get();
        if n < lookback + 1 {
            return None;
        }

        let closes: Vec<f64> = window.iter().map(|b| b.close()).collect();
        let today = &window[n - 1];

        // Prior period excludes today
        let prior = &window[n - 1 - lookback..n - 1];
        let prev_high = prior
            .iter()
            .map(|b| b.high())
            .fold(f64::NEG_INFINITY, f64::max);
        let volumes: Vec<f64> = prior.iter().map(|b| b.volume()).collect();
        let avg_volume = indicators::mean(&volumes)?;

        let sma_at = |period: usize| -> Option<f64> {
            if n < period {
                return None;
            }
            indicators::mean(tail(&closes, period))
        };

        Some(Snapshot {
            close: today.close(),
            volume: today.volume(),
            prev_high,
            avg_volume,
            fast_sma: sma_at(self.fast_sma.get()),
            slow_sma: sma_at(self.slow_sma.get()),
        })
    }

    /// Breakout metrics for the latest bar, independent of whether the
    /// pattern fires. `None` on insufficient data or a zero volume base.
    pub fn details<T: OHLCV>(&self, bars: &[T]) -> Option<BreakoutDetails> {
        let snap = self.snapshot(bars)?;
        if snap.prev_high <= 0.0 || snap.avg_volume <= 0.0 {
            return None;
        }
        Some(BreakoutDetails {
            close: snap.close,
            prev_high: snap.prev_high,
            breakout_pct: (snap.close - snap.prev_high) / snap.prev_high * 100.0,
            volume: snap.volume,
            avg_volume: snap.avg_volume,
            volume_ratio: snap.volume / snap.avg_volume,
            fast_sma: snap.fast_sma,
            slow_sma: snap.slow_sma,
        })
    }
}

impl PatternDetector for QullamaggieBreakoutDetector {
    fn id(&self) -> PatternId {
        PatternId("QULLAMAGGIE_BREAKOUT")
    }

    fn min_bars(&self) -> usize {
        self.lookback.get() + 20
    }

    fn detect<T: OHLCV>(&self, bars: &[T]) -> Option<Direction> {
        let snap = self.snapshot(bars)?;

        let price_breakout = snap.close > snap.prev_high;
        let volume_spike = snap.volume > snap.avg_volume * self.volume_multiplier;
        let above_fast = snap.fast_sma.is_some_and(|sma| snap.close > sma);
        let above_slow = snap.slow_sma.is_some_and(|sma| snap.close > sma);
        let uptrend = matches!(
            (snap.fast_sma, snap.slow_sma),
            (Some(fast), Some(slow)) if fast > slow
        );

        (price_breakout && volume_spike && above_fast && above_slow && uptrend)
            .then_some(Direction::Bullish)
    }

    fn validate_config(&self) -> Result<()> {
        if !self.volume_multiplier.is_finite() || self.volume_multiplier <= 0.0 {
            return Err(ScanError::InvalidConfig(format!(
                "volume_multiplier must be positive, got {}",
                self.volume_multiplier
            )));
        }
        if self.fast_sma >= self.slow_sma {
            return Err(ScanError::InvalidConfig(format!(
                "fast_sma ({}) must be shorter than slow_sma ({})",
                self.fast_sma.get(),
                self.slow_sma.get()
            )));
        }
        Ok(())
    }
}

impl ParameterizedDetector for QullamaggieBreakoutDetector {
    fn param_meta() -> &'static [ParamMeta] {
        const META: &[ParamMeta] = &[
            ParamMeta::period(
                "lookback",
                20.0,
                (10.0, 60.0, 5.0),
                "Bars defining the prior high and volume baseline",
            ),
            ParamMeta::factor(
                "volume_multiplier",
                1.5,
                (1.0, 3.0, 0.25),
                "Minimum volume vs the lookback average",
            ),
        ];
        META
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        let detector = Self {
            lookback: get_period(params, "lookback", 20)?,
            volume_multiplier: get_value(params, "volume_multiplier", 1.5),
            ..Self::default()
        };
        detector.validate_config()?;
        Ok(detector)
    }

    fn pattern_id_str() -> &'static str {
        "QULLAMAGGIE_BREAKOUT"
    }
}
