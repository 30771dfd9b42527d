//! SuperTrend flip detectors.
//!
//! Scans the tail of the trend-state series for a bearish-to-bullish flip
//! and additionally requires the direction to still be bullish at the
//! latest bar: a flip that has since reversed does not count. "Fresh"
//! (1 day) and "recent" (2 days) are parameterizations of the same rule.

use crate::{
    supertrend::{is_bullish_flip, supertrend},
    Direction, PatternDetector, PatternId, Period, Result, ScanError, OHLCV,
};

#[derive(Debug, Clone)]
pub struct SupertrendFlipDetector {
    pub atr_period: Period,
    pub multiplier: f64,
    /// Maximum bars since the flip
    pub max_days_ago: Period,
    /// Series shorter than this yield no signal
    pub min_history: Period,
}

impl SupertrendFlipDetector {
    fn with_freshness(max_days_ago: usize) -> Self {
        Self {
            atr_period: Period::new_const(crate::supertrend::DEFAULT_ATR_PERIOD),
            multiplier: crate::supertrend::DEFAULT_MULTIPLIER,
            max_days_ago: Period::new_const(max_days_ago),
            min_history: Period::new_const(50),
        }
    }

    /// Flip within the last 3 bars
    pub fn bullish() -> Self {
        Self::with_freshness(3)
    }

    /// Flip within the last 2 bars
    pub fn recent() -> Self {
        Self::with_freshness(2)
    }

    /// Flip on the last or previous bar (freshest signals)
    pub fn fresh() -> Self {
        Self::with_freshness(1)
    }
}

impl Default for SupertrendFlipDetector {
    fn default() -> Self {
        Self::bullish()
    }
}

impl PatternDetector for SupertrendFlipDetector {
    fn id(&self) -> PatternId {
        match self.max_days_ago.get() {
            1 => PatternId("SUPERTREND_FRESH"),
            2 => PatternId("SUPERTREND_RECENT"),
            _ => PatternId("SUPERTREND_BULLISH"),
        }
    }

    fn min_bars(&self) -> usize {
        self.min_history.get()
    }

    fn detect<T: OHLCV>(&self, bars: &[T]) -> Option<Direction> {
        if bars.len() < self.min_bars() {
            return None;
        }

        let points = supertrend(bars, self.atr_period.get(), self.multiplier);
        let latest = points.last()?.as_ref()?;
        if !latest.is_bullish() {
            return None;
        }

        let n = points.len();
        let start = n.saturating_sub(self.max_days_ago.get() + 1);
        (start..n)
            .any(|i| is_bullish_flip(&points, i))
            .then_some(Direction::Bullish)
    }

    fn validate_config(&self) -> Result<()> {
        if !self.multiplier.is_finite() || self.multiplier <= 0.0 {
            return Err(ScanError::InvalidConfig(format!(
                "multiplier must be positive, got {}",
                self.multiplier
            )));
        }
        Ok(())
    }
}
