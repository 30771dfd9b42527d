//! Stockbee-style momentum burst detectors.
//!
//! Explosive short-term moves with volume confirmation: a 4%+ one-day move
//! on double volume, or sustained 6%/8% moves over three/five days with
//! elevated average volume. All spans require the close at or above its
//! 20-bar SMA - a close below the short-term trend never fires, regardless
//! of the move or the volume.

use super::helpers::tail;
use crate::{indicators, Direction, PatternDetector, PatternId, Period, Result, ScanError, OHLCV};

/// Burst horizon in bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BurstSpan {
    OneDay,
    ThreeDay,
    FiveDay,
}

impl BurstSpan {
    /// Bars back to the reference close.
    #[inline]
    pub fn offset(self) -> usize {
        match self {
            BurstSpan::OneDay => 1,
            BurstSpan::ThreeDay => 3,
            BurstSpan::FiveDay => 5,
        }
    }

    pub fn id(self) -> PatternId {
        match self {
            BurstSpan::OneDay => PatternId("MOMENTUM_BURST_1D"),
            BurstSpan::ThreeDay => PatternId("MOMENTUM_BURST_3D"),
            BurstSpan::FiveDay => PatternId("MOMENTUM_BURST_5D"),
        }
    }
}

/// Momentum burst at one span. The span picks the percent-change horizon
/// and the flavor of the volume gate: the one-day burst demands a same-bar
/// spike, the multi-day bursts demand an elevated short average.
#[derive(Debug, Clone)]
pub struct MomentumBurstDetector {
    pub span: BurstSpan,
    /// Minimum percent change over the span
    pub min_change_pct: f64,
    /// Volume requirement vs the 20-bar average
    pub volume_factor: f64,
    pub sma_period: Period,
    pub volume_period: Period,
    /// Trailing bars the burst is evaluated over
    pub window: Period,
}

impl MomentumBurstDetector {
    /// Explosive 1-day move: 4%+ on 2x volume
    pub fn one_day() -> Self {
        Self {
            span: BurstSpan::OneDay,
            min_change_pct: 4.0,
            volume_factor: 2.0,
            sma_period: Period::new_const(20),
            volume_period: Period::new_const(20),
            window: Period::new_const(30),
        }
    }

    /// Sustained 3-day move: 6%+ with 1.5x average volume
    pub fn three_day() -> Self {
        Self {
            span: BurstSpan::ThreeDay,
            min_change_pct: 6.0,
            volume_factor: 1.5,
            ..Self::one_day()
        }
    }

    /// Strong 5-day move: 8%+ with 1.3x average volume
    pub fn five_day() -> Self {
        Self {
            span: BurstSpan::FiveDay,
            min_change_pct: 8.0,
            volume_factor: 1.3,
            ..Self::one_day()
        }
    }
}

impl Default for MomentumBurstDetector {
    fn default() -> Self {
        Self::one_day()
    }
}

impl PatternDetector for MomentumBurstDetector {
    fn id(&self) -> PatternId {
        self.span.id()
    }

    fn min_bars(&self) -> usize {
        self.sma_period.get()
    }

    fn detect<T: OHLCV>(&self, bars: &[T]) -> Option<Direction> {
        if bars.len() < self.min_bars() {
            return None;
        }
        let window = tail(bars, self.window.get());
        let closes: Vec<f64> = window.iter().map(|b| b.close()).collect();
        let volumes: Vec<f64> = window.iter().map(|b| b.volume()).collect();
        let n = closes.len();

        let price = closes[n - 1];
        let volume = volumes[n - 1];
        let sma = indicators::mean(tail(&closes, self.sma_period.get()))?;
        if !price.is_finite() || !volume.is_finite() || !sma.is_finite() {
            return None;
        }

        let avg_volume = indicators::mean(tail(&volumes, self.volume_period.get()))?;
        if avg_volume == 0.0 {
            return None;
        }

        // Short-term trend gate
        if price < sma {
            return None;
        }

        let offset = self.span.offset();
        if n < offset + 1 {
            return None;
        }
        let reference = closes[n - 1 - offset];
        if reference <= 0.0 {
            return None;
        }
        let change_pct = (price - reference) / reference * 100.0;
        if change_pct < self.min_change_pct {
            return None;
        }

        let volume_ok = match self.span {
            BurstSpan::OneDay => volume / avg_volume >= self.volume_factor,
            BurstSpan::ThreeDay => {
                indicators::mean(tail(&volumes, 3))? >= avg_volume * self.volume_factor
            }
            BurstSpan::FiveDay => {
                indicators::mean(tail(&volumes, 5))? >= avg_volume * self.volume_factor
            }
        };

        volume_ok.then_some(Direction::Bullish)
    }

    fn validate_config(&self) -> Result<()> {
        if !self.min_change_pct.is_finite() || self.min_change_pct <= 0.0 {
            return Err(ScanError::InvalidConfig(format!(
                "min_change_pct must be positive, got {}",
                self.min_change_pct
            )));
        }
        if !self.volume_factor.is_finite() || self.volume_factor <= 0.0 {
            return Err(ScanError::InvalidConfig(format!(
                "volume_factor must be positive, got {}",
                self.volume_factor
            )));
        }
        Ok(())
    }
}
