//! Abnormal volume detectors: tiered volume spikes and volume surges
//! paired with a significant price move.

use std::collections::HashMap;

use super::helpers::tail;
use crate::{
    indicators,
    params::{get_period, get_value, ParamMeta, ParameterizedDetector},
    Direction, PatternDetector, PatternId, Period, Result, ScanError, OHLCV,
};

// ============================================================
// EXPLOSIVE VOLUME
// ============================================================

/// Spike tier. Tiers nest: any series flagged at 10x is also flagged at 5x
/// and 3x.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpikeTier {
    X3,
    X5,
    X10,
}

impl SpikeTier {
    pub fn id(self) -> PatternId {
        match self {
            SpikeTier::X3 => PatternId("EXPLOSIVE_VOLUME_3X"),
            SpikeTier::X5 => PatternId("EXPLOSIVE_VOLUME_5X"),
            SpikeTier::X10 => PatternId("EXPLOSIVE_VOLUME_10X"),
        }
    }

    #[inline]
    pub fn threshold(self) -> f64 {
        match self {
            SpikeTier::X3 => 3.0,
            SpikeTier::X5 => 5.0,
            SpikeTier::X10 => 10.0,
        }
    }
}

/// Today's volume vs the average of the preceding `lookback` bars.
#[derive(Debug, Clone)]
pub struct ExplosiveVolumeDetector {
    pub tier: SpikeTier,
    /// Minimum volume ratio; defaults to the tier's threshold
    pub threshold: f64,
    pub lookback: Period,
}

impl ExplosiveVolumeDetector {
    fn tiered(tier: SpikeTier) -> Self {
        Self {
            tier,
            threshold: tier.threshold(),
            lookback: Period::new_const(20),
        }
    }

    /// Major spike: volume >= 3x average
    pub fn x3() -> Self {
        Self::tiered(SpikeTier::X3)
    }

    /// Extreme spike: volume >= 5x average
    pub fn x5() -> Self {
        Self::tiered(SpikeTier::X5)
    }

    /// Massive spike: volume >= 10x average
    pub fn x10() -> Self {
        Self::tiered(SpikeTier::X10)
    }
}

impl Default for ExplosiveVolumeDetector {
    fn default() -> Self {
        Self::x3()
    }
}

impl PatternDetector for ExplosiveVolumeDetector {
    fn id(&self) -> PatternId {
        self.tier.id()
    }

    fn min_bars(&self) -> usize {
        self.lookback.get() + 1
    }

    fn detect<T: OHLCV>(&self, bars: &[T]) -> Option<Direction> {
        let ratio = volume_ratio(bars, self.lookback.get())?;
        (ratio >= self.threshold).then_some(Direction::Bullish)
    }

    fn validate_config(&self) -> Result<()> {
        if !self.threshold.is_finite() || self.threshold <= 0.0 {
            return Err(ScanError::InvalidConfig(format!(
                "threshold must be positive, got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

/// Today's volume over the mean of the preceding `lookback` bars. `None`
/// when the series is too short or the average is zero.
fn volume_ratio<T: OHLCV>(bars: &[T], lookback: usize) -> Option<f64> {
    if bars.len() < lookback + 1 {
        return None;
    }
    let window = tail(bars, lookback + 1);
    let volumes: Vec<f64> = window.iter().map(|b| b.volume()).collect();
    let today = volumes[volumes.len() - 1];
    let avg = indicators::mean(&volumes[..volumes.len() - 1])?;
    if avg == 0.0 {
        return None;
    }
    Some(today / avg)
}

// ============================================================
// VOLUME SURGE WITH PRICE
// ============================================================

/// Volume surge (3x+ by default) paired with a significant open-to-close
/// move. The sign of the move selects the direction.
#[derive(Debug, Clone)]
pub struct VolumeSurgeDetector {
    /// Minimum volume ratio vs the trailing average
    pub volume_factor: f64,
    /// Minimum absolute open-to-close change, in percent
    pub min_price_change_pct: f64,
    pub lookback: Period,
}

impl Default for VolumeSurgeDetector {
    fn default() -> Self {
        Self {
            volume_factor: 3.0,
            min_price_change_pct: 2.0,
            lookback: Period::new_const(20),
        }
    }
}

impl_with_defaults!(VolumeSurgeDetector);

impl PatternDetector for VolumeSurgeDetector {
    fn id(&self) -> PatternId {
        PatternId("VOLUME_SURGE_WITH_PRICE")
    }

    fn min_bars(&self) -> usize {
        self.lookback.get() + 1
    }

    fn detect<T: OHLCV>(&self, bars: &[T]) -> Option<Direction> {
        let ratio = volume_ratio(bars, self.lookback.get())?;
        if ratio < self.volume_factor {
            return None;
        }

        let today = bars.last()?;
        let open = today.open();
        if open <= 0.0 || !open.is_finite() {
            return None;
        }
        let change_pct = (today.close() - open) / open * 100.0;
        if !change_pct.is_finite() || change_pct.abs() < self.min_price_change_pct {
            return None;
        }

        Some(if change_pct > 0.0 {
            Direction::Bullish
        } else {
            Direction::Bearish
        })
    }

    fn validate_config(&self) -> Result<()> {
        if !self.volume_factor.is_finite() || self.volume_factor <= 0.0 {
            return Err(ScanError::InvalidConfig(format!(
                "volume_factor must be positive, got {}",
                self.volume_factor
            )));
        }
        if !self.min_price_change_pct.is_finite() || self.min_price_change_pct < 0.0 {
            return Err(ScanError::InvalidConfig(format!(
                "min_price_change_pct must be non-negative, got {}",
                self.min_price_change_pct
            )));
        }
        Ok(())
    }
}

impl ParameterizedDetector for VolumeSurgeDetector {
    fn param_meta() -> &'static [ParamMeta] {
        const META: &[ParamMeta] = &[
            ParamMeta::factor(
                "volume_factor",
                3.0,
                (2.0, 10.0, 0.5),
                "Minimum volume ratio vs the trailing average",
            ),
            ParamMeta::factor(
                "min_price_change_pct",
                2.0,
                (0.5, 5.0, 0.5),
                "Minimum absolute open-to-close change in percent",
            ),
            ParamMeta::period(
                "lookback",
                20.0,
                (10.0, 50.0, 5.0),
                "Bars in the trailing volume average",
            ),
        ];
        META
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        let detector = Self {
            volume_factor: get_value(params, "volume_factor", 3.0),
            min_price_change_pct: get_value(params, "min_price_change_pct", 2.0),
            lookback: get_period(params, "lookback", 20)?,
        };
        detector.validate_config()?;
        Ok(detector)
    }

    fn pattern_id_str() -> &'static str {
        "VOLUME_SURGE_WITH_PRICE"
    }
}
