//! Chart shape detectors: cup-and-handle, ascending triangle, double
//! bottom, and bull/bear flags.
//!
//! Each detector scans a trailing window of the series for the first
//! chronologically qualifying candidate. First-match is the documented
//! selection rule: an earlier, weaker formation wins over a later, stronger
//! one. Extrema are strict order-N local maxima/minima on the price path.

use std::collections::HashMap;

use super::helpers::{argmin_in, local_maxima, local_minima, pct_change, relative_spread, tail};
use crate::{
    params::{get_period, get_ratio, ParamMeta, ParameterizedDetector},
    Direction, PatternDetector, PatternId, Period, Ratio, Result, OHLCV,
};

impl_with_defaults!(
    CupAndHandleDetector,
    AscendingTriangleDetector,
    DoubleBottomDetector,
    BullFlagDetector,
    BearFlagDetector,
);

// ============================================================
// CUP AND HANDLE
// ============================================================

/// Cup-and-handle: two rims of similar height around a rounded bottom,
/// followed by a shallow handle pullback, with price back near the rim.
#[derive(Debug, Clone)]
pub struct CupAndHandleDetector {
    /// Trailing bars examined for the formation
    pub window: Period,
    /// Neighborhood half-width for rim/bottom extrema
    pub extrema_order: Period,
    /// Cup depth bounds as a fraction of the left rim
    pub cup_depth_min: Ratio,
    pub cup_depth_max: Ratio,
    /// Handle depth cap relative to the cup depth
    pub handle_depth_max: Ratio,
    /// Rim height mismatch tolerance
    pub rim_tolerance: Ratio,
    /// How close the current price must be to the right rim
    pub breakout_proximity: Ratio,
    /// Series shorter than this cannot hold the formation
    pub min_history: Period,
}

impl Default for CupAndHandleDetector {
    fn default() -> Self {
        Self {
            window: Period::new_const(120),
            extrema_order: Period::new_const(5),
            cup_depth_min: Ratio::new_const(0.12),
            cup_depth_max: Ratio::new_const(0.33),
            handle_depth_max: Ratio::new_const(0.5),
            rim_tolerance: Ratio::new_const(0.05),
            breakout_proximity: Ratio::new_const(0.03),
            min_history: Period::new_const(60),
        }
    }
}

impl PatternDetector for CupAndHandleDetector {
    fn id(&self) -> PatternId {
        PatternId("CUP_AND_HANDLE")
    }

    fn min_bars(&self) -> usize {
        self.min_history.get()
    }

    fn detect<T: OHLCV>(&self, bars: &[T]) -> Option<Direction> {
        if bars.len() < self.min_bars() {
            return None;
        }
        let closes: Vec<f64> = tail(bars, self.window.get())
            .iter()
            .map(|b| b.close())
            .collect();
        let order = self.extrema_order.get();

        let maxima = local_maxima(&closes, order);
        let minima = local_minima(&closes, order);
        if maxima.len() < 2 || minima.is_empty() {
            return None;
        }
        let current = *closes.last()?;

        // Search consecutive rim pairs in chronological order
        for pair in maxima.windows(2) {
            let (left, right) = (pair[0], pair[1]);

            // The cup needs a settled bottom between the rims
            if !minima.iter().any(|&m| m > left && m < right) {
                continue;
            }
            let bottom = argmin_in(&closes, left..right)?;

            let left_price = closes[left];
            let right_price = closes[right];
            if left_price <= 0.0 || right_price <= 0.0 {
                continue;
            }

            let cup_depth = (left_price - closes[bottom]) / left_price;
            if cup_depth < self.cup_depth_min.get() || cup_depth > self.cup_depth_max.get() {
                continue;
            }
            if (right_price - left_price).abs() / left_price > self.rim_tolerance.get() {
                continue;
            }

            // Handle: pullback after the right rim, at least 5 bars of it
            if right >= closes.len().saturating_sub(5) {
                continue;
            }
            let handle_low = closes[right..]
                .iter()
                .copied()
                .fold(f64::INFINITY, f64::min);
            let handle_depth = (right_price - handle_low) / right_price;
            if handle_depth > cup_depth * self.handle_depth_max.get() {
                continue;
            }

            if current >= right_price * (1.0 - self.breakout_proximity.get()) {
                return Some(Direction::Bullish);
            }
        }

        None
    }
}

impl ParameterizedDetector for CupAndHandleDetector {
    fn param_meta() -> &'static [ParamMeta] {
        const META: &[ParamMeta] = &[
            ParamMeta::ratio(
                "cup_depth_min",
                0.12,
                (0.05, 0.25, 0.01),
                "Minimum cup depth as fraction of the left rim",
            ),
            ParamMeta::ratio(
                "cup_depth_max",
                0.33,
                (0.2, 0.5, 0.01),
                "Maximum cup depth as fraction of the left rim",
            ),
            ParamMeta::ratio(
                "handle_depth_max",
                0.5,
                (0.3, 0.7, 0.05),
                "Handle depth cap relative to cup depth",
            ),
            ParamMeta::period(
                "extrema_order",
                5.0,
                (3.0, 10.0, 1.0),
                "Neighborhood half-width for extrema search",
            ),
        ];
        META
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            cup_depth_min: get_ratio(params, "cup_depth_min", 0.12)?,
            cup_depth_max: get_ratio(params, "cup_depth_max", 0.33)?,
            handle_depth_max: get_ratio(params, "handle_depth_max", 0.5)?,
            extrema_order: get_period(params, "extrema_order", 5)?,
            ..Self::default()
        })
    }

    fn pattern_id_str() -> &'static str {
        "CUP_AND_HANDLE"
    }
}

// ============================================================
// ASCENDING TRIANGLE
// ============================================================

/// Flat resistance across recent swing highs with rising swing lows.
#[derive(Debug, Clone)]
pub struct AscendingTriangleDetector {
    pub window: Period,
    pub extrema_order: Period,
    /// Relative spread (std/mean) under which the resistance counts as flat
    pub max_resistance_spread: Ratio,
    pub min_history: Period,
}

impl Default for AscendingTriangleDetector {
    fn default() -> Self {
        Self {
            window: Period::new_const(60),
            extrema_order: Period::new_const(5),
            max_resistance_spread: Ratio::new_const(0.02),
            min_history: Period::new_const(40),
        }
    }
}

impl PatternDetector for AscendingTriangleDetector {
    fn id(&self) -> PatternId {
        PatternId("ASCENDING_TRIANGLE")
    }

    fn min_bars(&self) -> usize {
        self.min_history.get()
    }

    fn detect<T: OHLCV>(&self, bars: &[T]) -> Option<Direction> {
        if bars.len() < self.min_bars() {
            return None;
        }
        let window = tail(bars, self.window.get());
        let highs: Vec<f64> = window.iter().map(|b| b.high()).collect();
        let lows: Vec<f64> = window.iter().map(|b| b.low()).collect();
        let order = self.extrema_order.get();

        let maxima = local_maxima(&highs, order);
        if maxima.len() < 2 {
            return None;
        }

        // Flat top: the last few swing highs sit within a tight band
        let recent = tail(&maxima, if maxima.len() >= 3 { 3 } else { 2 });
        let resistance: Vec<f64> = recent.iter().map(|&i| highs[i]).collect();
        if relative_spread(&resistance)? >= self.max_resistance_spread.get() {
            return None;
        }

        // Rising floor: the last two swing lows make higher lows
        let minima = local_minima(&lows, order);
        if minima.len() < 2 {
            return None;
        }
        let prev_low = lows[minima[minima.len() - 2]];
        let last_low = lows[minima[minima.len() - 1]];
        (last_low > prev_low).then_some(Direction::Bullish)
    }
}

// ============================================================
// DOUBLE BOTTOM
// ============================================================

/// Two swing lows at a similar level with a meaningful peak between them.
#[derive(Debug, Clone)]
pub struct DoubleBottomDetector {
    pub window: Period,
    pub extrema_order: Period,
    /// How closely the two bottoms must match
    pub bottom_tolerance: Ratio,
    /// Minimum bars between the bottoms
    pub min_separation: Period,
    /// The intervening peak must rise at least this far above the first bottom
    pub peak_min_rise: Ratio,
    pub min_history: Period,
}

impl Default for DoubleBottomDetector {
    fn default() -> Self {
        Self {
            window: Period::new_const(80),
            extrema_order: Period::new_const(5),
            bottom_tolerance: Ratio::new_const(0.03),
            min_separation: Period::new_const(5),
            peak_min_rise: Ratio::new_const(0.05),
            min_history: Period::new_const(40),
        }
    }
}

impl PatternDetector for DoubleBottomDetector {
    fn id(&self) -> PatternId {
        PatternId("DOUBLE_BOTTOM")
    }

    fn min_bars(&self) -> usize {
        self.min_history.get()
    }

    fn detect<T: OHLCV>(&self, bars: &[T]) -> Option<Direction> {
        if bars.len() < self.min_bars() {
            return None;
        }
        let lows: Vec<f64> = tail(bars, self.window.get())
            .iter()
            .map(|b| b.low())
            .collect();

        let minima = local_minima(&lows, self.extrema_order.get());
        if minima.len() < 2 {
            return None;
        }

        let first = minima[minima.len() - 2];
        let second = minima[minima.len() - 1];
        let first_price = lows[first];
        if first_price <= 0.0 {
            return None;
        }

        if (first_price - lows[second]).abs() / first_price >= self.bottom_tolerance.get() {
            return None;
        }
        if second <= first + self.min_separation.get() {
            return None;
        }

        // The low path must recover between the bottoms
        let peak = lows[first..second]
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        (peak > first_price * (1.0 + self.peak_min_rise.get())).then_some(Direction::Bullish)
    }
}

// ============================================================
// BULL / BEAR FLAG
// ============================================================

/// Bull flag: a sharp pole up followed by a bounded consolidation, with
/// price still holding the flag's support.
#[derive(Debug, Clone)]
pub struct BullFlagDetector {
    pub window: Period,
    /// Bars forming the pole
    pub pole_len: Period,
    /// Bars forming the flag
    pub flag_len: Period,
    /// Minimum pole move as a fraction of its start
    pub pole_min_gain: Ratio,
    /// Flag range cap relative to the pole's move
    pub flag_max_range: Ratio,
    /// Tolerance below the flag boundary before the setup is invalidated
    pub support_tolerance: Ratio,
    pub min_history: Period,
}

impl Default for BullFlagDetector {
    fn default() -> Self {
        Self {
            window: Period::new_const(50),
            pole_len: Period::new_const(10),
            flag_len: Period::new_const(10),
            pole_min_gain: Ratio::new_const(0.10),
            flag_max_range: Ratio::new_const(0.5),
            support_tolerance: Ratio::new_const(0.02),
            min_history: Period::new_const(30),
        }
    }
}

impl PatternDetector for BullFlagDetector {
    fn id(&self) -> PatternId {
        PatternId("BULL_FLAG")
    }

    fn min_bars(&self) -> usize {
        self.min_history.get()
    }

    fn detect<T: OHLCV>(&self, bars: &[T]) -> Option<Direction> {
        if bars.len() < self.min_bars() {
            return None;
        }
        let closes: Vec<f64> = tail(bars, self.window.get())
            .iter()
            .map(|b| b.close())
            .collect();
        let n = closes.len();
        let pole = self.pole_len.get();
        let flag = self.flag_len.get();
        if n <= pole + flag {
            return None;
        }
        let current = closes[n - 1];

        for i in pole..(n - flag) {
            let Some(gain) = pct_change(closes[i - pole], closes[i]) else {
                continue;
            };
            if gain < self.pole_min_gain.get() {
                continue;
            }

            let section = &closes[i..i + flag];
            let lo = section.iter().copied().fold(f64::INFINITY, f64::min);
            let hi = section.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            if hi <= 0.0 {
                continue;
            }

            if (hi - lo) / hi < gain * self.flag_max_range.get()
                && current >= lo * (1.0 - self.support_tolerance.get())
            {
                return Some(Direction::Bullish);
            }
        }

        None
    }
}

/// Bear flag: mirror of [`BullFlagDetector`] - a sharp pole down, a bounded
/// bounce, and price still capped by the flag's resistance.
#[derive(Debug, Clone)]
pub struct BearFlagDetector {
    pub window: Period,
    pub pole_len: Period,
    pub flag_len: Period,
    /// Minimum pole decline as a fraction of its start
    pub pole_min_decline: Ratio,
    /// Flag bounce cap relative to the pole's move
    pub flag_max_range: Ratio,
    /// Tolerance above the flag boundary before the setup is invalidated
    pub resistance_tolerance: Ratio,
    pub min_history: Period,
}

impl Default for BearFlagDetector {
    fn default() -> Self {
        Self {
            window: Period::new_const(50),
            pole_len: Period::new_const(10),
            flag_len: Period::new_const(10),
            pole_min_decline: Ratio::new_const(0.10),
            flag_max_range: Ratio::new_const(0.5),
            resistance_tolerance: Ratio::new_const(0.02),
            min_history: Period::new_const(30),
        }
    }
}

impl PatternDetector for BearFlagDetector {
    fn id(&self) -> PatternId {
        PatternId("BEAR_FLAG")
    }

    fn min_bars(&self) -> usize {
        self.min_history.get()
    }

    fn detect<T: OHLCV>(&self, bars: &[T]) -> Option<Direction> {
        if bars.len() < self.min_bars() {
            return None;
        }
        let closes: Vec<f64> = tail(bars, self.window.get())
            .iter()
            .map(|b| b.close())
            .collect();
        let n = closes.len();
        let pole = self.pole_len.get();
        let flag = self.flag_len.get();
        if n <= pole + flag {
            return None;
        }
        let current = closes[n - 1];

        for i in pole..(n - flag) {
            let Some(change) = pct_change(closes[i - pole], closes[i]) else {
                continue;
            };
            let decline = -change;
            if decline < self.pole_min_decline.get() {
                continue;
            }

            let section = &closes[i..i + flag];
            let lo = section.iter().copied().fold(f64::INFINITY, f64::min);
            let hi = section.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            if lo <= 0.0 {
                continue;
            }

            // Bounce measured off the flag low
            if (hi - lo) / lo < decline * self.flag_max_range.get()
                && current <= hi * (1.0 + self.resistance_tolerance.get())
            {
                return Some(Direction::Bearish);
            }
        }

        None
    }
}
