//! Pattern detectors
//!
//! Each detector evaluates the latest bar of an OHLCV series against one
//! pattern and yields a directional signal, or `None` when its
//! preconditions are unmet.
//!
//! # Detector Families
//!
//! - **Trend (3)**: SuperTrend flip at 1/2/3-day freshness.
//! - **Shape (5)**: cup-and-handle, ascending triangle, double bottom,
//!   bull/bear flag.
//! - **Momentum (3)**: momentum burst at 1/3/5-day spans.
//! - **Volume (4)**: explosive volume at 3x/5x/10x, volume surge + price.
//! - **Breakout (1)**: Qullamaggie-style multi-condition breakout.
//! - **Candlestick (8)**: classic candle patterns via the sign adapter.

pub mod helpers;

/// Generate `with_defaults()` -> `Self::default()` for multiple detector types.
macro_rules! impl_with_defaults {
  ($($detector:ty),* $(,)?) => {
    $(impl $detector {
      pub fn with_defaults() -> Self { Self::default() }
    })*
  };
}

pub mod breakout;
pub mod candle;
pub mod momentum;
pub mod shape;
pub mod trend;
pub mod volume;

// Re-export all detectors for convenience
pub use breakout::*;
pub use candle::*;
pub use helpers::*;
pub use momentum::*;
pub use shape::*;
pub use trend::*;
pub use volume::*;
