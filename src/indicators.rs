//! Derived-series indicator functions shared across detectors.
//!
//! Every series function is pure and aligned 1:1 with its input: the leading
//! entries are `None` until the lookback window fills, and arithmetic
//! degeneracy (empty or zero denominators) yields `None` rather than an
//! error. Callers treat `None` as "no signal".

use crate::OHLCV;

/// Arithmetic mean. `None` on an empty slice.
#[inline]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Rolling mean over a trailing window of `period` values.
///
/// Entry `i` averages `values[i+1-period ..= i]`; entries before the window
/// fills are `None`. A zero period yields all `None`.
pub fn rolling_mean(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 {
        return out;
    }
    for i in (period - 1)..values.len() {
        out[i] = mean(&values[i + 1 - period..=i]);
    }
    out
}

/// Simple moving average of closes.
pub fn sma<T: OHLCV>(bars: &[T], period: usize) -> Vec<Option<f64>> {
    let closes: Vec<f64> = bars.iter().map(|b| b.close()).collect();
    rolling_mean(&closes, period)
}

/// True range series. Bar 0 has no prior close and falls back to high-low.
pub fn true_range<T: OHLCV>(bars: &[T]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            let hl = bar.high() - bar.low();
            if i == 0 {
                return hl;
            }
            let prev_close = bars[i - 1].close();
            hl.max((bar.high() - prev_close).abs())
                .max((bar.low() - prev_close).abs())
        })
        .collect()
}

/// Average True Range: rolling mean of the true range.
pub fn atr<T: OHLCV>(bars: &[T], period: usize) -> Vec<Option<f64>> {
    rolling_mean(&true_range(bars), period)
}

/// Relative Strength Index with Wilder smoothing.
///
/// First value at index `period`; earlier entries are `None`. A window with
/// no movement at all scores 0 (gain and loss both zero).
pub fn rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; closes.len()];
    if period == 0 || closes.len() <= period {
        return out;
    }

    let changes: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();

    let mut avg_gain = changes[..period]
        .iter()
        .map(|c| c.max(0.0))
        .sum::<f64>()
        / period as f64;
    let mut avg_loss = changes[..period]
        .iter()
        .map(|c| (-c).max(0.0))
        .sum::<f64>()
        / period as f64;

    out[period] = rsi_value(avg_gain, avg_loss);

    for (i, change) in changes.iter().enumerate().skip(period) {
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);
        avg_gain = (avg_gain * (period - 1) as f64 + gain) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + loss) / period as f64;
        out[i + 1] = rsi_value(avg_gain, avg_loss);
    }

    out
}

#[inline]
fn rsi_value(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    let total = avg_gain + avg_loss;
    if !total.is_finite() {
        return None;
    }
    if total <= 0.0 {
        return Some(0.0);
    }
    Some(100.0 * avg_gain / total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy)]
    struct B {
        h: f64,
        l: f64,
        c: f64,
    }

    impl OHLCV for B {
        fn open(&self) -> f64 {
            self.c
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
            0.0
        }
    }

    #[test]
    fn test_mean_empty_is_none() {
        assert!(mean(&[]).is_none());
        assert_eq!(mean(&[2.0, 4.0]), Some(3.0));
    }

    #[test]
    fn test_rolling_mean_alignment() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        let out = rolling_mean(&values, 3);
        assert_eq!(out.len(), values.len());
        assert_eq!(&out[..2], &[None, None]);
        assert_eq!(out[2], Some(2.0));
        assert_eq!(out[4], Some(4.0));
    }

    #[test]
    fn test_rolling_mean_zero_period() {
        let out = rolling_mean(&[1.0, 2.0], 0);
        assert_eq!(out, vec![None, None]);
    }

    #[test]
    fn test_sma_matches_rolling_mean_of_closes() {
        let bars: Vec<B> = (0..6)
            .map(|i| B {
                h: 101.0 + i as f64,
                l: 99.0 + i as f64,
                c: 100.0 + i as f64,
            })
            .collect();
        let out = sma(&bars, 3);
        assert_eq!(out[1], None);
        assert_eq!(out[2], Some(101.0));
        assert_eq!(out[5], Some(104.0));
    }

    #[test]
    fn test_true_range_uses_prior_close() {
        let bars = [
            B { h: 12.0, l: 10.0, c: 11.0 },
            // Gap up: TR must stretch down to the prior close
            B { h: 15.0, l: 14.0, c: 14.5 },
        ];
        let tr = true_range(&bars);
        assert_eq!(tr[0], 2.0);
        assert_eq!(tr[1], 4.0); // high - prev_close
    }

    #[test]
    fn test_atr_warmup() {
        let bars: Vec<B> = (0..10)
            .map(|i| B {
                h: 101.0 + i as f64,
                l: 99.0 + i as f64,
                c: 100.0 + i as f64,
            })
            .collect();
        let atr = atr(&bars, 5);
        assert!(atr[3].is_none());
        assert!(atr[4].is_some());
    }

    #[test]
    fn test_rsi_warmup_and_bounds() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + (i % 7) as f64).collect();
        let out = rsi(&closes, 14);
        assert!(out[13].is_none());
        for value in out.iter().flatten() {
            assert!((0.0..=100.0).contains(value));
        }
    }

    #[test]
    fn test_rsi_all_gains_is_100() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let out = rsi(&closes, 14);
        assert_eq!(out[14], Some(100.0));
    }

    #[test]
    fn test_rsi_flat_is_zero() {
        let closes = vec![50.0; 20];
        let out = rsi(&closes, 14);
        assert_eq!(out[14], Some(0.0));
    }
}
