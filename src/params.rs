//! Parameter metadata for pattern detectors
//!
//! This module makes detector thresholds explicit per-call configuration:
//! every tunable ships with a name, a default and an optimization range, so
//! relaxed "testing" regimes and strict "production" regimes are
//! reproducible inputs rather than embedded constants.
//!
//! # Example
//!
//! ```rust
//! use swingscan::params::{ParamMeta, ParamType, ParameterizedDetector};
//! use swingscan::prelude::*;
//!
//! // Get parameter metadata for a detector
//! let params = QullamaggieBreakoutDetector::param_meta();
//! for param in params {
//!     println!("{}: {:?} (default: {})", param.name, param.param_type, param.default);
//! }
//! ```

use std::collections::HashMap;

use crate::{Period, Ratio, Result, ScanError};

// ============================================================
// PARAMETER TYPES
// ============================================================

/// Type of parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// Fractional value (0.0..=1.0), e.g. a depth or tolerance
    Ratio,
    /// Period value (positive integer)
    Period,
    /// Unbounded positive value, e.g. a volume multiplier or percent move
    Factor,
}

/// Metadata for a single detector parameter
#[derive(Debug, Clone)]
pub struct ParamMeta {
    /// Parameter name (e.g., "volume_multiplier")
    pub name: &'static str,
    /// Parameter type
    pub param_type: ParamType,
    /// Default value
    pub default: f64,
    /// Range for optimization: (min, max, step)
    pub range: (f64, f64, f64),
    /// Human-readable description
    pub description: &'static str,
}

impl ParamMeta {
    /// Create a new ParamMeta for a Ratio parameter
    pub const fn ratio(
        name: &'static str,
        default: f64,
        range: (f64, f64, f64),
        description: &'static str,
    ) -> Self {
        Self {
            name,
            param_type: ParamType::Ratio,
            default,
            range,
            description,
        }
    }

    /// Create a new ParamMeta for a Period parameter
    pub const fn period(
        name: &'static str,
        default: f64,
        range: (f64, f64, f64),
        description: &'static str,
    ) -> Self {
        Self {
            name,
            param_type: ParamType::Period,
            default,
            range,
            description,
        }
    }

    /// Create a new ParamMeta for a Factor parameter
    pub const fn factor(
        name: &'static str,
        default: f64,
        range: (f64, f64, f64),
        description: &'static str,
    ) -> Self {
        Self {
            name,
            param_type: ParamType::Factor,
            default,
            range,
            description,
        }
    }

    /// Generate all values for grid search
    pub fn generate_grid(&self) -> Vec<f64> {
        let (min, max, step) = self.range;
        let mut values = Vec::new();
        let mut v = min;
        while v <= max + f64::EPSILON {
            values.push(v);
            v += step;
        }
        values
    }

    /// Validate a value for this parameter
    pub fn validate(&self, value: f64) -> Result<()> {
        let (min, max, _) = self.range;
        if value < min || value > max {
            return Err(ScanError::OutOfRange {
                field: self.name,
                value,
                min,
                max,
            });
        }
        match self.param_type {
            ParamType::Ratio | ParamType::Factor => Ok(()),
            ParamType::Period => {
                if value < 1.0 || value.fract() != 0.0 {
                    return Err(ScanError::InvalidValue("Period must be a positive integer"));
                }
                Ok(())
            }
        }
    }
}

// ============================================================
// PARAMETERIZED DETECTOR TRAIT
// ============================================================

/// Trait for detectors that support parameterization
///
/// Implementing this trait enables:
/// - Discovery of available parameters
/// - Creation of detectors with custom parameter values
/// - Grid search optimization
pub trait ParameterizedDetector: Sized {
    /// Returns metadata for all configurable parameters
    fn param_meta() -> &'static [ParamMeta];

    /// Creates a detector with parameters from a HashMap
    ///
    /// Missing parameters use their default values.
    fn with_params(params: &HashMap<&str, f64>) -> Result<Self>;

    /// Returns the pattern ID string
    fn pattern_id_str() -> &'static str;
}

// ============================================================
// PARAMETER VALUE HELPERS
// ============================================================

/// Helper to get a Ratio from params with default fallback
pub fn get_ratio(params: &HashMap<&str, f64>, key: &str, default: f64) -> Result<Ratio> {
    let value = params.get(key).copied().unwrap_or(default);
    Ratio::new(value)
}

/// Helper to get a Period from params with default fallback
pub fn get_period(params: &HashMap<&str, f64>, key: &str, default: usize) -> Result<Period> {
    let value = params.get(key).copied().unwrap_or(default as f64);
    Period::new(value as usize)
}

/// Helper to get a raw value from params with default fallback
pub fn get_value(params: &HashMap<&str, f64>, key: &str, default: f64) -> f64 {
    params.get(key).copied().unwrap_or(default)
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_meta_ratio() {
        let meta = ParamMeta::ratio("cup_depth_min", 0.12, (0.05, 0.2, 0.01), "Minimum cup depth");

        assert_eq!(meta.name, "cup_depth_min");
        assert_eq!(meta.param_type, ParamType::Ratio);
        assert_eq!(meta.default, 0.12);
    }

    #[test]
    fn test_generate_grid() {
        let meta = ParamMeta::factor("volume_multiplier", 1.5, (1.0, 2.0, 0.5), "Test");

        let grid = meta.generate_grid();
        assert_eq!(grid.len(), 3);
        assert!((grid[0] - 1.0).abs() < f64::EPSILON);
        assert!((grid[2] - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_validate_factor() {
        let meta = ParamMeta::factor("volume_multiplier", 1.5, (1.0, 3.0, 0.5), "Test");

        assert!(meta.validate(1.5).is_ok());
        assert!(meta.validate(3.0).is_ok());
        assert!(meta.validate(0.5).is_err());
        assert!(meta.validate(3.5).is_err());
    }

    #[test]
    fn test_validate_period() {
        let meta = ParamMeta::period("lookback", 20.0, (10.0, 30.0, 5.0), "Test");

        assert!(meta.validate(20.0).is_ok());
        assert!(meta.validate(20.5).is_err());
        assert!(meta.validate(5.0).is_err());
    }

    #[test]
    fn test_get_helpers() {
        let mut params = HashMap::new();
        params.insert("a", 0.8);
        params.insert("b", 25.0);

        assert!((get_ratio(&params, "a", 0.5).unwrap().get() - 0.8).abs() < f64::EPSILON);
        assert!((get_ratio(&params, "missing", 0.5).unwrap().get() - 0.5).abs() < f64::EPSILON);
        assert_eq!(get_period(&params, "b", 14).unwrap().get(), 25);
        assert_eq!(get_period(&params, "missing", 14).unwrap().get(), 14);
        assert_eq!(get_value(&params, "missing", 2.0), 2.0);
    }
}
