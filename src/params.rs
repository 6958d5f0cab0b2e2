//! Parameter metadata for formation detectors
//!
//! This module provides metadata about detector parameters, enabling:
//! - Grid search over thresholds
//! - Parameter documentation
//! - Building detectors from flat key/value configuration
//!
//! # Example
//!
//! ```rust
//! use chartscan::params::{ParamMeta, ParamType, ParameterizedDetector};
//! use chartscan::prelude::*;
//!
//! for param in BullFlagDetector::param_meta() {
//!     println!("{}: {:?} (default: {})", param.name, param.param_type, param.default);
//! }
//! ```

use std::collections::HashMap;

use crate::{PatternError, PatternKind, Period, Ratio, Result};

// ============================================================
// PARAMETER TYPES
// ============================================================

/// Type of parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
  /// Fraction in 0.0..=1.0
  Ratio,
  /// Positive integer window or count
  Period,
  /// Positive, finite multiplier with no upper bound
  Factor,
  /// On/off switch, 0.0 is off and 1.0 is on
  Flag,
}

/// Metadata for a single detector parameter
#[derive(Debug, Clone)]
pub struct ParamMeta {
  /// Parameter name (e.g., "shoulder_tolerance")
  pub name: &'static str,
  pub param_type: ParamType,
  pub default: f64,
  /// Range for optimization: (min, max, step)
  pub range: (f64, f64, f64),
  pub description: &'static str,
}

impl ParamMeta {
  pub const fn ratio(
    name: &'static str,
    default: f64,
    range: (f64, f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type: ParamType::Ratio, default, range, description }
  }

  pub const fn period(
    name: &'static str,
    default: f64,
    range: (f64, f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type: ParamType::Period, default, range, description }
  }

  pub const fn factor(
    name: &'static str,
    default: f64,
    range: (f64, f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type: ParamType::Factor, default, range, description }
  }

  pub const fn flag(name: &'static str, default: bool, description: &'static str) -> Self {
    let default = if default { 1.0 } else { 0.0 };
    Self { name, param_type: ParamType::Flag, default, range: (0.0, 1.0, 1.0), description }
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
      return Err(PatternError::OutOfRange { field: self.name, value, min, max });
    }
    match self.param_type {
      ParamType::Ratio | ParamType::Factor => Ok(()),
      ParamType::Period => {
        if value < 1.0 || value.fract() != 0.0 {
          return Err(PatternError::InvalidValue("Period must be a positive integer"));
        }
        Ok(())
      },
      ParamType::Flag => {
        if value != 0.0 && value != 1.0 {
          return Err(PatternError::InvalidValue("Flag must be 0 or 1"));
        }
        Ok(())
      },
    }
  }
}

// ============================================================
// PARAMETERIZED DETECTOR TRAIT
// ============================================================

/// Trait for detectors that support parameterization
pub trait ParameterizedDetector: Sized {
  /// Returns metadata for all configurable parameters
  fn param_meta() -> &'static [ParamMeta];

  /// Creates a detector with parameters from a HashMap
  ///
  /// Missing parameters use their default values.
  fn with_params(params: &HashMap<&str, f64>) -> Result<Self>;

  fn pattern_kind() -> PatternKind;
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
  if value < 1.0 || value.fract() != 0.0 {
    return Err(PatternError::InvalidValue("Period must be a positive integer"));
  }
  Period::new(value as usize)
}

/// Helper to get a positive multiplier from params with default fallback
pub fn get_factor(params: &HashMap<&str, f64>, key: &'static str, default: f64) -> Result<f64> {
  let value = params.get(key).copied().unwrap_or(default);
  check_factor(key, value)?;
  Ok(value)
}

/// Helper to get an on/off switch from params with default fallback.
/// Only 0.0 and 1.0 are accepted.
pub fn get_flag(params: &HashMap<&str, f64>, key: &str, default: bool) -> Result<bool> {
  match params.get(key).copied() {
    None => Ok(default),
    Some(v) if v == 0.0 => Ok(false),
    Some(v) if v == 1.0 => Ok(true),
    Some(_) => Err(PatternError::InvalidValue("Flag must be 0 or 1")),
  }
}

/// Multipliers must be finite and strictly positive
pub(crate) fn check_factor(field: &'static str, value: f64) -> Result<()> {
  if !value.is_finite() {
    return Err(PatternError::InvalidValue("Factor must be finite"));
  }
  if value <= 0.0 {
    return Err(PatternError::OutOfRange { field, value, min: f64::MIN_POSITIVE, max: f64::MAX });
  }
  Ok(())
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_param_meta_ratio() {
    let meta = ParamMeta::ratio("test_ratio", 0.5, (0.3, 0.7, 0.1), "Test ratio parameter");

    assert_eq!(meta.name, "test_ratio");
    assert_eq!(meta.param_type, ParamType::Ratio);
    assert_eq!(meta.default, 0.5);
  }

  #[test]
  fn test_param_meta_flag() {
    let meta = ParamMeta::flag("confirm", true, "Test flag");

    assert_eq!(meta.param_type, ParamType::Flag);
    assert_eq!(meta.default, 1.0);
    assert!(meta.validate(0.0).is_ok());
    assert!(meta.validate(0.5).is_err());
  }

  #[test]
  fn test_generate_grid() {
    let meta = ParamMeta::factor("test", 2.0, (1.5, 2.5, 0.5), "Test");

    let grid = meta.generate_grid();
    assert_eq!(grid.len(), 3);
    assert!((grid[0] - 1.5).abs() < f64::EPSILON);
    assert!((grid[1] - 2.0).abs() < f64::EPSILON);
    assert!((grid[2] - 2.5).abs() < f64::EPSILON);
  }

  #[test]
  fn test_validate_period() {
    let meta = ParamMeta::period("test", 12.0, (6.0, 20.0, 2.0), "Test");

    assert!(meta.validate(12.0).is_ok());
    assert!(meta.validate(6.0).is_ok());
    assert!(meta.validate(12.5).is_err());
    assert!(meta.validate(4.0).is_err());
    assert!(meta.validate(22.0).is_err());
  }

  #[test]
  fn test_get_ratio_helper() {
    let mut params = HashMap::new();
    params.insert("key1", 0.8);

    assert!((get_ratio(&params, "key1", 0.5).unwrap().get() - 0.8).abs() < f64::EPSILON);
    assert!((get_ratio(&params, "key2", 0.5).unwrap().get() - 0.5).abs() < f64::EPSILON);
  }

  #[test]
  fn test_get_period_helper() {
    let mut params = HashMap::new();
    params.insert("key1", 20.0);
    params.insert("bad", 2.5);

    assert_eq!(get_period(&params, "key1", 14).unwrap().get(), 20);
    assert_eq!(get_period(&params, "key2", 14).unwrap().get(), 14);
    assert!(get_period(&params, "bad", 14).is_err());
  }

  #[test]
  fn test_get_factor_and_flag_helpers() {
    let mut params = HashMap::new();
    params.insert("mult", 3.0);
    params.insert("neg", -1.0);
    params.insert("off", 0.0);
    params.insert("on", 1.0);
    params.insert("half", 0.5);

    assert_eq!(get_factor(&params, "mult", 2.0).unwrap(), 3.0);
    assert_eq!(get_factor(&params, "missing", 2.0).unwrap(), 2.0);
    assert!(get_factor(&params, "neg", 2.0).is_err());
    assert!(!get_flag(&params, "off", true).unwrap());
    assert!(get_flag(&params, "on", false).unwrap());
    assert!(get_flag(&params, "missing", true).unwrap());
    assert!(get_flag(&params, "half", true).is_err());
  }
}
