//! Quality schedule: layer index to retention fraction.
//!
//! ```text
//! retention(i) = min * e^(k * (i + 1)),   k = ln(max / min) / num_layers
//! ```
//!
//! Exponential so that each finer layer keeps a constant multiple of the
//! geometry of the previous one.

use crate::config::{ConfigError, TilerConfig};

/// Raw schedule formula without any bound checking.
///
/// An inverted range (`min_frac > max_frac`) gives a decreasing schedule;
/// use [`QualitySchedule::new`] to reject it.
#[inline]
pub fn retention(index: usize, num_layers: usize, min_frac: f64, max_frac: f64) -> f64 {
  let k = (max_frac / min_frac).ln() / num_layers as f64;
  min_frac * (k * (index as f64 + 1.0)).exp()
}

/// Validated retention schedule for a fixed layer count.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QualitySchedule {
  num_layers: usize,
  min_frac: f64,
  max_frac: f64,
}

impl QualitySchedule {
  /// Requires `num_layers >= 1` and `0 < min_frac <= max_frac <= 1`.
  pub fn new(num_layers: usize, min_frac: f64, max_frac: f64) -> Result<Self, ConfigError> {
    if num_layers == 0 {
      return Err(ConfigError::Invalid("schedule needs at least one layer".into()));
    }
    if !(min_frac > 0.0 && min_frac <= max_frac && max_frac <= 1.0) {
      return Err(ConfigError::Invalid(format!(
        "schedule bounds must satisfy 0 < min <= max <= 1, got {min_frac} and {max_frac}"
      )));
    }
    Ok(Self {
      num_layers,
      min_frac,
      max_frac,
    })
  }

  pub fn from_config(config: &TilerConfig) -> Result<Self, ConfigError> {
    Self::new(config.num_layers, config.retention_min, config.retention_max)
  }

  pub fn num_layers(&self) -> usize {
    self.num_layers
  }

  /// Retention for `index`, never above the configured maximum.
  pub fn retention(&self, index: usize) -> f64 {
    retention(index, self.num_layers, self.min_frac, self.max_frac).min(self.max_frac)
  }

  /// `(index, retention)` for every layer, coarsest first.
  pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
    (0..self.num_layers).map(move |i| (i, self.retention(i)))
  }
}

#[cfg(test)]
#[path = "schedule_test.rs"]
mod schedule_test;
