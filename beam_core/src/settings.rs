//! # Analysis Settings
//!
//! Tunables for a single analysis run. Settings are plain data: a host
//! builds them once (from defaults or a JSON file, see
//! [`crate::file_io::load_settings`]) and passes them by reference into
//! every call, so concurrent requests never share mutable state.
//!
//! ## Example
//!
//! ```rust
//! use beam_core::settings::AnalysisSettings;
//!
//! let settings: AnalysisSettings = serde_json::from_str(r#"{ "min_samples": 201 }"#).unwrap();
//! assert_eq!(settings.min_samples, 201);
//! assert_eq!(settings.points_per_unit, 1.0); // untouched fields keep their defaults
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// Settings consumed by the sampler, the solver checks and the column mapper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Evenly-spaced samples per unit of beam length
    pub points_per_unit: f64,

    /// Lower bound on the evenly-spaced grid size (endpoints included)
    pub min_samples: usize,

    /// Upper bound on the evenly-spaced grid size; long beams get a
    /// coarser grid instead of an unbounded one
    pub max_samples: usize,

    /// Tolerance for equilibrium checks and for merging grid points
    /// into coincident load stations (scaled by beam length where relevant)
    pub tolerance: f64,

    /// Rows inspected by the column mapper to confirm numeric columns
    pub validation_sample_rows: usize,

    /// Rows of the input table copied into the result for the report
    pub preview_rows: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        AnalysisSettings {
            points_per_unit: 1.0,
            min_samples: 101,
            max_samples: 100_001,
            tolerance: 1e-9,
            validation_sample_rows: 10,
            preview_rows: 30,
        }
    }
}

impl AnalysisSettings {
    /// Number of evenly-spaced grid points for a beam of `length`.
    ///
    /// `max(min_samples, ceil(length * points_per_unit) + 1)`, capped at
    /// `max_samples` and never below 2 so both endpoints are always on the
    /// grid.
    pub fn grid_size(&self, length: f64) -> usize {
        let by_density = (length * self.points_per_unit).ceil();
        let by_density = if !by_density.is_finite() && by_density > 0.0 {
            self.max_samples
        } else if by_density > 0.0 {
            // Clamp in f64 first; `as usize` saturates at usize::MAX
            (by_density.min(self.max_samples as f64) as usize).saturating_add(1)
        } else {
            0
        };
        self.min_samples
            .max(by_density)
            .min(self.max_samples)
            .max(2)
    }

    /// Reject settings that would make sampling meaningless.
    pub fn validate(&self) -> CalcResult<()> {
        if !self.points_per_unit.is_finite() || self.points_per_unit < 0.0 {
            return Err(CalcError::invalid_value(
                "points_per_unit",
                self.points_per_unit.to_string(),
                "Sample density must be a non-negative number",
            ));
        }
        if self.max_samples < 2 || self.max_samples < self.min_samples {
            return Err(CalcError::invalid_value(
                "max_samples",
                self.max_samples.to_string(),
                format!(
                    "Sample cap must be at least 2 and at least min_samples ({})",
                    self.min_samples
                ),
            ));
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(CalcError::invalid_value(
                "tolerance",
                self.tolerance.to_string(),
                "Tolerance must be positive",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = AnalysisSettings::default();
        assert_eq!(s.min_samples, 101);
        assert_eq!(s.preview_rows, 30);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_grid_size() {
        let s = AnalysisSettings::default();
        // Short beams fall back to the minimum count
        assert_eq!(s.grid_size(6.0), 101);
        // Long beams get one point per unit length
        assert_eq!(s.grid_size(250.0), 251);
        assert_eq!(s.grid_size(250.5), 252);

        let sparse = AnalysisSettings {
            min_samples: 0,
            points_per_unit: 0.0,
            ..Default::default()
        };
        assert_eq!(sparse.grid_size(10.0), 2);
    }

    #[test]
    fn test_grid_size_is_capped() {
        let s = AnalysisSettings::default();
        assert_eq!(s.grid_size(1e12), s.max_samples);
        assert_eq!(s.grid_size(1e30), s.max_samples);
        assert_eq!(s.grid_size(f64::MAX), s.max_samples);
        assert_eq!(s.grid_size(100_000.0), 100_001);

        let dense = AnalysisSettings {
            points_per_unit: 1e300,
            ..Default::default()
        };
        assert_eq!(dense.grid_size(1e300), dense.max_samples);
    }

    #[test]
    fn test_validate_rejects_cap_below_minimum() {
        let s = AnalysisSettings {
            max_samples: 50,
            ..Default::default()
        };
        assert_eq!(s.validate().unwrap_err().error_code(), "INVALID_DATA");
    }

    #[test]
    fn test_partial_json() {
        let s: AnalysisSettings = serde_json::from_str(r#"{ "points_per_unit": 4.0 }"#).unwrap();
        assert_eq!(s.points_per_unit, 4.0);
        assert_eq!(s.min_samples, 101);
    }

    #[test]
    fn test_validate_rejects_bad_tolerance() {
        let s = AnalysisSettings {
            tolerance: 0.0,
            ..Default::default()
        };
        assert_eq!(s.validate().unwrap_err().error_code(), "INVALID_DATA");
    }
}
