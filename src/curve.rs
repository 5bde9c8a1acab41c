//! The fixed 101-point percent-cycle curve representation.

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// Number of samples on the percent-cycle grid: 0%, 1%, …, 100%.
pub const CURVE_POINTS: usize = 101;

/// A curve resampled onto the percent-cycle grid.
///
/// Exactly [`CURVE_POINTS`] ordered values at 0–100% of one gait cycle.
/// The length invariant is enforced at construction (including when
/// deserializing), so downstream comparisons never re-check it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct NormalizedCurve {
    samples: [f64; CURVE_POINTS],
}

impl TryFrom<Vec<f64>> for NormalizedCurve {
    type Error = AnalysisError;

    fn try_from(samples: Vec<f64>) -> Result<Self> {
        Self::from_samples(&samples)
    }
}

impl From<NormalizedCurve> for Vec<f64> {
    fn from(curve: NormalizedCurve) -> Self {
        curve.samples.to_vec()
    }
}

impl NormalizedCurve {
    /// Wrap a full grid of samples.
    #[must_use]
    pub const fn new(samples: [f64; CURVE_POINTS]) -> Self {
        Self { samples }
    }

    /// Build from a slice, validating the grid length.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::CurveLengthMismatch`] unless the slice has
    /// exactly [`CURVE_POINTS`] elements.
    pub fn from_samples(samples: &[f64]) -> Result<Self> {
        let samples: [f64; CURVE_POINTS] = samples
            .try_into()
            .map_err(|_| AnalysisError::curve_length_mismatch(CURVE_POINTS, samples.len()))?;
        Ok(Self { samples })
    }

    /// A constant curve; handy in tests and for degenerate channels.
    #[must_use]
    pub const fn constant(value: f64) -> Self {
        Self {
            samples: [value; CURVE_POINTS],
        }
    }

    /// The samples at 0..=100 percent.
    #[must_use]
    pub fn samples(&self) -> &[f64; CURVE_POINTS] {
        &self.samples
    }

    /// Apply a pointwise transformation, e.g. a unit conversion.
    #[must_use]
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        let mut samples = self.samples;
        for v in &mut samples {
            *v = f(*v);
        }
        Self { samples }
    }

    /// Pointwise arithmetic mean of several curves.
    ///
    /// Returns `None` for an empty input.
    #[must_use]
    pub fn mean_of(curves: &[&Self]) -> Option<Self> {
        if curves.is_empty() {
            return None;
        }
        let n = curves.len() as f64;
        let mut samples = [0.0f64; CURVE_POINTS];
        for curve in curves {
            for (acc, v) in samples.iter_mut().zip(curve.samples.iter()) {
                *acc += v;
            }
        }
        for v in &mut samples {
            *v /= n;
        }
        Some(Self { samples })
    }
}

/// The percent-cycle grid itself: 0.0, 1.0, …, 100.0.
///
/// Mostly useful to callers labeling export rows or plotting externally.
#[must_use]
pub fn percent_grid() -> [f64; CURVE_POINTS] {
    let mut grid = [0.0f64; CURVE_POINTS];
    for (i, g) in grid.iter_mut().enumerate() {
        *g = i as f64;
    }
    grid
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_length_enforced() {
        let ok = NormalizedCurve::from_samples(&[0.5; CURVE_POINTS]);
        assert!(ok.is_ok());

        let err = NormalizedCurve::from_samples(&[0.5; 100]).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::curve_length_mismatch(CURVE_POINTS, 100)
        );
    }

    #[test]
    fn test_map_converts_pointwise() {
        let curve = NormalizedCurve::constant(2.0).map(|v| v * 3.0);
        assert!(curve.samples().iter().all(|&v| (v - 6.0).abs() < 1e-15));
    }

    #[test]
    fn test_mean_of_curves() {
        let a = NormalizedCurve::constant(1.0);
        let b = NormalizedCurve::constant(3.0);
        let mean = NormalizedCurve::mean_of(&[&a, &b]).unwrap();
        assert_relative_eq!(mean.samples()[50], 2.0);
        assert!(NormalizedCurve::mean_of(&[]).is_none());
    }

    #[test]
    fn test_percent_grid_endpoints() {
        let grid = percent_grid();
        assert_relative_eq!(grid[0], 0.0);
        assert_relative_eq!(grid[100], 100.0);
        assert_relative_eq!(grid[37], 37.0);
    }
}
