//! Cross-method deviation statistics on the percent-cycle grid.
//!
//! For one `(subject, variable, cycle)` every pair of available methods is
//! compared by RMSE, yielding a symmetric matrix with a zero diagonal.
//! Matrices from a trial's cycles are then averaged per pair. Methods with
//! no curve for a given call are omitted from the matrix and recorded, so
//! downstream aggregation can report partial coverage instead of silently
//! shrinking its sample counts.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::channel::MethodId;
use crate::curve::NormalizedCurve;
use crate::error::{AnalysisError, Result};
use crate::stats;

/// Per-curve magnitude statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveStats {
    /// Maximum absolute sample value.
    pub peak_abs: f64,
    /// Mean absolute sample value.
    pub mean_abs: f64,
}

impl CurveStats {
    /// Compute statistics for one normalized curve.
    #[must_use]
    pub fn of(curve: &NormalizedCurve) -> Self {
        let samples = curve.samples();
        let peak_abs = samples.iter().map(|v| v.abs()).fold(0.0f64, f64::max);
        let mean_abs = samples.iter().map(|v| v.abs()).sum::<f64>() / samples.len() as f64;
        Self { peak_abs, mean_abs }
    }

    /// Componentwise arithmetic mean across cycles; `None` when empty.
    #[must_use]
    pub fn mean_of(stats: &[Self]) -> Option<Self> {
        if stats.is_empty() {
            return None;
        }
        let n = stats.len() as f64;
        Some(Self {
            peak_abs: stats.iter().map(|s| s.peak_abs).sum::<f64>() / n,
            mean_abs: stats.iter().map(|s| s.mean_abs).sum::<f64>() / n,
        })
    }
}

/// Pairwise RMSE matrix for one `(subject, variable, cycle)`.
///
/// Square over the methods present for that call; symmetric with an
/// exactly zero diagonal. Expected methods with no curve are listed in
/// `missing` rather than raising.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonMatrix {
    methods: Vec<MethodId>,
    missing: Vec<MethodId>,
    /// Row-major `methods.len() × methods.len()` RMSE values.
    values: Vec<f64>,
}

impl ComparisonMatrix {
    /// Compare every pair of available curves.
    ///
    /// `expected` lists the methods the batch is configured for; any of
    /// them absent from `curves` is recorded in [`ComparisonMatrix::missing`].
    #[must_use]
    pub fn compare(expected: &[MethodId], curves: &BTreeMap<MethodId, NormalizedCurve>) -> Self {
        let methods: Vec<MethodId> = expected
            .iter()
            .copied()
            .filter(|m| curves.contains_key(m))
            .collect();
        let missing: Vec<MethodId> = expected
            .iter()
            .copied()
            .filter(|m| !curves.contains_key(m))
            .collect();

        let n = methods.len();
        let mut values = vec![0.0f64; n * n];
        for (i, a) in methods.iter().enumerate() {
            // Diagonal stays exactly 0; fill the upper triangle and mirror.
            for (j, b) in methods.iter().enumerate().skip(i + 1) {
                let rmse = stats::rmse(curves[a].samples(), curves[b].samples());
                values[i * n + j] = rmse;
                values[j * n + i] = rmse;
            }
        }

        Self {
            methods,
            missing,
            values,
        }
    }

    /// Methods present in this matrix.
    #[must_use]
    pub fn methods(&self) -> &[MethodId] {
        &self.methods
    }

    /// Expected methods with no curve for this call.
    #[must_use]
    pub fn missing(&self) -> &[MethodId] {
        &self.missing
    }

    /// RMSE between two methods, `None` if either is absent.
    #[must_use]
    pub fn get(&self, a: MethodId, b: MethodId) -> Option<f64> {
        let i = self.methods.iter().position(|&m| m == a)?;
        let j = self.methods.iter().position(|&m| m == b)?;
        Some(self.values[i * self.methods.len() + j])
    }

    /// RMSE between two methods, raising when the pair cannot be computed.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::MissingMethod`] naming the absent method.
    pub fn require(
        &self,
        a: MethodId,
        b: MethodId,
        variable: &str,
        cycle_index: usize,
    ) -> Result<f64> {
        self.get(a, b).ok_or_else(|| {
            let absent = if self.methods.contains(&a) { b } else { a };
            AnalysisError::missing_method(absent, variable, cycle_index)
        })
    }
}

/// Mean RMSE of one method pair across a trial's cycles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairMeanRmse {
    pub a: MethodId,
    pub b: MethodId,
    pub mean_rmse: f64,
    /// Number of cycles in which both methods had a curve.
    pub cycles: usize,
}

/// Arithmetic mean of [`ComparisonMatrix`] values across a trial's cycles,
/// one per `(subject, variable)`.
///
/// A pair contributes only for cycles where both methods were present;
/// the per-pair cycle count records how many that was.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeanComparisonMatrix {
    /// Unordered pairs (`a < b` in canonical order).
    entries: Vec<PairMeanRmse>,
    /// Methods present in at least one cycle.
    methods: Vec<MethodId>,
    /// Expected methods absent from every cycle.
    omitted: Vec<MethodId>,
}

impl MeanComparisonMatrix {
    /// Average per-cycle matrices.
    #[must_use]
    pub fn from_cycles(matrices: &[ComparisonMatrix]) -> Self {
        let mut per_pair: BTreeMap<(MethodId, MethodId), Vec<f64>> = BTreeMap::new();
        let mut methods: Vec<MethodId> = Vec::new();
        for matrix in matrices {
            for (i, &a) in matrix.methods().iter().enumerate() {
                if !methods.contains(&a) {
                    methods.push(a);
                }
                for &b in matrix.methods().iter().skip(i + 1) {
                    let key = if a < b { (a, b) } else { (b, a) };
                    // Both present in this cycle, so get() cannot miss.
                    per_pair.entry(key).or_default().push(
                        matrix.get(a, b).unwrap_or_default(),
                    );
                }
            }
        }
        methods.sort_unstable();

        let omitted: Vec<MethodId> = matrices
            .iter()
            .flat_map(|m| m.missing().iter().copied())
            .filter(|m| !methods.contains(m))
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect();

        let entries = per_pair
            .into_iter()
            .map(|((a, b), values)| PairMeanRmse {
                a,
                b,
                mean_rmse: stats::mean(&values).unwrap_or_default(),
                cycles: values.len(),
            })
            .collect();

        Self {
            entries,
            methods,
            omitted,
        }
    }

    /// All pair means, canonical order.
    #[must_use]
    pub fn entries(&self) -> &[PairMeanRmse] {
        &self.entries
    }

    /// Methods present in at least one cycle.
    #[must_use]
    pub fn methods(&self) -> &[MethodId] {
        &self.methods
    }

    /// Expected methods absent from every cycle.
    #[must_use]
    pub fn omitted(&self) -> &[MethodId] {
        &self.omitted
    }

    /// Mean RMSE for a pair; 0 for a present method against itself,
    /// `None` if either method never appeared.
    #[must_use]
    pub fn get(&self, a: MethodId, b: MethodId) -> Option<f64> {
        if a == b {
            return self.methods.contains(&a).then_some(0.0);
        }
        let key = if a < b { (a, b) } else { (b, a) };
        self.entries
            .iter()
            .find(|e| (e.a, e.b) == key)
            .map(|e| e.mean_rmse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use crate::curve::CURVE_POINTS;

    fn ramp(start: f64, step: f64) -> NormalizedCurve {
        let mut samples = [0.0f64; CURVE_POINTS];
        for (i, v) in samples.iter_mut().enumerate() {
            *v = start + step * i as f64;
        }
        NormalizedCurve::new(samples)
    }

    fn three_method_set() -> BTreeMap<MethodId, NormalizedCurve> {
        let mut curves = BTreeMap::new();
        curves.insert(MethodId::Ik, ramp(0.0, 0.1));
        curves.insert(MethodId::Rra, ramp(1.0, 0.1));
        curves.insert(MethodId::Moco, ramp(3.0, 0.1));
        curves
    }

    #[test]
    fn test_matrix_symmetry_and_zero_diagonal() {
        let curves = three_method_set();
        let matrix = ComparisonMatrix::compare(&[MethodId::Ik, MethodId::Rra, MethodId::Moco], &curves);

        for &a in matrix.methods() {
            assert_eq!(matrix.get(a, a), Some(0.0));
            for &b in matrix.methods() {
                assert_relative_eq!(
                    matrix.get(a, b).unwrap(),
                    matrix.get(b, a).unwrap(),
                    epsilon = 1e-15
                );
            }
        }
    }

    #[test]
    fn test_constant_offset_rmse() {
        let curves = three_method_set();
        let matrix = ComparisonMatrix::compare(&[MethodId::Ik, MethodId::Rra, MethodId::Moco], &curves);

        // Curves differ by constant offsets, so RMSE equals the offset.
        assert_relative_eq!(matrix.get(MethodId::Ik, MethodId::Rra).unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(matrix.get(MethodId::Ik, MethodId::Moco).unwrap(), 3.0, epsilon = 1e-12);
        assert_relative_eq!(matrix.get(MethodId::Rra, MethodId::Moco).unwrap(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_absent_method_is_recorded_not_raised() {
        let mut curves = three_method_set();
        curves.remove(&MethodId::Moco);
        let expected = [MethodId::Ik, MethodId::Rra, MethodId::Moco];
        let matrix = ComparisonMatrix::compare(&expected, &curves);

        assert_eq!(matrix.methods(), &[MethodId::Ik, MethodId::Rra]);
        assert_eq!(matrix.missing(), &[MethodId::Moco]);
        assert!(matrix.get(MethodId::Ik, MethodId::Moco).is_none());

        let err = matrix
            .require(MethodId::Ik, MethodId::Moco, "knee_angle_r", 2)
            .unwrap_err();
        assert_eq!(
            err,
            AnalysisError::missing_method(MethodId::Moco, "knee_angle_r", 2)
        );
    }

    #[test]
    fn test_curve_stats() {
        let curve = ramp(-5.0, 0.1); // -5.0 .. 5.0
        let stats = CurveStats::of(&curve);
        assert_relative_eq!(stats.peak_abs, 5.0, epsilon = 1e-12);
        // Symmetric ramp over [-5, 5]: mean |v| is about 2.5.
        assert_relative_eq!(stats.mean_abs, 2.524_752_475_247_524_6, epsilon = 1e-12);

        let mean = CurveStats::mean_of(&[
            CurveStats { peak_abs: 1.0, mean_abs: 0.5 },
            CurveStats { peak_abs: 3.0, mean_abs: 1.5 },
        ])
        .unwrap();
        assert_relative_eq!(mean.peak_abs, 2.0);
        assert_relative_eq!(mean.mean_abs, 1.0);
    }

    #[test]
    fn test_mean_matrix_across_cycles() {
        let expected = [MethodId::Ik, MethodId::Rra];
        let cycles: Vec<ComparisonMatrix> = [1.0, 2.0, 3.0]
            .iter()
            .map(|&offset| {
                let mut curves = BTreeMap::new();
                curves.insert(MethodId::Ik, ramp(0.0, 0.1));
                curves.insert(MethodId::Rra, ramp(offset, 0.1));
                ComparisonMatrix::compare(&expected, &curves)
            })
            .collect();

        let mean = MeanComparisonMatrix::from_cycles(&cycles);
        let entry = &mean.entries()[0];
        assert_eq!((entry.a, entry.b), (MethodId::Ik, MethodId::Rra));
        assert_relative_eq!(entry.mean_rmse, 2.0, epsilon = 1e-12);
        assert_eq!(entry.cycles, 3);
        assert_relative_eq!(mean.get(MethodId::Rra, MethodId::Ik).unwrap(), 2.0, epsilon = 1e-12);
        assert_eq!(mean.get(MethodId::Ik, MethodId::Ik), Some(0.0));
    }

    #[test]
    fn test_mean_matrix_partial_cycle_coverage() {
        let expected = [MethodId::Ik, MethodId::Rra, MethodId::Moco];

        // Moco present in only one of two cycles.
        let mut full = three_method_set();
        let matrix_full = ComparisonMatrix::compare(&expected, &full);
        full.remove(&MethodId::Moco);
        let matrix_partial = ComparisonMatrix::compare(&expected, &full);

        let mean = MeanComparisonMatrix::from_cycles(&[matrix_full, matrix_partial]);

        let ik_rra = mean
            .entries()
            .iter()
            .find(|e| (e.a, e.b) == (MethodId::Ik, MethodId::Rra))
            .unwrap();
        assert_eq!(ik_rra.cycles, 2);

        let ik_moco = mean
            .entries()
            .iter()
            .find(|e| (e.a, e.b) == (MethodId::Ik, MethodId::Moco))
            .unwrap();
        assert_eq!(ik_moco.cycles, 1);

        // Moco appeared somewhere, so it is not omitted outright.
        assert!(mean.methods().contains(&MethodId::Moco));
        assert!(mean.omitted().is_empty());
    }

    #[test]
    fn test_method_omitted_from_every_cycle() {
        let expected = [MethodId::Ik, MethodId::Rra, MethodId::AddBiomechanics];
        let mut curves = three_method_set();
        curves.remove(&MethodId::Moco);

        let matrices: Vec<ComparisonMatrix> = (0..3)
            .map(|_| ComparisonMatrix::compare(&expected, &curves))
            .collect();
        let mean = MeanComparisonMatrix::from_cycles(&matrices);

        assert_eq!(mean.omitted(), &[MethodId::AddBiomechanics]);
        assert!(mean.get(MethodId::Ik, MethodId::AddBiomechanics).is_none());
    }
}
