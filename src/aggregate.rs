//! Per-subject summaries and cross-subject group statistics.
//!
//! Workers produce one [`SubjectSummary`] per subject; a single
//! [`GroupAggregator`] accumulates them and [`GroupAggregator::finalize`]
//! computes the group tables. Finalize is pure over the accumulated set,
//! recomputed in full rather than incrementally, so calling it twice is
//! safe and yields identical results.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::channel::{MethodId, ResidualAxis, VariableClass};
use crate::compare::{CurveStats, MeanComparisonMatrix};
use crate::residuals::ResidualThreshold;
use crate::stats::DescriptiveStat;

/// Cross-method comparison of one kinematic variable for one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableComparison {
    pub variable: String,
    pub class: VariableClass,
    pub matrix: MeanComparisonMatrix,
}

/// Cycle-averaged magnitude statistics of one method's curve for one
/// variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodVariableStats {
    pub method: MethodId,
    pub variable: String,
    pub stats: CurveStats,
    /// Number of cycles contributing to the mean.
    pub cycles: usize,
}

/// Cycle-averaged peak residual of one method on one axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResidualPeak {
    pub method: MethodId,
    pub axis: ResidualAxis,
    /// Mean across cycles of the per-cycle peak absolute residual.
    pub mean_peak: f64,
    /// Whether the mean peak sits within the trial's recommended bound.
    pub within_threshold: bool,
    pub cycles: usize,
}

/// Per-cycle-equivalent processing duration of one method.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MethodRunTime {
    pub method: MethodId,
    pub seconds: f64,
}

/// Everything one subject contributes to the group statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectSummary {
    pub subject: String,
    pub trial: String,
    pub comparisons: Vec<VariableComparison>,
    pub curve_stats: Vec<MethodVariableStats>,
    pub residuals: Vec<ResidualPeak>,
    pub threshold: ResidualThreshold,
    pub run_times: Vec<MethodRunTime>,
}

/// Group RMSE statistics for one variable and method pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRmseCell {
    pub variable: String,
    pub a: MethodId,
    pub b: MethodId,
    pub stat: DescriptiveStat,
}

/// Group curve-magnitude statistics for one variable and method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupCurveStatCell {
    pub variable: String,
    pub method: MethodId,
    pub peak_abs: DescriptiveStat,
    pub mean_abs: DescriptiveStat,
}

/// Group residual statistics for one method and axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupResidualCell {
    pub method: MethodId,
    pub axis: ResidualAxis,
    pub stat: DescriptiveStat,
}

/// Group run-time statistics for one method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRunTimeCell {
    pub method: MethodId,
    pub stat: DescriptiveStat,
}

/// Ratio of two methods' group means, `mean(a) / mean(b)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodRatio {
    pub a: MethodId,
    pub b: MethodId,
    pub ratio: f64,
}

/// Ratio of two methods' mean peak residuals on one axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResidualRatio {
    pub axis: ResidualAxis,
    pub a: MethodId,
    pub b: MethodId,
    pub ratio: f64,
}

/// Cross-subject descriptive statistics, one cell per populated key.
///
/// Every cell carries its own sample count: a subject without data for a
/// method/variable simply never reached that cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    /// Subjects that contributed, in accumulation order.
    pub subjects: Vec<String>,
    pub rmse: Vec<GroupRmseCell>,
    pub curve_stats: Vec<GroupCurveStatCell>,
    pub residuals: Vec<GroupResidualCell>,
    pub run_times: Vec<GroupRunTimeCell>,
    /// Relative run-time cost, per ordered method pair.
    pub run_time_ratios: Vec<MethodRatio>,
    /// Relative residual magnitude, per axis per ordered method pair.
    pub residual_ratios: Vec<ResidualRatio>,
}

impl GroupSummary {
    /// Find the RMSE cell for a variable and pair (order-insensitive).
    #[must_use]
    pub fn rmse_cell(&self, variable: &str, a: MethodId, b: MethodId) -> Option<&GroupRmseCell> {
        self.rmse.iter().find(|c| {
            c.variable == variable && ((c.a, c.b) == (a, b) || (c.a, c.b) == (b, a))
        })
    }

    /// Find the run-time cell for a method.
    #[must_use]
    pub fn run_time_cell(&self, method: MethodId) -> Option<&GroupRunTimeCell> {
        self.run_times.iter().find(|c| c.method == method)
    }
}

/// Accumulates [`SubjectSummary`] records and folds them into a
/// [`GroupSummary`].
#[derive(Debug, Default)]
pub struct GroupAggregator {
    summaries: Vec<SubjectSummary>,
}

impl GroupAggregator {
    /// Create an empty aggregator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one subject's summary.
    pub fn accumulate(&mut self, summary: SubjectSummary) {
        self.summaries.push(summary);
    }

    /// Number of accumulated subjects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.summaries.len()
    }

    /// Whether no subject has been accumulated yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }

    /// The accumulated summaries, in arrival order.
    #[must_use]
    pub fn summaries(&self) -> &[SubjectSummary] {
        &self.summaries
    }

    /// Compute group statistics over whichever subjects contributed to
    /// each cell. Pure over the accumulated set; may be called repeatedly.
    #[must_use]
    pub fn finalize(&self) -> GroupSummary {
        let mut rmse: BTreeMap<(String, MethodId, MethodId), Vec<f64>> = BTreeMap::new();
        let mut peaks: BTreeMap<(String, MethodId), Vec<f64>> = BTreeMap::new();
        let mut mean_abs: BTreeMap<(String, MethodId), Vec<f64>> = BTreeMap::new();
        let mut residuals: BTreeMap<(MethodId, ResidualAxis), Vec<f64>> = BTreeMap::new();
        let mut run_times: BTreeMap<MethodId, Vec<f64>> = BTreeMap::new();

        for summary in &self.summaries {
            for comparison in &summary.comparisons {
                for entry in comparison.matrix.entries() {
                    rmse.entry((comparison.variable.clone(), entry.a, entry.b))
                        .or_default()
                        .push(entry.mean_rmse);
                }
            }
            for cell in &summary.curve_stats {
                peaks
                    .entry((cell.variable.clone(), cell.method))
                    .or_default()
                    .push(cell.stats.peak_abs);
                mean_abs
                    .entry((cell.variable.clone(), cell.method))
                    .or_default()
                    .push(cell.stats.mean_abs);
            }
            for peak in &summary.residuals {
                residuals
                    .entry((peak.method, peak.axis))
                    .or_default()
                    .push(peak.mean_peak);
            }
            for run_time in &summary.run_times {
                run_times.entry(run_time.method).or_default().push(run_time.seconds);
            }
        }

        let rmse_cells = rmse
            .into_iter()
            .filter_map(|((variable, a, b), values)| {
                DescriptiveStat::of(&values).map(|stat| GroupRmseCell { variable, a, b, stat })
            })
            .collect();

        let curve_stat_cells = peaks
            .iter()
            .filter_map(|((variable, method), peak_values)| {
                let mean_values = &mean_abs[&(variable.clone(), *method)];
                Some(GroupCurveStatCell {
                    variable: variable.clone(),
                    method: *method,
                    peak_abs: DescriptiveStat::of(peak_values)?,
                    mean_abs: DescriptiveStat::of(mean_values)?,
                })
            })
            .collect();

        let residual_cells: Vec<GroupResidualCell> = residuals
            .iter()
            .filter_map(|(&(method, axis), values)| {
                DescriptiveStat::of(values).map(|stat| GroupResidualCell { method, axis, stat })
            })
            .collect();

        let run_time_cells: Vec<GroupRunTimeCell> = run_times
            .iter()
            .filter_map(|(&method, values)| {
                DescriptiveStat::of(values).map(|stat| GroupRunTimeCell { method, stat })
            })
            .collect();

        let run_time_ratios = pairwise_ratios(&run_time_cells);
        let residual_ratios = residual_pairwise_ratios(&residual_cells);

        GroupSummary {
            subjects: self.summaries.iter().map(|s| s.subject.clone()).collect(),
            rmse: rmse_cells,
            curve_stats: curve_stat_cells,
            residuals: residual_cells,
            run_times: run_time_cells,
            run_time_ratios,
            residual_ratios,
        }
    }
}

/// Run-time ratios `mean(a) / mean(b)` over every ordered method pair.
fn pairwise_ratios(cells: &[GroupRunTimeCell]) -> Vec<MethodRatio> {
    let mut ratios = Vec::new();
    for a in cells {
        for b in cells {
            if a.method != b.method && b.stat.mean > 0.0 {
                ratios.push(MethodRatio {
                    a: a.method,
                    b: b.method,
                    ratio: a.stat.mean / b.stat.mean,
                });
            }
        }
    }
    ratios
}

/// Residual ratios per axis over every ordered method pair.
fn residual_pairwise_ratios(cells: &[GroupResidualCell]) -> Vec<ResidualRatio> {
    let mut ratios = Vec::new();
    for a in cells {
        for b in cells {
            if a.axis == b.axis && a.method != b.method && b.stat.mean > 0.0 {
                ratios.push(ResidualRatio {
                    axis: a.axis,
                    a: a.method,
                    b: b.method,
                    ratio: a.stat.mean / b.stat.mean,
                });
            }
        }
    }
    ratios
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use crate::compare::ComparisonMatrix;
    use crate::curve::NormalizedCurve;
    use std::collections::BTreeMap as Map;

    fn summary_with_rmse(subject: &str, offset: f64, run_time: f64) -> SubjectSummary {
        let mut curves = Map::new();
        curves.insert(MethodId::Ik, NormalizedCurve::constant(0.0));
        curves.insert(MethodId::Rra, NormalizedCurve::constant(offset));
        let matrix = ComparisonMatrix::compare(&[MethodId::Ik, MethodId::Rra], &curves);

        SubjectSummary {
            subject: subject.to_string(),
            trial: "run5".to_string(),
            comparisons: vec![VariableComparison {
                variable: "knee_angle_r".to_string(),
                class: VariableClass::Rotation,
                matrix: MeanComparisonMatrix::from_cycles(&[matrix]),
            }],
            curve_stats: vec![MethodVariableStats {
                method: MethodId::Rra,
                variable: "knee_angle_r".to_string(),
                stats: CurveStats {
                    peak_abs: offset,
                    mean_abs: offset / 2.0,
                },
                cycles: 3,
            }],
            residuals: vec![ResidualPeak {
                method: MethodId::Rra,
                axis: ResidualAxis::Fy,
                mean_peak: offset * 10.0,
                within_threshold: true,
                cycles: 3,
            }],
            threshold: ResidualThreshold {
                force_threshold_n: 50.0,
                moment_threshold_nm: 9.5,
            },
            run_times: vec![MethodRunTime {
                method: MethodId::Rra,
                seconds: run_time,
            }],
        }
    }

    #[test]
    fn test_accumulate_and_finalize() {
        let mut aggregator = GroupAggregator::new();
        aggregator.accumulate(summary_with_rmse("subject01", 1.0, 100.0));
        aggregator.accumulate(summary_with_rmse("subject02", 3.0, 200.0));

        let group = aggregator.finalize();
        assert_eq!(group.subjects, vec!["subject01", "subject02"]);

        let cell = group
            .rmse_cell("knee_angle_r", MethodId::Ik, MethodId::Rra)
            .unwrap();
        assert_relative_eq!(cell.stat.mean, 2.0);
        assert_relative_eq!(cell.stat.std_dev, 1.0);
        assert_eq!(cell.stat.n, 2);

        let run_time = group.run_time_cell(MethodId::Rra).unwrap();
        assert_relative_eq!(run_time.stat.mean, 150.0);
    }

    #[test]
    fn test_finalize_is_idempotent() {
        let mut aggregator = GroupAggregator::new();
        aggregator.accumulate(summary_with_rmse("subject01", 1.0, 90.0));
        aggregator.accumulate(summary_with_rmse("subject02", 2.0, 110.0));

        let first = aggregator.finalize();
        let second = aggregator.finalize();
        assert_eq!(first, second);
    }

    #[test]
    fn test_partial_coverage_counts() {
        let mut aggregator = GroupAggregator::new();
        aggregator.accumulate(summary_with_rmse("subject01", 1.0, 100.0));

        // Second subject lacks the Rra curve for the variable entirely.
        let mut incomplete = summary_with_rmse("subject02", 2.0, 100.0);
        let mut curves = Map::new();
        curves.insert(MethodId::Ik, NormalizedCurve::constant(0.0));
        let matrix = ComparisonMatrix::compare(&[MethodId::Ik, MethodId::Rra], &curves);
        incomplete.comparisons[0].matrix = MeanComparisonMatrix::from_cycles(&[matrix]);
        aggregator.accumulate(incomplete);

        let group = aggregator.finalize();
        let cell = group
            .rmse_cell("knee_angle_r", MethodId::Ik, MethodId::Rra)
            .unwrap();
        // Only the complete subject reached the cell.
        assert_eq!(cell.stat.n, 1);
        assert_eq!(group.subjects.len(), 2);
    }

    #[test]
    fn test_ratio_tables() {
        let mut aggregator = GroupAggregator::new();
        let mut a = summary_with_rmse("subject01", 1.0, 100.0);
        a.run_times.push(MethodRunTime {
            method: MethodId::Moco,
            seconds: 400.0,
        });
        aggregator.accumulate(a);

        let group = aggregator.finalize();
        let ratio = group
            .run_time_ratios
            .iter()
            .find(|r| (r.a, r.b) == (MethodId::Moco, MethodId::Rra))
            .unwrap();
        assert_relative_eq!(ratio.ratio, 4.0);

        let inverse = group
            .run_time_ratios
            .iter()
            .find(|r| (r.a, r.b) == (MethodId::Rra, MethodId::Moco))
            .unwrap();
        assert_relative_eq!(inverse.ratio, 0.25);
    }
}
