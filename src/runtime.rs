//! Normalizing heterogeneous processing-duration measurements.
//!
//! The methods under comparison time themselves at different
//! granularities: one solve per cycle, several iterative stages per cycle,
//! or a single pass over the whole multi-cycle capture. All three shapes
//! are rescaled onto one per-cycle-equivalent duration so run-time costs
//! can be compared directly.

use serde::{Deserialize, Serialize};

use crate::channel::{GaitCycle, MethodId};
use crate::error::{AnalysisError, Result};
use crate::stats;

/// Raw elapsed-duration measurements for one method on one trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawDurations {
    /// One solve per cycle: mean across cycles directly.
    PerCycle(Vec<f64>),

    /// An iterative method: the ordered stage durations of each cycle,
    /// indexed by iteration. Stages are summed per cycle, then averaged
    /// across cycles.
    SubDurationsPerCycle(Vec<Vec<f64>>),

    /// One duration for the entire multi-cycle capture, rescaled by the
    /// fraction of the recording one average cycle occupies.
    WholeTrial {
        /// Elapsed processing time for the full input recording, seconds.
        raw: f64,
        /// Duration of that method's own full input recording, seconds.
        total_trial_duration: f64,
    },
}

/// Mean cycle duration `final_time - initial_time` over a trial's cycles.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidConfig`] for an empty cycle list.
pub fn mean_cycle_duration(cycles: &[GaitCycle]) -> Result<f64> {
    let durations: Vec<f64> = cycles.iter().map(GaitCycle::duration).collect();
    stats::mean(&durations)
        .ok_or_else(|| AnalysisError::invalid_config("trial has no gait cycles"))
}

/// Rescale raw measurements to one per-cycle-equivalent duration.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidDurations`] for empty measurement sets
/// or a non-positive whole-trial recording duration.
pub fn normalize_run_time(
    method: MethodId,
    raw: &RawDurations,
    cycles: &[GaitCycle],
) -> Result<f64> {
    match raw {
        RawDurations::PerCycle(durations) => stats::mean(durations)
            .ok_or_else(|| AnalysisError::invalid_durations(method, "no per-cycle durations")),
        RawDurations::SubDurationsPerCycle(stages) => {
            if stages.iter().any(Vec::is_empty) {
                return Err(AnalysisError::invalid_durations(
                    method,
                    "a cycle has no stage durations",
                ));
            }
            let totals: Vec<f64> = stages.iter().map(|s| s.iter().sum()).collect();
            stats::mean(&totals)
                .ok_or_else(|| AnalysisError::invalid_durations(method, "no per-cycle durations"))
        }
        RawDurations::WholeTrial {
            raw,
            total_trial_duration,
        } => {
            if *total_trial_duration <= 0.0 {
                return Err(AnalysisError::invalid_durations(
                    method,
                    "total trial duration must be positive",
                ));
            }
            Ok(raw * mean_cycle_duration(cycles)? / total_trial_duration)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cycles(durations: &[f64]) -> Vec<GaitCycle> {
        let mut start = 10.0;
        durations
            .iter()
            .enumerate()
            .map(|(i, &d)| {
                let cycle = GaitCycle::new("subject01", "run5", i, start, start + d).unwrap();
                start += d;
                cycle
            })
            .collect()
    }

    #[test]
    fn test_per_cycle_mean() {
        let raw = RawDurations::PerCycle(vec![120.0, 100.0, 140.0]);
        let value = normalize_run_time(MethodId::Rra, &raw, &cycles(&[1.0, 1.0, 1.0])).unwrap();
        assert_relative_eq!(value, 120.0);
    }

    #[test]
    fn test_iterative_stages_sum_then_mean() {
        // Three iterations per cycle, referenced by index.
        let raw = RawDurations::SubDurationsPerCycle(vec![
            vec![50.0, 40.0, 30.0],
            vec![60.0, 45.0, 35.0],
        ]);
        let value = normalize_run_time(MethodId::Rra3, &raw, &cycles(&[1.0, 1.0])).unwrap();
        assert_relative_eq!(value, 130.0);
    }

    #[test]
    fn test_whole_trial_rescaling() {
        // mean cycle 1.0 s, trial 10.0 s, raw 50.0 s -> 5.0 s.
        let raw = RawDurations::WholeTrial {
            raw: 50.0,
            total_trial_duration: 10.0,
        };
        let value =
            normalize_run_time(MethodId::AddBiomechanics, &raw, &cycles(&[1.0, 1.0, 1.0])).unwrap();
        assert_relative_eq!(value, 5.0);
    }

    #[test]
    fn test_empty_measurements_rejected() {
        let err = normalize_run_time(
            MethodId::Moco,
            &RawDurations::PerCycle(vec![]),
            &cycles(&[1.0]),
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidDurations { .. }));

        let err = normalize_run_time(
            MethodId::Rra3,
            &RawDurations::SubDurationsPerCycle(vec![vec![10.0], vec![]]),
            &cycles(&[1.0]),
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidDurations { .. }));
    }

    #[test]
    fn test_non_positive_trial_duration_rejected() {
        let raw = RawDurations::WholeTrial {
            raw: 50.0,
            total_trial_duration: 0.0,
        };
        let err = normalize_run_time(MethodId::AddBiomechanics, &raw, &cycles(&[1.0])).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidDurations { .. }));
    }

    #[test]
    fn test_mean_cycle_duration() {
        assert_relative_eq!(mean_cycle_duration(&cycles(&[0.8, 1.2])).unwrap(), 1.0);
        assert!(mean_cycle_duration(&[]).is_err());
    }
}
