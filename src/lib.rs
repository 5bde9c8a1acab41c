//! Gait Simulation Comparison Library
//!
//! Cross-method comparison core for biomechanical gait analysis: turns the
//! heterogeneous outputs of alternative motion/force reconciliation
//! pipelines (different time bases, sample rates, units and iteration
//! granularities) into one comparable representation, then computes
//! cross-method deviation statistics and group summaries.
//!
//! # Features
//!
//! - **Percent-cycle normalization**: every curve resampled onto a fixed
//!   101-point 0–100% grid with exact endpoint handling
//! - **Unit reconciliation**: one exhaustive, startup-validated table of
//!   per-method unit conventions (meters / degrees canonical)
//! - **Deviation statistics**: symmetric pairwise RMSE matrices per
//!   variable and cycle, averaged per trial, aggregated across subjects
//! - **Partial coverage**: missing method data is recorded, sample counts
//!   are tracked per cell, and one failing subject never aborts a batch
//!
//! # Quick Start
//!
//! ```
//! use gait_comparison::{Channel, GaitCycle, MethodId, UnitTable, VariableClass};
//! use gait_comparison::normalize::normalize_channel;
//!
//! let channel = Channel::new(
//!     "knee_angle_r",
//!     vec![0.0, 0.2, 0.4, 0.6, 0.8, 1.0],
//!     vec![0.1, 0.6, 1.1, 0.9, 0.4, 0.1],
//! )?;
//! let cycle = GaitCycle::new("subject01", "run5", 0, 0.1, 0.9)?;
//!
//! // Window the channel to the cycle and resample to 101 points.
//! let raw = normalize_channel(&channel, &cycle)?;
//!
//! // Convert the method's native radians into canonical degrees.
//! let table = UnitTable::study_defaults();
//! let curve = table.reconcile(MethodId::Moco, VariableClass::Rotation, &raw)?;
//! assert_eq!(curve.samples().len(), 101);
//! # Ok::<(), gait_comparison::AnalysisError>(())
//! ```
//!
//! # Batch Processing
//!
//! Per-subject pipelines are independent; [`pipeline::process_batch`] fans
//! them out over a worker pool and folds the surviving summaries into
//! group statistics, reporting excluded subjects with their failing stage.

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_errors_doc)]

pub mod aggregate;
pub mod channel;
pub mod compare;
pub mod config;
pub mod curve;
pub mod error;
pub mod export;
pub mod normalize;
pub mod pipeline;
pub mod residuals;
pub mod runtime;
pub mod stats;
pub mod units;
pub mod window;

// Re-exports for convenient access
pub use aggregate::{GroupAggregator, GroupSummary, SubjectSummary};
pub use channel::{Channel, GaitCycle, MethodId, ResidualAxis, VariableClass};
pub use compare::{ComparisonMatrix, CurveStats, MeanComparisonMatrix};
pub use config::AnalysisConfig;
pub use curve::{NormalizedCurve, CURVE_POINTS};
pub use error::{AnalysisError, Result};
pub use pipeline::{
    process_batch, process_subject, BatchReport, CurveRecord, MethodChannels, PipelineStage,
    SubjectFailure, SubjectInput, SubjectResult, VariableDef,
};
pub use residuals::ResidualThreshold;
pub use runtime::{normalize_run_time, RawDurations};
pub use units::{UnitConvention, UnitTable};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::collections::BTreeMap;

    fn sine_channel(name: &str, amplitude: f64) -> Channel {
        let time: Vec<f64> = (0..150).map(|i| f64::from(i) * 0.01).collect();
        let value: Vec<f64> = time.iter().map(|t| amplitude * (t * 4.0).sin()).collect();
        Channel::new(name, time, value).unwrap()
    }

    #[test]
    fn test_normalize_then_compare_round() {
        let cycle = GaitCycle::new("subject01", "run5", 0, 0.105, 1.205).unwrap();
        let table = UnitTable::study_defaults();

        let mut curves = BTreeMap::new();
        for (method, amplitude) in [(MethodId::Ik, 10.0), (MethodId::Rra, 10.5)] {
            let channel = sine_channel("hip_flexion_r", amplitude);
            let raw = normalize::normalize_channel(&channel, &cycle).unwrap();
            let curve = table
                .reconcile(method, VariableClass::Rotation, &raw)
                .unwrap();
            curves.insert(method, curve);
        }

        let matrix = ComparisonMatrix::compare(&[MethodId::Ik, MethodId::Rra], &curves);
        let rmse = matrix.get(MethodId::Ik, MethodId::Rra).unwrap();
        assert!(rmse > 0.0);
        assert_relative_eq!(
            rmse,
            matrix.get(MethodId::Rra, MethodId::Ik).unwrap(),
            epsilon = 1e-15
        );
    }

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
