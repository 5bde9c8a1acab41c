//! Error types for the gait comparison pipeline.
//!
//! One crate-wide error enum covers input validation, window resolution,
//! normalization, unit reconciliation and comparison failures. Per-subject
//! errors are isolated at the pipeline boundary; only configuration defects
//! ([`AnalysisError::MissingUnitConvention`], [`AnalysisError::InvalidConfig`])
//! abort a batch.

use thiserror::Error;

use crate::channel::{MethodId, VariableClass};

/// Main error type for gait comparison operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Time and value arrays of a channel have different lengths.
    #[error("Sample length mismatch: {time} time points vs {value} values")]
    SampleLengthMismatch { time: usize, value: usize },

    /// A channel's time base is not strictly increasing.
    #[error("Channel time must be strictly increasing at index {index}")]
    NonMonotonicTime { index: usize },

    /// A channel was constructed with no samples.
    #[error("Channel '{name}' has no samples")]
    EmptyChannel { name: String },

    /// A gait cycle whose final time does not exceed its initial time.
    #[error("Invalid cycle window: initial time {initial} must precede final time {end}")]
    InvalidCycle { initial: f64, end: f64 },

    /// Cycle window not contained in a channel's time domain.
    #[error(
        "Cycle window [{initial}, {end}] not contained in channel time domain [{domain_start}, {domain_end}]"
    )]
    CycleOutOfRange {
        initial: f64,
        end: f64,
        domain_start: f64,
        domain_end: f64,
    },

    /// Too few samples in a window to interpolate.
    #[error("Insufficient samples: need at least {min} points, got {actual}")]
    InsufficientSamples { min: usize, actual: usize },

    /// Interpolation query outside the source time domain. Structurally
    /// unreachable from the percent-cycle grid, guarded anyway.
    #[error("Interpolation query {query} outside time domain [{start}, {end}]")]
    InterpolationOutsideDomain { query: f64, start: f64, end: f64 },

    /// A curve that is not exactly the percent-cycle grid length.
    #[error("Curve length mismatch: expected {expected} samples, got {actual}")]
    CurveLengthMismatch { expected: usize, actual: usize },

    /// A demanded method/variable/cycle combination has no data.
    #[error("No data for method {method} on '{variable}' (cycle {cycle_index})")]
    MissingMethod {
        method: MethodId,
        variable: String,
        cycle_index: usize,
    },

    /// No unit convention table entry for a method/class pair. This is a
    /// configuration defect and fails the whole batch at startup.
    #[error("No unit convention configured for method {method}, class {class}")]
    MissingUnitConvention {
        method: MethodId,
        class: VariableClass,
    },

    /// Elapsed-duration measurements that cannot be normalized.
    #[error("Invalid duration data for method {method}: {reason}")]
    InvalidDurations { method: MethodId, reason: String },

    /// Configuration validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for gait comparison operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;

impl AnalysisError {
    /// Create a sample length mismatch error.
    #[must_use]
    pub const fn sample_length_mismatch(time: usize, value: usize) -> Self {
        Self::SampleLengthMismatch { time, value }
    }

    /// Create an insufficient samples error.
    #[must_use]
    pub const fn insufficient_samples(min: usize, actual: usize) -> Self {
        Self::InsufficientSamples { min, actual }
    }

    /// Create a curve length mismatch error.
    #[must_use]
    pub const fn curve_length_mismatch(expected: usize, actual: usize) -> Self {
        Self::CurveLengthMismatch { expected, actual }
    }

    /// Create a missing method error.
    #[must_use]
    pub fn missing_method(method: MethodId, variable: impl Into<String>, cycle_index: usize) -> Self {
        Self::MissingMethod {
            method,
            variable: variable.into(),
            cycle_index,
        }
    }

    /// Create an invalid durations error.
    #[must_use]
    pub fn invalid_durations(method: MethodId, reason: impl Into<String>) -> Self {
        Self::InvalidDurations {
            method,
            reason: reason.into(),
        }
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Whether this error indicates a configuration defect that should
    /// abort the batch rather than exclude a single subject.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::MissingUnitConvention { .. } | Self::InvalidConfig(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AnalysisError::insufficient_samples(2, 1);
        assert!(err.to_string().contains('2'));
        assert!(err.to_string().contains('1'));

        let err = AnalysisError::missing_method(MethodId::Moco, "knee_angle_r", 1);
        assert!(err.to_string().contains("moco"));
        assert!(err.to_string().contains("knee_angle_r"));
    }

    #[test]
    fn test_fatal_classification() {
        assert!(AnalysisError::MissingUnitConvention {
            method: MethodId::Rra,
            class: VariableClass::Rotation,
        }
        .is_fatal());
        assert!(AnalysisError::invalid_config("bad factor").is_fatal());
        assert!(!AnalysisError::insufficient_samples(2, 0).is_fatal());
        assert!(!AnalysisError::curve_length_mismatch(101, 50).is_fatal());
    }
}
