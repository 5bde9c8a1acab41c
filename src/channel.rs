//! Core input records: time-series channels, gait cycles and identifiers.
//!
//! [`Channel`] and [`GaitCycle`] arrive from external collaborators
//! (solvers, event detection, file readers) and are read-only once
//! constructed. Method and variable identities are enumerated types rather
//! than free-form strings, so a typo cannot silently split one method's
//! data across two keys.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AnalysisError, Result};

/// Identifier for one residual-reduction/tracking technique under comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MethodId {
    /// Inverse kinematics; the motion-tracking reference.
    Ik,
    /// Residual reduction algorithm, single pass.
    Rra,
    /// Residual reduction algorithm iterated three times.
    Rra3,
    /// Direct-collocation optimal control tracking.
    Moco,
    /// Automated server-side processing of the whole capture.
    AddBiomechanics,
}

impl MethodId {
    /// All methods, in canonical reporting order.
    pub const ALL: [Self; 5] = [
        Self::Ik,
        Self::Rra,
        Self::Rra3,
        Self::Moco,
        Self::AddBiomechanics,
    ];

    /// Stable lowercase identifier used in export rows.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ik => "ik",
            Self::Rra => "rra",
            Self::Rra3 => "rra3",
            Self::Moco => "moco",
            Self::AddBiomechanics => "addbiomechanics",
        }
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unit family of a kinematic variable.
///
/// Canonical units after reconciliation are meters for translations and
/// degrees for rotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VariableClass {
    /// Linear coordinate (e.g. pelvis translation), canonical meters.
    Translation,
    /// Angular coordinate (e.g. joint angle), canonical degrees.
    Rotation,
}

impl fmt::Display for VariableClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Translation => f.write_str("translation"),
            Self::Rotation => f.write_str("rotation"),
        }
    }
}

/// The six residual channels every method reports: the leftover pelvis
/// forces and moments required to reconcile motion with measured loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResidualAxis {
    Fx,
    Fy,
    Fz,
    Mx,
    My,
    Mz,
}

impl ResidualAxis {
    /// All residual axes in reporting order (forces then moments).
    pub const ALL: [Self; 6] = [Self::Fx, Self::Fy, Self::Fz, Self::Mx, Self::My, Self::Mz];

    /// Whether this axis is a residual force.
    #[must_use]
    pub const fn is_force(self) -> bool {
        matches!(self, Self::Fx | Self::Fy | Self::Fz)
    }

    /// Whether this axis is a residual moment.
    #[must_use]
    pub const fn is_moment(self) -> bool {
        !self.is_force()
    }

    /// Stable uppercase identifier used in export rows.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fx => "FX",
            Self::Fy => "FY",
            Self::Fz => "FZ",
            Self::Mx => "MX",
            Self::My => "MY",
            Self::Mz => "MZ",
        }
    }
}

impl fmt::Display for ResidualAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named scalar time series with a strictly increasing time base.
///
/// Fields are private; a channel cannot be mutated after construction.
/// The time domain may cover more than one gait cycle and may use a
/// different clock origin than other methods' channels; windowing against
/// a [`GaitCycle`] handles the alignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    name: String,
    time: Vec<f64>,
    value: Vec<f64>,
}

impl Channel {
    /// Build a channel, validating sample counts and time monotonicity.
    ///
    /// # Errors
    ///
    /// Returns an error if the series is empty, if `time` and `value`
    /// lengths differ, or if `time` is not strictly increasing.
    pub fn new(name: impl Into<String>, time: Vec<f64>, value: Vec<f64>) -> Result<Self> {
        let name = name.into();
        if time.is_empty() {
            return Err(AnalysisError::EmptyChannel { name });
        }
        if time.len() != value.len() {
            return Err(AnalysisError::sample_length_mismatch(time.len(), value.len()));
        }
        for i in 1..time.len() {
            if time[i] <= time[i - 1] {
                return Err(AnalysisError::NonMonotonicTime { index: i });
            }
        }
        Ok(Self { name, time, value })
    }

    /// Channel name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Time samples in seconds, strictly increasing.
    #[must_use]
    pub fn time(&self) -> &[f64] {
        &self.time
    }

    /// Value samples, same length as [`Channel::time`].
    #[must_use]
    pub fn value(&self) -> &[f64] {
        &self.value
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.time.len()
    }

    /// Whether the channel holds no samples. Always false for a
    /// successfully constructed channel.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Duration of the full recording, `time[last] - time[0]`.
    #[must_use]
    pub fn duration(&self) -> f64 {
        self.time[self.time.len() - 1] - self.time[0]
    }

    /// Maximum value over the whole recording.
    #[must_use]
    pub fn max_value(&self) -> f64 {
        self.value.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// A copy of this channel with every value multiplied by `factor`
    /// (e.g. `1 / model_mass` for mass-normalized residuals).
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            name: self.name.clone(),
            time: self.time.clone(),
            value: self.value.iter().map(|v| v * factor).collect(),
        }
    }
}

/// One repetition of periodic motion, bounded by foot-strike events.
///
/// Produced by external event detection; `initial_time < final_time` is
/// checked at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaitCycle {
    /// Subject identifier (e.g. "subject01").
    pub subject: String,
    /// Trial identifier (e.g. "run5").
    pub trial: String,
    /// Zero-based index of this cycle within the trial.
    pub cycle_index: usize,
    /// Cycle start, seconds on the trial clock.
    pub initial_time: f64,
    /// Cycle end, seconds on the trial clock.
    pub final_time: f64,
}

impl GaitCycle {
    /// Build a cycle record, validating the time window.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidCycle`] if `initial_time >= final_time`.
    pub fn new(
        subject: impl Into<String>,
        trial: impl Into<String>,
        cycle_index: usize,
        initial_time: f64,
        final_time: f64,
    ) -> Result<Self> {
        if initial_time >= final_time {
            return Err(AnalysisError::InvalidCycle {
                initial: initial_time,
                end: final_time,
            });
        }
        Ok(Self {
            subject: subject.into(),
            trial: trial.into(),
            cycle_index,
            initial_time,
            final_time,
        })
    }

    /// Cycle duration in seconds.
    #[must_use]
    pub fn duration(&self) -> f64 {
        self.final_time - self.initial_time
    }
}
