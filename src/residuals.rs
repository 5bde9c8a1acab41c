//! Acceptable residual bounds derived from experimental loads.
//!
//! The recommendation follows the study convention: residual forces should
//! stay under 5% of the peak vertical ground-reaction force, residual
//! moments under 1% of peak force times center-of-mass height.

use serde::{Deserialize, Serialize};

use crate::channel::{Channel, ResidualAxis};
use crate::config::AnalysisConfig;

/// Acceptable residual force/moment bounds for one subject/trial.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResidualThreshold {
    /// Maximum recommended residual force, newtons.
    pub force_threshold_n: f64,
    /// Maximum recommended residual moment, newton-meters.
    pub moment_threshold_nm: f64,
}

impl ResidualThreshold {
    /// Derive thresholds from the trial's vertical ground-reaction forces
    /// and the model center-of-mass height at the static reference pose.
    #[must_use]
    pub fn from_trial(
        left_vgrf: &Channel,
        right_vgrf: &Channel,
        com_height_m: f64,
        config: &AnalysisConfig,
    ) -> Self {
        let peak_vgrf = left_vgrf.max_value().max(right_vgrf.max_value());
        Self {
            force_threshold_n: peak_vgrf * config.force_threshold_factor,
            moment_threshold_nm: peak_vgrf * com_height_m * config.moment_threshold_factor,
        }
    }

    /// The bound that applies to a given residual axis.
    #[must_use]
    pub const fn bound_for(self, axis: ResidualAxis) -> f64 {
        if axis.is_force() {
            self.force_threshold_n
        } else {
            self.moment_threshold_nm
        }
    }

    /// Whether a residual magnitude is within the recommended bound.
    #[must_use]
    pub fn allows(self, axis: ResidualAxis, value: f64) -> bool {
        value.abs() <= self.bound_for(axis)
    }
}
