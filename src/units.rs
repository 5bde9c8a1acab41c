//! Per-method unit and sign convention reconciliation.
//!
//! Each method emits its coordinates in its own convention: some report
//! joint angles in radians, others in degrees. The convention lives in
//! one exhaustive table that is validated before any data is touched, so
//! a missing entry is a configuration defect, never a runtime data error.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::channel::{MethodId, VariableClass};
use crate::curve::NormalizedCurve;
use crate::error::{AnalysisError, Result};

/// How a method's raw values map onto canonical units
/// (meters for translations, degrees for rotations).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitConvention {
    /// Translation already in meters.
    PassthroughMeters,
    /// Rotation in radians; multiply by `180 / π`.
    RadiansToDegrees,
    /// Rotation already in degrees.
    PassthroughDegrees,
}

impl UnitConvention {
    /// Convert one sample to canonical units.
    #[must_use]
    pub fn apply(self, value: f64) -> f64 {
        match self {
            Self::PassthroughMeters | Self::PassthroughDegrees => value,
            Self::RadiansToDegrees => value.to_degrees(),
        }
    }
}

/// The exhaustive mapping from `(method, variable class)` to convention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitTable {
    entries: BTreeMap<(MethodId, VariableClass), UnitConvention>,
}

impl UnitTable {
    /// An empty table; populate with [`UnitTable::insert`].
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// The conventions of the Hamner & Delp comparison study: all
    /// translations arrive in meters; rotations arrive in degrees except
    /// for the optimal-control and automated-server methods, which keep
    /// the solver-internal radians.
    #[must_use]
    pub fn study_defaults() -> Self {
        let mut table = Self::empty();
        for method in MethodId::ALL {
            table.insert(method, VariableClass::Translation, UnitConvention::PassthroughMeters);
            let rotation = match method {
                MethodId::Moco | MethodId::AddBiomechanics => UnitConvention::RadiansToDegrees,
                MethodId::Ik | MethodId::Rra | MethodId::Rra3 => UnitConvention::PassthroughDegrees,
            };
            table.insert(method, VariableClass::Rotation, rotation);
        }
        table
    }

    /// Set the convention for a method/class pair, replacing any previous
    /// entry.
    pub fn insert(&mut self, method: MethodId, class: VariableClass, convention: UnitConvention) {
        self.entries.insert((method, class), convention);
    }

    /// Look up the convention for a method/class pair.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::MissingUnitConvention`] for an absent entry.
    pub fn convention(&self, method: MethodId, class: VariableClass) -> Result<UnitConvention> {
        self.entries
            .get(&(method, class))
            .copied()
            .ok_or(AnalysisError::MissingUnitConvention { method, class })
    }

    /// Check the table covers every class for every method in use.
    ///
    /// Run once at startup, before any subject is processed, so a
    /// configuration hole fails the batch immediately instead of
    /// surfacing on the first offending subject.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::MissingUnitConvention`] naming the first
    /// missing pair.
    pub fn validate(&self, methods: &[MethodId]) -> Result<()> {
        for &method in methods {
            for class in [VariableClass::Translation, VariableClass::Rotation] {
                self.convention(method, class)?;
            }
        }
        Ok(())
    }

    /// Convert a normalized curve into canonical units.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::MissingUnitConvention`] for an absent
    /// entry (unreachable after a successful [`UnitTable::validate`]).
    pub fn reconcile(
        &self,
        method: MethodId,
        class: VariableClass,
        curve: &NormalizedCurve,
    ) -> Result<NormalizedCurve> {
        let convention = self.convention(method, class)?;
        Ok(curve.map(|v| convention.apply(v)))
    }
}

impl Default for UnitTable {
    fn default() -> Self {
        Self::study_defaults()
    }
}
