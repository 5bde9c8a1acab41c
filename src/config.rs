//! Analysis configuration: threshold factors and the unit table.
//!
//! Validated once, before any subject is processed, so configuration
//! holes fail the batch immediately rather than surfacing mid-run on the
//! first offending subject.

use serde::{Deserialize, Serialize};

use crate::channel::MethodId;
use crate::error::{AnalysisError, Result};
use crate::units::UnitTable;

/// Configuration for a comparison batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Residual force bound as a fraction of peak vertical GRF.
    pub force_threshold_factor: f64,

    /// Residual moment bound as a fraction of peak vertical GRF times
    /// center-of-mass height.
    pub moment_threshold_factor: f64,

    /// Per-method unit conventions.
    pub unit_table: UnitTable,

    /// Methods expected to appear in the batch. The unit table must cover
    /// all of them; a method missing from a particular subject's data is
    /// recorded as partial coverage, not an error.
    pub methods: Vec<MethodId>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            force_threshold_factor: 0.05,
            moment_threshold_factor: 0.01,
            unit_table: UnitTable::study_defaults(),
            methods: MethodId::ALL.to_vec(),
        }
    }
}

impl AnalysisConfig {
    /// Create a configuration with the study defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the batch to a subset of methods.
    #[must_use]
    pub fn with_methods(mut self, methods: Vec<MethodId>) -> Self {
        self.methods = methods;
        self
    }

    /// Replace the unit convention table.
    #[must_use]
    pub fn with_unit_table(mut self, table: UnitTable) -> Self {
        self.unit_table = table;
        self
    }

    /// Override the residual threshold factors.
    #[must_use]
    pub const fn with_threshold_factors(mut self, force: f64, moment: f64) -> Self {
        self.force_threshold_factor = force;
        self.moment_threshold_factor = moment;
        self
    }

    /// Validate factors and unit-table coverage.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidConfig`] for out-of-range factors
    /// or an empty method list, and
    /// [`AnalysisError::MissingUnitConvention`] for a table hole.
    pub fn validate(&self) -> Result<()> {
        if self.force_threshold_factor <= 0.0 {
            return Err(AnalysisError::invalid_config(
                "force_threshold_factor must be positive",
            ));
        }
        if self.moment_threshold_factor <= 0.0 {
            return Err(AnalysisError::invalid_config(
                "moment_threshold_factor must be positive",
            ));
        }
        if self.methods.is_empty() {
            return Err(AnalysisError::invalid_config(
                "at least one method must be configured",
            ));
        }
        self.unit_table.validate(&self.methods)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::VariableClass;
    use crate::units::UnitConvention;

    #[test]
    fn test_default_config_validates() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.force_threshold_factor, 0.05);
        assert_eq!(config.moment_threshold_factor, 0.01);
        assert_eq!(config.methods, MethodId::ALL.to_vec());
    }

    #[test]
    fn test_factor_validation() {
        let config = AnalysisConfig::default().with_threshold_factors(0.0, 0.01);
        assert!(config.validate().is_err());

        let config = AnalysisConfig::default().with_threshold_factors(0.05, -1.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_methods_rejected() {
        let config = AnalysisConfig::default().with_methods(vec![]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_table_hole_is_fatal_at_validation() {
        let mut table = UnitTable::empty();
        table.insert(MethodId::Rra, VariableClass::Translation, UnitConvention::PassthroughMeters);
        let config = AnalysisConfig::default()
            .with_methods(vec![MethodId::Rra])
            .with_unit_table(table);

        let err = config.validate().unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_builder_pattern() {
        let config = AnalysisConfig::new()
            .with_methods(vec![MethodId::Ik, MethodId::Moco])
            .with_threshold_factors(0.1, 0.02);
        assert_eq!(config.methods.len(), 2);
        assert_eq!(config.force_threshold_factor, 0.1);
    }
}
