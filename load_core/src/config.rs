//! # Engine Configuration
//!
//! Everything tunable about a [`LoadEngine`](crate::engine::LoadEngine)
//! session, loaded from JSON. Every section is optional; missing fields fall
//! back to the reference values, so `{}` is a valid config.
//!
//! ## JSON Example
//!
//! ```json
//! {
//!   "version": "0.1.0",
//!   "impact_factors": [
//!     { "source": "COOLING", "target": "HVAC_ELECTRICAL", "factor": 0.25 }
//!   ],
//!   "thresholds": [
//!     { "category": "POWER", "max_value": 400.0, "mitigation_action": "Upgrade service" }
//!   ],
//!   "compliance": { "panel_rating_kw": 400.0 },
//!   "capacities": { "PANEL-F1": 400.0 },
//!   "calculators": { "lighting_density_w_m2": 8.0 },
//!   "optimization": { "enabled": true, "seed": 7 }
//! }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::calculators::CalculatorSettings;
use crate::compliance::ComplianceLimits;
use crate::errors::{EngineError, EngineResult};
use crate::optimization::OptimizationConfig;
use crate::propagation::{ImpactFactorEntry, ImpactTable};
use crate::thresholds::{ThresholdEntry, ThresholdTable};

/// Current config and schedule schema version
pub const SCHEMA_VERSION: &str = "0.1.0";

fn schema_version() -> String {
    SCHEMA_VERSION.to_string()
}

/// Session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Schema version for compatibility checking
    #[serde(default = "schema_version")]
    pub version: String,

    /// Start from an empty impact table instead of the reference factors
    pub replace_impact_factors: bool,

    /// Pairs added to or overriding the impact table
    pub impact_factors: Vec<ImpactFactorEntry>,

    /// Start from an empty threshold table instead of the reference limits
    pub replace_thresholds: bool,

    /// Limits added to or overriding the threshold table
    pub thresholds: Vec<ThresholdEntry>,

    pub compliance: ComplianceLimits,

    /// Known capacity per `source_system`, used by the optimizer
    pub capacities: IndexMap<String, f64>,

    pub calculators: CalculatorSettings,

    pub optimization: OptimizationConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            version: schema_version(),
            replace_impact_factors: false,
            impact_factors: Vec::new(),
            replace_thresholds: false,
            thresholds: Vec::new(),
            compliance: ComplianceLimits::default(),
            capacities: IndexMap::new(),
            calculators: CalculatorSettings::default(),
            optimization: OptimizationConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Add or override an impact factor (builder pattern)
    pub fn with_impact_factor(mut self, entry: ImpactFactorEntry) -> Self {
        self.impact_factors.push(entry);
        self
    }

    /// Add or override a threshold (builder pattern)
    pub fn with_threshold(mut self, entry: ThresholdEntry) -> Self {
        self.thresholds.push(entry);
        self
    }

    pub fn with_capacity(mut self, source_system: impl Into<String>, capacity: f64) -> Self {
        self.capacities.insert(source_system.into(), capacity);
        self
    }

    pub fn with_optimization(mut self, optimization: OptimizationConfig) -> Self {
        self.optimization = optimization;
        self
    }

    /// Resolved impact table
    pub fn impact_table(&self) -> ImpactTable {
        let mut table = if self.replace_impact_factors {
            ImpactTable::empty()
        } else {
            ImpactTable::default()
        };
        table.apply_entries(&self.impact_factors);
        table
    }

    /// Resolved threshold table
    pub fn threshold_table(&self) -> ThresholdTable {
        let mut table = if self.replace_thresholds {
            ThresholdTable::empty()
        } else {
            ThresholdTable::default()
        };
        table.apply_entries(&self.thresholds);
        table
    }

    /// Check that every numeric setting is usable.
    pub fn validate(&self) -> EngineResult<()> {
        for entry in &self.impact_factors {
            if !entry.factor.is_finite() || entry.factor < 0.0 {
                return Err(EngineError::invalid_input(
                    format!("impact_factors[{}->{}]", entry.source, entry.target),
                    entry.factor.to_string(),
                    "Impact factors must be finite and non-negative",
                ));
            }
        }
        for entry in &self.thresholds {
            if !entry.max_value.is_finite() || entry.max_value < 0.0 {
                return Err(EngineError::invalid_input(
                    format!("thresholds[{}]", entry.category),
                    entry.max_value.to_string(),
                    "Threshold must be finite and non-negative",
                ));
            }
        }
        for (system, capacity) in &self.capacities {
            if !capacity.is_finite() || *capacity <= 0.0 {
                return Err(EngineError::invalid_input(
                    format!("capacities[{system}]"),
                    capacity.to_string(),
                    "Capacity must be positive",
                ));
            }
        }
        self.optimization.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loads::LoadCategory;

    #[test]
    fn test_empty_json_is_default() {
        let config: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.version, SCHEMA_VERSION);
    }

    #[test]
    fn test_overrides_apply_on_reference_tables() {
        let json = r#"{
            "impact_factors": [{ "source": "COOLING", "target": "HVAC_ELECTRICAL", "factor": 0.25 }],
            "thresholds": [{ "category": "POWER", "max_value": 400.0 }]
        }"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();

        let impacts = config.impact_table();
        assert_eq!(impacts.factor(LoadCategory::Cooling, LoadCategory::HvacElectrical), 0.25);
        assert_eq!(impacts.factor(LoadCategory::Internal, LoadCategory::Cooling), 1.0);

        let thresholds = config.threshold_table();
        assert_eq!(thresholds.get(LoadCategory::Power).unwrap().max_value, 400.0);
        assert!(thresholds.get(LoadCategory::Pump).is_some());
    }

    #[test]
    fn test_replace_tables() {
        let config = EngineConfig {
            replace_impact_factors: true,
            replace_thresholds: true,
            ..Default::default()
        }
        .with_impact_factor(ImpactFactorEntry::new(LoadCategory::Snow, LoadCategory::Dead, 1.0));

        assert_eq!(config.impact_table().len(), 1);
        assert!(config.threshold_table().is_empty());
    }

    #[test]
    fn test_validate_rejects_negative_factor() {
        let config = EngineConfig::default().with_impact_factor(ImpactFactorEntry::new(
            LoadCategory::Cooling,
            LoadCategory::HvacElectrical,
            -1.0,
        ));
        let err = config.validate().unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let config = EngineConfig::default().with_capacity("PANEL-F1", 0.0);
        assert!(config.validate().is_err());
    }
}
