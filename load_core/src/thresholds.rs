//! # Magnitude Thresholds
//!
//! Per-category upper limits. A load whose magnitude is strictly greater
//! than its category's `max_value` raises one `HIGH` warning carrying the
//! limit and the overshoot. Categories without an entry are skipped; that is
//! a lookup miss, not an error.
//!
//! The check runs in two places: on every propagation target immediately
//! after it receives a contribution, and once over the whole registry in the
//! checking phase of an orchestration run.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::loads::{LoadCategory, LoadRegistry, LoadResult};
use crate::warnings::{LoadWarning, Severity, WarningDispatcher};

/// Limit for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub max_value: f64,
    pub mitigation_action: String,
}

/// Serialized form of one threshold table row.
///
/// ## JSON Example
///
/// ```json
/// { "category": "POWER", "max_value": 250.0, "mitigation_action": "Split the panel" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdEntry {
    pub category: LoadCategory,
    pub max_value: f64,
    #[serde(default)]
    pub mitigation_action: String,
}

static REFERENCE_THRESHOLDS: Lazy<ThresholdTable> = Lazy::new(|| {
    ThresholdTable::empty()
        .with_limit(
            LoadCategory::Power,
            250.0,
            "Split the floor distribution board or upgrade the service",
        )
        .with_limit(
            LoadCategory::HvacElectrical,
            60.0,
            "Stage the HVAC equipment or add a dedicated feeder",
        )
        .with_limit(
            LoadCategory::Cooling,
            100.0,
            "Add a zone cooling unit or reduce internal gains",
        )
        .with_limit(
            LoadCategory::Heating,
            80.0,
            "Improve envelope insulation or add heating capacity",
        )
        .with_limit(
            LoadCategory::WaterSupply,
            5.0,
            "Upsize the riser or add a pressure zone",
        )
        .with_limit(LoadCategory::Drainage, 6.0, "Upsize the drainage stack")
        .with_limit(LoadCategory::Pump, 15.0, "Add a second booster pump")
});

/// Per-category limits, keyed by category.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdTable {
    limits: IndexMap<LoadCategory, Threshold>,
}

impl Default for ThresholdTable {
    /// The reference limits shipped with the engine
    fn default() -> Self {
        REFERENCE_THRESHOLDS.clone()
    }
}

impl ThresholdTable {
    /// A table with no limits (every check is skipped)
    pub fn empty() -> Self {
        ThresholdTable {
            limits: IndexMap::new(),
        }
    }

    /// Add or replace a limit (builder pattern)
    pub fn with_limit(mut self, category: LoadCategory, max_value: f64, mitigation_action: impl Into<String>) -> Self {
        self.set(category, max_value, mitigation_action);
        self
    }

    /// Add or replace a limit
    pub fn set(&mut self, category: LoadCategory, max_value: f64, mitigation_action: impl Into<String>) {
        self.limits.insert(
            category,
            Threshold {
                max_value,
                mitigation_action: mitigation_action.into(),
            },
        );
    }

    pub fn get(&self, category: LoadCategory) -> Option<&Threshold> {
        self.limits.get(&category)
    }

    pub fn len(&self) -> usize {
        self.limits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.limits.is_empty()
    }

    /// Apply config rows on top of the current limits
    pub fn apply_entries(&mut self, entries: &[ThresholdEntry]) {
        for entry in entries {
            self.set(entry.category, entry.max_value, entry.mitigation_action.clone());
        }
    }

    /// Table rows in insertion order
    pub fn entries(&self) -> Vec<ThresholdEntry> {
        self.limits
            .iter()
            .map(|(category, t)| ThresholdEntry {
                category: *category,
                max_value: t.max_value,
                mitigation_action: t.mitigation_action.clone(),
            })
            .collect()
    }

    /// Build the warning for `load`, if it exceeds its category limit.
    ///
    /// # Example
    /// ```
    /// use load_core::loads::{LoadCategory, LoadResult};
    /// use load_core::thresholds::ThresholdTable;
    /// use load_core::warnings::Severity;
    ///
    /// let table = ThresholdTable::empty().with_limit(LoadCategory::Electrical, 50.0, "Shed load");
    /// let load = LoadResult::new("ELEC-1", LoadCategory::Electrical, 60.0);
    ///
    /// let warning = table.evaluate(&load).unwrap();
    /// assert_eq!(warning.severity, Severity::High);
    /// assert_eq!(warning.threshold_exceeded, Some(50.0));
    /// ```
    pub fn evaluate(&self, load: &LoadResult) -> Option<LoadWarning> {
        let threshold = self.get(load.category)?;
        if !(load.magnitude > threshold.max_value) {
            return None;
        }
        let overshoot = load.magnitude - threshold.max_value;
        let message = format!(
            "{} {} load of {:.2} {} exceeds the {:.2} {} limit by {:.2} {}",
            load.id,
            load.category,
            load.magnitude,
            load.unit,
            threshold.max_value,
            load.unit,
            overshoot,
            load.unit
        );
        Some(
            LoadWarning::new(Severity::High, load.category.code(), message)
                .with_system(load.source_system.clone())
                .with_threshold(threshold.max_value)
                .with_action(threshold.mitigation_action.clone())
                .auto_fixable(false)
                .for_load(load.id.clone()),
        )
    }

    /// Check one registered load, emitting and attaching a warning if it
    /// exceeds its limit. Unknown ids are skipped.
    pub fn check_load(
        &self,
        registry: &mut LoadRegistry,
        load_id: &str,
        dispatcher: &mut WarningDispatcher,
    ) -> Option<String> {
        let warning = self.evaluate(registry.get(load_id)?)?;
        let warning_id = dispatcher.emit(warning);
        if let Some(load) = registry.get_mut(load_id) {
            load.attach_warning(warning_id.clone());
        }
        Some(warning_id)
    }

    /// Check every registered load, in registration order.
    pub fn check_all(&self, registry: &mut LoadRegistry, dispatcher: &mut WarningDispatcher) -> Vec<String> {
        let ids: Vec<String> = registry.ids().map(str::to_string).collect();
        ids.iter()
            .filter_map(|id| self.check_load(registry, id, dispatcher))
            .collect()
    }
}
