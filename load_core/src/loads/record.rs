//! Load records
//!
//! A [`LoadResult`] is one physical load quantity produced by a discipline
//! calculator. Records carry their own forward links (`affects`) and the
//! list of sources that have already contributed to their magnitude
//! (`affected_by`), which is what makes propagation idempotent.

use serde::{Deserialize, Serialize};

use super::load_types::LoadCategory;
use crate::errors::{EngineError, EngineResult};

/// Caller-owned location of a load (typically x, y, elevation in metres)
pub type SourceLocation = (f64, f64, f64);

/// One physical load quantity.
///
/// # Example
/// ```
/// use load_core::loads::{LoadCategory, LoadResult};
///
/// let internal = LoadResult::new("INTERNAL-R1", LoadCategory::Internal, 5.0)
///     .from_system("occupants")
///     .affecting(["COOLING-R1"]);
///
/// assert_eq!(internal.unit, "kW");
/// assert_eq!(internal.affects, vec!["COOLING-R1".to_string()]);
/// assert!(internal.validate().is_ok());
/// ```
///
/// # JSON Format
/// ```json
/// {
///   "id": "COOLING-R1",
///   "category": "COOLING",
///   "subcategory": "zone",
///   "magnitude": 5.0,
///   "unit": "kW",
///   "source_system": "AHU-1",
///   "source_location": [0.0, 0.0, 3.5],
///   "affects": ["ELEC-HVAC-R1"],
///   "affected_by": ["INTERNAL-R1"],
///   "confidence": 0.9,
///   "warnings": []
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadResult {
    /// Unique key within a registry
    pub id: String,

    pub category: LoadCategory,

    /// Free-form refinement of the category (e.g. "office", "roof")
    #[serde(default)]
    pub subcategory: String,

    /// Non-negative magnitude in `unit`
    pub magnitude: f64,

    /// Unit label, e.g. "kN", "kW", "L/s"
    pub unit: String,

    /// System that produces or serves this load (used for capacity lookup)
    #[serde(default)]
    pub source_system: String,

    #[serde(default)]
    pub source_location: SourceLocation,

    /// Outgoing edges: ids of loads this one feeds into
    #[serde(default)]
    pub affects: Vec<String>,

    /// Ids of loads that have already contributed to `magnitude`
    #[serde(default)]
    pub affected_by: Vec<String>,

    /// Certainty in `magnitude`, in [0, 1]
    pub confidence: f64,

    /// Ids of warnings raised against this load
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl LoadResult {
    /// Create a load with the category's native unit and full confidence
    pub fn new(id: impl Into<String>, category: LoadCategory, magnitude: f64) -> Self {
        LoadResult {
            id: id.into(),
            category,
            subcategory: String::new(),
            magnitude,
            unit: category.native_unit().to_string(),
            source_system: String::new(),
            source_location: (0.0, 0.0, 0.0),
            affects: Vec::new(),
            affected_by: Vec::new(),
            confidence: 1.0,
            warnings: Vec::new(),
        }
    }

    /// Override the unit label (builder pattern)
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    /// Set the subcategory (builder pattern)
    pub fn with_subcategory(mut self, subcategory: impl Into<String>) -> Self {
        self.subcategory = subcategory.into();
        self
    }

    /// Set the source system (builder pattern)
    pub fn from_system(mut self, source_system: impl Into<String>) -> Self {
        self.source_system = source_system.into();
        self
    }

    /// Set the source location (builder pattern)
    pub fn at(mut self, x: f64, y: f64, z: f64) -> Self {
        self.source_location = (x, y, z);
        self
    }

    /// Declare forward links to other loads (builder pattern)
    ///
    /// Targets do not need to be registered yet.
    pub fn affecting<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for target in targets {
            self.add_affect(target);
        }
        self
    }

    /// Record a source that has already been folded into `magnitude` (builder pattern)
    pub fn contributed_by(mut self, source_id: impl Into<String>) -> Self {
        let source_id = source_id.into();
        if !self.affected_by.contains(&source_id) {
            self.affected_by.push(source_id);
        }
        self
    }

    /// Set the confidence score (builder pattern)
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    /// Add a forward link, ignoring duplicates
    pub fn add_affect(&mut self, target: impl Into<String>) {
        let target = target.into();
        if !self.affects.contains(&target) {
            self.affects.push(target);
        }
    }

    /// Whether `source_id` has already contributed to this magnitude
    pub fn has_contribution_from(&self, source_id: &str) -> bool {
        self.affected_by.iter().any(|id| id == source_id)
    }

    /// Fold a contribution from `source_id` into this load.
    ///
    /// Returns `false` and leaves the load untouched when the source has
    /// already contributed or the impact is not positive.
    pub fn apply_contribution(&mut self, source_id: &str, impact: f64) -> bool {
        if !(impact > 0.0) || self.has_contribution_from(source_id) {
            return false;
        }
        self.magnitude += impact;
        self.affected_by.push(source_id.to_string());
        true
    }

    /// Attach a warning id, ignoring duplicates
    pub fn attach_warning(&mut self, warning_id: impl Into<String>) {
        let warning_id = warning_id.into();
        if !self.warnings.contains(&warning_id) {
            self.warnings.push(warning_id);
        }
    }

    /// Validate the record invariants.
    ///
    /// Checks that the id is non-empty, the magnitude is finite and
    /// non-negative, and the confidence lies in [0, 1].
    pub fn validate(&self) -> EngineResult<()> {
        if self.id.trim().is_empty() {
            return Err(EngineError::invalid_input("id", &self.id, "Load id cannot be empty"));
        }
        if !self.magnitude.is_finite() || self.magnitude < 0.0 {
            return Err(EngineError::invalid_input(
                format!("{}.magnitude", self.id),
                self.magnitude.to_string(),
                "Magnitude must be finite and non-negative",
            ));
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(EngineError::invalid_input(
                format!("{}.confidence", self.id),
                self.confidence.to_string(),
                "Confidence must be between 0 and 1",
            ));
        }
        Ok(())
    }
}
