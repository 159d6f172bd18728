//! # Load Registry
//!
//! The registry is the single source of truth for current load magnitudes
//! during one orchestration run.
//!
//! ## Ordering
//!
//! Records are keyed by id in an [`IndexMap`]. Re-registering an id
//! overwrites the record (last write wins) but keeps its original slot, so
//! iteration always follows first-registration order. Graph ordering and
//! the optimizer both rely on this for determinism.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::record::LoadResult;
use crate::errors::EngineResult;

/// Keyed store of [`LoadResult`] records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoadRegistry {
    loads: IndexMap<String, LoadResult>,
}

impl LoadRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a load by id.
    ///
    /// Returns the previous record when the id was already registered.
    /// The record is validated first; invalid records are rejected and the
    /// registry is left unchanged.
    ///
    /// # Example
    ///
    /// ```rust
    /// use load_core::loads::{LoadCategory, LoadRegistry, LoadResult};
    ///
    /// let mut registry = LoadRegistry::new();
    /// registry.register(LoadResult::new("A", LoadCategory::Dead, 1.0))?;
    /// registry.register(LoadResult::new("B", LoadCategory::Dead, 2.0))?;
    /// let previous = registry.register(LoadResult::new("A", LoadCategory::Dead, 3.0))?;
    ///
    /// assert_eq!(previous.map(|l| l.magnitude), Some(1.0));
    /// assert_eq!(registry.ids().collect::<Vec<_>>(), vec!["A", "B"]);
    /// # Ok::<(), load_core::errors::EngineError>(())
    /// ```
    pub fn register(&mut self, load: LoadResult) -> EngineResult<Option<LoadResult>> {
        load.validate()?;
        debug!(load_id = %load.id, category = %load.category, magnitude = load.magnitude, "registering load");
        Ok(self.loads.insert(load.id.clone(), load))
    }

    /// Look up a load by id
    pub fn get(&self, id: &str) -> Option<&LoadResult> {
        self.loads.get(id)
    }

    /// Look up a load by id for in-place mutation
    pub fn get_mut(&mut self, id: &str) -> Option<&mut LoadResult> {
        self.loads.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.loads.contains_key(id)
    }

    /// Registration ordinal of a load
    pub fn position(&self, id: &str) -> Option<usize> {
        self.loads.get_index_of(id)
    }

    /// All loads matching `predicate`, in first-registration order
    pub fn list_by<P>(&self, predicate: P) -> Vec<&LoadResult>
    where
        P: Fn(&LoadResult) -> bool,
    {
        self.loads.values().filter(|load| predicate(load)).collect()
    }

    /// Ids in first-registration order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.loads.keys().map(String::as_str)
    }

    /// Loads in first-registration order
    pub fn iter(&self) -> impl Iterator<Item = &LoadResult> {
        self.loads.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut LoadResult> {
        self.loads.values_mut()
    }

    pub fn len(&self) -> usize {
        self.loads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loads.is_empty()
    }

    /// Remove every load (start of a new orchestration run)
    pub fn clear(&mut self) {
        self.loads.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loads::LoadCategory;

    #[test]
    fn test_register_and_get() {
        let mut registry = LoadRegistry::new();
        registry
            .register(LoadResult::new("DEAD-F1", LoadCategory::Dead, 100.0))
            .unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("DEAD-F1").map(|l| l.magnitude), Some(100.0));
        assert!(registry.get("DEAD-F2").is_none());
    }

    #[test]
    fn test_reregistration_keeps_first_position() {
        let mut registry = LoadRegistry::new();
        registry.register(LoadResult::new("A", LoadCategory::Live, 1.0)).unwrap();
        registry.register(LoadResult::new("B", LoadCategory::Live, 2.0)).unwrap();
        registry.register(LoadResult::new("C", LoadCategory::Live, 3.0)).unwrap();
        registry.register(LoadResult::new("A", LoadCategory::Live, 9.0)).unwrap();

        assert_eq!(registry.ids().collect::<Vec<_>>(), vec!["A", "B", "C"]);
        assert_eq!(registry.get("A").unwrap().magnitude, 9.0);
        assert_eq!(registry.position("C"), Some(2));
    }

    #[test]
    fn test_invalid_load_rejected() {
        let mut registry = LoadRegistry::new();
        let result = registry.register(LoadResult::new("BAD", LoadCategory::Dead, -1.0));
        assert!(result.is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_list_by_is_stable() {
        let mut registry = LoadRegistry::new();
        registry.register(LoadResult::new("COOLING-R2", LoadCategory::Cooling, 1.0)).unwrap();
        registry.register(LoadResult::new("DEAD-F1", LoadCategory::Dead, 1.0)).unwrap();
        registry.register(LoadResult::new("COOLING-R1", LoadCategory::Cooling, 1.0)).unwrap();

        let cooling: Vec<_> = registry
            .list_by(|l| l.category == LoadCategory::Cooling)
            .into_iter()
            .map(|l| l.id.as_str())
            .collect();
        assert_eq!(cooling, vec!["COOLING-R2", "COOLING-R1"]);
    }

    #[test]
    fn test_serialization_preserves_order() {
        let mut registry = LoadRegistry::new();
        registry.register(LoadResult::new("Z", LoadCategory::Dead, 1.0)).unwrap();
        registry.register(LoadResult::new("A", LoadCategory::Dead, 2.0)).unwrap();

        let json = serde_json::to_string(&registry).unwrap();
        let parsed: LoadRegistry = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.ids().collect::<Vec<_>>(), vec!["Z", "A"]);
    }
}
