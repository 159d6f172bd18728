//! # Building Specification
//!
//! Input data supplied by the floor-plan side of the application. The engine
//! reads it and never mutates it.
//!
//! ## Structure
//!
//! ```text
//! BuildingSpecification
//! ├── id, name
//! ├── floors: Vec<Floor>
//! │   └── spaces: Vec<Space> (area, occupancy, space type, window flag)
//! └── site: Option<SiteCharacteristics> (wind, snow, seismic, climate)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use load_core::building::{BuildingSpecification, Floor, Space, SpaceType};
//!
//! let building = BuildingSpecification::new("B-100", "Annex")
//!     .with_floor(
//!         Floor::new(1)
//!             .with_space(Space::new("R101", 120.0, 10, SpaceType::Office))
//!             .with_space(Space::new("R102", 40.0, 0, SpaceType::Storage)),
//!     );
//!
//! assert!(building.validate().is_ok());
//! assert_eq!(building.total_area_m2(), 160.0);
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{EngineError, EngineResult};
use crate::units::{Kilopascals, SquareMeters, WattsPerSquareMeter};

fn generated_id() -> String {
    Uuid::new_v4().to_string()
}

fn default_floor_height() -> f64 {
    3.5
}

/// Root input for one orchestration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingSpecification {
    /// Building identifier (generated when absent from the input file)
    #[serde(default = "generated_id")]
    pub id: String,

    #[serde(default)]
    pub name: String,

    /// At least one floor is required to start a run
    #[serde(default)]
    pub floors: Vec<Floor>,

    /// Site and climate data; environmental loads are skipped without it
    #[serde(default)]
    pub site: Option<SiteCharacteristics>,
}

impl BuildingSpecification {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        BuildingSpecification {
            id: id.into(),
            name: name.into(),
            floors: Vec::new(),
            site: None,
        }
    }

    /// Add a floor (builder pattern)
    pub fn with_floor(mut self, floor: Floor) -> Self {
        self.floors.push(floor);
        self
    }

    /// Attach site data (builder pattern)
    pub fn with_site(mut self, site: SiteCharacteristics) -> Self {
        self.site = Some(site);
        self
    }

    /// Check that the building can start an orchestration run.
    ///
    /// Every failure is a [`EngineError::Configuration`]: the run is refused
    /// before any phase touches the registry.
    pub fn validate(&self) -> EngineResult<()> {
        if self.floors.is_empty() {
            return Err(EngineError::configuration(format!(
                "building '{}' has no floors",
                self.id
            )));
        }

        let mut seen = HashSet::new();
        let mut levels = HashSet::new();
        for floor in &self.floors {
            if !levels.insert(floor.level) {
                return Err(EngineError::configuration(format!(
                    "floor level {} appears more than once",
                    floor.level
                )));
            }
            if !floor.height_m.is_finite() || floor.height_m <= 0.0 {
                return Err(EngineError::configuration(format!(
                    "floor {} has invalid height {}",
                    floor.level, floor.height_m
                )));
            }
            for space in &floor.spaces {
                if space.id.trim().is_empty() {
                    return Err(EngineError::configuration(format!(
                        "floor {} has a space without an id",
                        floor.level
                    )));
                }
                if !space.area_m2.is_finite() || space.area_m2 < 0.0 {
                    return Err(EngineError::configuration(format!(
                        "space '{}' has invalid area {}",
                        space.id, space.area_m2
                    )));
                }
                if !seen.insert(space.id.as_str()) {
                    return Err(EngineError::configuration(format!(
                        "space id '{}' appears more than once",
                        space.id
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn total_area_m2(&self) -> f64 {
        self.floors.iter().map(Floor::area_m2).sum()
    }

    pub fn total_occupancy(&self) -> u32 {
        self.floors.iter().map(Floor::occupancy).sum()
    }

    /// Floor area of the top floor, used as the roof area
    pub fn roof_area_m2(&self) -> f64 {
        self.floors
            .iter()
            .max_by_key(|f| f.level)
            .map(Floor::area_m2)
            .unwrap_or(0.0)
    }

    /// Sum of floor heights
    pub fn height_m(&self) -> f64 {
        self.floors.iter().map(|f| f.height_m).sum()
    }

    /// Floor holding the lowest level (service entrance, booster pumps)
    pub fn lowest_floor(&self) -> Option<&Floor> {
        self.floors.iter().min_by_key(|f| f.level)
    }

    /// Find the floor containing a space
    pub fn floor_of(&self, space_id: &str) -> Option<&Floor> {
        self.floors
            .iter()
            .find(|f| f.spaces.iter().any(|s| s.id == space_id))
    }
}

/// One storey of the building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Floor {
    /// Storey number (1 = ground)
    pub level: i32,

    #[serde(default)]
    pub name: String,

    /// Floor-to-floor height in metres
    #[serde(default = "default_floor_height")]
    pub height_m: f64,

    #[serde(default)]
    pub spaces: Vec<Space>,
}

impl Floor {
    pub fn new(level: i32) -> Self {
        Floor {
            level,
            name: format!("Level {level}"),
            height_m: default_floor_height(),
            spaces: Vec::new(),
        }
    }

    /// Add a space (builder pattern)
    pub fn with_space(mut self, space: Space) -> Self {
        self.spaces.push(space);
        self
    }

    pub fn with_height(mut self, height_m: f64) -> Self {
        self.height_m = height_m;
        self
    }

    /// Short tag used in load ids, e.g. `F1`, `F-1` for basements
    pub fn tag(&self) -> String {
        format!("F{}", self.level)
    }

    pub fn area_m2(&self) -> f64 {
        self.spaces.iter().map(|s| s.area_m2).sum()
    }

    pub fn occupancy(&self) -> u32 {
        self.spaces.iter().map(|s| s.occupancy).sum()
    }

    /// Elevation of the floor slab, assuming all lower floors share this height
    pub fn elevation_m(&self) -> f64 {
        f64::from(self.level - 1) * self.height_m
    }
}

/// One room or zone on a floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Space {
    /// Unique across the building; used in load ids
    pub id: String,

    #[serde(default)]
    pub name: String,

    pub area_m2: f64,

    /// Design number of occupants
    #[serde(default)]
    pub occupancy: u32,

    #[serde(default)]
    pub space_type: SpaceType,

    /// Whether the space has exterior glazing
    #[serde(default)]
    pub has_windows: bool,
}

impl Space {
    pub fn new(id: impl Into<String>, area_m2: f64, occupancy: u32, space_type: SpaceType) -> Self {
        let id = id.into();
        Space {
            name: id.clone(),
            id,
            area_m2,
            occupancy,
            space_type,
            has_windows: false,
        }
    }

    pub fn with_windows(mut self) -> Self {
        self.has_windows = true;
        self
    }

    pub fn area(&self) -> SquareMeters {
        SquareMeters(self.area_m2)
    }
}

/// Space usage tag driving default densities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpaceType {
    #[default]
    Office,
    Residential,
    Assembly,
    Retail,
    Storage,
    Mechanical,
    Corridor,
    Restroom,
    Kitchen,
}

impl SpaceType {
    /// Uniform live load (ASCE 7 Table 4.3-1, converted to kPa)
    pub fn live_load(&self) -> Kilopascals {
        Kilopascals(match self {
            SpaceType::Office => 2.40,
            SpaceType::Residential => 1.92,
            SpaceType::Assembly => 4.79,
            SpaceType::Retail => 4.79,
            SpaceType::Storage => 6.00,
            SpaceType::Mechanical => 7.18,
            SpaceType::Corridor => 4.79,
            SpaceType::Restroom => 2.40,
            SpaceType::Kitchen => 4.79,
        })
    }

    /// Plug/process equipment power density
    pub fn equipment_density(&self) -> WattsPerSquareMeter {
        WattsPerSquareMeter(match self {
            SpaceType::Office => 10.8,
            SpaceType::Residential => 5.0,
            SpaceType::Assembly => 4.0,
            SpaceType::Retail => 6.0,
            SpaceType::Storage => 1.0,
            SpaceType::Mechanical => 20.0,
            SpaceType::Corridor => 0.0,
            SpaceType::Restroom => 1.0,
            SpaceType::Kitchen => 50.0,
        })
    }

    /// Fixture-driven water demand per square metre (L/s per m²)
    pub fn fixture_flow_per_m2(&self) -> f64 {
        match self {
            SpaceType::Restroom => 0.012,
            SpaceType::Kitchen => 0.006,
            SpaceType::Residential => 0.002,
            _ => 0.0,
        }
    }
}

/// Site and climate data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteCharacteristics {
    /// Basic wind speed (3-s gust) in m/s
    pub basic_wind_speed_ms: f64,

    /// Ground snow load in kPa
    pub ground_snow_load_kpa: f64,

    /// Seismic response coefficient Cs (fraction of weight)
    pub seismic_coefficient: f64,

    /// Summer design dry-bulb temperature in °C
    pub cooling_design_temp_c: f64,

    /// Winter design dry-bulb temperature in °C
    pub heating_design_temp_c: f64,
}

impl Default for SiteCharacteristics {
    fn default() -> Self {
        SiteCharacteristics {
            basic_wind_speed_ms: 45.0,
            ground_snow_load_kpa: 1.0,
            seismic_coefficient: 0.05,
            cooling_design_temp_c: 32.0,
            heating_design_temp_c: -10.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_building() -> BuildingSpecification {
        BuildingSpecification::new("B-1", "Test")
            .with_floor(
                Floor::new(1)
                    .with_space(Space::new("R101", 100.0, 8, SpaceType::Office))
                    .with_space(Space::new("WC1", 20.0, 0, SpaceType::Restroom)),
            )
            .with_floor(Floor::new(2).with_space(Space::new("R201", 80.0, 6, SpaceType::Office)))
    }

    #[test]
    fn test_no_floors_is_configuration_error() {
        let building = BuildingSpecification::new("EMPTY", "Nothing");
        let err = building.validate().unwrap_err();
        assert_eq!(err.error_code(), "CONFIGURATION");
    }

    #[test]
    fn test_duplicate_space_ids_rejected() {
        let building = BuildingSpecification::new("B", "Dup")
            .with_floor(Floor::new(1).with_space(Space::new("R1", 10.0, 1, SpaceType::Office)))
            .with_floor(Floor::new(2).with_space(Space::new("R1", 10.0, 1, SpaceType::Office)));
        assert!(building.validate().is_err());
    }

    #[test]
    fn test_duplicate_floor_levels_rejected() {
        let building = BuildingSpecification::new("B", "Dup")
            .with_floor(Floor::new(1).with_space(Space::new("A1", 100.0, 5, SpaceType::Office)))
            .with_floor(Floor::new(1).with_space(Space::new("B1", 300.0, 5, SpaceType::Office)));
        let err = building.validate().unwrap_err();
        assert_eq!(err.error_code(), "CONFIGURATION");
        assert!(err.to_string().contains("floor level 1"));
    }

    #[test]
    fn test_negative_area_rejected() {
        let building = BuildingSpecification::new("B", "Neg")
            .with_floor(Floor::new(1).with_space(Space::new("R1", -10.0, 1, SpaceType::Office)));
        assert!(building.validate().is_err());
    }

    #[test]
    fn test_aggregates() {
        let building = test_building();
        assert!(building.validate().is_ok());
        assert_eq!(building.total_area_m2(), 200.0);
        assert_eq!(building.total_occupancy(), 14);
        assert_eq!(building.roof_area_m2(), 80.0);
        assert_eq!(building.lowest_floor().map(|f| f.level), Some(1));
        assert_eq!(building.floor_of("R201").map(|f| f.level), Some(2));
        assert_eq!(building.floors[1].elevation_m(), 3.5);
    }

    #[test]
    fn test_deserialize_minimal_json() {
        let json = r#"{
            "floors": [
                { "level": 1, "spaces": [ { "id": "R1", "area_m2": 50.0, "space_type": "kitchen" } ] }
            ],
            "site": { "basic_wind_speed_ms": 50.0 }
        }"#;
        let building: BuildingSpecification = serde_json::from_str(json).unwrap();
        assert!(!building.id.is_empty());
        assert_eq!(building.floors[0].height_m, 3.5);
        assert_eq!(building.floors[0].spaces[0].space_type, SpaceType::Kitchen);
        let site = building.site.unwrap();
        assert_eq!(site.basic_wind_speed_ms, 50.0);
        assert_eq!(site.ground_snow_load_kpa, 1.0);
    }
}
