//! Load category and discipline definitions
//!
//! The category set is closed: every load the engine tracks belongs to one
//! of the primary categories below, or to one of the composite totals that
//! aggregate a whole discipline.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::EngineError;

/// Engineering discipline that owns a load category.
///
/// Each discipline has a native unit used when loads are summarized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Discipline {
    Structural,
    Thermal,
    Electrical,
    Plumbing,
}

impl Discipline {
    /// All disciplines in schedule order
    pub const ALL: [Discipline; 4] = [
        Discipline::Structural,
        Discipline::Thermal,
        Discipline::Electrical,
        Discipline::Plumbing,
    ];

    /// Native unit label for discipline totals
    pub fn native_unit(&self) -> &'static str {
        match self {
            Discipline::Structural => "kN",
            Discipline::Thermal => "kW",
            Discipline::Electrical => "kW",
            Discipline::Plumbing => "L/s",
        }
    }

    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            Discipline::Structural => "Structural",
            Discipline::Thermal => "Thermal",
            Discipline::Electrical => "Electrical",
            Discipline::Plumbing => "Plumbing",
        }
    }
}

impl std::fmt::Display for Discipline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Load categories across all disciplines
///
/// Serialized in SCREAMING_SNAKE_CASE (`"HVAC_ELECTRICAL"`), which is also
/// the string form returned by [`LoadCategory::code`].
///
/// # Example
/// ```
/// use load_core::loads::{Discipline, LoadCategory};
///
/// let cooling = LoadCategory::Cooling;
/// assert_eq!(cooling.code(), "COOLING");
/// assert_eq!(cooling.discipline(), Discipline::Thermal);
/// assert_eq!(cooling.native_unit(), "kW");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoadCategory {
    /// Self-weight of structure and permanent attachments
    Dead,
    /// Occupancy load
    Live,
    Wind,
    Seismic,
    Snow,
    /// Sensible + latent cooling demand
    Cooling,
    Heating,
    /// Internal gains from occupants
    Internal,
    /// Panel/service demand; accumulates downstream electrical contributions
    Power,
    Lighting,
    /// Plug and process loads
    Equipment,
    /// Electrical input to HVAC plant
    HvacElectrical,
    WaterSupply,
    Drainage,
    /// Booster pump electrical demand
    Pump,
    /// Composite structural total
    Structural,
    /// Composite thermal total
    Thermal,
    /// Composite electrical total
    Electrical,
    /// Composite plumbing total
    Plumbing,
}

impl LoadCategory {
    /// All categories, primaries first, composites last
    pub const ALL: [LoadCategory; 19] = [
        LoadCategory::Dead,
        LoadCategory::Live,
        LoadCategory::Wind,
        LoadCategory::Seismic,
        LoadCategory::Snow,
        LoadCategory::Cooling,
        LoadCategory::Heating,
        LoadCategory::Internal,
        LoadCategory::Power,
        LoadCategory::Lighting,
        LoadCategory::Equipment,
        LoadCategory::HvacElectrical,
        LoadCategory::WaterSupply,
        LoadCategory::Drainage,
        LoadCategory::Pump,
        LoadCategory::Structural,
        LoadCategory::Thermal,
        LoadCategory::Electrical,
        LoadCategory::Plumbing,
    ];

    /// Stable string code (matches the serialized form)
    pub fn code(&self) -> &'static str {
        match self {
            LoadCategory::Dead => "DEAD",
            LoadCategory::Live => "LIVE",
            LoadCategory::Wind => "WIND",
            LoadCategory::Seismic => "SEISMIC",
            LoadCategory::Snow => "SNOW",
            LoadCategory::Cooling => "COOLING",
            LoadCategory::Heating => "HEATING",
            LoadCategory::Internal => "INTERNAL",
            LoadCategory::Power => "POWER",
            LoadCategory::Lighting => "LIGHTING",
            LoadCategory::Equipment => "EQUIPMENT",
            LoadCategory::HvacElectrical => "HVAC_ELECTRICAL",
            LoadCategory::WaterSupply => "WATER_SUPPLY",
            LoadCategory::Drainage => "DRAINAGE",
            LoadCategory::Pump => "PUMP",
            LoadCategory::Structural => "STRUCTURAL",
            LoadCategory::Thermal => "THERMAL",
            LoadCategory::Electrical => "ELECTRICAL",
            LoadCategory::Plumbing => "PLUMBING",
        }
    }

    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            LoadCategory::Dead => "Dead load",
            LoadCategory::Live => "Live load",
            LoadCategory::Wind => "Wind load",
            LoadCategory::Seismic => "Seismic load",
            LoadCategory::Snow => "Snow load",
            LoadCategory::Cooling => "Cooling demand",
            LoadCategory::Heating => "Heating demand",
            LoadCategory::Internal => "Internal heat gain",
            LoadCategory::Power => "Panel power demand",
            LoadCategory::Lighting => "Lighting power",
            LoadCategory::Equipment => "Equipment power",
            LoadCategory::HvacElectrical => "HVAC electrical input",
            LoadCategory::WaterSupply => "Water supply flow",
            LoadCategory::Drainage => "Drainage flow",
            LoadCategory::Pump => "Pump power",
            LoadCategory::Structural => "Structural total",
            LoadCategory::Thermal => "Thermal total",
            LoadCategory::Electrical => "Electrical total",
            LoadCategory::Plumbing => "Plumbing total",
        }
    }

    /// Discipline that owns this category
    pub fn discipline(&self) -> Discipline {
        match self {
            LoadCategory::Dead
            | LoadCategory::Live
            | LoadCategory::Wind
            | LoadCategory::Seismic
            | LoadCategory::Snow
            | LoadCategory::Structural => Discipline::Structural,
            LoadCategory::Cooling
            | LoadCategory::Heating
            | LoadCategory::Internal
            | LoadCategory::Thermal => Discipline::Thermal,
            LoadCategory::Power
            | LoadCategory::Lighting
            | LoadCategory::Equipment
            | LoadCategory::HvacElectrical
            | LoadCategory::Electrical => Discipline::Electrical,
            LoadCategory::WaterSupply
            | LoadCategory::Drainage
            | LoadCategory::Pump
            | LoadCategory::Plumbing => Discipline::Plumbing,
        }
    }

    /// Native unit label for loads of this category
    ///
    /// Pump demand is electrical power even though pumps belong to plumbing.
    pub fn native_unit(&self) -> &'static str {
        match self {
            LoadCategory::Pump => "kW",
            other => other.discipline().native_unit(),
        }
    }

    /// Whether this is a composite discipline total
    pub fn is_composite(&self) -> bool {
        matches!(
            self,
            LoadCategory::Structural
                | LoadCategory::Thermal
                | LoadCategory::Electrical
                | LoadCategory::Plumbing
        )
    }

    /// Whether this category accumulates other loads' contributions
    ///
    /// Aggregates are excluded from discipline totals so that the same
    /// demand is not counted twice.
    pub fn is_aggregate(&self) -> bool {
        self.is_composite() || matches!(self, LoadCategory::Power)
    }

    /// Whether this is a site-driven environmental load
    pub fn is_environmental(&self) -> bool {
        matches!(self, LoadCategory::Wind | LoadCategory::Seismic | LoadCategory::Snow)
    }
}

impl std::fmt::Display for LoadCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for LoadCategory {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        LoadCategory::ALL
            .iter()
            .copied()
            .find(|c| c.code() == wanted)
            .ok_or_else(|| EngineError::invalid_input("category", s, "Unknown load category"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_codes_match_serialization() {
        for category in LoadCategory::ALL {
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{}\"", category.code()));
        }
    }

    #[test]
    fn test_disciplines() {
        assert_eq!(LoadCategory::Dead.discipline(), Discipline::Structural);
        assert_eq!(LoadCategory::Snow.discipline(), Discipline::Structural);
        assert_eq!(LoadCategory::Internal.discipline(), Discipline::Thermal);
        assert_eq!(LoadCategory::HvacElectrical.discipline(), Discipline::Electrical);
        assert_eq!(LoadCategory::Drainage.discipline(), Discipline::Plumbing);
    }

    #[test]
    fn test_pump_is_measured_in_kw() {
        assert_eq!(LoadCategory::Pump.discipline(), Discipline::Plumbing);
        assert_eq!(LoadCategory::Pump.native_unit(), "kW");
        assert_eq!(LoadCategory::WaterSupply.native_unit(), "L/s");
    }

    #[test]
    fn test_aggregates() {
        assert!(LoadCategory::Power.is_aggregate());
        assert!(LoadCategory::Electrical.is_aggregate());
        assert!(!LoadCategory::Power.is_composite());
        assert!(!LoadCategory::Lighting.is_aggregate());
    }

    #[test]
    fn test_from_str() {
        assert_eq!("hvac_electrical".parse::<LoadCategory>().unwrap(), LoadCategory::HvacElectrical);
        assert_eq!(" ELECTRICAL ".parse::<LoadCategory>().unwrap(), LoadCategory::Electrical);
        assert!("PLASMA".parse::<LoadCategory>().is_err());
    }

    #[test]
    fn test_all_contains_all_variants() {
        assert_eq!(LoadCategory::ALL.len(), 19);
        assert_eq!(Discipline::ALL.len(), 4);
    }
}
