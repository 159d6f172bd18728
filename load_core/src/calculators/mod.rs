//! # Discipline Calculators
//!
//! Producers of the initial load set. The engine runs calculators in
//! [`CalculationPhase`] order (stable within a phase), registering every
//! record a calculator returns before the next one starts, so a later phase
//! can read what an earlier phase registered.
//!
//! The reference calculators use placeholder densities from
//! [`CalculatorSettings`]; real sizing code plugs in through the
//! [`DisciplineCalculator`] trait.
//!
//! ## Reference Load Ids
//!
//! | Phase | Ids | Links |
//! |-------|-----|-------|
//! | Environmental | `WIND-B`, `SNOW-ROOF`, `SEISMIC-B` | none |
//! | Structural | `DEAD-F{n}`, `LIVE-F{n}` | none |
//! | Thermal | `INTERNAL-{s}`, `COOLING-{s}`, `HEATING-{s}` | INTERNAL → COOLING → ELEC-HVAC, HEATING → ELEC-HVAC |
//! | Electrical | `LIGHTING-{s}`, `EQUIPMENT-{s}`, `ELEC-HVAC-{s}`, `POWER-F{n}` | LIGHTING/EQUIPMENT → COOLING + POWER, ELEC-HVAC → POWER |
//! | Plumbing | `WATER-F{n}`, `DRAIN-F{n}`, `PUMP-B` | WATER → DRAIN + PUMP, PUMP → lowest POWER |

pub mod electrical;
pub mod environmental;
pub mod plumbing;
pub mod structural;
pub mod thermal;

use serde::{Deserialize, Serialize};

use crate::building::BuildingSpecification;
use crate::loads::{LoadRegistry, LoadResult};

pub use electrical::ElectricalCalculator;
pub use environmental::EnvironmentalCalculator;
pub use plumbing::PlumbingCalculator;
pub use structural::StructuralCalculator;
pub use thermal::ThermalCalculator;

/// Fixed phase order of an orchestration run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationPhase {
    Environmental,
    Structural,
    Thermal,
    Electrical,
    Plumbing,
}

impl CalculationPhase {
    pub const ALL: [CalculationPhase; 5] = [
        CalculationPhase::Environmental,
        CalculationPhase::Structural,
        CalculationPhase::Thermal,
        CalculationPhase::Electrical,
        CalculationPhase::Plumbing,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            CalculationPhase::Environmental => "environmental",
            CalculationPhase::Structural => "structural",
            CalculationPhase::Thermal => "thermal",
            CalculationPhase::Electrical => "electrical",
            CalculationPhase::Plumbing => "plumbing",
        }
    }
}

impl std::fmt::Display for CalculationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A producer of loads for one discipline.
///
/// `registry` holds everything registered by earlier calculators in the run.
/// Upstream loads may be missing (a calculator was removed, the building has
/// no site data); implementations fall back to estimates rather than fail.
pub trait DisciplineCalculator: Send + Sync {
    fn name(&self) -> &str;

    fn phase(&self) -> CalculationPhase;

    fn calculate(&self, building: &BuildingSpecification, registry: &LoadRegistry) -> Vec<LoadResult>;
}

/// Densities and coefficients for the reference calculators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculatorSettings {
    /// Superimposed dead load including slab self-weight (kPa)
    pub dead_load_kpa: f64,

    /// Seismic weight per floor area (kPa)
    pub seismic_weight_kpa: f64,

    /// Combined windward + leeward pressure coefficient
    pub wind_pressure_coefficient: f64,

    /// Flat-roof snow exposure factor
    pub snow_exposure_factor: f64,

    /// Sensible + latent gain per occupant (W)
    pub occupant_gain_w: f64,

    /// Envelope cooling load (W/m²) at the 32 °C reference design day
    pub envelope_cooling_w_m2: f64,

    /// Additional solar gain for glazed spaces (W/m²)
    pub glazing_cooling_w_m2: f64,

    /// Heat loss per m² per kelvin of indoor/outdoor difference (W/m²K)
    pub heat_loss_w_m2k: f64,

    /// Heating density used when no site data is available (W/m²)
    pub default_heating_w_m2: f64,

    /// Indoor heating setpoint (°C)
    pub indoor_setpoint_c: f64,

    pub lighting_density_w_m2: f64,

    /// Cooling density for the HVAC fallback estimate (W/m²)
    pub fallback_cooling_w_m2: f64,

    /// Electrical input per kW of cooling
    pub hvac_electrical_ratio: f64,

    /// Domestic water demand per occupant (L/s)
    pub water_per_occupant_lps: f64,
}

impl Default for CalculatorSettings {
    fn default() -> Self {
        CalculatorSettings {
            dead_load_kpa: 4.5,
            seismic_weight_kpa: 6.0,
            wind_pressure_coefficient: 1.3,
            snow_exposure_factor: 0.7,
            occupant_gain_w: 130.0,
            envelope_cooling_w_m2: 25.0,
            glazing_cooling_w_m2: 35.0,
            heat_loss_w_m2k: 1.2,
            default_heating_w_m2: 40.0,
            indoor_setpoint_c: 21.0,
            lighting_density_w_m2: 10.0,
            fallback_cooling_w_m2: 80.0,
            hvac_electrical_ratio: 0.29,
            water_per_occupant_lps: 0.004,
        }
    }
}

/// The five reference calculators, in phase order
pub fn reference_calculators(settings: &CalculatorSettings) -> Vec<Box<dyn DisciplineCalculator>> {
    vec![
        Box::new(EnvironmentalCalculator::new(settings.clone())),
        Box::new(StructuralCalculator::new(settings.clone())),
        Box::new(ThermalCalculator::new(settings.clone())),
        Box::new(ElectricalCalculator::new(settings.clone())),
        Box::new(PlumbingCalculator::new(settings.clone())),
    ]
}

/// Load id conventions shared by the reference calculators and predicates
pub mod ids {
    pub const WIND: &str = "WIND-B";
    pub const SNOW: &str = "SNOW-ROOF";
    pub const SEISMIC: &str = "SEISMIC-B";
    pub const PUMP: &str = "PUMP-B";

    pub fn dead(floor_tag: &str) -> String {
        format!("DEAD-{floor_tag}")
    }

    pub fn live(floor_tag: &str) -> String {
        format!("LIVE-{floor_tag}")
    }

    pub fn power(floor_tag: &str) -> String {
        format!("POWER-{floor_tag}")
    }

    pub fn water(floor_tag: &str) -> String {
        format!("WATER-{floor_tag}")
    }

    pub fn drain(floor_tag: &str) -> String {
        format!("DRAIN-{floor_tag}")
    }

    pub fn internal(space_id: &str) -> String {
        format!("INTERNAL-{space_id}")
    }

    pub fn cooling(space_id: &str) -> String {
        format!("COOLING-{space_id}")
    }

    pub fn heating(space_id: &str) -> String {
        format!("HEATING-{space_id}")
    }

    pub fn hvac(space_id: &str) -> String {
        format!("ELEC-HVAC-{space_id}")
    }

    pub fn lighting(space_id: &str) -> String {
        format!("LIGHTING-{space_id}")
    }

    pub fn equipment(space_id: &str) -> String {
        format!("EQUIPMENT-{space_id}")
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::building::{BuildingSpecification, Floor, SiteCharacteristics, Space, SpaceType};

    /// Two floors, three spaces, with site data
    pub fn sample_building() -> BuildingSpecification {
        BuildingSpecification::new("B-TEST", "Test Block")
            .with_floor(
                Floor::new(1)
                    .with_space(Space::new("R101", 200.0, 20, SpaceType::Office).with_windows())
                    .with_space(Space::new("R102", 50.0, 0, SpaceType::Restroom)),
            )
            .with_floor(Floor::new(2).with_space(Space::new("R201", 250.0, 25, SpaceType::Office)))
            .with_site(SiteCharacteristics::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_order() {
        let mut phases = CalculationPhase::ALL.to_vec();
        phases.reverse();
        phases.sort();
        assert_eq!(phases, CalculationPhase::ALL.to_vec());
    }

    #[test]
    fn test_reference_set_in_phase_order() {
        let calculators = reference_calculators(&CalculatorSettings::default());
        let phases: Vec<_> = calculators.iter().map(|c| c.phase()).collect();
        assert_eq!(phases, CalculationPhase::ALL.to_vec());
    }

    #[test]
    fn test_settings_partial_json() {
        let settings: CalculatorSettings = serde_json::from_str(r#"{"dead_load_kpa": 5.0}"#).unwrap();
        assert_eq!(settings.dead_load_kpa, 5.0);
        assert_eq!(settings.lighting_density_w_m2, 10.0);
    }
}
