//! Per-space heat gains and heating/cooling loads.
//!
//! Cooling is registered with its envelope part only; internal gains reach it
//! through `INTERNAL → COOLING` during propagation, and lighting and
//! equipment gains through the links the electrical calculator adds.

use super::{ids, CalculationPhase, CalculatorSettings, DisciplineCalculator};
use crate::building::{BuildingSpecification, SiteCharacteristics};
use crate::loads::{LoadCategory, LoadRegistry, LoadResult};
use crate::units::{Kilowatts, SquareMeters, WattsPerSquareMeter};

/// Design day the envelope density is quoted for
const REFERENCE_COOLING_TEMP_C: f64 = 32.0;

#[derive(Debug, Clone, Default)]
pub struct ThermalCalculator {
    settings: CalculatorSettings,
}

impl ThermalCalculator {
    pub fn new(settings: CalculatorSettings) -> Self {
        ThermalCalculator { settings }
    }

    /// Scales envelope gain by 3% per kelvin of design-day difference
    fn climate_factor(site: Option<&SiteCharacteristics>) -> f64 {
        site.map(|s| 1.0 + 0.03 * (s.cooling_design_temp_c - REFERENCE_COOLING_TEMP_C))
            .unwrap_or(1.0)
            .max(0.5)
    }

    fn heating_density(&self, site: Option<&SiteCharacteristics>) -> WattsPerSquareMeter {
        match site {
            Some(s) => {
                let delta_t = (self.settings.indoor_setpoint_c - s.heating_design_temp_c).max(0.0);
                WattsPerSquareMeter(self.settings.heat_loss_w_m2k * delta_t)
            }
            None => WattsPerSquareMeter(self.settings.default_heating_w_m2),
        }
    }
}

impl DisciplineCalculator for ThermalCalculator {
    fn name(&self) -> &str {
        "thermal"
    }

    fn phase(&self) -> CalculationPhase {
        CalculationPhase::Thermal
    }

    fn calculate(&self, building: &BuildingSpecification, _registry: &LoadRegistry) -> Vec<LoadResult> {
        let site = building.site.as_ref();
        let climate = Self::climate_factor(site);
        let heating_density = self.heating_density(site);
        // Site-derived figures are firmer than the fallback density
        let heating_confidence = if site.is_some() { 0.85 } else { 0.6 };

        let mut loads = Vec::new();
        for floor in &building.floors {
            let system = format!("AHU-{}", floor.tag());
            let z = floor.elevation_m();

            for space in &floor.spaces {
                let area: SquareMeters = space.area();
                let internal = Kilowatts(f64::from(space.occupancy) * self.settings.occupant_gain_w / 1000.0);

                let mut envelope = WattsPerSquareMeter(self.settings.envelope_cooling_w_m2 * climate);
                if space.has_windows {
                    envelope = envelope + WattsPerSquareMeter(self.settings.glazing_cooling_w_m2);
                }
                let cooling = envelope * area;
                let heating = heating_density * area;

                let cooling_id = ids::cooling(&space.id);
                let hvac_id = ids::hvac(&space.id);

                loads.push(
                    LoadResult::new(ids::internal(&space.id), LoadCategory::Internal, internal.value())
                        .with_subcategory("occupants")
                        .from_system(system.clone())
                        .at(0.0, 0.0, z)
                        .affecting([cooling_id.clone()])
                        .with_confidence(0.85),
                );
                loads.push(
                    LoadResult::new(cooling_id, LoadCategory::Cooling, cooling.value())
                        .with_subcategory("envelope")
                        .from_system(system.clone())
                        .at(0.0, 0.0, z)
                        .affecting([hvac_id.clone()])
                        .with_confidence(0.8),
                );
                loads.push(
                    LoadResult::new(ids::heating(&space.id), LoadCategory::Heating, heating.value())
                        .with_subcategory("transmission")
                        .from_system(system.clone())
                        .at(0.0, 0.0, z)
                        .affecting([hvac_id])
                        .with_confidence(heating_confidence),
                );
            }
        }
        loads
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculators::test_support::sample_building;

    #[test]
    fn test_three_loads_per_space() {
        let building = sample_building();
        let loads = ThermalCalculator::default().calculate(&building, &LoadRegistry::new());
        assert_eq!(loads.len(), 9);

        let internal = &loads[0];
        assert_eq!(internal.id, "INTERNAL-R101");
        assert_eq!(internal.affects, vec!["COOLING-R101".to_string()]);
        assert!((internal.magnitude - 2.6).abs() < 1e-9);

        // glazed office: (25 + 35) W/m² × 200 m²
        let cooling = &loads[1];
        assert!((cooling.magnitude - 12.0).abs() < 1e-9);
        assert_eq!(cooling.affects, vec!["ELEC-HVAC-R101".to_string()]);
    }

    #[test]
    fn test_heating_uses_design_temperature() {
        let building = sample_building();
        let loads = ThermalCalculator::new(CalculatorSettings::default()).calculate(&building, &LoadRegistry::new());
        // 1.2 W/m²K × (21 − (−10)) K × 200 m²
        let heating = loads.iter().find(|l| l.id == "HEATING-R101").unwrap();
        assert!((heating.magnitude - 7.44).abs() < 1e-9);

        let mut no_site = building.clone();
        no_site.site = None;
        let loads = ThermalCalculator::default().calculate(&no_site, &LoadRegistry::new());
        let heating = loads.iter().find(|l| l.id == "HEATING-R101").unwrap();
        assert!((heating.magnitude - 8.0).abs() < 1e-9);
        assert_eq!(heating.confidence, 0.6);
    }

    #[test]
    fn test_unoccupied_space_has_zero_internal_gain() {
        let building = sample_building();
        let loads = ThermalCalculator::default().calculate(&building, &LoadRegistry::new());
        let internal = loads.iter().find(|l| l.id == "INTERNAL-R102").unwrap();
        assert_eq!(internal.magnitude, 0.0);
    }
}
