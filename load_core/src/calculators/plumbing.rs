//! Per-floor water supply and drainage; building booster pump.
//!
//! Drainage and pump start at zero and are filled by propagation from the
//! floor supply flows. The pump sits on the lowest floor and feeds that
//! floor's panel.

use super::{ids, CalculationPhase, CalculatorSettings, DisciplineCalculator};
use crate::building::BuildingSpecification;
use crate::loads::{LoadCategory, LoadRegistry, LoadResult};
use crate::units::LitersPerSecond;

#[derive(Debug, Clone, Default)]
pub struct PlumbingCalculator {
    settings: CalculatorSettings,
}

impl PlumbingCalculator {
    pub fn new(settings: CalculatorSettings) -> Self {
        PlumbingCalculator { settings }
    }
}

impl DisciplineCalculator for PlumbingCalculator {
    fn name(&self) -> &str {
        "plumbing"
    }

    fn phase(&self) -> CalculationPhase {
        CalculationPhase::Plumbing
    }

    fn calculate(&self, building: &BuildingSpecification, _registry: &LoadRegistry) -> Vec<LoadResult> {
        let Some(lowest) = building.lowest_floor() else {
            return Vec::new();
        };

        let mut loads = Vec::new();
        for floor in &building.floors {
            let tag = floor.tag();
            let riser = format!("RISER-{tag}");
            let drain_id = ids::drain(&tag);
            let z = floor.elevation_m();

            let flow: LitersPerSecond = floor
                .spaces
                .iter()
                .map(|space| {
                    LitersPerSecond(
                        f64::from(space.occupancy) * self.settings.water_per_occupant_lps
                            + space.area_m2 * space.space_type.fixture_flow_per_m2(),
                    )
                })
                .sum();

            loads.push(
                LoadResult::new(ids::water(&tag), LoadCategory::WaterSupply, flow.value())
                    .with_subcategory("domestic")
                    .from_system(riser.clone())
                    .at(0.0, 0.0, z)
                    .affecting([drain_id.clone(), ids::PUMP.to_string()])
                    .with_confidence(0.8),
            );
            loads.push(
                LoadResult::new(drain_id, LoadCategory::Drainage, 0.0)
                    .with_subcategory("sanitary")
                    .from_system(riser)
                    .at(0.0, 0.0, z)
                    .with_confidence(0.8),
            );
        }

        loads.push(
            LoadResult::new(ids::PUMP, LoadCategory::Pump, 0.0)
                .with_subcategory("booster")
                .from_system("BOOSTER-PUMP")
                .at(0.0, 0.0, lowest.elevation_m())
                .affecting([ids::power(&lowest.tag())])
                .with_confidence(0.8),
        );
        loads
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculators::test_support::sample_building;

    #[test]
    fn test_flows_and_links() {
        let building = sample_building();
        let loads = PlumbingCalculator::default().calculate(&building, &LoadRegistry::new());
        assert_eq!(loads.len(), 5);

        // 20 occupants × 0.004 + restroom 50 m² × 0.012
        let water_f1 = &loads[0];
        assert_eq!(water_f1.id, "WATER-F1");
        assert_eq!(water_f1.unit, "L/s");
        assert!((water_f1.magnitude - 0.68).abs() < 1e-9);
        assert_eq!(water_f1.affects, vec!["DRAIN-F1".to_string(), "PUMP-B".to_string()]);

        let pump = loads.last().unwrap();
        assert_eq!(pump.id, "PUMP-B");
        assert_eq!(pump.unit, "kW");
        assert_eq!(pump.affects, vec!["POWER-F1".to_string()]);
    }

    #[test]
    fn test_empty_building_yields_nothing() {
        let building = BuildingSpecification::new("EMPTY", "Empty");
        assert!(PlumbingCalculator::default()
            .calculate(&building, &LoadRegistry::new())
            .is_empty());
    }
}
