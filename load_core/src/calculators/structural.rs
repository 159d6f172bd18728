//! Per-floor gravity loads.
//!
//! Dead load is a uniform superimposed pressure over the floor plate; live
//! load sums each space's occupancy-based pressure over its area.

use super::{ids, CalculationPhase, CalculatorSettings, DisciplineCalculator};
use crate::building::BuildingSpecification;
use crate::loads::{LoadCategory, LoadRegistry, LoadResult};
use crate::units::{Kilonewtons, Kilopascals, SquareMeters};

#[derive(Debug, Clone, Default)]
pub struct StructuralCalculator {
    settings: CalculatorSettings,
}

impl StructuralCalculator {
    pub fn new(settings: CalculatorSettings) -> Self {
        StructuralCalculator { settings }
    }
}

impl DisciplineCalculator for StructuralCalculator {
    fn name(&self) -> &str {
        "structural"
    }

    fn phase(&self) -> CalculationPhase {
        CalculationPhase::Structural
    }

    fn calculate(&self, building: &BuildingSpecification, _registry: &LoadRegistry) -> Vec<LoadResult> {
        let mut loads = Vec::with_capacity(building.floors.len() * 2);
        for floor in &building.floors {
            let tag = floor.tag();
            let system = format!("STRUCTURE-{tag}");
            let z = floor.elevation_m();

            let dead = Kilopascals(self.settings.dead_load_kpa) * SquareMeters(floor.area_m2());
            let live: Kilonewtons = floor
                .spaces
                .iter()
                .map(|space| space.space_type.live_load() * space.area())
                .sum();

            loads.push(
                LoadResult::new(ids::dead(&tag), LoadCategory::Dead, dead.value())
                    .with_subcategory("superimposed")
                    .from_system(system.clone())
                    .at(0.0, 0.0, z)
                    .with_confidence(0.9),
            );
            loads.push(
                LoadResult::new(ids::live(&tag), LoadCategory::Live, live.value())
                    .with_subcategory("occupancy")
                    .from_system(system)
                    .at(0.0, 0.0, z)
                    .with_confidence(0.85),
            );
        }
        loads
    }
}
