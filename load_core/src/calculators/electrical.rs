//! Per-space lighting, equipment and HVAC draw; per-floor panel demand.
//!
//! Lighting and equipment feed both the space's cooling load (their power
//! ends up as heat) and the floor panel. `POWER-F{n}` is registered at zero
//! and accumulates its demand through propagation.
//!
//! HVAC draw depends on the thermal phase. When `COOLING-{space}` is
//! registered, `ELEC-HVAC-{space}` starts at zero and takes its location and
//! confidence from the cooling load; the `COOLING → HVAC_ELECTRICAL` link then
//! delivers the draw for the cooling magnitude *after* internal, lighting and
//! equipment gains have landed on it. Without a cooling load the draw is
//! estimated from floor area instead.

use super::{ids, CalculationPhase, CalculatorSettings, DisciplineCalculator};
use crate::building::{BuildingSpecification, Space};
use crate::loads::{LoadCategory, LoadRegistry, LoadResult};
use crate::units::{Kilowatts, WattsPerSquareMeter};

#[derive(Debug, Clone, Default)]
pub struct ElectricalCalculator {
    settings: CalculatorSettings,
}

impl ElectricalCalculator {
    pub fn new(settings: CalculatorSettings) -> Self {
        ElectricalCalculator { settings }
    }

    fn hvac_load(&self, space: &Space, z: f64, system: &str, power_id: &str, registry: &LoadRegistry) -> LoadResult {
        let id = ids::hvac(&space.id);
        match registry.get(&ids::cooling(&space.id)) {
            Some(cooling) => {
                let (x, y, z) = cooling.source_location;
                LoadResult::new(id, LoadCategory::HvacElectrical, 0.0)
                    .with_subcategory("cooling-plant")
                    .from_system(system)
                    .at(x, y, z)
                    .affecting([power_id])
                    .with_confidence(cooling.confidence)
            }
            None => {
                let cooling: Kilowatts = WattsPerSquareMeter(self.settings.fallback_cooling_w_m2) * space.area();
                let draw = cooling * self.settings.hvac_electrical_ratio;
                tracing::debug!(space = %space.id, draw = draw.value(), "no cooling load, estimating HVAC draw from area");
                LoadResult::new(id, LoadCategory::HvacElectrical, draw.value())
                    .with_subcategory("area-estimate")
                    .from_system(system)
                    .at(0.0, 0.0, z)
                    .affecting([power_id])
                    .with_confidence(0.6)
            }
        }
    }
}

impl DisciplineCalculator for ElectricalCalculator {
    fn name(&self) -> &str {
        "electrical"
    }

    fn phase(&self) -> CalculationPhase {
        CalculationPhase::Electrical
    }

    fn calculate(&self, building: &BuildingSpecification, registry: &LoadRegistry) -> Vec<LoadResult> {
        let mut loads = Vec::new();
        for floor in &building.floors {
            let tag = floor.tag();
            let panel = format!("PANEL-{tag}");
            let power_id = ids::power(&tag);
            let z = floor.elevation_m();

            loads.push(
                LoadResult::new(power_id.clone(), LoadCategory::Power, 0.0)
                    .with_subcategory("panel-demand")
                    .from_system(panel.clone())
                    .at(0.0, 0.0, z),
            );

            for space in &floor.spaces {
                let cooling_id = ids::cooling(&space.id);
                let lighting = WattsPerSquareMeter(self.settings.lighting_density_w_m2) * space.area();
                let equipment = space.space_type.equipment_density() * space.area();

                loads.push(
                    LoadResult::new(ids::lighting(&space.id), LoadCategory::Lighting, lighting.value())
                        .from_system(panel.clone())
                        .at(0.0, 0.0, z)
                        .affecting([cooling_id.clone(), power_id.clone()])
                        .with_confidence(0.9),
                );
                loads.push(
                    LoadResult::new(ids::equipment(&space.id), LoadCategory::Equipment, equipment.value())
                        .from_system(panel.clone())
                        .at(0.0, 0.0, z)
                        .affecting([cooling_id, power_id.clone()])
                        .with_confidence(0.75),
                );
                loads.push(self.hvac_load(space, z, &panel, &power_id, registry));
            }
        }
        loads
    }
}
