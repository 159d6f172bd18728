//! Building-level wind, snow and seismic loads.
//!
//! Requires site data; a building without `site` produces no environmental
//! loads and the run continues.

use super::{ids, CalculationPhase, CalculatorSettings, DisciplineCalculator};
use crate::building::BuildingSpecification;
use crate::loads::{LoadCategory, LoadRegistry, LoadResult};
use crate::units::{Kilopascals, Meters, MetersPerSecond, SquareMeters};

#[derive(Debug, Clone, Default)]
pub struct EnvironmentalCalculator {
    settings: CalculatorSettings,
}

impl EnvironmentalCalculator {
    pub fn new(settings: CalculatorSettings) -> Self {
        EnvironmentalCalculator { settings }
    }
}

impl DisciplineCalculator for EnvironmentalCalculator {
    fn name(&self) -> &str {
        "environmental"
    }

    fn phase(&self) -> CalculationPhase {
        CalculationPhase::Environmental
    }

    fn calculate(&self, building: &BuildingSpecification, _registry: &LoadRegistry) -> Vec<LoadResult> {
        let Some(site) = &building.site else {
            return Vec::new();
        };
        let height = Meters(building.height_m());

        // Square plan assumed: facade width from the largest floor plate
        let plate = building
            .floors
            .iter()
            .map(|f| f.area_m2())
            .fold(0.0_f64, f64::max);
        let facade: SquareMeters = Meters(plate.sqrt()) * height;

        let wind = MetersPerSecond(site.basic_wind_speed_ms).velocity_pressure()
            * self.settings.wind_pressure_coefficient
            * facade;
        let snow = Kilopascals(site.ground_snow_load_kpa * self.settings.snow_exposure_factor)
            * SquareMeters(building.roof_area_m2());
        let weight = Kilopascals(self.settings.seismic_weight_kpa) * SquareMeters(building.total_area_m2());
        let seismic = weight * site.seismic_coefficient;

        vec![
            LoadResult::new(ids::WIND, LoadCategory::Wind, wind.value())
                .with_subcategory("lateral")
                .from_system("LATERAL-SYSTEM")
                .at(0.0, 0.0, height.value() / 2.0)
                .with_confidence(0.8),
            LoadResult::new(ids::SNOW, LoadCategory::Snow, snow.value())
                .with_subcategory("roof")
                .from_system("ROOF")
                .at(0.0, 0.0, height.value())
                .with_confidence(0.85),
            LoadResult::new(ids::SEISMIC, LoadCategory::Seismic, seismic.value())
                .with_subcategory("base-shear")
                .from_system("LATERAL-SYSTEM")
                .with_confidence(0.7),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculators::test_support::sample_building;

    #[test]
    fn test_requires_site() {
        let mut building = sample_building();
        building.site = None;
        let loads = EnvironmentalCalculator::default().calculate(&building, &LoadRegistry::new());
        assert!(loads.is_empty());
    }

    #[test]
    fn test_building_level_loads() {
        let building = sample_building();
        let calculator = EnvironmentalCalculator::new(CalculatorSettings::default());
        let loads = calculator.calculate(&building, &LoadRegistry::new());

        let ids: Vec<&str> = loads.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["WIND-B", "SNOW-ROOF", "SEISMIC-B"]);

        // 0.7 × 1.0 kPa over the 250 m² top floor
        assert!((loads[1].magnitude - 175.0).abs() < 1e-9);
        // 0.05 × 6.0 kPa × 500 m²
        assert!((loads[2].magnitude - 150.0).abs() < 1e-9);
        assert!(loads.iter().all(|l| l.validate().is_ok()));
    }
}
