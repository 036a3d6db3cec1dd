// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Benchmark consumption estimator
//!
//! Fixed end-use intensities per square metre, a crude peak demand and three
//! retrofit recommendations. Pure: the same record always yields the same
//! estimate.

use crate::records::{BuildingDataRecord, ConsumptionRecord, RecommendationRecord};

/// kWh/m²/year
pub const LIGHTING_INTENSITY: f64 = 15.0;
/// kWh/m²/year
pub const HVAC_INTENSITY: f64 = 60.0;
/// kWh/m²/year
pub const EQUIPMENT_INTENSITY: f64 = 25.0;

/// Area assumed per space when no space reports an area
pub const AREA_PER_SPACE: f64 = 30.0;
/// Area assumed for a model without spaces
pub const DEFAULT_BUILDING_AREA: f64 = 100.0;
/// Full-load hours per year, used to derive peak demand
pub const OPERATING_HOURS: f64 = 2000.0;

pub const BENCHMARK_METHOD: &str = "Standard Building Energy Benchmarks";

pub const LED_SAVINGS_FRACTION: f64 = 0.30;
/// JOD/m²
pub const LED_COST_PER_M2: f64 = 15.0;
pub const LED_PAYBACK_YEARS: f64 = 3.0;

pub const THERMOSTAT_SAVINGS_FRACTION: f64 = 0.15;
/// JOD, independent of area
pub const THERMOSTAT_COST: f64 = 500.0;
pub const THERMOSTAT_PAYBACK_YEARS: f64 = 2.0;

pub const INSULATION_SAVINGS_FRACTION: f64 = 0.20;
/// JOD/m²
pub const INSULATION_COST_PER_M2: f64 = 25.0;
pub const INSULATION_PAYBACK_YEARS: f64 = 5.0;

/// Something that turns building data into a consumption estimate
///
/// Implementations never fail: when they cannot produce an answer of their
/// own they fall back to [`estimate`].
pub trait ConsumptionEstimator: Send + Sync {
    fn estimate(&self, record: &BuildingDataRecord) -> ConsumptionRecord;
}

/// The local benchmark estimator
#[derive(Clone, Copy, Debug, Default)]
pub struct BenchmarkEstimator;

impl ConsumptionEstimator for BenchmarkEstimator {
    fn estimate(&self, record: &BuildingDataRecord) -> ConsumptionRecord {
        estimate(record)
    }
}

/// Floor area the intensities are applied to
///
/// A record without any floor area is assumed to have 30 m² per space, or
/// 100 m² when it has no spaces at all.
pub fn effective_area(record: &BuildingDataRecord) -> f64 {
    let area = record.total_floor_area;
    if area > 0.0 && area.is_finite() {
        area
    } else if record.spaces.is_empty() {
        DEFAULT_BUILDING_AREA
    } else {
        AREA_PER_SPACE * record.spaces.len() as f64
    }
}

/// Estimate annual electricity consumption from fixed intensities
pub fn estimate(record: &BuildingDataRecord) -> ConsumptionRecord {
    let area = effective_area(record);

    let lighting = LIGHTING_INTENSITY * area;
    let hvac = HVAC_INTENSITY * area;
    let equipment = EQUIPMENT_INTENSITY * area;
    let total = lighting + hvac + equipment;

    ConsumptionRecord {
        lighting_consumption: lighting,
        hvac_consumption: hvac,
        equipment_consumption: equipment,
        total_annual_consumption: total,
        energy_intensity: if area > 0.0 { total / area } else { 0.0 },
        peak_demand: Some(total / OPERATING_HOURS),
        calculation_method: BENCHMARK_METHOD.to_string(),
        recommendations: recommendations(area, lighting, hvac),
    }
}

/// LED lighting, smart thermostats and insulation, in that order
pub fn recommendations(area: f64, lighting: f64, hvac: f64) -> Vec<RecommendationRecord> {
    vec![
        RecommendationRecord {
            title: "LED Lighting Upgrade".to_string(),
            description: "Replace existing lighting with LED fixtures".to_string(),
            potential_savings_kwh: lighting * LED_SAVINGS_FRACTION,
            implementation_cost_jod: area * LED_COST_PER_M2,
            payback_years: LED_PAYBACK_YEARS,
        },
        RecommendationRecord {
            title: "Smart Thermostat Installation".to_string(),
            description: "Install programmable thermostats for HVAC optimization".to_string(),
            potential_savings_kwh: hvac * THERMOSTAT_SAVINGS_FRACTION,
            implementation_cost_jod: THERMOSTAT_COST,
            payback_years: THERMOSTAT_PAYBACK_YEARS,
        },
        RecommendationRecord {
            title: "Building Insulation Improvement".to_string(),
            description: "Enhance wall and roof insulation".to_string(),
            potential_savings_kwh: hvac * INSULATION_SAVINGS_FRACTION,
            implementation_cost_jod: area * INSULATION_COST_PER_M2,
            payback_years: INSULATION_PAYBACK_YEARS,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::SpaceRecord;
    use approx::assert_relative_eq;

    fn space(area: f64) -> SpaceRecord {
        SpaceRecord {
            name: "Room".to_string(),
            area,
            volume: 0.0,
            space_type: "Unknown".to_string(),
            description: String::new(),
            elevation: 0.0,
            properties: Default::default(),
        }
    }

    #[test]
    fn test_empty_record_uses_default_area() {
        let result = estimate(&BuildingDataRecord::default());

        assert_relative_eq!(result.lighting_consumption, 1500.0);
        assert_relative_eq!(result.hvac_consumption, 6000.0);
        assert_relative_eq!(result.equipment_consumption, 2500.0);
        assert_relative_eq!(result.total_annual_consumption, 10000.0);
        assert_relative_eq!(result.energy_intensity, 100.0);
        assert_eq!(result.peak_demand, Some(5.0));
        assert_eq!(result.calculation_method, BENCHMARK_METHOD);
    }

    #[test]
    fn test_spaces_without_area_use_per_space_area() {
        for n in 1..=4 {
            let record = BuildingDataRecord {
                spaces: (0..n).map(|_| space(0.0)).collect(),
                ..Default::default()
            };
            assert_relative_eq!(effective_area(&record), 30.0 * n as f64);
            assert_relative_eq!(
                estimate(&record).total_annual_consumption,
                3000.0 * n as f64
            );
        }
    }

    #[test]
    fn test_measured_area_is_used() {
        let record = BuildingDataRecord {
            spaces: vec![space(40.0), space(60.0)],
            total_floor_area: 100.0,
            ..Default::default()
        };
        let result = estimate(&record);

        assert_relative_eq!(result.total_annual_consumption, 10000.0);
        assert_relative_eq!(result.energy_intensity, 100.0);
    }

    #[test]
    fn test_estimate_is_idempotent() {
        let record = BuildingDataRecord {
            spaces: vec![space(12.5)],
            total_floor_area: 12.5,
            ..Default::default()
        };
        assert_eq!(estimate(&record), estimate(&record));
        assert_eq!(BenchmarkEstimator.estimate(&record), estimate(&record));
    }

    #[test]
    fn test_recommendations() {
        let result = estimate(&BuildingDataRecord {
            total_floor_area: 200.0,
            ..Default::default()
        });
        let recs = &result.recommendations;

        assert_eq!(recs.len(), 3);
        assert_eq!(recs[0].title, "LED Lighting Upgrade");
        assert_eq!(recs[1].title, "Smart Thermostat Installation");
        assert_eq!(recs[2].title, "Building Insulation Improvement");

        assert_relative_eq!(recs[0].potential_savings_kwh, 3000.0 * 0.30);
        assert_relative_eq!(recs[1].potential_savings_kwh, 12000.0 * 0.15);
        assert_relative_eq!(recs[2].potential_savings_kwh, 12000.0 * 0.20);
        assert!(recs.iter().all(|r| r.payback_years > 0.0));
    }

    #[test]
    fn test_recommendation_costs_scale_with_area() {
        let small = recommendations(100.0, 1500.0, 6000.0);
        let large = recommendations(300.0, 4500.0, 18000.0);

        assert_relative_eq!(small[0].implementation_cost_jod, 1500.0);
        assert_relative_eq!(large[0].implementation_cost_jod, 4500.0);
        assert_relative_eq!(small[2].implementation_cost_jod, 2500.0);
        assert_relative_eq!(large[2].implementation_cost_jod, 7500.0);
        assert_eq!(small[1].implementation_cost_jod, 500.0);
        assert_eq!(large[1].implementation_cost_jod, 500.0);
    }
}
