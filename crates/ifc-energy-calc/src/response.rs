// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Response shapes returned for an upload

use crate::estimator::{EQUIPMENT_INTENSITY, HVAC_INTENSITY, LIGHTING_INTENSITY};
use crate::records::{BuildingDataRecord, ConsumptionRecord, RecommendationRecord};
use serde::{Deserialize, Serialize};

/// Flat electricity tariff, JOD/kWh
pub const TARIFF_JOD_PER_KWH: f64 = 0.12;

/// Full extraction and estimation result
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalculationResponse {
    pub building_data: BuildingDataRecord,
    pub electricity_consumption: ConsumptionRecord,
}

impl CalculationResponse {
    pub fn new(building_data: BuildingDataRecord, electricity_consumption: ConsumptionRecord) -> Self {
        Self {
            building_data,
            electricity_consumption,
        }
    }

    /// Condensed view with cost and stated assumptions
    pub fn summary(&self) -> AnalysisResponse {
        AnalysisResponse::from_parts(&self.building_data, &self.electricity_consumption)
    }
}

/// Annual usage, cost and the assumptions behind them
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub annual_usage_kwh: f64,
    /// JOD
    pub estimated_cost: f64,
    pub recommendations: Vec<RecommendationRecord>,
    pub assumptions: Vec<String>,
}

impl AnalysisResponse {
    pub fn from_parts(building_data: &BuildingDataRecord, consumption: &ConsumptionRecord) -> Self {
        let annual = consumption.total_annual_consumption;
        Self {
            annual_usage_kwh: annual,
            estimated_cost: annual * TARIFF_JOD_PER_KWH,
            recommendations: consumption.recommendations.clone(),
            assumptions: vec![
                format!("Building area: {:.1} m²", building_data.total_floor_area),
                format!("Lighting: {} kWh/m²/year", LIGHTING_INTENSITY),
                format!("HVAC: {} kWh/m²/year", HVAC_INTENSITY),
                format!("Equipment: {} kWh/m²/year", EQUIPMENT_INTENSITY),
                format!(
                    "Energy intensity: {:.1} kWh/m²/year",
                    consumption.energy_intensity
                ),
            ],
        }
    }
}
