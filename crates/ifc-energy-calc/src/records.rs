// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Records produced by extraction and estimation
//!
//! Every record serializes to the JSON shape the upload response uses, so
//! field names follow that shape rather than Rust naming alone.

use ifc_energy_model::{ModelMetadata, PropertyValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Property name → scalar value
pub type PropertyMap = BTreeMap<String, PropertyValue>;

/// Property set name → property name → scalar value
pub type PropertySetMap = BTreeMap<String, PropertyMap>;

/// Metadata of the first building in the file
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BuildingInfo {
    pub name: String,
    pub description: String,
    /// ObjectType of the building
    pub building_type: String,
    /// ElevationOfRefHeight
    pub elevation: f64,
}

/// One space with its measured or estimated floor area
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpaceRecord {
    pub name: String,
    /// Floor area in m², never negative
    pub area: f64,
    /// Volume in m³
    pub volume: f64,
    pub space_type: String,
    pub description: String,
    pub elevation: f64,
    pub properties: PropertySetMap,
}

/// Envelope element counts and aggregate areas
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildingElementsSummary {
    pub walls_count: usize,
    pub windows_count: usize,
    pub doors_count: usize,
    pub slabs_count: usize,
    pub roofs_count: usize,
    pub total_wall_area: f64,
    pub total_window_area: f64,
    pub window_to_wall_ratio: f64,
}

impl BuildingElementsSummary {
    /// Set the aggregate areas and derive the window-to-wall ratio
    pub fn with_areas(mut self, wall_area: f64, window_area: f64) -> Self {
        self.total_wall_area = wall_area;
        self.total_window_area = window_area;
        self.window_to_wall_ratio = if wall_area > 0.0 {
            window_area / wall_area
        } else {
            0.0
        };
        self
    }
}

/// Generic distribution element
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentRecord {
    pub name: String,
    /// Concrete IFC type name, e.g. `IfcFlowTerminal`
    #[serde(rename = "type")]
    pub kind: String,
}

/// HVAC, lighting or electrical device with its flattened properties
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SystemRecord {
    pub name: String,
    /// Concrete IFC type name, e.g. `IfcAirTerminal`
    #[serde(rename = "type")]
    pub kind: String,
    pub properties: PropertyMap,
}

pub type HvacRecord = SystemRecord;
pub type LightingRecord = SystemRecord;
pub type ElectricalRecord = SystemRecord;

/// Where the building data came from
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub schema_version: String,
    pub originating_system: Option<String>,
    pub file_name: Option<String>,
}

impl From<&ModelMetadata> for SourceInfo {
    fn from(metadata: &ModelMetadata) -> Self {
        Self {
            schema_version: metadata.schema_version.clone(),
            originating_system: metadata.originating_system.clone(),
            file_name: metadata.file_name.clone(),
        }
    }
}

/// Everything extracted from one IFC file
///
/// `total_floor_area` is the sum of the space areas, fallback estimates
/// included.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildingDataRecord {
    pub spaces: Vec<SpaceRecord>,
    pub building_elements: BuildingElementsSummary,
    pub equipment: Vec<EquipmentRecord>,
    pub total_floor_area: f64,
    pub building_info: Option<BuildingInfo>,
    pub hvac_systems: Vec<HvacRecord>,
    pub lighting_systems: Vec<LightingRecord>,
    pub electrical_systems: Vec<ElectricalRecord>,
    pub source: SourceInfo,
}

/// A retrofit suggestion
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRecord {
    pub title: String,
    pub description: String,
    pub potential_savings_kwh: f64,
    pub implementation_cost_jod: f64,
    pub payback_years: f64,
}

/// Annual electricity estimate
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionRecord {
    /// kWh/year
    pub lighting_consumption: f64,
    /// kWh/year
    pub hvac_consumption: f64,
    /// kWh/year
    pub equipment_consumption: f64,
    /// kWh/year
    pub total_annual_consumption: f64,
    /// kWh/m²/year
    pub energy_intensity: f64,
    /// kW
    pub peak_demand: Option<f64>,
    pub calculation_method: String,
    pub recommendations: Vec<RecommendationRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_to_wall_ratio() {
        let summary = BuildingElementsSummary::default().with_areas(200.0, 50.0);
        assert_eq!(summary.window_to_wall_ratio, 0.25);

        let summary = BuildingElementsSummary::default().with_areas(0.0, 50.0);
        assert_eq!(summary.window_to_wall_ratio, 0.0);
        assert_eq!(summary.total_window_area, 50.0);
    }

    #[test]
    fn test_system_record_serializes_type_key() {
        let mut properties = PropertyMap::new();
        properties.insert("Power".to_string(), PropertyValue::Real(1.5));
        let record = SystemRecord {
            name: "AHU-1".to_string(),
            kind: "IfcFan".to_string(),
            properties,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "IfcFan");
        assert_eq!(json["properties"]["Power"], 1.5);
    }

    #[test]
    fn test_building_data_json_keys() {
        let json = serde_json::to_value(BuildingDataRecord::default()).unwrap();
        for key in [
            "spaces",
            "building_elements",
            "equipment",
            "total_floor_area",
            "building_info",
            "hvac_systems",
            "lighting_systems",
            "electrical_systems",
        ] {
            assert!(json.get(key).is_some(), "missing key {key}");
        }
        assert!(json["building_info"].is_null());
    }
}
