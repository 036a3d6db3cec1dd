// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Model reader - typed entity lookup by building category

use crate::error::{EnergyError, Result};
use ifc_energy_model::{
    DecodedEntity, EntityResolver, IfcModel, IfcType, ModelMetadata, ParseError, PropertyReader,
};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

/// Groups of IFC entity types the extractor reads together
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Building,
    Space,
    Wall,
    Window,
    Door,
    Slab,
    Roof,
    Hvac,
    Lighting,
    Electrical,
    Equipment,
}

const BUILDING_TYPES: &[IfcType] = &[IfcType::IfcBuilding];
const SPACE_TYPES: &[IfcType] = &[IfcType::IfcSpace];
const WALL_TYPES: &[IfcType] = &[
    IfcType::IfcWall,
    IfcType::IfcWallStandardCase,
    IfcType::IfcWallElementedCase,
];
const WINDOW_TYPES: &[IfcType] = &[IfcType::IfcWindow, IfcType::IfcWindowStandardCase];
const DOOR_TYPES: &[IfcType] = &[IfcType::IfcDoor, IfcType::IfcDoorStandardCase];
const SLAB_TYPES: &[IfcType] = &[
    IfcType::IfcSlab,
    IfcType::IfcSlabStandardCase,
    IfcType::IfcSlabElementedCase,
];
const ROOF_TYPES: &[IfcType] = &[IfcType::IfcRoof];
const HVAC_TYPES: &[IfcType] = &[
    IfcType::IfcAirTerminal,
    IfcType::IfcBoiler,
    IfcType::IfcChiller,
    IfcType::IfcFan,
    IfcType::IfcHeatExchanger,
];
const LIGHTING_TYPES: &[IfcType] = &[IfcType::IfcLightFixture, IfcType::IfcLamp];
const ELECTRICAL_TYPES: &[IfcType] = &[
    IfcType::IfcElectricDistributionBoard,
    IfcType::IfcElectricFlowStorageDevice,
    IfcType::IfcElectricGenerator,
    IfcType::IfcElectricMotor,
];

/// Flow terminals first, then every other distribution element
const EQUIPMENT_TYPES: &[IfcType] = &[
    IfcType::IfcFlowTerminal,
    IfcType::IfcAirTerminal,
    IfcType::IfcAudioVisualAppliance,
    IfcType::IfcCommunicationsAppliance,
    IfcType::IfcElectricAppliance,
    IfcType::IfcFireSuppressionTerminal,
    IfcType::IfcLamp,
    IfcType::IfcLightFixture,
    IfcType::IfcMedicalDevice,
    IfcType::IfcOutlet,
    IfcType::IfcSanitaryTerminal,
    IfcType::IfcSpaceHeater,
    IfcType::IfcStackTerminal,
    IfcType::IfcWasteTerminal,

    IfcType::IfcDistributionElement,
    IfcType::IfcDistributionFlowElement,
    IfcType::IfcDistributionChamberElement,

    IfcType::IfcEnergyConversionDevice,
    IfcType::IfcAirToAirHeatRecovery,
    IfcType::IfcBoiler,
    IfcType::IfcBurner,
    IfcType::IfcChiller,
    IfcType::IfcCoil,
    IfcType::IfcCondenser,
    IfcType::IfcCooledBeam,
    IfcType::IfcCoolingTower,
    IfcType::IfcElectricGenerator,
    IfcType::IfcElectricMotor,
    IfcType::IfcEngine,
    IfcType::IfcEvaporativeCooler,
    IfcType::IfcEvaporator,
    IfcType::IfcHeatExchanger,
    IfcType::IfcHumidifier,
    IfcType::IfcMotorConnection,
    IfcType::IfcSolarDevice,
    IfcType::IfcTransformer,
    IfcType::IfcTubeBundle,
    IfcType::IfcUnitaryEquipment,

    IfcType::IfcFlowController,
    IfcType::IfcAirTerminalBox,
    IfcType::IfcDamper,
    IfcType::IfcElectricDistributionBoard,
    IfcType::IfcElectricTimeControl,
    IfcType::IfcFlowMeter,
    IfcType::IfcProtectiveDevice,
    IfcType::IfcSwitchingDevice,
    IfcType::IfcValve,

    IfcType::IfcFlowFitting,
    IfcType::IfcCableCarrierFitting,
    IfcType::IfcCableFitting,
    IfcType::IfcDuctFitting,
    IfcType::IfcJunctionBox,
    IfcType::IfcPipeFitting,

    IfcType::IfcFlowMovingDevice,
    IfcType::IfcCompressor,
    IfcType::IfcFan,
    IfcType::IfcPump,

    IfcType::IfcFlowSegment,
    IfcType::IfcCableCarrierSegment,
    IfcType::IfcCableSegment,
    IfcType::IfcDuctSegment,
    IfcType::IfcPipeSegment,

    IfcType::IfcFlowStorageDevice,
    IfcType::IfcElectricFlowStorageDevice,
    IfcType::IfcTank,

    IfcType::IfcFlowTreatmentDevice,
    IfcType::IfcDuctSilencer,
    IfcType::IfcFilter,
    IfcType::IfcInterceptor,

    IfcType::IfcDistributionControlElement,
    IfcType::IfcActuator,
    IfcType::IfcAlarm,
    IfcType::IfcController,
    IfcType::IfcFlowInstrument,
    IfcType::IfcProtectiveDeviceTrippingUnit,
    IfcType::IfcSensor,
    IfcType::IfcUnitaryControlElement,
];

impl Category {
    pub const ALL: [Category; 11] = [
        Category::Building,
        Category::Space,
        Category::Wall,
        Category::Window,
        Category::Door,
        Category::Slab,
        Category::Roof,
        Category::Hvac,
        Category::Lighting,
        Category::Electrical,
        Category::Equipment,
    ];

    /// Member entity types, in lookup order
    pub fn ifc_types(&self) -> &'static [IfcType] {
        match self {
            Category::Building => BUILDING_TYPES,
            Category::Space => SPACE_TYPES,
            Category::Wall => WALL_TYPES,
            Category::Window => WINDOW_TYPES,
            Category::Door => DOOR_TYPES,
            Category::Slab => SLAB_TYPES,
            Category::Roof => ROOF_TYPES,
            Category::Hvac => HVAC_TYPES,
            Category::Lighting => LIGHTING_TYPES,
            Category::Electrical => ELECTRICAL_TYPES,
            Category::Equipment => EQUIPMENT_TYPES,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Category::Building => "Building",
            Category::Space => "Space",
            Category::Wall => "Wall",
            Category::Window => "Window",
            Category::Door => "Door",
            Category::Slab => "Slab",
            Category::Roof => "Roof",
            Category::Hvac => "Hvac",
            Category::Lighting => "Lighting",
            Category::Electrical => "Electrical",
            Category::Equipment => "Equipment",
        }
    }
}

impl FromStr for Category {
    type Err = EnergyError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| EnergyError::invalid_input(format!("unknown category '{}'", s)))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Read-only view of one parsed IFC file
pub struct ModelReader {
    model: Arc<dyn IfcModel>,
}

impl ModelReader {
    /// Open and parse an IFC file
    ///
    /// Fails with `UnreadableModel` if the file cannot be read or is not an
    /// IFC STEP file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref()).map_err(ParseError::from)?;
        Self::from_bytes(&bytes)
    }

    /// Parse IFC content held in memory
    ///
    /// Invalid UTF-8 is replaced rather than rejected; STEP text is ASCII
    /// with escapes, so stray bytes only ever land inside string literals.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let content = String::from_utf8_lossy(bytes);
        let model = ifc_energy_parser::parse(&content)?;
        Ok(Self { model })
    }

    /// Wrap an already parsed model
    pub fn from_model(model: Arc<dyn IfcModel>) -> Self {
        Self { model }
    }

    /// All decodable entities of a category in file order, member types
    /// concatenated in `Category::ifc_types` order
    pub fn by_category(&self, category: Category) -> Vec<Arc<DecodedEntity>> {
        let resolver = self.model.resolver();
        category
            .ifc_types()
            .iter()
            .flat_map(|ifc_type| resolver.entities_by_type(ifc_type))
            .collect()
    }

    /// Number of entities of a category, decodable or not
    pub fn count(&self, category: Category) -> usize {
        let resolver = self.model.resolver();
        category
            .ifc_types()
            .iter()
            .map(|ifc_type| resolver.count_by_type(ifc_type))
            .sum()
    }

    pub fn resolver(&self) -> &dyn EntityResolver {
        self.model.resolver()
    }

    pub fn properties(&self) -> &dyn PropertyReader {
        self.model.properties()
    }

    pub fn metadata(&self) -> &ModelMetadata {
        self.model.metadata()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TEST_IFC: &str = r#"ISO-10303-21;
HEADER;
FILE_NAME('plant.ifc','2024-01-01T00:00:00',(''),(''),'','Modeler','');
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#1=IFCWALLSTANDARDCASE('w1',$,'Wall B',$,$,$,$,$);
#2=IFCWALL('w2',$,'Wall A',$,$,$,$,$);
#3=IFCWINDOW('win',$,'Window',$,$,$,$,$,$,$);
#4=IFCAIRTERMINAL('at',$,'Diffuser',$,$,$,$,$,$);
#5=IFCFAN('fan',$,'Supply Fan',$,$,$,$,$,$);
#6=IFCWALL('w3',$,'Broken',(,$);
ENDSEC;
END-ISO-10303-21;
"#;

    #[test]
    fn test_by_category_concatenates_member_types() {
        let reader = ModelReader::from_bytes(TEST_IFC.as_bytes()).unwrap();

        let walls: Vec<_> = reader
            .by_category(Category::Wall)
            .iter()
            .map(|e| e.get_string(2).unwrap_or_default().to_string())
            .collect();
        assert_eq!(walls, vec!["Wall A", "Wall B"]);

        assert_eq!(reader.by_category(Category::Hvac).len(), 2);
        assert_eq!(reader.by_category(Category::Window).len(), 1);
        assert!(reader.by_category(Category::Space).is_empty());
    }

    #[test]
    fn test_equipment_covers_distribution_subtypes() {
        let reader = ModelReader::from_bytes(TEST_IFC.as_bytes()).unwrap();
        let equipment: Vec<_> = reader
            .by_category(Category::Equipment)
            .iter()
            .map(|e| e.ifc_type.name().to_string())
            .collect();
        assert_eq!(equipment, vec!["IfcAirTerminal", "IfcFan"]);

        let distinct: std::collections::HashSet<_> = EQUIPMENT_TYPES.iter().collect();
        assert_eq!(distinct.len(), EQUIPMENT_TYPES.len());
        for category in [Category::Hvac, Category::Lighting, Category::Electrical] {
            for ifc_type in category.ifc_types() {
                assert!(EQUIPMENT_TYPES.contains(ifc_type), "{}", ifc_type);
            }
        }
    }

    #[test]
    fn test_count_includes_malformed_entities() {
        let reader = ModelReader::from_bytes(TEST_IFC.as_bytes()).unwrap();
        assert_eq!(reader.count(Category::Wall), 3);
        assert_eq!(reader.by_category(Category::Wall).len(), 2);
    }

    #[test]
    fn test_open_reads_file() {
        let mut file = tempfile::Builder::new().suffix(".ifc").tempfile().unwrap();
        file.write_all(TEST_IFC.as_bytes()).unwrap();

        let reader = ModelReader::open(file.path()).unwrap();
        assert_eq!(reader.metadata().schema_version, "IFC4");
        assert_eq!(reader.metadata().originating_system.as_deref(), Some("Modeler"));
    }

    #[test]
    fn test_open_missing_file_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let result = ModelReader::open(dir.path().join("missing.ifc"));
        assert!(matches!(result, Err(EnergyError::UnreadableModel(_))));
    }

    #[test]
    fn test_non_ifc_content_is_unreadable() {
        let result = ModelReader::from_bytes(b"PK\x03\x04 zip archive");
        assert!(matches!(result, Err(EnergyError::UnreadableModel(_))));
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!("Space".parse::<Category>().unwrap(), Category::Space);
        assert_eq!("hvac".parse::<Category>().unwrap(), Category::Hvac);
        assert!(matches!(
            "Furniture".parse::<Category>(),
            Err(EnergyError::InvalidInput(_))
        ));
    }
}
