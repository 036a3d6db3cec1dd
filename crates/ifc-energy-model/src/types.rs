// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core types for IFC data representation
//!
//! This module defines the fundamental types used throughout the IFC parsing system.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Type-safe entity identifier
///
/// Wraps the raw IFC entity ID (e.g., #123 becomes EntityId(123))
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize, Default)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        EntityId(id)
    }
}

impl From<EntityId> for u32 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

/// Declares the known entity types once, generating the enum together with
/// its (case-insensitive) parser and its schema spelling.
macro_rules! ifc_types {
    ($( $variant:ident => $upper:literal ),* $(,)?) => {
        /// IFC entity type enumeration
        ///
        /// Covers the entity types the energy calculator reads. Every other
        /// type is captured as `Unknown` with its upper-cased name, so type
        /// lookups by name still work for it.
        #[derive(Clone, PartialEq, Eq, Hash, Debug)]
        pub enum IfcType {
            $( $variant, )*
            /// Unknown type - stores the upper-cased type name
            Unknown(String),
        }

        impl IfcType {
            /// Parse a type name string into an IfcType
            pub fn parse(s: &str) -> Self {
                let upper = s.trim().to_ascii_uppercase();
                match upper.as_str() {
                    $( $upper => IfcType::$variant, )*
                    _ => IfcType::Unknown(upper),
                }
            }

            /// Get the type name as spelled in the schema (e.g. `IfcAirTerminal`)
            pub fn name(&self) -> &str {
                match self {
                    $( IfcType::$variant => stringify!($variant), )*
                    IfcType::Unknown(s) => s,
                }
            }
        }
    };
}

ifc_types! {
    // Spatial structure
    IfcProject => "IFCPROJECT",
    IfcSite => "IFCSITE",
    IfcBuilding => "IFCBUILDING",
    IfcBuildingStorey => "IFCBUILDINGSTOREY",
    IfcSpace => "IFCSPACE",

    // Building elements
    IfcWall => "IFCWALL",
    IfcWallStandardCase => "IFCWALLSTANDARDCASE",
    IfcWallElementedCase => "IFCWALLELEMENTEDCASE",
    IfcCurtainWall => "IFCCURTAINWALL",
    IfcWindow => "IFCWINDOW",
    IfcWindowStandardCase => "IFCWINDOWSTANDARDCASE",
    IfcDoor => "IFCDOOR",
    IfcDoorStandardCase => "IFCDOORSTANDARDCASE",
    IfcSlab => "IFCSLAB",
    IfcSlabStandardCase => "IFCSLABSTANDARDCASE",
    IfcSlabElementedCase => "IFCSLABELEMENTEDCASE",
    IfcRoof => "IFCROOF",
    IfcBeam => "IFCBEAM",
    IfcColumn => "IFCCOLUMN",
    IfcCovering => "IFCCOVERING",
    IfcStair => "IFCSTAIR",
    IfcRailing => "IFCRAILING",
    IfcBuildingElementProxy => "IFCBUILDINGELEMENTPROXY",

    // Generic distribution elements (IFC2x3 style)
    IfcDistributionElement => "IFCDISTRIBUTIONELEMENT",
    IfcDistributionFlowElement => "IFCDISTRIBUTIONFLOWELEMENT",
    IfcDistributionControlElement => "IFCDISTRIBUTIONCONTROLELEMENT",
    IfcFlowTerminal => "IFCFLOWTERMINAL",
    IfcFlowSegment => "IFCFLOWSEGMENT",
    IfcFlowFitting => "IFCFLOWFITTING",
    IfcFlowController => "IFCFLOWCONTROLLER",
    IfcFlowMovingDevice => "IFCFLOWMOVINGDEVICE",
    IfcFlowStorageDevice => "IFCFLOWSTORAGEDEVICE",
    IfcFlowTreatmentDevice => "IFCFLOWTREATMENTDEVICE",
    IfcEnergyConversionDevice => "IFCENERGYCONVERSIONDEVICE",

    // HVAC
    IfcAirTerminal => "IFCAIRTERMINAL",
    IfcBoiler => "IFCBOILER",
    IfcChiller => "IFCCHILLER",
    IfcFan => "IFCFAN",
    IfcHeatExchanger => "IFCHEATEXCHANGER",

    // Lighting
    IfcLightFixture => "IFCLIGHTFIXTURE",
    IfcLamp => "IFCLAMP",

    // Electrical
    IfcElectricDistributionBoard => "IFCELECTRICDISTRIBUTIONBOARD",
    IfcElectricFlowStorageDevice => "IFCELECTRICFLOWSTORAGEDEVICE",
    IfcElectricGenerator => "IFCELECTRICGENERATOR",
    IfcElectricMotor => "IFCELECTRICMOTOR",

    // Other distribution flow terminals
    IfcAudioVisualAppliance => "IFCAUDIOVISUALAPPLIANCE",
    IfcCommunicationsAppliance => "IFCCOMMUNICATIONSAPPLIANCE",
    IfcElectricAppliance => "IFCELECTRICAPPLIANCE",
    IfcFireSuppressionTerminal => "IFCFIRESUPPRESSIONTERMINAL",
    IfcMedicalDevice => "IFCMEDICALDEVICE",
    IfcOutlet => "IFCOUTLET",
    IfcSanitaryTerminal => "IFCSANITARYTERMINAL",
    IfcSpaceHeater => "IFCSPACEHEATER",
    IfcStackTerminal => "IFCSTACKTERMINAL",
    IfcWasteTerminal => "IFCWASTETERMINAL",

    // Energy conversion devices
    IfcAirToAirHeatRecovery => "IFCAIRTOAIRHEATRECOVERY",
    IfcBurner => "IFCBURNER",
    IfcCoil => "IFCCOIL",
    IfcCondenser => "IFCCONDENSER",
    IfcCooledBeam => "IFCCOOLEDBEAM",
    IfcCoolingTower => "IFCCOOLINGTOWER",
    IfcEngine => "IFCENGINE",
    IfcEvaporativeCooler => "IFCEVAPORATIVECOOLER",
    IfcEvaporator => "IFCEVAPORATOR",
    IfcHumidifier => "IFCHUMIDIFIER",
    IfcMotorConnection => "IFCMOTORCONNECTION",
    IfcSolarDevice => "IFCSOLARDEVICE",
    IfcTransformer => "IFCTRANSFORMER",
    IfcTubeBundle => "IFCTUBEBUNDLE",
    IfcUnitaryEquipment => "IFCUNITARYEQUIPMENT",

    // Flow controllers
    IfcAirTerminalBox => "IFCAIRTERMINALBOX",
    IfcDamper => "IFCDAMPER",
    IfcElectricTimeControl => "IFCELECTRICTIMECONTROL",
    IfcFlowMeter => "IFCFLOWMETER",
    IfcProtectiveDevice => "IFCPROTECTIVEDEVICE",
    IfcSwitchingDevice => "IFCSWITCHINGDEVICE",
    IfcValve => "IFCVALVE",

    // Fittings and segments
    IfcCableCarrierFitting => "IFCCABLECARRIERFITTING",
    IfcCableFitting => "IFCCABLEFITTING",
    IfcDuctFitting => "IFCDUCTFITTING",
    IfcJunctionBox => "IFCJUNCTIONBOX",
    IfcPipeFitting => "IFCPIPEFITTING",
    IfcCableCarrierSegment => "IFCCABLECARRIERSEGMENT",
    IfcCableSegment => "IFCCABLESEGMENT",
    IfcDuctSegment => "IFCDUCTSEGMENT",
    IfcPipeSegment => "IFCPIPESEGMENT",

    // Moving, storage and treatment devices
    IfcCompressor => "IFCCOMPRESSOR",
    IfcPump => "IFCPUMP",
    IfcTank => "IFCTANK",
    IfcDuctSilencer => "IFCDUCTSILENCER",
    IfcFilter => "IFCFILTER",
    IfcInterceptor => "IFCINTERCEPTOR",
    IfcDistributionChamberElement => "IFCDISTRIBUTIONCHAMBERELEMENT",

    // Distribution control
    IfcActuator => "IFCACTUATOR",
    IfcAlarm => "IFCALARM",
    IfcController => "IFCCONTROLLER",
    IfcFlowInstrument => "IFCFLOWINSTRUMENT",
    IfcProtectiveDeviceTrippingUnit => "IFCPROTECTIVEDEVICETRIPPINGUNIT",
    IfcSensor => "IFCSENSOR",
    IfcUnitaryControlElement => "IFCUNITARYCONTROLELEMENT",

    // Relationships
    IfcRelAggregates => "IFCRELAGGREGATES",
    IfcRelContainedInSpatialStructure => "IFCRELCONTAINEDINSPATIALSTRUCTURE",
    IfcRelDefinesByProperties => "IFCRELDEFINESBYPROPERTIES",
    IfcRelDefinesByType => "IFCRELDEFINESBYTYPE",

    // Properties and quantities
    IfcPropertySet => "IFCPROPERTYSET",
    IfcPropertySingleValue => "IFCPROPERTYSINGLEVALUE",
    IfcPropertyEnumeratedValue => "IFCPROPERTYENUMERATEDVALUE",
    IfcPropertyBoundedValue => "IFCPROPERTYBOUNDEDVALUE",
    IfcPropertyListValue => "IFCPROPERTYLISTVALUE",
    IfcElementQuantity => "IFCELEMENTQUANTITY",
    IfcQuantityLength => "IFCQUANTITYLENGTH",
    IfcQuantityArea => "IFCQUANTITYAREA",
    IfcQuantityVolume => "IFCQUANTITYVOLUME",
    IfcQuantityCount => "IFCQUANTITYCOUNT",
    IfcQuantityWeight => "IFCQUANTITYWEIGHT",
    IfcQuantityTime => "IFCQUANTITYTIME",

    // Units
    IfcUnitAssignment => "IFCUNITASSIGNMENT",
    IfcSIUnit => "IFCSIUNIT",
    IfcConversionBasedUnit => "IFCCONVERSIONBASEDUNIT",
}

impl FromStr for IfcType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl Default for IfcType {
    fn default() -> Self {
        IfcType::Unknown(String::new())
    }
}

impl fmt::Display for IfcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Decoded attribute value
///
/// Represents any value that can appear in an IFC entity's attribute list.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum AttributeValue {
    /// Null value ($)
    #[default]
    Null,
    /// Derived value (*)
    Derived,
    /// Entity reference (#123)
    EntityRef(EntityId),
    /// Boolean value
    Bool(bool),
    /// Integer value
    Integer(i64),
    /// Floating point value
    Float(f64),
    /// String value
    String(String),
    /// Enumeration value (.VALUE.)
    Enum(String),
    /// List of values
    List(Vec<AttributeValue>),
    /// Typed value like IFCLABEL('text')
    TypedValue(String, Vec<AttributeValue>),
}

impl AttributeValue {
    /// Try to get as entity reference
    pub fn as_entity_ref(&self) -> Option<EntityId> {
        match self {
            AttributeValue::EntityRef(id) => Some(*id),
            _ => None,
        }
    }

    /// Try to get as string
    pub fn as_string(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            AttributeValue::TypedValue(_, args) if !args.is_empty() => args[0].as_string(),
            _ => None,
        }
    }

    /// Try to get as float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            AttributeValue::Float(f) => Some(*f),
            AttributeValue::Integer(i) => Some(*i as f64),
            AttributeValue::TypedValue(_, args) if !args.is_empty() => args[0].as_float(),
            _ => None,
        }
    }

    /// Try to get as integer
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            AttributeValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get as boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(b) => Some(*b),
            AttributeValue::Enum(s) => match s.to_uppercase().as_str() {
                "TRUE" | "T" => Some(true),
                "FALSE" | "F" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Try to get as enum string
    pub fn as_enum(&self) -> Option<&str> {
        match self {
            AttributeValue::Enum(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as list
    pub fn as_list(&self) -> Option<&[AttributeValue]> {
        match self {
            AttributeValue::List(list) => Some(list),
            _ => None,
        }
    }

    /// Check if this is a null value
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }
}

/// Decoded IFC entity
///
/// Represents a fully decoded IFC entity with its ID, type, and attribute values.
#[derive(Clone, Debug)]
pub struct DecodedEntity {
    /// Entity ID
    pub id: EntityId,
    /// Entity type
    pub ifc_type: IfcType,
    /// Attribute values in order
    pub attributes: Vec<AttributeValue>,
}

impl DecodedEntity {
    /// Get attribute at index
    pub fn get(&self, index: usize) -> Option<&AttributeValue> {
        self.attributes.get(index)
    }

    /// Get entity reference at index
    pub fn get_ref(&self, index: usize) -> Option<EntityId> {
        self.get(index).and_then(|v| v.as_entity_ref())
    }

    /// Get string at index
    pub fn get_string(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(|v| v.as_string())
    }

    /// Get float at index
    pub fn get_float(&self, index: usize) -> Option<f64> {
        self.get(index).and_then(|v| v.as_float())
    }

    /// Get list at index
    pub fn get_list(&self, index: usize) -> Option<&[AttributeValue]> {
        self.get(index).and_then(|v| v.as_list())
    }

    /// Get enum string at index
    pub fn get_enum(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(|v| v.as_enum())
    }

    /// Get list of entity references at index
    pub fn get_refs(&self, index: usize) -> Option<Vec<EntityId>> {
        self.get_list(index)
            .map(|list| list.iter().filter_map(|v| v.as_entity_ref()).collect())
    }
}

/// Model metadata extracted from IFC header
#[derive(Clone, Debug, Default)]
pub struct ModelMetadata {
    /// IFC schema version (e.g., "IFC2X3", "IFC4", "IFC4X3")
    pub schema_version: String,
    /// Originating system (CAD application)
    pub originating_system: Option<String>,
    /// Preprocessor version
    pub preprocessor_version: Option<String>,
    /// File name from header
    pub file_name: Option<String>,
    /// Author
    pub author: Option<String>,
    /// Organization
    pub organization: Option<String>,
    /// Timestamp
    pub timestamp: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(IfcType::parse("IFCSPACE"), IfcType::IfcSpace);
        assert_eq!(IfcType::parse("IfcSpace"), IfcType::IfcSpace);
        assert_eq!(IfcType::parse("ifcairterminal"), IfcType::IfcAirTerminal);
    }

    #[test]
    fn test_name_uses_schema_spelling() {
        assert_eq!(IfcType::IfcAirTerminal.name(), "IfcAirTerminal");
        assert_eq!(IfcType::IfcElectricMotor.to_string(), "IfcElectricMotor");
        assert_eq!(IfcType::parse("IFCDUCTSEGMENT").name(), "IfcDuctSegment");
    }

    #[test]
    fn test_unknown_type_is_normalized() {
        let a = IfcType::parse("IfcPumpType");
        let b = IfcType::parse("IFCPUMPTYPE");
        assert_eq!(a, b);
        assert_eq!(a.name(), "IFCPUMPTYPE");
    }

    #[test]
    fn test_typed_value_unwraps() {
        let value = AttributeValue::TypedValue(
            "IFCAREAMEASURE".into(),
            vec![AttributeValue::Float(12.5)],
        );
        assert_eq!(value.as_float(), Some(12.5));
        assert_eq!(AttributeValue::Enum("T".into()).as_bool(), Some(true));
    }
}
