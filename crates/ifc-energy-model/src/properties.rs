// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Property and quantity access for IFC entities

use crate::EntityId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A property value coerced to a native scalar
///
/// IFC wraps values in measure types (`IFCAREAMEASURE(12.5)`,
/// `IFCLABEL('Office')`, `IFCBOOLEAN(.T.)`). Readers unwrap them into one of
/// these variants, which serialize as plain JSON scalars.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
}

impl PropertyValue {
    /// Interpret the value as a number
    ///
    /// Text is accepted when it holds a decimal number, so `'42.5'` written
    /// as a label still counts. Booleans and non-finite reals never do.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            PropertyValue::Integer(i) => *i as f64,
            PropertyValue::Real(f) => *f,
            PropertyValue::Text(s) => s.trim().parse::<f64>().ok()?,
            PropertyValue::Bool(_) => return None,
        };
        value.is_finite().then_some(value)
    }

    /// Get the value as text, if it is text
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as a boolean, if it is one
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Bool(b) => write!(f, "{}", b),
            PropertyValue::Integer(i) => write!(f, "{}", i),
            PropertyValue::Real(r) => write!(f, "{}", r),
            PropertyValue::Text(s) => f.write_str(s),
        }
    }
}

/// A single property value with optional unit
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Property {
    /// Property name
    pub name: String,
    /// Coerced property value
    pub value: PropertyValue,
    /// Unit of measurement (if applicable)
    pub unit: Option<String>,
}

impl Property {
    /// Create a new property
    pub fn new(name: impl Into<String>, value: PropertyValue) -> Self {
        Self {
            name: name.into(),
            value,
            unit: None,
        }
    }

    /// Create a property with unit
    pub fn with_unit(name: impl Into<String>, value: PropertyValue, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value,
            unit: Some(unit.into()),
        }
    }
}

/// A property set containing multiple properties
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertySet {
    /// Property set name (e.g., "Pset_SpaceCommon")
    pub name: String,
    /// Properties in this set, in file order
    pub properties: Vec<Property>,
}

impl PropertySet {
    /// Create a new property set
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
        }
    }

    /// Add a property to this set
    pub fn add(&mut self, property: Property) {
        self.properties.push(property);
    }

    /// Get a property by name
    pub fn get(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// Quantity types supported in IFC
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuantityType {
    /// Linear measurement (IfcQuantityLength)
    Length,
    /// Area measurement (IfcQuantityArea)
    Area,
    /// Volume measurement (IfcQuantityVolume)
    Volume,
    /// Count (IfcQuantityCount)
    Count,
    /// Weight/mass measurement (IfcQuantityWeight)
    Weight,
    /// Time measurement (IfcQuantityTime)
    Time,
}

impl QuantityType {
    /// Get default unit for this quantity type
    pub fn default_unit(&self) -> &'static str {
        match self {
            QuantityType::Length => "m",
            QuantityType::Area => "m²",
            QuantityType::Volume => "m³",
            QuantityType::Count => "",
            QuantityType::Weight => "kg",
            QuantityType::Time => "s",
        }
    }
}

/// A quantity value with type and unit
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    /// Quantity name
    pub name: String,
    /// Numeric value
    pub value: f64,
    /// Unit of measurement
    pub unit: String,
    /// Type of quantity
    pub quantity_type: QuantityType,
}

impl Quantity {
    /// Create a new quantity
    pub fn new(name: impl Into<String>, value: f64, quantity_type: QuantityType) -> Self {
        Self {
            name: name.into(),
            value,
            unit: quantity_type.default_unit().to_string(),
            quantity_type,
        }
    }

    /// Check the quantity kind
    pub fn is(&self, quantity_type: QuantityType) -> bool {
        self.quantity_type == quantity_type
    }
}

/// Property and quantity reader trait
///
/// Property sets come from IfcPropertySet entities linked via
/// IfcRelDefinesByProperties. Quantities come from IfcElementQuantity
/// entities linked the same way. Missing relationships yield empty results;
/// these methods never fail.
///
/// # Example
///
/// ```ignore
/// use ifc_energy_model::{PropertyReader, EntityId};
///
/// fn show_space(props: &dyn PropertyReader, space_id: EntityId) {
///     for pset in props.property_sets(space_id) {
///         println!("Property Set: {}", pset.name);
///         for prop in &pset.properties {
///             println!("  {}: {}", prop.name, prop.value);
///         }
///     }
///     for qty in props.quantities(space_id) {
///         println!("{}: {} {}", qty.name, qty.value, qty.unit);
///     }
/// }
/// ```
pub trait PropertyReader: Send + Sync {
    /// Get all property sets associated with an entity, in file order
    ///
    /// Empty property sets are included.
    fn property_sets(&self, id: EntityId) -> Vec<PropertySet>;

    /// Get all quantities associated with an entity, in file order
    fn quantities(&self, id: EntityId) -> Vec<Quantity>;

    /// Get a specific property by name
    ///
    /// Searches all property sets for the entity and returns the first
    /// property with the matching name.
    fn get_property(&self, id: EntityId, name: &str) -> Option<Property> {
        self.property_sets(id)
            .into_iter()
            .flat_map(|pset| pset.properties)
            .find(|p| p.name == name)
    }

    /// Get entity's Name attribute (index 2 on rooted entities)
    fn name(&self, id: EntityId) -> Option<String>;

    /// Get entity's Description attribute (index 3)
    fn description(&self, id: EntityId) -> Option<String>;

    /// Get entity's ObjectType attribute (index 4)
    ///
    /// ObjectType is often used as a more specific type indicator
    /// beyond the IFC class name, e.g. the space usage.
    fn object_type(&self, _id: EntityId) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_as_f64() {
        assert_eq!(PropertyValue::Real(12.5).as_f64(), Some(12.5));
        assert_eq!(PropertyValue::Integer(3).as_f64(), Some(3.0));
        assert_eq!(PropertyValue::Text(" 40 ".into()).as_f64(), Some(40.0));
        assert_eq!(PropertyValue::Text("Office".into()).as_f64(), None);
        assert_eq!(PropertyValue::Bool(true).as_f64(), None);
        assert_eq!(PropertyValue::Real(f64::NAN).as_f64(), None);
    }

    #[test]
    fn test_value_serializes_as_plain_scalar() {
        let values = vec![
            PropertyValue::Bool(true),
            PropertyValue::Integer(2),
            PropertyValue::Real(1.5),
            PropertyValue::Text("Office".into()),
        ];
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(json, r#"[true,2,1.5,"Office"]"#);
    }

    #[test]
    fn test_property_set_lookup() {
        let mut pset = PropertySet::new("Pset_SpaceCommon");
        pset.add(Property::new("Reference", PropertyValue::Text("R1".into())));
        pset.add(Property::with_unit(
            "NetFloorArea",
            PropertyValue::Real(20.0),
            "m²",
        ));

        assert_eq!(pset.get("NetFloorArea").unwrap().unit.as_deref(), Some("m²"));
        assert!(pset.get("Missing").is_none());
    }

    #[test]
    fn test_quantity_default_unit() {
        let qty = Quantity::new("NetFloorArea", 40.0, QuantityType::Area);
        assert_eq!(qty.unit, "m²");
        assert!(qty.is(QuantityType::Area));
        assert!(!qty.is(QuantityType::Volume));
    }
}
