// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! PropertyReader trait implementation

use ifc_energy_model::{
    AttributeValue, DecodedEntity, EntityId, EntityResolver, IfcType, Property, PropertyReader,
    PropertySet, PropertyValue, Quantity, QuantityType,
};
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Property reader implementation
pub struct PropertyReaderImpl {
    /// Reference to resolver for entity lookups
    resolver: Arc<dyn EntityResolver>,
    /// Cache: entity ID -> property set IDs
    pset_cache: FxHashMap<u32, Vec<EntityId>>,
    /// Cache: entity ID -> quantity set IDs
    qset_cache: FxHashMap<u32, Vec<EntityId>>,
}

impl PropertyReaderImpl {
    /// Create a new property reader
    ///
    /// Walks every IfcRelDefinesByProperties once, in file order, and
    /// remembers which definitions hang off which object.
    pub fn new(resolver: Arc<dyn EntityResolver>) -> Self {
        let mut pset_cache: FxHashMap<u32, Vec<EntityId>> = FxHashMap::default();
        let mut qset_cache: FxHashMap<u32, Vec<EntityId>> = FxHashMap::default();

        for rel in resolver.entities_by_type(&IfcType::IfcRelDefinesByProperties) {
            // RelatedObjects at index 4, RelatingPropertyDefinition at index 5
            let Some(related_ids) = rel.get_refs(4) else {
                continue;
            };

            // IFC4 allows a set of definitions in place of a single one
            let definition_ids = match rel.get(5) {
                Some(AttributeValue::EntityRef(id)) => vec![*id],
                Some(AttributeValue::List(_)) => rel.get_refs(5).unwrap_or_default(),
                _ => continue,
            };

            for definition_id in definition_ids {
                let Some(definition) = resolver.get(definition_id) else {
                    continue;
                };
                let cache = match definition.ifc_type {
                    IfcType::IfcPropertySet => &mut pset_cache,
                    IfcType::IfcElementQuantity => &mut qset_cache,
                    _ => continue,
                };

                for related_id in &related_ids {
                    cache.entry(related_id.0).or_default().push(definition_id);
                }
            }
        }

        Self {
            resolver,
            pset_cache,
            qset_cache,
        }
    }

    /// Extract properties from a property set entity
    fn extract_properties(&self, pset: &DecodedEntity) -> Vec<Property> {
        // HasProperties at index 4
        pset.get(4)
            .map(|refs| self.resolver.resolve_ref_list(refs))
            .unwrap_or_default()
            .iter()
            .filter_map(|prop| self.extract_single_property(prop))
            .collect()
    }

    /// Extract a single property from an IfcProperty entity
    ///
    /// Single values without a nominal value are dropped.
    fn extract_single_property(&self, prop: &DecodedEntity) -> Option<Property> {
        // Name at index 0
        let name = prop.get_string(0)?.to_string();

        match prop.ifc_type {
            IfcType::IfcPropertySingleValue => {
                // NominalValue at index 2, Unit at index 3
                let value = coerce_value(prop.get(2)?)?;
                let unit = prop.get(3).and_then(|v| self.extract_unit(v));
                Some(Property { name, value, unit })
            }
            IfcType::IfcPropertyEnumeratedValue | IfcType::IfcPropertyListValue => {
                // EnumerationValues / ListValues at index 2
                let values = prop
                    .get_list(2)?
                    .iter()
                    .filter_map(coerce_value)
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>();
                if values.is_empty() {
                    return None;
                }
                Some(Property::new(name, PropertyValue::Text(values.join(", "))))
            }
            IfcType::IfcPropertyBoundedValue => {
                // UpperBoundValue, LowerBoundValue at indices 2, 3
                let upper = prop.get(2).and_then(coerce_value);
                let lower = prop.get(3).and_then(coerce_value);
                let value = match (lower, upper) {
                    (Some(l), Some(u)) => format!("{} - {}", l, u),
                    (Some(l), None) => format!(">= {}", l),
                    (None, Some(u)) => format!("<= {}", u),
                    _ => return None,
                };
                Some(Property::new(name, PropertyValue::Text(value)))
            }
            _ => None,
        }
    }

    /// Extract unit from a unit reference
    fn extract_unit(&self, attr: &AttributeValue) -> Option<String> {
        let unit = self.resolver.resolve_ref(attr)?;

        match unit.ifc_type {
            IfcType::IfcSIUnit => {
                let prefix = match unit.get_enum(2).unwrap_or("") {
                    "MILLI" => "m",
                    "CENTI" => "c",
                    "KILO" => "k",
                    _ => "",
                };
                let name = unit.get_enum(3)?;
                let symbol = match name {
                    "METRE" => "m",
                    "SQUARE_METRE" => "m²",
                    "CUBIC_METRE" => "m³",
                    "WATT" => "W",
                    "JOULE" => "J",
                    "KELVIN" => "K",
                    "AMPERE" => "A",
                    "VOLT" => "V",
                    _ => name,
                };
                Some(format!("{}{}", prefix, symbol))
            }
            // Name at index 2
            IfcType::IfcConversionBasedUnit => unit.get_string(2).map(str::to_string),
            _ => None,
        }
    }

    /// Extract quantities from an element quantity entity
    fn extract_quantities(&self, qset: &DecodedEntity) -> Vec<Quantity> {
        // Quantities at index 5
        qset.get(5)
            .map(|refs| self.resolver.resolve_ref_list(refs))
            .unwrap_or_default()
            .iter()
            .filter_map(|qty| extract_single_quantity(qty))
            .collect()
    }

    fn attribute_string(&self, id: EntityId, index: usize) -> Option<String> {
        let entity = self.resolver.get(id)?;
        entity.get_string(index).map(str::to_string)
    }
}

/// Extract a single quantity from an IfcQuantity entity
///
/// Name at index 0, the measured value at index 3 for every quantity kind.
fn extract_single_quantity(qty: &DecodedEntity) -> Option<Quantity> {
    let name = qty.get_string(0)?.to_string();

    let quantity_type = match qty.ifc_type {
        IfcType::IfcQuantityLength => QuantityType::Length,
        IfcType::IfcQuantityArea => QuantityType::Area,
        IfcType::IfcQuantityVolume => QuantityType::Volume,
        IfcType::IfcQuantityCount => QuantityType::Count,
        IfcType::IfcQuantityWeight => QuantityType::Weight,
        IfcType::IfcQuantityTime => QuantityType::Time,
        _ => return None,
    };

    Some(Quantity::new(name, qty.get_float(3)?, quantity_type))
}

/// Coerce a wrapped IFC value into a native scalar
///
/// `IFCBOOLEAN(.T.)` becomes a boolean, `IFCLOGICAL(.U.)` stays text,
/// measures become numbers. Null, derived values and references have no
/// scalar form.
pub fn coerce_value(attr: &AttributeValue) -> Option<PropertyValue> {
    match attr {
        AttributeValue::TypedValue(_, args) => args.first().and_then(coerce_value),
        AttributeValue::String(s) => Some(PropertyValue::Text(s.clone())),
        AttributeValue::Integer(i) => Some(PropertyValue::Integer(*i)),
        AttributeValue::Float(f) => Some(PropertyValue::Real(*f)),
        AttributeValue::Bool(b) => Some(PropertyValue::Bool(*b)),
        AttributeValue::Enum(e) => Some(
            attr.as_bool()
                .map(PropertyValue::Bool)
                .unwrap_or_else(|| PropertyValue::Text(e.clone())),
        ),
        AttributeValue::Null
        | AttributeValue::Derived
        | AttributeValue::EntityRef(_)
        | AttributeValue::List(_) => None,
    }
}

impl PropertyReader for PropertyReaderImpl {
    fn property_sets(&self, id: EntityId) -> Vec<PropertySet> {
        let Some(pset_ids) = self.pset_cache.get(&id.0) else {
            return Vec::new();
        };

        pset_ids
            .iter()
            .filter_map(|pset_id| self.resolver.get(*pset_id))
            .map(|pset| PropertySet {
                // Name at index 2
                name: pset.get_string(2).unwrap_or("Unknown").to_string(),
                properties: self.extract_properties(&pset),
            })
            .collect()
    }

    fn quantities(&self, id: EntityId) -> Vec<Quantity> {
        let Some(qset_ids) = self.qset_cache.get(&id.0) else {
            return Vec::new();
        };

        qset_ids
            .iter()
            .filter_map(|qset_id| self.resolver.get(*qset_id))
            .flat_map(|qset| self.extract_quantities(&qset))
            .collect()
    }

    fn name(&self, id: EntityId) -> Option<String> {
        self.attribute_string(id, 2)
    }

    fn description(&self, id: EntityId) -> Option<String> {
        self.attribute_string(id, 3)
    }

    fn object_type(&self, id: EntityId) -> Option<String> {
        self.attribute_string(id, 4)
    }
}
