// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Attribute resolver - property sets, quantities and direct attributes of
//! one entity
//!
//! Purely structural: values come back as the file states them and the
//! extractor decides what they mean.

use crate::records::{PropertyMap, PropertySetMap};
use ifc_energy_model::{DecodedEntity, PropertyReader, PropertySet, Quantity};

/// Resolves the attached definitions of an entity
#[derive(Clone, Copy)]
pub struct AttributeResolver<'a> {
    properties: &'a dyn PropertyReader,
}

impl<'a> AttributeResolver<'a> {
    pub fn new(properties: &'a dyn PropertyReader) -> Self {
        Self { properties }
    }

    /// Attached property sets in file order, duplicates kept
    pub fn property_sets(&self, entity: &DecodedEntity) -> Vec<PropertySet> {
        self.properties.property_sets(entity.id)
    }

    /// Property set name → property name → value
    ///
    /// Empty sets are kept. Two sets sharing a name are merged, the later
    /// one overriding equal property names.
    pub fn resolve_properties(&self, entity: &DecodedEntity) -> PropertySetMap {
        let mut resolved = PropertySetMap::new();
        for pset in self.property_sets(entity) {
            let target = resolved.entry(pset.name).or_default();
            for property in pset.properties {
                target.insert(property.name, property.value);
            }
        }
        resolved
    }

    /// All properties of all sets merged, later sets overriding earlier ones
    pub fn flat_properties(&self, entity: &DecodedEntity) -> PropertyMap {
        let mut flat = PropertyMap::new();
        for pset in self.property_sets(entity) {
            for property in pset.properties {
                flat.insert(property.name, property.value);
            }
        }
        flat
    }

    /// Attached quantities in file order
    pub fn resolve_quantities(&self, entity: &DecodedEntity) -> Vec<Quantity> {
        self.properties.quantities(entity.id)
    }

    /// Name attribute, if set
    pub fn name(&self, entity: &DecodedEntity) -> Option<String> {
        self.properties.name(entity.id)
    }

    /// Description attribute, if set
    pub fn description(&self, entity: &DecodedEntity) -> Option<String> {
        self.properties.description(entity.id)
    }

    /// ObjectType attribute, if set
    pub fn object_type(&self, entity: &DecodedEntity) -> Option<String> {
        self.properties.object_type(entity.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::{Category, ModelReader};
    use ifc_energy_model::{EntityId, PropertyValue, QuantityType};

    const TEST_IFC: &str = r#"ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#10=IFCSPACE('s1',$,'Office 101','Corner office','OFFICE',$,$,$,.ELEMENT.,.INTERNAL.,$);
#11=IFCSPACE('s2',$,$,$,$,$,$,$,.ELEMENT.,.INTERNAL.,$);
#20=IFCPROPERTYSINGLEVALUE('Area',$,IFCAREAMEASURE(12.5),$);
#21=IFCPROPERTYSINGLEVALUE('IsExternal',$,IFCBOOLEAN(.F.),$);
#22=IFCPROPERTYSET('p1',$,'Pset_SpaceCommon',$,(#20,#21));
#23=IFCRELDEFINESBYPROPERTIES('r1',$,$,$,(#10),#22);
#30=IFCPROPERTYSINGLEVALUE('Area',$,IFCAREAMEASURE(14.0),$);
#31=IFCPROPERTYSINGLEVALUE('Reference',$,IFCIDENTIFIER('A-101'),$);
#32=IFCPROPERTYSET('p2',$,'Custom',$,(#30,#31));
#33=IFCRELDEFINESBYPROPERTIES('r2',$,$,$,(#10),#32);
#34=IFCPROPERTYSET('p3',$,'Pset_Empty',$,());
#35=IFCRELDEFINESBYPROPERTIES('r3',$,$,$,(#10),#34);
#40=IFCQUANTITYAREA('NetFloorArea',$,$,11.0,$);
#41=IFCQUANTITYAREA('NetFloorArea',$,$,3.0,$);
#42=IFCQUANTITYVOLUME('NetVolume',$,$,33.0,$);
#43=IFCELEMENTQUANTITY('q1',$,'Qto_SpaceBaseQuantities',$,$,(#40,#42));
#44=IFCELEMENTQUANTITY('q2',$,'Extra',$,$,(#41));
#45=IFCRELDEFINESBYPROPERTIES('r4',$,$,$,(#10),#43);
#46=IFCRELDEFINESBYPROPERTIES('r5',$,$,$,(#10),#44);
ENDSEC;
END-ISO-10303-21;
"#;

    fn spaces(reader: &ModelReader) -> Vec<std::sync::Arc<DecodedEntity>> {
        reader.by_category(Category::Space)
    }

    #[test]
    fn test_resolve_properties_keeps_sets_apart() {
        let reader = ModelReader::from_bytes(TEST_IFC.as_bytes()).unwrap();
        let resolver = AttributeResolver::new(reader.properties());
        let spaces = spaces(&reader);

        let psets = resolver.resolve_properties(&spaces[0]);
        assert_eq!(psets.len(), 3);
        assert_eq!(
            psets["Pset_SpaceCommon"]["Area"],
            PropertyValue::Real(12.5)
        );
        assert_eq!(
            psets["Pset_SpaceCommon"]["IsExternal"],
            PropertyValue::Bool(false)
        );
        assert_eq!(psets["Custom"]["Area"], PropertyValue::Real(14.0));
        assert!(psets["Pset_Empty"].is_empty());
    }

    #[test]
    fn test_flat_properties_later_set_wins() {
        let reader = ModelReader::from_bytes(TEST_IFC.as_bytes()).unwrap();
        let resolver = AttributeResolver::new(reader.properties());
        let spaces = spaces(&reader);

        let flat = resolver.flat_properties(&spaces[0]);
        assert_eq!(flat["Area"], PropertyValue::Real(14.0));
        assert_eq!(flat["Reference"], PropertyValue::Text("A-101".to_string()));
        assert_eq!(flat.len(), 3);
    }

    #[test]
    fn test_resolve_quantities_keeps_duplicates() {
        let reader = ModelReader::from_bytes(TEST_IFC.as_bytes()).unwrap();
        let resolver = AttributeResolver::new(reader.properties());
        let spaces = spaces(&reader);

        let quantities = resolver.resolve_quantities(&spaces[0]);
        let areas: Vec<f64> = quantities
            .iter()
            .filter(|q| q.is(QuantityType::Area))
            .map(|q| q.value)
            .collect();
        assert_eq!(areas, vec![11.0, 3.0]);
        assert!(quantities
            .iter()
            .any(|q| q.is(QuantityType::Volume) && q.name == "NetVolume"));
    }

    #[test]
    fn test_direct_attributes() {
        let reader = ModelReader::from_bytes(TEST_IFC.as_bytes()).unwrap();
        let resolver = AttributeResolver::new(reader.properties());
        let spaces = spaces(&reader);

        assert_eq!(resolver.name(&spaces[0]).as_deref(), Some("Office 101"));
        assert_eq!(
            resolver.description(&spaces[0]).as_deref(),
            Some("Corner office")
        );
        assert_eq!(resolver.object_type(&spaces[0]).as_deref(), Some("OFFICE"));

        assert_eq!(resolver.name(&spaces[1]), None);
        assert!(resolver.resolve_properties(&spaces[1]).is_empty());
        assert!(resolver.resolve_quantities(&spaces[1]).is_empty());
    }

    /// Labels every entity by id, ignoring its attribute list
    struct Labels;

    impl PropertyReader for Labels {
        fn property_sets(&self, _id: EntityId) -> Vec<PropertySet> {
            Vec::new()
        }

        fn quantities(&self, _id: EntityId) -> Vec<Quantity> {
            Vec::new()
        }

        fn name(&self, id: EntityId) -> Option<String> {
            Some(format!("Room {}", id.0))
        }

        fn description(&self, _id: EntityId) -> Option<String> {
            None
        }
    }

    #[test]
    fn test_direct_attributes_come_from_property_reader() {
        let reader = ModelReader::from_bytes(TEST_IFC.as_bytes()).unwrap();
        let spaces = spaces(&reader);
        let labels = Labels;
        let resolver = AttributeResolver::new(&labels);

        assert_eq!(resolver.name(&spaces[0]).as_deref(), Some("Room 10"));
        assert_eq!(resolver.name(&spaces[1]).as_deref(), Some("Room 11"));
        assert_eq!(resolver.description(&spaces[0]), None);
        assert_eq!(resolver.object_type(&spaces[0]), None);
    }
}
