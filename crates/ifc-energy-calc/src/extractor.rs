// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Building data extractor
//!
//! Walks every category the estimators care about and assembles one
//! [`BuildingDataRecord`]. A malformed entity or attribute is logged and
//! skipped; only an unreadable file stops extraction, and that already
//! happened in [`ModelReader`].

use crate::attributes::AttributeResolver;
use crate::error::EnergyError;
use crate::reader::{Category, ModelReader};
use crate::records::{
    BuildingDataRecord, BuildingElementsSummary, BuildingInfo, EquipmentRecord, SourceInfo,
    SpaceRecord, SystemRecord,
};
use ifc_energy_model::{DecodedEntity, EntityId, PropertyValue, Quantity, QuantityType};
use log::{debug, warn};

/// Property names read as floor area, most preferred first
pub const AREA_PROPERTIES: [&str; 3] = ["NetFloorArea", "GrossFloorArea", "Area"];
/// Property names read as volume, most preferred first
pub const VOLUME_PROPERTIES: [&str; 3] = ["NetVolume", "GrossVolume", "Volume"];
/// Property names read as elevation, most preferred first
pub const ELEVATION_PROPERTIES: [&str; 2] = ["FinishFloorHeight", "Elevation"];
/// Area quantity names read as floor area, most preferred first
pub const AREA_QUANTITIES: [&str; 2] = ["NetFloorArea", "GrossFloorArea"];
/// Volume quantity names read as volume, most preferred first
pub const VOLUME_QUANTITIES: [&str; 2] = ["NetVolume", "GrossVolume"];

/// Wall quantities whose name contains this are summed into the wall area
pub const WALL_AREA_MARKER: &str = "NetSideArea";

pub const PARKING_FALLBACK_AREA: f64 = 25.0;
pub const OFFICE_FALLBACK_AREA: f64 = 50.0;
pub const DEFAULT_FALLBACK_AREA: f64 = 20.0;

const UNKNOWN: &str = "Unknown";

/// ElevationOfRefHeight of IfcBuilding
const BUILDING_ELEVATION_INDEX: usize = 9;

/// Extract the building data of a parsed model
pub fn extract_building_data(reader: &ModelReader) -> BuildingDataRecord {
    BuildingDataExtractor::new(reader).extract()
}

/// Floor area assumed for a space without any measured area
///
/// Parking spaces are matched on the name, offices and untyped spaces on
/// the space type.
pub fn fallback_area(name: &str, space_type: &str) -> f64 {
    if name.contains("PARK") {
        PARKING_FALLBACK_AREA
    } else if space_type == "OFFICE" || space_type == UNKNOWN {
        OFFICE_FALLBACK_AREA
    } else {
        DEFAULT_FALLBACK_AREA
    }
}

/// Keeps the value offered under the most preferred name
///
/// Among values offered under the same name, the last one wins.
#[derive(Clone, Copy, Debug, Default)]
struct Preferred {
    best: Option<(usize, f64)>,
}

impl Preferred {
    /// Offer a value; returns false when `name` is not one of `names`
    fn offer(&mut self, names: &[&str], name: &str, value: f64) -> bool {
        let Some(rank) = names.iter().position(|n| *n == name) else {
            return false;
        };
        match self.best {
            Some((best_rank, _)) if best_rank < rank => {}
            _ => self.best = Some((rank, value)),
        }
        true
    }

    fn value(&self) -> Option<f64> {
        self.best.map(|(_, value)| value)
    }
}

/// Assembles a [`BuildingDataRecord`] from a [`ModelReader`]
pub struct BuildingDataExtractor<'a> {
    reader: &'a ModelReader,
    attributes: AttributeResolver<'a>,
}

impl<'a> BuildingDataExtractor<'a> {
    pub fn new(reader: &'a ModelReader) -> Self {
        Self {
            reader,
            attributes: AttributeResolver::new(reader.properties()),
        }
    }

    pub fn extract(&self) -> BuildingDataRecord {
        let spaces: Vec<SpaceRecord> = self
            .reader
            .by_category(Category::Space)
            .iter()
            .map(|space| self.space_record(space))
            .collect();
        let total_floor_area = spaces.iter().map(|space| space.area).sum();

        let record = BuildingDataRecord {
            building_elements: self.building_elements(),
            equipment: self.equipment(),
            total_floor_area,
            building_info: self.building_info(),
            hvac_systems: self.systems(Category::Hvac),
            lighting_systems: self.systems(Category::Lighting),
            electrical_systems: self.systems(Category::Electrical),
            source: SourceInfo::from(self.reader.metadata()),
            spaces,
        };

        debug!("Total spaces: {}", record.spaces.len());
        debug!("Total floor area: {:.2} m²", record.total_floor_area);
        for space in record.spaces.iter().take(3) {
            debug!(
                "Space '{}': area {:.2} m², volume {:.2} m³, type {}",
                space.name, space.area, space.volume, space.space_type
            );
        }

        record
    }

    /// First building in the file, if any
    fn building_info(&self) -> Option<BuildingInfo> {
        let building = self.reader.by_category(Category::Building).into_iter().next()?;
        Some(BuildingInfo {
            name: self
                .attributes
                .name(&building)
                .unwrap_or_else(|| UNKNOWN.to_string()),
            description: self.attributes.description(&building).unwrap_or_default(),
            building_type: self
                .attributes
                .object_type(&building)
                .unwrap_or_else(|| UNKNOWN.to_string()),
            elevation: building.get_float(BUILDING_ELEVATION_INDEX).unwrap_or(0.0),
        })
    }

    fn space_record(&self, space: &DecodedEntity) -> SpaceRecord {
        let name = self
            .attributes
            .name(space)
            .unwrap_or_else(|| UNKNOWN.to_string());
        let space_type = self
            .attributes
            .object_type(space)
            .unwrap_or_else(|| UNKNOWN.to_string());
        let description = self.attributes.description(space).unwrap_or_default();

        let mut area = Preferred::default();
        let mut volume = Preferred::default();
        let mut elevation = Preferred::default();

        for pset in self.attributes.property_sets(space) {
            for property in &pset.properties {
                let name = property.name.as_str();
                let (target, names, signed): (&mut Preferred, &[&str], bool) =
                    if AREA_PROPERTIES.contains(&name) {
                        (&mut area, &AREA_PROPERTIES, false)
                    } else if VOLUME_PROPERTIES.contains(&name) {
                        (&mut volume, &VOLUME_PROPERTIES, false)
                    } else if ELEVATION_PROPERTIES.contains(&name) {
                        (&mut elevation, &ELEVATION_PROPERTIES, true)
                    } else {
                        continue;
                    };
                if let Some(value) = measure(space.id, name, &property.value, signed) {
                    target.offer(names, name, value);
                }
            }
        }

        let mut area_quantity = Preferred::default();
        let mut volume_quantity = Preferred::default();

        for quantity in self.attributes.resolve_quantities(space) {
            let (target, names): (&mut Preferred, &[&str]) = match quantity.quantity_type {
                QuantityType::Area => (&mut area_quantity, &AREA_QUANTITIES),
                QuantityType::Volume => (&mut volume_quantity, &VOLUME_QUANTITIES),
                _ => continue,
            };
            if !names.contains(&quantity.name.as_str()) {
                continue;
            }
            if let Some(value) = quantity_value(space.id, &quantity) {
                target.offer(names, &quantity.name, value);
            }
        }

        let measured_area = area_quantity.value().or(area.value()).unwrap_or(0.0);
        let area = if measured_area > 0.0 {
            measured_area
        } else {
            fallback_area(&name, &space_type)
        };

        SpaceRecord {
            area,
            volume: volume_quantity.value().or(volume.value()).unwrap_or(0.0),
            elevation: elevation.value().unwrap_or(0.0),
            properties: self.attributes.resolve_properties(space),
            name,
            space_type,
            description,
        }
    }

    fn building_elements(&self) -> BuildingElementsSummary {
        let wall_area = self.sum_area_quantities(Category::Wall, |q| {
            q.name.contains(WALL_AREA_MARKER)
        });
        let window_area = self.sum_area_quantities(Category::Window, |_| true);

        BuildingElementsSummary {
            walls_count: self.reader.count(Category::Wall),
            windows_count: self.reader.count(Category::Window),
            doors_count: self.reader.count(Category::Door),
            slabs_count: self.reader.count(Category::Slab),
            roofs_count: self.reader.count(Category::Roof),
            ..Default::default()
        }
        .with_areas(wall_area, window_area)
    }

    /// Sum the selected Area quantities over every entity of a category
    fn sum_area_quantities<F>(&self, category: Category, select: F) -> f64
    where
        F: Fn(&Quantity) -> bool,
    {
        self.reader
            .by_category(category)
            .iter()
            .flat_map(|entity| {
                self.attributes
                    .resolve_quantities(entity)
                    .into_iter()
                    .filter(|q| q.is(QuantityType::Area) && select(q))
                    .filter_map(|q| quantity_value(entity.id, &q))
                    .collect::<Vec<_>>()
            })
            .sum()
    }

    /// Name, type and flattened properties of every device in a category
    fn systems(&self, category: Category) -> Vec<SystemRecord> {
        self.reader
            .by_category(category)
            .iter()
            .map(|entity| SystemRecord {
                name: self
                    .attributes
                    .name(entity)
                    .unwrap_or_else(|| UNKNOWN.to_string()),
                kind: entity.ifc_type.name().to_string(),
                properties: self.attributes.flat_properties(entity),
            })
            .collect()
    }

    fn equipment(&self) -> Vec<EquipmentRecord> {
        self.reader
            .by_category(Category::Equipment)
            .iter()
            .map(|entity| EquipmentRecord {
                name: self
                    .attributes
                    .name(entity)
                    .unwrap_or_else(|| UNKNOWN.to_string()),
                kind: entity.ifc_type.name().to_string(),
            })
            .collect()
    }
}

/// Numeric value of a dimension property, or `None` after logging why not
///
/// Only `signed` dimensions (elevations) may be negative.
fn measure(entity: EntityId, name: &str, value: &PropertyValue, signed: bool) -> Option<f64> {
    match value.as_f64() {
        Some(v) if signed || v >= 0.0 => Some(v),
        Some(v) => {
            warn!(
                "{}",
                EnergyError::malformed(entity, format!("negative {} {}", name, v))
            );
            None
        }
        None => {
            warn!(
                "{}",
                EnergyError::malformed(entity, format!("non-numeric {} '{}'", name, value))
            );
            None
        }
    }
}

/// Finite, non-negative quantity value, or `None` after logging why not
fn quantity_value(entity: EntityId, quantity: &Quantity) -> Option<f64> {
    if quantity.value.is_finite() && quantity.value >= 0.0 {
        Some(quantity.value)
    } else {
        warn!(
            "{}",
            EnergyError::malformed(
                entity,
                format!("invalid quantity {} {}", quantity.name, quantity.value)
            )
        );
        None
    }
}
