// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! EntityResolver trait implementation

use crate::scanner::{EntityIndex, EntityScanner, TypeIndex};
use crate::tokenizer::parse_entity_at;
use ifc_energy_model::{DecodedEntity, EntityId, EntityResolver, IfcType};
use rustc_hash::FxHashMap;
use std::sync::{Arc, RwLock};

/// Thread-safe entity resolver implementation
///
/// Entities are decoded on first access and cached. The cache belongs to
/// one parsed model, so nothing is shared between models.
pub struct ResolverImpl {
    /// Raw IFC content (owned for thread safety)
    content: String,
    /// Entity ID -> (start, end) byte offsets
    index: EntityIndex,
    /// Decoded entity cache (thread-safe)
    cache: RwLock<FxHashMap<u32, Arc<DecodedEntity>>>,
    /// Type -> entity IDs index, file order
    type_index: TypeIndex,
}

impl ResolverImpl {
    /// Create a resolver, scanning the content for its indices
    pub fn new(content: String) -> Self {
        let (index, type_index) = EntityScanner::build_indices(&content);
        Self {
            content,
            index,
            cache: RwLock::new(FxHashMap::default()),
            type_index,
        }
    }

    /// Decode and cache an entity
    ///
    /// Entities whose text cannot be decoded resolve to `None`; they are
    /// not cached, so the failure repeats on every lookup.
    fn decode_and_cache(&self, id: u32) -> Option<Arc<DecodedEntity>> {
        {
            let cache = self.cache.read().ok()?;
            if let Some(cached) = cache.get(&id) {
                return Some(Arc::clone(cached));
            }
        }

        let (start, end) = self.index.get(&id)?;
        let entity = parse_entity_at(&self.content, *start, *end).ok()?;
        let arc = Arc::new(entity);

        if let Ok(mut cache) = self.cache.write() {
            cache.insert(id, Arc::clone(&arc));
        }

        Some(arc)
    }
}

impl EntityResolver for ResolverImpl {
    fn get(&self, id: EntityId) -> Option<Arc<DecodedEntity>> {
        self.decode_and_cache(id.0)
    }

    fn entities_by_type(&self, ifc_type: &IfcType) -> Vec<Arc<DecodedEntity>> {
        self.type_index
            .get(ifc_type)
            .map(|ids| ids.iter().filter_map(|id| self.get(*id)).collect())
            .unwrap_or_default()
    }

    fn count_by_type(&self, ifc_type: &IfcType) -> usize {
        self.type_index.get(ifc_type).map(|v| v.len()).unwrap_or(0)
    }

    fn entity_count(&self) -> usize {
        self.index.len()
    }
}
