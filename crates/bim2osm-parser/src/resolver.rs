// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entity arena implementing `EntityResolver`

use crate::scanner::EntityScanner;
use crate::tokenizer::parse_entity;
use bim2osm_model::{
    DecodedEntity, EntityId, EntityResolver, IfcType, ParseError, Result,
};
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Arena of decoded entities keyed by id
///
/// Every entity of the DATA section is decoded up front; a model only
/// exists if all of them decoded.
pub struct ResolverImpl {
    entities: FxHashMap<u32, Arc<DecodedEntity>>,
    /// Type -> entity IDs, ascending
    type_index: FxHashMap<IfcType, Vec<EntityId>>,
}

impl ResolverImpl {
    /// Decode the DATA section starting at `data_offset`
    pub fn load(content: &str, data_offset: usize) -> Result<Self> {
        let mut entities: FxHashMap<u32, Arc<DecodedEntity>> = FxHashMap::default();
        let mut type_index: FxHashMap<IfcType, Vec<EntityId>> = FxHashMap::default();

        let mut scanner = EntityScanner::at(content, data_offset);
        while let Some(raw) = scanner.next_entity()? {
            let entity = parse_entity(&content[raw.start..raw.end])
                .map_err(|e| ParseError::entity_parse(EntityId(raw.id), e))?;

            type_index
                .entry(entity.ifc_type.clone())
                .or_default()
                .push(entity.id);

            if entities.insert(raw.id, Arc::new(entity)).is_some() {
                return Err(ParseError::DuplicateEntity(EntityId(raw.id)));
            }
        }
        scanner.finish()?;

        for ids in type_index.values_mut() {
            ids.sort_unstable();
        }

        Ok(Self {
            entities,
            type_index,
        })
    }

    /// All entity ids in ascending order
    pub fn ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self.entities.keys().map(|&id| EntityId(id)).collect();
        ids.sort_unstable();
        ids
    }
}

impl EntityResolver for ResolverImpl {
    fn get(&self, id: EntityId) -> Option<Arc<DecodedEntity>> {
        self.entities.get(&id.0).cloned()
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
        self.entities.len()
    }
}
