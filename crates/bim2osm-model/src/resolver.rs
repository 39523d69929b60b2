// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lookup of decoded entities by id and by type

use crate::{AttributeValue, DecodedEntity, EntityId, IfcType};
use std::sync::Arc;

/// Read access to the entity arena of a loaded file
///
/// Entities are handed out as shared `Arc`s and never change after loading.
/// A reference that points nowhere resolves to `None`; callers decide
/// whether that is an error.
///
/// ```ignore
/// let wall = resolver.get(wall_id)?;
/// let placement = wall.get(5).and_then(|a| resolver.resolve_ref(a))?;
/// assert_eq!(placement.ifc_type, IfcType::IfcLocalPlacement);
/// ```
pub trait EntityResolver: Send + Sync {
    /// Entity with this id, if defined
    fn get(&self, id: EntityId) -> Option<Arc<DecodedEntity>>;

    /// Target of an `#id` attribute; `None` for anything else
    fn resolve_ref(&self, attr: &AttributeValue) -> Option<Arc<DecodedEntity>> {
        match attr {
            AttributeValue::EntityRef(id) => self.get(*id),
            _ => None,
        }
    }

    /// Targets of a list attribute; non-reference members are dropped
    fn resolve_ref_list(&self, attr: &AttributeValue) -> Vec<Arc<DecodedEntity>> {
        match attr {
            AttributeValue::List(items) => items
                .iter()
                .filter_map(|item| self.resolve_ref(item))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Entities declared with `ifc_type`, ascending by id
    fn entities_by_type(&self, ifc_type: &IfcType) -> Vec<Arc<DecodedEntity>>;

    fn count_by_type(&self, ifc_type: &IfcType) -> usize;

    /// Number of instances in the DATA section
    fn entity_count(&self) -> usize;
}
