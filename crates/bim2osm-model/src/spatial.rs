// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Spatial structure queries (storeys and element containment)

use crate::EntityId;
use serde::{Deserialize, Serialize};

/// Building storey, as used for `level` numbering
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoreyInfo {
    /// Storey entity ID
    pub id: EntityId,
    /// Storey name (empty when unnamed)
    pub name: String,
    /// Elevation in file length units
    pub elevation: f64,
    /// 0-based position when storeys are ordered by elevation
    pub level: usize,
}

/// Spatial hierarchy lookups
///
/// The hierarchy is the union of `IfcRelAggregates` (project → site →
/// building → storey → space) and `IfcRelContainedInSpatialStructure`
/// (structure → element) relationships.
pub trait SpatialQuery: Send + Sync {
    /// All storeys ordered by elevation (ties by id)
    fn storeys(&self) -> &[StoreyInfo];

    /// Direct spatial parent of an entity
    fn parent_of(&self, id: EntityId) -> Option<EntityId>;

    /// Nearest enclosing storey of an element, space or nested element
    fn containing_storey(&self, id: EntityId) -> Option<EntityId> {
        let mut current = self.parent_of(id);
        // The hierarchy is a tree; the bound only guards against cyclic files.
        for _ in 0..64 {
            let parent = current?;
            if self.storeys().iter().any(|s| s.id == parent) {
                return Some(parent);
            }
            current = self.parent_of(parent);
        }
        None
    }

    /// Level index of the enclosing storey
    fn level_of(&self, id: EntityId) -> Option<usize> {
        let storey = self.containing_storey(id)?;
        self.storeys()
            .iter()
            .find(|s| s.id == storey)
            .map(|s| s.level)
    }
}
