// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Spatial structure index

use bim2osm_model::{EntityId, EntityResolver, IfcType, SpatialQuery, StoreyInfo};
use rustc_hash::FxHashMap;
use std::cmp::Ordering;

/// Parent links and storey levels built from the relationship entities
pub struct SpatialQueryImpl {
    storeys: Vec<StoreyInfo>,
    /// child -> spatial parent
    parents: FxHashMap<EntityId, EntityId>,
}

impl SpatialQueryImpl {
    /// Build the index from `IfcRelAggregates`, `IfcRelContainedInSpatialStructure`
    /// and `IfcBuildingStorey` instances
    pub fn build(resolver: &dyn EntityResolver) -> Self {
        let mut parents = FxHashMap::default();

        // IfcRelAggregates: RelatingObject 4, RelatedObjects 5
        for rel in resolver.entities_by_type(&IfcType::IfcRelAggregates) {
            if let Some(parent) = rel.get_ref(4) {
                for child in rel.get_refs(5).unwrap_or_default() {
                    parents.entry(child).or_insert(parent);
                }
            }
        }

        // IfcRelContainedInSpatialStructure: RelatedElements 4, RelatingStructure 5
        for rel in resolver.entities_by_type(&IfcType::IfcRelContainedInSpatialStructure) {
            if let Some(structure) = rel.get_ref(5) {
                for element in rel.get_refs(4).unwrap_or_default() {
                    parents.entry(element).or_insert(structure);
                }
            }
        }

        let mut storeys: Vec<StoreyInfo> = resolver
            .entities_by_type(&IfcType::IfcBuildingStorey)
            .iter()
            .map(|storey| StoreyInfo {
                id: storey.id,
                name: storey.get_string(2).unwrap_or_default().to_string(),
                elevation: storey.get_float(9).unwrap_or(0.0),
                level: 0,
            })
            .collect();

        storeys.sort_by(|a, b| {
            a.elevation
                .partial_cmp(&b.elevation)
                .unwrap_or(Ordering::Equal)
                .then(a.id.cmp(&b.id))
        });
        for (level, storey) in storeys.iter_mut().enumerate() {
            storey.level = level;
        }

        Self { storeys, parents }
    }

    /// Index with no storeys and no relationships
    pub fn empty() -> Self {
        Self {
            storeys: Vec::new(),
            parents: FxHashMap::default(),
        }
    }
}

impl SpatialQuery for SpatialQueryImpl {
    fn storeys(&self) -> &[StoreyInfo] {
        &self.storeys
    }

    fn parent_of(&self, id: EntityId) -> Option<EntityId> {
        self.parents.get(&id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ResolverImpl;
    use crate::scanner::parse_header;

    const DATA: &str = r#"ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#1=IFCPROJECT('p',$,'Project',$,$,$,$,$,$);
#2=IFCSITE('s',$,'Site',$,$,$,$,$,.ELEMENT.,$,$,$,$,$);
#3=IFCBUILDING('b',$,'Building',$,$,$,$,$,.ELEMENT.,$,$,$);
#10=IFCBUILDINGSTOREY('u',$,'Upper',$,$,$,$,$,.ELEMENT.,3.);
#11=IFCBUILDINGSTOREY('g',$,'Ground',$,$,$,$,$,.ELEMENT.,0.);
#12=IFCBUILDINGSTOREY('x',$,'Basement',$,$,$,$,$,.ELEMENT.,-3.);
#20=IFCRELAGGREGATES('r1',$,$,$,#1,(#2));
#21=IFCRELAGGREGATES('r2',$,$,$,#2,(#3));
#22=IFCRELAGGREGATES('r3',$,$,$,#3,(#10,#11,#12));
#30=IFCWALL('w',$,'Wall',$,$,$,$,$,$);
#31=IFCSTAIR('st',$,'Stair',$,$,$,$,$,$);
#32=IFCSTAIRFLIGHT('sf',$,'Flight',$,$,$,$,$,$,$,$,$,$);
#40=IFCRELCONTAINEDINSPATIALSTRUCTURE('c',$,$,$,(#30,#31),#10);
#41=IFCRELAGGREGATES('r4',$,$,$,#31,(#32));
ENDSEC;
END-ISO-10303-21;
"#;

    fn build() -> SpatialQueryImpl {
        let header = parse_header(DATA).unwrap();
        let resolver = ResolverImpl::load(DATA, header.data_offset).unwrap();
        SpatialQueryImpl::build(&resolver)
    }

    #[test]
    fn test_storeys_ordered_by_elevation() {
        let spatial = build();
        let names: Vec<_> = spatial.storeys().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Basement", "Ground", "Upper"]);
        assert_eq!(spatial.storeys()[2].level, 2);
    }

    #[test]
    fn test_nested_element_level() {
        let spatial = build();
        assert_eq!(spatial.containing_storey(EntityId(30)), Some(EntityId(10)));
        assert_eq!(spatial.level_of(EntityId(32)), Some(2));
        assert_eq!(spatial.level_of(EntityId(2)), None);
    }

    #[test]
    fn test_empty_spatial() {
        let spatial = SpatialQueryImpl::empty();
        assert!(spatial.storeys().is_empty());
        assert!(spatial.parent_of(EntityId(1)).is_none());
    }
}
