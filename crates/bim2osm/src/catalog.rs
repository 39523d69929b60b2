// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Map-object taxonomy and tag templates

use crate::primitives::Tags;
use bim2osm_geometry::Point3D;
use bim2osm_model::{EntityId, IfcType};
use serde::Serialize;
use std::fmt;

/// Building element categories that become map primitives
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum BimObject {
    Wall,
    Slab,
    Column,
    Door,
    Window,
    Stair,
    Space,
}

/// How an object is drawn on the map
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    /// Single tagged node at the outline centroid
    Point,
    /// Way along the outline, closed when the outline is a ring
    Line,
    /// Closed way
    Area,
}

impl BimObject {
    /// Every category, in emission order
    pub const ALL: [BimObject; 7] = [
        BimObject::Wall,
        BimObject::Slab,
        BimObject::Column,
        BimObject::Door,
        BimObject::Window,
        BimObject::Stair,
        BimObject::Space,
    ];

    /// Map an IFC entity type to its category
    pub fn classify(ifc_type: &IfcType) -> Option<BimObject> {
        match ifc_type {
            IfcType::IfcWall | IfcType::IfcWallStandardCase | IfcType::IfcCurtainWall => {
                Some(BimObject::Wall)
            }
            IfcType::IfcSlab => Some(BimObject::Slab),
            IfcType::IfcColumn => Some(BimObject::Column),
            IfcType::IfcDoor => Some(BimObject::Door),
            IfcType::IfcWindow => Some(BimObject::Window),
            IfcType::IfcStair | IfcType::IfcStairFlight => Some(BimObject::Stair),
            IfcType::IfcSpace => Some(BimObject::Space),
            _ => None,
        }
    }

    /// IFC entity types classified into this category
    pub fn source_types(&self) -> Vec<IfcType> {
        match self {
            BimObject::Wall => vec![
                IfcType::IfcWall,
                IfcType::IfcWallStandardCase,
                IfcType::IfcCurtainWall,
            ],
            BimObject::Slab => vec![IfcType::IfcSlab],
            BimObject::Column => vec![IfcType::IfcColumn],
            BimObject::Door => vec![IfcType::IfcDoor],
            BimObject::Window => vec![IfcType::IfcWindow],
            BimObject::Stair => vec![IfcType::IfcStair, IfcType::IfcStairFlight],
            BimObject::Space => vec![IfcType::IfcSpace],
        }
    }

    /// Fixed tags of this category
    pub fn template(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            BimObject::Wall => &[("indoor", "wall")],
            BimObject::Slab => &[("indoor", "area")],
            BimObject::Column => &[("indoor", "column")],
            BimObject::Door => &[("indoor", "door"), ("door", "yes")],
            BimObject::Window => &[("window", "yes")],
            BimObject::Stair => &[("indoor", "area"), ("highway", "steps")],
            BimObject::Space => &[("indoor", "room")],
        }
    }

    pub fn shape(&self) -> Shape {
        match self {
            BimObject::Door | BimObject::Window => Shape::Point,
            BimObject::Wall => Shape::Line,
            BimObject::Slab | BimObject::Column | BimObject::Stair | BimObject::Space => {
                Shape::Area
            }
        }
    }
}

impl fmt::Display for BimObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A classified element with its outline in the working frame
#[derive(Clone, Debug, PartialEq)]
pub struct PreparedBimObject3D {
    pub kind: BimObject,
    pub source: EntityId,
    /// 0-based storey index
    pub level: usize,
    pub name: Option<String>,
    /// Outline in meters, x east, y north; never empty
    pub outline: Vec<Point3D>,
    /// First and last outline points are joined
    pub closed: bool,
}

impl PreparedBimObject3D {
    /// Template tags plus `level` and, for spaces, `name`
    pub fn tags(&self) -> Tags {
        let mut tags: Tags = self
            .kind
            .template()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        tags.insert("level".to_string(), self.level.to_string());
        if self.kind == BimObject::Space {
            if let Some(name) = self.name.as_deref().filter(|n| !n.is_empty()) {
                tags.insert("name".to_string(), name.to_string());
            }
        }
        tags
    }

    /// Mean of the outline points, ignoring a repeated closing point
    pub fn centroid(&self) -> Point3D {
        let points = match self.outline.as_slice() {
            [first, rest @ .., last] if !rest.is_empty() && first == last => {
                &self.outline[..self.outline.len() - 1]
            }
            _ => self.outline.as_slice(),
        };
        let sum = points
            .iter()
            .fold(Point3D::origin().coords, |acc, p| acc + p.coords);
        Point3D::from(sum / points.len().max(1) as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(kind: BimObject, name: Option<&str>) -> PreparedBimObject3D {
        PreparedBimObject3D {
            kind,
            source: EntityId(1),
            level: 2,
            name: name.map(str::to_string),
            outline: vec![
                Point3D::new(0.0, 0.0, 0.0),
                Point3D::new(2.0, 0.0, 0.0),
                Point3D::new(2.0, 2.0, 0.0),
                Point3D::new(0.0, 2.0, 0.0),
                Point3D::new(0.0, 0.0, 0.0),
            ],
            closed: true,
        }
    }

    #[test]
    fn test_classification_is_total_over_catalog() {
        for kind in BimObject::ALL {
            for ifc_type in kind.source_types() {
                assert_eq!(BimObject::classify(&ifc_type), Some(kind));
            }
        }
        assert_eq!(BimObject::classify(&IfcType::IfcBuildingStorey), None);
        assert_eq!(
            BimObject::classify(&IfcType::Unknown("IFCBEAM".to_string())),
            None
        );
    }

    #[test]
    fn test_tags() {
        let door = object(BimObject::Door, Some("D1")).tags();
        assert_eq!(door.get("indoor").map(String::as_str), Some("door"));
        assert_eq!(door.get("door").map(String::as_str), Some("yes"));
        assert_eq!(door.get("level").map(String::as_str), Some("2"));
        assert!(door.get("name").is_none());

        let room = object(BimObject::Space, Some("Kitchen")).tags();
        assert_eq!(room.get("indoor").map(String::as_str), Some("room"));
        assert_eq!(room.get("name").map(String::as_str), Some("Kitchen"));

        let stair = object(BimObject::Stair, None).tags();
        assert_eq!(stair.get("highway").map(String::as_str), Some("steps"));
    }

    #[test]
    fn test_centroid_skips_closing_point() {
        let c = object(BimObject::Slab, None).centroid();
        assert_eq!(c, Point3D::new(1.0, 1.0, 0.0));
    }
}
