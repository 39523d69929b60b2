// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shape representation resolver
//!
//! Picks the one `IfcShapeRepresentation` of an element the extractor
//! will read, by a fixed identifier priority.

use bim2osm_model::{DecodedEntity, EntityId, EntityResolver};
use serde::Serialize;
use std::fmt;

macro_rules! keyword_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Match a representation keyword; unknown keywords give `None`
            pub fn parse(s: &str) -> Option<Self> {
                $(
                    if s.eq_ignore_ascii_case($text) {
                        return Some($name::$variant);
                    }
                )+
                None
            }

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

keyword_enum! {
    /// `RepresentationIdentifier` of an `IfcShapeRepresentation`
    RepresentationIdentifier {
        Body => "Body",
        Axis => "Axis",
        FootPrint => "FootPrint",
        Box => "Box",
        Annotation => "Annotation",
        Profile => "Profile",
        Surface => "Surface",
        Clearance => "Clearance",
        Reference => "Reference",
        Lighting => "Lighting",
    }
}

keyword_enum! {
    /// `RepresentationType` of an `IfcShapeRepresentation`
    RepresentationType {
        SweptSolid => "SweptSolid",
        AdvancedSweptSolid => "AdvancedSweptSolid",
        Brep => "Brep",
        AdvancedBrep => "AdvancedBrep",
        Csg => "CSG",
        Clipping => "Clipping",
        BoundingBox => "BoundingBox",
        SectionedSpine => "SectionedSpine",
        Curve2D => "Curve2D",
        Curve3D => "Curve3D",
        GeometricSet => "GeometricSet",
        GeometricCurveSet => "GeometricCurveSet",
        SurfaceModel => "SurfaceModel",
        Tessellation => "Tessellation",
        MappedRepresentation => "MappedRepresentation",
        Point => "Point",
        PointCloud => "PointCloud",
        Annotation2D => "Annotation2D",
        Lighting => "Lighting",
    }
}

impl RepresentationIdentifier {
    /// Selection order, most preferred first
    pub const PRIORITY: [RepresentationIdentifier; 4] = [
        RepresentationIdentifier::Body,
        RepresentationIdentifier::FootPrint,
        RepresentationIdentifier::Axis,
        RepresentationIdentifier::Box,
    ];

    /// Position in [`Self::PRIORITY`], `None` when never selected
    pub fn priority(&self) -> Option<usize> {
        Self::PRIORITY.iter().position(|p| p == self)
    }
}

impl RepresentationType {
    /// Whether the outline extractor can read this representation type
    pub fn is_handled(&self) -> bool {
        matches!(
            self,
            RepresentationType::SweptSolid
                | RepresentationType::Clipping
                | RepresentationType::Brep
                | RepresentationType::BoundingBox
                | RepresentationType::Curve2D
                | RepresentationType::GeometricCurveSet
                | RepresentationType::MappedRepresentation
        )
    }
}

/// The representation chosen for one element
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ShapeRepresentationIdentity {
    /// Element owning the representation
    pub root: EntityId,
    /// The `IfcShapeRepresentation`
    pub representation: EntityId,
    pub identifier: RepresentationIdentifier,
    pub kind: RepresentationType,
}

/// Identifier and type of an `IfcShapeRepresentation`, when both are known
pub fn classify_representation(
    rep: &DecodedEntity,
) -> Option<(RepresentationIdentifier, RepresentationType)> {
    // IfcShapeRepresentation(ContextOfItems, RepresentationIdentifier, RepresentationType, Items)
    let identifier = RepresentationIdentifier::parse(rep.get_string(1)?)?;
    let kind = RepresentationType::parse(rep.get_string(2)?)?;
    Some((identifier, kind))
}

/// Resolves the representation used for an element
pub struct ShapeRepresentationResolver;

impl ShapeRepresentationResolver {
    /// Select the representation of `element`
    ///
    /// Follows `Representation` (attribute 6) to the
    /// `IfcProductDefinitionShape` and its `Representations` (attribute 2).
    /// Candidates need a handled type; among those the best identifier wins
    /// and equal identifiers keep file order. Returns `None` when nothing
    /// qualifies.
    pub fn resolve(
        resolver: &dyn EntityResolver,
        element: &DecodedEntity,
    ) -> Option<ShapeRepresentationIdentity> {
        let shape = element.get(6).and_then(|a| resolver.resolve_ref(a))?;
        let candidates = resolver.resolve_ref_list(shape.get(2)?);

        let mut best: Option<(usize, ShapeRepresentationIdentity)> = None;
        for rep in candidates {
            let Some((identifier, kind)) = classify_representation(&rep) else {
                continue;
            };
            let Some(rank) = identifier.priority() else {
                continue;
            };
            if !kind.is_handled() {
                continue;
            }
            if best.as_ref().is_some_and(|(best_rank, _)| *best_rank <= rank) {
                continue;
            }
            best = Some((
                rank,
                ShapeRepresentationIdentity {
                    root: element.id,
                    representation: rep.id,
                    identifier,
                    kind,
                },
            ));
        }

        best.map(|(_, identity)| identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bim2osm_parser::ParsedModel;
    use bim2osm_model::IfcModel;

    fn model(reps: &str, order: &str) -> ParsedModel {
        let content = format!(
            "ISO-10303-21;\nHEADER;\nFILE_SCHEMA(('IFC4'));\nENDSEC;\nDATA;\n\
             #1=IFCWALL('w',$,'Wall',$,$,$,#2,$,$);\n\
             #2=IFCPRODUCTDEFINITIONSHAPE($,$,({}));\n{}\nENDSEC;\nEND-ISO-10303-21;\n",
            order, reps
        );
        ParsedModel::parse(&content).unwrap()
    }

    const REPS: &str = "#10=IFCSHAPEREPRESENTATION($,'Box','BoundingBox',());
#11=IFCSHAPEREPRESENTATION($,'Axis','Curve2D',());
#12=IFCSHAPEREPRESENTATION($,'FootPrint','Curve2D',());
#13=IFCSHAPEREPRESENTATION($,'Body','SweptSolid',());
#14=IFCSHAPEREPRESENTATION($,'Body','Brep',());";

    fn pick(order: &str) -> Option<ShapeRepresentationIdentity> {
        let model = model(REPS, order);
        let resolver = model.resolver();
        let wall = resolver.get(EntityId(1)).unwrap();
        ShapeRepresentationResolver::resolve(resolver, &wall)
    }

    #[test]
    fn test_priority_ignores_file_order() {
        let chosen = pick("#10,#11,#12,#13").unwrap();
        assert_eq!(chosen.identifier, RepresentationIdentifier::Body);
        assert_eq!(chosen.representation, EntityId(13));

        assert_eq!(pick("#11,#12,#10").unwrap().identifier, RepresentationIdentifier::FootPrint);
        assert_eq!(pick("#10,#11").unwrap().identifier, RepresentationIdentifier::Axis);
        assert_eq!(pick("#10").unwrap().identifier, RepresentationIdentifier::Box);
    }

    #[test]
    fn test_same_identifier_keeps_file_order() {
        assert_eq!(pick("#14,#13").unwrap().representation, EntityId(14));
        assert_eq!(pick("#13,#14").unwrap().representation, EntityId(13));
    }

    #[test]
    fn test_unhandled_or_unknown_candidates_are_skipped() {
        let model = model(
            "#10=IFCSHAPEREPRESENTATION($,'Body','Tessellation',());
#11=IFCSHAPEREPRESENTATION($,'Outline','Curve2D',());
#12=IFCSHAPEREPRESENTATION($,'Axis','Polyhedron',());",
            "#10,#11,#12",
        );
        let wall = model.resolver().get(EntityId(1)).unwrap();
        assert!(ShapeRepresentationResolver::resolve(model.resolver(), &wall).is_none());
    }

    #[test]
    fn test_keyword_parsing() {
        assert_eq!(RepresentationType::parse("csg"), Some(RepresentationType::Csg));
        assert_eq!(RepresentationType::Csg.as_str(), "CSG");
        assert_eq!(
            RepresentationIdentifier::parse("footprint"),
            Some(RepresentationIdentifier::FootPrint)
        );
        assert_eq!(RepresentationIdentifier::Annotation.priority(), None);
    }
}
