// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core types for the IFC entity-instance graph
//!
//! Entities live in an arena owned by the loader and are addressed by
//! [`EntityId`]. Every cross-entity link inside an [`AttributeValue`] is an id,
//! never an owning pointer, so cyclic references in the file are harmless.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Type-safe entity identifier
///
/// Wraps the raw IFC entity ID (e.g., #123 becomes EntityId(123))
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize, Default)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        EntityId(id)
    }
}

impl From<EntityId> for u32 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

/// Generates [`IfcType`] together with its upper-case STEP name table.
macro_rules! ifc_types {
    ($( $(#[$doc:meta])* $variant:ident => $name:literal, )*) => {
        /// IFC entity types the converter looks at
        ///
        /// Anything else is kept as [`IfcType::Unknown`] with its original name,
        /// so the loader never rejects a file for containing unfamiliar entities.
        #[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
        pub enum IfcType {
            $( $(#[$doc])* $variant, )*
            /// Unknown type - stores the original type name string
            Unknown(String),
        }

        impl IfcType {
            /// Parse a STEP type name (case-insensitive)
            pub fn parse(s: &str) -> Self {
                match s.to_ascii_uppercase().as_str() {
                    $( $name => IfcType::$variant, )*
                    _ => IfcType::Unknown(s.to_string()),
                }
            }

            /// Upper-case STEP name of the type
            pub fn name(&self) -> &str {
                match self {
                    $( IfcType::$variant => $name, )*
                    IfcType::Unknown(s) => s,
                }
            }
        }
    };
}

ifc_types! {
    // Spatial structure
    IfcProject => "IFCPROJECT",
    IfcSite => "IFCSITE",
    IfcBuilding => "IFCBUILDING",
    IfcBuildingStorey => "IFCBUILDINGSTOREY",
    IfcSpace => "IFCSPACE",

    // Building elements
    IfcWall => "IFCWALL",
    IfcWallStandardCase => "IFCWALLSTANDARDCASE",
    IfcCurtainWall => "IFCCURTAINWALL",
    IfcSlab => "IFCSLAB",
    IfcColumn => "IFCCOLUMN",
    IfcDoor => "IFCDOOR",
    IfcWindow => "IFCWINDOW",
    IfcStair => "IFCSTAIR",
    IfcStairFlight => "IFCSTAIRFLIGHT",

    // Representation items
    IfcExtrudedAreaSolid => "IFCEXTRUDEDAREASOLID",
    IfcFacetedBrep => "IFCFACETEDBREP",
    IfcBooleanResult => "IFCBOOLEANRESULT",
    IfcBooleanClippingResult => "IFCBOOLEANCLIPPINGRESULT",
    IfcMappedItem => "IFCMAPPEDITEM",
    IfcRepresentationMap => "IFCREPRESENTATIONMAP",
    IfcBoundingBox => "IFCBOUNDINGBOX",

    // Profiles
    IfcRectangleProfileDef => "IFCRECTANGLEPROFILEDEF",
    IfcCircleProfileDef => "IFCCIRCLEPROFILEDEF",
    IfcArbitraryClosedProfileDef => "IFCARBITRARYCLOSEDPROFILEDEF",

    // Curves
    IfcPolyline => "IFCPOLYLINE",
    IfcTrimmedCurve => "IFCTRIMMEDCURVE",
    IfcCircle => "IFCCIRCLE",

    // Points, directions, placements
    IfcCartesianPoint => "IFCCARTESIANPOINT",
    IfcDirection => "IFCDIRECTION",
    IfcAxis2Placement2D => "IFCAXIS2PLACEMENT2D",
    IfcAxis2Placement3D => "IFCAXIS2PLACEMENT3D",
    IfcLocalPlacement => "IFCLOCALPLACEMENT",
    IfcCartesianTransformationOperator3D => "IFCCARTESIANTRANSFORMATIONOPERATOR3D",
    IfcCartesianTransformationOperator3DnonUniform => "IFCCARTESIANTRANSFORMATIONOPERATOR3DNONUNIFORM",

    // Representations and contexts
    IfcShapeRepresentation => "IFCSHAPEREPRESENTATION",
    IfcProductDefinitionShape => "IFCPRODUCTDEFINITIONSHAPE",
    IfcGeometricRepresentationContext => "IFCGEOMETRICREPRESENTATIONCONTEXT",
    IfcGeometricRepresentationSubContext => "IFCGEOMETRICREPRESENTATIONSUBCONTEXT",

    // Topology
    IfcClosedShell => "IFCCLOSEDSHELL",
    IfcFace => "IFCFACE",
    IfcFaceBound => "IFCFACEBOUND",
    IfcFaceOuterBound => "IFCFACEOUTERBOUND",
    IfcPolyLoop => "IFCPOLYLOOP",

    // Relationships
    IfcRelContainedInSpatialStructure => "IFCRELCONTAINEDINSPATIALSTRUCTURE",
    IfcRelAggregates => "IFCRELAGGREGATES",

    // Units
    IfcUnitAssignment => "IFCUNITASSIGNMENT",
    IfcSIUnit => "IFCSIUNIT",
    IfcConversionBasedUnit => "IFCCONVERSIONBASEDUNIT",
    IfcMeasureWithUnit => "IFCMEASUREWITHUNIT",
}

impl FromStr for IfcType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl IfcType {
    /// Check if this type is a spatial structure element
    pub fn is_spatial(&self) -> bool {
        matches!(
            self,
            IfcType::IfcProject
                | IfcType::IfcSite
                | IfcType::IfcBuilding
                | IfcType::IfcBuildingStorey
                | IfcType::IfcSpace
        )
    }
}

impl Default for IfcType {
    fn default() -> Self {
        IfcType::Unknown(String::new())
    }
}

impl fmt::Display for IfcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Decoded attribute value
///
/// Represents any value that can appear in an IFC entity's attribute list.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum AttributeValue {
    /// Null value ($)
    #[default]
    Null,
    /// Derived value (*)
    Derived,
    /// Entity reference (#123)
    EntityRef(EntityId),
    /// Integer value
    Integer(i64),
    /// Floating point value
    Float(f64),
    /// String value, with `''` escapes already collapsed
    String(String),
    /// Enumeration value (.VALUE.)
    Enum(String),
    /// List of values
    List(Vec<AttributeValue>),
    /// Typed value like IFCPARAMETERVALUE(0.5)
    TypedValue(String, Vec<AttributeValue>),
}

impl AttributeValue {
    /// Try to get as entity reference
    pub fn as_entity_ref(&self) -> Option<EntityId> {
        match self {
            AttributeValue::EntityRef(id) => Some(*id),
            _ => None,
        }
    }

    /// Try to get as string
    pub fn as_string(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            AttributeValue::TypedValue(_, args) => args.first().and_then(|a| a.as_string()),
            _ => None,
        }
    }

    /// Try to get as float; integers and single-argument typed values widen
    pub fn as_float(&self) -> Option<f64> {
        match self {
            AttributeValue::Float(f) => Some(*f),
            AttributeValue::Integer(i) => Some(*i as f64),
            AttributeValue::TypedValue(_, args) => args.first().and_then(|a| a.as_float()),
            _ => None,
        }
    }

    /// Try to get as integer
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            AttributeValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get as enum string
    pub fn as_enum(&self) -> Option<&str> {
        match self {
            AttributeValue::Enum(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as list
    pub fn as_list(&self) -> Option<&[AttributeValue]> {
        match self {
            AttributeValue::List(list) => Some(list),
            _ => None,
        }
    }

    /// Check if this is a null value
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }
}

/// Decoded IFC entity
///
/// One node of the entity-instance graph: id, type and ordered attributes.
#[derive(Clone, Debug)]
pub struct DecodedEntity {
    /// Entity ID
    pub id: EntityId,
    /// Entity type
    pub ifc_type: IfcType,
    /// Attribute values in order
    pub attributes: Vec<AttributeValue>,
}

impl DecodedEntity {
    /// Get attribute at index
    pub fn get(&self, index: usize) -> Option<&AttributeValue> {
        self.attributes.get(index)
    }

    /// Get entity reference at index
    pub fn get_ref(&self, index: usize) -> Option<EntityId> {
        self.get(index).and_then(|v| v.as_entity_ref())
    }

    /// Get string at index
    pub fn get_string(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(|v| v.as_string())
    }

    /// Get float at index
    pub fn get_float(&self, index: usize) -> Option<f64> {
        self.get(index).and_then(|v| v.as_float())
    }

    /// Get list at index
    pub fn get_list(&self, index: usize) -> Option<&[AttributeValue]> {
        self.get(index).and_then(|v| v.as_list())
    }

    /// Get enum string at index
    pub fn get_enum(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(|v| v.as_enum())
    }

    /// Get list of entity references at index
    pub fn get_refs(&self, index: usize) -> Option<Vec<EntityId>> {
        self.get_list(index)
            .map(|list| list.iter().filter_map(|v| v.as_entity_ref()).collect())
    }

    /// Get a list of numbers at index (coordinates, direction ratios)
    pub fn get_floats(&self, index: usize) -> Option<Vec<f64>> {
        self.get_list(index)?
            .iter()
            .map(|v| v.as_float())
            .collect()
    }
}

/// IFC schema versions the converter accepts
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IfcSchema {
    Ifc2x3,
    Ifc4,
    Ifc4x1,
    Ifc4x2,
    Ifc4x3,
}

impl IfcSchema {
    /// Map a `FILE_SCHEMA` identifier to a supported schema
    ///
    /// Addenda and technical corrigenda (`IFC2X3_TC1`, `IFC4_ADD2`,
    /// `IFC4X3_ADD2`) map to their base schema. Anything else is `None`.
    pub fn from_identifier(identifier: &str) -> Option<Self> {
        let id = identifier.trim().to_ascii_uppercase();
        let base = id.split('_').next().unwrap_or_default();
        match base {
            "IFC2X3" => Some(IfcSchema::Ifc2x3),
            "IFC4" => Some(IfcSchema::Ifc4),
            "IFC4X1" => Some(IfcSchema::Ifc4x1),
            "IFC4X2" => Some(IfcSchema::Ifc4x2),
            "IFC4X3" => Some(IfcSchema::Ifc4x3),
            _ => None,
        }
    }
}

impl fmt::Display for IfcSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IfcSchema::Ifc2x3 => "IFC2X3",
            IfcSchema::Ifc4 => "IFC4",
            IfcSchema::Ifc4x1 => "IFC4X1",
            IfcSchema::Ifc4x2 => "IFC4X2",
            IfcSchema::Ifc4x3 => "IFC4X3",
        };
        f.write_str(name)
    }
}

/// Model metadata extracted from IFC header
#[derive(Clone, Debug, Default)]
pub struct ModelMetadata {
    /// Raw schema identifiers from FILE_SCHEMA, in file order
    pub schema_identifiers: Vec<String>,
    /// Originating system (CAD application)
    pub originating_system: Option<String>,
    /// Preprocessor version
    pub preprocessor_version: Option<String>,
    /// File name from header
    pub file_name: Option<String>,
    /// File description
    pub file_description: Option<String>,
    /// Author
    pub author: Option<String>,
    /// Organization
    pub organization: Option<String>,
    /// Timestamp
    pub timestamp: Option<String>,
}

impl ModelMetadata {
    /// First supported schema named in the header, if any
    pub fn schema(&self) -> Option<IfcSchema> {
        self.schema_identifiers
            .iter()
            .find_map(|id| IfcSchema::from_identifier(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ifc_type_round_trips_name() {
        assert_eq!(IfcType::parse("IfcWall"), IfcType::IfcWall);
        assert_eq!(IfcType::IfcWallStandardCase.name(), "IFCWALLSTANDARDCASE");
        assert_eq!(
            IfcType::parse("IFCFLOWTERMINAL"),
            IfcType::Unknown("IFCFLOWTERMINAL".to_string())
        );
    }

    #[test]
    fn test_schema_identifiers() {
        assert_eq!(IfcSchema::from_identifier("IFC2X3"), Some(IfcSchema::Ifc2x3));
        assert_eq!(IfcSchema::from_identifier("ifc4"), Some(IfcSchema::Ifc4));
        assert_eq!(IfcSchema::from_identifier("IFC4X3_ADD2"), Some(IfcSchema::Ifc4x3));
        assert_eq!(IfcSchema::from_identifier("IFC2X2_FINAL"), None);
        assert_eq!(IfcSchema::from_identifier("CONFIG_CONTROL_DESIGN"), None);
    }

    #[test]
    fn test_get_floats() {
        let entity = DecodedEntity {
            id: EntityId(1),
            ifc_type: IfcType::IfcCartesianPoint,
            attributes: vec![AttributeValue::List(vec![
                AttributeValue::Float(1.5),
                AttributeValue::Integer(2),
            ])],
        };
        assert_eq!(entity.get_floats(0), Some(vec![1.5, 2.0]));
    }
}
