// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Conversion errors and per-element diagnostics

use bim2osm_geometry::GeometryError;
use bim2osm_model::{EntityId, ParseError};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Result type alias for conversion operations
pub type Result<T> = std::result::Result<T, ConvertError>;

/// Errors raised by the conversion pipeline
///
/// `UnsupportedSchema`, `MissingRootElement`, `Io`, `Load` and `Config`
/// abort a conversion. `MalformedGeometry` and `SingularMatrix` only
/// drop the element they were raised for.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Unsupported IFC schema: {0}")]
    UnsupportedSchema(String),

    #[error("No IfcSite found to anchor the model")]
    MissingRootElement,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to load IFC file: {0}")]
    Load(#[from] ParseError),

    #[error("Malformed geometry at {entity}: {message}")]
    MalformedGeometry { entity: EntityId, message: String },

    #[error("Singular placement basis at {entity}")]
    SingularMatrix { entity: EntityId },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to write OSM XML: {0}")]
    Xml(String),
}

impl ConvertError {
    /// Create a malformed geometry error
    pub fn malformed(entity: EntityId, message: impl Into<String>) -> Self {
        ConvertError::MalformedGeometry {
            entity,
            message: message.into(),
        }
    }

    /// Attach an entity to a geometry kernel error
    pub fn from_geometry(entity: EntityId, err: GeometryError) -> Self {
        match err {
            GeometryError::SingularMatrix { .. } => ConvertError::SingularMatrix { entity },
            GeometryError::Degenerate(message) => ConvertError::MalformedGeometry { entity, message },
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        ConvertError::Config(message.into())
    }

    pub(crate) fn xml(err: impl fmt::Display) -> Self {
        ConvertError::Xml(err.to_string())
    }

    /// Diagnostic kind for per-element errors, `None` for fatal ones
    pub fn diagnostic_kind(&self) -> Option<DiagnosticKind> {
        match self {
            ConvertError::MalformedGeometry { .. } => Some(DiagnosticKind::MalformedGeometry),
            ConvertError::SingularMatrix { .. } => Some(DiagnosticKind::SingularMatrix),
            _ => None,
        }
    }
}

/// Category of a non-fatal problem
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticKind {
    MalformedGeometry,
    SingularMatrix,
    /// Element has no representation the extractor handles
    NoUsableRepresentation,
    /// Site has no reference latitude/longitude
    MissingGeoReference,
    /// Site placement could not be inverted
    SingularSitePlacement,
}

/// Non-fatal problem recorded during a conversion
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Diagnostic {
    pub entity: Option<EntityId>,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn new(entity: Option<EntityId>, kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            entity,
            kind,
            message: message.into(),
        }
    }

    /// Diagnostic for a per-element error; fatal errors yield `None`
    pub fn from_error(entity: EntityId, err: &ConvertError) -> Option<Self> {
        let kind = err.diagnostic_kind()?;
        Some(Self::new(Some(entity), kind, err.to_string()))
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.entity {
            Some(id) => write!(f, "{:?} at {}: {}", self.kind, id, self.message),
            None => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_error_mapping() {
        let err = ConvertError::from_geometry(EntityId(7), GeometryError::SingularMatrix { det: 0.0 });
        assert!(matches!(err, ConvertError::SingularMatrix { entity: EntityId(7) }));
        assert_eq!(err.diagnostic_kind(), Some(DiagnosticKind::SingularMatrix));

        let err = ConvertError::from_geometry(EntityId(7), GeometryError::degenerate("zero axis"));
        assert_eq!(err.to_string(), "Malformed geometry at #7: zero axis");
    }

    #[test]
    fn test_fatal_errors_have_no_diagnostic() {
        assert!(Diagnostic::from_error(EntityId(1), &ConvertError::MissingRootElement).is_none());
        let diag = Diagnostic::from_error(EntityId(3), &ConvertError::malformed(EntityId(3), "x"))
            .unwrap();
        assert_eq!(diag.kind, DiagnosticKind::MalformedGeometry);
        assert_eq!(diag.entity, Some(EntityId(3)));
    }
}
