// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core traits for IFC loading
//!
//! The conversion pipeline only sees a loaded model through these traits, so
//! the STEP backend can be swapped without touching it.

use crate::{EntityResolver, ModelMetadata, Result, SpatialQuery, UnitContext};
use std::sync::Arc;

/// Main parsing interface - entry point for loading IFC content
///
/// # Example
///
/// ```ignore
/// use bim2osm_model::{IfcParser, IfcModel};
///
/// let parser: Box<dyn IfcParser> = get_parser();
/// let model = parser.parse(ifc_content)?;
/// println!("Schema: {:?}", model.metadata().schema());
/// ```
pub trait IfcParser: Send + Sync {
    /// Parse IFC content and return a model
    ///
    /// Fails on any structural problem in the file; a model is only returned
    /// when every entity instance decoded cleanly. A header without a
    /// supported schema is [`crate::ParseError::UnsupportedSchema`].
    fn parse(&self, content: &str) -> Result<Arc<dyn IfcModel>>;
}

/// Read-only access to a loaded IFC model
///
/// The model is thread-safe (`Send + Sync`), but the converter only ever uses
/// it from the thread that loaded it.
pub trait IfcModel: Send + Sync {
    /// Entity lookups and reference resolution
    fn resolver(&self) -> &dyn EntityResolver;

    /// Spatial hierarchy (storeys, containment)
    fn spatial(&self) -> &dyn SpatialQuery;

    /// Length and plane angle units declared by the project
    fn units(&self) -> UnitContext;

    /// File metadata (schema identifiers, originating system, etc.)
    fn metadata(&self) -> &ModelMetadata;
}
