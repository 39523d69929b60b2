// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! BIM2OSM Parser - STEP (ISO 10303-21) loader for IFC files
//!
//! This crate loads an IFC file into an arena of decoded entities and
//! implements the traits defined in `bim2osm-model`.
//!
//! # Features
//!
//! - **Tokenization** using `nom` combinators
//! - **Fast scanning** using `memchr`
//! - **Strict loading** - every entity is decoded up front, and stray
//!   content between statements (such as block comments) fails the load
//!
//! # Example
//!
//! ```ignore
//! use bim2osm_parser::StepParser;
//! use bim2osm_model::{IfcParser, IfcType};
//!
//! let parser = StepParser::new();
//! let model = parser.parse(ifc_content)?;
//!
//! let sites = model.resolver().entities_by_type(&IfcType::IfcSite);
//! println!("Found {} sites", sites.len());
//! ```

mod model;
mod resolver;
mod scanner;
mod spatial;
mod tokenizer;
mod units;

pub use model::ParsedModel;
pub use resolver::ResolverImpl;
pub use scanner::{parse_header, EntityScanner, HeaderInfo, RawEntity};
pub use spatial::SpatialQueryImpl;
pub use tokenizer::{parse_entity, parse_statement, Token, COMPLEX_INSTANCE};
pub use units::extract_unit_context;

use bim2osm_model::{IfcModel, IfcParser, Result};
use std::sync::Arc;

/// STEP/IFC parser implementing the `IfcParser` trait
///
/// Only files whose `FILE_SCHEMA` names a supported IFC release are loaded.
#[derive(Clone, Copy, Debug, Default)]
pub struct StepParser;

impl StepParser {
    /// Create a new parser
    pub fn new() -> Self {
        Self
    }
}

impl IfcParser for StepParser {
    fn parse(&self, content: &str) -> Result<Arc<dyn IfcModel>> {
        ParsedModel::parse_supported(content).map(|m| Arc::new(m) as Arc<dyn IfcModel>)
    }
}

/// Quick parse function for simple use cases
pub fn parse(content: &str) -> Result<Arc<dyn IfcModel>> {
    StepParser::new().parse(content)
}
