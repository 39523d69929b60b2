// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # BIM2OSM
//!
//! Converts IFC building models into OSM indoor-mapping primitives.
//!
//! ## Pipeline
//!
//! - **Input optimizer**: sanitized temporary copy of the source file
//! - **Loader**: strict STEP graph from `bim2osm-parser`
//! - **Representation resolver**: one shape representation per element
//! - **Extractor**: flat outline per element, routed by item type
//! - **Placement**: `IfcLocalPlacement` chains into the site frame, x east, y north
//! - **Primitives**: projected nodes and ways tagged per element category
//! - **Output optimizer**: merged duplicates, no degenerate ways
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use bim2osm::{BimToOsmParser, ConverterConfig};
//!
//! let mut parser = BimToOsmParser::new(ConverterConfig::default());
//! if parser.parse("building.ifc") {
//!     let xml = parser.primitives().unwrap().to_osm_xml()?;
//!     std::fs::write("building.osm", xml)?;
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod extract;
pub mod input;
pub mod optimize;
pub mod parser;
pub mod placement;
pub mod primitives;
pub mod representation;
pub mod sink;

pub use catalog::{BimObject, PreparedBimObject3D, Shape};
pub use config::{ConverterConfig, GeoReference};
pub use error::{ConvertError, Diagnostic, DiagnosticKind, Result};
pub use extract::{Outline, OutlineProcessor, OutlineRouter};
pub use input::{strip_block_comments, InputOptimizer, OptimizedInput};
pub use optimize::OutputOptimizer;
pub use parser::{BimToOsmParser, ConversionOutput, FailureReason, ParserState};
pub use placement::{PlacementResolver, WorkingFrame};
pub use primitives::{Node, PrimitiveId, PrimitiveSet, Tags, Way};
pub use representation::{
    RepresentationIdentifier, RepresentationType, ShapeRepresentationIdentity,
    ShapeRepresentationResolver,
};
pub use sink::{import_file, LayerSink, OsmFileSink};
