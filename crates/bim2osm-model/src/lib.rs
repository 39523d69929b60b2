// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! BIM2OSM Model - Trait definitions and shared types for the IFC entity graph
//!
//! This crate provides the abstractions the conversion pipeline uses to read
//! an IFC (Industry Foundation Classes) file, independently of the STEP
//! backend that loaded it.
//!
//! # Architecture
//!
//! - [`IfcParser`] - Entry point for loading IFC content
//! - [`IfcModel`] - Read-only access to a loaded model
//! - [`EntityResolver`] - Entity lookup and reference resolution
//! - [`SpatialQuery`] - Storeys and element containment
//! - [`UnitContext`] - Length / plane angle unit catalog
//!
//! # Example
//!
//! ```ignore
//! use bim2osm_model::{IfcParser, IfcModel, EntityId};
//!
//! let model = parser.parse(ifc_content)?;
//! if let Some(entity) = model.resolver().get(EntityId(123)) {
//!     println!("Entity type: {}", entity.ifc_type);
//! }
//! ```

pub mod error;
pub mod resolver;
pub mod spatial;
pub mod traits;
pub mod types;
pub mod units;

// Re-export all public types
pub use error::*;
pub use resolver::*;
pub use spatial::*;
pub use traits::*;
pub use types::*;
pub use units::*;
