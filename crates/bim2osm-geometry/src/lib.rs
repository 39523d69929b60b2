// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # BIM2OSM Geometry Kernel
//!
//! Small linear-algebra layer used to move IFC placement coordinates into
//! the map working frame.
//!
//! ## Overview
//!
//! - [`Matrix3D`]: 3x3 matrix with in-place transform, scale and inversion
//! - [`ParserMath`]: rotation builders and axis-placement bases
//! - [`Transform3D`]: rotation followed by translation, composable
//!
//! Vectors and points are plain `nalgebra` types.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use bim2osm_geometry::{ParserMath, Point3D, Transform3D, Vector3D};
//!
//! let storey = Transform3D::from_translation(Vector3D::new(0.0, 0.0, 3.0));
//! let wall = Transform3D::new(ParserMath::rotation_matrix_z(0.5), Vector3D::new(2.0, 1.0, 0.0));
//!
//! let mut p = Point3D::new(1.0, 0.0, 0.0);
//! storey.then(&wall).apply(&mut p);
//! ```

pub mod error;
pub mod math;
pub mod matrix;
pub mod transform;

/// 3-component vector
pub type Vector3D = nalgebra::Vector3<f64>;
/// 3-component point
pub type Point3D = nalgebra::Point3<f64>;

pub use error::{GeometryError, Result};
pub use math::ParserMath;
pub use matrix::{Matrix3D, SINGULAR_EPSILON};
pub use transform::Transform3D;
