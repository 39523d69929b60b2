// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the geometry kernel

use thiserror::Error;

/// Geometry kernel result type
pub type Result<T> = std::result::Result<T, GeometryError>;

/// Geometry kernel errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Matrix has no inverse
    #[error("Singular matrix (det = {det:e})")]
    SingularMatrix { det: f64 },

    /// Input cannot span the requested construct (zero-length axis, parallel axes, ...)
    #[error("Degenerate geometry: {0}")]
    Degenerate(String),
}

impl GeometryError {
    /// Create a degenerate geometry error
    pub fn degenerate(msg: impl Into<String>) -> Self {
        GeometryError::Degenerate(msg.into())
    }
}
