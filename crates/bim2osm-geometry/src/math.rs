// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Rotation builders and basis construction

use crate::error::{GeometryError, Result};
use crate::{Matrix3D, Vector3D};

/// Shortest accepted direction vector
const MIN_DIRECTION_LENGTH: f64 = 1e-12;

/// Stateless helpers for building rotation matrices
pub struct ParserMath;

impl ParserMath {
    /// Rotation about +X by `angle` radians
    pub fn rotation_matrix_x(angle: f64) -> Matrix3D {
        let (s, c) = angle.sin_cos();
        Matrix3D::new(1.0, 0.0, 0.0, 0.0, c, -s, 0.0, s, c)
    }

    /// Rotation about +Y by `angle` radians
    pub fn rotation_matrix_y(angle: f64) -> Matrix3D {
        let (s, c) = angle.sin_cos();
        Matrix3D::new(c, 0.0, s, 0.0, 1.0, 0.0, -s, 0.0, c)
    }

    /// Rotation about +Z by `angle` radians
    pub fn rotation_matrix_z(angle: f64) -> Matrix3D {
        let (s, c) = angle.sin_cos();
        Matrix3D::new(c, -s, 0.0, s, c, 0.0, 0.0, 0.0, 1.0)
    }

    /// Right-handed orthonormal basis of an axis placement
    ///
    /// `axis` is the local Z direction (default +Z) and `ref_direction`
    /// the approximate local X direction (default +X). The X axis is the
    /// projection of `ref_direction` onto the plane normal to `axis`. The
    /// result has the basis vectors as columns.
    pub fn basis_from_axes(
        axis: Option<Vector3D>,
        ref_direction: Option<Vector3D>,
    ) -> Result<Matrix3D> {
        let z = match axis {
            Some(a) => normalized(a, "axis")?,
            None => Vector3D::z(),
        };

        let x = match ref_direction {
            Some(r) => {
                let r = normalized(r, "reference direction")?;
                normalized(r - z * r.dot(&z), "reference direction parallel to axis")?
            }
            None => {
                let candidate = Vector3D::x();
                let projected = candidate - z * candidate.dot(&z);
                if projected.norm() > MIN_DIRECTION_LENGTH {
                    projected.normalize()
                } else {
                    let fallback = Vector3D::y();
                    (fallback - z * fallback.dot(&z)).normalize()
                }
            }
        };

        let y = z.cross(&x);
        Ok(Matrix3D::from_columns(&x, &y, &z))
    }

    /// Counter-clockwise angle from +Y to the given plan direction
    ///
    /// Rotating by this angle about +Z turns `direction` onto +Y.
    pub fn angle_to_north(direction_x: f64, direction_y: f64) -> f64 {
        direction_x.atan2(direction_y)
    }

    #[inline]
    pub fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() <= eps
    }
}

fn normalized(v: Vector3D, what: &str) -> Result<Vector3D> {
    let len = v.norm();
    if len < MIN_DIRECTION_LENGTH {
        return Err(GeometryError::degenerate(format!("zero-length {}", what)));
    }
    Ok(v / len)
}
