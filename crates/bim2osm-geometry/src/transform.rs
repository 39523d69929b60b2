// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Rigid (and uniformly scaled) placement transforms

use crate::error::Result;
use crate::{Matrix3D, Point3D, Vector3D};

/// Linear part followed by a translation: `p' = R * p + t`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform3D {
    pub rotation: Matrix3D,
    pub translation: Vector3D,
}

impl Transform3D {
    pub fn new(rotation: Matrix3D, translation: Vector3D) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    pub fn identity() -> Self {
        Self::new(Matrix3D::identity(), Vector3D::zeros())
    }

    pub fn from_translation(translation: Vector3D) -> Self {
        Self::new(Matrix3D::identity(), translation)
    }

    pub fn from_rotation(rotation: Matrix3D) -> Self {
        Self::new(rotation, Vector3D::zeros())
    }

    /// Composition `self ∘ child`: `child` is applied first
    ///
    /// With `self` the placement of a parent and `child` a placement
    /// relative to it, the result maps child-local points to the
    /// parent's frame.
    pub fn then(&self, child: &Transform3D) -> Transform3D {
        Transform3D {
            rotation: self.rotation.mul_matrix(&child.rotation),
            translation: &self.rotation * child.translation + self.translation,
        }
    }

    /// Rotate, then translate, in place
    #[inline]
    pub fn apply(&self, p: &mut Point3D) {
        self.rotation.transform_point(p);
        p.coords += self.translation;
    }

    /// Transformed copy of `p`
    pub fn applied(&self, p: &Point3D) -> Point3D {
        let mut out = *p;
        self.apply(&mut out);
        out
    }

    /// Inverse transform; fails when the linear part is singular
    pub fn inverse(&self) -> Result<Transform3D> {
        let rotation = self.rotation.inverse()?;
        let translation = -(&rotation * self.translation);
        Ok(Transform3D {
            rotation,
            translation,
        })
    }

    /// Scale the linear part and the translation by `k`
    pub fn scaled(&self, k: f64) -> Transform3D {
        let mut rotation = self.rotation;
        rotation.multiply(k);
        Transform3D {
            rotation,
            translation: self.translation * k,
        }
    }
}

impl Default for Transform3D {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ParserMath;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_apply_rotates_then_translates() {
        let t = Transform3D::new(
            ParserMath::rotation_matrix_z(FRAC_PI_2),
            Vector3D::new(10.0, 0.0, 0.0),
        );
        let p = t.applied(&Point3D::new(1.0, 0.0, 0.0));
        assert_abs_diff_eq!(p, Point3D::new(10.0, 1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_then_is_parent_after_child() {
        let parent = Transform3D::new(
            ParserMath::rotation_matrix_z(FRAC_PI_2),
            Vector3D::new(5.0, 5.0, 0.0),
        );
        let child = Transform3D::from_translation(Vector3D::new(2.0, 0.0, 0.0));
        let composed = parent.then(&child);

        let p = Point3D::new(1.0, 0.0, 0.0);
        let step = parent.applied(&child.applied(&p));
        assert_abs_diff_eq!(composed.applied(&p), step, epsilon = 1e-12);
        assert_abs_diff_eq!(step, Point3D::new(5.0, 8.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_inverse_round_trips_point() {
        let t = Transform3D::new(
            ParserMath::rotation_matrix_x(0.3).mul_matrix(&ParserMath::rotation_matrix_z(1.1)),
            Vector3D::new(-3.0, 7.5, 2.0),
        );
        let p = Point3D::new(4.0, -2.0, 9.0);
        let back = t.inverse().unwrap().applied(&t.applied(&p));
        assert_abs_diff_eq!(back, p, epsilon = 1e-9);
    }

    #[test]
    fn test_inverse_of_flattened_basis_fails() {
        let mut rotation = Matrix3D::identity();
        rotation.multiply(0.0);
        assert!(Transform3D::from_rotation(rotation).inverse().is_err());
    }

    #[test]
    fn test_scaled() {
        let t = Transform3D::from_translation(Vector3D::new(1.0, 2.0, 3.0)).scaled(2.0);
        let p = t.applied(&Point3D::new(1.0, 1.0, 1.0));
        assert_abs_diff_eq!(p, Point3D::new(4.0, 6.0, 8.0), epsilon = 1e-12);
    }
}
