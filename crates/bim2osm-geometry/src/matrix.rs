// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 3x3 matrix used for placement bases and rotations

use crate::error::{GeometryError, Result};
use crate::{Point3D, Vector3D};
use nalgebra::Matrix3;
use std::ops::Mul;

/// Determinant below which a matrix is treated as singular
pub const SINGULAR_EPSILON: f64 = 1e-9;

/// Real 3x3 matrix, row-major entries m00..m22
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Matrix3D(Matrix3<f64>);

impl Matrix3D {
    /// Build from nine entries in row-major order
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        m00: f64,
        m01: f64,
        m02: f64,
        m10: f64,
        m11: f64,
        m12: f64,
        m20: f64,
        m21: f64,
        m22: f64,
    ) -> Self {
        Self(Matrix3::new(m00, m01, m02, m10, m11, m12, m20, m21, m22))
    }

    pub fn from_rows(rows: [[f64; 3]; 3]) -> Self {
        let [r0, r1, r2] = rows;
        Self::new(
            r0[0], r0[1], r0[2], r1[0], r1[1], r1[2], r2[0], r2[1], r2[2],
        )
    }

    pub fn identity() -> Self {
        Self(Matrix3::identity())
    }

    /// Matrix whose columns are the given basis vectors
    pub fn from_columns(x: &Vector3D, y: &Vector3D, z: &Vector3D) -> Self {
        Self(Matrix3::from_columns(&[*x, *y, *z]))
    }

    /// Entry at `row`, `col`
    ///
    /// # Panics
    ///
    /// Panics if `row` or `col` is greater than 2.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.0[(row, col)]
    }

    /// Underlying nalgebra matrix
    pub fn as_nalgebra(&self) -> &Matrix3<f64> {
        &self.0
    }

    /// Scale all nine entries by `k`
    pub fn multiply(&mut self, k: f64) {
        self.0 *= k;
    }

    /// `v <- M * v`
    #[inline]
    pub fn transform(&self, v: &mut Vector3D) {
        *v = self.0 * *v;
    }

    /// `p <- M * p`
    #[inline]
    pub fn transform_point(&self, p: &mut Point3D) {
        p.coords = self.0 * p.coords;
    }

    /// Determinant by cofactor expansion along the first row
    pub fn det(&self) -> f64 {
        let m = &self.0;
        m[(0, 0)] * (m[(1, 1)] * m[(2, 2)] - m[(1, 2)] * m[(2, 1)])
            - m[(0, 1)] * (m[(1, 0)] * m[(2, 2)] - m[(1, 2)] * m[(2, 0)])
            + m[(0, 2)] * (m[(1, 0)] * m[(2, 1)] - m[(1, 1)] * m[(2, 0)])
    }

    /// Invert in place via adjugate / determinant
    ///
    /// Leaves the matrix unchanged and returns
    /// [`GeometryError::SingularMatrix`] when `|det| < 1e-9`.
    pub fn invert(&mut self) -> Result<()> {
        let det = self.det();
        if det.abs() < SINGULAR_EPSILON {
            return Err(GeometryError::SingularMatrix { det });
        }

        let m = &self.0;
        let cofactor = |r0: usize, r1: usize, c0: usize, c1: usize| {
            m[(r0, c0)] * m[(r1, c1)] - m[(r0, c1)] * m[(r1, c0)]
        };

        // adj(M)[i][j] = C[j][i]
        let adjugate = Matrix3::new(
            cofactor(1, 2, 1, 2),
            -cofactor(0, 2, 1, 2),
            cofactor(0, 1, 1, 2),
            -cofactor(1, 2, 0, 2),
            cofactor(0, 2, 0, 2),
            -cofactor(0, 1, 0, 2),
            cofactor(1, 2, 0, 1),
            -cofactor(0, 2, 0, 1),
            cofactor(0, 1, 0, 1),
        );

        self.0 = adjugate / det;
        Ok(())
    }

    /// Inverse as a new matrix
    pub fn inverse(&self) -> Result<Self> {
        let mut inv = *self;
        inv.invert()?;
        Ok(inv)
    }

    /// Composition `self * other` (apply `other` first)
    pub fn mul_matrix(&self, other: &Matrix3D) -> Matrix3D {
        Self(self.0 * other.0)
    }

    pub fn transpose(&self) -> Matrix3D {
        Self(self.0.transpose())
    }

    pub fn approx_eq(&self, other: &Matrix3D, eps: f64) -> bool {
        self.0
            .iter()
            .zip(other.0.iter())
            .all(|(a, b)| (a - b).abs() <= eps)
    }
}

impl Default for Matrix3D {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mul for Matrix3D {
    type Output = Matrix3D;

    fn mul(self, rhs: Matrix3D) -> Matrix3D {
        self.mul_matrix(&rhs)
    }
}

impl Mul<Vector3D> for &Matrix3D {
    type Output = Vector3D;

    fn mul(self, rhs: Vector3D) -> Vector3D {
        self.0 * rhs
    }
}

impl From<Matrix3<f64>> for Matrix3D {
    fn from(m: Matrix3<f64>) -> Self {
        Self(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const EPS: f64 = 0.005;

    fn sample() -> Matrix3D {
        Matrix3D::from_rows([[1.0, 2.0, 0.0], [2.0, 4.0, 1.0], [2.0, 1.0, 0.0]])
    }

    #[test]
    fn test_det() {
        assert_abs_diff_eq!(sample().det(), 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(Matrix3D::identity().det(), 1.0);
    }

    #[test]
    fn test_invert() {
        let mut m = sample();
        m.invert().unwrap();
        let expected = Matrix3D::from_rows([
            [-1.0 / 3.0, 0.0, 2.0 / 3.0],
            [2.0 / 3.0, 0.0, -1.0 / 3.0],
            [-2.0, 1.0, 0.0],
        ]);
        assert!(m.approx_eq(&expected, EPS), "{:?}", m);
        assert!(m.mul_matrix(&sample()).approx_eq(&Matrix3D::identity(), 1e-9));
    }

    #[test]
    fn test_invert_singular_leaves_matrix_unchanged() {
        let mut m = Matrix3D::from_rows([[1.0, 2.0, 3.0], [2.0, 4.0, 6.0], [0.0, 1.0, 1.0]]);
        let before = m;
        match m.invert() {
            Err(GeometryError::SingularMatrix { det }) => assert!(det.abs() < SINGULAR_EPSILON),
            other => panic!("expected singular matrix, got {:?}", other),
        }
        assert_eq!(m, before);
    }

    #[test]
    fn test_transform_vector() {
        let m = Matrix3D::from_rows([[1.2, 5.4, 7.1], [3.0, 4.2, 9.2], [10.1, 6.23, 9.0]]);
        let mut v = Vector3D::new(2.1, 3.1, 9.4);
        m.transform(&mut v);
        assert_abs_diff_eq!(v.x, 86.0, epsilon = EPS);
        assert_abs_diff_eq!(v.y, 105.8, epsilon = EPS);
        assert_abs_diff_eq!(v.z, 125.123, epsilon = EPS);
    }

    #[test]
    fn test_multiply_scales_every_entry() {
        let mut m = sample();
        m.multiply(2.5);
        for row in 0..3 {
            for col in 0..3 {
                assert_eq!(m.get(row, col), sample().get(row, col) * 2.5);
            }
        }
    }

    #[test]
    fn test_from_columns() {
        let m = Matrix3D::from_columns(
            &Vector3D::new(0.0, 1.0, 0.0),
            &Vector3D::new(-1.0, 0.0, 0.0),
            &Vector3D::new(0.0, 0.0, 1.0),
        );
        let mut v = Vector3D::new(1.0, 0.0, 0.0);
        m.transform(&mut v);
        assert_abs_diff_eq!(v, Vector3D::new(0.0, 1.0, 0.0), epsilon = 1e-12);
    }
}
