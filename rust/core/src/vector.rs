// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Planar helpers on [`Vector3`].
//!
//! Navigation queries work on the ground plane. These helpers drop the z
//! component before measuring or normalizing.

use nalgebra::Vector3;

/// Planar (x, y) operations on 3D vectors.
pub trait Vec3Ext {
    /// Copy with z zeroed.
    fn to_2d(&self) -> Vector3<f32>;
    fn dot_2d(&self, other: &Vector3<f32>) -> f32;
    /// z component of the 2D cross product.
    fn cross_2d(&self, other: &Vector3<f32>) -> f32;
    /// Counter-clockwise perpendicular `(-y, x)`.
    fn perp_2d(&self) -> Vector3<f32>;
    fn length_sq_2d(&self) -> f32;
    fn length_2d(&self) -> f32;
    fn distance_sq_2d(&self, other: &Vector3<f32>) -> f32;
    fn distance_2d(&self, other: &Vector3<f32>) -> f32;
    /// Unit planar vector, or zero when the planar length is zero.
    fn normalize_2d(&self) -> Vector3<f32>;
    /// Unit planar vector, or `fallback` when the vector is near zero.
    fn safe_normalize_2d_or(&self, fallback: Vector3<f32>) -> Vector3<f32>;
    fn safe_normalize_2d(&self) -> Vector3<f32> {
        self.safe_normalize_2d_or(Vector3::zeros())
    }
    /// Unsigned planar angle between two vectors, in radians.
    fn angle_2d(&self, other: &Vector3<f32>) -> f32;
    fn is_finite(&self) -> bool;
    fn is_near_zero_2d(&self, epsilon: f32) -> bool;
}

impl Vec3Ext for Vector3<f32> {
    #[inline]
    fn to_2d(&self) -> Vector3<f32> {
        Vector3::new(self.x, self.y, 0.0)
    }

    #[inline]
    fn dot_2d(&self, other: &Vector3<f32>) -> f32 {
        self.x * other.x + self.y * other.y
    }

    #[inline]
    fn cross_2d(&self, other: &Vector3<f32>) -> f32 {
        self.x * other.y - self.y * other.x
    }

    #[inline]
    fn perp_2d(&self) -> Vector3<f32> {
        Vector3::new(-self.y, self.x, 0.0)
    }

    #[inline]
    fn length_sq_2d(&self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    #[inline]
    fn length_2d(&self) -> f32 {
        self.length_sq_2d().sqrt()
    }

    #[inline]
    fn distance_sq_2d(&self, other: &Vector3<f32>) -> f32 {
        (self - other).length_sq_2d()
    }

    #[inline]
    fn distance_2d(&self, other: &Vector3<f32>) -> f32 {
        (self - other).length_2d()
    }

    fn normalize_2d(&self) -> Vector3<f32> {
        let len = self.length_2d();
        if len > 0.0 {
            Vector3::new(self.x / len, self.y / len, 0.0)
        } else {
            Vector3::zeros()
        }
    }

    fn safe_normalize_2d_or(&self, fallback: Vector3<f32>) -> Vector3<f32> {
        let len_sq = self.length_sq_2d();
        if len_sq > f32::EPSILON * f32::EPSILON {
            let len = len_sq.sqrt();
            Vector3::new(self.x / len, self.y / len, 0.0)
        } else {
            fallback
        }
    }

    fn angle_2d(&self, other: &Vector3<f32>) -> f32 {
        let a = self.safe_normalize_2d();
        let b = other.safe_normalize_2d();
        a.cross_2d(&b).atan2(a.dot_2d(&b)).abs()
    }

    #[inline]
    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    #[inline]
    fn is_near_zero_2d(&self, epsilon: f32) -> bool {
        self.x.abs() <= epsilon && self.y.abs() <= epsilon
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_planar_ops_ignore_z() {
        let a = Vector3::new(3.0, 4.0, 100.0);
        assert_relative_eq!(a.length_2d(), 5.0);
        assert_eq!(a.to_2d().z, 0.0);
        let n = a.normalize_2d();
        assert_relative_eq!(n.x, 0.6);
        assert_relative_eq!(n.y, 0.8);
        assert_eq!(n.z, 0.0);
    }

    #[test]
    fn test_cross_and_perp() {
        let x = Vector3::new(1.0, 0.0, 0.0);
        let y = Vector3::new(0.0, 1.0, 0.0);
        assert_relative_eq!(x.cross_2d(&y), 1.0);
        assert_relative_eq!(y.cross_2d(&x), -1.0);
        assert_eq!(x.perp_2d(), y);
        assert_relative_eq!(x.angle_2d(&y), FRAC_PI_2);
    }

    #[test]
    fn test_safe_normalize_falls_back() {
        let z = Vector3::new(0.0, 0.0, 5.0);
        assert_eq!(z.safe_normalize_2d(), Vector3::zeros());
        let fallback = Vector3::z();
        assert_eq!(z.safe_normalize_2d_or(fallback), fallback);
    }
}
