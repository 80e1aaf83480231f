// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Rigid transforms applied to authored geometry.

use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Rotation followed by translation.
///
/// The rotation is kept as Euler angles in radians (`yaw` about z, `pitch`
/// about y, `roll` about x) so authored data stays readable.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Transform3 {
    pub translation: Vector3<f32>,
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
}

impl Default for Transform3 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform3 {
    pub fn identity() -> Self {
        Self {
            translation: Vector3::zeros(),
            yaw: 0.0,
            pitch: 0.0,
            roll: 0.0,
        }
    }

    pub fn from_translation(translation: Vector3<f32>) -> Self {
        Self {
            translation,
            ..Self::identity()
        }
    }

    pub fn from_yaw_translation(yaw: f32, translation: Vector3<f32>) -> Self {
        Self {
            translation,
            yaw,
            ..Self::identity()
        }
    }

    pub fn to_isometry(&self) -> Isometry3<f32> {
        Isometry3::from_parts(
            Translation3::from(self.translation),
            UnitQuaternion::from_euler_angles(self.roll, self.pitch, self.yaw),
        )
    }

    /// Applies the transform to a position.
    pub fn transform_point(&self, p: &Vector3<f32>) -> Vector3<f32> {
        self.to_isometry().transform_point(&Point3::from(*p)).coords
    }

    pub fn transform_points(&self, points: &[Vector3<f32>]) -> Vec<Vector3<f32>> {
        let iso = self.to_isometry();
        points
            .iter()
            .map(|p| iso.transform_point(&Point3::from(*p)).coords)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_identity_is_noop() {
        let p = Vector3::new(1.0, 2.0, 3.0);
        assert_eq!(Transform3::default().transform_point(&p), p);
    }

    #[test]
    fn test_yaw_then_translate() {
        let t = Transform3::from_yaw_translation(FRAC_PI_2, Vector3::new(100.0, 0.0, 0.0));
        let p = t.transform_point(&Vector3::new(10.0, 0.0, 5.0));
        assert_relative_eq!(p.x, 100.0, epsilon = 1e-4);
        assert_relative_eq!(p.y, 10.0, epsilon = 1e-4);
        assert_relative_eq!(p.z, 5.0, epsilon = 1e-4);
    }
}
