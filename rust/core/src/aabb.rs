// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Axis-aligned bounding boxes.

use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Axis-aligned box given by its minimum and maximum corners.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Aabb {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

impl Aabb {
    /// Creates a box from two corners, ordering the components.
    pub fn new(a: Vector3<f32>, b: Vector3<f32>) -> Self {
        Self {
            min: a.inf(&b),
            max: a.sup(&b),
        }
    }

    pub fn from_center_extents(center: Vector3<f32>, extents: Vector3<f32>) -> Self {
        Self::new(center - extents, center + extents)
    }

    /// Smallest box containing all `points`; `None` when empty.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vector3<f32>>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        Some(iter.fold(Self { min: first, max: first }, |acc, p| Self {
            min: acc.min.inf(p),
            max: acc.max.sup(p),
        }))
    }

    #[inline]
    pub fn center(&self) -> Vector3<f32> {
        (self.min + self.max) * 0.5
    }

    /// Extent along x.
    #[inline]
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    /// Extent along y.
    #[inline]
    pub fn length(&self) -> f32 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.max.z - self.min.z
    }

    #[inline]
    pub fn area_2d(&self) -> f32 {
        self.width() * self.length()
    }

    /// A box is valid when no extent is negative and all corners are finite.
    pub fn is_valid(&self) -> bool {
        self.min.iter().chain(self.max.iter()).all(|v| v.is_finite())
            && self.min.x <= self.max.x
            && self.min.y <= self.max.y
            && self.min.z <= self.max.z
    }

    /// Grows the box by `amount` on every side of the xy plane.
    pub fn expanded_2d(&self, amount: f32) -> Self {
        let pad = Vector3::new(amount, amount, 0.0);
        Self {
            min: self.min - pad,
            max: self.max + pad,
        }
    }

    #[inline]
    pub fn contains_point_2d(&self, p: &Vector3<f32>) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    #[inline]
    pub fn intersects_2d(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// Corner `i` (0..4) of the xy rectangle, walking min -> +x -> max -> +y.
    pub fn corner_2d(&self, i: usize) -> Vector3<f32> {
        match i % 4 {
            0 => Vector3::new(self.min.x, self.min.y, 0.0),
            1 => Vector3::new(self.max.x, self.min.y, 0.0),
            2 => Vector3::new(self.max.x, self.max.y, 0.0),
            _ => Vector3::new(self.min.x, self.max.y, 0.0),
        }
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self {
            min: Vector3::zeros(),
            max: Vector3::zeros(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_new_orders_corners() {
        let b = Aabb::new(Vector3::new(10.0, -5.0, 1.0), Vector3::new(-10.0, 5.0, 0.0));
        assert_eq!(b.min, Vector3::new(-10.0, -5.0, 0.0));
        assert_eq!(b.max, Vector3::new(10.0, 5.0, 1.0));
        assert_relative_eq!(b.area_2d(), 200.0);
        assert!(b.is_valid());
    }

    #[test]
    fn test_expand_and_contains() {
        let b = Aabb::new(Vector3::zeros(), Vector3::new(100.0, 100.0, 0.0)).expanded_2d(10.0);
        assert!(b.contains_point_2d(&Vector3::new(-5.0, 105.0, 50.0)));
        assert!(!b.contains_point_2d(&Vector3::new(-11.0, 0.0, 0.0)));
        assert_eq!(b.corner_2d(2), Vector3::new(110.0, 110.0, 0.0));
    }

    #[test]
    fn test_from_points() {
        let pts = [Vector3::new(1.0, 2.0, 3.0), Vector3::new(-1.0, 5.0, 0.0)];
        let b = Aabb::from_points(&pts).unwrap();
        assert_eq!(b.min, Vector3::new(-1.0, 2.0, 0.0));
        assert_eq!(b.max, Vector3::new(1.0, 5.0, 3.0));
        assert!(Aabb::from_points(std::iter::empty()).is_none());
    }
}
