// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Line segment queries.
//!
//! Closest-point and intersection routines follow Ericson, *Real-Time
//! Collision Detection*, chapter 5. Functions with a `_2d` suffix ignore z.

use nalgebra::Vector3;

use crate::vector::Vec3Ext;

/// Tolerance for degenerate directions and parameter clamping.
pub const EPSILON: f32 = 1e-6;

/// A directed segment from `start` to `end`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Vector3<f32>,
    pub end: Vector3<f32>,
}

impl Segment {
    pub fn new(start: Vector3<f32>, end: Vector3<f32>) -> Self {
        Self { start, end }
    }

    #[inline]
    pub fn direction(&self) -> Vector3<f32> {
        self.end - self.start
    }

    #[inline]
    pub fn length(&self) -> f32 {
        self.direction().norm()
    }

    #[inline]
    pub fn length_2d(&self) -> f32 {
        self.direction().length_2d()
    }

    /// Point at parameter `t` along the segment (unclamped).
    #[inline]
    pub fn point_at(&self, t: f32) -> Vector3<f32> {
        self.start + self.direction() * t
    }
}

/// True when `a` is within `epsilon` of `b`.
#[inline]
pub fn epsilon_test(a: f32, b: f32, epsilon: f32) -> bool {
    a >= b - epsilon && a <= b + epsilon
}

#[inline]
pub fn is_near_zero(value: f32) -> bool {
    epsilon_test(value, 0.0, EPSILON)
}

/// Squared distance from `c` to segment `ab`.
pub fn segment_point_distance_sq(a: &Vector3<f32>, b: &Vector3<f32>, c: &Vector3<f32>) -> f32 {
    let ab = b - a;
    let ac = c - a;
    let e = ac.dot(&ab);
    if e <= 0.0 {
        return ac.dot(&ac);
    }
    let f = ab.dot(&ab);
    if e >= f {
        let bc = c - b;
        return bc.dot(&bc);
    }
    ac.dot(&ac) - e * (e / f)
}

pub fn segment_point_distance_sq_2d(a: &Vector3<f32>, b: &Vector3<f32>, c: &Vector3<f32>) -> f32 {
    segment_point_distance_sq(&a.to_2d(), &b.to_2d(), &c.to_2d())
}

/// Closest point to `p` on segment `ab`, with its parameter in `[0, 1]`.
pub fn closest_point_on_segment_2d(
    a: &Vector3<f32>,
    b: &Vector3<f32>,
    p: &Vector3<f32>,
) -> (Vector3<f32>, f32) {
    let ab = b - a;
    let len_sq = ab.length_sq_2d();
    if len_sq <= EPSILON {
        return (*a, 0.0);
    }
    let t = ((p - a).dot_2d(&ab) / len_sq).clamp(0.0, 1.0);
    (a + ab * t, t)
}

/// Result of [`segment_segment_closest_point`].
#[derive(Debug, Clone, Copy)]
pub struct ClosestPoints {
    /// Squared distance between the two closest points.
    pub distance_sq: f32,
    /// Parameter along the first segment.
    pub s: f32,
    /// Parameter along the second segment.
    pub t: f32,
    pub point1: Vector3<f32>,
    pub point2: Vector3<f32>,
}

/// Closest points between segments `p1q1` and `p2q2`.
pub fn segment_segment_closest_point(
    p1: &Vector3<f32>,
    q1: &Vector3<f32>,
    p2: &Vector3<f32>,
    q2: &Vector3<f32>,
) -> ClosestPoints {
    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let r = p1 - p2;
    let a = d1.dot(&d1);
    let e = d2.dot(&d2);
    let f = d2.dot(&r);

    let (s, t) = if a <= EPSILON && e <= EPSILON {
        (0.0, 0.0)
    } else if a <= EPSILON {
        (0.0, (f / e).clamp(0.0, 1.0))
    } else {
        let c = d1.dot(&r);
        if e <= EPSILON {
            ((-c / a).clamp(0.0, 1.0), 0.0)
        } else {
            let b = d1.dot(&d2);
            let denom = a * e - b * b;
            let s = if denom != 0.0 {
                ((b * f - c * e) / denom).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let tnom = b * s + f;
            if tnom < 0.0 {
                ((-c / a).clamp(0.0, 1.0), 0.0)
            } else if tnom > e {
                (((b - c) / a).clamp(0.0, 1.0), 1.0)
            } else {
                (s, tnom / e)
            }
        }
    };

    let point1 = p1 + d1 * s;
    let point2 = p2 + d2 * t;
    let diff = point1 - point2;
    ClosestPoints {
        distance_sq: diff.dot(&diff),
        s,
        t,
        point1,
        point2,
    }
}

pub fn segment_segment_distance_sq_2d(
    a1: &Vector3<f32>,
    b1: &Vector3<f32>,
    a2: &Vector3<f32>,
    b2: &Vector3<f32>,
) -> f32 {
    segment_segment_closest_point(&a1.to_2d(), &b1.to_2d(), &a2.to_2d(), &b2.to_2d()).distance_sq
}

/// Twice the signed area of `abc`; positive when `c` is left of `ab`.
#[inline]
pub fn signed_double_triangle_area_2d(a: &Vector3<f32>, b: &Vector3<f32>, c: &Vector3<f32>) -> f32 {
    (b - a).cross_2d(&(c - a))
}

/// Proper intersection test for segments `ab` and `cd`.
///
/// Touching or collinear segments do not count as intersecting.
pub fn segments_intersect_2d(
    a: &Vector3<f32>,
    b: &Vector3<f32>,
    c: &Vector3<f32>,
    d: &Vector3<f32>,
) -> bool {
    let a1 = signed_double_triangle_area_2d(a, b, d);
    let a2 = signed_double_triangle_area_2d(a, b, c);
    if a1 * a2 < 0.0 {
        let a3 = signed_double_triangle_area_2d(c, d, a);
        let a4 = a3 + a2 - a1;
        if a3 * a4 < 0.0 {
            return true;
        }
    }
    false
}

/// Intersection of the infinite lines through `p0p1` and `q0q1`.
///
/// The result keeps the z of the first line at the intersection parameter.
pub fn line_line_intersect_2d(
    p0: &Vector3<f32>,
    p1: &Vector3<f32>,
    q0: &Vector3<f32>,
    q1: &Vector3<f32>,
) -> Option<Vector3<f32>> {
    let d1 = p1 - p0;
    let d2 = q1 - q0;
    let cross = d1.cross_2d(&d2);
    if cross == 0.0 {
        return None;
    }
    let v = q0 - p0;
    let t = v.cross_2d(&d2) / cross;
    Some(p0 + d1 * t)
}

/// Linear interpolation that snaps to `min` when `t` leaves `[0, 1]`.
#[inline]
pub fn lerp(min: f32, max: f32, t: f32) -> f32 {
    if (0.0..=1.0).contains(&t) {
        min + (max - min) * t
    } else {
        min
    }
}

/// Parameters `(ray_t, line_t)` where a ray meets a line.
///
/// Both directions are unnormalized; `None` when they are parallel.
pub fn ray_line_intersect_2d(
    ray_start: &Vector3<f32>,
    ray_dir: &Vector3<f32>,
    line_start: &Vector3<f32>,
    line_dir: &Vector3<f32>,
) -> Option<(f32, f32)> {
    let d = line_dir.cross_2d(ray_dir);
    if d == 0.0 {
        return None;
    }
    let v = line_start - ray_start;
    let ray_t = line_dir.cross_2d(&v) / d;
    let line_t = ray_dir.cross_2d(&v) / d;
    Some((ray_t, line_t))
}

/// Planar point where a ray hits the segment `start + dir * [0, 1]`.
pub fn ray_segment_intersect_2d(
    ray_start: &Vector3<f32>,
    ray_dir: &Vector3<f32>,
    segment_start: &Vector3<f32>,
    segment_dir: &Vector3<f32>,
) -> Option<Vector3<f32>> {
    let (ray_t, line_t) = ray_line_intersect_2d(ray_start, ray_dir, segment_start, segment_dir)?;
    if ray_t >= 0.0 && (0.0..=1.0).contains(&line_t) {
        Some(ray_start.to_2d() + ray_dir.to_2d() * ray_t)
    } else {
        None
    }
}
