// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Moving circle tests in the xy plane.
//!
//! A circle of radius `r` travels from `center` along the unit direction
//! `dir` for at most `magnitude` units. Every function returns the travel
//! distance (or fraction, for [`sweep_circle_aabb_2d`]) at first contact.

use nalgebra::Vector3;

use crate::aabb::Aabb;
use crate::segment::{closest_point_on_segment_2d, segment_point_distance_sq_2d, Segment, EPSILON};
use crate::vector::Vec3Ext;

/// Contact handling for [`sweep_segment_2d`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SweepSegmentFlags {
    /// Report initial overlap as a contact at distance 0.
    #[default]
    None,
    /// Initial overlap only counts when the circle moves toward the segment.
    IgnoreBackfacing,
}

/// First contact of a swept shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepHit {
    /// Fraction of the travel vector at contact, in `[0, 1]`.
    pub time: f32,
    /// Planar unit normal of the contact surface, facing the mover.
    pub normal: Vector3<f32>,
}

/// Distance along `dir` at which a ray from `start` enters the circle
/// `(point, radius)`.
///
/// A start inside the circle yields `Some(0.0)` when moving toward the
/// center and `None` when moving away.
pub fn intersects_ray(
    start: &Vector3<f32>,
    dir: &Vector3<f32>,
    point: &Vector3<f32>,
    radius: f32,
) -> Option<f32> {
    let m = (start - point).to_2d();
    let b = m.dot_2d(dir);
    let c = m.length_sq_2d() - radius * radius;
    if b > 0.0 && c > 0.0 {
        return None;
    }
    if c <= 0.0 {
        return if b > 0.0 { None } else { Some(0.0) };
    }
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    Some((-b - disc.sqrt()).max(0.0))
}

/// Sweeps a circle against the segment `p0p1`.
///
/// Returns the travel distance to first contact when it is at most
/// `magnitude`.
pub fn sweep_segment_2d(
    p0: &Vector3<f32>,
    p1: &Vector3<f32>,
    center: &Vector3<f32>,
    radius: f32,
    dir: &Vector3<f32>,
    magnitude: f32,
    flags: SweepSegmentFlags,
) -> Option<f32> {
    let center = center.to_2d();
    let a = p0.to_2d();
    let b = p1.to_2d();

    let dist_sq = segment_point_distance_sq_2d(&a, &b, &center);
    if dist_sq <= radius * radius {
        if flags == SweepSegmentFlags::IgnoreBackfacing {
            let (closest, _) = closest_point_on_segment_2d(&a, &b, &center);
            if (closest - center).dot_2d(dir) <= 0.0 {
                return None;
            }
        }
        return Some(0.0);
    }

    let edge = b - a;
    let mut best: Option<f32> = None;

    if edge.length_sq_2d() > EPSILON {
        let mut normal = edge.perp_2d().normalize_2d();
        let mut offset = normal.dot_2d(&(center - a));
        if offset < 0.0 {
            normal = -normal;
            offset = -offset;
        }
        let approach = normal.dot_2d(dir);
        if approach < 0.0 {
            let t = (offset - radius) / -approach;
            let contact = center + dir * t - normal * radius;
            let along = (contact - a).dot_2d(&edge) / edge.length_sq_2d();
            if t >= 0.0 && t <= magnitude && (0.0..=1.0).contains(&along) {
                best = Some(t);
            }
        }
    }

    for end in [&a, &b] {
        if let Some(t) = intersects_ray(&center, dir, end, radius) {
            if t <= magnitude && best.map_or(true, |b| t < b) {
                best = Some(t);
            }
        }
    }

    best
}

/// Sweeps a circle along `velocity` against a box.
///
/// The returned [`SweepHit::time`] is a fraction of `velocity`.
pub fn sweep_circle_aabb_2d(
    center: &Vector3<f32>,
    radius: f32,
    velocity: &Vector3<f32>,
    bounds: &Aabb,
) -> Option<SweepHit> {
    let center = center.to_2d();
    let magnitude = velocity.length_2d();
    let dir = velocity.safe_normalize_2d();

    let closest_on_box = |p: &Vector3<f32>| {
        Vector3::new(
            p.x.clamp(bounds.min.x, bounds.max.x),
            p.y.clamp(bounds.min.y, bounds.max.y),
            0.0,
        )
    };

    let start_gap = center - closest_on_box(&center);
    if start_gap.length_sq_2d() <= radius * radius {
        return Some(SweepHit {
            time: 0.0,
            normal: start_gap.safe_normalize_2d_or(-dir),
        });
    }
    if magnitude <= EPSILON {
        return None;
    }

    let mut best: Option<f32> = None;
    for i in 0..4 {
        let c0 = bounds.corner_2d(i);
        let c1 = bounds.corner_2d(i + 1);
        if let Some(t) = sweep_segment_2d(&c0, &c1, &center, radius, &dir, magnitude, SweepSegmentFlags::None) {
            if best.map_or(true, |b| t < b) {
                best = Some(t);
            }
        }
    }

    best.map(|distance| {
        let hit_center = center + dir * distance;
        SweepHit {
            time: distance / magnitude,
            normal: (hit_center - closest_on_box(&hit_center)).safe_normalize_2d_or(-dir),
        }
    })
}

/// Common tangent between two circles, as the segment joining the two
/// tangent points.
///
/// A walker following the segment from circle 0 to circle 1 keeps circle 0
/// on its left when `left0` is set, and likewise for circle 1. Equal sides
/// give an outer tangent, opposite sides an inner one. A zero radius turns
/// the circle into a point. Returns `None` when the circles overlap too much
/// for such a tangent to exist.
pub fn circle_tangent_2d(
    c0: &Vector3<f32>,
    r0: f32,
    left0: bool,
    c1: &Vector3<f32>,
    r1: f32,
    left1: bool,
) -> Option<Segment> {
    let side = |left: bool| if left { 1.0 } else { -1.0 };
    let delta = (c1 - c0).to_2d();
    let distance = delta.length_2d();
    let k = side(left1) * r1 - side(left0) * r0;
    if distance <= EPSILON || k.abs() >= distance {
        return None;
    }

    // Left normal of the travel direction: the delta direction rotated by
    // acos(k / distance).
    let dir = delta / distance;
    let cos = k / distance;
    let sin = (1.0 - cos * cos).max(0.0).sqrt();
    let normal = Vector3::new(dir.x * cos - dir.y * sin, dir.x * sin + dir.y * cos, 0.0);

    let mut start = c0 - normal * (side(left0) * r0);
    let mut end = c1 - normal * (side(left1) * r1);
    start.z = c0.z;
    end.z = c1.z;
    Some(Segment::new(start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn v(x: f32, y: f32) -> Vector3<f32> {
        Vector3::new(x, y, 0.0)
    }

    #[test]
    fn test_intersects_ray() {
        let dir = v(1.0, 0.0);
        assert_relative_eq!(intersects_ray(&v(0.0, 0.0), &dir, &v(10.0, 0.0), 2.0).unwrap(), 8.0);
        assert!(intersects_ray(&v(0.0, 0.0), &dir, &v(10.0, 5.0), 2.0).is_none());
        assert!(intersects_ray(&v(20.0, 0.0), &dir, &v(10.0, 0.0), 2.0).is_none());
        // Inside, moving toward the center
        assert_eq!(intersects_ray(&v(9.0, 0.0), &dir, &v(10.0, 0.0), 2.0), Some(0.0));
        // Inside, moving away
        assert!(intersects_ray(&v(11.0, 0.0), &dir, &v(10.0, 0.0), 2.0).is_none());
    }

    #[test]
    fn test_sweep_segment_face_hit() {
        let t = sweep_segment_2d(
            &v(10.0, -5.0),
            &v(10.0, 5.0),
            &v(0.0, 0.0),
            1.0,
            &v(1.0, 0.0),
            20.0,
            SweepSegmentFlags::None,
        );
        assert_relative_eq!(t.unwrap(), 9.0);
    }

    #[test]
    fn test_sweep_segment_end_cap_and_miss() {
        let cap = sweep_segment_2d(
            &v(10.0, 1.0),
            &v(10.0, 5.0),
            &v(0.0, 0.0),
            1.0,
            &v(1.0, 0.0),
            20.0,
            SweepSegmentFlags::None,
        );
        assert_relative_eq!(cap.unwrap(), 10.0);
        let short = sweep_segment_2d(
            &v(10.0, -5.0),
            &v(10.0, 5.0),
            &v(0.0, 0.0),
            1.0,
            &v(1.0, 0.0),
            5.0,
            SweepSegmentFlags::None,
        );
        assert!(short.is_none());
    }

    #[test]
    fn test_sweep_segment_backfacing() {
        let seg = (v(0.0, -5.0), v(0.0, 5.0));
        let away = sweep_segment_2d(&seg.0, &seg.1, &v(0.5, 0.0), 1.0, &v(1.0, 0.0), 5.0, SweepSegmentFlags::IgnoreBackfacing);
        assert!(away.is_none());
        let toward = sweep_segment_2d(&seg.0, &seg.1, &v(0.5, 0.0), 1.0, &v(-1.0, 0.0), 5.0, SweepSegmentFlags::IgnoreBackfacing);
        assert_eq!(toward, Some(0.0));
    }

    #[test]
    fn test_sweep_circle_aabb() {
        let bounds = Aabb::new(v(10.0, -2.0), v(12.0, 2.0));
        let hit = sweep_circle_aabb_2d(&v(0.0, 0.0), 1.0, &v(20.0, 0.0), &bounds).unwrap();
        assert_relative_eq!(hit.time, 9.0 / 20.0, epsilon = 1e-5);
        assert_relative_eq!(hit.normal.x, -1.0, epsilon = 1e-5);
        assert!(sweep_circle_aabb_2d(&v(0.0, 10.0), 1.0, &v(20.0, 0.0), &bounds).is_none());
    }

    #[test]
    fn test_circle_tangent_outer_and_inner() {
        let outer = circle_tangent_2d(&v(0.0, 0.0), 1.0, true, &v(10.0, 0.0), 1.0, true).unwrap();
        assert_relative_eq!(outer.start.y, -1.0, epsilon = 1e-5);
        assert_relative_eq!(outer.end.y, -1.0, epsilon = 1e-5);
        assert_relative_eq!(outer.end.x, 10.0, epsilon = 1e-5);

        let inner = circle_tangent_2d(&v(0.0, 0.0), 1.0, true, &v(10.0, 0.0), 1.0, false).unwrap();
        // Crosses the center line half way.
        let mid = (inner.start + inner.end) / 2.0;
        assert_relative_eq!(mid.y, 0.0, epsilon = 1e-5);
        assert!(inner.start.y < 0.0 && inner.end.y > 0.0);
    }

    #[test]
    fn test_circle_tangent_from_point() {
        // From a point to a circle kept on the left: the tangent point is to
        // the right of the center line.
        let t = circle_tangent_2d(&v(0.0, 0.0), 0.0, false, &v(10.0, 0.0), 5.0, true).unwrap();
        assert_eq!(t.start, v(0.0, 0.0));
        assert!(t.end.y < 0.0);
        let radial = t.end - v(10.0, 0.0);
        assert_relative_eq!(radial.length_2d(), 5.0, epsilon = 1e-4);
        assert_relative_eq!(radial.dot_2d(&(t.end - t.start)), 0.0, epsilon = 1e-3);
        assert!(circle_tangent_2d(&v(9.0, 0.0), 0.0, false, &v(10.0, 0.0), 5.0, true).is_none());
    }
}
