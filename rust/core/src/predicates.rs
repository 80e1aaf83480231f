// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Orientation and circle predicates.
//!
//! Inputs are `f32` world positions; every predicate promotes to `f64`
//! before forming products so that the sign of small determinants over
//! large coordinates (meshes span tens of thousands of units) stays
//! stable.
//!
//! Sign convention: `orient_2d(a, b, c) > 0` when `c` lies to the left of
//! the directed line `a -> b`. Mesh triangles are stored with this positive
//! orientation and the mesh code calls that winding "clockwise".

use nalgebra::Vector3;

#[inline]
fn xy(v: &Vector3<f32>) -> (f64, f64) {
    (v.x as f64, v.y as f64)
}

/// Twice the signed area of `abc` in the xy plane.
#[inline]
pub fn orient_2d(a: &Vector3<f32>, b: &Vector3<f32>, c: &Vector3<f32>) -> f64 {
    let (ax, ay) = xy(a);
    let (bx, by) = xy(b);
    let (cx, cy) = xy(c);
    (bx - ax) * (cy - ay) - (by - ay) * (cx - ax)
}

/// True when `abc` has the mesh winding (positive signed area).
///
/// Counter-clockwise with y up; the name follows the y-down screen
/// convention.
#[inline]
pub fn clockwise_2d(a: &Vector3<f32>, b: &Vector3<f32>, c: &Vector3<f32>) -> bool {
    orient_2d(a, b, c) > 0.0
}

/// True when `p` is strictly left of the directed line `a -> b`.
#[inline]
pub fn line_side_2d(a: &Vector3<f32>, b: &Vector3<f32>, p: &Vector3<f32>) -> bool {
    orient_2d(a, b, p) > 0.0
}

/// Signed relation of `p` to the triangle edge `a -> b`.
///
/// Positive when `p` is on the outer side of the edge (away from the
/// triangle interior), negative when it is inside. Point location crosses
/// the edge with the largest positive value.
#[inline]
pub fn line_relationship_2d(a: &Vector3<f32>, b: &Vector3<f32>, p: &Vector3<f32>) -> f64 {
    -orient_2d(a, b, p)
}

/// Squared distance from `p` to the infinite line through `a` and `b`.
///
/// Falls back to the point distance to `a` when the line is degenerate.
pub fn line_point_distance_sq_2d(a: &Vector3<f32>, b: &Vector3<f32>, p: &Vector3<f32>) -> f64 {
    let (ax, ay) = xy(a);
    let (bx, by) = xy(b);
    let (px, py) = xy(p);
    let dx = bx - ax;
    let dy = by - ay;
    let len_sq = dx * dx + dy * dy;
    if len_sq <= f64::EPSILON {
        return (px - ax).powi(2) + (py - ay).powi(2);
    }
    let cross = dx * (py - ay) - dy * (px - ax);
    cross * cross / len_sq
}

/// True when `d` lies strictly inside the circumcircle of `abc`.
///
/// Independent of the orientation of `abc`. Degenerate triangles have no
/// interior and always report false.
pub fn circumcircle_contains(
    a: &Vector3<f32>,
    b: &Vector3<f32>,
    c: &Vector3<f32>,
    d: &Vector3<f32>,
) -> bool {
    let orient = orient_2d(a, b, c);
    if orient == 0.0 {
        return false;
    }
    let (dx, dy) = xy(d);
    let (ax, ay) = xy(a);
    let (bx, by) = xy(b);
    let (cx, cy) = xy(c);

    let adx = ax - dx;
    let ady = ay - dy;
    let bdx = bx - dx;
    let bdy = by - dy;
    let cdx = cx - dx;
    let cdy = cy - dy;

    let ad = adx * adx + ady * ady;
    let bd = bdx * bdx + bdy * bdy;
    let cd = cdx * cdx + cdy * cdy;

    let det = adx * (bdy * cd - bd * cdy) - ady * (bdx * cd - bd * cdx) + ad * (bdx * cdy - bdy * cdx);

    det * orient.signum() > 0.0
}

/// Circumcenter and squared radius of `abc` in the xy plane.
///
/// Returns `None` for collinear input.
pub fn circumcircle_2d(
    a: &Vector3<f32>,
    b: &Vector3<f32>,
    c: &Vector3<f32>,
) -> Option<((f64, f64), f64)> {
    let (ax, ay) = xy(a);
    let (bx, by) = xy(b);
    let (cx, cy) = xy(c);
    let bx = bx - ax;
    let by = by - ay;
    let cx = cx - ax;
    let cy = cy - ay;
    let d = 2.0 * (bx * cy - by * cx);
    if d.abs() <= f64::EPSILON {
        return None;
    }
    let b_sq = bx * bx + by * by;
    let c_sq = cx * cx + cy * cy;
    let ux = (cy * b_sq - by * c_sq) / d;
    let uy = (bx * c_sq - cx * b_sq) / d;
    Some(((ax + ux, ay + uy), ux * ux + uy * uy))
}

/// Inclusive point-in-triangle test, independent of winding.
pub fn contains_2d(
    a: &Vector3<f32>,
    b: &Vector3<f32>,
    c: &Vector3<f32>,
    p: &Vector3<f32>,
) -> bool {
    let sign = orient_2d(a, b, c).signum();
    if sign == 0.0 {
        return false;
    }
    orient_2d(a, b, p) * sign >= 0.0
        && orient_2d(b, c, p) * sign >= 0.0
        && orient_2d(c, a, p) * sign >= 0.0
}

/// True when `abc` is a sliver: its height over the longest edge is at most
/// `epsilon`.
pub fn is_degenerate(a: &Vector3<f32>, b: &Vector3<f32>, c: &Vector3<f32>, epsilon: f32) -> bool {
    let double_area = orient_2d(a, b, c).abs();
    let (ax, ay) = xy(a);
    let (bx, by) = xy(b);
    let (cx, cy) = xy(c);
    let longest_sq = ((bx - ax).powi(2) + (by - ay).powi(2))
        .max((cx - bx).powi(2) + (cy - by).powi(2))
        .max((ax - cx).powi(2) + (ay - cy).powi(2));
    if longest_sq <= f64::EPSILON {
        return true;
    }
    double_area / longest_sq.sqrt() <= epsilon as f64
}

/// True when the angle at `b` in the corner `a-b-c` exceeds 90 degrees.
#[inline]
pub fn is_angle_obtuse_2d(a: &Vector3<f32>, b: &Vector3<f32>, c: &Vector3<f32>) -> bool {
    let (ax, ay) = xy(a);
    let (bx, by) = xy(b);
    let (cx, cy) = xy(c);
    (ax - bx) * (cx - bx) + (ay - by) * (cy - by) < 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn v(x: f32, y: f32) -> Vector3<f32> {
        Vector3::new(x, y, 0.0)
    }

    #[test]
    fn test_orientation_sign() {
        let a = v(0.0, 0.0);
        let b = v(10.0, 0.0);
        assert!(clockwise_2d(&a, &b, &v(0.0, 10.0)));
        assert!(!clockwise_2d(&a, &b, &v(0.0, -10.0)));
        assert!(line_relationship_2d(&a, &b, &v(5.0, -1.0)) > 0.0);
        assert!(line_relationship_2d(&a, &b, &v(5.0, 1.0)) < 0.0);
        assert_eq!(orient_2d(&a, &b, &v(20.0, 0.0)), 0.0);
    }

    #[test]
    fn test_orientation_large_coordinates() {
        let a = v(30000.0, 30000.0);
        let b = v(30010.0, 30000.0);
        let c = v(30005.0, 30000.5);
        assert!(clockwise_2d(&a, &b, &c));
    }

    #[test]
    fn test_circumcircle_contains_either_winding() {
        let a = v(0.0, 0.0);
        let b = v(10.0, 0.0);
        let c = v(0.0, 10.0);
        let inside = v(9.0, 9.0);
        let outside = v(11.0, 11.0);
        assert!(circumcircle_contains(&a, &b, &c, &inside));
        assert!(circumcircle_contains(&a, &c, &b, &inside));
        assert!(!circumcircle_contains(&a, &b, &c, &outside));
        // Cocircular point is not strictly inside
        assert!(!circumcircle_contains(&a, &b, &c, &v(10.0, 10.0)));
    }

    #[test]
    fn test_circumcircle_center() {
        let ((cx, cy), r_sq) = circumcircle_2d(&v(0.0, 0.0), &v(10.0, 0.0), &v(0.0, 10.0)).unwrap();
        assert_relative_eq!(cx, 5.0);
        assert_relative_eq!(cy, 5.0);
        assert_relative_eq!(r_sq, 50.0);
        assert!(circumcircle_2d(&v(0.0, 0.0), &v(1.0, 0.0), &v(2.0, 0.0)).is_none());
    }

    #[test]
    fn test_contains_inclusive() {
        let a = v(0.0, 0.0);
        let b = v(10.0, 0.0);
        let c = v(0.0, 10.0);
        assert!(contains_2d(&a, &b, &c, &v(1.0, 1.0)));
        assert!(contains_2d(&a, &c, &b, &v(1.0, 1.0)));
        assert!(contains_2d(&a, &b, &c, &v(5.0, 0.0)));
        assert!(!contains_2d(&a, &b, &c, &v(6.0, 6.0)));
    }

    #[test]
    fn test_degenerate_and_distance() {
        let a = v(0.0, 0.0);
        let b = v(100.0, 0.0);
        assert!(is_degenerate(&a, &b, &v(50.0, 0.5), 1.0));
        assert!(!is_degenerate(&a, &b, &v(50.0, 5.0), 1.0));
        assert_relative_eq!(line_point_distance_sq_2d(&a, &b, &v(200.0, 3.0)), 9.0);
    }

    #[test]
    fn test_obtuse_angle() {
        assert!(is_angle_obtuse_2d(&v(-1.0, 1.0), &v(0.0, 0.0), &v(1.0, 0.0)));
        assert!(!is_angle_obtuse_2d(&v(1.0, 1.0), &v(0.0, 0.0), &v(1.0, 0.0)));
    }
}
