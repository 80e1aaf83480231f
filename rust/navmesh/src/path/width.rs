// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Corridor width through a triangle.
//!
//! Passing from one edge of a triangle to another means turning around
//! their shared vertex. The room available for that turn is the distance
//! from the vertex to the closest constraint beyond the third edge, found
//! by walking outward across unconstrained edges.

use navi_core::predicates::is_angle_obtuse_2d;
use navi_core::segment::segment_point_distance_sq_2d;

use crate::cdt::NaviCdt;
use crate::keys::{EdgeKey, PointKey, TriangleKey};

impl NaviCdt {
    fn influence_radius(&self, point: PointKey) -> f32 {
        self.points()[point].influence_radius
    }

    /// Edge length minus the obstacle radii at both ends.
    pub fn edge_width(&self, edge: EdgeKey) -> f32 {
        let e = &self.edges()[edge];
        e.length_2d(self.points()) - self.influence_radius(e.points[0]) - self.influence_radius(e.points[1])
    }

    /// Width of the corridor turning around the vertex shared by `edge1`
    /// and `edge2` inside `triangle`.
    pub fn calculate_width(&self, triangle: TriangleKey, edge1: EdgeKey, edge2: EdgeKey) -> f32 {
        let e1 = &self.edges()[edge1];
        let e2 = &self.edges()[edge2];
        let Some(point) = e1.shared_vertex(e2) else {
            return 0.0;
        };
        let point1 = e1.opposed_point(point);
        let point2 = e2.opposed_point(point);
        let (pos, pos1, pos2) = (self.pos(point), self.pos(point1), self.pos(point2));
        let edge = self.triangles()[triangle].opposed_edge(self.edges(), point);

        let radius = self.influence_radius(point);
        let width1 = e1.length_2d(self.points()) - radius - self.influence_radius(point1);
        let width2 = e2.length_2d(self.points()) - radius - self.influence_radius(point2);
        let width = width1.min(width2);

        if is_angle_obtuse_2d(&pos, &pos2, &pos1) || is_angle_obtuse_2d(&pos, &pos1, &pos2) {
            width
        } else if self.edges()[edge].is_constraint() {
            let [a, b] = self.edge_positions(edge);
            segment_point_distance_sq_2d(&a, &b, &pos).sqrt() - radius
        } else {
            self.search_width(point, triangle, edge, width)
        }
    }

    /// Like [`NaviCdt::calculate_width`] but without capping the result by
    /// the lengths of the two edges.
    pub fn calculate_width_ignore_initial_edges(&self, triangle: TriangleKey, edge1: EdgeKey, edge2: EdgeKey) -> f32 {
        let Some(point) = self.edges()[edge1].shared_vertex(&self.edges()[edge2]) else {
            return 0.0;
        };
        let edge = self.triangles()[triangle].opposed_edge(self.edges(), point);
        self.search_width(point, triangle, edge, f32::MAX)
    }

    /// Depth-first walk away from `point` across unconstrained edges,
    /// shrinking `width` to the distance of the nearest constraint.
    fn search_width(&self, point: PointKey, triangle: TriangleKey, edge: EdgeKey, mut width: f32) -> f32 {
        let pos = self.pos(point);
        let radius = self.influence_radius(point);
        let mut stack = vec![(triangle, edge)];

        while let Some((triangle, edge)) = stack.pop() {
            let [a, b] = self.edge_positions(edge);
            if is_angle_obtuse_2d(&pos, &a, &b) || is_angle_obtuse_2d(&pos, &b, &a) {
                continue;
            }
            let dist = segment_point_distance_sq_2d(&a, &b, &pos).sqrt() - radius;
            if dist > width {
                continue;
            }
            let e = &self.edges()[edge];
            if e.is_constraint() {
                width = dist;
                continue;
            }
            let Some(oppo) = e.opposed_triangle(triangle) else {
                continue;
            };
            let tri = &self.triangles()[oppo];
            let index = tri.edge_index(edge);
            stack.push((oppo, tri.edge_mod(index + 2)));
            stack.push((oppo, tri.edge_mod(index + 1)));
        }
        width
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use navi_core::Vec3;

    use crate::cdt::tests::square_cdt;

    use super::*;

    /// Triangle with a vertex at `pos`, plus its two edges through it.
    fn corner(cdt: &NaviCdt, pos: Vec3) -> (TriangleKey, EdgeKey, EdgeKey) {
        let point = cdt.find_attached_point_at_point(&pos).unwrap();
        let triangle = cdt.find_triangle_containing_vertex(point).unwrap();
        let tri = &cdt.triangles()[triangle];
        let oppo = tri.opposed_edge_index(cdt.edges(), point);
        (triangle, tri.edge_mod(oppo + 1), tri.edge_mod(oppo + 2))
    }

    #[test]
    fn test_edge_width_subtracts_influence() {
        let mut cdt = square_cdt(100.0);
        let edge = cdt.edges().iter().find(|(_, e)| e.is_constraint()).map(|(k, _)| k).unwrap();
        assert_relative_eq!(cdt.edge_width(edge), 100.0);
        let p = cdt.edges()[edge].points[0];
        cdt.point_mut(p).unwrap().influence_radius = 15.0;
        assert_relative_eq!(cdt.edge_width(edge), 85.0);
    }

    #[test]
    fn test_width_to_opposite_constraint() {
        let mut cdt = square_cdt(1000.0);
        // Interior vertex 100 above the constrained bottom side.
        let v = cdt.add_point(Vec3::new(500.0, 100.0, 0.0)).unwrap();
        let below = cdt.find_triangle_at_point(&Vec3::new(500.0, 50.0, 0.0)).unwrap();
        let tri = &cdt.triangles()[below];
        assert!(tri.contains_point(cdt.edges(), v));
        let oppo = tri.opposed_edge_index(cdt.edges(), v);
        let (e1, e2) = (tri.edge_mod(oppo + 1), tri.edge_mod(oppo + 2));

        assert_relative_eq!(cdt.calculate_width(below, e1, e2), 100.0, epsilon = 1e-3);
        assert_relative_eq!(cdt.calculate_width_ignore_initial_edges(below, e1, e2), 100.0, epsilon = 1e-3);

        cdt.point_mut(v).unwrap().influence_radius = 20.0;
        assert_relative_eq!(cdt.calculate_width(below, e1, e2), 80.0, epsilon = 1e-3);
    }

    #[test]
    fn test_search_width_prunes_after_influence() {
        let mut cdt = square_cdt(1000.0);
        let v = cdt.add_point(Vec3::new(500.0, 300.0, 0.0)).unwrap();
        cdt.point_mut(v).unwrap().influence_radius = 100.0;
        let below = cdt.find_triangle_at_point(&Vec3::new(500.0, 50.0, 0.0)).unwrap();
        let edge = cdt.triangles()[below].opposed_edge(cdt.edges(), v);
        assert!(cdt.edges()[edge].is_constraint());

        // The floor is 300 away, 200 once the obstacle radius is taken off.
        assert_relative_eq!(cdt.search_width(v, below, edge, 250.0), 200.0, epsilon = 1e-3);
        assert_relative_eq!(cdt.search_width(v, below, edge, 150.0), 150.0);
    }

    #[test]
    fn test_corner_against_constraint() {
        let cdt = square_cdt(100.0);
        // At the square corner the opposite edge is the other square side
        // or the diagonal; either way the width is bounded by the side.
        let (t, e1, e2) = corner(&cdt, Vec3::new(0.0, 0.0, 0.0));
        let width = cdt.calculate_width(t, e1, e2);
        assert!(width <= 100.0 + 1e-3);
        assert!(width > 0.0);
    }
}
