// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Point insertion and Delaunay repair.

use navi_core::{predicates, segment, Vec3};

use super::{NaviCdt, SPLIT_EPSILON_SQ};
use crate::error::{NaviError, Result};
use crate::flags::{EdgeFlags, EdgePathingFlags, PointFlags};
use crate::keys::{EdgeKey, PointKey, TriangleKey};

/// Height over the longest side under which a triangle counts as a sliver.
pub(crate) const DEGENERATE_EPSILON: f32 = 1.0;

impl NaviCdt {
    /// Insert a point, snapping to an existing one when close enough.
    pub fn add_point(&mut self, pos: Vec3) -> Result<PointKey> {
        let result = self.insert_point(pos, false, true);
        self.collect_orphans();
        result
    }

    /// Insert a point with its height taken from the triangle it lands in.
    ///
    /// With `split` false the insertion is refused instead of splitting a
    /// constraint edge.
    pub fn add_point_proj_z(&mut self, pos: Vec3, split: bool) -> Result<PointKey> {
        let result = self.insert_point(pos, true, split);
        self.collect_orphans();
        result
    }

    pub(crate) fn insert_point(&mut self, pos: Vec3, proj_z: bool, split: bool) -> Result<PointKey> {
        let (point, _) = self.cache.cache_vertex(pos);
        if self.cache.points()[point].is_attached() {
            return Ok(point);
        }

        let snapped = self.pos(point);
        let triangle = match self.locate(&snapped) {
            Ok(triangle) => triangle,
            Err(err) => {
                tracing::error!(x = snapped.x, y = snapped.y, "no mesh triangle at point, likely out of bounds");
                self.forget_point(point);
                return Err(err);
            }
        };
        if proj_z {
            let projected = self.project_to_plane(triangle, &snapped);
            self.cache.update_vertex(point, projected);
        }
        if let Err(err) = self.split_triangle(triangle, point, split) {
            self.forget_point(point);
            return Err(err);
        }
        Ok(point)
    }

    /// Replace `triangle` by the fan around `point`.
    ///
    /// A point on or near a constraint edge splits that constraint. A point
    /// collinear with an edge also splits the triangle across it.
    pub(crate) fn split_triangle(&mut self, triangle: TriangleKey, point: PointKey, split: bool) -> Result<()> {
        let corners = self.triangle_points(triangle);
        let corner_pos = corners.map(|p| self.pos(p));
        let pos = self.pos(point);
        let tri_edges = self.triangles[triangle].edges;

        let mut degenerate = [false; 3];
        let mut splits = [false; 3];
        for i in 0..3 {
            degenerate[i] = predicates::is_degenerate(&pos, &corner_pos[i], &corner_pos[(i + 1) % 3], DEGENERATE_EPSILON);

            let edge = &self.edges[tri_edges[i]];
            let [a, b] = self.edge_positions(tri_edges[i]);
            splits[i] = edge.is_full()
                && edge.is_constraint()
                && (degenerate[i] || predicates::line_point_distance_sq_2d(&a, &b, &pos) < SPLIT_EPSILON_SQ as f64);

            if !split && splits[i] {
                tracing::debug!(x = pos.x, y = pos.y, "point would split a constraint");
                return Err(NaviError::InfluenceRejected(pos));
            }
            if edge.is_door() && (splits[i] || degenerate[i]) {
                tracing::error!(x = pos.x, y = pos.y, "cannot split door edges");
                return Err(NaviError::DoorEdgeSplit(tri_edges[i]));
            }
        }

        let point_edges = corners.map(|c| self.create_edge(point, c, EdgeFlags::NONE, EdgePathingFlags::default()));
        let state = self.triangles[triangle].state();
        self.remove_triangle(triangle);

        let mut stack = Vec::new();
        for i in 0..3 {
            let i1 = (i + 1) % 3;
            let pe0 = point_edges[i];
            let pe1 = point_edges[i1];
            let edge = tri_edges[i];

            if splits[i] {
                let source = self.edges[edge].clone();
                self.edges[pe0].constraint_merge(&source);
                self.edges[pe1].constraint_merge(&source);
                self.edges[edge].clear_constraint();
            }

            if degenerate[i] {
                let Some(deg_triangle) = self.edges[edge].any_triangle() else {
                    // Point on the border: the two halves replace the edge.
                    let source = self.edges[edge].clone();
                    self.edges[pe0].constraint_merge(&source);
                    self.edges[pe1].constraint_merge(&source);
                    self.edges[edge].clear_constraint();
                    continue;
                };
                let Some(oppo) = self.triangles[deg_triangle].opposed_vertex(&self.edges, edge) else {
                    continue;
                };
                let oppo_pos = self.pos(oppo);
                if predicates::clockwise_2d(&pos, &corner_pos[i], &oppo_pos)
                    && predicates::clockwise_2d(&pos, &oppo_pos, &corner_pos[i1])
                {
                    let deg = &self.triangles[deg_triangle];
                    let index = deg.edge_index(edge);
                    let de1 = deg.edge_mod(index + 1);
                    let de2 = deg.edge_mod(index + 2);
                    let deg_state = deg.state();
                    let dep = self.create_edge(point, oppo, EdgeFlags::NONE, EdgePathingFlags::default());
                    self.remove_triangle(deg_triangle);

                    stack.push(self.add_triangle([pe0, de1, dep], Some(&deg_state)));
                    stack.push(self.add_triangle([pe1, dep, de2], Some(&deg_state)));
                    continue;
                }
            }
            stack.push(self.add_triangle([pe0, edge, pe1], Some(&state)));
        }

        if let Some(p) = self.cache.get_mut(point) {
            p.flags.insert(PointFlags::ATTACHED);
        }
        self.check_delaunay_swap(stack, point, split);
        Ok(())
    }

    /// Flip edges opposite `point` until every triangle around it is
    /// Delaunay. Constraints within snapping distance of `point` are handed
    /// over to the two edges through `point` when `split` is set.
    fn check_delaunay_swap(&mut self, mut stack: Vec<TriangleKey>, point: PointKey, split: bool) {
        let pos = self.pos(point);
        while let Some(triangle) = stack.pop() {
            if !self.triangles.contains_key(triangle) {
                continue;
            }
            let (oppo_triangle, edge) = self.triangles[triangle].opposed_triangle(triangle, &self.edges, point);
            let Some(oppo_triangle) = oppo_triangle else {
                continue;
            };

            if split && self.edges[edge].is_constraint() {
                let [a, b] = self.edge_positions(edge);
                if segment::segment_point_distance_sq_2d(&a, &b, &pos) < SPLIT_EPSILON_SQ {
                    let tri = &self.triangles[triangle];
                    let index = tri.edge_index(edge);
                    let e2 = tri.edge_mod(index + 2);
                    let e1 = tri.edge_mod(index + 1);
                    let source = self.edges[edge].clone();
                    self.edges[e2].constraint_merge(&source);
                    self.edges[e1].constraint_merge(&source);
                    self.edges[edge].clear_constraint();
                }
            }

            if !self.edges[edge].is_constraint() {
                let Some(check) = self.triangles[oppo_triangle].opposed_vertex(&self.edges, edge) else {
                    continue;
                };
                let [a, b, c] = self.triangle_positions(triangle);
                if predicates::circumcircle_contains(&a, &b, &c, &self.pos(check)) {
                    if let Some((t0, t1)) = self.swap_edge(edge) {
                        stack.push(t0);
                        stack.push(t1);
                    }
                }
            }
        }
    }

    /// Replace the diagonal of the quad formed by the two triangles of
    /// `edge` with the other diagonal.
    pub(crate) fn swap_edge(&mut self, edge: EdgeKey) -> Option<(TriangleKey, TriangleKey)> {
        let e = &self.edges[edge];
        let (t0, t1) = (e.triangles[0]?, e.triangles[1]?);
        let flags = e.flags;

        let tri0 = &self.triangles[t0];
        let tri1 = &self.triangles[t1];
        let o0 = tri0.opposed_vertex(&self.edges, edge)?;
        let o1 = tri1.opposed_vertex(&self.edges, edge)?;
        let index0 = tri0.edge_index(edge);
        let index1 = tri1.edge_index(edge);
        let t0e1 = tri0.edge_mod(index0 + 1);
        let t0e2 = tri0.edge_mod(index0 + 2);
        let t1e1 = tri1.edge_mod(index1 + 1);
        let t1e2 = tri1.edge_mod(index1 + 2);
        let state0 = tri0.state();
        let state1 = tri1.state();

        let new_edge = self.create_edge(o0, o1, flags, EdgePathingFlags::default());
        self.remove_triangle(t0);
        self.remove_triangle(t1);

        let n0 = self.add_triangle([new_edge, t0e2, t1e1], Some(&state0));
        let n1 = self.add_triangle([new_edge, t1e2, t0e1], Some(&state1));
        Some((n0, n1))
    }

    /// Move a point in place when the triangles around it stay valid and
    /// Delaunay at the new position. Returns false, leaving the point
    /// untouched, otherwise.
    pub fn attempt_cheap_vertex_position_update(
        &mut self,
        triangle: TriangleKey,
        point: PointKey,
        position: Vec3,
    ) -> bool {
        let Some(fan) = self.triangle_fan(triangle, point) else {
            return false;
        };
        let Some(old_pos) = self.cache.get(point).map(|p| p.pos) else {
            return false;
        };

        self.cache.points_mut()[point].pos = position;
        let valid = fan.iter().all(|&t| {
            let [a, b, c] = self.triangle_positions(t);
            if predicates::orient_2d(&a, &b, &c) <= 0.0 {
                return false;
            }
            let (oppo, edge) = self.triangles[t].opposed_triangle(t, &self.edges, point);
            let Some(oppo) = oppo else {
                return true;
            };
            let Some(check) = self.triangles[oppo].opposed_vertex(&self.edges, edge) else {
                return true;
            };
            !(predicates::is_degenerate(&a, &b, &c, DEGENERATE_EPSILON)
                || predicates::circumcircle_contains(&a, &b, &c, &self.pos(check)))
        });
        self.cache.points_mut()[point].pos = old_pos;

        if !valid {
            return false;
        }

        for &t in &fan {
            self.remove_triangle_fast_lookup_ref(t);
        }
        let projected = self.project_to_plane(triangle, &position);
        self.cache.update_vertex(point, projected);
        for &t in &fan {
            self.add_triangle_fast_lookup_ref(t);
        }
        true
    }

    /// Triangles around `point` starting at `triangle`, or `None` when the
    /// fan is open.
    pub(crate) fn triangle_fan(&self, triangle: TriangleKey, point: PointKey) -> Option<Vec<TriangleKey>> {
        let mut fan = vec![triangle];
        let mut current = triangle;
        loop {
            current = self.triangles[current].next_triangle_sharing_point(current, &self.edges, point)?;
            if current == triangle {
                return Some(fan);
            }
            if fan.len() > self.triangles.len() {
                return None;
            }
            fan.push(current);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{assert_delaunay, assert_topology, square_cdt};
    use super::*;

    #[test]
    fn test_add_point_splits_triangle() {
        let mut cdt = square_cdt(100.0);
        let p = cdt.add_point(Vec3::new(70.0, 20.0, 0.0)).unwrap();
        assert!(cdt.point(p).unwrap().is_attached());
        assert_eq!(cdt.triangle_count(), 4);
        assert_topology(&cdt);
        assert_delaunay(&cdt);
    }

    #[test]
    fn test_add_point_twice_is_idempotent() {
        let mut cdt = square_cdt(100.0);
        let a = cdt.add_point(Vec3::new(40.0, 30.0, 0.0)).unwrap();
        let count = cdt.triangle_count();
        let b = cdt.add_point(Vec3::new(41.0, 31.0, 0.0)).unwrap();
        assert_eq!(a, b);
        assert_eq!(cdt.triangle_count(), count);
    }

    #[test]
    fn test_point_on_diagonal() {
        let mut cdt = square_cdt(100.0);
        cdt.add_point(Vec3::new(50.0, 50.0, 0.0)).unwrap();
        assert_eq!(cdt.triangle_count(), 4);
        assert_topology(&cdt);
        assert_delaunay(&cdt);
    }

    #[test]
    fn test_point_on_border_splits_border_edge() {
        let mut cdt = square_cdt(100.0);
        let p = cdt.add_point(Vec3::new(50.0, 0.0, 0.0)).unwrap();
        assert_eq!(cdt.triangle_count(), 3);
        assert_topology(&cdt);
        assert_delaunay(&cdt);

        let halves: Vec<_> = cdt.edges().values().filter(|e| e.contains(p) && !e.is_full()).collect();
        assert_eq!(halves.len(), 2);
        assert!(halves.iter().all(|e| e.is_constraint()));
        let bottom = cdt.edges().values().filter(|e| {
            let [a, b] = [cdt.points()[e.points[0]].pos, cdt.points()[e.points[1]].pos];
            a.y == 0.0 && b.y == 0.0
        });
        assert_eq!(bottom.count(), 2);
    }

    #[test]
    fn test_point_outside_fails() {
        let mut cdt = square_cdt(100.0);
        assert!(matches!(
            cdt.add_point(Vec3::new(500.0, 50.0, 0.0)),
            Err(NaviError::PointOutsideMesh(_))
        ));
    }

    #[test]
    fn test_many_points_stay_delaunay() {
        let mut cdt = square_cdt(1000.0);
        for i in 0..10 {
            for j in 0..10 {
                let x = 50.0 + i as f32 * 97.0 + (j as f32 * 13.0) % 7.0;
                let y = 40.0 + j as f32 * 91.0 + (i as f32 * 17.0) % 11.0;
                cdt.add_point(Vec3::new(x, y, 0.0)).unwrap();
            }
        }
        assert_topology(&cdt);
        assert_delaunay(&cdt);
        // Euler: a triangulated square with n points has 2n - 2 - 4 + 4 triangles.
        assert_eq!(cdt.triangle_count(), 2 * 104 - 2 - 4);
    }

    #[test]
    fn test_cheap_update() {
        let mut cdt = square_cdt(1000.0);
        let p = cdt.add_point(Vec3::new(500.0, 300.0, 0.0)).unwrap();
        let t = cdt.find_triangle_containing_vertex(p).unwrap();
        assert!(cdt.attempt_cheap_vertex_position_update(t, p, Vec3::new(502.0, 301.0, 0.0)));
        assert_eq!(cdt.point(p).unwrap().pos.x, 502.0);
        assert_topology(&cdt);

        // Leaving the fan polygon would invert triangles.
        let t = cdt.find_triangle_containing_vertex(p).unwrap();
        assert!(!cdt.attempt_cheap_vertex_position_update(t, p, Vec3::new(1200.0, 300.0, 0.0)));
        assert_eq!(cdt.point(p).unwrap().pos.x, 502.0);
    }
}
