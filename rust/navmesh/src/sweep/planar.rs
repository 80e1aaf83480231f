// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Circle sweep across the triangulation.

use navi_core::circle::{intersects_ray, sweep_segment_2d};
use navi_core::segment::{ray_segment_intersect_2d, segment_segment_distance_sq_2d, EPSILON};
use navi_core::{SweepSegmentFlags, Vec3, Vec3Ext};

use crate::flags::PathFlags;
use crate::keys::TriangleKey;
use crate::mesh::NaviMesh;

use super::{SweepOutcome, SweepResult};

/// A start closer than this to a vertex is treated as sitting on it.
const VERTEX_SNAP_DISTANCE: f32 = 0.1;

/// Fan size guard when rotating around a vertex.
const MAX_FAN_STEPS: usize = 64;

impl NaviMesh {
    pub(super) fn planar_sweep(
        &mut self,
        from: &Vec3,
        to: &Vec3,
        radius: f32,
        path_flags: PathFlags,
        padding: f32,
    ) -> SweepOutcome {
        if !self.is_mesh_valid() {
            return SweepOutcome::failed(*from);
        }
        if !Vec3Ext::is_finite(from) || !Vec3Ext::is_finite(to) || !radius.is_finite() || radius < 0.0 {
            tracing::debug!("sweep rejected non-finite input");
            return SweepOutcome::failed(*from);
        }
        let Some(start) = self.cdt().find_triangle_at_point(from) else {
            tracing::debug!(x = from.x, y = from.y, "sweep start outside the mesh");
            return SweepOutcome::failed(*from);
        };
        if !self.cdt().triangle_passes(start, path_flags) {
            return SweepOutcome::failed(*from);
        }

        let travel = (to - from).to_2d();
        let magnitude = travel.length_2d();
        if magnitude < EPSILON {
            return SweepOutcome::success(self.cdt().project_to_plane(start, from));
        }
        let dir = travel / magnitude;
        let start = self.facing_start_triangle(start, from, &dir);

        let serial = self.cdt_mut().next_serial();
        let mut stack = vec![start];
        let mut min_distance = f32::MAX;
        let mut normal: Option<Vec3> = None;

        while let Some(triangle) = stack.pop() {
            let edges = self.cdt().triangles()[triangle].edges;
            let mut corners = [false; 3];
            for (i, &edge_key) in edges.iter().enumerate() {
                if !self.cdt_mut().test_edge_serial(edge_key, serial) {
                    continue;
                }
                let cdt = self.cdt();
                let tri = &cdt.triangles()[triangle];
                let p0 = cdt.points()[tri.edge_point_cw(cdt.edges(), i, 0)].pos;
                let p1 = cdt.points()[tri.edge_point_cw(cdt.edges(), i, 1)].pos;
                let edge = &cdt.edges()[edge_key];
                let opposite = edge.opposed_triangle(triangle);
                let blocking = edge.is_door() || opposite.map_or(true, |o| !cdt.triangle_passes(o, path_flags));

                if blocking {
                    if let Some(d) = sweep_segment_2d(&p0, &p1, from, radius, &dir, magnitude, SweepSegmentFlags::IgnoreBackfacing) {
                        if d < min_distance {
                            min_distance = d;
                            let n = (p1 - p0).perp_2d().safe_normalize_2d();
                            normal = Some(if n.dot_2d(&(from - p0)) >= 0.0 { n } else { -n });
                        }
                    }
                    corners[i] = true;
                    corners[(i + 1) % 3] = true;
                } else if let Some(next) = opposite {
                    let reach = (radius * radius).max(EPSILON);
                    if segment_segment_distance_sq_2d(&p0, &p1, from, to) <= reach {
                        stack.push(next);
                    }
                }
            }

            let cdt = self.cdt();
            let tri = &cdt.triangles()[triangle];
            for (i, _) in corners.iter().enumerate().filter(|(_, marked)| **marked) {
                let vertex = cdt.points()[tri.point_cw(cdt.edges(), i)].pos;
                if let Some(d) = intersects_ray(from, &dir, &vertex, radius) {
                    if d < min_distance {
                        min_distance = d;
                        normal = Some((from + dir * d - vertex).safe_normalize_2d_or(-dir));
                    }
                }
            }
        }

        if min_distance <= magnitude {
            let distance = (min_distance - padding).max(0.0);
            let position = if distance < EPSILON {
                *from
            } else {
                from + (to - from) * (distance / magnitude)
            };
            return SweepOutcome {
                result: SweepResult::Clipped,
                position,
                normal,
            };
        }
        SweepOutcome::success(*to)
    }

    /// When the start sits on a vertex of `triangle`, the triangle of that
    /// vertex's fan the travel direction leaves through.
    fn facing_start_triangle(&self, triangle: TriangleKey, from: &Vec3, dir: &Vec3) -> TriangleKey {
        let cdt = self.cdt();
        let edges = cdt.edges();
        let tri = &cdt.triangles()[triangle];
        let Some(vertex) = tri
            .points(edges)
            .into_iter()
            .find(|&p| cdt.points()[p].pos.distance_2d(from) < VERTEX_SNAP_DISTANCE)
        else {
            return triangle;
        };

        let mut current = triangle;
        for _ in 0..MAX_FAN_STEPS {
            let t = &cdt.triangles()[current];
            let far = t.opposed_edge_index(edges, vertex);
            let q0 = cdt.points()[t.edge_point_cw(edges, far, 0)].pos;
            let q1 = cdt.points()[t.edge_point_cw(edges, far, 1)].pos;
            if ray_segment_intersect_2d(from, dir, &q0, &(q1 - q0)).is_some() {
                return current;
            }
            match t.next_triangle_sharing_point(current, edges, vertex) {
                Some(next) if next != triangle => current = next,
                _ => break,
            }
        }
        triangle
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::mesh::tests::{floor_mesh, walled_mesh};

    fn v(x: f32, y: f32) -> Vec3 {
        Vec3::new(x, y, 0.0)
    }

    fn wall() -> NaviMesh {
        walled_mesh(v(400.0, 200.0), v(600.0, 800.0))
    }

    #[test]
    fn test_zero_length_sweep_succeeds_in_place() {
        let mut mesh = wall();
        let out = mesh.sweep(&v(100.0, 100.0), &v(100.0, 100.0), 10.0, PathFlags::WALK);
        assert_eq!(out.result, SweepResult::Success);
        assert_relative_eq!(out.position.x, 100.0);
        assert_relative_eq!(out.position.y, 100.0);
        assert!(out.normal.is_none());
    }

    #[test]
    fn test_open_floor_reaches_destination() {
        let mut mesh = wall();
        let out = mesh.sweep(&v(100.0, 100.0), &v(900.0, 100.0), 10.0, PathFlags::WALK);
        assert_eq!(out.result, SweepResult::Success);
        assert_eq!(out.position, v(900.0, 100.0));
    }

    #[test]
    fn test_clipped_against_wall() {
        let mut mesh = wall();
        let out = mesh.do_sweep(&v(100.0, 500.0), &v(900.0, 500.0), 0.0, PathFlags::WALK, 0.0, None);
        assert_eq!(out.result, SweepResult::Clipped);
        assert_relative_eq!(out.position.x, 400.0, epsilon = 1e-2);
        let normal = out.normal.unwrap();
        assert_relative_eq!(normal.x, -1.0, epsilon = 1e-4);

        let out = mesh.do_sweep(&v(100.0, 500.0), &v(900.0, 500.0), 25.0, PathFlags::WALK, 5.0, None);
        assert_eq!(out.result, SweepResult::Clipped);
        assert_relative_eq!(out.position.x, 370.0, epsilon = 1e-2);
    }

    #[test]
    fn test_corner_graze() {
        let mut mesh = wall();
        // Passes 5 units below the wall's lower left corner.
        let out = mesh.do_sweep(&v(100.0, 195.0), &v(900.0, 195.0), 10.0, PathFlags::WALK, 0.0, None);
        assert_eq!(out.result, SweepResult::Clipped);
        assert!(out.position.x < 400.0);
        assert!(out.position.x > 380.0);

        let out = mesh.sweep(&v(100.0, 150.0), &v(900.0, 150.0), 10.0, PathFlags::WALK);
        assert_eq!(out.result, SweepResult::Success);
    }

    #[test]
    fn test_more_clearance_clips_earlier() {
        let mut mesh = wall();
        let mut last = f32::MAX;
        for radius in [0.0, 10.0, 40.0, 80.0] {
            let out = mesh.do_sweep(&v(100.0, 500.0), &v(900.0, 500.0), radius, PathFlags::WALK, 0.0, None);
            assert_eq!(out.result, SweepResult::Clipped);
            assert!(out.position.x < last);
            last = out.position.x;
        }
    }

    #[test]
    fn test_moving_away_from_touching_edge() {
        let mut mesh = wall();
        let out = mesh.sweep(&v(395.0, 500.0), &v(100.0, 500.0), 10.0, PathFlags::WALK);
        assert_eq!(out.result, SweepResult::Success);
    }

    #[test]
    fn test_start_on_vertex() {
        let mut mesh = wall();
        // Within snapping distance of the wall's lower left corner.
        let out = mesh.do_sweep(&v(399.95, 199.95), &v(200.0, 100.0), 0.0, PathFlags::WALK, 0.0, None);
        assert_eq!(out.result, SweepResult::Success);
    }

    #[test]
    fn test_failures() {
        let mut mesh = wall();
        // Start inside the wall.
        let out = mesh.sweep(&v(500.0, 500.0), &v(900.0, 500.0), 0.0, PathFlags::WALK);
        assert_eq!(out.result, SweepResult::Failed);
        // Start outside the mesh.
        let out = mesh.sweep(&v(-500.0, 500.0), &v(100.0, 500.0), 0.0, PathFlags::WALK);
        assert_eq!(out.result, SweepResult::Failed);
        let out = mesh.sweep(&v(f32::NAN, 500.0), &v(100.0, 500.0), 0.0, PathFlags::WALK);
        assert_eq!(out.result, SweepResult::Failed);

        let mut ungenerated = floor_mesh();
        let out = ungenerated.sweep(&v(100.0, 100.0), &v(200.0, 100.0), 0.0, PathFlags::WALK);
        assert_eq!(out.result, SweepResult::Failed);
    }
}
