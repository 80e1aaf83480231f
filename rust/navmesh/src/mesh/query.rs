// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Spatial queries over a generated mesh.

use navi_core::segment::segment_point_distance_sq_2d;
use navi_core::{Aabb, Vec3, Vec3Ext};
use smallvec::SmallVec;

use crate::flags::{PathFlags, PathFlagsCheck};
use crate::keys::TriangleKey;

use super::NaviMesh;

impl NaviMesh {
    /// True when a circle of `radius` at `pos` lies on triangles passing
    /// `check`. An invalid mesh contains nothing.
    pub fn contains(&self, pos: &Vec3, radius: f32, check: &dyn PathFlagsCheck) -> bool {
        if !self.is_mesh_valid {
            return false;
        }
        let Some(start) = self.cdt.find_triangle_at_point(pos) else {
            return false;
        };
        let passes = |t: TriangleKey| !check.can_bypass_check() || check.path_flags_check(self.cdt.triangles()[t].path_flags);
        if !passes(start) {
            return false;
        }
        if radius <= 0.0 {
            return true;
        }

        let radius_sq = radius * radius;
        let mut visited: SmallVec<[TriangleKey; 16]> = SmallVec::new();
        let mut stack = vec![start];
        visited.push(start);
        while let Some(triangle) = stack.pop() {
            for edge_index in 0..3 {
                let edge = self.cdt.triangles()[triangle].edges[edge_index];
                let [a, b] = self.cdt.edge_positions(edge);
                if segment_point_distance_sq_2d(&a, &b, pos) > radius_sq {
                    continue;
                }
                let Some(next) = self.cdt.neighbor(triangle, edge_index) else {
                    return false;
                };
                if visited.contains(&next) {
                    continue;
                }
                if !passes(next) {
                    return false;
                }
                visited.push(next);
                stack.push(next);
            }
        }
        true
    }

    /// `pos` with its height taken from the triangle below it.
    pub fn project_to_mesh(&self, pos: &Vec3) -> Option<Vec3> {
        let triangle = self.cdt.find_triangle_at_point(pos)?;
        Some(self.cdt.project_to_plane(triangle, pos))
    }

    /// Spawnable area of the triangles reachable from the center of
    /// `bounds` whose centroid lies inside it.
    pub fn calc_spawnable_area(&mut self, bounds: &Aabb) -> f32 {
        if !self.is_mesh_valid {
            return 0.0;
        }
        let Some(start) = self.cdt.find_triangle_at_point(&bounds.center()) else {
            return 0.0;
        };

        let serial = self.cdt.next_serial();
        self.cdt.test_triangle_serial(start, serial);
        let mut stack = vec![start];
        let mut area = 0.0;
        while let Some(triangle) = stack.pop() {
            let tri = &self.cdt.triangles()[triangle];
            if bounds.contains_point_2d(&tri.centroid(self.cdt.edges(), self.cdt.points())) {
                area += tri.spawnable_area(self.cdt.edges(), self.cdt.points());
            }
            for edge_index in 0..3 {
                let edge = self.cdt.triangles()[triangle].edges[edge_index];
                if !self.cdt.test_edge_serial(edge, serial) {
                    continue;
                }
                let Some(next) = self.cdt.neighbor(triangle, edge_index) else {
                    continue;
                };
                let positions = self.cdt.triangle_positions(next);
                let overlaps = Aabb::from_points(positions.iter()).is_some_and(|b| b.intersects_2d(bounds));
                if overlaps && self.cdt.test_triangle_serial(next, serial) {
                    stack.push(next);
                }
            }
        }
        area
    }

    /// Flag triangles whose centroid lies within `radius` of `center` as
    /// excluded from spawning. Returns how many were flagged.
    pub fn set_black_out_zone(&mut self, center: &Vec3, radius: f32) -> usize {
        let Some(start) = self.cdt.find_triangle_at_point(center) else {
            return 0;
        };
        let radius_sq = radius * radius;
        let serial = self.cdt.next_serial();
        self.cdt.test_triangle_serial(start, serial);
        let mut stack = vec![start];
        let mut flagged = 0usize;

        while let Some(triangle) = stack.pop() {
            let centroid = self.cdt.triangle_centroid(triangle);
            if centroid.distance_sq_2d(center) <= radius_sq || triangle == start {
                self.cdt.triangles_mut()[triangle].path_flags.insert(PathFlags::BLACK_OUT_ZONE);
                flagged += 1;
            }
            for edge_index in 0..3 {
                let edge = self.cdt.triangles()[triangle].edges[edge_index];
                if !self.cdt.test_edge_serial(edge, serial) {
                    continue;
                }
                let [a, b] = self.cdt.edge_positions(edge);
                if segment_point_distance_sq_2d(&a, &b, center) > radius_sq {
                    continue;
                }
                if let Some(next) = self.cdt.neighbor(triangle, edge_index) {
                    if self.cdt.test_triangle_serial(next, serial) {
                        stack.push(next);
                    }
                }
            }
        }
        tracing::trace!(mesh = self.id.0, flagged, radius, "black out zone set");
        flagged
    }
}
