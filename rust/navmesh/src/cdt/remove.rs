// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Point removal.
//!
//! The star of the point is removed and the hole re-triangulated by ear
//! clipping, always cutting the ear whose circumcircle has the lowest power
//! with respect to the removed point. That order keeps the result Delaunay.

use navi_core::{predicates, Vec3};

use super::NaviCdt;
use crate::flags::{EdgeFlags, EdgePathingFlags, PointFlags};
use crate::keys::{EdgeKey, PointKey, TriangleKey};

/// One vertex of the hole boundary with the boundary edge leaving it.
#[derive(Debug, Clone, Copy)]
struct Ear {
    point: PointKey,
    edge: EdgeKey,
    prev: usize,
    next: usize,
    power: f64,
    alive: bool,
}

impl NaviCdt {
    /// Remove `point`, starting from one of its triangles. Returns `false`
    /// and leaves the mesh untouched when the point lies on the border.
    pub fn remove_point(&mut self, point: PointKey, triangle: TriangleKey) -> bool {
        let Some(fan) = self.triangle_fan(triangle, point) else {
            tracing::debug!(?point, "point on an open border cannot be removed");
            return false;
        };
        if fan.len() < 3 {
            return false;
        }

        let state = self.triangles[triangle].state();
        let count = fan.len();
        let mut ears: Vec<Ear> = fan
            .iter()
            .enumerate()
            .map(|(i, &t)| {
                let tri = &self.triangles[t];
                let oppo = tri.opposed_edge_index(&self.edges, point);
                Ear {
                    point: tri.edge_point_cw(&self.edges, oppo, 0),
                    edge: tri.edges[oppo],
                    prev: (i + count - 1) % count,
                    next: (i + 1) % count,
                    power: f64::INFINITY,
                    alive: true,
                }
            })
            .collect();

        for t in fan {
            self.remove_triangle(t);
        }

        let center = self.pos(point);
        for i in 0..count {
            ears[i].power = self.ear_power(&ears, i, &center);
        }

        let mut remaining = count;
        while remaining > 3 {
            let mut best = None;
            for (i, ear) in ears.iter().enumerate() {
                if ear.alive && best.map_or(true, |b: usize| ear.power < ears[b].power) {
                    best = Some(i);
                }
            }
            let Some(i) = best else {
                break;
            };

            let Ear { prev, next, edge, .. } = ears[i];
            let diagonal = self.create_edge(
                ears[prev].point,
                ears[next].point,
                EdgeFlags::NONE,
                EdgePathingFlags::default(),
            );
            self.add_triangle([ears[prev].edge, edge, diagonal], Some(&state));

            ears[i].alive = false;
            ears[prev].edge = diagonal;
            ears[prev].next = next;
            ears[next].prev = prev;
            remaining -= 1;

            ears[prev].power = self.ear_power(&ears, prev, &center);
            ears[next].power = self.ear_power(&ears, next, &center);
        }

        if let Some(last) = ears.iter().position(|e| e.alive) {
            let Ear { prev, next, edge, .. } = ears[last];
            self.add_triangle([ears[prev].edge, edge, ears[next].edge], Some(&state));
        }

        if let Some(p) = self.cache.get_mut(point) {
            p.flags.remove(PointFlags::ATTACHED);
        }
        true
    }

    /// Power of `center` against the circumcircle of ear `i`; infinite for
    /// reflex or flat ears.
    fn ear_power(&self, ears: &[Ear], i: usize, center: &Vec3) -> f64 {
        let a = self.pos(ears[ears[i].prev].point);
        let b = self.pos(ears[i].point);
        let c = self.pos(ears[ears[i].next].point);
        if predicates::orient_2d(&a, &b, &c) <= 0.0 {
            return f64::INFINITY;
        }
        match predicates::circumcircle_2d(&a, &b, &c) {
            Some(((cx, cy), radius_sq)) => {
                let dx = center.x as f64 - cx;
                let dy = center.y as f64 - cy;
                dx * dx + dy * dy - radius_sq
            }
            None => f64::INFINITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{assert_delaunay, assert_topology, square_cdt};
    use super::*;

    #[test]
    fn test_remove_inserted_point_restores_square() {
        let mut cdt = square_cdt(100.0);
        let p = cdt.add_point(Vec3::new(30.0, 60.0, 0.0)).unwrap();
        assert_eq!(cdt.triangle_count(), 4);
        let t = cdt.find_triangle_containing_vertex(p).unwrap();
        assert!(cdt.remove_point(p, t));
        cdt.collect_orphans();
        assert_eq!(cdt.triangle_count(), 2);
        assert!(!cdt.point(p).unwrap().is_attached());
        assert_topology(&cdt);
    }

    #[test]
    fn test_remove_from_dense_grid_stays_delaunay() {
        let mut cdt = square_cdt(1000.0);
        let mut inner = Vec::new();
        for i in 1..8 {
            for j in 1..8 {
                let jitter = ((i * 7 + j * 13) % 11) as f32;
                inner.push(cdt.add_point(Vec3::new(i as f32 * 120.0 + jitter, j as f32 * 120.0 - jitter, 0.0)).unwrap());
            }
        }
        let before = cdt.triangle_count();
        for &p in inner.iter().step_by(5) {
            let t = cdt.find_triangle_containing_vertex(p).unwrap();
            assert!(cdt.remove_point(p, t));
            cdt.collect_orphans();
        }
        assert_topology(&cdt);
        assert_delaunay(&cdt);
        // Each removal of an interior point drops two triangles.
        let removed = inner.iter().step_by(5).count();
        assert_eq!(cdt.triangle_count(), before - 2 * removed);
    }

    #[test]
    fn test_border_point_is_kept() {
        let mut cdt = square_cdt(100.0);
        let corner = cdt.find_attached_point_at_point(&Vec3::new(0.0, 0.0, 0.0)).unwrap();
        let t = cdt.find_triangle_containing_vertex(corner).unwrap();
        assert!(!cdt.remove_point(corner, t));
        assert_eq!(cdt.triangle_count(), 2);
    }
}
