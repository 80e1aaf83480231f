// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Randomized invariants of the triangulation.

use navi_core::predicates::{circumcircle_contains, orient_2d};
use navi_core::segment::segments_intersect_2d;
use navi_core::{Aabb, Vec3};
use navi_mesh::flags::EdgePathingFlags;
use navi_mesh::{EdgeFlags, EdgeRequest, NaviCdt};
use proptest::prelude::*;

const SIZE: f32 = 1000.0;

fn square() -> NaviCdt {
    let mut cdt = NaviCdt::new();
    cdt.create(Aabb::new(Vec3::zeros(), Vec3::new(SIZE, SIZE, 0.0)), 4096);
    let p = [
        cdt.add_seed_point(Vec3::new(0.0, 0.0, 0.0)),
        cdt.add_seed_point(Vec3::new(SIZE, 0.0, 0.0)),
        cdt.add_seed_point(Vec3::new(SIZE, SIZE, 0.0)),
        cdt.add_seed_point(Vec3::new(0.0, SIZE, 0.0)),
    ];
    let e0 = cdt.add_seed_edge(p[0], p[1], EdgeFlags::CONSTRAINT);
    let e1 = cdt.add_seed_edge(p[1], p[2], EdgeFlags::CONSTRAINT);
    let e2 = cdt.add_seed_edge(p[2], p[3], EdgeFlags::CONSTRAINT);
    let e3 = cdt.add_seed_edge(p[3], p[0], EdgeFlags::CONSTRAINT);
    let diagonal = cdt.add_seed_edge(p[0], p[2], EdgeFlags::NONE);
    cdt.add_seed_triangle([e0, e1, diagonal]);
    cdt.add_seed_triangle([e2, e3, diagonal]);
    cdt
}

fn assert_delaunay(cdt: &NaviCdt) {
    for (key, edge) in cdt.edges().iter() {
        if edge.is_constraint() {
            continue;
        }
        let (Some(t0), Some(t1)) = (edge.triangles[0], edge.triangles[1]) else {
            continue;
        };
        let [a, b, c] = cdt.triangle_positions(t0);
        let Some(opposite) = cdt.triangles()[t1].opposed_vertex(cdt.edges(), key) else {
            continue;
        };
        let d = cdt.points()[opposite].pos;
        assert!(!circumcircle_contains(&a, &b, &c, &d), "edge {key:?} is not locally Delaunay");
    }
}

fn assert_planar(cdt: &NaviCdt) {
    let segments: Vec<[Vec3; 2]> = cdt.edges().keys().map(|e| cdt.edge_positions(e)).collect();
    for (i, s) in segments.iter().enumerate() {
        for t in &segments[i + 1..] {
            assert!(!segments_intersect_2d(&s[0], &s[1], &t[0], &t[1]), "edges {s:?} and {t:?} cross");
        }
    }
    for key in cdt.triangles().keys() {
        let [a, b, c] = cdt.triangle_positions(key);
        assert!(orient_2d(&a, &b, &c) > 0.0);
    }
}

fn coord() -> impl Strategy<Value = f32> {
    (10u32..990).prop_map(|v| v as f32)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn point_insertion_keeps_delaunay(points in prop::collection::vec((coord(), coord()), 1..40)) {
        let mut cdt = square();
        for (x, y) in points {
            cdt.add_point(Vec3::new(x, y, 0.0)).unwrap();
        }
        assert_delaunay(&cdt);
        assert_planar(&cdt);
    }

    #[test]
    fn close_points_share_a_vertex(x in coord(), y in coord(), dx in 0.0f32..2.0, dy in 0.0f32..2.0) {
        let mut cdt = square();
        let a = cdt.add_point(Vec3::new(x, y, 0.0)).unwrap();
        let b = cdt.add_point(Vec3::new(x + dx, y + dy, 0.0)).unwrap();
        prop_assert_eq!(a, b);
        prop_assert_eq!(cdt.points().len(), 5);
    }

    #[test]
    fn constraints_keep_the_graph_planar(
        points in prop::collection::vec((coord(), coord()), 2..16),
        pairs in prop::collection::vec((0usize..16, 0usize..16), 1..6),
    ) {
        let mut cdt = square();
        let keys: Vec<_> = points
            .iter()
            .map(|&(x, y)| cdt.add_point(Vec3::new(x, y, 0.0)).unwrap())
            .collect();
        for (i, j) in pairs {
            let (p0, p1) = (keys[i % keys.len()], keys[j % keys.len()]);
            if p0 == p1 {
                continue;
            }
            let request = EdgeRequest::new(p0, p1, EdgeFlags::CONSTRAINT, EdgePathingFlags::default());
            // Crossing constraints may be rejected; the triangulation must stay sound either way.
            let _ = cdt.add_edge(request);
        }
        assert_planar(&cdt);
    }
}
