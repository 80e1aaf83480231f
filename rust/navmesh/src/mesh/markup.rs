// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Traversal markup.
//!
//! A flood fill from the exterior seed triangle carries a content counter
//! vector across the mesh. Crossing a constraint adds the counters of the
//! side being entered and subtracts those of the side being left. Each
//! triangle resolves its counters into [`PathFlags`](crate::flags::PathFlags).
//!
//! Constraints whose two triangles end up with the same meaning are removed
//! afterwards, and the surviving constraints get their side counters
//! rewritten from the triangles they separate.

use crate::error::{NaviError, Result};
use crate::flags::{slot, ContentFlagCounts, EdgeFlags, PathFlags, TriangleFlags};
use crate::keys::{EdgeKey, TriangleKey};

use super::NaviMesh;

/// Add and remove slots per capability, in the order they are compared.
const CAPABILITY_SLOTS: [(usize, usize); 4] = [
    (slot::ADD_WALK, slot::REMOVE_WALK),
    (slot::ADD_FLY, slot::REMOVE_FLY),
    (slot::ADD_POWER, slot::REMOVE_POWER),
    (slot::ADD_SIGHT, slot::REMOVE_SIGHT),
];

struct MarkupState {
    triangle: TriangleKey,
    counts: ContentFlagCounts,
}

impl NaviMesh {
    /// Recompute traversal flags for every triangle.
    ///
    /// With `remove_exterior` the exterior seed is consumed, so later
    /// markups are refused.
    pub fn markup_mesh(&mut self, remove_exterior: bool) -> Result<()> {
        let Some(seed_edge) = self.exterior_seed_edge else {
            return Err(NaviError::MeshNotValid);
        };
        let Some(seed) = self.cdt.edge(seed_edge).and_then(|e| e.any_triangle()) else {
            tracing::error!(mesh = self.id.0, "exterior seed edge has no triangle");
            return Err(NaviError::MeshNotValid);
        };
        self.clear_markup();

        let counts = ContentFlagCounts::exterior();
        Self::apply_counts(self.cdt.triangles_mut(), seed, counts);
        let mut states = vec![MarkupState { triangle: seed, counts }];
        let mut removable: Vec<EdgeKey> = Vec::new();
        let mut visited = 1usize;

        while let Some(state) = states.pop() {
            let triangle = &self.cdt.triangles()[state.triangle];
            let (edges, side_flags) = (triangle.edges, [0, 1, 2].map(|i| triangle.edge_side_flag(i)));

            for (edge_index, edge_key) in edges.into_iter().enumerate() {
                let edge = &self.cdt.edges()[edge_key];
                let Some(oppo) = edge.opposed_triangle(state.triangle) else {
                    continue;
                };
                let (is_constraint, is_door) = (edge.is_constraint(), edge.is_door());

                if !self.cdt.triangles()[oppo].test_flag(TriangleFlags::MARKUP) {
                    let mut counts = state.counts;
                    if is_constraint {
                        // Entering the far side of the edge.
                        let here = side_flags[edge_index];
                        let sides = &edge.pathing.sides;
                        counts.apply(&sides[1 - here], &sides[here]);
                    }
                    Self::apply_counts(self.cdt.triangles_mut(), oppo, counts);
                    states.push(MarkupState { triangle: oppo, counts });
                    visited += 1;
                }

                if is_constraint && !is_door {
                    let ours = &self.cdt.triangles()[state.triangle].content;
                    let theirs = &self.cdt.triangles()[oppo].content;
                    if !Self::keep_edge(ours, theirs) {
                        removable.push(edge_key);
                    }
                }
            }
        }

        let mut removed = 0usize;
        while let Some(edge) = removable.pop() {
            if self.cdt.edge(edge).is_some_and(|e| e.is_constraint()) {
                self.cdt.remove_edge(edge, true)?;
                removed += 1;
            }
        }

        if remove_exterior {
            self.exterior_seed_edge = None;
        }
        self.reverse_markup_mesh();
        self.is_markup = true;
        tracing::trace!(mesh = self.id.0, visited, removed, "markup complete");
        Ok(())
    }

    fn apply_counts(
        triangles: &mut crate::graph::TriangleArena,
        triangle: TriangleKey,
        counts: ContentFlagCounts,
    ) {
        let tri = &mut triangles[triangle];
        tri.content = counts;
        tri.path_flags = counts.to_path_flags();
        tri.flags.insert(TriangleFlags::MARKUP);
    }

    /// A constraint is kept while it separates triangles that differ in
    /// at least one capability. Remove counts decide when either side has
    /// one; add counts decide otherwise.
    fn keep_edge(ours: &ContentFlagCounts, theirs: &ContentFlagCounts) -> bool {
        CAPABILITY_SLOTS.iter().any(|&(add, remove)| {
            if ours.get(remove) == 0 && theirs.get(remove) == 0 {
                (ours.get(add) > 0) ^ (theirs.get(add) > 0)
            } else {
                (ours.get(remove) > 0) ^ (theirs.get(remove) > 0)
            }
        })
    }

    /// Rewrite the side counters of surviving constraints from the
    /// triangles on each side. Remove outranks add for walking.
    fn reverse_markup_mesh(&mut self) {
        let triangle_keys: Vec<TriangleKey> = self.cdt.triangles().keys().collect();
        for key in triangle_keys {
            let triangle = &self.cdt.triangles()[key];
            let content = triangle.content;
            let edges = triangle.edges;
            let sides = [0, 1, 2].map(|i| triangle.edge_side_flag(i));

            for (edge_index, edge_key) in edges.into_iter().enumerate() {
                let Some(edge) = self.cdt.edge_mut(edge_key) else {
                    continue;
                };
                if !edge.is_constraint() || edge.test_flag(EdgeFlags::DOOR) {
                    continue;
                }
                let side = sides[edge_index];
                edge.pathing.clear_side(side);
                let counts = &mut edge.pathing.sides[side];
                if content.get(slot::REMOVE_WALK) > 0 {
                    counts.set(slot::REMOVE_WALK, 1);
                } else if content.get(slot::ADD_WALK) > 0 {
                    counts.set(slot::ADD_WALK, 1);
                }
                for remove in [slot::REMOVE_FLY, slot::REMOVE_POWER, slot::REMOVE_SIGHT] {
                    if content.get(remove) > 0 {
                        counts.set(remove, 1);
                    }
                }
            }
        }
    }

    fn clear_markup(&mut self) {
        for (_, triangle) in self.cdt.triangles_mut().iter_mut() {
            triangle.flags.remove(TriangleFlags::MARKUP);
            triangle.path_flags = PathFlags::NONE;
            triangle.content.clear();
        }
        self.is_markup = false;
    }
}

#[cfg(test)]
mod tests {
    use navi_core::{Transform3, Vec3};

    use super::super::tests::{floor_mesh, walled_mesh};
    use crate::flags::{ContentFlags, PathFlags};
    use crate::patch::NaviPatch;

    use super::*;

    fn flags_at(mesh: &NaviMesh, x: f32, y: f32) -> PathFlags {
        let cdt = mesh.cdt();
        let t = cdt.find_triangle_at_point(&Vec3::new(x, y, 0.0)).unwrap();
        cdt.triangle(t).unwrap().path_flags
    }

    #[test]
    fn test_keep_edge_rules() {
        let exterior = ContentFlagCounts::exterior();
        let mut floor = exterior;
        floor.set(slot::ADD_WALK, 1);
        assert!(NaviMesh::keep_edge(&exterior, &floor));
        assert!(!NaviMesh::keep_edge(&floor, &floor));

        // Two walls stacked on a floor: both sides blocked, same meaning.
        let mut wall = floor;
        wall.set(slot::REMOVE_WALK, 1);
        let mut double_wall = floor;
        double_wall.set(slot::REMOVE_WALK, 2);
        assert!(!NaviMesh::keep_edge(&wall, &double_wall));
        assert!(NaviMesh::keep_edge(&wall, &floor));
    }

    #[test]
    fn test_wall_is_not_walkable() {
        let mesh = walled_mesh(Vec3::new(400.0, 400.0, 0.0), Vec3::new(600.0, 600.0, 0.0));
        assert!(!flags_at(&mesh, 500.0, 500.0).contains(PathFlags::WALK));
        assert!(flags_at(&mesh, 200.0, 500.0).contains(PathFlags::WALK));
        assert!(flags_at(&mesh, 800.0, 500.0).contains(PathFlags::TALL_WALK));
    }

    #[test]
    fn test_every_triangle_is_marked() {
        let mesh = walled_mesh(Vec3::new(100.0, 100.0, 0.0), Vec3::new(300.0, 200.0, 0.0));
        for (_, t) in mesh.cdt().triangles().iter() {
            assert!(t.test_flag(TriangleFlags::MARKUP));
        }
    }

    #[test]
    fn test_overlapping_floors_drop_inner_constraints() {
        let mut mesh = floor_mesh();
        // A second floor inside the first adds no meaning.
        mesh.stitch(
            NaviPatch::rectangle(Vec3::new(200.0, 200.0, 0.0), Vec3::new(400.0, 400.0, 0.0), ContentFlags::ADD_WALK),
            Transform3::identity(),
        )
        .unwrap();
        mesh.generate_mesh().unwrap();
        assert!(flags_at(&mesh, 300.0, 300.0).contains(PathFlags::WALK));
        assert!(mesh.cdt().find_attached_point_at_point(&Vec3::new(200.0, 200.0, 0.0)).is_none());
    }

    #[test]
    fn test_reverse_markup_matches_triangles() {
        let mesh = walled_mesh(Vec3::new(400.0, 400.0, 0.0), Vec3::new(600.0, 600.0, 0.0));
        let cdt = mesh.cdt();
        for (key, edge) in cdt.edges().iter() {
            if !edge.is_constraint() || !edge.is_full() {
                continue;
            }
            for t in edge.triangles.iter().flatten() {
                let tri = cdt.triangle(*t).unwrap();
                let side = tri.edge_side_flag(tri.edge_index(key));
                let walk_blocked = tri.content.get(slot::REMOVE_WALK) > 0;
                assert_eq!(edge.pathing.sides[side].get(slot::REMOVE_WALK) > 0, walk_blocked);
            }
        }
    }

    #[test]
    fn test_remove_exterior_blocks_remarkup() {
        let mut mesh = floor_mesh();
        mesh.generate_mesh().unwrap();
        mesh.markup_mesh(true).unwrap();
        assert!(mesh.exterior_seed_edge().is_none());
        assert!(mesh.markup_mesh(false).is_err());
    }
}
