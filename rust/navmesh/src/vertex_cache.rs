// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Vertex deduplication.
//!
//! Every mesh point goes through [`VertexCache::cache_vertex`], which snaps a
//! position to an existing point within [`MERGE_DISTANCE_SQ`]. The cache owns
//! the point arena; triangulation code only holds [`PointKey`]s.
//!
//! The hash grid uses square cells of [`CELL_SIZE`] on the xy plane. A lookup
//! scans every cell touched by a box of half-size [`EPSILON`] around the
//! query, so merges never miss a neighbor across a cell border.

use navi_core::{Vec3, Vec3Ext};
use rustc_hash::FxHashMap;
use slotmap::SlotMap;
use smallvec::SmallVec;

use crate::flags::PointFlags;
use crate::keys::PointKey;

/// Side length of a hash cell.
pub const CELL_SIZE: f32 = 12.0;
/// Half-size of the search box around a query position.
pub const EPSILON: f32 = 4.0;
/// Squared planar distance under which two positions are the same point.
pub const MERGE_DISTANCE_SQ: f32 = 9.0;

/// A mesh vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct NaviPoint {
    pub pos: Vec3,
    pub flags: PointFlags,
    /// Number of dynamic obstacles sharing this point.
    pub influence_ref: i8,
    pub influence_radius: f32,
    /// Creation order, used as a stable tie-breaker.
    pub id: u64,
}

impl NaviPoint {
    pub fn is_attached(&self) -> bool {
        self.flags.contains(PointFlags::ATTACHED)
    }

    pub fn has_influence(&self) -> bool {
        self.influence_ref > 0
    }
}

pub type PointArena = SlotMap<PointKey, NaviPoint>;

type CellKey = (i32, i32);

/// Spatial hash over mesh points.
#[derive(Debug, Default)]
pub struct VertexCache {
    points: PointArena,
    grid: FxHashMap<CellKey, SmallVec<[PointKey; 4]>>,
    next_id: u64,
    budget: usize,
}

impl VertexCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the cache and reserve room for `max_points` vertices.
    pub fn initialize(&mut self, max_points: usize) {
        self.clear();
        self.budget = max_points;
        self.points.reserve(max_points.min(1 << 16));
        tracing::trace!(max_points, "vertex cache initialized");
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.grid.clear();
        self.next_id = 0;
    }

    pub fn points(&self) -> &PointArena {
        &self.points
    }

    pub fn points_mut(&mut self) -> &mut PointArena {
        &mut self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    pub fn get(&self, key: PointKey) -> Option<&NaviPoint> {
        self.points.get(key)
    }

    pub fn get_mut(&mut self, key: PointKey) -> Option<&mut NaviPoint> {
        self.points.get_mut(key)
    }

    /// Returns the point at `pos`, creating it when no existing point is
    /// close enough. The flag reports whether a point was created.
    pub fn cache_vertex(&mut self, pos: Vec3) -> (PointKey, bool) {
        if let Some(existing) = self.find_vertex(&pos) {
            return (existing, false);
        }
        if self.budget > 0 && self.points.len() == self.budget {
            tracing::warn!(budget = self.budget, "vertex cache exceeded its point budget");
        }
        let id = self.next_id;
        self.next_id += 1;
        let key = self.points.insert(NaviPoint {
            pos,
            flags: PointFlags::NONE,
            influence_ref: 0,
            influence_radius: 0.0,
            id,
        });
        self.grid.entry(cell_of(&pos)).or_default().push(key);
        (key, true)
    }

    /// Point within merge distance of `pos`, nearest first.
    pub fn find_vertex(&self, pos: &Vec3) -> Option<PointKey> {
        let (min_x, min_y) = cell_of(&Vec3::new(pos.x - EPSILON, pos.y - EPSILON, 0.0));
        let (max_x, max_y) = cell_of(&Vec3::new(pos.x + EPSILON, pos.y + EPSILON, 0.0));

        let mut best: Option<(PointKey, f32)> = None;
        for cx in min_x..=max_x {
            for cy in min_y..=max_y {
                let Some(keys) = self.grid.get(&(cx, cy)) else {
                    continue;
                };
                for &key in keys {
                    let Some(point) = self.points.get(key) else {
                        continue;
                    };
                    let dist_sq = point.pos.distance_sq_2d(pos);
                    if dist_sq <= MERGE_DISTANCE_SQ && best.map_or(true, |(_, d)| dist_sq < d) {
                        best = Some((key, dist_sq));
                    }
                }
            }
        }
        best.map(|(key, _)| key)
    }

    /// Move a point, keeping the grid consistent.
    pub fn update_vertex(&mut self, key: PointKey, pos: Vec3) {
        let Some(point) = self.points.get_mut(key) else {
            return;
        };
        let old_cell = cell_of(&point.pos);
        point.pos = pos;
        let new_cell = cell_of(&pos);
        if old_cell != new_cell {
            self.unlink(key, old_cell);
            self.grid.entry(new_cell).or_default().push(key);
        }
    }

    /// Drop a point from the cache.
    pub fn remove_vertex(&mut self, key: PointKey) -> Option<NaviPoint> {
        let point = self.points.remove(key)?;
        self.unlink(key, cell_of(&point.pos));
        Some(point)
    }

    fn unlink(&mut self, key: PointKey, cell: CellKey) {
        if let Some(keys) = self.grid.get_mut(&cell) {
            keys.retain(|k| *k != key);
            if keys.is_empty() {
                self.grid.remove(&cell);
            }
        }
    }
}

#[inline]
fn cell_of(pos: &Vec3) -> CellKey {
    (
        (pos.x / CELL_SIZE).floor() as i32,
        (pos.y / CELL_SIZE).floor() as i32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_vertex_merges_near_points() {
        let mut cache = VertexCache::new();
        let (a, created_a) = cache.cache_vertex(Vec3::new(10.0, 10.0, 0.0));
        let (b, created_b) = cache.cache_vertex(Vec3::new(12.0, 11.0, 5.0));
        assert!(created_a);
        assert!(!created_b);
        assert_eq!(a, b);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_vertex_across_cell_border() {
        let mut cache = VertexCache::new();
        let (a, _) = cache.cache_vertex(Vec3::new(11.9, 0.0, 0.0));
        let (b, _) = cache.cache_vertex(Vec3::new(12.1, 0.0, 0.0));
        assert_eq!(a, b);
    }

    #[test]
    fn test_far_points_stay_distinct() {
        let mut cache = VertexCache::new();
        let (a, _) = cache.cache_vertex(Vec3::new(0.0, 0.0, 0.0));
        let (b, _) = cache.cache_vertex(Vec3::new(3.5, 0.0, 0.0));
        assert_ne!(a, b);
        assert!(cache.get(a).unwrap().id < cache.get(b).unwrap().id);
    }

    #[test]
    fn test_update_and_remove() {
        let mut cache = VertexCache::new();
        let (a, _) = cache.cache_vertex(Vec3::new(0.0, 0.0, 0.0));
        cache.update_vertex(a, Vec3::new(100.0, 100.0, 0.0));
        assert_eq!(cache.find_vertex(&Vec3::new(0.0, 0.0, 0.0)), None);
        assert_eq!(cache.find_vertex(&Vec3::new(101.0, 100.0, 0.0)), Some(a));

        assert!(cache.remove_vertex(a).is_some());
        assert_eq!(cache.find_vertex(&Vec3::new(100.0, 100.0, 0.0)), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_negative_coordinates() {
        let mut cache = VertexCache::new();
        let (a, _) = cache.cache_vertex(Vec3::new(-0.5, -0.5, 0.0));
        let (b, _) = cache.cache_vertex(Vec3::new(0.5, 0.5, 0.0));
        assert_eq!(a, b);
    }
}
