// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Constrained Delaunay triangulation.
//!
//! [`NaviCdt`] owns the point, edge and triangle arenas and keeps the
//! triangulation Delaunay everywhere except across constraint edges.
//!
//! ## Layout
//!
//! - `insert`: point insertion, triangle split, Delaunay flips
//! - `constraint`: constraint insertion and removal, collinear merging
//! - `remove`: point removal
//! - `export`: Wavefront OBJ dump
//!
//! Point location is seeded from a coarse sector grid (one triangle per
//! [`SECTOR_SIZE`] cell) and walks toward the query across the edge that
//! faces it most.
//!
//! Edges that lose their last triangle are queued as orphans and dropped
//! when a public operation finishes, so keys held during an operation stay
//! valid.

mod constraint;
mod export;
mod insert;
mod remove;

pub use constraint::EdgeRequest;

use navi_core::{predicates, Aabb, Vec3, Vec3Ext};

use crate::error::{NaviError, Result};
use crate::flags::{EdgeFlags, EdgePathingFlags, PathFlags, PointFlags, TriangleFlags};
use crate::graph::{EdgeArena, NaviEdge, NaviTriangle, TriangleArena, TriangleState};
use crate::keys::{EdgeKey, PointKey, TriangleKey};
use crate::vertex_cache::{NaviPoint, PointArena, VertexCache};

/// Side length of a point-location sector.
pub const SECTOR_SIZE: f32 = 1024.0;
/// Squared distance under which a point snaps onto a constraint.
pub const SPLIT_EPSILON_SQ: f32 = 6.25;
/// Step limit for one point-location walk.
pub const LOCATE_ITERATION_CAP: usize = 50_000;
/// Steps logged after the walk cap is hit.
const LOCATE_DUMP_STEPS: usize = 20;

#[derive(Debug, Default)]
pub struct NaviCdt {
    cache: VertexCache,
    edges: EdgeArena,
    triangles: TriangleArena,
    bounds: Aabb,
    sector_columns: usize,
    sector_rows: usize,
    sectors: Vec<Option<TriangleKey>>,
    last_triangle: Option<TriangleKey>,
    serial: u32,
    orphans: Vec<EdgeKey>,
}

impl NaviCdt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the triangulation and size the sector grid for `bounds`.
    pub fn create(&mut self, bounds: Aabb, max_points: usize) {
        self.release();
        self.cache.initialize(max_points);
        self.bounds = bounds;
        self.sector_columns = (bounds.width() / SECTOR_SIZE) as usize + 1;
        self.sector_rows = (bounds.length() / SECTOR_SIZE) as usize + 1;
        self.sectors = vec![None; self.sector_columns * self.sector_rows];
        tracing::trace!(
            columns = self.sector_columns,
            rows = self.sector_rows,
            sectors = self.sectors.len(),
            "fast triangle lookup grid"
        );
    }

    /// Drop every point, edge and triangle.
    pub fn release(&mut self) {
        self.triangles.clear();
        self.edges.clear();
        self.cache.clear();
        self.orphans.clear();
        self.sectors.clear();
        self.sector_columns = 0;
        self.sector_rows = 0;
        self.last_triangle = None;
        self.serial = 0;
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn points(&self) -> &PointArena {
        self.cache.points()
    }

    pub fn edges(&self) -> &EdgeArena {
        &self.edges
    }

    pub fn triangles(&self) -> &TriangleArena {
        &self.triangles
    }

    pub fn triangles_mut(&mut self) -> &mut TriangleArena {
        &mut self.triangles
    }

    pub fn vertex_cache(&self) -> &VertexCache {
        &self.cache
    }

    pub fn point(&self, key: PointKey) -> Option<&NaviPoint> {
        self.cache.get(key)
    }

    pub fn point_mut(&mut self, key: PointKey) -> Option<&mut NaviPoint> {
        self.cache.get_mut(key)
    }

    pub fn edge(&self, key: EdgeKey) -> Option<&NaviEdge> {
        self.edges.get(key)
    }

    pub fn edge_mut(&mut self, key: EdgeKey) -> Option<&mut NaviEdge> {
        self.edges.get_mut(key)
    }

    pub fn triangle(&self, key: TriangleKey) -> Option<&NaviTriangle> {
        self.triangles.get(key)
    }

    #[inline]
    pub(crate) fn pos(&self, point: PointKey) -> Vec3 {
        self.cache.points()[point].pos
    }

    pub fn triangle_positions(&self, triangle: TriangleKey) -> [Vec3; 3] {
        self.triangles[triangle].positions(&self.edges, self.cache.points())
    }

    pub fn triangle_points(&self, triangle: TriangleKey) -> [PointKey; 3] {
        self.triangles[triangle].points(&self.edges)
    }

    pub fn triangle_centroid(&self, triangle: TriangleKey) -> Vec3 {
        self.triangles[triangle].centroid(&self.edges, self.cache.points())
    }

    pub fn edge_positions(&self, edge: EdgeKey) -> [Vec3; 2] {
        let e = &self.edges[edge];
        [self.pos(e.points[0]), self.pos(e.points[1])]
    }

    /// Neighbor of `triangle` across its edge `edge_index`.
    pub fn neighbor(&self, triangle: TriangleKey, edge_index: usize) -> Option<TriangleKey> {
        self.edges[self.triangles[triangle].edges[edge_index]].opposed_triangle(triangle)
    }

    // ========================================================================
    // Element lifecycle
    // ========================================================================

    pub(crate) fn create_edge(
        &mut self,
        p0: PointKey,
        p1: PointKey,
        flags: EdgeFlags,
        pathing: EdgePathingFlags,
    ) -> EdgeKey {
        self.edges.insert(NaviEdge::new(p0, p1, flags, pathing))
    }

    /// Insert a triangle over three edges forming a loop, restoring `state`
    /// onto it.
    pub(crate) fn add_triangle(&mut self, edges: [EdgeKey; 3], state: Option<&TriangleState>) -> TriangleKey {
        let mut triangle = NaviTriangle::new(edges, &self.edges, self.cache.points());
        if let Some(state) = state {
            state.restore(&mut triangle);
        }
        triangle.flags.insert(TriangleFlags::ATTACHED);
        let points = triangle.points(&self.edges);
        let key = self.triangles.insert(triangle);
        for edge in edges {
            self.edges[edge].attach_triangle(key);
        }
        for point in points {
            if let Some(p) = self.cache.get_mut(point) {
                p.flags.insert(PointFlags::ATTACHED);
            }
        }
        if self.last_triangle.is_none() {
            self.last_triangle = Some(key);
        }
        self.add_triangle_fast_lookup_ref(key);
        key
    }

    pub(crate) fn remove_triangle(&mut self, key: TriangleKey) {
        if !self.triangles.contains_key(key) {
            return;
        }
        self.remove_triangle_fast_lookup_ref(key);

        let mut neighbor = None;
        let edges = self.triangles[key].edges;
        for edge_key in edges {
            let edge = &mut self.edges[edge_key];
            edge.detach_triangle(key);
            match edge.any_triangle() {
                Some(other) => neighbor = neighbor.or(Some(other)),
                None => self.orphans.push(edge_key),
            }
        }
        self.triangles.remove(key);

        if self.last_triangle == Some(key) {
            self.last_triangle = neighbor.or_else(|| self.triangles.keys().next());
        }
    }

    /// Drop edges that ended an operation without triangles.
    pub(crate) fn collect_orphans(&mut self) {
        for edge in std::mem::take(&mut self.orphans) {
            if self.edges.get(edge).is_some_and(|e| !e.is_attached()) {
                self.edges.remove(edge);
            }
        }
    }

    /// Seed the triangulation with one triangle; used by mesh setup.
    pub fn add_seed_triangle(&mut self, edges: [EdgeKey; 3]) -> TriangleKey {
        self.add_triangle(edges, None)
    }

    /// Create a point without locating it; used for the outer quad.
    pub fn add_seed_point(&mut self, pos: Vec3) -> PointKey {
        self.cache.cache_vertex(pos).0
    }

    /// Create a loose edge; used for the outer quad.
    pub fn add_seed_edge(&mut self, p0: PointKey, p1: PointKey, flags: EdgeFlags) -> EdgeKey {
        self.create_edge(p0, p1, flags, EdgePathingFlags::default())
    }

    /// Drop a detached point from the vertex cache.
    pub(crate) fn forget_point(&mut self, point: PointKey) {
        if self.cache.get(point).is_some_and(|p| !p.is_attached()) {
            self.cache.remove_vertex(point);
        }
    }

    // ========================================================================
    // Sector grid
    // ========================================================================

    fn point_to_sector_index(&self, pos: &Vec3) -> Option<usize> {
        if self.sectors.is_empty() {
            return None;
        }
        let x = ((pos.x - self.bounds.min.x) / SECTOR_SIZE).floor();
        let y = ((pos.y - self.bounds.min.y) / SECTOR_SIZE).floor();
        if !(x >= 0.0 && y >= 0.0) {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.sector_columns || y >= self.sector_rows {
            return None;
        }
        Some(x + y * self.sector_columns)
    }

    fn add_triangle_fast_lookup_ref(&mut self, triangle: TriangleKey) {
        let centroid = self.triangle_centroid(triangle);
        if let Some(index) = self.point_to_sector_index(&centroid) {
            self.sectors[index] = Some(triangle);
        }
    }

    fn remove_triangle_fast_lookup_ref(&mut self, triangle: TriangleKey) {
        let centroid = self.triangle_centroid(triangle);
        let Some(index) = self.point_to_sector_index(&centroid) else {
            return;
        };
        if self.sectors[index] != Some(triangle) {
            return;
        }
        self.sectors[index] = None;
        for edge_index in 0..3 {
            if let Some(opposed) = self.neighbor(triangle, edge_index) {
                let c = self.triangle_centroid(opposed);
                if self.point_to_sector_index(&c) == Some(index) {
                    self.sectors[index] = Some(opposed);
                    break;
                }
            }
        }
    }

    // ========================================================================
    // Serial stamps
    // ========================================================================

    /// Fresh operation stamp. Zero is never handed out, so a new element
    /// is unvisited for every operation.
    pub fn next_serial(&mut self) -> u32 {
        self.serial = self.serial.wrapping_add(1);
        if self.serial == 0 {
            self.serial = 1;
        }
        self.serial
    }

    /// Stamp an edge; false if it already carries `serial`.
    pub fn test_edge_serial(&mut self, edge: EdgeKey, serial: u32) -> bool {
        let e = &mut self.edges[edge];
        if e.serial == serial {
            return false;
        }
        e.serial = serial;
        true
    }

    /// Stamp a triangle; false if it already carries `serial`.
    pub fn test_triangle_serial(&mut self, triangle: TriangleKey, serial: u32) -> bool {
        let t = &mut self.triangles[triangle];
        if t.serial == serial {
            return false;
        }
        t.serial = serial;
        true
    }

    // ========================================================================
    // Point location
    // ========================================================================

    /// Triangle containing `pos`, or `None` outside the mesh.
    pub fn find_triangle_at_point(&self, pos: &Vec3) -> Option<TriangleKey> {
        self.locate(pos).ok()
    }

    /// Walk from the sector seed toward `pos`.
    pub fn locate(&self, pos: &Vec3) -> Result<TriangleKey> {
        if !Vec3Ext::is_finite(pos) {
            return Err(NaviError::PointOutsideMesh(*pos));
        }

        let mut current = self.last_triangle;
        if let Some(index) = self.point_to_sector_index(pos) {
            if let Some(sector) = self.sectors[index] {
                if self.triangles.get(sector).is_some_and(|t| t.is_attached()) {
                    current = Some(sector);
                }
            }
        }
        let Some(mut triangle) = current else {
            return Err(NaviError::PointOutsideMesh(*pos));
        };

        for _ in 0..LOCATE_ITERATION_CAP {
            match self.next_triangle_towards(triangle, pos) {
                None => return Ok(triangle),
                Some(Some(next)) => triangle = next,
                Some(None) => return Err(NaviError::PointOutsideMesh(*pos)),
            }
        }

        tracing::error!(x = pos.x, y = pos.y, "point location stuck in a cycle");
        for step in 1..=LOCATE_DUMP_STEPS {
            match self.next_triangle_towards(triangle, pos) {
                Some(Some(next)) => {
                    triangle = next;
                    tracing::error!(step, triangle = %self.triangle_integrity_string(triangle));
                }
                _ => break,
            }
        }
        Err(NaviError::LocateIterationCap(LOCATE_ITERATION_CAP))
    }

    /// `None` when `pos` is inside `triangle`; otherwise the neighbor across
    /// the edge `pos` is furthest outside of (which may be missing).
    fn next_triangle_towards(&self, triangle: TriangleKey, pos: &Vec3) -> Option<Option<TriangleKey>> {
        let [p0, p1, p2] = self.triangle_positions(triangle);
        let relations = [
            predicates::line_relationship_2d(&p0, &p1, pos),
            predicates::line_relationship_2d(&p1, &p2, pos),
            predicates::line_relationship_2d(&p2, &p0, pos),
        ];
        let mut best = 0;
        for i in 1..3 {
            if relations[i] > relations[best] {
                best = i;
            }
        }
        if relations[best] > 0.0 {
            Some(self.neighbor(triangle, best))
        } else {
            None
        }
    }

    /// A triangle that has `point` as a vertex.
    pub fn find_triangle_containing_vertex(&self, point: PointKey) -> Option<TriangleKey> {
        let pos = self.cache.get(point)?.pos;
        let triangle = self.find_triangle_at_point(&pos)?;
        let has_vertex = |t: TriangleKey| self.triangles[t].contains_point(&self.edges, point);
        if has_vertex(triangle) {
            return Some(triangle);
        }
        (0..3)
            .filter_map(|i| self.neighbor(triangle, i))
            .find(|&t| has_vertex(t))
    }

    /// Cached point snapped to `pos`, attached or not.
    pub fn find_cached_point_at_point(&self, pos: &Vec3) -> Option<PointKey> {
        self.cache.find_vertex(pos)
    }

    /// Cached point snapped to `pos` that is part of the triangulation.
    pub fn find_attached_point_at_point(&self, pos: &Vec3) -> Option<PointKey> {
        self.cache
            .find_vertex(pos)
            .filter(|&p| self.cache.points()[p].is_attached())
    }

    /// `pos` with z moved onto the plane of `triangle`.
    pub fn project_to_plane(&self, triangle: TriangleKey, pos: &Vec3) -> Vec3 {
        let [a, b, c] = self.triangle_positions(triangle);
        let normal = (b - a).cross(&(c - a));
        if normal.z.abs() <= f32::EPSILON {
            return *pos;
        }
        let z = a.z - (normal.x * (pos.x - a.x) + normal.y * (pos.y - a.y)) / normal.z;
        Vec3::new(pos.x, pos.y, z)
    }

    /// True when `triangle` is open to a query with `flags`. An empty
    /// filter accepts every triangle.
    pub fn triangle_passes(&self, triangle: TriangleKey, flags: PathFlags) -> bool {
        flags.is_empty() || self.triangles[triangle].test_path_flags(flags)
    }

    /// Iterate triangles with at least one of `flags`.
    pub fn triangles_with_flags(&self, flags: PathFlags) -> impl Iterator<Item = TriangleKey> + '_ {
        self.triangles
            .iter()
            .filter(move |(_, t)| t.test_path_flags(flags))
            .map(|(k, _)| k)
    }

    /// Adjacency, winding and degeneracy summary for diagnostics.
    pub fn triangle_integrity_string(&self, triangle: TriangleKey) -> String {
        let Some(t) = self.triangles.get(triangle) else {
            return format!("{triangle:?} (removed)");
        };
        let adjacent = t
            .edges
            .iter()
            .all(|e| self.edges[*e].triangles.contains(&Some(triangle)));
        let linked = (0..3).all(|i| t.edge_point_cw(&self.edges, i, 1) == t.edge_point_cw(&self.edges, (i + 1) % 3, 0));
        let [a, b, c] = self.triangle_positions(triangle);
        format!(
            "{triangle:?} [({}, {}) ({}, {}) ({}, {})] adj={} pts={} wnd={} notdeg={}",
            a.x,
            a.y,
            b.x,
            b.y,
            c.x,
            c.y,
            adjacent as u8,
            linked as u8,
            predicates::clockwise_2d(&a, &b, &c) as u8,
            !predicates::is_degenerate(&a, &b, &c, 1.0) as u8,
        )
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Square from (0, 0) to (size, size) split along its diagonal, all
    /// outer edges constrained.
    pub(crate) fn square_cdt(size: f32) -> NaviCdt {
        let mut cdt = NaviCdt::new();
        let bounds = Aabb::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(size, size, 0.0));
        cdt.create(bounds, 1024);
        let p0 = cdt.add_seed_point(Vec3::new(0.0, 0.0, 0.0));
        let p1 = cdt.add_seed_point(Vec3::new(size, 0.0, 0.0));
        let p2 = cdt.add_seed_point(Vec3::new(size, size, 0.0));
        let p3 = cdt.add_seed_point(Vec3::new(0.0, size, 0.0));
        let e0 = cdt.add_seed_edge(p0, p1, EdgeFlags::CONSTRAINT);
        let e1 = cdt.add_seed_edge(p1, p2, EdgeFlags::CONSTRAINT);
        let e2 = cdt.add_seed_edge(p2, p3, EdgeFlags::CONSTRAINT);
        let e3 = cdt.add_seed_edge(p3, p0, EdgeFlags::CONSTRAINT);
        let diagonal = cdt.add_seed_edge(p0, p2, EdgeFlags::NONE);
        cdt.add_seed_triangle([e0, e1, diagonal]);
        cdt.add_seed_triangle([e2, e3, diagonal]);
        cdt
    }

    /// Every non-constraint interior edge passes the empty circle test.
    pub(crate) fn assert_delaunay(cdt: &NaviCdt) {
        for (key, edge) in cdt.edges().iter() {
            if edge.is_constraint() || !edge.is_full() {
                continue;
            }
            let (Some(t0), Some(t1)) = (edge.triangles[0], edge.triangles[1]) else {
                continue;
            };
            let [a, b, c] = cdt.triangle_positions(t0);
            let opposite = cdt.triangles()[t1].opposed_vertex(cdt.edges(), key).unwrap();
            assert!(
                !predicates::circumcircle_contains(&a, &b, &c, &cdt.pos(opposite)),
                "edge {key:?} violates the Delaunay criterion"
            );
        }
    }

    /// Adjacency is symmetric and every triangle is positively wound.
    pub(crate) fn assert_topology(cdt: &NaviCdt) {
        for (key, tri) in cdt.triangles().iter() {
            for edge in tri.edges {
                let e = cdt.edges().get(edge).expect("triangle references a removed edge");
                assert!(e.triangles.contains(&Some(key)));
            }
            let [a, b, c] = cdt.triangle_positions(key);
            assert!(predicates::orient_2d(&a, &b, &c) > 0.0);
        }
        for (_, edge) in cdt.edges().iter() {
            assert!(edge.is_attached(), "orphan edge left behind");
            for t in edge.triangles.iter().flatten() {
                assert!(cdt.triangles().contains_key(*t));
            }
        }
    }

    #[test]
    fn test_seed_square() {
        let cdt = square_cdt(100.0);
        assert_eq!(cdt.triangle_count(), 2);
        assert_eq!(cdt.edge_count(), 5);
        assert_topology(&cdt);
    }

    #[test]
    fn test_locate() {
        let cdt = square_cdt(100.0);
        let below = cdt.find_triangle_at_point(&Vec3::new(80.0, 10.0, 0.0)).unwrap();
        let above = cdt.find_triangle_at_point(&Vec3::new(10.0, 80.0, 0.0)).unwrap();
        assert_ne!(below, above);
        assert!(cdt.find_triangle_at_point(&Vec3::new(150.0, 10.0, 0.0)).is_none());
        assert!(cdt.find_triangle_at_point(&Vec3::new(f32::NAN, 0.0, 0.0)).is_none());
    }

    #[test]
    fn test_serial_skips_zero() {
        let mut cdt = NaviCdt::new();
        cdt.serial = u32::MAX;
        assert_eq!(cdt.next_serial(), 1);
    }

    #[test]
    fn test_project_to_plane() {
        let mut cdt = square_cdt(100.0);
        let t = cdt.find_triangle_at_point(&Vec3::new(80.0, 10.0, 0.0)).unwrap();
        let keys = cdt.triangle_points(t);
        for key in keys {
            let p = cdt.pos(key);
            cdt.point_mut(key).unwrap().pos.z = p.x * 0.5;
        }
        let projected = cdt.project_to_plane(t, &Vec3::new(80.0, 10.0, 99.0));
        approx::assert_relative_eq!(projected.z, 40.0, epsilon = 1e-3);
    }
}
