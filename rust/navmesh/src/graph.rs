// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Planar graph records: edges and triangles.
//!
//! Points own nothing. An edge names two points and up to two triangles;
//! a triangle names three edges. Edges are unordered pairs, so a triangle
//! stores a 3-bit `side_flags` mask telling which endpoint of each edge
//! comes first when walking the triangle boundary. With bit `i` clear,
//! edge `i` is traversed `points[0] -> points[1]`.
//!
//! Triangles are always stored with positive orientation
//! ([`navi_core::predicates::orient_2d`] > 0). That is counter-clockwise
//! with y pointing up and clockwise with y pointing down, the screen
//! convention the `cw` names (`point_cw`, `edge_point_cw`,
//! [`navi_core::predicates::clockwise_2d`]) follow throughout the crate.
//!
//! For an edge, side 0 is the triangle that walks it `p0 -> p1` (it lies
//! to the left of that direction) and side 1 is the other one.

use navi_core::{predicates, Vec3};
use slotmap::SlotMap;

use crate::flags::{ContentFlagCounts, EdgeFlags, EdgePathingFlags, PathFlags, TriangleFlags};
use crate::keys::{EdgeKey, PointKey, TriangleKey};
use crate::vertex_cache::PointArena;

pub type EdgeArena = SlotMap<EdgeKey, NaviEdge>;
pub type TriangleArena = SlotMap<TriangleKey, NaviTriangle>;

// ============================================================================
// Edge
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct NaviEdge {
    pub points: [PointKey; 2],
    pub triangles: [Option<TriangleKey>; 2],
    pub flags: EdgeFlags,
    pub pathing: EdgePathingFlags,
    /// Last operation stamp, see `NaviCdt::next_serial`.
    pub serial: u32,
}

impl NaviEdge {
    pub fn new(p0: PointKey, p1: PointKey, flags: EdgeFlags, pathing: EdgePathingFlags) -> Self {
        Self {
            points: [p0, p1],
            triangles: [None, None],
            flags,
            pathing,
            serial: 0,
        }
    }

    #[inline]
    pub fn test_flag(&self, flag: EdgeFlags) -> bool {
        self.flags.contains(flag)
    }

    #[inline]
    pub fn is_constraint(&self) -> bool {
        self.flags.contains(EdgeFlags::CONSTRAINT)
    }

    #[inline]
    pub fn is_door(&self) -> bool {
        self.flags.contains(EdgeFlags::DOOR)
    }

    #[inline]
    pub fn contains(&self, point: PointKey) -> bool {
        self.points[0] == point || self.points[1] == point
    }

    /// The endpoint that is not `point`.
    #[inline]
    pub fn opposed_point(&self, point: PointKey) -> PointKey {
        if self.points[0] == point {
            self.points[1]
        } else {
            self.points[0]
        }
    }

    /// The triangle across this edge from `triangle`.
    #[inline]
    pub fn opposed_triangle(&self, triangle: TriangleKey) -> Option<TriangleKey> {
        if self.triangles[0] == Some(triangle) {
            self.triangles[1]
        } else {
            self.triangles[0]
        }
    }

    pub fn attach_triangle(&mut self, triangle: TriangleKey) {
        if self.triangles[0].is_none() {
            self.triangles[0] = Some(triangle);
        } else {
            self.triangles[1] = Some(triangle);
        }
    }

    pub fn detach_triangle(&mut self, triangle: TriangleKey) {
        if self.triangles[0] == Some(triangle) {
            self.triangles[0] = None;
        } else if self.triangles[1] == Some(triangle) {
            self.triangles[1] = None;
        }
    }

    /// Any triangle, preferring slot 0.
    #[inline]
    pub fn any_triangle(&self) -> Option<TriangleKey> {
        self.triangles[0].or(self.triangles[1])
    }

    #[inline]
    pub fn is_attached(&self) -> bool {
        self.triangles[0].is_some() || self.triangles[1].is_some()
    }

    /// Interior edge with a triangle on both sides.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.triangles[0].is_some() && self.triangles[1].is_some()
    }

    /// Absorb the constraint flags and side counters of `source`.
    ///
    /// `self` is a piece of `source` sharing one of its endpoints; the
    /// counters are flipped when the piece runs against `source`.
    pub fn constraint_merge(&mut self, source: &NaviEdge) {
        self.flags |= source.flags & EdgeFlags::MASK;
        let flip = self.points[1] == source.points[0] || self.points[0] == source.points[1];
        self.pathing.merge(&source.pathing, flip);
    }

    /// Drop constraint status and side counters.
    pub fn clear_constraint(&mut self) {
        self.flags.remove(EdgeFlags::CONSTRAINT);
        self.pathing.clear();
    }

    pub fn length_2d(&self, points: &PointArena) -> f32 {
        let a = &points[self.points[0]].pos;
        let b = &points[self.points[1]].pos;
        ((b.x - a.x).powi(2) + (b.y - a.y).powi(2)).sqrt()
    }

    /// Endpoint shared with `other`, if any.
    pub fn shared_vertex(&self, other: &NaviEdge) -> Option<PointKey> {
        if other.contains(self.points[0]) {
            Some(self.points[0])
        } else if other.contains(self.points[1]) {
            Some(self.points[1])
        } else {
            None
        }
    }
}

// ============================================================================
// Triangle
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct NaviTriangle {
    pub edges: [EdgeKey; 3],
    pub side_flags: u8,
    pub flags: TriangleFlags,
    pub path_flags: PathFlags,
    pub content: ContentFlagCounts,
    pub serial: u32,
}

impl NaviTriangle {
    /// Build a triangle over three edges forming a closed loop.
    ///
    /// The edge order is reversed if needed so the stored winding is
    /// positive.
    pub fn new(edges: [EdgeKey; 3], edge_arena: &EdgeArena, points: &PointArena) -> Self {
        let mut triangle = Self {
            edges,
            side_flags: 0,
            flags: TriangleFlags::NONE,
            path_flags: PathFlags::NONE,
            content: ContentFlagCounts::default(),
            serial: 0,
        };
        triangle.update_edge_side_flags(edge_arena);
        let [a, b, c] = triangle.positions(edge_arena, points);
        if predicates::orient_2d(&a, &b, &c) < 0.0 {
            triangle.edges.swap(1, 2);
            triangle.update_edge_side_flags(edge_arena);
        }
        triangle
    }

    fn update_edge_side_flags(&mut self, edge_arena: &EdgeArena) {
        let e0 = &edge_arena[self.edges[0]];
        let e1 = &edge_arena[self.edges[1]];
        let e2 = &edge_arena[self.edges[2]];
        let mut flags = 0u8;
        if e0.points[0] == e1.points[0] || e0.points[1] == e1.points[1] {
            flags |= 1 << 1;
        }
        if e0.points[0] == e2.points[0] || e0.points[1] == e2.points[1] {
            flags |= 1 << 2;
        }
        self.side_flags = flags;
        if self.edge_point_cw(edge_arena, 0, 1) != self.edge_point_cw(edge_arena, 1, 0) {
            self.side_flags = !flags & 0x07;
        }
    }

    #[inline]
    pub fn edge_side_flag(&self, edge_index: usize) -> usize {
        ((self.side_flags >> edge_index) & 1) as usize
    }

    #[inline]
    pub fn edge_mod(&self, index: usize) -> EdgeKey {
        self.edges[index % 3]
    }

    /// Endpoint `point` (0 = start, 1 = end) of edge `edge_index` in walk
    /// order.
    #[inline]
    pub fn edge_point_cw(&self, edge_arena: &EdgeArena, edge_index: usize, point: usize) -> PointKey {
        edge_arena[self.edges[edge_index]].points[self.edge_side_flag(edge_index) ^ point]
    }

    /// Vertex `i` in walk order; edge `i` runs from vertex `i` to `i + 1`.
    #[inline]
    pub fn point_cw(&self, edge_arena: &EdgeArena, index: usize) -> PointKey {
        self.edge_point_cw(edge_arena, index, 0)
    }

    pub fn points(&self, edge_arena: &EdgeArena) -> [PointKey; 3] {
        [
            self.point_cw(edge_arena, 0),
            self.point_cw(edge_arena, 1),
            self.point_cw(edge_arena, 2),
        ]
    }

    pub fn positions(&self, edge_arena: &EdgeArena, points: &PointArena) -> [Vec3; 3] {
        let [a, b, c] = self.points(edge_arena);
        [points[a].pos, points[b].pos, points[c].pos]
    }

    pub fn centroid(&self, edge_arena: &EdgeArena, points: &PointArena) -> Vec3 {
        let [a, b, c] = self.positions(edge_arena, points);
        (a + b + c) / 3.0
    }

    pub fn contains_point(&self, edge_arena: &EdgeArena, point: PointKey) -> bool {
        self.points(edge_arena).contains(&point)
    }

    /// Inclusive planar containment of a position.
    pub fn contains_pos(&self, edge_arena: &EdgeArena, points: &PointArena, pos: &Vec3) -> bool {
        let [a, b, c] = self.positions(edge_arena, points);
        predicates::contains_2d(&a, &b, &c, pos)
    }

    /// Index of the edge not touching `point`.
    pub fn opposed_edge_index(&self, edge_arena: &EdgeArena, point: PointKey) -> usize {
        if edge_arena[self.edges[0]].contains(point) {
            if edge_arena[self.edges[1]].contains(point) {
                2
            } else {
                1
            }
        } else {
            0
        }
    }

    #[inline]
    pub fn opposed_edge(&self, edge_arena: &EdgeArena, point: PointKey) -> EdgeKey {
        self.edges[self.opposed_edge_index(edge_arena, point)]
    }

    /// Neighbor across the edge opposite `point`, with that edge.
    pub fn opposed_triangle(
        &self,
        self_key: TriangleKey,
        edge_arena: &EdgeArena,
        point: PointKey,
    ) -> (Option<TriangleKey>, EdgeKey) {
        let edge = self.opposed_edge(edge_arena, point);
        (edge_arena[edge].opposed_triangle(self_key), edge)
    }

    /// Next triangle in the fan around `point`.
    pub fn next_triangle_sharing_point(
        &self,
        self_key: TriangleKey,
        edge_arena: &EdgeArena,
        point: PointKey,
    ) -> Option<TriangleKey> {
        let index = self.opposed_edge_index(edge_arena, point);
        edge_arena[self.edge_mod(index + 1)].opposed_triangle(self_key)
    }

    pub fn edge_index(&self, edge: EdgeKey) -> usize {
        self.edges.iter().position(|e| *e == edge).unwrap_or(0)
    }

    pub fn find_edge(&self, edge_arena: &EdgeArena, p0: PointKey, p1: PointKey) -> Option<EdgeKey> {
        self.edges.iter().copied().find(|&key| {
            let edge = &edge_arena[key];
            (edge.points[0] == p0 && edge.points[1] == p1) || (edge.points[0] == p1 && edge.points[1] == p0)
        })
    }

    /// Vertex not on `edge`.
    pub fn opposed_vertex(&self, edge_arena: &EdgeArena, edge: EdgeKey) -> Option<PointKey> {
        let e = &edge_arena[edge];
        self.points(edge_arena).into_iter().find(|p| !e.contains(*p))
    }

    /// Vertex of `other` that `self` does not have.
    pub fn opposed_vertex_of(&self, edge_arena: &EdgeArena, other: &NaviTriangle) -> Option<PointKey> {
        let own = self.points(edge_arena);
        other.points(edge_arena).into_iter().find(|p| !own.contains(p))
    }

    /// Signed relation of `pos` to edge `edge_index`; positive outside.
    pub fn relation_of_edge_to_point(
        &self,
        edge_arena: &EdgeArena,
        points: &PointArena,
        pos: &Vec3,
        edge_index: usize,
    ) -> f32 {
        let edge = &edge_arena[self.edges[edge_index]];
        let a = points[edge.points[0]].pos;
        let b = points[edge.points[1]].pos;
        let d = (pos.x - a.x) * (b.y - a.y) - (pos.y - a.y) * (b.x - a.x);
        if self.edge_side_flag(edge_index) != 0 {
            -d
        } else {
            d
        }
    }

    /// Any of `flags` present.
    #[inline]
    pub fn test_path_flags(&self, flags: PathFlags) -> bool {
        self.path_flags.intersects(flags)
    }

    #[inline]
    pub fn test_flag(&self, flag: TriangleFlags) -> bool {
        self.flags.contains(flag)
    }

    pub fn is_attached(&self) -> bool {
        self.flags.contains(TriangleFlags::ATTACHED)
    }

    /// Half the signed area when spawnable (walkable and not blacked out).
    pub fn spawnable_area(&self, edge_arena: &EdgeArena, points: &PointArena) -> f32 {
        if self.path_flags.contains(PathFlags::WALK) && !self.path_flags.contains(PathFlags::BLACK_OUT_ZONE) {
            let [a, b, c] = self.positions(edge_arena, points);
            navi_core::segment::signed_double_triangle_area_2d(&a, &b, &c) / 2.0
        } else {
            0.0
        }
    }

    pub fn state(&self) -> TriangleState {
        TriangleState {
            markup: self.flags.contains(TriangleFlags::MARKUP),
            path_flags: self.path_flags,
            content: self.content,
        }
    }
}

/// Markup data carried from a removed triangle onto its replacements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TriangleState {
    pub markup: bool,
    pub path_flags: PathFlags,
    pub content: ContentFlagCounts,
}

impl TriangleState {
    pub fn restore(&self, triangle: &mut NaviTriangle) {
        if self.markup {
            triangle.flags.insert(TriangleFlags::MARKUP);
        }
        triangle.path_flags = self.path_flags;
        triangle.content = self.content;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vertex_cache::VertexCache;

    fn setup() -> (VertexCache, EdgeArena, [PointKey; 3]) {
        let mut cache = VertexCache::new();
        let (a, _) = cache.cache_vertex(Vec3::new(0.0, 0.0, 0.0));
        let (b, _) = cache.cache_vertex(Vec3::new(100.0, 0.0, 0.0));
        let (c, _) = cache.cache_vertex(Vec3::new(0.0, 100.0, 0.0));
        (cache, EdgeArena::with_key(), [a, b, c])
    }

    fn edge(arena: &mut EdgeArena, p0: PointKey, p1: PointKey) -> EdgeKey {
        arena.insert(NaviEdge::new(p0, p1, EdgeFlags::NONE, EdgePathingFlags::default()))
    }

    #[test]
    fn test_winding_is_normalized() {
        let (cache, mut edges, [a, b, c]) = setup();
        // Loop a -> c -> b is negatively oriented.
        let e0 = edge(&mut edges, a, c);
        let e1 = edge(&mut edges, c, b);
        let e2 = edge(&mut edges, b, a);
        let tri = NaviTriangle::new([e0, e1, e2], &edges, cache.points());
        let [pa, pb, pc] = tri.positions(&edges, cache.points());
        assert!(predicates::orient_2d(&pa, &pb, &pc) > 0.0);
        for i in 0..3 {
            assert_eq!(tri.edge_point_cw(&edges, i, 1), tri.edge_point_cw(&edges, (i + 1) % 3, 0));
        }
    }

    #[test]
    fn test_mixed_edge_directions() {
        let (cache, mut edges, [a, b, c]) = setup();
        let e0 = edge(&mut edges, b, a);
        let e1 = edge(&mut edges, b, c);
        let e2 = edge(&mut edges, a, c);
        let tri = NaviTriangle::new([e0, e1, e2], &edges, cache.points());
        let pts = tri.points(&edges);
        assert!(pts.contains(&a) && pts.contains(&b) && pts.contains(&c));
        let [pa, pb, pc] = tri.positions(&edges, cache.points());
        assert!(predicates::orient_2d(&pa, &pb, &pc) > 0.0);
    }

    #[test]
    fn test_opposed_queries() {
        let (cache, mut edges, [a, b, c]) = setup();
        let ab = edge(&mut edges, a, b);
        let bc = edge(&mut edges, b, c);
        let ca = edge(&mut edges, c, a);
        let tri = NaviTriangle::new([ab, bc, ca], &edges, cache.points());
        assert_eq!(tri.opposed_edge(&edges, a), bc);
        assert_eq!(tri.opposed_edge(&edges, b), ca);
        assert_eq!(tri.opposed_edge(&edges, c), ab);
        assert_eq!(tri.opposed_vertex(&edges, ab), Some(c));
        assert_eq!(tri.find_edge(&edges, c, b), Some(bc));
        assert!(tri.contains_pos(&edges, cache.points(), &Vec3::new(10.0, 10.0, 0.0)));
        assert!(!tri.contains_pos(&edges, cache.points(), &Vec3::new(90.0, 90.0, 0.0)));
        // Outside the hypotenuse the relation is positive.
        let idx = tri.edge_index(bc);
        assert!(tri.relation_of_edge_to_point(&edges, cache.points(), &Vec3::new(90.0, 90.0, 0.0), idx) > 0.0);
    }

    #[test]
    fn test_constraint_merge_flips_reversed_piece() {
        let (_, _, [a, b, c]) = setup();
        let source = NaviEdge::new(
            a,
            b,
            EdgeFlags::CONSTRAINT | EdgeFlags::DELAUNAY,
            EdgePathingFlags::new(crate::flags::ContentFlags::ADD_WALK, crate::flags::ContentFlags::NONE),
        );
        // c sits on a -> b: the piece c -> b runs along the source.
        let mut along = NaviEdge::new(c, b, EdgeFlags::NONE, EdgePathingFlags::default());
        along.constraint_merge(&source);
        assert!(along.is_constraint());
        assert!(!along.test_flag(EdgeFlags::DELAUNAY));
        assert_eq!(along.pathing.content_flags_for_side(0), crate::flags::ContentFlags::ADD_WALK);

        // c -> a runs against it.
        let mut against = NaviEdge::new(c, a, EdgeFlags::NONE, EdgePathingFlags::default());
        against.constraint_merge(&source);
        assert_eq!(against.pathing.content_flags_for_side(1), crate::flags::ContentFlags::ADD_WALK);
    }
}
