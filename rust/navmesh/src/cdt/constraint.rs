// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Constraint edges: insertion, splitting, removal and merging of
//! collinear runs.
//!
//! Insertion threads the segment `p0 -> p1` through the triangulation. The
//! triangles it crosses are removed and the two boundary chains left on
//! either side (pseudo-polygons) are re-triangulated against the new edge.
//! Crossing an existing constraint splits both edges at the intersection.
//! Work is driven by a bounded queue of pending requests.

use std::collections::VecDeque;

use navi_core::{predicates, segment, Vec3, Vec3Ext};

use super::{NaviCdt, SPLIT_EPSILON_SQ};
use crate::error::{NaviError, Result};
use crate::flags::{EdgeFlags, EdgePathingFlags};
use crate::graph::TriangleState;
use crate::keys::{EdgeKey, PointKey, TriangleKey};

/// Pending constraint insertions allowed at once.
pub const EDGE_QUEUE_CAPACITY: usize = 256;
/// Dot product above which two constraint directions count as collinear.
const COLLINEAR_DOT: f32 = 0.996;

/// A constraint to insert between two existing points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeRequest {
    pub p0: PointKey,
    pub p1: PointKey,
    pub flags: EdgeFlags,
    /// Side counters relative to the direction `p0 -> p1`.
    pub pathing: EdgePathingFlags,
}

impl EdgeRequest {
    pub fn new(p0: PointKey, p1: PointKey, flags: EdgeFlags, pathing: EdgePathingFlags) -> Self {
        Self { p0, p1, flags, pathing }
    }

    fn with_points(&self, p0: PointKey, p1: PointKey) -> Self {
        Self { p0, p1, ..*self }
    }
}

struct EdgeQueue(VecDeque<EdgeRequest>);

impl EdgeQueue {
    fn new() -> Self {
        Self(VecDeque::with_capacity(EDGE_QUEUE_CAPACITY))
    }

    fn push(&mut self, request: EdgeRequest) -> Result<()> {
        if self.0.len() >= EDGE_QUEUE_CAPACITY {
            tracing::error!(capacity = EDGE_QUEUE_CAPACITY, "constraint insertion queue overflow");
            return Err(NaviError::EdgeQueueOverflow(EDGE_QUEUE_CAPACITY));
        }
        self.0.push_back(request);
        Ok(())
    }
}

impl NaviCdt {
    /// Insert a constraint edge, splitting it wherever it meets existing
    /// points or constraints.
    pub fn add_edge(&mut self, request: EdgeRequest) -> Result<()> {
        let result = self.insert_edge(request);
        self.collect_orphans();
        result
    }

    /// Drop the constraint status of `edge` and restore the Delaunay
    /// property around it. With `check`, endpoints no longer touching any
    /// constraint are removed too.
    pub fn remove_edge(&mut self, edge: EdgeKey, check: bool) -> Result<()> {
        let result = self.remove_edge_internal(edge, check);
        self.collect_orphans();
        result
    }

    pub(crate) fn insert_edge(&mut self, request: EdgeRequest) -> Result<()> {
        let mut queue = EdgeQueue::new();
        queue.push(request)?;
        while let Some(request) = queue.0.pop_front() {
            self.insert_edge_step(request, &mut queue)?;
        }
        Ok(())
    }

    fn insert_edge_step(&mut self, request: EdgeRequest, queue: &mut EdgeQueue) -> Result<()> {
        let (p0, p1) = (request.p0, request.p1);
        if p0 == p1 {
            return Ok(());
        }
        let Some(start) = self.find_triangle_containing_vertex(p0) else {
            tracing::warn!(?p0, "constraint start point is not part of the mesh");
            return Ok(());
        };

        let p0_pos = self.pos(p0);
        let p1_pos = self.pos(p1);
        let edge_dir = (p1_pos - p0_pos).normalize_2d();

        // Scan the fan around p0.
        let mut crossing = None;
        let mut split_edge: Option<EdgeKey> = None;
        let mut split_edge_dot = 0.0f32;
        let mut current = start;
        for _ in 0..=self.triangles.len() {
            let tri = &self.triangles[current];
            if tri.contains_point(&self.edges, p1) {
                if let Some(existing) = tri.find_edge(&self.edges, p0, p1) {
                    let edge = &mut self.edges[existing];
                    let flip = edge.points[0] != p0;
                    edge.pathing.merge(&request.pathing, flip);
                    edge.flags |= request.flags & EdgeFlags::MASK;
                    return Ok(());
                }
            }

            let oppo_index = tri.opposed_edge_index(&self.edges, p0);
            let next_edge = tri.edge_mod(oppo_index + 1);
            let far = self.edges[next_edge].opposed_point(p0);
            let far_pos = self.pos(far);
            let dot = edge_dir.dot_2d(&(far_pos - p0_pos).normalize_2d());
            if dot > split_edge_dot
                && segment::segment_point_distance_sq_2d(&p0_pos, &p1_pos, &far_pos) < SPLIT_EPSILON_SQ
            {
                split_edge = Some(next_edge);
                split_edge_dot = dot;
            }

            if crossing.is_none() {
                let [a, b] = self.edge_positions(tri.edges[oppo_index]);
                if segment::segments_intersect_2d(&p0_pos, &p1_pos, &a, &b) {
                    crossing = Some(current);
                }
            }

            match tri.next_triangle_sharing_point(current, &self.edges, p0) {
                Some(next) if next != start => current = next,
                _ => break,
            }
        }

        if let Some(split_edge) = split_edge {
            let split_point = self.edges[split_edge].opposed_point(p0);
            queue.push(request.with_points(p0, split_point))?;
            queue.push(request.with_points(split_point, p1))?;
            return Ok(());
        }

        let Some(triangle) = crossing else {
            tracing::error!(
                ?p0,
                ?p1,
                "no triangle crossed by constraint, the mesh likely holds degenerate triangles"
            );
            return Err(NaviError::EdgeNotInserted(p0, p1));
        };

        self.insert_edge_corridor(triangle, request, queue)
    }

    /// Walk the triangles crossed by the request starting at `triangle`,
    /// which touches `p0`, then re-triangulate both sides.
    fn insert_edge_corridor(&mut self, mut triangle: TriangleKey, request: EdgeRequest, queue: &mut EdgeQueue) -> Result<()> {
        let (p0, p1) = (request.p0, request.p1);
        let p0_pos = self.pos(p0);
        let p1_pos = self.pos(p1);
        let missing = || NaviError::EdgeNotInserted(p0, p1);

        let state = self.triangles[triangle].state();
        let crossed = self.triangles[triangle].opposed_edge(&self.edges, p0);
        if self.edges[crossed].is_constraint() {
            return self.split_edge(crossed, request, queue);
        }

        let crossed_points = self.edges[crossed].points;
        let side = !predicates::line_side_2d(&p0_pos, &p1_pos, &self.pos(crossed_points[0]));
        let mut side_point0 = crossed_points[if side { 0 } else { 1 }];
        let mut side_point1 = crossed_points[if side { 1 } else { 0 }];

        let tri = &self.triangles[triangle];
        let mut chain0 = vec![tri.find_edge(&self.edges, p0, side_point0).ok_or_else(missing)?];
        let mut chain1 = VecDeque::from([tri.find_edge(&self.edges, p0, side_point1).ok_or_else(missing)?]);

        let mut crossed_triangles = Vec::new();
        let mut point = p0;
        let mut reached = false;
        for _ in 0..=self.triangles.len() {
            let (oppo, split_edge) = self.triangles[triangle].opposed_triangle(triangle, &self.edges, point);
            if self.edges[split_edge].is_constraint() {
                return self.split_edge(split_edge, request, queue);
            }
            let oppo = oppo.ok_or_else(missing)?;
            let split_point = self.triangles[triangle]
                .opposed_vertex_of(&self.edges, &self.triangles[oppo])
                .ok_or_else(missing)?;
            let split_points = self.edges[split_edge].points;

            if split_point == p1 {
                let side = !predicates::line_side_2d(&p0_pos, &p1_pos, &self.pos(split_points[0]));
                let end0 = split_points[if side { 0 } else { 1 }];
                let end1 = split_points[if side { 1 } else { 0 }];
                let oppo_tri = &self.triangles[oppo];
                chain0.push(oppo_tri.find_edge(&self.edges, p1, end0).ok_or_else(missing)?);
                chain1.push_front(oppo_tri.find_edge(&self.edges, p1, end1).ok_or_else(missing)?);
                crossed_triangles.push(triangle);
                crossed_triangles.push(oppo);
                reached = true;
                break;
            }

            let split_pos = self.pos(split_point);
            if segment::segment_point_distance_sq_2d(&p0_pos, &p1_pos, &split_pos) < SPLIT_EPSILON_SQ {
                queue.push(request.with_points(p0, split_point))?;
                queue.push(request.with_points(split_point, p1))?;
                return Ok(());
            }

            let side = !predicates::line_side_2d(&p0_pos, &p1_pos, &split_pos);
            let oppo_tri = &self.triangles[oppo];
            if side {
                chain0.push(oppo_tri.find_edge(&self.edges, side_point0, split_point).ok_or_else(missing)?);
                side_point0 = split_point;
            } else {
                chain1.push_front(oppo_tri.find_edge(&self.edges, side_point1, split_point).ok_or_else(missing)?);
                side_point1 = split_point;
            }

            point = if predicates::line_side_2d(&p0_pos, &p1_pos, &self.pos(split_points[0])) {
                split_points[if side { 1 } else { 0 }]
            } else {
                split_points[if side { 0 } else { 1 }]
            };

            crossed_triangles.push(triangle);
            triangle = oppo;
        }
        if !reached {
            tracing::error!(?p0, ?p1, "constraint corridor walk did not terminate");
            return Err(missing());
        }

        while let Some(t) = crossed_triangles.pop() {
            self.remove_triangle(t);
        }

        let base = self.create_edge(p0, p1, request.flags & EdgeFlags::MASK, request.pathing);
        self.triangulate_pseudopolygon_delaunay(chain0.into(), p0, p1, base, &state);
        self.triangulate_pseudopolygon_delaunay(chain1.into(), p1, p0, base, &state);
        Ok(())
    }

    /// Triangulate the chain of edges running from `p0` to `p1` against
    /// the base edge `p0 -> p1`.
    ///
    /// Each step picks the chain vertex whose circle with the base edge
    /// holds no other chain vertex, emits that triangle and continues with
    /// the two sub-chains.
    fn triangulate_pseudopolygon_delaunay(
        &mut self,
        chain: Vec<EdgeKey>,
        p0: PointKey,
        p1: PointKey,
        base: EdgeKey,
        state: &TriangleState,
    ) {
        let mut work = vec![(chain, p0, p1, base)];
        while let Some((chain, p0, p1, base)) = work.pop() {
            match chain.len() {
                0 | 1 => {}
                2 => {
                    self.add_triangle([base, chain[0], chain[1]], Some(state));
                }
                count => {
                    let p0_pos = self.pos(p0);
                    let p1_pos = self.pos(p1);
                    let mut point_c = self.edges[chain[0]].opposed_point(p0);
                    let mut index_c = 0;
                    let mut point_i = point_c;
                    for (i, &edge_i) in chain.iter().enumerate().take(count - 1).skip(1) {
                        point_i = self.edges[edge_i].opposed_point(point_i);
                        let c_pos = self.pos(point_c);
                        if predicates::circumcircle_contains(&p0_pos, &c_pos, &p1_pos, &self.pos(point_i)) {
                            point_c = point_i;
                            index_c = i;
                        }
                    }

                    let (left, right) = chain.split_at(index_c + 1);
                    let edge0 = match left {
                        [single] => *single,
                        _ => self.create_edge(p0, point_c, EdgeFlags::NONE, EdgePathingFlags::default()),
                    };
                    let edge1 = match right {
                        [single] => *single,
                        _ => self.create_edge(point_c, p1, EdgeFlags::NONE, EdgePathingFlags::default()),
                    };
                    self.add_triangle([base, edge0, edge1], Some(state));
                    work.push((left.to_vec(), p0, point_c, edge0));
                    work.push((right.to_vec(), point_c, p1, edge1));
                }
            }
        }
    }

    /// Split the constraint being inserted, and `split_edge` if needed, at
    /// their intersection.
    fn split_edge(&mut self, split_edge: EdgeKey, request: EdgeRequest, queue: &mut EdgeQueue) -> Result<()> {
        if self.edges[split_edge].is_door() {
            tracing::error!(?split_edge, "cannot split door edges");
            return Err(NaviError::DoorEdgeSplit(split_edge));
        }

        let (p0, p1) = (request.p0, request.p1);
        let [a, b] = self.edge_positions(split_edge);
        let Some(intersection) = segment::line_line_intersect_2d(&a, &b, &self.pos(p0), &self.pos(p1)) else {
            tracing::warn!(?split_edge, "crossing constraints are parallel, dropping request");
            return Ok(());
        };

        let (split_point, _) = self.cache.cache_vertex(intersection);
        if !self.cache.points()[split_point].is_attached() {
            let triangle = self.triangle_for_split(split_edge, &self.pos(split_point))?;
            self.split_triangle(triangle, split_point, true)?;
        } else if !self.edges[split_edge].contains(split_point) {
            let e = &self.edges[split_edge];
            let halves = EdgeRequest::new(e.points[0], split_point, e.flags & EdgeFlags::MASK, e.pathing);
            let end = e.points[1];
            queue.push(halves)?;
            queue.push(halves.with_points(split_point, end))?;
            self.remove_edge_internal(split_edge, false)?;
        }

        if p0 != split_point {
            queue.push(request.with_points(p0, split_point))?;
        }
        if split_point != p1 {
            queue.push(request.with_points(split_point, p1))?;
        }
        Ok(())
    }

    /// Triangle of `edge` holding `pos`, falling back to point location.
    fn triangle_for_split(&self, edge: EdgeKey, pos: &Vec3) -> Result<TriangleKey> {
        let holds = |t: &TriangleKey| self.triangles[*t].contains_pos(&self.edges, self.cache.points(), pos);
        self.edges[edge]
            .triangles
            .iter()
            .flatten()
            .copied()
            .find(holds)
            .map_or_else(|| self.locate(pos), Ok)
    }

    pub(crate) fn remove_edge_internal(&mut self, edge: EdgeKey, check: bool) -> Result<()> {
        let Some(e) = self.edges.get_mut(edge) else {
            return Ok(());
        };
        if e.is_door() {
            tracing::error!(?edge, "cannot remove door edges");
            return Err(NaviError::DoorEdgeRemoval(edge));
        }
        e.clear_constraint();
        let [p0, p1] = e.points;
        if !e.is_attached() {
            return Ok(());
        }

        e.flags.insert(EdgeFlags::DELAUNAY);
        self.check_delaunay_swap_edges(vec![edge]);

        if check {
            for point in [p0, p1] {
                if self.cache.get(point).map_or(true, |p| p.has_influence()) {
                    continue;
                }
                if let Some(triangle) = self.find_triangle_containing_vertex(point) {
                    if !self.is_point_constraint(point, triangle) {
                        self.remove_point(point, triangle);
                    }
                }
            }
        }
        Ok(())
    }

    /// Flip queued edges until none violates the empty circle test. Queued
    /// edges carry the `DELAUNAY` mark.
    fn check_delaunay_swap_edges(&mut self, mut stack: Vec<EdgeKey>) {
        while let Some(edge) = stack.pop() {
            let Some(e) = self.edges.get_mut(edge) else {
                continue;
            };
            e.flags.remove(EdgeFlags::DELAUNAY);
            if e.is_constraint() {
                continue;
            }
            let (Some(t0), Some(t1)) = (e.triangles[0], e.triangles[1]) else {
                continue;
            };

            let [a0, b0, c0] = self.triangle_positions(t0);
            let [a1, b1, c1] = self.triangle_positions(t1);
            let area0 = segment::signed_double_triangle_area_2d(&a0, &b0, &c0);
            let area1 = segment::signed_double_triangle_area_2d(&a1, &b1, &c1);
            let (triangle, oppo) = if area0 > area1 { (t0, t1) } else { (t1, t0) };
            let Some(check) = self.triangles[oppo].opposed_vertex(&self.edges, edge) else {
                continue;
            };
            let [a, b, c] = self.triangle_positions(triangle);
            if !predicates::circumcircle_contains(&a, &b, &c, &self.pos(check)) {
                continue;
            }

            let tri0 = &self.triangles[t0];
            let tri1 = &self.triangles[t1];
            let index0 = tri0.edge_index(edge);
            let index1 = tri1.edge_index(edge);
            let outer = [
                tri0.edge_mod(index0 + 1),
                tri0.edge_mod(index0 + 2),
                tri1.edge_mod(index1 + 1),
                tri1.edge_mod(index1 + 2),
            ];
            for outer_edge in outer {
                let oe = &mut self.edges[outer_edge];
                if !oe.test_flag(EdgeFlags::DELAUNAY) {
                    oe.flags.insert(EdgeFlags::DELAUNAY);
                    stack.push(outer_edge);
                }
            }
            self.swap_edge(edge);
        }
    }

    /// True when a constraint edge ends at `point`. Points on the open
    /// border count as constrained.
    pub fn is_point_constraint(&self, point: PointKey, triangle: TriangleKey) -> bool {
        let Some(fan) = self.triangle_fan(triangle, point) else {
            return true;
        };
        fan.iter().any(|&t| {
            let tri = &self.triangles[t];
            let oppo = tri.opposed_edge_index(&self.edges, point);
            self.edges[tri.edge_mod(oppo + 1)].is_constraint() || self.edges[tri.edge_mod(oppo + 2)].is_constraint()
        })
    }

    // ========================================================================
    // Collinear constraint merging
    // ========================================================================

    /// Merge runs of collinear constraints meeting at points with no other
    /// constraint into single edges.
    pub fn remove_collinear_edges(&mut self) -> Result<()> {
        let result = self.remove_collinear_edges_internal();
        self.collect_orphans();
        result
    }

    fn remove_collinear_edges_internal(&mut self) -> Result<()> {
        let serial = self.next_serial();
        let mut candidates = Vec::new();

        let triangle_keys: Vec<TriangleKey> = self.triangles.keys().collect();
        for triangle in triangle_keys {
            for edge in self.triangles[triangle].edges {
                if !self.edges[edge].is_full() || !self.test_edge_serial(edge, serial) {
                    continue;
                }
                if let Some((run, _)) = self.find_collinear_edges(edge) {
                    for e in run {
                        self.test_edge_serial(e, serial);
                    }
                    candidates.push(edge);
                }
            }
        }

        let mut merged = 0usize;
        for edge in candidates {
            if !self.edges.get(edge).is_some_and(|e| e.is_attached()) {
                continue;
            }
            let Some((run, request)) = self.find_collinear_edges(edge) else {
                continue;
            };
            for e in run {
                if self.edges.get(e).is_some_and(|e| e.is_attached()) {
                    self.remove_edge_internal(e, true)?;
                }
            }
            if self.find_triangle_containing_vertex(request.p0).is_some()
                && self.find_triangle_containing_vertex(request.p1).is_some()
            {
                self.insert_edge(request)?;
                merged += 1;
            }
        }
        tracing::trace!(merged, "collinear constraint runs merged");
        Ok(())
    }

    /// The run of constraints collinear with `edge`, `edge` included, and
    /// the request replacing it. `None` when nothing extends `edge`.
    ///
    /// A run only extends through points touched by exactly one other
    /// constraint, and only over non-door edges whose side counters match
    /// once oriented along `edge`.
    fn find_collinear_edges(&self, edge: EdgeKey) -> Option<(Vec<EdgeKey>, EdgeRequest)> {
        let seed = &self.edges[edge];
        if !seed.is_constraint() || seed.is_door() {
            return None;
        }

        let mut ends = seed.points;
        let mut dir = (self.pos(seed.points[1]) - self.pos(seed.points[0])).normalize_2d();
        let mut run = Vec::new();

        for i in 0..2 {
            if i == 1 {
                dir = -dir;
            }
            let mut point = seed.points[i];
            let mut current = Some(edge);

            while let Some(it_edge) = current {
                let mut collinear = None;
                let Some(start) = self.edges[it_edge].any_triangle() else {
                    break;
                };
                let mut found = false;
                let mut triangle = start;
                let point_pos = self.pos(point);
                for _ in 0..=self.triangles.len() {
                    let tri = &self.triangles[triangle];
                    let oppo = tri.opposed_edge_index(&self.edges, point);
                    let next_edge = tri.edge_mod(oppo + 1);
                    let ne = &self.edges[next_edge];

                    if next_edge != it_edge && ne.is_constraint() {
                        if found {
                            collinear = None;
                            break;
                        }
                        found = true;
                        let test_dir = (point_pos - self.pos(ne.opposed_point(point))).normalize_2d();
                        if dir.dot_2d(&test_dir) > COLLINEAR_DOT && !ne.is_door() {
                            let along = if i == 0 { ne.points[1] == point } else { ne.points[0] == point };
                            let pathing = if along { ne.pathing } else { ne.pathing.flipped() };
                            if pathing == seed.pathing {
                                collinear = Some(next_edge);
                            }
                        }
                    }

                    match tri.next_triangle_sharing_point(triangle, &self.edges, point) {
                        Some(next) if next != start => triangle = next,
                        Some(_) => break,
                        None => {
                            collinear = None;
                            break;
                        }
                    }
                }

                if let Some(c) = collinear {
                    if run.contains(&c) {
                        break;
                    }
                    point = self.edges[c].opposed_point(point);
                    ends[i] = point;
                    run.push(c);
                }
                current = collinear;
            }
        }

        if run.is_empty() {
            return None;
        }
        run.push(edge);
        let request = EdgeRequest::new(ends[0], ends[1], EdgeFlags::CONSTRAINT, seed.pathing);
        Some((run, request))
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{assert_delaunay, assert_topology, square_cdt};
    use super::*;
    use crate::flags::ContentFlags;

    fn constraint(cdt: &NaviCdt, p0: PointKey, p1: PointKey) -> Option<EdgeKey> {
        cdt.edges()
            .iter()
            .find(|(_, e)| e.contains(p0) && e.contains(p1))
            .map(|(k, _)| k)
            .filter(|k| cdt.edges()[*k].is_constraint())
    }

    fn walk_request(p0: PointKey, p1: PointKey) -> EdgeRequest {
        EdgeRequest::new(
            p0,
            p1,
            EdgeFlags::CONSTRAINT,
            EdgePathingFlags::new(ContentFlags::ADD_WALK, ContentFlags::NONE),
        )
    }

    #[test]
    fn test_edge_across_many_triangles() {
        let mut cdt = square_cdt(1000.0);
        for i in 1..10 {
            cdt.add_point(Vec3::new(i as f32 * 100.0 + 3.0, 500.0 + (i % 3) as f32 * 40.0 - 40.0, 0.0))
                .unwrap();
        }
        let a = cdt.add_point(Vec3::new(500.0, 100.0, 0.0)).unwrap();
        let b = cdt.add_point(Vec3::new(520.0, 900.0, 0.0)).unwrap();
        cdt.add_edge(walk_request(a, b)).unwrap();

        assert_topology(&cdt);
        assert_delaunay(&cdt);
        // The segment may have been split at vertices it passes close to,
        // but a chain of constraints must connect a and b.
        let mut point = a;
        let mut guard = 0;
        while point != b {
            let next = cdt
                .edges()
                .values()
                .filter(|e| e.is_constraint() && e.contains(point))
                .map(|e| e.opposed_point(point))
                .find(|p| cdt.pos(*p).y > cdt.pos(point).y)
                .expect("constraint chain is broken");
            point = next;
            guard += 1;
            assert!(guard < 20);
        }
    }

    #[test]
    fn test_existing_edge_merges_flags() {
        let mut cdt = square_cdt(100.0);
        let corner_a = cdt.find_attached_point_at_point(&Vec3::new(0.0, 0.0, 0.0)).unwrap();
        let corner_c = cdt.find_attached_point_at_point(&Vec3::new(100.0, 100.0, 0.0)).unwrap();
        cdt.add_edge(walk_request(corner_c, corner_a)).unwrap();
        let diagonal = constraint(&cdt, corner_a, corner_c).unwrap();
        let e = &cdt.edges()[diagonal];
        // Stored a -> c, requested c -> a: sides are swapped.
        assert_eq!(e.pathing.content_flags_for_side(1), ContentFlags::ADD_WALK);
        assert_eq!(cdt.triangle_count(), 2);
    }

    #[test]
    fn test_crossing_constraints_split() {
        let mut cdt = square_cdt(1000.0);
        let a = cdt.add_point(Vec3::new(100.0, 500.0, 0.0)).unwrap();
        let b = cdt.add_point(Vec3::new(900.0, 500.0, 0.0)).unwrap();
        let c = cdt.add_point(Vec3::new(500.0, 100.0, 0.0)).unwrap();
        let d = cdt.add_point(Vec3::new(500.0, 900.0, 0.0)).unwrap();
        cdt.add_edge(walk_request(a, b)).unwrap();
        cdt.add_edge(walk_request(c, d)).unwrap();

        let center = cdt.find_attached_point_at_point(&Vec3::new(500.0, 500.0, 0.0)).unwrap();
        for end in [a, b, c, d] {
            assert!(constraint(&cdt, center, end).is_some());
        }
        assert_topology(&cdt);
        assert_delaunay(&cdt);
    }

    #[test]
    fn test_remove_edge_restores_delaunay() {
        let mut cdt = square_cdt(1000.0);
        let a = cdt.add_point(Vec3::new(100.0, 480.0, 0.0)).unwrap();
        let b = cdt.add_point(Vec3::new(900.0, 520.0, 0.0)).unwrap();
        for i in 1..8 {
            cdt.add_point(Vec3::new(i as f32 * 120.0, 300.0 + (i % 2) as f32 * 400.0, 0.0))
                .unwrap();
        }
        cdt.add_edge(walk_request(a, b)).unwrap();
        let edge = constraint(&cdt, a, b).unwrap();
        let before = cdt.vertex_cache().len();

        cdt.remove_edge(edge, true).unwrap();
        assert!(constraint(&cdt, a, b).is_none());
        assert_topology(&cdt);
        assert_delaunay(&cdt);
        // Both unconstrained endpoints were removed as well.
        assert!(!cdt.point(a).unwrap().is_attached());
        assert!(!cdt.point(b).unwrap().is_attached());
        assert_eq!(cdt.vertex_cache().len(), before);
    }

    #[test]
    fn test_door_edges_are_kept() {
        let mut cdt = square_cdt(1000.0);
        let a = cdt.add_point(Vec3::new(200.0, 500.0, 0.0)).unwrap();
        let b = cdt.add_point(Vec3::new(800.0, 500.0, 0.0)).unwrap();
        let mut request = walk_request(a, b);
        request.flags |= EdgeFlags::DOOR;
        cdt.add_edge(request).unwrap();
        let door = constraint(&cdt, a, b).unwrap();
        assert!(matches!(cdt.remove_edge(door, false), Err(NaviError::DoorEdgeRemoval(_))));
    }

    #[test]
    fn test_collinear_run_is_merged() {
        let mut cdt = square_cdt(1000.0);
        let points: Vec<PointKey> = (0..4)
            .map(|i| cdt.add_point(Vec3::new(200.0 + i as f32 * 200.0, 500.0, 0.0)).unwrap())
            .collect();
        for pair in points.windows(2) {
            cdt.add_edge(walk_request(pair[0], pair[1])).unwrap();
        }
        cdt.remove_collinear_edges().unwrap();

        assert!(constraint(&cdt, points[0], points[3]).is_some());
        assert!(!cdt.point(points[1]).unwrap().is_attached());
        assert!(!cdt.point(points[2]).unwrap().is_attached());
        assert_topology(&cdt);
        assert_delaunay(&cdt);
    }

    #[test]
    fn test_queue_overflow_is_an_error() {
        let mut queue = EdgeQueue::new();
        let mut cdt = square_cdt(10.0);
        let p = cdt.add_seed_point(Vec3::new(5.0, 5.0, 0.0));
        for _ in 0..EDGE_QUEUE_CAPACITY {
            queue.push(walk_request(p, p)).unwrap();
        }
        assert!(matches!(
            queue.push(walk_request(p, p)),
            Err(NaviError::EdgeQueueOverflow(EDGE_QUEUE_CAPACITY))
        ));
    }
}
