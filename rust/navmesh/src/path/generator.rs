// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Clearance aware search over triangle adjacency.
//!
//! Search states live in an arena and point at their parent by index; the
//! chain from a goal state back to the start is the channel of crossed
//! edges handed to the funnel. States are ordered by `dist_done +
//! dist_left`. After the first goal is reached the search keeps going for a
//! few more goals and keeps the shortest pulled path.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use navi_core::segment::{
    line_line_intersect_2d, segment_point_distance_sq_2d, segment_segment_distance_sq_2d, segments_intersect_2d,
};
use navi_core::{Vec3, Vec3Ext};

use crate::cdt::NaviCdt;
use crate::flags::{PathFlags, PathGenerationFlags};
use crate::keys::{EdgeKey, TriangleKey};
use crate::mesh::NaviMesh;
use crate::sweep::SweepResult;

use super::funnel::{string_pull, Portal};
use super::navi_path::{NaviPath, NaviPathNode, NaviPathResult};

/// Slack on width tests, absorbing rounding on corridors exactly as wide
/// as the agent.
pub const WIDTH_TOLERANCE: f32 = 0.5;
/// Expansions per extra attempt granted after the first success.
const EXPANSIONS_PER_ATTEMPT: usize = 256;
/// Sampling step when pulling an unreachable goal back toward the start.
const FIX_GOAL_STEP: f32 = 16.0;
const FIX_GOAL_BISECTIONS: usize = 8;
/// Weight of the walked distance when ranking partial paths.
const PARTIAL_DONE_WEIGHT: f32 = 0.25;

#[derive(Debug, Clone, Copy)]
struct SearchState {
    triangle: TriangleKey,
    parent: Option<usize>,
    /// Edge crossed to enter `triangle`.
    edge: Option<EdgeKey>,
    pos: Vec3,
    dist_done: f32,
    dist_left: f32,
}

impl SearchState {
    fn cost(&self) -> f32 {
        self.dist_done + self.dist_left
    }

    fn partial_score(&self) -> f32 {
        self.dist_left + PARTIAL_DONE_WEIGHT * self.dist_done
    }
}

/// Min-heap entry.
#[derive(Debug, Clone, Copy, PartialEq)]
struct OpenEntry {
    cost: f32,
    index: usize,
}

impl Eq for OpenEntry {}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.index.cmp(&self.index))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Outcome of the search loop.
enum Search {
    Found(Vec<NaviPathNode>),
    Reachable,
    Exhausted { closest: usize },
}

pub struct NaviPathGenerator<'a> {
    mesh: &'a mut NaviMesh,
}

impl<'a> NaviPathGenerator<'a> {
    pub fn new(mesh: &'a mut NaviMesh) -> Self {
        Self { mesh }
    }

    /// Two point nodes straight from `start` to `goal`.
    pub fn generate_direct_move(start: &Vec3, goal: &Vec3, nodes: &mut Vec<NaviPathNode>) {
        nodes.clear();
        nodes.push(NaviPathNode::point(*start));
        nodes.push(NaviPathNode::point(*goal));
    }

    /// Search a path for an agent of `radius` from `start` to `goal`.
    ///
    /// With `check_only` the search stops at the first goal and `nodes` is
    /// left empty. `incomplete_distance` bounds how far from the goal a
    /// partial path may end; zero accepts any.
    #[allow(clippy::too_many_arguments)]
    pub fn generate_path(
        &mut self,
        start: &Vec3,
        goal: &Vec3,
        radius: f32,
        path_flags: PathFlags,
        nodes: &mut Vec<NaviPathNode>,
        check_only: bool,
        generation_flags: PathGenerationFlags,
        incomplete_distance: f32,
    ) -> NaviPathResult {
        nodes.clear();
        if !self.mesh.is_mesh_valid() {
            return NaviPathResult::FailedNaviMesh;
        }
        if !Vec3Ext::is_finite(start) || !Vec3Ext::is_finite(goal) || !radius.is_finite() || radius < 0.0 {
            return NaviPathResult::Failed;
        }

        let cdt = self.mesh.cdt();
        let Some(start_triangle) = cdt.find_triangle_at_point(start) else {
            return NaviPathResult::FailedTriangle;
        };
        if !passes(cdt, start_triangle, path_flags) {
            return NaviPathResult::FailedRegion;
        }

        let (goal_triangle, goal) = match cdt.find_triangle_at_point(goal) {
            Some(t) if passes(cdt, t, path_flags) => (t, *goal),
            _ => match fix_invalid_goal(cdt, start, goal, path_flags) {
                Some(fixed) => fixed,
                None => return NaviPathResult::FailedRegion,
            },
        };

        if goal_triangle == start_triangle {
            if !segment_clear(cdt, start_triangle, start, &goal, radius, path_flags) {
                return NaviPathResult::FailedNoPathFound;
            }
            if !check_only {
                Self::generate_direct_move(start, &goal, nodes);
            }
            return NaviPathResult::Success;
        }

        let mut states = vec![SearchState {
            triangle: start_triangle,
            parent: None,
            edge: None,
            pos: *start,
            dist_done: 0.0,
            dist_left: start.distance_2d(&goal),
        }];
        let search = self.search(&mut states, start, &goal, goal_triangle, radius, path_flags, check_only);

        let result = match search {
            Search::Reachable => NaviPathResult::Success,
            Search::Found(found) => {
                *nodes = found;
                NaviPathResult::Success
            }
            Search::Exhausted { closest } => {
                if !generation_flags.contains(PathGenerationFlags::INCOMPLETED_PATH) || closest == 0 {
                    return NaviPathResult::FailedNoPathFound;
                }
                let state = states[closest];
                if incomplete_distance > 0.0 && state.dist_left > incomplete_distance {
                    return NaviPathResult::FailedNoPathFound;
                }
                if !check_only {
                    let cdt = self.mesh.cdt();
                    let end = cdt.project_to_plane(state.triangle, &state.pos);
                    *nodes = string_pull(cdt, start, &end, &channel(cdt, &states, closest), radius);
                    if !generation_flags.contains(PathGenerationFlags::IGNORE_SWEEP) && !self.last_leg_clear(nodes, path_flags) {
                        nodes.clear();
                        return NaviPathResult::FailedNoPathFound;
                    }
                }
                NaviPathResult::IncompletedPath
            }
        };

        if nodes.len() > self.mesh.config().max_path_nodes {
            tracing::warn!(nodes = nodes.len(), "path exceeds node limit");
            nodes.clear();
            return NaviPathResult::FailedOutMaxSize;
        }
        if !check_only {
            tracing::debug!(nodes = nodes.len(), states = states.len(), ?result, "path generated");
        }
        result
    }

    #[allow(clippy::too_many_arguments)]
    fn search(
        &self,
        states: &mut Vec<SearchState>,
        start: &Vec3,
        goal: &Vec3,
        goal_triangle: TriangleKey,
        radius: f32,
        path_flags: PathFlags,
        check_only: bool,
    ) -> Search {
        let cdt = self.mesh.cdt();
        let config = self.mesh.config();
        let width = 2.0 * radius;

        let mut open = BinaryHeap::new();
        open.push(OpenEntry {
            cost: states[0].cost(),
            index: 0,
        });
        let mut best: Option<(f32, Vec<NaviPathNode>)> = None;
        let mut attempts_left: Option<usize> = None;
        let mut closest = 0;
        let mut expanded = 0;

        while let Some(OpenEntry { index, .. }) = open.pop() {
            let state = states[index];
            if best.as_ref().is_some_and(|(distance, _)| state.cost() >= *distance) {
                break;
            }
            expanded += 1;

            if state.triangle == goal_triangle {
                if check_only {
                    return Search::Reachable;
                }
                let nodes = string_pull(cdt, start, goal, &channel(cdt, states, index), radius);
                let distance = NaviPath::calc_accurate_distance(&nodes);
                if best.as_ref().map_or(true, |(d, _)| distance < *d) {
                    best = Some((distance, nodes));
                }
                let left = attempts_left
                    .get_or_insert_with(|| (expanded / EXPANSIONS_PER_ATTEMPT).max(1).min(config.max_extra_attempts));
                if *left == 0 {
                    break;
                }
                *left -= 1;
                continue;
            }

            if state.partial_score() < states[closest].partial_score() {
                closest = index;
            }
            if expanded >= config.max_search_states {
                tracing::error!(expanded, states = states.len(), "path search state limit reached");
                break;
            }

            let triangle = &cdt.triangles()[state.triangle];
            for edge_index in 0..3 {
                let edge = triangle.edges[edge_index];
                if Some(edge) == state.edge || cdt.edges()[edge].is_door() {
                    continue;
                }
                let Some(next) = cdt.edges()[edge].opposed_triangle(state.triangle) else {
                    continue;
                };
                if !passes(cdt, next, path_flags) {
                    continue;
                }
                if width > 0.0 {
                    if cdt.edge_width(edge) + WIDTH_TOLERANCE < width {
                        continue;
                    }
                    match state.edge {
                        Some(entry) => {
                            if cdt.calculate_width_ignore_initial_edges(state.triangle, entry, edge) + WIDTH_TOLERANCE < width {
                                continue;
                            }
                        }
                        None => {
                            if edge_turn_width(cdt, state.triangle, edge) + WIDTH_TOLERANCE < width {
                                continue;
                            }
                        }
                    }
                    if next == goal_triangle && edge_turn_width(cdt, next, edge) + WIDTH_TOLERANCE < width {
                        continue;
                    }
                }
                if is_on_branch(states, index, next) {
                    continue;
                }
                if states.len() >= config.max_search_states {
                    tracing::error!(capacity = config.max_search_states, "path search queue is full");
                    return best.map_or(Search::Exhausted { closest }, |(_, nodes)| Search::Found(nodes));
                }

                let portal = portal_of(cdt, state.triangle, edge_index);
                let pos = crossing_point(cdt, &portal, radius, &state.pos, goal);
                let dist_left = pos.distance_2d(goal);
                let dist_done = start
                    .distance_2d(&pos)
                    .max(state.dist_done + state.pos.distance_2d(&pos))
                    .max(state.dist_done + (state.dist_left - dist_left));
                let child = SearchState {
                    triangle: next,
                    parent: Some(index),
                    edge: Some(edge),
                    pos,
                    dist_done,
                    dist_left,
                };
                open.push(OpenEntry {
                    cost: child.cost(),
                    index: states.len(),
                });
                states.push(child);
            }
        }

        match best {
            Some((_, nodes)) => Search::Found(nodes),
            None => Search::Exhausted { closest },
        }
    }

    /// Point sweep along the last leg of a partial path.
    fn last_leg_clear(&mut self, nodes: &[NaviPathNode], path_flags: PathFlags) -> bool {
        let [.., from, to] = nodes else {
            return true;
        };
        let segment = NaviPath::get_path_segment(from, to);
        self.mesh.sweep(&segment.start, &segment.end, 0.0, path_flags).result == SweepResult::Success
    }
}

/// An empty filter accepts every triangle.
fn passes(cdt: &NaviCdt, triangle: TriangleKey, path_flags: PathFlags) -> bool {
    cdt.triangle_passes(triangle, path_flags)
}

/// Narrowest turn around the obstacle endpoints of `edge` inside
/// `triangle`, for the start and goal triangles where only one crossed
/// edge is known.
fn edge_turn_width(cdt: &NaviCdt, triangle: TriangleKey, edge: EdgeKey) -> f32 {
    let tri = &cdt.triangles()[triangle];
    let edge_index = tri.edge_index(edge);
    let mut width = f32::MAX;
    for point in cdt.edges()[edge].points {
        if cdt.points()[point].influence_radius <= 0.0 && !cdt.is_point_constraint(point, triangle) {
            continue;
        }
        let oppo = tri.opposed_edge_index(cdt.edges(), point);
        let other = tri.edges[3 - oppo - edge_index];
        width = width.min(cdt.calculate_width_ignore_initial_edges(triangle, other, edge));
    }
    width
}

/// True when a circle of `radius` moving from `from` to `to` stays off
/// blocking edges and obstacle circles. Starts at `triangle`, which
/// contains `from`.
fn segment_clear(cdt: &NaviCdt, triangle: TriangleKey, from: &Vec3, to: &Vec3, radius: f32, path_flags: PathFlags) -> bool {
    let reach = radius - WIDTH_TOLERANCE;
    if reach <= 0.0 {
        return true;
    }
    let reach_sq = reach * reach;
    let mut visited = vec![triangle];
    let mut stack = vec![triangle];
    while let Some(current) = stack.pop() {
        let tri = &cdt.triangles()[current];
        for point in tri.points(cdt.edges()) {
            let p = &cdt.points()[point];
            if p.influence_radius > 0.0
                && segment_point_distance_sq_2d(from, to, &p.pos).sqrt() < reach + p.influence_radius
            {
                return false;
            }
        }
        for edge_index in 0..3 {
            let edge = tri.edges[edge_index];
            let [a, b] = cdt.edge_positions(edge);
            if segment_segment_distance_sq_2d(from, to, &a, &b) > reach_sq {
                continue;
            }
            let next = match cdt.neighbor(current, edge_index) {
                Some(next) if !cdt.edges()[edge].is_door() && passes(cdt, next, path_flags) => next,
                _ => return false,
            };
            if !visited.contains(&next) {
                visited.push(next);
                stack.push(next);
            }
        }
    }
    true
}

fn is_on_branch(states: &[SearchState], mut index: usize, triangle: TriangleKey) -> bool {
    loop {
        let state = &states[index];
        if state.triangle == triangle {
            return true;
        }
        match state.parent {
            Some(parent) => index = parent,
            None => return false,
        }
    }
}

/// Walker's view of leaving `triangle` through edge `edge_index`.
fn portal_of(cdt: &NaviCdt, triangle: TriangleKey, edge_index: usize) -> Portal {
    let tri = &cdt.triangles()[triangle];
    Portal {
        left: tri.edge_point_cw(cdt.edges(), edge_index, 1),
        right: tri.edge_point_cw(cdt.edges(), edge_index, 0),
    }
}

/// Crossed edges from the start state to `index`.
fn channel(cdt: &NaviCdt, states: &[SearchState], mut index: usize) -> Vec<Portal> {
    let mut portals = Vec::new();
    while let (Some(parent), Some(edge)) = (states[index].parent, states[index].edge) {
        let from = states[parent].triangle;
        portals.push(portal_of(cdt, from, cdt.triangles()[from].edge_index(edge)));
        index = parent;
    }
    portals.reverse();
    portals
}

/// Where the search assumes the agent crosses `portal`: on the line toward
/// the goal when it passes between the clearance limits, otherwise at the
/// closer limit.
fn crossing_point(cdt: &NaviCdt, portal: &Portal, radius: f32, from: &Vec3, goal: &Vec3) -> Vec3 {
    let l = &cdt.points()[portal.left];
    let r = &cdt.points()[portal.right];
    let span = r.pos - l.pos;
    let length = span.length_2d();
    let ol = radius + l.influence_radius;
    let or = radius + r.influence_radius;
    if length <= ol + or {
        let t = if ol + or > 0.0 { ol / (ol + or) } else { 0.5 };
        return l.pos + span * t;
    }
    let a = l.pos + span * (ol / length);
    let b = r.pos - span * (or / length);
    if segments_intersect_2d(from, goal, &a, &b) {
        if let Some(p) = line_line_intersect_2d(&a, &b, from, goal) {
            return p;
        }
    }
    let via = |p: &Vec3| from.distance_2d(p) + p.distance_2d(goal);
    if via(&a) <= via(&b) {
        a
    } else {
        b
    }
}

/// Pull an unreachable goal back toward `start` onto the closest
/// traversable triangle along the segment.
fn fix_invalid_goal(cdt: &NaviCdt, start: &Vec3, goal: &Vec3, path_flags: PathFlags) -> Option<(TriangleKey, Vec3)> {
    let at = |t: f32| goal + (start - goal) * t;
    let ok = |t: f32| cdt.find_triangle_at_point(&at(t)).is_some_and(|tri| passes(cdt, tri, path_flags));

    let steps = (start.distance_2d(goal) / FIX_GOAL_STEP).ceil().max(1.0) as usize;
    let mut bad = 0.0;
    let mut good = None;
    for k in 1..=steps {
        let t = k as f32 / steps as f32;
        if ok(t) {
            good = Some(t);
            break;
        }
        bad = t;
    }
    let mut good = good?;
    for _ in 0..FIX_GOAL_BISECTIONS {
        let mid = (bad + good) * 0.5;
        if ok(mid) {
            good = mid;
        } else {
            bad = mid;
        }
    }

    let pos = at(good);
    let triangle = cdt.find_triangle_at_point(&pos)?;
    tracing::trace!(x = pos.x, y = pos.y, "goal moved onto traversable mesh");
    Some((triangle, cdt.project_to_plane(triangle, &pos)))
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use navi_core::Transform3;

    use crate::flags::ContentFlags;
    use crate::mesh::tests::{floor_mesh, walled_mesh};
    use crate::patch::NaviPatch;

    use super::*;

    fn v(x: f32, y: f32) -> Vec3 {
        Vec3::new(x, y, 0.0)
    }

    fn generate(mesh: &mut NaviMesh, start: Vec3, goal: Vec3, radius: f32) -> (NaviPathResult, Vec<NaviPathNode>) {
        let mut nodes = Vec::new();
        let result = NaviPathGenerator::new(mesh).generate_path(
            &start,
            &goal,
            radius,
            PathFlags::WALK,
            &mut nodes,
            false,
            PathGenerationFlags::NONE,
            0.0,
        );
        (result, nodes)
    }

    #[test]
    fn test_open_entry_is_min_heap() {
        let mut heap = BinaryHeap::new();
        heap.push(OpenEntry { cost: 5.0, index: 0 });
        heap.push(OpenEntry { cost: 1.0, index: 1 });
        heap.push(OpenEntry { cost: 3.0, index: 2 });
        assert_eq!(heap.pop().unwrap().index, 1);
        assert_eq!(heap.pop().unwrap().index, 2);
    }

    #[test]
    fn test_invalid_mesh() {
        let mut mesh = floor_mesh();
        let (result, nodes) = generate(&mut mesh, v(10.0, 10.0), v(900.0, 900.0), 5.0);
        assert_eq!(result, NaviPathResult::FailedNaviMesh);
        assert!(nodes.is_empty());
    }

    #[test]
    fn test_start_outside_mesh() {
        let mut mesh = floor_mesh();
        mesh.generate_mesh().unwrap();
        let (result, _) = generate(&mut mesh, v(5000.0, 10.0), v(900.0, 900.0), 5.0);
        assert_eq!(result, NaviPathResult::FailedTriangle);
        // Inside the padding: a triangle exists but is not walkable.
        let (result, _) = generate(&mut mesh, v(-50.0, 500.0), v(900.0, 900.0), 5.0);
        assert_eq!(result, NaviPathResult::FailedRegion);
    }

    #[test]
    fn test_open_floor_is_straight() {
        let mut mesh = floor_mesh();
        mesh.generate_mesh().unwrap();
        let (result, nodes) = generate(&mut mesh, v(100.0, 100.0), v(900.0, 850.0), 10.0);
        assert_eq!(result, NaviPathResult::Success);
        assert_eq!(nodes.first().unwrap().vertex, v(100.0, 100.0));
        assert_eq!(nodes.last().unwrap().vertex, v(900.0, 850.0));
        let length = NaviPath::calc_accurate_distance(&nodes);
        assert_relative_eq!(length, v(100.0, 100.0).distance_2d(&v(900.0, 850.0)), epsilon = 1.0);
    }

    #[test]
    fn test_walks_around_wall() {
        let mut mesh = walled_mesh(v(400.0, 200.0), v(600.0, 800.0));
        let (result, nodes) = generate(&mut mesh, v(300.0, 500.0), v(700.0, 500.0), 10.0);
        assert_eq!(result, NaviPathResult::Success);
        assert!(nodes.len() >= 4);
        // Every turn is a wall corner kept at the agent radius.
        for node in &nodes[1..nodes.len() - 1] {
            assert_ne!(node.side, crate::path::NaviSide::Point);
            assert_relative_eq!(node.radius, 10.0);
            assert!(node.vertex.x == 400.0 || node.vertex.x == 600.0);
        }
        let direct = 400.0;
        assert!(NaviPath::calc_accurate_distance(&nodes) > direct);
    }

    #[test]
    fn test_goal_inside_wall_is_pulled_back() {
        let mut mesh = walled_mesh(v(400.0, 200.0), v(600.0, 800.0));
        let (result, nodes) = generate(&mut mesh, v(100.0, 500.0), v(500.0, 500.0), 0.0);
        assert_eq!(result, NaviPathResult::Success);
        let end = nodes.last().unwrap().vertex;
        assert!(end.x <= 400.0 + 0.5);
        assert!(end.x > 390.0);
    }

    #[test]
    fn test_check_only_leaves_nodes_empty() {
        let mut mesh = walled_mesh(v(400.0, 200.0), v(600.0, 800.0));
        let mut nodes = vec![NaviPathNode::point(Vec3::zeros())];
        let result = NaviPathGenerator::new(&mut mesh).generate_path(
            &v(300.0, 500.0),
            &v(700.0, 500.0),
            10.0,
            PathFlags::WALK,
            &mut nodes,
            true,
            PathGenerationFlags::NONE,
            0.0,
        );
        assert_eq!(result, NaviPathResult::Success);
        assert!(nodes.is_empty());
    }

    #[test]
    fn test_too_wide_agent_cannot_pass_gap() {
        // Wall across the floor leaving 50 unit gaps at both ends.
        let mut mesh = walled_mesh(v(480.0, 50.0), v(520.0, 950.0));
        let (result, _) = generate(&mut mesh, v(200.0, 500.0), v(800.0, 500.0), 20.0);
        assert_eq!(result, NaviPathResult::Success);
        let (result, _) = generate(&mut mesh, v(200.0, 500.0), v(800.0, 500.0), 30.0);
        assert_eq!(result, NaviPathResult::FailedNoPathFound);
    }

    /// Floor cut down to a corridor 100 units wide along y = 500.
    fn corridor_mesh() -> NaviMesh {
        let mut mesh = floor_mesh();
        for (min, max) in [(v(-50.0, -50.0), v(1050.0, 450.0)), (v(-50.0, 550.0), v(1050.0, 1050.0))] {
            mesh.stitch(NaviPatch::rectangle(min, max, ContentFlags::REMOVE_WALK), Transform3::identity())
                .unwrap();
        }
        mesh.generate_mesh().unwrap();
        mesh
    }

    #[test]
    fn test_agent_wider_than_corridor() {
        let mut mesh = corridor_mesh();
        let (result, _) = generate(&mut mesh, v(50.0, 500.0), v(950.0, 500.0), 45.0);
        assert_eq!(result, NaviPathResult::Success);

        let (result, nodes) = generate(&mut mesh, v(50.0, 500.0), v(950.0, 500.0), 100.0);
        assert_eq!(result, NaviPathResult::FailedNoPathFound);
        assert!(nodes.is_empty());
    }

    #[test]
    fn test_short_move_checks_clearance() {
        let mut mesh = corridor_mesh();
        let (result, nodes) = generate(&mut mesh, v(50.0, 500.0), v(51.0, 500.0), 45.0);
        assert_eq!(result, NaviPathResult::Success);
        assert_eq!(nodes.len(), 2);

        let (result, nodes) = generate(&mut mesh, v(50.0, 500.0), v(51.0, 500.0), 100.0);
        assert_eq!(result, NaviPathResult::FailedNoPathFound);
        assert!(nodes.is_empty());
    }

    #[test]
    fn test_incomplete_path() {
        // Wall reaching past the floor on both ends.
        let mut mesh = walled_mesh(v(480.0, -50.0), v(520.0, 1050.0));
        let mut nodes = Vec::new();
        let result = NaviPathGenerator::new(&mut mesh).generate_path(
            &v(200.0, 500.0),
            &v(800.0, 500.0),
            10.0,
            PathFlags::WALK,
            &mut nodes,
            false,
            PathGenerationFlags::INCOMPLETED_PATH,
            0.0,
        );
        assert_eq!(result, NaviPathResult::IncompletedPath);
        let end = nodes.last().unwrap().vertex;
        assert!(end.x < 480.0);
        assert!(end.x > 200.0);

        let result = NaviPathGenerator::new(&mut mesh).generate_path(
            &v(200.0, 500.0),
            &v(800.0, 500.0),
            10.0,
            PathFlags::WALK,
            &mut nodes,
            false,
            PathGenerationFlags::INCOMPLETED_PATH,
            50.0,
        );
        assert_eq!(result, NaviPathResult::FailedNoPathFound);
    }
}
