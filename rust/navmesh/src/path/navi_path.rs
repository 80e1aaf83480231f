// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Generated paths and path following.
//!
//! A path is a list of nodes. Point nodes are passed through; Left and
//! Right nodes are circles the walker steers around, keeping the circle on
//! that side. Consecutive nodes are joined by their common tangent, see
//! [`NaviPath::get_path_segment`].

use navi_core::{circle_tangent_2d, Segment, Vec3, Vec3Ext};
use serde::{Deserialize, Serialize};

use crate::flags::{PathFlags, PathGenerationFlags};
use crate::mesh::NaviMesh;

use super::generator::NaviPathGenerator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NaviSide {
    #[default]
    Point,
    /// The node's circle stays on the walker's left.
    Left,
    /// The node's circle stays on the walker's right.
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NaviPathNode {
    pub vertex: Vec3,
    pub side: NaviSide,
    pub radius: f32,
    pub has_influence: bool,
}

impl NaviPathNode {
    pub fn new(vertex: Vec3, side: NaviSide, radius: f32, has_influence: bool) -> Self {
        Self {
            vertex,
            side,
            radius,
            has_influence,
        }
    }

    pub fn point(vertex: Vec3) -> Self {
        Self::new(vertex, NaviSide::Point, 0.0, false)
    }

    fn is_left(&self) -> bool {
        self.side == NaviSide::Left
    }
}

/// Intermediate goal of a waypoint path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub point: Vec3,
    pub side: NaviSide,
    pub radius: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum NaviPathResult {
    Success = 0,
    Failed = 1,
    FailedRegion = 3,
    FailedNaviMesh = 4,
    FailedTriangle = 5,
    FailedNoPathFound = 7,
    FailedOutMaxSize = 9,
    IncompletedPath = 10,
}

impl NaviPathResult {
    /// Success or a usable partial path.
    pub fn has_path(self) -> bool {
        matches!(self, Self::Success | Self::IncompletedPath)
    }
}

#[derive(Debug, Clone, Default)]
pub struct NaviPath {
    nodes: Vec<NaviPathNode>,
    /// Last node reached; `None` before the first, `Some(len)` when done.
    current_node_index: Option<usize>,
    approx_total_distance: f32,
    has_accurate_distance: bool,
    path_flags: PathFlags,
    radius: f32,
    width: f32,
}

impl NaviPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        !self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[NaviPathNode] {
        &self.nodes
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn path_flags(&self) -> PathFlags {
        self.path_flags
    }

    pub fn is_complete(&self) -> bool {
        !self.is_valid() || self.get_current_goal_node_index() == self.nodes.len()
    }

    pub fn is_current_goal_node_last_node(&self) -> bool {
        self.is_valid()
            && self.current_node_index != Some(self.nodes.len())
            && self.get_current_goal_node_index() + 1 == self.nodes.len()
    }

    pub fn init(&mut self, radius: f32, path_flags: PathFlags, nodes: &[NaviPathNode]) {
        self.radius = radius;
        self.width = 2.0 * radius;
        self.path_flags = path_flags;
        self.approx_total_distance = 0.0;
        self.has_accurate_distance = false;
        self.nodes.clear();
        self.current_node_index = None;
        if !nodes.is_empty() {
            self.append(nodes);
        }
    }

    pub fn clear(&mut self) {
        self.init(0.0, PathFlags::NONE, &[]);
    }

    fn append(&mut self, nodes: &[NaviPathNode]) {
        self.nodes.extend_from_slice(nodes);
        self.current_node_index = Some(0);
    }

    // ========================================================================
    // Distances
    // ========================================================================

    /// Length along straight legs, offsetting circle nodes sideways by
    /// their radius.
    pub fn approx_total_distance(&self) -> f32 {
        if self.approx_total_distance == 0.0 {
            Self::calc_approximate_distance(&self.nodes)
        } else {
            self.approx_total_distance
        }
    }

    fn calc_approximate_distance(nodes: &[NaviPathNode]) -> f32 {
        let mut distance = 0.0;
        let mut prev = Vec3::zeros();
        for pair in nodes.windows(2) {
            let (n0, n1) = (&pair[0], &pair[1]);
            if n0.side == NaviSide::Point && n1.side == NaviSide::Point {
                distance += n0.vertex.distance_2d(&n1.vertex);
                prev = n1.vertex;
                continue;
            }
            let perp = (n1.vertex - n0.vertex).safe_normalize_2d().perp_2d();
            let offset = |node: &NaviPathNode| match node.side {
                NaviSide::Point => node.vertex,
                NaviSide::Left => node.vertex - perp * node.radius,
                NaviSide::Right => node.vertex + perp * node.radius,
            };
            let (start, end) = (offset(n0), offset(n1));
            distance += start.distance_2d(&end);
            if n0.side != NaviSide::Point {
                distance += prev.distance_2d(&start);
            }
            prev = end;
        }
        distance
    }

    /// Length along tangent legs plus the arcs walked around circle
    /// nodes. Cached after the first call.
    pub fn accurate_total_distance(&mut self) -> f32 {
        if !self.has_accurate_distance {
            let distance = Self::calc_accurate_distance(&self.nodes);
            self.approx_total_distance = if distance.is_finite() { distance } else { 0.0 };
            self.has_accurate_distance = true;
        }
        self.approx_total_distance
    }

    pub fn calc_accurate_distance(nodes: &[NaviPathNode]) -> f32 {
        let mut distance = 0.0;
        let mut prev = Vec3::zeros();
        for pair in nodes.windows(2) {
            let (n0, n1) = (&pair[0], &pair[1]);
            let segment = Self::get_path_segment(n0, n1);
            if n0.radius > 0.0 {
                let arrive = prev - n0.vertex;
                let leave = segment.start - n0.vertex;
                distance += n0.radius * arrive.angle_2d(&leave);
            }
            distance += segment.length_2d();
            prev = segment.end;
        }
        distance
    }

    /// Straight-line distance left from `position` through the remaining
    /// nodes.
    pub fn approx_current_distance(&self, position: &Vec3) -> f32 {
        let index = self.get_current_goal_node_index();
        if index >= self.nodes.len() {
            return 0.0;
        }
        let mut distance = position.distance_2d(&self.nodes[index].vertex);
        for pair in self.nodes[index..].windows(2) {
            distance += pair[0].vertex.distance_2d(&pair[1].vertex);
        }
        distance
    }

    /// Leg walked from `node0` to `node1`: the common tangent of their
    /// circles, with point nodes as zero-radius circles. Falls back to the
    /// straight segment between vertices when no tangent exists.
    pub fn get_path_segment(node0: &NaviPathNode, node1: &NaviPathNode) -> Segment {
        let r0 = if node0.side == NaviSide::Point { 0.0 } else { node0.radius };
        let r1 = if node1.side == NaviSide::Point { 0.0 } else { node1.radius };
        if r0 <= 0.0 && r1 <= 0.0 {
            return Segment::new(node0.vertex, node1.vertex);
        }
        circle_tangent_2d(&node0.vertex, r0, node0.is_left(), &node1.vertex, r1, node1.is_left())
            .unwrap_or_else(|| Segment::new(node0.vertex, node1.vertex))
    }

    // ========================================================================
    // Goal tracking
    // ========================================================================

    pub fn get_current_goal_node_index(&self) -> usize {
        match self.current_node_index {
            Some(index) if index == self.nodes.len() => index,
            Some(index) => index + 1,
            None => 0,
        }
    }

    pub fn get_current_goal_node(&self) -> Option<&NaviPathNode> {
        self.nodes.get(self.get_current_goal_node_index())
    }

    /// Where to head from `position`: the goal node, or the tangent point
    /// on its circle.
    pub fn get_current_goal_position(&self, position: &Vec3) -> Vec3 {
        match self.get_current_goal_node() {
            Some(node) => Self::get_node_goal_position(node, position),
            None => *position,
        }
    }

    fn get_node_goal_position(node: &NaviPathNode, position: &Vec3) -> Vec3 {
        if node.side == NaviSide::Point {
            return node.vertex;
        }
        circle_tangent_2d(position, 0.0, true, &node.vertex, node.radius, node.is_left())
            .map_or(node.vertex, |tangent| tangent.end)
    }

    pub fn pop_goal(&mut self) {
        self.nodes.pop();
    }

    pub fn get_start_position(&self) -> Vec3 {
        self.nodes.first().map_or_else(Vec3::zeros, |n| n.vertex)
    }

    pub fn get_final_position(&self) -> Vec3 {
        self.nodes.last().map_or_else(Vec3::zeros, |n| n.vertex)
    }

    pub fn update_end_position(&mut self, position: Vec3) {
        if let Some(last) = self.nodes.last_mut() {
            last.vertex = position;
        }
    }

    // ========================================================================
    // Generation
    // ========================================================================

    /// Whether a path exists, without keeping it.
    pub fn check_can_path_to(
        mesh: &mut NaviMesh,
        position: &Vec3,
        goal: &Vec3,
        radius: f32,
        path_flags: PathFlags,
    ) -> NaviPathResult {
        let mut nodes = Vec::new();
        NaviPathGenerator::new(mesh).generate_path(
            position,
            goal,
            radius,
            path_flags,
            &mut nodes,
            true,
            PathGenerationFlags::NONE,
            0.0,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn generate_path(
        &mut self,
        mesh: &mut NaviMesh,
        position: &Vec3,
        goal: &Vec3,
        radius: f32,
        path_flags: PathFlags,
        generation_flags: PathGenerationFlags,
        incomplete_distance: f32,
    ) -> NaviPathResult {
        let mut nodes = Vec::new();
        let result = NaviPathGenerator::new(mesh).generate_path(
            position,
            goal,
            radius,
            path_flags,
            &mut nodes,
            false,
            generation_flags,
            incomplete_distance,
        );
        self.init(radius, path_flags, &nodes);
        result
    }

    /// Chain paths through `waypoints`. Circle waypoints replace the last
    /// node of their leg; the final waypoint must be a point.
    pub fn generate_waypoint_path(
        &mut self,
        mesh: &mut NaviMesh,
        position: &Vec3,
        waypoints: &[Waypoint],
        radius: f32,
        path_flags: PathFlags,
    ) -> NaviPathResult {
        if waypoints.last().map_or(true, |w| w.side != NaviSide::Point) {
            return NaviPathResult::Failed;
        }

        let max_path_nodes = mesh.config().max_path_nodes;
        let start = NaviPathNode::point(*position);
        let mut nodes: Vec<NaviPathNode> = Vec::new();
        let mut leg: Vec<NaviPathNode> = Vec::new();
        let mut result = NaviPathResult::Success;
        let mut generator = NaviPathGenerator::new(mesh);

        for waypoint in waypoints {
            let point_ok = waypoint.side == NaviSide::Point && waypoint.radius == 0.0;
            let circle_ok = waypoint.side != NaviSide::Point && waypoint.radius > 0.0;
            if !waypoint.point.iter().all(|c| c.is_finite()) || !(point_ok || circle_ok) {
                return NaviPathResult::Failed;
            }

            let node = NaviPathNode::new(waypoint.point, waypoint.side, waypoint.radius, false);
            let segment = Self::get_path_segment(nodes.last().unwrap_or(&start), &node);
            leg.clear();
            result = generator.generate_path(
                &segment.start,
                &segment.end,
                radius,
                path_flags,
                &mut leg,
                false,
                PathGenerationFlags::NONE,
                0.0,
            );
            if result != NaviPathResult::Success {
                break;
            }
            // Each leg starts where the previous one ended.
            let skip = usize::from(!nodes.is_empty()).min(leg.len());
            if nodes.len() + leg.len() - skip > max_path_nodes {
                return NaviPathResult::FailedOutMaxSize;
            }
            if waypoint.side != NaviSide::Point {
                if let Some(last) = leg.last_mut() {
                    *last = node;
                }
            }
            nodes.extend_from_slice(&leg[skip..]);
        }

        self.init(radius, path_flags, &[]);
        if result == NaviPathResult::Success {
            self.append(&nodes);
        }
        result
    }

    /// Straight two-node path with no mesh check.
    pub fn generate_simple_move(&mut self, position: &Vec3, goal: &Vec3, radius: f32, path_flags: PathFlags) -> NaviPathResult {
        let mut nodes = Vec::with_capacity(2);
        NaviPathGenerator::generate_direct_move(position, goal, &mut nodes);
        self.init(radius, path_flags, &nodes);
        NaviPathResult::Success
    }

    // ========================================================================
    // Following
    // ========================================================================

    /// Step `move_distance` from `from` along the path. Returns the new
    /// position and the unit move direction.
    pub fn get_next_move_position(&mut self, from: &Vec3, move_distance: f32) -> (Vec3, Vec3) {
        if !from.iter().all(|c| c.is_finite()) || !move_distance.is_finite() {
            return (Vec3::zeros(), Vec3::zeros());
        }

        self.try_advance_goal_node(from);
        let goal_index = self.get_current_goal_node_index();
        let (position, direction) = match self.nodes.get(goal_index).copied() {
            Some(goal) if goal.side == NaviSide::Point => {
                let direction = (goal.vertex - from).safe_normalize_2d();
                if goal.vertex.distance_sq_2d(from) < move_distance * move_distance {
                    if goal_index + 1 == self.nodes.len() {
                        self.current_node_index = Some(self.nodes.len());
                    }
                    (goal.vertex, direction)
                } else {
                    (from + direction * move_distance, direction)
                }
            }
            Some(goal) => {
                let toward = (goal.vertex - from).safe_normalize_2d();
                let direction = circle_tangent_2d(from, 0.0, true, &goal.vertex, goal.radius, goal.is_left())
                    .map(|tangent| (tangent.end - from).safe_normalize_2d_or(toward))
                    .unwrap_or(toward);
                (from + direction * move_distance, direction)
            }
            None => {
                let end = self.get_final_position();
                (end, (end - from).safe_normalize_2d())
            }
        };

        if position.iter().all(|c| c.is_finite()) {
            (position, direction)
        } else {
            (Vec3::zeros(), direction)
        }
    }

    /// Mark nodes as reached: points within one unit, circles once the
    /// walker is past them on the right side.
    fn try_advance_goal_node(&mut self, from: &Vec3) {
        let mut goal_index = self.get_current_goal_node_index();
        while goal_index < self.nodes.len() {
            let goal = &self.nodes[goal_index];
            let reached = if goal.side == NaviSide::Point {
                goal.vertex.distance_sq_2d(from) < 1.0
            } else {
                self.nodes.get(goal_index + 1).is_some_and(|next| {
                    let next_dir = next.vertex - goal.vertex;
                    let from_dir = from - goal.vertex;
                    let side = if from_dir.cross_2d(&next_dir) > 0.0 {
                        NaviSide::Left
                    } else {
                        NaviSide::Right
                    };
                    side == goal.side && from_dir.dot_2d(&next_dir) > 0.0
                })
            };
            if !reached {
                break;
            }
            self.current_node_index = Some(goal_index);
            goal_index += 1;
        }
    }
}
