// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! String pulling through a channel of crossed edges.
//!
//! Each portal is shrunk at both ends by the agent radius plus the
//! endpoint's influence radius, then the funnel pulls the shortest line
//! through the shrunk portals. Apex points that came from a portal end are
//! emitted as circle nodes around the original vertex.

use navi_core::{Vec3, Vec3Ext};

use crate::cdt::NaviCdt;
use crate::keys::PointKey;

use super::navi_path::{NaviPathNode, NaviSide};

const SAME_POINT_EPSILON_SQ: f32 = 1e-6;

/// Edge crossed by the path, with its endpoints as seen by the walker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Portal {
    pub left: PointKey,
    pub right: PointKey,
}

#[derive(Debug, Clone, Copy)]
struct FunnelPoint {
    pos: Vec3,
    node: NaviPathNode,
    point: Option<PointKey>,
}

impl FunnelPoint {
    fn free(pos: Vec3) -> Self {
        Self {
            pos,
            node: NaviPathNode::point(pos),
            point: None,
        }
    }

    fn same_pos(&self, other: &FunnelPoint) -> bool {
        self.pos.distance_sq_2d(&other.pos) < SAME_POINT_EPSILON_SQ
    }
}

/// Portal end pulled `clearance` units in from its vertex.
fn portal_end(cdt: &NaviCdt, key: PointKey, pos: Vec3, side: NaviSide, clearance: f32) -> FunnelPoint {
    let point = &cdt.points()[key];
    let node = if clearance > 0.0 {
        NaviPathNode::new(point.pos, side, clearance, point.has_influence())
    } else {
        NaviPathNode::point(point.pos)
    };
    FunnelPoint {
        pos,
        node,
        point: Some(key),
    }
}

/// Shrunk portal as (left, right). A portal narrower than both clearances
/// collapses to the point splitting it in their ratio.
fn shrink_portal(cdt: &NaviCdt, portal: &Portal, radius: f32) -> (FunnelPoint, FunnelPoint) {
    let pl = cdt.points()[portal.left].pos;
    let pr = cdt.points()[portal.right].pos;
    let ol = radius + cdt.points()[portal.left].influence_radius;
    let or = radius + cdt.points()[portal.right].influence_radius;
    let span = pr - pl;
    let length = span.length_2d();

    if length <= ol + or {
        let t = if ol + or > 0.0 { ol / (ol + or) } else { 0.5 };
        let mid = FunnelPoint::free(pl + span * t);
        return (mid, mid);
    }
    let left = portal_end(cdt, portal.left, pl + span * (ol / length), NaviSide::Left, ol);
    let right = portal_end(cdt, portal.right, pr - span * (or / length), NaviSide::Right, or);
    (left, right)
}

/// Pull the path from `start` through `portals` to `goal`.
pub(crate) fn string_pull(cdt: &NaviCdt, start: &Vec3, goal: &Vec3, portals: &[Portal], radius: f32) -> Vec<NaviPathNode> {
    let mut funnel: Vec<(FunnelPoint, FunnelPoint)> = Vec::with_capacity(portals.len() + 2);
    funnel.push((FunnelPoint::free(*start), FunnelPoint::free(*start)));
    funnel.extend(portals.iter().map(|p| shrink_portal(cdt, p, radius)));
    funnel.push((FunnelPoint::free(*goal), FunnelPoint::free(*goal)));

    let mut out = vec![funnel[0].0];
    let mut apex = funnel[0].0;
    let (mut left, mut right) = (apex, apex);
    let (mut left_index, mut right_index) = (0usize, 0usize);

    let mut i = 1;
    while i < funnel.len() {
        let (pl, pr) = funnel[i];

        // Tighten the right side.
        if (right.pos - apex.pos).cross_2d(&(pr.pos - apex.pos)) >= 0.0 {
            if apex.same_pos(&right) || (left.pos - apex.pos).cross_2d(&(pr.pos - apex.pos)) < 0.0 {
                right = pr;
                right_index = i;
            } else {
                out.push(left);
                apex = left;
                right = apex;
                right_index = left_index;
                i = left_index + 1;
                continue;
            }
        }

        // Tighten the left side.
        if (left.pos - apex.pos).cross_2d(&(pl.pos - apex.pos)) <= 0.0 {
            if apex.same_pos(&left) || (right.pos - apex.pos).cross_2d(&(pl.pos - apex.pos)) > 0.0 {
                left = pl;
                left_index = i;
            } else {
                out.push(right);
                apex = right;
                left = apex;
                left_index = right_index;
                i = right_index + 1;
                continue;
            }
        }
        i += 1;
    }
    out.push(funnel[funnel.len() - 1].0);

    let mut nodes: Vec<NaviPathNode> = Vec::with_capacity(out.len());
    let mut last_point: Option<PointKey> = None;
    for fp in out {
        if fp.point.is_some() && fp.point == last_point {
            continue;
        }
        if fp.point.is_none() && nodes.last().is_some_and(|n| n.vertex.distance_sq_2d(&fp.pos) < SAME_POINT_EPSILON_SQ) {
            continue;
        }
        last_point = fp.point;
        nodes.push(fp.node);
    }
    // A goal on top of the start still yields a two node path.
    if nodes.len() == 1 {
        nodes.push(NaviPathNode::point(*goal));
    }
    nodes
}
