// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Authored patrol routes, grouped by id.

use navi_core::segment::segment_point_distance_sq_2d;
use navi_core::{Vec3, Vec3Ext};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// How a walker moves along a patrol route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathMethod {
    Forward,
    ForwardLoop,
    Reverse,
    ReverseLoop,
    ForwardBackAndForth,
    ReverseBackAndForth,
}

impl PathMethod {
    fn is_endless(self) -> bool {
        !matches!(self, Self::Forward | Self::Reverse)
    }

    fn is_loop(self) -> bool {
        matches!(self, Self::ForwardLoop | Self::ReverseLoop)
    }

    fn is_back_and_forth(self) -> bool {
        matches!(self, Self::ForwardBackAndForth | Self::ReverseBackAndForth)
    }
}

/// Authored node list belonging to one route group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathNodeSet {
    pub group: i32,
    pub nodes: Vec<Vec3>,
}

/// Where a walker is on its route.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathProgress {
    pub node: usize,
    pub position: Vec3,
    /// Set while a back-and-forth walker runs against its method.
    pub reverse: bool,
}

impl Default for PathProgress {
    fn default() -> Self {
        Self {
            node: 0,
            position: Vec3::zeros(),
            reverse: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct PathCache {
    sets: FxHashMap<i32, Vec<PathNodeSet>>,
    nodes: FxHashMap<i32, Vec<Vec3>>,
}

impl PathCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add every set not already known to its group, offset by `offset`.
    pub fn append_path_collection(&mut self, sets: &[PathNodeSet], offset: Vec3) {
        for set in sets {
            let known = self.sets.entry(set.group).or_default();
            if known.contains(set) {
                continue;
            }
            known.push(set.clone());
            self.nodes
                .entry(set.group)
                .or_default()
                .extend(set.nodes.iter().map(|p| p + offset));
        }
    }

    pub fn group_nodes(&self, group: i32) -> &[Vec3] {
        self.nodes.get(&group).map(Vec::as_slice).unwrap_or(&[])
    }

    /// True at the end of a one-way route.
    pub fn is_last_node(&self, group: i32, node: usize, method: PathMethod) -> bool {
        if method.is_endless() {
            return false;
        }
        let Some(nodes) = self.nodes.get(&group) else {
            return false;
        };
        match method {
            PathMethod::Forward => node + 1 == nodes.len(),
            PathMethod::Reverse => node == 0,
            _ => false,
        }
    }

    /// Pick the next node to walk to from `position`: the end of the
    /// nearest route segment in the walking direction, or the one after it
    /// once within `distance_threshold`. Returns false for an unknown or
    /// empty group.
    pub fn update_current_path_node(
        &self,
        progress: &mut PathProgress,
        group: i32,
        method: PathMethod,
        position: &Vec3,
        distance_threshold: f32,
    ) -> bool {
        let Some(nodes) = self.nodes.get(&group).filter(|n| !n.is_empty()) else {
            return false;
        };
        let count = nodes.len();
        // Loops also consider the closing segment back to the first node.
        let segments = if !method.is_loop() {
            count - 1
        } else if count >= 2 {
            count
        } else {
            0
        };

        let closest = (0..segments)
            .map(|a| {
                let b = (a + 1) % count;
                (a, b, segment_point_distance_sq_2d(&nodes[a], &nodes[b], position))
            })
            .min_by(|x, y| x.2.total_cmp(&y.2));
        let Some((node_a, node_b, _)) = closest else {
            return false;
        };

        let mut forward = match method {
            PathMethod::Forward | PathMethod::ForwardLoop => true,
            PathMethod::Reverse | PathMethod::ReverseLoop => false,
            PathMethod::ForwardBackAndForth => !progress.reverse,
            PathMethod::ReverseBackAndForth => progress.reverse,
        };
        let mut node = if forward { node_b } else { node_a };
        progress.position = nodes[node];

        if position.distance_sq_2d(&progress.position) < distance_threshold * distance_threshold {
            if method.is_back_and_forth() && (node == 0 || node == count - 1) {
                forward = !forward;
                progress.reverse = !progress.reverse;
            }
            node = if forward { (node + 1) % count } else { (node + count - 1) % count };
            progress.position = nodes[node];
        }
        progress.node = node;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f32, y: f32) -> Vec3 {
        Vec3::new(x, y, 0.0)
    }

    fn cache() -> PathCache {
        let mut cache = PathCache::new();
        let set = PathNodeSet {
            group: 1,
            nodes: vec![v(0.0, 0.0), v(100.0, 0.0), v(100.0, 100.0)],
        };
        cache.append_path_collection(&[set.clone(), set], v(10.0, 0.0));
        cache
    }

    #[test]
    fn test_append_skips_known_sets() {
        let mut cache = cache();
        assert_eq!(cache.group_nodes(1).len(), 3);
        assert_eq!(cache.group_nodes(1)[0], v(10.0, 0.0));
        cache.append_path_collection(
            &[PathNodeSet {
                group: 1,
                nodes: vec![v(0.0, 0.0), v(100.0, 0.0), v(100.0, 100.0)],
            }],
            Vec3::zeros(),
        );
        assert_eq!(cache.group_nodes(1).len(), 3);
        assert!(cache.group_nodes(2).is_empty());
    }

    #[test]
    fn test_is_last_node() {
        let cache = cache();
        assert!(cache.is_last_node(1, 2, PathMethod::Forward));
        assert!(!cache.is_last_node(1, 1, PathMethod::Forward));
        assert!(cache.is_last_node(1, 0, PathMethod::Reverse));
        assert!(!cache.is_last_node(1, 2, PathMethod::ForwardLoop));
        assert!(!cache.is_last_node(9, 0, PathMethod::Reverse));
    }

    #[test]
    fn test_forward_advances_within_threshold() {
        let cache = cache();
        let mut progress = PathProgress::default();
        assert!(cache.update_current_path_node(&mut progress, 1, PathMethod::Forward, &v(50.0, 5.0), 10.0));
        assert_eq!(progress.node, 1);
        assert_eq!(progress.position, v(110.0, 0.0));

        assert!(cache.update_current_path_node(&mut progress, 1, PathMethod::Forward, &v(108.0, 2.0), 10.0));
        assert_eq!(progress.node, 2);
    }

    #[test]
    fn test_reverse_heads_to_segment_start() {
        let cache = cache();
        let mut progress = PathProgress::default();
        cache.update_current_path_node(&mut progress, 1, PathMethod::Reverse, &v(50.0, 5.0), 10.0);
        assert_eq!(progress.node, 0);
    }

    #[test]
    fn test_loop_wraps_around() {
        let cache = cache();
        let mut progress = PathProgress::default();
        // Near the closing segment from the last node back to the first.
        cache.update_current_path_node(&mut progress, 1, PathMethod::ForwardLoop, &v(12.0, 2.0), 5.0);
        assert_eq!(progress.node, 1);
    }

    #[test]
    fn test_back_and_forth_turns_at_end() {
        let cache = cache();
        let mut progress = PathProgress::default();
        cache.update_current_path_node(&mut progress, 1, PathMethod::ForwardBackAndForth, &v(110.0, 98.0), 5.0);
        assert!(progress.reverse);
        assert_eq!(progress.node, 1);
    }

    #[test]
    fn test_unknown_group() {
        let cache = cache();
        let mut progress = PathProgress::default();
        assert!(!cache.update_current_path_node(&mut progress, 4, PathMethod::Forward, &v(0.0, 0.0), 5.0));
    }
}
