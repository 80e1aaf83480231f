// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Authored geometry patches.
//!
//! A patch is a point list plus edges between those points. Each edge tags
//! both of its sides with content flags; side 0 lies to the left of the
//! `index0 -> index1` direction. A closed counter-clockwise loop therefore
//! puts its interior on side 0.

use navi_core::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{NaviError, Result};
use crate::flags::ContentFlags;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchEdge {
    pub index0: usize,
    pub index1: usize,
    #[serde(default)]
    pub flags0: ContentFlags,
    #[serde(default)]
    pub flags1: ContentFlags,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NaviPatch {
    pub points: Vec<Vec3>,
    pub edges: Vec<PatchEdge>,
}

impl NaviPatch {
    /// Closed polygon through `points` in order, tagging the left side of
    /// each edge with `inside` and the right side with `outside`.
    pub fn polygon(points: Vec<Vec3>, inside: ContentFlags, outside: ContentFlags) -> Self {
        let count = points.len();
        let edges = (0..count)
            .map(|i| PatchEdge {
                index0: i,
                index1: (i + 1) % count,
                flags0: inside,
                flags1: outside,
            })
            .collect();
        Self { points, edges }
    }

    /// Axis aligned rectangle with its interior tagged `inside`.
    pub fn rectangle(min: Vec3, max: Vec3, inside: ContentFlags) -> Self {
        Self::polygon(
            vec![
                Vec3::new(min.x, min.y, min.z),
                Vec3::new(max.x, min.y, min.z),
                Vec3::new(max.x, max.y, min.z),
                Vec3::new(min.x, max.y, min.z),
            ],
            inside,
            ContentFlags::NONE,
        )
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Check that every edge references existing points.
    pub fn validate(&self) -> Result<()> {
        for (i, edge) in self.edges.iter().enumerate() {
            if edge.index0 >= self.points.len() || edge.index1 >= self.points.len() {
                return Err(NaviError::InvalidPatch(format!(
                    "edge {i} references point {} of {}",
                    edge.index0.max(edge.index1),
                    self.points.len()
                )));
            }
        }
        if let Some(i) = self.points.iter().position(|p| !p.iter().all(|c| c.is_finite())) {
            return Err(NaviError::InvalidPatch(format!("point {i} is not finite")));
        }
        Ok(())
    }
}
