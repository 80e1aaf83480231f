// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! JSON scene format.
//!
//! ```json
//! {
//!   "bounds": { "min": [0, 0, 0], "max": [1000, 1000, 0] },
//!   "padding": 100,
//!   "rectangles": [
//!     { "min": [0, 0, 0], "max": [1000, 1000, 0], "kind": "walk" },
//!     { "min": [400, 200, 0], "max": [600, 800, 0], "kind": "wall" }
//!   ],
//!   "influences": [{ "position": [200, 200, 0], "radius": 30 }],
//!   "queries": [
//!     { "type": "path", "from": [100, 500, 0], "to": [900, 500, 0], "radius": 10 },
//!     { "type": "sweep", "from": [100, 500, 0], "to": [900, 500, 0], "radius": 10 },
//!     { "type": "contains", "position": [500, 500, 0], "radius": 0 }
//!   ]
//! }
//! ```
//!
//! Flag fields take the raw bit values of `PathFlags` and `ContentFlags`
//! and default to walking.

use navi_core::{Aabb, Transform3, Vec3};
use navi_mesh::{ContentFlags, HeightField, NaviPatch, PathFlags, PathGenerationFlags};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Scene {
    pub bounds: Aabb,
    pub padding: Option<f32>,
    #[serde(default)]
    pub rectangles: Vec<Rectangle>,
    #[serde(default)]
    pub patches: Vec<PlacedPatch>,
    #[serde(default)]
    pub influences: Vec<Influence>,
    pub heightmap: Option<HeightField>,
    #[serde(default)]
    pub queries: Vec<Query>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RectangleKind {
    Walk,
    Wall,
    Fly,
}

impl RectangleKind {
    pub fn content(self) -> ContentFlags {
        match self {
            Self::Walk => ContentFlags::ADD_WALK,
            Self::Wall => ContentFlags::REMOVE_WALK,
            Self::Fly => ContentFlags::ADD_FLY,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Rectangle {
    pub min: Vec3,
    pub max: Vec3,
    pub kind: RectangleKind,
}

#[derive(Debug, Deserialize)]
pub struct PlacedPatch {
    pub patch: NaviPatch,
    #[serde(default)]
    pub transform: Transform3,
    /// Take point heights from the mesh instead of the patch.
    #[serde(default)]
    pub proj_z: bool,
}

#[derive(Debug, Deserialize)]
pub struct Influence {
    pub position: Vec3,
    pub radius: f32,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct HeightLimits {
    pub min: i32,
    pub max: i32,
}

fn walk() -> PathFlags {
    PathFlags::WALK
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Query {
    Path {
        from: Vec3,
        to: Vec3,
        #[serde(default)]
        radius: f32,
        #[serde(default = "walk")]
        path_flags: PathFlags,
        #[serde(default)]
        generation_flags: PathGenerationFlags,
        #[serde(default)]
        incomplete_distance: f32,
    },
    Sweep {
        from: Vec3,
        to: Vec3,
        #[serde(default)]
        radius: f32,
        #[serde(default = "walk")]
        path_flags: PathFlags,
        /// Also sweep the height map, blocking outside these heights.
        height: Option<HeightLimits>,
    },
    Contains {
        position: Vec3,
        #[serde(default)]
        radius: f32,
        #[serde(default = "walk")]
        path_flags: PathFlags,
    },
    Area {
        bounds: Aabb,
    },
}
