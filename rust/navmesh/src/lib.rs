// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Navi Mesh
//!
//! Navigation meshes for game regions built on a constrained Delaunay
//! triangulation.
//!
//! ## Overview
//!
//! - **Build**: authored [`NaviPatch`]es are stitched into a [`NaviMesh`]
//!   and generated in one batch; markup then floods [`PathFlags`] over the
//!   triangles.
//! - **Query**: containment with clearance, projection onto the mesh and
//!   spawnable area.
//! - **Move**: clearance-aware path generation with funnel smoothing
//!   ([`NaviPath`]) and planar plus height-map sweeps ([`SweepOutcome`]).
//! - **Edit**: influence circles for dynamic obstacles, constraint edits
//!   after generation.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use navi_mesh::{ContentFlags, MeshId, NaviConfig, NaviMesh, NaviPatch, PathFlags};
//! use navi_core::{Aabb, Transform3, Vec3};
//!
//! let bounds = Aabb::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1000.0, 1000.0, 0.0));
//! let mut mesh = NaviMesh::new(MeshId(1), NaviConfig::from_env());
//! mesh.initialize(bounds, 100.0)?;
//! mesh.stitch(NaviPatch::rectangle(bounds.min, bounds.max, ContentFlags::ADD_WALK), Transform3::identity())?;
//! mesh.generate_mesh()?;
//!
//! let mut path = navi_mesh::NaviPath::default();
//! let result = path.generate_path(
//!     &mut mesh,
//!     &Vec3::new(10.0, 10.0, 0.0),
//!     &Vec3::new(900.0, 900.0, 0.0),
//!     20.0,
//!     PathFlags::WALK,
//!     Default::default(),
//!     0.0,
//! );
//! ```

pub mod cdt;
pub mod config;
pub mod error;
pub mod flags;
pub mod graph;
pub mod heightmap;
pub mod keys;
pub mod mesh;
pub mod patch;
pub mod path;
pub mod sweep;
pub mod vertex_cache;

pub use cdt::{EdgeRequest, NaviCdt};
pub use config::NaviConfig;
pub use error::{NaviError, Result};
pub use flags::{
    ContentFlags, DefaultPathFlagsCheck, EdgeFlags, PathFlags, PathFlagsCheck, PathGenerationFlags, PointFlags,
    TriangleFlags,
};
pub use graph::{NaviEdge, NaviTriangle, TriangleState};
pub use heightmap::{HeightField, HeightMapCell, HeightMapSource, NO_HEIGHT_DATA};
pub use keys::{EdgeKey, MeshId, PointKey, TriangleKey};
pub use mesh::{MeshConnection, NaviInfluence, NaviMesh};
pub use patch::{NaviPatch, PatchEdge};
pub use path::{
    NaviPath, NaviPathGenerator, NaviPathNode, NaviPathResult, NaviSide, PathCache, PathMethod, PathNodeSet,
    PathProgress, Waypoint,
};
pub use sweep::{HeightSweep, HeightSweepType, SweepOutcome, SweepResult, DEFAULT_SWEEP_PADDING};
pub use vertex_cache::NaviPoint;
