// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for mesh construction and mutation.

use navi_core::Vec3;

use crate::keys::{EdgeKey, PointKey};

/// Result type alias for navigation mesh operations.
pub type Result<T> = std::result::Result<T, NaviError>;

/// Errors raised while building or editing a navigation mesh.
#[derive(Debug, thiserror::Error)]
pub enum NaviError {
    /// Mesh bounds are empty or inverted, or the padding around them is
    /// too small.
    #[error("invalid mesh bounds or padding")]
    InvalidBounds,

    /// Point location found no triangle at the position.
    #[error("no triangle at point ({}, {}, {}), likely out of bounds", .0.x, .0.y, .0.z)]
    PointOutsideMesh(Vec3),

    /// A split would cut through a door edge.
    #[error("door edge {0:?} cannot be split")]
    DoorEdgeSplit(EdgeKey),

    /// Door edges are never removed from the triangulation.
    #[error("door edge {0:?} cannot be removed")]
    DoorEdgeRemoval(EdgeKey),

    /// Point location walked past its iteration cap.
    #[error("point location exceeded {0} steps")]
    LocateIterationCap(usize),

    /// The constraint insertion work-list is full.
    #[error("edge insertion queue exceeded {0} entries")]
    EdgeQueueOverflow(usize),

    /// A constraint could not be threaded through the triangulation.
    #[error("constraint edge {0:?} -> {1:?} could not be inserted")]
    EdgeNotInserted(PointKey, PointKey),

    /// The mesh has not been generated or its last generation failed.
    #[error("navigation mesh is not valid")]
    MeshNotValid,

    /// A patch references points that do not exist.
    #[error("invalid patch: {0}")]
    InvalidPatch(String),

    /// A point already carries the maximum number of influences.
    #[error("influence count limit reached for point {0:?}")]
    InfluenceLimit(PointKey),

    /// The influence point could not be inserted without splitting a
    /// constraint.
    #[error("influence rejected at ({}, {})", .0.x, .0.y)]
    InfluenceRejected(Vec3),

    /// Height samples do not match the declared grid.
    #[error("invalid height map: {0}")]
    InvalidHeightMap(String),

    /// A point key does not resolve in the vertex cache.
    #[error("unknown point {0:?}")]
    UnknownPoint(PointKey),

    /// Configuration values are inconsistent.
    #[error("configuration error: {0}")]
    Config(String),
}
