// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Arena key types.
//!
//! Points, edges and triangles live in `slotmap::SlotMap`s owned by the
//! triangulation. Adjacency is stored as keys; a removed element leaves a
//! stale key that resolves to `None` instead of dangling.

use slotmap::new_key_type;

new_key_type! {
    /// Key for a mesh vertex.
    pub struct PointKey;

    /// Key for an edge between two points.
    pub struct EdgeKey;

    /// Key for a triangle bounded by three edges.
    pub struct TriangleKey;
}

/// Identifier of a navigation mesh, used by cross-mesh edge connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(pub u32);
