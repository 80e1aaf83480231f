// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Region navigation mesh.
//!
//! A [`NaviMesh`] wraps a [`NaviCdt`] seeded with an outer quad. Authored
//! patches are queued with [`NaviMesh::stitch`] and applied in one batch by
//! [`NaviMesh::generate_mesh`], which then floods traversal flags over the
//! triangles (see `markup`).
//!
//! A mesh whose generation failed stays invalid and reports no traversable
//! space to queries.

mod influence;
mod markup;
mod query;

pub use influence::{NaviInfluence, INFLUENCE_LIMIT};

use navi_core::{Aabb, Transform3, Vec3};
use rustc_hash::FxHashMap;

use crate::cdt::{EdgeRequest, NaviCdt};
use crate::config::NaviConfig;
use crate::error::{NaviError, Result};
use crate::flags::{EdgeFlags, EdgePathingFlags};
use crate::keys::{EdgeKey, MeshId, PointKey};
use crate::patch::NaviPatch;
use crate::vertex_cache;

/// Edge of another mesh joined to one of ours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshConnection {
    pub mesh: MeshId,
    pub edge: EdgeKey,
}

/// A queued patch with its placement.
#[derive(Debug, Clone)]
struct PatchInstance {
    transform: Transform3,
    patch: NaviPatch,
}

#[derive(Debug)]
pub struct NaviMesh {
    id: MeshId,
    config: NaviConfig,
    bounds: Aabb,
    padding: f32,
    cdt: NaviCdt,
    exterior_seed_edge: Option<EdgeKey>,
    patches: Vec<PatchInstance>,
    patches_proj_z: Vec<PatchInstance>,
    connections: FxHashMap<EdgeKey, MeshConnection>,
    is_mesh_valid: bool,
    is_markup: bool,
}

impl NaviMesh {
    pub fn new(id: MeshId, config: NaviConfig) -> Self {
        Self {
            id,
            config,
            bounds: Aabb::default(),
            padding: 0.0,
            cdt: NaviCdt::new(),
            exterior_seed_edge: None,
            patches: Vec::new(),
            patches_proj_z: Vec::new(),
            connections: FxHashMap::default(),
            is_mesh_valid: false,
            is_markup: false,
        }
    }

    /// Reset the mesh over `bounds` and seed it with the outer quad.
    ///
    /// The vertex budget follows the configured per-cell density.
    pub fn initialize(&mut self, bounds: Aabb, padding: f32) -> Result<()> {
        self.release();
        self.config.validate()?;
        if !bounds.is_valid() {
            tracing::error!(?bounds, "navigation mesh bounds are invalid");
            return Err(NaviError::InvalidBounds);
        }
        // The outer quad must stay clear of the vertex cache merge box
        // around patch points on the bounds.
        if !padding.is_finite() || padding <= vertex_cache::EPSILON {
            tracing::error!(padding, "navigation mesh padding is too small");
            return Err(NaviError::InvalidBounds);
        }
        self.bounds = bounds;
        self.padding = padding;

        let budget = self.config.point_budget(bounds.width() * bounds.length());
        self.cdt.create(bounds.expanded_2d(padding), budget);
        self.add_super_quad();
        tracing::debug!(mesh = self.id.0, budget, "navigation mesh initialized");
        Ok(())
    }

    fn add_super_quad(&mut self) {
        let min = Vec3::new(self.bounds.min.x - self.padding, self.bounds.min.y - self.padding, 0.0);
        let max = Vec3::new(self.bounds.max.x + self.padding, self.bounds.max.y + self.padding, 0.0);

        let p0 = self.cdt.add_seed_point(Vec3::new(min.x, min.y, 0.0));
        let p1 = self.cdt.add_seed_point(Vec3::new(max.x, min.y, 0.0));
        let p2 = self.cdt.add_seed_point(Vec3::new(max.x, max.y, 0.0));
        let p3 = self.cdt.add_seed_point(Vec3::new(min.x, max.y, 0.0));

        let e0 = self.cdt.add_seed_edge(p0, p1, EdgeFlags::CONSTRAINT);
        let e1 = self.cdt.add_seed_edge(p1, p2, EdgeFlags::CONSTRAINT);
        let e2 = self.cdt.add_seed_edge(p2, p3, EdgeFlags::CONSTRAINT);
        let e3 = self.cdt.add_seed_edge(p3, p0, EdgeFlags::CONSTRAINT);
        let e02 = self.cdt.add_seed_edge(p0, p2, EdgeFlags::NONE);

        self.cdt.add_seed_triangle([e0, e1, e02]);
        self.cdt.add_seed_triangle([e2, e3, e02]);
        self.exterior_seed_edge = Some(e0);
    }

    /// Drop all geometry, queued patches and connections.
    ///
    /// Returns the meshes that still hold connections to this one; each of
    /// them should call [`NaviMesh::disconnect_mesh`] with our id.
    pub fn release(&mut self) -> Vec<MeshId> {
        self.is_mesh_valid = false;
        self.is_markup = false;
        self.patches.clear();
        self.patches_proj_z.clear();
        let peers = self.destroy_mesh_connections();
        self.exterior_seed_edge = None;
        self.cdt.release();
        peers
    }

    fn destroy_mesh_connections(&mut self) -> Vec<MeshId> {
        let mut peers: Vec<MeshId> = self.connections.values().map(|c| c.mesh).collect();
        peers.sort();
        peers.dedup();
        self.connections.clear();
        peers
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn id(&self) -> MeshId {
        self.id
    }

    pub fn config(&self) -> &NaviConfig {
        &self.config
    }

    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    pub fn cdt(&self) -> &NaviCdt {
        &self.cdt
    }

    pub(crate) fn cdt_mut(&mut self) -> &mut NaviCdt {
        &mut self.cdt
    }

    pub fn is_mesh_valid(&self) -> bool {
        self.is_mesh_valid
    }

    pub fn is_markup(&self) -> bool {
        self.is_markup
    }

    pub fn exterior_seed_edge(&self) -> Option<EdgeKey> {
        self.exterior_seed_edge
    }

    pub fn connections(&self) -> &FxHashMap<EdgeKey, MeshConnection> {
        &self.connections
    }

    // ========================================================================
    // Connections
    // ========================================================================

    /// Join `edge` of this mesh with `other_edge` of `other`, both ways.
    pub fn connect_edge(&mut self, edge: EdgeKey, other: &mut NaviMesh, other_edge: EdgeKey) {
        self.connections.insert(
            edge,
            MeshConnection {
                mesh: other.id,
                edge: other_edge,
            },
        );
        other.connections.insert(
            other_edge,
            MeshConnection {
                mesh: self.id,
                edge,
            },
        );
    }

    /// Forget every connection into `mesh`; returns how many were dropped.
    pub fn disconnect_mesh(&mut self, mesh: MeshId) -> usize {
        let before = self.connections.len();
        self.connections.retain(|_, c| c.mesh != mesh);
        before - self.connections.len()
    }

    fn merge_mesh_connections(&mut self) {
        tracing::trace!(
            mesh = self.id.0,
            connections = self.connections.len(),
            "cross mesh merging is not performed"
        );
    }

    // ========================================================================
    // Generation
    // ========================================================================

    /// Queue a patch for the next [`NaviMesh::generate_mesh`].
    pub fn stitch(&mut self, patch: NaviPatch, transform: Transform3) -> Result<()> {
        patch.validate()?;
        if !patch.is_empty() {
            self.patches.push(PatchInstance { transform, patch });
        }
        Ok(())
    }

    /// Queue a patch whose points take their height from the mesh.
    pub fn stitch_proj_z(&mut self, patch: NaviPatch, transform: Transform3) -> Result<()> {
        patch.validate()?;
        if !patch.is_empty() {
            self.patches_proj_z.push(PatchInstance { transform, patch });
        }
        Ok(())
    }

    /// Apply queued patches, mark up the triangles and validate the mesh.
    ///
    /// The first failure aborts generation and leaves the mesh invalid.
    pub fn generate_mesh(&mut self) -> Result<()> {
        self.is_mesh_valid = false;
        if self.exterior_seed_edge.is_none() {
            tracing::error!(mesh = self.id.0, "generate called on an uninitialized mesh");
            return Err(NaviError::MeshNotValid);
        }

        for (queue, proj_z) in [(std::mem::take(&mut self.patches), false), (std::mem::take(&mut self.patches_proj_z), true)] {
            for instance in &queue {
                if let Err(err) = self.modify_mesh(&instance.transform, &instance.patch, proj_z) {
                    tracing::error!(mesh = self.id.0, error = %err, "patch could not be applied");
                    return Err(err);
                }
            }
        }

        self.markup_mesh(false)?;

        if self.config.remove_collinear_edges {
            self.cdt.remove_collinear_edges()?;
            self.markup_mesh(false)?;
        }

        self.merge_mesh_connections();

        self.is_mesh_valid = true;
        tracing::debug!(
            mesh = self.id.0,
            points = self.cdt.points().len(),
            edges = self.cdt.edge_count(),
            triangles = self.cdt.triangle_count(),
            "navigation mesh generated"
        );
        Ok(())
    }

    /// Insert one patch into the triangulation right away.
    pub fn modify_mesh(&mut self, transform: &Transform3, patch: &NaviPatch, proj_z: bool) -> Result<()> {
        patch.validate()?;
        if patch.is_empty() {
            return Ok(());
        }

        let mut points: Vec<Option<PointKey>> = vec![None; patch.points.len()];
        for edge in &patch.edges {
            let p0 = self.patch_point(&mut points, transform, patch, edge.index0, proj_z)?;
            let p1 = self.patch_point(&mut points, transform, patch, edge.index1, proj_z)?;
            if p0 == p1 {
                continue;
            }
            self.cdt.add_edge(EdgeRequest::new(
                p0,
                p1,
                EdgeFlags::CONSTRAINT,
                EdgePathingFlags::new(edge.flags0, edge.flags1),
            ))?;
        }
        Ok(())
    }

    fn patch_point(
        &mut self,
        points: &mut [Option<PointKey>],
        transform: &Transform3,
        patch: &NaviPatch,
        index: usize,
        proj_z: bool,
    ) -> Result<PointKey> {
        if let Some(point) = points[index] {
            return Ok(point);
        }
        let pos = transform.transform_point(&patch.points[index]);
        let point = if proj_z {
            self.cdt.add_point_proj_z(pos, true)?
        } else {
            self.cdt.add_point(pos)?
        };
        points[index] = Some(point);
        Ok(point)
    }

    pub fn to_obj_string(&self, filter: crate::flags::PathFlags) -> String {
        self.cdt.to_obj_string(filter)
    }
}
