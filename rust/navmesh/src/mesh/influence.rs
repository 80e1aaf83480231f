// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Dynamic obstacles.
//!
//! An obstacle occupies one mesh point. Points are shared between
//! obstacles through a reference count and only leave the triangulation
//! when the last obstacle is removed. Obstacles landing on a constraint
//! vertex are not recorded: walls already block there.

use navi_core::{Vec3, Vec3Ext};

use crate::error::{NaviError, Result};
use crate::keys::{PointKey, TriangleKey};
use crate::vertex_cache::MERGE_DISTANCE_SQ;

use super::NaviMesh;

/// Obstacles one point can hold.
pub const INFLUENCE_LIMIT: i8 = i8::MAX;

/// Handle to an obstacle registered on a mesh.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NaviInfluence {
    pub point: Option<PointKey>,
    /// Last triangle known to touch `point`.
    pub triangle: Option<TriangleKey>,
}

impl NaviInfluence {
    pub fn is_active(&self) -> bool {
        self.point.is_some()
    }
}

impl NaviMesh {
    /// Register an obstacle of `radius` at `position`.
    ///
    /// Succeeds without recording anything when the position snaps onto a
    /// constraint vertex.
    pub fn add_influence(&mut self, position: &Vec3, radius: f32, influence: &mut NaviInfluence) -> Result<()> {
        if !self.is_mesh_valid {
            return Err(NaviError::MeshNotValid);
        }
        if influence.is_active() {
            return self.update_influence(position, radius, influence);
        }

        let point = match self.cdt.add_point_proj_z(*position, false) {
            Ok(point) => point,
            Err(err) => {
                tracing::warn!(x = position.x, y = position.y, error = %err, "influence point rejected");
                return Err(err);
            }
        };
        let Some(triangle) = self.cdt.find_triangle_containing_vertex(point) else {
            return Err(NaviError::UnknownPoint(point));
        };
        if self.cdt.is_point_constraint(point, triangle) {
            return Ok(());
        }

        let Some(p) = self.cdt.point_mut(point) else {
            return Err(NaviError::UnknownPoint(point));
        };
        if p.influence_ref >= INFLUENCE_LIMIT {
            tracing::warn!(?point, "influence ceiling reached");
            return Err(NaviError::InfluenceLimit(point));
        }
        p.influence_ref += 1;
        p.influence_radius = if p.influence_ref == 1 {
            radius
        } else {
            p.influence_radius.max(radius)
        };

        influence.point = Some(point);
        influence.triangle = Some(triangle);
        Ok(())
    }

    /// Move or resize a registered obstacle.
    ///
    /// A sole owner moving a short way nudges its point in place; anything
    /// else is a removal followed by a fresh insertion.
    pub fn update_influence(&mut self, position: &Vec3, radius: f32, influence: &mut NaviInfluence) -> Result<()> {
        let Some(point) = influence.point else {
            return self.add_influence(position, radius, influence);
        };
        let Some((current_pos, refs)) = self.cdt.point(point).map(|p| (p.pos, p.influence_ref)) else {
            *influence = NaviInfluence::default();
            return self.add_influence(position, radius, influence);
        };

        if current_pos.distance_sq_2d(position) <= MERGE_DISTANCE_SQ {
            if refs == 1 {
                if let Some(p) = self.cdt.point_mut(point) {
                    p.influence_radius = radius;
                }
            }
            return Ok(());
        }

        if refs == 1 && self.cdt.find_cached_point_at_point(position).is_none() {
            let triangle = influence
                .triangle
                .filter(|&t| self.cdt.triangle(t).is_some_and(|tri| tri.contains_point(self.cdt.edges(), point)))
                .or_else(|| self.cdt.find_triangle_containing_vertex(point));
            if let Some(triangle) = triangle {
                if self.cdt.attempt_cheap_vertex_position_update(triangle, point, *position) {
                    if let Some(p) = self.cdt.point_mut(point) {
                        p.influence_radius = radius;
                    }
                    influence.triangle = Some(triangle);
                    return Ok(());
                }
            }
        }

        self.remove_influence(influence)?;
        self.add_influence(position, radius, influence)
    }

    /// Drop one reference from the obstacle's point, removing the point
    /// from the triangulation with the last one.
    pub fn remove_influence(&mut self, influence: &mut NaviInfluence) -> Result<()> {
        let Some(point) = influence.point.take() else {
            return Ok(());
        };
        let hint = influence.triangle.take();
        let Some(p) = self.cdt.point_mut(point) else {
            return Ok(());
        };
        p.influence_ref = (p.influence_ref - 1).max(0);
        if p.influence_ref > 0 {
            return Ok(());
        }
        p.influence_radius = 0.0;

        let triangle = hint
            .filter(|&t| self.cdt.triangle(t).is_some_and(|tri| tri.contains_point(self.cdt.edges(), point)))
            .or_else(|| self.cdt.find_triangle_containing_vertex(point));
        if let Some(triangle) = triangle {
            if !self.cdt.is_point_constraint(point, triangle) && self.cdt.remove_point(point, triangle) {
                self.cdt.forget_point(point);
            }
        }
        Ok(())
    }
}
