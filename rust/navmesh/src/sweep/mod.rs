// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Movement resolution against the mesh and the terrain.
//!
//! A sweep moves a circle (or a point when the radius is zero) from one
//! position toward another. The planar phase walks the triangles the
//! circle passes over and stops at the first blocking edge or corner. When
//! a [`HeightSweep`] is supplied, the travel that survived the planar phase
//! is swept again over the height map and may stop earlier.

mod height;
mod planar;

use navi_core::Vec3;
use serde::{Deserialize, Serialize};

use crate::flags::PathFlags;
use crate::heightmap::HeightMapSource;
use crate::mesh::NaviMesh;

/// Distance a clipped sweep backs away from the contact.
pub const DEFAULT_SWEEP_PADDING: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum SweepResult {
    /// Reached the destination.
    Success = 0,
    /// Stopped against the mesh.
    Clipped = 1,
    /// Stopped against terrain outside the height range.
    HeightMap = 2,
    Failed = 3,
}

/// Whether a sweep also runs over the height map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HeightSweepType {
    #[default]
    None,
    Constraint,
}

/// Height phase of a sweep: terrain outside `[min_height, max_height]`
/// blocks.
#[derive(Clone, Copy)]
pub struct HeightSweep<'h> {
    pub kind: HeightSweepType,
    pub source: &'h dyn HeightMapSource,
    pub min_height: i32,
    pub max_height: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepOutcome {
    pub result: SweepResult,
    /// Where the mover ends up.
    pub position: Vec3,
    /// Contact normal facing the mover, set when the sweep stopped early.
    pub normal: Option<Vec3>,
}

impl SweepOutcome {
    pub(crate) fn failed(position: Vec3) -> Self {
        Self {
            result: SweepResult::Failed,
            position,
            normal: None,
        }
    }

    pub(crate) fn success(position: Vec3) -> Self {
        Self {
            result: SweepResult::Success,
            position,
            normal: None,
        }
    }
}

impl NaviMesh {
    /// Planar sweep from `from` toward `to` with the default padding.
    pub fn sweep(&mut self, from: &Vec3, to: &Vec3, radius: f32, path_flags: PathFlags) -> SweepOutcome {
        self.do_sweep(from, to, radius, path_flags, DEFAULT_SWEEP_PADDING, None)
    }

    /// Planar sweep followed, when `height` asks for it, by a height sweep
    /// over the travel the planar phase allowed.
    pub fn do_sweep(
        &mut self,
        from: &Vec3,
        to: &Vec3,
        radius: f32,
        path_flags: PathFlags,
        padding: f32,
        height: Option<&HeightSweep<'_>>,
    ) -> SweepOutcome {
        let planar = self.planar_sweep(from, to, radius, path_flags, padding);
        if planar.result == SweepResult::Failed {
            return planar;
        }
        let Some(height) = height.filter(|h| h.kind != HeightSweepType::None) else {
            return planar;
        };

        let range = height::HeightRange {
            min: height.min_height,
            max: height.max_height,
        };
        match height::sweep_height(height.source, range, from, &planar.position, radius) {
            Some(contact) => {
                tracing::trace!(x = contact.position.x, y = contact.position.y, "sweep stopped by height map");
                SweepOutcome {
                    result: SweepResult::HeightMap,
                    position: contact.position,
                    normal: Some(contact.normal),
                }
            }
            None => planar,
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use navi_core::Aabb;

    use super::*;
    use crate::heightmap::{HeightField, HeightMapCell};
    use crate::mesh::tests::{floor_mesh, walled_mesh};

    fn v(x: f32, y: f32) -> Vec3 {
        Vec3::new(x, y, 0.0)
    }

    fn ridge_field() -> HeightField {
        let bounds = Aabb::new(v(0.0, 0.0), v(1000.0, 1000.0));
        let mut cell = HeightMapCell::flat(bounds, 100, 100, 0).unwrap();
        for y in 0..100 {
            cell.set_sample(60, y, 500);
        }
        HeightField::new(vec![cell])
    }

    #[test]
    fn test_height_phase_skipped_without_kind() {
        let mut mesh = floor_mesh();
        mesh.generate_mesh().unwrap();
        let field = ridge_field();
        let height = HeightSweep {
            kind: HeightSweepType::None,
            source: &field,
            min_height: -100,
            max_height: 100,
        };
        let out = mesh.do_sweep(&v(100.0, 500.0), &v(900.0, 500.0), 0.0, PathFlags::WALK, 0.0, Some(&height));
        assert_eq!(out.result, SweepResult::Success);
    }

    #[test]
    fn test_height_phase_stops_at_ridge() {
        let mut mesh = floor_mesh();
        mesh.generate_mesh().unwrap();
        let field = ridge_field();
        let height = HeightSweep {
            kind: HeightSweepType::Constraint,
            source: &field,
            min_height: -100,
            max_height: 100,
        };
        let out = mesh.do_sweep(&v(100.0, 505.0), &v(900.0, 505.0), 0.0, PathFlags::WALK, 0.0, Some(&height));
        assert_eq!(out.result, SweepResult::HeightMap);
        assert_relative_eq!(out.position.x, 600.0, epsilon = 1e-2);
        assert_relative_eq!(out.normal.unwrap().x, -1.0);

        let out = mesh.do_sweep(&v(100.0, 505.0), &v(900.0, 505.0), 20.0, PathFlags::WALK, 0.0, Some(&height));
        assert_eq!(out.result, SweepResult::HeightMap);
        assert_relative_eq!(out.position.x, 580.0, epsilon = 1e-2);
    }

    #[test]
    fn test_planar_clip_wins_before_height() {
        let mut mesh = walled_mesh(v(400.0, 200.0), v(500.0, 800.0));
        let field = ridge_field();
        let height = HeightSweep {
            kind: HeightSweepType::Constraint,
            source: &field,
            min_height: -100,
            max_height: 100,
        };
        let out = mesh.do_sweep(&v(100.0, 505.0), &v(900.0, 505.0), 0.0, PathFlags::WALK, 0.0, Some(&height));
        assert_eq!(out.result, SweepResult::Clipped);
        assert_relative_eq!(out.position.x, 400.0, epsilon = 1e-2);
    }
}
