// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wavefront OBJ dump of the triangulation.

use std::fmt::Write;

use rustc_hash::FxHashMap;

use super::NaviCdt;
use crate::flags::PathFlags;
use crate::keys::PointKey;

impl NaviCdt {
    /// Triangles carrying all of `filter` as OBJ text.
    ///
    /// Vertices are written as `v y x z` to match the viewer convention of
    /// the authoring tools, with face winding reversed to compensate.
    pub fn to_obj_string(&self, filter: PathFlags) -> String {
        let mut out = String::new();
        let mut indices: FxHashMap<PointKey, usize> = FxHashMap::default();
        let mut faces = Vec::new();

        for (key, triangle) in self.triangles.iter() {
            if !triangle.path_flags.contains(filter) {
                continue;
            }
            let points = self.triangle_points(key);
            let mut face = [0usize; 3];
            for (slot, point) in face.iter_mut().zip(points) {
                let next = indices.len() + 1;
                *slot = *indices.entry(point).or_insert_with(|| {
                    let p = self.pos(point);
                    let _ = writeln!(out, "v {} {} {}", p.y, p.x, p.z);
                    next
                });
            }
            faces.push(face);
        }

        for [a, b, c] in faces {
            let _ = writeln!(out, "f {c} {b} {a}");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::square_cdt;
    use super::*;

    #[test]
    fn test_obj_export() {
        let mut cdt = square_cdt(10.0);
        let obj = cdt.to_obj_string(PathFlags::NONE);
        assert_eq!(obj.lines().filter(|l| l.starts_with("v ")).count(), 4);
        assert_eq!(obj.lines().filter(|l| l.starts_with("f ")).count(), 2);
        assert!(obj.contains("v 0 10 0"));

        let first = cdt.triangles().keys().next().unwrap();
        cdt.triangles_mut()[first].path_flags = PathFlags::WALK;
        let walk = cdt.to_obj_string(PathFlags::WALK);
        assert_eq!(walk.lines().filter(|l| l.starts_with("f ")).count(), 1);
        assert_eq!(walk.lines().filter(|l| l.starts_with("v ")).count(), 3);
    }
}
