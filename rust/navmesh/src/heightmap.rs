// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Terrain height samples consulted by the height sweep.
//!
//! A region is covered by cells, each carrying a regular grid of `i16`
//! height samples. Sample heights are relative to the rounded z of the cell
//! center; [`NO_HEIGHT_DATA`] marks a sample without terrain.

use navi_core::{Aabb, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{NaviError, Result};

/// Sample value for a hole in the terrain.
pub const NO_HEIGHT_DATA: i16 = i16::MIN;

/// One cell's height grid, row major from the cell's minimum corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeightMapCell {
    bounds: Aabb,
    size_x: u32,
    size_y: u32,
    data: Vec<i16>,
}

impl HeightMapCell {
    pub fn new(bounds: Aabb, size_x: u32, size_y: u32, data: Vec<i16>) -> Result<Self> {
        if !bounds.is_valid() || bounds.area_2d() <= 0.0 {
            return Err(NaviError::InvalidHeightMap("cell bounds are empty".into()));
        }
        if size_x == 0 || size_y == 0 {
            return Err(NaviError::InvalidHeightMap("grid has no samples".into()));
        }
        let expected = size_x as usize * size_y as usize;
        if data.len() != expected {
            return Err(NaviError::InvalidHeightMap(format!(
                "expected {expected} samples, got {}",
                data.len()
            )));
        }
        Ok(Self {
            bounds,
            size_x,
            size_y,
            data,
        })
    }

    /// Grid where every sample holds `height`.
    pub fn flat(bounds: Aabb, size_x: u32, size_y: u32, height: i16) -> Result<Self> {
        Self::new(bounds, size_x, size_y, vec![height; size_x as usize * size_y as usize])
    }

    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    pub fn size(&self) -> (i32, i32) {
        (self.size_x as i32, self.size_y as i32)
    }

    pub fn sample_width(&self) -> f32 {
        self.bounds.width() / self.size_x as f32
    }

    pub fn sample_length(&self) -> f32 {
        self.bounds.length() / self.size_y as f32
    }

    pub fn set_sample(&mut self, x: i32, y: i32, value: i16) {
        if let Some(index) = self.index(x, y) {
            self.data[index] = value;
        }
    }

    #[inline]
    pub fn contains_sample(&self, x: i32, y: i32) -> bool {
        self.index(x, y).is_some()
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let (sx, sy) = self.size();
        if x < 0 || y < 0 || x >= sx || y >= sy {
            return None;
        }
        Some(y as usize * self.size_x as usize + x as usize)
    }

    /// Grid coordinates of `pos`. May fall outside the grid.
    pub fn sample_at(&self, pos: &Vec3) -> (i32, i32) {
        (
            ((pos.x - self.bounds.min.x) / self.sample_width()).floor() as i32,
            ((pos.y - self.bounds.min.y) / self.sample_length()).floor() as i32,
        )
    }

    /// [`Self::sample_at`] clamped onto the grid.
    pub fn clamped_sample_at(&self, pos: &Vec3) -> (i32, i32) {
        let (x, y) = self.sample_at(pos);
        let (sx, sy) = self.size();
        (x.clamp(0, sx - 1), y.clamp(0, sy - 1))
    }

    /// World height of a sample, `None` outside the grid or on a hole.
    pub fn height(&self, x: i32, y: i32) -> Option<i32> {
        let raw = self.data[self.index(x, y)?];
        if raw == NO_HEIGHT_DATA {
            return None;
        }
        Some(raw as i32 + self.bounds.center().z.round() as i32)
    }

    /// Planar square covered by sample `(x, y)`.
    pub fn sample_bounds(&self, x: i32, y: i32) -> Aabb {
        let (w, l) = (self.sample_width(), self.sample_length());
        let min = Vec3::new(self.bounds.min.x + x as f32 * w, self.bounds.min.y + y as f32 * l, 0.0);
        Aabb::new(min, min + Vec3::new(w, l, 0.0))
    }

    pub fn sample_center(&self, x: i32, y: i32) -> Vec3 {
        self.sample_bounds(x, y).center()
    }
}

/// Where the height sweep finds terrain cells.
pub trait HeightMapSource {
    /// Cells whose bounds overlap `volume` in the plane.
    fn cells_in_volume(&self, volume: &Aabb) -> Vec<&HeightMapCell>;

    /// Cell covering `pos`.
    fn cell_at(&self, pos: &Vec3) -> Option<&HeightMapCell>;
}

/// Plain list of cells held in memory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeightField {
    cells: Vec<HeightMapCell>,
}

impl HeightField {
    pub fn new(cells: Vec<HeightMapCell>) -> Self {
        Self { cells }
    }

    pub fn push(&mut self, cell: HeightMapCell) {
        self.cells.push(cell);
    }

    pub fn cells(&self) -> &[HeightMapCell] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [HeightMapCell] {
        &mut self.cells
    }
}

impl HeightMapSource for HeightField {
    fn cells_in_volume(&self, volume: &Aabb) -> Vec<&HeightMapCell> {
        self.cells.iter().filter(|c| c.bounds.intersects_2d(volume)).collect()
    }

    fn cell_at(&self, pos: &Vec3) -> Option<&HeightMapCell> {
        self.cells.iter().find(|c| c.bounds.contains_point_2d(pos))
    }
}

/// Height of sample `(x, y)` of `cell`, following the grid into whichever
/// neighbor cell covers it. Terrain outside every cell sits at zero.
pub(crate) fn height_near(source: &dyn HeightMapSource, cell: &HeightMapCell, x: i32, y: i32) -> Option<i32> {
    if cell.contains_sample(x, y) {
        return cell.height(x, y);
    }
    let center = cell.sample_center(x, y);
    match source.cell_at(&center) {
        Some(other) => {
            let (ox, oy) = other.sample_at(&center);
            if other.contains_sample(ox, oy) {
                other.height(ox, oy)
            } else {
                Some(0)
            }
        }
        None => Some(0),
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn cell_at_origin(z: f32) -> HeightMapCell {
        let bounds = Aabb::new(Vec3::new(0.0, 0.0, z), Vec3::new(100.0, 100.0, z));
        HeightMapCell::flat(bounds, 10, 10, 0).unwrap()
    }

    #[test]
    fn test_rejects_mismatched_data() {
        let bounds = Aabb::new(Vec3::zeros(), Vec3::new(10.0, 10.0, 0.0));
        assert!(matches!(
            HeightMapCell::new(bounds, 4, 4, vec![0; 15]),
            Err(NaviError::InvalidHeightMap(_))
        ));
        assert!(HeightMapCell::new(bounds, 0, 4, Vec::new()).is_err());
    }

    #[test]
    fn test_sample_lookup() {
        let mut cell = cell_at_origin(0.0);
        assert_relative_eq!(cell.sample_width(), 10.0);
        assert_eq!(cell.sample_at(&Vec3::new(25.0, 99.0, 0.0)), (2, 9));
        assert_eq!(cell.clamped_sample_at(&Vec3::new(100.0, -3.0, 0.0)), (9, 0));

        cell.set_sample(2, 9, 40);
        assert_eq!(cell.height(2, 9), Some(40));
        cell.set_sample(3, 3, NO_HEIGHT_DATA);
        assert_eq!(cell.height(3, 3), None);
        assert_eq!(cell.height(10, 0), None);

        let square = cell.sample_bounds(2, 9);
        assert_relative_eq!(square.min.x, 20.0);
        assert_relative_eq!(square.max.y, 100.0);
    }

    #[test]
    fn test_heights_offset_by_cell_center() {
        let cell = cell_at_origin(12.4);
        assert_eq!(cell.height(0, 0), Some(12));
    }

    #[test]
    fn test_field_queries() {
        let mut field = HeightField::default();
        field.push(cell_at_origin(0.0));
        let right = Aabb::new(Vec3::new(100.0, 0.0, 0.0), Vec3::new(200.0, 100.0, 0.0));
        field.push(HeightMapCell::flat(right, 10, 10, 7).unwrap());

        let volume = Aabb::new(Vec3::new(90.0, 10.0, 0.0), Vec3::new(120.0, 20.0, 0.0));
        assert_eq!(field.cells_in_volume(&volume).len(), 2);
        assert!(field.cell_at(&Vec3::new(150.0, 50.0, 0.0)).is_some());
        assert!(field.cell_at(&Vec3::new(250.0, 50.0, 0.0)).is_none());

        // Sample 10 of the left cell lies in the right cell.
        let left = &field.cells()[0];
        assert_eq!(height_near(&field, left, 10, 0), Some(7));
        assert_eq!(height_near(&field, left, -1, 0), Some(0));
    }
}
