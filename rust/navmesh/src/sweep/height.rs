// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sweeps over height-map grids.
//!
//! A point walks the samples its line crosses in order and stops at the
//! first blocking one. A circle rasterizes its swept width into a set of
//! blocking samples, then sweeps against each sample square (and against
//! the diagonal of stair-step corners) for the earliest contact.

use navi_core::circle::{sweep_circle_aabb_2d, sweep_segment_2d};
use navi_core::segment::EPSILON;
use navi_core::{Aabb, SweepSegmentFlags, Vec3, Vec3Ext};
use rustc_hash::FxHashMap;

use crate::heightmap::{height_near, HeightMapCell, HeightMapSource};

/// Accepted terrain heights.
#[derive(Debug, Clone, Copy)]
pub(crate) struct HeightRange {
    pub min: i32,
    pub max: i32,
}

impl HeightRange {
    /// Holes only block when the range has a real floor.
    fn blocks(&self, height: Option<i32>) -> bool {
        match height {
            Some(h) => h < self.min || h > self.max,
            None => self.min > i16::MIN as i32,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct HeightContact {
    pub position: Vec3,
    pub normal: Vec3,
}

/// Earliest blocking contact from `start` to `end`, if any.
pub(crate) fn sweep_height(
    source: &dyn HeightMapSource,
    range: HeightRange,
    start: &Vec3,
    end: &Vec3,
    radius: f32,
) -> Option<HeightContact> {
    if (end - start).length_sq_2d() <= EPSILON * EPSILON {
        return None;
    }
    if radius > 0.0 {
        sweep_circle(source, range, start, end, radius)
    } else {
        sweep_line(range, source, start, end)
    }
}

/// One visited sample of a grid walk.
#[derive(Debug, Clone, Copy)]
struct GridStep {
    x: i32,
    y: i32,
    /// Planar distance from the walk origin to where the sample is entered.
    distance: f32,
    /// Normal of the sample face crossed on entry.
    normal: Vec3,
}

/// Parametric range of `origin + delta * t` inside `bounds`, within `[0, 1]`.
fn clip_to_box(origin: &Vec3, delta: &Vec3, bounds: &Aabb) -> Option<(f32, f32)> {
    let mut t0 = 0.0f32;
    let mut t1 = 1.0f32;
    for (o, d, lo, hi) in [
        (origin.x, delta.x, bounds.min.x, bounds.max.x),
        (origin.y, delta.y, bounds.min.y, bounds.max.y),
    ] {
        if d.abs() <= f32::EPSILON {
            if o < lo || o > hi {
                return None;
            }
            continue;
        }
        let (mut a, mut b) = ((lo - o) / d, (hi - o) / d);
        if a > b {
            std::mem::swap(&mut a, &mut b);
        }
        t0 = t0.max(a);
        t1 = t1.min(b);
        if t0 > t1 {
            return None;
        }
    }
    Some((t0, t1))
}

/// Visit the samples of `cell` crossed by `a -> b`, in travel order, until
/// `visit` returns true. Returns whether it did.
fn walk_samples(cell: &HeightMapCell, a: &Vec3, b: &Vec3, mut visit: impl FnMut(GridStep) -> bool) -> bool {
    let delta = (b - a).to_2d();
    let Some((t0, t1)) = clip_to_box(a, &delta, cell.bounds()) else {
        return false;
    };
    let length = delta.length_2d();
    let dir = delta.safe_normalize_2d();
    let from = a + delta * t0;
    let reach = (t1 - t0) * length;

    let (x, y) = cell.clamped_sample_at(&from);
    let (end_x, end_y) = cell.clamped_sample_at(&(a + delta * t1));
    let step_x = sign(dir.x);
    let step_y = sign(dir.y);
    let (w, l) = (cell.sample_width(), cell.sample_length());
    let bounds = cell.bounds();

    let boundary = |index: i32, step: i32, min: f32, size: f32, origin: f32, d: f32| {
        if step == 0 {
            return f32::INFINITY;
        }
        let edge = min + (index + (step > 0) as i32) as f32 * size;
        (edge - origin) / d
    };
    let mut t_max_x = boundary(x, step_x, bounds.min.x, w, from.x, dir.x);
    let mut t_max_y = boundary(y, step_y, bounds.min.y, l, from.y, dir.y);
    let t_delta_x = if step_x != 0 { w / dir.x.abs() } else { f32::INFINITY };
    let t_delta_y = if step_y != 0 { l / dir.y.abs() } else { f32::INFINITY };

    let entry_normal = if dir.x.abs() >= dir.y.abs() {
        Vec3::new(-step_x as f32, 0.0, 0.0)
    } else {
        Vec3::new(0.0, -step_y as f32, 0.0)
    };
    let mut step = GridStep {
        x,
        y,
        distance: t0 * length,
        normal: entry_normal,
    };
    let (size_x, size_y) = cell.size();
    for _ in 0..(size_x + size_y + 2) {
        if visit(step) {
            return true;
        }
        if step.x == end_x && step.y == end_y {
            break;
        }
        if t_max_x < t_max_y {
            if t_max_x > reach {
                break;
            }
            step.x += step_x;
            step.distance = t0 * length + t_max_x;
            step.normal = Vec3::new(-step_x as f32, 0.0, 0.0);
            t_max_x += t_delta_x;
        } else {
            if t_max_y > reach {
                break;
            }
            step.y += step_y;
            step.distance = t0 * length + t_max_y;
            step.normal = Vec3::new(0.0, -step_y as f32, 0.0);
            t_max_y += t_delta_y;
        }
        if !cell.contains_sample(step.x, step.y) {
            break;
        }
    }
    false
}

#[inline]
fn sign(v: f32) -> i32 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

fn sweep_line(range: HeightRange, source: &dyn HeightMapSource, start: &Vec3, end: &Vec3) -> Option<HeightContact> {
    let travel = end - start;
    let planar = travel.to_2d();
    let length = planar.length_2d();
    let volume = Aabb::new(*start, *end);

    let mut cells: Vec<(f32, &HeightMapCell)> = source
        .cells_in_volume(&volume)
        .into_iter()
        .filter_map(|cell| clip_to_box(start, &planar, cell.bounds()).map(|(t0, _)| (t0, cell)))
        .collect();
    cells.sort_by(|a, b| a.0.total_cmp(&b.0));

    for (_, cell) in cells {
        let mut hit: Option<GridStep> = None;
        walk_samples(cell, start, end, |step| {
            if range.blocks(cell.height(step.x, step.y)) {
                hit = Some(step);
                return true;
            }
            false
        });
        if let Some(step) = hit {
            return Some(HeightContact {
                position: start + travel * (step.distance / length),
                normal: step.normal,
            });
        }
    }
    None
}

/// Blocking sample collected by the circle sweep.
#[derive(Debug, Clone, Copy)]
struct HitSquare {
    bounds: Aabb,
    /// Both neighbors facing the mover also block, so the corner between
    /// them is smoothed by a diagonal.
    diagonal: Option<(Vec3, Vec3)>,
}

fn sweep_circle(
    source: &dyn HeightMapSource,
    range: HeightRange,
    start: &Vec3,
    end: &Vec3,
    radius: f32,
) -> Option<HeightContact> {
    let travel = end - start;
    let velocity = travel.to_2d();
    let length = velocity.length_2d();
    let dir = velocity / length;
    let perp = dir.perp_2d();
    let volume = Aabb::new(*start, *end).expanded_2d(radius);

    let cells: Vec<&HeightMapCell> = source
        .cells_in_volume(&volume)
        .into_iter()
        .filter(|c| {
            c.bounds().contains_point_2d(start)
                || c.bounds().contains_point_2d(end)
                || sweep_circle_aabb_2d(start, radius, &velocity, c.bounds()).is_some()
        })
        .collect();

    let (sx, sy) = (sign(velocity.x), sign(velocity.y));
    let mut hits: FxHashMap<(usize, i32, i32), HitSquare> = FxHashMap::default();
    let reach = length + radius;
    for (index, cell) in cells.iter().enumerate() {
        let spacing = cell.sample_width().min(cell.sample_length()).max(EPSILON);
        let mut distance = 0.0f32;
        loop {
            let center = start + dir * distance;
            let a = center - perp * radius;
            let b = center + perp * radius;
            walk_samples(cell, &a, &b, |step| {
                let (x, y) = (step.x, step.y);
                if hits.contains_key(&(index, x, y)) || !range.blocks(cell.height(x, y)) {
                    return false;
                }
                let stair = sx != 0
                    && sy != 0
                    && range.blocks(height_near(source, cell, x - sx, y))
                    && range.blocks(height_near(source, cell, x, y - sy));
                let diagonal = stair.then(|| stair_diagonal(cell, x - sx, y - sy, sx, sy));
                hits.insert(
                    (index, x, y),
                    HitSquare {
                        bounds: cell.sample_bounds(x, y),
                        diagonal,
                    },
                );
                false
            });
            if distance >= reach {
                break;
            }
            distance = (distance + spacing).min(reach);
        }
    }

    let mut best: Option<(f32, Vec3)> = None;
    let mut consider = |time: f32, normal: Vec3| {
        if best.map_or(true, |(t, _)| time < t) {
            best = Some((time, normal));
        }
    };
    for square in hits.values() {
        if let Some(hit) = sweep_circle_aabb_2d(start, radius, &velocity, &square.bounds) {
            if hit.time <= 1.0 && dir.dot_2d(&hit.normal) < 0.0 {
                consider(hit.time, hit.normal);
            }
        }
        if let Some((p, q)) = square.diagonal {
            if let Some(d) = sweep_segment_2d(&p, &q, start, radius, &dir, length, SweepSegmentFlags::IgnoreBackfacing) {
                let normal = Vec3::new(-sx as f32, -sy as f32, 0.0).normalize_2d();
                consider(d / length, normal);
            }
        }
    }

    best.map(|(time, normal)| HeightContact {
        position: start + travel * time,
        normal,
    })
}

/// Diagonal across the notch sample `(x, y)` joining the corners it shares
/// with its two blocking neighbors.
fn stair_diagonal(cell: &HeightMapCell, x: i32, y: i32, sx: i32, sy: i32) -> (Vec3, Vec3) {
    let notch = cell.sample_bounds(x, y);
    let (near_x, far_x) = if sx > 0 { (notch.min.x, notch.max.x) } else { (notch.max.x, notch.min.x) };
    let (near_y, far_y) = if sy > 0 { (notch.min.y, notch.max.y) } else { (notch.max.y, notch.min.y) };
    (Vec3::new(near_x, far_y, 0.0), Vec3::new(far_x, near_y, 0.0))
}
