// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Navi Core
//!
//! Planar geometry primitives shared by the navigation mesh crates.
//!
//! Positions are stored as `nalgebra::Vector3<f32>`; most queries operate on
//! the (x, y) plane and ignore z. Predicates that decide mesh topology
//! (orientation, circumcircle containment, degeneracy) evaluate in `f64`.

pub mod aabb;
pub mod circle;
pub mod predicates;
pub mod segment;
pub mod transform;
pub mod vector;

// Re-export nalgebra types for convenience
pub use nalgebra::{Vector2, Vector3};

pub use aabb::Aabb;
pub use circle::{circle_tangent_2d, SweepHit, SweepSegmentFlags};
pub use segment::Segment;
pub use transform::Transform3;
pub use vector::Vec3Ext;

/// World-space position type used throughout the navigation crates.
pub type Vec3 = Vector3<f32>;
