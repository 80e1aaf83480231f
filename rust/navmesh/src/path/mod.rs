// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Path generation and following.
//!
//! - `width`: corridor width through a triangle
//! - `generator`: triangle search producing a channel of crossed edges
//! - `funnel`: string pulling the channel into path nodes
//! - `navi_path`: generated paths and the steering API on top of them
//! - `cache`: authored patrol routes

mod cache;
mod funnel;
mod generator;
mod navi_path;
mod width;

pub use cache::{PathCache, PathMethod, PathNodeSet, PathProgress};
pub use generator::{NaviPathGenerator, WIDTH_TOLERANCE};
pub use navi_path::{NaviPath, NaviPathNode, NaviPathResult, NaviSide, Waypoint};
