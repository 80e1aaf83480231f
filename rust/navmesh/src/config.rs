// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh build and path search settings.

use serde::{Deserialize, Serialize};

use crate::error::{NaviError, Result};

/// Tunable settings for mesh generation and path search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NaviConfig {
    /// Width of the reference cell used to derive the point budget.
    pub budget_cell_width: f32,
    /// Length of the reference cell used to derive the point budget.
    pub budget_cell_length: f32,
    /// Points allowed per reference cell.
    pub budget_cell_max_points: u32,
    /// Border added around the mesh bounds for the outer quad.
    pub padding: f32,
    /// Merge runs of collinear constraints after markup.
    pub remove_collinear_edges: bool,
    /// Search states one path query may expand.
    pub max_search_states: usize,
    /// Nodes a generated path may hold.
    pub max_path_nodes: usize,
    /// Upper bound on extra search attempts after the first success.
    pub max_extra_attempts: usize,
}

impl Default for NaviConfig {
    fn default() -> Self {
        Self {
            budget_cell_width: 1024.0,
            budget_cell_length: 1024.0,
            budget_cell_max_points: 3000,
            padding: 100.0,
            remove_collinear_edges: true,
            max_search_states: 16384,
            max_path_nodes: 256,
            max_extra_attempts: 8,
        }
    }
}

impl NaviConfig {
    /// Load settings from environment variables, keeping defaults for
    /// missing or unparsable values.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            budget_cell_width: std::env::var("NAVI_BUDGET_CELL_WIDTH")
                .unwrap_or_else(|_| defaults.budget_cell_width.to_string())
                .parse()
                .unwrap_or(defaults.budget_cell_width),
            budget_cell_length: std::env::var("NAVI_BUDGET_CELL_LENGTH")
                .unwrap_or_else(|_| defaults.budget_cell_length.to_string())
                .parse()
                .unwrap_or(defaults.budget_cell_length),
            budget_cell_max_points: std::env::var("NAVI_BUDGET_CELL_MAX_POINTS")
                .unwrap_or_else(|_| defaults.budget_cell_max_points.to_string())
                .parse()
                .unwrap_or(defaults.budget_cell_max_points),
            padding: std::env::var("NAVI_PADDING")
                .unwrap_or_else(|_| defaults.padding.to_string())
                .parse()
                .unwrap_or(defaults.padding),
            remove_collinear_edges: std::env::var("NAVI_REMOVE_COLLINEAR")
                .map(|v| parse_bool(&v).unwrap_or(defaults.remove_collinear_edges))
                .unwrap_or(defaults.remove_collinear_edges),
            max_search_states: std::env::var("NAVI_MAX_SEARCH_STATES")
                .unwrap_or_else(|_| defaults.max_search_states.to_string())
                .parse()
                .unwrap_or(defaults.max_search_states),
            max_path_nodes: std::env::var("NAVI_MAX_PATH_NODES")
                .unwrap_or_else(|_| defaults.max_path_nodes.to_string())
                .parse()
                .unwrap_or(defaults.max_path_nodes),
            max_extra_attempts: defaults.max_extra_attempts,
        }
    }

    /// Reject settings the mesh cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !(self.budget_cell_width > 0.0 && self.budget_cell_length > 0.0) {
            return Err(NaviError::Config(format!(
                "budget cell must have positive size, got {}x{}",
                self.budget_cell_width, self.budget_cell_length
            )));
        }
        if self.budget_cell_max_points == 0 {
            return Err(NaviError::Config("budget_cell_max_points must be > 0".into()));
        }
        if !self.padding.is_finite() || self.padding <= crate::vertex_cache::EPSILON {
            return Err(NaviError::Config(format!(
                "padding must exceed {}, got {}",
                crate::vertex_cache::EPSILON,
                self.padding
            )));
        }
        if self.max_path_nodes < 2 {
            return Err(NaviError::Config("max_path_nodes must be at least 2".into()));
        }
        if self.max_search_states == 0 {
            return Err(NaviError::Config("max_search_states must be > 0".into()));
        }
        Ok(())
    }

    /// Vertex budget for a mesh covering `area` square units.
    pub fn point_budget(&self, area: f32) -> usize {
        let cell_area = self.budget_cell_width * self.budget_cell_length;
        if cell_area <= 0.0 {
            return 0;
        }
        let density = self.budget_cell_max_points as f32 / cell_area;
        (density * area).max(0.0) as usize
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(NaviConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = NaviConfig {
            padding: 0.0,
            ..NaviConfig::default()
        };
        assert!(matches!(config.validate(), Err(NaviError::Config(_))));

        let config = NaviConfig {
            budget_cell_width: -1.0,
            ..NaviConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_point_budget_scales_with_area() {
        let config = NaviConfig {
            budget_cell_width: 100.0,
            budget_cell_length: 100.0,
            budget_cell_max_points: 50,
            ..NaviConfig::default()
        };
        assert_eq!(config.point_budget(10_000.0), 50);
        assert_eq!(config.point_budget(40_000.0), 200);
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: NaviConfig = serde_json::from_str(r#"{"padding": 32.0}"#).unwrap();
        assert_eq!(config.padding, 32.0);
        assert_eq!(config.max_path_nodes, 256);
    }
}
