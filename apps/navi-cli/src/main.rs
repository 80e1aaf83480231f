// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Navi CLI: build a navigation mesh from a JSON scene and run queries on it.
//!
//! Usage:
//!   navi <scene.json> [--obj <path>] [--compact]
//!
//! Results are printed to stdout as JSON. Mesh settings come from the
//! `NAVI_*` environment variables, logging from `RUST_LOG`.

mod scene;

use std::env;
use std::fs;

use anyhow::{bail, Context, Result};
use navi_core::Transform3;
use navi_mesh::{
    DefaultPathFlagsCheck, HeightSweep, HeightSweepType, MeshId, NaviConfig, NaviInfluence, NaviMesh, NaviPatch,
    NaviPath, NaviPathNode, NaviPathResult, PathFlags, SweepOutcome, DEFAULT_SWEEP_PADDING,
};
use serde::Serialize;

use scene::{Query, Scene};

#[derive(Debug, Serialize)]
struct MeshSummary {
    valid: bool,
    triangles: usize,
    edges: usize,
    influences: usize,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum QueryOutput {
    Path {
        result: NaviPathResult,
        nodes: Vec<NaviPathNode>,
        distance: f32,
    },
    Sweep(SweepOutcome),
    Contains {
        inside: bool,
    },
    Area {
        area: f32,
    },
}

#[derive(Debug, Serialize)]
struct Report {
    mesh: MeshSummary,
    results: Vec<QueryOutput>,
}

struct Options {
    scene_path: String,
    obj_path: Option<String>,
    compact: bool,
}

fn parse_args() -> Result<Option<Options>> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return Ok(None);
    }

    let mut options = Options {
        scene_path: args[1].clone(),
        obj_path: None,
        compact: false,
    };
    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--obj" => {
                i += 1;
                let path = args.get(i).context("--obj needs a path")?;
                options.obj_path = Some(path.clone());
            }
            "--compact" => options.compact = true,
            other => bail!("unknown option: {other}"),
        }
        i += 1;
    }
    Ok(Some(options))
}

fn print_usage() {
    eprintln!("Usage: navi <scene.json> [--obj <path>] [--compact]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --obj <path>   Write the walkable triangles as a Wavefront OBJ file");
    eprintln!("  --compact      Print single-line JSON");
}

fn build_mesh(scene: &Scene, config: NaviConfig) -> Result<(NaviMesh, Vec<NaviInfluence>)> {
    let padding = scene.padding.unwrap_or(config.padding);
    let mut mesh = NaviMesh::new(MeshId(1), config);
    mesh.initialize(scene.bounds, padding).context("initializing mesh")?;

    for rect in &scene.rectangles {
        let patch = NaviPatch::rectangle(rect.min, rect.max, rect.kind.content());
        mesh.stitch(patch, Transform3::identity())?;
    }
    for placed in &scene.patches {
        if placed.proj_z {
            mesh.stitch_proj_z(placed.patch.clone(), placed.transform)?;
        } else {
            mesh.stitch(placed.patch.clone(), placed.transform)?;
        }
    }
    mesh.generate_mesh().context("generating mesh")?;

    let mut influences = Vec::with_capacity(scene.influences.len());
    for influence in &scene.influences {
        let mut handle = NaviInfluence::default();
        if let Err(err) = mesh.add_influence(&influence.position, influence.radius, &mut handle) {
            tracing::warn!(%err, x = influence.position.x, y = influence.position.y, "influence skipped");
            continue;
        }
        influences.push(handle);
    }
    Ok((mesh, influences))
}

fn run_query(mesh: &mut NaviMesh, scene: &Scene, query: &Query) -> Result<QueryOutput> {
    let output = match query {
        Query::Path {
            from,
            to,
            radius,
            path_flags,
            generation_flags,
            incomplete_distance,
        } => {
            let mut path = NaviPath::new();
            let result =
                path.generate_path(mesh, from, to, *radius, *path_flags, *generation_flags, *incomplete_distance);
            let distance = if result.has_path() { path.accurate_total_distance() } else { 0.0 };
            QueryOutput::Path {
                result,
                nodes: path.nodes().to_vec(),
                distance,
            }
        }
        Query::Sweep {
            from,
            to,
            radius,
            path_flags,
            height,
        } => {
            let outcome = match (height, &scene.heightmap) {
                (Some(limits), Some(field)) => {
                    let sweep = HeightSweep {
                        kind: HeightSweepType::Constraint,
                        source: field,
                        min_height: limits.min,
                        max_height: limits.max,
                    };
                    mesh.do_sweep(from, to, *radius, *path_flags, DEFAULT_SWEEP_PADDING, Some(&sweep))
                }
                (Some(_), None) => bail!("height sweep requested but the scene has no heightmap"),
                (None, _) => mesh.sweep(from, to, *radius, *path_flags),
            };
            QueryOutput::Sweep(outcome)
        }
        Query::Contains {
            position,
            radius,
            path_flags,
        } => QueryOutput::Contains {
            inside: mesh.contains(position, *radius, &DefaultPathFlagsCheck(*path_flags)),
        },
        Query::Area { bounds } => QueryOutput::Area {
            area: mesh.calc_spawnable_area(bounds),
        },
    };
    Ok(output)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info,navi_mesh=debug".into()))
        .with_writer(std::io::stderr)
        .init();

    let Some(options) = parse_args()? else {
        return Ok(());
    };

    let config = NaviConfig::from_env();
    config.validate().context("invalid NAVI_* settings")?;

    let text = fs::read_to_string(&options.scene_path)
        .with_context(|| format!("reading scene {}", options.scene_path))?;
    let scene: Scene = serde_json::from_str(&text).context("parsing scene")?;

    let (mut mesh, influences) = build_mesh(&scene, config)?;
    tracing::info!(
        triangles = mesh.cdt().triangle_count(),
        edges = mesh.cdt().edge_count(),
        influences = influences.len(),
        "mesh ready"
    );

    if let Some(path) = &options.obj_path {
        fs::write(path, mesh.to_obj_string(PathFlags::WALK)).with_context(|| format!("writing {path}"))?;
        tracing::info!(path = %path, "wrote OBJ");
    }

    let mut results = Vec::with_capacity(scene.queries.len());
    for query in &scene.queries {
        results.push(run_query(&mut mesh, &scene, query)?);
    }

    let report = Report {
        mesh: MeshSummary {
            valid: mesh.is_mesh_valid(),
            triangles: mesh.cdt().triangle_count(),
            edges: mesh.cdt().edge_count(),
            influences: influences.len(),
        },
        results,
    };
    let json = if options.compact {
        serde_json::to_string(&report)?
    } else {
        serde_json::to_string_pretty(&report)?
    };
    println!("{json}");
    Ok(())
}
