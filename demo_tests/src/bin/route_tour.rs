//! Headless route tour.
//!
//! Mounts every registered room on the rapier backend, runs it for a number
//! of frames and prints one JSON report per route.
//!
//! Usage:
//!   cargo run -p demo_tests --bin route_tour -- [frames] [--pretty]

use anyhow::Context;
use demo_shared::{config::DemoConfig, rapier::RapierPhysics, render::FrameRecorder};
use demo_shell::{environment::Preloaded, MountState, SceneRegistry, Shell};
use serde::Serialize;
use tracing::{info, warn};

const DEFAULT_FRAMES: u32 = 120;

#[derive(Debug, Serialize)]
struct RouteReport {
    path: String,
    label: String,
    state: MountState,
    frames: u32,
    bodies: usize,
    joints: usize,
    meshes: usize,
    /// Lowest mesh height on the last frame.
    lowest_y: Option<f32>,
    panel: Vec<String>,
}

#[derive(Debug, Serialize)]
struct TourReport {
    physics: String,
    environment: String,
    routes: Vec<RouteReport>,
}

impl TourReport {
    fn failures(&self) -> usize {
        self.routes.iter().filter(|r| !r.state.is_mounted()).count()
    }
}

fn tour(frames: u32) -> anyhow::Result<TourReport> {
    let config = DemoConfig::default();
    let preset = config.environment_preset.clone();
    let physics = Box::new(RapierPhysics::new(&config.physics));
    let mut shell = Shell::new(
        config,
        SceneRegistry::demos().context("build scene registry")?,
        physics,
        Box::new(Preloaded::builtin(&preset)),
    )
    .context("create shell")?;

    let dt = shell.config().dt();
    let mut rec = FrameRecorder::new();
    shell.frame(dt, &mut rec);

    let routes: Vec<(String, String)> = shell
        .registry()
        .iter()
        .map(|r| (r.path(), r.label().to_string()))
        .collect();

    let mut reports = Vec::with_capacity(routes.len());
    for (path, label) in routes {
        shell.navigate(&path);
        for _ in 0..frames {
            shell.frame(dt, &mut rec);
        }
        let report = RouteReport {
            state: shell.state().clone(),
            frames,
            bodies: shell.router().scope().map_or(0, |s| s.body_count()),
            joints: shell.router().scope().map_or(0, |s| s.joint_count()),
            meshes: rec.meshes_last_frame,
            lowest_y: rec.mesh_positions.iter().map(|p| p.y).reduce(f32::min),
            panel: shell.panel().map(|f| f.to_lines()).unwrap_or_default(),
            path,
            label,
        };
        if report.state.is_mounted() {
            info!(path = %report.path, bodies = report.bodies, meshes = report.meshes, "Route ok");
        } else {
            warn!(path = %report.path, state = ?report.state, "Route did not mount");
        }
        reports.push(report);
    }
    shell.dispose();

    Ok(TourReport {
        physics: shell.physics().name().to_string(),
        environment: preset,
        routes: reports,
    })
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let pretty = args.iter().any(|a| a == "--pretty");
    let frames = match args.iter().find(|a| !a.starts_with("--")) {
        Some(n) => n.parse().context("parse frame count")?,
        None => DEFAULT_FRAMES,
    };

    let report = tour(frames)?;
    let json = if pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");

    let failures = report.failures();
    if failures > 0 {
        anyhow::bail!("{failures} route(s) failed to mount");
    }
    Ok(())
}
