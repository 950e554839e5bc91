//! Environment assets.
//!
//! An environment preset is the image-based lighting and sky used behind
//! every scene. Presets are resolved from `<assets>/environments/<name>.json`
//! when such a file exists, otherwise from the built-in table. Loading is
//! blocking file IO; callers decide which thread runs it.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

use crate::render::Color;

/// Names of the built-in presets.
pub const PRESETS: &[&str] = &[
    "apartment",
    "city",
    "dawn",
    "forest",
    "lobby",
    "night",
    "park",
    "studio",
    "sunset",
    "warehouse",
];

/// A loaded environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentMap {
    pub preset: String,
    /// Ambient light scale applied to every material.
    pub intensity: f32,
    pub sky: Color,
    pub ground: Color,
}

impl EnvironmentMap {
    /// Built-in preset by name.
    pub fn builtin(preset: &str) -> Option<Self> {
        let (intensity, sky, ground) = match preset {
            "apartment" => (0.9, Color::rgb(0.93, 0.87, 0.80), Color::rgb(0.35, 0.30, 0.26)),
            "city" => (1.0, Color::rgb(0.70, 0.75, 0.82), Color::rgb(0.30, 0.30, 0.32)),
            "dawn" => (0.6, Color::rgb(0.95, 0.70, 0.55), Color::rgb(0.25, 0.20, 0.22)),
            "forest" => (0.7, Color::rgb(0.60, 0.75, 0.55), Color::rgb(0.20, 0.25, 0.15)),
            "lobby" => (1.1, Color::rgb(0.95, 0.92, 0.85), Color::rgb(0.45, 0.40, 0.35)),
            "night" => (0.2, Color::rgb(0.08, 0.10, 0.20), Color::rgb(0.02, 0.02, 0.04)),
            "park" => (1.0, Color::rgb(0.65, 0.80, 0.95), Color::rgb(0.30, 0.40, 0.20)),
            "studio" => (1.2, Color::rgb(1.0, 1.0, 1.0), Color::rgb(0.50, 0.50, 0.50)),
            "sunset" => (0.7, Color::rgb(1.0, 0.55, 0.35), Color::rgb(0.30, 0.18, 0.15)),
            "warehouse" => (0.8, Color::rgb(0.75, 0.72, 0.68), Color::rgb(0.28, 0.26, 0.24)),
            _ => return None,
        };
        Some(Self {
            preset: preset.to_string(),
            intensity,
            sky,
            ground,
        })
    }

    /// Parses an environment from JSON.
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}

/// File an override for `preset` is read from.
pub fn environment_path(assets_dir: &Path, preset: &str) -> PathBuf {
    assets_dir.join("environments").join(format!("{preset}.json"))
}

/// Loads `preset`, preferring an asset file over the built-in table.
pub fn load_environment(assets_dir: &Path, preset: &str) -> anyhow::Result<EnvironmentMap> {
    let path = environment_path(assets_dir, preset);
    if path.is_file() {
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("read environment {}", path.display()))?;
        let mut env = EnvironmentMap::from_json_str(&text)
            .with_context(|| format!("parse environment {}", path.display()))?;
        env.preset = preset.to_string();
        return Ok(env);
    }

    match EnvironmentMap::builtin(preset) {
        Some(env) => Ok(env),
        None => bail!(
            "unknown environment preset '{preset}' (no {} and not one of {})",
            path.display(),
            PRESETS.join(", ")
        ),
    }
}
