//! Configuration system.
//!
//! Loads demo configuration from JSON strings/files. Every field has a
//! default, so a config file only needs the values it changes.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::{
    math::Vec3,
    physics::PhysicsConfig,
    render::{Background, Color, DirectionalLight, ShadowCamera},
};

/// What happens to the side-panel slot when the route changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotPolicy {
    /// Keep the last published fragment; scenes clear it from their teardown.
    #[default]
    Retain,
    /// Empty the slot whenever a scene is torn down.
    ClearOnSwitch,
}

/// The static ground every scene can rely on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloorConfig {
    /// Center of the floor box.
    pub position: Vec3,
    /// Scale applied to a unit box.
    pub scale: Vec3,
    pub shadow_opacity: f32,
}

impl Default for FloorConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, -12.55, 0.0),
            scale: Vec3::new(100.0, 0.1, 100.0),
            shadow_opacity: 0.2,
        }
    }
}

/// Perspective camera and orbit limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    pub position: Vec3,
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov_deg: f32,
    pub znear: f32,
    pub zfar: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            target: Vec3::ZERO,
            fov_deg: 75.0,
            znear: 0.1,
            zfar: 1000.0,
            min_distance: 1.0,
            max_distance: 200.0,
        }
    }
}

fn default_light() -> DirectionalLight {
    DirectionalLight {
        position: Vec3::new(10.0, 10.0, 10.0),
        cast_shadow: true,
        shadow: ShadowCamera {
            left: -40.0,
            right: 40.0,
            top: 40.0,
            bottom: -40.0,
            map_size: 1024,
            bias: -0.0001,
        },
        intensity: 1.0,
    }
}

fn default_background() -> Background {
    Background {
        top: Color::BLUE,
        bottom: Color::WHITE,
    }
}

fn default_tick_hz() -> u32 {
    60
}

fn default_initial_route() -> String {
    "/".to_string()
}

fn default_assets_dir() -> String {
    "assets".to_string()
}

fn default_environment_preset() -> String {
    "apartment".to_string()
}

fn default_shadows() -> bool {
    true
}

/// Root configuration of the demo shell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoConfig {
    /// Fixed simulation and render rate.
    #[serde(default = "default_tick_hz")]
    pub tick_hz: u32,
    /// Route mounted on startup.
    #[serde(default = "default_initial_route")]
    pub initial_route: String,
    /// Directory holding `environments/<preset>.json` overrides.
    #[serde(default = "default_assets_dir")]
    pub assets_dir: String,
    #[serde(default = "default_environment_preset")]
    pub environment_preset: String,
    #[serde(default)]
    pub slot_policy: SlotPolicy,
    /// Whether the canvas renders shadows at all.
    #[serde(default = "default_shadows")]
    pub shadows: bool,
    #[serde(default = "default_light")]
    pub light: DirectionalLight,
    #[serde(default = "default_background")]
    pub background: Background,
    #[serde(default)]
    pub floor: FloorConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub physics: PhysicsConfig,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            tick_hz: default_tick_hz(),
            initial_route: default_initial_route(),
            assets_dir: default_assets_dir(),
            environment_preset: default_environment_preset(),
            slot_policy: SlotPolicy::default(),
            shadows: default_shadows(),
            light: default_light(),
            background: default_background(),
            floor: FloorConfig::default(),
            camera: CameraConfig::default(),
            physics: PhysicsConfig::default(),
        }
    }
}

impl DemoConfig {
    /// Parses config from JSON.
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    /// Reads and parses a config file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("parse config {}", path.display()))
    }

    /// Fixed timestep in seconds.
    pub fn dt(&self) -> f32 {
        1.0 / self.tick_hz.max(1) as f32
    }
}
