//! Rendering abstraction.
//!
//! This crate intentionally does not depend on a graphics backend.
//! [`RenderBackend`] is the 3D canvas (meshes, lights, environment) and
//! [`OverlayBackend`] the 2D layer on top of it (navigation strip and side
//! panel). They are separate so the side panel can be redrawn without
//! touching the 3D scene.

use serde::{Deserialize, Serialize};

use crate::{
    math::{Mat4, Vec3},
    physics::ColliderShape,
    resources::EnvironmentMap,
    ui::{NavItem, UiFragment},
};

/// Linear RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color(pub [f32; 4]);

impl Color {
    pub const WHITE: Color = Color([1.0, 1.0, 1.0, 1.0]);
    pub const BLUE: Color = Color([0.0, 0.0, 1.0, 1.0]);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Color([r, g, b, 1.0])
    }

    /// Parses `#rrggbb`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#')?;
        if hex.len() != 6 {
            return None;
        }
        let channel = |i: usize| {
            u8::from_str_radix(hex.get(i..i + 2)?, 16)
                .ok()
                .map(|v| f32::from(v) / 255.0)
        };
        Some(Color::rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

bitflags::bitflags! {
    /// Shadow participation of a mesh.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ShadowFlags: u8 {
        const NONE = 0;
        const CAST = 1 << 0;
        const RECEIVE = 1 << 1;
    }
}

impl Default for ShadowFlags {
    fn default() -> Self {
        Self::CAST | Self::RECEIVE
    }
}

/// Surface material.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Material {
    Standard { color: Color },
    /// Transparent except where shadows fall.
    ShadowCatcher { opacity: f32 },
}

/// What a scene-graph node draws.
#[derive(Debug, Clone, PartialEq)]
pub struct Visual {
    pub shape: ColliderShape,
    pub material: Material,
    pub shadows: ShadowFlags,
}

impl Visual {
    pub fn new(shape: ColliderShape, color: Color) -> Self {
        Self {
            shape,
            material: Material::Standard { color },
            shadows: ShadowFlags::default(),
        }
    }
}

/// Orthographic shadow camera of a directional light.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadowCamera {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
    pub map_size: u32,
    pub bias: f32,
}

/// Directional light.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionalLight {
    pub position: Vec3,
    pub cast_shadow: bool,
    pub shadow: ShadowCamera,
    pub intensity: f32,
}

/// Vertical background gradient behind the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Background {
    pub top: Color,
    pub bottom: Color,
}

/// The 3D canvas.
pub trait RenderBackend {
    fn begin_frame(&mut self, background: &Background);
    fn set_view_proj(&mut self, view_proj: Mat4);
    fn set_environment(&mut self, env: &EnvironmentMap);
    fn draw_light(&mut self, light: &DirectionalLight);
    fn draw_mesh(&mut self, visual: &Visual, transform: &Mat4);
    /// Drawn instead of the scene while resources load or after a failure.
    fn draw_placeholder(&mut self, text: &str);
    fn end_frame(&mut self);
}

/// The 2D layer over the canvas.
pub trait OverlayBackend {
    fn draw_nav(&mut self, links: &[NavItem]);
    fn draw_panel(&mut self, fragment: Option<&UiFragment>);
}

/// A no-op renderer useful for headless runs.
#[derive(Default)]
pub struct NullRenderer;

impl RenderBackend for NullRenderer {
    fn begin_frame(&mut self, _background: &Background) {}
    fn set_view_proj(&mut self, _view_proj: Mat4) {}
    fn set_environment(&mut self, _env: &EnvironmentMap) {}
    fn draw_light(&mut self, _light: &DirectionalLight) {}
    fn draw_mesh(&mut self, _visual: &Visual, _transform: &Mat4) {}
    fn draw_placeholder(&mut self, _text: &str) {}
    fn end_frame(&mut self) {}
}

impl OverlayBackend for NullRenderer {
    fn draw_nav(&mut self, _links: &[NavItem]) {}
    fn draw_panel(&mut self, _fragment: Option<&UiFragment>) {}
}

/// Counts and keeps the last output of every draw call.
///
/// Used by tests and the headless route tour to observe what the shell drew.
#[derive(Debug, Default)]
pub struct FrameRecorder {
    pub frames: u64,
    pub meshes_this_frame: usize,
    pub meshes_last_frame: usize,
    pub lights_last_frame: usize,
    pub environment: Option<String>,
    pub placeholder: Option<String>,
    pub view_proj: Option<Mat4>,
    pub nav_renders: u64,
    pub nav: Vec<NavItem>,
    pub panel_renders: u64,
    pub panel: Option<UiFragment>,
    /// Translation of every mesh drawn during the last complete frame.
    pub mesh_positions: Vec<Vec3>,
    positions_this_frame: Vec<Vec3>,
    lights_this_frame: usize,
}

impl FrameRecorder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RenderBackend for FrameRecorder {
    fn begin_frame(&mut self, _background: &Background) {
        self.meshes_this_frame = 0;
        self.lights_this_frame = 0;
        self.positions_this_frame.clear();
        self.placeholder = None;
    }

    fn set_view_proj(&mut self, view_proj: Mat4) {
        self.view_proj = Some(view_proj);
    }

    fn set_environment(&mut self, env: &EnvironmentMap) {
        self.environment = Some(env.preset.clone());
    }

    fn draw_light(&mut self, _light: &DirectionalLight) {
        self.lights_this_frame += 1;
    }

    fn draw_mesh(&mut self, _visual: &Visual, transform: &Mat4) {
        self.meshes_this_frame += 1;
        self.positions_this_frame.push(transform.translation());
    }

    fn draw_placeholder(&mut self, text: &str) {
        self.placeholder = Some(text.to_string());
    }

    fn end_frame(&mut self) {
        self.frames += 1;
        self.meshes_last_frame = self.meshes_this_frame;
        self.lights_last_frame = self.lights_this_frame;
        self.mesh_positions = std::mem::take(&mut self.positions_this_frame);
    }
}

impl OverlayBackend for FrameRecorder {
    fn draw_nav(&mut self, links: &[NavItem]) {
        self.nav_renders += 1;
        self.nav = links.to_vec();
    }

    fn draw_panel(&mut self, fragment: Option<&UiFragment>) {
        self.panel_renders += 1;
        self.panel = fragment.cloned();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_from_hex() {
        assert_eq!(Color::from_hex("#ff0000"), Some(Color::rgb(1.0, 0.0, 0.0)));
        assert_eq!(Color::from_hex("ff0000"), None);
        assert_eq!(Color::from_hex("#ff00"), None);
    }

    #[test]
    fn recorder_reports_last_complete_frame() {
        let mut rec = FrameRecorder::new();
        let bg = Background {
            top: Color::BLUE,
            bottom: Color::WHITE,
        };
        let visual = Visual::new(ColliderShape::Ball { radius: 1.0 }, Color::WHITE);
        rec.begin_frame(&bg);
        rec.draw_mesh(&visual, &Mat4::IDENTITY);
        rec.draw_mesh(&visual, &Mat4::IDENTITY);
        rec.end_frame();
        rec.begin_frame(&bg);
        rec.draw_mesh(&visual, &Mat4::IDENTITY);
        assert_eq!(rec.meshes_last_frame, 2);
        rec.end_frame();
        assert_eq!(rec.meshes_last_frame, 1);
        assert_eq!(rec.frames, 2);
    }
}
