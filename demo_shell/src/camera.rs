//! Orbit camera.
//!
//! A perspective camera on a sphere around a target point. Rotating moves it
//! along the sphere, zooming changes the radius, panning moves the target in
//! the camera plane.

use std::f32::consts::FRAC_PI_2;

use demo_shared::{
    config::CameraConfig,
    math::{Mat4, Vec3},
};

const PITCH_LIMIT: f32 = FRAC_PI_2 - 0.01;

#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    target: Vec3,
    distance: f32,
    /// Rotation around +Y, zero looking down -Z.
    yaw: f32,
    pitch: f32,
    fov_deg: f32,
    znear: f32,
    zfar: f32,
    min_distance: f32,
    max_distance: f32,
    aspect: f32,
}

impl OrbitCamera {
    pub fn from_config(cfg: &CameraConfig) -> Self {
        let offset = cfg.position - cfg.target;
        let distance = offset.length().max(f32::EPSILON);
        let min_distance = cfg.min_distance.min(cfg.max_distance);
        Self {
            target: cfg.target,
            distance: distance.clamp(min_distance, cfg.max_distance),
            yaw: offset.x.atan2(offset.z),
            pitch: (offset.y / distance).clamp(-1.0, 1.0).asin().clamp(-PITCH_LIMIT, PITCH_LIMIT),
            fov_deg: cfg.fov_deg,
            znear: cfg.znear,
            zfar: cfg.zfar,
            min_distance,
            max_distance: cfg.max_distance,
            aspect: 16.0 / 9.0,
        }
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Camera position.
    pub fn eye(&self) -> Vec3 {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        self.target + Vec3::new(cp * sy, sp, cp * cy) * self.distance
    }

    /// Orbits by the given yaw/pitch deltas in radians.
    pub fn rotate(&mut self, d_yaw: f32, d_pitch: f32) {
        if !(d_yaw.is_finite() && d_pitch.is_finite()) {
            return;
        }
        self.yaw = (self.yaw + d_yaw).rem_euclid(std::f32::consts::TAU);
        self.pitch = (self.pitch + d_pitch).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Multiplies the distance by `factor` (< 1 zooms in).
    pub fn zoom(&mut self, factor: f32) {
        if factor > 0.0 && factor.is_finite() {
            self.distance = (self.distance * factor).clamp(self.min_distance, self.max_distance);
        }
    }

    /// Moves the target along the camera's right and up axes, scaled by distance.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        if !(dx.is_finite() && dy.is_finite()) {
            return;
        }
        let forward = (self.target - self.eye()).normalize_or_zero();
        let right = forward.cross(Vec3::Y).normalize_or_zero();
        let up = right.cross(forward);
        self.target += (right * dx + up * dy) * self.distance;
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.target, Vec3::Y)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_deg.to_radians(), self.aspect, self.znear, self.zfar)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection() * self.view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn starts_at_configured_position() {
        let cam = OrbitCamera::from_config(&CameraConfig::default());
        assert!(approx(cam.eye(), Vec3::new(0.0, 0.0, 5.0)));
        assert!((cam.distance() - 5.0).abs() < 1e-5);
    }

    #[test]
    fn rotate_keeps_distance_and_clamps_pitch() {
        let mut cam = OrbitCamera::from_config(&CameraConfig::default());
        cam.rotate(FRAC_PI_2, 0.0);
        assert!(approx(cam.eye(), Vec3::new(5.0, 0.0, 0.0)));
        cam.rotate(0.0, 10.0);
        assert!((cam.eye() - cam.target()).length() - 5.0 < 1e-4);
        assert!(cam.eye().y < 5.0);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut cam = OrbitCamera::from_config(&CameraConfig::default());
        cam.zoom(0.001);
        assert_eq!(cam.distance(), 1.0);
        cam.zoom(1e6);
        assert_eq!(cam.distance(), 200.0);
        cam.zoom(-1.0);
        assert_eq!(cam.distance(), 200.0);
    }

    #[test]
    fn pan_moves_target_sideways() {
        let mut cam = OrbitCamera::from_config(&CameraConfig::default());
        cam.pan(0.2, 0.0);
        assert!(approx(cam.target(), Vec3::new(1.0, 0.0, 0.0)));
    }

    #[test]
    fn non_finite_deltas_are_ignored() {
        let mut cam = OrbitCamera::from_config(&CameraConfig::default());
        cam.rotate(0.5, 0.1);
        let eye = cam.eye();
        cam.rotate(f32::NAN, 0.0);
        cam.rotate(0.0, f32::INFINITY);
        cam.pan(f32::NAN, 1.0);
        cam.pan(0.0, f32::NEG_INFINITY);
        assert!(approx(cam.eye(), eye));
        assert!(approx(cam.target(), Vec3::ZERO));

        // Still usable afterwards.
        cam.rotate(0.5, 0.1);
        let moved = cam.eye();
        assert!(moved.x.is_finite() && moved.y.is_finite() && moved.z.is_finite());
        assert!(!approx(moved, eye));
    }

    #[test]
    fn target_projects_to_screen_center() {
        let cam = OrbitCamera::from_config(&CameraConfig::default());
        let p = cam.view_proj().transform_point(cam.target());
        assert!(p.x.abs() < 1e-4 && p.y.abs() < 1e-4);
    }
}
