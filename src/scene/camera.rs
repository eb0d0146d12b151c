//! Camera state and perspective projection for the graph overlay.
//!
//! The eye sits at a fixed position looking down −Z. Instead of orbiting the
//! eye, the scene is rotated by yaw (about +Y) and pitch (about +X) before it
//! is translated into camera space, so every camera parameter lives here.

use std::f32::consts::FRAC_PI_2;

use crate::config::CameraConfig;

/// Keeps pitch strictly inside (−π/2, π/2).
const PITCH_LIMIT: f32 = FRAC_PI_2 - 1e-4;

/// Rotation intents are scaled by `sensitivity * ROTATION_SCALE` radians.
pub const ROTATION_SCALE: f32 = 0.01;

pub type Vec3 = [f32; 3];

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

impl ScreenPoint {
    pub fn within(&self, width: u32, height: u32) -> bool {
        self.x >= 0.0 && self.y >= 0.0 && self.x < width as f32 && self.y < height as f32
    }

    pub fn distance(&self, other: ScreenPoint) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn as_pixel(&self) -> (i32, i32) {
        (self.x.round() as i32, self.y.round() as i32)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Projection {
    Screen(ScreenPoint),
    /// At or behind the near plane; has no screen position.
    Offscreen,
}

impl Projection {
    pub fn screen(&self) -> Option<ScreenPoint> {
        match self {
            Projection::Screen(p) => Some(*p),
            Projection::Offscreen => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct CameraProjection {
    cfg: CameraConfig,
    eye: Vec3,
    yaw: f32,
    pitch: f32,
    zoom: f32,
    width: u32,
    height: u32,
}

impl CameraProjection {
    pub fn new(cfg: CameraConfig) -> Self {
        Self {
            eye: cfg.eye,
            yaw: 0.0,
            pitch: 0.0,
            zoom: cfg.default_zoom,
            width: cfg.viewport_width,
            height: cfg.viewport_height,
            cfg,
        }
    }

    pub fn eye(&self) -> Vec3 {
        self.eye
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn viewport(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if (width, height) != (self.width, self.height) {
            log::debug!("viewport resized to {width}x{height}");
            self.width = width;
            self.height = height;
        }
    }

    /// Adds to yaw and pitch. Yaw accumulates without wrapping.
    pub fn rotate(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.yaw += delta_yaw;
        self.pitch = (self.pitch + delta_pitch).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    pub fn scale_zoom(&mut self, ratio: f32) {
        if !(ratio > 0.0) || !ratio.is_finite() {
            log::warn!("ignoring non-positive zoom ratio {ratio}");
            return;
        }
        self.zoom = (self.zoom * ratio).clamp(self.cfg.min_zoom, self.cfg.max_zoom);
    }

    pub fn reset(&mut self) {
        self.eye = self.cfg.eye;
        self.yaw = 0.0;
        self.pitch = 0.0;
        self.zoom = self.cfg.default_zoom;
    }

    /// Applies yaw ∘ pitch to `point` and moves it into camera space.
    pub fn to_camera_space(&self, point: Vec3) -> Vec3 {
        let rotated = rotate_y(self.yaw, rotate_x(self.pitch, point));
        [
            rotated[0] - self.eye[0],
            rotated[1] - self.eye[1],
            rotated[2] - self.eye[2],
        ]
    }

    pub fn project(&self, point: Vec3) -> Projection {
        let rel = self.to_camera_space(point);
        let depth = -rel[2];
        if !(depth > self.cfg.near_epsilon) {
            return Projection::Offscreen;
        }

        let focal = self.focal_length();
        let cx = self.width as f32 / 2.0;
        let cy = self.height as f32 / 2.0;
        Projection::Screen(ScreenPoint {
            x: cx + focal * rel[0] / depth * self.zoom,
            y: cy - focal * rel[1] / depth * self.zoom,
        })
    }

    /// Projection that also lies inside the current viewport.
    pub fn visible(&self, point: Vec3) -> Option<ScreenPoint> {
        self.project(point)
            .screen()
            .filter(|p| p.within(self.width, self.height))
    }

    /// Euclidean distance from the eye to `point` after scene rotation.
    pub fn depth_of(&self, point: Vec3) -> f32 {
        let rel = self.to_camera_space(point);
        (rel[0] * rel[0] + rel[1] * rel[1] + rel[2] * rel[2]).sqrt()
    }

    /// Indices of `points` ordered farthest first.
    pub fn back_to_front(&self, points: &[Vec3]) -> Vec<usize> {
        let mut order: Vec<(usize, f32)> = points
            .iter()
            .enumerate()
            .map(|(idx, p)| (idx, self.depth_of(*p)))
            .collect();
        order.sort_by(|a, b| b.1.total_cmp(&a.1));
        order.into_iter().map(|(idx, _)| idx).collect()
    }

    /// Index of the visible point nearest to `target`, if within `radius` px.
    pub fn hit_test(&self, points: &[Vec3], target: ScreenPoint, radius: f32) -> Option<usize> {
        points
            .iter()
            .enumerate()
            .filter_map(|(idx, p)| self.visible(*p).map(|s| (idx, s.distance(target))))
            .filter(|(_, d)| *d < radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(idx, _)| idx)
    }

    fn focal_length(&self) -> f32 {
        let half_fov = self.cfg.fov_degrees.to_radians() / 2.0;
        self.height as f32 / (2.0 * half_fov.tan())
    }
}

fn rotate_x(angle: f32, p: Vec3) -> Vec3 {
    let (sin, cos) = angle.sin_cos();
    [p[0], cos * p[1] - sin * p[2], sin * p[1] + cos * p[2]]
}

fn rotate_y(angle: f32, p: Vec3) -> Vec3 {
    let (sin, cos) = angle.sin_cos();
    [cos * p[0] + sin * p[2], p[1], -sin * p[0] + cos * p[2]]
}
