//! TOML configuration for the classifier, camera, interaction and renderer.

use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid config value: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub gesture: GestureConfig,
    pub camera: CameraConfig,
    pub interaction: InteractionConfig,
    pub render: RenderConfig,
    pub graph: GraphConfig,
    pub capture: CaptureConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Thumb-tip to index-tip distance below which a hand pinches.
    pub pinch_threshold: f32,
    /// Mean wrist-to-fingertip distance below which a hand is a fist.
    pub fist_threshold: f32,
    /// Zoom ratios closer than this to 1.0 are snapped to exactly 1.0.
    pub zoom_snap_threshold: f32,
    /// Zoom events are only forwarded when the ratio deviates more than this.
    pub zoom_significance: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub eye: [f32; 3],
    pub fov_degrees: f32,
    pub default_zoom: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub near_epsilon: f32,
    pub viewport_width: u32,
    pub viewport_height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    pub drag_sensitivity: f32,
    pub rotate_sensitivity: f32,
    pub hit_radius_px: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub node_radius: i32,
    pub selected_radius: i32,
    pub draw_labels: bool,
    pub draw_skeleton: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub sample_nodes: usize,
    pub sample_radius: f32,
    pub seed: u64,
    pub layout_k: f32,
    pub layout_iterations: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub mirror: bool,
    pub camera_index: u32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            pinch_threshold: 0.05,
            fist_threshold: 0.15,
            zoom_snap_threshold: 0.1,
            zoom_significance: 0.05,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            eye: [0.0, 0.0, 8.0],
            fov_degrees: 60.0,
            default_zoom: 1.5,
            min_zoom: 0.2,
            max_zoom: 5.0,
            near_epsilon: 0.1,
            viewport_width: 640,
            viewport_height: 480,
        }
    }
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            drag_sensitivity: 100.0,
            rotate_sensitivity: 2.0,
            hit_radius_px: 50.0,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            node_radius: 8,
            selected_radius: 12,
            draw_labels: true,
            draw_skeleton: true,
        }
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            sample_nodes: 25,
            sample_radius: 0.4,
            seed: 42,
            layout_k: 2.0,
            layout_iterations: 100,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            mirror: true,
            camera_index: 0,
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let g = &self.gesture;
        for (name, value) in [
            ("pinch_threshold", g.pinch_threshold),
            ("fist_threshold", g.fist_threshold),
            ("zoom_snap_threshold", g.zoom_snap_threshold),
            ("zoom_significance", g.zoom_significance),
        ] {
            if !(value > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be > 0, got {value}"
                )));
            }
        }

        let c = &self.camera;
        if !(c.fov_degrees > 0.0 && c.fov_degrees < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "fov_degrees must be in (0, 180), got {}",
                c.fov_degrees
            )));
        }
        if !(c.min_zoom > 0.0) || c.min_zoom > c.max_zoom {
            return Err(ConfigError::Invalid(format!(
                "zoom range [{}, {}] is empty or non-positive",
                c.min_zoom, c.max_zoom
            )));
        }
        if !(c.min_zoom..=c.max_zoom).contains(&c.default_zoom) {
            return Err(ConfigError::Invalid(format!(
                "default_zoom {} outside [{}, {}]",
                c.default_zoom, c.min_zoom, c.max_zoom
            )));
        }
        if !(c.near_epsilon > 0.0) {
            return Err(ConfigError::Invalid("near_epsilon must be > 0".to_string()));
        }
        if c.viewport_width == 0 || c.viewport_height == 0 {
            return Err(ConfigError::Invalid(
                "viewport dimensions must be non-zero".to_string(),
            ));
        }

        if !(self.interaction.hit_radius_px > 0.0) {
            return Err(ConfigError::Invalid("hit_radius_px must be > 0".to_string()));
        }
        if self.graph.sample_nodes == 0 {
            return Err(ConfigError::Invalid("sample_nodes must be > 0".to_string()));
        }
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` when given, otherwise falls back to defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
