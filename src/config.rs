//! Viewer configuration.
//!
//! Every section defaults to the values in [`crate::constants`]; a YAML file
//! only needs to list the keys it overrides.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::ConfigError;
use crate::lighting::{default_presets, LightIntensities};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AsciiConfig {
    pub default_scale: f32,
    pub min_scale: f32,
    pub max_scale: f32,
    pub base_density: usize,
    pub default_chars: String,
}

impl Default for AsciiConfig {
    fn default() -> Self {
        Self {
            default_scale: ASCII_DEFAULT_SCALE,
            min_scale: ASCII_MIN_SCALE,
            max_scale: ASCII_MAX_SCALE,
            base_density: ASCII_BASE_DENSITY,
            default_chars: ASCII_DEFAULT_CHARS.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub default_position: [f32; 3],
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: CAMERA_FOV,
            near: CAMERA_NEAR,
            far: CAMERA_FAR,
            default_position: CAMERA_DEFAULT_POSITION,
            min_distance: CAMERA_MIN_DISTANCE,
            max_distance: CAMERA_MAX_DISTANCE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    pub default_speed: f32,
    pub min_speed: f32,
    pub max_speed: f32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            default_speed: ANIMATION_DEFAULT_SPEED,
            min_speed: ANIMATION_MIN_SPEED,
            max_speed: ANIMATION_MAX_SPEED,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    pub default_speed: f32,
    pub min_speed: f32,
    pub max_speed: f32,
    pub damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_scale: f32,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            default_speed: ROTATION_DEFAULT_SPEED,
            min_speed: ROTATION_MIN_SPEED,
            max_speed: ROTATION_MAX_SPEED,
            damping: ROTATION_DAMPING,
            damping_factor: ROTATION_DAMPING_FACTOR,
            rotate_speed: ROTATION_ROTATE_SPEED,
            zoom_scale: ROTATION_ZOOM_SCALE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    pub presets: IndexMap<String, LightIntensities>,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            presets: default_presets(),
        }
    }
}

/// One entry of the model library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelEntry {
    pub name: String,
    pub path: PathBuf,
    #[serde(default = "default_scale_multiplier")]
    pub scale_multiplier: f32,
    #[serde(default)]
    pub preferred_animation: Option<String>,
}

fn default_scale_multiplier() -> f32 {
    UPLOAD_SCALE_MULTIPLIER
}

impl ModelEntry {
    pub fn new(name: &str, path: &str, scale_multiplier: f32, preferred: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            path: PathBuf::from(path),
            scale_multiplier,
            preferred_animation: preferred.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub library: Vec<ModelEntry>,
    pub desired_size: f32,
    pub upload_scale_multiplier: f32,
    pub max_upload_mb: u64,
    pub allowed_extensions: Vec<String>,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            library: vec![
                ModelEntry::new("duck", "./duck_walk.glb", 5.0, None),
                ModelEntry::new("rat", "./rat_animated.glb", 8.0, Some("Mammals|walk_A1")),
                ModelEntry::new("doge", "./dog_shiba.glb", 6.0, Some("0|shake_0")),
                ModelEntry::new("alien", "./alien.glb", 6.0, None),
            ],
            desired_size: MODEL_DESIRED_SIZE,
            upload_scale_multiplier: UPLOAD_SCALE_MULTIPLIER,
            max_upload_mb: UPLOAD_MAX_SIZE_MB,
            allowed_extensions: UPLOAD_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub theme: Theme,
    pub notification_duration_ms: u64,
    pub message_duration_ms: u64,
    pub resize_debounce_ms: u64,
    pub frame_interval_ms: u64,
    pub export_dir: PathBuf,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            theme: Theme::Dark,
            notification_duration_ms: NOTIFICATION_DURATION_MS,
            message_duration_ms: MESSAGE_DURATION_MS,
            resize_debounce_ms: RESIZE_DEBOUNCE_MS,
            frame_interval_ms: FRAME_INTERVAL_MS,
            export_dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ascii: AsciiConfig,
    pub camera: CameraConfig,
    pub animation: AnimationConfig,
    pub rotation: RotationConfig,
    pub lighting: LightingConfig,
    pub models: ModelsConfig,
    pub ui: UiConfig,
}

impl Config {
    /// Loads the config file at `path`, falling back to defaults when the
    /// file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::warn!("Config file not found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&contents).map_err(|err| match err {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;

        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml_ng::from_str(contents).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml_ng::Error> {
        serde_yaml_ng::to_string(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn range(name: &str, min: f32, default: f32, max: f32) -> Result<(), ConfigError> {
            if min <= default && default <= max {
                Ok(())
            } else {
                Err(ConfigError::Invalid(format!(
                    "{name}: expected {min} <= {default} <= {max}"
                )))
            }
        }

        let a = &self.ascii;
        range("ascii.default_scale", a.min_scale, a.default_scale, a.max_scale)?;
        if a.min_scale <= 0.0 {
            return Err(ConfigError::Invalid("ascii.min_scale must be positive".into()));
        }
        if a.default_chars.is_empty() || a.base_density == 0 {
            return Err(ConfigError::Invalid("ascii.default_chars must not be empty".into()));
        }

        let an = &self.animation;
        range("animation.default_speed", an.min_speed, an.default_speed, an.max_speed)?;
        let r = &self.rotation;
        range("rotation.default_speed", r.min_speed, r.default_speed, r.max_speed)?;

        let c = &self.camera;
        if !(c.near > 0.0 && c.near < c.far) {
            return Err(ConfigError::Invalid("camera: expected 0 < near < far".into()));
        }
        if !(c.min_distance > 0.0 && c.min_distance <= c.max_distance) {
            return Err(ConfigError::Invalid(
                "camera: expected 0 < min_distance <= max_distance".into(),
            ));
        }

        if self.models.library.is_empty() {
            return Err(ConfigError::Invalid("models.library must not be empty".into()));
        }
        if self.models.desired_size <= 0.0 {
            return Err(ConfigError::Invalid("models.desired_size must be positive".into()));
        }
        Ok(())
    }

    pub fn model_entry(&self, name: &str) -> Option<&ModelEntry> {
        self.models.library.iter().find(|entry| entry.name == name)
    }
}
