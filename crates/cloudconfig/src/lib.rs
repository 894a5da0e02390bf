//! Rendering parameters for the cloud background.
//!
//! `CloudConfig` is read once at start-up and never mutated afterwards. Every
//! field has a default, so an empty document is a valid configuration. Keys
//! are written in snake_case; the camelCase option names used by web embeds
//! (`canvasId`, `targetDPR`, `windDir`, ...) are accepted as aliases.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to parse JSON configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to read configuration at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Default identifier of the drawable surface.
pub const DEFAULT_CANVAS_ID: &str = "clouds";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CloudConfig {
    /// Identifier of the target drawable surface.
    #[serde(alias = "canvasId")]
    pub canvas_id: String,
    /// Cap applied to the device pixel ratio before sizing the backing store.
    #[serde(alias = "targetDPR", alias = "targetDpr")]
    pub target_dpr: f32,
    /// Multiplier applied after the DPR cap; trades resolution for speed.
    #[serde(alias = "renderScale")]
    pub render_scale: f32,
    pub coverage: f32,
    pub density: f32,
    pub thickness: f32,
    /// Noise feature scale.
    pub scale: f32,
    #[serde(alias = "lightAbsorption")]
    pub light_absorption: f32,
    #[serde(alias = "windSpeed")]
    pub wind_speed: f32,
    /// Drift direction; normalised before it reaches the shader.
    #[serde(alias = "windDir")]
    pub wind_dir: [f32; 2],
    #[serde(alias = "sunColor")]
    pub sun_color: [f32; 3],
    /// Frame-rate cap; `0` renders on every refresh.
    #[serde(alias = "targetFPS", alias = "targetFps")]
    pub target_fps: f32,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            canvas_id: DEFAULT_CANVAS_ID.to_string(),
            target_dpr: 1.0,
            render_scale: 0.66,
            coverage: 0.55,
            density: 0.9,
            thickness: 1.2,
            scale: 0.3,
            light_absorption: 1.5,
            wind_speed: 0.006,
            wind_dir: [0.7, 0.2],
            sun_color: [1.0, 0.97, 0.92],
            target_fps: 0.0,
        }
    }
}

impl CloudConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: CloudConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        let raw: CloudConfig = serde_json::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    /// Loads a configuration file, picking JSON for `.json` paths and TOML
    /// for everything else.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&contents)
        } else {
            Self::from_toml_str(&contents)
        }
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Minimum spacing between accepted frames, if a frame-rate cap is set.
    pub fn min_frame_time(&self) -> Option<f64> {
        if self.target_fps > 0.0 {
            Some(1.0 / f64::from(self.target_fps))
        } else {
            None
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.canvas_id.trim().is_empty() {
            return Err(ConfigError::Invalid("canvas_id must not be empty".into()));
        }

        let scalars = [
            ("target_dpr", self.target_dpr),
            ("render_scale", self.render_scale),
            ("coverage", self.coverage),
            ("density", self.density),
            ("thickness", self.thickness),
            ("scale", self.scale),
            ("light_absorption", self.light_absorption),
            ("wind_speed", self.wind_speed),
            ("target_fps", self.target_fps),
        ];
        for (name, value) in scalars {
            if !value.is_finite() {
                return Err(ConfigError::Invalid(format!("{name} must be a finite number")));
            }
        }
        if self
            .wind_dir
            .iter()
            .chain(self.sun_color.iter())
            .any(|component| !component.is_finite())
        {
            return Err(ConfigError::Invalid(
                "wind_dir and sun_color components must be finite numbers".into(),
            ));
        }

        if self.target_dpr <= 0.0 {
            return Err(ConfigError::Invalid("target_dpr must be > 0".into()));
        }
        if self.render_scale <= 0.0 {
            return Err(ConfigError::Invalid("render_scale must be > 0".into()));
        }
        if self.wind_speed < 0.0 {
            return Err(ConfigError::Invalid("wind_speed must be >= 0".into()));
        }
        if self.target_fps < 0.0 {
            return Err(ConfigError::Invalid("target_fps must be >= 0".into()));
        }

        Ok(())
    }
}
