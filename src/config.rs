//! Viewer configuration
//!
//! Loaded once at startup from a JSON file. Every field has a default, so a
//! partial file (or none at all) is valid.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::controller::bindings::ActionMapConfig;
use crate::controller::input::InputSource;
use crate::model::camera::DEFAULT_FOV;
use crate::model::Material;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config '{0}': {1}")]
    Read(PathBuf, #[source] io::Error),

    #[error("failed to parse config '{0}': {1}")]
    Parse(PathBuf, #[source] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Multiplier on the camera's default field of view (authoring range 0..=2)
    pub fov_scale: f32,
    /// Degrees per unit of pan input (authoring range 0..=10)
    pub rotation_speed: f32,
    /// Field of view the camera starts with, before scaling
    pub base_fov: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov_scale: 0.5,
            rotation_speed: 1.0,
            base_fov: DEFAULT_FOV,
        }
    }
}

impl CameraSettings {
    /// Out-of-range values are kept as they are; this only reports them.
    pub fn range_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if !(0.0..=2.0).contains(&self.fov_scale) {
            warnings.push(format!("fov_scale {} is outside 0..=2", self.fov_scale));
        }
        if !(0.0..=10.0).contains(&self.rotation_speed) {
            warnings.push(format!("rotation_speed {} is outside 0..=10", self.rotation_speed));
        }
        warnings
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HudSettings {
    /// Show the orientation read-out
    pub enabled: bool,
}

impl Default for HudSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub input_source: InputSource,
    pub camera: CameraSettings,
    pub hud: HudSettings,
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub log_level: String,
    /// Materials offered by the swap buttons, in button order
    pub materials: Vec<Material>,
    pub bindings: ActionMapConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            input_source: InputSource::default(),
            camera: CameraSettings::default(),
            hud: HudSettings::default(),
            log_level: "info".to_string(),
            materials: Vec::new(),
            bindings: ActionMapConfig::default(),
        }
    }
}

/// Where a loaded config came from, reported once logging is up
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigOrigin {
    File(PathBuf),
    Defaults(PathBuf),
}

impl fmt::Display for ConfigOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigOrigin::File(path) => write!(f, "Loaded config from {:?}", path),
            ConfigOrigin::Defaults(path) => write!(f, "No config at {:?}, using defaults", path),
        }
    }
}

impl ViewerConfig {
    pub fn from_json(path: &Path, content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        Self::from_json(path, &content)
    }

    /// Defaults when the file does not exist; any other failure is returned
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<(Self, ConfigOrigin), ConfigError> {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => Ok((config, ConfigOrigin::File(path.to_path_buf()))),
            Err(ConfigError::Read(_, e)) if e.kind() == io::ErrorKind::NotFound => {
                Ok((Self::default(), ConfigOrigin::Defaults(path.to_path_buf())))
            }
            Err(e) => Err(e),
        }
    }
}
