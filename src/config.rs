//! Application configuration
//!
//! Loaded from `composer.toml` in the platform config directory; all fields
//! fall back to the defaults in [`crate::constants`].

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::*;
use crate::error::ConfigError;
use crate::layout::Corner;

const CONFIG_FILE: &str = "composer.toml";

/// Dimensions and frame rate for a capture or output surface
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct VideoConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

/// Picture-in-picture defaults
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PipConfig {
    /// Overlay size as percent of output width (1-100)
    pub size_pct: u8,
    pub corner: Corner,
}

/// Top-level application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub output: VideoConfig,
    pub pip: PipConfig,
    pub camera: VideoConfig,
    pub screen: VideoConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output: VideoConfig {
                width: OUTPUT_WIDTH,
                height: OUTPUT_HEIGHT,
                fps: OUTPUT_FPS,
            },
            pip: PipConfig {
                size_pct: DEFAULT_PIP_SIZE_PCT,
                corner: Corner::BottomRight,
            },
            camera: VideoConfig {
                width: CAMERA_WIDTH,
                height: CAMERA_HEIGHT,
                fps: CAPTURE_FPS,
            },
            screen: VideoConfig {
                width: SCREEN_WIDTH,
                height: SCREEN_HEIGHT,
                fps: CAPTURE_FPS,
            },
        }
    }
}

impl AppConfig {
    /// Path of the config file in the platform config directory
    pub fn path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "stream-composer").map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Load the config file, falling back to defaults when missing
    pub fn load() -> Result<Self, ConfigError> {
        let Some(path) = Self::path() else {
            return Ok(Self::default());
        };
        Self::load_from(&path)
    }

    /// Load config from an explicit path, defaults when the file is missing
    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Read(e.to_string()))?;
        toml::from_str(&raw).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Write the config to an explicit path, creating parent directories
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write(e.to_string()))?;
        }
        let raw = toml::to_string_pretty(self).map_err(|e| ConfigError::Write(e.to_string()))?;
        std::fs::write(path, raw).map_err(|e| ConfigError::Write(e.to_string()))
    }
}
