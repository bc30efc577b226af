use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analysis::histogram::DEFAULT_BIN_COUNT;
use crate::analysis::{AnalysisRequest, ViewMode};

pub const DEFAULT_CONFIG_PATH: &str = "rusty-mass.toml";

/// Request defaults applied before any user input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisDefaults {
    #[serde(default = "AnalysisDefaults::default_bins")]
    pub bins: i64,
    #[serde(default)]
    pub log_scale: bool,
    #[serde(default)]
    pub view_mode: ViewMode,
}

impl AnalysisDefaults {
    fn default_bins() -> i64 {
        DEFAULT_BIN_COUNT as i64
    }

    pub fn request(&self) -> AnalysisRequest {
        AnalysisRequest {
            bin_count: Some(self.bins),
            log_scale: self.log_scale,
            view_mode: self.view_mode,
            group_id: None,
        }
    }
}

impl Default for AnalysisDefaults {
    fn default() -> Self {
        Self {
            bins: Self::default_bins(),
            log_scale: false,
            view_mode: ViewMode::All,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "WindowConfig::default_width")]
    pub width: f32,
    #[serde(default = "WindowConfig::default_height")]
    pub height: f32,
}

impl WindowConfig {
    fn default_width() -> f32 {
        1200.0
    }
    fn default_height() -> f32 {
        800.0
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: Self::default_width(),
            height: Self::default_height(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub analysis: AnalysisDefaults,
    #[serde(default)]
    pub window: WindowConfig,
}

impl AppConfig {
    /// Read the TOML config at `path`. A missing file gives the defaults; an
    /// unreadable or invalid one is reported and also gives the defaults.
    pub fn load_or_default(path: &str) -> Self {
        let path_obj = Path::new(path);
        if !path_obj.exists() {
            log::debug!("no config at {path}, using defaults");
            return Self::default();
        }
        match fs::read_to_string(path_obj) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(cfg) => {
                    log::info!("loaded config from {path}");
                    cfg
                }
                Err(err) => {
                    log::warn!("Failed to parse config {path}: {err}. Using defaults.");
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!("Failed to read config {path}: {err}. Using defaults.");
                Self::default()
            }
        }
    }
}
