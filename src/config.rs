//! Carousel configuration.
//!
//! Values are layered: built-in defaults, then an optional JSON file, then
//! command-line flags. Every field is optional in the file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Args;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::asset::AssetRef;
use crate::carousel::Timing;
use crate::constants::*;
use crate::discovery::DiscoveryParams;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid value for `{field}`: {message}")]
    Invalid { field: &'static str, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarouselConfig {
    /// Explicit assets, comma separated, shown before discovered ones.
    #[serde(default)]
    pub images: String,

    #[serde(default = "default_max_index")]
    pub max_index: u32,

    /// Candidate extensions in priority order.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    #[serde(default = "default_base_path")]
    pub base_path: String,

    /// Shown when neither configuration nor discovery yields anything.
    #[serde(default = "default_fallback")]
    pub fallback: String,

    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Should not exceed the fade the renderer itself applies.
    #[serde(default = "default_fade_ms")]
    pub fade_ms: u64,

    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            images: String::new(),
            max_index: default_max_index(),
            extensions: default_extensions(),
            base_path: default_base_path(),
            fallback: default_fallback(),
            interval_ms: default_interval_ms(),
            fade_ms: default_fade_ms(),
            probe_timeout_ms: default_probe_timeout_ms(),
        }
    }
}

/// Command-line flags. Each one that is set replaces the file or default value.
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    /// Comma separated assets shown before discovered ones
    #[arg(long)]
    pub images: Option<String>,

    /// Highest candidate index probed
    #[arg(long)]
    pub max_index: Option<u32>,

    /// Candidate extensions in priority order
    #[arg(long, value_delimiter = ',')]
    pub extensions: Option<Vec<String>>,

    /// Prefix of constructed candidates, relative to the root
    #[arg(long)]
    pub base_path: Option<String>,

    /// Asset shown when nothing else is available
    #[arg(long)]
    pub fallback: Option<String>,

    /// Auto-advance period in milliseconds
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Fade duration in milliseconds
    #[arg(long)]
    pub fade_ms: Option<u64>,

    /// Per-probe timeout in milliseconds
    #[arg(long)]
    pub probe_timeout_ms: Option<u64>,
}

impl ConfigOverrides {
    pub fn apply(&self, config: &mut CarouselConfig) {
        if let Some(images) = &self.images {
            config.images = images.clone();
        }
        if let Some(max_index) = self.max_index {
            config.max_index = max_index;
        }
        if let Some(extensions) = &self.extensions {
            config.extensions = extensions.clone();
        }
        if let Some(base_path) = &self.base_path {
            config.base_path = base_path.clone();
        }
        if let Some(fallback) = &self.fallback {
            config.fallback = fallback.clone();
        }
        if let Some(interval_ms) = self.interval_ms {
            config.interval_ms = interval_ms;
        }
        if let Some(fade_ms) = self.fade_ms {
            config.fade_ms = fade_ms;
        }
        if let Some(probe_timeout_ms) = self.probe_timeout_ms {
            config.probe_timeout_ms = probe_timeout_ms;
        }
    }
}

impl CarouselConfig {
    /// Defaults, then `file` if given, then `overrides`. The result is validated.
    pub fn layered(file: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        let mut config = match file {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        overrides.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "interval_ms",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.max_index > MAX_INDEX_LIMIT {
            return Err(ConfigError::Invalid {
                field: "max_index",
                message: format!("must not exceed {MAX_INDEX_LIMIT}"),
            });
        }
        if self.normalized_extensions().is_empty() {
            return Err(ConfigError::Invalid {
                field: "extensions",
                message: "at least one extension is required".to_string(),
            });
        }
        if self.probe_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "probe_timeout_ms",
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn configured_assets(&self) -> Vec<AssetRef> {
        parse_image_list(&self.images)
    }

    pub fn fallback_asset(&self) -> AssetRef {
        AssetRef::new(self.fallback.clone())
    }

    pub fn discovery_params(&self) -> DiscoveryParams {
        DiscoveryParams {
            max_index: self.max_index,
            extensions: self.normalized_extensions(),
            base_path: self.base_path.clone(),
            probe_timeout: self.probe_timeout(),
        }
    }

    // Trimmed, leading dots stripped, blanks dropped.
    fn normalized_extensions(&self) -> Vec<String> {
        self.extensions
            .iter()
            .map(|e| e.trim().trim_start_matches('.').to_string())
            .filter(|e| !e.is_empty())
            .collect()
    }

    pub fn timing(&self) -> Timing {
        Timing::new(
            Duration::from_millis(self.interval_ms),
            Duration::from_millis(self.fade_ms),
        )
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

/// Splits a comma separated list, trimming entries and dropping blank ones.
pub fn parse_image_list(raw: &str) -> Vec<AssetRef> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(AssetRef::from)
        .collect()
}

fn default_max_index() -> u32 {
    MAX_CANDIDATE_INDEX
}

fn default_extensions() -> Vec<String> {
    CANDIDATE_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

fn default_base_path() -> String {
    BASE_PATH.to_string()
}

fn default_fallback() -> String {
    FALLBACK_ASSET.to_string()
}

fn default_interval_ms() -> u64 {
    INTERVAL_MS
}

fn default_fade_ms() -> u64 {
    FADE_MS
}

fn default_probe_timeout_ms() -> u64 {
    PROBE_TIMEOUT_MS
}
