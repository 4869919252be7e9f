use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::composition::domain::trim_policy::{TrimError, TrimPolicy};
use crate::overlay::domain::overlay_spec::OverlaySpec;
use crate::shared::constants::{
    APP_DIR_NAME, ENCODER_QUEUE_CAPACITY, EXPORT_POLL_INTERVAL, INTERMEDIATE_FILE_NAME,
    OUTPUT_FILE_NAME, WRITER_POLL_INTERVAL,
};
use crate::video::domain::video_settings::EncoderConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Trim(#[from] TrimError),
    #[error("{0}")]
    Invalid(String),
}

/// Everything a compose job needs besides its input file.
///
/// Every field has a default, so a config file only lists what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    pub output_path: PathBuf,
    /// Re-encoded, video-only movie the final export reads from.
    pub intermediate_path: PathBuf,
    pub keep_intermediate: bool,
    /// `None` exports the whole movie.
    pub trim: Option<TrimPolicy>,
    pub video: EncoderConfig,
    pub overlay: OverlaySpec,
    pub writer_poll_interval_ms: u64,
    pub export_poll_interval_ms: u64,
    pub encoder_queue_capacity: usize,
}

impl Default for JobConfig {
    fn default() -> Self {
        let dir = Self::default_output_dir();
        Self {
            output_path: dir.join(OUTPUT_FILE_NAME),
            intermediate_path: dir.join(INTERMEDIATE_FILE_NAME),
            keep_intermediate: false,
            trim: Some(TrimPolicy::default()),
            video: EncoderConfig::default(),
            overlay: OverlaySpec::default(),
            writer_poll_interval_ms: WRITER_POLL_INTERVAL.as_millis() as u64,
            export_poll_interval_ms: EXPORT_POLL_INTERVAL.as_millis() as u64,
            encoder_queue_capacity: ENCODER_QUEUE_CAPACITY,
        }
    }
}

impl JobConfig {
    /// `<documents>/MovieMaker`, falling back to the home directory and
    /// then the working directory.
    pub fn default_output_dir() -> PathBuf {
        dirs::document_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR_NAME)
    }

    /// Per-user config file picked up when no explicit one is given.
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("config.json"))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&json).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// The user config when present and valid, otherwise defaults.
    pub fn load_or_default() -> Self {
        let Some(path) = Self::user_config_path().filter(|p| p.exists()) else {
            return Self::default();
        };
        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Ignoring user config: {e}");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |e| ConfigError::Write {
            path: path.to_path_buf(),
            source: e,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        fs::write(path, json).map_err(write_err)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(trim) = &self.trim {
            trim.validate()?;
        }
        if self.output_path == self.intermediate_path {
            return Err(ConfigError::Invalid(format!(
                "output and intermediate are the same file: {}",
                self.output_path.display()
            )));
        }
        if self.encoder_queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "encoder_queue_capacity must be at least 1".to_string(),
            ));
        }
        if self.overlay.font_size.is_nan() || self.overlay.font_size <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "font_size must be positive, got {}",
                self.overlay.font_size
            )));
        }
        if self.video.keyframe_interval_seconds.is_nan() || self.video.keyframe_interval_seconds <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "keyframe_interval_seconds must be positive, got {}",
                self.video.keyframe_interval_seconds
            )));
        }
        Ok(())
    }

    pub fn writer_poll_interval(&self) -> Duration {
        Duration::from_millis(self.writer_poll_interval_ms)
    }

    pub fn export_poll_interval(&self) -> Duration {
        Duration::from_millis(self.export_poll_interval_ms.max(1))
    }
}
