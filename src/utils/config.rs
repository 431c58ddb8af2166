//! Application configuration module.
//!
//! Configuration is loaded from a JSON file. Every field has a default, so a
//! partial file only needs to name the settings it changes.

use super::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::inference::cascade::CascadeConfig;

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "config/app_config.json";

/// Detector post-processing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Minimum detector score for a box to be kept
    pub score_threshold: f32,

    /// IoU above which overlapping boxes of the same class are suppressed
    pub iou_threshold: f32,

    /// Square input resolution expected by the detector
    pub input_size: u32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            score_threshold: 0.2,
            iou_threshold: 0.2,
            input_size: 1024,
        }
    }
}

/// Settings for the built-in layout analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Detector class indices that represent individual text lines
    pub line_classes: Vec<usize>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            line_classes: vec![1, 2, 3, 4, 5],
        }
    }
}

/// Application configuration structure.
///
/// String fields use `Box<str>` since they are set once and never modified.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Address the HTTP server binds to
    pub host_url: Box<str>,

    /// Directory path for model files
    pub model_directory: Box<str>,

    /// Detector model file, relative to `model_directory`
    pub detector_model: Box<str>,

    /// Cheapest recognizer tier model file
    pub recognizer_small_model: Box<str>,

    /// Middle recognizer tier model file
    pub recognizer_medium_model: Box<str>,

    /// Highest-capacity recognizer tier model file
    pub recognizer_large_model: Box<str>,

    /// YAML file listing the recognizer alphabet under `model.charset_train`
    pub charset_file: Box<str>,

    /// Recognition worker threads; `None` uses the available parallelism
    pub worker_threads: Option<usize>,

    /// ONNX sessions created per model
    pub inference_pool_size: usize,

    /// Maximum decoded image size in bytes
    pub max_image_size: usize,

    /// Maximum request body size in bytes
    pub max_body_size: usize,

    /// Maximum number of pixels in a submitted image
    pub max_pixels: u64,

    /// Maximum number of jobs that are not yet completed or failed
    pub max_queued_jobs: usize,

    /// Maximum number of jobs executing at the same time
    pub max_concurrent_jobs: usize,

    /// Seconds a finished job is kept before eviction; `None` keeps it forever
    pub job_retention_secs: Option<u64>,

    pub cascade: CascadeConfig,

    pub detection: DetectionConfig,

    pub layout: LayoutConfig,
}

impl AppConfig {
    /// Load configuration from a JSON file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration JSON file
    ///
    /// # Returns
    ///
    /// Returns the parsed `AppConfig` or a `ConfigError` if loading fails.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from `path`, falling back to defaults when the file
    /// does not exist. A file that exists but cannot be parsed is an error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::info!(
                "No configuration file at {}, using defaults",
                path.display()
            );
            Ok(Self::default())
        }
    }

    /// Create a new configuration with default values.
    #[must_use]
    pub fn default_config() -> Self {
        Self {
            host_url: "0.0.0.0:8000".into(),
            model_directory: "models".into(),
            detector_model: "deim-s-1024x1024.onnx".into(),
            recognizer_small_model: "parseq-ndl-16x256-30-tiny-192epoch-tegaki3.onnx".into(),
            recognizer_medium_model: "parseq-ndl-16x384-50-tiny-146epoch-tegaki2.onnx".into(),
            recognizer_large_model: "parseq-ndl-16x768-100-tiny-165epoch-tegaki2.onnx".into(),
            charset_file: "NDLmoji.yaml".into(),
            worker_threads: None,
            inference_pool_size: 2,
            max_image_size: 10 * 1024 * 1024,
            max_body_size: 15 * 1024 * 1024,
            max_pixels: 100_000_000,
            max_queued_jobs: 256,
            max_concurrent_jobs: 2,
            job_retention_secs: Some(3600),
            cascade: CascadeConfig::default(),
            detection: DetectionConfig::default(),
            layout: LayoutConfig::default(),
        }
    }

    /// Get the path to a model file within the model directory.
    #[must_use]
    pub fn model_path(&self, relative_path: &str) -> PathBuf {
        Path::new(&*self.model_directory).join(relative_path)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::default_config()
    }
}
