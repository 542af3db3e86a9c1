//! Configuration types for upscale-batch

use crate::error::{Error, Result};
use crate::types::UpscaleMethod;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Remote transformation service endpoints
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the service (default: "http://localhost:8000")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path of the single-item endpoint (default: "/api/process")
    #[serde(default = "default_process_path")]
    pub process_path: String,

    /// Path of the multi-item endpoint (default: "/api/process-multiple")
    #[serde(default = "default_process_multiple_path")]
    pub process_multiple_path: String,

    /// Whether the `ai` upscale method may be requested (default: false)
    #[serde(default)]
    pub ai_enabled: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            process_path: default_process_path(),
            process_multiple_path: default_process_multiple_path(),
            ai_enabled: false,
        }
    }
}

/// How per-item limit violations are handled
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionPolicy {
    /// Any violating item rejects the whole submission before processing starts
    #[default]
    RejectOnSubmit,
    /// Violating items are recorded as failures while the rest of the batch runs
    IsolateOnProcess,
}

/// Submission limits
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum items per batch (default: 8)
    #[serde(default = "default_max_items")]
    pub max_items: usize,

    /// Maximum size of one item in bytes (default: 50 MiB)
    #[serde(default = "default_max_item_bytes")]
    pub max_item_bytes: u64,

    /// Per-item violation handling (default: reject_on_submit)
    #[serde(default)]
    pub submission: SubmissionPolicy,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_items: default_max_items(),
            max_item_bytes: default_max_item_bytes(),
            submission: SubmissionPolicy::default(),
        }
    }
}

/// Per-item deadlines, by upscale method
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Deadline for the simple method (default: 30 seconds)
    #[serde(default = "default_simple_timeout", with = "duration_serde")]
    pub simple: Duration,

    /// Deadline for the AI method (default: 120 seconds)
    #[serde(default = "default_ai_timeout", with = "duration_serde")]
    pub ai: Duration,
}

impl TimeoutConfig {
    /// Deadline for one item processed with `method`
    pub fn for_method(&self, method: UpscaleMethod) -> Duration {
        match method {
            UpscaleMethod::Simple => self.simple,
            UpscaleMethod::Ai => self.ai,
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            simple: default_simple_timeout(),
            ai: default_ai_timeout(),
        }
    }
}

/// What to do when two successful items share a filename
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCollisionAction {
    /// Add " (1)", " (2)", etc. before the extension of later duplicates
    #[default]
    Rename,
    /// Keep only the last payload for a name
    Overwrite,
    /// Refuse the submission before processing
    Reject,
}

/// Compression used for archive entries
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveCompression {
    /// Deflate (default)
    #[default]
    Deflated,
    /// No compression
    Stored,
}

/// Archive output settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Archive filename (default: "processed_images.zip")
    #[serde(default = "default_archive_filename")]
    pub filename: String,

    /// Filename collision handling (default: rename)
    #[serde(default)]
    pub collision: FileCollisionAction,

    /// Entry compression (default: deflated)
    #[serde(default)]
    pub compression: ArchiveCompression,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            filename: default_archive_filename(),
            collision: FileCollisionAction::default(),
            compression: ArchiveCompression::default(),
        }
    }
}

/// Main configuration for [`BatchOrchestrator`](crate::BatchOrchestrator)
///
/// Fields are grouped into sub-configs:
/// - [`service`](ServiceConfig) - endpoints and method availability
/// - [`limits`](LimitsConfig) - count/size limits and violation policy
/// - [`timeouts`](TimeoutConfig) - per-method deadlines
/// - [`archive`](ArchiveConfig) - archive naming and collision handling
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote service settings
    #[serde(default)]
    pub service: ServiceConfig,

    /// Submission limits
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Per-item deadlines
    #[serde(default)]
    pub timeouts: TimeoutConfig,

    /// Archive settings
    #[serde(default)]
    pub archive: ArchiveConfig,
}

impl Config {
    /// Check the configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.service.base_url.trim().is_empty() {
            return Err(config_error("base URL must not be empty", "service.base_url"));
        }
        if let Err(e) = url::Url::parse(&self.service.base_url) {
            return Err(config_error(
                format!("invalid base URL {:?}: {}", self.service.base_url, e),
                "service.base_url",
            ));
        }
        if self.limits.max_items == 0 {
            return Err(config_error("must allow at least one item", "limits.max_items"));
        }
        if self.limits.max_item_bytes == 0 {
            return Err(config_error(
                "must allow at least one byte per item",
                "limits.max_item_bytes",
            ));
        }
        if self.timeouts.simple.is_zero() {
            return Err(config_error("timeout must be non-zero", "timeouts.simple"));
        }
        if self.timeouts.ai.is_zero() {
            return Err(config_error("timeout must be non-zero", "timeouts.ai"));
        }
        if self.archive.filename.trim().is_empty() {
            return Err(config_error(
                "archive filename must not be empty",
                "archive.filename",
            ));
        }
        if !crate::utils::is_plain_file_name(&self.archive.filename) {
            return Err(config_error(
                format!(
                    "archive filename {:?} must be a plain file name",
                    self.archive.filename
                ),
                "archive.filename",
            ));
        }
        Ok(())
    }
}

fn config_error(message: impl Into<String>, key: &str) -> Error {
    Error::Config {
        message: message.into(),
        key: Some(key.to_string()),
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_process_path() -> String {
    "/api/process".to_string()
}

fn default_process_multiple_path() -> String {
    "/api/process-multiple".to_string()
}

fn default_max_items() -> usize {
    8
}

fn default_max_item_bytes() -> u64 {
    50 * 1024 * 1024
}

fn default_simple_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_ai_timeout() -> Duration {
    Duration::from_secs(120)
}

fn default_archive_filename() -> String {
    "processed_images.zip".to_string()
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
