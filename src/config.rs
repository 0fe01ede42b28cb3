//! Configuration types for subject-relay

use crate::types::UserId;
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// Telegram Bot API connection settings
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token issued by BotFather
    #[serde(default)]
    pub bot_token: String,

    /// Bot API base URL (default: "https://api.telegram.org")
    ///
    /// Overridable for self-hosted Bot API servers and for tests.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Long-poll timeout for getUpdates (default: 30 seconds)
    #[serde(default = "default_poll_timeout", with = "duration_serde")]
    pub poll_timeout: Duration,

    /// Per-request timeout for small API calls (default: 45 seconds)
    ///
    /// Media uploads are exempt; they run without a client-side deadline.
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            api_base: default_api_base(),
            poll_timeout: default_poll_timeout(),
            request_timeout: default_request_timeout(),
        }
    }
}

/// Operator allow-list
///
/// Used as a flattened sub-config within [`Config`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AccessConfig {
    /// User ids permitted to upload manifests and answer prompts
    ///
    /// An empty list disables the gate entirely (everyone is permitted).
    #[serde(default)]
    pub allowed_user_ids: Vec<UserId>,
}

impl AccessConfig {
    /// Whether the given user may upload manifests and drive conversations
    pub fn is_allowed(&self, user: UserId) -> bool {
        self.allowed_user_ids.is_empty() || self.allowed_user_ids.contains(&user)
    }
}

/// Asset fetching behavior (work directory, retry pacing)
///
/// Used as a flattened sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Directory for fetched assets and ingested manifests (default: "./downloads")
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    /// Time limit for one downloader invocation (None = no limit)
    #[serde(default, with = "optional_duration_serde")]
    pub fetch_timeout: Option<Duration>,

    /// Wait between the first failed fetch and its single retry (default: 2 seconds)
    #[serde(default = "default_fetch_retry_delay", with = "duration_serde")]
    pub fetch_retry_delay: Duration,

    /// Pause between manifest lines (default: 2 seconds)
    #[serde(default = "default_inter_item_delay", with = "duration_serde")]
    pub inter_item_delay: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
            fetch_timeout: None,
            fetch_retry_delay: default_fetch_retry_delay(),
            inter_item_delay: default_inter_item_delay(),
        }
    }
}

/// External tool paths (downloader, ffmpeg, ffprobe)
///
/// Used as a flattened sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Path to the downloader executable (auto-detected if None)
    #[serde(default)]
    pub downloader_path: Option<PathBuf>,

    /// Binary name searched on PATH when no explicit path is set (default: "appxdl")
    #[serde(default = "default_downloader_name")]
    pub downloader_name: String,

    /// Path to the ffmpeg executable (auto-detected if None)
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    /// Path to the ffprobe executable (auto-detected if None)
    #[serde(default)]
    pub ffprobe_path: Option<PathBuf>,

    /// Whether to search PATH for external binaries if explicit paths not set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,

    /// Time limit for one probe invocation (default: 30 seconds)
    #[serde(default = "default_probe_timeout", with = "duration_serde")]
    pub probe_timeout: Duration,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            downloader_path: None,
            downloader_name: default_downloader_name(),
            ffmpeg_path: None,
            ffprobe_path: None,
            search_path: true,
            probe_timeout: default_probe_timeout(),
        }
    }
}

/// Publishing behavior (upload retries, thumbnail extraction)
///
/// Used as a flattened sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Retry policy for upload attempts
    #[serde(default)]
    pub retry: RetryConfig,

    /// Timestamp the video thumbnail is taken at (default: 10 seconds)
    #[serde(default = "default_thumbnail_offset", with = "duration_serde")]
    pub thumbnail_offset: Duration,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            thumbnail_offset: default_thumbnail_offset(),
        }
    }
}

/// Main configuration for SubjectRelay
///
/// Fields are organized into logical sub-configs:
/// - [`telegram`](TelegramConfig) — Bot API connection
/// - [`access`](AccessConfig) — operator allow-list
/// - [`fetch`](FetchConfig) — work directory and retry pacing
/// - [`tools`](ToolsConfig) — external binary paths
/// - [`publish`](PublishConfig) — upload retries and thumbnails
///
/// All sub-configs except `telegram` are flattened for a flat JSON/TOML
/// serialization format.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Bot API connection settings
    pub telegram: TelegramConfig,

    /// Operator allow-list
    #[serde(flatten)]
    pub access: AccessConfig,

    /// Asset fetching behavior
    #[serde(flatten)]
    pub fetch: FetchConfig,

    /// External tool paths
    #[serde(flatten)]
    pub tools: ToolsConfig,

    /// Publishing behavior
    #[serde(flatten)]
    pub publish: PublishConfig,
}

// Convenience accessors — delegate to the sub-config structs.
impl Config {
    /// Work directory for fetched assets and ingested manifests
    pub fn work_dir(&self) -> &PathBuf {
        &self.fetch.work_dir
    }
}

/// Retry configuration for upload attempts
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum attempts per upload (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay after the first failed attempt (default: 1 second)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between attempts (default: 60 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: false, keeping the schedule deterministic)
    #[serde(default)]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            backoff_multiplier: 2.0,
            jitter: false,
        }
    }
}

// -----------------------------------------------------------------------
// Serde default helpers
// -----------------------------------------------------------------------

fn default_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(45)
}

fn default_work_dir() -> PathBuf {
    PathBuf::from("./downloads")
}

fn default_fetch_retry_delay() -> Duration {
    Duration::from_secs(2)
}

fn default_inter_item_delay() -> Duration {
    Duration::from_secs(2)
}

fn default_downloader_name() -> String {
    "appxdl".to_string()
}

fn default_probe_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_thumbnail_offset() -> Duration {
    Duration::from_secs(10)
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(60)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}

// Duration serialization helper (seconds as u64)
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

// Optional Duration serialization helper
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}
