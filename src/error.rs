//! Error types for subject-relay
//!
//! This module provides the error taxonomy for the library:
//! - Per-stage error types (manifest parsing, asset fetching, Telegram transport)
//! - A crate-wide `Result` alias
//! - Helpers for classifying flood-control waits and tolerable edit failures
//!
//! Per-line pipeline failures never escape the batch loop; they are converted
//! into failure counts at each stage boundary. These types exist so the stages
//! themselves can use `?` internally and report precise diagnostics.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for subject-relay operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for subject-relay
///
/// This is the primary error type used throughout the library. Each variant includes
/// contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "work_dir")
        key: Option<String>,
    },

    /// Manifest line could not be parsed
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// Asset download failed
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Telegram Bot API or transport error
    #[error("telegram error: {0}")]
    Telegram(#[from] TelegramError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Startup handshake with the platform failed on the retry as well
    #[error("startup failed after retry: {0}")]
    Startup(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Manifest parsing errors (per-line, non-fatal to a run)
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ManifestError {
    /// Line has no `:` separating the title part from the URL
    #[error("line {line} has no title/URL separator")]
    MissingSeparator {
        /// 1-based manifest line number
        line: usize,
    },
}

/// Asset fetch errors (external downloader subprocess)
#[derive(Debug, Error)]
pub enum FetchError {
    /// No downloader binary configured and none found on PATH
    #[error("no downloader binary available")]
    BinaryUnavailable,

    /// Failed to spawn the downloader process
    #[error("failed to run downloader: {0}")]
    Spawn(String),

    /// Downloader exited with a failure status
    #[error("downloader failed for {url} ({status}): {stderr}")]
    Failed {
        /// The URL that was being fetched
        url: String,
        /// Exit status description (code or signal)
        status: String,
        /// Captured stderr tail, empty if none
        stderr: String,
    },

    /// Downloader reported success but produced no file at the expected path
    #[error("downloader produced no file at {}", path.display())]
    MissingOutput {
        /// The path where the output file was expected
        path: PathBuf,
    },

    /// Downloader exceeded the configured time limit
    #[error("downloader timed out after {timeout:?} for {url}")]
    TimedOut {
        /// The URL that was being fetched
        url: String,
        /// The configured time limit
        timeout: Duration,
    },
}

/// Telegram Bot API errors
#[derive(Debug, Error)]
pub enum TelegramError {
    /// HTTP transport failure (connect, timeout, body read)
    #[error("transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The Bot API answered with `ok: false`
    #[error("API error {code}: {description}")]
    Api {
        /// Numeric `error_code` from the response
        code: i64,
        /// Human-readable `description` from the response
        description: String,
        /// Flood-control wait from `parameters.retry_after`, if signaled
        retry_after: Option<Duration>,
    },

    /// Response body did not match the expected shape
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl TelegramError {
    /// Flood-control wait duration, if the platform signaled one.
    ///
    /// A `Some` here is the "too many requests" condition: callers sleep for
    /// the returned duration and retry without consuming a retry attempt.
    pub fn flood_wait(&self) -> Option<Duration> {
        match self {
            TelegramError::Api {
                retry_after: Some(wait),
                ..
            } => Some(*wait),
            _ => None,
        }
    }

    /// Whether this is the "message is not modified" edit rejection.
    ///
    /// Editing a status message to its current text is harmless; callers
    /// treat this specific rejection as success.
    pub fn is_message_not_modified(&self) -> bool {
        matches!(
            self,
            TelegramError::Api { description, .. }
                if description.contains("message is not modified")
        )
    }
}
