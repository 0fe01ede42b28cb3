//! Asset download via an external fetch utility
//!
//! This module provides a trait-based architecture for materializing a
//! manifest entry's URL as a local file. The actual transfer is delegated to
//! an external downloader binary invoked as a subprocess.
//!
//! ## Architecture
//!
//! The core abstraction is the [`AssetFetcher`] trait, which defines the
//! download interface:
//!
//! - [`CliAssetFetcher`]: Shells out to the configured downloader binary
//!   (`appxdl` by default, discovered on PATH)
//!
//! Tests substitute their own implementations to exercise the pipeline
//! without network access.
//!
//! ## Usage
//!
//! ```no_run
//! use subject_relay::fetch::{AssetFetcher, CliAssetFetcher};
//! use std::path::PathBuf;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let fetcher = CliAssetFetcher::new(
//!         PathBuf::from("/usr/local/bin/appxdl"),
//!         PathBuf::from("./downloads"),
//!     );
//!
//!     let path = fetcher.fetch("http://host/lesson.mp4", "Algebra Lesson 1").await?;
//!     println!("saved to {}", path.display());
//!     Ok(())
//! }
//! ```

mod cli;

pub use cli::CliAssetFetcher;

use async_trait::async_trait;
use std::path::PathBuf;

/// Trait for downloading a remote asset to the local work directory
///
/// Implementations must guarantee that a failed fetch leaves no partial file
/// behind at the output path.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    /// Download `url` into the work directory under `base_name`
    ///
    /// The file extension is chosen by inspecting the URL: a `.pdf` marker
    /// (case-insensitive substring) selects `.pdf`, everything else is
    /// treated as video and saved as `.mp4`.
    ///
    /// # Returns
    ///
    /// The path of the downloaded file.
    ///
    /// # Errors
    ///
    /// Returns an error if the downloader cannot be spawned, exits with a
    /// failure status, exceeds the configured time limit, or reports success
    /// without producing the output file. Any partially-written file at the
    /// output path is removed before the error is returned.
    async fn fetch(&self, url: &str, base_name: &str) -> crate::Result<PathBuf>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
