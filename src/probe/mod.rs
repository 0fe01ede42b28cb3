//! Media probing for video uploads
//!
//! This module provides a trait-based architecture for the two best-effort
//! enrichment steps the video publish path uses: a duration probe and a
//! single-frame thumbnail extraction. Both are delegated to external binaries
//! (`ffprobe` and `ffmpeg`).
//!
//! ## Architecture
//!
//! The core abstraction is the [`MediaProber`] trait:
//!
//! - [`CliMediaProber`]: Uses external `ffprobe`/`ffmpeg` binaries
//! - [`NoOpMediaProber`]: Stub when the binaries are unavailable
//!
//! Probes are best-effort by contract: every failure mode (missing binary,
//! crash, timeout, unparseable output) yields `None`, and the publisher sends
//! the video without the missing field. No probe failure ever fails an upload.
//!
//! ## Usage
//!
//! ```no_run
//! use subject_relay::probe::{CliMediaProber, MediaProber};
//! use std::path::Path;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let prober = CliMediaProber::discover().expect("ffmpeg/ffprobe not found");
//!
//!     let duration = prober.duration_secs(Path::new("lesson.mp4")).await;
//!     let thumb = prober
//!         .thumbnail(Path::new("lesson.mp4"), Duration::from_secs(10))
//!         .await;
//!     println!("duration={duration:?} thumb={thumb:?}");
//! }
//! ```

mod cli;
mod noop;

pub use cli::CliMediaProber;
pub use noop::NoOpMediaProber;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Trait for best-effort video probing
#[async_trait]
pub trait MediaProber: Send + Sync {
    /// Video duration in whole seconds, or `None` if probing fails
    async fn duration_secs(&self, video: &Path) -> Option<u32>;

    /// Extract a single frame at `offset` into a `.jpg` next to the video
    ///
    /// Returns the thumbnail path, or `None` if extraction fails. The caller
    /// owns the returned file and is responsible for deleting it.
    async fn thumbnail(&self, video: &Path, offset: Duration) -> Option<PathBuf>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
