//! CLI-based media prober using external ffprobe/ffmpeg binaries

use super::MediaProber;
use crate::config::ToolsConfig;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

/// Media prober that shells out to `ffprobe` and `ffmpeg`
///
/// Both operations run under a time limit so a wedged probe can never stall
/// the run loop. All failures are logged and reported as `None`.
pub struct CliMediaProber {
    ffmpeg_path: PathBuf,
    ffprobe_path: PathBuf,
    timeout: Duration,
}

impl CliMediaProber {
    /// Default time limit for one probe invocation
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Create a new prober with explicit binary paths
    pub fn new(ffmpeg_path: PathBuf, ffprobe_path: PathBuf) -> Self {
        Self {
            ffmpeg_path,
            ffprobe_path,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Set the time limit for one probe invocation
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Attempt to find both binaries in PATH
    ///
    /// # Returns
    ///
    /// `Some(CliMediaProber)` if `ffmpeg` and `ffprobe` are both found,
    /// `None` otherwise.
    pub fn discover() -> Option<Self> {
        let ffmpeg = which::which("ffmpeg").ok()?;
        let ffprobe = which::which("ffprobe").ok()?;
        Some(Self::new(ffmpeg, ffprobe))
    }

    /// Build a prober from configuration
    ///
    /// Explicit paths win; missing ones are searched on PATH when
    /// `search_path` is enabled. Returns `None` when either binary cannot be
    /// resolved, in which case callers fall back to
    /// [`NoOpMediaProber`](super::NoOpMediaProber).
    pub fn from_config(tools: &ToolsConfig) -> Option<Self> {
        let ffmpeg_path = resolve_binary(&tools.ffmpeg_path, "ffmpeg", tools.search_path)?;
        let ffprobe_path = resolve_binary(&tools.ffprobe_path, "ffprobe", tools.search_path)?;
        Some(Self {
            ffmpeg_path,
            ffprobe_path,
            timeout: tools.probe_timeout,
        })
    }

    async fn run(&self, command: &mut Command) -> Option<std::process::Output> {
        command.kill_on_drop(true);
        match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => Some(output),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "probe process failed to run");
                None
            }
            Err(_) => {
                tracing::warn!(timeout = ?self.timeout, "probe timed out");
                None
            }
        }
    }
}

fn resolve_binary(explicit: &Option<PathBuf>, name: &str, search_path: bool) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.clone()),
        None if search_path => which::which(name).ok(),
        None => None,
    }
}

/// Format an offset as the `HH:MM:SS` timestamp ffmpeg expects
fn format_timestamp(offset: Duration) -> String {
    let total = offset.as_secs();
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

/// Thumbnail path for a video: the full video filename plus a `.jpg` suffix
fn thumbnail_path(video: &Path) -> PathBuf {
    let mut name = video.as_os_str().to_owned();
    name.push(".jpg");
    PathBuf::from(name)
}

#[async_trait]
impl MediaProber for CliMediaProber {
    async fn duration_secs(&self, video: &Path) -> Option<u32> {
        let mut command = Command::new(&self.ffprobe_path);
        command
            .arg("-v")
            .arg("error")
            .arg("-show_entries")
            .arg("format=duration")
            .arg("-of")
            .arg("default=noprint_wrappers=1:nokey=1")
            .arg(video);

        let output = self.run(&mut command).await?;
        if !output.status.success() {
            tracing::warn!(
                video = %video.display(),
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "duration probe failed"
            );
            return None;
        }

        let text = String::from_utf8_lossy(&output.stdout);
        match text.trim().parse::<f64>() {
            Ok(seconds) if seconds.is_finite() && seconds >= 0.0 => Some(seconds as u32),
            _ => {
                tracing::warn!(
                    video = %video.display(),
                    output = %text.trim(),
                    "duration probe produced unparseable output"
                );
                None
            }
        }
    }

    async fn thumbnail(&self, video: &Path, offset: Duration) -> Option<PathBuf> {
        let thumb = thumbnail_path(video);

        let mut command = Command::new(&self.ffmpeg_path);
        command
            .arg("-i")
            .arg(video)
            .arg("-ss")
            .arg(format_timestamp(offset))
            .arg("-vframes")
            .arg("1")
            .arg("-y")
            .arg(&thumb);

        let ran = self.run(&mut command).await.is_some();

        // Success is judged by the output file, not the exit status: ffmpeg
        // can exit non-zero after writing a usable frame
        match tokio::fs::metadata(&thumb).await {
            Ok(_) if ran => Some(thumb),
            _ => {
                let _ = tokio::fs::remove_file(&thumb).await;
                None
            }
        }
    }

    fn name(&self) -> &'static str {
        "cli-ffmpeg"
    }
}
