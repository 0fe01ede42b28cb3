//! No-op media prober for graceful degradation

use super::MediaProber;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// No-op prober used when ffmpeg/ffprobe are unavailable
///
/// Both probes answer `None`, so videos are still uploaded, just without a
/// thumbnail or an explicit duration. This keeps the publish pipeline working
/// on hosts without the media tools installed.
///
/// # Examples
///
/// ```
/// use subject_relay::probe::{MediaProber, NoOpMediaProber};
/// use std::path::Path;
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() {
/// let prober = NoOpMediaProber;
///
/// assert_eq!(prober.duration_secs(Path::new("lesson.mp4")).await, None);
/// assert_eq!(
///     prober.thumbnail(Path::new("lesson.mp4"), Duration::from_secs(10)).await,
///     None
/// );
/// # }
/// ```
pub struct NoOpMediaProber;

#[async_trait]
impl MediaProber for NoOpMediaProber {
    async fn duration_secs(&self, _video: &Path) -> Option<u32> {
        None
    }

    async fn thumbnail(&self, _video: &Path, _offset: Duration) -> Option<PathBuf> {
        None
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}
