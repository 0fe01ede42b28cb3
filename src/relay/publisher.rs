//! Media delivery with retry, probing and thumbnail hygiene
//!
//! One publisher instance serves a whole run. Videos are enriched per attempt:
//! the duration and thumbnail probes run freshly before every send, and the
//! extracted thumbnail is removed again no matter how the send went. Documents
//! skip the probes. Either path goes through the shared retry loop, so flood
//! pauses and transient failures are handled identically for both kinds.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::config::{PublishConfig, RetryConfig};
use crate::probe::MediaProber;
use crate::retry::send_with_retry;
use crate::telegram::{DocumentUpload, Messenger, VideoUpload};
use crate::types::{ChatId, TopicId};

/// Sends fetched assets to the destination channel.
pub(crate) struct Publisher {
    messenger: Arc<dyn Messenger>,
    prober: Arc<dyn MediaProber>,
    retry: RetryConfig,
    thumbnail_offset: Duration,
}

impl Publisher {
    pub(crate) fn new(
        messenger: Arc<dyn Messenger>,
        prober: Arc<dyn MediaProber>,
        publish: &PublishConfig,
    ) -> Self {
        Self {
            messenger,
            prober,
            retry: publish.retry.clone(),
            thumbnail_offset: publish.thumbnail_offset,
        }
    }

    /// Deliver a local file with its caption, answering whether it arrived.
    ///
    /// `.mp4` files are sent as streamable videos, everything else as plain
    /// documents. Failures are logged here; the caller only branches on the
    /// returned flag.
    pub(crate) async fn publish(
        &self,
        path: &Path,
        caption: &str,
        destination: ChatId,
        topic: TopicId,
    ) -> bool {
        let result = if is_video(path) {
            send_with_retry(&self.retry, || {
                self.attempt_video(path, caption, destination, topic)
            })
            .await
        } else {
            send_with_retry(&self.retry, || {
                self.attempt_document(path, caption, destination, topic)
            })
            .await
        };

        match result {
            Ok(message) => {
                debug!(
                    message_id = message.id.get(),
                    path = %path.display(),
                    "media published"
                );
                true
            }
            Err(e) => {
                error!(
                    path = %path.display(),
                    error = %e,
                    "publish failed after all attempts"
                );
                false
            }
        }
    }

    /// One video send attempt: probe, upload, discard the thumbnail.
    async fn attempt_video(
        &self,
        path: &Path,
        caption: &str,
        destination: ChatId,
        topic: TopicId,
    ) -> crate::Result<crate::types::MessageRef> {
        let thumbnail = self.prober.thumbnail(path, self.thumbnail_offset).await;
        let duration_secs = self.prober.duration_secs(path).await;

        let upload = VideoUpload {
            chat: destination,
            topic,
            path: path.to_path_buf(),
            caption: caption.to_string(),
            thumbnail: thumbnail.clone(),
            duration_secs,
        };
        let result = self.messenger.send_video(upload).await;

        // Each attempt extracts its own frame; never leave one behind
        if let Some(thumb) = thumbnail {
            discard_thumbnail(&thumb).await;
        }

        result
    }

    async fn attempt_document(
        &self,
        path: &Path,
        caption: &str,
        destination: ChatId,
        topic: TopicId,
    ) -> crate::Result<crate::types::MessageRef> {
        let upload = DocumentUpload {
            chat: destination,
            topic,
            path: path.to_path_buf(),
            caption: caption.to_string(),
        };
        self.messenger.send_document(upload).await
    }
}

fn is_video(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("mp4"))
}

async fn discard_thumbnail(path: &PathBuf) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "failed to remove thumbnail");
        }
    }
}
