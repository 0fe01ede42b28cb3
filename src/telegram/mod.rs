//! Telegram Bot API transport
//!
//! This module provides the messaging side of the pipeline: a thin client for
//! the HTTP Bot API plus the trait the relay consumes.
//!
//! ## Architecture
//!
//! The core abstraction is the [`Messenger`] trait, covering every remote
//! operation a run needs: plain sends and edits for status reporting, media
//! uploads with captions, forum topic creation, and document download for
//! manifest ingestion.
//!
//! - [`BotApiClient`]: Talks to the real Bot API over HTTP
//!
//! Tests substitute their own [`Messenger`] implementations, so nothing above
//! this module knows about HTTP.
//!
//! Polling for updates and the startup handshake are deliberately not part of
//! [`Messenger`]: they belong to the bot loop, which works with
//! [`BotApiClient`] directly.

mod client;
pub mod types;

pub use client::BotApiClient;

use crate::types::{ChatId, MessageRef, TopicId};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Parameters for a video upload
#[derive(Debug, Clone)]
pub struct VideoUpload {
    /// Destination chat
    pub chat: ChatId,
    /// Topic to deliver into; the general topic sends to the plain channel
    pub topic: TopicId,
    /// Local video file
    pub path: PathBuf,
    /// Caption shown under the video
    pub caption: String,
    /// Thumbnail image, if one was extracted
    pub thumbnail: Option<PathBuf>,
    /// Duration in whole seconds, if probing succeeded
    pub duration_secs: Option<u32>,
}

/// Parameters for a document upload
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    /// Destination chat
    pub chat: ChatId,
    /// Topic to deliver into; the general topic sends to the plain channel
    pub topic: TopicId,
    /// Local file
    pub path: PathBuf,
    /// Caption shown under the document
    pub caption: String,
}

/// Trait for the remote messaging operations the relay performs
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send a plain text message
    async fn send_message(&self, chat: ChatId, text: &str) -> crate::Result<MessageRef>;

    /// Replace the text of an existing message
    ///
    /// Editing a message to its current text is treated as success.
    async fn edit_message(&self, message: MessageRef, text: &str) -> crate::Result<()>;

    /// Delete a message
    async fn delete_message(&self, message: MessageRef) -> crate::Result<()>;

    /// Upload a video with caption, optional thumbnail and duration,
    /// streaming enabled
    async fn send_video(&self, upload: VideoUpload) -> crate::Result<MessageRef>;

    /// Upload a file as a generic document with caption
    async fn send_document(&self, upload: DocumentUpload) -> crate::Result<MessageRef>;

    /// Create a forum topic on the destination channel, returning its id
    async fn create_forum_topic(&self, chat: ChatId, name: &str) -> crate::Result<TopicId>;

    /// Download a file the bot received (by its file id) to a local path
    async fn download_file(&self, file_id: &str, dest: &Path) -> crate::Result<()>;
}
