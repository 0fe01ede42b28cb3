//! Core types for subject-relay

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a Telegram user
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl UserId {
    /// Create a new UserId
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the inner i64 value
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<UserId> for i64 {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl PartialEq<i64> for UserId {
    fn eq(&self, other: &i64) -> bool {
        self.0 == *other
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for UserId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Identifier for a Telegram chat (channel ids carry the `-100` prefix)
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ChatId(pub i64);

impl ChatId {
    /// Create a new ChatId
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the inner i64 value
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier for a message within a chat
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MessageId(pub i64);

impl MessageId {
    /// Create a new MessageId
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the inner i64 value
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier for a forum topic (message thread) within a channel
///
/// The value 0 is the sentinel for "no topic": delivery goes to the plain
/// channel instead of a specific thread.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TopicId(pub i64);

impl TopicId {
    /// Sentinel topic id meaning "deliver to the plain channel"
    pub const GENERAL: TopicId = TopicId(0);

    /// Create a new TopicId
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the inner i64 value
    pub fn get(&self) -> i64 {
        self.0
    }

    /// Whether this is the sentinel "no topic" id
    pub fn is_general(&self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for TopicId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle to a sent message, sufficient to edit or delete it later
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef {
    /// Chat the message lives in
    pub chat: ChatId,
    /// Message id within that chat
    pub id: MessageId,
}

/// Kind of media an entry resolves to, decided from its URL
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Treated as video, fetched as `.mp4`, sent with streaming support
    Video,
    /// Fetched as `.pdf`, sent as a plain document
    Pdf,
}

impl MediaKind {
    /// Classify a source URL.
    ///
    /// A case-insensitive `.pdf` substring anywhere in the URL selects
    /// [`MediaKind::Pdf`]; everything else is treated as video.
    pub fn from_url(url: &str) -> Self {
        if url.to_lowercase().contains(".pdf") {
            MediaKind::Pdf
        } else {
            MediaKind::Video
        }
    }

    /// File extension for the fetched asset, without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            MediaKind::Video => "mp4",
            MediaKind::Pdf => "pdf",
        }
    }
}

/// How a batch run ended
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Every line from the start line onward was visited
    Exhausted,
    /// The user requested a stop before the manifest was consumed
    Cancelled,
}

/// Final accounting for one batch run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    /// How the run ended
    pub outcome: RunOutcome,
    /// Lines published successfully
    pub processed: u32,
    /// Lines that failed (malformed, fetch-exhausted, or publish-exhausted)
    pub failed: u32,
    /// Total manifest lines, including lines before the start line
    pub total_lines: usize,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run ended
    pub finished_at: DateTime<Utc>,
}

/// Event emitted during a batch run
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A manifest was accepted and a conversation started
    ManifestAccepted {
        /// User who uploaded the manifest
        user_id: UserId,
        /// Number of non-blank lines
        lines: usize,
    },

    /// A configured run began processing
    RunStarted {
        /// User who owns the run
        user_id: UserId,
        /// First manifest line to process (1-based)
        start_line: usize,
        /// Total manifest lines
        total: usize,
        /// Batch label echoed into captions
        batch_label: String,
    },

    /// A forum topic was created for a subject
    TopicCreated {
        /// Subject label the topic was created for
        subject: String,
        /// The new topic id
        topic_id: TopicId,
    },

    /// Topic creation failed and the subject fell back to plain delivery
    TopicFallback {
        /// Subject label that could not get its own topic
        subject: String,
    },

    /// A manifest line was published
    LinePublished {
        /// 1-based manifest line number
        line: usize,
        /// Routing subject of the line
        subject: String,
        /// Sequence number used in the caption
        sequence: u32,
    },

    /// A manifest line failed (malformed, fetch, or publish)
    LineFailed {
        /// 1-based manifest line number
        line: usize,
        /// Failure description
        reason: String,
    },

    /// A run finished, was cancelled, or was torn down
    RunFinished {
        /// User who owned the run
        user_id: UserId,
        /// Lines published successfully
        processed: u32,
        /// Lines that failed
        failed: u32,
        /// How the run ended
        outcome: RunOutcome,
    },
}
