//! Wire types for the Bot API JSON format
//!
//! Only the fields the pipeline reads are modeled; unknown fields are
//! ignored during deserialization.

use crate::types::{ChatId, MessageId, UserId};
use serde::Deserialize;

/// Envelope every Bot API method answers with
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiResponse<T> {
    /// Whether the call succeeded
    pub ok: bool,
    /// Payload, present when `ok` is true
    #[serde(default)]
    pub result: Option<T>,
    /// Numeric error code, present when `ok` is false
    #[serde(default)]
    pub error_code: Option<i64>,
    /// Human-readable error description, present when `ok` is false
    #[serde(default)]
    pub description: Option<String>,
    /// Extra failure context such as flood-control waits
    #[serde(default)]
    pub parameters: Option<ResponseParameters>,
}

/// The `parameters` object of a failed response
#[derive(Debug, Deserialize)]
pub struct ResponseParameters {
    /// Seconds to wait before repeating the request ("too many requests")
    #[serde(default)]
    pub retry_after: Option<u64>,
    /// New chat id after a group-to-supergroup migration
    #[serde(default)]
    pub migrate_to_chat_id: Option<i64>,
}

/// One incoming update from `getUpdates`
#[derive(Debug, Deserialize)]
pub struct Update {
    /// Monotonically increasing update id, used for offset tracking
    pub update_id: i64,
    /// The message, for message updates
    #[serde(default)]
    pub message: Option<Message>,
}

/// An incoming or just-sent message
#[derive(Debug, Deserialize)]
pub struct Message {
    /// Message id within its chat
    pub message_id: MessageId,
    /// Sender, absent for channel posts
    #[serde(default)]
    pub from: Option<User>,
    /// Chat the message belongs to
    pub chat: Chat,
    /// Text content, for text messages
    #[serde(default)]
    pub text: Option<String>,
    /// Attached file, for document messages
    #[serde(default)]
    pub document: Option<Document>,
}

/// A Telegram user or bot
#[derive(Debug, Deserialize)]
pub struct User {
    /// Unique user id
    pub id: UserId,
    /// Whether this account is a bot
    #[serde(default)]
    pub is_bot: bool,
    /// First name
    #[serde(default)]
    pub first_name: String,
    /// Username without the leading `@`, if set
    #[serde(default)]
    pub username: Option<String>,
}

/// A chat (private conversation, group, or channel)
#[derive(Debug, Deserialize)]
pub struct Chat {
    /// Unique chat id
    pub id: ChatId,
    /// Chat type: "private", "group", "supergroup", or "channel"
    #[serde(rename = "type")]
    pub kind: String,
}

/// A file attached to a message
#[derive(Debug, Deserialize)]
pub struct Document {
    /// Identifier used to download the file via `getFile`
    pub file_id: String,
    /// Original filename, if the sender's client provided one
    #[serde(default)]
    pub file_name: Option<String>,
    /// MIME type, if known
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Size in bytes, if known
    #[serde(default)]
    pub file_size: Option<u64>,
}

/// `getFile` result carrying the server-side path for download
#[derive(Debug, Deserialize)]
pub struct File {
    /// The file id this answer is for
    pub file_id: String,
    /// Path component of the download URL, valid for about an hour
    #[serde(default)]
    pub file_path: Option<String>,
}

/// `createForumTopic` result
#[derive(Debug, Deserialize)]
pub struct ForumTopic {
    /// Thread id messages are addressed to
    pub message_thread_id: i64,
    /// Topic title
    pub name: String,
}
