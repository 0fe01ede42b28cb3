//! Update routing, manifest ingestion and conversation answers
//!
//! Only private chats are served. The `/start` and `/stop` commands answer
//! everyone; manifest uploads and conversation answers are restricted to the
//! configured allow-list and silently ignored for anyone else. Unknown input
//! (including unrecognized commands) is fed to the user's conversation, if
//! one is in progress.

use tracing::{debug, error, info, warn};

use super::SubjectRelay;
use super::session::{AnswerOutcome, ConversationSession};
use crate::manifest;
use crate::telegram::types::{Document, Update};
use crate::types::{ChatId, Event, UserId};

impl SubjectRelay {
    /// Route one incoming update to its handler.
    ///
    /// Never fails: reply problems are logged and swallowed so the polling
    /// loop keeps turning.
    pub async fn handle_update(&self, update: Update) {
        let Some(message) = update.message else { return };
        if message.chat.kind != "private" {
            return;
        }
        let Some(from) = message.from.as_ref() else { return };
        let user = from.id;
        let chat = message.chat.id;

        if let Some(document) = message.document.as_ref() {
            if is_manifest_document(document) {
                self.ingest_manifest(user, chat, document).await;
            }
            return;
        }

        let Some(text) = message.text.as_deref() else { return };
        let trimmed = text.trim();
        match command_of(trimmed) {
            Some("start") => self.send_welcome(user, chat).await,
            Some("stop") => self.handle_stop(user, chat).await,
            // Everything else may be a conversation answer
            _ => self.handle_conversation_input(user, chat, trimmed).await,
        }
    }

    async fn send_welcome(&self, user: UserId, chat: ChatId) {
        debug!(user = user.get(), "welcome requested");
        let text = format!(
            "👋 **Welcome to the Subject-Based Upload Bot!**\n\
             \n\
             📋 **How to use:**\n\
             1. Send me a `.txt` file with lines in this format:\n\
             \x20  `[Subject] Title:URL`\n\
             \n\
             \x20  - `Subject` (in square brackets) will be used to group uploads.\n\
             \x20  - `Title` is the human-readable name (used for filename and caption).\n\
             \x20  - `URL` is a direct link to the `.mp4` or `.pdf`.\n\
             \n\
             2. After I process your `.txt`, I'll ask for:\n\
             \x20  • **Starting line** number\n\
             \x20  • **Channel ID** (e.g. `-1001234567890`)\n\
             \x20  • **Batch name** (any text)\n\
             \x20  • **Downloaded by** (credit text)\n\
             \n\
             Then I will:\n\
             \x20 • Read each line from the starting line onward.\n\
             \x20 • Create a forum topic per `[Subject]` and deliver under it.\n\
             \x20 • Upload the corresponding file with numbered captions.\n\
             \x20 • Retry failed downloads once before moving to next item.\n\
             \n\
             🛑 Use `/stop` (in private chat) at any time to halt processing.\n\
             \n\
             🆔 Your User ID: `{}`",
            user.get()
        );
        self.send_quietly(chat, &text).await;
    }

    async fn handle_stop(&self, user: UserId, chat: ChatId) {
        if self.runs.cancel(user).await {
            info!(user = user.get(), "stop requested, run cancelled");
            self.send_quietly(chat, "⏹️ Processing has been stopped.").await;
        } else {
            self.send_quietly(chat, "ℹ️ No active process to stop.").await;
        }
    }

    /// Spool the uploaded manifest, read it, and open a conversation.
    async fn ingest_manifest(&self, user: UserId, chat: ChatId, document: &Document) {
        if !self.config.access.is_allowed(user) {
            debug!(user = user.get(), "manifest from unlisted user ignored");
            return;
        }
        if self.runs.is_active(user).await {
            self.send_quietly(
                chat,
                "⚠️ A run is already in progress. Use /stop before sending a new manifest.",
            )
            .await;
            return;
        }

        let ack = self
            .send_quietly(chat, "📥 Downloading and reading your .txt file...")
            .await;

        let lines = match self.read_manifest_document(user, document).await {
            Ok(lines) => lines,
            Err(e) => {
                error!(user = user.get(), error = %e, "manifest ingestion failed");
                if let Some(ack) = ack {
                    self.edit_quietly(ack, "⚠️ Failed to read the file.").await;
                }
                return;
            }
        };

        if lines.is_empty() {
            if let Some(ack) = ack {
                self.edit_quietly(ack, "⚠️ The file is empty.").await;
            }
            return;
        }

        let total = lines.len();
        info!(user = user.get(), lines = total, "manifest accepted");
        self.sessions
            .insert(user, ConversationSession::new(lines))
            .await;
        self.emit_event(Event::ManifestAccepted {
            user_id: user,
            lines: total,
        });

        if let Some(ack) = ack {
            self.edit_quietly(
                ack,
                &format!("📋 Found {total} items. Please send the starting line number (1–{total})."),
            )
            .await;
        }
    }

    /// Download the document into the work directory, read its lines, and
    /// remove the spool file again whatever happened.
    async fn read_manifest_document(
        &self,
        user: UserId,
        document: &Document,
    ) -> crate::Result<Vec<String>> {
        let work_dir = self.config.work_dir();
        tokio::fs::create_dir_all(work_dir).await?;
        let temp_path = work_dir.join(format!("temp_{}.txt", user.get()));

        let result: crate::Result<Vec<String>> = async {
            self.messenger
                .download_file(&document.file_id, &temp_path)
                .await?;
            let text = tokio::fs::read_to_string(&temp_path).await?;
            Ok(manifest::manifest_lines(&text))
        }
        .await;

        if let Err(e) = tokio::fs::remove_file(&temp_path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(
                    path = %temp_path.display(),
                    error = %e,
                    "failed to remove manifest spool file"
                );
            }
        }

        result
    }

    async fn handle_conversation_input(&self, user: UserId, chat: ChatId, text: &str) {
        if !self.config.access.is_allowed(user) {
            return;
        }

        let Some(outcome) = self
            .sessions
            .with_session(user, |session| session.apply_answer(text))
            .await
        else {
            // No conversation in progress
            return;
        };

        match outcome {
            AnswerOutcome::Advanced(prompt) | AnswerOutcome::Rejected(prompt) => {
                self.send_quietly(chat, &prompt).await;
            }
            AnswerOutcome::Complete(config) => {
                self.start_run(user, chat, config).await;
            }
            AnswerOutcome::Ignored => {}
        }
    }
}

/// Extract the command name from `/name` or `/name@botname` input.
fn command_of(text: &str) -> Option<&str> {
    let first = text.split_whitespace().next()?;
    let name = first.strip_prefix('/')?;
    Some(name.split('@').next().unwrap_or(name))
}

fn is_manifest_document(document: &Document) -> bool {
    document
        .file_name
        .as_deref()
        .is_some_and(|name| name.to_lowercase().ends_with(".txt"))
}
