//! Reqwest-backed Bot API client
//!
//! One HTTP client per bot process. Small JSON calls carry the configured
//! request timeout; media uploads stream from disk without a client-side
//! deadline; `getUpdates` long-polls with headroom on top of the server-side
//! hold. Error envelopes are decoded into [`TelegramError::Api`] regardless
//! of the HTTP status code the server paired them with.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use tokio_util::io::ReaderStream;

use crate::config::TelegramConfig;
use crate::error::{Error, TelegramError};
use crate::telegram::types::{self, ApiResponse};
use crate::telegram::{DocumentUpload, Messenger, VideoUpload};
use crate::types::{ChatId, MessageRef, TopicId};

/// Accent color assigned to newly created forum topics (light blue)
const TOPIC_ICON_COLOR: i64 = 7_322_096;

/// HTTP client for the Telegram Bot API
///
/// Clones share the underlying connection pool, so one instance can serve
/// the polling loop and, behind an `Arc<dyn Messenger>`, the relay.
#[derive(Clone)]
pub struct BotApiClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    request_timeout: Duration,
    poll_timeout: Duration,
}

impl std::fmt::Debug for BotApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The token never appears in debug output
        f.debug_struct("BotApiClient")
            .field("base_url", &self.base_url)
            .field("request_timeout", &self.request_timeout)
            .field("poll_timeout", &self.poll_timeout)
            .finish_non_exhaustive()
    }
}

impl BotApiClient {
    /// Create a client from connection settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the bot token is empty and
    /// [`Error::Telegram`] when the HTTP client cannot be constructed.
    pub fn new(config: &TelegramConfig) -> crate::Result<Self> {
        if config.bot_token.is_empty() {
            return Err(Error::Config {
                message: "bot token is not set".to_string(),
                key: Some("telegram.bot_token".to_string()),
            });
        }

        let http = reqwest::Client::builder()
            .build()
            .map_err(TelegramError::from)?;

        Ok(Self {
            http,
            base_url: config.api_base.trim_end_matches('/').to_string(),
            token: config.bot_token.clone(),
            request_timeout: config.request_timeout,
            poll_timeout: config.poll_timeout,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    /// POST a JSON body and decode the response envelope.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: &serde_json::Value,
    ) -> Result<T, TelegramError> {
        self.call_with_deadline(method, body, self.request_timeout)
            .await
    }

    async fn call_with_deadline<T: DeserializeOwned>(
        &self,
        method: &str,
        body: &serde_json::Value,
        deadline: Duration,
    ) -> Result<T, TelegramError> {
        let response = self
            .http
            .post(self.method_url(method))
            .json(body)
            .timeout(deadline)
            .send()
            .await?;

        // Failed calls answer with 4xx/5xx but still carry the JSON envelope
        let envelope: ApiResponse<T> = response.json().await?;
        Self::unwrap_envelope(envelope)
    }

    /// POST a multipart form (media upload) and decode the response envelope.
    ///
    /// Uploads run without a client-side deadline: a multi-gigabyte video on
    /// a slow uplink legitimately takes longer than any fixed timeout.
    async fn upload<T: DeserializeOwned>(
        &self,
        method: &str,
        form: Form,
    ) -> Result<T, TelegramError> {
        let response = self
            .http
            .post(self.method_url(method))
            .multipart(form)
            .send()
            .await?;

        let envelope: ApiResponse<T> = response.json().await?;
        Self::unwrap_envelope(envelope)
    }

    fn unwrap_envelope<T>(envelope: ApiResponse<T>) -> Result<T, TelegramError> {
        if envelope.ok {
            return envelope.result.ok_or_else(|| {
                TelegramError::UnexpectedResponse("ok response without result".to_string())
            });
        }

        let retry_after = envelope
            .parameters
            .and_then(|p| p.retry_after)
            .map(Duration::from_secs);

        Err(TelegramError::Api {
            code: envelope.error_code.unwrap_or(0),
            description: envelope
                .description
                .unwrap_or_else(|| "unknown error".to_string()),
            retry_after,
        })
    }

    /// Build a streaming multipart part from a file on disk.
    async fn file_part(path: &Path) -> crate::Result<Part> {
        let file = tokio::fs::File::open(path).await?;
        let length = file.metadata().await?.len();
        let stream = ReaderStream::new(file);
        let body = reqwest::Body::wrap_stream(stream);

        let file_name = path
            .file_name()
            .map_or_else(|| "file".to_string(), |n| n.to_string_lossy().into_owned());

        Ok(Part::stream_with_length(body, length).file_name(file_name))
    }

    /// Identify the bot account behind the configured token.
    ///
    /// Doubles as the startup handshake: a bad token or unreachable API
    /// surfaces here before any polling begins.
    pub async fn get_me(&self) -> crate::Result<types::User> {
        let user = self.call("getMe", &serde_json::json!({})).await?;
        Ok(user)
    }

    /// Long-poll for incoming message updates.
    ///
    /// `offset` is the next update id to receive (last seen id plus one);
    /// `None` starts from the oldest unconfirmed update.
    pub async fn get_updates(&self, offset: Option<i64>) -> crate::Result<Vec<types::Update>> {
        let mut body = serde_json::json!({
            "timeout": self.poll_timeout.as_secs(),
            "allowed_updates": ["message"],
        });
        if let Some(offset) = offset {
            body["offset"] = serde_json::json!(offset);
        }

        // The server holds the connection open for up to poll_timeout, so the
        // client-side deadline stacks the ordinary request timeout on top.
        let updates = self
            .call_with_deadline("getUpdates", &body, self.poll_timeout + self.request_timeout)
            .await?;
        Ok(updates)
    }
}

#[async_trait]
impl Messenger for BotApiClient {
    async fn send_message(&self, chat: ChatId, text: &str) -> crate::Result<MessageRef> {
        let message: types::Message = self
            .call(
                "sendMessage",
                &serde_json::json!({ "chat_id": chat, "text": text }),
            )
            .await?;
        Ok(MessageRef {
            chat,
            id: message.message_id,
        })
    }

    async fn edit_message(&self, message: MessageRef, text: &str) -> crate::Result<()> {
        let body = serde_json::json!({
            "chat_id": message.chat,
            "message_id": message.id,
            "text": text,
        });
        // editMessageText returns the edited message (or `true` for inline
        // messages); neither shape is of interest here
        match self.call::<serde_json::Value>("editMessageText", &body).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_message_not_modified() => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_message(&self, message: MessageRef) -> crate::Result<()> {
        let body = serde_json::json!({
            "chat_id": message.chat,
            "message_id": message.id,
        });
        self.call::<bool>("deleteMessage", &body).await?;
        Ok(())
    }

    async fn send_video(&self, upload: VideoUpload) -> crate::Result<MessageRef> {
        let mut form = Form::new()
            .text("chat_id", upload.chat.get().to_string())
            .text("caption", upload.caption)
            .text("supports_streaming", "true");
        if !upload.topic.is_general() {
            form = form.text("message_thread_id", upload.topic.get().to_string());
        }
        if let Some(duration) = upload.duration_secs {
            form = form.text("duration", duration.to_string());
        }
        form = form.part("video", Self::file_part(&upload.path).await?);
        if let Some(thumbnail) = &upload.thumbnail {
            form = form.part("thumbnail", Self::file_part(thumbnail).await?);
        }

        let message: types::Message = self.upload("sendVideo", form).await?;
        Ok(MessageRef {
            chat: upload.chat,
            id: message.message_id,
        })
    }

    async fn send_document(&self, upload: DocumentUpload) -> crate::Result<MessageRef> {
        let mut form = Form::new()
            .text("chat_id", upload.chat.get().to_string())
            .text("caption", upload.caption);
        if !upload.topic.is_general() {
            form = form.text("message_thread_id", upload.topic.get().to_string());
        }
        form = form.part("document", Self::file_part(&upload.path).await?);

        let message: types::Message = self.upload("sendDocument", form).await?;
        Ok(MessageRef {
            chat: upload.chat,
            id: message.message_id,
        })
    }

    async fn create_forum_topic(&self, chat: ChatId, name: &str) -> crate::Result<TopicId> {
        let body = serde_json::json!({
            "chat_id": chat,
            "name": name,
            "icon_color": TOPIC_ICON_COLOR,
        });
        let topic: types::ForumTopic = self.call("createForumTopic", &body).await?;
        Ok(TopicId::new(topic.message_thread_id))
    }

    async fn download_file(&self, file_id: &str, dest: &Path) -> crate::Result<()> {
        let file: types::File = self
            .call("getFile", &serde_json::json!({ "file_id": file_id }))
            .await?;
        let file_path = file.file_path.ok_or_else(|| {
            TelegramError::UnexpectedResponse("getFile result without file_path".to_string())
        })?;

        let url = format!("{}/file/bot{}/{}", self.base_url, self.token, file_path);
        let response = self
            .http
            .get(url)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(TelegramError::from)?;
        if !response.status().is_success() {
            return Err(TelegramError::UnexpectedResponse(format!(
                "file download answered HTTP {}",
                response.status()
            ))
            .into());
        }

        let bytes = response.bytes().await.map_err(TelegramError::from)?;
        tokio::fs::write(dest, &bytes).await?;
        Ok(())
    }
}
