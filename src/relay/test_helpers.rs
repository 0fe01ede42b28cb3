//! Test doubles and fixtures shared by the relay test modules
//!
//! The mocks record every call so tests can assert on exact message texts,
//! upload parameters and call ordering. Failure scripting is one-shot: each
//! scripted failure is consumed by the next matching call, after which the
//! mock succeeds again.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::broadcast;

use crate::config::{Config, RetryConfig};
use crate::error::{FetchError, TelegramError};
use crate::fetch::AssetFetcher;
use crate::probe::MediaProber;
use crate::relay::SubjectRelay;
use crate::telegram::types::{Chat, Document, Message, Update, User};
use crate::telegram::{DocumentUpload, Messenger, VideoUpload};
use crate::types::{
    ChatId, Event, MediaKind, MessageId, MessageRef, RunOutcome, TopicId, UserId,
};

/// The one user on the test allow-list.
pub(crate) const OPERATOR: UserId = UserId(1116405290);

/// A media upload as the mock messenger saw it.
#[derive(Clone, Debug)]
pub(crate) enum SentMedia {
    Video {
        topic: TopicId,
        caption: String,
        path: PathBuf,
        thumbnail: Option<PathBuf>,
        duration_secs: Option<u32>,
    },
    Document {
        topic: TopicId,
        caption: String,
        path: PathBuf,
    },
}

/// Recording stand-in for the Bot API.
pub(crate) struct MockMessenger {
    next_message_id: AtomicI64,
    next_topic_id: AtomicI64,
    texts: Mutex<Vec<(ChatId, String)>>,
    edits: Mutex<Vec<(MessageRef, String)>>,
    deletes: Mutex<Vec<MessageRef>>,
    media: Mutex<Vec<SentMedia>>,
    topics_created: Mutex<Vec<String>>,
    topic_failures: Mutex<HashSet<String>>,
    media_failures: AtomicU32,
    flood_failures: AtomicU32,
    manifest_bytes: Mutex<Option<Vec<u8>>>,
}

impl MockMessenger {
    pub(crate) fn new() -> Self {
        Self {
            next_message_id: AtomicI64::new(1),
            next_topic_id: AtomicI64::new(2),
            texts: Mutex::new(Vec::new()),
            edits: Mutex::new(Vec::new()),
            deletes: Mutex::new(Vec::new()),
            media: Mutex::new(Vec::new()),
            topics_created: Mutex::new(Vec::new()),
            topic_failures: Mutex::new(HashSet::new()),
            media_failures: AtomicU32::new(0),
            flood_failures: AtomicU32::new(0),
            manifest_bytes: Mutex::new(None),
        }
    }

    /// Make topic creation fail for this subject (every time).
    pub(crate) fn fail_topic(&self, subject: &str) {
        self.topic_failures.lock().unwrap().insert(subject.to_string());
    }

    /// Make the next `n` media sends fail with an API error.
    pub(crate) fn fail_next_media_sends(&self, n: u32) {
        self.media_failures.fetch_add(n, Ordering::SeqCst);
    }

    /// Make the next `n` media sends answer a flood pause.
    pub(crate) fn flood_next_media_sends(&self, n: u32) {
        self.flood_failures.fetch_add(n, Ordering::SeqCst);
    }

    /// Content served by the next manifest download.
    pub(crate) fn script_manifest(&self, content: &str) {
        *self.manifest_bytes.lock().unwrap() = Some(content.as_bytes().to_vec());
    }

    pub(crate) fn sent_texts(&self) -> Vec<String> {
        self.texts
            .lock()
            .unwrap()
            .iter()
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub(crate) fn edited_texts(&self) -> Vec<String> {
        self.edits
            .lock()
            .unwrap()
            .iter()
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub(crate) fn deleted_messages(&self) -> Vec<MessageRef> {
        self.deletes.lock().unwrap().clone()
    }

    pub(crate) fn media_sends(&self) -> Vec<SentMedia> {
        self.media.lock().unwrap().clone()
    }

    pub(crate) fn created_topics(&self) -> Vec<String> {
        self.topics_created.lock().unwrap().clone()
    }

    fn next_ref(&self, chat: ChatId) -> MessageRef {
        MessageRef {
            chat,
            id: MessageId::new(self.next_message_id.fetch_add(1, Ordering::SeqCst)),
        }
    }

    /// Consume one scripted media failure, if any are queued.
    fn scripted_media_failure(&self) -> Option<crate::Error> {
        if take_one(&self.flood_failures) {
            return Some(
                TelegramError::Api {
                    code: 429,
                    description: "Too Many Requests: retry after 1".into(),
                    retry_after: Some(Duration::from_millis(5)),
                }
                .into(),
            );
        }
        if take_one(&self.media_failures) {
            return Some(
                TelegramError::Api {
                    code: 400,
                    description: "Bad Request: chat not found".into(),
                    retry_after: None,
                }
                .into(),
            );
        }
        None
    }
}

#[async_trait]
impl Messenger for MockMessenger {
    async fn send_message(&self, chat: ChatId, text: &str) -> crate::Result<MessageRef> {
        self.texts.lock().unwrap().push((chat, text.to_string()));
        Ok(self.next_ref(chat))
    }

    async fn edit_message(&self, message: MessageRef, text: &str) -> crate::Result<()> {
        self.edits.lock().unwrap().push((message, text.to_string()));
        Ok(())
    }

    async fn delete_message(&self, message: MessageRef) -> crate::Result<()> {
        self.deletes.lock().unwrap().push(message);
        Ok(())
    }

    async fn send_video(&self, upload: VideoUpload) -> crate::Result<MessageRef> {
        self.media.lock().unwrap().push(SentMedia::Video {
            topic: upload.topic,
            caption: upload.caption,
            path: upload.path,
            thumbnail: upload.thumbnail,
            duration_secs: upload.duration_secs,
        });
        if let Some(e) = self.scripted_media_failure() {
            return Err(e);
        }
        Ok(self.next_ref(upload.chat))
    }

    async fn send_document(&self, upload: DocumentUpload) -> crate::Result<MessageRef> {
        self.media.lock().unwrap().push(SentMedia::Document {
            topic: upload.topic,
            caption: upload.caption,
            path: upload.path,
        });
        if let Some(e) = self.scripted_media_failure() {
            return Err(e);
        }
        Ok(self.next_ref(upload.chat))
    }

    async fn create_forum_topic(&self, _chat: ChatId, name: &str) -> crate::Result<TopicId> {
        self.topics_created.lock().unwrap().push(name.to_string());
        if self.topic_failures.lock().unwrap().contains(name) {
            return Err(TelegramError::Api {
                code: 400,
                description: "Bad Request: not enough rights to create a topic".into(),
                retry_after: None,
            }
            .into());
        }
        Ok(TopicId::new(self.next_topic_id.fetch_add(1, Ordering::SeqCst)))
    }

    async fn download_file(&self, _file_id: &str, dest: &Path) -> crate::Result<()> {
        let scripted = self.manifest_bytes.lock().unwrap().clone();
        let Some(bytes) = scripted else {
            return Err(TelegramError::UnexpectedResponse("no scripted manifest".into()).into());
        };
        tokio::fs::write(dest, bytes).await?;
        Ok(())
    }
}

fn take_one(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

/// Fetcher that writes real files into the work directory.
pub(crate) struct MockFetcher {
    work_dir: PathBuf,
    calls: Mutex<Vec<String>>,
    failures: Mutex<HashMap<String, u32>>,
}

impl MockFetcher {
    pub(crate) fn new(work_dir: &Path) -> Self {
        Self {
            work_dir: work_dir.to_path_buf(),
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
        }
    }

    /// Make the next `times` fetches of `url` fail.
    pub(crate) fn fail_next(&self, url: &str, times: u32) {
        self.failures.lock().unwrap().insert(url.to_string(), times);
    }

    pub(crate) fn fetched_urls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AssetFetcher for MockFetcher {
    async fn fetch(&self, url: &str, base_name: &str) -> crate::Result<PathBuf> {
        self.calls.lock().unwrap().push(url.to_string());

        {
            let mut failures = self.failures.lock().unwrap();
            if let Some(remaining) = failures.get_mut(url) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(FetchError::Failed {
                        url: url.to_string(),
                        status: "exit status: 1".into(),
                        stderr: "scripted failure".into(),
                    }
                    .into());
                }
            }
        }

        let extension = MediaKind::from_url(url).extension();
        let path = self.work_dir.join(format!("{base_name}.{extension}"));
        tokio::fs::write(&path, b"asset payload").await?;
        Ok(path)
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Prober with fixed answers; optionally materializes real thumbnail files
/// so cleanup behavior is observable.
pub(crate) struct MockProber {
    duration: Option<u32>,
    produce_thumbnails: bool,
}

impl MockProber {
    pub(crate) fn new(duration: Option<u32>, produce_thumbnails: bool) -> Self {
        Self {
            duration,
            produce_thumbnails,
        }
    }
}

#[async_trait]
impl MediaProber for MockProber {
    async fn duration_secs(&self, _video: &Path) -> Option<u32> {
        self.duration
    }

    async fn thumbnail(&self, video: &Path, _offset: Duration) -> Option<PathBuf> {
        if !self.produce_thumbnails {
            return None;
        }
        let mut name = video.as_os_str().to_owned();
        name.push(".jpg");
        let path = PathBuf::from(name);
        tokio::fs::write(&path, b"jpeg frame").await.ok()?;
        Some(path)
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// A fully wired relay over mocks, plus handles to every mock.
pub(crate) struct RelayFixture {
    pub(crate) relay: SubjectRelay,
    pub(crate) messenger: Arc<MockMessenger>,
    pub(crate) fetcher: Arc<MockFetcher>,
    temp: TempDir,
}

impl RelayFixture {
    pub(crate) fn work_dir(&self) -> &Path {
        self.temp.path()
    }
}

/// Relay with tight test timings: immediate retries, no inter-item pause.
pub(crate) fn create_test_relay() -> RelayFixture {
    let temp = TempDir::new().unwrap();

    let mut config = Config::default();
    config.access.allowed_user_ids = vec![OPERATOR];
    config.fetch.work_dir = temp.path().to_path_buf();
    config.fetch.fetch_retry_delay = Duration::from_millis(1);
    config.fetch.inter_item_delay = Duration::ZERO;
    config.publish.retry = RetryConfig {
        max_attempts: 3,
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(4),
        backoff_multiplier: 2.0,
        jitter: false,
    };

    let messenger = Arc::new(MockMessenger::new());
    let fetcher = Arc::new(MockFetcher::new(temp.path()));
    let prober = Arc::new(MockProber::new(Some(300), true));

    let relay = SubjectRelay::new(
        messenger.clone() as Arc<dyn Messenger>,
        fetcher.clone() as Arc<dyn AssetFetcher>,
        prober,
        config,
    );

    RelayFixture {
        relay,
        messenger,
        fetcher,
        temp,
    }
}

/// Private-chat text message from `user`.
pub(crate) fn text_update(user: UserId, text: &str) -> Update {
    Update {
        update_id: 0,
        message: Some(Message {
            message_id: MessageId::new(1),
            from: Some(User {
                id: user,
                is_bot: false,
                first_name: "Operator".into(),
                username: Some("operator".into()),
            }),
            chat: Chat {
                id: ChatId::new(user.get()),
                kind: "private".into(),
            },
            text: Some(text.to_string()),
            document: None,
        }),
    }
}

/// Private-chat document upload from `user`.
pub(crate) fn document_update(user: UserId, file_name: &str) -> Update {
    Update {
        update_id: 0,
        message: Some(Message {
            message_id: MessageId::new(1),
            from: Some(User {
                id: user,
                is_bot: false,
                first_name: "Operator".into(),
                username: Some("operator".into()),
            }),
            chat: Chat {
                id: ChatId::new(user.get()),
                kind: "private".into(),
            },
            text: None,
            document: Some(Document {
                file_id: "manifest-file-id".into(),
                file_name: Some(file_name.to_string()),
                mime_type: Some("text/plain".into()),
                file_size: Some(64),
            }),
        }),
    }
}

/// Like [`text_update`] but from a supergroup instead of a private chat.
pub(crate) fn group_text_update(user: UserId, text: &str) -> Update {
    let mut update = text_update(user, text);
    if let Some(message) = update.message.as_mut() {
        message.chat.kind = "supergroup".into();
    }
    update
}

/// Block until the relay reports a finished run, answering its counters.
pub(crate) async fn wait_for_run_finished(
    rx: &mut broadcast::Receiver<Event>,
) -> (u32, u32, RunOutcome) {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match rx.recv().await {
                Ok(Event::RunFinished {
                    processed,
                    failed,
                    outcome,
                    ..
                }) => return (processed, failed, outcome),
                Ok(_) => continue,
                Err(e) => panic!("event channel closed while waiting: {e}"),
            }
        }
    })
    .await
    .expect("run did not finish within the timeout")
}
