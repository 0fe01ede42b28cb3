//! Core relay orchestration
//!
//! [`SubjectRelay`] owns every moving part of the pipeline: the messenger it
//! reports and publishes through, the asset fetcher, the media prober, the
//! per-user conversation sessions and the active-run registry. It is cheap to
//! clone and clones share all of that state, so the polling loop can hand a
//! clone to a spawned run task and keep dispatching commands.
//!
//! Behavior is split across focused submodules:
//!
//! - `commands`: update routing, manifest ingestion, conversation answers
//! - `run`: the batch processing loop
//! - `session`: the configuration conversation state machine
//! - `state`: shared session store and run registry
//! - `topics`: per-run forum topic resolution
//! - `publisher`: media delivery with retry and thumbnail hygiene

mod commands;
mod publisher;
mod run;
mod session;
mod state;
mod topics;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

pub use session::{AnswerOutcome, ConversationSession, RunConfig, SetupStep};

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::config::Config;
use crate::fetch::AssetFetcher;
use crate::probe::MediaProber;
use crate::telegram::Messenger;
use crate::types::{ChatId, Event, MessageRef};

use state::{ActiveRuns, SessionStore};

/// Buffered events per subscriber before older ones are dropped
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// The pipeline orchestrator
///
/// Construct one with [`SubjectRelay::new`], feed it updates through
/// [`SubjectRelay::handle_update`] and observe progress through
/// [`SubjectRelay::subscribe`]. Production wiring lives in
/// [`RelayBot`](crate::bot::RelayBot), which also owns the polling loop.
#[derive(Clone)]
pub struct SubjectRelay {
    messenger: Arc<dyn Messenger>,
    fetcher: Arc<dyn AssetFetcher>,
    prober: Arc<dyn MediaProber>,
    config: Arc<Config>,
    event_tx: broadcast::Sender<Event>,
    sessions: SessionStore,
    runs: ActiveRuns,
}

impl SubjectRelay {
    /// Assemble a relay from its collaborators.
    pub fn new(
        messenger: Arc<dyn Messenger>,
        fetcher: Arc<dyn AssetFetcher>,
        prober: Arc<dyn MediaProber>,
        config: Config,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            messenger,
            fetcher,
            prober,
            config: Arc::new(config),
            event_tx,
            sessions: SessionStore::new(),
            runs: ActiveRuns::new(),
        }
    }

    /// Subscribe to pipeline events.
    ///
    /// Every subscriber sees every event emitted after it subscribed. A
    /// subscriber that falls more than the channel capacity (1000 events)
    /// behind observes a lag error and skips ahead; the pipeline itself is
    /// never blocked by slow listeners.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Shared configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) fn emit_event(&self, event: Event) {
        // A send without subscribers is fine
        self.event_tx.send(event).ok();
    }

    /// Send a message, answering `None` (after logging) when the send fails.
    ///
    /// Status reporting is best-effort: a chat the bot cannot post into must
    /// not abort manifest ingestion or a running batch.
    pub(crate) async fn send_quietly(&self, chat: ChatId, text: &str) -> Option<MessageRef> {
        match self.messenger.send_message(chat, text).await {
            Ok(message) => Some(message),
            Err(e) => {
                warn!(chat = chat.get(), error = %e, "status send failed");
                None
            }
        }
    }

    /// Edit a status message, logging instead of propagating failures.
    pub(crate) async fn edit_quietly(&self, message: MessageRef, text: &str) {
        if let Err(e) = self.messenger.edit_message(message, text).await {
            warn!(message_id = message.id.get(), error = %e, "status edit failed");
        }
    }

    /// Delete a status message, logging instead of propagating failures.
    pub(crate) async fn delete_quietly(&self, message: MessageRef) {
        if let Err(e) = self.messenger.delete_message(message).await {
            debug!(message_id = message.id.get(), error = %e, "status delete failed");
        }
    }
}
