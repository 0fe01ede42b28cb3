//! Per-run forum topic resolution
//!
//! Each distinct routing subject gets at most one topic creation call per
//! run. Failures fall back to the plain channel (the general topic) and the
//! fallback is cached too, so a subject that failed once is not retried for
//! the remainder of the run.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::telegram::Messenger;
use crate::types::{ChatId, Event, TopicId};

/// Resolves routing subjects to forum topics for one run.
pub(crate) struct TopicResolver {
    messenger: Arc<dyn Messenger>,
    events: broadcast::Sender<Event>,
    destination: ChatId,
    cache: HashMap<String, TopicId>,
}

impl TopicResolver {
    pub(crate) fn new(
        messenger: Arc<dyn Messenger>,
        events: broadcast::Sender<Event>,
        destination: ChatId,
    ) -> Self {
        Self {
            messenger,
            events,
            destination,
            cache: HashMap::new(),
        }
    }

    /// Topic to deliver under for `subject`, creating it on first sight.
    pub(crate) async fn resolve(&mut self, subject: &str) -> TopicId {
        if let Some(topic) = self.cache.get(subject) {
            return *topic;
        }

        let topic = match self.messenger.create_forum_topic(self.destination, subject).await {
            Ok(topic) => {
                info!(subject, topic = topic.get(), "forum topic created");
                self.emit(Event::TopicCreated {
                    subject: subject.to_string(),
                    topic_id: topic,
                });
                topic
            }
            Err(e) => {
                warn!(
                    subject,
                    error = %e,
                    "topic creation failed, delivering to the plain channel"
                );
                self.emit(Event::TopicFallback {
                    subject: subject.to_string(),
                });
                TopicId::GENERAL
            }
        };

        self.cache.insert(subject.to_string(), topic);
        topic
    }

    fn emit(&self, event: Event) {
        // Nobody listening is fine
        self.events.send(event).ok();
    }
}
