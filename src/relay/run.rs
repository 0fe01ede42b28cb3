//! The batch processing loop
//!
//! One run walks the manifest from the configured start line to the end,
//! reporting progress into the operator's chat and delivering media into the
//! destination channel. Per-line failures are absorbed: a malformed line, a
//! twice-failed fetch or an exhausted publish all count the line as failed
//! and move on. Only cancellation stops the walk early.
//!
//! Caption sequence numbers count successful fetches, so a line that never
//! produced a file does not burn a number, and a file that could not be
//! published gives its number back to the next line.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::SubjectRelay;
use super::publisher::Publisher;
use super::session::RunConfig;
use super::topics::TopicResolver;
use crate::manifest::{self, ManifestEntry};
use crate::types::{ChatId, Event, MessageRef, RunOutcome, RunSummary, UserId};

impl SubjectRelay {
    /// Launch the configured run on its own task.
    ///
    /// The update loop stays free while the batch grinds on, so a `/stop`
    /// sent mid-run is seen and honored. The session and the run
    /// registration are torn down when the task ends.
    pub(crate) async fn start_run(&self, user: UserId, chat: ChatId, config: RunConfig) {
        let Some(lines) = self.sessions.with_session(user, |s| s.lines.clone()).await else {
            warn!(user = user.get(), "run configured but the session is gone");
            return;
        };

        let Some(cancel) = self.runs.begin(user).await else {
            warn!(user = user.get(), "run refused, another one is still active");
            return;
        };

        let relay = self.clone();
        tokio::spawn(async move {
            relay.run_batch(user, chat, lines, config, cancel).await;
            relay.sessions.remove(user).await;
            relay.runs.finish(user).await;
        });
    }

    /// Process the manifest lines from `config.start_line` to the end.
    ///
    /// Progress is reported into `chat`; media goes to `config.destination`.
    pub(crate) async fn run_batch(
        &self,
        user: UserId,
        chat: ChatId,
        lines: Vec<String>,
        config: RunConfig,
        cancel: CancellationToken,
    ) -> RunSummary {
        let started_at = Utc::now();
        let total = lines.len();
        let RunConfig {
            start_line,
            destination,
            batch_label,
            credit,
        } = config;

        info!(
            user = user.get(),
            start_line,
            total,
            batch = %batch_label,
            channel = destination.get(),
            "run started"
        );
        self.emit_event(Event::RunStarted {
            user_id: user,
            start_line,
            total,
            batch_label: batch_label.clone(),
        });

        let progress = self
            .send_quietly(
                chat,
                &format!(
                    "🚀 Starting processing:\n\
                     • Start line: {start_line}\n\
                     • Total items: {total}\n\
                     • Batch name: {batch_label}\n\
                     • Channel: {destination}\n\
                     • Downloaded by: {credit}\n\
                     \n\
                     Completed: 0 / {total}"
                ),
            )
            .await;

        let mut resolver =
            TopicResolver::new(self.messenger.clone(), self.event_tx.clone(), destination);
        let publisher = Publisher::new(
            self.messenger.clone(),
            self.prober.clone(),
            &self.config.publish,
        );

        let mut processed: u32 = 0;
        let mut failed: u32 = 0;
        let mut sequence: u32 = 0;
        let mut outcome = RunOutcome::Exhausted;

        let start_index = start_line.saturating_sub(1).min(total);
        for (offset, raw) in lines[start_index..].iter().enumerate() {
            let line_number = start_line + offset;

            if cancel.is_cancelled() {
                info!(user = user.get(), line = line_number, "run cancelled");
                outcome = RunOutcome::Cancelled;
                break;
            }

            let entry = match manifest::parse_line(raw, line_number) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(line = line_number, error = %e, "skipping malformed line");
                    failed += 1;
                    self.emit_event(Event::LineFailed {
                        line: line_number,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let subject = entry.routing_subject().to_string();
            let topic = resolver.resolve(&subject).await;
            let clean_name = entry.safe_name();

            let item_status = self
                .send_quietly(
                    chat,
                    &format!("⬇️ [{line_number}/{total}] Downloading: {clean_name}"),
                )
                .await;

            let Some(local) = self
                .fetch_with_retry(&entry, &clean_name, line_number, total, item_status)
                .await
            else {
                failed += 1;
                self.emit_event(Event::LineFailed {
                    line: line_number,
                    reason: format!("fetch failed for {}", entry.url),
                });
                if let Some(status) = item_status {
                    self.delete_quietly(status).await;
                }
                continue;
            };

            // Sequence numbers are only spent on files that actually exist
            sequence += 1;
            let caption = format!(
                "{sequence}\n{}\n{batch_label}\nDownloaded by {credit}",
                entry.title
            );

            if let Some(status) = item_status {
                self.edit_quietly(
                    status,
                    &format!("📤 [{line_number}/{total}] Uploading: {clean_name}"),
                )
                .await;
            }

            if publisher.publish(&local, &caption, destination, topic).await {
                processed += 1;
                info!(line = line_number, subject = %subject, sequence, "line published");
                self.emit_event(Event::LinePublished {
                    line: line_number,
                    subject,
                    sequence,
                });
            } else {
                failed += 1;
                // Give the unused number back to the next line
                sequence -= 1;
                self.emit_event(Event::LineFailed {
                    line: line_number,
                    reason: format!("publish failed for {clean_name}"),
                });
            }

            remove_local_file(&local).await;

            if let Some(progress_ref) = progress {
                self.edit_quietly(
                    progress_ref,
                    &format!(
                        "🚀 Processing:\n\
                         • Current line: {line_number}/{total}\n\
                         • Completed: {processed}\n\
                         • Failed: {failed}\n\
                         • Batch: {batch_label}"
                    ),
                )
                .await;
            }

            tokio::time::sleep(self.config.fetch.inter_item_delay).await;

            if let Some(status) = item_status {
                self.delete_quietly(status).await;
            }
        }

        let finished_at = Utc::now();
        info!(
            user = user.get(),
            processed,
            failed,
            outcome = ?outcome,
            "run finished"
        );

        if let Some(progress_ref) = progress {
            self.edit_quietly(
                progress_ref,
                &format!(
                    "✅ Completed!\n\
                     • Uploaded: {processed}\n\
                     • Failed: {failed}\n\
                     • Total: {}",
                    processed + failed
                ),
            )
            .await;
        }

        self.emit_event(Event::RunFinished {
            user_id: user,
            processed,
            failed,
            outcome,
        });

        RunSummary {
            outcome,
            processed,
            failed,
            total_lines: total,
            started_at,
            finished_at,
        }
    }

    /// One immediate retry after a failed fetch, with status edits along the
    /// way. Answers the local path, or `None` once both attempts failed.
    async fn fetch_with_retry(
        &self,
        entry: &ManifestEntry,
        clean_name: &str,
        line_number: usize,
        total: usize,
        item_status: Option<MessageRef>,
    ) -> Option<PathBuf> {
        match self.fetcher.fetch(&entry.url, clean_name).await {
            Ok(path) => return Some(path),
            Err(e) => {
                warn!(line = line_number, error = %e, "fetch failed, retrying once");
                if let Some(status) = item_status {
                    self.edit_quietly(
                        status,
                        &format!("⚠️ [{line_number}/{total}] Retry download: {clean_name}"),
                    )
                    .await;
                }
            }
        }

        tokio::time::sleep(self.config.fetch.fetch_retry_delay).await;

        match self.fetcher.fetch(&entry.url, clean_name).await {
            Ok(path) => Some(path),
            Err(e) => {
                error!(
                    line = line_number,
                    url = %entry.url,
                    error = %e,
                    "fetch failed twice, giving up on the line"
                );
                if let Some(status) = item_status {
                    self.edit_quietly(
                        status,
                        &format!("❌ [{line_number}/{total}] Failed: {clean_name}"),
                    )
                    .await;
                }
                None
            }
        }
    }
}

async fn remove_local_file(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "failed to remove fetched file");
        }
    }
}
