//! Production wiring and the long-polling update loop
//!
//! [`RelayBot`] assembles a [`SubjectRelay`] over the real collaborators
//! (HTTP Bot API client, CLI downloader, CLI prober when the media tools are
//! installed) and drives it from a `getUpdates` long-poll. Updates are
//! dispatched strictly in order, which is what makes the configuration
//! conversation safe; batch runs leave the loop via their own task, so a
//! `/stop` arriving mid-run is still seen.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::Error;
use crate::fetch::{AssetFetcher, CliAssetFetcher};
use crate::probe::{CliMediaProber, MediaProber, NoOpMediaProber};
use crate::relay::SubjectRelay;
use crate::telegram::types::User;
use crate::telegram::{BotApiClient, Messenger};

/// Pause before the second (and last) startup handshake attempt
const STARTUP_RETRY_DELAY: Duration = Duration::from_secs(3);
/// Pause after a failed poll before calling `getUpdates` again
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

/// The assembled bot: a [`SubjectRelay`] plus the client polling for it.
pub struct RelayBot {
    relay: SubjectRelay,
    client: BotApiClient,
}

impl RelayBot {
    /// Wire up the production collaborators from configuration.
    ///
    /// Creates the work directory, builds the Bot API client, resolves the
    /// downloader binary, and picks the media prober: the CLI prober when
    /// ffmpeg and ffprobe can be resolved, the no-op prober otherwise.
    ///
    /// # Errors
    ///
    /// Fails when the bot token is empty, the work directory cannot be
    /// created, or the downloader binary cannot be resolved.
    pub async fn new(config: Config) -> crate::Result<Self> {
        let client = BotApiClient::new(&config.telegram)?;

        tokio::fs::create_dir_all(config.work_dir())
            .await
            .map_err(|e| Error::Config {
                message: format!(
                    "cannot create work directory {}: {e}",
                    config.work_dir().display()
                ),
                key: Some("work_dir".to_string()),
            })?;

        let fetcher = CliAssetFetcher::from_config(&config.tools, &config.fetch)?;
        info!(fetcher = fetcher.name(), "downloader resolved");

        let prober: Arc<dyn MediaProber> = match CliMediaProber::from_config(&config.tools) {
            Some(prober) => {
                info!("ffmpeg/ffprobe resolved, video probing enabled");
                Arc::new(prober)
            }
            None => {
                warn!("ffmpeg/ffprobe not found, videos go out without duration or thumbnail");
                Arc::new(NoOpMediaProber)
            }
        };

        let relay = SubjectRelay::new(
            Arc::new(client.clone()) as Arc<dyn Messenger>,
            Arc::new(fetcher) as Arc<dyn AssetFetcher>,
            prober,
            config,
        );

        Ok(Self { relay, client })
    }

    /// The relay behind this bot, for subscribing to events.
    pub fn relay(&self) -> &SubjectRelay {
        &self.relay
    }

    /// Poll for updates and dispatch them until `shutdown` trips.
    ///
    /// Poll failures back off and retry indefinitely; only a failed startup
    /// handshake is fatal.
    ///
    /// # Errors
    ///
    /// Fails when the startup handshake (`getMe`) fails twice in a row,
    /// which usually means a bad token or an unreachable API host.
    pub async fn run(self, shutdown: CancellationToken) -> crate::Result<()> {
        let me = self.handshake().await?;
        info!(
            bot = me.username.as_deref().unwrap_or(&me.first_name),
            "connected to the Bot API, polling for updates"
        );

        let mut offset: Option<i64> = None;
        loop {
            let poll = tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("shutdown requested, leaving the polling loop");
                    return Ok(());
                }
                result = self.client.get_updates(offset) => result,
            };

            let updates = match poll {
                Ok(updates) => updates,
                Err(e) => {
                    warn!(error = %e, "polling failed, backing off");
                    tokio::select! {
                        _ = shutdown.cancelled() => return Ok(()),
                        _ = tokio::time::sleep(POLL_RETRY_DELAY) => {}
                    }
                    continue;
                }
            };

            for update in updates {
                // Confirm the update first: a handler crash must not make the
                // poller re-deliver it forever
                offset = Some(update.update_id + 1);
                self.relay.handle_update(update).await;
            }
        }
    }

    /// Identify the bot, giving the API one more chance after a failure.
    async fn handshake(&self) -> crate::Result<User> {
        match self.client.get_me().await {
            Ok(me) => Ok(me),
            Err(first) => {
                warn!(error = %first, "startup handshake failed, retrying once");
                tokio::time::sleep(STARTUP_RETRY_DELAY).await;
                self.client
                    .get_me()
                    .await
                    .map_err(|e| Error::Startup(format!("Bot API handshake failed twice: {e}")))
            }
        }
    }
}
