//! # subject-relay
//!
//! Telegram bot library that republishes subject-tagged media manifests into
//! per-subject forum topics.
//!
//! ## Design Philosophy
//!
//! subject-relay is designed to be:
//! - **Conversation-driven** - Each run is configured in chat, one answer at a time
//! - **Sensible defaults** - Works out of the box with just a bot token
//! - **Library-first** - The polling loop is a thin shell over an embeddable core
//! - **Event-driven** - Consumers subscribe to events, no polling required
//!
//! ## Quick Start
//!
//! ```no_run
//! use subject_relay::{Config, RelayBot, run_with_shutdown};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.telegram.bot_token = std::env::var("BOT_TOKEN")?;
//!
//!     let bot = RelayBot::new(config).await?;
//!
//!     // Subscribe to events
//!     let mut events = bot.relay().subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     // Poll with automatic signal handling
//!     run_with_shutdown(bot).await?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Production wiring and the long-polling loop
pub mod bot;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Asset fetching through the external downloader CLI
pub mod fetch;
/// Manifest line parsing and subject extraction
pub mod manifest;
/// Media probing for video duration and thumbnails
pub mod probe;
/// Core relay implementation (decomposed into focused submodules)
pub mod relay;
/// Retry logic with exponential backoff
pub mod retry;
/// Bot API client and messaging traits
pub mod telegram;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use bot::RelayBot;
pub use config::{
    AccessConfig, Config, FetchConfig, PublishConfig, RetryConfig, TelegramConfig, ToolsConfig,
};
pub use error::{Error, FetchError, ManifestError, Result, TelegramError};
pub use fetch::{AssetFetcher, CliAssetFetcher};
pub use manifest::{ManifestEntry, manifest_lines, parse_line};
pub use probe::{CliMediaProber, MediaProber, NoOpMediaProber};
pub use relay::{AnswerOutcome, ConversationSession, RunConfig, SetupStep, SubjectRelay};
pub use telegram::{BotApiClient, DocumentUpload, Messenger, VideoUpload};
pub use types::{
    ChatId, Event, MediaKind, MessageId, MessageRef, RunOutcome, RunSummary, TopicId, UserId,
};

/// Helper function to run the bot with graceful signal handling.
///
/// Polls until a termination signal arrives, then leaves the loop cleanly.
/// A batch run in flight keeps its own task; cancel it with `/stop` before
/// shutting down if it should not finish.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use subject_relay::{Config, RelayBot, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = Config::default();
///     let bot = RelayBot::new(config).await?;
///
///     // Run with automatic signal handling
///     run_with_shutdown(bot).await?;
///
///     Ok(())
/// }
/// ```
///
/// # Errors
///
/// Returns whatever [`RelayBot::run`] returns; in practice only a failed
/// startup handshake.
pub async fn run_with_shutdown(bot: RelayBot) -> Result<()> {
    let shutdown = tokio_util::sync::CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        signal_token.cancel();
    });
    bot.run(shutdown).await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
