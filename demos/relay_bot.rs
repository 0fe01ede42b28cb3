//! Runnable relay bot wired from environment variables
//!
//! This example demonstrates the full production surface:
//! - Building a configuration from the environment
//! - Creating a bot instance
//! - Subscribing to run events
//! - Polling with graceful signal handling
//!
//! Environment:
//! - `BOT_TOKEN`        (required) token issued by BotFather
//! - `ALLOWED_USERS`    (optional) comma-separated numeric user ids
//! - `WORK_DIR`         (optional) spool directory, default "./downloads"
//! - `DOWNLOADER_PATH`  (optional) explicit downloader binary
//!
//! Run with: `BOT_TOKEN=... cargo run --example relay_bot`

use subject_relay::{Config, Event, RelayBot, UserId, run_with_shutdown};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Log to stderr; RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Build configuration from the environment
    let mut config = Config::default();
    config.telegram.bot_token = std::env::var("BOT_TOKEN")?;
    if let Ok(list) = std::env::var("ALLOWED_USERS") {
        config.access.allowed_user_ids = list
            .split(',')
            .filter_map(|id| id.trim().parse().ok())
            .map(UserId::new)
            .collect();
    }
    if let Ok(dir) = std::env::var("WORK_DIR") {
        config.fetch.work_dir = dir.into();
    }
    if let Ok(path) = std::env::var("DOWNLOADER_PATH") {
        config.tools.downloader_path = Some(path.into());
    }

    // Create the bot instance
    let bot = RelayBot::new(config).await?;

    // Subscribe to events
    let mut events = bot.relay().subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                Event::ManifestAccepted { user_id, lines } => {
                    println!("📋 Manifest from {}: {} items", user_id, lines);
                }
                Event::RunStarted {
                    user_id,
                    start_line,
                    total,
                    batch_label,
                } => {
                    println!(
                        "🚀 Run \"{}\" for {} from line {} of {}",
                        batch_label, user_id, start_line, total
                    );
                }
                Event::TopicCreated { subject, topic_id } => {
                    println!("📌 Topic {} created for [{}]", topic_id, subject);
                }
                Event::TopicFallback { subject } => {
                    println!("⚠ [{}] delivers to the plain channel", subject);
                }
                Event::LinePublished {
                    line,
                    subject,
                    sequence,
                } => {
                    println!("✓ Line {} published under [{}] as #{}", line, subject, sequence);
                }
                Event::LineFailed { line, reason } => {
                    println!("✗ Line {} failed: {}", line, reason);
                }
                Event::RunFinished {
                    processed,
                    failed,
                    outcome,
                    ..
                } => {
                    println!(
                        "🏁 Run finished ({:?}): {} uploaded, {} failed",
                        outcome, processed, failed
                    );
                }
            }
        }
    });

    // Poll until SIGTERM/SIGINT
    run_with_shutdown(bot).await?;

    Ok(())
}
