//! CLI-based asset fetcher using an external downloader binary

use super::AssetFetcher;
use crate::config::{FetchConfig, ToolsConfig};
use crate::error::FetchError;
use crate::types::MediaKind;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

/// Asset fetcher that shells out to an external downloader binary
///
/// The binary is invoked as `<downloader> -u <url> -o <output-path>` and must
/// exit zero after writing the output file. A non-zero exit status or a
/// missing output file is treated as failure, and any partial file at the
/// output path is removed before the failure is reported.
///
/// # Examples
///
/// ```no_run
/// use subject_relay::fetch::{AssetFetcher, CliAssetFetcher};
/// use std::path::PathBuf;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// // Create with explicit paths
/// let fetcher = CliAssetFetcher::new(
///     PathBuf::from("/usr/local/bin/appxdl"),
///     PathBuf::from("./downloads"),
/// );
///
/// let path = fetcher.fetch("http://host/notes.pdf", "Week 3 Notes").await?;
/// # Ok(())
/// # }
/// ```
pub struct CliAssetFetcher {
    binary_path: PathBuf,
    work_dir: PathBuf,
    timeout: Option<Duration>,
}

impl CliAssetFetcher {
    /// Create a new fetcher with explicit binary and work directory paths
    pub fn new(binary_path: PathBuf, work_dir: PathBuf) -> Self {
        Self {
            binary_path,
            work_dir,
            timeout: None,
        }
    }

    /// Set a time limit for one downloader invocation
    ///
    /// `None` (the default) lets the downloader run until it exits on its own.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build a fetcher from configuration
    ///
    /// Uses the explicitly configured downloader path when set, otherwise
    /// searches PATH for the configured binary name (if `search_path` is
    /// enabled).
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::BinaryUnavailable`] if no explicit path is
    /// configured and the binary cannot be found.
    pub fn from_config(tools: &ToolsConfig, fetch: &FetchConfig) -> crate::Result<Self> {
        let binary_path = match &tools.downloader_path {
            Some(path) => path.clone(),
            None if tools.search_path => which::which(&tools.downloader_name)
                .map_err(|_| FetchError::BinaryUnavailable)?,
            None => return Err(FetchError::BinaryUnavailable.into()),
        };

        Ok(Self {
            binary_path,
            work_dir: fetch.work_dir.clone(),
            timeout: fetch.fetch_timeout,
        })
    }

    fn output_path(&self, url: &str, base_name: &str) -> PathBuf {
        let kind = MediaKind::from_url(url);
        self.work_dir
            .join(format!("{base_name}.{}", kind.extension()))
    }
}

#[async_trait]
impl AssetFetcher for CliAssetFetcher {
    async fn fetch(&self, url: &str, base_name: &str) -> crate::Result<PathBuf> {
        let out_path = self.output_path(url, base_name);

        tracing::debug!(
            url = %url,
            output = %out_path.display(),
            "invoking downloader"
        );

        let mut command = Command::new(&self.binary_path);
        command
            .arg("-u")
            .arg(url)
            .arg("-o")
            .arg(&out_path)
            .kill_on_drop(true);

        let run = command.output();
        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, run).await {
                Ok(result) => result,
                Err(_) => {
                    remove_partial(&out_path).await;
                    return Err(FetchError::TimedOut {
                        url: url.to_string(),
                        timeout: limit,
                    }
                    .into());
                }
            },
            None => run.await,
        }
        .map_err(|e| FetchError::Spawn(e.to_string()))?;

        if !output.status.success() {
            remove_partial(&out_path).await;
            return Err(FetchError::Failed {
                url: url.to_string(),
                status: output
                    .status
                    .code()
                    .map_or_else(|| "killed by signal".to_string(), |c| format!("exit {c}")),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }

        if tokio::fs::metadata(&out_path).await.is_err() {
            return Err(FetchError::MissingOutput { path: out_path }.into());
        }

        Ok(out_path)
    }

    fn name(&self) -> &'static str {
        "cli-downloader"
    }
}

/// Remove a partially-written output file, tolerating its absence
async fn remove_partial(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "removed partial download");
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "could not remove partial download"
            );
        }
    }
}
