//! Fake downloader binaries and relay configuration for integration tests

use std::path::{Path, PathBuf};
use std::time::Duration;

use subject_relay::Config;

use super::fake_api::TOKEN;

/// Write an executable shell script posing as the downloader CLI.
///
/// The script honors the real invocation contract (`-u <url> -o <output>`),
/// appends the output path to `calls.log` next to itself, and writes a fixed
/// payload to the output path.
#[cfg(unix)]
pub fn fake_downloader(dir: &Path) -> PathBuf {
    write_downloader(dir, "printf 'asset payload' > \"$out\"\n")
}

/// A downloader that logs its call but always exits 1
#[cfg(unix)]
pub fn failing_downloader(dir: &Path) -> PathBuf {
    write_downloader(dir, "echo 'scripted failure' >&2\nexit 1\n")
}

/// A downloader that sleeps before succeeding, for cancellation timing
#[cfg(unix)]
pub fn slow_downloader(dir: &Path, delay: Duration) -> PathBuf {
    let action = format!(
        "sleep {}\nprintf 'asset payload' > \"$out\"\n",
        delay.as_secs_f64()
    );
    write_downloader(dir, &action)
}

#[cfg(unix)]
#[allow(clippy::unwrap_used)]
fn write_downloader(dir: &Path, action: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-downloader.sh");
    let log = dir.join("calls.log");
    let script = format!(
        "#!/bin/sh\n\
         out=\"\"\n\
         while [ \"$#\" -gt 0 ]; do\n\
         \x20\x20if [ \"$1\" = \"-o\" ]; then out=\"$2\"; shift 2; else shift 1; fi\n\
         done\n\
         echo \"$out\" >> \"{}\"\n\
         {action}",
        log.display()
    );
    std::fs::write(&path, script).unwrap();
    let mut permissions = std::fs::metadata(&path).unwrap().permissions();
    permissions.set_mode(0o755);
    std::fs::set_permissions(&path, permissions).unwrap();
    path
}

/// Number of downloader invocations recorded in `dir`'s call log
pub fn downloader_calls(dir: &Path) -> usize {
    std::fs::read_to_string(dir.join("calls.log"))
        .map(|log| log.lines().count())
        .unwrap_or(0)
}

/// Relay configuration aimed at a mock API server, tuned for fast tests
pub fn relay_config(api_base: String, work_dir: &Path, downloader: PathBuf) -> Config {
    let mut config = Config::default();
    config.telegram.bot_token = TOKEN.to_string();
    config.telegram.api_base = api_base;
    config.telegram.poll_timeout = Duration::from_secs(0);
    config.fetch.work_dir = work_dir.to_path_buf();
    config.fetch.fetch_retry_delay = Duration::from_millis(5);
    config.fetch.inter_item_delay = Duration::ZERO;
    config.tools.downloader_path = Some(downloader);
    config.tools.search_path = false;
    config.publish.retry.max_attempts = 3;
    config.publish.retry.initial_delay = Duration::from_millis(5);
    config.publish.retry.max_delay = Duration::from_millis(20);
    config.publish.retry.jitter = false;
    config
}
