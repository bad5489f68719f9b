//! Script trigger: polls a user script and maps its exit code to a signal.
//!
//! Exit code `0` reveals, anything else hides. A run is bounded by
//! [`SCRIPT_TIMEOUT`] and killed afterwards.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::process::Command;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use menushade_protocol::TriggerSignal;
use menushade_protocol::constants::{MIN_SCRIPT_INTERVAL, SCRIPT_FAILURE_EXIT_CODE, SCRIPT_TIMEOUT};

use crate::arbitrator::ArbitratorHandle;

/// Why a script run produced no exit code.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("script not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("script not executable: {}", .0.display())]
    NotExecutable(PathBuf),

    #[error("failed to run script: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("script timed out")]
    TimedOut,
}

impl ScriptError {
    /// Signal to post for this failure, if any. Launch failures and
    /// timeouts count as a nonzero exit; a bad path posts nothing.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::NotFound(_) | Self::NotExecutable(_) => None,
            Self::Spawn(_) | Self::TimedOut => Some(SCRIPT_FAILURE_EXIT_CODE),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScriptTriggerConfig {
    /// Command line handed to `/bin/sh -c`. Surrounding whitespace is ignored.
    pub path: String,
    pub interval: Duration,
}

impl Default for ScriptTriggerConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            interval: Duration::from_secs(10),
        }
    }
}

impl ScriptTriggerConfig {
    /// Interval clamped to [`MIN_SCRIPT_INTERVAL`].
    pub fn effective_interval(&self) -> Duration {
        self.interval.max(MIN_SCRIPT_INTERVAL)
    }
}

/// Runs the script once and returns its exit code.
///
/// `Ok(None)` means the path was empty and nothing ran.
pub async fn run_script(path: &str) -> Result<Option<i32>, ScriptError> {
    run_script_with_timeout(path, SCRIPT_TIMEOUT).await
}

async fn run_script_with_timeout(path: &str, limit: Duration) -> Result<Option<i32>, ScriptError> {
    let path = path.trim();
    if path.is_empty() {
        return Ok(None);
    }
    check_executable(Path::new(path))?;

    let mut child = Command::new("/bin/sh")
        .arg("-c")
        .arg(path)
        .kill_on_drop(true)
        .spawn()?;

    match tokio::time::timeout(limit, child.wait()).await {
        Ok(status) => Ok(Some(status?.code().unwrap_or(SCRIPT_FAILURE_EXIT_CODE))),
        Err(_) => {
            let _ = child.kill().await;
            Err(ScriptError::TimedOut)
        }
    }
}

fn check_executable(path: &Path) -> Result<(), ScriptError> {
    let metadata = std::fs::metadata(path).map_err(|_| ScriptError::NotFound(path.into()))?;
    if !metadata.is_file() || !is_executable(&metadata) {
        return Err(ScriptError::NotExecutable(path.into()));
    }
    Ok(())
}

#[cfg(unix)]
fn is_executable(metadata: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &std::fs::Metadata) -> bool {
    true
}

/// Periodic script producer. `start` and `stop` are idempotent.
pub struct ScriptTrigger {
    handle: ArbitratorHandle,
    config: ScriptTriggerConfig,
    cancel: Option<CancellationToken>,
}

impl ScriptTrigger {
    pub fn new(handle: ArbitratorHandle, config: ScriptTriggerConfig) -> Self {
        Self {
            handle,
            config,
            cancel: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.cancel.is_some()
    }

    pub fn start(&mut self) {
        if self.cancel.is_some() {
            return;
        }
        let interval = self.config.effective_interval();
        info!(
            interval_secs = format_args!("{:.1}", interval.as_secs_f64()),
            "starting script trigger"
        );

        let cancel = CancellationToken::new();
        tokio::spawn(poll_loop(
            self.handle.clone(),
            self.config.path.clone(),
            interval,
            cancel.clone(),
        ));
        self.cancel = Some(cancel);
    }

    pub fn stop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
            info!("stopped script trigger");
        }
    }

    /// Applies a new configuration, restarting only if already running.
    pub fn restart_if_running(&mut self, config: ScriptTriggerConfig) {
        self.config = config;
        if self.is_running() {
            self.stop();
            self.start();
        }
    }
}

impl Drop for ScriptTrigger {
    fn drop(&mut self) {
        self.stop();
    }
}

/// One run per tick; a run never overlaps the previous one because the
/// loop awaits it, and ticks missed meanwhile are skipped.
async fn poll_loop(
    handle: ArbitratorHandle,
    path: String,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker.tick().await; // Skip immediate first tick.

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let code = match run_script(&path).await {
                    Ok(Some(code)) => code,
                    Ok(None) => continue,
                    Err(e) => {
                        warn!(path = %path.trim(), error = %e, "script trigger run failed");
                        match e.exit_code() {
                            Some(code) => code,
                            None => continue,
                        }
                    }
                };
                debug!(exit_code = code, "script trigger finished");
                if !handle.post(TriggerSignal::ScriptExit(code)).await {
                    break;
                }
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    use menushade_protocol::VisibilityState;

    use crate::testing::{spawn_arbitrator, wait_for_state};

    fn write_script(dir: &Path, name: &str, body: &str, mode: u32) -> String {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(mode)).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[tokio::test]
    async fn empty_path_is_skipped() {
        assert!(matches!(run_script("").await, Ok(None)));
        assert!(matches!(run_script("  \n").await, Ok(None)));
    }

    #[tokio::test]
    async fn missing_script_posts_nothing() {
        let err = run_script("/nonexistent/menushade/script.sh")
            .await
            .unwrap_err();
        assert!(matches!(err, ScriptError::NotFound(_)));
        assert_eq!(err.exit_code(), None);
    }

    #[tokio::test]
    async fn non_executable_script_posts_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_script(dir.path(), "plain.sh", "exit 0", 0o644);
        let err = run_script(&path).await.unwrap_err();
        assert!(matches!(err, ScriptError::NotExecutable(_)));
        assert_eq!(err.exit_code(), None);

        let err = run_script(&dir.path().to_string_lossy()).await.unwrap_err();
        assert!(matches!(err, ScriptError::NotExecutable(_)));
    }

    #[tokio::test]
    async fn reports_exit_codes() {
        let dir = tempfile::tempdir().unwrap();
        let ok = write_script(dir.path(), "ok.sh", "exit 0", 0o755);
        let fail = write_script(dir.path(), "fail.sh", "exit 3", 0o755);

        assert_eq!(run_script(&ok).await.unwrap(), Some(0));
        assert_eq!(run_script(&format!("  {fail} ")).await.unwrap(), Some(3));
    }

    #[tokio::test]
    async fn slow_script_is_killed() {
        let dir = tempfile::tempdir().unwrap();
        let slow = write_script(dir.path(), "slow.sh", "sleep 5", 0o755);

        let started = std::time::Instant::now();
        let err = run_script_with_timeout(&slow, Duration::from_millis(200))
            .await
            .unwrap_err();
        assert!(matches!(err, ScriptError::TimedOut));
        assert_eq!(err.exit_code(), Some(SCRIPT_FAILURE_EXIT_CODE));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn interval_is_clamped() {
        let config = ScriptTriggerConfig {
            path: String::new(),
            interval: Duration::from_millis(10),
        };
        assert_eq!(config.effective_interval(), Duration::from_secs(1));
        let config = ScriptTriggerConfig {
            interval: Duration::from_secs(30),
            ..config
        };
        assert_eq!(config.effective_interval(), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn start_and_stop_are_idempotent() {
        let handle = spawn_arbitrator();
        let mut trigger = ScriptTrigger::new(handle, ScriptTriggerConfig::default());

        trigger.restart_if_running(ScriptTriggerConfig::default());
        assert!(!trigger.is_running());

        trigger.start();
        trigger.start();
        assert!(trigger.is_running());
        trigger.stop();
        trigger.stop();
        assert!(!trigger.is_running());
    }

    #[tokio::test]
    async fn zero_exit_reveals() {
        let dir = tempfile::tempdir().unwrap();
        let ok = write_script(dir.path(), "ok.sh", "exit 0", 0o755);
        let handle = spawn_arbitrator();

        let mut trigger = ScriptTrigger::new(
            handle.clone(),
            ScriptTriggerConfig {
                path: ok,
                interval: Duration::from_secs(1),
            },
        );
        trigger.start();
        wait_for_state(&handle, VisibilityState::Expanded).await;
        trigger.stop();
    }
}
