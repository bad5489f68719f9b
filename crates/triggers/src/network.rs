//! Network trigger: posts the current network identity whenever it changes.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use menushade_protocol::TriggerSignal;

use crate::arbitrator::ArbitratorHandle;

/// Boxed future returned by [`NetworkIdentitySource::current`].
pub type IdentityFuture<'a> = Pin<Box<dyn Future<Output = Option<String>> + Send + 'a>>;

/// Platform query for the current network identity (e.g. the Wi-Fi SSID).
pub trait NetworkIdentitySource: Send + Sync {
    /// `None` when disconnected or unknown.
    fn current(&self) -> IdentityFuture<'_>;
}

const IDENTITY_TIMEOUT: Duration = Duration::from_secs(5);

/// Reads the identity from the first line of a command's standard output.
///
/// A failing or silent command reads as disconnected.
pub struct CommandIdentitySource {
    argv: Vec<String>,
}

impl CommandIdentitySource {
    /// Returns `None` for an empty command line.
    pub fn new(argv: Vec<String>) -> Option<Self> {
        if argv.first().is_none_or(|p| p.trim().is_empty()) {
            return None;
        }
        Some(Self { argv })
    }
}

impl NetworkIdentitySource for CommandIdentitySource {
    fn current(&self) -> IdentityFuture<'_> {
        Box::pin(async move {
            let output = Command::new(&self.argv[0])
                .args(&self.argv[1..])
                .kill_on_drop(true)
                .output();
            let output = match tokio::time::timeout(IDENTITY_TIMEOUT, output).await {
                Ok(Ok(output)) => output,
                Ok(Err(e)) => {
                    warn!(program = %self.argv[0], error = %e, "network identity command failed");
                    return None;
                }
                Err(_) => {
                    warn!(program = %self.argv[0], "network identity command timed out");
                    return None;
                }
            };
            if !output.status.success() {
                return None;
            }
            // Whitespace inside the identity is significant; only the line
            // terminator is dropped.
            String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .filter(|id| !id.is_empty())
                .map(str::to_string)
        })
    }
}

/// Polling producer over a [`NetworkIdentitySource`]. `start` and `stop`
/// are idempotent.
pub struct NetworkTrigger {
    handle: ArbitratorHandle,
    source: Arc<dyn NetworkIdentitySource>,
    poll: Duration,
    cancel: Option<CancellationToken>,
}

impl NetworkTrigger {
    pub fn new(handle: ArbitratorHandle, source: Arc<dyn NetworkIdentitySource>, poll: Duration) -> Self {
        Self {
            handle,
            source,
            poll: poll.max(Duration::from_secs(1)),
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
        info!(poll_secs = self.poll.as_secs(), "starting network trigger");
        let cancel = CancellationToken::new();
        tokio::spawn(watch_identity(
            self.handle.clone(),
            Arc::clone(&self.source),
            self.poll,
            cancel.clone(),
        ));
        self.cancel = Some(cancel);
    }

    pub fn stop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
            info!("stopped network trigger");
        }
    }
}

impl Drop for NetworkTrigger {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn watch_identity(
    handle: ArbitratorHandle,
    source: Arc<dyn NetworkIdentitySource>,
    poll: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(poll);
    // `None` until the first observation, so the initial identity is posted.
    let mut last: Option<Option<String>> = None;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let current = source.current().await;
                if last.as_ref() == Some(&current) {
                    continue;
                }
                debug!(network = current.as_deref().unwrap_or("<none>"), "network identity changed");
                last = Some(current.clone());
                if !handle.post(TriggerSignal::NetworkIdentity(current)).await {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use menushade_protocol::VisibilityState;

    use crate::policy::TriggerPolicy;
    use crate::testing::{spawn_arbitrator_with, wait_for_state};

    /// Returns a scripted identity and counts queries.
    #[derive(Default)]
    struct ScriptedSource {
        current: Mutex<Option<String>>,
        queries: AtomicUsize,
    }

    impl ScriptedSource {
        fn set(&self, id: Option<&str>) {
            *self.current.lock().unwrap() = id.map(str::to_string);
        }
    }

    impl NetworkIdentitySource for ScriptedSource {
        fn current(&self) -> IdentityFuture<'_> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            let id = self.current.lock().unwrap().clone();
            Box::pin(async move { id })
        }
    }

    #[test]
    fn command_source_rejects_empty_command() {
        assert!(CommandIdentitySource::new(Vec::new()).is_none());
        assert!(CommandIdentitySource::new(vec![" ".into()]).is_none());
        assert!(CommandIdentitySource::new(vec!["iwgetid".into(), "-r".into()]).is_some());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn command_source_reads_first_line() {
        let source = CommandIdentitySource::new(vec![
            "/bin/sh".into(),
            "-c".into(),
            "printf 'Home WiFi\\r\\nextra\\n'".into(),
        ])
        .unwrap();
        assert_eq!(source.current().await.as_deref(), Some("Home WiFi"));

        let silent = CommandIdentitySource::new(vec!["/bin/sh".into(), "-c".into(), "true".into()])
            .unwrap();
        assert_eq!(silent.current().await, None);

        let failing =
            CommandIdentitySource::new(vec!["/bin/sh".into(), "-c".into(), "echo x; exit 1".into()])
                .unwrap();
        assert_eq!(failing.current().await, None);

        let missing = CommandIdentitySource::new(vec!["/nonexistent/ssid".into()]).unwrap();
        assert_eq!(missing.current().await, None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn command_source_keeps_surrounding_whitespace() {
        let padded = CommandIdentitySource::new(vec![
            "/bin/sh".into(),
            "-c".into(),
            "printf ' HomeWiFi\\n'".into(),
        ])
        .unwrap();
        let identity = padded.current().await;
        assert_eq!(identity.as_deref(), Some(" HomeWiFi"));

        let policy = TriggerPolicy {
            trusted_networks: vec![" HomeWiFi".into()],
            ..Default::default()
        };
        assert!(policy.matches_network(identity.as_deref()));
        assert!(!policy.matches_network(Some("HomeWiFi")));

        let blank =
            CommandIdentitySource::new(vec!["/bin/sh".into(), "-c".into(), "printf '  \\n'".into()])
                .unwrap();
        assert_eq!(blank.current().await.as_deref(), Some("  "));
    }

    #[tokio::test(start_paused = true)]
    async fn posts_only_on_change() {
        let handle = spawn_arbitrator_with(TriggerPolicy {
            auto_rehide: false,
            trusted_networks: vec!["Home".into()],
            ..Default::default()
        });
        let source = Arc::new(ScriptedSource::default());
        source.set(Some("Cafe"));

        let mut trigger = NetworkTrigger::new(handle.clone(), source.clone(), Duration::from_secs(2));
        trigger.start();
        trigger.start();

        tokio::time::sleep(Duration::from_secs(7)).await;
        assert!(source.queries.load(Ordering::SeqCst) >= 4);
        assert_eq!(handle.state(), VisibilityState::Hidden);

        source.set(Some("Home"));
        wait_for_state(&handle, VisibilityState::Expanded).await;

        // Same identity again: no new signal, so a manual hide sticks.
        assert_eq!(handle.hide().await, Ok(true));
        tokio::time::sleep(Duration::from_secs(7)).await;
        assert_eq!(handle.state(), VisibilityState::Hidden);

        source.set(None);
        tokio::time::sleep(Duration::from_secs(3)).await;
        source.set(Some("Home"));
        wait_for_state(&handle, VisibilityState::Expanded).await;

        trigger.stop();
        trigger.stop();
        assert!(!trigger.is_running());
        let queries = source.queries.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(source.queries.load(Ordering::SeqCst), queries);
    }
}
