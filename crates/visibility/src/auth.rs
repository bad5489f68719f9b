//! Credential challenge gating reveals.
//!
//! [`AuthGate`] wraps a platform [`CredentialChallenge`] behind a boolean
//! contract and coalesces concurrent requests: while a challenge is in
//! flight, later callers wait for its outcome instead of opening a second
//! prompt.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tracing::{debug, info, warn};

/// A boxed future returned by credential backends.
pub type ChallengeFuture<'a> = Pin<Box<dyn Future<Output = bool> + Send + 'a>>;

/// Platform credential challenge (device-owner password, biometrics).
///
/// Must be user-cancelable; any outcome other than success is `false`.
pub trait CredentialChallenge: Send + Sync {
    fn challenge<'a>(&'a self, reason: &'a str) -> ChallengeFuture<'a>;
}

/// Proof that a credential challenge succeeded.
///
/// Only [`AuthGate`] can create one, so holding a grant means the reveal
/// was authenticated.
#[derive(Debug, Clone)]
pub struct AuthGrant {
    _private: (),
}

#[cfg(test)]
impl AuthGrant {
    pub(crate) fn for_tests() -> Self {
        Self { _private: () }
    }
}

type Outcome = watch::Receiver<Option<bool>>;

/// Coalescing wrapper around a [`CredentialChallenge`].
pub struct AuthGate {
    backend: Arc<dyn CredentialChallenge>,
    in_flight: Mutex<Option<Outcome>>,
}

impl AuthGate {
    pub fn new(backend: Arc<dyn CredentialChallenge>) -> Self {
        Self {
            backend,
            in_flight: Mutex::new(None),
        }
    }

    /// Runs (or joins) a credential challenge. Returns a grant on success.
    pub async fn challenge(&self, reason: &str) -> Option<AuthGrant> {
        let granted = self.authenticate(reason).await;
        granted.then_some(AuthGrant { _private: () })
    }

    /// Runs (or joins) a credential challenge.
    ///
    /// A caller arriving while another challenge is pending observes that
    /// challenge's outcome.
    pub async fn authenticate(&self, reason: &str) -> bool {
        let joined = {
            let Ok(mut slot) = self.in_flight.lock() else {
                warn!("auth gate state poisoned, denying");
                return false;
            };
            match slot.as_ref() {
                Some(rx) => Err(rx.clone()),
                None => {
                    let (tx, rx) = watch::channel(None);
                    *slot = Some(rx.clone());
                    Ok((tx, rx))
                }
            }
        };

        match joined {
            Ok((tx, rx)) => {
                let clear = ClearOnDrop {
                    slot: &self.in_flight,
                    ours: rx,
                };
                debug!(reason, "starting credential challenge");
                let granted = self.backend.challenge(reason).await;
                // Free the slot before publishing so later requests start fresh.
                drop(clear);
                let _ = tx.send(Some(granted));
                if granted {
                    info!("credential challenge succeeded");
                } else {
                    info!("credential challenge denied or cancelled");
                }
                granted
            }
            Err(mut rx) => {
                debug!("joining in-flight credential challenge");
                match rx.wait_for(Option::is_some).await {
                    Ok(outcome) => *outcome == Some(true),
                    // Leader dropped before finishing: treat as cancelled.
                    Err(_) => false,
                }
            }
        }
    }

    /// Whether a challenge is currently pending.
    pub fn is_pending(&self) -> bool {
        self.in_flight.lock().map(|s| s.is_some()).unwrap_or(false)
    }
}

/// Clears the in-flight slot if it still holds our challenge, including when
/// the leading future is dropped mid-challenge.
struct ClearOnDrop<'a> {
    slot: &'a Mutex<Option<Outcome>>,
    ours: Outcome,
}

impl Drop for ClearOnDrop<'_> {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.slot.lock()
            && slot.as_ref().is_some_and(|rx| rx.same_channel(&self.ours))
        {
            *slot = None;
        }
    }
}

/// Backend that refuses every challenge. Used when auth is required but no
/// credential backend is configured.
pub struct DenyAll;

impl CredentialChallenge for DenyAll {
    fn challenge<'a>(&'a self, reason: &'a str) -> ChallengeFuture<'a> {
        Box::pin(async move {
            warn!(reason, "no credential backend configured, denying");
            false
        })
    }
}

/// Environment variable carrying the challenge reason to [`CommandChallenge`].
pub const AUTH_REASON_ENV: &str = "MENUSHADE_AUTH_REASON";

/// Backend that runs an external command; success iff it exits with status 0.
pub struct CommandChallenge {
    argv: Vec<String>,
}

impl CommandChallenge {
    /// Returns `None` for an empty command line.
    pub fn new(argv: Vec<String>) -> Option<Self> {
        if argv.is_empty() || argv[0].trim().is_empty() {
            return None;
        }
        Some(Self { argv })
    }
}

impl CredentialChallenge for CommandChallenge {
    fn challenge<'a>(&'a self, reason: &'a str) -> ChallengeFuture<'a> {
        Box::pin(async move {
            let status = tokio::process::Command::new(&self.argv[0])
                .args(&self.argv[1..])
                .env(AUTH_REASON_ENV, reason)
                .kill_on_drop(true)
                .status()
                .await;
            match status {
                Ok(status) => status.success(),
                Err(e) => {
                    warn!(program = %self.argv[0], error = %e, "failed to run auth command");
                    false
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Backend that answers after a delay and counts prompts.
    struct SlowBackend {
        answer: bool,
        delay: Duration,
        prompts: AtomicUsize,
    }

    impl SlowBackend {
        fn new(answer: bool) -> Arc<Self> {
            Arc::new(Self {
                answer,
                delay: Duration::from_millis(200),
                prompts: AtomicUsize::new(0),
            })
        }
    }

    impl CredentialChallenge for SlowBackend {
        fn challenge<'a>(&'a self, _reason: &'a str) -> ChallengeFuture<'a> {
            Box::pin(async move {
                self.prompts.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(self.delay).await;
                self.answer
            })
        }
    }

    async fn wait_pending(gate: &AuthGate) {
        while !gate.is_pending() {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn single_challenge_success() {
        let backend = SlowBackend::new(true);
        let gate = AuthGate::new(backend.clone());
        assert!(gate.authenticate("test").await);
        assert!(gate.challenge("test").await.is_some());
        assert_eq!(backend.prompts.load(Ordering::SeqCst), 2);
        assert!(!gate.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_requests_share_one_prompt() {
        let backend = SlowBackend::new(true);
        let gate = Arc::new(AuthGate::new(backend.clone()));

        let a = tokio::spawn({
            let gate = gate.clone();
            async move { gate.authenticate("a").await }
        });
        wait_pending(&gate).await;
        let b = tokio::spawn({
            let gate = gate.clone();
            async move { gate.authenticate("b").await }
        });

        assert!(a.await.unwrap());
        assert!(b.await.unwrap());
        assert_eq!(backend.prompts.load(Ordering::SeqCst), 1);
        assert!(!gate.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn joined_request_observes_denial() {
        let backend = SlowBackend::new(false);
        let gate = Arc::new(AuthGate::new(backend.clone()));

        let a = tokio::spawn({
            let gate = gate.clone();
            async move { gate.challenge("a").await.is_some() }
        });
        wait_pending(&gate).await;
        let b = tokio::spawn({
            let gate = gate.clone();
            async move { gate.challenge("b").await.is_some() }
        });

        assert!(!a.await.unwrap());
        assert!(!b.await.unwrap());
        assert_eq!(backend.prompts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_leader_releases_slot() {
        let backend = SlowBackend::new(true);
        let gate = Arc::new(AuthGate::new(backend.clone()));

        let leader = tokio::spawn({
            let gate = gate.clone();
            async move { gate.authenticate("leader").await }
        });
        wait_pending(&gate).await;
        let follower = tokio::spawn({
            let gate = gate.clone();
            async move { gate.authenticate("follower").await }
        });
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }

        leader.abort();
        let _ = leader.await;
        assert!(!follower.await.unwrap());
        assert!(!gate.is_pending());

        // A fresh request prompts again.
        assert!(gate.authenticate("again").await);
        assert_eq!(backend.prompts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn deny_all_backend() {
        let gate = AuthGate::new(Arc::new(DenyAll));
        assert!(gate.challenge("test").await.is_none());
    }

    #[test]
    fn command_challenge_rejects_empty_argv() {
        assert!(CommandChallenge::new(vec![]).is_none());
        assert!(CommandChallenge::new(vec![" ".into()]).is_none());
        assert!(CommandChallenge::new(vec!["true".into()]).is_some());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn command_challenge_uses_exit_status() {
        let ok = CommandChallenge::new(vec!["/bin/sh".into(), "-c".into(), "exit 0".into()]).unwrap();
        let denied =
            CommandChallenge::new(vec!["/bin/sh".into(), "-c".into(), "exit 1".into()]).unwrap();
        let reason_check = CommandChallenge::new(vec![
            "/bin/sh".into(),
            "-c".into(),
            format!("test \"${AUTH_REASON_ENV}\" = unlock"),
        ])
        .unwrap();
        assert!(ok.challenge("unlock").await);
        assert!(!denied.challenge("unlock").await);
        assert!(reason_check.challenge("unlock").await);
    }

    #[tokio::test]
    async fn command_challenge_missing_program_denies() {
        let missing = CommandChallenge::new(vec!["/nonexistent/menushade-auth".into()]).unwrap();
        assert!(!missing.challenge("unlock").await);
    }
}
