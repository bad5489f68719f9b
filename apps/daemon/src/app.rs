//! Application orchestrator: wires the engine, producers and console.

use std::path::Path;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use menushade_import::{ImportResolver, load_profile};
use menushade_protocol::VisibilityState;
use menushade_triggers::{
    ArbitratorHandle, CommandIdentitySource, HoverTracker, IconHotkeys, NetworkTrigger,
    ScriptTrigger, TriggerArbitrator,
};
use menushade_visibility::{
    AuthGate, CommandChallenge, CredentialChallenge, DenyAll, StatusBarLayout,
    VisibilityController, VisibilityError, VisibilityEvent,
};

use crate::config::Config;
use crate::console::{ConsoleLine, HELP, PointerEvent, parse_line};
use crate::headless::{SimulatedLayout, SnapshotDirectory};

/// Runs the daemon until `quit`, end of input, or Ctrl-C.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    let mut engine = Engine::start(&config, cancel.clone()).await;

    // -- Event log --
    let events = tokio::spawn(log_events(engine.handle.subscribe(), cancel.clone()));

    tracing::info!(state = %engine.handle.state(), "daemon ready");

    // -- Main loop: console until shutdown --
    tokio::select! {
        result = console_loop(&mut engine) => {
            if let Err(e) = result {
                tracing::error!("console error: {e}");
            }
            tracing::info!("console closed, shutting down");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("SIGINT received, shutting down");
        }
    }

    // -- Graceful shutdown --
    engine.shutdown().await;
    let _ = events.await;
    Ok(())
}

/// Runs a single import and prints its summary.
pub async fn run_import(config: Config, path: &Path, json: bool) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    let engine = Engine::start(&config, cancel).await;
    let output = engine.import(path, json).await;
    engine.shutdown().await;
    println!("{}", output?);
    Ok(())
}

/// Running engine and its local producers.
struct Engine {
    handle: ArbitratorHandle,
    directory: Arc<SnapshotDirectory>,
    hover: HoverTracker,
    hotkeys: IconHotkeys,
    script: ScriptTrigger,
    network: Option<NetworkTrigger>,
    cancel: CancellationToken,
    arbitrator: tokio::task::JoinHandle<()>,
}

impl Engine {
    async fn start(config: &Config, cancel: CancellationToken) -> Self {
        let directory = Arc::new(SnapshotDirectory::from_config(config.directory_snapshot.as_deref()).await);
        Self::with_directory(config, directory, cancel)
    }

    fn with_directory(
        config: &Config,
        directory: Arc<SnapshotDirectory>,
        cancel: CancellationToken,
    ) -> Self {
        // -- Visibility --
        let backend: Arc<dyn CredentialChallenge> =
            match CommandChallenge::new(config.auth_command.clone()) {
                Some(command) => Arc::new(command),
                None => Arc::new(DenyAll),
            };
        let layout: Option<Box<dyn StatusBarLayout>> = if config.simulated_layout {
            Some(Box::new(SimulatedLayout::new()))
        } else {
            None
        };
        let mut controller = VisibilityController::new(layout, Arc::new(AuthGate::new(backend)));
        controller.set_require_auth(config.require_auth);

        // -- Arbitration --
        let (arbitrator, handle) =
            TriggerArbitrator::new(controller, directory.clone(), config.trigger_policy());
        let arbitrator = arbitrator.spawn(cancel.child_token());

        // -- Producers --
        let mut script = ScriptTrigger::new(handle.clone(), config.script_config());
        if config.script_trigger.enabled {
            script.start();
        }

        let network = if config.network_trigger.enabled {
            match CommandIdentitySource::new(config.network_trigger.command.clone()) {
                Some(source) => {
                    let mut trigger =
                        NetworkTrigger::new(handle.clone(), Arc::new(source), config.network_poll());
                    trigger.start();
                    Some(trigger)
                }
                None => {
                    tracing::warn!("network trigger enabled without a command, skipping");
                    None
                }
            }
        } else {
            None
        };

        let hover = HoverTracker::new(handle.clone(), config.hover_config());
        let mut hotkeys = IconHotkeys::new(handle.clone());
        hotkeys.register_all(config.icon_hotkeys.clone());

        Self {
            handle,
            directory,
            hover,
            hotkeys,
            script,
            network,
            cancel,
            arbitrator,
        }
    }

    /// Executes one console line and returns the text to print.
    async fn execute(&mut self, line: ConsoleLine) -> Option<String> {
        match line {
            ConsoleLine::Empty | ConsoleLine::Quit => None,
            ConsoleLine::Signal(signal) => {
                let kind = signal.kind();
                let result = self.handle.request(signal).await;
                Some(describe(kind, result, self.handle.state()))
            }
            ConsoleLine::Key(shortcut) => {
                if self.hotkeys.key_pressed(&shortcut).await {
                    None
                } else {
                    Some(format!("no icon bound to {shortcut}"))
                }
            }
            ConsoleLine::Pointer(PointerEvent::Enter) => {
                self.hover.pointer_entered();
                None
            }
            ConsoleLine::Pointer(PointerEvent::Exit) => {
                self.hover.pointer_exited().await;
                None
            }
            ConsoleLine::Pointer(PointerEvent::Scroll) => {
                self.hover.scrolled().await;
                None
            }
            ConsoleLine::Import { path, json } => Some(match self.import(&path, json).await {
                Ok(output) => output,
                Err(e) => format!("import failed: {e}"),
            }),
            ConsoleLine::State => Some(self.handle.state().to_string()),
            ConsoleLine::Help => Some(HELP.to_string()),
        }
    }

    async fn import(&self, path: &Path, json: bool) -> anyhow::Result<String> {
        let profile = load_profile(path).await?;
        let summary = ImportResolver::new(self.directory.as_ref(), &self.handle)
            .import(&profile)
            .await?;
        if json {
            Ok(serde_json::to_string_pretty(&summary)?)
        } else {
            Ok(summary.to_string())
        }
    }

    async fn shutdown(mut self) {
        tracing::info!("stopping producers...");
        self.script.stop();
        if let Some(network) = self.network.as_mut() {
            network.stop();
        }
        self.hover.set_enabled(false);
        self.hotkeys.unregister_all();
        self.cancel.cancel();
        if let Err(e) = self.arbitrator.await {
            tracing::error!("arbitrator task failed: {e}");
        }
    }
}

/// One-line outcome of a visibility request.
fn describe(kind: &str, result: Result<bool, VisibilityError>, state: VisibilityState) -> String {
    match result {
        Ok(true) => format!("{kind}: {state}"),
        Ok(false) => format!("{kind}: unchanged ({state})"),
        Err(e) => format!("{kind}: {e}"),
    }
}

async fn console_loop(engine: &mut Engine) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_line(&line) {
            Ok(ConsoleLine::Quit) => break,
            Ok(command) => {
                if let Some(output) = engine.execute(command).await {
                    println!("{output}");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "ignoring console line");
                println!("{e}");
            }
        }
    }
    Ok(())
}

async fn log_events(mut events: broadcast::Receiver<VisibilityEvent>, cancel: CancellationToken) {
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = events.recv() => event,
        };
        match event {
            Ok(VisibilityEvent::StateChanged(state)) => tracing::debug!(%state, "state changed"),
            Ok(VisibilityEvent::UnsafePosition(failure)) => {
                tracing::warn!(%failure, "hide refused: unsafe position");
            }
            Ok(VisibilityEvent::AuthDenied) => tracing::warn!("reveal refused: authentication denied"),
            Ok(VisibilityEvent::RehideScheduled { after }) => {
                tracing::debug!(delay_secs = format_args!("{:.1}", after.as_secs_f64()), "rehide scheduled");
            }
            Ok(VisibilityEvent::SearchRequested { query }) => {
                tracing::info!(query = query.as_deref().unwrap_or(""), "search requested");
            }
            Ok(VisibilityEvent::SettingsRequested) => tracing::info!("settings requested"),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "event log lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
