//! Collaborators shared by the producer tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use menushade_protocol::{DirectoryFuture, MenuBarItemDirectory, MenuBarItemRecord, VisibilityState, Zone};
use menushade_visibility::{AuthGate, DenyAll, Rect, StatusBarLayout, VisibilityController};

use crate::arbitrator::{ArbitratorHandle, TriggerArbitrator};
use crate::policy::TriggerPolicy;

/// Layout whose handle sits left of the anchor while `safe` is set.
pub(crate) struct TestLayout {
    pub(crate) safe: Arc<AtomicBool>,
}

impl StatusBarLayout for TestLayout {
    fn handle_frame(&self) -> Option<Rect> {
        let x = if self.safe.load(Ordering::SeqCst) { 100.0 } else { 300.0 };
        Some(Rect::new(x, 0.0, 20.0, 24.0))
    }

    fn anchor_frame(&self) -> Option<Rect> {
        Some(Rect::new(200.0, 0.0, 20.0, 24.0))
    }

    fn screen_frame(&self) -> Option<Rect> {
        Some(Rect::new(0.0, 0.0, 1280.0, 800.0))
    }

    fn set_handle_length(&mut self, _length: f64) {}
}

/// Directory with no items that records activations.
#[derive(Default)]
pub(crate) struct TestDirectory {
    pub(crate) activated: Mutex<Vec<String>>,
}

impl MenuBarItemDirectory for TestDirectory {
    fn has_access(&self) -> bool {
        true
    }

    fn list_items(&self) -> DirectoryFuture<'_, Vec<MenuBarItemRecord>> {
        Box::pin(async { Vec::new() })
    }

    fn move_item<'a>(
        &'a self,
        _bundle_id: &'a str,
        _menu_extra_id: Option<&'a str>,
        _status_item_index: Option<u32>,
        _zone: Zone,
    ) -> DirectoryFuture<'a, bool> {
        Box::pin(async { true })
    }

    fn activate_item<'a>(&'a self, bundle_id: &'a str) -> DirectoryFuture<'a, bool> {
        self.activated.lock().unwrap().push(bundle_id.to_string());
        Box::pin(async { true })
    }
}

/// Spawns an arbitrator over a safe layout with auth and auto-rehide off.
pub(crate) fn spawn_arbitrator() -> ArbitratorHandle {
    spawn_arbitrator_with(TriggerPolicy {
        auto_rehide: false,
        ..Default::default()
    })
}

pub(crate) fn spawn_arbitrator_with(policy: TriggerPolicy) -> ArbitratorHandle {
    let controller = VisibilityController::new(
        Some(Box::new(TestLayout {
            safe: Arc::new(AtomicBool::new(true)),
        })),
        Arc::new(AuthGate::new(Arc::new(DenyAll))),
    );
    let (arbitrator, handle) =
        TriggerArbitrator::new(controller, Arc::new(TestDirectory::default()), policy);
    arbitrator.spawn(CancellationToken::new());
    handle
}

pub(crate) async fn wait_for_state(handle: &ArbitratorHandle, state: VisibilityState) {
    let mut rx = handle.watch_state();
    tokio::time::timeout(Duration::from_secs(60), rx.wait_for(|s| *s == state))
        .await
        .expect("state not reached")
        .unwrap();
}
