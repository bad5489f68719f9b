//! Headless collaborators.
//!
//! Without a platform status bar the daemon drives a simulated hide-handle
//! layout and serves the menu bar item directory from a JSON snapshot.
//! Moves update the in-memory copy so later queries see them.

use std::path::Path;
use std::sync::Mutex;

use tracing::{debug, info, warn};

use menushade_protocol::{DirectoryFuture, MenuBarItemDirectory, MenuBarItemRecord, Zone};
use menushade_visibility::{EXPANDED_HANDLE_LENGTH, Rect, StatusBarLayout};

const SCREEN_WIDTH: f64 = 1440.0;
const BAR_HEIGHT: f64 = 24.0;
const ANCHOR_WIDTH: f64 = 22.0;
/// Gap between the anchor and the right screen edge (clock, control items).
const TRAILING_ITEMS_WIDTH: f64 = 180.0;

/// Fixed single-screen status bar.
///
/// The hide-handle grows leftwards from the anchor, so it always sits left
/// of it and the position guard passes.
#[derive(Debug)]
pub struct SimulatedLayout {
    handle_length: f64,
}

impl SimulatedLayout {
    pub fn new() -> Self {
        Self {
            handle_length: EXPANDED_HANDLE_LENGTH,
        }
    }

    pub fn handle_length(&self) -> f64 {
        self.handle_length
    }

    fn anchor_x(&self) -> f64 {
        SCREEN_WIDTH - TRAILING_ITEMS_WIDTH - ANCHOR_WIDTH
    }
}

impl Default for SimulatedLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusBarLayout for SimulatedLayout {
    fn handle_frame(&self) -> Option<Rect> {
        let x = self.anchor_x() - self.handle_length;
        Some(Rect::new(x, 0.0, self.handle_length, BAR_HEIGHT))
    }

    fn anchor_frame(&self) -> Option<Rect> {
        Some(Rect::new(self.anchor_x(), 0.0, ANCHOR_WIDTH, BAR_HEIGHT))
    }

    fn screen_frame(&self) -> Option<Rect> {
        Some(Rect::new(0.0, 0.0, SCREEN_WIDTH, 900.0))
    }

    fn set_handle_length(&mut self, length: f64) {
        debug!(length, "simulated handle resized");
        self.handle_length = length;
    }
}

/// Errors loading a directory snapshot.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("failed to read directory snapshot: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid directory snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

/// Directory backed by a snapshot file.
///
/// With no snapshot the directory reports no access, so imports fail with
/// `AccessibilityRequired` just as they would without the permission.
pub struct SnapshotDirectory {
    items: Option<Mutex<Vec<MenuBarItemRecord>>>,
}

impl SnapshotDirectory {
    /// A directory without access.
    pub fn unavailable() -> Self {
        Self { items: None }
    }

    pub fn from_items(items: Vec<MenuBarItemRecord>) -> Self {
        Self {
            items: Some(Mutex::new(items)),
        }
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, DirectoryError> {
        let items: Vec<MenuBarItemRecord> = serde_json::from_slice(bytes)?;
        Ok(Self::from_items(items))
    }

    pub async fn load(path: &Path) -> Result<Self, DirectoryError> {
        let bytes = tokio::fs::read(path).await?;
        let directory = Self::from_json(&bytes)?;
        info!(
            path = %path.display(),
            items = directory.snapshot().len(),
            "loaded directory snapshot"
        );
        Ok(directory)
    }

    /// Loads the configured snapshot, falling back to no access on any error.
    pub async fn from_config(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            debug!("no directory snapshot configured");
            return Self::unavailable();
        };
        match Self::load(path).await {
            Ok(directory) => directory,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "directory snapshot unusable");
                Self::unavailable()
            }
        }
    }

    /// Current copy of the items.
    pub fn snapshot(&self) -> Vec<MenuBarItemRecord> {
        self.items
            .as_ref()
            .and_then(|items| items.lock().ok().map(|items| items.clone()))
            .unwrap_or_default()
    }

    fn apply_move(
        &self,
        bundle_id: &str,
        menu_extra_id: Option<&str>,
        status_item_index: Option<u32>,
        zone: Zone,
    ) -> bool {
        let Some(items) = self.items.as_ref() else {
            return false;
        };
        let Ok(mut items) = items.lock() else {
            return false;
        };
        let target = items.iter_mut().find(|item| {
            item.bundle_id == bundle_id
                && menu_extra_id.is_none_or(|id| item.menu_extra_id.as_deref() == Some(id))
                && status_item_index.is_none_or(|idx| item.status_item_index == Some(idx))
        });
        match target {
            Some(item) => {
                debug!(bundle = %bundle_id, from = %item.zone, to = %zone, "moved item");
                item.zone = zone;
                true
            }
            None => {
                debug!(bundle = %bundle_id, "move target not in snapshot");
                false
            }
        }
    }
}

impl MenuBarItemDirectory for SnapshotDirectory {
    fn has_access(&self) -> bool {
        self.items.is_some()
    }

    fn list_items(&self) -> DirectoryFuture<'_, Vec<MenuBarItemRecord>> {
        Box::pin(async move { self.snapshot() })
    }

    fn move_item<'a>(
        &'a self,
        bundle_id: &'a str,
        menu_extra_id: Option<&'a str>,
        status_item_index: Option<u32>,
        zone: Zone,
    ) -> DirectoryFuture<'a, bool> {
        Box::pin(async move { self.apply_move(bundle_id, menu_extra_id, status_item_index, zone) })
    }

    fn activate_item<'a>(&'a self, bundle_id: &'a str) -> DirectoryFuture<'a, bool> {
        Box::pin(async move {
            let found = self.snapshot().iter().any(|item| item.bundle_id == bundle_id);
            if found {
                info!(bundle = %bundle_id, "activated item");
            } else {
                debug!(bundle = %bundle_id, "activation target not in snapshot");
            }
            found
        })
    }
}
