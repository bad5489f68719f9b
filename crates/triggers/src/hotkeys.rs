//! Per-icon hotkeys: a shortcut reveals the bar and activates one app's item.

use std::collections::BTreeMap;

use tracing::{debug, info};

use menushade_protocol::TriggerSignal;

use crate::arbitrator::ArbitratorHandle;

/// Registry of shortcut label → bundle id.
pub struct IconHotkeys {
    handle: ArbitratorHandle,
    bindings: BTreeMap<String, String>,
}

impl IconHotkeys {
    pub fn new(handle: ArbitratorHandle) -> Self {
        Self {
            handle,
            bindings: BTreeMap::new(),
        }
    }

    /// Replaces the whole table.
    pub fn register_all<I>(&mut self, bindings: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.unregister_all();
        for (shortcut, bundle_id) in bindings {
            let shortcut = shortcut.trim().to_string();
            let bundle_id = bundle_id.trim().to_string();
            if shortcut.is_empty() || bundle_id.is_empty() {
                continue;
            }
            debug!(shortcut = %shortcut, bundle = %bundle_id, "registered icon hotkey");
            self.bindings.insert(shortcut, bundle_id);
        }
        info!(count = self.bindings.len(), "icon hotkeys registered");
    }

    pub fn unregister_all(&mut self) {
        self.bindings.clear();
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn bundle_for(&self, shortcut: &str) -> Option<&str> {
        self.bindings.get(shortcut).map(String::as_str)
    }

    /// Handles a key press. Returns `true` if the shortcut was bound and
    /// its signal was posted.
    pub async fn key_pressed(&self, shortcut: &str) -> bool {
        let Some(bundle_id) = self.bundle_for(shortcut) else {
            debug!(shortcut, "unbound shortcut ignored");
            return false;
        };
        info!(shortcut, bundle = bundle_id, "icon hotkey triggered");
        self.handle
            .post(TriggerSignal::Hotkey {
                bundle_id: bundle_id.to_string(),
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use menushade_protocol::VisibilityState;

    use crate::testing::{spawn_arbitrator, wait_for_state};

    fn table(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn registration_replaces_table() {
        let mut hotkeys = IconHotkeys::new(spawn_arbitrator());
        hotkeys.register_all(table(&[("cmd+1", "com.foo.App"), ("cmd+2", "com.bar.Tool")]));
        assert_eq!(hotkeys.len(), 2);

        hotkeys.register_all(table(&[(" cmd+3 ", " com.baz.Util "), ("", "com.x"), ("cmd+4", "")]));
        assert_eq!(hotkeys.len(), 1);
        assert_eq!(hotkeys.bundle_for("cmd+1"), None);
        assert_eq!(hotkeys.bundle_for("cmd+3"), Some("com.baz.Util"));

        hotkeys.unregister_all();
        assert!(hotkeys.is_empty());
    }

    #[tokio::test]
    async fn bound_key_reveals() {
        let handle = spawn_arbitrator();
        let mut hotkeys = IconHotkeys::new(handle.clone());
        hotkeys.register_all(table(&[("cmd+1", "com.foo.App")]));

        assert!(!hotkeys.key_pressed("cmd+9").await);
        assert_eq!(handle.state(), VisibilityState::Hidden);

        assert!(hotkeys.key_pressed("cmd+1").await);
        wait_for_state(&handle, VisibilityState::Expanded).await;
    }
}
