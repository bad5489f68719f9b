//! Hide/reveal state machine.
//!
//! The controller exclusively owns the visibility state and the
//! hide-handle widget. It is meant to be driven from a single task (the
//! trigger arbitrator), so it takes `&mut self` and holds no locks.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use menushade_protocol::VisibilityState;
use menushade_protocol::constants::REVEAL_AUTH_REASON;

use crate::auth::{AuthGate, AuthGrant};
use crate::error::VisibilityError;
use crate::events::{EVENT_CHANNEL_CAPACITY, VisibilityEvent};
use crate::guard::PositionGuard;
use crate::layout::{COLLAPSED_HANDLE_LENGTH, EXPANDED_HANDLE_LENGTH, StatusBarLayout};

/// Owner of the `hidden`/`expanded` state.
///
/// Operations return `Ok(true)` when a transition committed, `Ok(false)`
/// when the state already matched the request, and an error when the
/// transition was refused. State is never changed on error.
pub struct VisibilityController {
    state: VisibilityState,
    layout: Option<Box<dyn StatusBarLayout>>,
    auth: Arc<AuthGate>,
    require_auth: bool,
    state_tx: watch::Sender<VisibilityState>,
    events_tx: broadcast::Sender<VisibilityEvent>,
}

impl VisibilityController {
    /// Creates a controller in the `Hidden` state.
    ///
    /// Without a layout (no display) every operation is a no-op that
    /// reports [`VisibilityError::ResourceUnavailable`].
    pub fn new(layout: Option<Box<dyn StatusBarLayout>>, auth: Arc<AuthGate>) -> Self {
        let (state_tx, _) = watch::channel(VisibilityState::Hidden);
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        if layout.is_none() {
            warn!("no hide-handle widget, visibility operations disabled");
        }
        Self {
            state: VisibilityState::Hidden,
            layout,
            auth,
            require_auth: false,
            state_tx,
            events_tx,
        }
    }

    pub fn state(&self) -> VisibilityState {
        self.state
    }

    /// Whether the hide-handle widget exists.
    pub fn is_available(&self) -> bool {
        self.layout.is_some()
    }

    pub fn requires_auth(&self) -> bool {
        self.require_auth
    }

    pub fn set_require_auth(&mut self, required: bool) {
        self.require_auth = required;
    }

    pub fn auth_gate(&self) -> Arc<AuthGate> {
        Arc::clone(&self.auth)
    }

    /// Receiver that always holds the current state.
    pub fn watch_state(&self) -> watch::Receiver<VisibilityState> {
        self.state_tx.subscribe()
    }

    /// Registers a new event subscriber. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<VisibilityEvent> {
        self.events_tx.subscribe()
    }

    /// Sender half of the event channel, for collaborators that publish
    /// UI requests alongside state changes.
    pub fn event_sender(&self) -> broadcast::Sender<VisibilityEvent> {
        self.events_tx.clone()
    }

    /// Reveals the hidden section, running the credential challenge first
    /// when auth is required.
    pub async fn show(&mut self) -> Result<bool, VisibilityError> {
        if self.state == VisibilityState::Expanded {
            return Ok(false);
        }
        if self.layout.is_none() {
            return Err(VisibilityError::ResourceUnavailable);
        }
        let grant = if self.require_auth {
            self.auth.challenge(REVEAL_AUTH_REASON).await
        } else {
            None
        };
        self.show_with(grant.as_ref())
    }

    /// Reveals using the outcome of a challenge run elsewhere.
    ///
    /// When auth is required a grant must be supplied; `None` is a denial.
    pub fn show_with(&mut self, grant: Option<&AuthGrant>) -> Result<bool, VisibilityError> {
        if self.state == VisibilityState::Expanded {
            return Ok(false);
        }
        let Some(layout) = self.layout.as_mut() else {
            return Err(VisibilityError::ResourceUnavailable);
        };
        if self.require_auth && grant.is_none() {
            info!("reveal denied: authentication required");
            let _ = self.events_tx.send(VisibilityEvent::AuthDenied);
            return Err(VisibilityError::AuthDenied);
        }

        layout.set_handle_length(EXPANDED_HANDLE_LENGTH);
        self.commit(VisibilityState::Expanded);
        Ok(true)
    }

    /// Collapses the hidden section if the position guard allows it.
    pub fn hide(&mut self) -> Result<bool, VisibilityError> {
        self.hide_with(false)
    }

    /// Toggles the state. `bypass_safety` skips the position guard on the
    /// hide path and is reserved for the explicit modifier override.
    pub async fn toggle(&mut self, bypass_safety: bool) -> Result<bool, VisibilityError> {
        match self.state {
            VisibilityState::Hidden => self.show().await,
            VisibilityState::Expanded => self.hide_with(bypass_safety),
        }
    }

    /// Hide path shared by [`hide`](Self::hide) and the toggle override.
    pub fn hide_with(&mut self, bypass_safety: bool) -> Result<bool, VisibilityError> {
        if self.layout.is_none() {
            return Err(VisibilityError::ResourceUnavailable);
        }
        if self.state == VisibilityState::Hidden {
            return Ok(false);
        }

        if bypass_safety {
            debug!("position guard bypassed by modifier override");
        } else if let Err(failure) = PositionGuard::check(self.layout.as_deref()) {
            warn!(reason = %failure, "hide refused: unsafe position");
            let _ = self
                .events_tx
                .send(VisibilityEvent::UnsafePosition(failure));
            return Err(VisibilityError::SafetyBlocked(failure));
        }

        if let Some(layout) = self.layout.as_mut() {
            layout.set_handle_length(COLLAPSED_HANDLE_LENGTH);
        }
        self.commit(VisibilityState::Hidden);
        Ok(true)
    }

    fn commit(&mut self, state: VisibilityState) {
        self.state = state;
        self.state_tx.send_replace(state);
        let _ = self.events_tx.send(VisibilityEvent::StateChanged(state));
        info!(%state, "visibility changed");
    }
}
