use std::time::Duration;

use menushade_protocol::VisibilityState;

use crate::guard::GuardFailure;

/// Broadcast capacity for visibility events.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Notifications published to UI collaborators.
#[derive(Debug, Clone, PartialEq)]
pub enum VisibilityEvent {
    /// The state transition committed.
    StateChanged(VisibilityState),
    /// A hide was refused. The UI should show a transient warning.
    UnsafePosition(GuardFailure),
    /// A reveal was refused by the credential challenge.
    AuthDenied,
    /// A rehide plan was armed.
    RehideScheduled { after: Duration },
    /// The search UI should open, optionally prefilled.
    SearchRequested { query: Option<String> },
    /// The settings UI should open.
    SettingsRequested,
}
