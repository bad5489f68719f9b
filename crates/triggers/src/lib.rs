//! Trigger arbitration for the visibility engine.
//!
//! Every producer (clicks, hotkeys, hover, scripts, network changes,
//! command surfaces) posts a [`TriggerSignal`](menushade_protocol::TriggerSignal)
//! through an [`ArbitratorHandle`]. The [`TriggerArbitrator`] task owns the
//! [`VisibilityController`](menushade_visibility::VisibilityController) and
//! applies signals one at a time, in arrival order.

pub mod arbitrator;
pub mod hotkeys;
pub mod hover;
pub mod network;
pub mod policy;
pub mod script;

#[cfg(test)]
mod testing;

pub use arbitrator::{ArbitratorHandle, QUEUE_CAPACITY, TriggerArbitrator};
pub use hotkeys::IconHotkeys;
pub use hover::{HoverConfig, HoverTracker};
pub use network::{CommandIdentitySource, IdentityFuture, NetworkIdentitySource, NetworkTrigger};
pub use policy::TriggerPolicy;
pub use script::{ScriptError, ScriptTrigger, ScriptTriggerConfig, run_script};
