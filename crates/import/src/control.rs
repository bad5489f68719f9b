//! Visibility seam used by the import pipeline.

use std::future::Future;
use std::pin::Pin;

use menushade_protocol::VisibilityState;
use menushade_visibility::VisibilityError;

/// Boxed future returned by [`VisibilityControl`] methods.
pub type ControlFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The slice of the visibility engine the importer needs.
///
/// The daemon implements this on the arbitrator handle so that the forced
/// reveal goes through the same queue (and auth gate) as every other trigger.
pub trait VisibilityControl: Send + Sync {
    /// Current state, read without waiting on the queue.
    fn state(&self) -> VisibilityState;

    /// Reveals without scheduling an auto-rehide and cancels any pending one.
    fn reveal_pinned(&self) -> ControlFuture<'_, Result<bool, VisibilityError>>;

    /// Collapses the hidden section (position guard applies).
    fn rehide(&self) -> ControlFuture<'_, Result<bool, VisibilityError>>;
}
