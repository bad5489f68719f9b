//! Single-slot, cancelable delayed rehide.
//!
//! At most one [`RehidePlan`] is live. Scheduling always cancels the
//! previous plan first, and a fire that raced with a cancel is recognised
//! as stale through its [`PlanId`].

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Identifies one scheduled plan.
pub type PlanId = u64;

struct RehidePlan {
    id: PlanId,
    deadline: Instant,
    cancel: CancellationToken,
}

/// Delayed-action timer with a single slot.
#[derive(Default)]
pub struct RehideScheduler {
    next_id: PlanId,
    current: Option<RehidePlan>,
}

impl RehideScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any pending plan with a new one firing after `after`.
    ///
    /// When the deadline passes, `on_fire` runs with the plan's id. The
    /// owner must confirm the fire with [`take_fired`](Self::take_fired)
    /// before acting on it. Requires a tokio runtime.
    pub fn schedule<F, Fut>(&mut self, after: Duration, on_fire: F) -> PlanId
    where
        F: FnOnce(PlanId) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();

        self.next_id = self.next_id.wrapping_add(1);
        let id = self.next_id;
        let deadline = Instant::now() + after;
        let cancel = CancellationToken::new();

        let token = cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    trace!(plan = id, "rehide plan cancelled");
                }
                _ = tokio::time::sleep_until(deadline) => {
                    trace!(plan = id, "rehide plan fired");
                    on_fire(id).await;
                }
            }
        });

        debug!(
            plan = id,
            delay_secs = format_args!("{:.1}", after.as_secs_f64()),
            "rehide scheduled"
        );
        self.current = Some(RehidePlan {
            id,
            deadline,
            cancel,
        });
        id
    }

    /// Invalidates the pending plan, if any. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        match self.current.take() {
            Some(plan) => {
                plan.cancel.cancel();
                debug!(plan = plan.id, "rehide cancelled");
                true
            }
            None => false,
        }
    }

    /// Confirms a fire. Returns `true` and clears the slot only when `id` is
    /// still the live plan; fires from superseded plans return `false`.
    pub fn take_fired(&mut self, id: PlanId) -> bool {
        if self.current.as_ref().is_some_and(|p| p.id == id) {
            self.current = None;
            true
        } else {
            false
        }
    }

    pub fn is_pending(&self) -> bool {
        self.current.is_some()
    }

    /// Deadline of the pending plan.
    pub fn deadline(&self) -> Option<Instant> {
        self.current.as_ref().map(|p| p.deadline)
    }
}

impl Drop for RehideScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}
