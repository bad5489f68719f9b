//! Trigger arbitrator: the single task that mutates visibility state.
//!
//! Producers never touch the controller. They post envelopes onto a bounded
//! queue; the arbitrator applies them in arrival order without awaiting, so
//! the queue never stalls. Work that can take long (credential challenges,
//! item activation, rehide timers) runs in spawned tasks that post their
//! result back onto the same queue.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use menushade_import::{ControlFuture, VisibilityControl};
use menushade_protocol::constants::REVEAL_AUTH_REASON;
use menushade_protocol::{MenuBarItemDirectory, TriggerSignal, Verb, VisibilityState};
use menushade_visibility::{
    AuthGrant, PlanId, RehideScheduler, VisibilityController, VisibilityError, VisibilityEvent,
};

use crate::policy::TriggerPolicy;

/// Capacity of the arbitration queue.
pub const QUEUE_CAPACITY: usize = 64;

type Outcome = Result<bool, VisibilityError>;
type Reply = oneshot::Sender<Outcome>;

enum Envelope {
    Signal {
        signal: TriggerSignal,
        reply: Option<Reply>,
    },
    RevealPinned(Reply),
    Hide(Reply),
    AuthResolved {
        grant: Option<AuthGrant>,
        reveal: PendingReveal,
    },
    RehideFired(PlanId),
}

/// What to do once a reveal has been decided.
enum FollowUp {
    Nothing,
    Activate(String),
    Search(Option<String>),
}

struct PendingReveal {
    follow_up: FollowUp,
    pinned: bool,
    reply: Option<Reply>,
}

impl PendingReveal {
    fn new(reply: Option<Reply>) -> Self {
        Self {
            follow_up: FollowUp::Nothing,
            pinned: false,
            reply,
        }
    }

    fn then(mut self, follow_up: FollowUp) -> Self {
        self.follow_up = follow_up;
        self
    }
}

fn respond(reply: Option<Reply>, outcome: Outcome) {
    if let Some(reply) = reply {
        let _ = reply.send(outcome);
    }
}

/// Owner of the [`VisibilityController`]; see the module docs.
pub struct TriggerArbitrator {
    controller: VisibilityController,
    directory: Arc<dyn MenuBarItemDirectory>,
    policy: TriggerPolicy,
    scheduler: RehideScheduler,
    /// Set by a pinned reveal; suppresses auto-rehide until the pinned
    /// operation releases it.
    pinned: bool,
    /// Reveals waiting on the challenge in flight, if any.
    awaiting_auth: Option<Vec<PendingReveal>>,
    events: broadcast::Sender<VisibilityEvent>,
    queue: mpsc::WeakSender<Envelope>,
    rx: mpsc::Receiver<Envelope>,
}

impl TriggerArbitrator {
    /// Creates the arbitrator and the handle producers post through.
    ///
    /// The arbitrator stops once every handle is dropped or its
    /// cancellation token fires.
    pub fn new(
        controller: VisibilityController,
        directory: Arc<dyn MenuBarItemDirectory>,
        policy: TriggerPolicy,
    ) -> (Self, ArbitratorHandle) {
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        let handle = ArbitratorHandle {
            queue: tx.clone(),
            state: controller.watch_state(),
            events: controller.event_sender(),
        };
        let arbitrator = Self {
            events: controller.event_sender(),
            controller,
            directory,
            policy,
            scheduler: RehideScheduler::new(),
            pinned: false,
            awaiting_auth: None,
            queue: tx.downgrade(),
            rx,
        };
        (arbitrator, handle)
    }

    /// Runs the arbitrator on its own task.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }

    pub async fn run(mut self, cancel: CancellationToken) {
        info!(
            auto_rehide = self.policy.auto_rehide,
            require_auth = self.controller.requires_auth(),
            "trigger arbitrator started"
        );
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                envelope = self.rx.recv() => match envelope {
                    Some(envelope) => self.dispatch(envelope),
                    None => break,
                },
            }
        }
        self.scheduler.cancel();
        debug!("trigger arbitrator stopped");
    }

    fn dispatch(&mut self, envelope: Envelope) {
        match envelope {
            Envelope::Signal { signal, reply } => self.handle_signal(signal, reply),
            Envelope::RevealPinned(reply) => {
                let mut reveal = PendingReveal::new(Some(reply));
                reveal.pinned = true;
                self.reveal(reveal);
            }
            Envelope::Hide(reply) => self.release(reply),
            Envelope::AuthResolved { grant, reveal } => {
                let waiters = self.awaiting_auth.take().unwrap_or_default();
                for reveal in std::iter::once(reveal).chain(waiters) {
                    let outcome = self.controller.show_with(grant.as_ref());
                    self.finish_reveal(outcome, reveal);
                }
            }
            Envelope::RehideFired(id) => self.rehide_fired(id),
        }
    }

    fn handle_signal(&mut self, signal: TriggerSignal, reply: Option<Reply>) {
        debug!(signal = signal.kind(), state = %self.controller.state(), "trigger");
        match signal {
            TriggerSignal::Click { bypass_safety } => self.toggle(bypass_safety, reply),
            TriggerSignal::Hotkey { bundle_id } => {
                self.reveal(PendingReveal::new(reply).then(FollowUp::Activate(bundle_id)));
            }
            TriggerSignal::Hover | TriggerSignal::Scroll => self.reveal(PendingReveal::new(reply)),
            TriggerSignal::HoverExited => {
                if !self.controller.state().is_hidden() && self.policy.auto_rehide {
                    self.schedule_rehide();
                }
                respond(reply, Ok(false));
            }
            TriggerSignal::ScriptExit(0) => self.reveal(PendingReveal::new(reply)),
            TriggerSignal::ScriptExit(code) => {
                debug!(exit_code = code, "script requested hide");
                self.hide(false, reply);
            }
            TriggerSignal::NetworkIdentity(identity) => {
                if self.policy.matches_network(identity.as_deref()) {
                    info!(network = identity.as_deref().unwrap_or_default(), "trusted network");
                    self.reveal(PendingReveal::new(reply));
                } else {
                    respond(reply, Ok(false));
                }
            }
            TriggerSignal::Search { query } => {
                self.reveal(PendingReveal::new(reply).then(FollowUp::Search(query)));
            }
            TriggerSignal::AutomationCommand(verb) | TriggerSignal::UrlCommand(verb) => {
                self.apply_verb(verb, reply);
            }
            TriggerSignal::OpenSettings => {
                let _ = self.events.send(VisibilityEvent::SettingsRequested);
                respond(reply, Ok(false));
            }
        }
    }

    fn apply_verb(&mut self, verb: Verb, reply: Option<Reply>) {
        match verb {
            Verb::Show => self.reveal(PendingReveal::new(reply)),
            Verb::Hide => self.hide(false, reply),
            Verb::Toggle => self.toggle(false, reply),
        }
    }

    fn toggle(&mut self, bypass_safety: bool, reply: Option<Reply>) {
        if self.controller.state().is_hidden() {
            self.reveal(PendingReveal::new(reply));
        } else {
            self.hide(bypass_safety, reply);
        }
    }

    fn hide(&mut self, bypass_safety: bool, reply: Option<Reply>) {
        let outcome = self.controller.hide_with(bypass_safety);
        if outcome == Ok(true) {
            self.scheduler.cancel();
            self.pinned = false;
        }
        respond(reply, outcome);
    }

    /// Hides on behalf of the pinned operation and releases the pin even
    /// when the hide is refused, so auto-rehide resumes.
    fn release(&mut self, reply: Reply) {
        let was_pinned = std::mem::take(&mut self.pinned);
        let outcome = self.controller.hide_with(false);
        let still_open = !self.controller.state().is_hidden();
        match outcome {
            Ok(true) => {
                self.scheduler.cancel();
            }
            Err(_) if was_pinned && still_open && self.policy.auto_rehide => {
                debug!("restore refused, falling back to auto-rehide");
                self.schedule_rehide();
            }
            _ => {}
        }
        respond(Some(reply), outcome);
    }

    /// Starts a reveal. When a credential challenge is needed it runs on a
    /// spawned task and the reveal completes on [`Envelope::AuthResolved`].
    fn reveal(&mut self, reveal: PendingReveal) {
        let needs_challenge = self.controller.state().is_hidden()
            && self.controller.is_available()
            && self.controller.requires_auth();
        if !needs_challenge {
            let outcome = self.controller.show_with(None);
            self.finish_reveal(outcome, reveal);
            return;
        }

        // Joins the challenge until its outcome is applied here, not just
        // until the gate answers.
        if let Some(waiters) = self.awaiting_auth.as_mut() {
            debug!("reveal joining pending credential challenge");
            waiters.push(reveal);
            return;
        }

        let Some(queue) = self.queue.upgrade() else {
            respond(reveal.reply, Err(VisibilityError::ResourceUnavailable));
            return;
        };
        let gate = self.controller.auth_gate();
        debug!("reveal waiting on credential challenge");
        self.awaiting_auth = Some(Vec::new());
        tokio::spawn(async move {
            let grant = gate.challenge(REVEAL_AUTH_REASON).await;
            let _ = queue.send(Envelope::AuthResolved { grant, reveal }).await;
        });
    }

    fn finish_reveal(&mut self, outcome: Outcome, reveal: PendingReveal) {
        let PendingReveal {
            follow_up,
            pinned,
            reply,
        } = reveal;

        if pinned {
            if outcome.is_ok() {
                self.pinned = true;
                self.scheduler.cancel();
            }
        } else if outcome == Ok(true) && self.policy.auto_rehide {
            self.schedule_rehide();
        }

        if outcome != Err(VisibilityError::AuthDenied) {
            self.run_follow_up(follow_up);
        }
        respond(reply, outcome);
    }

    fn run_follow_up(&self, follow_up: FollowUp) {
        match follow_up {
            FollowUp::Nothing => {}
            FollowUp::Activate(bundle_id) => {
                let directory = Arc::clone(&self.directory);
                tokio::spawn(async move {
                    if directory.activate_item(&bundle_id).await {
                        debug!(bundle = %bundle_id, "activated item");
                    } else {
                        warn!(bundle = %bundle_id, "could not activate item");
                    }
                });
            }
            FollowUp::Search(query) => {
                let _ = self.events.send(VisibilityEvent::SearchRequested { query });
            }
        }
    }

    fn schedule_rehide(&mut self) {
        if self.pinned {
            trace!("reveal pinned, rehide not scheduled");
            return;
        }
        let queue = self.queue.clone();
        let after = self.policy.rehide_delay;
        let id = self.scheduler.schedule(after, move |id| async move {
            if let Some(queue) = queue.upgrade() {
                let _ = queue.send(Envelope::RehideFired(id)).await;
            }
        });
        debug!(
            plan = id,
            delay_secs = format_args!("{:.1}", after.as_secs_f64()),
            "rehide scheduled"
        );
        let _ = self.events.send(VisibilityEvent::RehideScheduled { after });
    }

    fn rehide_fired(&mut self, id: PlanId) {
        if !self.scheduler.take_fired(id) {
            trace!(plan = id, "stale rehide ignored");
            return;
        }
        match self.controller.hide() {
            Ok(true) => debug!(plan = id, "auto-rehide"),
            Ok(false) => {}
            Err(e) => warn!(plan = id, error = %e, "auto-rehide refused"),
        }
    }
}

/// Cloneable entry point onto the arbitration queue.
#[derive(Clone)]
pub struct ArbitratorHandle {
    queue: mpsc::Sender<Envelope>,
    state: watch::Receiver<VisibilityState>,
    events: broadcast::Sender<VisibilityEvent>,
}

impl ArbitratorHandle {
    /// Posts a signal without waiting for its outcome.
    ///
    /// Returns `false` when the arbitrator has stopped.
    pub async fn post(&self, signal: TriggerSignal) -> bool {
        self.queue
            .send(Envelope::Signal {
                signal,
                reply: None,
            })
            .await
            .is_ok()
    }

    /// Posts a signal and waits until the arbitrator has applied it.
    pub async fn request(&self, signal: TriggerSignal) -> Result<bool, VisibilityError> {
        self.call(|reply| Envelope::Signal {
            signal,
            reply: Some(reply),
        })
        .await
    }

    /// Reveals and keeps the bar open: pending rehides are cancelled and
    /// none is scheduled until [`hide`](Self::hide) releases the pin.
    pub async fn reveal_pinned(&self) -> Result<bool, VisibilityError> {
        self.call(Envelope::RevealPinned).await
    }

    /// Hides with the position guard enforced and ends a pinned reveal,
    /// whatever the hide outcome.
    pub async fn hide(&self) -> Result<bool, VisibilityError> {
        self.call(Envelope::Hide).await
    }

    /// Current state, read without entering the queue.
    pub fn state(&self) -> VisibilityState {
        *self.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<VisibilityState> {
        self.state.clone()
    }

    /// Registers an event subscriber. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<VisibilityEvent> {
        self.events.subscribe()
    }

    pub fn is_closed(&self) -> bool {
        self.queue.is_closed()
    }

    async fn call(&self, envelope: impl FnOnce(Reply) -> Envelope) -> Outcome {
        let (tx, rx) = oneshot::channel();
        if self.queue.send(envelope(tx)).await.is_err() {
            return Err(VisibilityError::ResourceUnavailable);
        }
        rx.await.unwrap_or(Err(VisibilityError::ResourceUnavailable))
    }
}

impl VisibilityControl for ArbitratorHandle {
    fn state(&self) -> VisibilityState {
        ArbitratorHandle::state(self)
    }

    fn reveal_pinned(&self) -> ControlFuture<'_, Result<bool, VisibilityError>> {
        Box::pin(ArbitratorHandle::reveal_pinned(self))
    }

    fn rehide(&self) -> ControlFuture<'_, Result<bool, VisibilityError>> {
        Box::pin(self.hide())
    }
}
