//! Hover and scroll producer for the status bar region.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::trace;

use menushade_protocol::TriggerSignal;
use menushade_protocol::constants::{MAX_HOVER_DELAY, MIN_HOVER_DELAY};

use crate::arbitrator::ArbitratorHandle;

#[derive(Debug, Clone, PartialEq)]
pub struct HoverConfig {
    pub enabled: bool,
    /// How long the pointer must rest before revealing.
    pub delay: Duration,
    pub scroll_enabled: bool,
}

impl Default for HoverConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            delay: Duration::from_millis(250),
            scroll_enabled: false,
        }
    }
}

impl HoverConfig {
    /// Converts a delay in seconds, clamped to the supported range.
    pub fn delay_from_secs(secs: f64) -> Duration {
        if !secs.is_finite() || secs <= 0.0 {
            return MIN_HOVER_DELAY;
        }
        Duration::try_from_secs_f64(secs)
            .unwrap_or(MAX_HOVER_DELAY)
            .clamp(MIN_HOVER_DELAY, MAX_HOVER_DELAY)
    }
}

/// Turns pointer enter/exit and scroll events into trigger signals.
///
/// A rest of `delay` posts `Hover`; leaving earlier posts nothing. Leaving
/// after a hover or scroll reveal posts `HoverExited` so the arbitrator can
/// schedule a rehide.
pub struct HoverTracker {
    handle: ArbitratorHandle,
    enabled: bool,
    delay: Duration,
    scroll_enabled: bool,
    inside: bool,
    pending: Option<CancellationToken>,
    engaged: Arc<AtomicBool>,
}

impl HoverTracker {
    pub fn new(handle: ArbitratorHandle, config: HoverConfig) -> Self {
        Self {
            handle,
            enabled: config.enabled,
            delay: config.delay.clamp(MIN_HOVER_DELAY, MAX_HOVER_DELAY),
            scroll_enabled: config.scroll_enabled,
            inside: false,
            pending: None,
            engaged: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay.clamp(MIN_HOVER_DELAY, MAX_HOVER_DELAY);
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled == enabled {
            return;
        }
        self.enabled = enabled;
        if !enabled {
            self.cancel_pending();
            self.inside = false;
        }
    }

    pub fn set_scroll_enabled(&mut self, enabled: bool) {
        self.scroll_enabled = enabled;
    }

    /// Whether the pointer is currently tracked inside the region.
    pub fn is_hovering(&self) -> bool {
        self.inside
    }

    pub fn pointer_entered(&mut self) {
        if !self.enabled || self.inside {
            return;
        }
        self.inside = true;

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let handle = self.handle.clone();
        let engaged = Arc::clone(&self.engaged);
        let delay = self.delay;
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => trace!("hover cancelled before delay"),
                _ = tokio::time::sleep(delay) => {
                    engaged.store(true, Ordering::SeqCst);
                    handle.post(TriggerSignal::Hover).await;
                }
            }
        });
        self.pending = Some(cancel);
    }

    pub async fn pointer_exited(&mut self) {
        if !self.inside {
            return;
        }
        self.inside = false;
        self.cancel_pending();
        if self.engaged.swap(false, Ordering::SeqCst) {
            self.handle.post(TriggerSignal::HoverExited).await;
        }
    }

    pub async fn scrolled(&mut self) {
        if !self.scroll_enabled {
            return;
        }
        self.engaged.store(true, Ordering::SeqCst);
        self.handle.post(TriggerSignal::Scroll).await;
    }

    fn cancel_pending(&mut self) {
        if let Some(cancel) = self.pending.take() {
            cancel.cancel();
        }
    }
}

impl Drop for HoverTracker {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}
