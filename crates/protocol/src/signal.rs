//! Signals posted by trigger producers onto the arbitration queue.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An explicit visibility request carried by command surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    Show,
    Hide,
    Toggle,
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Show => f.write_str("show"),
            Self::Hide => f.write_str("hide"),
            Self::Toggle => f.write_str("toggle"),
        }
    }
}

/// A single trigger event. Created by a producer, consumed once by the
/// arbitrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerSignal {
    /// Click on the hide-handle. `bypass_safety` is set only while the
    /// explicit override modifier is held.
    Click { bypass_safety: bool },
    /// Per-icon hotkey: reveal, then activate the item of `bundle_id`.
    Hotkey { bundle_id: String },
    /// Pointer rested over the status bar for the hover delay.
    Hover,
    /// Scroll gesture over the status bar.
    Scroll,
    /// Pointer left the status bar region.
    HoverExited,
    /// External script finished with this exit code.
    ScriptExit(i32),
    /// The current network identity changed (`None` when disconnected).
    NetworkIdentity(Option<String>),
    /// Search UI requested, optionally prefilled.
    Search { query: Option<String> },
    /// Scripted automation verb.
    AutomationCommand(Verb),
    /// Verb received through the command URL or string surface.
    UrlCommand(Verb),
    /// Settings UI requested.
    OpenSettings,
}

impl TriggerSignal {
    /// Short name used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Click { .. } => "click",
            Self::Hotkey { .. } => "hotkey",
            Self::Hover => "hover",
            Self::Scroll => "scroll",
            Self::HoverExited => "hover_exited",
            Self::ScriptExit(_) => "script_exit",
            Self::NetworkIdentity(_) => "network_identity",
            Self::Search { .. } => "search",
            Self::AutomationCommand(_) => "automation_command",
            Self::UrlCommand(_) => "url_command",
            Self::OpenSettings => "open_settings",
        }
    }
}
