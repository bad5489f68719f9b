//! Shared vocabulary for the MenuShade visibility engine.
//!
//! Holds the data model read by every other crate (visibility state, item
//! zones, directory records), the trigger signal posted by producers, the
//! string/URL/automation command surfaces, and the collaborator trait over
//! the platform's menu bar item directory.

pub mod command;
pub mod constants;
pub mod directory;
pub mod signal;
pub mod types;

// Re-export primary types for convenience.
pub use command::{AutomationVerb, Command, CommandError};
pub use directory::{DirectoryFuture, MenuBarItemDirectory};
pub use signal::{TriggerSignal, Verb};
pub use types::{MenuBarItemRecord, VisibilityState, Zone};
