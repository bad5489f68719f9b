//! Profile import: maps a competitor's exported layout onto the live status bar.
//!
//! # Pipeline
//!
//! 1. **Parse**: read `ProfileSettings.activeProfile` from a plist or JSON export
//! 2. **Deduplicate**: each raw token is processed at most once
//! 3. **Reveal**: force the hidden section open so the directory can see every item
//! 4. **Resolve**: match tokens against a directory snapshot
//! 5. **Move**: hide-set first, then show-set
//! 6. **Restore**: collapse again if the bar started hidden

pub mod control;
pub mod error;
pub mod profile;
pub mod resolve;
pub mod resolver;
pub mod summary;

pub use control::{ControlFuture, VisibilityControl};
pub use error::ImportError;
pub use profile::{ImportProfile, load_profile};
pub use resolve::{ResolutionContext, ResolvedMove, SkipReason};
pub use resolver::ImportResolver;
pub use summary::ImportSummary;
