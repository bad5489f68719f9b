//! Visibility error types.

use crate::guard::GuardFailure;

/// Reasons a visibility transition was refused.
///
/// None of these are fatal: state is left untouched and the caller decides
/// whether to surface a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum VisibilityError {
    #[error("hide refused, unsafe position: {0}")]
    SafetyBlocked(#[from] GuardFailure),

    #[error("authentication denied")]
    AuthDenied,

    #[error("hide-handle widget unavailable")]
    ResourceUnavailable,
}
