//! Import error types.

/// Errors that abort an import before any item is moved.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("accessibility access is required to read status bar positions")]
    AccessibilityRequired,

    #[error("no Hide or Show entries found in the profile")]
    EmptyProfile,

    #[error("authentication was required to reveal hidden icons")]
    AuthRequired,

    #[error("profile not found (missing ProfileSettings.activeProfile)")]
    ProfileNotFound,

    #[error("unreadable profile: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for ImportError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

impl From<plist::Error> for ImportError {
    fn from(e: plist::Error) -> Self {
        Self::Parse(e.to_string())
    }
}
