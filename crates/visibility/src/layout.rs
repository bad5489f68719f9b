//! Hide-handle widget abstraction.

use crate::guard::Rect;

/// Handle width while hidden: wide enough to push every trailing item off-screen.
pub const COLLAPSED_HANDLE_LENGTH: f64 = 10_000.0;

/// Handle width while expanded.
pub const EXPANDED_HANDLE_LENGTH: f64 = 20.0;

/// The status bar widgets the controller drives.
///
/// Implemented by the platform layer. Frames are in screen coordinates with
/// `x` growing to the right. Any frame may be unavailable (e.g. the widget
/// is not laid out yet), which the position guard treats as unsafe.
pub trait StatusBarLayout: Send {
    /// Frame of the hide-handle widget.
    fn handle_frame(&self) -> Option<Rect>;

    /// Frame of the always-visible anchor widget.
    fn anchor_frame(&self) -> Option<Rect>;

    /// Frame of the screen hosting the status bar.
    fn screen_frame(&self) -> Option<Rect>;

    /// Sets the hide-handle widget's width.
    fn set_handle_length(&mut self, length: f64);
}
