//! Pre-hide geometric safety check.
//!
//! Collapsing the hide-handle while it sits to the right of the anchor
//! widget would push the anchor itself off-screen and leave the user with
//! no way to reveal the bar again. The guard fails closed: any missing
//! geometry counts as unsafe.

use std::fmt;

use crate::layout::StatusBarLayout;

/// Axis-aligned rectangle in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn min_x(&self) -> f64 {
        self.x
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn min_y(&self) -> f64 {
        self.y
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    /// Whether the two rectangles share any area.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.min_x() < other.max_x()
            && other.min_x() < self.max_x()
            && self.min_y() < other.max_y()
            && other.min_y() < self.max_y()
    }
}

/// Why the guard refused a hide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuardFailure {
    MissingHandle,
    MissingAnchor,
    MissingScreen,
    HandleOffScreen,
    HandleRightOfAnchor,
}

impl fmt::Display for GuardFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::MissingHandle => "hide-handle widget has no frame",
            Self::MissingAnchor => "anchor widget has no frame",
            Self::MissingScreen => "no screen geometry",
            Self::HandleOffScreen => "hide-handle widget is off-screen",
            Self::HandleRightOfAnchor => "hide-handle widget is right of the anchor",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for GuardFailure {}

/// Pure geometric check over the hide-handle and anchor widgets.
pub struct PositionGuard;

impl PositionGuard {
    /// Checks the current layout. A missing layout fails as `MissingHandle`.
    pub fn check(layout: Option<&dyn StatusBarLayout>) -> Result<(), GuardFailure> {
        let Some(layout) = layout else {
            return Err(GuardFailure::MissingHandle);
        };
        Self::check_frames(
            layout.handle_frame(),
            layout.anchor_frame(),
            layout.screen_frame(),
        )
    }

    /// `true` iff [`check`](Self::check) passes.
    pub fn validate(layout: Option<&dyn StatusBarLayout>) -> bool {
        Self::check(layout).is_ok()
    }

    /// Checks explicit frames.
    pub fn check_frames(
        handle: Option<Rect>,
        anchor: Option<Rect>,
        screen: Option<Rect>,
    ) -> Result<(), GuardFailure> {
        let handle = handle.ok_or(GuardFailure::MissingHandle)?;
        let anchor = anchor.ok_or(GuardFailure::MissingAnchor)?;
        let screen = screen.ok_or(GuardFailure::MissingScreen)?;

        if !handle.intersects(&screen) {
            return Err(GuardFailure::HandleOffScreen);
        }
        if handle.max_x() > anchor.min_x() {
            return Err(GuardFailure::HandleRightOfAnchor);
        }
        Ok(())
    }
}
