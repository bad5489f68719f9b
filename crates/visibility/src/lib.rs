//! Visibility engine for the hidden section of the status bar.
//!
//! [`VisibilityController`] owns the `hidden`/`expanded` state and the
//! hide-handle widget. Every hide is checked by [`PositionGuard`], every
//! reveal can be gated behind [`AuthGate`], and [`RehideScheduler`] keeps at
//! most one delayed rehide pending. State changes are published on a
//! broadcast channel as [`VisibilityEvent`]s.

pub mod auth;
pub mod controller;
pub mod error;
pub mod events;
pub mod guard;
pub mod layout;
pub mod scheduler;

pub use auth::{AuthGate, AuthGrant, ChallengeFuture, CommandChallenge, CredentialChallenge, DenyAll};
pub use controller::VisibilityController;
pub use error::VisibilityError;
pub use events::VisibilityEvent;
pub use guard::{GuardFailure, PositionGuard, Rect};
pub use layout::{COLLAPSED_HANDLE_LENGTH, EXPANDED_HANDLE_LENGTH, StatusBarLayout};
pub use scheduler::{PlanId, RehideScheduler};
