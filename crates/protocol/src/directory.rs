//! Menu bar item directory collaborator.
//!
//! The platform layer implements [`MenuBarItemDirectory`] on top of its
//! accessibility API. The engine only calls it: it lists the items that are
//! currently on screen, moves an item across a zone boundary, and activates
//! an item. Using a trait keeps the engine testable with mocks.

use std::future::Future;
use std::pin::Pin;

use crate::types::{MenuBarItemRecord, Zone};

/// A boxed future returned by directory methods.
pub type DirectoryFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Query/mutation service over the status bar items currently present.
pub trait MenuBarItemDirectory: Send + Sync {
    /// Whether the directory is allowed to query the platform at all
    /// (accessibility permission granted).
    fn has_access(&self) -> bool;

    /// Lists the items currently observable on screen.
    fn list_items(&self) -> DirectoryFuture<'_, Vec<MenuBarItemRecord>>;

    /// Moves one item into `zone`. Returns `true` when the move was applied.
    fn move_item<'a>(
        &'a self,
        bundle_id: &'a str,
        menu_extra_id: Option<&'a str>,
        status_item_index: Option<u32>,
        zone: Zone,
    ) -> DirectoryFuture<'a, bool>;

    /// Activates (clicks) the item owned by `bundle_id`.
    fn activate_item<'a>(&'a self, bundle_id: &'a str) -> DirectoryFuture<'a, bool>;
}
