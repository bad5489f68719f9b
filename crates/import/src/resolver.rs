//! Import pipeline over a live directory.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use menushade_protocol::{MenuBarItemDirectory, Zone};
use menushade_visibility::VisibilityError;

use crate::control::VisibilityControl;
use crate::error::ImportError;
use crate::profile::ImportProfile;
use crate::resolve::{ResolutionContext, ResolvedMove, SkipReason};
use crate::summary::ImportSummary;

/// Runs an import against a directory, revealing the bar around the moves.
pub struct ImportResolver<'a> {
    directory: &'a dyn MenuBarItemDirectory,
    control: &'a dyn VisibilityControl,
}

impl<'a> ImportResolver<'a> {
    pub fn new(directory: &'a dyn MenuBarItemDirectory, control: &'a dyn VisibilityControl) -> Self {
        Self { directory, control }
    }

    /// Imports a profile and reports where every token went.
    ///
    /// Fails before touching the directory when the profile is empty or
    /// directory access is missing, and before any move when the forced
    /// reveal is denied.
    pub async fn import(&self, profile: &ImportProfile) -> Result<ImportSummary, ImportError> {
        let hide_raw = profile.hide_set();
        let show_raw = profile.show_set();
        if hide_raw.is_empty() && show_raw.is_empty() {
            return Err(ImportError::EmptyProfile);
        }
        if !self.directory.has_access() {
            return Err(ImportError::AccessibilityRequired);
        }

        let mut summary = ImportSummary::default();
        let mut seen = HashSet::new();
        let hide = dedup(hide_raw, &mut seen, &mut summary);
        let show = dedup(show_raw, &mut seen, &mut summary);

        let was_hidden = self.control.state().is_hidden();
        if was_hidden {
            match self.control.reveal_pinned().await {
                Ok(_) => {}
                Err(VisibilityError::AuthDenied) => return Err(ImportError::AuthRequired),
                Err(e) => debug!(error = %e, "forced reveal unavailable, importing anyway"),
            }
        }

        let context = ResolutionContext::new(self.directory.list_items().await);
        debug!(
            items = context.len(),
            hide = hide.len(),
            show = show.len(),
            "resolving import tokens"
        );

        let moves = hide
            .iter()
            .map(|t| (*t, Zone::Hidden))
            .chain(show.iter().map(|t| (*t, Zone::Visible)))
            .filter_map(|(raw, zone)| match context.resolve(raw, zone) {
                Ok(resolved) => Some(resolved),
                Err(reason) => {
                    debug!(token = raw, ?reason, "import token skipped");
                    summary.record_skip(reason);
                    None
                }
            })
            .collect::<Vec<_>>();

        for resolved in &moves {
            self.apply(resolved, &mut summary).await;
        }

        if was_hidden && let Err(e) = self.control.rehide().await {
            warn!(error = %e, "could not restore hidden state after import");
        }

        info!(
            moved = summary.total_moved(),
            failed = summary.failed_moves,
            not_running = summary.skipped_not_running,
            "import complete"
        );
        Ok(summary)
    }

    async fn apply(&self, resolved: &ResolvedMove, summary: &mut ImportSummary) {
        let ok = self
            .directory
            .move_item(
                &resolved.bundle_id,
                resolved.menu_extra_id.as_deref(),
                resolved.status_item_index,
                resolved.target_zone,
            )
            .await;
        match (ok, resolved.target_zone) {
            (true, Zone::Visible) => summary.moved_visible += 1,
            (true, _) => summary.moved_hidden += 1,
            (false, _) => {
                warn!(token = %resolved.raw, zone = %resolved.target_zone, "move failed");
                summary.failed_moves += 1;
            }
        }
    }
}

/// Drops tokens already seen in either set.
fn dedup<'p>(
    tokens: Vec<&'p str>,
    seen: &mut HashSet<&'p str>,
    summary: &mut ImportSummary,
) -> Vec<&'p str> {
    tokens
        .into_iter()
        .filter(|t| {
            let fresh = seen.insert(*t);
            if !fresh {
                summary.record_skip(SkipReason::Duplicate);
            }
            fresh
        })
        .collect()
}
