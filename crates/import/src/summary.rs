//! Import outcome counters.

use std::fmt;

use serde::Serialize;

use crate::resolve::SkipReason;

/// Every raw token of an import lands in exactly one of these buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub moved_hidden: usize,
    pub moved_visible: usize,
    pub failed_moves: usize,
    pub skipped_not_running: usize,
    pub skipped_ambiguous: usize,
    pub skipped_unsupported: usize,
    pub skipped_duplicates: usize,
}

impl ImportSummary {
    pub fn total_moved(&self) -> usize {
        self.moved_hidden + self.moved_visible
    }

    pub fn total_skipped(&self) -> usize {
        self.skipped_not_running
            + self.skipped_ambiguous
            + self.skipped_unsupported
            + self.skipped_duplicates
    }

    /// Number of tokens accounted for across all buckets.
    pub fn total(&self) -> usize {
        self.total_moved() + self.failed_moves + self.total_skipped()
    }

    pub(crate) fn record_skip(&mut self, reason: SkipReason) {
        let bucket = match reason {
            SkipReason::NotRunning => &mut self.skipped_not_running,
            SkipReason::Ambiguous => &mut self.skipped_ambiguous,
            SkipReason::Unsupported => &mut self.skipped_unsupported,
            SkipReason::Duplicate => &mut self.skipped_duplicates,
        };
        *bucket += 1;
    }
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Hidden: {}", self.moved_hidden)?;
        writeln!(f, "Visible: {}", self.moved_visible)?;
        writeln!(f, "Failed moves: {}", self.failed_moves)?;
        writeln!(f, "Skipped (not running): {}", self.skipped_not_running)?;
        writeln!(f, "Skipped (ambiguous): {}", self.skipped_ambiguous)?;
        writeln!(f, "Skipped (unsupported): {}", self.skipped_unsupported)?;
        write!(f, "Skipped (duplicates): {}", self.skipped_duplicates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals() {
        let mut summary = ImportSummary {
            moved_hidden: 2,
            moved_visible: 1,
            failed_moves: 1,
            ..Default::default()
        };
        summary.record_skip(SkipReason::Duplicate);
        summary.record_skip(SkipReason::NotRunning);
        summary.record_skip(SkipReason::NotRunning);

        assert_eq!(summary.total_moved(), 3);
        assert_eq!(summary.total_skipped(), 3);
        assert_eq!(summary.skipped_not_running, 2);
        assert_eq!(summary.total(), 7);
    }

    #[test]
    fn display_lists_every_counter() {
        let summary = ImportSummary {
            moved_hidden: 4,
            skipped_unsupported: 1,
            ..Default::default()
        };
        let text = summary.to_string();
        assert_eq!(text.lines().count(), 7);
        assert!(text.starts_with("Hidden: 4\n"));
        assert!(text.contains("Skipped (unsupported): 1"));
        assert!(text.ends_with("Skipped (duplicates): 0"));
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(ImportSummary {
            moved_visible: 3,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(json["movedVisible"], 3);
        assert_eq!(json["skippedNotRunning"], 0);
    }
}
