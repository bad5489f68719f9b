//! Token resolution against a directory snapshot.
//!
//! A raw token is either a bare bundle id (`com.foo.App`) or a bundle id
//! followed by `-` and a suffix naming one of that app's items
//! (`com.foo.App-Item-3`, `com.apple.controlcenter-com.apple.menuextra.wifi`,
//! `com.foo.App-Battery Status`).

use std::collections::HashMap;

use menushade_protocol::constants::IMPORT_SOURCE_BUNDLE_ID;
use menushade_protocol::{MenuBarItemRecord, Zone};

const SEPARATOR: char = '-';
const INDEX_MARKER: &str = "Item-";
const MENU_EXTRA_PREFIX: &str = "com.apple.menuextra.";

/// Why a token produced no move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    NotRunning,
    Ambiguous,
    Unsupported,
    Duplicate,
}

/// A token matched to a concrete item, ready for the directory's move call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMove {
    pub raw: String,
    pub bundle_id: String,
    pub menu_extra_id: Option<String>,
    pub status_item_index: Option<u32>,
    pub target_zone: Zone,
}

/// Lookup indices over one directory snapshot.
pub struct ResolutionContext {
    items: Vec<MenuBarItemRecord>,
    by_bundle: HashMap<String, Vec<usize>>,
    by_menu_extra_id: HashMap<String, usize>,
    by_menu_extra_id_lower: HashMap<String, usize>,
    by_bundle_and_name: HashMap<String, usize>,
}

/// Bundle id split out of a raw token.
#[derive(Debug, PartialEq, Eq)]
struct BundleMatch<'a> {
    bundle_id: &'a str,
    suffix: Option<&'a str>,
    running: bool,
}

impl ResolutionContext {
    /// Builds the indices. Secondary-identifier and name keys are first-seen-wins.
    pub fn new(items: Vec<MenuBarItemRecord>) -> Self {
        let mut by_bundle: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_menu_extra_id = HashMap::new();
        let mut by_menu_extra_id_lower = HashMap::new();
        let mut by_bundle_and_name = HashMap::new();

        for (i, item) in items.iter().enumerate() {
            by_bundle.entry(item.bundle_id.clone()).or_default().push(i);
            if let Some(id) = &item.menu_extra_id
                && !by_menu_extra_id.contains_key(id)
            {
                by_menu_extra_id.insert(id.clone(), i);
                by_menu_extra_id_lower.insert(id.to_lowercase(), i);
            }
            by_bundle_and_name
                .entry(composite_key(&item.bundle_id, &item.display_name))
                .or_insert(i);
        }

        Self {
            items,
            by_bundle,
            by_menu_extra_id,
            by_menu_extra_id_lower,
            by_bundle_and_name,
        }
    }

    /// Number of items in the snapshot.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Resolves one trimmed, non-empty token.
    pub fn resolve(&self, raw: &str, target_zone: Zone) -> Result<ResolvedMove, SkipReason> {
        if raw.starts_with(IMPORT_SOURCE_BUNDLE_ID) {
            return Err(SkipReason::Unsupported);
        }

        let found = self.split_bundle(raw);
        if !found.running {
            return Err(SkipReason::NotRunning);
        }
        let running = match self.by_bundle.get(found.bundle_id) {
            Some(indices) if !indices.is_empty() => indices,
            _ => return Err(SkipReason::NotRunning),
        };

        let single = (running.len() == 1).then(|| &self.items[running[0]]);
        let moved = |item: Option<&MenuBarItemRecord>| ResolvedMove {
            raw: raw.to_string(),
            bundle_id: found.bundle_id.to_string(),
            menu_extra_id: item.and_then(|i| i.menu_extra_id.clone()),
            status_item_index: item.and_then(|i| i.status_item_index),
            target_zone,
        };

        let Some(suffix) = found.suffix else {
            return Ok(moved(None));
        };

        if let Some(index) = parse_status_item_index(suffix) {
            let mut resolved = moved(None);
            resolved.status_item_index = Some(index);
            return Ok(resolved);
        }

        if let Some(candidate) = menu_extra_candidate(suffix) {
            let hit = self
                .by_menu_extra_id
                .get(candidate)
                .or_else(|| self.by_menu_extra_id_lower.get(&candidate.to_lowercase()))
                .map(|&i| &self.items[i]);
            return match hit.or(single) {
                Some(item) => Ok(moved(Some(item))),
                None => Err(SkipReason::Ambiguous),
            };
        }

        if let Some(&i) = self
            .by_bundle_and_name
            .get(&composite_key(found.bundle_id, suffix))
        {
            return Ok(moved(Some(&self.items[i])));
        }

        single.map(|item| moved(Some(item))).ok_or(SkipReason::Ambiguous)
    }

    fn split_bundle<'a>(&self, raw: &'a str) -> BundleMatch<'a> {
        if self.by_bundle.contains_key(raw) {
            return BundleMatch {
                bundle_id: raw,
                suffix: None,
                running: true,
            };
        }

        let longest = self
            .by_bundle
            .keys()
            .filter(|bundle| {
                raw.len() > bundle.len()
                    && raw.starts_with(bundle.as_str())
                    && raw[bundle.len()..].starts_with(SEPARATOR)
            })
            .max_by_key(|bundle| bundle.len());
        if let Some(bundle) = longest {
            let (bundle_id, rest) = raw.split_at(bundle.len());
            return BundleMatch {
                bundle_id,
                suffix: non_empty(&rest[SEPARATOR.len_utf8()..]),
                running: true,
            };
        }

        // Unverified split: the prefix is not a running bundle.
        match raw.split_once(SEPARATOR) {
            Some((bundle_id, suffix)) => BundleMatch {
                bundle_id,
                suffix: non_empty(suffix),
                running: false,
            },
            None => BundleMatch {
                bundle_id: raw,
                suffix: None,
                running: false,
            },
        }
    }
}

fn non_empty(s: &str) -> Option<&str> {
    (!s.is_empty()).then_some(s)
}

/// `...Item-<digits>` → the digits, using the last marker in the suffix.
fn parse_status_item_index(suffix: &str) -> Option<u32> {
    let at = suffix.rfind(INDEX_MARKER)?;
    let digits = &suffix[at + INDEX_MARKER.len()..];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn menu_extra_candidate(suffix: &str) -> Option<&str> {
    if let Some(at) = suffix.find(MENU_EXTRA_PREFIX) {
        return Some(&suffix[at..]);
    }
    suffix.contains('.').then_some(suffix)
}

fn normalize_label(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn composite_key(bundle_id: &str, name: &str) -> String {
    format!("{bundle_id}|{}", normalize_label(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(bundle: &str, name: &str) -> MenuBarItemRecord {
        MenuBarItemRecord::new(bundle, name, Zone::Visible)
    }

    fn context() -> ResolutionContext {
        ResolutionContext::new(vec![
            item("com.foo.App", "Foo"),
            item("com.foo.App.helper", "Foo Helper"),
            item("com.apple.controlcenter", "Wi-Fi")
                .with_menu_extra_id("com.apple.menuextra.wifi")
                .with_status_item_index(0),
            item("com.apple.controlcenter", "Clock")
                .with_menu_extra_id("com.apple.menuextra.clock")
                .with_status_item_index(1),
            item("com.multi.Tool", "Battery Status").with_status_item_index(0),
            item("com.multi.Tool", "Network Status").with_status_item_index(1),
        ])
    }

    #[test]
    fn bare_running_bundle_has_no_identifiers() {
        let m = context().resolve("com.foo.App", Zone::Hidden).unwrap();
        assert_eq!(m.bundle_id, "com.foo.App");
        assert_eq!(m.menu_extra_id, None);
        assert_eq!(m.status_item_index, None);
        assert_eq!(m.target_zone, Zone::Hidden);
    }

    #[test]
    fn index_suffix_resolves_position() {
        let m = context().resolve("com.foo.App-Item-3", Zone::Hidden).unwrap();
        assert_eq!(m.bundle_id, "com.foo.App");
        assert_eq!(m.status_item_index, Some(3));
        assert_eq!(m.menu_extra_id, None);
    }

    #[test]
    fn prefix_must_be_followed_by_separator() {
        let m = context()
            .resolve("com.foo.App.helper-Item-1", Zone::Visible)
            .unwrap();
        assert_eq!(m.bundle_id, "com.foo.App.helper");
        assert_eq!(m.status_item_index, Some(1));
    }

    #[test]
    fn longest_running_prefix_wins() {
        let ctx = ResolutionContext::new(vec![
            item("com.x", "X"),
            item("com.x-pro", "X Pro"),
        ]);
        let m = ctx.resolve("com.x-pro-Item-2", Zone::Hidden).unwrap();
        assert_eq!(m.bundle_id, "com.x-pro");
        assert_eq!(m.status_item_index, Some(2));

        let m = ctx.resolve("com.x-lite", Zone::Hidden).unwrap();
        assert_eq!(m.bundle_id, "com.x");
    }

    #[test]
    fn not_running_bundles_are_skipped() {
        let ctx = context();
        assert_eq!(ctx.resolve("com.gone.App", Zone::Hidden), Err(SkipReason::NotRunning));
        assert_eq!(
            ctx.resolve("com.gone.App-Item-0", Zone::Hidden),
            Err(SkipReason::NotRunning)
        );
    }

    #[test]
    fn own_bundle_is_unsupported() {
        let ctx = context();
        assert_eq!(
            ctx.resolve("com.surteesstudios.Bartender", Zone::Hidden),
            Err(SkipReason::Unsupported)
        );
        assert_eq!(
            ctx.resolve("com.surteesstudios.Bartender-statusItem", Zone::Visible),
            Err(SkipReason::Unsupported)
        );
    }

    #[test]
    fn menu_extra_suffix_exact_and_case_folded() {
        let ctx = context();
        let m = ctx
            .resolve("com.apple.controlcenter-com.apple.menuextra.clock", Zone::Visible)
            .unwrap();
        assert_eq!(m.menu_extra_id.as_deref(), Some("com.apple.menuextra.clock"));
        assert_eq!(m.status_item_index, Some(1));

        let m = ctx
            .resolve("com.apple.controlcenter-com.apple.menuextra.WiFi", Zone::Hidden)
            .unwrap();
        assert_eq!(m.menu_extra_id.as_deref(), Some("com.apple.menuextra.wifi"));
    }

    #[test]
    fn menu_extra_fragment_inside_suffix() {
        let m = context()
            .resolve(
                "com.apple.controlcenter-BentoBox-com.apple.menuextra.wifi",
                Zone::Hidden,
            )
            .unwrap();
        assert_eq!(m.menu_extra_id.as_deref(), Some("com.apple.menuextra.wifi"));
    }

    #[test]
    fn unknown_identifier_with_several_items_is_ambiguous() {
        assert_eq!(
            context().resolve("com.apple.controlcenter-com.apple.menuextra.siri", Zone::Hidden),
            Err(SkipReason::Ambiguous)
        );
    }

    #[test]
    fn unknown_identifier_with_single_item_falls_back() {
        let m = context()
            .resolve("com.foo.App-com.foo.statusitem", Zone::Hidden)
            .unwrap();
        assert_eq!(m.bundle_id, "com.foo.App");
        assert_eq!(m.menu_extra_id, None);
    }

    #[test]
    fn display_name_suffix_uses_normalized_key() {
        let m = context()
            .resolve("com.multi.Tool-network_status!", Zone::Hidden)
            .unwrap();
        assert_eq!(m.status_item_index, Some(1));

        assert_eq!(
            context().resolve("com.multi.Tool-Disk", Zone::Hidden),
            Err(SkipReason::Ambiguous)
        );
    }

    #[test]
    fn single_item_fallback_for_unknown_name() {
        let m = context().resolve("com.foo.App-Whatever", Zone::Hidden).unwrap();
        assert_eq!(m.bundle_id, "com.foo.App");
    }

    #[test]
    fn trailing_separator_counts_as_bare() {
        let m = context().resolve("com.foo.App-", Zone::Hidden).unwrap();
        assert_eq!(m.bundle_id, "com.foo.App");
        assert_eq!(m.status_item_index, None);
    }

    #[test]
    fn index_requires_digits_only() {
        assert_eq!(parse_status_item_index("Item-12"), Some(12));
        assert_eq!(parse_status_item_index("Item-1-Item-7"), Some(7));
        assert_eq!(parse_status_item_index("Item-"), None);
        assert_eq!(parse_status_item_index("Item-3a"), None);
        assert_eq!(parse_status_item_index("Menu"), None);
    }

    #[test]
    fn labels_normalize_to_lowercase_alphanumerics() {
        assert_eq!(normalize_label("Wi-Fi Status 2"), "wifistatus2");
        assert_eq!(composite_key("com.a", "B c"), "com.a|bc");
    }

    #[test]
    fn first_seen_identifier_wins() {
        let ctx = ResolutionContext::new(vec![
            item("com.a", "One").with_menu_extra_id("x.y").with_status_item_index(0),
            item("com.a", "Two").with_menu_extra_id("x.y").with_status_item_index(1),
        ]);
        let m = ctx.resolve("com.a-x.y", Zone::Hidden).unwrap();
        assert_eq!(m.status_item_index, Some(0));
        assert_eq!(ctx.len(), 2);
    }
}
