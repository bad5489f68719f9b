use std::fmt;

use serde::{Deserialize, Serialize};

/// Whether the hidden section of the status bar is collapsed or revealed.
///
/// The engine starts `Hidden` so the bar is clean on launch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VisibilityState {
    /// Hide-handle stretched; trailing items pushed off-screen.
    #[default]
    Hidden,
    /// Hide-handle at its minimal width; hidden items on screen.
    Expanded,
}

impl VisibilityState {
    /// Returns the opposite state.
    pub fn toggled(self) -> Self {
        match self {
            Self::Hidden => Self::Expanded,
            Self::Expanded => Self::Hidden,
        }
    }

    pub fn is_hidden(self) -> bool {
        self == Self::Hidden
    }
}

impl fmt::Display for VisibilityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hidden => f.write_str("hidden"),
            Self::Expanded => f.write_str("expanded"),
        }
    }
}

/// Classification of a status bar item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Zone {
    Visible,
    Hidden,
    AlwaysHidden,
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Visible => f.write_str("visible"),
            Self::Hidden => f.write_str("hidden"),
            Self::AlwaysHidden => f.write_str("alwaysHidden"),
        }
    }
}

/// A status bar item as reported by the menu bar item directory.
///
/// Snapshot data: rebuilt on every query, never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuBarItemRecord {
    pub bundle_id: String,
    /// Application-declared identifier of this specific item, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu_extra_id: Option<String>,
    /// Ordinal among the items owned by the same application.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_item_index: Option<u32>,
    pub display_name: String,
    pub zone: Zone,
}

impl MenuBarItemRecord {
    /// Creates a record with no secondary identifier or index.
    pub fn new(bundle_id: impl Into<String>, display_name: impl Into<String>, zone: Zone) -> Self {
        Self {
            bundle_id: bundle_id.into(),
            menu_extra_id: None,
            status_item_index: None,
            display_name: display_name.into(),
            zone,
        }
    }

    pub fn with_menu_extra_id(mut self, id: impl Into<String>) -> Self {
        self.menu_extra_id = Some(id.into());
        self
    }

    pub fn with_status_item_index(mut self, index: u32) -> Self {
        self.status_item_index = Some(index);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visibility_starts_hidden() {
        assert_eq!(VisibilityState::default(), VisibilityState::Hidden);
        assert!(VisibilityState::default().is_hidden());
    }

    #[test]
    fn visibility_toggled_alternates() {
        let s = VisibilityState::Hidden;
        assert_eq!(s.toggled(), VisibilityState::Expanded);
        assert_eq!(s.toggled().toggled(), VisibilityState::Hidden);
    }

    #[test]
    fn record_json_uses_camel_case() {
        let record = MenuBarItemRecord::new("com.foo.App", "Foo", Zone::AlwaysHidden)
            .with_menu_extra_id("com.foo.App.extra")
            .with_status_item_index(2);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["bundleId"], "com.foo.App");
        assert_eq!(json["menuExtraId"], "com.foo.App.extra");
        assert_eq!(json["statusItemIndex"], 2);
        assert_eq!(json["zone"], "alwaysHidden");
    }

    #[test]
    fn record_optional_fields_default() {
        let json = r#"{"bundleId":"com.foo.App","displayName":"Foo","zone":"visible"}"#;
        let record: MenuBarItemRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.menu_extra_id, None);
        assert_eq!(record.status_item_index, None);
        assert_eq!(record.zone, Zone::Visible);
    }
}
