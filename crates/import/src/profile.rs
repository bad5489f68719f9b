//! Exported profile parsing.
//!
//! The export is a property list (XML or binary). A JSON document with the
//! same shape is accepted too; the format is picked from the leading bytes.

use std::path::Path;

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};
use tracing::debug;

use crate::error::ImportError;

/// Raw tokens from the active profile, in document order.
///
/// A list that is not made only of strings reads as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ImportProfile {
    #[serde(rename = "Hide", default, deserialize_with = "string_list")]
    pub hide: Vec<String>,
    #[serde(rename = "AlwaysHide", default, deserialize_with = "string_list")]
    pub always_hide: Vec<String>,
    #[serde(rename = "Show", default, deserialize_with = "string_list")]
    pub show: Vec<String>,
}

#[derive(Deserialize)]
struct ProfileDocument {
    #[serde(rename = "ProfileSettings", default, deserialize_with = "lenient")]
    profile_settings: Option<ProfileSettings>,
}

#[derive(Deserialize)]
struct ProfileSettings {
    #[serde(rename = "activeProfile", default, deserialize_with = "lenient")]
    active_profile: Option<ImportProfile>,
}

/// Reads a `T`, or `None` when the value has another shape.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Shape<T> {
        Expected(T),
        Other(IgnoredAny),
    }

    Ok(match Shape::<T>::deserialize(deserializer)? {
        Shape::Expected(value) => Some(value),
        Shape::Other(_) => None,
    })
}

fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let list = lenient::<D, Vec<String>>(deserializer)?;
    if list.is_none() {
        debug!("profile list is not a list of strings, ignoring it");
    }
    Ok(list.unwrap_or_default())
}

impl ImportProfile {
    /// Parses an exported document.
    pub fn from_bytes(data: &[u8]) -> Result<Self, ImportError> {
        let document: ProfileDocument = if looks_like_json(data) {
            serde_json::from_slice(data)?
        } else {
            plist::from_bytes(data)?
        };
        document
            .profile_settings
            .and_then(|settings| settings.active_profile)
            .ok_or(ImportError::ProfileNotFound)
    }

    /// `Hide` followed by `AlwaysHide`, trimmed, empties dropped.
    pub fn hide_set(&self) -> Vec<&str> {
        clean(self.hide.iter().chain(self.always_hide.iter()))
    }

    /// `Show`, trimmed, empties dropped.
    pub fn show_set(&self) -> Vec<&str> {
        clean(self.show.iter())
    }

    /// True when neither set has a usable token.
    pub fn is_empty(&self) -> bool {
        self.hide_set().is_empty() && self.show_set().is_empty()
    }
}

/// Reads and parses a profile file.
pub async fn load_profile(path: &Path) -> Result<ImportProfile, ImportError> {
    let data = tokio::fs::read(path).await?;
    debug!(path = %path.display(), bytes = data.len(), "read import profile");
    ImportProfile::from_bytes(&data)
}

fn clean<'a>(tokens: impl Iterator<Item = &'a String>) -> Vec<&'a str> {
    tokens
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect()
}

fn looks_like_json(data: &[u8]) -> bool {
    data.iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|&b| b == b'{')
}
