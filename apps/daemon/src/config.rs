//! Daemon configuration.
//!
//! Stored as TOML:
//! - Linux: `~/.config/menushade/config.toml`
//! - Windows: `%APPDATA%/menushade/config.toml`
//!
//! `MENUSHADE_CONFIG` overrides the path.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use menushade_protocol::constants::DEFAULT_REHIDE_DELAY;
use menushade_triggers::{HoverConfig, ScriptTriggerConfig, TriggerPolicy};

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "MENUSHADE_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Collapse the hidden section again after a reveal.
    #[serde(default = "default_true")]
    pub auto_rehide: bool,

    /// Seconds before an automatic rehide.
    #[serde(default = "default_rehide_delay")]
    pub rehide_delay_secs: f64,

    /// Require a credential challenge before revealing.
    #[serde(default)]
    pub require_auth: bool,

    /// Credential challenge command; exit status 0 grants. Empty denies.
    #[serde(default)]
    pub auth_command: Vec<String>,

    #[serde(default)]
    pub scroll_enabled: bool,

    /// Drive a simulated status bar; off leaves the engine without a
    /// hide-handle widget.
    #[serde(default = "default_true")]
    pub simulated_layout: bool,

    /// JSON list of status bar items served by the headless directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory_snapshot: Option<PathBuf>,

    #[serde(default)]
    pub hover: HoverSection,

    #[serde(default)]
    pub script_trigger: ScriptSection,

    #[serde(default)]
    pub network_trigger: NetworkSection,

    /// Shortcut label → bundle id.
    #[serde(default)]
    pub icon_hotkeys: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoverSection {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_hover_delay")]
    pub delay_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptSection {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub path: String,
    #[serde(default = "default_script_interval")]
    pub interval_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSection {
    #[serde(default)]
    pub enabled: bool,
    /// Network identities that reveal the hidden section (exact match).
    #[serde(default)]
    pub networks: Vec<String>,
    #[serde(default = "default_network_poll")]
    pub poll_secs: f64,
    /// Command printing the current network identity.
    #[serde(default = "default_network_command")]
    pub command: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_rehide_delay() -> f64 {
    DEFAULT_REHIDE_DELAY.as_secs_f64()
}

fn default_hover_delay() -> f64 {
    0.25
}

fn default_script_interval() -> f64 {
    10.0
}

fn default_network_poll() -> f64 {
    5.0
}

fn default_network_command() -> Vec<String> {
    vec!["iwgetid".into(), "-r".into()]
}

impl Default for HoverSection {
    fn default() -> Self {
        Self {
            enabled: false,
            delay_secs: default_hover_delay(),
        }
    }
}

impl Default for ScriptSection {
    fn default() -> Self {
        Self {
            enabled: false,
            path: String::new(),
            interval_secs: default_script_interval(),
        }
    }
}

impl Default for NetworkSection {
    fn default() -> Self {
        Self {
            enabled: false,
            networks: Vec::new(),
            poll_secs: default_network_poll(),
            command: default_network_command(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            auto_rehide: true,
            rehide_delay_secs: default_rehide_delay(),
            require_auth: false,
            auth_command: Vec::new(),
            scroll_enabled: false,
            simulated_layout: true,
            hover: HoverSection::default(),
            script_trigger: ScriptSection::default(),
            network_trigger: NetworkSection::default(),
            icon_hotkeys: BTreeMap::new(),
            directory_snapshot: None,
        }
    }
}

/// Seconds from the config file; negative or non-finite values fall back.
fn secs(value: f64, fallback: Duration) -> Duration {
    if value.is_finite() && value >= 0.0 {
        Duration::try_from_secs_f64(value).unwrap_or(fallback)
    } else {
        fallback
    }
}

impl Config {
    /// Loads configuration from disk, or writes and returns the default.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        // The file may name an auth command.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    pub fn trigger_policy(&self) -> TriggerPolicy {
        TriggerPolicy {
            auto_rehide: self.auto_rehide,
            rehide_delay: secs(self.rehide_delay_secs, DEFAULT_REHIDE_DELAY),
            trusted_networks: if self.network_trigger.enabled {
                self.network_trigger.networks.clone()
            } else {
                Vec::new()
            },
        }
    }

    pub fn hover_config(&self) -> HoverConfig {
        HoverConfig {
            enabled: self.hover.enabled,
            delay: HoverConfig::delay_from_secs(self.hover.delay_secs),
            scroll_enabled: self.scroll_enabled,
        }
    }

    pub fn script_config(&self) -> ScriptTriggerConfig {
        let defaults = ScriptTriggerConfig::default();
        ScriptTriggerConfig {
            path: self.script_trigger.path.clone(),
            interval: secs(self.script_trigger.interval_secs, defaults.interval),
        }
    }

    pub fn network_poll(&self) -> Duration {
        secs(
            self.network_trigger.poll_secs,
            Duration::from_secs_f64(default_network_poll()),
        )
    }
}

/// Returns the configuration file path.
pub fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV)
        && !path.trim().is_empty()
    {
        return PathBuf::from(path);
    }

    #[cfg(target_os = "linux")]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        PathBuf::from(home)
            .join(".config")
            .join("menushade")
            .join("config.toml")
    }

    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        PathBuf::from(appdata).join("menushade").join("config.toml")
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        PathBuf::from("/tmp/menushade/config.toml")
    }
}
