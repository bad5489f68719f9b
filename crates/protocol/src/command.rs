//! String, URL and automation command surfaces.
//!
//! Every surface maps onto a [`TriggerSignal`]; unknown commands are
//! rejected with [`CommandError`] so the caller can log and ignore them.

use std::str::FromStr;

use url::Url;

use crate::constants::{SEARCH_QUERY_PARAM, URL_SCHEME};
use crate::signal::{TriggerSignal, Verb};

/// Errors produced while parsing a command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command: {0}")]
    Unknown(String),

    #[error("invalid command URL: {0}")]
    InvalidUrl(String),

    #[error("unsupported URL scheme: {0}")]
    WrongScheme(String),
}

/// A command received over the inter-process surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Toggle,
    Show,
    Hide,
    Search { query: Option<String> },
    Settings,
}

impl Command {
    /// Parses a plain string command such as `toggle` or `search wifi`.
    ///
    /// The command word is case-insensitive; anything after the first
    /// whitespace is the search query.
    pub fn parse(input: &str) -> Result<Self, CommandError> {
        let input = input.trim();
        let (word, rest) = match input.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, Some(rest.trim())),
            None => (input, None),
        };
        let query = rest.filter(|q| !q.is_empty()).map(str::to_string);
        Self::from_word(&word.to_lowercase(), query)
    }

    /// Parses a command URL: `menushade://<command>[?q=<query>]`.
    ///
    /// The command is the URL host, or the first path segment when the
    /// host is empty (`menushade:///search`, `menushade:toggle`).
    pub fn from_url(input: &str) -> Result<Self, CommandError> {
        let url = Url::parse(input.trim()).map_err(|e| CommandError::InvalidUrl(e.to_string()))?;
        if !url.scheme().eq_ignore_ascii_case(URL_SCHEME) {
            return Err(CommandError::WrongScheme(url.scheme().to_string()));
        }

        let word = match url.host_str().filter(|h| !h.is_empty()) {
            Some(host) => host.to_string(),
            None => url
                .path()
                .trim_start_matches('/')
                .split('/')
                .next()
                .unwrap_or_default()
                .to_string(),
        };

        let query = url
            .query_pairs()
            .find(|(k, _)| k == SEARCH_QUERY_PARAM)
            .map(|(_, v)| v.into_owned())
            .filter(|q| !q.is_empty());

        Self::from_word(&word.to_lowercase(), query)
    }

    fn from_word(word: &str, query: Option<String>) -> Result<Self, CommandError> {
        match word {
            "toggle" => Ok(Self::Toggle),
            "show" => Ok(Self::Show),
            "hide" => Ok(Self::Hide),
            "search" => Ok(Self::Search { query }),
            "settings" => Ok(Self::Settings),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }

    /// Maps the command onto its arbitration signal.
    pub fn into_signal(self) -> TriggerSignal {
        match self {
            Self::Toggle => TriggerSignal::UrlCommand(Verb::Toggle),
            Self::Show => TriggerSignal::UrlCommand(Verb::Show),
            Self::Hide => TriggerSignal::UrlCommand(Verb::Hide),
            Self::Search { query } => TriggerSignal::Search { query },
            Self::Settings => TriggerSignal::OpenSettings,
        }
    }
}

/// A verb received over the automation (scripting) surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutomationVerb(pub Verb);

impl AutomationVerb {
    pub fn into_signal(self) -> TriggerSignal {
        TriggerSignal::AutomationCommand(self.0)
    }
}

impl FromStr for AutomationVerb {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "show" => Ok(Self(Verb::Show)),
            "hide" => Ok(Self(Verb::Hide)),
            "toggle" => Ok(Self(Verb::Toggle)),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}
