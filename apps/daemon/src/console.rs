//! Line-oriented command console.
//!
//! Each stdin line is one command. Surface commands (`toggle`, `search wifi`,
//! `menushade://show`) become trigger signals; the rest drive the local
//! producers or the daemon itself.

use std::path::PathBuf;

use menushade_protocol::constants::URL_SCHEME;
use menushade_protocol::{AutomationVerb, Command, CommandError, TriggerSignal};

/// Pointer events fed to the hover tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    Enter,
    Exit,
    Scroll,
}

/// A parsed console line.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleLine {
    /// Blank line or comment.
    Empty,
    /// A signal for the arbitrator.
    Signal(TriggerSignal),
    /// A shortcut press for the per-icon hotkeys.
    Key(String),
    Pointer(PointerEvent),
    Import { path: PathBuf, json: bool },
    State,
    Help,
    Quit,
}

/// Console usage text.
pub const HELP: &str = "\
commands:
  toggle | show | hide | settings     visibility commands
  search [query]                      open search
  menushade://<command>[?q=<query>]   command URL
  automation show|hide|toggle         automation surface
  click [--override]                  status bar click
  key <shortcut>                      per-icon hotkey press
  pointer enter|exit|scroll           hover tracking
  import <file> [--json]              import a profile
  state                               print the current state
  quit                                stop the daemon";

/// Parses one console line.
pub fn parse_line(line: &str) -> Result<ConsoleLine, CommandError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(ConsoleLine::Empty);
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    if let Some((scheme, _)) = word.split_once(':')
        && scheme.eq_ignore_ascii_case(URL_SCHEME)
    {
        return Command::from_url(line).map(|c| ConsoleLine::Signal(c.into_signal()));
    }

    match word.to_lowercase().as_str() {
        "automation" => {
            let verb: AutomationVerb = rest.parse()?;
            Ok(ConsoleLine::Signal(verb.into_signal()))
        }
        "click" => match rest {
            "" => Ok(ConsoleLine::Signal(TriggerSignal::Click {
                bypass_safety: false,
            })),
            "--override" => Ok(ConsoleLine::Signal(TriggerSignal::Click {
                bypass_safety: true,
            })),
            other => Err(CommandError::Unknown(format!("click {other}"))),
        },
        "key" if !rest.is_empty() => Ok(ConsoleLine::Key(rest.to_string())),
        "pointer" => match rest.to_lowercase().as_str() {
            "enter" => Ok(ConsoleLine::Pointer(PointerEvent::Enter)),
            "exit" => Ok(ConsoleLine::Pointer(PointerEvent::Exit)),
            "scroll" => Ok(ConsoleLine::Pointer(PointerEvent::Scroll)),
            other => Err(CommandError::Unknown(format!("pointer {other}"))),
        },
        "import" => parse_import(rest),
        "state" => Ok(ConsoleLine::State),
        "help" | "?" => Ok(ConsoleLine::Help),
        "quit" | "exit" => Ok(ConsoleLine::Quit),
        _ => Command::parse(line).map(|c| ConsoleLine::Signal(c.into_signal())),
    }
}

fn parse_import(rest: &str) -> Result<ConsoleLine, CommandError> {
    let mut json = false;
    let mut path = None;
    for arg in rest.split_whitespace() {
        match arg {
            "--json" => json = true,
            other if path.is_none() => path = Some(PathBuf::from(other)),
            other => return Err(CommandError::Unknown(format!("import {other}"))),
        }
    }
    match path {
        Some(path) => Ok(ConsoleLine::Import { path, json }),
        None => Err(CommandError::Unknown("import (missing file)".into())),
    }
}
