//! MenuShade daemon entry point.

mod app;
mod config;
mod console;
mod headless;

use std::path::PathBuf;
use std::process;

use tracing_subscriber::EnvFilter;

const USAGE: &str = "\
usage: menushade [run]                     run the daemon, reading commands from stdin
       menushade import <file> [--json]    import a profile and print the summary
       menushade help";

#[derive(Debug, PartialEq)]
enum Invocation {
    Run,
    Import { path: PathBuf, json: bool },
    Help,
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();

    let invocation = match parse_args(&arg_refs) {
        Ok(i) => i,
        Err(e) => {
            eprintln!("menushade: {e}");
            process::exit(2);
        }
    };
    if invocation == Invocation::Help {
        println!("{USAGE}");
        return Ok(());
    }

    // Initialize structured logging. Stdout carries command output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,menushade=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting MenuShade");

    // Load configuration.
    let config = config::Config::load()?;
    tracing::info!(
        path = %config::config_path().display(),
        require_auth = config.require_auth,
        "configuration loaded"
    );

    // Build and run the tokio runtime.
    let rt = tokio::runtime::Runtime::new()?;
    match invocation {
        Invocation::Import { path, json } => rt.block_on(app::run_import(config, &path, json))?,
        Invocation::Run | Invocation::Help => rt.block_on(app::run(config))?,
    }

    tracing::info!("shut down cleanly");
    Ok(())
}

fn parse_args(args: &[&str]) -> Result<Invocation, String> {
    match args.first().copied() {
        None | Some("run") => Ok(Invocation::Run),
        Some("help" | "-h" | "--help") => Ok(Invocation::Help),
        Some("import") => {
            let mut json = false;
            let mut path = None;
            for arg in &args[1..] {
                match *arg {
                    "--json" => json = true,
                    other if path.is_none() && !other.starts_with('-') => {
                        path = Some(PathBuf::from(other));
                    }
                    other => return Err(format!("unexpected argument '{other}'\n{USAGE}")),
                }
            }
            let path = path.ok_or_else(|| format!("import needs a file\n{USAGE}"))?;
            Ok(Invocation::Import { path, json })
        }
        Some(other) => Err(format!("unknown command '{other}'\n{USAGE}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_args_runs_daemon() {
        assert_eq!(parse_args(&[]).unwrap(), Invocation::Run);
        assert_eq!(parse_args(&["run"]).unwrap(), Invocation::Run);
    }

    #[test]
    fn import_args() {
        assert_eq!(
            parse_args(&["import", "p.plist"]).unwrap(),
            Invocation::Import {
                path: PathBuf::from("p.plist"),
                json: false
            }
        );
        assert_eq!(
            parse_args(&["import", "--json", "p.json"]).unwrap(),
            Invocation::Import {
                path: PathBuf::from("p.json"),
                json: true
            }
        );
        assert!(parse_args(&["import"]).is_err());
        assert!(parse_args(&["import", "a", "b"]).is_err());
        assert!(parse_args(&["import", "--verbose", "a"]).is_err());
    }

    #[test]
    fn help_and_unknown() {
        assert_eq!(parse_args(&["--help"]).unwrap(), Invocation::Help);
        assert!(parse_args(&["launch"]).is_err());
    }
}
