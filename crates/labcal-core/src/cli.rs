use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::view::ViewMode;

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "labcal",
    version,
    about = "Month, week and day views over the lab's meeting calendar",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    /// Calendar config file (defaults to $LABCAL_CONFIG or the user config dir).
    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Events file, JSON array or JSON lines.
    #[arg(long = "events", global = true)]
    pub events: Option<PathBuf>,

    #[arg(
        long = "set",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append,
        global = true
    )]
    pub overrides: Vec<KeyVal>,

    /// Date to anchor the view on: today, tomorrow, YYYY-MM-DD, +3d, -1w, +2m, friday.
    #[arg(long = "date", global = true, allow_hyphen_values = true)]
    pub date: Option<String>,

    /// Pretend the current date is YYYY-MM-DD.
    #[arg(long = "today", global = true)]
    pub today: Option<String>,

    /// Reject events whose times are not valid HH:MM.
    #[arg(long = "strict", global = true)]
    pub strict: bool,

    /// Print the computed grid as JSON instead of a table.
    #[arg(long = "json", global = true)]
    pub json: bool,

    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Month grid with up to two events per day.
    Month,
    /// Seven day columns by 24 hour rows.
    Week,
    /// One day column by 24 hour rows.
    Day,
    /// Show a single event.
    Event { id: String },
}

impl Command {
    pub fn view_mode(&self) -> Option<ViewMode> {
        match self {
            Command::Month => Some(ViewMode::Month),
            Command::Week => Some(ViewMode::Week),
            Command::Day => Some(ViewMode::Day),
            Command::Event { .. } => None,
        }
    }
}

/// Filter used when `RUST_LOG` is unset: `-v`/`-q` move the engine's own
/// level, dependencies stay at `warn`.
pub fn default_log_filter(verbose: u8, quiet: u8) -> String {
    let engine = match (quiet, verbose) {
        (2.., _) => "error",
        (1, _) => "warn",
        (0, 0) => "warn",
        (0, 1) => "info",
        (0, 2) => "debug",
        (0, _) => "trace",
    };
    format!("warn,labcal_core={engine},labcal={engine}")
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let directives = default_log_filter(verbose, quiet);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&directives))
        .map_err(|e| anyhow!("invalid log filter '{directives}': {e}"))?;

    let installed = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(verbose >= 2)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = installed {
        debug!(error = %err, "tracing already initialised");
    }

    Ok(())
}
