pub mod bind;
pub mod cli;
pub mod clock;
pub mod config;
pub mod datetime;
pub mod error;
pub mod event;
pub mod grid;
pub mod layout;
pub mod render;
pub mod source;
pub mod view;

use std::ffi::OsString;
use std::io::{
  self,
  Write
};

use anyhow::{
  Context,
  anyhow
};
use chrono::NaiveDate;
use clap::Parser;
use tracing::{
  debug,
  info
};

pub use crate::bind::{
  events_in_slot,
  events_on,
  split_overflow
};
pub use crate::clock::{
  ClockTime,
  format_hour_label
};
pub use crate::error::{
  CalendarError,
  CalendarResult
};
pub use crate::event::{
  Event,
  EventRecord,
  TimeParsing
};
pub use crate::grid::{
  CalendarView,
  GridOptions,
  MonthGrid,
  TimeGrid,
  build_day_grid,
  build_month_grid,
  build_week_grid,
  render_view
};
pub use crate::layout::{
  LayoutMetrics,
  OverlapPolicy,
  SlotGeometry,
  layout_slot
};
pub use crate::view::{
  ViewMode,
  ViewState
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let cli =
    cli::GlobalCli::parse_from(raw_args);

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting labcal"
  );

  let stdout = io::stdout();
  execute(cli, stdout.lock())?;

  info!("done");
  Ok(())
}

/// Runs one parsed invocation,
/// writing the view to `out`.
#[tracing::instrument(skip_all)]
pub fn execute<W: Write>(
  cli: cli::GlobalCli,
  mut out: W
) -> anyhow::Result<()> {
  let mut cfg =
    config::CalendarConfig::load(
      cli.config.as_deref()
    )?;
  cfg
    .apply_overrides(
      cli
        .overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
    .context("invalid --set override")?;
  let options = cfg.grid_options()?;
  let timezone = cfg.timezone();

  let today = match cli.today.as_deref()
  {
    | Some(raw) => {
      NaiveDate::parse_from_str(
        raw.trim(),
        "%Y-%m-%d"
      )
      .with_context(|| {
        format!(
          "invalid --today value: {raw}"
        )
      })?
    }
    | None => {
      datetime::today_in(timezone)
    }
  };
  let selected = match cli.date.as_deref()
  {
    | Some(expr) => {
      datetime::parse_date_expr(
        expr, today
      )?
    }
    | None => today
  };
  debug!(%today, %selected, "resolved dates");

  let events_path =
    source::resolve_events_path(
      cli.events.as_deref()
    )?;
  let parsing = if cli.strict {
    TimeParsing::Strict
  } else {
    TimeParsing::Lenient
  };
  let events = source::load_events(
    &events_path,
    parsing
  )?;

  let renderer =
    render::Renderer::new(!cli.no_color);

  let Some(mode) =
    cli.command.view_mode()
  else {
    let cli::Command::Event { id } =
      cli.command
    else {
      return Err(anyhow!(
        "unsupported command"
      ));
    };
    let event = events
      .iter()
      .find(|event| event.id == id)
      .ok_or_else(|| {
        anyhow!(
          "no event with id '{id}' in \
           {}",
          events_path.display()
        )
      })?;
    if cli.json {
      serde_json::to_writer_pretty(
        &mut out, event
      )?;
      writeln!(out)?;
    } else {
      renderer.write_event(&mut out, event)?;
    }
    return Ok(());
  };

  let state =
    ViewState::new(selected, mode);
  let view = render_view(
    &events, &state, today, &options
  );

  if cli.json {
    serde_json::to_writer_pretty(
      &mut out, &view
    )?;
    writeln!(out)?;
    return Ok(());
  }

  let mut title =
    state.title(options.week_start);
  if let Some(tz) = timezone {
    title.push_str(&format!(" ({tz})"));
  }
  renderer.write_view(
    &mut out, &title, &view
  )
}
