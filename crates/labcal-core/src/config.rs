use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::Context;
use chrono_tz::Tz;
use serde::{
  Deserialize,
  Serialize
};
use tracing::{
  debug,
  info,
  warn
};

use crate::bind::DEFAULT_INLINE_LIMIT;
use crate::datetime::{
  parse_timezone,
  parse_week_start
};
use crate::error::{
  CalendarError,
  CalendarResult
};
use crate::grid::GridOptions;
use crate::layout::{
  LayoutMetrics,
  OverlapPolicy
};

pub const CONFIG_ENV_VAR: &str =
  "LABCAL_CONFIG";
const CONFIG_DIR_NAME: &str = "labcal";
const CONFIG_FILE_NAME: &str =
  "calendar.toml";

fn default_version() -> u32 {
  1
}

fn default_week_start() -> String {
  "sunday".to_string()
}

fn default_overlap() -> String {
  OverlapPolicy::Overlay
    .as_key()
    .to_string()
}

fn default_hour_end() -> u32 {
  23
}

#[derive(
  Debug, Clone, PartialEq, Deserialize, Serialize,
)]
pub struct CalendarConfig {
  #[serde(default = "default_version")]
  pub version:     u32,
  #[serde(default)]
  pub timezone:    Option<String>,
  #[serde(
    default = "default_week_start"
  )]
  pub week_start:  String,
  #[serde(default = "default_overlap")]
  pub overlap:     String,
  #[serde(default)]
  pub month:       MonthSettings,
  #[serde(default)]
  pub week:        TimeGridSettings,
  #[serde(default)]
  pub day:         TimeGridSettings,
  #[serde(default)]
  pub hours:       HourRange
}

#[derive(
  Debug, Clone, PartialEq, Deserialize, Serialize,
)]
pub struct MonthSettings {
  #[serde(default)]
  pub inline_limit: usize
}

/// Zero or negative values are
/// replaced by the view's preset.
#[derive(
  Debug,
  Clone,
  Default,
  PartialEq,
  Deserialize,
  Serialize,
)]
pub struct TimeGridSettings {
  #[serde(default)]
  pub hour_height: f32,
  #[serde(default)]
  pub min_height:  f32
}

#[derive(
  Debug, Clone, PartialEq, Deserialize, Serialize,
)]
pub struct HourRange {
  #[serde(default)]
  pub start: u32,
  #[serde(default = "default_hour_end")]
  pub end:   u32
}

impl Default for CalendarConfig {
  fn default() -> Self {
    let mut config = Self {
      version:     default_version(),
      timezone:    None,
      week_start:  default_week_start(),
      overlap:     default_overlap(),
      month:       MonthSettings::default(),
      week:        TimeGridSettings::default(),
      day:         TimeGridSettings::default(),
      hours:       HourRange::default()
    };
    config.sanitize();
    config
  }
}

impl Default for MonthSettings {
  fn default() -> Self {
    Self {
      inline_limit: DEFAULT_INLINE_LIMIT
    }
  }
}

impl Default for HourRange {
  fn default() -> Self {
    Self {
      start: 0,
      end:   default_hour_end()
    }
  }
}

impl CalendarConfig {
  /// Loads `calendar.toml` from the
  /// override path, `LABCAL_CONFIG`,
  /// or the user config dir, falling
  /// back to defaults.
  #[tracing::instrument(skip(
    override_path
  ))]
  pub fn load(
    override_path: Option<&Path>
  ) -> anyhow::Result<Self> {
    let Some(path) =
      resolve_config_path(override_path)
    else {
      warn!(
        "no calendar.toml found; using \
         defaults"
      );
      return Ok(Self::default());
    };

    info!(config = %path.display(), "loading calendar config");
    Self::load_file(&path)
  }

  pub fn load_file(
    path: &Path
  ) -> anyhow::Result<Self> {
    let text =
      fs::read_to_string(path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;
    Self::from_toml(&text)
      .with_context(|| {
        format!(
          "failed to parse {}",
          path.display()
        )
      })
  }

  pub fn from_toml(
    text: &str
  ) -> anyhow::Result<Self> {
    let mut config =
      toml::from_str::<Self>(text)?;
    config.sanitize();
    debug!(
      version = config.version,
      timezone = ?config.timezone,
      week_start = %config.week_start,
      overlap = %config.overlap,
      "parsed calendar config"
    );
    Ok(config)
  }

  /// Repairs out-of-range values in
  /// place instead of failing.
  pub fn sanitize(&mut self) {
    if parse_week_start(&self.week_start)
      .is_none()
    {
      if !self.week_start.trim().is_empty()
      {
        warn!(
          week_start = %self.week_start,
          "unknown week_start; using sunday"
        );
      }
      self.week_start =
        default_week_start();
    }

    if self
      .overlap
      .parse::<OverlapPolicy>()
      .is_err()
    {
      warn!(
        overlap = %self.overlap,
        "unknown overlap policy; using \
         overlay"
      );
      self.overlap = default_overlap();
    }

    if self.month.inline_limit == 0 {
      self.month.inline_limit =
        DEFAULT_INLINE_LIMIT;
    }

    sanitize_grid(
      &mut self.week,
      LayoutMetrics::WEEK
    );
    sanitize_grid(
      &mut self.day,
      LayoutMetrics::DAY
    );

    if self.hours.start > 23 {
      self.hours.start = 23;
    }
    if self.hours.end > 23 {
      self.hours.end = 23;
    }
    if self.hours.end < self.hours.start
    {
      self.hours.end = self.hours.start;
    }
  }

  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) -> CalendarResult<()>
  where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (key, value) in overrides {
      debug!(key = %key, value = %value, "applying override");
      self.set(key.trim(), value.trim())?;
    }
    self.sanitize();
    Ok(())
  }

  fn set(
    &mut self,
    key: &str,
    value: &str
  ) -> CalendarResult<()> {
    match key {
      | "timezone" => {
        self.timezone =
          (!value.is_empty())
            .then(|| value.to_string());
      }
      | "week_start" => {
        parse_week_start(value)
          .ok_or_else(|| {
            invalid(
              key,
              "expected sunday or monday"
            )
          })?;
        self.week_start =
          value.to_string();
      }
      | "overlap" => {
        value
          .parse::<OverlapPolicy>()?;
        self.overlap = value.to_string();
      }
      | "month.inline_limit" => {
        self.month.inline_limit =
          parse_number(key, value)?;
      }
      | "week.hour_height" => {
        self.week.hour_height =
          parse_number(key, value)?;
      }
      | "week.min_height" => {
        self.week.min_height =
          parse_number(key, value)?;
      }
      | "day.hour_height" => {
        self.day.hour_height =
          parse_number(key, value)?;
      }
      | "day.min_height" => {
        self.day.min_height =
          parse_number(key, value)?;
      }
      | "hours.start" => {
        self.hours.start =
          parse_number(key, value)?;
      }
      | "hours.end" => {
        self.hours.end =
          parse_number(key, value)?;
      }
      | other => {
        return Err(invalid(
          other,
          "unknown config key"
        ));
      }
    }
    Ok(())
  }

  pub fn timezone(&self) -> Option<Tz> {
    let raw = self.timezone.as_ref()?;
    parse_timezone(raw, "calendar.toml")
  }

  pub fn grid_options(
    &self
  ) -> CalendarResult<GridOptions> {
    let week_start =
      parse_week_start(&self.week_start)
        .ok_or_else(|| {
          invalid(
            "week_start",
            "expected sunday or monday"
          )
        })?;

    Ok(GridOptions {
      week_start,
      inline_limit: self
        .month
        .inline_limit,
      week_metrics: metrics(&self.week),
      day_metrics: metrics(&self.day),
      overlap: self.overlap.parse()?,
      hours: (
        self.hours.start,
        self.hours.end
      )
    })
  }
}

fn sanitize_grid(
  settings: &mut TimeGridSettings,
  preset: LayoutMetrics
) {
  if !(settings.hour_height.is_finite()
    && settings.hour_height > 0.0)
  {
    settings.hour_height =
      preset.hour_height;
  }
  if !(settings.min_height.is_finite()
    && settings.min_height > 0.0)
  {
    settings.min_height =
      preset.min_height;
  }
}

fn metrics(
  settings: &TimeGridSettings
) -> LayoutMetrics {
  LayoutMetrics {
    hour_height: settings.hour_height,
    min_height:  settings.min_height
  }
}

fn parse_number<T: std::str::FromStr>(
  key: &str,
  value: &str
) -> CalendarResult<T> {
  value.parse::<T>().map_err(|_| {
    invalid(key, "expected a number")
  })
}

fn invalid(
  key: &str,
  reason: &str
) -> CalendarError {
  CalendarError::InvalidConfig {
    key:    key.to_string(),
    reason: reason.to_string()
  }
}

#[tracing::instrument(skip(
  override_path
))]
fn resolve_config_path(
  override_path: Option<&Path>
) -> Option<PathBuf> {
  if let Some(path) = override_path {
    return Some(path.to_path_buf());
  }

  if let Ok(raw) =
    std::env::var(CONFIG_ENV_VAR)
  {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
      return Some(PathBuf::from(
        trimmed
      ));
    }
  }

  let candidate = dirs::config_dir()?
    .join(CONFIG_DIR_NAME)
    .join(CONFIG_FILE_NAME);
  if candidate.exists() {
    return Some(candidate);
  }

  None
}

#[cfg(test)]
mod tests {
  use chrono::Weekday;

  use super::*;

  #[test]
  fn defaults_match_layout_presets() {
    let config =
      CalendarConfig::default();
    let options = config
      .grid_options()
      .expect("default options");
    assert_eq!(
      options,
      GridOptions::default()
    );
  }

  #[test]
  fn partial_file_keeps_defaults() {
    let config =
      CalendarConfig::from_toml(
        r#"
timezone = "America/Chicago"
week_start = "monday"
overlap = "columns"

[week]
hour_height = 60.0

[hours]
start = 7
"#
      )
      .expect("parse config");

    let options = config
      .grid_options()
      .expect("options");
    assert_eq!(
      options.week_start,
      Weekday::Mon
    );
    assert_eq!(
      options.overlap,
      OverlapPolicy::Columns
    );
    assert_eq!(
      options.week_metrics,
      LayoutMetrics {
        hour_height: 60.0,
        min_height:  20.0
      }
    );
    assert_eq!(
      options.day_metrics,
      LayoutMetrics::DAY
    );
    assert_eq!(options.hours, (7, 23));
    assert_eq!(
      config.timezone(),
      Some(chrono_tz::America::Chicago)
    );
  }

  #[test]
  fn sanitize_repairs_bad_values() {
    let config =
      CalendarConfig::from_toml(
        r#"
week_start = "friday"
overlap = "tetris"

[month]
inline_limit = 0

[day]
hour_height = -5.0
min_height = 0.0

[hours]
start = 30
end = 4
"#
      )
      .expect("parse config");

    assert_eq!(config.week_start, "sunday");
    assert_eq!(config.overlap, "overlay");
    assert_eq!(
      config.month.inline_limit,
      DEFAULT_INLINE_LIMIT
    );
    assert_eq!(config.day.hour_height, 64.0);
    assert_eq!(config.day.min_height, 24.0);
    assert_eq!(
      (config.hours.start, config.hours.end),
      (23, 23)
    );
  }

  #[test]
  fn overrides_apply_and_validate() {
    let mut config =
      CalendarConfig::default();
    config
      .apply_overrides(vec![
        (
          "month.inline_limit".to_string(),
          "3".to_string()
        ),
        (
          "day.hour_height".to_string(),
          "80".to_string()
        ),
      ])
      .expect("valid overrides");
    assert_eq!(config.month.inline_limit, 3);
    assert_eq!(config.day.hour_height, 80.0);

    let unknown = config.apply_overrides(
      vec![(
        "colour".to_string(),
        "red".to_string()
      )]
    );
    assert!(matches!(
      unknown,
      Err(CalendarError::InvalidConfig { .. })
    ));

    let bad_number = config
      .apply_overrides(vec![(
        "hours.end".to_string(),
        "late".to_string()
      )]);
    assert!(bad_number.is_err());
  }
}
