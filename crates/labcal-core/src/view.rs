use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;

use crate::datetime::{add_days, shift_months, start_of_week};
use crate::error::CalendarError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    Month,
    Week,
    Day,
}

impl ViewMode {
    pub fn all() -> [Self; 3] {
        [Self::Month, Self::Week, Self::Day]
    }

    pub fn as_key(self) -> &'static str {
        match self {
            Self::Month => "month",
            Self::Week => "week",
            Self::Day => "day",
        }
    }
}

impl FromStr for ViewMode {
    type Err = CalendarError;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        match key.trim().to_ascii_lowercase().as_str() {
            "month" => Ok(Self::Month),
            "week" => Ok(Self::Week),
            "day" => Ok(Self::Day),
            _ => Err(CalendarError::InvalidViewMode(key.to_string())),
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_key())
    }
}

/// The caller-held anchor of the visible grid.
///
/// Every operation returns a new value; the engine keeps no state of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub selected_date: NaiveDate,
    pub mode: ViewMode,
}

impl ViewState {
    pub fn new(selected_date: NaiveDate, mode: ViewMode) -> Self {
        Self {
            selected_date,
            mode,
        }
    }

    /// Steps `step` periods of the current mode (negative goes back).
    #[must_use]
    pub fn navigate(self, step: i32) -> Self {
        let selected_date = match self.mode {
            ViewMode::Month => shift_months(self.selected_date, step),
            ViewMode::Week => add_days(self.selected_date, i64::from(step) * 7),
            ViewMode::Day => add_days(self.selected_date, i64::from(step)),
        };
        Self {
            selected_date,
            ..self
        }
    }

    #[must_use]
    pub fn select_date(self, date: NaiveDate) -> Self {
        Self {
            selected_date: date,
            ..self
        }
    }

    /// Selects `date` and zooms into its day.
    #[must_use]
    pub fn drill_down(self, date: NaiveDate) -> Self {
        Self::new(date, ViewMode::Day)
    }

    #[must_use]
    pub fn with_mode(self, mode: ViewMode) -> Self {
        Self { mode, ..self }
    }

    /// Back to `today`, keeping the mode.
    #[must_use]
    pub fn jump_to(self, today: NaiveDate) -> Self {
        self.select_date(today)
    }

    pub fn title(&self, week_start: Weekday) -> String {
        let date = self.selected_date;
        match self.mode {
            ViewMode::Month => date.format("%B %Y").to_string(),
            ViewMode::Week => {
                let start = start_of_week(date, week_start);
                let end = add_days(start, 6);
                if start.year() == end.year() {
                    format!(
                        "{} - {}, {}",
                        start.format("%b %-d"),
                        end.format("%b %-d"),
                        end.year()
                    )
                } else {
                    format!("{} - {}", start.format("%b %-d, %Y"), end.format("%b %-d, %Y"))
                }
            }
            ViewMode::Day => date.format("%A, %B %-d, %Y").to_string(),
        }
    }
}
