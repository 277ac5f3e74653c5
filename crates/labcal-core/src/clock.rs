use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Serialize, Serializer};

use crate::error::CalendarError;

/// Wall-clock time of day, 24-hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ClockTime {
    hour: u32,
    minute: u32,
}

impl ClockTime {
    pub const MIDNIGHT: ClockTime = ClockTime { hour: 0, minute: 0 };

    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        (hour <= 23 && minute <= 59).then_some(Self { hour, minute })
    }

    pub fn hour(self) -> u32 {
        self.hour
    }

    pub fn minute(self) -> u32 {
        self.minute
    }

    pub fn minutes_since_midnight(self) -> i32 {
        (self.hour * 60 + self.minute) as i32
    }

    /// Parses `raw` without ever failing.
    ///
    /// The strict form is tried first. Otherwise the input is split on `:`
    /// and every missing, non-numeric or out-of-range component becomes 0,
    /// so `"9:5"` is 09:05, `"10"` is 10:00 and `"noon"` is 00:00.
    /// Anything after the minute (`"09:30:00"`) is ignored.
    pub fn parse_lenient(raw: &str) -> Self {
        if let Ok(parsed) = raw.parse::<ClockTime>() {
            return parsed;
        }

        let mut parts = raw.split(':');
        let hour = parts.next().unwrap_or_default();
        let minute = parts.next().unwrap_or_default();
        Self {
            hour: lenient_component(hour, 23),
            minute: lenient_component(minute, 59),
        }
    }

    /// `hh:mm AM/PM` display form.
    pub fn to_12h(self) -> String {
        let suffix = if self.hour < 12 { "AM" } else { "PM" };
        let hour = match self.hour % 12 {
            0 => 12,
            other => other,
        };
        format!("{hour:02}:{:02} {suffix}", self.minute)
    }
}

fn lenient_component(raw: &str, max: u32) -> u32 {
    raw.trim()
        .parse::<u32>()
        .ok()
        .filter(|value| *value <= max)
        .unwrap_or(0)
}

fn clock_regex() -> Option<&'static Regex> {
    static CLOCK_RE: OnceLock<Option<Regex>> = OnceLock::new();
    CLOCK_RE
        .get_or_init(|| {
            Regex::new(r"(?i)^(?P<hour>\d{1,2}):(?P<minute>\d{2})\s*(?P<ampm>[ap]m)?$").ok()
        })
        .as_ref()
}

impl FromStr for ClockTime {
    type Err = CalendarError;

    /// Accepts `H:MM`, `HH:MM` and `h:mm am/pm`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || CalendarError::InvalidTime {
            field: "time",
            value: raw.to_string(),
        };

        let captures = clock_regex()
            .and_then(|re| re.captures(raw.trim()))
            .ok_or_else(invalid)?;
        let raw_hour = captures["hour"].parse::<u32>().map_err(|_| invalid())?;
        let minute = captures["minute"].parse::<u32>().map_err(|_| invalid())?;

        let hour = match captures.name("ampm") {
            Some(ampm) => {
                if raw_hour == 0 || raw_hour > 12 {
                    return Err(invalid());
                }
                let pm = ampm.as_str().eq_ignore_ascii_case("pm");
                match (raw_hour, pm) {
                    (12, false) => 0,
                    (12, true) => 12,
                    (hour, false) => hour,
                    (hour, true) => hour + 12,
                }
            }
            None => raw_hour,
        };

        ClockTime::new(hour, minute).ok_or_else(invalid)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl Serialize for ClockTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// Hour-row label: `0 -> "12 AM"`, `12 -> "12 PM"`, `13 -> "1 PM"`.
pub fn format_hour_label(hour: u32) -> String {
    match hour {
        0 => "12 AM".to_string(),
        12 => "12 PM".to_string(),
        h => {
            let suffix = if h < 12 { "AM" } else { "PM" };
            format!("{} {suffix}", h % 12)
        }
    }
}
