//! Meeting records and their boundary validation.
//!
//! `EventRecord` is the loose shape events arrive in (every field optional,
//! camelCase keys). `Event` is the closed type the engine works with;
//! converting one into the other is the only place input is rejected.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::clock::ClockTime;
use crate::error::{CalendarError, CalendarResult};

/// How malformed `HH:MM` strings are treated when building an [`Event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeParsing {
    /// Unparsable components become 0.
    #[default]
    Lenient,
    /// Unparsable times reject the record.
    Strict,
}

/// A single-day meeting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub title: String,
    pub date: NaiveDate,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    pub description: String,
    pub attendees: String,
    pub location: String,
    pub reminder_set: bool,
}

impl Event {
    /// Builds an event with empty display fields. Times are parsed leniently.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        date: NaiveDate,
        start_time: &str,
        end_time: &str,
    ) -> CalendarResult<Self> {
        EventRecord {
            id: Some(id.into()),
            title: Some(title.into()),
            date: Some(date.format("%Y-%m-%d").to_string()),
            start_time: Some(start_time.to_string()),
            end_time: Some(end_time.to_string()),
            ..EventRecord::default()
        }
        .into_event(TimeParsing::Lenient)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_attendees(mut self, attendees: impl Into<String>) -> Self {
        self.attendees = attendees.into();
        self
    }

    pub fn with_reminder(mut self, reminder_set: bool) -> Self {
        self.reminder_set = reminder_set;
        self
    }

    /// Minutes between start and end; zero or negative for degenerate events.
    pub fn duration_minutes(&self) -> i32 {
        self.end_time.minutes_since_midnight() - self.start_time.minutes_since_midnight()
    }
}

/// Wire shape of an event as stored by the dashboard backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub attendees: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub reminder_set: Option<bool>,
}

impl EventRecord {
    pub fn into_event(self, parsing: TimeParsing) -> CalendarResult<Event> {
        let id = self
            .id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or(CalendarError::MissingField("id"))?;
        let title = self.title.ok_or(CalendarError::MissingField("title"))?;

        let raw_date = self.date.ok_or(CalendarError::MissingField("date"))?;
        let date = parse_event_date(&raw_date)?;

        let raw_start = self
            .start_time
            .ok_or(CalendarError::MissingField("startTime"))?;
        let raw_end = self
            .end_time
            .ok_or(CalendarError::MissingField("endTime"))?;
        let start_time = parse_event_time(&id, "startTime", &raw_start, parsing)?;
        let end_time = parse_event_time(&id, "endTime", &raw_end, parsing)?;

        if end_time < start_time {
            tracing::debug!(
                id = %id,
                start = %start_time,
                end = %end_time,
                "event ends before it starts"
            );
        }

        Ok(Event {
            id,
            title,
            date,
            start_time,
            end_time,
            description: self.description.unwrap_or_default(),
            attendees: self.attendees.unwrap_or_default(),
            location: self.location.unwrap_or_default(),
            reminder_set: self.reminder_set.unwrap_or(false),
        })
    }
}

impl TryFrom<EventRecord> for Event {
    type Error = CalendarError;

    fn try_from(record: EventRecord) -> Result<Self, Self::Error> {
        record.into_event(TimeParsing::Lenient)
    }
}

fn parse_event_date(raw: &str) -> CalendarResult<NaiveDate> {
    let trimmed = raw.trim();
    // Backends sometimes send a full ISO timestamp; only the date part counts.
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|_| CalendarError::InvalidDate {
        field: "date",
        value: raw.to_string(),
    })
}

fn parse_event_time(
    id: &str,
    field: &'static str,
    raw: &str,
    parsing: TimeParsing,
) -> CalendarResult<ClockTime> {
    match raw.parse::<ClockTime>() {
        Ok(time) => Ok(time),
        Err(_) if parsing == TimeParsing::Lenient => {
            let time = ClockTime::parse_lenient(raw);
            tracing::warn!(
                id,
                field,
                input = raw,
                fallback = %time,
                "unparsable event time; treating bad components as 0"
            );
            Ok(time)
        }
        Err(_) => Err(CalendarError::InvalidTime {
            field,
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> EventRecord {
        serde_json::from_value(serde_json::json!({
            "id": "m-1",
            "title": "Crown review",
            "date": "2025-01-15",
            "startTime": "09:00",
            "endTime": "09:30",
            "attendees": "Dr. Patel",
            "reminderSet": true
        }))
        .expect("record json")
    }

    #[test]
    fn converts_valid_record() {
        let event = Event::try_from(record()).expect("valid record");
        assert_eq!(event.id, "m-1");
        assert_eq!(event.date, NaiveDate::from_ymd_opt(2025, 1, 15).expect("date"));
        assert_eq!(event.start_time.to_string(), "09:00");
        assert_eq!(event.duration_minutes(), 30);
        assert_eq!(event.attendees, "Dr. Patel");
        assert!(event.location.is_empty());
        assert!(event.reminder_set);
    }

    #[test]
    fn builders_match_the_wire_record() {
        let built = Event::new(
            "m-1",
            "Crown review",
            NaiveDate::from_ymd_opt(2025, 1, 15).expect("date"),
            "09:00",
            "09:30",
        )
        .expect("event")
        .with_attendees("Dr. Patel")
        .with_reminder(true);
        assert_eq!(Event::try_from(record()), Ok(built.clone()));

        let noted = built.with_description("bring shade guide");
        assert_eq!(noted.description, "bring shade guide");
    }

    #[test]
    fn rejects_missing_required_fields() {
        let mut missing_id = record();
        missing_id.id = Some("   ".to_string());
        assert_eq!(
            Event::try_from(missing_id),
            Err(CalendarError::MissingField("id"))
        );

        let mut missing_start = record();
        missing_start.start_time = None;
        assert_eq!(
            Event::try_from(missing_start),
            Err(CalendarError::MissingField("startTime"))
        );

        let mut bad_date = record();
        bad_date.date = Some("15/01/2025".to_string());
        assert!(matches!(
            Event::try_from(bad_date),
            Err(CalendarError::InvalidDate { .. })
        ));
    }

    #[test]
    fn accepts_iso_timestamp_dates() {
        let mut stamped = record();
        stamped.date = Some("2025-01-15T00:00:00.000Z".to_string());
        let event = Event::try_from(stamped).expect("timestamp date");
        assert_eq!(event.date, NaiveDate::from_ymd_opt(2025, 1, 15).expect("date"));
    }

    #[test]
    fn time_parsing_policy_controls_malformed_times() {
        let mut sloppy = record();
        sloppy.start_time = Some("9h".to_string());

        let lenient = sloppy
            .clone()
            .into_event(TimeParsing::Lenient)
            .expect("lenient accepts");
        assert_eq!(lenient.start_time, ClockTime::MIDNIGHT);

        assert_eq!(
            sloppy.into_event(TimeParsing::Strict),
            Err(CalendarError::InvalidTime {
                field: "startTime",
                value: "9h".to_string()
            })
        );
    }

    #[test]
    fn inverted_times_are_kept() {
        let event = Event::new(
            "m-2",
            "Backwards",
            NaiveDate::from_ymd_opt(2025, 1, 15).expect("date"),
            "11:00",
            "10:00",
        )
        .expect("inverted times are not rejected");
        assert_eq!(event.duration_minutes(), -60);
    }
}
