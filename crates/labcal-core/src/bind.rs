//! Assigns events to month cells and hour slots.
//!
//! All functions are stable filters: bound events keep the relative order of
//! the caller's list.

use chrono::NaiveDate;

use crate::event::Event;

/// Month cells show this many events before collapsing into "+N more".
pub const DEFAULT_INLINE_LIMIT: usize = 2;

/// Events whose date is exactly `date`.
pub fn events_on<'a>(events: &'a [Event], date: NaiveDate) -> Vec<&'a Event> {
    events.iter().filter(|event| event.date == date).collect()
}

/// Events on `date` that start during `hour`.
///
/// An event lands only in the row holding its start time, however long it
/// runs.
pub fn events_in_slot<'a>(events: &'a [Event], date: NaiveDate, hour: u32) -> Vec<&'a Event> {
    events
        .iter()
        .filter(|event| event.date == date && event.start_time.hour() == hour)
        .collect()
}

/// Splits a bound set into the inline part and the count hidden behind it.
pub fn split_overflow<'b, 'a>(bound: &'b [&'a Event], limit: usize) -> (&'b [&'a Event], usize) {
    let shown = bound.len().min(limit);
    (&bound[..shown], bound.len() - shown)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn event(id: &str, date: NaiveDate, start: &str) -> Event {
        Event::new(id, id, date, start, "23:00").expect("valid event")
    }

    #[test]
    fn date_binding_is_exact() {
        let events = vec![
            event("a", ymd(2025, 1, 3), "09:00"),
            event("b", ymd(2025, 1, 4), "09:00"),
            event("c", ymd(2024, 1, 3), "09:00"),
            event("d", ymd(2025, 2, 3), "09:00"),
        ];

        let bound = events_on(&events, ymd(2025, 1, 3));
        assert_eq!(bound.len(), 1);
        assert_eq!(bound[0].id, "a");
        assert!(events_on(&events, ymd(2025, 1, 5)).is_empty());
    }

    #[test]
    fn slot_binding_floors_to_start_hour() {
        let day = ymd(2025, 1, 15);
        let events = vec![
            event("on-the-hour", day, "09:00"),
            event("late", day, "09:59"),
            event("next", day, "10:00"),
            event("other-day", ymd(2025, 1, 16), "09:15"),
        ];

        let nine: Vec<_> = events_in_slot(&events, day, 9)
            .into_iter()
            .map(|event| event.id.as_str())
            .collect();
        assert_eq!(nine, vec!["on-the-hour", "late"]);

        let ten = events_in_slot(&events, day, 10);
        assert_eq!(ten.len(), 1);
        assert!(events_in_slot(&events, day, 8).is_empty());
    }

    #[test]
    fn binding_preserves_input_order() {
        let day = ymd(2025, 1, 15);
        let events = vec![
            event("z", day, "15:00"),
            event("a", day, "08:00"),
            event("m", day, "11:00"),
        ];
        let ids: Vec<_> = events_on(&events, day)
            .into_iter()
            .map(|event| event.id.as_str())
            .collect();
        assert_eq!(ids, vec!["z", "a", "m"]);
    }

    #[test]
    fn overflow_keeps_first_two() {
        let day = ymd(2025, 1, 15);
        let events: Vec<_> = (0..5).map(|i| event(&format!("e{i}"), day, "09:00")).collect();
        let bound = events_on(&events, day);

        let (inline, overflow) = split_overflow(&bound, DEFAULT_INLINE_LIMIT);
        assert_eq!(inline.len(), 2);
        assert_eq!(inline[0].id, "e0");
        assert_eq!(overflow, 3);

        let (inline, overflow) = split_overflow(&bound[..1], DEFAULT_INLINE_LIMIT);
        assert_eq!((inline.len(), overflow), (1, 0));
    }

    #[test]
    fn empty_event_list_binds_nothing() {
        let day = ymd(2025, 1, 15);
        assert!(events_on(&[], day).is_empty());
        assert!(events_in_slot(&[], day, 0).is_empty());
        assert_eq!(split_overflow(&[], 2).1, 0);
    }
}
