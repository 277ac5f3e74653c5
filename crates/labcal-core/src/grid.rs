//! Month, week and day grids.
//!
//! Each builder is a pure function of the event slice, the selected date,
//! the real current date and [`GridOptions`]. The grids borrow the caller's
//! events and never copy or mutate them.

use std::ops::RangeInclusive;
use std::ptr;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;
use tracing::debug;

use crate::bind::{DEFAULT_INLINE_LIMIT, events_in_slot, events_on, split_overflow};
use crate::clock::format_hour_label;
use crate::datetime::{
    DEFAULT_WEEK_START, add_days, days_in_month, first_day_of_month, start_of_week,
    weekday_offset,
};
use crate::event::Event;
use crate::layout::{Lane, LayoutMetrics, OverlapPolicy, assign_lanes, layout_slot};
use crate::view::{ViewMode, ViewState};

const WEEKDAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

#[derive(Debug, Clone, PartialEq)]
pub struct GridOptions {
    pub week_start: Weekday,
    pub inline_limit: usize,
    pub week_metrics: LayoutMetrics,
    pub day_metrics: LayoutMetrics,
    pub overlap: OverlapPolicy,
    /// First and last hour row rendered (inclusive). Clamped to 0..=23 with
    /// `last >= first` when the grid is built.
    pub hours: (u32, u32),
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            week_start: DEFAULT_WEEK_START,
            inline_limit: DEFAULT_INLINE_LIMIT,
            week_metrics: LayoutMetrics::WEEK,
            day_metrics: LayoutMetrics::DAY,
            overlap: OverlapPolicy::Overlay,
            hours: (0, 23),
        }
    }
}

impl GridOptions {
    pub fn weekday_labels(&self) -> [&'static str; 7] {
        let mut labels = WEEKDAY_LABELS;
        labels.rotate_left(self.week_start.num_days_from_sunday() as usize);
        labels
    }

    pub fn visible_hours(&self) -> RangeInclusive<u32> {
        let first = self.hours.0.min(23);
        let last = self.hours.1.clamp(first, 23);
        first..=last
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthCell<'a> {
    /// `None` for the blank cells before day 1.
    pub date: Option<NaiveDate>,
    pub is_today: bool,
    pub is_selected: bool,
    pub events: Vec<&'a Event>,
    pub overflow_count: usize,
}

impl<'a> MonthCell<'a> {
    fn blank() -> Self {
        Self {
            date: None,
            is_today: false,
            is_selected: false,
            events: Vec::new(),
            overflow_count: 0,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.date.is_none()
    }

    /// The events drawn directly in the cell.
    pub fn inline_events(&self) -> &[&'a Event] {
        &self.events[..self.events.len() - self.overflow_count]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthGrid<'a> {
    pub year: i32,
    pub month: u32,
    pub days_in_month: u32,
    pub first_weekday: u32,
    pub weekday_labels: [&'static str; 7],
    pub cells: Vec<MonthCell<'a>>,
}

impl<'a> MonthGrid<'a> {
    /// Cells tiled into weeks; the last row may be short.
    pub fn rows(&self) -> impl Iterator<Item = &[MonthCell<'a>]> {
        self.cells.chunks(7)
    }

    pub fn cell_for(&self, date: NaiveDate) -> Option<&MonthCell<'a>> {
        self.cells.iter().find(|cell| cell.date == Some(date))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayHeader {
    pub date: NaiveDate,
    pub is_today: bool,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedEvent<'a> {
    pub event: &'a Event,
    pub top: f32,
    pub height: f32,
    pub lane: usize,
    pub lanes: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotColumn<'a> {
    pub date: NaiveDate,
    pub events: Vec<PositionedEvent<'a>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HourRow<'a> {
    pub hour: u32,
    pub label: String,
    pub columns: Vec<SlotColumn<'a>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeGrid<'a> {
    pub mode: ViewMode,
    pub metrics: LayoutMetrics,
    pub day_headers: Vec<DayHeader>,
    pub hour_rows: Vec<HourRow<'a>>,
}

impl<'a> TimeGrid<'a> {
    pub fn row(&self, hour: u32) -> Option<&HourRow<'a>> {
        self.hour_rows.iter().find(|row| row.hour == hour)
    }

    pub fn positioned_count(&self) -> usize {
        self.hour_rows
            .iter()
            .flat_map(|row| &row.columns)
            .map(|column| column.events.len())
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "lowercase")]
pub enum CalendarView<'a> {
    Month(MonthGrid<'a>),
    Week(TimeGrid<'a>),
    Day(TimeGrid<'a>),
}

/// Builds the grid for `state.mode`.
pub fn render_view<'a>(
    events: &'a [Event],
    state: &ViewState,
    today: NaiveDate,
    options: &GridOptions,
) -> CalendarView<'a> {
    match state.mode {
        ViewMode::Month => {
            CalendarView::Month(build_month_grid(events, state.selected_date, today, options))
        }
        ViewMode::Week => {
            CalendarView::Week(build_week_grid(events, state.selected_date, today, options))
        }
        ViewMode::Day => {
            CalendarView::Day(build_day_grid(events, state.selected_date, today, options))
        }
    }
}

#[tracing::instrument(skip(events, options), fields(events = events.len()))]
pub fn build_month_grid<'a>(
    events: &'a [Event],
    selected: NaiveDate,
    today: NaiveDate,
    options: &GridOptions,
) -> MonthGrid<'a> {
    let (year, month) = (selected.year(), selected.month());
    let first = first_day_of_month(year, month);
    let days = days_in_month(year, month);
    let first_weekday = weekday_offset(first.weekday(), options.week_start);

    let mut cells = Vec::with_capacity((first_weekday + days) as usize);
    cells.extend((0..first_weekday).map(|_| MonthCell::blank()));

    for day in 1..=days {
        let date = add_days(first, i64::from(day - 1));
        let bound = events_on(events, date);
        let (_, overflow_count) = split_overflow(&bound, options.inline_limit);
        cells.push(MonthCell {
            date: Some(date),
            is_today: date == today,
            is_selected: date == selected,
            events: bound,
            overflow_count,
        });
    }

    debug!(
        year,
        month,
        first_weekday,
        days,
        cells = cells.len(),
        "built month grid"
    );

    MonthGrid {
        year,
        month,
        days_in_month: days,
        first_weekday,
        weekday_labels: options.weekday_labels(),
        cells,
    }
}

#[tracing::instrument(skip(events, options), fields(events = events.len()))]
pub fn build_week_grid<'a>(
    events: &'a [Event],
    selected: NaiveDate,
    today: NaiveDate,
    options: &GridOptions,
) -> TimeGrid<'a> {
    let start = start_of_week(selected, options.week_start);
    let days: Vec<NaiveDate> = (0..7).map(|offset| add_days(start, offset)).collect();
    let headers = days
        .iter()
        .map(|&date| DayHeader {
            date,
            is_today: date == today,
            label: date.format("%a %-d").to_string(),
        })
        .collect();

    build_time_grid(events, ViewMode::Week, &days, headers, options.week_metrics, options)
}

#[tracing::instrument(skip(events, options), fields(events = events.len()))]
pub fn build_day_grid<'a>(
    events: &'a [Event],
    selected: NaiveDate,
    today: NaiveDate,
    options: &GridOptions,
) -> TimeGrid<'a> {
    let headers = vec![DayHeader {
        date: selected,
        is_today: selected == today,
        label: selected.format("%A, %B %-d").to_string(),
    }];

    build_time_grid(events, ViewMode::Day, &[selected], headers, options.day_metrics, options)
}

fn build_time_grid<'a>(
    events: &'a [Event],
    mode: ViewMode,
    days: &[NaiveDate],
    day_headers: Vec<DayHeader>,
    metrics: LayoutMetrics,
    options: &GridOptions,
) -> TimeGrid<'a> {
    let day_lanes: Vec<(Vec<&'a Event>, Vec<Lane>)> = days
        .iter()
        .map(|&date| {
            let day_events = events_on(events, date);
            let lanes = assign_lanes(&day_events, metrics, options.overlap);
            (day_events, lanes)
        })
        .collect();

    let hours = options.visible_hours();
    let (first_hour, last_hour) = (*hours.start(), *hours.end());
    let hour_rows: Vec<HourRow<'a>> = hours
        .map(|hour| HourRow {
            hour,
            label: format_hour_label(hour),
            columns: days
                .iter()
                .zip(&day_lanes)
                .map(|(&date, (day_events, lanes))| SlotColumn {
                    date,
                    events: events_in_slot(events, date, hour)
                        .into_iter()
                        .map(|event| position(event, day_events, lanes, metrics))
                        .collect(),
                })
                .collect(),
        })
        .collect();

    let grid = TimeGrid {
        mode,
        metrics,
        day_headers,
        hour_rows,
    };

    let in_range: usize = day_lanes.iter().map(|(day_events, _)| day_events.len()).sum();
    let positioned = grid.positioned_count();
    if positioned < in_range {
        debug!(
            hidden = in_range - positioned,
            first_hour, last_hour, "events start outside the visible hours"
        );
    }
    debug!(%mode, columns = days.len(), positioned, "built time grid");

    grid
}

fn position<'a>(
    event: &'a Event,
    day_events: &[&'a Event],
    lanes: &[Lane],
    metrics: LayoutMetrics,
) -> PositionedEvent<'a> {
    let geometry = layout_slot(event.start_time, event.end_time, metrics);
    let lane = day_events
        .iter()
        .position(|candidate| ptr::eq(*candidate, event))
        .and_then(|idx| lanes.get(idx).copied())
        .unwrap_or(Lane::FULL);

    PositionedEvent {
        event,
        top: geometry.top,
        height: geometry.height,
        lane: lane.index,
        lanes: lane.count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn event(id: &str, date: NaiveDate, start: &str, end: &str) -> Event {
        Event::new(id, id, date, start, end).expect("valid event")
    }

    #[test]
    fn month_grid_has_leading_blanks_and_no_trailing_padding() {
        let options = GridOptions::default();
        // February 2025 starts on a Saturday.
        let grid = build_month_grid(&[], ymd(2025, 2, 10), ymd(2025, 2, 1), &options);

        assert_eq!(grid.first_weekday, 6);
        assert_eq!(grid.days_in_month, 28);
        assert_eq!(grid.cells.len(), 6 + 28);
        assert!(grid.cells[..6].iter().all(MonthCell::is_blank));
        assert_eq!(grid.cells.last().and_then(|cell| cell.date), Some(ymd(2025, 2, 28)));
        assert_eq!(grid.weekday_labels[0], "Sun");
    }

    #[test]
    fn month_grid_counts_hold_across_months() {
        let options = GridOptions::default();
        for year in [2023, 2024, 2025] {
            for month in 1..=12 {
                let anchor = ymd(year, month, 1);
                let grid = build_month_grid(&[], anchor, anchor, &options);
                let expected = anchor.weekday().num_days_from_sunday() + days_in_month(year, month);
                assert_eq!(grid.cells.len() as u32, expected, "{year}-{month}");

                let real: Vec<_> = grid.cells.iter().filter_map(|cell| cell.date).collect();
                assert_eq!(real.len() as u32, days_in_month(year, month));
                assert_eq!(real.last().map(|date| date.day()), Some(days_in_month(year, month)));
            }
        }
    }

    #[test]
    fn month_grid_flags_today_and_selection() {
        let options = GridOptions::default();
        let grid = build_month_grid(&[], ymd(2025, 1, 15), ymd(2025, 1, 3), &options);

        let flagged_today: Vec<_> = grid.cells.iter().filter(|cell| cell.is_today).collect();
        assert_eq!(flagged_today.len(), 1);
        assert_eq!(flagged_today[0].date, Some(ymd(2025, 1, 3)));

        let selected = grid.cell_for(ymd(2025, 1, 15)).expect("selected cell");
        assert!(selected.is_selected);
        assert!(!selected.is_today);
    }

    #[test]
    fn month_grid_binds_and_caps_events() {
        let options = GridOptions::default();
        let busy = ymd(2025, 1, 3);
        let mut events: Vec<_> = (0..5)
            .map(|i| event(&format!("busy-{i}"), busy, "09:00", "10:00"))
            .collect();
        events.push(event("quiet", ymd(2025, 1, 20), "09:00", "10:00"));
        events.push(event("next-month", ymd(2025, 2, 3), "09:00", "10:00"));

        let grid = build_month_grid(&events, busy, busy, &options);
        let cell = grid.cell_for(busy).expect("cell");
        assert_eq!(cell.events.len(), 5);
        assert_eq!(cell.inline_events().len(), 2);
        assert_eq!(cell.overflow_count, 3);

        let holders: Vec<_> = grid
            .cells
            .iter()
            .filter(|cell| cell.events.iter().any(|event| event.id == "busy-0"))
            .collect();
        assert_eq!(holders.len(), 1);
        assert!(grid.cells.iter().all(|cell| cell.events.iter().all(|e| e.id != "next-month")));
    }

    #[test]
    fn monday_week_start_shifts_blanks_and_labels() {
        let options = GridOptions {
            week_start: Weekday::Mon,
            ..GridOptions::default()
        };
        // June 2025 starts on a Sunday: last column when weeks start Monday.
        let grid = build_month_grid(&[], ymd(2025, 6, 1), ymd(2025, 6, 1), &options);
        assert_eq!(grid.first_weekday, 6);
        assert_eq!(grid.weekday_labels, ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"]);
    }

    #[test]
    fn week_grid_starts_on_sunday_with_24_rows() {
        let options = GridOptions::default();
        let today = ymd(2025, 1, 14);
        let grid = build_week_grid(&[], ymd(2025, 1, 15), today, &options);

        assert_eq!(grid.day_headers.len(), 7);
        assert_eq!(grid.day_headers[0].date, ymd(2025, 1, 12));
        assert_eq!(grid.day_headers[0].label, "Sun 12");
        assert_eq!(grid.day_headers[6].date, ymd(2025, 1, 18));
        let today_headers: Vec<_> = grid.day_headers.iter().filter(|h| h.is_today).collect();
        assert_eq!(today_headers.len(), 1);
        assert_eq!(today_headers[0].date, today);

        assert_eq!(grid.hour_rows.len(), 24);
        assert!(grid.hour_rows.iter().all(|row| row.columns.len() == 7));
        assert_eq!(grid.hour_rows[0].label, "12 AM");
        assert_eq!(grid.positioned_count(), 0);
    }

    #[test]
    fn week_grid_places_event_in_its_day_column() {
        let options = GridOptions::default();
        let thursday = ymd(2025, 1, 16);
        let events = vec![event("lab", thursday, "14:30", "15:30")];
        let grid = build_week_grid(&events, ymd(2025, 1, 12), thursday, &options);

        let row = grid.row(14).expect("row 14");
        let hits: Vec<_> = row
            .columns
            .iter()
            .enumerate()
            .filter(|(_, column)| !column.events.is_empty())
            .collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, 4);
        let placed = &hits[0].1.events[0];
        assert_eq!(placed.top, 24.0);
        assert_eq!(placed.height, 48.0);
        assert_eq!(grid.positioned_count(), 1);
    }

    #[test]
    fn day_view_scenario() {
        let options = GridOptions::default();
        let day = ymd(2025, 1, 15);
        let events = vec![
            event("short", day, "09:00", "09:30"),
            event("hour", day, "11:00", "12:00"),
        ];
        let grid = build_day_grid(&events, day, day, &options);

        assert_eq!(grid.day_headers.len(), 1);
        assert_eq!(grid.day_headers[0].label, "Wednesday, January 15");
        assert_eq!(grid.hour_rows.len(), 24);
        assert!(grid.hour_rows.iter().all(|row| row.columns.len() == 1));

        let nine = &grid.row(9).expect("row 9").columns[0].events;
        assert_eq!(nine.len(), 1);
        assert_eq!((nine[0].top, nine[0].height), (0.0, 32.0));

        let eleven = &grid.row(11).expect("row 11").columns[0].events;
        assert_eq!(eleven.len(), 1);
        assert_eq!(eleven[0].height, 64.0);
        assert!(grid.row(10).expect("row 10").columns[0].events.is_empty());
    }

    #[test]
    fn columns_policy_reaches_positioned_events() {
        let options = GridOptions {
            overlap: OverlapPolicy::Columns,
            ..GridOptions::default()
        };
        let day = ymd(2025, 1, 15);
        let events = vec![
            event("a", day, "09:00", "10:30"),
            event("b", day, "10:00", "11:00"),
        ];
        let grid = build_day_grid(&events, day, day, &options);

        let a = &grid.row(9).expect("row 9").columns[0].events[0];
        let b = &grid.row(10).expect("row 10").columns[0].events[0];
        assert_eq!((a.lane, a.lanes), (0, 2));
        assert_eq!((b.lane, b.lanes), (1, 2));
    }

    #[test]
    fn visible_hours_narrow_rows() {
        let options = GridOptions {
            hours: (8, 17),
            ..GridOptions::default()
        };
        let day = ymd(2025, 1, 15);
        let events = vec![event("early", day, "06:00", "07:00")];
        let grid = build_day_grid(&events, day, day, &options);
        assert_eq!(grid.hour_rows.len(), 10);
        assert_eq!(grid.hour_rows[0].hour, 8);
        assert_eq!(grid.positioned_count(), 0);
    }

    #[test]
    fn hour_range_is_clamped_to_the_day() {
        let day = ymd(2025, 1, 15);
        let past_midnight = GridOptions {
            hours: (20, 30),
            ..GridOptions::default()
        };
        let grid = build_day_grid(&[], day, day, &past_midnight);
        assert_eq!(grid.hour_rows.len(), 4);
        assert_eq!(grid.hour_rows.last().map(|row| row.label.as_str()), Some("11 PM"));

        let inverted = GridOptions {
            hours: (40, 5),
            ..GridOptions::default()
        };
        assert_eq!(inverted.visible_hours(), 23..=23);
    }

    #[test]
    fn rendering_is_deterministic() {
        let options = GridOptions::default();
        let day = ymd(2025, 3, 4);
        let events = vec![
            event("x", day, "08:10", "09:00"),
            event("y", ymd(2025, 3, 5), "16:45", "16:45"),
        ];
        for mode in ViewMode::all() {
            let state = ViewState::new(day, mode);
            assert_eq!(
                render_view(&events, &state, day, &options),
                render_view(&events, &state, day, &options)
            );
        }
    }
}
