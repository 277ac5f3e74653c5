//! Vertical geometry of events inside the hour grid.
//!
//! Positions are in pixels relative to the top of the hour row an event is
//! bound to. An event longer than an hour simply extends below its row.

use std::str::FromStr;

use serde::Serialize;

use crate::clock::ClockTime;
use crate::error::CalendarError;
use crate::event::Event;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutMetrics {
    pub hour_height: f32,
    /// Floor applied to every block so short or malformed events stay
    /// visible and clickable.
    pub min_height: f32,
}

impl LayoutMetrics {
    pub const WEEK: LayoutMetrics = LayoutMetrics {
        hour_height: 48.0,
        min_height: 20.0,
    };

    pub const DAY: LayoutMetrics = LayoutMetrics {
        hour_height: 64.0,
        min_height: 24.0,
    };

    /// Minutes of grid covered by `min_height`.
    fn min_span_minutes(self) -> i32 {
        if self.hour_height <= 0.0 {
            return 0;
        }
        (self.min_height / self.hour_height * 60.0).ceil() as i32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SlotGeometry {
    pub top: f32,
    pub height: f32,
}

/// Places an event inside its start-hour row.
///
/// `top` is the start minute's share of the hour; `height` is the duration's
/// share of `hour_height`, never below `min_height`.
pub fn layout_slot(start: ClockTime, end: ClockTime, metrics: LayoutMetrics) -> SlotGeometry {
    let duration = end.minutes_since_midnight() - start.minutes_since_midnight();
    let top = start.minute() as f32 / 60.0 * metrics.hour_height;
    let height = if duration <= 0 {
        metrics.min_height
    } else {
        (duration as f32 / 60.0 * metrics.hour_height).max(metrics.min_height)
    };
    SlotGeometry { top, height }
}

/// What happens when blocks in the same day column overlap in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlapPolicy {
    /// Every block spans the full column; overlapping blocks stack on top of
    /// each other.
    #[default]
    Overlay,
    /// Overlapping blocks share the column side by side.
    Columns,
}

impl OverlapPolicy {
    pub fn as_key(self) -> &'static str {
        match self {
            Self::Overlay => "overlay",
            Self::Columns => "columns",
        }
    }
}

impl FromStr for OverlapPolicy {
    type Err = CalendarError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "overlay" | "stack" => Ok(Self::Overlay),
            "columns" | "side-by-side" => Ok(Self::Columns),
            other => Err(CalendarError::InvalidConfig {
                key: "overlap".to_string(),
                reason: format!("expected overlay or columns, got '{other}'"),
            }),
        }
    }
}

/// Horizontal slot of a block: lane `index` out of `count` equal lanes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Lane {
    pub index: usize,
    pub count: usize,
}

impl Lane {
    pub const FULL: Lane = Lane { index: 0, count: 1 };
}

/// Lanes for the events of one day column, in input order.
pub fn assign_lanes(events: &[&Event], metrics: LayoutMetrics, policy: OverlapPolicy) -> Vec<Lane> {
    let mut lanes = vec![Lane::FULL; events.len()];
    if policy == OverlapPolicy::Overlay || events.len() < 2 {
        return lanes;
    }

    let min_span = metrics.min_span_minutes().max(1);
    let spans: Vec<(i32, i32)> = events
        .iter()
        .map(|event| {
            let start = event.start_time.minutes_since_midnight();
            (start, start + event.duration_minutes().max(min_span))
        })
        .collect();

    let mut order: Vec<usize> = (0..events.len()).collect();
    order.sort_by_key(|&idx| spans[idx]);

    let mut cluster: Vec<usize> = Vec::new();
    let mut lane_ends: Vec<i32> = Vec::new();
    let mut cluster_end = i32::MIN;

    for idx in order {
        let (start, end) = spans[idx];
        if !cluster.is_empty() && start >= cluster_end {
            close_cluster(&mut lanes, &cluster, lane_ends.len());
            cluster.clear();
            lane_ends.clear();
        }

        let lane = match lane_ends.iter().position(|&lane_end| lane_end <= start) {
            Some(free) => {
                lane_ends[free] = end;
                free
            }
            None => {
                lane_ends.push(end);
                lane_ends.len() - 1
            }
        };
        lanes[idx].index = lane;
        cluster.push(idx);
        cluster_end = if cluster.len() == 1 { end } else { cluster_end.max(end) };
    }
    close_cluster(&mut lanes, &cluster, lane_ends.len());

    lanes
}

fn close_cluster(lanes: &mut [Lane], cluster: &[usize], count: usize) {
    for &idx in cluster {
        lanes[idx].count = count.max(1);
    }
}
