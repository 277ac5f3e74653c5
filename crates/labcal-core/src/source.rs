use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use tracing::{debug, info, warn};

use crate::event::{Event, EventRecord, TimeParsing};

pub const EVENTS_ENV_VAR: &str = "LABCAL_EVENTS";

#[tracing::instrument(skip(override_path))]
pub fn resolve_events_path(override_path: Option<&Path>) -> anyhow::Result<PathBuf> {
    if let Some(path) = override_path {
        return Ok(path.to_path_buf());
    }

    if let Ok(raw) = std::env::var(EVENTS_ENV_VAR) {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return Ok(PathBuf::from(trimmed));
        }
    }

    let data_dir = dirs::data_dir().ok_or_else(|| anyhow!("cannot determine data directory"))?;
    Ok(data_dir.join("labcal").join("events.json"))
}

/// Reads events from a JSON array or a JSON-lines file.
///
/// A missing file is an empty calendar, not an error.
#[tracing::instrument(skip(path), fields(file = %path.display()))]
pub fn load_events(path: &Path, parsing: TimeParsing) -> anyhow::Result<Vec<Event>> {
    if !path.exists() {
        warn!("events file does not exist; starting with an empty calendar");
        return Ok(Vec::new());
    }

    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let events = parse_events(&text, parsing)
        .with_context(|| format!("failed to load events from {}", path.display()))?;

    info!(count = events.len(), "loaded events");
    Ok(events)
}

pub fn parse_events(text: &str, parsing: TimeParsing) -> anyhow::Result<Vec<Event>> {
    let trimmed = text.trim_start();
    let records: Vec<(usize, EventRecord)> = if trimmed.starts_with('[') {
        debug!("parsing events as a json array");
        serde_json::from_str::<Vec<EventRecord>>(trimmed)
            .context("invalid events json")?
            .into_iter()
            .enumerate()
            .map(|(idx, record)| (idx + 1, record))
            .collect()
    } else {
        debug!("parsing events as json lines");
        let mut out = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let record: EventRecord = serde_json::from_str(line)
                .with_context(|| format!("failed parsing line {}", idx + 1))?;
            out.push((idx + 1, record));
        }
        out
    };

    let mut seen = HashSet::new();
    let mut events = Vec::with_capacity(records.len());
    for (position, record) in records {
        let event = record
            .into_event(parsing)
            .with_context(|| format!("invalid event #{position}"))?;
        if !seen.insert(event.id.clone()) {
            warn!(id = %event.id, position, "duplicate event id");
        }
        events.push(event);
    }

    Ok(events)
}
