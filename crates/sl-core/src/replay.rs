//! Offline replay of recorded host events.
//!
//! A replay reads an event-type catalog (YAML list of descriptors) and a
//! JSONL stream of host events, pushes every event through a
//! [`LogManager`] and tallies the outcomes.

use crate::error::{Error, Result};
use crate::manager::{Dispatch, LogManager};
use serde::Serialize;
use sl_common::{EventTypeRegistry, HostEvent};
use sl_rules::RenderOutcome;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

/// Load an event-type catalog.
pub fn load_catalog(path: &Path) -> Result<EventTypeRegistry> {
    let contents = fs::read_to_string(path)?;
    parse_catalog(&contents)
}

pub fn parse_catalog(yaml: &str) -> Result<EventTypeRegistry> {
    Ok(serde_yaml::from_str(yaml)?)
}

/// Read host events, one JSON object per line. Blank lines are skipped.
///
/// Line numbers in errors are 1-based.
pub fn read_events(reader: impl BufRead) -> Result<Vec<HostEvent>> {
    let mut events = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let event = serde_json::from_str(&line).map_err(|source| Error::EventParse {
            line: idx + 1,
            source,
        })?;
        events.push(event);
    }
    Ok(events)
}

pub fn load_events(path: &Path) -> Result<Vec<HostEvent>> {
    read_events(BufReader::new(fs::File::open(path)?))
}

/// Outcome counts of one replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReplaySummary {
    pub events: usize,
    pub rendered: usize,
    pub suppressed: usize,
    pub failed: usize,
    pub unregistered: usize,
    pub disabled: usize,
}

impl ReplaySummary {
    pub fn record(&mut self, dispatch: &Dispatch) {
        self.events += 1;
        match dispatch {
            Dispatch::Disabled => self.disabled += 1,
            Dispatch::Unregistered => self.unregistered += 1,
            Dispatch::Outcome(RenderOutcome::Rendered(_)) => self.rendered += 1,
            Dispatch::Outcome(RenderOutcome::Suppressed(_)) => self.suppressed += 1,
            Dispatch::Outcome(RenderOutcome::Failed(_)) => self.failed += 1,
        }
    }
}

/// Push every event through `manager`.
pub fn replay<'a>(
    manager: &LogManager,
    events: impl IntoIterator<Item = &'a HostEvent>,
) -> ReplaySummary {
    let mut summary = ReplaySummary::default();
    for event in events {
        let dispatch = manager.handle(event);
        debug!(event_type = %event.event_type, ?dispatch, "replayed");
        summary.record(&dispatch);
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_events_skips_blank_lines() {
        let input = "{\"event_type\":\"A\",\"attributes\":{}}\n\n{\"event_type\":\"B\",\"attributes\":{}}\n";
        let events = read_events(input.as_bytes()).unwrap();
        let types: Vec<_> = events.iter().map(|e| e.event_type.as_str()).collect();
        assert_eq!(types, vec!["A", "B"]);
    }

    #[test]
    fn test_read_events_reports_line() {
        let input = "{\"event_type\":\"A\",\"attributes\":{}}\nnot json\n";
        match read_events(input.as_bytes()) {
            Err(Error::EventParse { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_parse_catalog() {
        let registry = parse_catalog(
            "- name: PlayerJoinEvent\n  category: player\n- name: WeatherChangeEvent\n  category: weather\n",
        )
        .unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.resolve("PlayerJoinEvent").is_some());
        assert!(parse_catalog("- name: X\n  category: nope\n").is_err());
    }
}
