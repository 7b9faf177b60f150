//! Event catalog and event stream fixtures parse into the shared model.

use sl_common::{AttributePath, AttributeValue, EventCategory, EventTypeRegistry, HostEvent};
use std::path::{Path, PathBuf};

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("test")
        .join("fixtures")
}

fn load_catalog() -> EventTypeRegistry {
    let contents =
        std::fs::read_to_string(fixtures_dir().join("catalog.yaml")).expect("read catalog fixture");
    serde_yaml::from_str(&contents).expect("parse catalog fixture")
}

#[test]
fn test_catalog_covers_every_category() {
    let registry = load_catalog();
    let list: Vec<sl_common::EventTypeDescriptor> = registry.clone().into();
    for category in EventCategory::all() {
        assert!(
            list.iter().any(|d| d.category == *category),
            "no fixture event for {category}"
        );
    }
}

#[test]
fn test_catalog_subject_attributes_resolve() {
    let registry = load_catalog();
    let hanging = registry.resolve("HangingBreakByEntityEvent").unwrap();
    assert_eq!(
        hanging.resolve_attribute("REMOVER"),
        Some(AttributePath::new("remover"))
    );
    assert_eq!(
        hanging.resolve_attribute("entity"),
        Some(AttributePath::new("entity"))
    );
    let server = registry.resolve("ServerCommandEvent").unwrap();
    assert!(server.resolve_attribute("player").is_none());
}

#[test]
fn test_event_stream_parses() {
    let contents =
        std::fs::read_to_string(fixtures_dir().join("events.jsonl")).expect("read events fixture");
    let events: Vec<HostEvent> = contents
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).expect("parse event line"))
        .collect();
    assert_eq!(events.len(), 5);

    let join = &events[0];
    match join.named("player") {
        Some(AttributeValue::Actor(actor)) => {
            assert!(actor.is_player());
            assert_eq!(actor.address.as_deref(), Some("10.0.0.5"));
        }
        other => panic!("unexpected player attribute {other:?}"),
    }
    assert!(events[2].is_cancelled());
    assert_eq!(events[3].cancelled, Some(false));
}
