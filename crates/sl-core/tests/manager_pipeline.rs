//! LogManager end to end over the fixture configuration and catalog.

use chrono::{Local, TimeZone};
use sl_common::{Actor, AttributeValue, HostEvent};
use sl_config::load_settings;
use sl_core::{load_catalog, load_events, Dispatch, LogManager};
use sl_sink::ChannelSubscriber;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::sync::Arc;
use std::thread;

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("test")
        .join("fixtures")
}

fn fixture_manager(data_dir: &Path) -> LogManager {
    let (settings, rules) = load_settings(&fixtures_dir().join("config.yml")).unwrap();
    let registry = load_catalog(&fixtures_dir().join("catalog.yaml")).unwrap();
    LogManager::new(registry, data_dir, settings, &rules).0
}

fn join(name: &str) -> HostEvent {
    HostEvent::new("PlayerJoinEvent").with(
        "player",
        AttributeValue::Actor(Actor::player(name).with_address("10.0.0.9")),
    )
}

#[test]
fn test_fixture_events_land_in_files() {
    let dir = tempfile::tempdir().unwrap();
    let mgr = fixture_manager(dir.path());
    let events = load_events(&fixtures_dir().join("events.jsonl")).unwrap();
    let now = Local.with_ymd_and_hms(2024, 11, 2, 8, 15, 0).unwrap();

    let dispatches: Vec<_> = events.iter().map(|e| mgr.handle_at(e, now)).collect();
    assert_eq!(dispatches.last(), Some(&Dispatch::Unregistered));
    assert_eq!(mgr.shutdown(), 3);

    let logs = dir.path().join("logs");
    assert_eq!(
        fs::read_to_string(logs.join("players/Alice/02-11-24_PlayerEvents.log")).unwrap(),
        "[08:15:00][PlayerJoinEvent]: Alice joined from 10.0.0.5\n"
    );
    assert_eq!(
        fs::read_to_string(logs.join("players/Alice/02-11-24_BlockEvents.log")).unwrap(),
        "[08:15:00][BlockBreakEvent]: Alice broke minecraft:stone at 10,64,-3\n"
    );
    assert_eq!(
        fs::read_to_string(logs.join("02-11-24_WeatherEvents.log")).unwrap(),
        "[08:15:00][WeatherChangeEvent]: weather in world changed (rain: true)\n"
    );
}

#[test]
fn test_concurrent_producers_with_live_tail() {
    let dir = tempfile::tempdir().unwrap();
    let mgr = Arc::new(fixture_manager(dir.path()));
    let (tx, rx) = channel();
    mgr.subscribe_live("p0", Arc::new(ChannelSubscriber::new(tx)));

    let now = Local.with_ymd_and_hms(2024, 11, 2, 8, 15, 0).unwrap();
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let mgr = Arc::clone(&mgr);
            thread::spawn(move || {
                for _ in 0..50 {
                    mgr.handle_at(&join(&format!("p{t}")), now);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(mgr.pending_lines(), 200);
    assert_eq!(mgr.flush_all_now(), 4);

    let live: Vec<String> = rx.try_iter().collect();
    assert_eq!(live.len(), 50);
    assert!(live
        .iter()
        .all(|l| l == "[08:15:00][PlayerJoinEvent] p0 joined from 10.0.0.9"));

    for t in 0..4 {
        let file = dir
            .path()
            .join(format!("logs/players/p{t}/02-11-24_PlayerEvents.log"));
        assert_eq!(fs::read_to_string(file).unwrap().lines().count(), 50);
    }
}

#[test]
fn test_start_and_command_alert_from_fixture() {
    let dir = tempfile::tempdir().unwrap();
    let mgr = fixture_manager(dir.path());
    mgr.start().unwrap();

    assert_eq!(
        mgr.command_alert("Alice", "/gamemode creative").as_deref(),
        Some("Alice used /gamemode creative")
    );
    assert_eq!(mgr.command_alert("Alice", "/spawn"), None);

    mgr.set_enabled(false);
    assert_eq!(mgr.handle(&join("Alice")), Dispatch::Disabled);
    mgr.set_enabled(true);
    assert!(mgr.handle(&join("Alice")).rendered().is_some());
    assert_eq!(mgr.shutdown(), 1);
}
