//! Integration tests for schedules read in the host zone.
//!
//! Pins `TZ` to US Eastern rules so the daylight-saving transitions of 2025
//! (March 9 and November 2) are known.

#![cfg(unix)]

use chrono::{DateTime, TimeZone, Utc};
use duewatch::DashboardError;
use duewatch::clock::{Clock, ManualClock};
use duewatch::config::ReminderConfig;
use duewatch::notify::ChannelSink;
use duewatch::scheduler::{DueTimeResolver, ReminderEngine, Task};
use std::sync::Once;

static EASTERN: Once = Once::new();

fn eastern() -> DueTimeResolver {
    EASTERN.call_once(|| {
        // SAFETY: runs once, before any test in this binary reads the
        // environment or the local zone.
        unsafe { std::env::set_var("TZ", "EST5EDT,M3.2.0,M11.1.0") };
    });
    DueTimeResolver::local()
}

fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
}

fn offset_hours(resolver: &DueTimeResolver, raw: &str) -> i32 {
    resolver.resolve(raw).unwrap().instant.offset().local_minus_utc() / 3600
}

#[test]
fn test_offset_follows_daylight_saving() {
    let resolver = eastern();
    assert_eq!(offset_hours(&resolver, "2025-01-06 09:00"), -5);
    assert_eq!(offset_hours(&resolver, "2025-07-07 09:00"), -4);

    let summer = resolver.resolve("2025-07-07 09:00").unwrap();
    assert_eq!(summer.instant.with_timezone(&Utc), utc(2025, 7, 7, 13, 0, 0));
    assert_eq!(summer.slot.key(), "2025-07-07 09:00");
}

#[test]
fn test_slot_of_crosses_spring_forward() {
    let resolver = eastern();
    assert_eq!(resolver.slot_of(utc(2025, 3, 9, 6, 59, 0)).key(), "2025-03-09 01:59");
    assert_eq!(resolver.slot_of(utc(2025, 3, 9, 7, 0, 0)).key(), "2025-03-09 03:00");
}

/// One engine built from the default config notifies winter and summer tasks
/// in their own local minute.
#[test]
fn test_default_engine_notifies_in_local_minute_across_dst() {
    eastern();
    let (sink, _rx) = ChannelSink::new(false);
    let mut engine = ReminderEngine::from_config(&ReminderConfig::default()).unwrap();
    let tasks = vec![
        Task::new("winter", "Water plants", "2025-01-06 09:00"),
        Task::new("summer", "Feed cat", "2025-07-07 09:00"),
    ];

    let clock = ManualClock::new(utc(2025, 1, 6, 14, 0, 30));
    let report = engine.tick(&tasks, clock.now(), &sink);
    assert_eq!(report.notified, vec!["winter".to_owned()]);

    clock.set(utc(2025, 7, 7, 13, 0, 30));
    let report = engine.tick(&tasks, clock.now(), &sink);
    assert_eq!(report.notified, vec!["summer".to_owned()]);
}

#[test]
fn test_repeated_wall_time_takes_earlier_instant() {
    let resolver = eastern();
    let due = resolver.resolve("2025-11-02 01:30").unwrap();
    assert_eq!(due.instant.offset().local_minus_utc(), -4 * 3600);
    assert_eq!(due.instant.with_timezone(&Utc), utc(2025, 11, 2, 5, 30, 0));
    assert_eq!(due.slot.key(), "2025-11-02 01:30");
}

#[test]
fn test_skipped_wall_time_is_unparseable() {
    let resolver = eastern();
    let err = resolver.resolve("2025-03-09 02:30").unwrap_err();
    assert!(matches!(err, DashboardError::DueTimeUnparseable(_)));
    assert!(resolver.resolve("2025-03-09 03:30").is_ok());
}
