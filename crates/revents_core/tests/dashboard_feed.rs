mod common;

use common::{actor, draft, Harness};
use revents_core::store::DocumentStore;
use revents_core::{AsyncStatus, Event, DASHBOARD_PAGE_SIZE};
use std::collections::HashSet;

/// Seeds one past event and five upcoming ones, created out of date order.
fn seed(harness: &Harness) {
    let events = harness.events();
    let alice = actor("alice", "Alice");
    for (title, date) in [
        ("March", "2025-03-01"),
        ("Past", "2024-12-01"),
        ("January", "2025-01-05"),
        ("May", "2025-05-01"),
        ("February", "2025-02-01"),
        ("April", "2025-04-01"),
    ] {
        events.create_event(&draft(title, date), &alice).unwrap();
    }
}

fn titles(events: &[Event]) -> Vec<&str> {
    events.iter().map(|event| event.title.as_str()).collect()
}

#[test]
fn first_page_holds_the_two_soonest_upcoming_events() {
    let harness = Harness::new();
    seed(&harness);

    let page = harness.events().dashboard_feed(None).unwrap();

    assert_eq!(DASHBOARD_PAGE_SIZE, 2);
    assert_eq!(titles(&page), vec!["January", "February"]);
    assert!(page.iter().all(|event| event.date >= common::now()));
    assert_eq!(harness.app_store.snapshot().events, page);
    assert_eq!(harness.app_store.status(), AsyncStatus::Idle);
}

#[test]
fn pages_follow_each_other_until_exhausted() {
    let harness = Harness::new();
    seed(&harness);
    let events = harness.events();

    let first = events.dashboard_feed(None).unwrap();
    let second = events.dashboard_feed(first.last()).unwrap();
    let third = events.dashboard_feed(second.last()).unwrap();
    let fourth = events.dashboard_feed(third.last()).unwrap();

    assert_eq!(titles(&second), vec!["March", "April"]);
    assert_eq!(titles(&third), vec!["May"]);
    assert!(fourth.is_empty());

    let seen: HashSet<&str> = [&first, &second, &third]
        .into_iter()
        .flat_map(|page| page.iter().map(|event| event.id.as_str()))
        .collect();
    assert_eq!(seen.len(), 5);

    // An exhausted feed keeps the last non-empty page in the store.
    assert_eq!(harness.app_store.snapshot().events, third);
}

#[test]
fn fetched_page_replaces_the_stored_page() {
    let harness = Harness::new();
    seed(&harness);
    let events = harness.events();

    let first = events.dashboard_feed(None).unwrap();
    let second = events.dashboard_feed(first.last()).unwrap();

    let stored = harness.app_store.snapshot().events;
    assert_eq!(stored, second);
    assert_eq!(stored.len(), 2);
}

#[test]
fn events_on_the_same_date_are_neither_skipped_nor_repeated() {
    let harness = Harness::new();
    let events = harness.events();
    let alice = actor("alice", "Alice");
    for title in ["A", "B", "C", "D", "E"] {
        events
            .create_event(&draft(title, "2025-02-14"), &alice)
            .unwrap();
    }

    let mut seen = Vec::new();
    let mut last: Option<Event> = None;
    loop {
        let page = events.dashboard_feed(last.as_ref()).unwrap();
        if page.is_empty() {
            break;
        }
        assert!(page.len() <= 2);
        seen.extend(page.iter().map(|event| event.id.clone()));
        last = page.last().cloned();
    }

    let unique: HashSet<&String> = seen.iter().collect();
    assert_eq!(seen.len(), 5);
    assert_eq!(unique.len(), 5);
}

#[test]
fn event_starting_now_is_upcoming() {
    let harness = Harness::new();
    harness
        .events()
        .create_event(&draft("Now", "2025-01-01T00:00:00Z"), &actor("alice", "Alice"))
        .unwrap();

    let page = harness.events().dashboard_feed(None).unwrap();
    assert_eq!(titles(&page), vec!["Now"]);
}

#[test]
fn empty_feed_leaves_state_untouched() {
    let harness = Harness::new();

    let page = harness.events().dashboard_feed(None).unwrap();

    assert!(page.is_empty());
    assert!(harness.app_store.snapshot().events.is_empty());
    assert_eq!(harness.app_store.status(), AsyncStatus::Idle);
}

#[test]
fn missing_cursor_event_reports_failure_without_toast() {
    let harness = Harness::new();
    seed(&harness);
    let events = harness.events();
    let first = events.dashboard_feed(None).unwrap();
    let last = first.last().unwrap().clone();
    harness.store().delete(&last.reference()).unwrap();
    harness.notifier.clear();

    assert!(events.dashboard_feed(Some(&last)).is_none());

    assert!(matches!(harness.app_store.status(), AsyncStatus::Failed(_)));
    assert!(harness.notifier.toasts().is_empty());
    assert_eq!(harness.app_store.snapshot().events, first);
}

#[test]
fn cancelled_events_stay_in_the_feed() {
    let harness = Harness::new();
    let events = harness.events();
    let id = events
        .create_event(&draft("Launch", "2025-03-01"), &actor("alice", "Alice"))
        .unwrap();
    assert!(events.cancel_toggle(&id, true));

    let page = events.dashboard_feed(None).unwrap();
    assert_eq!(page.len(), 1);
    assert!(page[0].cancelled);
}
