mod common;

use common::{actor, draft, now, Harness};
use revents_core::store::DocumentStore;
use revents_core::{gallery_photos, AppAction, AsyncStatus, ToastKind, UserService};

#[test]
fn register_profile_stamps_creation_time() {
    let harness = Harness::new();
    let users = harness.users();

    assert!(users.register_profile(&actor("alice", "Alice")));

    let profile = users.get_profile("alice").unwrap();
    assert_eq!(profile.display_name, "Alice");
    assert_eq!(profile.photo_url, None);
    assert_eq!(profile.created_at, Some(now()));
}

#[test]
fn unknown_profile_is_none() {
    let harness = Harness::new();

    assert!(harness.users().get_profile("nobody").is_none());
    assert!(harness.notifier.toasts().is_empty());
}

#[test]
fn first_photo_becomes_the_main_photo() {
    let harness = Harness::new();
    let users = harness.users();
    let alice = actor("alice", "Alice");
    assert!(users.register_profile(&alice));

    let first = users
        .add_photo(&alice, "beach.jpg", "https://img/beach.jpg")
        .unwrap();
    let second = users
        .add_photo(&alice, "alps.jpg", "https://img/alps.jpg")
        .unwrap();

    assert!(!first.id.is_empty());
    assert_ne!(first.id, second.id);
    let profile = users.get_profile("alice").unwrap();
    assert_eq!(profile.photo_url.as_deref(), Some("https://img/beach.jpg"));

    let toast = harness.notifier.last_toast().unwrap();
    assert_eq!(toast.kind, ToastKind::Success);
    assert_eq!(toast.title, "Success!");
    assert_eq!(toast.body, "Photo has been uploaded");
}

#[test]
fn blank_photo_url_counts_as_no_main_photo() {
    let harness = Harness::new();
    let users = harness.users();
    let mut alice = actor("alice", "Alice");
    alice.profile = alice.profile.clone().with_photo("  ");
    assert!(users.register_profile(&alice));

    let photo = users
        .add_photo(&alice, "beach.jpg", "https://img/beach.jpg")
        .unwrap();

    let profile = users.get_profile("alice").unwrap();
    assert_eq!(profile.photo_url.as_deref(), Some("https://img/beach.jpg"));
    assert!(!users.delete_photo(&alice, &photo));
}

#[test]
fn photo_upload_creates_missing_profile() {
    let harness = Harness::new();
    let users = harness.users();

    users
        .add_photo(&actor("bob", "Bob"), "me.jpg", "https://img/me.jpg")
        .unwrap();

    let profile = users.get_profile("bob").unwrap();
    assert_eq!(profile.display_name, "Bob");
    assert_eq!(profile.photo_url.as_deref(), Some("https://img/me.jpg"));
}

#[test]
fn photos_are_listed_by_name_and_gallery_hides_main() {
    let harness = Harness::new();
    let users = harness.users();
    let alice = actor("alice", "Alice");
    for name in ["c.jpg", "a.jpg", "b.jpg"] {
        users
            .add_photo(&alice, name, &format!("https://img/{name}"))
            .unwrap();
    }

    let photos = users.list_photos("alice").unwrap();
    let names: Vec<&str> = photos.iter().map(|photo| photo.name.as_str()).collect();
    assert_eq!(names, vec!["a.jpg", "b.jpg", "c.jpg"]);
    assert!(photos.iter().all(|photo| !photo.id.is_empty()));

    let profile = users.get_profile("alice").unwrap();
    let gallery: Vec<&str> = gallery_photos(&profile, &photos)
        .into_iter()
        .map(|photo| photo.name.as_str())
        .collect();
    assert_eq!(gallery, vec!["a.jpg", "b.jpg"]);
    assert!(users.list_photos("nobody").unwrap().is_empty());
}

#[test]
fn main_photo_cannot_be_deleted() {
    let harness = Harness::new();
    let users = harness.users();
    let alice = actor("alice", "Alice");
    let main = users
        .add_photo(&alice, "main.jpg", "https://img/main.jpg")
        .unwrap();
    let spare = users
        .add_photo(&alice, "spare.jpg", "https://img/spare.jpg")
        .unwrap();

    assert!(!users.delete_photo(&alice, &main));
    let toast = harness.notifier.last_toast().unwrap();
    assert_eq!(toast.kind, ToastKind::Error);
    assert_eq!(toast.body, "You cannot delete your main photo");
    assert!(matches!(harness.app_store.status(), AsyncStatus::Failed(_)));

    assert!(users.delete_photo(&alice, &spare));
    let remaining = users.list_photos("alice").unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, main.id);
    assert_eq!(harness.app_store.status(), AsyncStatus::Idle);
}

#[test]
fn main_photo_change_reaches_upcoming_events_only() {
    let harness = Harness::new();
    let events = harness.events();
    let users = harness.users();
    let alice = actor("alice", "Alice");
    let bob = actor("bob", "Bob");
    assert!(users.register_profile(&alice));

    let hosted = events
        .create_event(&draft("Alice hosts", "2025-06-01"), &alice)
        .unwrap();
    let joined = events
        .create_event(&draft("Bob hosts", "2025-07-01"), &bob)
        .unwrap();
    assert!(events.join_event(&harness.event(&joined), &alice));
    let past = events
        .create_event(&draft("Old times", "2024-06-01"), &alice)
        .unwrap();

    let photo = users
        .add_photo(&alice, "new.jpg", "https://img/new.jpg")
        .unwrap();
    assert!(users.set_main_photo(&alice, &photo));

    let profile = users.get_profile("alice").unwrap();
    assert_eq!(profile.photo_url.as_deref(), Some("https://img/new.jpg"));

    let hosted_event = harness.event(&hosted);
    assert_eq!(hosted_event.host_photo_url, "https://img/new.jpg");
    assert_eq!(
        hosted_event.attendees["alice"].photo_url,
        "https://img/new.jpg"
    );

    let joined_event = harness.event(&joined);
    assert_eq!(
        joined_event.attendees["alice"].photo_url,
        "https://img/new.jpg"
    );
    assert_eq!(joined_event.host_photo_url, common::PLACEHOLDER);
    assert_eq!(joined_event.attendees["bob"].photo_url, common::PLACEHOLDER);

    let past_event = harness.event(&past);
    assert_eq!(past_event.host_photo_url, common::PLACEHOLDER);
    assert_eq!(past_event.attendees["alice"].photo_url, common::PLACEHOLDER);

    assert_eq!(
        harness.actions().last(),
        Some(&AppAction::AsyncEnd)
    );
}

#[test]
fn main_photo_change_is_one_batch() {
    let harness = Harness::new();
    let alice = actor("alice", "Alice");
    harness
        .events()
        .create_event(&draft("Launch", "2025-06-01"), &alice)
        .unwrap();
    let photo = harness
        .users()
        .add_photo(&alice, "new.jpg", "https://img/new.jpg")
        .unwrap();

    let recording = harness.recording();
    recording.fail_batches(true);
    let users = UserService::new(&recording, harness.ctx());
    assert!(!users.set_main_photo(&alice, &photo));
    assert_eq!(recording.calls.batch.get(), 1);
    assert_eq!(recording.calls.writes(), 1);

    // The first upload made this photo the main one already; the failed
    // batch must not have touched the event copy either way.
    let profile = harness.users().get_profile("alice").unwrap();
    assert_eq!(profile.photo_url.as_deref(), Some("https://img/new.jpg"));
    let snapshot = harness
        .store()
        .query(&revents_core::store::Query::new("events"))
        .unwrap();
    let event = revents_core::Event::from_snapshot(&snapshot[0]).unwrap();
    assert_eq!(event.host_photo_url, common::PLACEHOLDER);
}
