//! Event documents and their embedded attendee map.
//!
//! # Invariants
//! - `attendees` is keyed by user id; a user appears at most once.
//! - The host is recorded both as `hostUid` and as an attendee with
//!   `isHost = true`.

use super::user::Actor;
use super::EVENTS_COLLECTION;
use crate::store::{DocRef, DocumentSnapshot, StoreResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type EventId = String;

/// Denormalized summary of one attendee inside `Event::attendees`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendeeSummary {
    #[serde(default)]
    pub display_name: String,
    #[serde(rename = "photoURL", default)]
    pub photo_url: String,
    pub is_going: bool,
    pub is_host: bool,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub join_date: DateTime<Utc>,
}

impl AttendeeSummary {
    /// Summary for a user joining an event they do not host.
    pub fn going(actor: &Actor, joined_at: DateTime<Utc>, placeholder_photo: &str) -> Self {
        Self {
            display_name: actor.profile.display_name.clone(),
            photo_url: actor.profile.photo_or(placeholder_photo).to_string(),
            is_going: true,
            is_host: false,
            join_date: joined_at,
        }
    }

    /// Summary for the user creating an event.
    pub fn host(actor: &Actor, joined_at: DateTime<Utc>, placeholder_photo: &str) -> Self {
        Self {
            is_host: true,
            ..Self::going(actor, joined_at, placeholder_photo)
        }
    }
}

/// Attendee entry flattened for list rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendeeListItem {
    pub uid: String,
    pub summary: AttendeeSummary,
}

/// User-entered event fields, used for both create and update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventDraft {
    pub title: String,
    pub category: Option<String>,
    pub description: String,
    pub city: String,
    pub venue: String,
    /// Raw date input, normalized with `parse_event_date`.
    pub date: String,
}

impl EventDraft {
    pub fn new(title: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            date: date.into(),
            ..Self::default()
        }
    }
}

/// Event document stored at `events/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(skip)]
    pub id: EventId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub venue: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub cancelled: bool,
    pub host_uid: String,
    #[serde(default)]
    pub hosted_by: String,
    #[serde(rename = "hostPhotoURL", default)]
    pub host_photo_url: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub attendees: BTreeMap<String, AttendeeSummary>,
}

impl Event {
    /// Builds a new, not yet persisted event hosted by `actor`.
    ///
    /// The attendee map holds exactly the host.
    pub fn hosted(
        draft: &EventDraft,
        date: DateTime<Utc>,
        actor: &Actor,
        now: DateTime<Utc>,
        placeholder_photo: &str,
    ) -> Self {
        let host = AttendeeSummary::host(actor, now, placeholder_photo);
        let mut attendees = BTreeMap::new();
        attendees.insert(actor.uid().to_string(), host.clone());

        Self {
            id: EventId::new(),
            title: draft.title.clone(),
            category: draft.category.clone(),
            description: draft.description.clone(),
            city: draft.city.clone(),
            venue: draft.venue.clone(),
            date,
            cancelled: false,
            host_uid: actor.uid().to_string(),
            hosted_by: host.display_name,
            host_photo_url: host.photo_url,
            created: now,
            attendees,
        }
    }

    pub fn from_snapshot(snapshot: &DocumentSnapshot) -> StoreResult<Self> {
        let mut event: Self = snapshot.decode()?;
        event.id = snapshot.reference.id().to_string();
        Ok(event)
    }

    pub fn reference(&self) -> DocRef {
        event_ref(&self.id)
    }

    pub fn is_attending(&self, uid: &str) -> bool {
        self.attendees
            .get(uid)
            .is_some_and(|attendee| attendee.is_going)
    }

    /// Attendees as a list: host first, then by join date, then by user id.
    pub fn attendee_list(&self) -> Vec<AttendeeListItem> {
        let mut items: Vec<AttendeeListItem> = self
            .attendees
            .iter()
            .map(|(uid, summary)| AttendeeListItem {
                uid: uid.clone(),
                summary: summary.clone(),
            })
            .collect();
        items.sort_by(|a, b| {
            b.summary
                .is_host
                .cmp(&a.summary.is_host)
                .then(a.summary.join_date.cmp(&b.summary.join_date))
                .then(a.uid.cmp(&b.uid))
        });
        items
    }
}

pub fn event_ref(event_id: &str) -> DocRef {
    DocRef::new(EVENTS_COLLECTION, event_id)
}
