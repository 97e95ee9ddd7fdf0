//! Denormalized (event, user) attendance records.

use super::ATTENDANCE_COLLECTION;
use crate::store::DocRef;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Document stored at `event_attendee/{eventID}_{userUID}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    #[serde(rename = "eventID")]
    pub event_id: String,
    #[serde(rename = "userUID")]
    pub user_uid: String,
    /// Copy of the event's `date`.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub event_date: DateTime<Utc>,
    pub is_host: bool,
}

impl AttendanceRecord {
    pub fn reference(&self) -> DocRef {
        attendance_ref(&self.event_id, &self.user_uid)
    }
}

/// Deterministic record id, so each (event, user) pair maps to one document.
pub fn attendance_doc_id(event_id: &str, user_uid: &str) -> String {
    format!("{event_id}_{user_uid}")
}

pub fn attendance_ref(event_id: &str, user_uid: &str) -> DocRef {
    DocRef::new(ATTENDANCE_COLLECTION, attendance_doc_id(event_id, user_uid))
}
