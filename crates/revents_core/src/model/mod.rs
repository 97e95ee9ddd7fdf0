//! Domain records persisted through the document store.
//!
//! # Responsibility
//! - Define the typed shapes of events, attendance records, comments, photos
//!   and user profiles, plus their stored (camelCase) field names.
//! - Keep document ids out of stored bodies; ids come from `DocRef`.
//!
//! # Invariants
//! - Instants are stored as epoch milliseconds.
//! - An attendance record's `eventDate` mirrors its event's `date`.

pub mod attendance;
pub mod comment;
pub mod date;
pub mod event;
pub mod user;

/// Collection holding event documents.
pub const EVENTS_COLLECTION: &str = "events";
/// Collection holding one attendance record per (event, user).
pub const ATTENDANCE_COLLECTION: &str = "event_attendee";
/// Collection holding user profile documents.
pub const USERS_COLLECTION: &str = "users";
/// Prefix of per-event comment lists.
pub const EVENT_CHAT_LIST: &str = "event_chat";
/// Photo used when a user has none.
pub const DEFAULT_PLACEHOLDER_PHOTO: &str = "/assets/user.png";
