//! Event use-cases: create, update, cancel, join/leave, dashboard, comments.
//!
//! # Invariants
//! - Attendance records carry their event's date; `update_event` rewrites
//!   them in the same batch as the event whenever the date changes.
//! - `join_event` updates the attendee map and the attendance record in one
//!   transaction that reads the event first.
//! - `create_event` and `leave_event` issue two independent writes; a failure
//!   between them is not compensated.
//! - The dashboard page size is fixed at `DASHBOARD_PAGE_SIZE`.

use super::{OperationScope, ServiceContext, ServiceError, ServiceResult, StatusTracking};
use crate::model::attendance::{attendance_ref, AttendanceRecord};
use crate::model::comment::{build_comment_tree, comment_list_path, Comment, CommentNode};
use crate::model::date::parse_event_date;
use crate::model::event::{event_ref, AttendeeSummary, Event, EventDraft, EventId};
use crate::model::user::Actor;
use crate::model::{ATTENDANCE_COLLECTION, EVENTS_COLLECTION};
use crate::state::AppAction;
use crate::store::{
    to_document, Direction, DocumentStore, FieldPath, FieldUpdate, FilterOp, Query, StoreError,
    StoreResult, WriteBatch,
};
use chrono::{DateTime, Utc};
use log::debug;
use serde_json::Value;

/// Events per dashboard page.
pub const DASHBOARD_PAGE_SIZE: u32 = 2;

const CANCEL_PROMPT: &str = "Are you sure you want to cancel the event?";
const REACTIVATE_PROMPT: &str = "This will reactivate the event - are you sure?";

/// Event use-case service over a document store.
pub struct EventService<S: DocumentStore> {
    store: S,
    ctx: ServiceContext,
}

impl<S: DocumentStore> EventService<S> {
    pub fn new(store: S, ctx: ServiceContext) -> Self {
        Self { store, ctx }
    }

    /// Creates an event hosted by `actor` and the host's attendance record.
    ///
    /// Returns the new event id, or `None` when any write failed.
    pub fn create_event(&self, draft: &EventDraft, actor: &Actor) -> Option<EventId> {
        let scope = OperationScope::begin(&self.ctx, "event_create", StatusTracking::Untracked);
        let result = self.try_create_event(draft, actor);
        scope.finish(result, Some(("Success", "Event has been created")))
    }

    /// Applies `draft` to `previous`, propagating a date change to every
    /// attendance record of the event.
    pub fn update_event(&self, previous: &Event, draft: &EventDraft) -> bool {
        let scope = OperationScope::begin(&self.ctx, "event_update", StatusTracking::Tracked);
        let result = self.try_update_event(previous, draft);
        scope
            .finish(result, Some(("Success!", "Event has been updated")))
            .is_some()
    }

    /// Sets the event's `cancelled` flag after the user confirms.
    ///
    /// Returns `false` without writing when the prompt is declined.
    pub fn cancel_toggle(&self, event_id: &str, cancelled: bool) -> bool {
        let message = if cancelled {
            CANCEL_PROMPT
        } else {
            REACTIVATE_PROMPT
        };
        if !self.ctx.notifier.confirm(message) {
            debug!("event=event_cancel_toggle module=service status=declined");
            return false;
        }

        let scope =
            OperationScope::begin(&self.ctx, "event_cancel_toggle", StatusTracking::Untracked);
        let result = FieldPath::parse("cancelled")
            .and_then(|path| {
                self.store
                    .update(&event_ref(event_id), &[FieldUpdate::set(path, cancelled)])
            })
            .map_err(ServiceError::from);
        scope.finish(result, None).is_some()
    }

    /// Adds `actor` to the event's attendees and creates their attendance
    /// record, atomically.
    pub fn join_event(&self, event: &Event, actor: &Actor) -> bool {
        let scope = OperationScope::begin(&self.ctx, "event_join", StatusTracking::Tracked);
        let result = self.try_join_event(event, actor);
        scope
            .finish(result, Some(("Success", "You have signed up for the event")))
            .is_some()
    }

    /// Removes `actor` from the event's attendees and deletes their
    /// attendance record.
    pub fn leave_event(&self, event: &Event, actor: &Actor) -> bool {
        let scope = OperationScope::begin(&self.ctx, "event_leave", StatusTracking::Untracked);
        let result = self.try_leave_event(event, actor);
        scope
            .finish(
                result,
                Some(("Success", "You have removed yourself from the event")),
            )
            .is_some()
    }

    /// Fetches the next page of upcoming events.
    ///
    /// `last_event` is the last item of the previous page. An empty page means
    /// the feed is exhausted; it leaves the stored page untouched. A non-empty
    /// page replaces the stored page.
    pub fn dashboard_feed(&self, last_event: Option<&Event>) -> Option<Vec<Event>> {
        let scope = OperationScope::begin(&self.ctx, "event_dashboard", StatusTracking::Tracked);
        let result = self.try_dashboard_feed(last_event).map(|events| {
            if !events.is_empty() {
                self.ctx.app_store.dispatch(AppAction::FeedFetched {
                    events: events.clone(),
                });
            }
            events
        });
        scope.finish_quietly(result)
    }

    /// Appends a comment (or a reply when `parent_id` is set) to the event's
    /// comment stream. Returns the comment key.
    pub fn add_comment(
        &self,
        event_id: &str,
        text: &str,
        parent_id: Option<&str>,
        actor: &Actor,
    ) -> Option<String> {
        let scope = OperationScope::begin(&self.ctx, "event_comment", StatusTracking::Untracked);
        let result = self.try_add_comment(event_id, text, parent_id, actor);
        scope.finish(result, None)
    }

    /// Loads one event.
    pub fn get_event(&self, event_id: &str) -> Option<Event> {
        let scope = OperationScope::begin(&self.ctx, "event_get", StatusTracking::Untracked);
        let result = self
            .store
            .get(&event_ref(event_id))
            .map_err(ServiceError::from)
            .and_then(|snapshot| match snapshot {
                Some(snapshot) => Ok(Event::from_snapshot(&snapshot)?),
                None => Err(ServiceError::EventNotFound(event_id.to_string())),
            });
        scope.finish_quietly(result)
    }

    /// Reads the event's comments in push order.
    pub fn event_comments(&self, event_id: &str) -> Option<Vec<Comment>> {
        let scope = OperationScope::begin(&self.ctx, "event_comments", StatusTracking::Untracked);
        let result = self
            .store
            .list(&comment_list_path(event_id))
            .and_then(|entries| {
                entries
                    .iter()
                    .map(Comment::from_entry)
                    .collect::<StoreResult<Vec<_>>>()
            })
            .map_err(ServiceError::from);
        scope.finish_quietly(result)
    }

    /// Reads the event's comments as reply threads.
    pub fn comment_threads(&self, event_id: &str) -> Option<Vec<CommentNode>> {
        self.event_comments(event_id)
            .map(|comments| build_comment_tree(&comments))
    }

    fn try_create_event(&self, draft: &EventDraft, actor: &Actor) -> ServiceResult<EventId> {
        let date = normalize_date(&draft.date)?;
        let now = self.ctx.clock.now();
        let event = Event::hosted(draft, date, actor, now, &self.ctx.placeholder_photo_url);

        let reference = self.store.add(EVENTS_COLLECTION, to_document(&event)?)?;
        let record = AttendanceRecord {
            event_id: reference.id().to_string(),
            user_uid: actor.uid().to_string(),
            event_date: date,
            is_host: true,
        };
        self.store
            .set(&record.reference(), to_document(&record)?)?;

        Ok(reference.id().to_string())
    }

    fn try_update_event(&self, previous: &Event, draft: &EventDraft) -> ServiceResult<()> {
        let new_date = normalize_date(&draft.date)?;
        let reference = previous.reference();
        let updates = draft_updates(draft, new_date)?;

        if previous.date == new_date {
            self.store.update(&reference, &updates)?;
            return Ok(());
        }

        let attendance = self.store.query(
            &Query::new(ATTENDANCE_COLLECTION).filter(
                FieldPath::parse("eventID")?,
                FilterOp::Eq,
                previous.id.as_str(),
            ),
        )?;
        let event_date_path = FieldPath::parse("eventDate")?;

        let mut batch = WriteBatch::new();
        batch.update(reference, updates);
        for record in attendance {
            batch.update(
                record.reference,
                vec![FieldUpdate::set(
                    event_date_path.clone(),
                    new_date.timestamp_millis(),
                )],
            );
        }
        debug!(
            "event=event_update module=service status=batch writes={}",
            batch.len()
        );
        self.store.commit_batch(batch)?;
        Ok(())
    }

    fn try_join_event(&self, event: &Event, actor: &Actor) -> ServiceResult<()> {
        let attendee = AttendeeSummary::going(
            actor,
            self.ctx.clock.now(),
            &self.ctx.placeholder_photo_url,
        );
        let attendee_path = FieldPath::from_segments(["attendees", actor.uid()])?;
        let attendee_value = serde_json::to_value(&attendee).map_err(StoreError::from)?;
        let event_reference = event.reference();
        let attendance_reference = attendance_ref(&event.id, actor.uid());

        self.store.run_transaction(|tx| {
            let Some(snapshot) = tx.get(&event_reference)? else {
                return Err(StoreError::NotFound(event_reference.clone()));
            };
            let current = Event::from_snapshot(&snapshot)?;

            tx.update(
                &event_reference,
                &[FieldUpdate::set(attendee_path, attendee_value)],
            )?;
            let record = AttendanceRecord {
                event_id: event.id.clone(),
                user_uid: actor.uid().to_string(),
                event_date: current.date,
                is_host: false,
            };
            tx.set(&attendance_reference, to_document(&record)?)
        })?;
        Ok(())
    }

    fn try_leave_event(&self, event: &Event, actor: &Actor) -> ServiceResult<()> {
        let attendee_path = FieldPath::from_segments(["attendees", actor.uid()])?;
        self.store
            .update(&event.reference(), &[FieldUpdate::delete(attendee_path)])?;
        self.store.delete(&attendance_ref(&event.id, actor.uid()))?;
        Ok(())
    }

    fn try_dashboard_feed(&self, last_event: Option<&Event>) -> ServiceResult<Vec<Event>> {
        let today = self.ctx.clock.now();
        let date_path = FieldPath::parse("date")?;
        let mut query = Query::new(EVENTS_COLLECTION)
            .filter(date_path.clone(), FilterOp::Gte, today.timestamp_millis())
            .order_by(date_path.clone(), Direction::Asc)
            .limit(DASHBOARD_PAGE_SIZE);

        if let Some(last) = last_event {
            let cursor = self
                .store
                .cursor_for(&last.reference(), Some(&date_path))?
                .ok_or_else(|| ServiceError::EventNotFound(last.id.clone()))?;
            query = query.start_after(cursor);
        }

        let snapshots = self.store.query(&query)?;
        let events = snapshots
            .iter()
            .map(Event::from_snapshot)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            "event=event_dashboard module=service status=page items={} paginated={}",
            events.len(),
            last_event.is_some()
        );
        Ok(events)
    }

    fn try_add_comment(
        &self,
        event_id: &str,
        text: &str,
        parent_id: Option<&str>,
        actor: &Actor,
    ) -> ServiceResult<String> {
        let comment = Comment {
            key: String::new(),
            display_name: actor.profile.display_name.clone(),
            photo_url: actor
                .profile
                .photo_or(&self.ctx.placeholder_photo_url)
                .to_string(),
            uid: actor.uid().to_string(),
            text: text.to_string(),
            date: self.ctx.clock.now(),
            parent_id: parent_id.map(str::to_string),
        };
        let key = self
            .store
            .push(&comment_list_path(event_id), to_document(&comment)?)?;
        Ok(key)
    }
}

fn normalize_date(input: &str) -> ServiceResult<DateTime<Utc>> {
    parse_event_date(input).ok_or_else(|| ServiceError::InvalidDate(input.to_string()))
}

/// Field updates writing every user-editable field of `draft`.
fn draft_updates(draft: &EventDraft, date: DateTime<Utc>) -> ServiceResult<Vec<FieldUpdate>> {
    let category = match &draft.category {
        Some(category) => FieldUpdate::set(
            FieldPath::parse("category")?,
            Value::String(category.clone()),
        ),
        None => FieldUpdate::delete(FieldPath::parse("category")?),
    };
    Ok(vec![
        FieldUpdate::set(FieldPath::parse("title")?, draft.title.as_str()),
        category,
        FieldUpdate::set(FieldPath::parse("description")?, draft.description.as_str()),
        FieldUpdate::set(FieldPath::parse("city")?, draft.city.as_str()),
        FieldUpdate::set(FieldPath::parse("venue")?, draft.venue.as_str()),
        FieldUpdate::set(FieldPath::parse("date")?, date.timestamp_millis()),
    ])
}
