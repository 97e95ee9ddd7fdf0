#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use revents_core::db::open_db_in_memory;
use revents_core::model::attendance::{attendance_ref, AttendanceRecord};
use revents_core::model::event::event_ref;
use revents_core::store::{
    DocRef, Document, DocumentSnapshot, DocumentStore, FieldPath, FieldUpdate, ListEntry,
    PageCursor, Query, SqliteDocumentStore, StoreResult, TransactionOps, WriteBatch,
};
use revents_core::{
    Actor, AppAction, AppStore, Event, EventDraft, EventService, FixedClock, Notifier,
    ServiceContext, Toast, ToastKind, UserIdentity, UserProfile, UserService,
};
use rusqlite::Connection;
use std::cell::Cell;
use std::sync::{Arc, Mutex};

pub const PLACEHOLDER: &str = "/assets/user.png";

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
}

pub fn utc(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

pub fn actor(uid: &str, display_name: &str) -> Actor {
    Actor::new(
        UserIdentity {
            uid: uid.to_string(),
            email: Some(format!("{uid}@example.com")),
        },
        UserProfile::new(display_name),
    )
}

pub fn draft(title: &str, date: &str) -> EventDraft {
    EventDraft {
        title: title.to_string(),
        category: Some("culture".to_string()),
        description: format!("{title} description"),
        city: "London".to_string(),
        venue: "Tower Bridge".to_string(),
        date: date.to_string(),
    }
}

/// Counters for every `DocumentStore` call that reaches the wrapped store.
#[derive(Debug, Default)]
pub struct CallCounts {
    pub add: Cell<usize>,
    pub get: Cell<usize>,
    pub set: Cell<usize>,
    pub update: Cell<usize>,
    pub delete: Cell<usize>,
    pub query: Cell<usize>,
    pub transaction: Cell<usize>,
    pub batch: Cell<usize>,
    pub push: Cell<usize>,
    pub list: Cell<usize>,
}

impl CallCounts {
    pub fn writes(&self) -> usize {
        self.add.get()
            + self.set.get()
            + self.update.get()
            + self.delete.get()
            + self.transaction.get()
            + self.batch.get()
            + self.push.get()
    }
}

fn bump(counter: &Cell<usize>) {
    counter.set(counter.get() + 1);
}

/// Store wrapper that counts calls and can make batches fail on commit.
pub struct RecordingStore<S> {
    inner: S,
    pub calls: CallCounts,
    fail_batches: Cell<bool>,
}

impl<S: DocumentStore> RecordingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            calls: CallCounts::default(),
            fail_batches: Cell::new(false),
        }
    }

    /// Appends an update of a missing document to every committed batch.
    pub fn fail_batches(&self, fail: bool) {
        self.fail_batches.set(fail);
    }

    pub fn reset(&self) {
        for counter in [
            &self.calls.add,
            &self.calls.get,
            &self.calls.set,
            &self.calls.update,
            &self.calls.delete,
            &self.calls.query,
            &self.calls.transaction,
            &self.calls.batch,
            &self.calls.push,
            &self.calls.list,
        ] {
            counter.set(0);
        }
    }
}

impl<S: DocumentStore> DocumentStore for RecordingStore<S> {
    fn add(&self, collection: &str, data: Document) -> StoreResult<DocRef> {
        bump(&self.calls.add);
        self.inner.add(collection, data)
    }

    fn get(&self, reference: &DocRef) -> StoreResult<Option<DocumentSnapshot>> {
        bump(&self.calls.get);
        self.inner.get(reference)
    }

    fn set(&self, reference: &DocRef, data: Document) -> StoreResult<()> {
        bump(&self.calls.set);
        self.inner.set(reference, data)
    }

    fn update(&self, reference: &DocRef, updates: &[FieldUpdate]) -> StoreResult<()> {
        bump(&self.calls.update);
        self.inner.update(reference, updates)
    }

    fn delete(&self, reference: &DocRef) -> StoreResult<()> {
        bump(&self.calls.delete);
        self.inner.delete(reference)
    }

    fn query(&self, query: &Query) -> StoreResult<Vec<DocumentSnapshot>> {
        bump(&self.calls.query);
        self.inner.query(query)
    }

    fn run_transaction<T, F>(&self, operation: F) -> StoreResult<T>
    where
        F: FnOnce(&mut dyn TransactionOps) -> StoreResult<T>,
    {
        bump(&self.calls.transaction);
        self.inner.run_transaction(operation)
    }

    fn commit_batch(&self, batch: WriteBatch) -> StoreResult<()> {
        bump(&self.calls.batch);
        let mut batch = batch;
        if self.fail_batches.get() {
            batch.update(
                event_ref("missing-event"),
                vec![FieldUpdate::set(FieldPath::parse("title")?, "never")],
            );
        }
        self.inner.commit_batch(batch)
    }

    fn push(&self, list: &str, data: Document) -> StoreResult<String> {
        bump(&self.calls.push);
        self.inner.push(list, data)
    }

    fn list(&self, list: &str) -> StoreResult<Vec<ListEntry>> {
        bump(&self.calls.list);
        self.inner.list(list)
    }

    fn cursor_for(
        &self,
        reference: &DocRef,
        order_field: Option<&FieldPath>,
    ) -> StoreResult<Option<PageCursor>> {
        bump(&self.calls.get);
        self.inner.cursor_for(reference, order_field)
    }
}

/// Notifier that records toasts and prompts and answers prompts with a
/// scripted value.
#[derive(Debug)]
pub struct RecordingNotifier {
    toasts: Mutex<Vec<Toast>>,
    prompts: Mutex<Vec<String>>,
    confirm_answer: Mutex<bool>,
}

impl RecordingNotifier {
    pub fn new(confirm_answer: bool) -> Self {
        Self {
            toasts: Mutex::new(Vec::new()),
            prompts: Mutex::new(Vec::new()),
            confirm_answer: Mutex::new(confirm_answer),
        }
    }

    pub fn answer(&self, confirm: bool) {
        *self.confirm_answer.lock().unwrap() = confirm;
    }

    pub fn toasts(&self) -> Vec<Toast> {
        self.toasts.lock().unwrap().clone()
    }

    pub fn last_toast(&self) -> Option<Toast> {
        self.toasts.lock().unwrap().last().cloned()
    }

    pub fn error_toasts(&self) -> Vec<Toast> {
        self.toasts()
            .into_iter()
            .filter(|toast| toast.kind == ToastKind::Error)
            .collect()
    }

    pub fn clear(&self) {
        self.toasts.lock().unwrap().clear();
        self.prompts.lock().unwrap().clear();
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, toast: Toast) {
        self.toasts.lock().unwrap().push(toast);
    }

    fn confirm(&self, message: &str) -> bool {
        self.prompts.lock().unwrap().push(message.to_string());
        *self.confirm_answer.lock().unwrap()
    }
}

/// In-memory database plus recording collaborators for service tests.
pub struct Harness {
    pub conn: Connection,
    pub notifier: Arc<RecordingNotifier>,
    pub app_store: Arc<AppStore>,
    pub clock: Arc<FixedClock>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            conn: open_db_in_memory().unwrap(),
            notifier: Arc::new(RecordingNotifier::new(true)),
            app_store: Arc::new(AppStore::new()),
            clock: Arc::new(FixedClock::new(now())),
        }
    }

    pub fn ctx(&self) -> ServiceContext {
        ServiceContext::new(
            self.notifier.clone(),
            self.app_store.clone(),
            self.clock.clone(),
        )
    }

    pub fn store(&self) -> SqliteDocumentStore<'_> {
        SqliteDocumentStore::try_new(&self.conn).unwrap()
    }

    pub fn recording(&self) -> RecordingStore<SqliteDocumentStore<'_>> {
        RecordingStore::new(self.store())
    }

    pub fn events(&self) -> EventService<SqliteDocumentStore<'_>> {
        EventService::new(self.store(), self.ctx())
    }

    pub fn users(&self) -> UserService<SqliteDocumentStore<'_>> {
        UserService::new(self.store(), self.ctx())
    }

    /// Reads an event straight from storage.
    pub fn event(&self, event_id: &str) -> Event {
        let snapshot = self.store().get(&event_ref(event_id)).unwrap().unwrap();
        Event::from_snapshot(&snapshot).unwrap()
    }

    pub fn attendance(&self, event_id: &str, uid: &str) -> Option<AttendanceRecord> {
        self.store()
            .get(&attendance_ref(event_id, uid))
            .unwrap()
            .map(|snapshot| snapshot.decode().unwrap())
    }

    pub fn actions(&self) -> Vec<AppAction> {
        self.app_store.recent_actions()
    }
}
