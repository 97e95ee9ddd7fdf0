//! Core domain logic for Revents.
//! This crate is the single source of truth for event, attendance and
//! comment invariants.

pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod notify;
pub mod service;
pub mod state;
pub mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{
    default_log_level, init_logging, init_logging_from_config, logging_status, LoggingError,
};
pub use model::comment::{build_comment_tree, Comment, CommentNode};
pub use model::event::{AttendeeSummary, Event, EventDraft, EventId};
pub use model::user::{gallery_photos, Actor, Photo, UserIdentity, UserProfile};
pub use notify::{LogNotifier, Notifier, Toast, ToastKind};
pub use service::event_service::{EventService, DASHBOARD_PAGE_SIZE};
pub use service::user_service::UserService;
pub use service::{ServiceContext, ServiceError};
pub use state::{AppAction, AppState, AppStore, AsyncStatus};
pub use store::{DocumentStore, SqliteDocumentStore, StoreError, StoreResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
