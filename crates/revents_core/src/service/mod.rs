//! Domain operations invoked by the presentation layer.
//!
//! # Responsibility
//! - Translate one user intent into document store calls.
//! - Report progress through the `AppStore` and outcomes through the
//!   `Notifier`.
//!
//! # Invariants
//! - Errors stop at the operation boundary: they are logged, surfaced as a
//!   toast and/or async failure, and callers only see `None`/`false`.
//! - The acting user is always an explicit `Actor` argument.

use crate::clock::Clock;
use crate::config::CoreConfig;
use crate::model::DEFAULT_PLACEHOLDER_PHOTO;
use crate::notify::{Notifier, Toast};
use crate::state::{AppAction, AppStore};
use crate::store::StoreError;
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;

pub mod event_service;
pub mod user_service;

const GENERIC_ERROR_TITLE: &str = "Oops";
const GENERIC_ERROR_BODY: &str = "Something went wrong";

/// Error raised inside a domain operation.
#[derive(Debug)]
pub enum ServiceError {
    Store(StoreError),
    /// Date input could not be normalized.
    InvalidDate(String),
    EventNotFound(String),
    /// The current main photo cannot be deleted.
    MainPhotoDeletion,
}

impl ServiceError {
    /// Message safe to show to the user.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidDate(_) => "Please enter a valid date",
            Self::MainPhotoDeletion => "You cannot delete your main photo",
            Self::Store(_) | Self::EventNotFound(_) => GENERIC_ERROR_BODY,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Store(StoreError::NotFound(_)) => "document_not_found",
            Self::Store(StoreError::Db(_)) => "db_error",
            Self::Store(_) => "store_error",
            Self::InvalidDate(_) => "invalid_date",
            Self::EventNotFound(_) => "event_not_found",
            Self::MainPhotoDeletion => "main_photo_deletion",
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::InvalidDate(value) => write!(f, "invalid event date `{value}`"),
            Self::EventNotFound(id) => write!(f, "event not found: {id}"),
            Self::MainPhotoDeletion => write!(f, "main photo cannot be deleted"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Collaborators shared by every domain service.
#[derive(Clone)]
pub struct ServiceContext {
    pub notifier: Arc<dyn Notifier + Send + Sync>,
    pub app_store: Arc<AppStore>,
    pub clock: Arc<dyn Clock + Send + Sync>,
    pub placeholder_photo_url: String,
}

impl ServiceContext {
    pub fn new(
        notifier: Arc<dyn Notifier + Send + Sync>,
        app_store: Arc<AppStore>,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        Self {
            notifier,
            app_store,
            clock,
            placeholder_photo_url: DEFAULT_PLACEHOLDER_PHOTO.to_string(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: &CoreConfig) -> Self {
        self.placeholder_photo_url = config.placeholder_photo_url.clone();
        self
    }
}

/// Whether an operation reports its progress through `AppStore`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusTracking {
    Tracked,
    Untracked,
}

/// Start/finish bookkeeping for one operation invocation.
struct OperationScope<'ctx> {
    ctx: &'ctx ServiceContext,
    event: &'static str,
    tracking: StatusTracking,
    started_at: Instant,
}

impl<'ctx> OperationScope<'ctx> {
    fn begin(ctx: &'ctx ServiceContext, event: &'static str, tracking: StatusTracking) -> Self {
        info!("event={event} module=service status=start");
        if tracking == StatusTracking::Tracked {
            ctx.app_store.dispatch(AppAction::AsyncStart);
        }
        Self {
            ctx,
            event,
            tracking,
            started_at: Instant::now(),
        }
    }

    /// Logs and reports the outcome; `success` is the toast shown on success.
    fn finish<T>(self, result: ServiceResult<T>, success: Option<(&str, &str)>) -> Option<T> {
        let ctx = self.ctx;
        let toast = match &result {
            Ok(_) => success.map(|(title, body)| Toast::success(title, body)),
            Err(err) => Some(Toast::error(GENERIC_ERROR_TITLE, err.user_message())),
        };
        let outcome = self.finish_quietly(result);
        if let Some(toast) = toast {
            ctx.notifier.notify(toast);
        }
        outcome
    }

    /// Like `finish` but without any error toast.
    fn finish_quietly<T>(self, result: ServiceResult<T>) -> Option<T> {
        let ctx = self.ctx;
        let event = self.event;
        let tracking = self.tracking;
        let elapsed = self.started_at.elapsed().as_millis();
        match result {
            Ok(value) => {
                info!("event={event} module=service status=ok duration_ms={elapsed}");
                if tracking == StatusTracking::Tracked {
                    ctx.app_store.dispatch(AppAction::AsyncEnd);
                }
                Some(value)
            }
            Err(err) => {
                error!(
                    "event={event} module=service status=error duration_ms={elapsed} error_code={} error={err}",
                    err.code()
                );
                if tracking == StatusTracking::Tracked {
                    ctx.app_store
                        .dispatch(AppAction::AsyncError(err.user_message().to_string()));
                }
                None
            }
        }
    }
}
