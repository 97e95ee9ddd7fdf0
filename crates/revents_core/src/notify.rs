//! User-facing notifications raised by domain operations.

use log::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

impl ToastKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// Short message with a title and a body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub title: String,
    pub body: String,
}

impl Toast {
    pub fn success(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Success,
            title: title.into(),
            body: body.into(),
        }
    }

    pub fn error(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Error,
            title: title.into(),
            body: body.into(),
        }
    }
}

/// Outward notification surface (toasts and confirmation prompts).
pub trait Notifier {
    fn notify(&self, toast: Toast);

    /// Asks the user to confirm `message`; blocks until answered.
    fn confirm(&self, message: &str) -> bool;
}

/// Headless notifier that writes toasts to the log.
///
/// Confirmation prompts are answered with a fixed value.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier {
    confirm_answer: bool,
}

impl LogNotifier {
    pub fn new(confirm_answer: bool) -> Self {
        Self { confirm_answer }
    }
}

impl Notifier for LogNotifier {
    fn notify(&self, toast: Toast) {
        match toast.kind {
            ToastKind::Success => info!(
                "event=toast module=notify kind={} title={}",
                toast.kind.as_str(),
                toast.title
            ),
            ToastKind::Error => warn!(
                "event=toast module=notify kind={} title={}",
                toast.kind.as_str(),
                toast.title
            ),
        }
    }

    fn confirm(&self, _message: &str) -> bool {
        info!(
            "event=confirm module=notify answer={}",
            self.confirm_answer
        );
        self.confirm_answer
    }
}
