//! User-facing notifications.
//!
//! The store reports outcomes ("CS 135 added to Term 2", "Course not
//! found") through a [`Notifier`]. Rendering them is up to the embedder.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    Success,
    Info,
    Warning,
    Error,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// Sink for user-facing messages.
pub trait Notifier: Send + Sync {
    fn notify(&self, kind: NotificationKind, message: &str);
}

// Compile-time assertion: Notifier must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn Notifier) {}
};

/// Forwards notifications to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, kind: NotificationKind, message: &str) {
        match kind {
            NotificationKind::Success | NotificationKind::Info => {
                info!(kind = %kind, "{message}")
            }
            NotificationKind::Warning => warn!(kind = %kind, "{message}"),
            NotificationKind::Error => error!(kind = %kind, "{message}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

/// Records notifications in memory, in the order they were sent.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    entries: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Notification> {
        self.lock().clone()
    }

    /// Remove and return everything recorded so far.
    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.lock())
    }

    pub fn last(&self) -> Option<Notification> {
        self.lock().last().cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Notification>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, kind: NotificationKind, message: &str) {
        self.lock().push(Notification {
            kind,
            message: message.to_owned(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_notifier_records_in_order() {
        let notifier = MemoryNotifier::new();
        notifier.notify(NotificationKind::Success, "CS 135 added to Term 1");
        notifier.notify(NotificationKind::Warning, "Cannot add duplicate CS 135");

        let entries = notifier.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, NotificationKind::Success);
        assert_eq!(
            notifier.last().unwrap().message,
            "Cannot add duplicate CS 135"
        );

        assert_eq!(notifier.take().len(), 2);
        assert!(notifier.entries().is_empty());
    }

    #[test]
    fn tracing_notifier_is_usable_as_trait_object() {
        let sink: Box<dyn Notifier> = Box::new(TracingNotifier);
        sink.notify(NotificationKind::Info, "hello");
    }
}
