//! Transient user-facing feedback for operation outcomes.

use serde::Serialize;
use std::sync::{Mutex, MutexGuard};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Notification {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Notification {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

/// Fire-and-forget feedback channel.
pub trait NotificationSink: Send + Sync {
    fn success(&self, message: &str);
    fn error(&self, message: &str);

    fn notify(&self, notification: &Notification) {
        match notification.level {
            NotificationLevel::Success => self.success(&notification.message),
            NotificationLevel::Error => self.error(&notification.message),
        }
    }
}

/// Renders notifications as log events.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn success(&self, message: &str) {
        tracing::info!(target: "oficina_sdk::notify", "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::warn!(target: "oficina_sdk::notify", "{}", message);
    }
}

/// Keeps every notification in order; callers drain it to render or assert on.
#[derive(Debug, Default)]
pub struct NotificationLog {
    entries: Mutex<Vec<Notification>>,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Notification> {
        self.guard().clone()
    }

    pub fn last(&self) -> Option<Notification> {
        self.guard().last().cloned()
    }

    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.guard())
    }

    fn guard(&self) -> MutexGuard<'_, Vec<Notification>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl NotificationSink for NotificationLog {
    fn success(&self, message: &str) {
        self.guard().push(Notification::success(message));
    }

    fn error(&self, message: &str) {
        self.guard().push(Notification::error(message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_keeps_order_and_drains() {
        let log = NotificationLog::new();
        log.success("salvo");
        log.notify(&Notification::error("falhou"));
        assert_eq!(log.last(), Some(Notification::error("falhou")));
        let drained = log.take();
        assert_eq!(drained, vec![Notification::success("salvo"), Notification::error("falhou")]);
        assert!(log.entries().is_empty());
    }

    #[test]
    fn level_serializes_lowercase() {
        let v = serde_json::to_value(Notification::success("ok")).unwrap();
        assert_eq!(v, serde_json::json!({"level": "success", "message": "ok"}));
    }

    #[test]
    fn tracing_sink_is_usable_as_dyn_sink() {
        let sink: std::sync::Arc<dyn NotificationSink> = std::sync::Arc::new(TracingSink);
        sink.success("salvo");
        sink.notify(&Notification::error("falhou"));
    }
}
