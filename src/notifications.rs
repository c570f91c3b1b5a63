//! User-facing notices.
//!
//! Every notice is also logged, so a headless run keeps the same record a
//! UI would have shown.

use serde::Serialize;
use tokio::sync::broadcast;

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A transient, non-blocking message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub description: String,
}

/// Fan-out of notices to any number of subscribers.
///
/// Sending never fails: with no subscribers the notice is only logged.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Notice>,
}

impl Notifier {
    /// Create a notifier buffering up to `capacity` notices per lagging subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribe to notices sent from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }

    /// Publish a notice.
    pub fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info => {
                tracing::info!(title = %notice.title, description = %notice.description, "Notice")
            }
            NoticeLevel::Warning => {
                tracing::warn!(title = %notice.title, description = %notice.description, "Notice")
            }
            NoticeLevel::Error => {
                tracing::error!(title = %notice.title, description = %notice.description, "Notice")
            }
        }
        let _ = self.tx.send(notice);
    }

    pub fn info(&self, title: impl Into<String>, description: impl Into<String>) {
        self.send(NoticeLevel::Info, title, description);
    }

    pub fn warning(&self, title: impl Into<String>, description: impl Into<String>) {
        self.send(NoticeLevel::Warning, title, description);
    }

    pub fn error(&self, title: impl Into<String>, description: impl Into<String>) {
        self.send(NoticeLevel::Error, title, description);
    }

    fn send(&self, level: NoticeLevel, title: impl Into<String>, description: impl Into<String>) {
        self.notify(Notice {
            level,
            title: title.into(),
            description: description.into(),
        });
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(64)
    }
}

/// Drain every notice currently buffered on `rx`.
pub fn drain(rx: &mut broadcast::Receiver<Notice>) -> Vec<Notice> {
    let mut out = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(notice) => out.push(notice),
            Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            Err(_) => return out,
        }
    }
}
