use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

pub const NOTIFICATION_TTL: Duration = Duration::from_secs(3);
const HISTORY_LIMIT: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
    #[serde(skip)]
    pub shown_at: Instant,
}

impl Notification {
    pub fn is_live(&self, now: Instant) -> bool {
        now.duration_since(self.shown_at) < NOTIFICATION_TTL
    }
}

/// Transient message queue behind the page's notification banner.
#[derive(Debug, Default)]
pub struct Notifier {
    entries: Mutex<VecDeque<Notification>>,
    total: AtomicU64,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, message: impl Into<String>, kind: NotificationKind) {
        self.push_at(message, kind, Instant::now());
    }

    pub fn push_at(&self, message: impl Into<String>, kind: NotificationKind, now: Instant) {
        let mut entries = self.lock_entries();
        if entries.len() == HISTORY_LIMIT {
            entries.pop_front();
        }
        entries.push_back(Notification {
            message: message.into(),
            kind,
            shown_at: now,
        });
        self.total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.push(message, NotificationKind::Success);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(message, NotificationKind::Error);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.push(message, NotificationKind::Info);
    }

    /// Newest notification still within its display window.
    pub fn current(&self) -> Option<Notification> {
        self.current_at(Instant::now())
    }

    pub fn current_at(&self, now: Instant) -> Option<Notification> {
        self.lock_entries()
            .back()
            .filter(|entry| entry.is_live(now))
            .cloned()
    }

    /// Recent notifications, oldest first.
    pub fn history(&self) -> Vec<Notification> {
        self.lock_entries().iter().cloned().collect()
    }

    /// Number of notifications raised since start.
    pub fn count(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    fn lock_entries(&self) -> std::sync::MutexGuard<'_, VecDeque<Notification>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}
