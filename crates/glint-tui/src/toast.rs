//! Transient notifications shown at the bottom of the screen.
//!
//! Toasts expire on the tick sweep rather than on their own timers, so the
//! reducer stays free of wall-clock reads outside of `Tick`.

use std::time::{Duration, Instant};

/// How long a toast stays visible.
const TOAST_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
    created_at: Instant,
}

/// Active toast queue, newest last.
#[derive(Debug, Default)]
pub struct Toasts {
    items: Vec<Toast>,
}

impl Toasts {
    pub fn success(&mut self, message: impl Into<String>) {
        self.push(ToastKind::Success, message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(ToastKind::Error, message.into());
    }

    fn push(&mut self, kind: ToastKind, message: String) {
        self.items.push(Toast {
            kind,
            message,
            created_at: Instant::now(),
        });
    }

    /// Drops expired toasts. Called from the tick handler.
    pub fn sweep(&mut self) {
        self.items.retain(|t| t.created_at.elapsed() < TOAST_TTL);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.items.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
