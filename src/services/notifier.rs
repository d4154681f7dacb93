use std::collections::VecDeque;
use std::sync::Mutex;

use tracing::debug;

use crate::models::notice::Notice;

/// Pending notices for the shell to display.
#[derive(Debug, Default)]
pub struct NoticeQueue {
    pending: Mutex<VecDeque<Notice>>,
}

impl NoticeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, notice: Notice) {
        debug!(
            target: "app::notice",
            title = %notice.title,
            variant = ?notice.variant,
            "notice queued"
        );
        if let Ok(mut pending) = self.pending.lock() {
            pending.push_back(notice);
        }
    }

    pub fn extend<I: IntoIterator<Item = Notice>>(&self, notices: I) {
        for notice in notices {
            self.push(notice);
        }
    }

    /// Takes every pending notice, oldest first.
    pub fn drain(&self) -> Vec<Notice> {
        self.pending
            .lock()
            .map(|mut pending| pending.drain(..).collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.pending.lock().map(|pending| pending.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
