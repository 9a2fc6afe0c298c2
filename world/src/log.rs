//! Bounded log of human-readable messages.

use std::collections::VecDeque;

use terror_site_core::MESSAGE_LOG_CAPACITY;

#[derive(Clone, Debug, Default)]
pub(crate) struct MessageLog {
    entries: VecDeque<String>,
}

impl MessageLog {
    /// Appends a message, dropping the oldest once the log is full.
    pub(crate) fn push(&mut self, message: String) {
        self.entries.push_back(message);
        while self.entries.len() > MESSAGE_LOG_CAPACITY {
            let _ = self.entries.pop_front();
        }
    }

    /// Messages from oldest to newest.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}
