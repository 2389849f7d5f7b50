use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use crate::device::transfer::format_hex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    System,
    Error,
    Received,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub kind: LogKind,
    /// Time since the log was created.
    pub at: Duration,
    pub text: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            LogKind::System => write!(f, "[system] {}", self.text),
            LogKind::Error => write!(f, "[error] {}", self.text),
            LogKind::Received => write!(f, "[{:.2}] RX: {}", self.at.as_secs_f64(), self.text),
        }
    }
}

/// The scrolling receive log. Holds at most `capacity` entries, dropping the oldest.
#[derive(Debug, Clone)]
pub struct ReceiveLog {
    started: Instant,
    capacity: usize,
    entries: VecDeque<LogEntry>,
}

impl ReceiveLog {
    pub fn new(capacity: usize) -> Self {
        ReceiveLog {
            started: Instant::now(),
            capacity: capacity.max(1),
            entries: VecDeque::new(),
        }
    }

    pub fn push_at(&mut self, kind: LogKind, at: Duration, text: String) {
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(LogEntry { kind, at, text });
    }

    fn push(&mut self, kind: LogKind, text: String) {
        let at = self.started.elapsed();
        self.push_at(kind, at, text);
    }

    pub fn system(&mut self, text: impl Into<String>) {
        self.push(LogKind::System, text.into());
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.push(LogKind::Error, text.into());
    }

    pub fn received(&mut self, bytes: &[u8]) {
        self.push(LogKind::Received, format_hex(bytes));
    }

    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.back()
    }
}
