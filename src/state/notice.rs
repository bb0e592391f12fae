/// One-shot notifications shown over the gallery
use std::collections::VecDeque;
use std::time::Duration;

use chrono::{DateTime, Local};

/// Oldest notices are dropped beyond this many
const MAX_NOTICES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub id: u64,
    pub kind: NoticeKind,
    pub title: String,
    pub body: String,
    pub posted_at: DateTime<Local>,
}

#[derive(Debug)]
pub struct Notices {
    entries: VecDeque<Notice>,
    next_id: u64,
    ttl: Duration,
}

impl Notices {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: VecDeque::new(),
            next_id: 0,
            ttl,
        }
    }

    pub fn info(&mut self, title: impl Into<String>, body: impl Into<String>) {
        self.push(NoticeKind::Info, title.into(), body.into(), Local::now());
    }

    pub fn error(&mut self, title: impl Into<String>, body: impl Into<String>) {
        self.push(NoticeKind::Error, title.into(), body.into(), Local::now());
    }

    fn push(&mut self, kind: NoticeKind, title: String, body: String, posted_at: DateTime<Local>) {
        self.next_id += 1;
        self.entries.push_back(Notice {
            id: self.next_id,
            kind,
            title,
            body,
            posted_at,
        });

        while self.entries.len() > MAX_NOTICES {
            self.entries.pop_front();
        }
    }

    pub fn dismiss(&mut self, id: u64) {
        self.entries.retain(|notice| notice.id != id);
    }

    /// Drop notices older than the time-to-live
    pub fn expire(&mut self, now: DateTime<Local>) {
        let ttl = chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::MAX);
        self.entries.retain(|notice| now - notice.posted_at < ttl);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
