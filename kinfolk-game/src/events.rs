//! Append-only log of narrated occurrences.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Stable, deterministic identifier for a single log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId {
    /// One-based day counter when the entry was written.
    pub day: u32,
    /// Per-day sequence number (0-based).
    pub seq: u16,
}

impl EventId {
    #[must_use]
    pub const fn new(day: u32, seq: u16) -> Self {
        Self { day, seq }
    }
}

/// Short stable tags, e.g. `activity`, `economy`, `achievement`.
pub type EventTags = SmallVec<[String; 2]>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: EventId,
    pub day: u32,
    pub text: String,
    /// Hidden entries stay in the record but are not shown to the player.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub hidden: bool,
    #[serde(default)]
    pub tags: EventTags,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventLog {
    entries: Vec<LogEntry>,
}

impl EventLog {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append a visible entry.
    pub fn record(&mut self, day: u32, text: impl Into<String>, tag: &str) -> EventId {
        self.push(day, text.into(), false, tag)
    }

    /// Append an entry the player does not see.
    pub fn record_hidden(&mut self, day: u32, text: impl Into<String>, tag: &str) -> EventId {
        self.push(day, text.into(), true, tag)
    }

    fn push(&mut self, day: u32, text: String, hidden: bool, tag: &str) -> EventId {
        let seq = self
            .entries
            .iter()
            .rev()
            .take_while(|entry| entry.day == day)
            .count();
        let id = EventId::new(day, u16::try_from(seq).unwrap_or(u16::MAX));
        log::debug!("[day {day}] {text}");
        let mut tags = EventTags::new();
        if !tag.is_empty() {
            tags.push(tag.to_string());
        }
        self.entries.push(LogEntry {
            id,
            day,
            text,
            hidden,
            tags,
        });
        id
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Latest `limit` visible entries, oldest first.
    #[must_use]
    pub fn recent_visible(&self, limit: usize) -> Vec<&LogEntry> {
        let mut recent: Vec<&LogEntry> = self
            .entries
            .iter()
            .rev()
            .filter(|entry| !entry.hidden)
            .take(limit)
            .collect();
        recent.reverse();
        recent
    }

    #[must_use]
    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_restart_each_day() {
        let mut log = EventLog::new();
        assert_eq!(log.record(1, "a", "test"), EventId::new(1, 0));
        assert_eq!(log.record(1, "b", "test"), EventId::new(1, 1));
        assert_eq!(log.record(2, "c", ""), EventId::new(2, 0));
        assert!(log.last().unwrap().tags.is_empty());
    }

    #[test]
    fn hidden_entries_are_kept_but_not_shown() {
        let mut log = EventLog::new();
        log.record(1, "seen", "activity");
        log.record_hidden(1, "secret", "romance");
        log.record(2, "also seen", "activity");
        assert_eq!(log.len(), 3);
        let visible: Vec<&str> = log.recent_visible(20).iter().map(|e| e.text.as_str()).collect();
        assert_eq!(visible, vec!["seen", "also seen"]);
        assert_eq!(log.recent_visible(1)[0].text, "also seen");
    }
}
