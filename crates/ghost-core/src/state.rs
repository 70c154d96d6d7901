//! UI-agnostic conversation types
//!
//! These are shared by every front end (the terminal UI and the one-shot `ask`
//! command) and don't depend on any UI framework.

use chrono::{DateTime, Local};
use std::fmt;

/// Identifier of a message, monotonic by creation time within a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageId(u64);

impl MessageId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out message ids derived from wall-clock milliseconds.
///
/// Two messages created in the same millisecond still get distinct ids: the
/// later one takes the previous id plus one.
#[derive(Debug, Default)]
pub struct IdClock {
    last: Option<u64>,
}

impl IdClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_at(&mut self, now: DateTime<Local>) -> MessageId {
        let millis = u64::try_from(now.timestamp_millis()).unwrap_or(0);
        let id = match self.last {
            Some(last) if millis <= last => last + 1,
            _ => millis,
        };
        self.last = Some(id);
        MessageId(id)
    }
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// A chat message in the conversation. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    id: MessageId,
    content: String,
    role: Role,
    timestamp: DateTime<Local>,
}

impl Message {
    pub(crate) fn new(clock: &mut IdClock, role: Role, content: impl Into<String>) -> Self {
        let timestamp = Local::now();
        Self {
            id: clock.next_at(timestamp),
            content: content.into(),
            role,
            timestamp,
        }
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    /// Content that looks like a link is rendered as an image by front ends.
    pub fn is_image(&self) -> bool {
        self.content.starts_with("http")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn ids_follow_the_clock() {
        let mut clock = IdClock::new();
        let t1 = Local.timestamp_millis_opt(1_000).unwrap();
        let t2 = Local.timestamp_millis_opt(5_000).unwrap();

        assert_eq!(clock.next_at(t1).as_u64(), 1_000);
        assert_eq!(clock.next_at(t2).as_u64(), 5_000);
    }

    #[test]
    fn ids_stay_unique_within_one_millisecond() {
        let mut clock = IdClock::new();
        let t = Local.timestamp_millis_opt(42).unwrap();

        let a = clock.next_at(t);
        let b = clock.next_at(t);
        let c = clock.next_at(t);
        assert!(a < b && b < c);
    }

    #[test]
    fn ids_never_go_backwards() {
        let mut clock = IdClock::new();
        let later = Local.timestamp_millis_opt(10_000).unwrap();
        let earlier = Local.timestamp_millis_opt(9_000).unwrap();

        let a = clock.next_at(later);
        let b = clock.next_at(earlier);
        assert_eq!(b.as_u64(), a.as_u64() + 1);
    }

    #[test]
    fn http_content_is_an_image() {
        let mut clock = IdClock::new();
        let image = Message::new(&mut clock, Role::Assistant, "https://cdn.example/cat.png");
        let text = Message::new(&mut clock, Role::Assistant, "see http://example.com");

        assert!(image.is_image());
        assert!(!text.is_image());
    }
}
