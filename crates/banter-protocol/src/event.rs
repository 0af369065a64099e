//! The chat event payload.
//!
//! A [`ChatEvent`] describes one thing that happened in the chat: a user
//! joined, left, or said something. The relay passes events through
//! unmodified; none of the fields are validated or sanitized.

use chrono::Local;
use serde::{Deserialize, Serialize};

/// Why an event was produced.
///
/// The kind is a client-supplied tag. No sequencing is enforced: a client
/// may send `Leave` without ever having joined, or `Message` before `Join`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    Message,
    Join,
    Leave,
}

/// A single chat event.
///
/// All fields are set by the originating client and broadcast verbatim.
/// `sender` and `content` may be empty; `kind` may be unset. The timestamp
/// is an opaque server-local-clock string captured at construction,
/// including when an inbound frame omits it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatEvent {
    /// Identifier of the originating client.
    #[serde(default)]
    pub sender: String,
    /// Free-text payload.
    #[serde(default)]
    pub content: String,
    /// Creation time of the event, as an opaque string.
    #[serde(default = "now_timestamp")]
    pub timestamp: String,
    /// Why the event was produced, if the client said.
    #[serde(default)]
    pub kind: Option<EventKind>,
}

fn now_timestamp() -> String {
    Local::now().to_rfc3339()
}

impl ChatEvent {
    /// Create an empty event with the timestamp set to now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sender: String::new(),
            content: String::new(),
            timestamp: now_timestamp(),
            kind: None,
        }
    }

    /// Create an event with sender, content, and kind supplied.
    ///
    /// The timestamp is still auto-populated.
    #[must_use]
    pub fn with(
        sender: impl Into<String>,
        content: impl Into<String>,
        kind: EventKind,
    ) -> Self {
        Self {
            sender: sender.into(),
            content: content.into(),
            timestamp: now_timestamp(),
            kind: Some(kind),
        }
    }
}

impl Default for ChatEvent {
    fn default() -> Self {
        Self::new()
    }
}
