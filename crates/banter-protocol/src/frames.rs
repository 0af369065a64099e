//! Inbound frame types for the banter protocol.
//!
//! A client submits events to one of two named addresses: `send` for a chat
//! message and `join` to announce itself. Both carry a full [`ChatEvent`].

use serde::{Deserialize, Serialize};

use crate::event::ChatEvent;

/// An inbound client frame.
///
/// The `type` tag names the submission address; the event fields are
/// flattened alongside it, so a send frame looks like
/// `{"type":"send","sender":"alice","content":"hi",...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientFrame {
    /// Send a chat message.
    #[serde(rename = "send")]
    Send {
        #[serde(flatten)]
        event: ChatEvent,
    },

    /// Announce a user join.
    #[serde(rename = "join")]
    Join {
        #[serde(flatten)]
        event: ChatEvent,
    },
}

impl ClientFrame {
    /// Create a new Send frame.
    #[must_use]
    pub fn send(event: ChatEvent) -> Self {
        ClientFrame::Send { event }
    }

    /// Create a new Join frame.
    #[must_use]
    pub fn join(event: ChatEvent) -> Self {
        ClientFrame::Join { event }
    }

    /// Borrow the carried event.
    #[must_use]
    pub fn event(&self) -> &ChatEvent {
        match self {
            ClientFrame::Send { event } | ClientFrame::Join { event } => event,
        }
    }

    /// Take ownership of the carried event.
    #[must_use]
    pub fn into_event(self) -> ChatEvent {
        match self {
            ClientFrame::Send { event } | ClientFrame::Join { event } => event,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;

    #[test]
    fn test_frame_tags() {
        let frame = ClientFrame::send(ChatEvent::with("alice", "hi", EventKind::Message));
        let json = serde_json::to_string(&frame).unwrap();
        assert!(json.contains("\"type\":\"send\""));

        let frame = ClientFrame::join(ChatEvent::with("alice", "", EventKind::Join));
        let json = serde_json::to_string(&frame).unwrap();
        assert!(json.contains("\"type\":\"join\""));
    }

    #[test]
    fn test_event_fields_are_flattened() {
        let frame = ClientFrame::send(ChatEvent::with("alice", "hi", EventKind::Message));
        let value = serde_json::to_value(&frame).unwrap();
        // No nested "event" object; the fields sit next to the tag.
        assert_eq!(value["sender"], "alice");
        assert!(value.get("event").is_none());
    }

    #[test]
    fn test_join_without_timestamp_gets_one() {
        let frame: ClientFrame =
            serde_json::from_str(r#"{"type":"join","sender":"bob","kind":"JOIN"}"#).unwrap();
        assert_eq!(frame.event().sender, "bob");
        assert!(!frame.event().timestamp.is_empty());
    }

    #[test]
    fn test_into_event() {
        let event = ChatEvent::with("carol", "hey", EventKind::Message);
        let frame = ClientFrame::send(event.clone());
        assert_eq!(frame.into_event(), event);
    }
}
