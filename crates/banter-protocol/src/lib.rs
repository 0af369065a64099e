//! # banter-protocol
//!
//! Wire model and codec for the banter chat relay.
//!
//! This crate defines what travels over the wire between chat clients and
//! the relay: the [`ChatEvent`] payload, the inbound [`ClientFrame`]
//! envelope, and the JSON codec.
//!
//! ## Wire format
//!
//! Frames are JSON text. Inbound frames are tagged with a `type` field
//! naming the submission address (`send` or `join`); outbound broadcasts
//! are the bare four-field event object:
//!
//! ```json
//! {"sender":"alice","content":"hi","timestamp":"...","kind":"MESSAGE"}
//! ```
//!
//! ## Example
//!
//! ```rust
//! use banter_protocol::{codec, ChatEvent, EventKind};
//!
//! let event = ChatEvent::with("alice", "Hello, world!", EventKind::Message);
//! let encoded = codec::encode_event(&event).unwrap();
//! assert!(encoded.contains("\"MESSAGE\""));
//! ```

pub mod codec;
pub mod event;
pub mod frames;

pub use codec::{decode_frame, encode_event, ProtocolError};
pub use event::{ChatEvent, EventKind};
pub use frames::ClientFrame;
