//! Codec for encoding and decoding banter frames.
//!
//! The wire format is plain JSON text. WebSocket text frames are already
//! delimited by the transport, so no extra framing is applied; the codec
//! only enforces a frame-size ceiling on inbound data.

use thiserror::Error;

use crate::event::ChatEvent;
use crate::frames::ClientFrame;

/// Maximum inbound frame size (64 KiB).
pub const MAX_FRAME_SIZE: usize = 64 * 1024;

/// Protocol errors that can occur during encoding/decoding.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Frame exceeds maximum size.
    #[error("Frame size {0} exceeds maximum {MAX_FRAME_SIZE}")]
    FrameTooLarge(usize),

    /// JSON encoding or decoding error.
    #[error("Malformed frame: {0}")]
    Json(#[from] serde_json::Error),
}

/// Encode an event for broadcast.
///
/// Produces the bare four-field event object.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode_event(event: &ChatEvent) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(event)?)
}

/// Decode an inbound client frame from JSON text.
///
/// # Errors
///
/// Returns an error if the text exceeds [`MAX_FRAME_SIZE`] or is not a
/// well-formed frame.
pub fn decode_frame(text: &str) -> Result<ClientFrame, ProtocolError> {
    if text.len() > MAX_FRAME_SIZE {
        return Err(ProtocolError::FrameTooLarge(text.len()));
    }

    Ok(serde_json::from_str(text)?)
}
