//! The relay operations.
//!
//! Both operations are synchronous, non-blocking, and stateless: they log
//! the event and return it unchanged for broadcast. No field is altered,
//! nothing is validated, and no sequencing of kinds is enforced. The only
//! side effect beyond logging is the username write into the caller-owned
//! [`SessionContext`] on join.

use banter_protocol::ChatEvent;
use tracing::info;

use crate::session::SessionContext;

/// Relay a chat message.
///
/// Returns the event unchanged, every field identical to the input.
pub fn relay_message(event: ChatEvent) -> ChatEvent {
    info!(sender = %event.sender, content = %event.content, "Relaying chat message");
    event
}

/// Relay a user join, recording the sender into the session context.
///
/// After this call `session.username()` is the event's sender, so a later
/// disconnect can recover which user left. Returns the event unchanged,
/// exactly like [`relay_message`].
pub fn relay_join(event: ChatEvent, session: &mut SessionContext) -> ChatEvent {
    session.set_username(event.sender.clone());
    info!(sender = %event.sender, "User joined");
    event
}
