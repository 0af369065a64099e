//! # banter-core
//!
//! Relay operations and topic broker for the banter chat relay.
//!
//! This crate provides the pieces the transport layer glues together:
//!
//! - **Relay** - Accept one inbound event, log it, and hand it back for
//!   broadcast, unchanged
//! - **SessionContext** - Per-connection state, owned by the connection task
//! - **Broker** / **Topic** - In-process registry mapping topic names to
//!   live subscriber channels
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Connection │────▶│    Relay    │────▶│   Broker    │
//! └─────────────┘     └─────────────┘     └──────┬──────┘
//!        ▲                                       │
//!        └──────────────── fan-out ◀─────────────┘
//! ```
//!
//! The relay itself is stateless; the only shared structure is the broker,
//! and the only per-connection state is the caller-owned [`SessionContext`].

pub mod broker;
pub mod relay;
pub mod session;
pub mod topic;

pub use broker::{Broker, BrokerError, BrokerStats};
pub use relay::{relay_join, relay_message};
pub use session::SessionContext;
pub use topic::Topic;
