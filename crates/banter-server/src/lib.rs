//! # banter-server
//!
//! The transport collaborator of the banter chat relay: an axum WebSocket
//! server that decodes inbound frames, hands them to the relay, and fans
//! the returned events out to every subscriber of the broadcast topic.

pub mod config;
pub mod handlers;
pub mod metrics;
