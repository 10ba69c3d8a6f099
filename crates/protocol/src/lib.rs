//! Wire types for the per-branch WhatsApp channel endpoints.
//!
//! Mirrors the JSON payloads exchanged with the locker backend's
//! messaging-gateway routes.

pub mod constants;
pub mod messages;
pub mod types;

pub use messages::{ChannelCommandAck, ChannelStatusReport};
pub use types::ChannelStatus;
