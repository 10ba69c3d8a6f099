//! REST client for the backend's per-branch WhatsApp channel routes.
//!
//! Async HTTP client using `reqwest`, with optional Bearer token
//! authentication. Status is the backend's truth; commands only trigger
//! gateway work and are acknowledged with a message.

pub mod client;

pub use client::{Client, Error};
