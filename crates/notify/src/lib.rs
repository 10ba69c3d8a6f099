//! User-facing feedback for the dashboard.
//!
//! A toast queue plus the mapping from channel events to toasts. Auto-dismiss
//! timing is a UI concern; this crate only holds the queue.

pub mod feedback;
pub mod toast;

pub use toast::{Toast, ToastKind, ToastQueue};
