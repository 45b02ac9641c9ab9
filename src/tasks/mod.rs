//! Background tasks module
//!
//! This module contains the tasks that run alongside the HTTP server.

pub mod countdown;
pub mod phase_notifier;
pub mod tick_source;

// Re-export main items
pub use countdown::countdown_task;
pub use phase_notifier::phase_notifier_task;
pub use tick_source::TickSource;
