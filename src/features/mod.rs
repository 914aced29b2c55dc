//! # Features Layer
//!
//! Feature modules for the goalkeeper bot.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

pub mod dialog;
pub mod reminders;
pub mod timeparse;

// Re-export commonly used items
pub use dialog::{DialogError, ReplyRouter, ReplySession};
pub use reminders::{EventKind, ReminderScheduler, ScheduledEvent};
