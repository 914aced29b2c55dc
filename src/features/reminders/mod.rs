//! # Reminders Feature
//!
//! Self-renewing daily reminder scheduling.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

pub mod scheduler;

pub use scheduler::{EventKind, ReminderScheduler, ScheduledEvent};
