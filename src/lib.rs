// Core layer - configuration and shared constants
pub mod core;

// Features layer - all feature modules
pub mod features;

// UI components - list keyboards and the deletion protocol
pub mod message_components;

// Infrastructure - sqlite record store
pub mod database;

// Application layer
pub mod command_handler;
pub mod commands;

// Re-export core config for convenience
pub use core::Config;

// Re-export feature items for convenience
pub use features::{
    // Dialogs
    DialogError, ReplyRouter, ReplySession,
    // Reminders
    EventKind, ReminderScheduler, ScheduledEvent,
};

// Re-export the component handler and deletion outcome
pub use message_components::{DeletionOutcome, MessageComponentHandler};
