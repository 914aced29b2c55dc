//! Shared context for command handlers
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use crate::database::Database;
use crate::features::dialog::ReplyRouter;
use crate::features::reminders::ReminderScheduler;

/// Shared state every command handler needs
///
/// - Database for goal/reminder persistence
/// - ReminderScheduler for registering future firings
/// - ReplyRouter for multi-turn dialogs
#[derive(Clone)]
pub struct CommandContext {
    pub database: Database,
    pub scheduler: ReminderScheduler,
    pub reply_router: ReplyRouter,
}

impl CommandContext {
    pub fn new(
        database: Database,
        scheduler: ReminderScheduler,
        reply_router: ReplyRouter,
    ) -> Self {
        Self {
            database,
            scheduler,
            reply_router,
        }
    }
}
