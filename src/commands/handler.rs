//! Chat command handler trait
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use anyhow::Result;
use async_trait::async_trait;
use serenity::model::channel::Message;
use serenity::prelude::Context;
use std::sync::Arc;

use super::context::CommandContext;

/// Trait for chat command handlers
///
/// Commands arrive as slash-prefixed text messages (`/newgoal Run 5k`).
/// Each handler implements this trait for one or more related commands and
/// is dispatched through a [`super::registry::CommandRegistry`] by name.
#[async_trait]
pub trait ChatCommandHandler: Send + Sync {
    /// Command name(s) this handler processes
    fn command_names(&self) -> &'static [&'static str];

    /// (command, help line) pairs rendered by `/help`
    fn descriptions(&self) -> &'static [(&'static str, &'static str)];

    /// Handle one invocation
    ///
    /// # Arguments
    ///
    /// * `ctx` - Shared command context (database, scheduler, dialogs)
    /// * `serenity_ctx` - Serenity context for Discord API calls
    /// * `msg` - The message that carried the command
    /// * `command` - The matched command name, without the slash
    /// * `args` - The rest of the message after the command name
    async fn handle(
        &self,
        ctx: Arc<CommandContext>,
        serenity_ctx: &Context,
        msg: &Message,
        command: &str,
        args: &str,
    ) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Test that the trait is object-safe (can be used with dyn)
    fn _assert_object_safe(_: &dyn ChatCommandHandler) {}
}
