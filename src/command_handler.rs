//! Message-level command dispatch
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//!
//! Every inbound message is first offered to the ReplyRouter — a message
//! some dialog is waiting for belongs to that dialog, not to command
//! parsing. What remains is checked for a `/command` prefix and dispatched
//! through the registry; anything else is ignored.

use anyhow::Result;
use log::debug;
use serenity::model::channel::Message;
use serenity::prelude::Context;
use std::sync::Arc;

use crate::commands::handlers::{GoalHandler, ReminderHandler};
use crate::commands::{ChatCommandHandler, CommandContext, CommandRegistry};
use crate::database::Database;
use crate::features::dialog::ReplyRouter;
use crate::features::reminders::ReminderScheduler;

const USER_HELP: &str = "Used to set goals and help achieve them. As goals \
can often be private they will only ever be posted to private chats with \
the user.";

/// Top-level handler for inbound chat messages
pub struct CommandHandler {
    ctx: Arc<CommandContext>,
    registry: CommandRegistry,
    handlers: Vec<Arc<dyn ChatCommandHandler>>,
}

impl CommandHandler {
    pub fn new(
        database: Database,
        scheduler: ReminderScheduler,
        reply_router: ReplyRouter,
    ) -> Self {
        let handlers: Vec<Arc<dyn ChatCommandHandler>> =
            vec![Arc::new(GoalHandler), Arc::new(ReminderHandler)];

        let mut registry = CommandRegistry::new();
        for handler in &handlers {
            registry.register(Arc::clone(handler));
        }

        CommandHandler {
            ctx: Arc::new(CommandContext::new(database, scheduler, reply_router)),
            registry,
            handlers,
        }
    }

    /// Route one inbound message.
    pub async fn handle_message(&self, serenity_ctx: &Context, msg: &Message) -> Result<()> {
        // Dialog replies take precedence over command parsing
        if self
            .ctx
            .reply_router
            .deliver(msg.author.id.0, msg.channel_id.0, &msg.content)
        {
            debug!(
                "message from user {} in channel {} consumed by a waiting dialog",
                msg.author.id, msg.channel_id
            );
            return Ok(());
        }

        let Some((command, args)) = parse_command(&msg.content) else {
            return Ok(());
        };

        if command == "help" {
            msg.channel_id
                .say(&serenity_ctx.http, self.help_text())
                .await?;
            return Ok(());
        }

        match self.registry.get(&command) {
            Some(handler) => {
                debug!("dispatching /{command} for user {}", msg.author.id);
                handler
                    .handle(Arc::clone(&self.ctx), serenity_ctx, msg, &command, &args)
                    .await
            }
            None => {
                debug!("ignoring unknown command /{command}");
                Ok(())
            }
        }
    }

    fn help_text(&self) -> String {
        let mut text = format!("{USER_HELP}\n");
        for handler in &self.handlers {
            for (name, description) in handler.descriptions() {
                text.push_str(&format!("\n/{name} — {description}"));
            }
        }
        text
    }
}

/// Split `/newgoal Run 5k` into ("newgoal", "Run 5k").
///
/// Returns None for anything that is not a slash command.
fn parse_command(text: &str) -> Option<(String, String)> {
    let rest = text.trim().strip_prefix('/')?;
    let mut parts = rest.splitn(2, char::is_whitespace);

    let name = parts.next()?.to_lowercase();
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }

    let args = parts.next().unwrap_or("").trim().to_string();
    Some((name, args))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn command_handler() -> CommandHandler {
        let db = Database::new(":memory:").await.unwrap();
        let scheduler = ReminderScheduler::new(db.clone(), Duration::from_secs(1));
        let router = ReplyRouter::new(Duration::from_millis(100));
        CommandHandler::new(db, scheduler, router)
    }

    #[test]
    fn test_parse_command() {
        assert_eq!(
            parse_command("/newgoal Run 5k"),
            Some(("newgoal".to_string(), "Run 5k".to_string()))
        );
        assert_eq!(
            parse_command("/mygoals"),
            Some(("mygoals".to_string(), String::new()))
        );
        assert_eq!(
            parse_command("  /NewGoal  spaced  "),
            Some(("newgoal".to_string(), "spaced".to_string()))
        );
    }

    #[test]
    fn test_parse_command_rejects_non_commands() {
        assert_eq!(parse_command("hello"), None);
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("/"), None);
        assert_eq!(parse_command("/not-a-command"), None);
        assert_eq!(parse_command("5/3"), None);
    }

    #[tokio::test]
    async fn test_all_commands_registered() {
        let handler = command_handler().await;
        for name in ["newgoal", "mygoals", "setreminder", "showreminders"] {
            assert!(handler.registry.contains(name), "missing /{name}");
        }
    }

    #[tokio::test]
    async fn test_help_lists_every_command() {
        let handler = command_handler().await;
        let help = handler.help_text();
        for name in ["newgoal", "mygoals", "setreminder", "showreminders"] {
            assert!(help.contains(&format!("/{name}")), "help missing /{name}");
        }
    }
}
