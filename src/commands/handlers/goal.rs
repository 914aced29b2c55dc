//! Goal command handlers
//!
//! Handles: newgoal, mygoals
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use anyhow::Result;
use async_trait::async_trait;
use log::info;
use serenity::model::channel::Message;
use serenity::prelude::Context;
use std::sync::Arc;

use crate::commands::context::CommandContext;
use crate::commands::handler::ChatCommandHandler;
use crate::commands::handlers::{ask_time, await_text_reply};
use crate::message_components::{goal_buttons, GOAL_EMPTY_TEXT, GOAL_LIST_TEXT};

/// Handler for goal-related commands
pub struct GoalHandler;

#[async_trait]
impl ChatCommandHandler for GoalHandler {
    fn command_names(&self) -> &'static [&'static str] {
        &["newgoal", "mygoals"]
    }

    fn descriptions(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("newgoal", "Used to set a new goal."),
            ("mygoals", "Shows all goals you currently have."),
        ]
    }

    async fn handle(
        &self,
        ctx: Arc<CommandContext>,
        serenity_ctx: &Context,
        msg: &Message,
        command: &str,
        args: &str,
    ) -> Result<()> {
        match command {
            "newgoal" => self.handle_new_goal(&ctx, serenity_ctx, msg, args).await,
            "mygoals" => self.handle_my_goals(&ctx, serenity_ctx, msg).await,
            _ => Ok(()),
        }
    }
}

impl GoalHandler {
    /// `/newgoal [text]` - record a goal and its expiry
    ///
    /// Goal text comes from the command arguments when given, otherwise we
    /// ask for it; the duration is always asked for.
    async fn handle_new_goal(
        &self,
        ctx: &CommandContext,
        serenity_ctx: &Context,
        msg: &Message,
        args: &str,
    ) -> Result<()> {
        let goal = if args.trim().is_empty() {
            match await_text_reply(ctx, serenity_ctx, msg, "What is your goal?").await? {
                Some(text) => text,
                None => return Ok(()),
            }
        } else {
            args.trim().to_string()
        };

        let Some((_, until)) =
            ask_time(ctx, serenity_ctx, msg, "How long do you want this goal for?").await?
        else {
            return Ok(());
        };

        let user_id = msg.author.id.0 as i64;
        let record = ctx
            .database
            .insert_goal(user_id, &goal, until.timestamp())
            .await?;

        info!(
            "user {user_id} added goal {} running until {}",
            record.rid,
            until.to_rfc3339()
        );

        msg.channel_id
            .say(
                &serenity_ctx.http,
                format!(
                    "'{goal}' added to goals until {}",
                    until.format("%Y-%m-%d %H:%M UTC")
                ),
            )
            .await?;
        Ok(())
    }

    /// `/mygoals` - DM the goal list with delete buttons
    ///
    /// Goals can be private, so the list always goes to a direct message.
    async fn handle_my_goals(
        &self,
        ctx: &CommandContext,
        serenity_ctx: &Context,
        msg: &Message,
    ) -> Result<()> {
        let user_id = msg.author.id.0 as i64;
        let goals = ctx.database.goals_for_user(user_id).await?;

        let dm = msg.author.id.create_dm_channel(&serenity_ctx.http).await?;
        if goals.is_empty() {
            dm.say(&serenity_ctx.http, GOAL_EMPTY_TEXT).await?;
        } else {
            dm.id
                .send_message(&serenity_ctx.http, |m| {
                    m.content(GOAL_LIST_TEXT)
                        .set_components(goal_buttons(&goals))
                })
                .await?;
        }

        if msg.guild_id.is_some() {
            msg.channel_id
                .say(&serenity_ctx.http, "📬 Sent you a DM — goals stay private.")
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_goal_handler_commands() {
        let handler = GoalHandler;
        let names = handler.command_names();
        assert!(names.contains(&"newgoal"));
        assert!(names.contains(&"mygoals"));
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn test_every_command_has_a_description() {
        let handler = GoalHandler;
        for name in handler.command_names() {
            assert!(handler.descriptions().iter().any(|(n, _)| n == name));
        }
    }
}
