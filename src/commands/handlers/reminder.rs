//! Reminder command handlers
//!
//! Handles: setreminder, showreminders
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use anyhow::Result;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use log::info;
use serenity::model::channel::Message;
use serenity::prelude::Context;
use std::sync::Arc;

use crate::commands::context::CommandContext;
use crate::commands::handler::ChatCommandHandler;
use crate::commands::handlers::ask_time;
use crate::features::reminders::{EventKind, ScheduledEvent};
use crate::message_components::{reminder_buttons, REMINDER_EMPTY_TEXT, REMINDER_LIST_TEXT};

/// Handler for reminder-related commands
pub struct ReminderHandler;

#[async_trait]
impl ChatCommandHandler for ReminderHandler {
    fn command_names(&self) -> &'static [&'static str] {
        &["setreminder", "showreminders"]
    }

    fn descriptions(&self) -> &'static [(&'static str, &'static str)] {
        &[
            (
                "setreminder",
                "Sets times at which you will be reminded of your goals.",
            ),
            ("showreminders", "Show all reminders you have set."),
        ]
    }

    async fn handle(
        &self,
        ctx: Arc<CommandContext>,
        serenity_ctx: &Context,
        msg: &Message,
        command: &str,
        _args: &str,
    ) -> Result<()> {
        match command {
            "setreminder" => self.handle_set_reminder(&ctx, serenity_ctx, msg).await,
            "showreminders" => self.handle_show_reminders(&ctx, serenity_ctx, msg).await,
            _ => Ok(()),
        }
    }
}

impl ReminderHandler {
    /// `/setreminder` - ask for a time, persist the reminder and schedule
    /// its first firing; after that it renews itself daily.
    async fn handle_set_reminder(
        &self,
        ctx: &CommandContext,
        serenity_ctx: &Context,
        msg: &Message,
    ) -> Result<()> {
        let Some((phrase, when)) = ask_time(
            ctx,
            serenity_ctx,
            msg,
            "What time would you like to be reminded of your goals?",
        )
        .await?
        else {
            return Ok(());
        };

        let user_id = msg.author.id.0 as i64;
        let fire_at = when.timestamp();
        // The stored record keeps the raw phrase; the schedule keeps the
        // absolute timestamp
        let record = ctx
            .database
            .insert_reminder(user_id, &phrase, fire_at)
            .await?;
        ctx.scheduler.schedule_at(
            &record.rid,
            ScheduledEvent {
                uid: user_id,
                fire_at,
                kind: EventKind::ShowGoals,
            },
        );

        info!(
            "user {user_id} set reminder {} firing at {fire_at}",
            record.rid
        );

        msg.channel_id
            .say(
                &serenity_ctx.http,
                format!(
                    "⏰ Reminder set for {}. I'll show your goals then, and every day after.",
                    format_fire_time(fire_at)
                ),
            )
            .await?;
        Ok(())
    }

    /// `/showreminders` - DM the reminder list with delete buttons.
    async fn handle_show_reminders(
        &self,
        ctx: &CommandContext,
        serenity_ctx: &Context,
        msg: &Message,
    ) -> Result<()> {
        let user_id = msg.author.id.0 as i64;
        let reminders = ctx.database.reminders_for_user(user_id).await?;

        let dm = msg.author.id.create_dm_channel(&serenity_ctx.http).await?;
        if reminders.is_empty() {
            dm.say(&serenity_ctx.http, REMINDER_EMPTY_TEXT).await?;
        } else {
            dm.id
                .send_message(&serenity_ctx.http, |m| {
                    m.content(REMINDER_LIST_TEXT)
                        .set_components(reminder_buttons(&reminders))
                })
                .await?;
        }
        Ok(())
    }
}

fn format_fire_time(fire_at: i64) -> String {
    match Utc.timestamp_opt(fire_at, 0).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M UTC").to_string(),
        None => fire_at.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reminder_handler_commands() {
        let handler = ReminderHandler;
        let names = handler.command_names();
        assert!(names.contains(&"setreminder"));
        assert!(names.contains(&"showreminders"));
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn test_format_fire_time() {
        assert_eq!(format_fire_time(0), "1970-01-01 00:00 UTC");
        // Out-of-range timestamps fall back to the raw number
        assert_eq!(format_fire_time(i64::MAX), i64::MAX.to_string());
    }
}
