//! Command handlers and shared dialog steps
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

pub mod goal;
pub mod reminder;

pub use goal::GoalHandler;
pub use reminder::ReminderHandler;

use anyhow::Result;
use chrono::{DateTime, Utc};
use log::debug;
use serenity::model::channel::Message;
use serenity::prelude::Context;

use crate::commands::context::CommandContext;
use crate::features::dialog::DialogError;
use crate::features::timeparse;

const TIMEOUT_TEXT: &str = "⏱️ Gave up waiting for a reply. Run the command again when you're ready.";
const TIME_RETRY_TEXT: &str =
    "I couldn't understand that time. Try something like `2 weeks`, `6pm` or `tomorrow at 9am`.";
const TIME_GIVE_UP_TEXT: &str = "Still couldn't understand that time, giving up.";

/// One dialog step: send a prompt and capture the user's next message in
/// this channel. Returns None when the dialog ended without a reply (the
/// user was told why, where appropriate).
pub(crate) async fn await_text_reply(
    ctx: &CommandContext,
    serenity_ctx: &Context,
    msg: &Message,
    prompt: &str,
) -> Result<Option<String>> {
    // Open the subscription before prompting so a fast reply cannot slip
    // between the prompt and the listener
    let session = ctx.reply_router.open(msg.author.id.0, msg.channel_id.0);
    msg.channel_id.say(&serenity_ctx.http, prompt).await?;

    match session.await_reply().await {
        Ok(text) => Ok(Some(text)),
        Err(DialogError::TimedOut) => {
            msg.channel_id.say(&serenity_ctx.http, TIMEOUT_TEXT).await?;
            Ok(None)
        }
        Err(DialogError::Superseded) => {
            // The newer dialog owns this conversation now; stay quiet
            debug!(
                "dialog with user {} in channel {} superseded",
                msg.author.id, msg.channel_id
            );
            Ok(None)
        }
    }
}

/// Dialog step that asks for a time phrase and normalizes it, re-prompting
/// once on unparseable input. Returns the accepted raw phrase together
/// with the absolute timestamp.
pub(crate) async fn ask_time(
    ctx: &CommandContext,
    serenity_ctx: &Context,
    msg: &Message,
    prompt: &str,
) -> Result<Option<(String, DateTime<Utc>)>> {
    let Some(reply) = await_text_reply(ctx, serenity_ctx, msg, prompt).await? else {
        return Ok(None);
    };
    if let Some(when) = timeparse::normalize_now(&reply) {
        return Ok(Some((reply, when)));
    }

    let Some(retry) = await_text_reply(ctx, serenity_ctx, msg, TIME_RETRY_TEXT).await? else {
        return Ok(None);
    };
    match timeparse::normalize_now(&retry) {
        Some(when) => Ok(Some((retry, when))),
        None => {
            msg.channel_id
                .say(&serenity_ctx.http, TIME_GIVE_UP_TEXT)
                .await?;
            Ok(None)
        }
    }
}
