//! Message component handling: list keyboards and the deletion protocol
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//!
//! Every goal/reminder list renders one button per record; the button's
//! `custom_id` carries a serialized [`KeyboardPayload`] naming the record
//! and which table it lives in. Pressing a button runs the deletion
//! protocol: decode, resolve, check ownership, delete, re-render. The
//! protocol is idempotent (a stale button is a silent no-op) and never
//! reveals anything about records the presser does not own.

use anyhow::Result;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serenity::builder::CreateComponents;
use serenity::model::application::component::ButtonStyle;
use serenity::model::application::interaction::message_component::MessageComponentInteraction;
use serenity::model::application::interaction::InteractionResponseType;
use serenity::prelude::Context;

use crate::database::{Database, GoalRecord, ReminderRecord};
use crate::features::reminders::ReminderScheduler;

pub const GOAL_LIST_TEXT: &str = "Your current goals. Click on a goal to remove it.";
pub const GOAL_EMPTY_TEXT: &str = "You have no goals at the moment.";
pub const REMINDER_LIST_TEXT: &str = "Your current reminders. Click on a reminder to remove it.";
pub const REMINDER_EMPTY_TEXT: &str = "You have no reminders at the moment.";

/// Discord allows 5 rows of 5 buttons per message.
const BUTTONS_PER_ROW: usize = 5;
const MAX_LIST_BUTTONS: usize = 25;
/// Discord's button label limit.
const MAX_LABEL_LEN: usize = 80;

/// Which table a button refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyboardKind {
    #[serde(rename = "goal_kb")]
    Goal,
    #[serde(rename = "rmd_kb")]
    Reminder,
}

/// Opaque button payload, serialized into the component `custom_id`
///
/// Decoding is strict: unknown fields or an unknown `name` mean the payload
/// was not issued by this bot and the press is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeyboardPayload {
    pub rid: String,
    pub name: KeyboardKind,
}

impl KeyboardPayload {
    pub fn new(rid: &str, name: KeyboardKind) -> Self {
        KeyboardPayload {
            rid: rid.to_string(),
            name,
        }
    }

    pub fn encode(&self) -> String {
        // Payloads are tiny ({rid, name}); serialization cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn decode(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }
}

/// Outcome of one deletion attempt, kept typed for testability; the end
/// user only ever sees the `Deleted` re-render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionOutcome {
    Deleted,
    /// No record with that rid (never existed, or a faster press won)
    NotFound,
    /// The record belongs to someone else
    NotOwned,
}

/// Build the delete keyboard for a goal list.
pub fn goal_buttons(goals: &[GoalRecord]) -> CreateComponents {
    record_buttons(
        goals.iter().map(|g| (g.item.as_str(), g.rid.as_str())),
        KeyboardKind::Goal,
    )
}

/// Build the delete keyboard for a reminder list.
pub fn reminder_buttons(reminders: &[ReminderRecord]) -> CreateComponents {
    record_buttons(
        reminders.iter().map(|r| (r.item.as_str(), r.rid.as_str())),
        KeyboardKind::Reminder,
    )
}

fn record_buttons<'a>(
    items: impl Iterator<Item = (&'a str, &'a str)>,
    kind: KeyboardKind,
) -> CreateComponents {
    let items: Vec<(&str, &str)> = items.take(MAX_LIST_BUTTONS).collect();

    let mut components = CreateComponents::default();
    for chunk in items.chunks(BUTTONS_PER_ROW) {
        components.create_action_row(|row| {
            for (label, rid) in chunk {
                row.create_button(|button| {
                    button
                        .custom_id(KeyboardPayload::new(rid, kind).encode())
                        .label(truncate_label(label))
                        .style(ButtonStyle::Secondary)
                });
            }
            row
        });
    }
    components
}

fn truncate_label(label: &str) -> String {
    if label.chars().count() <= MAX_LABEL_LEN {
        label.to_string()
    } else {
        let head: String = label.chars().take(MAX_LABEL_LEN - 1).collect();
        format!("{head}…")
    }
}

/// Handler for all message component interactions
pub struct MessageComponentHandler {
    database: Database,
    scheduler: ReminderScheduler,
}

impl MessageComponentHandler {
    pub fn new(database: Database, scheduler: ReminderScheduler) -> Self {
        MessageComponentHandler {
            database,
            scheduler,
        }
    }

    /// Run the deletion protocol for one button press.
    pub async fn handle_component_interaction(
        &self,
        ctx: &Context,
        interaction: &MessageComponentInteraction,
    ) -> Result<()> {
        let Some(payload) = KeyboardPayload::decode(&interaction.data.custom_id) else {
            // Not one of ours; acknowledge so the client stops spinning
            debug!(
                "ignoring component payload not issued by this bot: {}",
                interaction.data.custom_id
            );
            return self.acknowledge(ctx, interaction).await;
        };

        let user_id = interaction.user.id.0 as i64;
        let outcome = self.delete_record(&payload, user_id).await?;

        match outcome {
            DeletionOutcome::Deleted => {
                info!(
                    "deleted {:?} record {} for user {user_id}",
                    payload.name, payload.rid
                );
                self.render_remaining(ctx, interaction, payload.name, user_id)
                    .await
            }
            DeletionOutcome::NotFound => {
                debug!("record {} already deleted", payload.rid);
                self.acknowledge(ctx, interaction).await
            }
            DeletionOutcome::NotOwned => {
                warn!(
                    "user {user_id} pressed a delete button for record {} they do not own",
                    payload.rid
                );
                self.acknowledge(ctx, interaction).await
            }
        }
    }

    /// Resolve, ownership-check and delete one record.
    ///
    /// A lost double-press race surfaces as `NotFound`: the row-count
    /// delete only reports `Deleted` to the press that removed the row.
    async fn delete_record(
        &self,
        payload: &KeyboardPayload,
        user_id: i64,
    ) -> Result<DeletionOutcome> {
        match payload.name {
            KeyboardKind::Goal => {
                let Some(goal) = self.database.find_goal(&payload.rid).await? else {
                    return Ok(DeletionOutcome::NotFound);
                };
                if goal.uid != user_id {
                    return Ok(DeletionOutcome::NotOwned);
                }
                if !self.database.delete_goal(&payload.rid).await? {
                    return Ok(DeletionOutcome::NotFound);
                }
                Ok(DeletionOutcome::Deleted)
            }
            KeyboardKind::Reminder => {
                let Some(reminder) = self.database.find_reminder(&payload.rid).await? else {
                    return Ok(DeletionOutcome::NotFound);
                };
                if reminder.uid != user_id {
                    return Ok(DeletionOutcome::NotOwned);
                }
                if !self.database.delete_reminder(&payload.rid).await? {
                    return Ok(DeletionOutcome::NotFound);
                }
                // The record is gone; its pending event must not fire
                self.scheduler.cancel(&payload.rid);
                Ok(DeletionOutcome::Deleted)
            }
        }
    }

    /// Replace the pressed list with what remains of it.
    async fn render_remaining(
        &self,
        ctx: &Context,
        interaction: &MessageComponentInteraction,
        kind: KeyboardKind,
        user_id: i64,
    ) -> Result<()> {
        let (text, empty_text, components) = match kind {
            KeyboardKind::Goal => {
                let goals = self.database.goals_for_user(user_id).await?;
                let components = (!goals.is_empty()).then(|| goal_buttons(&goals));
                (GOAL_LIST_TEXT, GOAL_EMPTY_TEXT, components)
            }
            KeyboardKind::Reminder => {
                let reminders = self.database.reminders_for_user(user_id).await?;
                let components = (!reminders.is_empty()).then(|| reminder_buttons(&reminders));
                (REMINDER_LIST_TEXT, REMINDER_EMPTY_TEXT, components)
            }
        };

        interaction
            .create_interaction_response(&ctx.http, |response| {
                response
                    .kind(InteractionResponseType::UpdateMessage)
                    .interaction_response_data(|message| match components {
                        Some(buttons) => message.content(text).set_components(buttons),
                        None => message.content(empty_text).components(|c| c),
                    })
            })
            .await?;
        Ok(())
    }

    /// Acknowledge a press without any visible change.
    async fn acknowledge(
        &self,
        ctx: &Context,
        interaction: &MessageComponentInteraction,
    ) -> Result<()> {
        interaction
            .create_interaction_response(&ctx.http, |response| {
                response.kind(InteractionResponseType::DeferredUpdateMessage)
            })
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::reminders::{EventKind, ScheduledEvent};
    use std::time::Duration;

    async fn handler() -> MessageComponentHandler {
        let db = Database::new(":memory:").await.unwrap();
        let scheduler = ReminderScheduler::new(db.clone(), Duration::from_secs(1));
        MessageComponentHandler::new(db, scheduler)
    }

    #[test]
    fn test_payload_round_trip() {
        for kind in [KeyboardKind::Goal, KeyboardKind::Reminder] {
            let payload = KeyboardPayload::new("AbCd", kind);
            let decoded = KeyboardPayload::decode(&payload.encode()).unwrap();
            assert_eq!(decoded, payload);
        }
    }

    #[test]
    fn test_wire_format_matches_names() {
        let encoded = KeyboardPayload::new("AbCd", KeyboardKind::Goal).encode();
        assert_eq!(encoded, r#"{"rid":"AbCd","name":"goal_kb"}"#);
        let encoded = KeyboardPayload::new("AbCd", KeyboardKind::Reminder).encode();
        assert_eq!(encoded, r#"{"rid":"AbCd","name":"rmd_kb"}"#);
    }

    #[test]
    fn test_foreign_payloads_are_rejected() {
        assert!(KeyboardPayload::decode("confirm_shutdown").is_none());
        assert!(KeyboardPayload::decode("").is_none());
        assert!(KeyboardPayload::decode(r#"{"rid":"AbCd","name":"other_kb"}"#).is_none());
        assert!(
            KeyboardPayload::decode(r#"{"rid":"AbCd","name":"goal_kb","extra":1}"#).is_none()
        );
        assert!(KeyboardPayload::decode(r#"{"rid":"AbCd"}"#).is_none());
    }

    #[test]
    fn test_keyboard_layout() {
        let goals: Vec<GoalRecord> = (0..7)
            .map(|i| GoalRecord {
                uid: 1,
                item: format!("goal {i}"),
                until: 0,
                rid: format!("rid{i}"),
            })
            .collect();

        // 7 buttons pack into two rows of at most five
        let components = goal_buttons(&goals);
        assert_eq!(components.0.len(), 2);

        // Oversized lists are capped at the component limit
        let many: Vec<GoalRecord> = (0..40)
            .map(|i| GoalRecord {
                uid: 1,
                item: format!("goal {i}"),
                until: 0,
                rid: format!("r{i}"),
            })
            .collect();
        assert_eq!(goal_buttons(&many).0.len(), MAX_LIST_BUTTONS / BUTTONS_PER_ROW);
    }

    #[test]
    fn test_truncate_label() {
        assert_eq!(truncate_label("Run 5k"), "Run 5k");
        let long = "x".repeat(120);
        assert_eq!(truncate_label(&long).chars().count(), MAX_LABEL_LEN);
    }

    #[tokio::test]
    async fn test_delete_goal_outcomes() {
        let handler = handler().await;
        let goal = handler.database.insert_goal(1, "Run 5k", 0).await.unwrap();
        let payload = KeyboardPayload::new(&goal.rid, KeyboardKind::Goal);

        // A well-formed payload naming someone else's record is refused
        assert_eq!(
            handler.delete_record(&payload, 2).await.unwrap(),
            DeletionOutcome::NotOwned
        );
        assert!(handler.database.find_goal(&goal.rid).await.unwrap().is_some());

        // The owner deletes; a second press of the same button no-ops
        assert_eq!(
            handler.delete_record(&payload, 1).await.unwrap(),
            DeletionOutcome::Deleted
        );
        assert_eq!(
            handler.delete_record(&payload, 1).await.unwrap(),
            DeletionOutcome::NotFound
        );
    }

    #[tokio::test]
    async fn test_delete_reminder_cancels_event() {
        let handler = handler().await;
        let rmd = handler
            .database
            .insert_reminder(1, "6pm", 100)
            .await
            .unwrap();
        handler.scheduler.schedule_at(
            &rmd.rid,
            ScheduledEvent {
                uid: 1,
                fire_at: 100,
                kind: EventKind::ShowGoals,
            },
        );

        let payload = KeyboardPayload::new(&rmd.rid, KeyboardKind::Reminder);
        assert_eq!(
            handler.delete_record(&payload, 1).await.unwrap(),
            DeletionOutcome::Deleted
        );
        // The pending event went with the record
        assert_eq!(handler.scheduler.pending(), 0);
        assert_eq!(
            handler.delete_record(&payload, 1).await.unwrap(),
            DeletionOutcome::NotFound
        );
    }

    #[tokio::test]
    async fn test_goal_lifecycle_ends_at_empty_state() {
        use crate::features::timeparse;
        use chrono::{Duration as ChronoDuration, TimeZone, Utc};

        let handler = handler().await;
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();

        // "/newgoal Run 5k" then "2 weeks"
        let until = timeparse::normalize("2 weeks", now).unwrap();
        assert_eq!(until, now + ChronoDuration::days(14));
        let goal = handler
            .database
            .insert_goal(1, "Run 5k", until.timestamp())
            .await
            .unwrap();

        // "/mygoals" renders one button labeled with the goal text
        let goals = handler.database.goals_for_user(1).await.unwrap();
        assert_eq!(goals.len(), 1);
        let components = goal_buttons(&goals);
        assert_eq!(components.0.len(), 1);
        assert!(components.0[0].to_string().contains("Run 5k"));

        // Pressing the button deletes the goal; the list is now empty
        let payload = KeyboardPayload::new(&goal.rid, KeyboardKind::Goal);
        assert_eq!(
            handler.delete_record(&payload, 1).await.unwrap(),
            DeletionOutcome::Deleted
        );
        assert!(handler.database.goals_for_user(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_unknown_rid_is_not_found() {
        let handler = handler().await;
        let payload = KeyboardPayload::new("zzzz", KeyboardKind::Goal);
        assert_eq!(
            handler.delete_record(&payload, 1).await.unwrap(),
            DeletionOutcome::NotFound
        );
    }
}
