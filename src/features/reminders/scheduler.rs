//! Reminder event scheduler
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//!
//! Keeps the set of pending reminder events in memory, keyed by the
//! record's rid so a deletion can cancel its event in O(1). The reminder
//! row in the database is the durable shadow of each event: `reload()`
//! rebuilds the whole schedule from the table at startup, and every firing
//! pushes the row (and the event) one day into the future.

use anyhow::Result;
use chrono::Utc;
use dashmap::DashMap;
use log::{debug, error, info, warn};
use serenity::http::Http;
use serenity::model::id::UserId;
use std::sync::Arc;
use std::time::Duration;

use crate::core::DAY_SECS;
use crate::database::Database;
use crate::message_components::{goal_buttons, GOAL_EMPTY_TEXT, GOAL_LIST_TEXT};

/// What a scheduled event does when it fires.
///
/// Reminders show the owner's goal list; new kinds get a variant here and
/// an arm in `fire`, not a string key in some routing table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    ShowGoals,
}

/// A pending (fire time, payload) entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledEvent {
    pub uid: i64,
    /// Unix timestamp; the event fires at or after this, never before
    pub fire_at: i64,
    pub kind: EventKind,
}

/// In-memory schedule driving reminder delivery
///
/// Cheap to clone; clones share the event arena.
#[derive(Clone)]
pub struct ReminderScheduler {
    database: Database,
    events: Arc<DashMap<String, ScheduledEvent>>,
    tick: Duration,
}

impl ReminderScheduler {
    pub fn new(database: Database, tick: Duration) -> Self {
        ReminderScheduler {
            database,
            events: Arc::new(DashMap::new()),
            tick,
        }
    }

    /// Register (or replace) the pending event for a rid.
    pub fn schedule_at(&self, rid: &str, event: ScheduledEvent) {
        debug!(
            "scheduling {:?} for user {} at {} (rid {rid})",
            event.kind, event.uid, event.fire_at
        );
        self.events.insert(rid.to_string(), event);
    }

    /// Drop the pending event for a rid. Returns false if none was pending.
    pub fn cancel(&self, rid: &str) -> bool {
        self.events.remove(rid).is_some()
    }

    /// Number of events currently pending.
    pub fn pending(&self) -> usize {
        self.events.len()
    }

    pub fn event_for(&self, rid: &str) -> Option<ScheduledEvent> {
        self.events.get(rid).map(|e| e.value().clone())
    }

    /// Rebuild the schedule from the reminders table.
    ///
    /// The sole recovery path after a restart: afterwards every stored
    /// reminder has exactly one pending event at its stored fire time.
    pub async fn reload(&self) -> Result<usize> {
        self.events.clear();
        let reminders = self.database.all_reminders().await?;
        for reminder in &reminders {
            self.schedule_at(
                &reminder.rid,
                ScheduledEvent {
                    uid: reminder.uid,
                    fire_at: reminder.time,
                    kind: EventKind::ShowGoals,
                },
            );
        }
        info!("Reloaded {} reminder(s) into the schedule", reminders.len());
        Ok(reminders.len())
    }

    /// Events whose fire time has elapsed.
    fn due(&self, now: i64) -> Vec<(String, ScheduledEvent)> {
        self.events
            .iter()
            .filter(|entry| entry.value().fire_at <= now)
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// The durable half of one firing cycle: push the record a day forward
    /// and reschedule the in-memory event at the new time.
    ///
    /// Returns the new fire timestamp, or None when the record was deleted
    /// in the meantime; the cycle then ends and the event is dropped.
    pub async fn advance_and_reschedule(&self, rid: &str, uid: i64) -> Result<Option<i64>> {
        match self.database.advance_reminder(rid, DAY_SECS).await? {
            Some(next) => {
                self.schedule_at(
                    rid,
                    ScheduledEvent {
                        uid,
                        fire_at: next,
                        kind: EventKind::ShowGoals,
                    },
                );
                Ok(Some(next))
            }
            None => {
                self.cancel(rid);
                Ok(None)
            }
        }
    }

    /// Tick loop; runs for the life of the process.
    pub async fn run(self, http: Arc<Http>) {
        info!(
            "Reminder scheduler running, {} event(s) pending, tick {:?}",
            self.pending(),
            self.tick
        );
        let mut interval = tokio::time::interval(self.tick);
        loop {
            interval.tick().await;
            let now = Utc::now().timestamp();
            for (rid, event) in self.due(now) {
                if let Err(e) = self.fire(&http, &rid, &event).await {
                    error!("Failed to fire reminder {rid}: {e}");
                }
            }
        }
    }

    async fn fire(&self, http: &Arc<Http>, rid: &str, event: &ScheduledEvent) -> Result<()> {
        match event.kind {
            EventKind::ShowGoals => {
                // The record may have been deleted since this event was
                // scheduled; a missing row means the reminder is gone.
                if self.database.find_reminder(rid).await?.is_none() {
                    warn!("reminder {rid} fired but its record is gone, dropping event");
                    self.cancel(rid);
                    return Ok(());
                }

                self.deliver_goal_list(http, event.uid).await?;

                if let Some(next) = self.advance_and_reschedule(rid, event.uid).await? {
                    debug!("reminder {rid} renewed, next fire at {next}");
                }
            }
        }
        Ok(())
    }

    /// DM the user their current goal list, with delete buttons.
    async fn deliver_goal_list(&self, http: &Arc<Http>, uid: i64) -> Result<()> {
        let dm = UserId(uid as u64).create_dm_channel(http).await?;
        let goals = self.database.goals_for_user(uid).await?;

        if goals.is_empty() {
            dm.say(http, GOAL_EMPTY_TEXT).await?;
        } else {
            dm.id
                .send_message(http, |m| {
                    m.content(GOAL_LIST_TEXT)
                        .set_components(goal_buttons(&goals))
                })
                .await?;
        }
        Ok(())
    }
}
