//! # Database Module
//!
//! Sqlite-backed record store for goals and reminders.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! Every record carries a short random `rid` that is unique within its
//! table; the rid is the stable handle buttons and the scheduler use to
//! refer to a record. Deletes report whether a row was actually removed,
//! which is what makes button double-presses idempotent.

use anyhow::{Context, Result};
use log::debug;
use rand::Rng;
use sqlite::State;
use std::sync::Arc;
use tokio::sync::Mutex;

const RID_LEN: usize = 4;
const RID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// A goal the user wants to achieve by some date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalRecord {
    pub uid: i64,
    pub item: String,
    /// Unix timestamp the goal runs until
    pub until: i64,
    pub rid: String,
}

/// A daily-recurring reminder; `time` is the next fire timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderRecord {
    pub uid: i64,
    pub item: String,
    pub time: i64,
    pub rid: String,
}

/// Shared handle to the sqlite store
///
/// Cheap to clone; all clones share one connection behind an async mutex,
/// so every statement runs serialized (single-writer sqlite semantics).
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<sqlite::ConnectionThreadSafe>>,
}

impl Database {
    /// Open (or create) the database and ensure the schema exists.
    pub async fn new(path: &str) -> Result<Self> {
        let conn = sqlite::Connection::open_thread_safe(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS goals (
                uid   INTEGER NOT NULL,
                item  TEXT NOT NULL,
                until INTEGER NOT NULL,
                rid   TEXT NOT NULL UNIQUE
            );
            CREATE TABLE IF NOT EXISTS reminders (
                uid   INTEGER NOT NULL,
                item  TEXT NOT NULL,
                time  INTEGER NOT NULL,
                rid   TEXT NOT NULL UNIQUE
            );",
        )
        .context("failed to create schema")?;

        debug!("Database ready at {path}");
        Ok(Database {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    // --- goals ---

    /// Insert a goal and return the stored record with its fresh rid.
    pub async fn insert_goal(&self, uid: i64, item: &str, until: i64) -> Result<GoalRecord> {
        let conn = self.conn.lock().await;
        let rid = fresh_rid(&conn, "goals")?;

        let mut stmt =
            conn.prepare("INSERT INTO goals (uid, item, until, rid) VALUES (?, ?, ?, ?)")?;
        stmt.bind((1, uid))?;
        stmt.bind((2, item))?;
        stmt.bind((3, until))?;
        stmt.bind((4, rid.as_str()))?;
        stmt.next()?;

        Ok(GoalRecord {
            uid,
            item: item.to_string(),
            until,
            rid,
        })
    }

    /// All goals owned by a user, oldest first.
    pub async fn goals_for_user(&self, uid: i64) -> Result<Vec<GoalRecord>> {
        let conn = self.conn.lock().await;
        let mut stmt =
            conn.prepare("SELECT uid, item, until, rid FROM goals WHERE uid = ? ORDER BY rowid")?;
        stmt.bind((1, uid))?;

        let mut goals = Vec::new();
        while stmt.next()? == State::Row {
            goals.push(GoalRecord {
                uid: stmt.read::<i64, _>("uid")?,
                item: stmt.read::<String, _>("item")?,
                until: stmt.read::<i64, _>("until")?,
                rid: stmt.read::<String, _>("rid")?,
            });
        }
        Ok(goals)
    }

    pub async fn find_goal(&self, rid: &str) -> Result<Option<GoalRecord>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare("SELECT uid, item, until, rid FROM goals WHERE rid = ?")?;
        stmt.bind((1, rid))?;

        if stmt.next()? == State::Row {
            Ok(Some(GoalRecord {
                uid: stmt.read::<i64, _>("uid")?,
                item: stmt.read::<String, _>("item")?,
                until: stmt.read::<i64, _>("until")?,
                rid: stmt.read::<String, _>("rid")?,
            }))
        } else {
            Ok(None)
        }
    }

    /// Delete a goal by rid. Returns false when the row was already gone,
    /// which is how a lost double-press race is observed.
    pub async fn delete_goal(&self, rid: &str) -> Result<bool> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare("DELETE FROM goals WHERE rid = ?")?;
        stmt.bind((1, rid))?;
        stmt.next()?;
        Ok(conn.change_count() > 0)
    }

    // --- reminders ---

    /// Insert a reminder and return the stored record with its fresh rid.
    pub async fn insert_reminder(&self, uid: i64, item: &str, time: i64) -> Result<ReminderRecord> {
        let conn = self.conn.lock().await;
        let rid = fresh_rid(&conn, "reminders")?;

        let mut stmt =
            conn.prepare("INSERT INTO reminders (uid, item, time, rid) VALUES (?, ?, ?, ?)")?;
        stmt.bind((1, uid))?;
        stmt.bind((2, item))?;
        stmt.bind((3, time))?;
        stmt.bind((4, rid.as_str()))?;
        stmt.next()?;

        Ok(ReminderRecord {
            uid,
            item: item.to_string(),
            time,
            rid,
        })
    }

    pub async fn reminders_for_user(&self, uid: i64) -> Result<Vec<ReminderRecord>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare("SELECT uid, item, time, rid FROM reminders WHERE uid = ? ORDER BY rowid")?;
        stmt.bind((1, uid))?;

        let mut reminders = Vec::new();
        while stmt.next()? == State::Row {
            reminders.push(read_reminder(&mut stmt)?);
        }
        Ok(reminders)
    }

    pub async fn find_reminder(&self, rid: &str) -> Result<Option<ReminderRecord>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare("SELECT uid, item, time, rid FROM reminders WHERE rid = ?")?;
        stmt.bind((1, rid))?;

        if stmt.next()? == State::Row {
            Ok(Some(read_reminder(&mut stmt)?))
        } else {
            Ok(None)
        }
    }

    /// Delete a reminder by rid. Returns false when the row was already gone.
    pub async fn delete_reminder(&self, rid: &str) -> Result<bool> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare("DELETE FROM reminders WHERE rid = ?")?;
        stmt.bind((1, rid))?;
        stmt.next()?;
        Ok(conn.change_count() > 0)
    }

    /// Every reminder in the store; used to rebuild the schedule at startup.
    pub async fn all_reminders(&self) -> Result<Vec<ReminderRecord>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare("SELECT uid, item, time, rid FROM reminders ORDER BY rowid")?;

        let mut reminders = Vec::new();
        while stmt.next()? == State::Row {
            reminders.push(read_reminder(&mut stmt)?);
        }
        Ok(reminders)
    }

    /// Push a reminder's fire time forward by `secs` as a single write.
    ///
    /// Returns the new fire timestamp, or None when the record was deleted
    /// in the meantime (the renewal cycle then stops).
    pub async fn advance_reminder(&self, rid: &str, secs: i64) -> Result<Option<i64>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare("UPDATE reminders SET time = time + ? WHERE rid = ?")?;
        stmt.bind((1, secs))?;
        stmt.bind((2, rid))?;
        stmt.next()?;

        if conn.change_count() == 0 {
            return Ok(None);
        }

        let mut stmt = conn.prepare("SELECT time FROM reminders WHERE rid = ?")?;
        stmt.bind((1, rid))?;
        if stmt.next()? == State::Row {
            Ok(Some(stmt.read::<i64, _>("time")?))
        } else {
            Ok(None)
        }
    }
}

fn read_reminder(stmt: &mut sqlite::Statement<'_>) -> Result<ReminderRecord> {
    Ok(ReminderRecord {
        uid: stmt.read::<i64, _>("uid")?,
        item: stmt.read::<String, _>("item")?,
        time: stmt.read::<i64, _>("time")?,
        rid: stmt.read::<String, _>("rid")?,
    })
}

/// Generate a rid not yet present in `table`.
///
/// Four random letters like the classic goal bots used; with 52^4
/// possibilities collisions are rare, but we check anyway.
fn fresh_rid(conn: &sqlite::ConnectionThreadSafe, table: &str) -> Result<String> {
    let mut rng = rand::rng();
    loop {
        let rid: String = (0..RID_LEN)
            .map(|_| RID_ALPHABET[rng.random_range(0..RID_ALPHABET.len())] as char)
            .collect();

        let mut stmt = conn.prepare(&format!("SELECT 1 FROM {table} WHERE rid = ?"))?;
        stmt.bind((1, rid.as_str()))?;
        if stmt.next()? == State::Done {
            return Ok(rid);
        }
        debug!("rid collision on {rid}, regenerating");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DAY_SECS;

    async fn memory_db() -> Database {
        Database::new(":memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_list_goals() {
        let db = memory_db().await;
        let goal = db.insert_goal(1, "Run 5k", 1_000_000).await.unwrap();
        assert_eq!(goal.uid, 1);
        assert_eq!(goal.item, "Run 5k");
        assert_eq!(goal.rid.len(), RID_LEN);

        let goals = db.goals_for_user(1).await.unwrap();
        assert_eq!(goals, vec![goal]);
        assert!(db.goals_for_user(2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rids_are_unique() {
        let db = memory_db().await;
        let mut rids = std::collections::HashSet::new();
        for i in 0..50 {
            let goal = db.insert_goal(1, &format!("goal {i}"), 0).await.unwrap();
            assert!(rids.insert(goal.rid), "duplicate rid issued");
        }
    }

    #[tokio::test]
    async fn test_delete_goal_is_idempotent() {
        let db = memory_db().await;
        let goal = db.insert_goal(1, "Run 5k", 0).await.unwrap();

        assert!(db.delete_goal(&goal.rid).await.unwrap());
        // Second press of the same button loses the race
        assert!(!db.delete_goal(&goal.rid).await.unwrap());
        assert!(db.find_goal(&goal.rid).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_advance_reminder_by_a_day() {
        let db = memory_db().await;
        let rmd = db.insert_reminder(7, "6pm", 500).await.unwrap();

        let next = db.advance_reminder(&rmd.rid, DAY_SECS).await.unwrap();
        assert_eq!(next, Some(500 + DAY_SECS));

        // Only the fire time changes; owner, text and rid stay put
        let stored = db.find_reminder(&rmd.rid).await.unwrap().unwrap();
        assert_eq!(stored.uid, 7);
        assert_eq!(stored.item, "6pm");
        assert_eq!(stored.rid, rmd.rid);
        assert_eq!(stored.time, 500 + DAY_SECS);

        // Two cycles advance by exactly two days, no duplicate rows
        let next = db.advance_reminder(&rmd.rid, DAY_SECS).await.unwrap();
        assert_eq!(next, Some(500 + 2 * DAY_SECS));
        assert_eq!(db.all_reminders().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_advance_deleted_reminder_is_none() {
        let db = memory_db().await;
        let rmd = db.insert_reminder(7, "6pm", 500).await.unwrap();
        assert!(db.delete_reminder(&rmd.rid).await.unwrap());
        assert_eq!(db.advance_reminder(&rmd.rid, DAY_SECS).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_all_reminders_spans_users() {
        let db = memory_db().await;
        db.insert_reminder(1, "9am", 100).await.unwrap();
        db.insert_reminder(2, "6pm", 200).await.unwrap();
        assert_eq!(db.all_reminders().await.unwrap().len(), 2);
        assert_eq!(db.reminders_for_user(1).await.unwrap().len(), 1);
    }
}
