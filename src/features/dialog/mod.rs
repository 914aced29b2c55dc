//! # Dialog Feature
//!
//! Reply capture for short multi-turn dialogs.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! A command that needs an answer opens a [`ReplySession`] for its
//! (user, channel) pair and awaits the next matching message. The message
//! loop offers every inbound message to the [`ReplyRouter`] before command
//! dispatch; a match consumes the message, anything else propagates.
//! Sessions are one-shot and always carry a timeout, so an abandoned
//! dialog cannot hold its subscription forever.

use dashmap::DashMap;
use log::debug;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::timeout;

type SlotKey = (u64, u64);

struct Slot {
    generation: u64,
    tx: oneshot::Sender<String>,
}

/// Why a dialog ended without a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogError {
    /// No matching message arrived within the configured timeout
    TimedOut,
    /// A newer session for the same (user, channel) pair took over
    Superseded,
}

impl fmt::Display for DialogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DialogError::TimedOut => write!(f, "timed out waiting for a reply"),
            DialogError::Superseded => write!(f, "a newer dialog took over this conversation"),
        }
    }
}

impl std::error::Error for DialogError {}

/// Routes inbound messages to whichever dialog is waiting for them
///
/// Cheap to clone; clones share the slot table. At most one session is
/// live per (user, channel) pair — opening another supersedes the first.
#[derive(Clone)]
pub struct ReplyRouter {
    slots: Arc<DashMap<SlotKey, Slot>>,
    generations: Arc<AtomicU64>,
    reply_timeout: Duration,
}

impl ReplyRouter {
    pub fn new(reply_timeout: Duration) -> Self {
        ReplyRouter {
            slots: Arc::new(DashMap::new()),
            generations: Arc::new(AtomicU64::new(0)),
            reply_timeout,
        }
    }

    /// Open a session that captures the next message `user_id` sends in
    /// `channel_id`. Any session already waiting on that pair is superseded.
    pub fn open(&self, user_id: u64, channel_id: u64) -> ReplySession {
        let generation = self.generations.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();

        let key = (user_id, channel_id);
        if self.slots.insert(key, Slot { generation, tx }).is_some() {
            debug!("superseding open dialog for user {user_id} in channel {channel_id}");
        }

        ReplySession {
            key,
            generation,
            rx,
            slots: Arc::clone(&self.slots),
            reply_timeout: self.reply_timeout,
        }
    }

    /// Offer an inbound message to a waiting session.
    ///
    /// Returns true when a session consumed it; the message must then not
    /// be routed further. Non-matching messages are untouched.
    pub fn deliver(&self, user_id: u64, channel_id: u64, text: &str) -> bool {
        let Some((_, slot)) = self.slots.remove(&(user_id, channel_id)) else {
            return false;
        };
        // A session that died between lookup and send does not consume
        slot.tx.send(text.to_string()).is_ok()
    }

    /// Number of dialogs currently waiting for a reply.
    pub fn open_sessions(&self) -> usize {
        self.slots.len()
    }
}

/// A live subscription for exactly one matching message
pub struct ReplySession {
    key: SlotKey,
    generation: u64,
    rx: oneshot::Receiver<String>,
    slots: Arc<DashMap<SlotKey, Slot>>,
    reply_timeout: Duration,
}

impl ReplySession {
    /// Wait for the next matching message, up to the router's timeout.
    pub async fn await_reply(mut self) -> Result<String, DialogError> {
        match timeout(self.reply_timeout, &mut self.rx).await {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(_)) => Err(DialogError::Superseded),
            Err(_) => Err(DialogError::TimedOut),
        }
    }
}

impl Drop for ReplySession {
    fn drop(&mut self) {
        // Only clear the slot if it still belongs to this session
        self.slots
            .remove_if(&self.key, |_, slot| slot.generation == self.generation);
    }
}
