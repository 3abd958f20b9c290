//! Client-side view of one thread.
//!
//! Live events are delivered at least once and inserts and updates are not
//! ordered with respect to each other, so a consumer has to merge them with
//! the history it fetched. [`ThreadView`] does that merge: messages are keyed
//! by id and kept in `(created_at, id)` order, read receipts that arrive
//! before their insert are parked until it shows up, and an optimistic local
//! message is swapped for the stored one once the send is confirmed.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::feed::{LiveEvent, LiveEventKind};
use crate::models::{Message, MessageView};

#[derive(Debug, Clone)]
pub struct ThreadView {
    match_id: Uuid,
    viewer_id: Uuid,
    messages: Vec<Message>,
    /// Local ids of messages shown before the server stored them.
    optimistic: HashSet<Uuid>,
    /// Read receipts for messages this view has not seen yet.
    pending_reads: HashMap<Uuid, DateTime<Utc>>,
}

impl ThreadView {
    pub fn new(match_id: Uuid, viewer_id: Uuid) -> Self {
        Self {
            match_id,
            viewer_id,
            messages: Vec::new(),
            optimistic: HashSet::new(),
            pending_reads: HashMap::new(),
        }
    }

    /// Replaces server state with a freshly fetched history. Optimistic
    /// messages still awaiting confirmation are kept.
    pub fn reconcile(&mut self, history: Vec<Message>) {
        let optimistic = &self.optimistic;
        self.messages.retain(|m| optimistic.contains(&m.id));
        for message in history {
            self.upsert(message);
        }
    }

    /// Applies one live event. Returns whether the view changed.
    pub fn apply(&mut self, event: LiveEvent) -> bool {
        if event.message.match_id != self.match_id {
            return false;
        }
        match event.kind {
            LiveEventKind::Insert => self.upsert(event.message),
            LiveEventKind::Update => {
                let Some(read_at) = event.message.read_at else {
                    return false;
                };
                match self.messages.iter_mut().find(|m| m.id == event.message.id) {
                    Some(existing) if existing.read_at.is_none() => {
                        existing.read_at = Some(read_at);
                        true
                    }
                    Some(_) => false,
                    None => {
                        self.pending_reads.insert(event.message.id, read_at);
                        false
                    }
                }
            }
        }
    }

    /// Shows `content` immediately under a temporary id. Returns that id for
    /// [`ThreadView::confirm_sent`].
    pub fn push_optimistic(&mut self, content: impl Into<String>) -> Uuid {
        let local_id = Uuid::now_v7();
        self.optimistic.insert(local_id);
        self.upsert(Message {
            id: local_id,
            match_id: self.match_id,
            sender_id: self.viewer_id,
            content: content.into(),
            created_at: Utc::now(),
            read_at: None,
        });
        local_id
    }

    /// Swaps the optimistic message for the stored one. Safe to call after
    /// the live insert for `stored` was already applied.
    pub fn confirm_sent(&mut self, local_id: Uuid, stored: Message) {
        if self.optimistic.remove(&local_id) {
            self.messages.retain(|m| m.id != local_id);
        }
        self.upsert(stored);
    }

    /// Drops an optimistic message whose send failed.
    pub fn discard(&mut self, local_id: Uuid) {
        if self.optimistic.remove(&local_id) {
            self.messages.retain(|m| m.id != local_id);
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn views(&self) -> impl Iterator<Item = MessageView> + '_ {
        self.messages
            .iter()
            .map(|m| MessageView::for_viewer(m.clone(), self.viewer_id))
    }

    pub fn is_pending(&self, id: Uuid) -> bool {
        self.optimistic.contains(&id)
    }

    pub fn unread_count(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.sender_id != self.viewer_id && m.read_at.is_none())
            .count()
    }

    fn upsert(&mut self, mut message: Message) -> bool {
        if message.read_at.is_none() {
            message.read_at = self.pending_reads.remove(&message.id);
        } else {
            self.pending_reads.remove(&message.id);
        }

        if let Some(existing) = self.messages.iter_mut().find(|m| m.id == message.id) {
            // read_at is set once; whichever copy has it wins.
            if existing.read_at.is_none() && message.read_at.is_some() {
                existing.read_at = message.read_at;
                return true;
            }
            return false;
        }

        let at = self
            .messages
            .partition_point(|m| m.order_key() < message.order_key());
        self.messages.insert(at, message);
        true
    }
}
