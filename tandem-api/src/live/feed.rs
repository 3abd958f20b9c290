//! Per-match publish/subscribe.
//!
//! Each match with at least one subscriber owns a `tokio::sync::broadcast`
//! channel. Publishing to a match nobody listens to is a no-op, and the
//! channel is dropped from the registry when its last subscription goes away.

use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use crate::models::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiveEventKind {
    /// A message was stored.
    Insert,
    /// A stored message changed; today that only means `read_at` was set.
    Update,
}

impl LiveEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LiveEventKind::Insert => "insert",
            LiveEventKind::Update => "update",
        }
    }
}

/// Change notification for one message of one match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveEvent {
    #[serde(rename = "type")]
    pub kind: LiveEventKind,
    pub message: Message,
}

impl LiveEvent {
    pub fn insert(message: Message) -> Self {
        Self { kind: LiveEventKind::Insert, message }
    }

    pub fn update(message: Message) -> Self {
        Self { kind: LiveEventKind::Update, message }
    }
}

pub trait MatchFeed: Send + Sync {
    /// Fans `event` out to the current subscribers of `match_id` and returns
    /// how many received it.
    fn publish(&self, match_id: Uuid, event: LiveEvent) -> usize;

    fn subscribe(&self, match_id: Uuid) -> Subscription;

    /// Number of matches with an open channel.
    fn channel_count(&self) -> usize;
}

/// A live receiver for one match. Dropping it unregisters the channel once
/// no other subscriber is left.
pub struct Subscription {
    receiver: broadcast::Receiver<LiveEvent>,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(receiver: broadcast::Receiver<LiveEvent>) -> Self {
        Self { receiver, release: None }
    }

    pub fn on_release(mut self, release: impl FnOnce() + Send + 'static) -> Self {
        self.release = Some(Box::new(release));
        self
    }

    pub async fn recv(&mut self) -> Result<LiveEvent, broadcast::error::RecvError> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Result<LiveEvent, broadcast::error::TryRecvError> {
        self.receiver.try_recv()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        // Runs while our receiver is still counted by the sender.
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

/// In-process feed used by a single API instance.
#[derive(Clone)]
pub struct LocalFeed {
    channels: Arc<DashMap<Uuid, broadcast::Sender<LiveEvent>>>,
    capacity: usize,
}

impl LocalFeed {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: Arc::new(DashMap::new()),
            capacity: capacity.max(1),
        }
    }
}

impl MatchFeed for LocalFeed {
    fn publish(&self, match_id: Uuid, event: LiveEvent) -> usize {
        let Some(tx) = self.channels.get(&match_id) else {
            return 0;
        };
        let delivered = tx.send(event).unwrap_or(0);
        debug!(match_id = %match_id, delivered, "live event published");
        delivered
    }

    fn subscribe(&self, match_id: Uuid) -> Subscription {
        let receiver = self
            .channels
            .entry(match_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe();

        let channels = Arc::clone(&self.channels);
        Subscription::new(receiver).on_release(move || {
            let removed = channels.remove_if(&match_id, |_, tx| tx.receiver_count() <= 1);
            if removed.is_some() {
                debug!(match_id = %match_id, "live channel closed");
            }
        })
    }

    fn channel_count(&self) -> usize {
        self.channels.len()
    }
}
