use chrono::Utc;
use metrics::counter;
use uuid::Uuid;

use tandem_shared::errors::{AppError, AppResult};

use crate::live::{LiveEvent, MatchFeed, Subscription};
use crate::models::{Message, MessageView};
use crate::services::match_service::require_participant;
use crate::store::Store;

pub const MAX_CONTENT_CHARS: usize = 1000;

fn clean_content(content: &str) -> AppResult<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("message cannot be empty"));
    }
    if trimmed.chars().count() > MAX_CONTENT_CHARS {
        return Err(AppError::validation(format!(
            "message must be at most {MAX_CONTENT_CHARS} characters"
        )));
    }
    Ok(trimmed.to_string())
}

pub fn send_message(
    store: &dyn Store,
    feed: &dyn MatchFeed,
    match_id: Uuid,
    sender_id: Uuid,
    content: &str,
) -> AppResult<Message> {
    require_participant(store, match_id, sender_id)?;
    let content = clean_content(content)?;

    let stored = store.insert_message(&Message {
        id: Uuid::now_v7(),
        match_id,
        sender_id,
        content,
        created_at: Utc::now(),
        read_at: None,
    })?;
    counter!("tandem_messages_sent_total").increment(1);

    let delivered = feed.publish(match_id, LiveEvent::insert(stored.clone()));
    tracing::info!(match_id = %match_id, message_id = %stored.id, delivered, "message sent");
    Ok(stored)
}

/// Full history, oldest first, flagged for the caller.
pub fn list_messages(store: &dyn Store, match_id: Uuid, caller_id: Uuid) -> AppResult<Vec<MessageView>> {
    require_participant(store, match_id, caller_id)?;
    Ok(store
        .list_messages(match_id)?
        .into_iter()
        .map(|m| MessageView::for_viewer(m, caller_id))
        .collect())
}

/// Marks the partner's unread messages as read and returns how many
/// changed. Calling it again with nothing unread does nothing.
pub fn mark_read(store: &dyn Store, feed: &dyn MatchFeed, match_id: Uuid, caller_id: Uuid) -> AppResult<usize> {
    require_participant(store, match_id, caller_id)?;

    let changed = store.mark_read(match_id, caller_id, Utc::now())?;
    let count = changed.len();
    for message in changed {
        feed.publish(match_id, LiveEvent::update(message));
    }

    if count > 0 {
        tracing::debug!(match_id = %match_id, reader_id = %caller_id, count, "messages marked read");
    }
    Ok(count)
}

pub fn unread_count(store: &dyn Store, match_id: Uuid, caller_id: Uuid) -> AppResult<i64> {
    require_participant(store, match_id, caller_id)?;
    Ok(store.count_unread(match_id, caller_id)?)
}

pub fn subscribe(store: &dyn Store, feed: &dyn MatchFeed, match_id: Uuid, caller_id: Uuid) -> AppResult<Subscription> {
    require_participant(store, match_id, caller_id)?;
    Ok(feed.subscribe(match_id))
}
