//! Match registry.
//!
//! A match is stored once per unordered pair with `user_a < user_b`. Creation
//! never checks-then-inserts under a lock; it inserts and lets the pair
//! constraint pick the winner, so concurrent callers for the same pair all
//! get the first writer's row back.

use chrono::{DateTime, Utc};
use metrics::counter;
use serde::Serialize;
use uuid::Uuid;

use tandem_shared::errors::{AppError, AppResult, StoreError};

use crate::models::{Match, PartnerSummary, UserPair};
use crate::store::Store;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSummary {
    pub id: Uuid,
    pub partner: PartnerSummary,
    pub unread_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Returns the match for the pair, creating it if needed. The flag is true
/// only for the call whose insert created the row.
pub fn ensure_match(store: &dyn Store, a: Uuid, b: Uuid) -> AppResult<(Match, bool)> {
    let pair = UserPair::new(a, b).ok_or_else(|| AppError::validation("a user cannot match with themselves"))?;

    if let Some(existing) = store.find_match_by_pair(&pair)? {
        return Ok((existing, false));
    }

    let candidate = Match {
        id: Uuid::now_v7(),
        user_a: pair.low(),
        user_b: pair.high(),
        created_at: Utc::now(),
    };

    match store.insert_match(&candidate) {
        Ok(created) => {
            counter!("tandem_matches_created_total").increment(1);
            tracing::info!(match_id = %created.id, user_a = %created.user_a, user_b = %created.user_b, "match created");
            Ok((created, true))
        }
        Err(StoreError::UniqueViolation(_)) => {
            tracing::debug!(user_a = %pair.low(), user_b = %pair.high(), "match insert lost race");
            let existing = store
                .find_match_by_pair(&pair)?
                .ok_or_else(|| AppError::internal("match missing after pair constraint violation"))?;
            Ok((existing, false))
        }
        Err(e) => Err(e.into()),
    }
}

/// Loads a match the caller participates in.
pub fn require_participant(store: &dyn Store, match_id: Uuid, caller_id: Uuid) -> AppResult<Match> {
    let record = store
        .find_match(match_id)?
        .ok_or_else(|| AppError::not_found("match not found"))?;
    if !record.involves(caller_id) {
        return Err(AppError::forbidden("you are not a participant of this match"));
    }
    Ok(record)
}

pub fn partner_summary(store: &dyn Store, partner_id: Uuid) -> AppResult<PartnerSummary> {
    store
        .find_profile(partner_id)?
        .map(|p| p.summary())
        .ok_or_else(|| AppError::not_found("partner profile not found"))
}

fn summarize(store: &dyn Store, record: &Match, caller_id: Uuid) -> AppResult<MatchSummary> {
    let partner_id = record
        .partner_of(caller_id)
        .ok_or_else(|| AppError::forbidden("you are not a participant of this match"))?;
    Ok(MatchSummary {
        id: record.id,
        partner: partner_summary(store, partner_id)?,
        unread_count: store.count_unread(record.id, caller_id)?,
        created_at: record.created_at,
    })
}

pub fn get_match(store: &dyn Store, match_id: Uuid, caller_id: Uuid) -> AppResult<MatchSummary> {
    let record = require_participant(store, match_id, caller_id)?;
    summarize(store, &record, caller_id)
}

/// The caller's matches, newest first.
pub fn list_matches(store: &dyn Store, caller_id: Uuid) -> AppResult<Vec<MatchSummary>> {
    store
        .list_matches_for(caller_id)?
        .iter()
        .map(|m| summarize(store, m, caller_id))
        .collect()
}
