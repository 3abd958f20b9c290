//! Decision engine.
//!
//! A like is stored before the reciprocal edge is read. Two users liking
//! each other at the same moment therefore cannot both miss the other's
//! like: whichever read runs second sees both edges, and if both see them
//! `ensure_match` collapses the two creations onto one row.

use chrono::Utc;
use metrics::counter;
use serde::Serialize;
use uuid::Uuid;

use tandem_shared::errors::{AppError, AppResult};

use crate::models::{Decision, DecisionAction, PartnerSummary, Profile};
use crate::services::match_service::ensure_match;
use crate::store::Store;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionOutcome {
    pub matched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_match: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner: Option<PartnerSummary>,
}

impl DecisionOutcome {
    fn no_match() -> Self {
        Self {
            matched: false,
            match_id: None,
            new_match: None,
            partner: None,
        }
    }
}

fn active_profile(store: &dyn Store, user_id: Uuid, missing: &str) -> AppResult<Profile> {
    match store.find_profile(user_id)? {
        Some(profile) if profile.is_active => Ok(profile),
        _ => Err(AppError::validation(missing)),
    }
}

pub fn record_decision(
    store: &dyn Store,
    actor_id: Uuid,
    target_id: Uuid,
    action: DecisionAction,
) -> AppResult<DecisionOutcome> {
    if actor_id == target_id {
        return Err(AppError::validation("you cannot swipe on yourself"));
    }
    active_profile(store, actor_id, "complete an active profile before swiping")?;
    let target = active_profile(store, target_id, "target profile is not available")?;

    store.upsert_decision(&Decision {
        actor_id,
        target_id,
        action,
        created_at: Utc::now(),
    })?;
    counter!("tandem_decisions_total", "action" => action.as_str()).increment(1);
    tracing::info!(actor_id = %actor_id, target_id = %target_id, action = action.as_str(), "decision recorded");

    if action != DecisionAction::Like {
        return Ok(DecisionOutcome::no_match());
    }

    let reciprocal = store.find_decision(target_id, actor_id)?;
    if !matches!(reciprocal, Some(Decision { action: DecisionAction::Like, .. })) {
        return Ok(DecisionOutcome::no_match());
    }

    let (record, created) = ensure_match(store, actor_id, target_id)?;
    Ok(DecisionOutcome {
        matched: true,
        match_id: Some(record.id),
        new_match: Some(created),
        partner: Some(target.summary()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gender, Interest};
    use crate::services::test_support::{seed_user, seed_user_with_profile};
    use crate::store::memory::MemoryStore;
    use crate::store::{DecisionStore, MatchStore};
    use tandem_shared::errors::ErrorCode;

    fn couple(store: &MemoryStore) -> (Uuid, Uuid) {
        let alice = seed_user_with_profile(store, "alice@example.com", Gender::Female, &[Interest::Male]);
        let bob = seed_user_with_profile(store, "bob@example.com", Gender::Male, &[Interest::Female]);
        (alice, bob)
    }

    #[test]
    fn one_sided_like_does_not_match() {
        let store = MemoryStore::new();
        let (alice, bob) = couple(&store);
        let outcome = record_decision(&store, alice, bob, DecisionAction::Like).unwrap();
        assert_eq!(outcome, DecisionOutcome::no_match());
    }

    #[test]
    fn mutual_like_matches_and_is_repeatable() {
        let store = MemoryStore::new();
        let (alice, bob) = couple(&store);

        record_decision(&store, alice, bob, DecisionAction::Like).unwrap();
        let outcome = record_decision(&store, bob, alice, DecisionAction::Like).unwrap();
        assert!(outcome.matched);
        assert_eq!(outcome.new_match, Some(true));
        assert_eq!(outcome.partner.as_ref().map(|p| p.user_id), Some(alice));

        let again = record_decision(&store, bob, alice, DecisionAction::Like).unwrap();
        assert!(again.matched);
        assert_eq!(again.match_id, outcome.match_id);
        assert_eq!(again.new_match, Some(false));
        assert_eq!(store.list_matches_for(alice).unwrap().len(), 1);
    }

    #[test]
    fn skip_never_matches() {
        let store = MemoryStore::new();
        let (alice, bob) = couple(&store);

        record_decision(&store, alice, bob, DecisionAction::Like).unwrap();
        let outcome = record_decision(&store, bob, alice, DecisionAction::Skip).unwrap();
        assert!(!outcome.matched);
        assert!(store.list_matches_for(alice).unwrap().is_empty());
    }

    #[test]
    fn later_decision_overwrites_earlier() {
        let store = MemoryStore::new();
        let (alice, bob) = couple(&store);

        record_decision(&store, alice, bob, DecisionAction::Like).unwrap();
        record_decision(&store, alice, bob, DecisionAction::Skip).unwrap();
        let stored = store.find_decision(alice, bob).unwrap().unwrap();
        assert_eq!(stored.action, DecisionAction::Skip);

        let outcome = record_decision(&store, bob, alice, DecisionAction::Like).unwrap();
        assert!(!outcome.matched);
    }

    #[test]
    fn invalid_targets() {
        let store = MemoryStore::new();
        let (alice, _) = couple(&store);
        let ghost = seed_user(&store, "ghost@example.com");

        let own = record_decision(&store, alice, alice, DecisionAction::Like).unwrap_err();
        let missing = record_decision(&store, alice, ghost, DecisionAction::Like).unwrap_err();
        assert_eq!(own.code(), ErrorCode::ValidationError);
        assert_eq!(missing.code(), ErrorCode::ValidationError);
    }

    #[test]
    fn racing_mutual_likes_yield_one_match() {
        let store = MemoryStore::new();
        let (alice, bob) = couple(&store);

        let outcomes = std::thread::scope(|s| {
            let a = s.spawn(|| record_decision(&store, alice, bob, DecisionAction::Like).unwrap());
            let b = s.spawn(|| record_decision(&store, bob, alice, DecisionAction::Like).unwrap());
            [a.join().unwrap(), b.join().unwrap()]
        });

        assert!(outcomes.iter().any(|o| o.matched));
        let ids: Vec<Uuid> = outcomes.iter().filter_map(|o| o.match_id).collect();
        assert!(ids.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(store.list_matches_for(bob).unwrap().len(), 1);
    }
}
