//! Storage interface used by the services.
//!
//! Services only depend on these traits. Two backends implement them:
//! [`postgres::PgStore`] over diesel and [`memory::MemoryStore`] for local
//! runs and tests. Both enforce the same uniqueness rules: one user per
//! email, one profile per user, one decision per (actor, target) and one
//! match per unordered pair.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use tandem_shared::errors::StoreResult;

use crate::models::{Decision, Gender, Interest, Match, Message, Profile, User, UserPair};

pub mod memory;
pub mod postgres;

pub trait UserStore: Send + Sync {
    /// Fails with `UniqueViolation` when the email is taken.
    fn insert_user(&self, user: &User) -> StoreResult<User>;
    fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;
    fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    /// Deletes users whose email ends with `suffix` together with everything
    /// that references them. Returns the number of users removed.
    fn purge_users_by_email_suffix(&self, suffix: &str) -> StoreResult<usize>;
}

pub trait ProfileStore: Send + Sync {
    /// Fails with `UniqueViolation` when the user already has a profile.
    fn insert_profile(&self, profile: &Profile) -> StoreResult<Profile>;
    fn find_profile(&self, user_id: Uuid) -> StoreResult<Option<Profile>>;
    fn update_profile(&self, profile: &Profile) -> StoreResult<Profile>;
    fn find_candidates(&self, query: &CandidateQuery) -> StoreResult<Vec<Profile>>;
}

pub trait DecisionStore: Send + Sync {
    /// Inserts the edge or overwrites the existing one for the same pair.
    fn upsert_decision(&self, decision: &Decision) -> StoreResult<Decision>;
    fn find_decision(&self, actor_id: Uuid, target_id: Uuid) -> StoreResult<Option<Decision>>;
}

pub trait MatchStore: Send + Sync {
    /// Fails with `UniqueViolation` when a match for the pair exists.
    fn insert_match(&self, record: &Match) -> StoreResult<Match>;
    fn find_match(&self, id: Uuid) -> StoreResult<Option<Match>>;
    fn find_match_by_pair(&self, pair: &UserPair) -> StoreResult<Option<Match>>;
    /// Matches involving `user_id`, newest first.
    fn list_matches_for(&self, user_id: Uuid) -> StoreResult<Vec<Match>>;
}

pub trait MessageStore: Send + Sync {
    fn insert_message(&self, message: &Message) -> StoreResult<Message>;
    /// Full history ascending by (created_at, id).
    fn list_messages(&self, match_id: Uuid) -> StoreResult<Vec<Message>>;
    /// Stamps `read_at` on unread messages not sent by `reader_id` and
    /// returns the rows that changed.
    fn mark_read(&self, match_id: Uuid, reader_id: Uuid, at: DateTime<Utc>) -> StoreResult<Vec<Message>>;
    fn count_unread(&self, match_id: Uuid, reader_id: Uuid) -> StoreResult<i64>;
}

/// Everything the API needs from a backend.
pub trait Store: UserStore + ProfileStore + DecisionStore + MatchStore + MessageStore {
    /// Cheap liveness probe for the health endpoint.
    fn ping(&self) -> StoreResult<()>;
}

/// Filter for the swipe deck.
///
/// Admits active profiles other than the requester, not yet decided on by
/// the requester, whose gender the requester wants (`wanted = None` means
/// any) and whose own interests cover the requester's gender.
#[derive(Debug, Clone)]
pub struct CandidateQuery {
    pub requester_id: Uuid,
    pub requester_gender: Gender,
    pub wanted: Option<Vec<Gender>>,
    pub limit: usize,
}

impl CandidateQuery {
    pub fn from_profile(requester: &Profile, limit: usize) -> Self {
        let wanted = if requester.interested_in.contains(&Interest::All) {
            None
        } else {
            Some(
                [Gender::Male, Gender::Female, Gender::Other]
                    .into_iter()
                    .filter(|g| requester.is_interested_in(*g))
                    .collect(),
            )
        };

        Self {
            requester_id: requester.user_id,
            requester_gender: requester.gender,
            wanted,
            limit,
        }
    }

    /// Profile-level part of the filter; the "not yet decided" part needs
    /// the decision table and is applied by the backend.
    pub fn admits(&self, profile: &Profile) -> bool {
        profile.is_active
            && profile.user_id != self.requester_id
            && self
                .wanted
                .as_ref()
                .map_or(true, |genders| genders.contains(&profile.gender))
            && profile.is_interested_in(self.requester_gender)
    }
}
