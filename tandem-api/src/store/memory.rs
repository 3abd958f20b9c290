use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use tandem_shared::errors::{StoreError, StoreResult};

use super::{CandidateQuery, DecisionStore, MatchStore, MessageStore, ProfileStore, Store, UserStore};
use crate::models::{Decision, Match, Message, Profile, User, UserPair};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    profiles: HashMap<Uuid, Profile>,
    decisions: HashMap<(Uuid, Uuid), Decision>,
    matches: HashMap<Uuid, Match>,
    match_pairs: HashMap<UserPair, Uuid>,
    /// Per match, kept sorted by `Message::order_key`.
    messages: HashMap<Uuid, Vec<Message>>,
}

/// Process-local backend. One mutex guards all tables, so every method is
/// atomic with respect to the others, the way a single statement is in
/// Postgres.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".into()))
    }
}

impl UserStore for MemoryStore {
    fn insert_user(&self, user: &User) -> StoreResult<User> {
        let mut t = self.tables()?;
        if t.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::UniqueViolation("users_email_key".into()));
        }
        t.users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.tables()?.users.get(&id).cloned())
    }

    fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.tables()?.users.values().find(|u| u.email == email).cloned())
    }

    fn purge_users_by_email_suffix(&self, suffix: &str) -> StoreResult<usize> {
        let mut t = self.tables()?;
        let doomed: HashSet<Uuid> = t
            .users
            .values()
            .filter(|u| u.email.ends_with(suffix))
            .map(|u| u.id)
            .collect();

        t.users.retain(|id, _| !doomed.contains(id));
        t.profiles.retain(|id, _| !doomed.contains(id));
        t.decisions
            .retain(|(actor, target), _| !doomed.contains(actor) && !doomed.contains(target));

        let dead_matches: Vec<Match> = t
            .matches
            .values()
            .filter(|m| doomed.contains(&m.user_a) || doomed.contains(&m.user_b))
            .cloned()
            .collect();
        for m in dead_matches {
            t.matches.remove(&m.id);
            t.messages.remove(&m.id);
            if let Some(pair) = m.pair() {
                t.match_pairs.remove(&pair);
            }
        }

        Ok(doomed.len())
    }
}

impl ProfileStore for MemoryStore {
    fn insert_profile(&self, profile: &Profile) -> StoreResult<Profile> {
        let mut t = self.tables()?;
        if t.profiles.contains_key(&profile.user_id) {
            return Err(StoreError::UniqueViolation("profiles_pkey".into()));
        }
        t.profiles.insert(profile.user_id, profile.clone());
        Ok(profile.clone())
    }

    fn find_profile(&self, user_id: Uuid) -> StoreResult<Option<Profile>> {
        Ok(self.tables()?.profiles.get(&user_id).cloned())
    }

    fn update_profile(&self, profile: &Profile) -> StoreResult<Profile> {
        let mut t = self.tables()?;
        match t.profiles.get_mut(&profile.user_id) {
            Some(existing) => {
                *existing = profile.clone();
                Ok(profile.clone())
            }
            None => Err(StoreError::Backend(format!("profile {} does not exist", profile.user_id))),
        }
    }

    fn find_candidates(&self, query: &CandidateQuery) -> StoreResult<Vec<Profile>> {
        let t = self.tables()?;
        let mut found: Vec<Profile> = t
            .profiles
            .values()
            .filter(|p| query.admits(p))
            .filter(|p| !t.decisions.contains_key(&(query.requester_id, p.user_id)))
            .cloned()
            .collect();

        found.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        found.truncate(query.limit);
        Ok(found)
    }
}

impl DecisionStore for MemoryStore {
    fn upsert_decision(&self, decision: &Decision) -> StoreResult<Decision> {
        let mut t = self.tables()?;
        t.decisions
            .insert((decision.actor_id, decision.target_id), decision.clone());
        Ok(decision.clone())
    }

    fn find_decision(&self, actor_id: Uuid, target_id: Uuid) -> StoreResult<Option<Decision>> {
        Ok(self.tables()?.decisions.get(&(actor_id, target_id)).cloned())
    }
}

impl MatchStore for MemoryStore {
    fn insert_match(&self, record: &Match) -> StoreResult<Match> {
        let pair = record
            .pair()
            .ok_or_else(|| StoreError::Backend("match participants must differ".into()))?;
        if record.user_a != pair.low() {
            return Err(StoreError::Backend("match pair is not in canonical order".into()));
        }

        let mut t = self.tables()?;
        if t.match_pairs.contains_key(&pair) {
            return Err(StoreError::UniqueViolation("matches_user_a_user_b_key".into()));
        }
        t.match_pairs.insert(pair, record.id);
        t.matches.insert(record.id, record.clone());
        Ok(record.clone())
    }

    fn find_match(&self, id: Uuid) -> StoreResult<Option<Match>> {
        Ok(self.tables()?.matches.get(&id).cloned())
    }

    fn find_match_by_pair(&self, pair: &UserPair) -> StoreResult<Option<Match>> {
        let t = self.tables()?;
        Ok(t.match_pairs.get(pair).and_then(|id| t.matches.get(id)).cloned())
    }

    fn list_matches_for(&self, user_id: Uuid) -> StoreResult<Vec<Match>> {
        let t = self.tables()?;
        let mut found: Vec<Match> = t
            .matches
            .values()
            .filter(|m| m.involves(user_id))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(found)
    }
}

impl MessageStore for MemoryStore {
    fn insert_message(&self, message: &Message) -> StoreResult<Message> {
        let mut t = self.tables()?;
        let thread = t.messages.entry(message.match_id).or_default();
        if thread.iter().any(|m| m.id == message.id) {
            return Err(StoreError::UniqueViolation("messages_pkey".into()));
        }
        let at = thread.partition_point(|m| m.order_key() < message.order_key());
        thread.insert(at, message.clone());
        Ok(message.clone())
    }

    fn list_messages(&self, match_id: Uuid) -> StoreResult<Vec<Message>> {
        Ok(self.tables()?.messages.get(&match_id).cloned().unwrap_or_default())
    }

    fn mark_read(&self, match_id: Uuid, reader_id: Uuid, at: DateTime<Utc>) -> StoreResult<Vec<Message>> {
        let mut t = self.tables()?;
        let Some(thread) = t.messages.get_mut(&match_id) else {
            return Ok(Vec::new());
        };

        let mut changed = Vec::new();
        for m in thread
            .iter_mut()
            .filter(|m| m.sender_id != reader_id && m.read_at.is_none())
        {
            m.read_at = Some(at);
            changed.push(m.clone());
        }
        Ok(changed)
    }

    fn count_unread(&self, match_id: Uuid, reader_id: Uuid) -> StoreResult<i64> {
        let t = self.tables()?;
        let count = t
            .messages
            .get(&match_id)
            .map(|thread| {
                thread
                    .iter()
                    .filter(|m| m.sender_id != reader_id && m.read_at.is_none())
                    .count()
            })
            .unwrap_or(0);
        Ok(count as i64)
    }
}

impl Store for MemoryStore {
    fn ping(&self) -> StoreResult<()> {
        self.tables().map(|_| ())
    }
}
