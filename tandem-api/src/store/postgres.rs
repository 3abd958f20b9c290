use chrono::{DateTime, NaiveDate, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use uuid::Uuid;

use tandem_shared::clients::db::DbPool;
use tandem_shared::errors::{StoreError, StoreResult};

use super::{CandidateQuery, DecisionStore, MatchStore, MessageStore, ProfileStore, Store, UserStore};
use crate::models::{Decision, Gender, Interest, Match, Message, Profile, User, UserPair};
use crate::schema::{decisions, matches, messages, profiles, users};

/// Diesel backend. Every method runs one statement on a pooled connection;
/// the constraints in `migrations/` carry the uniqueness guarantees.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> StoreResult<PooledConnection<ConnectionManager<PgConnection>>> {
        Ok(self.pool.get()?)
    }
}

// --- Rows ---

#[derive(Debug, Queryable, Insertable)]
#[diesel(table_name = users)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    email_verified: bool,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl From<&User> for UserRow {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            email: u.email.clone(),
            password_hash: u.password_hash.clone(),
            email_verified: u.email_verified,
            is_active: u.is_active,
            created_at: u.created_at,
        }
    }
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        Self {
            id: r.id,
            email: r.email,
            password_hash: r.password_hash,
            email_verified: r.email_verified,
            is_active: r.is_active,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Queryable, Insertable)]
#[diesel(table_name = profiles)]
struct ProfileRow {
    user_id: Uuid,
    nickname: String,
    birthdate: NaiveDate,
    gender: String,
    interested_in: Vec<String>,
    bio: Option<String>,
    photo_urls: Vec<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<&Profile> for ProfileRow {
    fn from(p: &Profile) -> Self {
        Self {
            user_id: p.user_id,
            nickname: p.nickname.clone(),
            birthdate: p.birthdate,
            gender: p.gender.as_str().to_string(),
            interested_in: p.interested_in.iter().map(|i| i.as_str().to_string()).collect(),
            bio: p.bio.clone(),
            photo_urls: p.photo_urls.clone(),
            is_active: p.is_active,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

impl TryFrom<ProfileRow> for Profile {
    type Error = StoreError;

    fn try_from(r: ProfileRow) -> Result<Self, Self::Error> {
        let corrupt = |e: String| StoreError::Backend(format!("profile {}: {e}", r.user_id));
        let gender = r.gender.parse::<Gender>().map_err(corrupt)?;
        let interested_in = r
            .interested_in
            .iter()
            .map(|s| s.parse::<Interest>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(corrupt)?;

        Ok(Self {
            user_id: r.user_id,
            nickname: r.nickname,
            birthdate: r.birthdate,
            gender,
            interested_in,
            bio: r.bio,
            photo_urls: r.photo_urls,
            is_active: r.is_active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

fn profiles_from_rows(rows: Vec<ProfileRow>) -> StoreResult<Vec<Profile>> {
    rows.into_iter().map(Profile::try_from).collect()
}

#[derive(Debug, Queryable, Insertable)]
#[diesel(table_name = decisions)]
struct DecisionRow {
    actor_id: Uuid,
    target_id: Uuid,
    action: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<DecisionRow> for Decision {
    type Error = StoreError;

    fn try_from(r: DecisionRow) -> Result<Self, Self::Error> {
        let action = r
            .action
            .parse()
            .map_err(|e: String| StoreError::Backend(format!("decision {}->{}: {e}", r.actor_id, r.target_id)))?;
        Ok(Self {
            actor_id: r.actor_id,
            target_id: r.target_id,
            action,
            created_at: r.created_at,
        })
    }
}

#[derive(Debug, Queryable, Insertable)]
#[diesel(table_name = matches)]
struct MatchRow {
    id: Uuid,
    user_a: Uuid,
    user_b: Uuid,
    created_at: DateTime<Utc>,
}

impl From<MatchRow> for Match {
    fn from(r: MatchRow) -> Self {
        Self {
            id: r.id,
            user_a: r.user_a,
            user_b: r.user_b,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Queryable, Insertable)]
#[diesel(table_name = messages)]
struct MessageRow {
    id: Uuid,
    match_id: Uuid,
    sender_id: Uuid,
    content: String,
    created_at: DateTime<Utc>,
    read_at: Option<DateTime<Utc>>,
}

impl From<&Message> for MessageRow {
    fn from(m: &Message) -> Self {
        Self {
            id: m.id,
            match_id: m.match_id,
            sender_id: m.sender_id,
            content: m.content.clone(),
            created_at: m.created_at,
            read_at: m.read_at,
        }
    }
}

impl From<MessageRow> for Message {
    fn from(r: MessageRow) -> Self {
        Self {
            id: r.id,
            match_id: r.match_id,
            sender_id: r.sender_id,
            content: r.content,
            created_at: r.created_at,
            read_at: r.read_at,
        }
    }
}

/// Escapes LIKE metacharacters so `suffix` matches literally.
fn like_suffix(suffix: &str) -> String {
    let escaped = suffix
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}")
}

// --- Users ---

impl UserStore for PgStore {
    fn insert_user(&self, user: &User) -> StoreResult<User> {
        let mut conn = self.conn()?;
        let row = diesel::insert_into(users::table)
            .values(UserRow::from(user))
            .get_result::<UserRow>(&mut conn)?;
        Ok(row.into())
    }

    fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let mut conn = self.conn()?;
        let row = users::table
            .find(id)
            .first::<UserRow>(&mut conn)
            .optional()?;
        Ok(row.map(User::from))
    }

    fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let mut conn = self.conn()?;
        let row = users::table
            .filter(users::email.eq(email))
            .first::<UserRow>(&mut conn)
            .optional()?;
        Ok(row.map(User::from))
    }

    fn purge_users_by_email_suffix(&self, suffix: &str) -> StoreResult<usize> {
        let mut conn = self.conn()?;
        // Profiles, decisions, matches and messages go with ON DELETE CASCADE.
        let deleted = diesel::delete(users::table.filter(users::email.like(like_suffix(suffix))))
            .execute(&mut conn)?;
        Ok(deleted)
    }
}

// --- Profiles ---

impl ProfileStore for PgStore {
    fn insert_profile(&self, profile: &Profile) -> StoreResult<Profile> {
        let mut conn = self.conn()?;
        let row = diesel::insert_into(profiles::table)
            .values(ProfileRow::from(profile))
            .get_result::<ProfileRow>(&mut conn)?;
        row.try_into()
    }

    fn find_profile(&self, user_id: Uuid) -> StoreResult<Option<Profile>> {
        let mut conn = self.conn()?;
        profiles::table
            .find(user_id)
            .first::<ProfileRow>(&mut conn)
            .optional()?
            .map(Profile::try_from)
            .transpose()
    }

    fn update_profile(&self, profile: &Profile) -> StoreResult<Profile> {
        let mut conn = self.conn()?;
        let row = ProfileRow::from(profile);
        let updated = diesel::update(profiles::table.find(row.user_id))
            .set((
                profiles::nickname.eq(&row.nickname),
                profiles::birthdate.eq(row.birthdate),
                profiles::gender.eq(&row.gender),
                profiles::interested_in.eq(&row.interested_in),
                profiles::bio.eq(&row.bio),
                profiles::photo_urls.eq(&row.photo_urls),
                profiles::is_active.eq(row.is_active),
                profiles::updated_at.eq(row.updated_at),
            ))
            .get_result::<ProfileRow>(&mut conn)?;
        updated.try_into()
    }

    fn find_candidates(&self, query: &CandidateQuery) -> StoreResult<Vec<Profile>> {
        let mut conn = self.conn()?;

        let decided = decisions::table
            .filter(decisions::actor_id.eq(query.requester_id))
            .select(decisions::target_id);

        let accepts_requester = vec![
            query.requester_gender.as_str().to_string(),
            Interest::All.as_str().to_string(),
        ];

        let mut sql = profiles::table
            .filter(profiles::is_active.eq(true))
            .filter(profiles::user_id.ne(query.requester_id))
            .filter(diesel::dsl::not(profiles::user_id.eq_any(decided)))
            .filter(profiles::interested_in.overlaps_with(accepts_requester))
            .into_boxed();

        if let Some(wanted) = &query.wanted {
            let genders: Vec<&str> = wanted.iter().map(Gender::as_str).collect();
            sql = sql.filter(profiles::gender.eq_any(genders));
        }

        let rows = sql
            .order((profiles::created_at.desc(), profiles::user_id.asc()))
            .limit(query.limit as i64)
            .load::<ProfileRow>(&mut conn)?;
        profiles_from_rows(rows)
    }
}

// --- Decisions ---

impl DecisionStore for PgStore {
    fn upsert_decision(&self, decision: &Decision) -> StoreResult<Decision> {
        let mut conn = self.conn()?;
        let row = DecisionRow {
            actor_id: decision.actor_id,
            target_id: decision.target_id,
            action: decision.action.as_str().to_string(),
            created_at: decision.created_at,
        };

        let stored = diesel::insert_into(decisions::table)
            .values(&row)
            .on_conflict((decisions::actor_id, decisions::target_id))
            .do_update()
            .set((
                decisions::action.eq(&row.action),
                decisions::created_at.eq(row.created_at),
            ))
            .get_result::<DecisionRow>(&mut conn)?;
        stored.try_into()
    }

    fn find_decision(&self, actor_id: Uuid, target_id: Uuid) -> StoreResult<Option<Decision>> {
        let mut conn = self.conn()?;
        decisions::table
            .find((actor_id, target_id))
            .first::<DecisionRow>(&mut conn)
            .optional()?
            .map(Decision::try_from)
            .transpose()
    }
}

// --- Matches ---

impl MatchStore for PgStore {
    fn insert_match(&self, record: &Match) -> StoreResult<Match> {
        let mut conn = self.conn()?;
        let row = diesel::insert_into(matches::table)
            .values(MatchRow {
                id: record.id,
                user_a: record.user_a,
                user_b: record.user_b,
                created_at: record.created_at,
            })
            .get_result::<MatchRow>(&mut conn)?;
        Ok(row.into())
    }

    fn find_match(&self, id: Uuid) -> StoreResult<Option<Match>> {
        let mut conn = self.conn()?;
        let row = matches::table
            .find(id)
            .first::<MatchRow>(&mut conn)
            .optional()?;
        Ok(row.map(Match::from))
    }

    fn find_match_by_pair(&self, pair: &UserPair) -> StoreResult<Option<Match>> {
        let mut conn = self.conn()?;
        let row = matches::table
            .filter(matches::user_a.eq(pair.low()))
            .filter(matches::user_b.eq(pair.high()))
            .first::<MatchRow>(&mut conn)
            .optional()?;
        Ok(row.map(Match::from))
    }

    fn list_matches_for(&self, user_id: Uuid) -> StoreResult<Vec<Match>> {
        let mut conn = self.conn()?;
        let rows = matches::table
            .filter(matches::user_a.eq(user_id).or(matches::user_b.eq(user_id)))
            .order((matches::created_at.desc(), matches::id.desc()))
            .load::<MatchRow>(&mut conn)?;
        Ok(rows.into_iter().map(Match::from).collect())
    }
}

// --- Messages ---

impl MessageStore for PgStore {
    fn insert_message(&self, message: &Message) -> StoreResult<Message> {
        let mut conn = self.conn()?;
        let row = diesel::insert_into(messages::table)
            .values(MessageRow::from(message))
            .get_result::<MessageRow>(&mut conn)?;
        Ok(row.into())
    }

    fn list_messages(&self, match_id: Uuid) -> StoreResult<Vec<Message>> {
        let mut conn = self.conn()?;
        let rows = messages::table
            .filter(messages::match_id.eq(match_id))
            .order((messages::created_at.asc(), messages::id.asc()))
            .load::<MessageRow>(&mut conn)?;
        Ok(rows.into_iter().map(Message::from).collect())
    }

    fn mark_read(&self, match_id: Uuid, reader_id: Uuid, at: DateTime<Utc>) -> StoreResult<Vec<Message>> {
        let mut conn = self.conn()?;
        let rows = diesel::update(
            messages::table
                .filter(messages::match_id.eq(match_id))
                .filter(messages::sender_id.ne(reader_id))
                .filter(messages::read_at.is_null()),
        )
        .set(messages::read_at.eq(Some(at)))
        .get_results::<MessageRow>(&mut conn)?;

        let mut changed: Vec<Message> = rows.into_iter().map(Message::from).collect();
        changed.sort_by_key(Message::order_key);
        Ok(changed)
    }

    fn count_unread(&self, match_id: Uuid, reader_id: Uuid) -> StoreResult<i64> {
        let mut conn = self.conn()?;
        let count = messages::table
            .filter(messages::match_id.eq(match_id))
            .filter(messages::sender_id.ne(reader_id))
            .filter(messages::read_at.is_null())
            .count()
            .get_result::<i64>(&mut conn)?;
        Ok(count)
    }
}

impl Store for PgStore {
    fn ping(&self) -> StoreResult<()> {
        let mut conn = self.conn()?;
        diesel::sql_query("SELECT 1").execute(&mut conn)?;
        Ok(())
    }
}
