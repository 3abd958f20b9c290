use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// --- Enumerations ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            _ => Err(format!("unknown gender: {s}")),
        }
    }
}

/// One entry of a profile's interested-in set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interest {
    Male,
    Female,
    Other,
    All,
}

impl Interest {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interest::Male => "male",
            Interest::Female => "female",
            Interest::Other => "other",
            Interest::All => "all",
        }
    }

    pub fn admits(&self, gender: Gender) -> bool {
        matches!(
            (self, gender),
            (Interest::All, _)
                | (Interest::Male, Gender::Male)
                | (Interest::Female, Gender::Female)
                | (Interest::Other, Gender::Other)
        )
    }
}

impl From<Gender> for Interest {
    fn from(gender: Gender) -> Self {
        match gender {
            Gender::Male => Interest::Male,
            Gender::Female => Interest::Female,
            Gender::Other => Interest::Other,
        }
    }
}

impl std::str::FromStr for Interest {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Interest::Male),
            "female" => Ok(Interest::Female),
            "other" => Ok(Interest::Other),
            "all" => Ok(Interest::All),
            _ => Err(format!("unknown interest: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionAction {
    Like,
    Skip,
}

impl DecisionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionAction::Like => "like",
            DecisionAction::Skip => "skip",
        }
    }
}

impl std::str::FromStr for DecisionAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(DecisionAction::Like),
            "skip" => Ok(DecisionAction::Skip),
            _ => Err(format!("unknown decision action: {s}")),
        }
    }
}

// --- User ---

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub email_verified: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

// --- Profile ---

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user_id: Uuid,
    pub nickname: String,
    pub birthdate: NaiveDate,
    pub gender: Gender,
    pub interested_in: Vec<Interest>,
    pub bio: Option<String>,
    pub photo_urls: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn age_on(&self, today: NaiveDate) -> u32 {
        today.years_since(self.birthdate).unwrap_or(0)
    }

    pub fn age(&self) -> u32 {
        self.age_on(Utc::now().date_naive())
    }

    pub fn main_photo(&self) -> Option<&str> {
        self.photo_urls.first().map(String::as_str)
    }

    /// Whether this profile's interested-in set covers `gender`.
    pub fn is_interested_in(&self, gender: Gender) -> bool {
        self.interested_in.iter().any(|i| i.admits(gender))
    }

    pub fn summary(&self) -> PartnerSummary {
        PartnerSummary {
            user_id: self.user_id,
            nickname: self.nickname.clone(),
            age: self.age(),
            main_photo: self.main_photo().map(str::to_string),
        }
    }

    pub fn public(&self) -> PublicProfile {
        PublicProfile {
            user_id: self.user_id,
            nickname: self.nickname.clone(),
            age: self.age(),
            birthdate: self.birthdate,
            gender: self.gender,
            bio: self.bio.clone(),
            photo_urls: self.photo_urls.clone(),
        }
    }
}

/// What the other side of a match sees in match lists and the match dialog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerSummary {
    pub user_id: Uuid,
    pub nickname: String,
    pub age: u32,
    pub main_photo: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    pub user_id: Uuid,
    pub nickname: String,
    pub age: u32,
    pub birthdate: NaiveDate,
    pub gender: Gender,
    pub bio: Option<String>,
    pub photo_urls: Vec<String>,
}

// --- Decision ---

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub actor_id: Uuid,
    pub target_id: Uuid,
    pub action: DecisionAction,
    pub created_at: DateTime<Utc>,
}

// --- Match ---

/// An unordered pair of distinct users in canonical (low, high) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserPair {
    low: Uuid,
    high: Uuid,
}

impl UserPair {
    /// `None` when both ids are the same user.
    pub fn new(a: Uuid, b: Uuid) -> Option<Self> {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Self { low: a, high: b }),
            std::cmp::Ordering::Greater => Some(Self { low: b, high: a }),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn low(&self) -> Uuid {
        self.low
    }

    pub fn high(&self) -> Uuid {
        self.high
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: Uuid,
    pub user_a: Uuid,
    pub user_b: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Match {
    pub fn pair(&self) -> Option<UserPair> {
        UserPair::new(self.user_a, self.user_b)
    }

    pub fn involves(&self, user_id: Uuid) -> bool {
        self.user_a == user_id || self.user_b == user_id
    }

    /// The other participant, if `user_id` is one of the two.
    pub fn partner_of(&self, user_id: Uuid) -> Option<Uuid> {
        if self.user_a == user_id {
            Some(self.user_b)
        } else if self.user_b == user_id {
            Some(self.user_a)
        } else {
            None
        }
    }
}

// --- Message ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub match_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub read_at: Option<DateTime<Utc>>,
}

impl Message {
    /// History order: creation time, then id for equal timestamps.
    pub fn order_key(&self) -> (DateTime<Utc>, Uuid) {
        (self.created_at, self.id)
    }
}

/// A message as seen by one participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    #[serde(flatten)]
    pub message: Message,
    pub is_mine: bool,
}

impl MessageView {
    pub fn for_viewer(message: Message, viewer_id: Uuid) -> Self {
        let is_mine = message.sender_id == viewer_id;
        Self { message, is_mine }
    }
}
