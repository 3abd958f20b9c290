use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use tandem_shared::errors::{AppError, AppResult};

use crate::models::{Gender, Interest, Profile, PublicProfile, UserPair};
use crate::store::Store;

pub const MIN_AGE: u32 = 18;
pub const MAX_PHOTOS: usize = 3;
pub const MAX_BIO_CHARS: usize = 500;

#[derive(Debug, Clone)]
pub struct NewProfile {
    pub nickname: String,
    pub birthdate: NaiveDate,
    pub gender: Gender,
    pub interested_in: Vec<Interest>,
    pub bio: Option<String>,
    pub photo_urls: Vec<String>,
}

/// Partial update. `bio: Some("")` clears the bio.
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub nickname: Option<String>,
    pub birthdate: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub interested_in: Option<Vec<Interest>>,
    pub bio: Option<String>,
    pub photo_urls: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

fn is_photo_url(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}

fn normalize_bio(bio: Option<String>) -> Option<String> {
    bio.map(|b| b.trim().to_string()).filter(|b| !b.is_empty())
}

fn dedup_interests(interests: Vec<Interest>) -> Vec<Interest> {
    let mut out: Vec<Interest> = Vec::with_capacity(interests.len());
    for i in interests {
        if !out.contains(&i) {
            out.push(i);
        }
    }
    out
}

/// Invariants every stored profile satisfies.
pub fn check_profile(profile: &Profile, today: NaiveDate) -> AppResult<()> {
    let nickname_len = profile.nickname.chars().count();
    if !(2..=20).contains(&nickname_len) {
        return Err(AppError::validation("nickname must be 2 to 20 characters"));
    }
    if profile.birthdate > today {
        return Err(AppError::validation("birthdate cannot be in the future"));
    }
    if profile.age_on(today) < MIN_AGE {
        return Err(AppError::validation(format!("you must be at least {MIN_AGE} years old")));
    }
    if profile.interested_in.is_empty() {
        return Err(AppError::validation("choose at least one gender you are interested in"));
    }
    if profile.bio.as_ref().is_some_and(|b| b.chars().count() > MAX_BIO_CHARS) {
        return Err(AppError::validation(format!("bio must be at most {MAX_BIO_CHARS} characters")));
    }
    if profile.photo_urls.is_empty() || profile.photo_urls.len() > MAX_PHOTOS {
        return Err(AppError::validation(format!("a profile needs 1 to {MAX_PHOTOS} photos")));
    }
    if let Some(bad) = profile.photo_urls.iter().find(|u| !is_photo_url(u)) {
        return Err(AppError::validation(format!("photo reference must be an http(s) URL: {bad}")));
    }
    Ok(())
}

pub fn create_profile(store: &dyn Store, user_id: Uuid, input: NewProfile) -> AppResult<Profile> {
    if store.find_user(user_id)?.is_none() {
        return Err(AppError::not_found("user not found"));
    }
    if store.find_profile(user_id)?.is_some() {
        return Err(AppError::conflict("profile already exists"));
    }

    let now = Utc::now();
    let profile = Profile {
        user_id,
        nickname: input.nickname.trim().to_string(),
        birthdate: input.birthdate,
        gender: input.gender,
        interested_in: dedup_interests(input.interested_in),
        bio: normalize_bio(input.bio),
        photo_urls: input.photo_urls.into_iter().map(|u| u.trim().to_string()).collect(),
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    check_profile(&profile, now.date_naive())?;

    let profile = store.insert_profile(&profile)?;
    tracing::info!(user_id = %user_id, "profile created");
    Ok(profile)
}

pub fn get_profile(store: &dyn Store, user_id: Uuid) -> AppResult<Profile> {
    store
        .find_profile(user_id)?
        .ok_or_else(|| AppError::not_found("profile not found"))
}

pub fn update_profile(store: &dyn Store, user_id: Uuid, patch: ProfilePatch) -> AppResult<Profile> {
    let mut profile = get_profile(store, user_id)?;

    if let Some(nickname) = patch.nickname {
        profile.nickname = nickname.trim().to_string();
    }
    if let Some(birthdate) = patch.birthdate {
        profile.birthdate = birthdate;
    }
    if let Some(gender) = patch.gender {
        profile.gender = gender;
    }
    if let Some(interests) = patch.interested_in {
        profile.interested_in = dedup_interests(interests);
    }
    if patch.bio.is_some() {
        profile.bio = normalize_bio(patch.bio);
    }
    if let Some(urls) = patch.photo_urls {
        profile.photo_urls = urls.into_iter().map(|u| u.trim().to_string()).collect();
    }
    if let Some(active) = patch.is_active {
        profile.is_active = active;
    }

    let now = Utc::now();
    profile.updated_at = now;
    check_profile(&profile, now.date_naive())?;

    let profile = store.update_profile(&profile)?;
    tracing::info!(user_id = %user_id, "profile updated");
    Ok(profile)
}

pub fn add_photo(store: &dyn Store, user_id: Uuid, url: &str) -> AppResult<Profile> {
    let mut profile = get_profile(store, user_id)?;
    if profile.photo_urls.len() >= MAX_PHOTOS {
        return Err(AppError::validation(format!("a profile holds at most {MAX_PHOTOS} photos")));
    }
    let url = url.trim();
    if !is_photo_url(url) {
        return Err(AppError::validation("photo reference must be an http(s) URL"));
    }

    profile.photo_urls.push(url.to_string());
    profile.updated_at = Utc::now();
    let profile = store.update_profile(&profile)?;
    tracing::info!(user_id = %user_id, photos = profile.photo_urls.len(), "photo added");
    Ok(profile)
}

pub fn remove_photo(store: &dyn Store, user_id: Uuid, index: usize) -> AppResult<Profile> {
    let mut profile = get_profile(store, user_id)?;
    if index >= MAX_PHOTOS || index >= profile.photo_urls.len() {
        return Err(AppError::not_found("photo not found"));
    }
    if profile.photo_urls.len() == 1 {
        return Err(AppError::validation("a profile must keep at least one photo"));
    }

    profile.photo_urls.remove(index);
    profile.updated_at = Utc::now();
    let profile = store.update_profile(&profile)?;
    tracing::info!(user_id = %user_id, index, "photo removed");
    Ok(profile)
}

/// Full profile of someone the caller is matched with.
pub fn partner_profile(store: &dyn Store, caller_id: Uuid, partner_id: Uuid) -> AppResult<PublicProfile> {
    let matched = match UserPair::new(caller_id, partner_id) {
        Some(pair) => store.find_match_by_pair(&pair)?.is_some(),
        None => false,
    };
    if !matched {
        return Err(AppError::forbidden("you are not matched with this user"));
    }

    match store.find_profile(partner_id)? {
        Some(profile) if profile.is_active => Ok(profile.public()),
        _ => Err(AppError::not_found("profile not found")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::match_service::ensure_match;
    use crate::services::test_support::{seed_user, seed_user_with_profile};
    use crate::store::memory::MemoryStore;
    use chrono::Months;
    use tandem_shared::errors::ErrorCode;

    fn input() -> NewProfile {
        NewProfile {
            nickname: "  Juno ".into(),
            birthdate: NaiveDate::from_ymd_opt(1994, 4, 12).unwrap(),
            gender: Gender::Female,
            interested_in: vec![Interest::Male, Interest::Male],
            bio: Some("   ".into()),
            photo_urls: vec!["https://cdn.example.com/juno.jpg".into()],
        }
    }

    #[test]
    fn create_normalizes_fields() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "juno@example.com");
        let profile = create_profile(&store, user, input()).unwrap();

        assert_eq!(profile.nickname, "Juno");
        assert_eq!(profile.interested_in, vec![Interest::Male]);
        assert_eq!(profile.bio, None);
        assert!(profile.is_active);
    }

    #[test]
    fn second_profile_conflicts() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "juno@example.com");
        create_profile(&store, user, input()).unwrap();
        let err = create_profile(&store, user, input()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Conflict);
    }

    #[test]
    fn minors_are_rejected() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "kid@example.com");
        let today = Utc::now().date_naive();
        let mut young = input();
        young.birthdate = today.checked_sub_months(Months::new(17 * 12)).unwrap();

        let err = create_profile(&store, user, young).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
    }

    #[test]
    fn validation_rules() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let now = Utc::now();
        let base = Profile {
            user_id: Uuid::now_v7(),
            nickname: "Ok".into(),
            birthdate: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            gender: Gender::Other,
            interested_in: vec![Interest::All],
            bio: None,
            photo_urls: vec!["https://x.example/1.jpg".into()],
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        assert!(check_profile(&base, today).is_ok());

        let cases = [
            Profile { nickname: "A".into(), ..base.clone() },
            Profile { nickname: "A".repeat(21), ..base.clone() },
            Profile { interested_in: vec![], ..base.clone() },
            Profile { bio: Some("x".repeat(501)), ..base.clone() },
            Profile { photo_urls: vec![], ..base.clone() },
            Profile { photo_urls: vec!["https://x.example/1.jpg".into(); 4], ..base.clone() },
            Profile { photo_urls: vec!["ftp://x.example/1.jpg".into()], ..base.clone() },
        ];
        for case in cases {
            assert!(check_profile(&case, today).is_err(), "accepted {case:?}");
        }
    }

    #[test]
    fn photo_limits() {
        let store = MemoryStore::new();
        let user = seed_user_with_profile(&store, "p@example.com", Gender::Male, &[Interest::Female]);

        add_photo(&store, user, "https://cdn.example.com/2.jpg").unwrap();
        let full = add_photo(&store, user, "https://cdn.example.com/3.jpg").unwrap();
        assert_eq!(full.photo_urls.len(), 3);

        let err = add_photo(&store, user, "https://cdn.example.com/4.jpg").unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);

        assert_eq!(remove_photo(&store, user, 5).unwrap_err().code(), ErrorCode::NotFound);
        let trimmed = remove_photo(&store, user, 0).unwrap();
        assert_eq!(trimmed.photo_urls[0], "https://cdn.example.com/2.jpg");
        remove_photo(&store, user, 0).unwrap();

        let err = remove_photo(&store, user, 0).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
    }

    #[test]
    fn deactivation_through_patch() {
        let store = MemoryStore::new();
        let user = seed_user_with_profile(&store, "q@example.com", Gender::Male, &[Interest::All]);
        let patched = update_profile(
            &store,
            user,
            ProfilePatch { is_active: Some(false), bio: Some("hello there".into()), ..Default::default() },
        )
        .unwrap();
        assert!(!patched.is_active);
        assert_eq!(patched.bio.as_deref(), Some("hello there"));
    }

    #[test]
    fn partner_profile_requires_match() {
        let store = MemoryStore::new();
        let a = seed_user_with_profile(&store, "a@example.com", Gender::Male, &[Interest::Female]);
        let b = seed_user_with_profile(&store, "b@example.com", Gender::Female, &[Interest::Male]);

        assert_eq!(partner_profile(&store, a, b).unwrap_err().code(), ErrorCode::Forbidden);
        assert_eq!(partner_profile(&store, a, a).unwrap_err().code(), ErrorCode::Forbidden);

        ensure_match(&store, a, b).unwrap();
        assert_eq!(partner_profile(&store, a, b).unwrap().user_id, b);
    }
}
