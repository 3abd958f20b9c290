//! Fixtures shared by the service tests.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::{Gender, Interest};
use crate::services::{auth_service, profile_service};
use crate::store::Store;

pub fn seed_user(store: &dyn Store, email: &str) -> Uuid {
    auth_service::register_with_hash(store, email, "unused-hash".into())
        .unwrap()
        .id
}

pub fn seed_user_with_profile(store: &dyn Store, email: &str, gender: Gender, interested_in: &[Interest]) -> Uuid {
    let user_id = seed_user(store, email);
    let local = email.split('@').next().unwrap_or("someone");
    let nickname: String = format!("user {local}").chars().take(20).collect();
    profile_service::create_profile(
        store,
        user_id,
        profile_service::NewProfile {
            nickname,
            birthdate: NaiveDate::from_ymd_opt(1995, 5, 5).unwrap(),
            gender,
            interested_in: interested_in.to_vec(),
            bio: None,
            photo_urls: vec![format!("https://cdn.example.com/{user_id}.jpg")],
        },
    )
    .unwrap();
    user_id
}
