//! Local development helpers, mounted only with `enable_dev_routes`.

use axum::extract::State;
use axum::Json;
use chrono::{Months, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use tandem_shared::errors::{AppResult, ErrorCode};
use tandem_shared::middleware::AppJson;
use tandem_shared::types::ApiResponse;

use crate::models::{Gender, Interest};
use crate::services::auth_service;
use crate::services::profile_service::{self, NewProfile};
use crate::store::Store;
use crate::AppState;

pub const TEST_EMAIL_DOMAIN: &str = "@test.com";
pub const TEST_PASSWORD: &str = "test1234";

const BIOS: [&str; 4] = [
    "Coffee first, questions later.",
    "Weekend hiker, weekday coder.",
    "Looking for someone to try new restaurants with.",
    "Dog person. Ask me about my dog.",
];

#[derive(Debug, Deserialize, Validate)]
pub struct SeedRequest {
    #[validate(range(min = 1, max = 100, message = "count must be between 1 and 100"))]
    pub count: u32,
}

#[derive(Debug, Serialize)]
pub struct SeedResponse {
    pub created: usize,
    pub skipped: usize,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub deleted: usize,
}

fn seed_one(store: &dyn Store, gender: Gender, n: u32, password_hash: &str) -> AppResult<bool> {
    let prefix = gender.as_str();
    let email = format!("{prefix}{n}{TEST_EMAIL_DOMAIN}");

    let user = match auth_service::register_with_hash(store, &email, password_hash.to_string()) {
        Ok(user) => user,
        Err(e) if e.code() == ErrorCode::Conflict => return Ok(false),
        Err(e) => return Err(e),
    };

    let mut rng = rand::thread_rng();
    let age_months = rng.gen_range(18 * 12..45 * 12);
    let today = Utc::now().date_naive();
    let birthdate = today.checked_sub_months(Months::new(age_months)).unwrap_or(today);
    let interested_in = match gender {
        Gender::Male => vec![Interest::Female],
        Gender::Female => vec![Interest::Male],
        Gender::Other => vec![Interest::All],
    };

    profile_service::create_profile(
        store,
        user.id,
        NewProfile {
            nickname: format!("{prefix} {n}"),
            birthdate,
            gender,
            interested_in,
            bio: Some(BIOS[rng.gen_range(0..BIOS.len())].to_string()),
            photo_urls: vec![format!("https://picsum.photos/seed/{prefix}{n}/600/800")],
        },
    )?;
    Ok(true)
}

/// POST /dev/seed-users - `count` male and `count` female test accounts
pub async fn seed_users(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<SeedRequest>,
) -> AppResult<Json<ApiResponse<SeedResponse>>> {
    req.validate()?;

    // Every seeded account shares one password, so hash it once.
    let password_hash = auth_service::hash_password(TEST_PASSWORD)?;
    let mut created = 0;
    let mut skipped = 0;
    for n in 1..=req.count {
        for gender in [Gender::Male, Gender::Female] {
            if seed_one(state.store.as_ref(), gender, n, &password_hash)? {
                created += 1;
            } else {
                skipped += 1;
            }
        }
    }

    tracing::info!(created, skipped, "test users seeded");
    Ok(Json(ApiResponse::ok_with_message(
        SeedResponse { created, skipped },
        format!("password for every test user: {TEST_PASSWORD}"),
    )))
}

/// POST /dev/clear-test-users
pub async fn clear_test_users(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<ClearResponse>>> {
    let deleted = state.store.purge_users_by_email_suffix(TEST_EMAIL_DOMAIN)?;
    tracing::info!(deleted, "test users cleared");
    Ok(Json(ApiResponse::ok(ClearResponse { deleted })))
}
