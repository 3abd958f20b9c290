use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use tandem_shared::errors::AppResult;
use tandem_shared::middleware::{AppJson, AppPath};
use tandem_shared::types::auth::AuthUser;
use tandem_shared::types::ApiResponse;

use crate::models::{Gender, Interest, Profile, PublicProfile};
use crate::services::profile_service::{self, NewProfile, ProfilePatch};
use crate::AppState;

// --- Request DTOs ---

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
// Nickname and bio limits apply to the trimmed values and are checked by
// `profile_service::check_profile`.
pub struct CreateProfileRequest {
    pub nickname: String,
    pub birthdate: NaiveDate,
    pub gender: Gender,
    #[validate(length(min = 1, message = "choose at least one gender you are interested in"))]
    pub interested_in: Vec<Interest>,
    pub bio: Option<String>,
    #[validate(length(min = 1, max = 3, message = "a profile needs 1 to 3 photos"))]
    pub photo_urls: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub nickname: Option<String>,
    pub birthdate: Option<NaiveDate>,
    pub gender: Option<Gender>,
    #[validate(length(min = 1, message = "choose at least one gender you are interested in"))]
    pub interested_in: Option<Vec<Interest>>,
    pub bio: Option<String>,
    pub photo_urls: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddPhotoRequest {
    #[validate(url(message = "photo reference must be a URL"))]
    pub url: String,
}

impl AddPhotoRequest {
    fn trimmed(self) -> Self {
        Self {
            url: self.url.trim().to_string(),
        }
    }
}

// --- Response DTOs ---

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub profile: Profile,
}

#[derive(Debug, Serialize)]
pub struct PartnerProfileResponse {
    pub profile: PublicProfile,
}

// --- Handlers ---

/// POST /profile
pub async fn create_profile(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<CreateProfileRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<ProfileResponse>>)> {
    req.validate()?;

    let profile = profile_service::create_profile(
        state.store.as_ref(),
        auth_user.id,
        NewProfile {
            nickname: req.nickname,
            birthdate: req.birthdate,
            gender: req.gender,
            interested_in: req.interested_in,
            bio: req.bio,
            photo_urls: req.photo_urls,
        },
    )?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(ProfileResponse { profile }))))
}

/// GET /profile
pub async fn get_profile(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<ProfileResponse>>> {
    let profile = profile_service::get_profile(state.store.as_ref(), auth_user.id)?;
    Ok(Json(ApiResponse::ok(ProfileResponse { profile })))
}

/// PATCH /profile
pub async fn update_profile(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<ProfileResponse>>> {
    req.validate()?;

    let patch = ProfilePatch {
        nickname: req.nickname,
        birthdate: req.birthdate,
        gender: req.gender,
        interested_in: req.interested_in,
        bio: req.bio,
        photo_urls: req.photo_urls,
        is_active: req.is_active,
    };
    let profile = profile_service::update_profile(state.store.as_ref(), auth_user.id, patch)?;
    Ok(Json(ApiResponse::ok(ProfileResponse { profile })))
}

/// POST /profile/photos
pub async fn add_photo(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<AddPhotoRequest>,
) -> AppResult<Json<ApiResponse<ProfileResponse>>> {
    let req = req.trimmed();
    req.validate()?;

    let profile = profile_service::add_photo(state.store.as_ref(), auth_user.id, &req.url)?;
    Ok(Json(ApiResponse::ok(ProfileResponse { profile })))
}

/// DELETE /profile/photos/:index
pub async fn remove_photo(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    AppPath(index): AppPath<usize>,
) -> AppResult<Json<ApiResponse<ProfileResponse>>> {
    let profile = profile_service::remove_photo(state.store.as_ref(), auth_user.id, index)?;
    Ok(Json(ApiResponse::ok(ProfileResponse { profile })))
}

/// GET /profile/partner/:user_id - full profile of a matched user
pub async fn partner_profile(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    AppPath(partner_id): AppPath<Uuid>,
) -> AppResult<Json<ApiResponse<PartnerProfileResponse>>> {
    let profile = profile_service::partner_profile(state.store.as_ref(), auth_user.id, partner_id)?;
    Ok(Json(ApiResponse::ok(PartnerProfileResponse { profile })))
}
