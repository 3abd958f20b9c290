use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use uuid::Uuid;

use tandem_shared::errors::{AppError, AppResult};

use crate::models::User;
use crate::store::Store;

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::internal(format!("password hashing failed: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::internal(format!("invalid password hash: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < 8 {
        return Err(AppError::validation("password must be at least 8 characters"));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AppError::validation("password must contain at least one number"));
    }
    if !password.chars().any(|c| c.is_ascii_alphabetic()) {
        return Err(AppError::validation("password must contain at least one letter"));
    }
    Ok(())
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Creates an account. `password_hash` lets callers that create many
/// accounts with one password hash it once.
pub fn register_with_hash(store: &dyn Store, email: &str, password_hash: String) -> AppResult<User> {
    let email = normalize_email(email);
    if store.find_user_by_email(&email)?.is_some() {
        return Err(AppError::conflict("email already registered"));
    }

    let user = User {
        id: Uuid::now_v7(),
        email,
        password_hash,
        email_verified: false,
        is_active: true,
        created_at: Utc::now(),
    };
    // A concurrent registration surfaces as a unique violation, i.e. CONFLICT.
    let user = store.insert_user(&user)?;

    tracing::info!(user_id = %user.id, "user registered");
    Ok(user)
}

pub fn register(store: &dyn Store, email: &str, password: &str) -> AppResult<User> {
    validate_password(password)?;
    let password_hash = hash_password(password)?;
    register_with_hash(store, email, password_hash)
}

/// Checks credentials. Unknown email and wrong password are reported the
/// same way.
pub fn authenticate(store: &dyn Store, email: &str, password: &str) -> AppResult<User> {
    let email = normalize_email(email);
    let invalid = || AppError::unauthorized("invalid email or password");

    let user = store.find_user_by_email(&email)?.ok_or_else(invalid)?;
    if !verify_password(password, &user.password_hash)? {
        tracing::info!(user_id = %user.id, "login rejected: wrong password");
        return Err(invalid());
    }
    if !user.is_active {
        return Err(AppError::unauthorized("account is disabled"));
    }

    tracing::info!(user_id = %user.id, "user logged in");
    Ok(user)
}

pub fn current_user(store: &dyn Store, user_id: Uuid) -> AppResult<User> {
    match store.find_user(user_id)? {
        Some(user) if user.is_active => Ok(user),
        Some(_) => Err(AppError::unauthorized("account is disabled")),
        None => Err(AppError::unauthorized("user no longer exists")),
    }
}
