use jsonwebtoken::{encode, EncodingKey, Header};
use uuid::Uuid;

use tandem_shared::errors::AppError;
use tandem_shared::types::auth::{AccessToken, Claims};

pub fn create_access_token(user_id: Uuid, secret: &str, ttl_secs: i64) -> Result<String, AppError> {
    let claims = Claims::new(user_id, ttl_secs);
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::internal(format!("JWT encoding failed: {e}")))
}

pub fn issue_access_token(user_id: Uuid, secret: &str, ttl_secs: i64) -> Result<AccessToken, AppError> {
    let token = create_access_token(user_id, secret, ttl_secs)?;
    Ok(AccessToken::bearer(token, ttl_secs))
}
