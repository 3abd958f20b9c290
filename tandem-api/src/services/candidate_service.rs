use uuid::Uuid;

use tandem_shared::errors::{AppError, AppResult};

use crate::models::PublicProfile;
use crate::store::{CandidateQuery, Store};

pub const MAX_PAGE_SIZE: usize = 50;

/// Clamps a requested page size into `1..=MAX_PAGE_SIZE`.
pub fn page_size(requested: Option<usize>, default: usize) -> usize {
    requested.unwrap_or(default).clamp(1, MAX_PAGE_SIZE)
}

/// Next profiles to swipe on, newest first.
pub fn next_candidates(store: &dyn Store, requester_id: Uuid, limit: usize) -> AppResult<Vec<PublicProfile>> {
    let requester = store
        .find_profile(requester_id)?
        .ok_or_else(|| AppError::not_found("create a profile before browsing candidates"))?;

    let query = CandidateQuery::from_profile(&requester, limit);
    let found = store.find_candidates(&query)?;

    tracing::debug!(user_id = %requester_id, count = found.len(), "candidates selected");
    Ok(found.iter().map(|p| p.public()).collect())
}
