pub mod auth_service;
pub mod candidate_service;
pub mod decision_service;
pub mod match_service;
pub mod message_service;
pub mod profile_service;
pub mod token_service;

#[cfg(test)]
pub(crate) mod test_support;
