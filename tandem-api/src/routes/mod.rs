pub mod auth;
pub mod candidates;
pub mod decisions;
pub mod dev;
pub mod health;
pub mod matches;
pub mod messages;
pub mod profile;
