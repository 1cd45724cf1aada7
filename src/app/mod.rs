pub mod auth;
pub mod diary;
pub mod locations;
pub mod posts;
pub mod users;

/// Hard cap on radius-query result sets. Keeps a dense area from
/// returning unbounded rows; paging would replace this for a real
/// production rollout.
pub const RADIUS_RESULT_LIMIT: i64 = 100;
