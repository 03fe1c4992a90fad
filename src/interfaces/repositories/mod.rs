pub mod denylist;
pub mod sqlx_repo;
pub mod token;
pub mod user;
