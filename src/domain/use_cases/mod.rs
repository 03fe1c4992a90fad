pub mod auth;
pub mod extractors;
pub mod renew_tokens;
