pub mod auth;
pub mod json_error;
pub mod users;
