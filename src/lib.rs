use std::sync::Arc;

mod domain;
mod interfaces;
mod infrastructure;
pub mod errors;
pub mod settings;

pub use domain::{entities, use_cases};
pub use interfaces::{handlers, repositories, middlewares, routes};
pub use infrastructure::{auth, cache, db, resilience};

use auth::authenticator::JwtAuthenticator;
use repositories::{denylist::DenylistRepository, user::UserRepository};
use use_cases::{auth::AuthHandler, renew_tokens::TokenRenewal};

pub type SharedUserRepo = Arc<dyn UserRepository>;
pub type AppAuthHandler = AuthHandler<SharedUserRepo, JwtAuthenticator>;
pub type AppTokenRenewal = TokenRenewal<SharedUserRepo, JwtAuthenticator>;

pub struct AppState {
    pub auth_handler: AppAuthHandler,
    pub token_renewal: AppTokenRenewal,
}

impl AppState {
    pub fn new(
        config: &settings::AppConfig,
        user_repo: SharedUserRepo,
        denylist: Arc<dyn DenylistRepository>,
    ) -> Self {
        let authenticator = JwtAuthenticator::new(config, denylist);
        AppState::from_parts(user_repo, authenticator)
    }

    pub fn from_parts(user_repo: SharedUserRepo, authenticator: JwtAuthenticator) -> Self {
        AppState {
            auth_handler: AuthHandler::new(user_repo.clone(), authenticator.clone()),
            token_renewal: TokenRenewal::new(user_repo, authenticator),
        }
    }
}
