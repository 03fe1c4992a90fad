use uuid::Uuid;
use validator::Validate;

use crate::entities::token::{AuthResponse, TokenType};
use crate::entities::user::{LoginUser, NewUser, NewUserResponse, User, UserRole};
use crate::errors::{AppError, AuthError};
use crate::interfaces::repositories::user::UserRepository;
use crate::repositories::token::TokenServiceRepository;

pub struct AuthHandler<R, T>
where
    R: UserRepository,
    T: TokenServiceRepository,
{
    pub user_repo: R,
    pub token_service: T,
}

impl<R, T> AuthHandler<R, T>
where
    R: UserRepository,
    T: TokenServiceRepository,
{
    pub fn new(user_repo: R, token_service: T) -> Self {
        AuthHandler {
            user_repo,
            token_service
        }
    }

    /// Registers a customer account.
    pub async fn register(&self, request: NewUser) -> Result<NewUserResponse, AppError> {
        self.create_account(request, UserRole::Customer).await
    }

    /// Registers an administrator. Callers must already be authorized as admin.
    pub async fn register_admin(&self, request: NewUser) -> Result<NewUserResponse, AppError> {
        self.create_account(request, UserRole::Admin).await
    }

    async fn create_account(&self, request: NewUser, role: UserRole) -> Result<NewUserResponse, AppError> {
        request.validate()?;

        if self.user_repo.username_exists(request.username.trim()).await? {
            return Err(AppError::Conflict("Username is already registered".to_string()));
        }
        if self.user_repo.email_exists(request.email.trim()).await? {
            return Err(AppError::Conflict("Email is already registered".to_string()));
        }

        let hashed_password = self.token_service.hash_password(&request.password)?;
        let user_insert = request.prepare_for_insert(hashed_password, role);

        let id = self.user_repo.create_user(&user_insert).await?;

        tracing::info!(user_id = %id, role = ?role, "Account created");
        Ok(NewUserResponse {
            id,
            message: "User created successfully".to_string(),
        })
    }

    /// Checks credentials and issues a token pair.
    pub async fn login(&self, request: LoginUser) -> Result<AuthResponse, AuthError> {
        request.validate()?;

        let username = request.username.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let email = request.email.as_deref().map(str::trim).filter(|s| !s.is_empty());
        if username.is_none() && email.is_none() {
            return Err(AuthError::MissingCredentials);
        }

        let user = self.user_repo.get_user_by_username_or_email(username, email)
            .await
            .map_err(|e| {
                tracing::error!("User lookup failed during login: {}", e);
                AuthError::WrongCredentials
            })?
            .ok_or(AuthError::WrongCredentials)?;

        if !self.token_service.verify_password(&request.password, &user.password_hash) {
            tracing::warn!(user_id = %user.id, "Failed login attempt");
            return Err(AuthError::WrongCredentials);
        }

        if !user.is_active {
            tracing::warn!(user_id = %user.id, "Login attempt on disabled account");
            return Err(AuthError::UserDisabled);
        }

        let pair = self.token_service.issue_pair(&user.id, user.role)?;

        tracing::info!(user_id = %user.id, "User logged in successfully");
        Ok(pair.into())
    }

    /// Revokes the refresh token of the current session.
    pub async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        if self.token_service.revoke(refresh_token).await? {
            Ok(())
        } else {
            Err(AuthError::InvalidToken)
        }
    }

    /// Guard for protected endpoints: the access token must verify and its
    /// subject must still exist and be active. The returned user carries the
    /// role from the store, not the one embedded in the token.
    pub async fn authenticate(&self, access_token: &str) -> Result<User, AuthError> {
        let claims = self.token_service
            .verify(access_token, TokenType::Access)
            .await
            .ok_or(AuthError::InvalidToken)?;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AuthError::InvalidToken)?;

        let user = self.user_repo.get_user_by_id(&user_id)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .ok_or_else(|| {
                tracing::warn!(user_id = %user_id, "Valid token for unknown user");
                AuthError::UserNotFound
            })?;

        if !user.is_active {
            tracing::warn!(user_id = %user_id, "Access attempt by disabled user");
            return Err(AuthError::UserDisabled);
        }

        Ok(user)
    }

    pub async fn disable_user(&self, user_id: Uuid, acting: &User) -> Result<(), AppError> {
        if user_id == acting.id {
            return Err(AppError::Conflict("Administrators cannot disable themselves".to_string()));
        }
        self.set_active(user_id, false, acting).await
    }

    pub async fn enable_user(&self, user_id: Uuid, acting: &User) -> Result<(), AppError> {
        self.set_active(user_id, true, acting).await
    }

    async fn set_active(&self, user_id: Uuid, active: bool, acting: &User) -> Result<(), AppError> {
        if !acting.is_admin() {
            return Err(AppError::ForbiddenAccess);
        }

        let user = self.user_repo.get_user_by_id(&user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if user.is_active == active {
            let state = if active { "enabled" } else { "disabled" };
            return Err(AppError::Conflict(format!("User is already {}", state)));
        }

        if !self.user_repo.set_user_active(&user_id, active).await? {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        tracing::info!(user_id = %user_id, by = %acting.id, active, "User status changed");
        Ok(())
    }
}
