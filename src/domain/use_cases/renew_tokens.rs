use uuid::Uuid;

use crate::entities::token::{AccessTokenResponse, AuthResponse, TokenType};
use crate::entities::user::User;
use crate::errors::AuthError;
use crate::interfaces::repositories::user::UserRepository;
use crate::repositories::token::TokenServiceRepository;

/// Refresh-token renewal with the subject re-checked against the identity
/// store on every call.
///
/// Two concurrent rotations of the same refresh token are not serialized:
/// both can pass verification before either revocation lands, so both
/// succeed. The presented token is denylisted either way.
pub struct TokenRenewal<R, T>
where
    R: UserRepository,
    T: TokenServiceRepository,
{
    pub user_repo: R,
    pub token_service: T,
}

impl<R, T> TokenRenewal<R, T>
where
    R: UserRepository,
    T: TokenServiceRepository,
{
    pub fn new(user_repo: R, token_service: T) -> Self {
        TokenRenewal {
            user_repo,
            token_service,
        }
    }

    /// Issues a new access/refresh pair and denylists the presented refresh
    /// token. If the subject has been disabled, the freshly minted refresh
    /// token is revoked before the error is returned.
    pub async fn renew_with_rotation(&self, refresh_token: &str) -> Result<AuthResponse, AuthError> {
        let rotated = self.token_service
            .renew_with_rotation(refresh_token)
            .await
            .ok_or(AuthError::InvalidOrRevokedToken)?;

        let user = match self.load_subject(&rotated.access_token).await {
            Ok(user) => user,
            Err(AuthError::UserDisabled) => {
                if !self.token_service.revoke(&rotated.refresh_token).await? {
                    tracing::error!("Could not revoke refresh token minted for disabled user");
                }
                return Err(AuthError::UserDisabled);
            }
            Err(e) => return Err(e),
        };

        if let Some(ttl) = self.token_service.remaining_lifetime(refresh_token, TokenType::Refresh) {
            self.token_service.revoke_identifier(&rotated.old_jti, ttl).await?;
        }

        tracing::info!(user_id = %user.id, "Tokens renewed with rotation");
        Ok(AuthResponse::new(rotated.access_token, rotated.refresh_token))
    }

    /// Issues a new access token only. The refresh token stays valid until it
    /// expires or is revoked.
    pub async fn renew_access_only(&self, refresh_token: &str) -> Result<AccessTokenResponse, AuthError> {
        let renewed = self.token_service
            .renew_access_only(refresh_token)
            .await
            .ok_or(AuthError::InvalidOrRevokedToken)?;

        let user = self.load_subject(&renewed.access_token).await?;

        tracing::info!(user_id = %user.id, "Access token renewed");
        Ok(renewed.into())
    }

    /// Verifies a freshly minted access token and loads its subject, which
    /// must exist and be active.
    async fn load_subject(&self, access_token: &str) -> Result<User, AuthError> {
        let claims = self.token_service
            .verify(access_token, TokenType::Access)
            .await
            .ok_or_else(|| AuthError::Internal("Renewed access token failed verification".to_string()))?;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AuthError::InvalidUserId)?;

        let user = self.user_repo.get_user_by_id(&user_id)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .ok_or_else(|| {
                tracing::warn!(user_id = %user_id, "Renewal for unknown user");
                AuthError::UserNotFound
            })?;

        if !user.is_active {
            tracing::warn!(user_id = %user_id, "Renewal for disabled user");
            return Err(AuthError::UserDisabled);
        }

        Ok(user)
    }
}
