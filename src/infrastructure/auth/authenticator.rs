use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::auth::jwt::JwtCodec;
use crate::auth::password::{self, PasswordParams};
use crate::entities::token::{AccessToken, Claims, RotatedTokens, TokenPair, TokenType};
use crate::entities::user::UserRole;
use crate::errors::{AuthError, PasswordError, TokenError};
use crate::repositories::denylist::DenylistRepository;
use crate::repositories::token::TokenServiceRepository;
use crate::settings::AppConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenLifetimes {
    pub access: Duration,
    pub refresh: Duration,
}

impl From<&AppConfig> for TokenLifetimes {
    fn from(config: &AppConfig) -> Self {
        // Out-of-range values saturate; minting then fails instead of panicking.
        TokenLifetimes {
            access: Duration::try_minutes(config.jwt_expiration_minutes).unwrap_or(Duration::MAX),
            refresh: Duration::try_days(config.refresh_token_exp_days).unwrap_or(Duration::MAX),
        }
    }
}

/// JWT implementation of [`TokenServiceRepository`].
///
/// Holds no per-request state: cloning is cheap and every clone shares the
/// same denylist.
#[derive(Clone)]
pub struct JwtAuthenticator {
    codec: JwtCodec,
    lifetimes: TokenLifetimes,
    password_params: PasswordParams,
    denylist: Arc<dyn DenylistRepository>,
}

impl JwtAuthenticator {
    pub fn new(config: &AppConfig, denylist: Arc<dyn DenylistRepository>) -> Self {
        Self::from_parts(
            JwtCodec::from(config),
            TokenLifetimes::from(config),
            PasswordParams::from(config),
            denylist,
        )
    }

    pub fn from_parts(
        codec: JwtCodec,
        lifetimes: TokenLifetimes,
        password_params: PasswordParams,
        denylist: Arc<dyn DenylistRepository>,
    ) -> Self {
        tracing::info!(
            "JwtAuthenticator ready (alg: {:?}, access: {}s, refresh: {}s)",
            codec.algorithm(),
            lifetimes.access.num_seconds(),
            lifetimes.refresh.num_seconds()
        );

        JwtAuthenticator {
            codec,
            lifetimes,
            password_params,
            denylist,
        }
    }

    pub fn lifetimes(&self) -> TokenLifetimes {
        self.lifetimes
    }

    fn mint_access(&self, subject: &str, role: UserRole, now: DateTime<Utc>) -> Result<String, AuthError> {
        let claims = Claims {
            sub: subject.to_string(),
            role,
            token_type: TokenType::Access,
            jti: None,
            iat: now.timestamp(),
            exp: expiry(now, self.lifetimes.access)?,
        };

        self.codec.encode(&claims).map_err(|e| {
            tracing::warn!("Failed to create access token: {}", e);
            AuthError::TokenCreation
        })
    }

    /// Returns the token and its new identifier.
    fn mint_refresh(
        &self,
        subject: &str,
        role: UserRole,
        now: DateTime<Utc>,
    ) -> Result<(String, String), AuthError> {
        let jti = Uuid::new_v4().to_string();
        let claims = Claims {
            sub: subject.to_string(),
            role,
            token_type: TokenType::Refresh,
            jti: Some(jti.clone()),
            iat: now.timestamp(),
            exp: expiry(now, self.lifetimes.refresh)?,
        };

        let token = self.codec.encode(&claims).map_err(|e| {
            tracing::warn!("Failed to create refresh token: {}", e);
            AuthError::TokenCreation
        })?;

        Ok((token, jti))
    }

    async fn is_denylisted(&self, jti: &str) -> bool {
        match self.denylist.contains(jti).await {
            Ok(revoked) => revoked,
            Err(e) => {
                tracing::error!(jti = %jti, "Denylist lookup failed, treating token as revoked: {}", e);
                true
            }
        }
    }
}

fn expiry(now: DateTime<Utc>, lifetime: Duration) -> Result<i64, AuthError> {
    now.checked_add_signed(lifetime)
        .map(|exp| exp.timestamp())
        .ok_or_else(|| {
            tracing::error!("Token lifetime of {}s overflows the clock", lifetime.num_seconds());
            AuthError::TokenCreation
        })
}

#[async_trait]
impl TokenServiceRepository for JwtAuthenticator {
    fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        password::hash_password(password, &self.password_params)
    }

    fn verify_password(&self, password: &str, password_hash: &str) -> bool {
        password::verify_password(password, password_hash)
    }

    fn issue_pair(&self, subject: &Uuid, role: UserRole) -> Result<TokenPair, AuthError> {
        let now = Utc::now();
        let subject = subject.to_string();

        let access_token = self.mint_access(&subject, role, now)?;
        let (refresh_token, _) = self.mint_refresh(&subject, role, now)?;

        tracing::info!(sub = %subject, "Token pair issued");
        Ok(TokenPair { access_token, refresh_token })
    }

    async fn verify(&self, token: &str, expected: TokenType) -> Option<Claims> {
        let claims = match self.codec.decode(token) {
            Ok(claims) => claims,
            Err(TokenError::Expired) => {
                tracing::debug!("Rejected {} token: expired", expected);
                return None;
            }
            Err(e) => {
                tracing::warn!("Rejected {} token: {}", expected, e);
                return None;
            }
        };

        if claims.token_type != expected {
            tracing::warn!(
                "Rejected token: expected {} token, got {}",
                expected, claims.token_type
            );
            return None;
        }

        if let Some(jti) = claims.jti.as_deref() {
            if self.is_denylisted(jti).await {
                tracing::warn!(jti = %jti, sub = %claims.sub, "Revoked token presented");
                return None;
            }
        }

        Some(claims)
    }

    async fn renew_access_only(&self, refresh_token: &str) -> Option<AccessToken> {
        let claims = self.verify(refresh_token, TokenType::Refresh).await?;

        let access_token = self.mint_access(&claims.sub, claims.role, Utc::now()).ok()?;
        Some(AccessToken { access_token })
    }

    async fn renew_with_rotation(&self, refresh_token: &str) -> Option<RotatedTokens> {
        let claims = self.verify(refresh_token, TokenType::Refresh).await?;

        let Some(old_jti) = claims.jti else {
            tracing::warn!(sub = %claims.sub, "Refresh token without identifier cannot be rotated");
            return None;
        };

        let now = Utc::now();
        let access_token = self.mint_access(&claims.sub, claims.role, now).ok()?;
        let (refresh_token, new_jti) = self.mint_refresh(&claims.sub, claims.role, now).ok()?;

        tracing::info!(sub = %claims.sub, old_jti = %old_jti, new_jti = %new_jti, "Refresh token rotated");

        Some(RotatedTokens {
            access_token,
            refresh_token,
            old_jti,
        })
    }

    async fn revoke(&self, token: &str) -> Result<bool, AuthError> {
        let claims = match self.codec.decode_ignoring_expiry(token) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::warn!("Refusing to revoke token: {}", e);
                return Ok(false);
            }
        };

        if claims.token_type != TokenType::Refresh {
            tracing::warn!("Refusing to revoke {} token", claims.token_type);
            return Ok(false);
        }

        let Some(jti) = claims.jti else {
            tracing::warn!("Refresh token without identifier cannot be revoked");
            return Ok(false);
        };

        let ttl = claims.exp - Utc::now().timestamp();
        if ttl <= 0 {
            tracing::info!(jti = %jti, "Token already expired, nothing to denylist");
            return Ok(true);
        }

        self.denylist.add(&jti, ttl).await?;
        Ok(true)
    }

    async fn revoke_identifier(&self, jti: &str, ttl_seconds: i64) -> Result<(), AuthError> {
        if ttl_seconds <= 0 {
            return Ok(());
        }

        self.denylist.add(jti, ttl_seconds).await?;
        Ok(())
    }

    fn remaining_lifetime(&self, token: &str, expected: TokenType) -> Option<i64> {
        let claims = self.codec.decode(token).ok()?;
        if claims.token_type != expected {
            return None;
        }

        Some(claims.exp - Utc::now().timestamp())
    }
}
