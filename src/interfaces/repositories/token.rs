use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    entities::{
        token::{AccessToken, Claims, RotatedTokens, TokenPair, TokenType},
        user::UserRole,
    },
    errors::{AuthError, PasswordError},
};

/// Issues, verifies, renews and revokes the access/refresh token pair.
///
/// Verification and renewal report failure as `None` only. Why a token was
/// rejected (expired, forged, wrong class, revoked) goes to the logs and is
/// not observable by callers.
#[async_trait]
pub trait TokenServiceRepository: Send + Sync {
    /// Salted, deliberately slow one-way hash.
    fn hash_password(&self, password: &str) -> Result<String, PasswordError>;

    /// `false` on mismatch and on any verifier error.
    fn verify_password(&self, password: &str, password_hash: &str) -> bool;

    /// Mints an access token and a refresh token with a fresh identifier.
    fn issue_pair(&self, subject: &Uuid, role: UserRole) -> Result<TokenPair, AuthError>;

    /// Decodes `token`, checks its class and, when it carries an identifier,
    /// the denylist. An unreachable denylist counts as revoked.
    async fn verify(&self, token: &str, expected: TokenType) -> Option<Claims>;

    /// New access token for the refresh token's subject. The refresh token
    /// stays usable.
    async fn renew_access_only(&self, refresh_token: &str) -> Option<AccessToken>;

    /// New access and refresh tokens plus the identifier of the presented
    /// refresh token. Revoking that identifier is left to the caller.
    async fn renew_with_rotation(&self, refresh_token: &str) -> Option<RotatedTokens>;

    /// Denylists a refresh token for the rest of its lifetime. Expiry is
    /// ignored, the signature is not. `Ok(false)` when the token cannot be
    /// revoked; `Err` when the denylist write fails.
    async fn revoke(&self, token: &str) -> Result<bool, AuthError>;

    /// Denylists an identifier directly. Non-positive TTLs are ignored.
    async fn revoke_identifier(&self, jti: &str, ttl_seconds: i64) -> Result<(), AuthError>;

    /// Seconds until `token` expires, if it decodes as a valid token of the
    /// expected class. Does not consult the denylist.
    fn remaining_lifetime(&self, token: &str, expected: TokenType) -> Option<i64>;
}
