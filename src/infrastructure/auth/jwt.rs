use std::fmt;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use zeroize::Zeroizing;

use crate::entities::token::Claims;
use crate::errors::TokenError;
use crate::settings::AppConfig;

/// Signs and verifies claims blocks with a shared HMAC secret.
///
/// Stateless: it knows nothing about the denylist, roles or users.
#[derive(Clone)]
pub struct JwtCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: Algorithm,
}

impl JwtCodec {
    pub fn new(secret: &[u8], algorithm: Algorithm) -> Self {
        JwtCodec {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            algorithm,
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn encode(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(self.algorithm), claims, &self.encoding)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Full validation. Fails with `TokenError::Expired` once `exp` has passed.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat", "sub"]);

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(TokenError::from)
    }

    /// Signature-checked decode that accepts expired tokens.
    pub fn decode_ignoring_expiry(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(TokenError::from)
    }
}

impl From<&AppConfig> for JwtCodec {
    fn from(config: &AppConfig) -> Self {
        let secret = Zeroizing::new(config.jwt_secret.clone());
        JwtCodec::new(secret.as_bytes(), config.jwt_algorithm)
    }
}

impl fmt::Debug for JwtCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtCodec")
            .field("encoding", &"[REDACTED]")
            .field("decoding", &"[REDACTED]")
            .field("algorithm", &self.algorithm)
            .finish()
    }
}
