
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use jsonwebtoken::Algorithm;
use storefront_backend::{
    auth::{
        authenticator::{JwtAuthenticator, TokenLifetimes},
        jwt::JwtCodec,
        password,
    },
    cache::memory_denylist::InMemoryDenylist,
    entities::{
        token::{Claims, TokenType},
        user::UserRole,
    },
    errors::{AuthError, DenylistError, TokenError},
    repositories::token::TokenServiceRepository,
};
use test_utils::*;
use uuid::Uuid;

fn claims(token_type: TokenType, exp_offset: i64) -> Claims {
    let now = Utc::now().timestamp();
    Claims {
        sub: Uuid::new_v4().to_string(),
        role: UserRole::Customer,
        token_type,
        jti: match token_type {
            TokenType::Refresh => Some(Uuid::new_v4().to_string()),
            TokenType::Access => None,
        },
        iat: now,
        exp: now + exp_offset,
    }
}

fn memory_authenticator() -> (JwtAuthenticator, InMemoryDenylist) {
    let denylist = InMemoryDenylist::new();
    (authenticator(Arc::new(denylist.clone())), denylist)
}

#[test]
fn password_hash_round_trip() {
    let params = test_password_params();
    let hash = password::hash_password(TEST_PASSWORD, &params).unwrap();

    assert!(hash.starts_with("$argon2id$"));
    assert!(password::verify_password(TEST_PASSWORD, &hash));
    assert!(!password::verify_password("Wrong-Horse-Battery-42", &hash));
}

#[test]
fn password_hashes_are_salted() {
    let params = test_password_params();
    let first = password::hash_password(TEST_PASSWORD, &params).unwrap();
    let second = password::hash_password(TEST_PASSWORD, &params).unwrap();

    assert_ne!(first, second);
    assert!(password::verify_password(TEST_PASSWORD, &first));
    assert!(password::verify_password(TEST_PASSWORD, &second));
}

#[test]
fn garbage_hash_never_verifies() {
    assert!(!password::verify_password(TEST_PASSWORD, "not-a-phc-string"));
    assert!(!password::verify_password(TEST_PASSWORD, ""));
}

#[test]
fn codec_reports_expiry_separately_from_bad_signature() {
    let codec = codec();

    let expired = codec.encode(&claims(TokenType::Access, -10)).unwrap();
    assert_eq!(codec.decode(&expired), Err(TokenError::Expired));

    let other = JwtCodec::new(b"another_secret_that_is_also_long_enough_123456", Algorithm::HS256);
    let forged = other.encode(&claims(TokenType::Access, 600)).unwrap();
    assert_eq!(codec.decode(&forged), Err(TokenError::InvalidSignature));

    assert!(matches!(codec.decode("not.a.token"), Err(TokenError::Malformed(_))));
}

#[test]
fn decode_ignoring_expiry_still_checks_signature() {
    let codec = codec();

    let expired = claims(TokenType::Refresh, -10);
    let token = codec.encode(&expired).unwrap();
    assert_eq!(codec.decode_ignoring_expiry(&token).unwrap(), expired);

    let other = JwtCodec::new(b"another_secret_that_is_also_long_enough_123456", Algorithm::HS256);
    let forged = other.encode(&claims(TokenType::Refresh, -10)).unwrap();
    assert_eq!(codec.decode_ignoring_expiry(&forged), Err(TokenError::InvalidSignature));
}

#[test]
fn claims_use_type_as_wire_name() {
    let value = serde_json::to_value(claims(TokenType::Access, 60)).unwrap();

    assert_eq!(value["type"], "access");
    assert_eq!(value["role"], "customer");
    assert!(value.get("jti").is_none());
}

#[actix_rt::test]
async fn issued_pair_has_expected_shape() {
    let (auth, _) = memory_authenticator();
    let subject = Uuid::new_v4();

    let pair = auth.issue_pair(&subject, UserRole::Admin).unwrap();

    let access = auth.verify(&pair.access_token, TokenType::Access).await.unwrap();
    assert_eq!(access.sub, subject.to_string());
    assert_eq!(access.role, UserRole::Admin);
    assert_eq!(access.token_type, TokenType::Access);
    assert!(access.jti.is_none());
    assert_eq!(access.exp - access.iat, Duration::minutes(15).num_seconds());

    let refresh = auth.verify(&pair.refresh_token, TokenType::Refresh).await.unwrap();
    assert_eq!(refresh.sub, subject.to_string());
    assert_eq!(refresh.token_type, TokenType::Refresh);
    assert!(refresh.jti.is_some());
    assert_eq!(refresh.exp - refresh.iat, Duration::days(7).num_seconds());
}

#[actix_rt::test]
async fn each_refresh_token_gets_its_own_identifier() {
    let (auth, _) = memory_authenticator();
    let subject = Uuid::new_v4();

    let first = auth.issue_pair(&subject, UserRole::Customer).unwrap();
    let second = auth.issue_pair(&subject, UserRole::Customer).unwrap();

    let first_jti = auth.verify(&first.refresh_token, TokenType::Refresh).await.unwrap().jti;
    let second_jti = auth.verify(&second.refresh_token, TokenType::Refresh).await.unwrap().jti;
    assert_ne!(first_jti, second_jti);
}

#[actix_rt::test]
async fn token_class_is_enforced_both_ways() {
    let (auth, _) = memory_authenticator();
    let pair = auth.issue_pair(&Uuid::new_v4(), UserRole::Customer).unwrap();

    assert!(auth.verify(&pair.access_token, TokenType::Refresh).await.is_none());
    assert!(auth.verify(&pair.refresh_token, TokenType::Access).await.is_none());
    assert!(auth.renew_access_only(&pair.access_token).await.is_none());
    assert!(auth.renew_with_rotation(&pair.access_token).await.is_none());
}

#[actix_rt::test]
async fn tampered_token_is_rejected() {
    let (auth, _) = memory_authenticator();
    let pair = auth.issue_pair(&Uuid::new_v4(), UserRole::Customer).unwrap();

    let (unsigned, signature) = pair.access_token.rsplit_once('.').unwrap();
    let flipped = if signature.starts_with('A') { 'B' } else { 'A' };
    let tampered = format!("{}.{}{}", unsigned, flipped, &signature[1..]);

    assert!(auth.verify(&tampered, TokenType::Access).await.is_none());
    assert!(auth.verify("", TokenType::Access).await.is_none());
}

#[actix_rt::test]
async fn revoked_refresh_token_no_longer_verifies() {
    let (auth, denylist) = memory_authenticator();
    let pair = auth.issue_pair(&Uuid::new_v4(), UserRole::Customer).unwrap();
    let jti = auth.verify(&pair.refresh_token, TokenType::Refresh).await.unwrap().jti.unwrap();

    assert!(auth.revoke(&pair.refresh_token).await.unwrap());

    assert_eq!(denylist.identifiers(), vec![jti]);
    assert!(auth.verify(&pair.refresh_token, TokenType::Refresh).await.is_none());
    assert!(auth.renew_access_only(&pair.refresh_token).await.is_none());
    assert!(auth.renew_with_rotation(&pair.refresh_token).await.is_none());
    // Access tokens carry no identifier and stay valid until they expire.
    assert!(auth.verify(&pair.access_token, TokenType::Access).await.is_some());
}

#[actix_rt::test]
async fn access_and_forged_tokens_cannot_be_revoked() {
    let (auth, denylist) = memory_authenticator();
    let pair = auth.issue_pair(&Uuid::new_v4(), UserRole::Customer).unwrap();

    assert!(!auth.revoke(&pair.access_token).await.unwrap());

    let other = JwtCodec::new(b"another_secret_that_is_also_long_enough_123456", Algorithm::HS256);
    let forged = other.encode(&claims(TokenType::Refresh, 600)).unwrap();
    assert!(!auth.revoke(&forged).await.unwrap());

    assert!(!auth.revoke("garbage").await.unwrap());
    assert!(denylist.is_empty());
}

#[actix_rt::test]
async fn expired_refresh_token_is_still_revocable() {
    let denylist = InMemoryDenylist::new();
    let auth = authenticator_with(
        Arc::new(denylist.clone()),
        Duration::seconds(1),
        Duration::seconds(1),
    );
    let pair = auth.issue_pair(&Uuid::new_v4(), UserRole::Customer).unwrap();

    tokio::time::sleep(StdDuration::from_millis(2100)).await;

    assert!(auth.verify(&pair.refresh_token, TokenType::Refresh).await.is_none());
    assert!(auth.revoke(&pair.refresh_token).await.unwrap());
    // Nothing left to deny once the token is past its expiry.
    assert!(denylist.is_empty());
}

#[actix_rt::test]
async fn access_only_renewal_keeps_refresh_token_usable() {
    let (auth, denylist) = memory_authenticator();
    let subject = Uuid::new_v4();
    let pair = auth.issue_pair(&subject, UserRole::Customer).unwrap();

    let renewed = auth.renew_access_only(&pair.refresh_token).await.unwrap();
    let claims = auth.verify(&renewed.access_token, TokenType::Access).await.unwrap();

    assert_eq!(claims.sub, subject.to_string());
    assert!(auth.verify(&pair.refresh_token, TokenType::Refresh).await.is_some());
    assert!(denylist.is_empty());
}

#[actix_rt::test]
async fn rotation_reports_the_predecessor_identifier() {
    let (auth, denylist) = memory_authenticator();
    let pair = auth.issue_pair(&Uuid::new_v4(), UserRole::Customer).unwrap();
    let old_jti = auth.verify(&pair.refresh_token, TokenType::Refresh).await.unwrap().jti.unwrap();

    let rotated = auth.renew_with_rotation(&pair.refresh_token).await.unwrap();
    let new_jti = auth.verify(&rotated.refresh_token, TokenType::Refresh).await.unwrap().jti.unwrap();

    assert_eq!(rotated.old_jti, old_jti);
    assert_ne!(new_jti, old_jti);
    // Revoking the predecessor is left to the caller.
    assert!(denylist.is_empty());
}

#[actix_rt::test]
async fn remaining_lifetime_matches_token_class() {
    let (auth, _) = memory_authenticator();
    let pair = auth.issue_pair(&Uuid::new_v4(), UserRole::Customer).unwrap();

    let ttl = auth.remaining_lifetime(&pair.refresh_token, TokenType::Refresh).unwrap();
    assert!(ttl > 0 && ttl <= Duration::days(7).num_seconds());
    assert!(auth.remaining_lifetime(&pair.refresh_token, TokenType::Access).is_none());
    assert!(auth.remaining_lifetime("garbage", TokenType::Refresh).is_none());
}

#[actix_rt::test]
async fn unreachable_denylist_fails_closed() {
    let mut denylist = MockDenylist::new();
    denylist
        .expect_contains()
        .returning(|_| Err(DenylistError::Timeout(StdDuration::from_millis(50))));
    let auth = authenticator(Arc::new(denylist));

    let pair = auth.issue_pair(&Uuid::new_v4(), UserRole::Customer).unwrap();

    assert!(auth.verify(&pair.refresh_token, TokenType::Refresh).await.is_none());
    assert!(auth.renew_access_only(&pair.refresh_token).await.is_none());
    assert!(auth.renew_with_rotation(&pair.refresh_token).await.is_none());
    // Access tokens never touch the denylist.
    assert!(auth.verify(&pair.access_token, TokenType::Access).await.is_some());
}

#[actix_rt::test]
async fn failed_denylist_write_is_reported() {
    let mut denylist = MockDenylist::new();
    denylist
        .expect_add()
        .times(1)
        .returning(|_, _| Err(DenylistError::Connection("connection refused".into())));
    let auth = authenticator(Arc::new(denylist));

    let pair = auth.issue_pair(&Uuid::new_v4(), UserRole::Customer).unwrap();

    let result = auth.revoke(&pair.refresh_token).await;
    assert!(matches!(result, Err(AuthError::DenylistUnavailable(_))));
}

#[actix_rt::test]
async fn revoke_identifier_skips_non_positive_ttl() {
    let mut denylist = MockDenylist::new();
    denylist.expect_add().never();
    let auth = authenticator(Arc::new(denylist));

    auth.revoke_identifier("some-jti", 0).await.unwrap();
    auth.revoke_identifier("some-jti", -5).await.unwrap();
}

#[actix_rt::test]
async fn revoke_denylists_for_the_remaining_lifetime() {
    let week = Duration::days(7).num_seconds();
    let mut denylist = MockDenylist::new();
    denylist
        .expect_add()
        .withf(move |_, ttl| (week - 5..=week).contains(ttl))
        .times(1)
        .returning(|_, _| Ok(()));
    let auth = authenticator(Arc::new(denylist));

    let pair = auth.issue_pair(&Uuid::new_v4(), UserRole::Customer).unwrap();

    assert!(auth.revoke(&pair.refresh_token).await.unwrap());
}

#[actix_rt::test]
async fn oversized_lifetime_fails_to_mint_instead_of_panicking() {
    let denylist = Arc::new(InMemoryDenylist::new());
    let auth = JwtAuthenticator::from_parts(
        codec(),
        TokenLifetimes {
            access: Duration::minutes(15),
            refresh: Duration::MAX,
        },
        test_password_params(),
        denylist.clone(),
    );

    let result = auth.issue_pair(&Uuid::new_v4(), UserRole::Customer);
    assert!(matches!(result, Err(AuthError::TokenCreation)));

    let mut config = test_config();
    config.refresh_token_exp_days = 200_000_000;
    let auth = JwtAuthenticator::new(&config, denylist);
    assert!(matches!(
        auth.issue_pair(&Uuid::new_v4(), UserRole::Customer),
        Err(AuthError::TokenCreation)
    ));
}

#[actix_rt::test]
async fn out_of_range_ttl_is_an_error_not_a_panic() {
    let (auth, denylist) = memory_authenticator();

    let result = auth.revoke_identifier("far-future", i64::MAX).await;

    assert!(matches!(result, Err(AuthError::DenylistUnavailable(_))));
    assert!(denylist.is_empty());
}

#[test]
fn library_errors_carry_context_into_anyhow() {
    use anyhow::Context;

    let write: Result<(), DenylistError> = Err(DenylistError::Connection("refused".into()));
    let err = write.context("Failed to create Redis pool").unwrap_err();
    assert_eq!(err.to_string(), "Failed to create Redis pool");
    assert!(err.root_cause().to_string().contains("refused"));

    let mint: Result<(), AuthError> = Err(AuthError::TokenCreation);
    assert!(mint.context("Token issue failed").is_err());
}
