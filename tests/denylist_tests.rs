
use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};
use std::time::{Duration, Instant};

use storefront_backend::{
    cache::{memory_denylist::InMemoryDenylist, redis_denylist::RedisDenylist},
    entities::{token::TokenType, user::UserRole},
    errors::DenylistError,
    repositories::{denylist::DenylistRepository, token::TokenServiceRepository},
    resilience::RetryPolicy,
    settings::DenylistBackend,
};
use test_utils::*;
use uuid::Uuid;

const FAST_RETRY: RetryPolicy = RetryPolicy {
    max_attempts: 3,
    initial_delay: Duration::from_millis(1),
    max_delay: Duration::from_millis(4),
};

#[actix_rt::test]
async fn memory_denylist_tracks_added_identifiers() {
    let denylist = InMemoryDenylist::new();

    denylist.add("jti-1", 60).await.unwrap();

    assert!(denylist.contains("jti-1").await.unwrap());
    assert!(!denylist.contains("jti-2").await.unwrap());
    assert_eq!(denylist.len(), 1);
}

#[actix_rt::test]
async fn memory_denylist_entries_expire() {
    let denylist = InMemoryDenylist::new();

    denylist.add("short-lived", 1).await.unwrap();
    assert!(denylist.contains("short-lived").await.unwrap());

    tokio::time::sleep(Duration::from_millis(1100)).await;

    assert!(!denylist.contains("short-lived").await.unwrap());
    assert!(denylist.is_empty());
}

#[actix_rt::test]
async fn memory_denylist_ignores_non_positive_ttl() {
    let denylist = InMemoryDenylist::new();

    denylist.add("zero", 0).await.unwrap();
    denylist.add("negative", -30).await.unwrap();

    assert!(!denylist.contains("zero").await.unwrap());
    assert!(!denylist.contains("negative").await.unwrap());
    assert!(denylist.is_empty());
}

#[actix_rt::test]
async fn memory_denylist_clones_share_entries() {
    let denylist = InMemoryDenylist::new();
    let clone = denylist.clone();

    clone.add("shared", 60).await.unwrap();

    assert!(denylist.contains("shared").await.unwrap());
}

#[actix_rt::test]
async fn memory_denylist_rejects_ttl_past_the_clock() {
    let denylist = InMemoryDenylist::new();

    let result = denylist.add("far-future", i64::MAX).await;

    assert!(matches!(result, Err(DenylistError::Operation(_))));
    assert!(denylist.is_empty());
}

#[actix_rt::test]
async fn unreachable_redis_fails_closed() {
    let mut config = test_config();
    config.denylist_backend = DenylistBackend::Redis;
    config.redis_host = "127.0.0.1".to_string();
    config.redis_port = 1;
    config.redis_timeout_ms = 200;

    let denylist = RedisDenylist::from_config(&config).unwrap();
    assert!(denylist.ping().await.is_err());
    assert!(denylist.contains("any").await.is_err());

    let auth = authenticator(Arc::new(denylist));
    let pair = auth.issue_pair(&Uuid::new_v4(), UserRole::Customer).unwrap();

    assert!(auth.verify(&pair.refresh_token, TokenType::Refresh).await.is_none());
    assert!(auth.revoke(&pair.refresh_token).await.is_err());
}

#[actix_rt::test]
async fn redis_writes_retry_before_giving_up() {
    let mut config = test_config();
    config.denylist_backend = DenylistBackend::Redis;
    config.redis_host = "127.0.0.1".to_string();
    config.redis_port = 1;
    config.redis_timeout_ms = 200;
    let denylist = RedisDenylist::from_config(&config).unwrap();

    // Reads are never retried.
    let started = Instant::now();
    assert!(denylist.contains("any").await.is_err());
    assert!(started.elapsed() < Duration::from_millis(300));

    // Three write attempts sleep 100ms then 200ms between them.
    let started = Instant::now();
    assert!(denylist.add("jti", 60).await.is_err());
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(300), "gave up after {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(5), "took {:?}", elapsed);
}

#[actix_rt::test]
async fn retry_stops_after_max_attempts() {
    let calls = AtomicU32::new(0);

    let result: Result<(), String> = FAST_RETRY
        .run("always failing", |_| true, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err("boom".to_string()) }
        })
        .await;

    assert_eq!(result, Err("boom".to_string()));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[actix_rt::test]
async fn retry_returns_first_success() {
    let calls = AtomicU32::new(0);

    let result: Result<u32, String> = FAST_RETRY
        .run("flaky", |_| true, || {
            let attempt = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if attempt < 2 {
                    Err("not yet".to_string())
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

    assert_eq!(result, Ok(2));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[actix_rt::test]
async fn retry_skips_permanent_errors() {
    let calls = AtomicU32::new(0);

    let result: Result<(), String> = FAST_RETRY
        .run("permanent", |e: &String| e != "permanent", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err("permanent".to_string()) }
        })
        .await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn retry_delay_doubles_up_to_the_cap() {
    let policy = RetryPolicy::STARTUP;

    assert_eq!(policy.delay_for(1), Duration::from_secs(2));
    assert_eq!(policy.delay_for(2), Duration::from_secs(4));
    assert_eq!(policy.delay_for(5), Duration::from_secs(32));
    assert_eq!(policy.delay_for(40), Duration::from_secs(32));

    assert_eq!(RetryPolicy::DENYLIST.delay_for(2), Duration::from_millis(200));
    assert_eq!(RetryPolicy::DENYLIST.delay_for(4), Duration::from_millis(500));
}
