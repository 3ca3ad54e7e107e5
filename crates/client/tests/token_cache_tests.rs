//! Tests for the client-credentials token cache.
//!
//! Covers cache hits without I/O, expiry with the 300 s safety margin,
//! invalidation, exchange failures and timeouts, and coalescing of concurrent
//! refreshes, including failed ones.

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use common::*;
use nuvem_fiscal_client::TokenError;
use wiremock::matchers::{body_string_contains, header, method, path};

#[tokio::test]
async fn test_cache_hit_avoids_second_exchange() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 3600, 1).await;

    let cache = token_cache(&server, ManualClock::shared(T0));

    assert_eq!(cache.get_token().await.unwrap(), "tok-1");
    assert_eq!(cache.get_token().await.unwrap(), "tok-1");
    assert_eq!(cache.state(), TokenState::Warm);
}

#[tokio::test]
async fn test_exchange_sends_client_credentials_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("client_id=test-client-id"))
        .and(body_string_contains("client_secret=test-client-secret"))
        .and(body_string_contains("scope=empresa+cep+cnpj"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_response("tok", 3600)))
        .expect(1)
        .mount(&server)
        .await;

    let cache = token_cache(&server, ManualClock::shared(T0));
    assert_eq!(cache.get_token().await.unwrap(), "tok");
}

#[tokio::test]
async fn test_safety_margin_applied_to_expiry() {
    let server = MockServer::start().await;
    mount_token(&server, "tok", 600, 1).await;

    let cache = token_cache(&server, ManualClock::shared(T0));
    cache.get_token().await.unwrap();

    assert_eq!(cache.expires_at_millis(), Some(T0 + 300_000));
}

#[tokio::test]
async fn test_hourly_token_lifecycle() {
    let server = MockServer::start().await;
    mount_token_times(&server, "first", 3600, 1).await;
    mount_token(&server, "second", 3600, 1).await;

    let clock = ManualClock::shared(T0);
    let cache = token_cache(&server, Arc::clone(&clock));

    assert_eq!(cache.get_token().await.unwrap(), "first");
    assert_eq!(cache.expires_at_millis(), Some(T0 + 3_300_000));

    clock.advance_secs(50 * 60);
    assert_eq!(cache.get_token().await.unwrap(), "first");

    clock.set_millis(T0 + 55 * 60 * 1000 + 1000);
    assert_eq!(cache.state(), TokenState::Cold);
    assert_eq!(cache.get_token().await.unwrap(), "second");
}

#[tokio::test]
async fn test_expiry_boundary_is_exclusive() {
    let server = MockServer::start().await;
    mount_token(&server, "tok", 3600, 2).await;

    let clock = ManualClock::shared(T0);
    let cache = token_cache(&server, Arc::clone(&clock));
    cache.get_token().await.unwrap();

    clock.set_millis(T0 + 3_300_000 - 1);
    assert_eq!(cache.state(), TokenState::Warm);

    clock.set_millis(T0 + 3_300_000);
    assert_eq!(cache.state(), TokenState::Cold);
    cache.get_token().await.unwrap();
}

#[tokio::test]
async fn test_invalidate_is_idempotent_and_forces_exchange() {
    let server = MockServer::start().await;
    mount_token(&server, "tok", 3600, 2).await;

    let cache = token_cache(&server, ManualClock::shared(T0));
    cache.get_token().await.unwrap();

    cache.invalidate();
    cache.invalidate();
    assert_eq!(cache.state(), TokenState::Cold);
    assert_eq!(cache.expires_at_millis(), None);

    cache.get_token().await.unwrap();
    assert_eq!(cache.state(), TokenState::Warm);
}

#[tokio::test]
async fn test_invalidate_on_cold_cache_is_noop() {
    let server = MockServer::start().await;
    mount_token(&server, "tok", 3600, 0).await;

    let cache = token_cache(&server, ManualClock::shared(T0));
    cache.invalidate();
    assert_eq!(cache.state(), TokenState::Cold);
}

#[tokio::test]
async fn test_short_lifetime_token_is_returned_but_not_reused() {
    let server = MockServer::start().await;
    mount_token(&server, "short", 120, 2).await;

    let cache = token_cache(&server, ManualClock::shared(T0));

    assert_eq!(cache.get_token().await.unwrap(), "short");
    assert_eq!(cache.expires_at_millis(), Some(T0));
    assert_eq!(cache.state(), TokenState::Cold);
    assert_eq!(cache.get_token().await.unwrap(), "short");
}

#[tokio::test]
async fn test_rejected_credentials_are_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(serde_json::json!({"error": "invalid_client"})),
        )
        .expect(2)
        .mount(&server)
        .await;

    let cache = token_cache(&server, ManualClock::shared(T0));

    for _ in 0..2 {
        match cache.get_token().await {
            Err(TokenError::AuthenticationFailed { status, body }) => {
                assert_eq!(status, 401);
                assert!(body.contains("invalid_client"));
            }
            other => panic!("expected AuthenticationFailed, got {other:?}"),
        }
        assert_eq!(cache.state(), TokenState::Cold);
    }
}

#[tokio::test]
async fn test_token_endpoint_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&server)
        .await;

    let cache = token_cache(&server, ManualClock::shared(T0));
    let err = cache.get_token().await.unwrap_err();

    assert!(matches!(err, TokenError::RateLimited { .. }));
    assert_eq!(err.status(), Some(429));
}

#[tokio::test]
async fn test_success_without_access_token_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"expires_in": 3600})))
        .expect(1)
        .mount(&server)
        .await;

    let cache = token_cache(&server, ManualClock::shared(T0));
    let err = cache.get_token().await.unwrap_err();

    assert!(matches!(err, TokenError::AuthenticationFailed { status: 200, .. }));
    assert_eq!(cache.state(), TokenState::Cold);
}

#[tokio::test]
async fn test_unreachable_token_endpoint_is_transport_error() {
    let mut credentials = mock_credentials("http://127.0.0.1:1");
    credentials.token_url = "http://127.0.0.1:1/oauth/token".to_string();
    let cache = TokenCache::new(credentials, reqwest::Client::new());

    let err = cache.get_token().await.unwrap_err();
    assert!(matches!(err, TokenError::Transport(_)));
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn test_concurrent_callers_share_one_exchange() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(token_response("shared", 3600))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let cache = Arc::new(token_cache(&server, ManualClock::shared(T0)));

    let calls = (0..10).map(|_| {
        let cache = Arc::clone(&cache);
        tokio::spawn(async move { cache.get_token().await })
    });
    let results = futures::future::join_all(calls).await;

    for result in results {
        assert_eq!(result.unwrap().unwrap(), "shared");
    }
}

#[tokio::test]
async fn test_custom_safety_margin() {
    let server = MockServer::start().await;
    mount_token(&server, "tok", 600, 1).await;

    let cache = token_cache(&server, ManualClock::shared(T0)).with_safety_margin_secs(60);
    cache.get_token().await.unwrap();

    assert_eq!(cache.expires_at_millis(), Some(T0 + 540_000));
}

#[tokio::test]
async fn test_debug_output_omits_token() {
    let server = MockServer::start().await;
    mount_token(&server, "very-secret-access-token", 3600, 1).await;

    let cache = token_cache(&server, ManualClock::shared(T0));
    cache.get_token().await.unwrap();

    let debug = format!("{cache:?}");
    assert!(!debug.contains("very-secret-access-token"));
    assert!(!debug.contains("test-client-secret"));
    assert!(debug.contains("Warm"));
}

#[tokio::test]
async fn test_queued_callers_share_failed_exchange() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(
            ResponseTemplate::new(503)
                .set_body_string("indisponivel")
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let cache = Arc::new(token_cache(&server, ManualClock::shared(T0)));

    let start = Instant::now();
    let calls = (0..5).map(|_| {
        let cache = Arc::clone(&cache);
        tokio::spawn(async move { cache.get_token().await })
    });
    let results = futures::future::join_all(calls).await;
    let elapsed = start.elapsed();

    for result in results {
        match result.unwrap() {
            Err(TokenError::AuthenticationFailed { status, .. }) => assert_eq!(status, 503),
            other => panic!("expected AuthenticationFailed, got {other:?}"),
        }
    }
    assert!(
        elapsed < Duration::from_millis(900),
        "callers waited {elapsed:?}, expected about one exchange"
    );
    assert_eq!(cache.state(), TokenState::Cold);
}

#[tokio::test]
async fn test_rate_limited_exchange_is_not_repeated_by_waiters() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(429).set_delay(Duration::from_millis(200)))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_token(&server, "after-limit", 3600, 1).await;

    let cache = Arc::new(token_cache(&server, ManualClock::shared(T0)));

    let calls = (0..4).map(|_| {
        let cache = Arc::clone(&cache);
        tokio::spawn(async move { cache.get_token().await })
    });
    for result in futures::future::join_all(calls).await {
        assert!(matches!(result.unwrap(), Err(TokenError::RateLimited { .. })));
    }

    // A call that did not wait on the failed exchange tries again.
    assert_eq!(cache.get_token().await.unwrap(), "after-limit");
}

#[tokio::test]
async fn test_exchange_timeout_applies_without_client_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(token_response("late", 3600))
                .set_delay(Duration::from_secs(5)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let cache = token_cache(&server, ManualClock::shared(T0))
        .with_exchange_timeout(Duration::from_millis(200));

    let start = Instant::now();
    match cache.get_token().await {
        Err(TokenError::Transport(e)) => assert!(e.is_timeout()),
        other => panic!("expected Transport timeout, got {other:?}"),
    }
    assert!(start.elapsed() < Duration::from_secs(2));
    assert_eq!(cache.state(), TokenState::Cold);
}

#[tokio::test]
async fn test_invalidate_if_only_clears_matching_token() {
    let server = MockServer::start().await;
    mount_token(&server, "tok", 3600, 1).await;

    let cache = token_cache(&server, ManualClock::shared(T0));
    cache.get_token().await.unwrap();

    assert!(!cache.invalidate_if("other"));
    assert_eq!(cache.state(), TokenState::Warm);

    assert!(cache.invalidate_if("tok"));
    assert_eq!(cache.state(), TokenState::Cold);
    assert!(!cache.invalidate_if("tok"));
}
