//! Integration tests for the per-user lock gate.
//!
//! These tests verify:
//!  - Gated routes reject missing/invalid credentials with 401 before any
//!    lock store I/O.
//!  - A request holding the lock runs and releases it afterwards, whatever
//!    the handler outcome.
//!  - A second request for the same user and lock gets 429 once the retry
//!    budget runs out, while another user is unaffected.
//!  - Lock store outages give 503 (fail-closed) or pass through (fail-open).
//!  - Ungated routes never touch the lock store.

mod common;

use std::sync::atomic::Ordering;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use tower::ServiceExt;

use common::{TestOptions, parse_json, test_app, test_app_with, tts_request};
use voxgate_core::{LockName, RetryPolicy, StoreFailureMode, TtsProvider, UserId};

// ── Authentication ────────────────────────────────────────────────────────────

#[tokio::test]
async fn tts_without_credential_is_401_with_no_store_io() {
    let app = test_app();

    let response = app
        .router
        .oneshot(tts_request(None, r#"{"text":"hi"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
        "Bearer"
    );
    assert_eq!(app.store.operation_count(), 0);

    let json = parse_json(response).await;
    assert_eq!(json["error"], "Authentication required");
    assert_eq!(json["status"], 401);
}

#[tokio::test]
async fn tts_with_forged_token_is_401_with_no_store_io() {
    let app = test_app();

    for auth in ["Bearer not-a-jwt", "Basic dXNlcjpwYXNz", "Bearer "] {
        let response = app
            .router
            .clone()
            .oneshot(tts_request(Some(auth), r#"{"text":"hi"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "auth: {auth}");
    }
    assert_eq!(app.store.operation_count(), 0);
}

// ── Lock lifecycle ────────────────────────────────────────────────────────────

#[tokio::test]
async fn tts_with_token_returns_audio_and_releases_lock() {
    let app = test_app();
    let auth = format!("Bearer {}", app.token("alice"));

    let response = app
        .router
        .clone()
        .oneshot(tts_request(Some(&auth), r#"{"text":"hello there"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "audio/wav"
    );
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"RIFF");

    // One SET, one DEL.
    assert_eq!(app.store.operation_count(), 2);
    assert!(!app.store.contains("tts:lock:alice"));
}

#[tokio::test]
async fn lock_released_after_handler_error() {
    let app = test_app();
    let auth = format!("Bearer {}", app.token("alice"));

    // Provider failure.
    app.synthesizer.fail.store(true, Ordering::SeqCst);
    let response = app
        .router
        .clone()
        .oneshot(tts_request(Some(&auth), r#"{"text":"hello"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(!app.store.contains("tts:lock:alice"));

    // Validation failure inside the handler.
    app.synthesizer.fail.store(false, Ordering::SeqCst);
    let response = app
        .router
        .clone()
        .oneshot(tts_request(Some(&auth), r#"{"text":"   "}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(!app.store.contains("tts:lock:alice"));
}

#[tokio::test(start_paused = true)]
async fn concurrent_request_for_same_user_is_429() {
    let app = test_app();
    let auth = format!("Bearer {}", app.token("alice"));

    // Another instance (or request) already holds alice's tts lock.
    let held = app
        .lock_manager
        .acquire(&UserId::new("alice").unwrap(), &LockName::tts())
        .await
        .unwrap();

    let response = app
        .router
        .clone()
        .oneshot(tts_request(Some(&auth), r#"{"text":"hello"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let json = parse_json(response).await;
    assert_eq!(
        json["error"],
        "Another TTS operation is currently in progress. Please wait."
    );
    assert_eq!(json["status"], 429);

    // The holder's record is untouched by the rejected request.
    assert!(app.store.contains("tts:lock:alice"));
    held.release().await;
}

#[tokio::test(start_paused = true)]
async fn other_users_are_not_blocked() {
    let app = test_app();
    let _held = app
        .lock_manager
        .acquire(&UserId::new("alice").unwrap(), &LockName::tts())
        .await
        .unwrap();

    let auth = format!("Bearer {}", app.token("bob"));
    let response = app
        .router
        .clone()
        .oneshot(tts_request(Some(&auth), r#"{"text":"hello"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test(start_paused = true)]
async fn waiting_request_succeeds_once_holder_releases() {
    let app = test_app_with(TestOptions {
        retry: RetryPolicy::new(7, Duration::from_millis(100), Duration::from_secs(4)),
        ..TestOptions::default()
    });
    let held = app
        .lock_manager
        .acquire(&UserId::new("alice").unwrap(), &LockName::tts())
        .await
        .unwrap();

    let auth = format!("Bearer {}", app.token("alice"));
    let request = tokio::spawn(
        app.router
            .clone()
            .oneshot(tts_request(Some(&auth), r#"{"text":"hello"}"#)),
    );

    tokio::time::sleep(Duration::from_millis(250)).await;
    held.release().await;

    let response = request.await.unwrap().unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!app.store.contains("tts:lock:alice"));
}

// ── Lock store outages ────────────────────────────────────────────────────────

#[tokio::test]
async fn store_outage_fails_closed_with_503() {
    let app = test_app();
    app.store.set_unavailable(true);
    let auth = format!("Bearer {}", app.token("alice"));

    let response = app
        .router
        .clone()
        .oneshot(tts_request(Some(&auth), r#"{"text":"hello"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    // No retry loop on a store failure.
    assert_eq!(app.store.operation_count(), 1);
}

#[tokio::test]
async fn store_outage_can_fail_open() {
    let app = test_app_with(TestOptions {
        failure_mode: StoreFailureMode::FailOpen,
        ..TestOptions::default()
    });
    app.store.set_unavailable(true);
    let auth = format!("Bearer {}", app.token("alice"));

    let response = app
        .router
        .clone()
        .oneshot(tts_request(Some(&auth), r#"{"text":"hello"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

// ── Ungated routes ────────────────────────────────────────────────────────────

#[tokio::test]
async fn sample_rate_is_ungated_and_reports_provider_rate() {
    let app = test_app_with(TestOptions {
        tts_provider: TtsProvider::Gradium,
        ..TestOptions::default()
    });

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/v1/tts/sample_rate")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = parse_json(response).await;
    assert_eq!(json["sample_rate"], 48_000);
    assert_eq!(app.store.operation_count(), 0);
}

#[tokio::test]
async fn health_reports_lock_store_state() {
    let app = test_app();

    let request = || {
        Request::builder()
            .uri("/v1/health")
            .body(Body::empty())
            .unwrap()
    };

    let json = parse_json(app.router.clone().oneshot(request()).await.unwrap()).await;
    assert_eq!(json["lockStoreUp"], true);
    assert_eq!(json["sttUp"], true);
    assert_eq!(json["ttsUp"], true);

    app.store.set_unavailable(true);
    let json = parse_json(app.router.clone().oneshot(request()).await.unwrap()).await;
    assert_eq!(json["lockStoreUp"], false);
}

#[tokio::test]
async fn get_on_tts_path_is_not_gated() {
    let app = test_app();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/v1/tts/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(app.store.operation_count(), 0);
}

// ── Conversation (WebSocket) gate ─────────────────────────────────────────────

#[tokio::test]
async fn conversation_without_bearer_subprotocol_is_401() {
    let app = test_app();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/v1/user/new-conversation")
                .header(header::SEC_WEBSOCKET_PROTOCOL, "realtime")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(app.store.operation_count(), 0);
}

#[tokio::test]
async fn conversation_header_token_is_not_accepted() {
    let app = test_app();
    let auth = format!("Bearer {}", app.token("alice"));

    // The conversation route reads the sub-protocol, never the header.
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/v1/user/new-conversation")
                .header(header::AUTHORIZATION, auth)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn conversation_failed_upgrade_releases_stt_lock() {
    let app = test_app();
    let protocol = format!("Bearer.{}", app.token("alice"));

    // Authenticated but not a real upgrade: the gate takes the stt lock,
    // the upgrade extractor rejects the request, the lease is dropped.
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/v1/user/new-conversation")
                .header(header::SEC_WEBSOCKET_PROTOCOL, protocol)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
    assert_ne!(response.status(), StatusCode::UNAUTHORIZED);
    assert_ne!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(!app.store.contains("stt:lock:alice"));
    assert_eq!(app.store.operation_count(), 2);
}
