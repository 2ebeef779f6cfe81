//! Shared fixtures for voxgate-axum integration tests.
//!
//! Builds an `AxumContext` by hand around an in-memory lock store so tests
//! can count store operations and pre-seed held locks.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::Request;
use bytes::Bytes;
use http_body_util::BodyExt;

use voxgate_auth::JwtVerifier;
use voxgate_core::{
    ConcurrencyLimiter, GatePolicy, LockManager, LockManagerConfig, LockStore, MemoryLockStore,
    RetryPolicy, SpeechError, SpeechSynthesizer, StoreFailureMode, SynthesizedAudio, Transcriber,
    TtsProvider,
};
use voxgate_axum::{AxumContext, CorsConfig, create_router};

pub const TEST_SECRET: &[u8] = b"integration-test-secret";

/// Synthesizer returning a fixed WAV header, or failing on demand.
#[derive(Default)]
pub struct StubSynthesizer {
    pub fail: AtomicBool,
}

#[async_trait]
impl SpeechSynthesizer for StubSynthesizer {
    async fn synthesize(&self, _text: &str) -> Result<SynthesizedAudio, SpeechError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(SpeechError::Unavailable("stub provider down".to_string()));
        }
        Ok(SynthesizedAudio {
            content_type: "audio/wav".to_string(),
            data: Bytes::from_static(b"RIFF"),
        })
    }
}

pub struct StubTranscriber;

#[async_trait]
impl Transcriber for StubTranscriber {
    async fn transcribe(&self, _audio: Bytes) -> Result<Option<String>, SpeechError> {
        Ok(Some("hello".to_string()))
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryLockStore>,
    pub lock_manager: Arc<LockManager>,
    pub verifier: Arc<JwtVerifier>,
    pub synthesizer: Arc<StubSynthesizer>,
}

impl TestApp {
    pub fn token(&self, subject: &str) -> String {
        self.verifier
            .issue(subject, Duration::from_secs(600))
            .expect("issue test token")
    }
}

pub struct TestOptions {
    pub failure_mode: StoreFailureMode,
    pub tts_provider: TtsProvider,
    pub retry: RetryPolicy,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            failure_mode: StoreFailureMode::FailClosed,
            tts_provider: TtsProvider::Pocket,
            retry: RetryPolicy::default(),
        }
    }
}

pub fn test_app() -> TestApp {
    test_app_with(TestOptions::default())
}

pub fn test_app_with(options: TestOptions) -> TestApp {
    let store = Arc::new(MemoryLockStore::new());
    let dyn_store: Arc<dyn LockStore> = store.clone();
    let lock_manager = Arc::new(LockManager::new(
        dyn_store,
        LockManagerConfig {
            retry: options.retry,
            ..LockManagerConfig::default()
        },
    ));
    let verifier = Arc::new(JwtVerifier::new(TEST_SECRET).expect("test verifier"));
    let synthesizer = Arc::new(StubSynthesizer::default());

    let ctx = AxumContext {
        lock_manager: Arc::clone(&lock_manager),
        verifier: verifier.clone(),
        policy: GatePolicy::default(),
        failure_mode: options.failure_mode,
        limiter: ConcurrencyLimiter::default(),
        synthesizer: synthesizer.clone(),
        transcriber: Arc::new(StubTranscriber),
        tts_provider: options.tts_provider,
    };

    TestApp {
        router: create_router(ctx, &CorsConfig::AllowAll),
        store,
        lock_manager,
        verifier,
        synthesizer,
    }
}

pub fn tts_request(auth: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/v1/tts/")
        .header("content-type", "application/json");
    if let Some(auth) = auth {
        builder = builder.header("authorization", auth);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Assert the response body is valid JSON and return the parsed value.
pub async fn parse_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap_or_else(|e| panic!("Expected valid JSON body: {e}"))
}
