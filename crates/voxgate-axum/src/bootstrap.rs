//! Axum server bootstrap - the composition root.
//!
//! This module is the ONLY place where infrastructure is wired together
//! for the Axum web adapter. All concrete implementations are instantiated here.

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use voxgate_auth::JwtVerifier;
use voxgate_core::{
    ConcurrencyLimiter, GatePolicy, GateSettings, LockManager, LockStore, MemoryLockStore,
    SpeechSynthesizer, StoreFailureMode, TokenVerifier, Transcriber, TtsProvider,
    validate_settings,
};
use voxgate_redis::RedisLockStore;

use crate::speech::{HttpSpeechSynthesizer, HttpTranscriber, UnconfiguredSpeech};

/// CORS configuration for the web server.
#[derive(Debug, Clone, Default)]
pub enum CorsConfig {
    /// Allow all origins (development mode).
    #[default]
    AllowAll,
    /// Allow specific origins (production mode).
    AllowOrigins(Vec<String>),
}

/// Which coordination store backs the per-user locks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockStoreBackend {
    /// Shared Redis server; locks hold across every instance using it.
    Redis { url: String },
    /// Process-local map; locks only hold within this process.
    Memory,
}

/// Server configuration for the Axum adapter.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind.
    pub host: String,
    /// Port for the HTTP server.
    pub port: u16,
    pub lock_store: LockStoreBackend,
    /// HMAC secret shared with the token issuer.
    pub jwt_secret: String,
    /// HS256, HS384 or HS512.
    pub jwt_algorithm: String,
    pub jwt_issuer: Option<String>,
    /// Base URL of the TTS server; `None` disables synthesis.
    pub tts_server: Option<String>,
    /// Base URL of the STT server; `None` disables transcription.
    pub stt_server: Option<String>,
    /// TTS voice; the provider default when unset.
    pub tts_voice: Option<String>,
    pub settings: GateSettings,
    /// CORS configuration.
    pub cors: CorsConfig,
}

impl ServerConfig {
    /// Config with defaults and the given JWT secret.
    pub fn with_defaults(jwt_secret: impl Into<String>) -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            lock_store: LockStoreBackend::Redis {
                url: "redis://localhost:6379/0".to_string(),
            },
            jwt_secret: jwt_secret.into(),
            jwt_algorithm: "HS256".to_string(),
            jwt_issuer: None,
            tts_server: None,
            stt_server: None,
            tts_voice: None,
            settings: GateSettings::with_defaults(),
            cors: CorsConfig::default(),
        }
    }

    /// The TTS provider actually in effect. Without a TTS server only the
    /// local Pocket provider makes sense.
    pub fn effective_tts_provider(&self) -> TtsProvider {
        if self.tts_server.as_deref().is_none_or(str::is_empty) {
            TtsProvider::Pocket
        } else {
            self.settings.tts_provider
        }
    }
}

/// Application context for the Axum adapter.
///
/// Holds every shared service the gate and handlers need. No process-wide
/// globals: everything reaches handlers through `AppState`.
pub struct AxumContext {
    pub lock_manager: Arc<LockManager>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub policy: GatePolicy,
    pub failure_mode: StoreFailureMode,
    /// Process-local cap on concurrent synthesis.
    pub limiter: ConcurrencyLimiter,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub transcriber: Arc<dyn Transcriber>,
    pub tts_provider: TtsProvider,
}

fn build_lock_store(backend: &LockStoreBackend) -> Result<Arc<dyn LockStore>> {
    let store: Arc<dyn LockStore> = match backend {
        LockStoreBackend::Redis { url } => {
            Arc::new(RedisLockStore::new(url).context("Failed to configure Redis lock store")?)
        }
        LockStoreBackend::Memory => {
            warn!("Using in-memory lock store; locks are not shared between instances");
            Arc::new(MemoryLockStore::new())
        }
    };
    Ok(store)
}

fn build_verifier(config: &ServerConfig) -> Result<Arc<dyn TokenVerifier>> {
    let algorithm = JwtVerifier::parse_algorithm(&config.jwt_algorithm)?;
    let mut verifier = JwtVerifier::with_algorithm(config.jwt_secret.as_bytes(), algorithm)
        .context("Invalid JWT configuration")?;
    if let Some(issuer) = &config.jwt_issuer {
        verifier = verifier.with_issuer(issuer.clone());
    }
    Ok(Arc::new(verifier))
}

/// Bootstrap the Axum server with all services.
///
/// No network I/O happens here: the lock store connects on first use.
pub fn bootstrap(config: &ServerConfig) -> Result<AxumContext> {
    validate_settings(&config.settings).context("Invalid gate settings")?;

    let store = build_lock_store(&config.lock_store)?;
    let lock_manager = Arc::new(LockManager::new(
        store,
        config.settings.lock_manager_config(),
    ));
    let verifier = build_verifier(config)?;

    let tts_provider = config.effective_tts_provider();
    let synthesizer: Arc<dyn SpeechSynthesizer> = match config.tts_server.as_deref() {
        Some(url) if !url.is_empty() => {
            let voice = config
                .tts_voice
                .clone()
                .unwrap_or_else(|| tts_provider.default_voice().to_string());
            Arc::new(HttpSpeechSynthesizer::new(url, voice)?)
        }
        _ => Arc::new(UnconfiguredSpeech::tts()),
    };
    let transcriber: Arc<dyn Transcriber> = match config.stt_server.as_deref() {
        Some(url) if !url.is_empty() => Arc::new(HttpTranscriber::new(url)?),
        _ => Arc::new(UnconfiguredSpeech::stt()),
    };

    let policy = config.settings.gate_policy();
    info!(
        lock_store = lock_manager.store().backend_name(),
        gated_routes = policy.routes().len(),
        failure_mode = ?config.settings.store_failure_mode,
        tts_provider = tts_provider.as_str(),
        "Bootstrapped voxgate"
    );

    Ok(AxumContext {
        lock_manager,
        verifier,
        policy,
        failure_mode: config.settings.store_failure_mode,
        limiter: ConcurrencyLimiter::new(config.settings.max_concurrent_synthesis),
        synthesizer,
        transcriber,
        tts_provider,
    })
}

/// Start the web server and run until `shutdown` resolves.
///
/// In-flight requests finish before the lock store connection is closed.
pub async fn start_server(
    config: ServerConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    use tokio::net::TcpListener;

    let ctx = bootstrap(&config)?;
    let lock_manager = Arc::clone(&ctx.lock_manager);
    let app = crate::routes::create_router(ctx, &config.cors);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("voxgate listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    lock_manager.close().await;
    info!("voxgate stopped");
    Ok(())
}
