//! Main CLI parser and top-level argument handling.
//!
//! Gate and server options are global so they can be given before or after
//! the subcommand.

use std::path::PathBuf;

use clap::{Args, Parser, ValueEnum};

use crate::commands::Commands;

/// Per-user lock gateway for speech services.
#[derive(Parser)]
#[command(name = "voxgate")]
#[command(about = "Per-user lock gateway for TTS/STT services")]
#[command(version)]
pub struct Cli {
    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub gate: GateArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Lock store backend selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LockStoreKind {
    Redis,
    Memory,
}

/// JWT options shared by `serve` and `issue-token`.
#[derive(Debug, Clone, Args)]
pub struct JwtArgs {
    /// HMAC secret used to verify (and issue) tokens
    #[arg(long, env = "VOXGATE_JWT_SECRET", global = true, hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// HS256, HS384 or HS512
    #[arg(long, env = "VOXGATE_JWT_ALGORITHM", default_value = "HS256", global = true)]
    pub jwt_algorithm: String,

    /// Required `iss` claim
    #[arg(long, env = "VOXGATE_JWT_ISSUER", global = true)]
    pub jwt_issuer: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct GateArgs {
    #[command(flatten)]
    pub jwt: JwtArgs,

    /// Address to bind
    #[arg(long, env = "VOXGATE_HOST", default_value = "0.0.0.0", global = true)]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "VOXGATE_PORT", default_value_t = 8000, global = true)]
    pub port: u16,

    /// Where per-user locks are kept
    #[arg(
        long,
        env = "VOXGATE_LOCK_STORE",
        value_enum,
        default_value_t = LockStoreKind::Redis,
        global = true
    )]
    pub lock_store: LockStoreKind,

    /// Full Redis URL; overrides host/port/db
    #[arg(long, env = "VOXGATE_REDIS_URL", global = true)]
    pub redis_url: Option<String>,

    #[arg(long, env = "VOXGATE_REDIS_HOST", default_value = "localhost", global = true)]
    pub redis_host: String,

    #[arg(long, env = "VOXGATE_REDIS_PORT", default_value_t = 6379, global = true)]
    pub redis_port: u16,

    #[arg(long, env = "VOXGATE_REDIS_DB", default_value_t = 0, global = true)]
    pub redis_db: u32,

    /// JSON settings file (retry budget, TTL, extra gated routes, ...)
    #[arg(long, env = "VOXGATE_SETTINGS", global = true)]
    pub settings: Option<PathBuf>,

    /// Lock record lifetime in seconds
    #[arg(long, env = "VOXGATE_LOCK_TTL_SECONDS", global = true)]
    pub lock_ttl_seconds: Option<u64>,

    /// Bound on each lock store call, in milliseconds
    #[arg(long, env = "VOXGATE_STORE_TIMEOUT_MS", global = true)]
    pub store_timeout_ms: Option<u64>,

    /// Serve gated requests without a lock when the store is down
    #[arg(long, env = "VOXGATE_FAIL_OPEN", global = true)]
    pub fail_open: bool,

    /// Concurrent synthesis operations per process
    #[arg(long, env = "VOXGATE_MAX_CONCURRENT_SYNTHESIS", global = true)]
    pub max_concurrent_synthesis: Option<usize>,

    /// TTS server base URL
    #[arg(long, env = "KYUTAI_TTS_SERVER", global = true)]
    pub tts_server: Option<String>,

    /// STT server base URL
    #[arg(long, env = "KYUTAI_STT_SERVER", global = true)]
    pub stt_server: Option<String>,

    /// pocket, gradium or dsm
    #[arg(long, env = "KYUTAI_TTS_PROVIDER", global = true)]
    pub tts_provider: Option<String>,

    /// Voice id; provider default when unset
    #[arg(long, env = "KYUTAI_TTS_VOICE_ID", global = true)]
    pub tts_voice: Option<String>,

    /// Allowed CORS origins (comma separated); all origins when unset
    #[arg(long, env = "VOXGATE_CORS_ORIGINS", value_delimiter = ',', global = true)]
    pub cors_origin: Vec<String>,
}
