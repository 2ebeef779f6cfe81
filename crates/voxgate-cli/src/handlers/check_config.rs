//! `voxgate check-config`

use anyhow::Result;

use voxgate_axum::{LockStoreBackend, ServerConfig, bootstrap};
use voxgate_core::GatedRoute;

use crate::error::CliError;
use crate::parser::GateArgs;

fn describe_route(route: &GatedRoute) -> String {
    format!(
        "{:<6} {:<32} lock={:<8} credential={:?}",
        route.method.as_deref().unwrap_or("*"),
        route.path,
        route.lock_name.as_str(),
        route.credential
    )
}

fn describe_store(config: &ServerConfig) -> String {
    match &config.lock_store {
        LockStoreBackend::Redis { url } => format!("redis ({url})"),
        LockStoreBackend::Memory => "memory (single instance only)".to_string(),
    }
}

/// Human-readable summary of the effective configuration. Never includes
/// the JWT secret.
pub fn summary(config: &ServerConfig) -> String {
    let settings = &config.settings;
    let mut lines = vec![
        format!("listen:          {}:{}", config.host, config.port),
        format!("lock store:      {}", describe_store(config)),
        format!("lock ttl:        {}s", settings.lock_ttl_seconds),
        format!(
            "retry:           {} attempts, {}ms base, {}ms cap (worst case {:?})",
            settings.retry.max_attempts,
            settings.retry.base_delay_ms,
            settings.retry.max_delay_ms,
            settings.retry.worst_case_wait()
        ),
        format!("store timeout:   {}ms", settings.store_timeout_ms),
        format!("on store outage: {:?}", settings.store_failure_mode),
        format!(
            "tts provider:    {} ({} Hz)",
            config.effective_tts_provider().as_str(),
            config.effective_tts_provider().sample_rate()
        ),
        format!("synthesis slots: {}", settings.max_concurrent_synthesis),
        "gated routes:".to_string(),
    ];
    lines.extend(
        settings
            .gate_policy()
            .routes()
            .iter()
            .map(|route| format!("  {}", describe_route(route))),
    );
    lines.join("\n")
}

pub async fn execute(args: &GateArgs, ping: bool, json: bool) -> Result<()> {
    let config = args.to_server_config()?;
    let ctx = bootstrap(&config)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&config.settings)?);
    } else {
        println!("{}", summary(&config));
    }

    if ping {
        let store = ctx.lock_manager.store();
        let timeout = ctx.lock_manager.config().store_timeout;
        match tokio::time::timeout(timeout, store.ping()).await {
            Ok(Ok(())) => println!("lock store:      reachable"),
            Ok(Err(e)) => return Err(CliError::StoreUnreachable(e.to_string()).into()),
            Err(_) => {
                let reason = format!("no reply within {timeout:?}");
                return Err(CliError::StoreUnreachable(reason).into());
            }
        }
    }
    Ok(())
}
