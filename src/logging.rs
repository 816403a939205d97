use anyhow::{Context, Result};
use std::sync::OnceLock;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::runtime_paths;

static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LogProfile {
    Dev,
    User,
    All,
}

/// Install the global subscriber: stderr plus a daily-rolling file.
///
/// Stdout is reserved for the NDJSON host protocol, so nothing is logged there.
pub fn init_logging() -> Result<()> {
    let profile = resolve_profile();
    let filter_spec = resolve_filter_spec(profile);
    let log_dir = runtime_paths::resolve_log_dir();
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create log dir {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "mist-bridge.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    FILE_GUARD
        .set(guard)
        .map_err(|_| anyhow::anyhow!("logging guard was already initialized"))?;

    // If another logger has already been installed, keep going; tracing still works.
    let _ = tracing_log::LogTracer::init();

    let env_filter = EnvFilter::try_new(filter_spec.clone())
        .with_context(|| format!("invalid log filter: {filter_spec}"))?;

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .with(
            fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_thread_ids(true)
                .with_thread_names(true),
        );
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to initialize tracing subscriber")?;

    tracing::info!(
        profile = ?profile,
        filter = %filter_spec,
        log_dir = %log_dir.display(),
        "logging initialized"
    );
    Ok(())
}

fn resolve_profile() -> LogProfile {
    if let Ok(raw) = std::env::var("MIST_BRIDGE_LOG_PROFILE") {
        if let Some(profile) = parse_profile(&raw) {
            return profile;
        }
    }

    if cfg!(debug_assertions) || std::env::var_os("CARGO").is_some() {
        LogProfile::Dev
    } else {
        LogProfile::User
    }
}

fn parse_profile(raw: &str) -> Option<LogProfile> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "dev" => Some(LogProfile::Dev),
        "user" => Some(LogProfile::User),
        "all" => Some(LogProfile::All),
        _ => None,
    }
}

fn resolve_filter_spec(profile: LogProfile) -> String {
    for key in ["RUST_LOG", "MIST_BRIDGE_LOG"] {
        if let Ok(raw) = std::env::var(key) {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                return trimmed.to_string();
            }
        }
    }
    default_filter(profile).to_string()
}

fn default_filter(profile: LogProfile) -> &'static str {
    match profile {
        LogProfile::Dev => "off,mist_bridge=trace",
        LogProfile::User => "warn,mist_bridge=info",
        LogProfile::All => "trace",
    }
}
