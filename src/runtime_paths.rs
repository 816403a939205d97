use std::env;
use std::path::PathBuf;

const APP_DIR: &str = "MistBridge";
const CONFIG_FILE: &str = "bridge.json";

/// Resolve the directory for rolling log files.
///
/// Resolution order:
/// 1. `MIST_BRIDGE_LOG_DIR` environment variable
/// 2. Platform local data dir (`~/.local/share/MistBridge/logs` etc.)
/// 3. `./logs` relative to the working directory
pub fn resolve_log_dir() -> PathBuf {
    if let Some(dir) = env_path("MIST_BRIDGE_LOG_DIR") {
        return dir;
    }
    dirs::data_local_dir()
        .map(|base| base.join(APP_DIR).join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

/// Resolve the config file used when `--config` is not given.
///
/// Resolution order:
/// 1. `MIST_BRIDGE_CONFIG` environment variable
/// 2. `<platform config dir>/MistBridge/bridge.json`, if it exists
pub fn resolve_default_config() -> Option<PathBuf> {
    if let Some(path) = env_path("MIST_BRIDGE_CONFIG") {
        return Some(path);
    }
    let candidate = dirs::config_dir()?.join(APP_DIR).join(CONFIG_FILE);
    if candidate.is_file() {
        Some(candidate)
    } else {
        None
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    let raw = env::var(key).ok()?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(PathBuf::from(trimmed))
    }
}
