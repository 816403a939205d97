/// Layered configuration resolution for the bridge.
///
/// Resolution order (later wins):
/// 1. Config JSON (`BridgeConfig`): page metadata and channel defaults
/// 2. Environment variables (`MIST_BRIDGE_*`): per-session overrides
/// 3. CLI arguments: origin and language of the hosted page
mod app_config;
mod builder;
pub mod cli;
mod env;
mod resolved;
mod validation;

pub use app_config::{BridgeConfig, extract_semver};
pub use builder::ConfigBuilder;
pub use cli::CliArgs;
pub use resolved::ResolvedConfig;
pub use validation::validate_bridge_config;

use anyhow::{Context, Result};
use std::path::Path;

/// Load and validate a `BridgeConfig` from a JSON file.
pub fn load_config(path: &Path) -> Result<BridgeConfig> {
    let raw = std::fs::read_to_string(path).context("read config file")?;
    let cfg: BridgeConfig = serde_json::from_str(&raw).context("parse config file")?;
    validation::validate_bridge_config(&cfg)?;
    Ok(cfg)
}
