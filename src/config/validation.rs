use anyhow::{Result, bail};

use super::app_config::{BridgeConfig, extract_semver};

/// Validate a `BridgeConfig` after deserialization.
///
/// Returns an error if:
/// - `version` is empty
/// - `menuFlushIntervalMs` is 0
/// - `solcVersion` is set but contains no `N.N.N` version
/// - `origin` is set but is not an http(s) or file origin
pub fn validate_bridge_config(config: &BridgeConfig) -> Result<()> {
    if config.version.trim().is_empty() {
        bail!("version must not be empty");
    }

    if config.menuFlushIntervalMs == 0 {
        bail!("menuFlushIntervalMs must not be 0");
    }

    if let Some(solc) = config.solcVersion.as_deref() {
        if extract_semver(solc).is_none() {
            bail!("solcVersion does not contain a version number: {solc:?}");
        }
    }

    if let Some(origin) = config.origin.as_deref() {
        let lower = origin.to_ascii_lowercase();
        if lower != "null"
            && !lower.starts_with("http://")
            && !lower.starts_with("https://")
            && !lower.starts_with("file://")
        {
            bail!("origin must start with http://, https://, or file://: {origin:?}");
        }
    }

    Ok(())
}
