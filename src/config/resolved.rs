use std::path::PathBuf;
use std::time::Duration;

use crate::page_api::PageApiConfig;

/// Single resolved configuration built once at startup.
///
/// Merges the JSON config file (`BridgeConfig`), CLI arguments and
/// environment variable overrides into one struct.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    // -- Page API metadata --
    pub page_api: PageApiConfig,

    // -- Page channel --
    pub origin: Option<String>,
    pub language: String,
    pub menu_flush_interval: Duration,

    // -- Paths --
    pub config_path: Option<PathBuf>,
}

impl ResolvedConfig {
    /// Log a summary of the resolved configuration at startup.
    pub fn log_startup_summary(&self) {
        tracing::info!(
            version = %self.page_api.version,
            platform = %self.page_api.platform,
            solidity = self.page_api.solidity_version.as_deref().unwrap_or("none"),
            origin = self.origin.as_deref().unwrap_or("*"),
            language = %self.language,
            flush_ms = self.menu_flush_interval.as_millis() as u64,
            config = ?self.config_path,
            "resolved configuration"
        );
    }
}
