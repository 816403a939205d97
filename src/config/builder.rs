use std::path::PathBuf;
use std::time::Duration;

use super::app_config::{BridgeConfig, DEFAULT_LANGUAGE, extract_semver};
use super::env::{parse_string_env, parse_u64_env};
use super::resolved::ResolvedConfig;
use crate::page_api::PageApiConfig;

/// Builds a `ResolvedConfig` by layering:
/// CLI args → BridgeConfig (JSON file) → env var overrides → defaults.
pub struct ConfigBuilder {
    config: BridgeConfig,
    config_path: Option<PathBuf>,
    origin: Option<String>,
    language: Option<String>,
}

impl ConfigBuilder {
    pub fn new(config: BridgeConfig, config_path: Option<PathBuf>) -> Self {
        Self {
            config,
            config_path,
            origin: None,
            language: None,
        }
    }

    /// CLI override for the page origin; wins over file and env.
    pub fn origin(mut self, origin: Option<String>) -> Self {
        self.origin = origin;
        self
    }

    /// CLI override for the page language; wins over file and env.
    pub fn language(mut self, language: Option<String>) -> Self {
        self.language = language;
        self
    }

    pub fn build(self) -> ResolvedConfig {
        let config = self.config;

        // -- Page API metadata --
        let platform = config
            .platform
            .clone()
            .unwrap_or_else(|| std::env::consts::OS.to_string());
        let solidity_version = config.solcVersion.as_deref().and_then(extract_semver);
        let page_api = PageApiConfig {
            version: config.version.clone(),
            license: config.license.clone(),
            platform,
            solidity_version,
        };

        // -- Origin / language: CLI → env → file --
        let origin = self
            .origin
            .or_else(|| parse_string_env("MIST_BRIDGE_ORIGIN"))
            .or_else(|| config.origin.clone());
        let language = self
            .language
            .or_else(|| parse_string_env("MIST_BRIDGE_LANGUAGE"))
            .or_else(|| config.language.clone())
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

        // -- Flush interval: env override, never zero --
        let flush_ms = parse_u64_env("MIST_BRIDGE_FLUSH_MS")
            .filter(|ms| *ms > 0)
            .unwrap_or(config.menuFlushIntervalMs);

        ResolvedConfig {
            page_api,
            origin,
            language,
            menu_flush_interval: Duration::from_millis(flush_ms),
            config_path: self.config_path,
        }
    }
}
