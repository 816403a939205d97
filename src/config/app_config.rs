use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

/// Bridge configuration as read from the JSON file next to the shell's
/// package manifest.
#[derive(Debug, Deserialize, Clone)]
#[allow(non_snake_case)]
pub struct BridgeConfig {
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default = "default_license")]
    pub license: String,

    #[serde(default)]
    pub platform: Option<String>,

    /// Solidity compiler dependency spec, e.g. `^0.4.24`.
    #[serde(default)]
    pub solcVersion: Option<String>,

    #[serde(default)]
    pub language: Option<String>,

    #[serde(default)]
    pub origin: Option<String>,

    #[serde(default = "default_menu_flush_interval_ms")]
    pub menuFlushIntervalMs: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            license: default_license(),
            platform: None,
            solcVersion: None,
            language: None,
            origin: None,
            menuFlushIntervalMs: default_menu_flush_interval_ms(),
        }
    }
}

fn default_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_license() -> String {
    env!("CARGO_PKG_LICENSE").to_string()
}

fn default_menu_flush_interval_ms() -> u64 {
    500
}

pub(crate) const DEFAULT_LANGUAGE: &str = "en-US";

/// `N.N.N` with ASCII digits only.
static SEMVER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+\.[0-9]+\.[0-9]+").expect("semver pattern is valid"));

/// First `N.N.N` run in a dependency spec such as `^0.4.24` or `~0.5.1-nightly`.
pub fn extract_semver(spec: &str) -> Option<String> {
    SEMVER_RE.find(spec).map(|m| m.as_str().to_string())
}
