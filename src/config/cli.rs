use clap::Parser;
use std::path::PathBuf;

/// Mist preload bridge: relays page messages to the host over stdio.
#[derive(Debug, Parser)]
#[command(name = "mist-bridge", about)]
pub struct CliArgs {
    /// Path to the bridge config JSON file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Origin of the page the bridge is injected into.
    #[arg(long)]
    pub origin: Option<String>,

    /// Locale answered to the page's language query.
    #[arg(long)]
    pub language: Option<String>,
}
