use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use mist_bridge::config::{BridgeConfig, CliArgs, ConfigBuilder, load_config};
use mist_bridge::page_api::{ProviderEmitter, ProviderEvent, ProviderEventKind};
use mist_bridge::relay::Bridge;
use mist_bridge::stdio_host::{self, ChannelWindow, PostSide, StdioHost, StdioInput};
use mist_bridge::{logging, runtime_paths};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    logging::init_logging()?;

    let cli = CliArgs::parse();
    let config_path = cli.config.or_else(runtime_paths::resolve_default_config);
    let file_config = match config_path.as_ref() {
        Some(path) => load_config(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => BridgeConfig::default(),
    };
    let resolved = ConfigBuilder::new(file_config, config_path)
        .origin(cli.origin)
        .language(cli.language)
        .build();
    resolved.log_startup_summary();

    let (tx, mut posted) = mpsc::unbounded_channel();
    let host = Arc::new(StdioHost::new(resolved.language.clone()));
    let relay_window = Arc::new(ChannelWindow::new(PostSide::Relay, tx.clone()));
    let page_window = Arc::new(ChannelWindow::new(PostSide::PageApi, tx));

    let provider = Arc::new(ProviderEmitter::new());
    for kind in [
        ProviderEventKind::Connect,
        ProviderEventKind::Close,
        ProviderEventKind::AccountsChanged,
        ProviderEventKind::ChainChanged,
    ] {
        provider.on(
            kind,
            Arc::new(|event: &ProviderEvent| stdio_host::emit_provider_event(event)),
        );
    }

    let mut bridge = Bridge::start(&resolved, host, relay_window, page_window, Some(provider))?;
    stdio_host::emit_ready(bridge.page_api().version());

    let mut results = JoinSet::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => match serde_json::from_str::<StdioInput>(&line) {
                    Ok(input) => stdio_host::handle_input(&bridge, input, &mut results),
                    Err(e) => stdio_host::emit_error(&format!("parse error: {e}")),
                },
                Ok(None) => break,
                Err(e) => {
                    tracing::error!(error = %e, "stdin read failed");
                    break;
                }
            },
            Some(post) = posted.recv() => stdio_host::handle_posted(&bridge, post),
            Some(joined) = results.join_next(), if !results.is_empty() => log_join(joined),
        }
    }

    // Deliver whatever was posted before stdin closed.
    while let Ok(post) = posted.try_recv() {
        stdio_host::handle_posted(&bridge, post);
    }
    bridge.shutdown();
    // Outstanding account calls now resolve as abandoned; let them report.
    while let Some(joined) = results.join_next().await {
        log_join(joined);
    }
    Ok(())
}

fn log_join(joined: Result<serde_json::Value, tokio::task::JoinError>) {
    if let Err(e) = joined {
        tracing::warn!(error = %e, "account result task failed");
    }
}
