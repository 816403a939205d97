use anyhow::{Context, Result};
use serde_json::Value;
use std::sync::Arc;
use tokio::task::JoinHandle;

use super::Relay;
use crate::config::ResolvedConfig;
use crate::contract::{EMBEDDER_SET_WEBVIEW_ID, HostEvent, HostRequest};
use crate::page_api::{PageApi, ProviderEmitter};
use crate::transport::{HostTransport, PageWindow};

/// A relay plus the page API it serves, wired for one page lifetime.
pub struct Bridge {
    relay: Relay,
    page_api: PageApi,
    flush_task: Option<JoinHandle<()>>,
}

impl Bridge {
    /// Bring the bridge up for a freshly loaded page.
    ///
    /// `relay_window` is where the relay posts into the page; `page_window`
    /// is where the page API posts towards the relay. Must be called from
    /// within a tokio runtime, which drives the menu flush loop.
    pub fn start(
        config: &ResolvedConfig,
        host: Arc<dyn HostTransport>,
        relay_window: Arc<dyn PageWindow>,
        page_window: Arc<dyn PageWindow>,
        provider: Option<Arc<ProviderEmitter>>,
    ) -> Result<Self> {
        tokio::runtime::Handle::try_current()
            .context("bridge flush loop requires a tokio runtime")?;

        let relay = Relay::new(
            host,
            relay_window,
            config.origin.clone(),
            config.language.clone(),
        );

        announce(&relay);
        relay.attach();
        // A reloaded page must not inherit the previous provider session.
        if let Err(err) = relay.host().send(&HostRequest::DestroyProvider) {
            tracing::warn!(error = %err, "failed to tear down previous provider session");
        }

        let mut page_api = PageApi::new(
            config.page_api.clone(),
            page_window,
            config.origin.clone(),
        );
        if let Some(provider) = provider {
            page_api = page_api.with_provider(provider);
        }
        let flush_task = page_api.spawn_flush_loop(config.menu_flush_interval);

        announce(&relay);
        tracing::info!(
            version = page_api.version(),
            flush_ms = config.menu_flush_interval.as_millis() as u64,
            "bridge started"
        );

        Ok(Self {
            relay,
            page_api,
            flush_task: Some(flush_task),
        })
    }

    pub fn relay(&self) -> &Relay {
        &self.relay
    }

    pub fn page_api(&self) -> &PageApi {
        &self.page_api
    }

    /// A payload the page posted; only the relay listens for these.
    pub fn deliver_from_page(&self, raw: &str) {
        self.relay.on_page_message(raw);
    }

    /// Same as [`Bridge::deliver_from_page`] for an already-decoded payload.
    pub fn deliver_value_from_page(&self, data: &Value) {
        self.relay.on_page_value(data);
    }

    /// A payload the relay posted into the page; only the page API listens.
    pub fn deliver_to_page(&self, raw: &str) {
        self.page_api.on_message(raw);
    }

    pub fn on_host_event(&self, event: HostEvent) {
        self.relay.on_host_event(event);
    }

    pub fn on_host_channel(&self, channel: &str, args: &[Value]) {
        self.relay.on_host_channel(channel, args);
    }

    /// Page unload: stop the flush loop, abandon waiters, drop the provider session.
    pub fn shutdown(&mut self) {
        if let Some(task) = self.flush_task.take() {
            task.abort();
        }
        self.relay.detach();
        self.page_api.teardown();
        if let Err(err) = self.relay.host().send(&HostRequest::DestroyProvider) {
            tracing::warn!(error = %err, "failed to destroy provider session on shutdown");
        }
        tracing::info!("bridge shut down");
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        if let Some(task) = self.flush_task.take() {
            task.abort();
        }
    }
}

fn announce(relay: &Relay) {
    if let Err(err) = relay.host().send_to_embedder(EMBEDDER_SET_WEBVIEW_ID, None) {
        tracing::warn!(error = %err, "failed to announce webview id");
    }
}
