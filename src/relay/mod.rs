//! Trust boundary between untrusted page script and the privileged host
//! channel.
//!
//! Page messages are validated and routed by [`router`]; host events are
//! republished into the page as structured messages. Nothing that fails
//! validation is ever reported back to the page.
mod bridge;
mod router;

use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::contract::{
    HostEvent, HostRequest, MSG_CALL_MENU_FUNCTION, MSG_WINDOW_MESSAGE, StructuredMessage,
};
use crate::transport::{HostTransport, PageWindow, post_structured};

pub use bridge::Bridge;
pub use router::{PageRoute, route_page_message, route_page_value};

pub struct Relay {
    host: Arc<dyn HostTransport>,
    window: Arc<dyn PageWindow>,
    origin: Option<String>,
    default_language: String,
    listening: AtomicBool,
}

impl Relay {
    pub fn new(
        host: Arc<dyn HostTransport>,
        window: Arc<dyn PageWindow>,
        origin: Option<String>,
        default_language: impl Into<String>,
    ) -> Self {
        Self {
            host,
            window,
            origin,
            default_language: default_language.into(),
            listening: AtomicBool::new(false),
        }
    }

    /// Start republishing host events into the page.
    pub fn attach(&self) {
        self.listening.store(true, Ordering::SeqCst);
    }

    pub fn detach(&self) {
        self.listening.store(false, Ordering::SeqCst);
    }

    pub fn is_attached(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    /// Handle one raw payload posted by the page.
    pub fn on_page_message(&self, raw: &str) {
        if let Some(route) = route_page_message(raw) {
            self.dispatch(route);
        }
    }

    /// Same as [`Relay::on_page_message`] for an already-decoded payload.
    pub fn on_page_value(&self, data: &Value) {
        if let Some(route) = route_page_value(data) {
            self.dispatch(route);
        }
    }

    fn dispatch(&self, route: PageRoute) {
        let result = match route {
            PageRoute::ConnectProvider => self.host.send(&HostRequest::CreateProvider),
            PageRoute::WriteProvider(payload) => {
                tracing::trace!(len = payload.len(), "forwarding provider write");
                self.host.send(&HostRequest::WriteProvider(payload))
            }
            PageRoute::Account { action, message } => {
                tracing::debug!(channel = action.channel(), "forwarding account action");
                self.host.send(&HostRequest::Account { action, message })
            }
            PageRoute::Embedder { kind, message } => {
                self.host.send_to_embedder(&kind, message.as_ref())
            }
        };
        if let Err(err) = result {
            tracing::warn!(error = %err, "host transport rejected page message");
        }
    }

    /// Republish a host event into the page.
    pub fn on_host_event(&self, event: HostEvent) {
        if !self.is_attached() {
            tracing::trace!(?event, "relay not attached; dropping host event");
            return;
        }
        let message = match event {
            HostEvent::Provider { channel, payload } => {
                let parsed: Value = match serde_json::from_str(&payload) {
                    Ok(value) => value,
                    Err(err) => {
                        tracing::debug!(
                            channel = channel.as_str(),
                            error = %err,
                            "dropping provider event with malformed payload"
                        );
                        return;
                    }
                };
                StructuredMessage::new(channel.as_str(), parsed)
            }
            HostEvent::WindowMessage(result) => StructuredMessage::new(
                MSG_WINDOW_MESSAGE,
                json!({"type": result.kind, "error": result.error, "value": result.value}),
            ),
            HostEvent::CallMenuFunction(id) => StructuredMessage::new(MSG_CALL_MENU_FUNCTION, id),
        };
        post_structured(self.window.as_ref(), self.origin(), &message);
    }

    /// Convenience wrapper for transports that deliver raw channel names.
    pub fn on_host_channel(&self, channel: &str, args: &[Value]) {
        match HostEvent::from_channel(channel, args) {
            Some(event) => self.on_host_event(event),
            None => tracing::trace!(channel, "ignoring unknown host channel"),
        }
    }

    /// Locale reported to the page, answered by the host on demand.
    pub fn navigator_language(&self) -> String {
        match self.host.query_language() {
            Ok(lang) if !lang.trim().is_empty() => lang,
            Ok(_) => self.default_language.clone(),
            Err(err) => {
                tracing::debug!(error = %err, "language query failed; using default");
                self.default_language.clone()
            }
        }
    }

    pub(crate) fn host(&self) -> &dyn HostTransport {
        self.host.as_ref()
    }
}
