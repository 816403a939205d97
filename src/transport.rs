use anyhow::Result;
use serde_json::Value;

use crate::contract::{HostRequest, StructuredMessage};

/// Same-context messaging surface of the page (`window.postMessage`).
pub trait PageWindow: Send + Sync {
    fn post_message(&self, payload: &str, target_origin: &str);
}

/// Privileged channel to the host process and the embedding surface.
pub trait HostTransport: Send + Sync {
    /// Request/event channel to the host process.
    fn send(&self, request: &HostRequest) -> Result<()>;

    /// Notice to the outer surface hosting the webview. UI-origin traffic,
    /// never forwarded to the host process.
    fn send_to_embedder(&self, kind: &str, message: Option<&Value>) -> Result<()>;

    /// Synchronous locale query answered by the host.
    fn query_language(&self) -> Result<String>;
}

/// The page's own origin, or the wildcard when it is unknown or opaque.
pub fn target_origin(origin: Option<&str>) -> &str {
    match origin {
        Some(o) if !o.is_empty() && o != "null" => o,
        _ => "*",
    }
}

/// Serialize and post a structured message into the page.
pub fn post_structured(window: &dyn PageWindow, origin: Option<&str>, message: &StructuredMessage) {
    match serde_json::to_string(message) {
        Ok(payload) => window.post_message(&payload, target_origin(origin)),
        Err(err) => {
            tracing::warn!(kind = %message.kind, error = %err, "failed to encode page message");
        }
    }
}
