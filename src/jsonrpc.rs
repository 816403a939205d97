use serde::Serialize;
use serde_json::Value;

/// The only JSON-RPC fields allowed through to the host provider.
pub const JSON_RPC_FIELDS: [&str; 4] = ["jsonrpc", "id", "method", "params"];

/// A page-supplied JSON-RPC request reduced to the whitelisted fields.
///
/// Fields missing on the input stay missing on the output; a field that was
/// present with `null` is kept as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SanitizedRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jsonrpc: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// An object owning at least one of the whitelisted fields.
pub fn is_valid_json_rpc(message: &Value) -> bool {
    message
        .as_object()
        .is_some_and(|obj| JSON_RPC_FIELDS.iter().any(|field| obj.contains_key(*field)))
}

pub fn sanitize_json_rpc(message: &Value) -> Option<SanitizedRequest> {
    if !is_valid_json_rpc(message) {
        return None;
    }
    let obj = message.as_object()?;
    Some(SanitizedRequest {
        jsonrpc: obj.get("jsonrpc").cloned(),
        id: obj.get("id").cloned(),
        method: obj.get("method").cloned(),
        params: obj.get("params").cloned(),
    })
}

/// Validate and sanitize a provider write: one request or a batch.
///
/// Returns the JSON text to forward, or `None` when any element fails
/// validation. A batch is all-or-nothing.
pub fn sanitize_write_payload(message: &Value) -> Option<String> {
    let sanitized = match message {
        Value::Array(items) => {
            let batch = items
                .iter()
                .map(sanitize_json_rpc)
                .collect::<Option<Vec<_>>>()?;
            serde_json::to_string(&batch)
        }
        single => serde_json::to_string(&sanitize_json_rpc(single)?),
    };
    match sanitized {
        Ok(text) => Some(text),
        Err(err) => {
            tracing::warn!(error = %err, "failed to encode sanitized provider write");
            None
        }
    }
}
