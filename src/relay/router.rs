use serde_json::Value;

use crate::contract::{
    AccountAction, MSG_PROVIDER_CONNECT, MSG_PROVIDER_WRITE, is_reserved_type,
};
use crate::jsonrpc::sanitize_write_payload;

/// Where an accepted page message goes.
#[derive(Debug, Clone, PartialEq)]
pub enum PageRoute {
    ConnectProvider,
    /// Sanitized JSON text for `ipcProvider-write`.
    WriteProvider(String),
    Account {
        action: AccountAction,
        message: Option<Value>,
    },
    /// Reserved-prefix UI traffic republished to the embedding surface.
    Embedder {
        kind: String,
        message: Option<Value>,
    },
}

/// Decode one raw page payload and decide its route.
///
/// Anything that is not an object with a string `type`, fails JSON-RPC
/// validation, or is not page-API traffic yields `None`.
pub fn route_page_message(raw: &str) -> Option<PageRoute> {
    // A payload that is not JSON is an opaque string, which never routes.
    let data: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(_) => {
            tracing::trace!(len = raw.len(), "dropping non-JSON page message");
            return None;
        }
    };
    route_page_value(&data)
}

pub fn route_page_value(data: &Value) -> Option<PageRoute> {
    let obj = data.as_object()?;
    let kind = obj.get("type")?.as_str()?;
    let message = obj.get("message");

    match kind {
        MSG_PROVIDER_CONNECT => Some(PageRoute::ConnectProvider),
        MSG_PROVIDER_WRITE => {
            let Some(payload) = message.and_then(sanitize_write_payload) else {
                tracing::debug!("dropping provider write that failed JSON-RPC validation");
                return None;
            };
            Some(PageRoute::WriteProvider(payload))
        }
        _ if is_reserved_type(kind) => match AccountAction::from_str(kind) {
            Some(action) => Some(PageRoute::Account {
                action,
                message: message.cloned(),
            }),
            None => Some(PageRoute::Embedder {
                kind: kind.to_string(),
                message: message.cloned(),
            }),
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn route(value: Value) -> Option<PageRoute> {
        route_page_message(&value.to_string())
    }

    #[test]
    fn connect_sentinel_needs_no_payload() {
        assert_eq!(
            route(json!({"type": "mistAPI_ethereum_provider_connect"})),
            Some(PageRoute::ConnectProvider)
        );
    }

    #[test]
    fn provider_write_is_sanitized() {
        let routed = route(json!({
            "type": "mistAPI_ethereum_provider_write",
            "message": {"jsonrpc": "2.0", "id": 1, "method": "eth_chainId", "params": [], "extra": "x"}
        }));
        let Some(PageRoute::WriteProvider(text)) = routed else {
            panic!("expected a provider write, got {routed:?}");
        };
        let forwarded: Value = serde_json::from_str(&text).expect("forwarded JSON");
        assert_eq!(
            forwarded,
            json!({"jsonrpc": "2.0", "id": 1, "method": "eth_chainId", "params": []})
        );
    }

    #[test]
    fn invalid_or_missing_write_payload_is_dropped() {
        assert_eq!(
            route(json!({"type": "mistAPI_ethereum_provider_write", "message": {"foo": 1}})),
            None
        );
        assert_eq!(route(json!({"type": "mistAPI_ethereum_provider_write"})), None);
        assert_eq!(
            route(json!({
                "type": "mistAPI_ethereum_provider_write",
                "message": [{"id": 1, "method": "eth_chainId"}, {"bar": 2}]
            })),
            None
        );
    }

    #[test]
    fn account_actions_go_to_the_host_process() {
        assert_eq!(
            route(json!({"type": "mistAPI_requestAccounts"})),
            Some(PageRoute::Account {
                action: AccountAction::RequestAccounts,
                message: None,
            })
        );
        assert_eq!(
            route(json!({"type": "mistAPI_createAccount", "message": {"hint": 1}})),
            Some(PageRoute::Account {
                action: AccountAction::CreateAccount,
                message: Some(json!({"hint": 1})),
            })
        );
    }

    #[test]
    fn other_reserved_types_go_to_the_embedder_unchanged() {
        assert_eq!(
            route(json!({"type": "mistAPI_sound", "message": "bip"})),
            Some(PageRoute::Embedder {
                kind: "mistAPI_sound".to_string(),
                message: Some(json!("bip")),
            })
        );
        // Only the exact spelling reaches the host process.
        assert_eq!(
            route(json!({"type": "MISTAPI_requestAccounts"})),
            Some(PageRoute::Embedder {
                kind: "MISTAPI_requestAccounts".to_string(),
                message: None,
            })
        );
    }

    #[test]
    fn junk_is_ignored() {
        assert_eq!(route_page_message("not json at all"), None);
        assert_eq!(route_page_message("\"mistAPI_sound\""), None);
        assert_eq!(route_page_message("42"), None);
        assert_eq!(route_page_message("null"), None);
        assert_eq!(route(json!(["mistAPI_sound"])), None);
        assert_eq!(route(json!({"type": 7})), None);
        assert_eq!(route(json!({"message": "no type"})), None);
        assert_eq!(route(json!({"type": "data", "message": {}})), None);
        assert_eq!(route(json!({"type": "uiAction_windowMessage"})), None);
    }
}
