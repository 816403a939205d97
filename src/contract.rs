use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Prefix shared by every page-API message type. Matched case-insensitively
/// and must be followed by an ASCII letter.
pub const RESERVED_PREFIX: &str = "mistAPI_";

// Page channel message types.
pub const MSG_PROVIDER_CONNECT: &str = "mistAPI_ethereum_provider_connect";
pub const MSG_PROVIDER_WRITE: &str = "mistAPI_ethereum_provider_write";
pub const MSG_REQUEST_ACCOUNTS: &str = "mistAPI_requestAccounts";
pub const MSG_CREATE_ACCOUNT: &str = "mistAPI_createAccount";
pub const MSG_MENU_CHANGES: &str = "mistAPI_menuChanges";
pub const MSG_CALL_MENU_FUNCTION: &str = "mistAPI_callMenuFunction";
pub const MSG_SOUND: &str = "mistAPI_sound";
pub const MSG_SET_BADGE: &str = "mistAPI_setBadge";
pub const MSG_WINDOW_MESSAGE: &str = "uiAction_windowMessage";

// Action result types carried inside `uiAction_windowMessage`.
pub const ACTION_REQUEST_ACCOUNTS: &str = "requestAccounts";
pub const ACTION_CREATE_ACCOUNT: &str = "createAccount";
pub const ACTION_NETWORK_CHANGED: &str = "networkChanged";
pub const ACTION_EVENT_CONNECT: &str = "mistAPI_event_connect";
pub const ACTION_EVENT_CLOSE: &str = "mistAPI_event_close";

// Host process channels.
pub const HOST_PROVIDER_CREATE: &str = "ipcProvider-create";
pub const HOST_PROVIDER_WRITE: &str = "ipcProvider-write";
pub const HOST_PROVIDER_DESTROY: &str = "ipcProvider-destroy";
pub const HOST_PROVIDER_EVENT_PREFIX: &str = "ipcProvider-";
pub const HOST_GET_LANGUAGE: &str = "backendAction_getLanguage";

// Embedder (outer hosting surface) notices.
pub const EMBEDDER_SET_WEBVIEW_ID: &str = "setWebviewId";

/// Returns true for `mistAPI_<letter>...` in any letter case.
pub fn is_reserved_type(kind: &str) -> bool {
    let prefix_len = RESERVED_PREFIX.len();
    let Some(head) = kind.get(..prefix_len) else {
        return false;
    };
    head.eq_ignore_ascii_case(RESERVED_PREFIX)
        && kind[prefix_len..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic())
}

/// The `{type, message}` envelope exchanged over the page channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Value>,
}

impl StructuredMessage {
    pub fn new(kind: impl Into<String>, message: Value) -> Self {
        Self {
            kind: kind.into(),
            message: Some(message),
        }
    }

    pub fn bare(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: None,
        }
    }
}

/// Account operations the relay forwards straight to the host process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountAction {
    RequestAccounts,
    CreateAccount,
}

impl AccountAction {
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            MSG_REQUEST_ACCOUNTS => Some(Self::RequestAccounts),
            MSG_CREATE_ACCOUNT => Some(Self::CreateAccount),
            _ => None,
        }
    }

    pub fn channel(self) -> &'static str {
        match self {
            Self::RequestAccounts => MSG_REQUEST_ACCOUNTS,
            Self::CreateAccount => MSG_CREATE_ACCOUNT,
        }
    }

    /// The result type the host answers with in `uiAction_windowMessage`.
    pub fn result_type(self) -> &'static str {
        match self {
            Self::RequestAccounts => ACTION_REQUEST_ACCOUNTS,
            Self::CreateAccount => ACTION_CREATE_ACCOUNT,
        }
    }
}

/// Requests the relay sends over the privileged host channel.
#[derive(Debug, Clone, PartialEq)]
pub enum HostRequest {
    CreateProvider,
    /// JSON text of one sanitized request or an array of them.
    WriteProvider(String),
    DestroyProvider,
    Account {
        action: AccountAction,
        message: Option<Value>,
    },
}

impl HostRequest {
    pub fn channel(&self) -> &'static str {
        match self {
            Self::CreateProvider => HOST_PROVIDER_CREATE,
            Self::WriteProvider(_) => HOST_PROVIDER_WRITE,
            Self::DestroyProvider => HOST_PROVIDER_DESTROY,
            Self::Account { action, .. } => action.channel(),
        }
    }

    pub fn payload(&self) -> Option<Value> {
        match self {
            Self::WriteProvider(text) => Some(Value::String(text.clone())),
            Self::Account { message, .. } => message.clone(),
            Self::CreateProvider | Self::DestroyProvider => None,
        }
    }
}

/// Provider lifecycle channels (`ipcProvider-<name>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderChannel {
    Data,
    Error,
    End,
    Timeout,
    Connect,
}

impl ProviderChannel {
    pub const ALL: [ProviderChannel; 5] = [
        Self::Data,
        Self::Error,
        Self::End,
        Self::Timeout,
        Self::Connect,
    ];

    pub fn from_str(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|channel| channel.as_str() == value)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Data => "data",
            Self::Error => "error",
            Self::End => "end",
            Self::Timeout => "timeout",
            Self::Connect => "connect",
        }
    }

    pub fn host_channel(self) -> String {
        format!("{HOST_PROVIDER_EVENT_PREFIX}{}", self.as_str())
    }
}

/// Result of a host-side UI action, delivered as `uiAction_windowMessage`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub error: Value,
    #[serde(default)]
    pub value: Value,
}

impl ActionResult {
    /// Mirrors the page's truthiness test on the `error` field.
    pub fn is_error(&self) -> bool {
        is_truthy(&self.error)
    }
}

/// Events the host process pushes to the relay.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    Provider {
        channel: ProviderChannel,
        payload: String,
    },
    WindowMessage(ActionResult),
    CallMenuFunction(Value),
}

impl HostEvent {
    /// Map a raw host channel name and its argument list onto an event.
    pub fn from_channel(channel: &str, args: &[Value]) -> Option<Self> {
        if let Some(name) = channel.strip_prefix(HOST_PROVIDER_EVENT_PREFIX) {
            let channel = ProviderChannel::from_str(name)?;
            let payload = args.first()?.as_str()?.to_string();
            return Some(Self::Provider { channel, payload });
        }
        match channel {
            MSG_WINDOW_MESSAGE => {
                let kind = args.first()?.as_str()?.to_string();
                Some(Self::WindowMessage(ActionResult {
                    kind,
                    error: args.get(1).cloned().unwrap_or(Value::Null),
                    value: args.get(2).cloned().unwrap_or(Value::Null),
                }))
            }
            MSG_CALL_MENU_FUNCTION => Some(Self::CallMenuFunction(
                args.first().cloned().unwrap_or(Value::Null),
            )),
            _ => None,
        }
    }
}

pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reserved_prefix_is_case_insensitive_and_needs_a_letter() {
        assert!(is_reserved_type("mistAPI_sound"));
        assert!(is_reserved_type("MISTAPI_Sound"));
        assert!(is_reserved_type("mistapi_x"));
        assert!(!is_reserved_type("mistAPI_"));
        assert!(!is_reserved_type("mistAPI_1abc"));
        assert!(!is_reserved_type("mistAPI"));
        assert!(!is_reserved_type("uiAction_windowMessage"));
        assert!(!is_reserved_type("xmistAPI_sound"));
    }

    #[test]
    fn structured_message_omits_absent_message() {
        let bare = serde_json::to_value(StructuredMessage::bare(MSG_REQUEST_ACCOUNTS))
            .expect("serialize bare message");
        assert_eq!(bare, json!({"type": "mistAPI_requestAccounts"}));

        let full = serde_json::to_value(StructuredMessage::new(MSG_SOUND, json!("bip")))
            .expect("serialize message");
        assert_eq!(full, json!({"type": "mistAPI_sound", "message": "bip"}));
    }

    #[test]
    fn host_event_maps_provider_channels() {
        let event = HostEvent::from_channel("ipcProvider-data", &[json!("{\"id\":1}")]);
        assert_eq!(
            event,
            Some(HostEvent::Provider {
                channel: ProviderChannel::Data,
                payload: "{\"id\":1}".to_string(),
            })
        );
        assert_eq!(HostEvent::from_channel("ipcProvider-bogus", &[json!("{}")]), None);
        assert_eq!(HostEvent::from_channel("ipcProvider-end", &[]), None);
        assert_eq!(HostEvent::from_channel("ipcProvider-timeout", &[json!(7)]), None);
    }

    #[test]
    fn every_provider_channel_round_trips_through_its_host_name() {
        let names: Vec<String> = ProviderChannel::ALL.iter().map(|c| c.host_channel()).collect();
        assert_eq!(
            names,
            [
                "ipcProvider-data",
                "ipcProvider-error",
                "ipcProvider-end",
                "ipcProvider-timeout",
                "ipcProvider-connect",
            ]
        );
        for channel in ProviderChannel::ALL {
            assert_eq!(
                HostEvent::from_channel(&channel.host_channel(), &[json!("{\"reason\":1}")]),
                Some(HostEvent::Provider {
                    channel,
                    payload: "{\"reason\":1}".to_string(),
                }),
                "{}",
                channel.as_str()
            );
        }
        assert_eq!(
            HostEvent::from_channel("ipcProvider-error", &[json!("{\"message\":\"boom\"}")]),
            Some(HostEvent::Provider {
                channel: ProviderChannel::Error,
                payload: "{\"message\":\"boom\"}".to_string(),
            })
        );
        assert_eq!(ProviderChannel::from_str("Connect"), None);
    }

    #[test]
    fn host_event_maps_window_message_arguments() {
        let event = HostEvent::from_channel(
            MSG_WINDOW_MESSAGE,
            &[json!("requestAccounts"), Value::Null, json!(["0xabc"])],
        );
        assert_eq!(
            event,
            Some(HostEvent::WindowMessage(ActionResult {
                kind: "requestAccounts".to_string(),
                error: Value::Null,
                value: json!(["0xabc"]),
            }))
        );
        assert_eq!(HostEvent::from_channel("somethingElse", &[]), None);
    }

    #[test]
    fn error_truthiness_follows_page_semantics() {
        let mut result = ActionResult {
            kind: "requestAccounts".to_string(),
            error: Value::Null,
            value: Value::Null,
        };
        assert!(!result.is_error());
        for falsy in [json!(false), json!(0), json!("")] {
            result.error = falsy;
            assert!(!result.is_error());
        }
        for truthy in [json!(true), json!("denied"), json!({}), json!([]), json!(3)] {
            result.error = truthy;
            assert!(result.is_error());
        }
    }
}
