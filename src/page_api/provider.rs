use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::contract::{
    ACTION_EVENT_CLOSE, ACTION_EVENT_CONNECT, ACTION_NETWORK_CHANGED, ACTION_REQUEST_ACCOUNTS,
    ActionResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderEventKind {
    Connect,
    Close,
    AccountsChanged,
    ChainChanged,
}

impl ProviderEventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Close => "close",
            Self::AccountsChanged => "accountsChanged",
            Self::ChainChanged => "chainChanged",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProviderEvent {
    Connect,
    Close { code: Value, reason: Value },
    AccountsChanged(Value),
    ChainChanged(Value),
}

impl ProviderEvent {
    pub fn kind(&self) -> ProviderEventKind {
        match self {
            Self::Connect => ProviderEventKind::Connect,
            Self::Close { .. } => ProviderEventKind::Close,
            Self::AccountsChanged(_) => ProviderEventKind::AccountsChanged,
            Self::ChainChanged(_) => ProviderEventKind::ChainChanged,
        }
    }

    /// The standard provider event a successful action result implies, if any.
    pub fn from_action(result: &ActionResult) -> Option<Self> {
        if result.is_error() {
            return None;
        }
        match result.kind.as_str() {
            ACTION_REQUEST_ACCOUNTS => Some(Self::AccountsChanged(result.value.clone())),
            ACTION_NETWORK_CHANGED => Some(Self::ChainChanged(result.value.clone())),
            ACTION_EVENT_CONNECT => Some(Self::Connect),
            ACTION_EVENT_CLOSE => Some(Self::Close {
                code: result.value.get(0).cloned().unwrap_or(Value::Null),
                reason: result.value.get(1).cloned().unwrap_or(Value::Null),
            }),
            _ => None,
        }
    }
}

pub type ProviderListener = Arc<dyn Fn(&ProviderEvent) + Send + Sync>;

/// Event-emitter capability of the injected provider object.
#[derive(Default)]
pub struct ProviderEmitter {
    listeners: Mutex<HashMap<ProviderEventKind, Vec<ProviderListener>>>,
}

impl ProviderEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, kind: ProviderEventKind, listener: ProviderListener) {
        self.listeners
            .lock()
            .expect("provider listeners lock")
            .entry(kind)
            .or_default()
            .push(listener);
    }

    pub fn remove_all(&self, kind: ProviderEventKind) {
        self.listeners
            .lock()
            .expect("provider listeners lock")
            .remove(&kind);
    }

    pub fn emit(&self, event: &ProviderEvent) {
        let listeners = self
            .listeners
            .lock()
            .expect("provider listeners lock")
            .get(&event.kind())
            .cloned()
            .unwrap_or_default();
        tracing::trace!(event = event.kind().as_str(), listeners = listeners.len(), "provider event");
        for listener in listeners {
            listener(event);
        }
    }
}
