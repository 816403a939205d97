use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::io::{self, Write};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinSet;

use crate::contract::{HOST_GET_LANGUAGE, HostRequest};
use crate::page_api::{ActionOutcome, MenuOptions, ProviderEvent, Sound, menu_key};
use crate::relay::Bridge;
use crate::transport::{HostTransport, PageWindow};

// ---------------------------------------------------------------------------
// NDJSON protocol types
// ---------------------------------------------------------------------------

/// One line read from stdin.
#[derive(Debug, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum StdioInput {
    /// A payload the page posted. Strings are delivered verbatim.
    Page { data: Value },
    /// A host channel event, e.g. `ipcProvider-data`.
    Host {
        channel: String,
        #[serde(default)]
        args: Vec<Value>,
    },
    /// A call into the page API, as page script would make it.
    Api(ApiCall),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "call", rename_all = "camelCase")]
pub enum ApiCall {
    RequestAccounts,
    CreateAccount,
    MenuAdd { options: MenuOptions },
    MenuRemove { id: String },
    MenuSelect { id: String },
    MenuClear,
    Sound { sound: String },
    SetBadge { text: String },
    Language,
}

/// Which side of the page a message was posted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostSide {
    /// The relay posting host traffic into the page.
    Relay,
    /// The page API posting towards the relay.
    PageApi,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Posted {
    pub side: PostSide,
    pub payload: String,
    pub target_origin: String,
}

// ---------------------------------------------------------------------------
// Stdout helpers (all output locked + flushed)
// ---------------------------------------------------------------------------

fn emit_line(value: &impl Serialize) {
    if let Ok(line) = serde_json::to_string(value) {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        let _ = writeln!(handle, "{}", line);
        let _ = handle.flush();
    }
}

pub fn emit_ready(version: &str) {
    emit_line(&json!({"target": "bridge", "type": "ready", "version": version}));
}

pub fn emit_error(message: &str) {
    emit_line(&json!({"target": "bridge", "type": "error", "message": message}));
}

fn host_line(request: &HostRequest) -> Value {
    let mut line = json!({"target": "host", "channel": request.channel()});
    if let Some(payload) = request.payload() {
        line["payload"] = payload;
    }
    line
}

fn embedder_line(kind: &str, message: Option<&Value>) -> Value {
    let mut line = json!({"target": "embedder", "type": kind});
    if let Some(message) = message {
        line["message"] = message.clone();
    }
    line
}

fn page_line(posted: &Posted) -> Value {
    let data = serde_json::from_str::<Value>(&posted.payload)
        .unwrap_or_else(|_| Value::String(posted.payload.clone()));
    json!({"target": "page", "targetOrigin": posted.target_origin, "data": data})
}

fn outcome_line(call: &str, outcome: &ActionOutcome) -> Value {
    match outcome {
        Ok(value) => json!({"target": "api", "event": "result", "call": call, "ok": true, "value": value}),
        Err(err) => json!({"target": "api", "event": "result", "call": call, "ok": false, "error": err.to_string()}),
    }
}

fn provider_line(event: &ProviderEvent) -> Value {
    let data = match event {
        ProviderEvent::Connect => Value::Null,
        ProviderEvent::Close { code, reason } => json!({"code": code, "reason": reason}),
        ProviderEvent::AccountsChanged(value) | ProviderEvent::ChainChanged(value) => value.clone(),
    };
    json!({"target": "api", "event": "provider", "name": event.kind().as_str(), "data": data})
}

pub fn emit_provider_event(event: &ProviderEvent) {
    emit_line(&provider_line(event));
}

// ---------------------------------------------------------------------------
// Transports
// ---------------------------------------------------------------------------

/// Host side of the bridge: requests become `host` / `embedder` lines.
pub struct StdioHost {
    language: String,
}

impl StdioHost {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
        }
    }
}

impl HostTransport for StdioHost {
    fn send(&self, request: &HostRequest) -> Result<()> {
        emit_line(&host_line(request));
        Ok(())
    }

    fn send_to_embedder(&self, kind: &str, message: Option<&Value>) -> Result<()> {
        emit_line(&embedder_line(kind, message));
        Ok(())
    }

    fn query_language(&self) -> Result<String> {
        tracing::trace!(channel = HOST_GET_LANGUAGE, language = %self.language, "answering language query");
        Ok(self.language.clone())
    }
}

/// Page window that queues posts for the main loop. Nothing is delivered inline.
pub struct ChannelWindow {
    side: PostSide,
    tx: UnboundedSender<Posted>,
}

impl ChannelWindow {
    pub fn new(side: PostSide, tx: UnboundedSender<Posted>) -> Self {
        Self { side, tx }
    }
}

impl PageWindow for ChannelWindow {
    fn post_message(&self, payload: &str, target_origin: &str) {
        let posted = Posted {
            side: self.side,
            payload: payload.to_string(),
            target_origin: target_origin.to_string(),
        };
        if self.tx.send(posted).is_err() {
            tracing::debug!(side = ?self.side, "page window closed; dropping post");
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatch (runs on the main loop)
// ---------------------------------------------------------------------------

/// Handle one stdin line. Account calls leave a task in `tasks` that writes
/// the result line once the host answers or the bridge shuts down.
pub fn handle_input(bridge: &Bridge, input: StdioInput, tasks: &mut JoinSet<Value>) {
    match input {
        StdioInput::Page {
            data: Value::String(raw),
        } => bridge.deliver_from_page(&raw),
        StdioInput::Page { data } => bridge.deliver_value_from_page(&data),
        StdioInput::Host { channel, args } => bridge.on_host_channel(&channel, &args),
        StdioInput::Api(call) => handle_api_call(bridge, call, tasks),
    }
}

/// Route a queued post to whichever side listens for it.
pub fn handle_posted(bridge: &Bridge, posted: Posted) {
    match posted.side {
        PostSide::Relay => {
            emit_line(&page_line(&posted));
            bridge.deliver_to_page(&posted.payload);
        }
        PostSide::PageApi => bridge.deliver_from_page(&posted.payload),
    }
}

fn handle_api_call(bridge: &Bridge, call: ApiCall, tasks: &mut JoinSet<Value>) {
    let api = bridge.page_api();
    match call {
        ApiCall::RequestAccounts => {
            let handle = api.request_accounts();
            tasks.spawn(async move {
                let line = outcome_line("requestAccounts", &handle.await);
                emit_line(&line);
                line
            });
        }
        ApiCall::CreateAccount => {
            let handle = api.create_account();
            tasks.spawn(async move {
                let line = outcome_line("createAccount", &handle.await);
                emit_line(&line);
                line
            });
        }
        ApiCall::MenuAdd { options } => {
            let key = menu_key(options.id.as_deref());
            let activated = key.clone();
            let accepted = api.menu().add(
                options,
                Some(Arc::new(move || {
                    emit_line(&json!({"target": "api", "event": "menuActivated", "id": activated}));
                })),
            );
            if !accepted {
                emit_error(&format!("menu entry {key} rejected"));
            }
        }
        ApiCall::MenuRemove { id } => api.menu().remove(&id),
        ApiCall::MenuSelect { id } => api.menu().select(&id),
        ApiCall::MenuClear => api.menu().clear(),
        ApiCall::Sound { sound } => match Sound::from_str(&sound) {
            Some(sound) => api.play(sound),
            None => emit_error(&format!("unknown sound: {sound}")),
        },
        ApiCall::SetBadge { text } => api.menu().set_badge(&text),
        ApiCall::Language => {
            let language = bridge.relay().navigator_language();
            emit_line(&json!({"target": "api", "event": "language", "value": language}));
        }
    }
}
