//! In-page API exposed to untrusted page code.
//!
//! Calls become structured messages posted to the relay; inbound messages
//! resolve pending handles, fire menu callbacks and drive the provider's
//! standard events.
mod menu;
mod pending;
mod provider;

use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::contract::{
    ACTION_CREATE_ACCOUNT, ACTION_REQUEST_ACCOUNTS, ActionResult, MSG_CALL_MENU_FUNCTION,
    MSG_CREATE_ACCOUNT, MSG_MENU_CHANGES, MSG_REQUEST_ACCOUNTS, MSG_SET_BADGE, MSG_SOUND,
    MSG_WINDOW_MESSAGE, StructuredMessage,
};
use crate::transport::{PageWindow, post_structured};

pub use menu::{
    DEFAULT_MENU_ID, MENU_ENTRY_LIMIT, MENU_KEY_PREFIX, MenuCallback, MenuChange, MenuEntry,
    MenuOptions, MenuRegistry, menu_key, sanitize_menu_id,
};
pub use pending::{ActionCallback, ActionError, ActionOutcome, Deferred, ResultListener};
pub use provider::{ProviderEmitter, ProviderEvent, ProviderEventKind, ProviderListener};

use pending::{PendingCalls, Waiter, outcome_of};

/// Default period of the menu flush loop.
pub const MENU_FLUSH_INTERVAL: Duration = Duration::from_millis(500);

/// Static metadata the page can read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageApiConfig {
    pub version: String,
    pub license: String,
    pub platform: String,
    pub solidity_version: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sound {
    Bip,
    Bloop,
    Invite,
}

impl Sound {
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "bip" => Some(Self::Bip),
            "bloop" => Some(Self::Bloop),
            "invite" => Some(Self::Invite),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bip => "bip",
            Self::Bloop => "bloop",
            Self::Invite => "invite",
        }
    }
}

#[derive(Default)]
struct PageState {
    menu: MenuRegistry,
    queue: Vec<MenuChange>,
    pending: PendingCalls,
}

#[derive(Clone)]
pub struct PageApi {
    config: Arc<PageApiConfig>,
    window: Arc<dyn PageWindow>,
    origin: Option<String>,
    state: Arc<Mutex<PageState>>,
    provider: Option<Arc<ProviderEmitter>>,
}

impl PageApi {
    pub fn new(config: PageApiConfig, window: Arc<dyn PageWindow>, origin: Option<String>) -> Self {
        Self {
            config: Arc::new(config),
            window,
            origin,
            state: Arc::new(Mutex::new(PageState::default())),
            provider: None,
        }
    }

    /// Attach the injected provider whose standard events this API drives.
    pub fn with_provider(mut self, provider: Arc<ProviderEmitter>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn provider(&self) -> Option<&Arc<ProviderEmitter>> {
        self.provider.as_ref()
    }

    pub fn config(&self) -> &PageApiConfig {
        &self.config
    }

    pub fn version(&self) -> &str {
        &self.config.version
    }

    pub fn license(&self) -> &str {
        &self.config.license
    }

    pub fn platform(&self) -> &str {
        &self.config.platform
    }

    pub fn solidity_version(&self) -> Option<&str> {
        self.config.solidity_version.as_deref()
    }

    fn lock(&self) -> MutexGuard<'_, PageState> {
        self.state.lock().expect("page api state lock")
    }

    fn post(&self, message: StructuredMessage) {
        post_structured(self.window.as_ref(), self.origin.as_deref(), &message);
    }

    // -- Accounts --

    pub fn request_accounts(&self) -> Deferred {
        let handle = self.lock().pending.defer(ACTION_REQUEST_ACCOUNTS);
        self.post(StructuredMessage::bare(MSG_REQUEST_ACCOUNTS));
        handle
    }

    pub fn create_account(&self) -> Deferred {
        let handle = self.lock().pending.defer(ACTION_CREATE_ACCOUNT);
        self.post(StructuredMessage::bare(MSG_CREATE_ACCOUNT));
        handle
    }

    /// Callback flavour of [`PageApi::request_accounts`].
    pub fn request_accounts_with(&self, callback: ActionCallback) {
        self.lock()
            .pending
            .push(ACTION_REQUEST_ACCOUNTS, Waiter::Callback(callback));
        self.post(StructuredMessage::bare(MSG_REQUEST_ACCOUNTS));
    }

    pub fn create_account_with(&self, callback: ActionCallback) {
        self.lock()
            .pending
            .push(ACTION_CREATE_ACCOUNT, Waiter::Callback(callback));
        self.post(StructuredMessage::bare(MSG_CREATE_ACCOUNT));
    }

    /// Listener invoked for every result of `kind`; never removed.
    pub fn on_result(&self, kind: &str, listener: ResultListener) {
        self.lock().pending.listen(kind, listener);
    }

    pub fn outstanding(&self, kind: &str) -> usize {
        self.lock().pending.outstanding(kind)
    }

    // -- Menu and sounds --

    pub fn menu(&self) -> Menu<'_> {
        Menu { api: self }
    }

    pub fn sounds(&self) -> Sounds<'_> {
        Sounds { api: self }
    }

    pub fn play(&self, sound: Sound) {
        self.post(StructuredMessage::new(MSG_SOUND, Value::from(sound.as_str())));
    }

    pub fn pending_menu_changes(&self) -> usize {
        self.lock().queue.len()
    }

    /// One tick of the flush loop. Returns whether a batch was posted.
    pub fn flush_menu_changes(&self) -> bool {
        let batch = std::mem::take(&mut self.lock().queue);
        if batch.is_empty() {
            return false;
        }
        match serde_json::to_value(&batch) {
            Ok(records) => {
                tracing::debug!(changes = batch.len(), "flushing menu changes");
                self.post(StructuredMessage::new(MSG_MENU_CHANGES, records));
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to encode menu changes");
                false
            }
        }
    }

    /// Drive [`PageApi::flush_menu_changes`] every `period`.
    pub fn spawn_flush_loop(&self, period: Duration) -> JoinHandle<()> {
        let api = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                api.flush_menu_changes();
            }
        })
    }

    // -- Inbound --

    /// Handle one raw payload posted into the page.
    pub fn on_message(&self, raw: &str) {
        if let Ok(data) = serde_json::from_str::<Value>(raw) {
            self.on_message_value(&data);
        }
    }

    pub fn on_message_value(&self, data: &Value) {
        let Some(kind) = data.get("type").and_then(Value::as_str) else {
            return;
        };
        match kind {
            MSG_CALL_MENU_FUNCTION => {
                let Some(key) = data.get("message").and_then(Value::as_str) else {
                    return;
                };
                // Clone out of the lock so the callback may call back into the API.
                let callback = self.lock().menu.callback(key);
                match callback {
                    Some(cb) => cb(),
                    None => tracing::trace!(key, "menu activation without callback"),
                }
            }
            MSG_WINDOW_MESSAGE => {
                let Some(result) = data
                    .get("message")
                    .cloned()
                    .and_then(|m| serde_json::from_value::<ActionResult>(m).ok())
                else {
                    tracing::debug!("dropping malformed window message");
                    return;
                };
                self.deliver_result(&result);
            }
            _ => {}
        }
    }

    fn deliver_result(&self, result: &ActionResult) {
        let (waiter, listeners) = {
            let mut state = self.lock();
            (
                state.pending.take_next(&result.kind),
                state.pending.listeners(&result.kind),
            )
        };
        if let Some(waiter) = waiter {
            waiter.fulfil(outcome_of(result));
        }
        for listener in listeners {
            listener(result);
        }
        if let Some(provider) = &self.provider {
            if let Some(event) = ProviderEvent::from_action(result) {
                provider.emit(&event);
            }
        }
    }

    /// Abandon every outstanding waiter and drop queued menu changes.
    pub fn teardown(&self) {
        let waiters = {
            let mut state = self.lock();
            state.queue.clear();
            state.pending.drain()
        };
        for waiter in waiters {
            waiter.fulfil(Err(ActionError::Abandoned));
        }
    }
}

/// `mist.menu`: entries mirrored locally and batched to the host.
pub struct Menu<'a> {
    api: &'a PageApi,
}

impl Menu<'_> {
    /// Add or update an entry. `false` when `name` is missing or the entry
    /// limit is reached for a new id.
    pub fn add(&self, options: MenuOptions, callback: Option<MenuCallback>) -> bool {
        let mut state = self.api.lock();
        match state.menu.add(options, callback) {
            Some(change) => {
                state.queue.push(change);
                true
            }
            None => false,
        }
    }

    pub fn update(&self, options: MenuOptions, callback: Option<MenuCallback>) -> bool {
        self.add(options, callback)
    }

    pub fn remove(&self, id: &str) {
        let mut state = self.api.lock();
        let change = state.menu.remove(id);
        state.queue.push(change);
    }

    pub fn select(&self, id: &str) {
        let mut state = self.api.lock();
        let change = state.menu.select(id);
        state.queue.push(change);
    }

    pub fn clear(&self) {
        let mut state = self.api.lock();
        let change = state.menu.clear();
        state.queue.push(change);
    }

    /// Badge text on the apps menu button. Sent immediately, not batched.
    pub fn set_badge(&self, text: &str) {
        self.api
            .post(StructuredMessage::new(MSG_SET_BADGE, Value::from(text)));
    }

    pub fn entry(&self, key: &str) -> Option<MenuEntry> {
        self.api.lock().menu.get(key).cloned()
    }

    pub fn entries(&self) -> Vec<MenuEntry> {
        self.api.lock().menu.entries().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.api.lock().menu.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `mist.sounds`.
pub struct Sounds<'a> {
    api: &'a PageApi,
}

impl Sounds<'_> {
    pub fn bip(&self) {
        self.api.play(Sound::Bip);
    }

    pub fn bloop(&self) {
        self.api.play(Sound::Bloop);
    }

    pub fn invite(&self) {
        self.api.play(Sound::Invite);
    }
}
