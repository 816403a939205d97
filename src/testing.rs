use anyhow::{Result, anyhow};
use serde_json::Value;
use std::sync::Mutex;

use crate::contract::HostRequest;
use crate::transport::{HostTransport, PageWindow};

#[derive(Default)]
pub(crate) struct RecordingWindow {
    posted: Mutex<Vec<(String, String)>>,
}

impl RecordingWindow {
    pub(crate) fn messages(&self) -> Vec<Value> {
        self.posted
            .lock()
            .expect("recording window lock")
            .iter()
            .map(|(payload, _)| serde_json::from_str(payload).expect("posted payload is JSON"))
            .collect()
    }

    pub(crate) fn origins(&self) -> Vec<String> {
        self.posted
            .lock()
            .expect("recording window lock")
            .iter()
            .map(|(_, origin)| origin.clone())
            .collect()
    }
}

impl PageWindow for RecordingWindow {
    fn post_message(&self, payload: &str, target_origin: &str) {
        self.posted
            .lock()
            .expect("recording window lock")
            .push((payload.to_string(), target_origin.to_string()));
    }
}

#[derive(Default)]
pub(crate) struct RecordingHost {
    pub(crate) sent: Mutex<Vec<HostRequest>>,
    pub(crate) embedder: Mutex<Vec<(String, Option<Value>)>>,
    pub(crate) language: Option<String>,
}

impl RecordingHost {
    pub(crate) fn with_language(language: &str) -> Self {
        Self {
            language: Some(language.to_string()),
            ..Self::default()
        }
    }

    pub(crate) fn sent(&self) -> Vec<HostRequest> {
        self.sent.lock().expect("recording host lock").clone()
    }

    pub(crate) fn embedder(&self) -> Vec<(String, Option<Value>)> {
        self.embedder.lock().expect("recording host lock").clone()
    }
}

impl HostTransport for RecordingHost {
    fn send(&self, request: &HostRequest) -> Result<()> {
        self.sent
            .lock()
            .expect("recording host lock")
            .push(request.clone());
        Ok(())
    }

    fn send_to_embedder(&self, kind: &str, message: Option<&Value>) -> Result<()> {
        self.embedder
            .lock()
            .expect("recording host lock")
            .push((kind.to_string(), message.cloned()));
        Ok(())
    }

    fn query_language(&self) -> Result<String> {
        self.language
            .clone()
            .ok_or_else(|| anyhow!("host did not answer the language query"))
    }
}
