use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

use crate::contract::ActionResult;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ActionError {
    /// The host answered with a truthy `error` field.
    #[error("host rejected the action: {0}")]
    Host(Value),
    /// The page API was torn down before an answer arrived.
    #[error("page API was torn down before the host answered")]
    Abandoned,
}

pub type ActionOutcome = Result<Value, ActionError>;
pub type ActionCallback = Box<dyn FnOnce(ActionOutcome) + Send>;
pub type ResultListener = Arc<dyn Fn(&ActionResult) + Send + Sync>;

/// A result that is not available yet. Fulfilled exactly once.
#[derive(Debug)]
pub struct Deferred {
    rx: oneshot::Receiver<ActionOutcome>,
}

impl Deferred {
    /// Non-blocking peek; `None` while still pending.
    pub fn try_take(&mut self) -> Option<ActionOutcome> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(ActionError::Abandoned)),
        }
    }
}

impl Future for Deferred {
    type Output = ActionOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|res| res.unwrap_or(Err(ActionError::Abandoned)))
    }
}

pub(crate) enum Waiter {
    Deferred(oneshot::Sender<ActionOutcome>),
    Callback(ActionCallback),
}

impl Waiter {
    pub(crate) fn fulfil(self, outcome: ActionOutcome) {
        match self {
            Self::Deferred(tx) => {
                // The caller dropped its handle; nothing to deliver to.
                let _ = tx.send(outcome);
            }
            Self::Callback(cb) => cb(outcome),
        }
    }
}

/// Outstanding one-shot waiters and persistent listeners, keyed by result type.
#[derive(Default)]
pub(crate) struct PendingCalls {
    waiters: HashMap<String, VecDeque<Waiter>>,
    listeners: HashMap<String, Vec<ResultListener>>,
}

impl PendingCalls {
    pub(crate) fn defer(&mut self, kind: &str) -> Deferred {
        let (tx, rx) = oneshot::channel();
        self.push(kind, Waiter::Deferred(tx));
        Deferred { rx }
    }

    pub(crate) fn push(&mut self, kind: &str, waiter: Waiter) {
        self.waiters
            .entry(kind.to_string())
            .or_default()
            .push_back(waiter);
    }

    pub(crate) fn listen(&mut self, kind: &str, listener: ResultListener) {
        self.listeners
            .entry(kind.to_string())
            .or_default()
            .push(listener);
    }

    /// Oldest waiter for `kind`, removed from its queue.
    pub(crate) fn take_next(&mut self, kind: &str) -> Option<Waiter> {
        let queue = self.waiters.get_mut(kind)?;
        let waiter = queue.pop_front();
        if queue.is_empty() {
            self.waiters.remove(kind);
        }
        waiter
    }

    pub(crate) fn listeners(&self, kind: &str) -> Vec<ResultListener> {
        self.listeners.get(kind).cloned().unwrap_or_default()
    }

    pub(crate) fn outstanding(&self, kind: &str) -> usize {
        self.waiters.get(kind).map_or(0, VecDeque::len)
    }

    pub(crate) fn drain(&mut self) -> Vec<Waiter> {
        self.waiters
            .drain()
            .flat_map(|(_, queue)| queue.into_iter())
            .collect()
    }
}

pub(crate) fn outcome_of(result: &ActionResult) -> ActionOutcome {
    if result.is_error() {
        Err(ActionError::Host(result.error.clone()))
    } else {
        Ok(result.value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn waiters_are_fulfilled_in_fifo_order() {
        let mut pending = PendingCalls::default();
        let mut first = pending.defer("requestAccounts");
        let mut second = pending.defer("requestAccounts");
        assert_eq!(pending.outstanding("requestAccounts"), 2);

        pending
            .take_next("requestAccounts")
            .expect("first waiter")
            .fulfil(Ok(json!(["0x1"])));
        assert_eq!(first.try_take(), Some(Ok(json!(["0x1"]))));
        assert_eq!(second.try_take(), None);

        pending
            .take_next("requestAccounts")
            .expect("second waiter")
            .fulfil(Ok(json!(["0x2"])));
        assert_eq!(second.try_take(), Some(Ok(json!(["0x2"]))));
        assert!(pending.take_next("requestAccounts").is_none());
        assert_eq!(pending.outstanding("requestAccounts"), 0);
    }

    #[test]
    fn dropped_sender_reports_abandoned() {
        let mut pending = PendingCalls::default();
        let mut handle = pending.defer("createAccount");
        drop(pending.drain());
        assert_eq!(handle.try_take(), Some(Err(ActionError::Abandoned)));
    }

    #[test]
    fn outcome_follows_error_truthiness() {
        let mut result = ActionResult {
            kind: "requestAccounts".to_string(),
            error: json!(null),
            value: json!(["0xabc"]),
        };
        assert_eq!(outcome_of(&result), Ok(json!(["0xabc"])));
        result.error = json!("User denied");
        assert_eq!(outcome_of(&result), Err(ActionError::Host(json!("User denied"))));
    }
}
