//! One-shot completion signal shared by racing poll attempts.

use std::sync::{Arc, Mutex, PoisonError};

use remote_formula_core::ExecutionReport;
use tokio::sync::oneshot;

/// What an attempt can report to the coordinator.
#[derive(Debug)]
pub enum AttemptSignal {
    Ready(ExecutionReport),
    Unauthorized(String),
}

/// Cloneable handle around a single `oneshot::Sender`.
///
/// The first `fire` wins; every later `fire` (and any after `close`) is
/// a no-op that returns false.
#[derive(Debug, Clone)]
pub struct CompletionSignal {
    slot: Arc<Mutex<Option<oneshot::Sender<AttemptSignal>>>>,
}

impl CompletionSignal {
    pub fn new() -> (Self, oneshot::Receiver<AttemptSignal>) {
        let (tx, rx) = oneshot::channel();
        let signal = Self {
            slot: Arc::new(Mutex::new(Some(tx))),
        };
        (signal, rx)
    }

    fn take(&self) -> Option<oneshot::Sender<AttemptSignal>> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Deliver `signal` if nothing has been delivered yet.
    pub fn fire(&self, signal: AttemptSignal) -> bool {
        self.take().is_some_and(|tx| tx.send(signal).is_ok())
    }

    /// Refuse all further signals.
    pub fn close(&self) {
        drop(self.take());
    }

    /// Whether a signal was delivered or the signal was closed.
    pub fn is_settled(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}
