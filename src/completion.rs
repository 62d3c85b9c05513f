use std::sync::mpsc::{self, Receiver};

use crate::error::{WriteError, WriteResult};

/// One-shot continuation resolved when a record leaves the engine.
///
/// Resolving consumes the value, so firing twice is impossible. A completion
/// dropped unresolved (a torn down queue, a dead worker) resolves itself with
/// `WriteError::Shutdown` so the caller always hears back.
pub struct Completion {
    f: Option<Box<dyn FnOnce(WriteResult) + Send>>,
}

impl Completion {
    pub fn new<F>(f: F) -> Completion
    where
        F: FnOnce(WriteResult) + Send + 'static,
    {
        Completion { f: Some(Box::new(f)) }
    }

    /// A completion nobody listens to.
    pub fn noop() -> Completion {
        Completion { f: None }
    }

    /// A completion wired to a channel, for callers that want to wait.
    pub fn pair() -> (Completion, Receiver<WriteResult>) {
        let (tx, rx) = mpsc::channel();

        let completion = Completion::new(move |result| {
            let _ = tx.send(result);
        });

        (completion, rx)
    }

    pub fn resolve(mut self, result: WriteResult) {
        if let Some(f) = self.f.take() {
            f(result);
        }
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if let Some(f) = self.f.take() {
            f(Err(WriteError::Shutdown));
        }
    }
}
