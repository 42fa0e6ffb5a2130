//! Completion signal returned by `play()`.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::channel::oneshot;
use futures::future::{FutureExt, Shared};
use serde::{Deserialize, Serialize};

use crate::ids::RunId;

/// Final state of a completed pass.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run: RunId,
    pub iterations: u32,
    pub elapsed_ms: f64,
}

/// Cloneable future resolving once the run completes.
///
/// Resolves to `None` if the run is dropped before it completes.
#[derive(Clone)]
pub struct Completion {
    inner: Shared<oneshot::Receiver<RunSummary>>,
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("summary", &self.try_summary())
            .finish()
    }
}

impl Completion {
    /// Summary if the run has already completed; never blocks.
    pub fn try_summary(&self) -> Option<RunSummary> {
        self.inner.clone().now_or_never().and_then(|r| r.ok())
    }

    pub fn is_resolved(&self) -> bool {
        self.try_summary().is_some()
    }
}

impl Future for Completion {
    type Output = Option<RunSummary>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.poll_unpin(cx).map(|r| r.ok())
    }
}

/// Sender side, owned by the run. Resolves at most once.
#[derive(Debug)]
pub(crate) struct CompletionSignal {
    sender: Option<oneshot::Sender<RunSummary>>,
    completion: Completion,
}

impl CompletionSignal {
    pub(crate) fn new() -> Self {
        let (sender, receiver) = oneshot::channel();
        Self {
            sender: Some(sender),
            completion: Completion {
                inner: receiver.shared(),
            },
        }
    }

    pub(crate) fn completion(&self) -> Completion {
        self.completion.clone()
    }

    /// Returns false if the signal had already resolved.
    pub(crate) fn resolve(&mut self, summary: RunSummary) -> bool {
        match self.sender.take() {
            Some(sender) => {
                // A receiver is always held by `self.completion`.
                let _ = sender.send(summary);
                true
            }
            None => false,
        }
    }

    pub(crate) fn is_resolved(&self) -> bool {
        self.sender.is_none()
    }
}
