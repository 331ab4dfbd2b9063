//! Request context threaded through every storage call.
//!
//! A `Ctx` carries an optional deadline and any number of cancel signals (one
//! per [`Ctx::with_cancel`] in its ancestry). Backends wrap each statement in
//! [`Ctx::run`] or [`Ctx::run_write`], so a cancelled or expired request stops
//! at the next storage call.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::error::StoreError;

#[derive(Debug, Clone, Default)]
pub struct Ctx {
    deadline: Option<Instant>,
    cancel: Vec<watch::Receiver<bool>>,
}

/// Owner side of a cancellable [`Ctx`]. Dropping it without calling
/// [`CancelHandle::cancel`] leaves the context live.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

impl Ctx {
    /// Never cancelled, no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::background().deadline_at(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self::background().deadline_at(deadline)
    }

    /// Derive a cancellable child. The child keeps this context's deadline
    /// and every cancel signal it already observes: cancelling any ancestor
    /// cancels the child, while the returned handle cancels only the child.
    pub fn with_cancel(&self) -> (Ctx, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        let mut cancel = self.cancel.clone();
        cancel.push(rx);
        let child = Ctx {
            deadline: self.deadline,
            cancel,
        };
        (child, CancelHandle { tx })
    }

    /// Keep the earlier of the current and the given deadline.
    pub fn deadline_at(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(cur) if cur <= deadline => cur,
            _ => deadline,
        });
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Current state: `Some` once cancelled or past the deadline.
    pub fn err(&self) -> Option<StoreError> {
        if self.cancel.iter().any(|rx| *rx.borrow()) {
            return Some(StoreError::cancelled("context cancelled"));
        }
        match self.deadline {
            Some(d) if Instant::now() >= d => {
                Some(StoreError::deadline_exceeded("context deadline exceeded"))
            }
            _ => None,
        }
    }

    /// Race `fut` against this context. A context that is already done fails
    /// without polling `fut`.
    ///
    /// Whatever `fut` already did before it is dropped stays done. Use
    /// [`Ctx::run_write`] for a write whose outcome the caller reports.
    pub async fn run<T, F>(&self, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        if let Some(e) = self.err() {
            return Err(e);
        }

        tokio::select! {
            biased;
            _ = wait_cancelled(self.cancel.clone()) => {
                Err(StoreError::cancelled("context cancelled"))
            }
            _ = wait_deadline(self.deadline) => {
                Err(StoreError::deadline_exceeded("context deadline exceeded"))
            }
            res = fut => res,
        }
    }

    /// Check the context once, then drive `fut` to completion.
    ///
    /// A single-statement write may commit on the server after the client
    /// gives up on it, so its result is always awaited: a cancel or deadline
    /// that lands mid-statement takes effect at the next call instead.
    pub async fn run_write<T, F>(&self, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        if let Some(e) = self.err() {
            return Err(e);
        }
        fut.await
    }
}

/// Resolves once any receiver observes a cancel. A receiver whose sender was
/// dropped without cancelling never fires.
fn wait_cancelled(mut rxs: Vec<watch::Receiver<bool>>) -> Pin<Box<dyn Future<Output = ()> + Send>> {
    Box::pin(async move {
        let Some(mut rx) = rxs.pop() else {
            return std::future::pending::<()>().await;
        };
        tokio::select! {
            _ = async {
                if rx.wait_for(|cancelled| *cancelled).await.is_err() {
                    std::future::pending::<()>().await;
                }
            } => {}
            _ = wait_cancelled(rxs) => {}
        }
    })
}

async fn wait_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(d) => tokio::time::sleep_until(d).await,
        None => std::future::pending::<()>().await,
    }
}
