//! Blockers — conditions that delay a [`Control`](crate::Control)'s
//! termination.
//!
//! A blocker starts evaluating when `close()` is called and resolves in
//! `wait()`. `Control` cancels its own token before closing its blockers,
//! so user code observing the token always sees cancellation before
//! blocker evaluation begins.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::component::ComponentFuture;
use crate::error::Error;

// ── Blocker ───────────────────────────────────────────────────────────────────

/// A shutdown-delay condition.
pub trait Blocker: Send + Sync {
    /// Begin evaluating the condition.
    fn close(&self) -> ComponentFuture<'_>;

    /// Block until the condition resolves.
    fn wait(&self) -> ComponentFuture<'_>;
}

// ── TimeoutBlocker ────────────────────────────────────────────────────────────

/// Resolves to [`Error::DeadlineExceeded`] after a fixed delay, unless the
/// supervising token is cancelled first.
pub struct TimeoutBlocker {
    parent: CancellationToken,
    timeout: Duration,
    started: AtomicBool,
    deadline: CancellationToken,
}

impl TimeoutBlocker {
    pub fn new(parent: &CancellationToken, timeout: Duration) -> Self {
        Self {
            parent: parent.clone(),
            timeout,
            started: AtomicBool::new(false),
            deadline: CancellationToken::new(),
        }
    }
}

impl Blocker for TimeoutBlocker {
    /// Start the timer. Repeated calls keep the first deadline.
    fn close(&self) -> ComponentFuture<'_> {
        Box::pin(async move {
            if self
                .started
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                let deadline = self.deadline.clone();
                let timeout = self.timeout;
                tokio::spawn(async move {
                    tokio::time::sleep(timeout).await;
                    deadline.cancel();
                });
            }
            Ok(())
        })
    }

    fn wait(&self) -> ComponentFuture<'_> {
        Box::pin(async move {
            tokio::select! {
                biased;
                _ = self.parent.cancelled() => Ok(()),
                _ = self.deadline.cancelled() => Err(Error::DeadlineExceeded),
            }
        })
    }
}

// ── CompositeBlocker ──────────────────────────────────────────────────────────

/// Waits on a set of blockers, surfacing the first failure early.
pub struct CompositeBlocker {
    children: Vec<Arc<dyn Blocker>>,
}

impl CompositeBlocker {
    pub fn new(children: Vec<Arc<dyn Blocker>>) -> Self {
        Self { children }
    }
}

impl Blocker for CompositeBlocker {
    /// Close every child in order, folding failures with [`Error::append`].
    fn close(&self) -> ComponentFuture<'_> {
        Box::pin(async move {
            let mut err = None;
            for child in &self.children {
                if let Err(e) = child.close().await {
                    err = Error::append(err, Some(e));
                }
            }
            match err {
                None => Ok(()),
                Some(err) => Err(err),
            }
        })
    }

    /// Wait for all children, or return on the first child error.
    ///
    /// An `Err` here does not mean every child has resolved: the remaining
    /// child waits are abandoned as soon as one child fails.
    fn wait(&self) -> ComponentFuture<'_> {
        Box::pin(async move {
            let mut waits = JoinSet::new();
            for child in &self.children {
                let child = Arc::clone(child);
                waits.spawn(async move { child.wait().await });
            }
            while let Some(joined) = waits.join_next().await {
                match joined {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => return Err(err),
                    Err(err) => return Err(Error::other(format!("blocker task panicked: {err}"))),
                }
            }
            Ok(())
        })
    }
}
