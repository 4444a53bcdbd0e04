//! Sequential composer.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::{claim, CompositeBase};
use crate::component::{Component, ComponentFuture};
use crate::error::Error;

// ── Chain ─────────────────────────────────────────────────────────────────────

/// Chain of responsibility: children open left→right and shut down
/// right→left.
///
/// Each position is linked to its neighbours by a pair of cancellation
/// tokens. Firing the `ascendant` token releases the position above; the
/// local token fires once the position below has fully terminated. A
/// descendant's `wait()` therefore returns before its ascendant's `close()`
/// is invoked, on every exit path — ordered shutdown, a child terminating
/// on its own in the middle of the chain, or an open failure unwinding the
/// already-opened prefix.
///
/// ```
/// use std::sync::Arc;
/// use tokio_util::sync::CancellationToken;
/// use warden::{Chain, Component, Control};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), warden::Error> {
/// let root = CancellationToken::new();
/// let chain = Chain::new(
///     &root,
///     vec![
///         Arc::new(Control::new(&root, Vec::new())), // opens first, closes last
///         Arc::new(Control::new(&root, Vec::new())),
///     ],
/// );
///
/// chain.open().await?;
/// chain.close().await?;
/// chain.wait().await?;
/// # Ok(())
/// # }
/// ```
pub struct Chain {
    base: Arc<CompositeBase>,
    children: Vec<Arc<dyn Component>>,
}

impl Chain {
    /// Create a chain under `parent`. Order is significant: the first child
    /// is the outermost ascendant. No child method is called until
    /// [`Component::open`].
    pub fn new(parent: &CancellationToken, children: Vec<Arc<dyn Component>>) -> Self {
        Self {
            base: Arc::new(CompositeBase::new(parent)),
            children,
        }
    }

    async fn open_all(&self) -> Result<(), Error> {
        if !self.base.claim_open() {
            return self.base.open_err.result();
        }
        if self.children.is_empty() {
            self.base.open_err.set(Error::EmptyComposite);
            self.base.seal();
            return Err(Error::EmptyComposite);
        }

        debug!(children = self.children.len(), "opening chain");
        // The head has no real ascendant; its release token just absorbs
        // the final cascade.
        let mut ascendant = CancellationToken::new();
        let mut result = Ok(());
        for (idx, child) in self.children.iter().enumerate() {
            match child.open().await {
                Err(err) => {
                    trace!(child = idx, "child open failed, unwinding");
                    self.base.open_err.set(err.clone());
                    ascendant.cancel();
                    self.base.cancel.cancel();
                    result = Err(err);
                    break;
                }
                Ok(()) => {
                    ascendant = self.supervise(idx, Arc::clone(child), ascendant);
                }
            }
        }
        if result.is_ok() {
            // Tail sentinel: composite shutdown starts the unwind from the
            // last position.
            let scope = self.base.cancel.clone();
            let tail = ascendant.clone();
            tokio::spawn(async move {
                scope.cancelled().await;
                tail.cancel();
            });
        }

        self.base.seal();
        result
    }

    /// Arm the watchdogs for an opened child and hand back the local token
    /// its descendant will use to release it.
    fn supervise(
        &self,
        idx: usize,
        child: Arc<dyn Component>,
        ascendant: CancellationToken,
    ) -> CancellationToken {
        let local = CancellationToken::new();
        let wait_exited = Arc::new(AtomicBool::new(false));

        // Close-watchdog: descendant terminated → close this child.
        self.base.close_wg.spawn({
            let base = Arc::clone(&self.base);
            let child = Arc::clone(&child);
            let local = local.clone();
            let wait_exited = Arc::clone(&wait_exited);
            async move {
                local.cancelled().await;
                if claim(&wait_exited) {
                    trace!(child = idx, "closing child");
                    if let Err(err) = child.close().await {
                        base.close_err.set(err);
                    }
                }
            }
        });

        // Wait-watchdog: child terminated → if this was not an ordered
        // shutdown, cancel the scope and let the descendants drain first;
        // then release the ascendant.
        self.base.wait_wg.spawn({
            let base = Arc::clone(&self.base);
            let local = local.clone();
            async move {
                if let Err(err) = child.wait().await {
                    base.wait_err.set(err);
                }
                claim(&wait_exited);
                if !base.cancel.is_cancelled() {
                    trace!(child = idx, "abnormal termination, draining descendants");
                    base.cancel.cancel();
                    local.cancelled().await;
                }
                ascendant.cancel();
                local.cancel();
            }
        });

        local
    }
}

impl Component for Chain {
    fn open(&self) -> ComponentFuture<'_> {
        Box::pin(self.open_all())
    }

    fn close(&self) -> ComponentFuture<'_> {
        Box::pin(self.base.close())
    }

    fn wait(&self) -> ComponentFuture<'_> {
        Box::pin(self.base.wait())
    }
}
