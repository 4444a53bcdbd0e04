//! Parallel composer.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::{claim, CompositeBase};
use crate::component::{Component, ComponentFuture};
use crate::error::Error;

// ── Group ─────────────────────────────────────────────────────────────────────

/// Runs children concurrently and cross-propagates every failure.
///
/// All children are opened in parallel. Each opened child is watched by a
/// close-watchdog (scope cancelled → close the child) and a wait-watchdog
/// (child terminated → cancel the scope), so one child failing on any axis
/// brings the whole group down. A group is itself a [`Component`]; nesting
/// composites is the only structuring mechanism.
///
/// ```
/// use std::sync::Arc;
/// use tokio_util::sync::CancellationToken;
/// use warden::{Component, Control, Group};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), warden::Error> {
/// let root = CancellationToken::new();
/// let group = Group::new(
///     &root,
///     vec![
///         Arc::new(Control::new(&root, Vec::new())),
///         Arc::new(Control::new(&root, Vec::new())),
///     ],
/// );
///
/// group.open().await?;
/// group.close().await?;
/// group.wait().await?;
/// # Ok(())
/// # }
/// ```
pub struct Group {
    base: Arc<CompositeBase>,
    children: Vec<Arc<dyn Component>>,
}

impl Group {
    /// Create a group under `parent`. No child method is called until
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

        debug!(children = self.children.len(), "opening group");
        let mut openers = JoinSet::new();
        for (idx, child) in self.children.iter().enumerate() {
            openers.spawn(open_child(
                Arc::clone(&self.base),
                Arc::clone(child),
                idx,
            ));
        }
        while let Some(joined) = openers.join_next().await {
            if let Err(err) = joined {
                self.base
                    .open_err
                    .set(Error::other(format!("opener task panicked: {err}")));
                self.base.cancel.cancel();
            }
        }

        self.base.seal();
        self.base.open_err.result()
    }
}

impl Component for Group {
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

// ── open_child ────────────────────────────────────────────────────────────────

/// Open one child and, on success, arm its watchdogs.
///
/// A failed child is left alone: no watchdogs, no later `close()`.
async fn open_child(base: Arc<CompositeBase>, child: Arc<dyn Component>, idx: usize) {
    if let Err(err) = child.open().await {
        trace!(child = idx, "child open failed");
        base.open_err.set(err);
        base.cancel.cancel();
        return;
    }
    let wait_exited = Arc::new(AtomicBool::new(false));

    // Close-watchdog: scope cancelled → close the child, unless its wait
    // already returned.
    base.close_wg.spawn({
        let base = Arc::clone(&base);
        let child = Arc::clone(&child);
        let wait_exited = Arc::clone(&wait_exited);
        async move {
            base.cancel.cancelled().await;
            if claim(&wait_exited) {
                trace!(child = idx, "closing child");
                if let Err(err) = child.close().await {
                    base.close_err.set(err);
                }
            }
        }
    });

    // Wait-watchdog: child terminated → record and propagate shutdown to
    // the siblings.
    base.wait_wg.spawn({
        let base = Arc::clone(&base);
        async move {
            if let Err(err) = child.wait().await {
                base.wait_err.set(err);
            }
            claim(&wait_exited);
            trace!(child = idx, "child terminated");
            base.cancel.cancel();
        }
    });
}
