//! The component contract and the task adapter.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::error::Error;
use crate::trap::Trap;

// ── Component ─────────────────────────────────────────────────────────────────

/// A boxed future returned by the [`Component`] lifecycle methods.
///
/// Boxing keeps the trait object-safe so children can be held as
/// `Arc<dyn Component>` and supervised from spawned tasks.
pub type ComponentFuture<'a> = Pin<Box<dyn Future<Output = Result<(), Error>> + Send + 'a>>;

/// A long-running unit with a three-phase lifecycle.
///
/// `open` blocks until initialization is complete. `close` requests
/// shutdown without waiting for termination. `wait` blocks until the
/// component has fully terminated and returns the terminal error, if any.
///
/// All three methods are idempotent: repeated calls return equal results.
/// `close` must be safe to never call — a component that terminates on its
/// own is well-behaved.
pub trait Component: Send + Sync {
    /// Block until the component is initialized.
    ///
    /// When `open` fails the caller will not invoke `close`; the component
    /// must not retain side effects that would require one.
    fn open(&self) -> ComponentFuture<'_>;

    /// Request shutdown.
    fn close(&self) -> ComponentFuture<'_>;

    /// Block until the component has terminated.
    fn wait(&self) -> ComponentFuture<'_>;
}

// ── Wrapped ───────────────────────────────────────────────────────────────────

type WrappedTask = Box<
    dyn FnOnce(CancellationToken) -> Pin<Box<dyn Future<Output = Result<(), Error>> + Send>>
        + Send,
>;

/// Adapts an async task into a [`Component`].
///
/// The task receives the component's own cancellation token and should
/// return once it observes cancellation. An `Err` from the task is trapped
/// (recorded and the token cancelled); normal completion also cancels the
/// token, so a task that finishes on its own terminates the component.
///
/// ```
/// use tokio_util::sync::CancellationToken;
/// use warden::{Component, Wrapped};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), warden::Error> {
/// let parent = CancellationToken::new();
/// let worker = Wrapped::new(&parent, |shutdown| async move {
///     shutdown.cancelled().await;
///     Ok(())
/// });
///
/// worker.open().await?;
/// worker.close().await?;
/// worker.wait().await?;
/// # Ok(())
/// # }
/// ```
pub struct Wrapped {
    token: CancellationToken,
    opened: AtomicBool,
    task: Mutex<Option<WrappedTask>>,
    trap: Arc<Trap>,
    done: TaskTracker,
}

impl Wrapped {
    pub fn new<F, Fut>(parent: &CancellationToken, task: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), Error>> + Send + 'static,
    {
        let token = parent.child_token();
        let task: WrappedTask = Box::new(move |token| Box::pin(task(token)));
        Self {
            trap: Arc::new(Trap::new(token.clone())),
            opened: AtomicBool::new(false),
            task: Mutex::new(Some(task)),
            done: TaskTracker::new(),
            token,
        }
    }
}

impl Component for Wrapped {
    fn open(&self) -> ComponentFuture<'_> {
        Box::pin(async move {
            if self
                .opened
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                return Ok(());
            }
            let task = self
                .task
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            if let Some(task) = task {
                let trap = Arc::clone(&self.trap);
                let token = self.token.clone();
                self.done.spawn(async move {
                    match task(token).await {
                        Ok(()) => trap.cancel(),
                        Err(err) => trap.trap(err),
                    }
                });
            }
            self.done.close();
            Ok(())
        })
    }

    fn close(&self) -> ComponentFuture<'_> {
        Box::pin(async move {
            self.token.cancel();
            Ok(())
        })
    }

    fn wait(&self) -> ComponentFuture<'_> {
        Box::pin(async move {
            self.done.wait().await;
            match self.trap.err() {
                None => Ok(()),
                Some(err) => Err(err),
            }
        })
    }
}
