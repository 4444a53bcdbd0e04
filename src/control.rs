//! Leaf adapter exposing a cancellation token to user code.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::blocker::{Blocker, CompositeBlocker};
use crate::component::{Component, ComponentFuture};

/// Turns arbitrary user code into a [`Component`].
///
/// User code holds the [`token`](Control::token) and treats its
/// cancellation as the shutdown request. Attached blockers delay `wait()`
/// until their conditions resolve; the token is always cancelled before
/// blocker evaluation begins.
///
/// ```
/// use tokio_util::sync::CancellationToken;
/// use warden::{Component, Control};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), warden::Error> {
/// let root = CancellationToken::new();
/// let control = Control::new(&root, Vec::new());
///
/// let shutdown = control.token();
/// tokio::spawn(async move {
///     shutdown.cancelled().await;
///     // release resources here
/// });
///
/// control.open().await?;
/// control.close().await?;
/// control.wait().await?;
/// # Ok(())
/// # }
/// ```
pub struct Control {
    token: CancellationToken,
    blocker: CompositeBlocker,
}

impl Control {
    pub fn new(parent: &CancellationToken, blockers: Vec<Arc<dyn Blocker>>) -> Self {
        Self {
            token: parent.child_token(),
            blocker: CompositeBlocker::new(blockers),
        }
    }

    /// The cancellation handle observed by the user code driving this
    /// component. Cancelled by `close()` or by the parent.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

impl Component for Control {
    fn open(&self) -> ComponentFuture<'_> {
        Box::pin(async { Ok(()) })
    }

    fn close(&self) -> ComponentFuture<'_> {
        Box::pin(async move {
            self.token.cancel();
            self.blocker.close().await
        })
    }

    fn wait(&self) -> ComponentFuture<'_> {
        Box::pin(async move {
            self.token.cancelled().await;
            self.blocker.wait().await
        })
    }
}
