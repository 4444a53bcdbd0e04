//! Structured lifecycle supervision for long-running tokio components.
//!
//! The single abstraction is the [`Component`]: `open()` blocks until
//! initialization completes, `close()` requests shutdown, `wait()` blocks
//! until termination. Two composers coordinate groups of components and
//! are themselves components:
//!
//! - [`Group`] opens its children concurrently and propagates any failure
//!   to all siblings;
//! - [`Chain`] opens left→right and shuts down right→left, so a descendant
//!   is always drained before its ascendant.
//!
//! A failure on the open or wait axis cancels the composite's scope, which
//! is linked to the caller-supplied parent token — cancelling the parent is
//! equivalent to calling `close()`. This library supervises; it never
//! restarts and never kills: if a child's `wait()` does not return, neither
//! does the composite's.
//!
//! ```
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use warden::{Chain, Component, Control, Group};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), warden::Error> {
//! let root = CancellationToken::new();
//! let storage = Arc::new(Control::new(&root, Vec::new()));
//! let server = Arc::new(Control::new(&root, Vec::new()));
//! let metrics = Arc::new(Control::new(&root, Vec::new()));
//!
//! // Storage comes up first, then the parallel pair; shutdown runs in
//! // reverse.
//! let app = Chain::new(
//!     &root,
//!     vec![
//!         storage.clone(),
//!         Arc::new(Group::new(&root, vec![server.clone(), metrics.clone()])),
//!     ],
//! );
//!
//! app.open().await?;
//! app.close().await?;
//! app.wait().await?;
//! # Ok(())
//! # }
//! ```

mod blocker;
mod component;
mod composite;
mod control;
mod error;
mod trap;

pub use blocker::{Blocker, CompositeBlocker, TimeoutBlocker};
pub use component::{Component, ComponentFuture, Wrapped};
pub use composite::{Chain, Group};
pub use control::Control;
pub use error::{Error, MultiError};
