//! Composite lifecycle engine shared by [`Group`] and [`Chain`].
//!
//! A composite owns its children's lifecycle from the first `open()` until
//! the final `wait()` returns. Failures are collected per axis: `open()`,
//! `close()` and `wait()` each report only what went wrong on their own
//! axis, so a caller draining a shutdown is not shown stale open errors.
//!
//! The cancellation scope is a child of the caller-supplied parent token —
//! cancelling the parent is equivalent to calling `close()` on the
//! composite.

mod chain;
mod group;

pub use chain::Chain;
pub use group::Group;

use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::error::{ErrCell, Error};

// ── CompositeBase ─────────────────────────────────────────────────────────────

/// State shared by the composers: the cancellation scope, the once-flag,
/// the per-axis error cells and the close/wait trackers.
pub(crate) struct CompositeBase {
    pub(crate) cancel: CancellationToken,
    opened: AtomicBool,
    pub(crate) open_err: ErrCell,
    pub(crate) close_wg: TaskTracker,
    pub(crate) close_err: ErrCell,
    pub(crate) wait_wg: TaskTracker,
    pub(crate) wait_err: ErrCell,
}

impl CompositeBase {
    pub(crate) fn new(parent: &CancellationToken) -> Self {
        Self {
            cancel: parent.child_token(),
            opened: AtomicBool::new(false),
            open_err: ErrCell::default(),
            close_wg: TaskTracker::new(),
            close_err: ErrCell::default(),
            wait_wg: TaskTracker::new(),
            wait_err: ErrCell::default(),
        }
    }

    /// Claim the once-flag. The winner runs the open sequence; later
    /// callers re-read the stored open error.
    pub(crate) fn claim_open(&self) -> bool {
        self.opened
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn is_opened(&self) -> bool {
        self.opened.load(Ordering::Acquire)
    }

    /// Mark both trackers complete. Must run at the end of every open path,
    /// otherwise `close()` and `wait()` block on a tracker that never
    /// closes.
    pub(crate) fn seal(&self) {
        self.close_wg.close();
        self.wait_wg.close();
    }

    pub(crate) async fn close(&self) -> Result<(), Error> {
        if !self.is_opened() {
            return Err(Error::NotOpened);
        }
        self.cancel.cancel();
        self.close_wg.wait().await;
        self.close_err.result()
    }

    pub(crate) async fn wait(&self) -> Result<(), Error> {
        if !self.is_opened() {
            return Err(Error::NotOpened);
        }
        self.wait_wg.wait().await;
        self.wait_err.result()
    }
}

// ── claim ─────────────────────────────────────────────────────────────────────

/// CAS arbiter for the per-child close race: the close-watchdog and the
/// wait-watchdog both try to claim the flag, and only the winner may call
/// (or skip) the child's `close()`.
pub(crate) fn claim(flag: &AtomicBool) -> bool {
    flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_ok()
}
