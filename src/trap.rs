//! First-error trap for leaf adapters.

use tokio_util::sync::CancellationToken;

use crate::error::{ErrCell, Error};

/// An error accumulator coupled to a cancellation handle: any trapped error
/// cancels the token.
///
/// Composites keep per-axis cells instead; the trap serves leaf adapters
/// that have a single terminal error.
pub(crate) struct Trap {
    cell: ErrCell,
    token: CancellationToken,
}

impl Trap {
    pub(crate) fn new(token: CancellationToken) -> Self {
        Self {
            cell: ErrCell::default(),
            token,
        }
    }

    /// Record `err` and cancel.
    pub(crate) fn trap(&self, err: Error) {
        self.cell.set(err);
        self.token.cancel();
    }

    /// Cancel without recording an error.
    pub(crate) fn cancel(&self) {
        self.token.cancel();
    }

    pub(crate) fn err(&self) -> Option<Error> {
        self.cell.get()
    }
}
