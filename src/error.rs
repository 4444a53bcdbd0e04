//! Error vocabulary and aggregation.
//!
//! Composites collect failures across three independent axes (open, close,
//! wait). [`Error::append`] is the combinator that folds the errors of one
//! axis into a flat [`MultiError`] whose textual form is the comma-joined
//! child messages. Multi-errors are never nested.

use std::error::Error as StdError;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

// ── Error ─────────────────────────────────────────────────────────────────────

/// Errors surfaced by the supervision primitives.
///
/// Variant payloads are cheap to clone so that idempotent lifecycle methods
/// can hand back the same stored result on every call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// `close()` or `wait()` was invoked on a composite that was never
    /// opened.
    #[error("composite is not opened")]
    NotOpened,

    /// `open()` was invoked on a composite with zero children.
    #[error("composite has no children")]
    EmptyComposite,

    /// A timeout blocker reached its deadline before the supervising token
    /// was cancelled.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// Flat aggregate of the errors collected on one axis.
    #[error(transparent)]
    Multi(MultiError),

    /// An error produced by component code.
    #[error("{0}")]
    Other(Arc<dyn StdError + Send + Sync + 'static>),
}

impl Error {
    /// Wrap an arbitrary component error.
    pub fn other<E>(err: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync + 'static>>,
    {
        Error::Other(Arc::from(err.into()))
    }

    /// Fold two optional errors into one.
    ///
    /// `None` is the identity. Two errors combine into a [`MultiError`];
    /// an operand that already is a `Multi` is spliced in, so the result
    /// stays flat and preserves left-to-right order.
    pub fn append(left: Option<Error>, right: Option<Error>) -> Option<Error> {
        match (left, right) {
            (None, None) => None,
            (Some(err), None) | (None, Some(err)) => Some(err),
            (Some(left), Some(right)) => {
                let mut errors = Vec::new();
                for err in [left, right] {
                    match err {
                        Error::Multi(multi) => errors.extend(multi.errors),
                        other => errors.push(other),
                    }
                }
                Some(Error::Multi(MultiError { errors }))
            }
        }
    }
}

// ── MultiError ────────────────────────────────────────────────────────────────

/// Ordered, flat aggregation of errors.
#[derive(Debug, Clone, Default)]
pub struct MultiError {
    pub errors: Vec<Error>,
}

impl fmt::Display for MultiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl StdError for MultiError {}

// ── ErrCell ───────────────────────────────────────────────────────────────────

/// Monotone error accumulator guarding one axis of a composite.
///
/// `set` folds via [`Error::append`]; once non-empty the cell only grows,
/// it never resets.
#[derive(Default)]
pub(crate) struct ErrCell {
    inner: Mutex<Option<Error>>,
}

impl ErrCell {
    pub(crate) fn set(&self, err: Error) {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = Error::append(guard.take(), Some(err));
    }

    pub(crate) fn get(&self) -> Option<Error> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn result(&self) -> Result<(), Error> {
        match self.get() {
            None => Ok(()),
            Some(err) => Err(err),
        }
    }
}
