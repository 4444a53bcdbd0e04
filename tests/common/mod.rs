//! Shared test doubles: a scriptable probe component and an event log.
#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio_util::sync::CancellationToken;
use warden::{Component, ComponentFuture, Error};

/// Install a subscriber once so `RUST_LOG=trace cargo test` shows the
/// watchdog activity behind a failing scenario.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Records `"<name>-<event>"` strings in call order.
#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<String>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, name: &str, event: &str) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(format!("{name}-{event}"));
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The log as a sorted multiset, for scenarios where ordering between
    /// siblings is unspecified.
    pub fn sorted(&self) -> Vec<String> {
        let mut events = self.snapshot();
        events.sort();
        events
    }
}

/// Lifecycle call counts for one probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counters {
    pub open: u32,
    pub close: u32,
    pub wait: u32,
}

/// A scriptable component: counts calls, reports events, optionally fails
/// `open`, and terminates when closed or on demand via [`Probe::terminate`].
pub struct Probe {
    name: &'static str,
    open_count: AtomicU32,
    close_count: AtomicU32,
    wait_count: AtomicU32,
    open_err: Option<Error>,
    wait_err: Mutex<Option<Error>>,
    closed: CancellationToken,
    log: EventLog,
}

impl Probe {
    pub fn new(name: &'static str, log: &EventLog) -> Arc<Self> {
        Self::build(name, log, None)
    }

    pub fn failing_open(name: &'static str, log: &EventLog, err: Error) -> Arc<Self> {
        Self::build(name, log, Some(err))
    }

    fn build(name: &'static str, log: &EventLog, open_err: Option<Error>) -> Arc<Self> {
        Arc::new(Self {
            name,
            open_count: AtomicU32::new(0),
            close_count: AtomicU32::new(0),
            wait_count: AtomicU32::new(0),
            open_err,
            wait_err: Mutex::new(None),
            closed: CancellationToken::new(),
            log: log.clone(),
        })
    }

    /// Terminate on our own, the way a crashing or self-stopping child
    /// would.
    pub fn terminate(&self, err: Option<Error>) {
        *self.wait_err.lock().unwrap_or_else(PoisonError::into_inner) = err;
        self.closed.cancel();
    }

    pub fn counters(&self) -> Counters {
        Counters {
            open: self.open_count.load(Ordering::SeqCst),
            close: self.close_count.load(Ordering::SeqCst),
            wait: self.wait_count.load(Ordering::SeqCst),
        }
    }
}

impl Component for Probe {
    fn open(&self) -> ComponentFuture<'_> {
        Box::pin(async move {
            self.open_count.fetch_add(1, Ordering::SeqCst);
            self.log.push(self.name, "open");
            match &self.open_err {
                Some(err) => Err(err.clone()),
                None => Ok(()),
            }
        })
    }

    fn close(&self) -> ComponentFuture<'_> {
        Box::pin(async move {
            self.close_count.fetch_add(1, Ordering::SeqCst);
            self.log.push(self.name, "close");
            self.closed.cancel();
            Ok(())
        })
    }

    fn wait(&self) -> ComponentFuture<'_> {
        Box::pin(async move {
            self.wait_count.fetch_add(1, Ordering::SeqCst);
            self.closed.cancelled().await;
            self.log.push(self.name, "done");
            let err = self
                .wait_err
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone();
            match err {
                None => Ok(()),
                Some(err) => Err(err),
            }
        })
    }
}
