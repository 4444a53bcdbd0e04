//! Group lifecycle scenarios.

mod common;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use warden::{Chain, Component, Error, Group};

use common::{Counters, EventLog, Probe};

#[tokio::test]
async fn happy_path_runs_every_child_once() {
    common::init_tracing();
    let log = EventLog::new();
    let a = Probe::new("a", &log);
    let b = Probe::new("b", &log);
    let c = Probe::new("c", &log);
    let group = Group::new(
        &CancellationToken::new(),
        vec![a.clone(), b.clone(), c.clone()],
    );

    assert!(group.open().await.is_ok());
    assert!(group.close().await.is_ok());
    assert!(group.wait().await.is_ok());

    // idempotent repeats return the same results
    assert!(group.open().await.is_ok());
    assert!(group.close().await.is_ok());
    assert!(group.wait().await.is_ok());

    for probe in [&a, &b, &c] {
        assert_eq!(
            probe.counters(),
            Counters {
                open: 1,
                close: 1,
                wait: 1
            }
        );
    }
    assert_eq!(
        log.sorted(),
        [
            "a-close", "a-done", "a-open", "b-close", "b-done", "b-open", "c-close", "c-done",
            "c-open",
        ]
    );
}

#[tokio::test]
async fn open_failure_leaves_failed_child_unclosed() {
    let log = EventLog::new();
    let a = Probe::new("a", &log);
    let b = Probe::failing_open("b", &log, Error::other("b"));
    let c = Probe::new("c", &log);
    let group = Group::new(
        &CancellationToken::new(),
        vec![a.clone(), b.clone(), c.clone()],
    );

    assert_eq!(group.open().await.unwrap_err().to_string(), "b");
    assert_eq!(group.open().await.unwrap_err().to_string(), "b");
    assert!(group.wait().await.is_ok());

    assert_eq!(
        a.counters(),
        Counters {
            open: 1,
            close: 1,
            wait: 1
        }
    );
    assert_eq!(
        b.counters(),
        Counters {
            open: 1,
            close: 0,
            wait: 0
        }
    );
    assert_eq!(
        c.counters(),
        Counters {
            open: 1,
            close: 1,
            wait: 1
        }
    );
}

#[tokio::test]
async fn crashed_child_brings_down_siblings() {
    let log = EventLog::new();
    let a = Probe::new("a", &log);
    let b = Probe::new("b", &log);
    let messy = Probe::new("m", &log);
    let group = Group::new(
        &CancellationToken::new(),
        vec![a.clone(), b.clone(), messy.clone()],
    );

    assert!(group.open().await.is_ok());
    messy.terminate(Some(Error::other("err")));

    assert_eq!(group.wait().await.unwrap_err().to_string(), "err");
    assert_eq!(group.wait().await.unwrap_err().to_string(), "err");

    assert_eq!(
        a.counters(),
        Counters {
            open: 1,
            close: 1,
            wait: 1
        }
    );
    assert_eq!(
        b.counters(),
        Counters {
            open: 1,
            close: 1,
            wait: 1
        }
    );
    // the crashed child terminated by itself and is not re-closed
    assert_eq!(
        messy.counters(),
        Counters {
            open: 1,
            close: 0,
            wait: 1
        }
    );
}

#[tokio::test]
async fn parent_cancellation_is_equivalent_to_close() {
    let log = EventLog::new();
    let a = Probe::new("a", &log);
    let b = Probe::new("b", &log);
    let parent = CancellationToken::new();
    let group = Group::new(&parent, vec![a.clone(), b.clone()]);

    assert!(group.open().await.is_ok());
    parent.cancel();
    assert!(group.wait().await.is_ok());

    for probe in [&a, &b] {
        assert_eq!(
            probe.counters(),
            Counters {
                open: 1,
                close: 1,
                wait: 1
            }
        );
    }
}

#[tokio::test]
async fn close_and_wait_require_open() {
    let group = Group::new(
        &CancellationToken::new(),
        vec![Probe::new("a", &EventLog::new())],
    );

    assert!(matches!(group.close().await.unwrap_err(), Error::NotOpened));
    assert!(matches!(group.wait().await.unwrap_err(), Error::NotOpened));
}

#[tokio::test]
async fn empty_group_fails_open() {
    let group = Group::new(&CancellationToken::new(), Vec::new());

    assert!(matches!(
        group.open().await.unwrap_err(),
        Error::EmptyComposite
    ));
    assert!(matches!(
        group.open().await.unwrap_err(),
        Error::EmptyComposite
    ));
    // the open attempt consumed the once-flag; both axes drain cleanly
    assert!(group.close().await.is_ok());
    assert!(group.wait().await.is_ok());
}

#[tokio::test]
async fn group_of_chains_is_a_component() {
    let log = EventLog::new();
    let a1 = Probe::new("a1", &log);
    let a2 = Probe::new("a2", &log);
    let b1 = Probe::new("b1", &log);
    let b2 = Probe::new("b2", &log);
    let root = CancellationToken::new();
    let group = Group::new(
        &root,
        vec![
            Arc::new(Chain::new(&root, vec![a1.clone(), a2.clone()])),
            Arc::new(Chain::new(&root, vec![b1.clone(), b2.clone()])),
        ],
    );

    assert!(group.open().await.is_ok());
    assert!(group.close().await.is_ok());
    assert!(group.wait().await.is_ok());

    for probe in [&a1, &a2, &b1, &b2] {
        assert_eq!(
            probe.counters(),
            Counters {
                open: 1,
                close: 1,
                wait: 1
            }
        );
    }

    // within each chain the ordering contract holds
    let events = log.snapshot();
    let pos = |event: &str| events.iter().position(|e| e.as_str() == event).unwrap();
    for (first, second) in [("a1", "a2"), ("b1", "b2")] {
        assert!(pos(&format!("{first}-open")) < pos(&format!("{second}-open")));
        assert!(pos(&format!("{second}-close")) < pos(&format!("{second}-done")));
        assert!(pos(&format!("{second}-done")) < pos(&format!("{first}-close")));
        assert!(pos(&format!("{first}-close")) < pos(&format!("{first}-done")));
    }
}
