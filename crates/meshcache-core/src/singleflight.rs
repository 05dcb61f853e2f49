//! Per-key request coalescing.
//!
//! Concurrent loads of the same key collapse into one: the first caller (the
//! leader) runs the work, everyone else waits on the leader's outcome. A
//! record exists in the call map only while exactly one load is in flight
//! for its key; completed results are never cached here, that is the group's
//! job.
//!
//! The rendezvous is a `tokio::sync::watch` channel publishing
//! `Option<Result<ByteView>>`: `None` while in flight, `Some` exactly once.
//! The work itself runs on a detached task, so a caller that goes away does
//! not tear down a load other waiters still need. A drop guard removes the
//! record even when the work panics, letting later calls retry.

use crate::error::{Error, Result};
use crate::view::ByteView;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;

type Outcome = Result<ByteView>;
type CallMap = Arc<Mutex<HashMap<String, watch::Receiver<Option<Outcome>>>>>;

/// Collapses concurrent loads of the same key into a single invocation.
#[derive(Clone, Default)]
pub struct SingleFlight {
    calls: CallMap,
}

/// Removes the call record when the leader task finishes or unwinds.
struct CallGuard {
    calls: CallMap,
    key: String,
}

impl Drop for CallGuard {
    fn drop(&mut self) {
        self.calls.lock().remove(&self.key);
    }
}

impl SingleFlight {
    /// Creates an empty coalescer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `work` for `key`, unless a load for `key` is already in flight,
    /// in which case the existing outcome is awaited and shared.
    ///
    /// The winning invocation runs on a detached task: dropping the future
    /// returned by `run` does not cancel the load.
    pub async fn run<F, Fut>(&self, key: &str, work: F) -> Outcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Outcome> + Send + 'static,
    {
        let mut rx = {
            let mut calls = self.calls.lock();
            if let Some(rx) = calls.get(key) {
                rx.clone()
            } else {
                let (tx, rx) = watch::channel(None);
                calls.insert(key.to_owned(), rx.clone());
                drop(calls);

                let guard = CallGuard {
                    calls: Arc::clone(&self.calls),
                    key: key.to_owned(),
                };
                let fut = work();
                tokio::spawn(async move {
                    let _guard = guard;
                    let outcome = fut.await;
                    let _ = tx.send(Some(outcome));
                });
                rx
            }
        };

        loop {
            if let Some(outcome) = rx.borrow_and_update().clone() {
                return outcome;
            }
            if rx.changed().await.is_err() {
                // Sender gone. Either the outcome was published just before
                // the leader task exited, or the task unwound without one.
                if let Some(outcome) = rx.borrow().clone() {
                    return outcome;
                }
                return Err(Error::Internal("in-flight load aborted".into()));
            }
        }
    }

    /// Number of loads currently in flight.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.calls.lock().len()
    }
}

impl std::fmt::Debug for SingleFlight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingleFlight")
            .field("in_flight", &self.calls.lock().len())
            .finish()
    }
}
