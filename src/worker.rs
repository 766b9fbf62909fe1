//! Graph worker threads and their completion carriers.
//!
//! Each worker loops: trace a runnable node under the tasks mutex, execute it
//! outside the lock, mark it completed, broadcast, repeat. It waits on the
//! task-available condition whenever nothing is claimable and exiting once the
//! trace reports the graph complete or termination is flagged.
//!
//! A payload panic is caught, flips the graph's termination flag (so peers
//! abandon their waits), and travels through the worker's one-shot carrier to
//! be re-raised by `Graph::wait`.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::Ordering;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[cfg(feature = "tracing")]
use tracing::{debug, error, trace};

use crate::graph::GraphInner;
use crate::trace::Verdict;
use crate::types::{NodeId, TaskState};

/// A spawned worker thread plus the receiving half of its completion carrier.
///
/// The carrier is an mpsc channel used as a one-shot: the worker sends exactly
/// one `Result` before exiting. The first successful receive is cached so
/// `wait` can re-read an outcome that a timed wait already drained.
pub(crate) struct WorkerContext {
    thread: thread::JoinHandle<()>,
    done: mpsc::Receiver<Result<(), String>>,
    received: Option<Result<(), String>>,
}

impl WorkerContext {
    pub(crate) fn new(thread: thread::JoinHandle<()>, done: mpsc::Receiver<Result<(), String>>) -> Self {
        Self {
            thread,
            done,
            received: None,
        }
    }

    /// Block until the worker reports its outcome.
    pub(crate) fn outcome(&mut self) -> Result<(), String> {
        if let Some(outcome) = &self.received {
            return outcome.clone();
        }
        let outcome = self.done.recv().unwrap_or(Ok(()));
        self.received = Some(outcome.clone());
        outcome
    }

    /// Wait up to `budget` for the worker's outcome. Returns `false` on
    /// timeout; the outcome (if received) is cached for a later [`Self::outcome`].
    pub(crate) fn outcome_within(&mut self, budget: Duration) -> bool {
        if self.received.is_some() {
            return true;
        }
        match self.done.recv_timeout(budget) {
            Ok(outcome) => {
                self.received = Some(outcome);
                true
            }
            Err(mpsc::RecvTimeoutError::Timeout) => false,
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                self.received = Some(Ok(()));
                true
            }
        }
    }

    pub(crate) fn join(self) {
        let _ = self.thread.join();
    }
}

/// Spawn a graph worker.
pub(crate) fn spawn(inner: Arc<GraphInner>, id: u32) -> WorkerContext {
    let (done_tx, done_rx) = mpsc::channel();

    let thread = thread::spawn(move || {
        #[cfg(feature = "tracing")]
        debug!(worker = id, "graph worker started");

        let outcome = run(&inner, id);

        if outcome.is_err() {
            // Stop the whole run; peers observe the flag before waiting again.
            let guard = inner.tasks.lock();
            inner.terminated.store(true, Ordering::SeqCst);
            drop(guard);
        }
        inner.task_available.notify_all();

        #[cfg(feature = "tracing")]
        debug!(worker = id, failed = outcome.is_err(), "graph worker exited");

        let _ = done_tx.send(outcome);
    });

    WorkerContext::new(thread, done_rx)
}

fn run(inner: &GraphInner, id: u32) -> Result<(), String> {
    #[cfg(not(feature = "tracing"))]
    let _ = id;

    let mut hint: Option<NodeId> = None;

    loop {
        if inner.terminated.load(Ordering::SeqCst) {
            break;
        }

        let claimed = {
            let mut tasks = inner.tasks.lock();
            let (verdict, node) = tasks.trace_ready_node(hint);
            hint = node;

            match verdict {
                Verdict::Ready => {
                    let node = node.expect("ready verdict carries a node");
                    let cell = Arc::clone(&tasks.slot(node).cell);
                    cell.state.store(TaskState::Executing);
                    tasks.remove_ready_cache(node);

                    #[cfg(feature = "tracing")]
                    trace!(worker = id, node = node.0, "claimed node");

                    Some(cell)
                }
                Verdict::Pending => {
                    // Re-check under the lock so a termination broadcast sent
                    // between our trace and this wait cannot be lost.
                    if !inner.terminated.load(Ordering::SeqCst) {
                        inner.task_available.wait(&mut tasks);
                    }
                    None
                }
                Verdict::Completed => break,
            }
        };

        if let Some(cell) = claimed {
            let outcome = catch_unwind(AssertUnwindSafe(|| cell.work.lock().execute()));
            match outcome {
                Ok(()) => {
                    cell.state.store(TaskState::Completed);
                    inner.task_available.notify_all();
                }
                Err(payload) => {
                    let message = panic_message(payload.as_ref());

                    #[cfg(feature = "tracing")]
                    error!(worker = id, message = %message, "payload panicked");

                    return Err(message);
                }
            }
        }
    }

    Ok(())
}

/// Extract a human-readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
