//! Convenience façade for running a graph on its own thread.

use std::thread;

use crate::error::GraphResult;
use crate::graph::Graph;

/// Handle to a graph run in flight on a spawned thread.
///
/// [`join`](RunHandle::join) blocks until the run finished and hands the graph
/// back together with the outcome, so it can be inspected, rewired, or
/// restarted.
pub struct RunHandle {
    thread: thread::JoinHandle<(Graph, GraphResult<()>)>,
}

impl RunHandle {
    /// Wait for the run to finish.
    pub fn join(self) -> (Graph, GraphResult<()>) {
        self.thread.join().expect("graph runner thread panicked")
    }
}

/// Runs graphs asynchronously: `start` + `wait` on a spawned thread, with the
/// outcome (including payload panics) bridged through the returned handle.
///
/// # Examples
///
/// ```
/// use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
/// use weft::{Executor, Graph};
///
/// let hits = Arc::new(AtomicUsize::new(0));
/// let mut graph = Graph::default();
/// let h = Arc::clone(&hits);
/// graph.push_fn(move || { h.fetch_add(1, Ordering::SeqCst); }).unwrap();
///
/// let (graph, outcome) = Executor::start(graph).join();
/// outcome.unwrap();
/// assert_eq!(hits.load(Ordering::SeqCst), 1);
/// drop(graph);
/// ```
pub struct Executor;

impl Executor {
    /// Execute the graph once on a spawned thread.
    pub fn start(mut graph: Graph) -> RunHandle {
        RunHandle {
            thread: thread::spawn(move || {
                let outcome = graph.start().and_then(|()| graph.wait());
                (graph, outcome)
            }),
        }
    }

    /// Execute the graph `times` times back to back on a spawned thread,
    /// stopping at the first failed run.
    pub fn start_loop(mut graph: Graph, times: usize) -> RunHandle {
        RunHandle {
            thread: thread::spawn(move || {
                let mut outcome = Ok(());
                for _ in 0..times {
                    outcome = graph.start().and_then(|()| graph.wait());
                    if outcome.is_err() {
                        break;
                    }
                }
                (graph, outcome)
            }),
        }
    }
}
