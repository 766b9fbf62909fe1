//! The task graph: node ownership, mutation, and the run protocol.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

#[cfg(feature = "tracing")]
use tracing::{debug, info};

use crate::error::{GraphError, GraphResult};
use crate::node::TaskSet;
use crate::task::Task;
use crate::types::WaitStatus;
use crate::work::{work_fn, Work};
use crate::worker::{self, WorkerContext};

/// Shared state between a [`Graph`] and its workers.
pub(crate) struct GraphInner {
    /// The one mutex guarding the graph's mutable structure.
    pub(crate) tasks: Mutex<TaskSet>,
    /// Broadcast when a node completes, new work appears, or termination is
    /// requested.
    pub(crate) task_available: Condvar,
    pub(crate) executing: AtomicBool,
    pub(crate) terminated: AtomicBool,
}

/// A multi-threaded task executor driven by a directed acyclic graph.
///
/// Build the graph by [`push`](Graph::push)ing payloads and wiring precedence
/// with [`Task::depend`]/[`Task::precede`], then call [`start`](Graph::start):
/// worker threads execute every node in dependency order, running independent
/// nodes concurrently. [`wait`](Graph::wait) blocks until the run finishes and
/// re-raises the first payload panic.
///
/// # Examples
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use weft::Graph;
///
/// let log = Arc::new(Mutex::new(Vec::new()));
/// let mut graph = Graph::new(2, true);
///
/// let (a, b) = (Arc::clone(&log), Arc::clone(&log));
/// let first = graph.push_fn(move || a.lock().unwrap().push("extract")).unwrap();
/// let second = graph.push_fn(move || b.lock().unwrap().push("load")).unwrap();
/// second.depend(&first).unwrap();
///
/// graph.start().unwrap();
/// graph.wait().unwrap();
/// assert_eq!(*log.lock().unwrap(), ["extract", "load"]);
/// ```
pub struct Graph {
    inner: Arc<GraphInner>,
    thread_count: usize,
    optimize_threads: bool,
    workers: Vec<WorkerContext>,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new(2, true)
    }
}

impl Graph {
    /// Create a graph that will run on `thread_count` workers.
    ///
    /// With `optimize_threads` set, the worker count of each run is capped at
    /// the number of nodes in the graph.
    pub fn new(thread_count: usize, optimize_threads: bool) -> Self {
        Self {
            inner: Arc::new(GraphInner {
                tasks: Mutex::new(TaskSet::default()),
                task_available: Condvar::new(),
                executing: AtomicBool::new(false),
                terminated: AtomicBool::new(false),
            }),
            thread_count,
            optimize_threads,
            workers: Vec::new(),
        }
    }

    /// Add a payload to the graph, returning its [`Task`] handle.
    ///
    /// Ownership of the payload transfers to the graph; it is dropped on
    /// [`erase`](Graph::erase), [`clear`](Graph::clear), or graph drop.
    ///
    /// # Errors
    ///
    /// [`GraphError::InvalidState`] if the graph is executing.
    pub fn push(&mut self, work: impl Work) -> GraphResult<Task> {
        if self.executing() {
            return Err(GraphError::invalid_state("cannot push tasks while executing"));
        }

        let mut tasks = self.inner.tasks.lock();
        let (id, cell) = tasks.insert(Box::new(work));

        #[cfg(feature = "tracing")]
        debug!(node = id.0, "task added to graph");

        Ok(Task::new(&self.inner, id, &cell))
    }

    /// Add a closure as a payload. See [`push`](Graph::push).
    pub fn push_fn<F>(&mut self, f: F) -> GraphResult<Task>
    where
        F: FnMut() + Send + 'static,
    {
        self.push(work_fn(f))
    }

    /// Remove a node from the graph, unlinking it from every neighbor and
    /// dropping its payload. The handle is emptied; clones of it become
    /// invalid as well.
    ///
    /// Returns `false` when the handle is empty or does not name a node of
    /// this graph.
    ///
    /// # Errors
    ///
    /// [`GraphError::InvalidState`] if the graph is executing.
    pub fn erase(&mut self, task: &mut Task) -> GraphResult<bool> {
        if task.is_empty() || !task.belongs_to(&self.inner) {
            return Ok(false);
        }
        if self.executing() {
            return Err(GraphError::invalid_state("cannot erase tasks while executing"));
        }

        let removed = self.inner.tasks.lock().remove(task.id()).is_some();
        if removed {
            #[cfg(feature = "tracing")]
            debug!(node = task.id().0, "task erased from graph");

            task.invalidate();
        }
        Ok(removed)
    }

    /// Drop every node and reset execution state.
    pub fn clear(&mut self) {
        self.reset();
        self.inner.tasks.lock().clear();
    }

    /// Number of nodes currently in the graph.
    pub fn len(&self) -> usize {
        self.inner.tasks.lock().len()
    }

    /// Whether the graph holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Handle of the `index`-th node in insertion order.
    pub fn task_at(&self, index: usize) -> Option<Task> {
        let tasks = self.inner.tasks.lock();
        let id = tasks.live_ids().nth(index)?;
        Some(Task::new(&self.inner, id, &tasks.slot(id).cell))
    }

    /// Handles of every node, in insertion order.
    pub fn tasks(&self) -> Vec<Task> {
        let tasks = self.inner.tasks.lock();
        tasks
            .live_ids()
            .map(|id| Task::new(&self.inner, id, &tasks.slot(id).cell))
            .collect()
    }

    /// Worker count used by the next [`start`](Graph::start).
    pub fn thread_count(&self) -> usize {
        self.thread_count
    }

    pub fn set_thread_count(&mut self, count: usize) {
        self.thread_count = count;
    }

    /// Whether the worker count is capped at the node count.
    pub fn optimized_threads(&self) -> bool {
        self.optimize_threads
    }

    pub fn set_optimized_threads(&mut self, optimize: bool) {
        self.optimize_threads = optimize;
    }

    /// Start executing the graph.
    ///
    /// Finishes any previous run first (propagating its panics, like
    /// [`wait`](Graph::wait)), re-arms every node to `Ready`, then spawns the
    /// workers.
    ///
    /// # Errors
    ///
    /// [`GraphError::InvalidState`] if already executing;
    /// [`GraphError::TaskPanicked`] carried over from the previous run.
    pub fn start(&mut self) -> GraphResult<()> {
        if self.executing() {
            return Err(GraphError::invalid_state("graph is already executing"));
        }

        self.wait()?;

        let node_count = {
            let mut tasks = self.inner.tasks.lock();
            tasks.rearm();
            tasks.len()
        };
        self.inner.executing.store(true, Ordering::SeqCst);

        let mut worker_count = self.thread_count;
        if self.optimize_threads {
            worker_count = worker_count.min(node_count);
        }

        #[cfg(feature = "tracing")]
        info!(nodes = node_count, workers = worker_count, "starting graph execution");

        for _ in 0..worker_count {
            let uid = self.workers.len() as u32;
            self.workers.push(worker::spawn(Arc::clone(&self.inner), uid));
        }
        Ok(())
    }

    /// Signal termination and optionally wait for workers to wind down.
    ///
    /// Payloads already running are not interrupted; nodes not yet claimed
    /// will not start. Safe to call repeatedly.
    pub fn terminate(&mut self, also_wait: bool) -> GraphResult<()> {
        {
            // Flag flipped under the tasks mutex so a worker between its trace
            // and its wait cannot miss the broadcast.
            let _tasks = self.inner.tasks.lock();
            self.inner.terminated.store(true, Ordering::SeqCst);
        }
        self.inner.task_available.notify_all();

        #[cfg(feature = "tracing")]
        info!(also_wait, "graph termination requested");

        if also_wait {
            self.wait()?;
        }
        Ok(())
    }

    /// Block until every worker of the current run has finished.
    ///
    /// Safe to call repeatedly, including with no run in flight.
    ///
    /// # Errors
    ///
    /// [`GraphError::TaskPanicked`] carrying the concatenated messages of all
    /// panicked payloads, if any.
    pub fn wait(&mut self) -> GraphResult<()> {
        let mut failures = String::new();
        for context in &mut self.workers {
            if let Err(message) = context.outcome() {
                failures.push_str(&message);
                failures.push('\n');
            }
        }
        for context in self.workers.drain(..) {
            context.join();
        }
        self.reset();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(GraphError::TaskPanicked { message: failures })
        }
    }

    /// Wait for completion with a time budget.
    ///
    /// Worker completion carriers are polled in order against the remaining
    /// budget; the first exhaustion returns [`WaitStatus::Timeout`] and leaves
    /// the run going; call [`wait`](Graph::wait) (or this again) later.
    ///
    /// # Errors
    ///
    /// As [`wait`](Graph::wait), once every worker finished in time.
    pub fn wait_for(&mut self, budget: Duration) -> GraphResult<WaitStatus> {
        let deadline = Instant::now() + budget;
        let mut remaining = budget;

        for context in &mut self.workers {
            if !context.outcome_within(remaining) {
                return Ok(WaitStatus::Timeout);
            }
            remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(WaitStatus::Timeout);
            }
        }

        self.wait()?;
        Ok(WaitStatus::Ready)
    }

    fn executing(&self) -> bool {
        self.inner.executing.load(Ordering::SeqCst)
    }

    fn reset(&mut self) {
        self.inner.executing.store(false, Ordering::SeqCst);
        self.inner.terminated.store(false, Ordering::SeqCst);
        self.inner.tasks.lock().ready_cache.clear();
        self.workers.clear();
    }
}

impl Drop for Graph {
    /// Workers from an unfinished run are signalled to stop; they hold their
    /// own reference to the shared state and wind down on their own.
    fn drop(&mut self) {
        {
            let _tasks = self.inner.tasks.lock();
            self.inner.terminated.store(true, Ordering::SeqCst);
        }
        self.inner.task_available.notify_all();
    }
}
