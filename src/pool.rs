//! FIFO thread pool for dependency-free jobs.
//!
//! The pool shares the [`Work`] payload capability with the graph but none of
//! the dependency machinery: jobs run in submission order on a mix of *core*
//! workers (persistent) and *seasonal* workers (exit after an idle TTL).
//! [`ThreadPoolFixed`] is the start-gated variant where every worker is
//! seasonal with a zero TTL, so the pool drains the queue once and winds down.

use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

#[cfg(feature = "tracing")]
use tracing::{debug, error, info};

use crate::error::{GraphError, GraphResult};
use crate::types::{AtomicWorkerState, WorkerState};
use crate::work::{work_fn, Work};
use crate::worker::{panic_message, WorkerContext};

struct PoolInner {
    queue: Mutex<VecDeque<Box<dyn Work>>>,
    work_available: Condvar,
    terminated: AtomicBool,
    /// While set, workers idle until [`ThreadPool::start`] releases them.
    gated: AtomicBool,
}

struct PoolWorker {
    state: Arc<AtomicWorkerState>,
    context: WorkerContext,
}

/// A thread pool executing queued jobs in FIFO order.
///
/// Workers are spawned lazily on [`push`](ThreadPool::push): up to
/// `core_threads` persistent workers, then (capped by `max_threads`, `0`
/// meaning unbounded) seasonal workers that exit after sitting idle for the
/// configured TTL. The pool owns queued jobs and drops each one after running
/// it.
///
/// # Examples
///
/// ```
/// use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
/// use weft::ThreadPool;
///
/// let total = Arc::new(AtomicUsize::new(0));
/// let mut pool = ThreadPool::default();
/// for n in 1..=10 {
///     let total = Arc::clone(&total);
///     pool.push_fn(move || {
///         total.fetch_add(n, Ordering::SeqCst);
///     });
/// }
/// pool.terminate(true).unwrap();
/// ```
pub struct ThreadPool {
    inner: Arc<PoolInner>,
    core_threads: usize,
    max_threads: usize,
    idle_ttl: Duration,
    /// Spawn every worker as seasonal (the fixed-pool mode).
    all_seasonal: bool,
    workers: Vec<PoolWorker>,
}

impl Default for ThreadPool {
    fn default() -> Self {
        Self::new(2, 0, Duration::from_secs(60), false)
    }
}

impl ThreadPool {
    /// Create a pool with `core_threads` persistent workers, at most
    /// `max_threads` workers in total (`0` = unbounded), an idle TTL for
    /// seasonal workers, and optionally gated on [`start`](ThreadPool::start).
    pub fn new(core_threads: usize, max_threads: usize, idle_ttl: Duration, gated: bool) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                queue: Mutex::new(VecDeque::new()),
                work_available: Condvar::new(),
                terminated: AtomicBool::new(false),
                gated: AtomicBool::new(gated),
            }),
            core_threads,
            max_threads,
            idle_ttl,
            all_seasonal: false,
            workers: Vec::new(),
        }
    }

    /// Submit a job. The pool takes ownership and drops the job after
    /// execution.
    ///
    /// Returns `false` if the pool cannot accept work (see
    /// [`executable`](ThreadPool::executable)).
    pub fn push(&mut self, work: impl Work) -> bool {
        if !self.executable() {
            return false;
        }

        self.clean_completed_workers();

        if self.max_threads == 0 || self.workers.len() < self.max_threads {
            let idle_worker = self
                .workers
                .iter()
                .any(|worker| worker.state.load() == WorkerState::Ready);
            if !idle_worker {
                let seasonal = self.all_seasonal || self.workers.len() >= self.core_threads;
                self.spawn_worker(seasonal);
            }
        }

        let mut queue = self.inner.queue.lock();
        queue.push_back(Box::new(work));
        self.inner.work_available.notify_one();
        true
    }

    /// Submit a closure as a job. See [`push`](ThreadPool::push).
    pub fn push_fn<F>(&mut self, f: F) -> bool
    where
        F: FnMut() + Send + 'static,
    {
        self.push(work_fn(f))
    }

    /// Drop every job still waiting in the queue. Jobs already running are
    /// unaffected.
    pub fn clear(&mut self) {
        self.inner.queue.lock().clear();
    }

    /// Release gated workers and re-enable job submission.
    pub fn start(&mut self) {
        {
            let _queue = self.inner.queue.lock();
            self.inner.gated.store(false, Ordering::SeqCst);
            self.inner.terminated.store(false, Ordering::SeqCst);
        }
        self.inner.work_available.notify_all();

        #[cfg(feature = "tracing")]
        info!("pool started");
    }

    /// Block until every worker exited, then reset the pool.
    ///
    /// Core workers only exit on [`terminate`](ThreadPool::terminate), so
    /// calling `wait` on a running un-terminated pool blocks until then.
    /// Afterwards the start gate is re-armed: jobs pushed later spawn fresh
    /// workers that wait for [`start`](ThreadPool::start).
    ///
    /// # Errors
    ///
    /// [`GraphError::TaskPanicked`] with the concatenated messages of every
    /// job panic that killed a worker.
    pub fn wait(&mut self) -> GraphResult<()> {
        self.clean_completed_workers();

        let mut failures = String::new();
        for worker in &mut self.workers {
            if let Err(message) = worker.context.outcome() {
                failures.push_str(&message);
                failures.push('\n');
            }
        }
        for worker in self.workers.drain(..) {
            worker.context.join();
        }

        self.inner.terminated.store(false, Ordering::SeqCst);
        self.inner.gated.store(true, Ordering::SeqCst);

        if failures.is_empty() {
            Ok(())
        } else {
            Err(GraphError::TaskPanicked { message: failures })
        }
    }

    /// Stop accepting jobs and wake every worker so it can exit. Jobs already
    /// running finish; queued jobs are left unexecuted.
    pub fn terminate(&mut self, also_wait: bool) -> GraphResult<()> {
        {
            let _queue = self.inner.queue.lock();
            self.inner.terminated.store(true, Ordering::SeqCst);
        }
        self.inner.work_available.notify_all();

        #[cfg(feature = "tracing")]
        info!(also_wait, "pool termination requested");

        if also_wait {
            self.wait()?;
        }
        Ok(())
    }

    /// Whether the queue holds no waiting jobs.
    pub fn is_queue_empty(&self) -> bool {
        self.inner.queue.lock().is_empty()
    }

    /// Whether the pool can accept a new job.
    pub fn executable(&self) -> bool {
        if self.inner.terminated.load(Ordering::SeqCst) {
            return false;
        }
        if !self.all_seasonal {
            return true;
        }
        // Fixed pool: accepts while gated; once running it accepts only as
        // long as some worker is still alive to drain the queue.
        if self.inner.gated.load(Ordering::SeqCst) {
            return true;
        }
        !self.workers.is_empty()
    }

    fn spawn_worker(&mut self, seasonal: bool) {
        let uid = self.workers.len() as u32;
        let state = Arc::new(AtomicWorkerState::new(WorkerState::Delay));
        let (done_tx, done_rx) = mpsc::channel();

        let inner = Arc::clone(&self.inner);
        let worker_state = Arc::clone(&state);
        let ttl = seasonal.then_some(self.idle_ttl);

        let thread = thread::spawn(move || {
            #[cfg(feature = "tracing")]
            debug!(worker = uid, seasonal = ttl.is_some(), "pool worker started");

            let outcome = run_worker(&inner, &worker_state, uid, ttl);
            if outcome.is_ok() {
                // A worker killed by a job panic keeps its Busy state so the
                // reaper cannot discard its failure before wait() collects it.
                worker_state.store(WorkerState::Completed);
            }

            #[cfg(feature = "tracing")]
            debug!(worker = uid, failed = outcome.is_err(), "pool worker exited");

            let _ = done_tx.send(outcome);
        });

        self.workers.push(PoolWorker {
            state,
            context: WorkerContext::new(thread, done_rx),
        });
    }

    fn clean_completed_workers(&mut self) {
        let mut index = 0;
        while index < self.workers.len() {
            if self.workers[index].state.load() == WorkerState::Completed {
                self.workers.remove(index).context.join();
            } else {
                index += 1;
            }
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        let _ = self.terminate(true);
        self.clear();
    }
}

/// Worker loop. `ttl` is `None` for core workers; seasonal workers exit after
/// waiting `ttl` without work.
fn run_worker(
    pool: &PoolInner,
    state: &AtomicWorkerState,
    id: u32,
    ttl: Option<Duration>,
) -> Result<(), String> {
    #[cfg(not(feature = "tracing"))]
    let _ = id;

    await_start_signal(pool);

    loop {
        let job = {
            state.store(WorkerState::Ready);
            let mut queue = pool.queue.lock();

            match ttl {
                None => {
                    while !pool.terminated.load(Ordering::SeqCst) && queue.is_empty() {
                        pool.work_available.wait(&mut queue);
                    }
                    state.store(WorkerState::Busy);
                    if pool.terminated.load(Ordering::SeqCst) {
                        break;
                    }
                }
                Some(ttl) => {
                    let deadline = Instant::now() + ttl;
                    while !pool.terminated.load(Ordering::SeqCst) && queue.is_empty() {
                        if pool
                            .work_available
                            .wait_until(&mut queue, deadline)
                            .timed_out()
                        {
                            break;
                        }
                    }
                    state.store(WorkerState::Busy);
                    // Idle TTL elapsed with nothing queued: this worker's
                    // season is over.
                    if pool.terminated.load(Ordering::SeqCst) || queue.is_empty() {
                        break;
                    }
                }
            }

            queue.pop_front()
        };

        if let Some(mut job) = job {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| job.execute())) {
                let message = panic_message(payload.as_ref());

                #[cfg(feature = "tracing")]
                error!(worker = id, message = %message, "pool job panicked");

                return Err(message);
            }
        }
    }

    Ok(())
}

fn await_start_signal(pool: &PoolInner) {
    let mut queue = pool.queue.lock();
    while pool.gated.load(Ordering::SeqCst) && !pool.terminated.load(Ordering::SeqCst) {
        pool.work_available.wait(&mut queue);
    }
}

/// A start-gated pool of exactly `core` seasonal workers with a zero idle TTL:
/// after [`start`](ThreadPool::start), workers drain the queue and exit as
/// soon as it runs dry.
///
/// # Examples
///
/// ```
/// use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
/// use weft::ThreadPoolFixed;
///
/// let hits = Arc::new(AtomicUsize::new(0));
/// let mut pool = ThreadPoolFixed::new(2);
/// for _ in 0..4 {
///     let hits = Arc::clone(&hits);
///     pool.push_fn(move || {
///         hits.fetch_add(1, Ordering::SeqCst);
///     });
/// }
/// pool.start();
/// pool.wait().unwrap();
/// assert_eq!(hits.load(Ordering::SeqCst), 4);
/// ```
pub struct ThreadPoolFixed {
    pool: ThreadPool,
}

impl ThreadPoolFixed {
    pub fn new(core_threads: usize) -> Self {
        let mut pool = ThreadPool::new(core_threads, core_threads, Duration::ZERO, true);
        pool.all_seasonal = true;
        Self { pool }
    }

    /// See [`ThreadPool::push`].
    pub fn push(&mut self, work: impl Work) -> bool {
        self.pool.push(work)
    }

    /// See [`ThreadPool::push_fn`].
    pub fn push_fn<F>(&mut self, f: F) -> bool
    where
        F: FnMut() + Send + 'static,
    {
        self.pool.push_fn(f)
    }

    /// See [`ThreadPool::clear`].
    pub fn clear(&mut self) {
        self.pool.clear();
    }

    /// See [`ThreadPool::start`].
    pub fn start(&mut self) {
        self.pool.start();
    }

    /// See [`ThreadPool::wait`].
    pub fn wait(&mut self) -> GraphResult<()> {
        self.pool.wait()
    }

    /// See [`ThreadPool::terminate`].
    pub fn terminate(&mut self, also_wait: bool) -> GraphResult<()> {
        self.pool.terminate(also_wait)
    }

    /// See [`ThreadPool::is_queue_empty`].
    pub fn is_queue_empty(&self) -> bool {
        self.pool.is_queue_empty()
    }

    /// See [`ThreadPool::executable`].
    pub fn executable(&self) -> bool {
        self.pool.executable()
    }
}
