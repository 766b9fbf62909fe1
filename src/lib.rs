//! Thread-Pooled DAG Task Runner
//!
//! A task-graph execution engine on plain OS threads: build a directed acyclic
//! graph of [`Work`] payloads, wire precedence edges through [`Task`] handles,
//! and [`Graph::start`] fans execution out over a fixed worker pool. Every
//! node runs only after all of its predecessors completed, independent nodes
//! run concurrently, and the first panic raised by any payload aborts the run
//! and is re-raised by [`Graph::wait`].
//!
//! # Features
//!
//! - **Dependency-ordered parallelism**: workers pick their next node with a
//!   locality-aware scan (successors of what just finished first, global
//!   ready-cache as fallback), with no precomputed schedule and no async runtime.
//! - **Cycle rejection at wiring time**: [`Task::depend`] refuses any edge
//!   that would close a cycle, directly or transitively, so a started graph
//!   always has a valid execution order.
//! - **Panic propagation**: a payload panic stops the run, dependents of the
//!   failed node never execute, and [`Graph::wait`] returns
//!   [`GraphError::TaskPanicked`] carrying every captured message.
//! - **Re-runnable graphs**: `start`/`wait` cycles re-arm node states and
//!   execute the same graph again; [`Executor`] runs these cycles on a
//!   spawned thread.
//! - **Plain FIFO pool included**: [`ThreadPool`] executes dependency-free
//!   jobs with persistent core workers plus idle-TTL seasonal workers;
//!   [`ThreadPoolFixed`] is the start-gated, drain-once variant.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//! use weft::Graph;
//!
//! let total = Arc::new(AtomicUsize::new(0));
//! let mut graph = Graph::new(4, true);
//!
//! // Three independent producers and one consumer.
//! let producers: Vec<_> = (1..=3)
//!     .map(|n| {
//!         let total = Arc::clone(&total);
//!         graph.push_fn(move || {
//!             total.fetch_add(n, Ordering::SeqCst);
//!         })
//!     })
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//!
//! let total_check = Arc::clone(&total);
//! let report = graph
//!     .push_fn(move || {
//!         assert_eq!(total_check.load(Ordering::SeqCst), 6);
//!     })
//!     .unwrap();
//! report.depend_all(&producers).unwrap();
//!
//! graph.start().unwrap();
//! graph.wait().unwrap();
//! ```
//!
//! # Concurrency Model
//!
//! One mutex guards the graph's mutable structure; each node's execution
//! state is additionally readable as a lock-free atomic. Workers hold the
//! lock only while scanning for their next node, execute payloads outside it,
//! and coordinate through a single condition variable broadcast on
//! completion, new work, and termination. [`Graph::terminate`] stops claiming
//! new nodes but never interrupts a payload already running.
//!
//! # Feature Flags
//!
//! - `tracing`: emit internal instrumentation through the `tracing` crate
//!   (worker lifecycle, node claims, panic captures). Off by default.

mod error;
mod executor;
mod graph;
mod node;
mod pool;
mod task;
mod trace;
mod types;
mod work;
mod worker;

pub use error::{GraphError, GraphResult};
pub use executor::{Executor, RunHandle};
pub use graph::Graph;
pub use pool::{ThreadPool, ThreadPoolFixed};
pub use task::Task;
pub use types::{TaskState, WaitStatus};
pub use work::{work_fn, Work};
