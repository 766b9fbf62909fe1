//! Core type definitions shared across the crate.
//!
//! Defines the stable node identifier, the per-node execution state and its
//! atomic cell, the result of timed waits, and the worker lifecycle state.

use std::sync::atomic::{AtomicU8, Ordering};

/// Opaque node identifier.
///
/// Indexes into the graph's slot arena. Slots are append-only for the lifetime
/// of a graph, so an id is never reused after its node is erased.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct NodeId(pub(crate) usize);

/// Execution state of a task node.
///
/// A node's state progresses `Ready` → `Executing` → `Completed` during a run
/// and is re-armed to `Ready` by the next [`crate::Graph::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// The node has not been claimed by a worker yet.
    Ready,
    /// A worker is currently running the node's payload.
    Executing,
    /// The node's payload has finished.
    Completed,
}

/// Atomic cell holding a [`TaskState`].
///
/// Readable without the graph lock; claim transitions happen under the tasks
/// mutex, the worker's `Executing` → `Completed` store does not.
#[derive(Debug)]
pub(crate) struct AtomicState(AtomicU8);

impl AtomicState {
    pub(crate) fn new(state: TaskState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    pub(crate) fn load(&self) -> TaskState {
        match self.0.load(Ordering::SeqCst) {
            0 => TaskState::Ready,
            1 => TaskState::Executing,
            _ => TaskState::Completed,
        }
    }

    pub(crate) fn store(&self, state: TaskState) {
        self.0.store(state as u8, Ordering::SeqCst);
    }
}

/// Result of a timed wait on graph completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum WaitStatus {
    /// All workers finished within the budget.
    Ready,
    /// The budget ran out before every worker finished.
    Timeout,
    /// The wait was interrupted before completion.
    Interrupted,
}

/// Lifecycle state of a pool worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WorkerState {
    /// Waiting for a job to be assigned.
    Ready,
    /// Waiting for the start signal.
    Delay,
    /// Running a job.
    Busy,
    /// Exited; the thread can be reaped.
    Completed,
}

#[derive(Debug)]
pub(crate) struct AtomicWorkerState(AtomicU8);

impl AtomicWorkerState {
    pub(crate) fn new(state: WorkerState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    pub(crate) fn load(&self) -> WorkerState {
        match self.0.load(Ordering::SeqCst) {
            0 => WorkerState::Ready,
            1 => WorkerState::Delay,
            2 => WorkerState::Busy,
            _ => WorkerState::Completed,
        }
    }

    pub(crate) fn store(&self, state: WorkerState) {
        self.0.store(state as u8, Ordering::SeqCst);
    }
}
