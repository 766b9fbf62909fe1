//! Error types for graph construction and execution.
//!
//! This module defines the errors surfaced by graph mutation, task wiring,
//! and the wait interface.

/// Errors that can occur while building or running a task graph
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GraphError {
    /// A task handle argument was empty, erased, or otherwise unusable
    InvalidTask { reason: String },
    /// Adding the requested dependency would close a cycle
    CycleDetected,
    /// The operation is not allowed in the graph's current state
    InvalidState { reason: String },
    /// One or more payloads panicked during execution
    TaskPanicked { message: String },
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphError::InvalidTask { reason } => {
                write!(
                    f,
                    "Invalid task: {}\n\
                     \n\
                     Task handles become empty when default-constructed or after the\n\
                     underlying node is erased; only handles returned by a live graph\n\
                     can be used here.",
                    reason
                )
            }
            GraphError::CycleDetected => {
                write!(
                    f,
                    "Dependency cycle detected.\n\
                     \n\
                     The requested edge would make a task (transitively) depend on\n\
                     itself, so no valid execution order exists. The edge was not added."
                )
            }
            GraphError::InvalidState { reason } => {
                write!(
                    f,
                    "Invalid graph state: {}\n\
                     \n\
                     Structural mutation and (re)start are only allowed while the graph\n\
                     is not executing; call wait() first.",
                    reason
                )
            }
            GraphError::TaskPanicked { message } => {
                write!(
                    f,
                    "Task panicked during graph execution: {}\n\
                     A payload panicked, indicating a bug. The run was aborted and\n\
                     dependents of the failed task did not execute.",
                    message
                )
            }
        }
    }
}

impl std::error::Error for GraphError {}

impl GraphError {
    pub(crate) fn invalid_task(reason: impl Into<String>) -> Self {
        GraphError::InvalidTask {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_state(reason: impl Into<String>) -> Self {
        GraphError::InvalidState {
            reason: reason.into(),
        }
    }
}

/// Result type for graph operations
pub type GraphResult<T> = Result<T, GraphError>;
