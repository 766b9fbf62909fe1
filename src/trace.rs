//! Ready-node selection: the scan a worker runs under the tasks mutex to pick
//! its next node.
//!
//! The scan is a bounded DFS anchored at a *hint*: the node the worker last
//! touched. It prefers nodes close to the hint (successors whose predecessor
//! closure is complete) to exploit producer-consumer locality, and falls back
//! to a global scan through the ready-cache. The result is a [`Verdict`]:
//! `Ready` with a claimable node, `Pending` when the worker must wait on the
//! task-available condition, or `Completed` when the whole graph is done.

use std::collections::HashSet;

use crate::node::TaskSet;
use crate::types::{NodeId, TaskState};

/// Outcome tag of a trace scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Verdict {
    /// The paired node may be claimed and executed now.
    Ready,
    /// Nothing is claimable; wait for a completion broadcast.
    Pending,
    /// Every node has completed.
    Completed,
}

impl TaskSet {
    /// Select the next runnable node, starting from `hint` (the node the
    /// worker last considered, if any).
    pub(crate) fn trace_ready_node(&self, hint: Option<NodeId>) -> (Verdict, Option<NodeId>) {
        let Some(entry) = hint else {
            return self.trace_entry();
        };

        match self.state_of(entry) {
            TaskState::Executing => {
                // Someone is still producing for this node's successors; look
                // for a successor whose other inputs are already satisfied.
                for &succ in &self.slot(entry).succs {
                    if self.state_of(succ) == TaskState::Ready {
                        let branch = self.trace_ready_depend(succ);
                        if branch.0 == Verdict::Ready {
                            return branch;
                        }
                    }
                }

                let next = self.trace_entry();
                if next.0 == Verdict::Ready {
                    return next;
                }

                (Verdict::Pending, Some(entry))
            }
            TaskState::Ready => {
                let branch = self.trace_ready_depend(entry);
                if branch.0 == Verdict::Ready {
                    return branch;
                }
                if branch.0 == Verdict::Pending {
                    let next = self.trace_entry();
                    if next.0 == Verdict::Ready {
                        return next;
                    }
                    return branch;
                }

                (Verdict::Completed, None)
            }
            TaskState::Completed => {
                let mut delayed: (Verdict, Option<NodeId>) = (Verdict::Pending, None);

                for &succ in &self.slot(entry).succs {
                    if self.state_of(succ) == TaskState::Ready {
                        let branch = self.trace_ready_depend(succ);
                        match branch.0 {
                            Verdict::Ready => return branch,
                            Verdict::Pending => delayed = branch,
                            Verdict::Completed => {}
                        }
                    }
                }

                let next = self.trace_entry();
                if next.0 == Verdict::Ready {
                    return next;
                }
                if delayed.1.is_some() {
                    return delayed;
                }
                if next.0 == Verdict::Pending {
                    return next;
                }

                (Verdict::Completed, None)
            }
        }
    }

    /// Entry variant of the scan: no hint to anchor on.
    fn trace_entry(&self) -> (Verdict, Option<NodeId>) {
        if let Some(&first) = self.ready_cache.first() {
            return self.trace_ready_depend(first);
        }

        // Empty cache with a node still executing: its completion may unlock
        // the rest, so the caller has to wait rather than exit.
        for id in self.live_ids() {
            if self.state_of(id) == TaskState::Executing {
                return (Verdict::Pending, Some(id));
            }
        }

        (Verdict::Completed, None)
    }

    /// Find a claimable node inside `entry`'s predecessor closure, or classify
    /// `entry` itself.
    pub(crate) fn trace_ready_depend(&self, entry: NodeId) -> (Verdict, Option<NodeId>) {
        self.trace_ready_depend_avoiding(entry, &HashSet::new())
    }

    /// As [`Self::trace_ready_depend`], skipping predecessors in `avoids`.
    pub(crate) fn trace_ready_depend_avoiding(
        &self,
        entry: NodeId,
        avoids: &HashSet<NodeId>,
    ) -> (Verdict, Option<NodeId>) {
        match self.state_of(entry) {
            TaskState::Executing => (Verdict::Pending, Some(entry)),
            TaskState::Completed => (Verdict::Completed, Some(entry)),
            TaskState::Ready => {
                // Most recent blocked branch wins the Pending report.
                let mut blocked: (Verdict, Option<NodeId>) = (Verdict::Pending, None);

                for &pred in &self.slot(entry).preds {
                    if avoids.contains(&pred) {
                        continue;
                    }
                    match self.state_of(pred) {
                        TaskState::Ready => {
                            let branch = self.trace_ready_depend_avoiding(pred, avoids);
                            match branch.0 {
                                Verdict::Ready => return branch,
                                Verdict::Pending => blocked = branch,
                                Verdict::Completed => {}
                            }
                        }
                        TaskState::Executing => {
                            blocked = (Verdict::Pending, Some(pred));
                        }
                        TaskState::Completed => {}
                    }
                }

                if blocked.1.is_some() {
                    blocked
                } else {
                    (Verdict::Ready, Some(entry))
                }
            }
        }
    }
}
