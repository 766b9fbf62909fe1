//! Internal node storage for the task graph.
//!
//! Nodes live in an append-only slot arena owned by the graph; edge lists
//! store [`NodeId`]s rather than references, which keeps the cyclic
//! predecessor/successor relation out of the ownership graph. Each slot holds
//! an [`Arc`] of the node record so a worker can execute the payload outside
//! the tasks mutex while handles keep reading the state atomically.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::types::{AtomicState, NodeId, TaskState};
use crate::work::Work;

/// Shared record for a single node: atomic execution state plus the payload
/// behind its own mutex.
///
/// The payload mutex is uncontended in practice; the state machine ensures at
/// most one worker claims a node per run. It exists to hand the claiming
/// worker `&mut` access through the `Arc`.
pub(crate) struct NodeCell {
    pub(crate) state: AtomicState,
    pub(crate) work: Mutex<Box<dyn Work>>,
}

/// Arena slot: the node record plus its edge lists.
pub(crate) struct Slot {
    pub(crate) cell: Arc<NodeCell>,
    /// Nodes that must complete before this one starts. No duplicates.
    pub(crate) preds: Vec<NodeId>,
    /// Mirror of `preds`: nodes waiting on this one.
    pub(crate) succs: Vec<NodeId>,
}

/// The graph's node set: slot arena plus the ready-cache of scan entry points.
#[derive(Default)]
pub(crate) struct TaskSet {
    /// Append-only; erased nodes leave a `None` slot so ids stay stable.
    pub(crate) slots: Vec<Option<Slot>>,
    /// Entry points for the trace scan. Re-seeded with every live node at
    /// `start`; a node is removed when a worker claims it.
    pub(crate) ready_cache: Vec<NodeId>,
    live: usize,
}

impl TaskSet {
    /// Number of live nodes.
    pub(crate) fn len(&self) -> usize {
        self.live
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&Slot> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    /// Panics if the slot was erased; callers inside a run hold ids that are
    /// guaranteed live.
    pub(crate) fn slot(&self, id: NodeId) -> &Slot {
        self.slots[id.0].as_ref().expect("node slot erased")
    }

    pub(crate) fn slot_mut(&mut self, id: NodeId) -> &mut Slot {
        self.slots[id.0].as_mut().expect("node slot erased")
    }

    pub(crate) fn state_of(&self, id: NodeId) -> TaskState {
        self.slot(id).cell.state.load()
    }

    /// Live node ids in insertion order.
    pub(crate) fn live_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(index, _)| NodeId(index))
    }

    pub(crate) fn insert(&mut self, work: Box<dyn Work>) -> (NodeId, Arc<NodeCell>) {
        let cell = Arc::new(NodeCell {
            state: AtomicState::new(TaskState::Ready),
            work: Mutex::new(work),
        });
        let id = NodeId(self.slots.len());
        self.slots.push(Some(Slot {
            cell: Arc::clone(&cell),
            preds: Vec::new(),
            succs: Vec::new(),
        }));
        self.live += 1;
        (id, cell)
    }

    /// Remove a node, unlinking it from every neighbor's edge list.
    pub(crate) fn remove(&mut self, id: NodeId) -> Option<Slot> {
        let slot = self.slots.get_mut(id.0).and_then(Option::take)?;
        for &pred in &slot.preds {
            if let Some(p) = self.slots[pred.0].as_mut() {
                p.succs.retain(|&s| s != id);
            }
        }
        for &succ in &slot.succs {
            if let Some(s) = self.slots[succ.0].as_mut() {
                s.preds.retain(|&p| p != id);
            }
        }
        self.live -= 1;
        Some(slot)
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.ready_cache.clear();
        self.live = 0;
    }

    /// Add the edge `pred → succ`, deduplicating both directions.
    pub(crate) fn link(&mut self, pred: NodeId, succ: NodeId) {
        let slot = self.slot_mut(succ);
        if !slot.preds.contains(&pred) {
            slot.preds.push(pred);
        }
        let slot = self.slot_mut(pred);
        if !slot.succs.contains(&succ) {
            slot.succs.push(succ);
        }
    }

    /// Remove the edge `pred → succ` if present.
    pub(crate) fn unlink(&mut self, pred: NodeId, succ: NodeId) {
        if self.get(pred).is_none() || self.get(succ).is_none() {
            return;
        }
        self.slot_mut(succ).preds.retain(|&p| p != pred);
        self.slot_mut(pred).succs.retain(|&s| s != succ);
    }

    /// Whether `to` is reachable from `from` along successor edges.
    ///
    /// Used to reject edges that would close a cycle before they are added.
    pub(crate) fn reaches(&self, from: NodeId, to: NodeId) -> bool {
        if from == to {
            return true;
        }
        let mut stack = vec![from];
        let mut visited = vec![false; self.slots.len()];
        while let Some(id) = stack.pop() {
            if visited[id.0] {
                continue;
            }
            visited[id.0] = true;
            for &succ in &self.slot(id).succs {
                if succ == to {
                    return true;
                }
                stack.push(succ);
            }
        }
        false
    }

    pub(crate) fn remove_ready_cache(&mut self, id: NodeId) -> bool {
        match self.ready_cache.iter().position(|&cached| cached == id) {
            Some(index) => {
                self.ready_cache.remove(index);
                true
            }
            None => false,
        }
    }

    /// Re-arm every node to `Ready` and seed the ready-cache with all of them.
    pub(crate) fn rearm(&mut self) {
        self.ready_cache.clear();
        for index in 0..self.slots.len() {
            if let Some(slot) = &self.slots[index] {
                slot.cell.state.store(TaskState::Ready);
                self.ready_cache.push(NodeId(index));
            }
        }
    }
}
