//! The public, non-owning handle to a graph node.

use std::sync::{Arc, Weak};

use crate::error::{GraphError, GraphResult};
use crate::graph::GraphInner;
use crate::node::NodeCell;
use crate::types::{NodeId, TaskState};

/// Lightweight handle to a node owned by a [`crate::Graph`].
///
/// Handles are cheap to clone and are the only way to declare precedence
/// edges. They never own the node: erasing the node (or clearing/dropping the
/// graph) invalidates every outstanding handle, whose operations then degrade
/// to no-ops or [`GraphError::InvalidTask`].
///
/// # Examples
///
/// ```
/// use weft::{work_fn, Graph};
///
/// let mut graph = Graph::default();
/// let compile = graph.push(work_fn(|| ())).unwrap();
/// let link = graph.push(work_fn(|| ())).unwrap();
///
/// // `link` runs only after `compile` completed.
/// link.depend(&compile).unwrap();
/// assert_eq!(link.predecessors_size(), 1);
/// ```
#[derive(Clone, Default)]
pub struct Task {
    graph: Weak<GraphInner>,
    cell: Weak<NodeCell>,
    id: NodeId,
}

impl Task {
    pub(crate) fn new(graph: &Arc<GraphInner>, id: NodeId, cell: &Arc<NodeCell>) -> Self {
        Self {
            graph: Arc::downgrade(graph),
            cell: Arc::downgrade(cell),
            id,
        }
    }

    pub(crate) fn id(&self) -> NodeId {
        self.id
    }

    pub(crate) fn belongs_to(&self, inner: &Arc<GraphInner>) -> bool {
        self.graph
            .upgrade()
            .is_some_and(|graph| Arc::ptr_eq(&graph, inner))
    }

    pub(crate) fn invalidate(&mut self) {
        *self = Task::default();
    }

    /// Whether this handle no longer names a live node.
    pub fn is_empty(&self) -> bool {
        self.cell.strong_count() == 0
    }

    /// Current execution state of the node; `Ready` when the handle is empty.
    ///
    /// This is a lock-free atomic read.
    pub fn state(&self) -> TaskState {
        self.cell
            .upgrade()
            .map_or(TaskState::Ready, |cell| cell.state.load())
    }

    /// Re-arm the node to `Ready`. No effect on an empty handle.
    pub fn reset_state(&self) {
        if let Some(cell) = self.cell.upgrade() {
            cell.state.store(TaskState::Ready);
        }
    }

    /// Declare that this task runs only after `other` completed.
    ///
    /// Duplicate edges are ignored; both edge lists are updated symmetrically.
    ///
    /// # Errors
    ///
    /// [`GraphError::InvalidTask`] if either handle is empty, the handles name
    /// the same node, or they belong to different graphs;
    /// [`GraphError::CycleDetected`] if the edge would close a cycle
    /// (`other` is already a direct or transitive dependent of this
    /// task).
    pub fn depend(&self, other: &Task) -> GraphResult<()> {
        let graph = self.live_graph()?;
        if other.is_empty() {
            return Err(GraphError::invalid_task("dependency handle is empty"));
        }
        if self == other {
            return Err(GraphError::invalid_task("a task cannot depend on itself"));
        }
        if !other.belongs_to(&graph) {
            return Err(GraphError::invalid_task("tasks belong to different graphs"));
        }

        let mut tasks = graph.tasks.lock();
        if tasks.get(self.id).is_none() || tasks.get(other.id).is_none() {
            return Err(GraphError::invalid_task("task was erased from the graph"));
        }
        if tasks.reaches(self.id, other.id) {
            return Err(GraphError::CycleDetected);
        }
        tasks.link(other.id, self.id);
        Ok(())
    }

    /// Declare dependencies on every task in `others`.
    pub fn depend_all(&self, others: &[Task]) -> GraphResult<()> {
        for other in others {
            self.depend(other)?;
        }
        Ok(())
    }

    /// Declare that `other` runs only after this task completed.
    pub fn precede(&self, other: &Task) -> GraphResult<()> {
        other.depend(self)
    }

    /// Declare that every task in `others` runs after this one.
    pub fn precede_all(&self, others: &[Task]) -> GraphResult<()> {
        for other in others {
            other.depend(self)?;
        }
        Ok(())
    }

    /// Remove the edge `other → self` if present; silently a no-op otherwise.
    pub fn erase_depend(&self, other: &Task) {
        let Some(graph) = self.graph.upgrade() else {
            return;
        };
        if self.is_empty() || other.is_empty() || !other.belongs_to(&graph) {
            return;
        }
        graph.tasks.lock().unlink(other.id, self.id);
    }

    /// Remove the edge `self → other` if present; silently a no-op otherwise.
    pub fn erase_precede(&self, other: &Task) {
        other.erase_depend(self);
    }

    /// Number of tasks this one depends on.
    pub fn predecessors_size(&self) -> usize {
        self.neighbor_count(EdgeSide::Preds)
    }

    /// Number of tasks depending on this one.
    pub fn successors_size(&self) -> usize {
        self.neighbor_count(EdgeSide::Succs)
    }

    /// Handle of the `index`-th predecessor, in edge insertion order.
    pub fn predecessor_at(&self, index: usize) -> Option<Task> {
        self.neighbor_at(EdgeSide::Preds, index)
    }

    /// Handle of the `index`-th successor, in edge insertion order.
    pub fn successor_at(&self, index: usize) -> Option<Task> {
        self.neighbor_at(EdgeSide::Succs, index)
    }

    /// Handles of every predecessor.
    pub fn predecessors(&self) -> Vec<Task> {
        self.neighbors(EdgeSide::Preds)
    }

    /// Handles of every successor.
    pub fn successors(&self) -> Vec<Task> {
        self.neighbors(EdgeSide::Succs)
    }

    fn live_graph(&self) -> GraphResult<Arc<GraphInner>> {
        if self.is_empty() {
            return Err(GraphError::invalid_task("task handle is empty"));
        }
        self.graph
            .upgrade()
            .ok_or_else(|| GraphError::invalid_task("graph no longer exists"))
    }

    fn neighbor_count(&self, side: EdgeSide) -> usize {
        let Some(graph) = self.graph.upgrade() else {
            return 0;
        };
        let tasks = graph.tasks.lock();
        tasks.get(self.id).map_or(0, |slot| side.of(slot).len())
    }

    fn neighbor_at(&self, side: EdgeSide, index: usize) -> Option<Task> {
        let graph = self.graph.upgrade()?;
        let tasks = graph.tasks.lock();
        let id = *side.of(tasks.get(self.id)?).get(index)?;
        Some(Task::new(&graph, id, &tasks.slot(id).cell))
    }

    fn neighbors(&self, side: EdgeSide) -> Vec<Task> {
        let Some(graph) = self.graph.upgrade() else {
            return Vec::new();
        };
        let tasks = graph.tasks.lock();
        let Some(slot) = tasks.get(self.id) else {
            return Vec::new();
        };
        side.of(slot)
            .iter()
            .map(|&id| Task::new(&graph, id, &tasks.slot(id).cell))
            .collect()
    }
}

#[derive(Clone, Copy)]
enum EdgeSide {
    Preds,
    Succs,
}

impl EdgeSide {
    fn of(self, slot: &crate::node::Slot) -> &[NodeId] {
        match self {
            EdgeSide::Preds => &slot.preds,
            EdgeSide::Succs => &slot.succs,
        }
    }
}

/// Two handles are equal when they name the same node; two empty handles are
/// equal.
impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.cell.ptr_eq(&other.cell)
    }
}

impl Eq for Task {}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            f.write_str("Task(empty)")
        } else {
            write!(f, "Task({})", self.id.0)
        }
    }
}
