//! Edge bookkeeping across the public API

use weft::{Graph, Task};

fn graph_with(count: usize) -> (Graph, Vec<Task>) {
    let mut graph = Graph::default();
    let tasks = (0..count)
        .map(|_| graph.push_fn(|| ()).unwrap())
        .collect();
    (graph, tasks)
}

/// Every edge must appear in both directions.
fn assert_symmetric(tasks: &[Task]) {
    for task in tasks {
        for pred in task.predecessors() {
            assert!(
                pred.successors().contains(task),
                "missing successor mirror for a predecessor edge"
            );
        }
        for succ in task.successors() {
            assert!(
                succ.predecessors().contains(task),
                "missing predecessor mirror for a successor edge"
            );
        }
    }
}

#[test]
fn test_edges_stay_symmetric_through_mutation() {
    let (_graph, tasks) = graph_with(4);

    tasks[1].depend(&tasks[0]).unwrap();
    tasks[2].depend(&tasks[0]).unwrap();
    tasks[3].depend_all(&tasks[1..3]).unwrap();
    assert_symmetric(&tasks);

    tasks[2].erase_depend(&tasks[0]);
    assert_symmetric(&tasks);

    tasks[0].precede(&tasks[2]).unwrap();
    assert_symmetric(&tasks);
}

#[test]
fn test_erase_unlinks_every_neighbor() {
    let (mut graph, mut tasks) = graph_with(4);

    // 0 → 1 → {2, 3}
    tasks[1].depend(&tasks[0]).unwrap();
    tasks[2].depend(&tasks[1]).unwrap();
    tasks[3].depend(&tasks[1]).unwrap();

    let erased = tasks[1].clone();
    assert!(graph.erase(&mut tasks[1]).unwrap());

    assert_eq!(tasks[0].successors_size(), 0);
    assert_eq!(tasks[2].predecessors_size(), 0);
    assert_eq!(tasks[3].predecessors_size(), 0);
    for survivor in [&tasks[0], &tasks[2], &tasks[3]] {
        assert!(!survivor.predecessors().contains(&erased));
        assert!(!survivor.successors().contains(&erased));
    }
}

#[test]
fn test_erase_middle_of_chain_leaves_halves_independent() {
    let (mut graph, mut tasks) = graph_with(3);
    tasks[1].depend(&tasks[0]).unwrap();
    tasks[2].depend(&tasks[1]).unwrap();

    graph.erase(&mut tasks[1]).unwrap();

    // No implicit reconnection of 0 → 2.
    assert_eq!(tasks[2].predecessors_size(), 0);
    graph.start().unwrap();
    graph.wait().unwrap();
}

#[test]
fn test_edge_order_is_insertion_order() {
    let (_graph, tasks) = graph_with(4);
    tasks[3].depend(&tasks[2]).unwrap();
    tasks[3].depend(&tasks[0]).unwrap();
    tasks[3].depend(&tasks[1]).unwrap();

    let preds = tasks[3].predecessors();
    assert_eq!(
        preds,
        vec![tasks[2].clone(), tasks[0].clone(), tasks[1].clone()]
    );
    assert_eq!(tasks[3].predecessor_at(1), Some(tasks[0].clone()));
    assert_eq!(tasks[3].predecessor_at(4), None);
}
