//! Structural mutation guards during execution

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use weft::{Graph, GraphError};

#[test]
fn test_erase_while_executing_fails_then_run_completes() {
    let mut graph = Graph::default();
    let mut sleeper = graph
        .push_fn(|| std::thread::sleep(Duration::from_millis(100)))
        .unwrap();

    graph.start().unwrap();
    // Well inside the payload's sleep window.
    std::thread::sleep(Duration::from_millis(10));

    let err = graph.erase(&mut sleeper).unwrap_err();
    assert!(matches!(err, GraphError::InvalidState { .. }));
    assert!(!sleeper.is_empty());

    graph.wait().unwrap();
    assert_eq!(sleeper.state(), weft::TaskState::Completed);
}

#[test]
fn test_push_while_executing_fails() {
    let mut graph = Graph::default();
    graph
        .push_fn(|| std::thread::sleep(Duration::from_millis(50)))
        .unwrap();

    graph.start().unwrap();
    let err = graph.push_fn(|| ()).unwrap_err();
    assert!(matches!(err, GraphError::InvalidState { .. }));

    graph.wait().unwrap();
    // After the run, mutation is allowed again.
    graph.push_fn(|| ()).unwrap();
    assert_eq!(graph.len(), 2);
}

#[test]
fn test_terminate_skips_unclaimed_nodes() {
    let hits = Arc::new(AtomicUsize::new(0));
    let mut graph = Graph::new(1, true);

    let gate = {
        let hits = Arc::clone(&hits);
        graph
            .push_fn(move || {
                hits.fetch_add(1, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(50));
            })
            .unwrap()
    };
    let follower = {
        let hits = Arc::clone(&hits);
        graph
            .push_fn(move || {
                hits.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap()
    };
    follower.depend(&gate).unwrap();

    graph.start().unwrap();
    std::thread::sleep(Duration::from_millis(10));
    graph.terminate(true).unwrap();

    // The running payload finished, its dependent never started.
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(gate.state(), weft::TaskState::Completed);
    assert_eq!(follower.state(), weft::TaskState::Ready);
}

#[test]
fn test_terminate_twice_is_harmless() {
    let mut graph = Graph::default();
    graph.push_fn(|| ()).unwrap();

    graph.start().unwrap();
    graph.terminate(false).unwrap();
    graph.terminate(true).unwrap();
    graph.wait().unwrap();
}
